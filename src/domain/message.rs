//! 投稿メッセージの作成
//!
//! 形式: `{タイトル} by {著者} {ハッシュタグ...}\n\n{DOI URL}`
//!
//! 投稿先ではURLが実際の長さに関わらず固定長として数えられるため、
//! URLを`url_token_width`文字として文字数予算を計算する。

use super::article::Author;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// URLの前に入れる改行（2文字）
const URL_SEPARATOR: &str = "\n\n";

/// メッセージ作成の失敗
///
/// 再試行しても解決しないため、呼び出し側は手動確認の対象として扱う。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComposeError {
    #[error("メッセージが長すぎます: {counted}文字（上限{limit}文字）")]
    TooLong { counted: usize, limit: usize },
}

/// 著者表記の方針
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorAttribution {
    /// 末尾の著者を代表著者として表記する
    #[default]
    LastAuthor,
    /// 先頭の著者を代表著者として表記する
    FirstAuthor,
}

impl AuthorAttribution {
    /// 著者表記を作成する
    ///
    /// 著者が2名以上なら代表著者の後に共著者サフィックスを付ける。
    /// 著者がいなければNoneを返す。
    pub fn attribute(&self, authors: &[Author], coauthor_suffix: &str) -> Option<String> {
        let named = match self {
            Self::LastAuthor => authors.last(),
            Self::FirstAuthor => authors.first(),
        }?;

        let mut clause = named.full_name.clone();
        if authors.len() > 1 {
            clause.push(' ');
            clause.push_str(coauthor_suffix);
        }
        Some(clause)
    }
}

/// メッセージの文字数予算と表記の設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagePolicy {
    /// 投稿全体の上限文字数
    pub total_limit: usize,
    /// URLを何文字として数えるか
    pub url_token_width: usize,
    pub coauthor_suffix: String,
    pub attribution: AuthorAttribution,
}

impl Default for MessagePolicy {
    fn default() -> Self {
        Self {
            total_limit: 280,
            url_token_width: 23,
            coauthor_suffix: "& co-workers".to_string(),
            attribution: AuthorAttribution::LastAuthor,
        }
    }
}

impl MessagePolicy {
    /// タイトル・著者・ハッシュタグに使える文字数
    pub fn head_budget(&self) -> usize {
        self.total_limit
            .saturating_sub(self.url_token_width + URL_SEPARATOR.chars().count())
    }
}

/// 作成済みの投稿メッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedMessage {
    pub text: String,
    /// URLを固定長として数えた文字数
    pub counted_length: usize,
}

impl ComposedMessage {
    /// 実際の文字数
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// キーワードをハッシュタグに変換する（小文字化し、空白をハイフンに置換）
pub fn hashtag(tag: &str) -> String {
    format!("#{}", tag.to_lowercase().replace(' ', "-"))
}

/// 投稿メッセージを作成する
///
/// ハッシュタグは予算に収まるものだけを順に追加する。
/// 収まらないタグは読み飛ばし、後続のタグは引き続き試す。
/// 完成したメッセージが上限を超える場合は切り詰めずに`ComposeError::TooLong`を返す。
pub fn compose(
    title: &str,
    authors: &[Author],
    canonical_url: &str,
    tags: &[String],
    policy: &MessagePolicy,
) -> Result<ComposedMessage, ComposeError> {
    let mut text = match policy
        .attribution
        .attribute(authors, &policy.coauthor_suffix)
    {
        Some(clause) => format!("{} by {}", title, clause),
        None => title.to_string(),
    };
    let mut length = text.chars().count();
    let budget = policy.head_budget();

    for tag in tags {
        let candidate = format!(" {}", hashtag(tag));
        let candidate_length = candidate.chars().count();
        if length + candidate_length <= budget {
            text.push_str(&candidate);
            length += candidate_length;
        }
    }

    text.push_str(URL_SEPARATOR);
    let counted_length = text.chars().count() + policy.url_token_width;
    text.push_str(canonical_url);

    if counted_length > policy.total_limit {
        return Err(ComposeError::TooLong {
            counted: counted_length,
            limit: policy.total_limit,
        });
    }

    Ok(ComposedMessage {
        text,
        counted_length,
    })
}
