use crate::infra::parser::parse_date;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// DOIから正規URLを組み立てる際のデフォルトのルート
pub const DEFAULT_DOI_ROOT: &str = "https://doi.org/";

// 著者エンティティ（表示名のみ使用）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub full_name: String,
}

impl Author {
    pub fn new(full_name: &str) -> Self {
        Self {
            full_name: full_name.to_string(),
        }
    }
}

// 論文に添付されたファイルの情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub name: String,
    /// ダウンロード可能なファイルではなく外部リンクのみのレコード
    #[serde(default)]
    pub is_link_only: bool,
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub download_url: String,
}

impl FileRecord {
    /// ファイル一覧APIのレスポンスからFileRecordのリストを作成する
    ///
    /// 配列以外の値は空リストとして扱い、
    /// 配列内で解析できない要素は読み飛ばす。
    pub fn list_from_value(files: &Value) -> Vec<FileRecord> {
        match files.as_array() {
            Some(items) => items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect(),
            None => Vec::new(),
        }
    }
}

// 記事一覧APIが返す軽量な記事情報（IDのみ必須）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleSummary {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub doi: String,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub published_date: Option<DateTime<Utc>>,
}

// 記事エンティティ（詳細APIのレスポンス）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub title: String,
    /// 順序に意味がある（末尾の著者を代表著者として扱う）
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub doi: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// 詳細APIには含まれず、ファイル一覧APIの結果で埋める
    #[serde(default)]
    pub files: Vec<FileRecord>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub published_date: Option<DateTime<Utc>>,
}

impl Article {
    /// DOIから正規URLを作成する
    pub fn canonical_url(&self, doi_root: &str) -> String {
        format!("{}{}", doi_root, self.doi)
    }
}

impl fmt::Display for Article {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.id)
    }
}

/// 記事一覧APIの1ページ分のレスポンス
#[derive(Debug, Clone, PartialEq)]
pub enum ListingPage {
    /// 通常のページ。空であればデータの終端
    Items(Vec<ArticleSummary>),
    /// 配列ではなく単一のレコードが返された場合。これ以降のページはない
    Single(ArticleSummary),
}

impl ListingPage {
    /// APIレスポンスのJSONからページを作成する
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Array(_) => {
                let items: Vec<ArticleSummary> =
                    serde_json::from_value(value).context("記事一覧の解析に失敗")?;
                Ok(Self::Items(items))
            }
            Value::Object(_) => {
                let item: ArticleSummary =
                    serde_json::from_value(value).context("単一記事の解析に失敗")?;
                Ok(Self::Single(item))
            }
            other => Err(anyhow!("想定外の記事一覧レスポンス: {}", other)),
        }
    }
}

/// figshareの記事IDは数値で返るため、文字列に正規化する
fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("不正な記事ID: {}", other))),
    }
}

fn deserialize_nullable_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// 公開日は表示用の情報なので、解析できない値はNoneとして扱う
fn deserialize_optional_date<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| parse_date(&s).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    mod deserialize {
        use super::*;

        #[test]
        fn test_article_from_figshare_json() {
            let value = json!({
                "id": 12345678,
                "title": "A Study of X",
                "doi": "10.26434/chemrxiv.12345678.v1",
                "authors": [
                    {"id": 1, "full_name": "A. Smith"},
                    {"id": 2, "full_name": "B. Jones"}
                ],
                "tags": ["Organic Chemistry", "Catalysis"],
                "published_date": "2021-03-01T09:50:10Z",
                "custom_fields": []
            });

            let article: Article = serde_json::from_value(value).unwrap();
            assert_eq!(article.id, "12345678");
            assert_eq!(article.authors.len(), 2);
            assert_eq!(article.authors[1].full_name, "B. Jones");
            assert_eq!(article.tags, vec!["Organic Chemistry", "Catalysis"]);
            assert!(article.files.is_empty());
            assert!(article.published_date.is_some());
            assert_eq!(
                article.canonical_url(DEFAULT_DOI_ROOT),
                "https://doi.org/10.26434/chemrxiv.12345678.v1"
            );
        }

        #[test]
        fn test_article_with_nulls_and_bad_date() {
            let value = json!({
                "id": "abc",
                "title": "T",
                "doi": null,
                "published_date": "someday"
            });

            let article: Article = serde_json::from_value(value).unwrap();
            assert_eq!(article.id, "abc");
            assert_eq!(article.doi, "");
            assert!(article.published_date.is_none());
            assert!(article.authors.is_empty());
        }

        #[test]
        fn test_invalid_id_rejected() {
            let value = json!({"id": [1, 2], "title": "T"});
            assert!(serde_json::from_value::<Article>(value).is_err());
        }
    }

    mod files {
        use super::*;

        #[test]
        fn test_file_list_from_array() {
            let value = json!([
                {"id": 1, "name": "paper.pdf", "is_link_only": false, "download_url": "https://x/1"},
                {"id": 2, "name": "link", "is_link_only": true, "download_url": null},
                {"broken": true}
            ]);

            let records = FileRecord::list_from_value(&value);
            assert_eq!(records.len(), 2, "解析できない要素は読み飛ばすべき");
            assert_eq!(records[0].download_url, "https://x/1");
            assert!(records[1].is_link_only);
            assert_eq!(records[1].download_url, "");
        }

        #[test]
        fn test_file_list_from_non_array() {
            assert!(FileRecord::list_from_value(&json!({"name": "a.png"})).is_empty());
            assert!(FileRecord::list_from_value(&json!("a.png")).is_empty());
            assert!(FileRecord::list_from_value(&Value::Null).is_empty());
        }
    }

    mod listing {
        use super::*;

        #[test]
        fn test_listing_page_items() {
            let page = ListingPage::from_value(json!([
                {"id": 1, "title": "One", "doi": "10.1/one"},
                {"id": 2, "title": "Two"}
            ]))
            .unwrap();

            match page {
                ListingPage::Items(items) => {
                    assert_eq!(items.len(), 2);
                    assert_eq!(items[0].id, "1");
                    assert_eq!(items[1].doi, "");
                }
                other => panic!("配列はItemsになるべき: {:?}", other),
            }
        }

        #[test]
        fn test_listing_page_single_object() {
            let page = ListingPage::from_value(json!({"id": 7, "title": "Only"})).unwrap();
            assert!(matches!(page, ListingPage::Single(ref s) if s.id == "7"));
        }

        #[test]
        fn test_listing_page_invalid() {
            assert!(ListingPage::from_value(json!("oops")).is_err());
            assert!(ListingPage::from_value(json!([{"title": "no id"}])).is_err());
        }
    }
}
