use crate::domain::article::DEFAULT_DOI_ROOT;
use crate::domain::image::default_image_extensions;
use crate::domain::message::MessagePolicy;
use crate::infra::api::figshare::{
    CHEMRXIV_INSTITUTION_ID, DEFAULT_FIGSHARE_BASE_URL, DEFAULT_PAGE_SIZE,
};
use crate::infra::api::twitter::DEFAULT_POSTING_BASE_URL;
use crate::infra::storage::file::{load_lines, load_yaml_from_file};
use crate::types::{ConfigError, InfraResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 投稿APIのアクセストークンを上書きする環境変数
pub const POSTING_TOKEN_ENV: &str = "CRXBOT_POSTING_TOKEN";
/// リポジトリAPIのトークンを上書きする環境変数
pub const REPOSITORY_TOKEN_ENV: &str = "CRXBOT_REPOSITORY_TOKEN";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    pub base_url: String,
    pub institution: u64,
    pub page_size: usize,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_FIGSHARE_BASE_URL.to_string(),
            institution: CHEMRXIV_INSTITUTION_ID,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostingConfig {
    pub base_url: String,
}

impl Default for PostingConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_POSTING_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// 処理済みIDの重複ログ
    pub id_log: PathBuf,
    /// 活動ログ
    pub activity_log: PathBuf,
    /// 認証情報ファイル
    pub keys: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            id_log: PathBuf::from("id_log.txt"),
            activity_log: PathBuf::from("activity_log.txt"),
            keys: PathBuf::from("CRX_keys.txt"),
        }
    }
}

/// アプリケーション設定
///
/// YAMLファイルから読み込む。未指定の項目はデフォルト値を使う。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub repository: RepositoryConfig,
    pub posting: PostingConfig,
    pub message: MessagePolicy,
    pub image_extensions: Vec<String>,
    pub doi_root: String,
    /// 投稿間の待機時間（秒）。ライブ投稿時のみ
    pub post_interval_secs: u64,
    pub http_timeout_secs: u64,
    pub paths: PathsConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            repository: RepositoryConfig::default(),
            posting: PostingConfig::default(),
            message: MessagePolicy::default(),
            image_extensions: default_image_extensions(),
            doi_root: DEFAULT_DOI_ROOT.to_string(),
            post_interval_secs: 1800,
            http_timeout_secs: 30,
            paths: PathsConfig::default(),
        }
    }
}

impl AppConfig {
    /// 設定ファイルを読み込む。ファイルがなければデフォルト設定を返す
    pub fn load(path: &Path) -> InfraResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let config: Self = load_yaml_from_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// 設定値の整合性を確認する
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.repository.page_size == 0 {
            return Err(ConfigError::invalid_value(
                "repository.page_sizeは1以上である必要があります",
            ));
        }
        if self.message.url_token_width + 2 >= self.message.total_limit {
            return Err(ConfigError::invalid_value(
                "message.total_limitがURLの文字数に対して小さすぎます",
            ));
        }
        if self.image_extensions.is_empty() {
            return Err(ConfigError::invalid_value(
                "image_extensionsを1つ以上指定してください",
            ));
        }
        Ok(())
    }

    pub fn post_interval(&self) -> Duration {
        Duration::from_secs(self.post_interval_secs)
    }
}

/// 外部APIの認証情報
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// 投稿APIのアクセストークン。オフライン投稿時は不要
    pub posting_token: Option<String>,
    pub repository_token: String,
}

impl Credentials {
    /// 認証情報ファイルと環境変数から読み込む
    ///
    /// ファイル形式（1行1値、空行は無視）:
    /// 1行目: 投稿APIのアクセストークン
    /// 2行目: リポジトリAPIのトークン
    pub fn load(path: &Path) -> InfraResult<Self> {
        let lines = if path.exists() {
            load_lines(path)?
        } else {
            Vec::new()
        };
        Ok(Self::resolve(&lines, |name| std::env::var(name).ok())?)
    }

    /// ファイルの行と環境変数の値から認証情報を決める（環境変数を優先）
    pub fn resolve<F>(lines: &[String], env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |name: &str, index: usize| {
            env(name)
                .filter(|value| !value.trim().is_empty())
                .or_else(|| lines.get(index).cloned())
        };

        let posting_token = pick(POSTING_TOKEN_ENV, 0);
        let repository_token = pick(REPOSITORY_TOKEN_ENV, 1)
            .ok_or_else(|| ConfigError::missing_credential("リポジトリAPIのトークン"))?;

        Ok(Self {
            posting_token,
            repository_token,
        })
    }

    /// ライブ投稿に必要な投稿APIのトークンを返す
    pub fn require_posting_token(&self) -> Result<&str, ConfigError> {
        self.posting_token
            .as_deref()
            .ok_or_else(|| ConfigError::missing_credential("投稿APIのアクセストークン"))
    }
}

// トークンをログに出さない
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("posting_token", &self.posting_token.as_ref().map(|_| "***"))
            .field("repository_token", &"***")
            .finish()
    }
}
