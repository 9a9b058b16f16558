use crate::types::ConfigError;
use thiserror::Error;

/// インフラストラクチャ層のエラー型
/// ファイルシステム、設定ファイルの解析、ログ初期化など基盤的なエラーを定義
#[derive(Error, Debug)]
pub enum InfraError {
    /// ファイルシステムエラー
    #[error("ファイルシステムエラー: {path} - {source}")]
    FileSystem {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// YAML解析エラー
    #[error("YAML解析エラー: {path} - {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// ログ初期化エラー
    #[error("ログ初期化エラー: {message}")]
    Logging { message: String },

    /// 設定エラー
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl InfraError {
    /// ファイルシステムエラーを作成
    pub fn file_system<P: Into<String>>(path: P, source: std::io::Error) -> Self {
        Self::FileSystem {
            path: path.into(),
            source,
        }
    }

    /// YAML解析エラーを作成
    pub fn yaml<P: Into<String>>(path: P, source: serde_yaml::Error) -> Self {
        Self::Yaml {
            path: path.into(),
            source,
        }
    }

    /// ログ初期化エラーを作成
    pub fn logging<M: Into<String>>(message: M) -> Self {
        Self::Logging {
            message: message.into(),
        }
    }
}

/// インフラエラーのResult型エイリアス
pub type InfraResult<T> = std::result::Result<T, InfraError>;
