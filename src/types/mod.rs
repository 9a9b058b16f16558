//! 型定義モジュール
//!
//! アプリケーション全体で使用される共通的な型定義を管理します。
//! - エラー型: API通信・インフラ・設定の各層ごとのエラー
//! - 実行結果型: 1回の巡回処理の集計

pub mod config;
pub mod error;
pub mod infra;
pub mod result;

// 便利な再エクスポート
pub use config::{ConfigError, ConfigResult};
pub use error::{ApiError, ApiResult};
pub use infra::{InfraError, InfraResult};
pub use result::RunSummary;
