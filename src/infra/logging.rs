use crate::types::{InfraError, InfraResult};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// デフォルトのログフィルタ
const DEFAULT_FILTER: &str = "crxbot=info";

/// ログ出力を初期化する
///
/// 標準出力に加えて、活動ログファイルへ追記する。
/// 活動ログはANSIカラーなしのタイムスタンプ付き1行形式。
/// `RUST_LOG`が設定されていればそちらのフィルタを優先する。
pub fn init_logging(activity_log: &Path) -> InfraResult<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(activity_log)
        .map_err(|e| InfraError::file_system(activity_log.display().to_string(), e))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .try_init()
        .map_err(|e| InfraError::logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_log_written_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity_log.txt");

        init_logging(&path).unwrap();
        tracing::info!(target: "crxbot", "活動ログのテスト");

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("活動ログのテスト"));
        assert!(!contents.contains('\u{1b}'), "ファイルにはANSIカラーを出力しない");

        // 2回目の初期化はエラーになる
        assert!(init_logging(&path).is_err());
    }
}
