use clap::Parser;
use crxbot::app::{config::AppConfig, run_once};
use crxbot::infra::logging::init_logging;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

/// ChemRxivの新着プレプリントを自動で投稿するボット
#[derive(Parser, Debug)]
#[command(name = "crxbot", version, about)]
struct Cli {
    /// 投稿APIを使わずにオフラインで実行する（デバッグ用）
    #[arg(short = 'n', long = "no-post", alias = "notwitter")]
    no_post: bool,

    /// 設定ファイル（YAML）
    #[arg(long, default_value = "crxbot.yaml")]
    config: PathBuf,

    /// 認証情報ファイル
    #[arg(long)]
    keys: Option<PathBuf>,

    /// 処理済みIDの重複ログ
    #[arg(long)]
    id_log: Option<PathBuf>,

    /// 活動ログ
    #[arg(long)]
    activity_log: Option<PathBuf>,

    /// 投稿間の待機時間（秒）
    #[arg(long)]
    post_interval: Option<u64>,
}

impl Cli {
    /// コマンドライン引数で設定を上書きする
    fn apply(&self, config: &mut AppConfig) {
        if let Some(keys) = &self.keys {
            config.paths.keys = keys.clone();
        }
        if let Some(id_log) = &self.id_log {
            config.paths.id_log = id_log.clone();
        }
        if let Some(activity_log) = &self.activity_log {
            config.paths.activity_log = activity_log.clone();
        }
        if let Some(secs) = self.post_interval {
            config.post_interval_secs = secs;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // 環境変数を読み込み（.envファイルがあれば使用）
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let mut config = match AppConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("設定ファイルの読み込みに失敗しました: {}", e);
            return ExitCode::FAILURE;
        }
    };
    cli.apply(&mut config);

    if let Err(e) = init_logging(&config.paths.activity_log) {
        eprintln!("ログの初期化に失敗しました: {}", e);
        return ExitCode::FAILURE;
    }

    let live = !cli.no_post;
    info!(live, "=== crxbot 巡回開始 ===");

    match run_once(&config, live).await {
        Ok(_) => {
            info!("=== crxbot 巡回完了 ===");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("巡回を中断しました: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "crxbot",
            "--notwitter",
            "--id-log",
            "/tmp/ids.txt",
            "--post-interval",
            "0",
        ]);
        assert!(cli.no_post);

        let mut config = AppConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.paths.id_log, PathBuf::from("/tmp/ids.txt"));
        assert_eq!(config.post_interval_secs, 0);
        assert_eq!(config.paths.keys, PathBuf::from("CRX_keys.txt"));
    }

    #[test]
    fn test_cli_defaults_to_live() {
        let cli = Cli::parse_from(["crxbot"]);
        assert!(!cli.no_post);
        assert_eq!(cli.config, PathBuf::from("crxbot.yaml"));
    }
}
