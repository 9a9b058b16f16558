//! アプリケーション層
//!
//! 設定と認証情報から各クライアントを組み立て、巡回処理を1回実行する。

pub mod config;
pub mod workflow;

use crate::{
    domain::dedup::DedupStore,
    infra::api::{
        figshare::{FigshareClient, ReqwestFigshareClient},
        http::ReqwestHttpClient,
        twitter::{PostingClient, ReqwestPostingClient},
    },
    task::post::AttachmentPoster,
    types::RunSummary,
};
use anyhow::{Context, Result};
use config::{AppConfig, Credentials};
use tracing::info;
use workflow::{DiscoveryLoop, WorkflowConfig};

/// 巡回処理を1回実行する
///
/// 認証情報の読み込み、両APIの認証確認、重複ログの読み込みのいずれかに失敗した場合は
/// 記事の処理を始める前にエラーを返す。
pub async fn run_once(config: &AppConfig, live: bool) -> Result<RunSummary> {
    let credentials = Credentials::load(&config.paths.keys).context("認証情報の読み込みに失敗")?;
    info!("認証情報を読み込みました");

    let posting_token = if live {
        credentials.require_posting_token()?.to_string()
    } else {
        String::new()
    };
    let posting = ReqwestPostingClient::new(
        &config.posting.base_url,
        &posting_token,
        config.http_timeout_secs,
    );
    if live {
        let screen_name = posting.verify_credentials().await?;
        info!("投稿アカウント{}として認証しました", screen_name);
    } else {
        info!("ユーザー指定により投稿APIの認証をスキップしました (--no-post)");
    }

    let repository = ReqwestFigshareClient::new(
        &config.repository.base_url,
        &credentials.repository_token,
        config.repository.institution,
        config.repository.page_size,
        config.http_timeout_secs,
    );
    repository.check_account().await?;
    info!("figshareで認証しました");

    let store = DedupStore::open(&config.paths.id_log).context("重複ログの読み込みに失敗")?;
    info!("重複ログを読み込みました: {}件", store.len());

    let poster = AttachmentPoster::new(posting, ReqwestHttpClient::new(), config.http_timeout_secs);
    let mut workflow = DiscoveryLoop::new(
        repository,
        poster,
        store,
        WorkflowConfig::from_app_config(config, live),
    );
    workflow.run().await
}
