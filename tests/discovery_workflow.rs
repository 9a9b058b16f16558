//! 巡回処理の結合テスト
//!
//! モッククライアントで巡回を複数回実行し、重複ログを介した再実行時の挙動を確認します。

use crxbot::app::config::AppConfig;
use crxbot::app::workflow::{DiscoveryLoop, WorkflowConfig};
use crxbot::domain::{Article, Author, DedupStore};
use crxbot::infra::api::figshare::MockFigshareClient;
use crxbot::infra::api::http::MockHttpClient;
use crxbot::infra::api::twitter::MockPostingClient;
use crxbot::task::AttachmentPoster;
use serde_json::json;
use std::path::Path;
use std::time::Duration;

fn article(id: &str, title: &str) -> Article {
    Article {
        id: id.to_string(),
        title: title.to_string(),
        authors: vec![Author::new("C. Suzuki")],
        doi: format!("10.26434/chemrxiv.{}", id),
        tags: vec!["Electrochemistry".to_string()],
        files: vec![],
        published_date: None,
    }
}

fn repository() -> MockFigshareClient {
    MockFigshareClient::new()
        .with_article(article("100", "Alpha"), json!([]))
        .with_article(article("101", "Beta"), json!([]))
        .with_article(article("102", "Gamma"), json!([]))
}

fn workflow(
    repository: MockFigshareClient,
    posting: MockPostingClient,
    id_log: &Path,
    live: bool,
) -> DiscoveryLoop<MockFigshareClient, MockPostingClient, MockHttpClient> {
    let config = WorkflowConfig {
        page_size: 2,
        post_interval: Duration::ZERO,
        ..WorkflowConfig::from_app_config(&AppConfig::default(), live)
    };
    DiscoveryLoop::new(
        repository,
        AttachmentPoster::new(posting, MockHttpClient::new_bytes(vec![]), 30),
        DedupStore::open(id_log).unwrap(),
        config,
    )
}

#[tokio::test]
async fn test_crash_replay_posts_uncommitted_article_once() {
    let dir = tempfile::tempdir().unwrap();
    let id_log = dir.path().join("id_log.txt");

    // 投稿APIの障害で1件目から中断
    let failing = MockPostingClient::new_error("503 Service Unavailable");
    let mut first = workflow(repository(), failing, &id_log, true);
    assert!(first.run().await.is_err());
    assert!(first.into_store().is_empty());

    // 復旧後の再実行で全件を1回ずつ投稿
    let posting = MockPostingClient::new_success("crxbot");
    let mut second = workflow(repository(), posting.clone(), &id_log, true);
    let summary = second.run().await.unwrap();

    assert_eq!(summary.posted, 3);
    let texts: Vec<_> = posting.posts().into_iter().map(|p| p.text).collect();
    assert!(texts[0].starts_with("Alpha by C. Suzuki #electrochemistry"));
    assert_eq!(
        std::fs::read_to_string(&id_log).unwrap(),
        "100\n101\n102\n"
    );
}

#[tokio::test]
async fn test_existing_id_log_is_honoured() {
    let dir = tempfile::tempdir().unwrap();
    let id_log = dir.path().join("id_log.txt");
    // 改行で終わらない既存ログ
    std::fs::write(&id_log, "100\n\n101").unwrap();

    let posting = MockPostingClient::new_success("crxbot");
    let mut run = workflow(repository(), posting.clone(), &id_log, true);
    let summary = run.run().await.unwrap();

    assert_eq!(summary.found, 1);
    assert_eq!(posting.posts().len(), 1);
    assert!(posting.posts()[0].text.starts_with("Gamma"));

    let reopened = DedupStore::open(&id_log).unwrap();
    assert_eq!(reopened.len(), 3);
    assert!(reopened.contains("101"));
    assert!(reopened.contains("102"));
}

#[tokio::test]
async fn test_dry_run_consumes_articles() {
    let dir = tempfile::tempdir().unwrap();
    let id_log = dir.path().join("id_log.txt");

    let posting = MockPostingClient::new_success("crxbot");
    let mut dry = workflow(repository(), posting.clone(), &id_log, false);
    assert_eq!(dry.run().await.unwrap().processed, 3);

    // オフライン投稿で処理済みになった記事はライブ実行でも投稿しない
    let mut live = workflow(repository(), posting.clone(), &id_log, true);
    assert_eq!(live.run().await.unwrap().found, 0);
    assert_eq!(posting.post_count(), 0);
}
