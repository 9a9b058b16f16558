use crate::{
    app::config::AppConfig,
    domain::{
        article::{Article, ArticleSummary, FileRecord},
        dedup::DedupStore,
        image::select_image,
        message::{compose, MessagePolicy},
        stream::ArticleStream,
    },
    infra::api::{figshare::FigshareClient, http::HttpClient, twitter::PostingClient},
    task::post::AttachmentPoster,
    types::RunSummary,
};
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{error, info, warn};

/// 巡回処理の設定
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// 投稿APIへ実際に投稿するか
    pub live: bool,
    pub page_size: usize,
    /// ライブ投稿時の投稿間の待機時間
    pub post_interval: Duration,
    pub message_policy: MessagePolicy,
    pub image_extensions: Vec<String>,
    pub doi_root: String,
}

impl WorkflowConfig {
    pub fn from_app_config(config: &AppConfig, live: bool) -> Self {
        Self {
            live,
            page_size: config.repository.page_size,
            post_interval: config.post_interval(),
            message_policy: config.message.clone(),
            image_extensions: config.image_extensions.clone(),
            doi_root: config.doi_root.clone(),
        }
    }
}

/// 新着記事の巡回処理
///
/// 1. 記事一覧を1件ずつ取得し、重複ログにある記事は読み飛ばす
/// 2. 新着記事のみ詳細とファイル一覧を取得
/// 3. サムネイル画像を選び、メッセージを作成して投稿
/// 4. 投稿（またはメッセージ作成失敗）後にIDを重複ログへ記録
///
/// 記事一覧が終端に達したら集計を返して終了する。定期実行は外部のスケジューラで行う。
pub struct DiscoveryLoop<R, P, H> {
    repository: R,
    poster: AttachmentPoster<P, H>,
    store: DedupStore,
    config: WorkflowConfig,
}

impl<R, P, H> DiscoveryLoop<R, P, H>
where
    R: FigshareClient,
    P: PostingClient,
    H: HttpClient,
{
    pub fn new(
        repository: R,
        poster: AttachmentPoster<P, H>,
        store: DedupStore,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            repository,
            poster,
            store,
            config,
        }
    }

    /// 記事一覧を最後まで処理する
    pub async fn run(&mut self) -> Result<RunSummary> {
        info!("記事一覧を取得し、新着記事の検索を開始します...");

        let mut summary = RunSummary::empty();
        let mut stream = ArticleStream::new(self.config.page_size);

        while let Some(item) = stream.next(&self.repository).await? {
            if self.store.contains(&item.id) {
                continue;
            }
            summary.found += 1;
            self.process_article(&item, &mut summary).await?;
        }

        info!("{}", summary);
        Ok(summary)
    }

    /// 新着記事を1件処理する
    ///
    /// 詳細の取得に失敗した記事はIDを記録せずに読み飛ばし、次回の実行で再試行する。
    /// 投稿APIのエラーは巡回全体を中断する（IDは記録しない）。
    async fn process_article(
        &mut self,
        item: &ArticleSummary,
        summary: &mut RunSummary,
    ) -> Result<()> {
        info!(id = %item.id, "新着記事を発見: {}", item.title);

        let article = match self.fetch_article_detail(&item.id).await {
            Ok(article) => article,
            Err(e) => {
                warn!(id = %item.id, "記事詳細の取得に失敗。次回の実行で再試行します: {:#}", e);
                summary.skipped_fetch += 1;
                return Ok(());
            }
        };
        if let Some(published) = article.published_date {
            info!(id = %article.id, "公開日: {}", published.to_rfc3339());
        }

        let url = article.canonical_url(&self.config.doi_root);
        let image_url = select_image(&article.files, &self.config.image_extensions);

        match compose(
            &article.title,
            &article.authors,
            &url,
            &article.tags,
            &self.config.message_policy,
        ) {
            Ok(message) => {
                info!(id = %article.id, "投稿を送信します...");
                if let Err(e) = self
                    .poster
                    .post(image_url.as_deref(), &message, self.config.live)
                    .await
                {
                    error!(id = %article.id, "投稿に失敗しました。巡回を中断します: {:#}", e);
                    return Err(e.context(format!("記事{}の投稿に失敗", article.id)));
                }
                summary.posted += 1;
            }
            Err(e) => {
                warn!(
                    id = %article.id,
                    "NOTICE: {}を投稿できませんでした。手動で確認してください: {}",
                    url,
                    e
                );
                summary.failed += 1;
            }
        }

        // 重複判定と同じく一覧のIDを記録する
        info!(id = %item.id, "IDを重複ログに記録します...");
        self.store
            .commit(&item.id)
            .with_context(|| format!("重複ログへの記録に失敗: {}", item.id))?;
        info!(id = %item.id, "{}を重複ログに書き込みました", self.store.path().display());
        summary.processed += 1;

        if self.config.live && !self.config.post_interval.is_zero() {
            info!("{}秒待機します", self.config.post_interval.as_secs());
            tokio::time::sleep(self.config.post_interval).await;
        }

        Ok(())
    }

    /// 記事の詳細とファイル一覧を取得する
    async fn fetch_article_detail(&self, id: &str) -> Result<Article> {
        let mut article = self
            .repository
            .fetch_article(id)
            .await
            .context("記事詳細の取得に失敗")?;
        let files = self
            .repository
            .fetch_files(id)
            .await
            .context("ファイル一覧の取得に失敗")?;
        article.files = FileRecord::list_from_value(&files);
        Ok(article)
    }

    pub fn store(&self) -> &DedupStore {
        &self.store
    }

    /// 巡回を終えて重複ログを取り出す
    pub fn into_store(self) -> DedupStore {
        self.store
    }
}
