use crate::domain::message::ComposedMessage;
use crate::infra::api::{http::HttpClient, twitter::PostingClient};
use anyhow::{Context, Result};
use std::io::Write;
use tempfile::NamedTempFile;
use tracing::{info, warn};

/// 投稿の実行モード
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostMode {
    /// 投稿APIへ実際に投稿する
    Live,
    /// 投稿APIを呼ばず、ログにのみ記録する
    DryRun,
}

impl PostMode {
    pub fn from_live(live: bool) -> Self {
        if live {
            Self::Live
        } else {
            Self::DryRun
        }
    }
}

/// 投稿の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostOutcome {
    pub mode: PostMode,
    /// 添付した（オフライン時は添付するはずだった）画像のバイト数
    pub image_bytes: Option<u64>,
    /// 投稿APIが返した投稿ID（オフライン時はNone）
    pub post_id: Option<String>,
    /// 投稿テキストの文字数
    pub text_length: usize,
}

impl PostOutcome {
    pub fn with_image(&self) -> bool {
        self.image_bytes.is_some()
    }
}

/// ダウンロード済みのサムネイル画像
///
/// 一時ファイルとして保持し、dropされた時点で削除される。
struct DownloadedImage {
    file: NamedTempFile,
    size: u64,
}

impl DownloadedImage {
    fn write(bytes: &[u8]) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("crxbot-")
            .suffix(".img")
            .tempfile()
            .context("一時ファイルの作成に失敗")?;
        file.write_all(bytes)
            .and_then(|_| file.flush())
            .context("画像の書き込みに失敗")?;

        Ok(Self {
            file,
            size: bytes.len() as u64,
        })
    }

    fn read(&self) -> Result<Vec<u8>> {
        std::fs::read(self.file.path()).context("一時画像ファイルの読み込みに失敗")
    }

    fn size_kb(&self) -> u64 {
        self.size / 1024
    }
}

/// サムネイル画像をダウンロードして投稿する
///
/// 画像の取得に失敗してもテキストのみの投稿に切り替え、投稿自体は中断しない。
pub struct AttachmentPoster<P, H> {
    posting: P,
    http: H,
    timeout_secs: u64,
}

impl<P: PostingClient, H: HttpClient> AttachmentPoster<P, H> {
    pub fn new(posting: P, http: H, timeout_secs: u64) -> Self {
        Self {
            posting,
            http,
            timeout_secs,
        }
    }

    /// メッセージを投稿する
    ///
    /// - 画像URLがあればダウンロードを試み、失敗したら警告してテキストのみにする
    /// - `live`がfalseなら投稿APIは呼ばず、画像サイズなどをログに記録する
    /// - 画像付き投稿は1回のAPI呼び出しで行い、一時ファイルは投稿前に削除する
    ///
    /// 投稿テキストと文字数を成否に関わらず必ず1行ログに記録する。
    pub async fn post(
        &self,
        image_url: Option<&str>,
        message: &ComposedMessage,
        live: bool,
    ) -> Result<PostOutcome> {
        let image = match image_url.filter(|url| !url.is_empty()) {
            Some(url) => self.download_image(url).await,
            None => None,
        };
        let mut image_bytes = image.as_ref().map(|img| img.size);

        let text_length = message.char_count();
        let post_id = if live {
            let payload = image.and_then(Self::image_payload);
            if payload.is_none() {
                image_bytes = None;
            }
            let result = match payload {
                Some(bytes) => self
                    .posting
                    .post_text_with_image(&message.text, bytes)
                    .await
                    .context("画像付き投稿に失敗"),
                None => self
                    .posting
                    .post_text(&message.text)
                    .await
                    .context("投稿に失敗"),
            };
            match result {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!("投稿失敗: {} ({}文字)", message.text, text_length);
                    return Err(e);
                }
            }
        } else {
            info!("ユーザー指定によりオフライン投稿します (--no-post)");
            if let Some(img) = &image {
                info!("投稿には{}KBytesの画像が含まれます", img.size_kb());
            }
            None
        };

        info!("投稿完了: {} ({}文字)", message.text, text_length);

        Ok(PostOutcome {
            mode: PostMode::from_live(live),
            image_bytes,
            post_id,
            text_length,
        })
    }

    /// 一時ファイルから画像を読み戻す。一時ファイルは読み込み後に削除される
    fn image_payload(image: DownloadedImage) -> Option<Vec<u8>> {
        match image.read() {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("画像を読み込めませんでした。画像なしで続行します: {:#}", e);
                None
            }
        }
    }

    async fn download_image(&self, url: &str) -> Option<DownloadedImage> {
        let bytes = match self.http.fetch_bytes(url, self.timeout_secs).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("画像をダウンロードできませんでした。画像なしで続行します: {:#}", e);
                return None;
            }
        };

        match DownloadedImage::write(&bytes) {
            Ok(image) => Some(image),
            Err(e) => {
                warn!("画像を保存できませんでした。画像なしで続行します: {:#}", e);
                None
            }
        }
    }
}
