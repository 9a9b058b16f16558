use crate::types::{ApiError, ApiResult};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// HTTPクライアントの抽象化トレイト
///
/// このトレイトは、実際のHTTP通信とモック実装の両方を
/// 統一的に扱えるようにするためのインターフェースです。
/// サムネイル画像のダウンロードに使用します。
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// 指定されたURLからバイト列を取得する
    ///
    /// 成功以外のHTTPステータスはエラーとして扱う。
    ///
    /// # Arguments
    /// * `url` - 取得対象のURL
    /// * `timeout_secs` - タイムアウト時間（秒）
    async fn fetch_bytes(&self, url: &str, timeout_secs: u64) -> Result<Vec<u8>>;
}

/// `reqwest` を使用した本番用のHTTPクライアント実装
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// 新しいHTTPクライアントを作成
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    async fn get_checked(&self, url: &str, timeout_secs: u64) -> ApiResult<Response> {
        let response = self
            .client
            .get(url)
            .timeout(Duration::from_secs(timeout_secs))
            .send()
            .await
            .map_err(|e| ApiError::transport(url, e))?;

        ensure_success(response, url).await
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn fetch_bytes(&self, url: &str, timeout_secs: u64) -> Result<Vec<u8>> {
        let response = self
            .get_checked(url, timeout_secs)
            .await
            .context(format!("HTTPリクエストの送信に失敗: {}", url))?;

        let bytes = response
            .bytes()
            .await
            .context("レスポンス本文の取得に失敗")?;
        Ok(bytes.to_vec())
    }
}

/// 成功以外のステータスを`ApiError::Status`に変換する
pub(crate) async fn ensure_success(response: Response, operation: &str) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ApiError::status(operation, status.as_u16(), body))
}

/// レスポンスのステータスを確認し、本文をJSONとして解析する
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: Response,
    operation: &str,
) -> ApiResult<T> {
    let response = ensure_success(response, operation).await?;
    let body = response
        .text()
        .await
        .map_err(|e| ApiError::transport(operation, e))?;

    serde_json::from_str(&body).map_err(|e| ApiError::json(operation, e))
}

/// テスト用のモックHTTPクライアント
///
/// この実装はテスト時にDIされ、実際のHTTPリクエストを行わずに
/// 定義済みのレスポンスやエラーを返します。
#[derive(Clone)]
pub struct MockHttpClient {
    /// モック時に返すレスポンス内容
    pub mock_response: Vec<u8>,
    /// モック時に返すステータス（成功/失敗の制御）
    pub should_succeed: bool,
    /// エラー時に返すメッセージ
    pub error_message: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl MockHttpClient {
    /// 指定したバイト列を返すモッククライアントを作成
    pub fn new_bytes(mock_response: Vec<u8>) -> Self {
        Self {
            mock_response,
            should_succeed: true,
            error_message: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// エラーレスポンスを返すモッククライアントを作成
    pub fn new_error(error_message: &str) -> Self {
        Self {
            mock_response: Vec::new(),
            should_succeed: false,
            error_message: Some(error_message.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// これまでのリクエスト回数
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn respond(&self) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_succeed {
            Ok(self.mock_response.clone())
        } else {
            let error_msg = self.error_message.as_deref().unwrap_or("Mock HTTP error");
            Err(anyhow::anyhow!("モックHTTPエラー: {}", error_msg))
        }
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn fetch_bytes(&self, _url: &str, _timeout_secs: u64) -> Result<Vec<u8>> {
        self.respond()
    }
}
