use super::http::read_json;
use crate::types::ApiError;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// X (Twitter) APIのデフォルトのベースURL
pub const DEFAULT_POSTING_BASE_URL: &str = "https://api.x.com";

/// 投稿APIの抽象化トレイト
#[async_trait]
pub trait PostingClient: Send + Sync {
    /// 認証情報を確認し、ユーザー名を返す
    async fn verify_credentials(&self) -> Result<String>;

    /// テキストのみを投稿し、投稿IDを返す
    async fn post_text(&self, text: &str) -> Result<String>;

    /// テキストと画像を1回の投稿として投稿し、投稿IDを返す
    async fn post_text_with_image(&self, text: &str, image: Vec<u8>) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct UserData {
    username: String,
}

#[derive(Debug, Deserialize)]
struct IdData {
    id: String,
}

/// `reqwest` を使用した本番用の投稿クライアント実装
///
/// ユーザーコンテキストのOAuth 2.0アクセストークンをBearerとして送る。
pub struct ReqwestPostingClient {
    client: Client,
    base_url: String,
    access_token: String,
    timeout: Duration,
}

impl ReqwestPostingClient {
    /// 新しい投稿クライアントを作成
    pub fn new(base_url: &str, access_token: &str, timeout_secs: u64) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.base_url, path))
            .bearer_auth(&self.access_token)
            .timeout(self.timeout)
    }

    async fn send_id(&self, request: RequestBuilder, operation: &str) -> Result<String> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::transport(operation, e))?;
        let envelope: DataEnvelope<IdData> = read_json(response, operation).await?;
        Ok(envelope.data.id)
    }

    async fn upload_media(&self, image: Vec<u8>) -> Result<String> {
        let form = Form::new()
            .text("media_category", "tweet_image")
            .part("media", Part::bytes(image).file_name("thumbnail"));

        self.send_id(
            self.request(reqwest::Method::POST, "2/media/upload")
                .multipart(form),
            "画像のアップロード",
        )
        .await
    }
}

#[async_trait]
impl PostingClient for ReqwestPostingClient {
    async fn verify_credentials(&self) -> Result<String> {
        let operation = "投稿アカウントの確認";
        let response = self
            .request(reqwest::Method::GET, "2/users/me")
            .send()
            .await
            .map_err(|e| ApiError::transport(operation, e))?;
        let envelope: DataEnvelope<UserData> = read_json(response, operation)
            .await
            .context("投稿APIの認証に失敗")?;
        Ok(envelope.data.username)
    }

    async fn post_text(&self, text: &str) -> Result<String> {
        self.send_id(
            self.request(reqwest::Method::POST, "2/tweets")
                .json(&json!({ "text": text })),
            "投稿",
        )
        .await
    }

    async fn post_text_with_image(&self, text: &str, image: Vec<u8>) -> Result<String> {
        let media_id = self.upload_media(image).await?;
        self.send_id(
            self.request(reqwest::Method::POST, "2/tweets").json(&json!({
                "text": text,
                "media": { "media_ids": [media_id] }
            })),
            "画像付き投稿",
        )
        .await
    }
}

/// モック投稿クライアントが受け取った投稿
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockPost {
    pub text: String,
    /// 画像付き投稿の場合は画像のバイト数
    pub image_size: Option<usize>,
}

/// テスト用のモック投稿クライアント
///
/// 実際の投稿は行わず、受け取った投稿を記録します。
/// クローンは記録を共有します。
#[derive(Clone)]
pub struct MockPostingClient {
    screen_name: String,
    error_message: Option<String>,
    posts: Arc<Mutex<Vec<MockPost>>>,
}

impl MockPostingClient {
    /// 投稿に成功するモッククライアントを作成
    pub fn new_success(screen_name: &str) -> Self {
        Self {
            screen_name: screen_name.to_string(),
            error_message: None,
            posts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// すべての呼び出しが失敗するモッククライアントを作成
    pub fn new_error(error_message: &str) -> Self {
        Self {
            screen_name: String::new(),
            error_message: Some(error_message.to_string()),
            posts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// 記録された投稿
    pub fn posts(&self) -> Vec<MockPost> {
        self.posts
            .lock()
            .map(|posts| posts.clone())
            .unwrap_or_default()
    }

    pub fn post_count(&self) -> usize {
        self.posts().len()
    }

    fn record(&self, text: &str, image_size: Option<usize>) -> Result<String> {
        if let Some(message) = &self.error_message {
            return Err(anyhow!("モック投稿エラー: {}", message));
        }

        let mut posts = self
            .posts
            .lock()
            .map_err(|_| anyhow!("モック投稿の記録に失敗"))?;
        posts.push(MockPost {
            text: text.to_string(),
            image_size,
        });
        Ok(format!("mock-{}", posts.len()))
    }
}

#[async_trait]
impl PostingClient for MockPostingClient {
    async fn verify_credentials(&self) -> Result<String> {
        match &self.error_message {
            Some(message) => Err(anyhow!("モック投稿エラー: {}", message)),
            None => Ok(self.screen_name.clone()),
        }
    }

    async fn post_text(&self, text: &str) -> Result<String> {
        self.record(text, None)
    }

    async fn post_text_with_image(&self, text: &str, image: Vec<u8>) -> Result<String> {
        self.record(text, Some(image.len()))
    }
}
