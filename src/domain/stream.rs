//! 記事一覧のページング
//!
//! offset/limit方式で1ページずつ取得し、空ページを受け取った時点で終端とする。
//! 配列ではなく単一レコードが返された場合は、その1件を返して終端とする。

use super::article::{ArticleSummary, ListingPage};
use crate::infra::api::figshare::FigshareClient;
use anyhow::{Context, Result};
use std::collections::VecDeque;

/// 記事一覧を1件ずつ返すページングカーソル
///
/// 一度終端に達したストリームは再開できない。
#[derive(Debug)]
pub struct ArticleStream {
    offset: usize,
    page_size: usize,
    buffer: VecDeque<ArticleSummary>,
    exhausted: bool,
}

impl ArticleStream {
    pub fn new(page_size: usize) -> Self {
        Self {
            offset: 0,
            page_size: page_size.max(1),
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    /// 次の記事を返す。終端に達したらNoneを返す
    ///
    /// バッファが空の場合のみ次のページを取得する。
    pub async fn next<C: FigshareClient + ?Sized>(
        &mut self,
        client: &C,
    ) -> Result<Option<ArticleSummary>> {
        loop {
            if let Some(summary) = self.buffer.pop_front() {
                return Ok(Some(summary));
            }
            if self.exhausted {
                return Ok(None);
            }

            let page = client
                .list_articles(self.offset, self.page_size)
                .await
                .with_context(|| format!("記事一覧の取得に失敗 (offset={})", self.offset))?;

            match page {
                ListingPage::Single(summary) => {
                    self.exhausted = true;
                    self.buffer.push_back(summary);
                }
                ListingPage::Items(items) if items.is_empty() => {
                    self.exhausted = true;
                }
                ListingPage::Items(items) => {
                    self.offset += self.page_size;
                    self.buffer.extend(items);
                }
            }
        }
    }

    /// 次に取得するページのoffset
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted && self.buffer.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::article::Article;
    use crate::infra::api::figshare::MockFigshareClient;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    fn summary(id: &str) -> ArticleSummary {
        ArticleSummary {
            id: id.to_string(),
            title: format!("Article {}", id),
            doi: String::new(),
            published_date: None,
        }
    }

    /// 決められたページを順に返すクライアント
    struct ScriptedClient {
        pages: Mutex<VecDeque<Result<ListingPage>>>,
    }

    impl ScriptedClient {
        fn new(pages: Vec<Result<ListingPage>>) -> Self {
            Self {
                pages: Mutex::new(pages.into_iter().collect()),
            }
        }
    }

    #[async_trait]
    impl FigshareClient for ScriptedClient {
        async fn check_account(&self) -> Result<()> {
            Ok(())
        }

        async fn list_articles(&self, _offset: usize, _limit: usize) -> Result<ListingPage> {
            self.pages
                .lock()
                .map_err(|_| anyhow!("lock"))?
                .pop_front()
                .unwrap_or_else(|| Err(anyhow!("終端後に一覧が要求された")))
        }

        async fn fetch_article(&self, id: &str) -> Result<Article> {
            Err(anyhow!("未使用: {}", id))
        }

        async fn fetch_files(&self, _id: &str) -> Result<Value> {
            Ok(json!([]))
        }

        async fn search_articles(&self, _criteria: &Value) -> Result<Vec<ArticleSummary>> {
            Ok(vec![])
        }
    }

    async fn drain<C: FigshareClient>(stream: &mut ArticleStream, client: &C) -> Vec<String> {
        let mut ids = Vec::new();
        while let Some(summary) = stream.next(client).await.unwrap() {
            ids.push(summary.id);
        }
        ids
    }

    #[tokio::test]
    async fn test_stream_pages_until_empty_page() {
        let mut client = MockFigshareClient::new();
        for id in 1..=5 {
            client = client.with_listing_only(summary(&id.to_string()));
        }

        let mut stream = ArticleStream::new(2);
        let ids = drain(&mut stream, &client).await;

        assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
        assert_eq!(client.list_requests(), vec![(0, 2), (2, 2), (4, 2), (6, 2)]);
        assert!(stream.is_exhausted());
    }

    #[tokio::test]
    async fn test_exhausted_stream_does_not_refetch() {
        let client = MockFigshareClient::new();
        let mut stream = ArticleStream::new(100);

        assert!(stream.next(&client).await.unwrap().is_none());
        assert!(stream.next(&client).await.unwrap().is_none());
        assert_eq!(client.list_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_single_record_ends_stream() {
        let client = ScriptedClient::new(vec![Ok(ListingPage::Single(summary("42")))]);
        let mut stream = ArticleStream::new(100);

        let ids = drain(&mut stream, &client).await;
        assert_eq!(ids, vec!["42"]);
    }

    #[tokio::test]
    async fn test_page_error_propagates() {
        let client = ScriptedClient::new(vec![
            Ok(ListingPage::Items(vec![summary("1")])),
            Err(anyhow!("503")),
        ]);
        let mut stream = ArticleStream::new(1);

        assert_eq!(stream.next(&client).await.unwrap().unwrap().id, "1");
        let error = stream.next(&client).await.unwrap_err();
        assert!(format!("{:#}", error).contains("offset=1"));
    }
}
