pub mod article;
pub mod dedup;
pub mod image;
pub mod message;
pub mod stream;

// 公開APIの再エクスポート
pub use article::{Article, ArticleSummary, Author, FileRecord, ListingPage};
pub use dedup::DedupStore;
pub use image::{resolve_image_url, select_image};
pub use message::{compose, AuthorAttribution, ComposeError, ComposedMessage, MessagePolicy};
pub use stream::ArticleStream;
