//! プレプリントリポジトリの新着記事を投稿APIへ告知するボット

pub mod app;
pub mod domain;
pub mod infra;
pub mod task;
pub mod types;
