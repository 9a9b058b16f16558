//! 処理済み記事IDの重複ログ
//!
//! 1行1IDの追記専用テキストファイル。起動時に全件をメモリへ読み込み、
//! 記録のたびにファイルへ追記して同期する。

use crate::types::{InfraError, InfraResult};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// 処理済みの記事IDを保持する追記専用の集合
#[derive(Debug)]
pub struct DedupStore {
    path: PathBuf,
    file: File,
    processed_ids: HashSet<String>,
    /// 既存ファイルが改行で終わっていない場合、次の追記の前に改行を補う
    needs_separator: bool,
}

impl DedupStore {
    /// 重複ログを開く。ファイルがなければ空のログを作成する
    pub fn open(path: &Path) -> InfraResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| InfraError::file_system(path.display().to_string(), e))?;

        let content = std::fs::read(path)
            .map_err(|e| InfraError::file_system(path.display().to_string(), e))?;
        let processed_ids = String::from_utf8_lossy(&content)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        let needs_separator = content.last().is_some_and(|byte| *byte != b'\n');

        Ok(Self {
            path: path.to_path_buf(),
            file,
            processed_ids,
            needs_separator,
        })
    }

    /// 処理済みかどうか
    pub fn contains(&self, id: &str) -> bool {
        self.processed_ids.contains(id)
    }

    /// IDを処理済みとして記録する
    ///
    /// ファイルへの書き込みを同期してから返る。記録済みのIDは何もしない。
    pub fn commit(&mut self, id: &str) -> InfraResult<()> {
        if self.contains(id) {
            return Ok(());
        }

        let separator = if self.needs_separator { "\n" } else { "" };
        writeln!(self.file, "{}{}", separator, id)
            .and_then(|_| self.file.flush())
            .and_then(|_| self.file.sync_all())
            .map_err(|e| InfraError::file_system(self.path.display().to_string(), e))?;

        self.needs_separator = false;
        self.processed_ids.insert(id.to_string());
        Ok(())
    }

    /// 記録済みのID数
    pub fn len(&self) -> usize {
        self.processed_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processed_ids.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
