use crate::types::{InfraError, InfraResult};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// ファイルパスからBufReaderを作成する
/// パースやデータ変換は各ドメインで行う
pub fn load_file(file_path: &Path) -> InfraResult<BufReader<File>> {
    let file = File::open(file_path)
        .map_err(|e| InfraError::file_system(file_path.display().to_string(), e))?;
    Ok(BufReader::new(file))
}

/// YAMLファイルからSerdeでDeserializeできる型を読み込む
pub fn load_yaml_from_file<T: DeserializeOwned>(file_path: &Path) -> InfraResult<T> {
    let buf_reader = load_file(file_path)?;
    serde_yaml::from_reader(buf_reader)
        .map_err(|e| InfraError::yaml(file_path.display().to_string(), e))
}

/// 1行1値のテキストファイルを読み込む
///
/// 各行の前後の空白を取り除き、空行は読み飛ばす。
pub fn load_lines(file_path: &Path) -> InfraResult<Vec<String>> {
    let buf_reader = load_file(file_path)?;
    let mut lines = Vec::new();

    for line in buf_reader.lines() {
        let line = line.map_err(|e| InfraError::file_system(file_path.display().to_string(), e))?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            lines.push(trimmed.to_string());
        }
    }

    Ok(lines)
}
