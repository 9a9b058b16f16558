use super::article::FileRecord;
use serde_json::Value;

/// サムネイルとして扱う画像拡張子のデフォルト
pub const DEFAULT_IMAGE_EXTENSIONS: [&str; 2] = [".png", ".jpg"];

/// デフォルトの画像拡張子をVecとして返す（設定のデフォルト値用）
pub fn default_image_extensions() -> Vec<String> {
    DEFAULT_IMAGE_EXTENSIONS
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

/// ファイル一覧からサムネイル画像のURLを選ぶ
///
/// 一覧の順に調べ、リンクのみのレコードは読み飛ばす。
/// ファイル名（大文字小文字を区別しない）が画像拡張子で終わる最初のレコードで探索を終え、
/// そのダウンロードURLを返す。URLが空なら画像なしとする。
pub fn select_image(files: &[FileRecord], extensions: &[String]) -> Option<String> {
    files
        .iter()
        .filter(|file| !file.is_link_only)
        .find(|file| {
            let name = file.name.to_lowercase();
            extensions
                .iter()
                .any(|ext| name.ends_with(&ext.to_lowercase()))
        })
        .map(|file| file.download_url.clone())
        .filter(|url| !url.is_empty())
}

/// ファイル一覧APIのレスポンスから直接サムネイル画像のURLを選ぶ
///
/// 配列以外のレスポンスは画像なしとして扱う。
pub fn resolve_image_url(files: &Value, extensions: &[String]) -> Option<String> {
    select_image(&FileRecord::list_from_value(files), extensions)
}
