use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};

/// 文字列を日付型に変換するヘルパー関数
///
/// figshare APIが返すRFC 3339形式（`2021-03-01T09:50:10Z`など）を想定し、
/// タイムゾーン付きの値は`DateTime<Utc>`に変換する。
/// タイムゾーンが省略された値はUTCとして扱う。
pub fn parse_date(date_str: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        return Ok(dt.with_timezone(&Utc));
    }

    chrono::NaiveDateTime::parse_from_str(date_str, "%Y-%m-%dT%H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|_| anyhow!("不正な日付形式: {}", date_str))
}
