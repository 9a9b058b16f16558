use thiserror::Error;

/// 外部API通信のエラー型
/// 論文リポジトリAPIと投稿APIの両方で共通して使用する
#[derive(Error, Debug)]
pub enum ApiError {
    /// 通信エラー（接続失敗、タイムアウトなど）
    #[error("通信エラー: {operation} - {source}")]
    Transport {
        operation: String,
        #[source]
        source: reqwest::Error,
    },

    /// 成功以外のHTTPステータス
    #[error("HTTPステータスエラー: {operation} - {status} {body}")]
    Status {
        operation: String,
        status: u16,
        body: String,
    },

    /// レスポンスJSONの解析エラー
    #[error("JSON処理エラー: {context} - {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// 通信エラーを作成
    pub fn transport<O: Into<String>>(operation: O, source: reqwest::Error) -> Self {
        Self::Transport {
            operation: operation.into(),
            source,
        }
    }

    /// HTTPステータスエラーを作成
    pub fn status<O: Into<String>, B: Into<String>>(operation: O, status: u16, body: B) -> Self {
        Self::Status {
            operation: operation.into(),
            status,
            body: body.into(),
        }
    }

    /// JSON処理エラーを作成
    pub fn json<C: Into<String>>(context: C, source: serde_json::Error) -> Self {
        Self::Json {
            context: context.into(),
            source,
        }
    }
}

/// API通信エラーのResult型エイリアス
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let error = ApiError::status("アカウント確認", 401, "bad token");
        let message = error.to_string();

        assert!(message.contains("アカウント確認"));
        assert!(message.contains("401"));
        assert!(message.contains("bad token"));
    }
}
