/// 1回の巡回処理の集計結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// 重複ログに存在しなかった新着記事の件数
    pub found: usize,
    /// 重複ログに記録した件数
    pub processed: usize,
    /// 投稿（またはオフライン投稿）した件数
    pub posted: usize,
    /// メッセージ作成に失敗し手動確認が必要な件数
    pub failed: usize,
    /// 詳細取得に失敗し次回に持ち越した件数
    pub skipped_fetch: usize,
}

impl RunSummary {
    /// 空の結果を作成
    pub fn empty() -> Self {
        Self::default()
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "全記事を確認しました。新着{}件中{}件を処理: 投稿{}件、投稿失敗{}件、取得エラー{}件",
            self.found, self.processed, self.posted, self.failed, self.skipped_fetch
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_summary_display() {
        let summary = RunSummary {
            found: 3,
            processed: 2,
            posted: 1,
            failed: 1,
            skipped_fetch: 1,
        };

        let text = summary.to_string();
        assert!(text.contains("新着3件中2件を処理"));
        assert!(text.contains("投稿1件"));
        assert!(text.contains("投稿失敗1件"));
        assert!(text.contains("取得エラー1件"));
    }

    #[test]
    fn test_run_summary_empty() {
        assert_eq!(RunSummary::empty(), RunSummary::default());
    }
}
