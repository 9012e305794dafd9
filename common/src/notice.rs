//! 一時通知（一定時間で自動的に消える）

use std::time::{Duration, Instant};

/// 既定の表示時間
pub const DEFAULT_NOTICE_LIFETIME: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    posted_at: Instant,
    lifetime: Duration,
}

impl Notice {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.posted_at) >= self.lifetime
    }
}

/// 通知は常に最新の1件だけを保持する
#[derive(Debug, Clone)]
pub struct NoticeBoard {
    lifetime: Duration,
    current: Option<Notice>,
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new(DEFAULT_NOTICE_LIFETIME)
    }
}

impl NoticeBoard {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            lifetime,
            current: None,
        }
    }

    pub fn post(&mut self, level: NoticeLevel, message: impl Into<String>, now: Instant) -> &Notice {
        self.current.insert(Notice {
            level,
            message: message.into(),
            posted_at: now,
            lifetime: self.lifetime,
        })
    }

    pub fn error(&mut self, message: impl Into<String>, now: Instant) -> &Notice {
        self.post(NoticeLevel::Error, message, now)
    }

    pub fn info(&mut self, message: impl Into<String>, now: Instant) -> &Notice {
        self.post(NoticeLevel::Info, message, now)
    }

    /// 表示中の通知（期限切れなら破棄して `None`）
    pub fn current(&mut self, now: Instant) -> Option<&Notice> {
        if self.current.as_ref().is_some_and(|n| n.is_expired(now)) {
            self.current = None;
        }
        self.current.as_ref()
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_auto_dismiss() {
        let mut board = NoticeBoard::new(Duration::from_millis(100));
        let start = Instant::now();
        board.error("処理に失敗しました", start);

        let shown = board.current(start + Duration::from_millis(50)).expect("表示中");
        assert_eq!(shown.level, NoticeLevel::Error);
        assert!(board.current(start + Duration::from_millis(100)).is_none());
    }

    #[test]
    fn test_newer_notice_replaces_older() {
        let mut board = NoticeBoard::default();
        let now = Instant::now();
        board.info("first", now);
        board.error("second", now);
        assert_eq!(board.current(now).unwrap().message, "second");

        board.dismiss();
        assert!(board.current(now).is_none());
    }
}
