//! 擬似進捗
//!
//! エンジン呼び出しは一括リクエスト1回で途中経過を返さないため、
//! ローカルのカウンタを時間で進めて表示に使う。
//! 実際の完了数とは一致しない（表示用のベストエフォート）。

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyntheticProgress {
    total: usize,
    cursor: usize,
    running: bool,
    finished: bool,
}

impl SyntheticProgress {
    pub(crate) fn start(&mut self, total: usize) {
        *self = Self {
            total,
            cursor: 0,
            running: total > 0,
            finished: false,
        };
    }

    /// カーソルを1つ進める（最後の1枚の手前で止まる）
    pub fn advance(&mut self) -> Option<usize> {
        if !self.running {
            return None;
        }
        if self.cursor + 1 < self.total {
            self.cursor += 1;
        }
        Some(self.cursor)
    }

    pub(crate) fn finish(&mut self) {
        self.running = false;
        self.finished = true;
        self.cursor = self.total;
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    /// 処理中として表示する位置（実行中のみ）
    pub fn cursor(&self) -> Option<usize> {
        self.running.then_some(self.cursor)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// 完了扱いの枚数
    pub fn done(&self) -> usize {
        if self.finished {
            self.total
        } else if self.running {
            self.cursor
        } else {
            0
        }
    }

    pub fn ratio(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.done() as f32 / self.total as f32
        }
    }

    /// `2/5 (40%)` 形式
    pub fn label(&self) -> String {
        format!(
            "{}/{} ({:.0}%)",
            self.done(),
            self.total,
            (self.ratio() * 100.0).round()
        )
    }
}
