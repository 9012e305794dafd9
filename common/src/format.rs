//! 表示用の整形ユーティリティ

/// ファイルサイズを `1.5 KB` 形式に整形
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let text = format!("{:.2}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", text, UNITS[unit])
}

/// 変換前後のサイズ差（正なら削減）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Savings {
    pub percent: f64,
}

impl Savings {
    /// 元サイズが0の場合は計算しない
    pub fn compute(original: u64, processed: u64) -> Option<Self> {
        if original == 0 {
            return None;
        }
        let percent = (original as f64 - processed as f64) / original as f64 * 100.0;
        Some(Self {
            percent: (percent * 10.0).round() / 10.0,
        })
    }

    pub fn is_saving(&self) -> bool {
        self.percent > 0.0
    }
}

impl std::fmt::Display for Savings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_saving() {
            write!(f, "{:.1}% 削減", self.percent)
        } else {
            write!(f, "{:.1}% 増加", self.percent.abs())
        }
    }
}

/// 長いファイル名を省略（`max` 文字を超えたら先頭 `max - 2` 文字 + `...`）
pub fn truncate_name(name: &str, max: usize) -> String {
    if name.chars().count() <= max {
        return name.to_string();
    }
    let head: String = name.chars().take(max.saturating_sub(2)).collect();
    format!("{}...", head)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1_048_576), "1 MB");
        assert_eq!(format_file_size(1_288_490_189), "1.2 GB");
    }

    #[test]
    fn test_format_file_size_caps_at_gb() {
        assert_eq!(format_file_size(2 * 1024 * 1024 * 1024 * 1024), "2048 GB");
    }

    #[test]
    fn test_savings() {
        let saved = Savings::compute(1000, 250).unwrap();
        assert_eq!(saved.percent, 75.0);
        assert!(saved.is_saving());
        assert_eq!(saved.to_string(), "75.0% 削減");

        let grew = Savings::compute(1000, 1123).unwrap();
        assert!(!grew.is_saving());
        assert_eq!(grew.to_string(), "12.3% 増加");

        assert!(Savings::compute(0, 10).is_none());
    }

    #[test]
    fn test_truncate_name() {
        assert_eq!(truncate_name("short.png", 20), "short.png");
        assert_eq!(
            truncate_name("a_really_long_file_name.jpeg", 20),
            "a_really_long_file..."
        );
        assert_eq!(truncate_name("写真写真写真写真写真写真写真写真写真写真写真.png", 20).chars().count(), 21);
    }
}
