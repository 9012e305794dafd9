//! ビューのテキスト表示

use image_batch_common::view::{Controls, DetailPanel, GridCard, ListRow, ThumbItem, EMPTY_MESSAGE};
use image_batch_common::{ItemStatus, SessionState};
use std::fmt::Write;

fn marker(selected: bool) -> &'static str {
    if selected {
        ">"
    } else {
        " "
    }
}

fn status_icon(status: ItemStatus) -> &'static str {
    match status {
        ItemStatus::Pending => "·",
        ItemStatus::Processing => "…",
        ItemStatus::Success => "✔",
        ItemStatus::Failed => "✘",
    }
}

/// グリッド（1行4枚）
pub fn render_grid(cards: &[GridCard]) -> String {
    if cards.is_empty() {
        return format!("  {}\n", EMPTY_MESSAGE);
    }
    let mut out = String::new();
    for row in cards.chunks(4) {
        let line: Vec<String> = row
            .iter()
            .map(|card| {
                format!(
                    "{}[{:>2}] {} {:<21}",
                    marker(card.selected),
                    card.index,
                    status_icon(card.status),
                    card.display_name
                )
            })
            .collect();
        let _ = writeln!(out, "{}", line.join(" ").trim_end());
    }
    out
}

/// リスト（1行1枚、サイズと削減率）
pub fn render_list(rows: &[ListRow]) -> String {
    if rows.is_empty() {
        return format!("  {}\n", EMPTY_MESSAGE);
    }
    let mut out = String::new();
    for row in rows {
        let processed = row.processed_size.as_deref().unwrap_or("-");
        let savings = row
            .savings
            .map(|s| s.to_string())
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "{}[{:>2}] {} {}  {} → {}  {}",
            marker(row.selected),
            row.index,
            row.status,
            row.name,
            row.original_size,
            processed,
            savings
        );
    }
    out
}

/// サムネイル帯（状態アイコンのみ）
pub fn render_thumbnails(items: &[ThumbItem]) -> String {
    if items.is_empty() {
        return format!("  {}\n", EMPTY_MESSAGE);
    }
    let strip: Vec<String> = items
        .iter()
        .map(|item| {
            if item.selected {
                format!("[{}]", status_icon(item.status))
            } else {
                format!(" {} ", status_icon(item.status))
            }
        })
        .collect();
    format!("{}\n", strip.join(""))
}

/// 選択中の詳細
pub fn render_detail(detail: Option<&DetailPanel>) -> String {
    let Some(detail) = detail else {
        return format!("  {}\n", EMPTY_MESSAGE);
    };
    let mut out = String::new();
    let _ = writeln!(out, "#{} {} ({})", detail.index, detail.name, detail.status);
    let _ = writeln!(out, "  元画像: {} / {}", detail.original_format, detail.original_size);
    match &detail.processed {
        Some(p) => {
            let _ = writeln!(
                out,
                "  変換後: {} / {} / {}x{}",
                p.format, p.size, p.width, p.height
            );
            if let Some(savings) = p.savings {
                let _ = writeln!(out, "  圧縮率: {}", savings);
            }
        }
        None => {
            let _ = writeln!(out, "  変換後: -");
        }
    }
    out
}

/// 状態行
pub fn render_status(state: SessionState, controls: &Controls) -> String {
    let mut parts = vec![format!("状態: {}", state), format!("{}枚", controls.files_count)];
    if let Some(label) = &controls.progress_label {
        parts.push(format!("進捗: {}", label));
    }
    if controls.all_converted {
        parts.push("全件変換済み".to_string());
    }
    if controls.can_cancel {
        parts.push("キャンセル可".to_string());
    }
    parts.join(" | ")
}
