//! ビュー投影
//!
//! グリッド・リスト・サムネイルの3ビューを、セッションの状態から毎回導出する。
//! 各画像の状態は `ViewProjector::status_of` だけが決め、ビューは独自の状態を持たない。
//! 選択位置もセッションの1箇所だけを参照する。

use crate::format::{format_file_size, truncate_name, Savings};
use crate::results::ResultStore;
use crate::session::SessionController;
use crate::types::{Payload, ProcessedResult, SessionState, SourceItem};
use base64::{engine::general_purpose, Engine as _};
use std::collections::HashMap;
use std::sync::{Arc, Weak};

/// 画像がない時の表示
pub const EMPTY_MESSAGE: &str = "画像をアップロードするとここに表示されます";

/// グリッドカードで表示するファイル名の最大長
pub const GRID_NAME_LIMIT: usize = 20;

/// 1画像の状態（全ビュー共通）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemStatus {
    Pending,
    Processing,
    Success,
    Failed,
}

impl ItemStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "待機中",
            ItemStatus::Processing => "処理中",
            ItemStatus::Success => "完了",
            ItemStatus::Failed => "失敗",
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    Grid,
    List,
    Thumbnails,
}

impl ViewKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewKind::Grid => "grid",
            ViewKind::List => "list",
            ViewKind::Thumbnails => "thumbnails",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreviewSide {
    Original,
    Processed,
}

/// プレビュー用のdata URL
///
/// 参照しているビューがなくなれば解放される。
#[derive(Debug, PartialEq, Eq)]
pub struct Preview {
    pub index: usize,
    pub side: PreviewSide,
    pub data_url: String,
}

/// (世代, 実行番号, index, 種別)。元画像側の実行番号は常に0
pub type PreviewKey = (u64, u64, usize, PreviewSide);

/// プレビューの共有プール
///
/// 弱参照だけを持つので、どのビューからも参照されなくなったものは自動的に消える。
/// 1枚のプレビューが残り続けても他の画像には影響しない。
#[derive(Debug, Default)]
pub struct PreviewPool {
    entries: HashMap<PreviewKey, Weak<Preview>>,
}

impl PreviewPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// プレビューを取得（生存中のものがあれば共有）
    pub fn acquire<F>(&mut self, key: PreviewKey, make_url: F) -> Arc<Preview>
    where
        F: FnOnce() -> String,
    {
        if let Some(live) = self.entries.get(&key).and_then(Weak::upgrade) {
            return live;
        }
        let (_, _, index, side) = key;
        let preview = Arc::new(Preview {
            index,
            side,
            data_url: make_url(),
        });
        self.entries.insert(key, Arc::downgrade(&preview));
        preview
    }

    /// 解放済みのエントリを取り除く
    pub fn purge(&mut self) {
        self.entries.retain(|_, weak| weak.strong_count() > 0);
    }

    pub fn live_count(&self) -> usize {
        self.entries
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}

fn original_data_url(item: &SourceItem) -> String {
    format!(
        "data:{};base64,{}",
        item.content_type,
        general_purpose::STANDARD.encode(item.content())
    )
}

fn processed_data_url(result: &ProcessedResult) -> String {
    match &result.payload {
        Payload::Base64(data) if data.starts_with("data:") => data.clone(),
        Payload::Base64(data) => format!("data:image/{};base64,{}", result.format, data),
        Payload::Binary(bytes) => format!(
            "data:image/{};base64,{}",
            result.format,
            general_purpose::STANDARD.encode(bytes)
        ),
    }
}

#[derive(Debug, Clone)]
pub struct GridCard {
    pub index: usize,
    pub display_name: String,
    pub status: ItemStatus,
    pub selected: bool,
    pub preview: Arc<Preview>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListRow {
    pub index: usize,
    pub name: String,
    pub status: ItemStatus,
    pub original_size: String,
    pub processed_size: Option<String>,
    pub savings: Option<Savings>,
    pub downloadable: bool,
    pub selected: bool,
}

#[derive(Debug, Clone)]
pub struct ThumbItem {
    pub index: usize,
    pub status: ItemStatus,
    pub selected: bool,
    pub preview: Arc<Preview>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedDetail {
    pub width: u32,
    pub height: u32,
    pub size: String,
    pub format: String,
    pub savings: Option<Savings>,
}

/// 選択中の画像の詳細
#[derive(Debug, Clone, PartialEq)]
pub struct DetailPanel {
    pub index: usize,
    pub name: String,
    pub status: ItemStatus,
    pub original_size: String,
    pub original_format: String,
    pub processed: Option<ProcessedDetail>,
}

/// 操作の有効/無効
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Controls {
    pub files_count: usize,
    pub can_run: bool,
    pub can_cancel: bool,
    pub can_clear: bool,
    pub can_download_selected: bool,
    pub can_download_all: bool,
    /// 全画像の変換に成功したか
    pub all_converted: bool,
    pub progress_label: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RenderedViews {
    pub grid: Vec<GridCard>,
    pub list: Vec<ListRow>,
    pub thumbnails: Vec<ThumbItem>,
    pub detail: Option<DetailPanel>,
    pub controls: Controls,
}

impl RenderedViews {
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

/// セッションを読み取り専用で参照してビューを導出する
pub struct ViewProjector<'a> {
    session: &'a SessionController,
}

impl<'a> ViewProjector<'a> {
    pub fn new(session: &'a SessionController) -> Self {
        Self { session }
    }

    fn results(&self) -> &'a ResultStore {
        self.session.results()
    }

    /// 画像の状態を決める唯一の関数
    pub fn status_of(&self, index: usize) -> ItemStatus {
        if self.results().get(index).is_some() {
            return ItemStatus::Success;
        }
        let state = self.session.state();
        if state == SessionState::Processing {
            return match self.session.progress().cursor() {
                Some(cursor) if index <= cursor => ItemStatus::Processing,
                _ => ItemStatus::Pending,
            };
        }
        if state.run_finished() {
            ItemStatus::Failed
        } else {
            ItemStatus::Pending
        }
    }

    pub fn statuses(&self) -> Vec<ItemStatus> {
        (0..self.session.registry().len())
            .map(|i| self.status_of(i))
            .collect()
    }

    fn is_selected(&self, index: usize) -> bool {
        self.session.selection() == index
    }

    fn preview_for(&self, pool: &mut PreviewPool, item: &SourceItem) -> Arc<Preview> {
        let generation = self.session.generation();
        match self.results().get(item.index) {
            Some(result) => pool.acquire((generation, self.session.run_count(), item.index, PreviewSide::Processed), || {
                processed_data_url(result)
            }),
            None => pool.acquire((generation, 0, item.index, PreviewSide::Original), || {
                original_data_url(item)
            }),
        }
    }

    pub fn grid(&self, pool: &mut PreviewPool) -> Vec<GridCard> {
        self.session
            .registry()
            .items()
            .iter()
            .map(|item| GridCard {
                index: item.index,
                display_name: truncate_name(&item.name, GRID_NAME_LIMIT),
                status: self.status_of(item.index),
                selected: self.is_selected(item.index),
                preview: self.preview_for(pool, item),
            })
            .collect()
    }

    pub fn list(&self) -> Vec<ListRow> {
        self.session
            .registry()
            .items()
            .iter()
            .map(|item| {
                let result = self.results().get(item.index);
                ListRow {
                    index: item.index,
                    name: item.name.clone(),
                    status: self.status_of(item.index),
                    original_size: format_file_size(item.byte_size),
                    processed_size: result.map(|r| format_file_size(r.byte_size)),
                    savings: result.and_then(|r| Savings::compute(item.byte_size, r.byte_size)),
                    downloadable: result.is_some(),
                    selected: self.is_selected(item.index),
                }
            })
            .collect()
    }

    pub fn thumbnails(&self, pool: &mut PreviewPool) -> Vec<ThumbItem> {
        self.session
            .registry()
            .items()
            .iter()
            .map(|item| ThumbItem {
                index: item.index,
                status: self.status_of(item.index),
                selected: self.is_selected(item.index),
                preview: self.preview_for(pool, item),
            })
            .collect()
    }

    /// 選択中の画像の詳細（画像がなければ `None`）
    pub fn detail(&self) -> Option<DetailPanel> {
        let index = self.session.selection();
        let item = self.session.registry().get(index)?;
        let processed = self.results().get(index).map(|r| ProcessedDetail {
            width: r.width,
            height: r.height,
            size: format_file_size(r.byte_size),
            format: r.format.to_uppercase(),
            savings: Savings::compute(item.byte_size, r.byte_size),
        });

        Some(DetailPanel {
            index,
            name: item.name.clone(),
            status: self.status_of(index),
            original_size: format_file_size(item.byte_size),
            original_format: item
                .extension()
                .map(str::to_uppercase)
                .unwrap_or_else(|| "UNKNOWN".to_string()),
            processed,
        })
    }

    pub fn controls(&self) -> Controls {
        let session = self.session;
        let registry_len = session.registry().len();
        let progress = session.progress();
        Controls {
            files_count: registry_len,
            can_run: session.state() != SessionState::Processing && registry_len > 0,
            can_cancel: session.cancel_available(),
            can_clear: registry_len > 0,
            can_download_selected: self.results().get(session.selection()).is_some(),
            can_download_all: !self.results().is_empty(),
            all_converted: self.results().is_complete(registry_len),
            progress_label: (progress.total() > 0).then(|| progress.label()),
        }
    }

    /// 全ビューを同じ状態から一度に導出する
    pub fn render_all(&self, pool: &mut PreviewPool) -> RenderedViews {
        RenderedViews {
            grid: self.grid(pool),
            list: self.list(),
            thumbnails: self.thumbnails(pool),
            detail: self.detail(),
            controls: self.controls(),
        }
    }
}
