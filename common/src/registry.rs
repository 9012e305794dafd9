//! 元画像レジストリ
//!
//! 取り込み順を保持し、`items[i].index == i` を常に満たす。
//! 変更はセッションコントローラ経由のみ。

use crate::error::ValidationError;
use crate::types::{SourceFile, SourceItem};

#[derive(Debug, Default)]
pub struct SourceRegistry {
    items: Vec<SourceItem>,
}

impl SourceRegistry {
    /// 画像以外を除外して登録内容を置き換える
    ///
    /// 画像が1枚もなければ `NoValidImages` を返し、既存の内容はそのまま残す。
    pub(crate) fn ingest(&mut self, files: Vec<SourceFile>) -> Result<usize, ValidationError> {
        let images: Vec<SourceFile> = files.into_iter().filter(SourceFile::is_image).collect();
        if images.is_empty() {
            return Err(ValidationError::NoValidImages);
        }

        self.items = images
            .into_iter()
            .enumerate()
            .map(|(index, file)| SourceItem::from_file(index, file))
            .collect();
        Ok(self.items.len())
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
    }

    pub fn items(&self) -> &[SourceItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&SourceItem> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        index < self.items.len()
    }
}
