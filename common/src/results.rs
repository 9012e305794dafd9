//! 変換結果ストア
//!
//! 元画像のindexをキーにした疎なストア。失敗した画像はエントリを持たない。

use crate::types::ProcessedResult;
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone)]
pub struct ResultStore {
    entries: BTreeMap<usize, ProcessedResult>,
}

impl ResultStore {
    /// 結果を登録（`result.index` はキーに揃える）
    pub(crate) fn set(&mut self, index: usize, mut result: ProcessedResult) {
        result.index = index;
        self.entries.insert(index, result);
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, index: usize) -> Option<&ProcessedResult> {
        self.entries.get(&index)
    }

    pub fn success_count(&self) -> usize {
        self.entries.len()
    }

    /// 結果を持つindex（昇順）
    pub fn all_indices(&self) -> Vec<usize> {
        self.entries.keys().copied().collect()
    }

    /// レジストリの全indexに結果があるか
    pub fn is_complete(&self, registry_len: usize) -> bool {
        registry_len > 0 && (0..registry_len).all(|i| self.entries.contains_key(&i))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProcessedResult> {
        self.entries.values()
    }
}
