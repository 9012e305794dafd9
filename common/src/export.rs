//! エクスポート
//!
//! 結果ストアを読み取ってダウンロード用の成果物を作る。
//! アーカイブ作成は外部の `ArchiveBuilder` に任せ、無い場合は個別ファイルを順に出す。

use crate::error::ExportError;
use crate::registry::SourceRegistry;
use crate::results::ResultStore;
use crate::types::{ProcessedResult, TargetFormat};
use tracing::{debug, info};

/// ダウンロード可能な成果物（バイト列 + 推奨ファイル名）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// アーカイブ作成機能
pub trait ArchiveBuilder {
    fn build(&self, archive_name: &str, entries: &[Artifact]) -> Result<Artifact, ExportError>;
}

/// 一括エクスポートの結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkExport {
    /// 1つのアーカイブにまとめた
    Archive(Artifact),
    /// アーカイブ機能がないため個別ファイルとして出す（順番に保存する）
    Sequential(Vec<Artifact>),
}

/// 変換後のファイル名 `{元の名前から拡張子を除いたもの}_processed.{形式}`
///
/// 同名の別ファイルとの衝突は考慮しない。
pub fn processed_file_name(original: &str, format: &str) -> String {
    let base = original.rsplit_once('.').map_or(original, |(base, _)| base);
    format!("{}_processed.{}", base, format)
}

/// 結果の形式名からMIMEタイプ（未知の形式は `image/{形式}`）
fn mime_for(format: &str) -> String {
    format
        .parse::<TargetFormat>()
        .map(|f| f.mime_type().to_string())
        .unwrap_or_else(|_| format!("image/{}", format))
}

/// アーカイブ名 `processed_images_{unixミリ秒}.zip`
pub fn archive_file_name(unix_millis: i64) -> String {
    format!("processed_images_{}.zip", unix_millis)
}

/// レジストリと結果ストアを読み取るだけのエクスポート担当
pub struct ExportCoordinator<'a> {
    registry: &'a SourceRegistry,
    results: &'a ResultStore,
}

impl<'a> ExportCoordinator<'a> {
    pub fn new(registry: &'a SourceRegistry, results: &'a ResultStore) -> Self {
        Self { registry, results }
    }

    fn artifact_for(&self, index: usize, result: &ProcessedResult) -> Result<Artifact, ExportError> {
        let bytes = result
            .payload
            .decode()
            .map_err(|e| ExportError::CorruptPayload {
                index,
                reason: e.to_string(),
            })?;

        let original = self
            .registry
            .get(index)
            .map(|item| item.name.as_str())
            .filter(|name| !name.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("image_{}", index));

        Ok(Artifact {
            file_name: processed_file_name(&original, &result.format),
            mime: mime_for(&result.format),
            bytes,
        })
    }

    /// 1枚分の成果物
    pub fn export_single(&self, index: usize) -> Result<Artifact, ExportError> {
        let result = self.results.get(index).ok_or(ExportError::NotReady(index))?;
        let artifact = self.artifact_for(index, result)?;
        debug!(index, file = %artifact.file_name, "single export prepared");
        Ok(artifact)
    }

    /// 成功した全画像の成果物（index順、失敗分は飛ばす）
    pub fn collect_all(&self) -> Result<Vec<Artifact>, ExportError> {
        if self.results.is_empty() {
            return Err(ExportError::NothingToExport);
        }

        let mut artifacts = Vec::with_capacity(self.results.success_count());
        for index in 0..self.registry.len() {
            match self.results.get(index) {
                Some(result) => artifacts.push(self.artifact_for(index, result)?),
                None => debug!(index, "no result; skipped"),
            }
        }

        if artifacts.is_empty() {
            return Err(ExportError::NothingToExport);
        }
        Ok(artifacts)
    }

    /// 全件をアーカイブにまとめる（アーカイブ機能がなければ個別ファイル）
    pub fn export_all(
        &self,
        archiver: Option<&dyn ArchiveBuilder>,
        archive_name: &str,
    ) -> Result<BulkExport, ExportError> {
        let artifacts = self.collect_all()?;
        match archiver {
            Some(builder) => {
                let archive = builder.build(archive_name, &artifacts)?;
                info!(entries = artifacts.len(), archive = %archive.file_name, "archive built");
                Ok(BulkExport::Archive(archive))
            }
            None => {
                info!(files = artifacts.len(), "no archiver; falling back to sequential files");
                Ok(BulkExport::Sequential(artifacts))
            }
        }
    }
}
