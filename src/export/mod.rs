pub mod archive;
pub mod download;

pub use archive::ZipArchiver;
pub use download::{deliver_staggered, DirectorySink, DownloadSink};

use crate::error::Result;
use image_batch_common::{archive_file_name, ArchiveBuilder, BulkExport, SessionController};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 一括エクスポートの方法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkMode {
    /// ZIPにまとめる
    Archive,
    /// 個別ファイルを間隔をあけて保存
    Sequential { stagger: Duration },
}

/// 保存したファイル
#[derive(Debug, Clone, Default)]
pub struct ExportSummary {
    pub written: Vec<PathBuf>,
    pub archived: bool,
}

/// 選択中などの1枚を保存
pub fn export_single_to_dir(session: &SessionController, index: usize, output_dir: &Path) -> Result<PathBuf> {
    let artifact = session.exporter().export_single(index)?;
    DirectorySink::new(output_dir).deliver(&artifact)
}

/// 成功した全画像を保存
pub async fn export_all_to_dir(session: &SessionController, output_dir: &Path, mode: BulkMode) -> Result<ExportSummary> {
    let archiver = ZipArchiver;
    let (builder, stagger): (Option<&dyn ArchiveBuilder>, Duration) = match mode {
        BulkMode::Archive => (Some(&archiver as &dyn ArchiveBuilder), Duration::ZERO),
        BulkMode::Sequential { stagger } => (None, stagger),
    };

    let name = archive_file_name(chrono::Utc::now().timestamp_millis());
    let bulk = session.exporter().export_all(builder, &name)?;

    let mut sink = DirectorySink::new(output_dir);
    match bulk {
        BulkExport::Archive(archive) => Ok(ExportSummary {
            written: vec![sink.deliver(&archive)?],
            archived: true,
        }),
        BulkExport::Sequential(files) => Ok(ExportSummary {
            written: deliver_staggered(&mut sink, &files, stagger).await?,
            archived: false,
        }),
    }
}
