use crate::error::{ImageBatchError, Result};
use image::ImageFormat;
use image_batch_common::SourceFile;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// 判定できないファイルのcontent-type
pub const UNKNOWN_CONTENT_TYPE: &str = "application/octet-stream";

/// 拡張子からcontent-typeを判定
pub fn content_type_for(path: &Path) -> &'static str {
    ImageFormat::from_path(path)
        .map(|format| format.to_mime_type())
        .unwrap_or(UNKNOWN_CONTENT_TYPE)
}

/// フォルダ内のファイルを列挙（ファイル名順）
///
/// 画像かどうかはここでは判定しない（取り込み時に除外される）。
pub fn scan_folder(folder: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    if !folder.exists() {
        return Err(ImageBatchError::FolderNotFound(folder.display().to_string()));
    }

    let mut files: Vec<PathBuf> = WalkDir::new(folder)
        .max_depth(if recursive { usize::MAX } else { 1 })
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// 引数のパス（ファイルまたはフォルダ）を展開
pub fn collect_paths(paths: &[PathBuf], recursive: bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(scan_folder(path, recursive)?);
        } else if path.is_file() {
            files.push(path.clone());
        } else {
            return Err(ImageBatchError::FolderNotFound(path.display().to_string()));
        }
    }
    Ok(files)
}

/// ファイルを読み込んで取り込み用の `SourceFile` にする
pub fn load_file(path: &Path) -> Result<SourceFile> {
    let bytes = std::fs::read(path)
        .map_err(|e| ImageBatchError::ImageLoad(format!("{}: {}", path.display(), e)))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    Ok(SourceFile::new(name, content_type_for(path), bytes))
}

/// 拡張子から画像と判定できるか
pub fn is_image_path(path: &Path) -> bool {
    content_type_for(path).starts_with("image/")
}

/// パスを展開して画像ファイルだけを読み込む
///
/// 画像以外は中身を読まずに除外する。
pub fn load_sources(paths: &[PathBuf], recursive: bool) -> Result<Vec<SourceFile>> {
    let files = collect_paths(paths, recursive)?;
    let (images, skipped): (Vec<PathBuf>, Vec<PathBuf>) = files.into_iter().partition(|p| is_image_path(p));
    let sources = images
        .iter()
        .map(|path| load_file(path))
        .collect::<Result<Vec<_>>>()?;
    debug!(count = sources.len(), skipped = skipped.len(), "source files loaded");
    Ok(sources)
}
