use image_batch_common::{ArchiveBuilder, Artifact, ExportError};
use std::collections::HashSet;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// 無圧縮ZIPでまとめる
///
/// 画像は圧縮済みなので Stored で格納する。タイムスタンプは固定値なので、
/// 同じ内容からは同じアーカイブができる。
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipArchiver;

impl ZipArchiver {
    pub const MIME: &'static str = "application/zip";
}

/// 同名エントリには ` (1)` `(2)`... を付ける
fn unique_entry_names(entries: &[Artifact]) -> Vec<String> {
    let mut seen = HashSet::new();
    entries
        .iter()
        .map(|entry| {
            let mut name = entry.file_name.clone();
            let mut n = 1;
            while !seen.insert(name.clone()) {
                name = match entry.file_name.rsplit_once('.') {
                    Some((base, ext)) => format!("{} ({}).{}", base, n, ext),
                    None => format!("{} ({})", entry.file_name, n),
                };
                n += 1;
            }
            name
        })
        .collect()
}

impl ArchiveBuilder for ZipArchiver {
    fn build(&self, archive_name: &str, entries: &[Artifact]) -> Result<Artifact, ExportError> {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .last_modified_time(DateTime::default());

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (entry, name) in entries.iter().zip(unique_entry_names(entries)) {
            writer.start_file(name, options).map_err(|e| ExportError::Archive(e.to_string()))?;
            writer.write_all(&entry.bytes).map_err(|e| ExportError::Archive(e.to_string()))?;
        }
        let cursor = writer.finish().map_err(|e| ExportError::Archive(e.to_string()))?;

        Ok(Artifact {
            file_name: archive_name.to_string(),
            mime: Self::MIME.to_string(),
            bytes: cursor.into_inner(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    fn artifact(name: &str, bytes: &[u8]) -> Artifact {
        Artifact {
            file_name: name.to_string(),
            mime: "image/png".to_string(),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn test_zip_contains_entries() {
        let entries = vec![artifact("a_processed.png", b"aaa"), artifact("b_processed.png", b"bb")];
        let archive = ZipArchiver.build("out.zip", &entries).unwrap();
        assert_eq!(archive.file_name, "out.zip");
        assert_eq!(archive.mime, "application/zip");

        let mut zip = ZipArchive::new(Cursor::new(archive.bytes)).unwrap();
        assert_eq!(zip.len(), 2);
        let mut content = Vec::new();
        zip.by_name("b_processed.png").unwrap().read_to_end(&mut content).unwrap();
        assert_eq!(content, b"bb");
    }

    #[test]
    fn test_duplicate_names_are_suffixed() {
        let entries = vec![
            artifact("a_processed.png", b"1"),
            artifact("a_processed.png", b"2"),
            artifact("a_processed.png", b"3"),
        ];
        let names = unique_entry_names(&entries);
        assert_eq!(
            names,
            vec!["a_processed.png", "a_processed (1).png", "a_processed (2).png"]
        );
        assert!(ZipArchiver.build("dup.zip", &entries).is_ok());
    }

    #[test]
    fn test_same_input_same_archive() {
        let entries = vec![artifact("x_processed.webp", b"xyz")];
        let first = ZipArchiver.build("a.zip", &entries).unwrap();
        let second = ZipArchiver.build("a.zip", &entries).unwrap();
        assert_eq!(first.bytes, second.bytes);
    }
}
