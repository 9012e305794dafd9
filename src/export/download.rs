use crate::error::Result;
use image_batch_common::Artifact;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// 成果物の保存先
pub trait DownloadSink {
    fn deliver(&mut self, artifact: &Artifact) -> Result<PathBuf>;
}

/// ディレクトリに書き出す
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DownloadSink for DirectorySink {
    fn deliver(&mut self, artifact: &Artifact) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(&artifact.file_name);
        std::fs::write(&path, &artifact.bytes)?;
        Ok(path)
    }
}

/// 1件ずつ間隔をあけて保存する
///
/// 途中で中断された場合、それまでに保存したファイルはそのまま残る。
pub async fn deliver_staggered<S: DownloadSink>(
    sink: &mut S,
    artifacts: &[Artifact],
    stagger: Duration,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(artifacts.len());
    for (i, artifact) in artifacts.iter().enumerate() {
        if i > 0 && !stagger.is_zero() {
            tokio::time::sleep(stagger).await;
        }
        let path = sink.deliver(artifact)?;
        debug!(file = %path.display(), n = i + 1, total = artifacts.len(), "file delivered");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[derive(Default)]
    struct RecordingSink {
        delivered: Vec<(String, Instant)>,
    }

    impl DownloadSink for RecordingSink {
        fn deliver(&mut self, artifact: &Artifact) -> Result<PathBuf> {
            self.delivered.push((artifact.file_name.clone(), Instant::now()));
            Ok(PathBuf::from(&artifact.file_name))
        }
    }

    fn artifact(name: &str) -> Artifact {
        Artifact {
            file_name: name.to_string(),
            mime: "image/jpeg".to_string(),
            bytes: vec![1],
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_deliveries_are_staggered() {
        let mut sink = RecordingSink::default();
        let artifacts = vec![artifact("a.jpg"), artifact("b.jpg"), artifact("c.jpg")];
        let start = Instant::now();

        let written = deliver_staggered(&mut sink, &artifacts, Duration::from_millis(300))
            .await
            .unwrap();

        assert_eq!(written.len(), 3);
        let offsets: Vec<u128> = sink
            .delivered
            .iter()
            .map(|(_, at)| at.duration_since(start).as_millis())
            .collect();
        assert_eq!(offsets, vec![0, 300, 600]);
    }

    #[tokio::test]
    async fn test_directory_sink_writes_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut sink = DirectorySink::new(temp_dir.path().join("out"));

        let written = deliver_staggered(&mut sink, &[artifact("x.jpg")], Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(written[0], temp_dir.path().join("out").join("x.jpg"));
        assert_eq!(std::fs::read(&written[0]).unwrap(), vec![1]);
    }
}
