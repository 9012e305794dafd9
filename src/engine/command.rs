use super::ConversionGateway;
use async_trait::async_trait;
use image_batch_common::{parse_engine_reply, BatchRequest, GatewayError, ItemOutcome};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// 外部プログラムによる変換エンジン
///
/// 標準入力にJSONリクエスト（base64画像 + 設定）を書き、
/// 標準出力から `{"results": [...]}` を読む。
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandEngine {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    async fn run(&self, input: Vec<u8>) -> Result<String, GatewayError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| GatewayError::Transport(format!("{} を起動できません: {}", self.program, e)))?;

        // 出力の読み取りと並行して書く（パイプが詰まらないように）
        let writer = child.stdin.take().map(|mut stdin| {
            tokio::spawn(async move {
                stdin.write_all(&input).await?;
                // 閉じてEOFを伝える
                drop(stdin);
                Ok::<(), std::io::Error>(())
            })
        });

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let written = match writer {
            Some(handle) => handle
                .await
                .map_err(|e| GatewayError::Transport(format!("リクエスト送信タスクが異常終了しました: {}", e)))?,
            None => Ok(()),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GatewayError::Rejected(format!(
                "engine failed (code {:?}): {}",
                output.status.code(),
                stderr.trim()
            )));
        }

        // 入力を読み切らずに終了したエンジンのEPIPEは無視する
        if let Err(e) = written {
            if e.kind() != std::io::ErrorKind::BrokenPipe {
                return Err(GatewayError::Transport(format!("リクエスト送信エラー: {}", e)));
            }
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

#[async_trait]
impl ConversionGateway for CommandEngine {
    fn name(&self) -> &'static str {
        "command"
    }

    async fn convert_batch(&self, request: &BatchRequest) -> Result<Vec<ItemOutcome>, GatewayError> {
        let input = serde_json::to_vec(&request.to_wire())
            .map_err(|e| GatewayError::Transport(format!("リクエストのシリアライズに失敗: {}", e)))?;
        debug!(program = %self.program, bytes = input.len(), "sending batch to engine");

        let response = tokio::time::timeout(self.timeout, self.run(input))
            .await
            .map_err(|_| GatewayError::Timeout(self.timeout.as_secs()))??;

        debug!(bytes = response.len(), "engine replied");
        parse_engine_reply(&response)
    }
}
