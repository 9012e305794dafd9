//! 変換エンジン
//!
//! - LocalEngine: `image` クレートでプロセス内変換
//! - CommandEngine: 外部プログラムにJSONで一括変換を依頼

mod command;
mod local;

pub use command::CommandEngine;
pub use local::{convert_one, LocalEngine};

use crate::config::Config;
use crate::error::{ImageBatchError, Result};
use async_trait::async_trait;
use clap::ValueEnum;
use image_batch_common::{BatchRequest, GatewayError, ItemOutcome, TaggedReply};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// 一括変換の呼び出し口
///
/// 1回の呼び出しでバッチ全体を変換する。個々の画像の失敗は `None` として返し、
/// 呼び出し自体の失敗だけを `GatewayError` にする。
#[async_trait]
pub trait ConversionGateway: Send + Sync {
    fn name(&self) -> &'static str;

    async fn convert_batch(&self, request: &BatchRequest) -> std::result::Result<Vec<ItemOutcome>, GatewayError>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    #[default]
    Local,
    Command,
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineKind::Local => write!(f, "local"),
            EngineKind::Command => write!(f, "command"),
        }
    }
}

/// 設定からエンジンを組み立てる
pub fn build_gateway(config: &Config, kind: EngineKind) -> Result<Arc<dyn ConversionGateway>> {
    match kind {
        EngineKind::Local => Ok(Arc::new(LocalEngine)),
        EngineKind::Command => {
            let program = config.engine_command.clone().ok_or_else(|| {
                ImageBatchError::Engine(
                    "engine_command が未設定です。`image-batch config --set-engine-command PATH` で設定してください".into(),
                )
            })?;
            Ok(Arc::new(
                CommandEngine::new(program, Duration::from_secs(config.timeout_seconds))
                    .with_args(config.engine_args.iter().cloned()),
            ))
        }
    }
}

/// リクエストを実行して、実行トークン付きの応答にする
pub async fn dispatch(gateway: &dyn ConversionGateway, request: &BatchRequest) -> TaggedReply {
    debug!(engine = gateway.name(), token = %request.token, items = request.len(), "engine call started");
    let outcome = gateway.convert_batch(request).await;
    debug!(engine = gateway.name(), token = %request.token, ok = outcome.is_ok(), "engine call finished");
    TaggedReply {
        token: request.token,
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_gateway_local() {
        let gateway = build_gateway(&Config::default(), EngineKind::Local).unwrap();
        assert_eq!(gateway.name(), "local");
    }

    #[test]
    fn test_build_gateway_command_requires_program() {
        let result = build_gateway(&Config::default(), EngineKind::Command);
        assert!(matches!(result, Err(ImageBatchError::Engine(_))));

        let config = Config {
            engine_command: Some("/usr/bin/convert-engine".into()),
            ..Config::default()
        };
        let gateway = build_gateway(&config, EngineKind::Command).unwrap();
        assert_eq!(gateway.name(), "command");
    }

    #[test]
    fn test_engine_kind_serde() {
        let kind: EngineKind = serde_json::from_str("\"command\"").unwrap();
        assert_eq!(kind, EngineKind::Command);
        assert_eq!(EngineKind::Local.to_string(), "local");
    }
}
