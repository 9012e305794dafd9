//! 変換エンジンとのやり取りに使う型
//!
//! - RunToken: 実行ごとの世代タグ（古い応答の破棄に使う）
//! - BatchRequest: 1回の実行で送る一括リクエスト
//! - WireRequest / WireReply: エンジンとのJSON形式
//! - parse_engine_reply: エンジン出力のパース

use crate::error::GatewayError;
use crate::types::{Payload, ProcessedResult, ProcessingOptions};
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 実行トークン
///
/// `generation` はディスパッチ時点のレジストリ世代、`run_id` は実行の通し番号。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunToken {
    pub generation: u64,
    pub run_id: u64,
}

impl std::fmt::Display for RunToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gen{}#run{}", self.generation, self.run_id)
    }
}

/// エンジンに送る一括リクエスト
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub token: RunToken,
    pub contents: Vec<Arc<[u8]>>,
    pub options: ProcessingOptions,
}

impl BatchRequest {
    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    pub fn to_wire(&self) -> WireRequest {
        WireRequest {
            images: self
                .contents
                .iter()
                .map(|bytes| general_purpose::STANDARD.encode(bytes))
                .collect(),
            options: WireOptions::from(&self.options),
        }
    }
}

/// 1件分の結果（`None` はその画像の変換失敗）
pub type ItemOutcome = Option<ProcessedResult>;

/// 実行トークン付きの応答
#[derive(Debug, Clone)]
pub struct TaggedReply {
    pub token: RunToken,
    pub outcome: Result<Vec<ItemOutcome>, GatewayError>,
}

/// エンジンへ渡す設定（JSON）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireOptions {
    pub quality: u8,
    pub format: String,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    pub optimize: bool,
    pub strip_metadata: bool,
    /// プログレッシブJPEG（未対応のため常にfalse）
    pub progressive: bool,
}

impl From<&ProcessingOptions> for WireOptions {
    fn from(options: &ProcessingOptions) -> Self {
        Self {
            quality: options.quality,
            format: options.target_format.as_str().to_string(),
            max_width: options.max_width,
            max_height: options.max_height,
            optimize: options.optimize,
            strip_metadata: options.strip_metadata,
            progressive: false,
        }
    }
}

/// エンジンへのリクエスト（JSON）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireRequest {
    /// base64エンコード済みの画像（入力順）
    pub images: Vec<String>,
    pub options: WireOptions,
}

/// エンジンが返す1件分の結果（JSON）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireResult {
    pub width: u32,
    pub height: u32,
    pub size: u64,
    pub format: String,
    /// base64 または data URL
    pub data: String,
}

/// エンジンからの応答（JSON）
///
/// `results[i]` が入力 `i` に対応する。`null` や欠落はその画像の失敗。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireReply {
    #[serde(default)]
    pub results: Vec<Option<WireResult>>,
}

impl WireReply {
    pub fn into_outcomes(self) -> Vec<ItemOutcome> {
        self.results
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                entry.map(|wire| ProcessedResult {
                    index,
                    payload: Payload::Base64(wire.data),
                    byte_size: wire.size,
                    width: wire.width,
                    height: wire.height,
                    format: wire.format,
                })
            })
            .collect()
    }
}

/// エンジン出力からJSON部分を抽出
///
/// 抽出優先順位:
/// 1. ```json ... ``` ブロック
/// 2. 最初の `{` から最後の `}` まで
///
/// # Examples
/// ```
/// use image_batch_common::gateway::extract_reply_json;
///
/// let output = "engine v1.2\n{\"results\": []}\n";
/// assert_eq!(extract_reply_json(output), Some("{\"results\": []}"));
/// ```
pub fn extract_reply_json(output: &str) -> Option<&str> {
    if let Some(start_marker) = output.find("```json") {
        let start = start_marker + 7;
        if let Some(end_offset) = output[start..].find("```") {
            return Some(output[start..start + end_offset].trim());
        }
    }

    let start = output.find('{')?;
    let end = output.rfind('}')?;
    (end >= start).then(|| &output[start..=end])
}

/// エンジン出力をパースして入力順の結果列にする
pub fn parse_engine_reply(output: &str) -> Result<Vec<ItemOutcome>, GatewayError> {
    let json = extract_reply_json(output)
        .ok_or_else(|| GatewayError::MalformedReply("no JSON object in engine output".into()))?;
    let reply: WireReply = serde_json::from_str(json)
        .map_err(|e| GatewayError::MalformedReply(e.to_string()))?;
    Ok(reply.into_outcomes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TargetFormat;

    #[test]
    fn test_wire_options_from_processing_options() {
        let options = ProcessingOptions::new(80, TargetFormat::Webp).with_max_size(None, Some(600));
        let wire = WireOptions::from(&options);
        assert_eq!(wire.quality, 80);
        assert_eq!(wire.format, "webp");
        assert_eq!(wire.max_height, Some(600));
        assert!(!wire.progressive);
    }

    #[test]
    fn test_to_wire_encodes_in_order() {
        let request = BatchRequest {
            token: RunToken { generation: 1, run_id: 1 },
            contents: vec![Arc::from(vec![1u8, 2, 3]), Arc::from(vec![255u8])],
            options: ProcessingOptions::default(),
        };
        let wire = request.to_wire();
        assert_eq!(wire.images, vec!["AQID".to_string(), "/w==".to_string()]);
    }

    #[test]
    fn test_parse_engine_reply_with_gaps() {
        let output = r#"{"results": [
            {"width": 10, "height": 5, "size": 3, "format": "webp", "data": "AQID"},
            null
        ]}"#;
        let outcomes = parse_engine_reply(output).unwrap();
        assert_eq!(outcomes.len(), 2);

        let first = outcomes[0].as_ref().expect("1件目は成功");
        assert_eq!(first.index, 0);
        assert_eq!(first.width, 10);
        assert_eq!(first.format, "webp");
        assert!(outcomes[1].is_none());
    }

    #[test]
    fn test_parse_engine_reply_json_block() {
        let output = "processing...\n```json\n{\"results\": [null]}\n```\n";
        let outcomes = parse_engine_reply(output).unwrap();
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].is_none());
    }

    #[test]
    fn test_parse_engine_reply_missing_results_is_empty() {
        let outcomes = parse_engine_reply("{}").unwrap();
        assert!(outcomes.is_empty());
    }

    #[test]
    fn test_parse_engine_reply_rejects_garbage() {
        assert!(matches!(
            parse_engine_reply("segmentation fault"),
            Err(GatewayError::MalformedReply(_))
        ));
        assert!(matches!(
            parse_engine_reply("{ broken"),
            Err(GatewayError::MalformedReply(_))
        ));
    }

    #[test]
    fn test_run_token_display() {
        let token = RunToken { generation: 3, run_id: 7 };
        assert_eq!(token.to_string(), "gen3#run7");
    }
}
