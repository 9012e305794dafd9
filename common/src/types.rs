//! セッションで扱うデータ型
//!
//! CLIとエンジンアダプタで共有される型:
//! - SourceFile: 取り込み境界で受け取るファイル
//! - SourceItem: レジストリに登録された元画像
//! - ProcessingOptions: 1回の実行で固定される変換設定
//! - ProcessedResult: 1枚分の変換結果

use crate::error::ValidationError;
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 取り込み境界で受け取るファイル（宣言content-type + バイト列）
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn byte_size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// content-typeが `image/` で始まるか
    pub fn is_image(&self) -> bool {
        self.content_type
            .trim()
            .to_ascii_lowercase()
            .starts_with("image/")
    }
}

/// レジストリ内の元画像
///
/// `index` は取り込み時に振られ、セッション中は変わらない。
#[derive(Debug, Clone)]
pub struct SourceItem {
    pub index: usize,
    pub name: String,
    pub byte_size: u64,
    pub content_type: String,
    content: Arc<[u8]>,
}

impl SourceItem {
    pub(crate) fn from_file(index: usize, file: SourceFile) -> Self {
        Self {
            index,
            byte_size: file.byte_size(),
            name: file.name,
            content_type: file.content_type,
            content: Arc::from(file.bytes),
        }
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// 実行スナップショット用（コピーせずに共有）
    pub fn shared_content(&self) -> Arc<[u8]> {
        Arc::clone(&self.content)
    }

    /// 拡張子（ドットなし）
    pub fn extension(&self) -> Option<&str> {
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
    }
}

/// 出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    #[default]
    Jpeg,
    Png,
    Webp,
    Gif,
}

impl TargetFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetFormat::Jpeg => "jpeg",
            TargetFormat::Png => "png",
            TargetFormat::Webp => "webp",
            TargetFormat::Gif => "gif",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            TargetFormat::Jpeg => "image/jpeg",
            TargetFormat::Png => "image/png",
            TargetFormat::Webp => "image/webp",
            TargetFormat::Gif => "image/gif",
        }
    }
}

impl std::str::FromStr for TargetFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(TargetFormat::Jpeg),
            "png" => Ok(TargetFormat::Png),
            "webp" => Ok(TargetFormat::Webp),
            "gif" => Ok(TargetFormat::Gif),
            _ => Err(format!("Unknown format: {}. Use jpeg, png, webp, or gif", s)),
        }
    }
}

impl std::fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 変換設定のスナップショット
///
/// 実行開始時にコピーされ、実行中に変更されることはない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProcessingOptions {
    pub quality: u8,
    #[serde(rename = "format")]
    pub target_format: TargetFormat,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    pub optimize: bool,
    pub strip_metadata: bool,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            quality: 85,
            target_format: TargetFormat::Jpeg,
            max_width: None,
            max_height: None,
            optimize: false,
            strip_metadata: false,
        }
    }
}

impl ProcessingOptions {
    pub fn new(quality: u8, target_format: TargetFormat) -> Self {
        Self {
            quality,
            target_format,
            ..Default::default()
        }
    }

    pub fn with_max_size(mut self, max_width: Option<u32>, max_height: Option<u32>) -> Self {
        self.max_width = max_width;
        self.max_height = max_height;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=100).contains(&self.quality) {
            return Err(ValidationError::InvalidQuality(self.quality));
        }
        if self.max_width == Some(0) {
            return Err(ValidationError::InvalidDimension("max_width"));
        }
        if self.max_height == Some(0) {
            return Err(ValidationError::InvalidDimension("max_height"));
        }
        Ok(())
    }
}

/// エンジンが返す変換後データ（バイナリまたはbase64）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Binary(Vec<u8>),
    /// 生のbase64、または `data:...;base64,` 形式
    Base64(String),
}

impl Payload {
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        match self {
            Payload::Binary(bytes) => Ok(bytes.clone()),
            Payload::Base64(data) => general_purpose::STANDARD.decode(strip_data_url(data).trim()),
        }
    }
}

/// `data:image/png;base64,XXXX` からbase64部分だけを取り出す
pub fn strip_data_url(data: &str) -> &str {
    if data.starts_with("data:") {
        data.split_once(',').map(|(_, b64)| b64).unwrap_or("")
    } else {
        data
    }
}

/// 1枚分の変換結果
///
/// 失敗した画像にはインスタンス自体が存在しない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedResult {
    pub index: usize,
    pub payload: Payload,
    pub byte_size: u64,
    pub width: u32,
    pub height: u32,
    pub format: String,
}

/// セッション状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Idle,
    FilesLoaded,
    Processing,
    Completed,
    Cancelled,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::FilesLoaded => "files-loaded",
            SessionState::Processing => "processing",
            SessionState::Completed => "completed",
            SessionState::Cancelled => "cancelled",
        }
    }

    /// 実行が一度でも終わっている状態
    pub fn run_finished(&self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Cancelled)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
