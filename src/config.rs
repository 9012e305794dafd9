use crate::engine::EngineKind;
use crate::error::{ImageBatchError, Result};
use image_batch_common::{ProcessingOptions, TargetFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 表示テーマ（セッションをまたいで保存される唯一の設定）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(format!("Unknown theme: {}. Use light or dark", s)),
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub quality: u8,
    pub format: TargetFormat,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    pub optimize: bool,
    pub strip_metadata: bool,
    pub theme: Theme,
    pub engine: EngineKind,
    pub engine_command: Option<String>,
    pub engine_args: Vec<String>,
    pub timeout_seconds: u64,
    /// 順次ダウンロードの間隔
    pub stagger_ms: u64,
    /// 通知の表示時間
    pub notice_ms: u64,
    /// 一括ダウンロードをZIPにまとめるか
    pub archive: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            quality: 85,
            format: TargetFormat::Jpeg,
            max_width: None,
            max_height: None,
            optimize: false,
            strip_metadata: false,
            theme: Theme::Light,
            engine: EngineKind::Local,
            engine_command: None,
            engine_args: Vec::new(),
            timeout_seconds: 120,
            stagger_ms: 300,
            notice_ms: 3000,
            archive: true,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// 指定パスから読み込む（存在しなければ既定値）
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ImageBatchError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("image-batch").join("config.json"))
    }

    /// 設定から変換オプションの既定値を作る
    pub fn processing_options(&self) -> ProcessingOptions {
        ProcessingOptions {
            quality: self.quality,
            target_format: self.format,
            max_width: self.max_width,
            max_height: self.max_height,
            optimize: self.optimize,
            strip_metadata: self.strip_metadata,
        }
    }

    pub fn set_quality(&mut self, quality: u8) -> Result<()> {
        ProcessingOptions::new(quality, self.format).validate()?;
        self.quality = quality;
        Ok(())
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme
    }
}
