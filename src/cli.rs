use crate::config::{Config, Theme};
use crate::engine::EngineKind;
use clap::{Args, Parser, Subcommand};
use image_batch_common::{ProcessingOptions, TargetFormat};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "image-batch")]
#[command(about = "画像一括変換ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 変換エンジン (local/command)。省略時は設定値
    #[arg(long, global = true)]
    pub engine: Option<EngineKind>,
}

/// 変換設定（省略した項目は設定ファイルの値）
#[derive(Args, Debug, Clone, Default)]
pub struct OptionArgs {
    /// 品質 (1-100)
    #[arg(short, long)]
    pub quality: Option<u8>,

    /// 出力形式 (jpeg/png/webp/gif)
    #[arg(short, long)]
    pub format: Option<TargetFormat>,

    /// 最大幅（px）
    #[arg(long)]
    pub max_width: Option<u32>,

    /// 最大高さ（px）
    #[arg(long)]
    pub max_height: Option<u32>,

    /// 最適化を有効にする
    #[arg(long)]
    pub optimize: bool,

    /// メタデータを削除する
    #[arg(long)]
    pub strip_metadata: bool,
}

impl OptionArgs {
    pub fn resolve(&self, config: &Config) -> ProcessingOptions {
        let base = config.processing_options();
        ProcessingOptions {
            quality: self.quality.unwrap_or(base.quality),
            target_format: self.format.unwrap_or(base.target_format),
            max_width: self.max_width.or(base.max_width),
            max_height: self.max_height.or(base.max_height),
            optimize: self.optimize || base.optimize,
            strip_metadata: self.strip_metadata || base.strip_metadata,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// 画像を一括変換して保存
    Convert {
        /// 画像ファイルまたはフォルダ
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// 出力ディレクトリ（デフォルト: カレント）
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        options: OptionArgs,

        /// ZIPにまとめず個別ファイルで保存
        #[arg(long)]
        no_archive: bool,

        /// 指定した番号の1枚だけ保存
        #[arg(long)]
        single: Option<usize>,

        /// サブフォルダも再帰的にスキャン
        #[arg(short = 'r', long)]
        recursive: bool,
    },

    /// 対話モード
    Shell {
        /// 最初に読み込む画像ファイルまたはフォルダ
        paths: Vec<PathBuf>,

        /// 保存先ディレクトリ（デフォルト: カレント）
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        options: OptionArgs,

        /// サブフォルダも再帰的にスキャン
        #[arg(short = 'r', long)]
        recursive: bool,
    },

    /// 設定を表示/編集
    Config {
        /// 設定を表示
        #[arg(long)]
        show: bool,

        /// テーマを設定 (light/dark)
        #[arg(long)]
        set_theme: Option<Theme>,

        /// テーマを切り替え
        #[arg(long)]
        toggle_theme: bool,

        /// 既定の品質を設定
        #[arg(long)]
        set_quality: Option<u8>,

        /// 既定の出力形式を設定
        #[arg(long)]
        set_format: Option<TargetFormat>,

        /// 既定のエンジンを設定
        #[arg(long)]
        set_engine: Option<EngineKind>,

        /// 外部エンジンのプログラムパスを設定
        #[arg(long)]
        set_engine_command: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_args_override_config() {
        let config = Config {
            quality: 70,
            max_width: Some(1024),
            ..Config::default()
        };
        let args = OptionArgs {
            format: Some(TargetFormat::Webp),
            max_height: Some(600),
            ..OptionArgs::default()
        };

        let options = args.resolve(&config);
        assert_eq!(options.quality, 70);
        assert_eq!(options.target_format, TargetFormat::Webp);
        assert_eq!(options.max_width, Some(1024));
        assert_eq!(options.max_height, Some(600));
    }

    #[test]
    fn test_parse_convert() {
        let cli = Cli::try_parse_from([
            "image-batch", "convert", "a.png", "photos", "-q", "80", "-f", "webp", "--no-archive",
        ])
        .unwrap();
        match cli.command {
            Commands::Convert { paths, options, no_archive, .. } => {
                assert_eq!(paths.len(), 2);
                assert_eq!(options.quality, Some(80));
                assert_eq!(options.format, Some(TargetFormat::Webp));
                assert!(no_archive);
            }
            _ => panic!("convert expected"),
        }
    }

    #[test]
    fn test_parse_engine_flag() {
        let cli = Cli::try_parse_from(["image-batch", "--engine", "command", "shell"]).unwrap();
        assert_eq!(cli.engine, Some(EngineKind::Command));
    }
}
