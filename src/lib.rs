//! image-batch
//!
//! 画像一括変換のCLIフロントエンド（取り込み・変換エンジン・保存・対話モード）

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod logging;
pub mod render;
pub mod runner;
pub mod scanner;
pub mod shell;

pub use error::{ImageBatchError, Result};
