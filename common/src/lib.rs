//! Image Batch Common Library
//!
//! 画像一括変換セッションの中核（CLI・エンジンアダプタと共有）

pub mod types;
pub mod error;
pub mod registry;
pub mod results;
pub mod gateway;
pub mod progress;
pub mod session;
pub mod view;
pub mod export;
pub mod format;
pub mod notice;

pub use types::{Payload, ProcessedResult, ProcessingOptions, SessionState, SourceFile, SourceItem, TargetFormat};
pub use error::{Error, ExportError, GatewayError, Result, SessionError, ValidationError};
pub use registry::SourceRegistry;
pub use results::ResultStore;
pub use gateway::{BatchRequest, ItemOutcome, RunToken, TaggedReply, parse_engine_reply};
pub use session::{ReplyOutcome, SessionController};
pub use view::{ItemStatus, PreviewPool, RenderedViews, ViewKind, ViewProjector};
pub use export::{Artifact, ArchiveBuilder, BulkExport, ExportCoordinator, archive_file_name, processed_file_name};
pub use format::{Savings, format_file_size, truncate_name};
pub use notice::{Notice, NoticeBoard, NoticeLevel};
