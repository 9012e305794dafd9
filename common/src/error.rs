//! エラー型定義

use thiserror::Error;

/// 取り込み・設定値の検証エラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No valid image files in the selection")]
    NoValidImages,

    #[error("Quality must be between 1 and 100, got {0}")]
    InvalidQuality(u8),

    #[error("{0} must be a positive integer")]
    InvalidDimension(&'static str),
}

/// 変換エンジン呼び出しのエラー（バッチ全体が失敗する）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Engine transport error: {0}")]
    Transport(String),

    #[error("Engine timed out after {0}s")]
    Timeout(u64),

    #[error("Engine rejected the batch: {0}")]
    Rejected(String),

    #[error("Malformed engine reply: {0}")]
    MalformedReply(String),
}

/// エクスポートのエラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    #[error("Item {0} has no processed result yet")]
    NotReady(usize),

    #[error("Nothing to export")]
    NothingToExport,

    #[error("Processed payload of item {index} could not be decoded: {reason}")]
    CorruptPayload { index: usize, reason: String },

    #[error("Archive error: {0}")]
    Archive(String),
}

/// セッション状態遷移のエラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("A run is already in progress")]
    RunInFlight,

    #[error("No files loaded")]
    NoItems,

    #[error("No run is in progress")]
    NotProcessing,

    #[error("Cancellation has already been requested")]
    CancelAlreadyRequested,
}

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_validation_is_transparent() {
        let error: Error = ValidationError::NoValidImages.into();
        assert_eq!(format!("{}", error), "No valid image files in the selection");
    }

    #[test]
    fn test_export_error_messages() {
        assert_eq!(
            format!("{}", ExportError::NotReady(3)),
            "Item 3 has no processed result yet"
        );
        assert_eq!(format!("{}", ExportError::NothingToExport), "Nothing to export");
    }

    #[test]
    fn test_error_from_gateway() {
        let error: Error = GatewayError::Timeout(120).into();
        assert!(matches!(error, Error::Gateway(GatewayError::Timeout(120))));
        assert!(format!("{}", error).contains("120s"));
    }

    #[test]
    fn test_error_debug() {
        let error = Error::Session(SessionError::RunInFlight);
        let debug = format!("{:?}", error);
        assert!(debug.contains("RunInFlight"));
    }
}
