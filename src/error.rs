use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageBatchError {
    #[error(transparent)]
    Session(#[from] image_batch_common::Error),

    #[error("設定エラー: {0}")]
    Config(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("画像が見つかりません: {0}")]
    NoImagesFound(String),

    #[error("画像読み込みエラー: {0}")]
    ImageLoad(String),

    #[error("エンジン設定エラー: {0}")]
    Engine(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

macro_rules! from_common {
    ($($ty:ident),*) => {
        $(
            impl From<image_batch_common::$ty> for ImageBatchError {
                fn from(err: image_batch_common::$ty) -> Self {
                    ImageBatchError::Session(err.into())
                }
            }
        )*
    };
}

from_common!(ValidationError, GatewayError, ExportError, SessionError);

pub type Result<T> = std::result::Result<T, ImageBatchError>;
