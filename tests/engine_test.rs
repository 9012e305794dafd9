//! 変換エンジンの統合テスト

use image_batch_common::{BatchRequest, GatewayError, ProcessingOptions, RunToken, TargetFormat};
use image_batch_rust::engine::{ConversionGateway, LocalEngine};
use std::sync::Arc;

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 100, 50]));
    let mut buf = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

fn request(contents: Vec<Vec<u8>>, options: ProcessingOptions) -> BatchRequest {
    BatchRequest {
        token: RunToken { generation: 1, run_id: 1 },
        contents: contents.into_iter().map(Arc::from).collect(),
        options,
    }
}

/// 壊れた画像だけが失敗し、順序は入力どおり
#[tokio::test]
async fn test_local_engine_mixed_batch() {
    let options = ProcessingOptions::new(75, TargetFormat::Jpeg).with_max_size(Some(32), None);
    let batch = request(
        vec![png_bytes(64, 48), b"not an image".to_vec(), png_bytes(16, 16)],
        options,
    );

    let outcomes = LocalEngine.convert_batch(&batch).await.unwrap();
    assert_eq!(outcomes.len(), 3);

    let first = outcomes[0].as_ref().unwrap();
    assert_eq!(first.index, 0);
    assert_eq!((first.width, first.height), (32, 24));
    assert_eq!(first.format, "jpeg");

    assert!(outcomes[1].is_none());

    // 小さい画像は拡大しない
    let third = outcomes[2].as_ref().unwrap();
    assert_eq!(third.index, 2);
    assert_eq!((third.width, third.height), (16, 16));
    assert_eq!(third.byte_size as usize, third.payload.decode().unwrap().len());
}

#[cfg(unix)]
mod command {
    use super::*;
    use image_batch_rust::engine::CommandEngine;
    use std::time::Duration;

    fn shell_engine(script: &str, timeout: Duration) -> CommandEngine {
        CommandEngine::new("sh", timeout).with_args(["-c", script])
    }

    /// 標準出力のJSONを入力順に対応付ける
    #[tokio::test]
    async fn test_command_engine_parses_reply() {
        let script = r#"cat > /dev/null; echo 'engine 1.0'; echo '{"results": [{"width": 2, "height": 2, "size": 4, "format": "webp", "data": "data:image/webp;base64,UklGRg=="}, null]}'"#;
        let engine = shell_engine(script, Duration::from_secs(10));
        let batch = request(vec![vec![1, 2, 3], vec![4]], ProcessingOptions::default());

        let outcomes = engine.convert_batch(&batch).await.unwrap();
        assert_eq!(outcomes.len(), 2);
        let first = outcomes[0].as_ref().unwrap();
        assert_eq!(first.format, "webp");
        assert_eq!(first.payload.decode().unwrap(), b"RIFF".to_vec());
        assert!(outcomes[1].is_none());
    }

    /// リクエストはJSONで標準入力に渡される
    #[tokio::test]
    async fn test_command_engine_receives_wire_request() {
        // 受け取ったJSONに "progressive":false が含まれていれば成功を返す
        let script = r#"if grep -q '"progressive":false'; then echo '{"results": [null]}'; else exit 3; fi"#;
        let engine = shell_engine(script, Duration::from_secs(10));
        let batch = request(vec![vec![9]], ProcessingOptions::default());

        let outcomes = engine.convert_batch(&batch).await.unwrap();
        assert_eq!(outcomes, vec![None]);
    }

    /// 入力を読む前に大量に出力するエンジンでも詰まらない
    #[tokio::test]
    async fn test_command_engine_large_request_with_chatty_engine() {
        let script = r#"head -c 200000 /dev/zero >&2; cat > /dev/null; echo '{"results": [null]}'"#;
        let engine = shell_engine(script, Duration::from_secs(5));
        let batch = request(vec![vec![7u8; 1_000_000]], ProcessingOptions::default());

        let outcomes = engine.convert_batch(&batch).await.unwrap();
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].is_none());
    }

    #[tokio::test]
    async fn test_command_engine_nonzero_exit_is_rejected() {
        let engine = shell_engine("cat > /dev/null; echo boom >&2; exit 2", Duration::from_secs(10));
        let batch = request(vec![vec![1]], ProcessingOptions::default());

        let err = engine.convert_batch(&batch).await.unwrap_err();
        match err {
            GatewayError::Rejected(message) => assert!(message.contains("boom")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_command_engine_malformed_reply() {
        let engine = shell_engine("cat > /dev/null; echo 'no json here'", Duration::from_secs(10));
        let batch = request(vec![vec![1]], ProcessingOptions::default());

        let err = engine.convert_batch(&batch).await.unwrap_err();
        assert!(matches!(err, GatewayError::MalformedReply(_)));
    }

    #[tokio::test]
    async fn test_command_engine_timeout() {
        let engine = shell_engine("cat > /dev/null; sleep 5", Duration::from_millis(200));
        let batch = request(vec![vec![1]], ProcessingOptions::default());

        let err = engine.convert_batch(&batch).await.unwrap_err();
        assert!(matches!(err, GatewayError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_command_engine_missing_program() {
        let engine = CommandEngine::new("/nonexistent/engine-12345", Duration::from_secs(1));
        let batch = request(vec![vec![1]], ProcessingOptions::default());

        let err = engine.convert_batch(&batch).await.unwrap_err();
        assert!(matches!(err, GatewayError::Transport(_)));
    }
}
