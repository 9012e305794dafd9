use super::ConversionGateway;
use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageResult};
use image_batch_common::{BatchRequest, GatewayError, ItemOutcome, Payload, ProcessedResult, ProcessingOptions, TargetFormat};
use rayon::prelude::*;
use std::io::Cursor;
use tracing::{debug, warn};

/// `image` クレートによるプロセス内変換エンジン
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalEngine;

#[async_trait]
impl ConversionGateway for LocalEngine {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn convert_batch(&self, request: &BatchRequest) -> Result<Vec<ItemOutcome>, GatewayError> {
        let contents = request.contents.clone();
        let options = request.options.clone();

        tokio::task::spawn_blocking(move || {
            contents
                .par_iter()
                .enumerate()
                .map(|(index, bytes)| match convert_one(bytes, &options) {
                    Ok(mut result) => {
                        result.index = index;
                        Some(result)
                    }
                    Err(e) => {
                        warn!(index, error = %e, "image conversion failed");
                        None
                    }
                })
                .collect::<Vec<ItemOutcome>>()
        })
        .await
        .map_err(|e| GatewayError::Transport(format!("変換スレッドが異常終了しました: {}", e)))
    }
}

/// 最大サイズに収まるように縮小（拡大はしない、縦横比は維持）
fn fit_within(img: DynamicImage, max_width: Option<u32>, max_height: Option<u32>) -> DynamicImage {
    let max_w = max_width.unwrap_or(u32::MAX);
    let max_h = max_height.unwrap_or(u32::MAX);
    if img.width() <= max_w && img.height() <= max_h {
        return img;
    }
    img.resize(max_w, max_h, FilterType::Lanczos3)
}

fn encode(img: &DynamicImage, options: &ProcessingOptions) -> ImageResult<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    match options.target_format {
        TargetFormat::Jpeg => {
            // JPEGはアルファ非対応
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, options.quality))?;
        }
        TargetFormat::Png => {
            let compression = if options.optimize {
                CompressionType::Best
            } else {
                CompressionType::Default
            };
            img.write_with_encoder(PngEncoder::new_with_quality(
                &mut buf,
                compression,
                PngFilter::Adaptive,
            ))?;
        }
        TargetFormat::Webp => {
            DynamicImage::ImageRgba8(img.to_rgba8()).write_to(&mut buf, ImageFormat::WebP)?;
        }
        TargetFormat::Gif => {
            DynamicImage::ImageRgba8(img.to_rgba8()).write_to(&mut buf, ImageFormat::Gif)?;
        }
    }
    Ok(buf.into_inner())
}

/// 1枚を変換
///
/// 再エンコードするため元のメタデータは引き継がれない。
pub fn convert_one(bytes: &[u8], options: &ProcessingOptions) -> ImageResult<ProcessedResult> {
    let img = image::load_from_memory(bytes)?;
    let img = fit_within(img, options.max_width, options.max_height);
    let encoded = encode(&img, options)?;

    debug!(
        width = img.width(),
        height = img.height(),
        before = bytes.len(),
        after = encoded.len(),
        "image converted"
    );

    Ok(ProcessedResult {
        index: 0,
        byte_size: encoded.len() as u64,
        width: img.width(),
        height: img.height(),
        format: options.target_format.as_str().to_string(),
        payload: Payload::Binary(encoded),
    })
}
