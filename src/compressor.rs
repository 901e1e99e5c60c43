//! 上傳前圖片壓縮
//!
//! 把任意來源圖片整理成可內嵌、大小受控的形式再上傳：
//! - 尺寸與檔案都夠小：原樣通過，避免重壓造成品質損失
//! - 超過邊長上限：等比例縮放後以 JPEG 重新編碼
//! - 僅檔案過大：維持尺寸、以目標品質重新編碼

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::ImageReader;

use crate::error::{MenuAiError, Result};

/// 最大邊長（像素）
pub const MAX_DIMENSION: u32 = 1920;
/// JPEG 品質（0-100）
pub const JPEG_QUALITY: u8 = 85;
/// 低於此檔案大小且尺寸合規時跳過重新編碼
pub const SKIP_RECOMPRESS_BYTES: usize = 500 * 1024;

/// 可內嵌圖片：MIME 型別 + 原始位元組
///
/// `data_url()` 產生可直接指定給顯示元件的字串形式。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddableImage {
    mime: String,
    bytes: Vec<u8>,
}

impl EmbeddableImage {
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            bytes,
        }
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// 轉為 Data URL 字串
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, BASE64.encode(&self.bytes))
    }

    /// 從 Data URL 解析回圖片
    ///
    /// # Arguments
    /// * `data_url` - "data:image/jpeg;base64,/9j/4AAQ..." 形式的字串
    pub fn from_data_url(data_url: &str) -> Result<Self> {
        let encoded = extract_base64_from_data_url(data_url)
            .ok_or_else(|| MenuAiError::ImageLoad("無效的 Data URL".to_string()))?;
        let bytes = BASE64
            .decode(encoded)
            .map_err(|e| MenuAiError::ImageLoad(format!("Base64 解碼失敗: {e}")))?;
        Ok(Self {
            mime: extract_mime_type_from_data_url(data_url).to_string(),
            bytes,
        })
    }
}

/// Data URL 中抽出 Base64 資料段；格式不符時回傳 None
pub fn extract_base64_from_data_url(data_url: &str) -> Option<&str> {
    if !data_url.starts_with("data:") {
        return None;
    }
    data_url.split(',').nth(1)
}

/// Data URL 中抽出 MIME 型別；格式不符時以 "image/jpeg" 為預設
pub fn extract_mime_type_from_data_url(data_url: &str) -> &str {
    data_url
        .split(':')
        .nth(1)
        .and_then(|s| s.split(';').next())
        .filter(|s| !s.is_empty())
        .unwrap_or("image/jpeg")
}

/// 以預設邊長與品質壓縮
pub fn compress(source: &[u8]) -> Result<EmbeddableImage> {
    compress_with(source, MAX_DIMENSION, JPEG_QUALITY)
}

/// 壓縮圖片
///
/// # Arguments
/// * `source` - 原始圖片位元組
/// * `max_dimension` - 最大邊長（像素）
/// * `quality` - JPEG 品質（0-100）
///
/// # Returns
/// 壓縮後（或原樣通過）的可內嵌圖片；來源無法解碼時回傳 `ImageLoad`
pub fn compress_with(source: &[u8], max_dimension: u32, quality: u8) -> Result<EmbeddableImage> {
    let reader = ImageReader::new(Cursor::new(source))
        .with_guessed_format()
        .map_err(|e| MenuAiError::ImageLoad(e.to_string()))?;
    let format = reader
        .format()
        .ok_or_else(|| MenuAiError::ImageLoad("無法判別圖片格式".to_string()))?;
    let decoded = reader
        .decode()
        .map_err(|e| MenuAiError::ImageLoad(e.to_string()))?;

    let (width, height) = (decoded.width(), decoded.height());
    let longest = width.max(height);

    // 圖片已經夠小：原樣通過，不重新編碼
    if longest <= max_dimension && source.len() < SKIP_RECOMPRESS_BYTES {
        tracing::debug!(
            size = source.len(),
            width,
            height,
            "圖片已壓縮，跳過處理"
        );
        return Ok(EmbeddableImage::new(
            format.to_mime_type(),
            source.to_vec(),
        ));
    }

    // 超過邊長上限才縮放；僅檔案過大時維持尺寸重新編碼
    let resized = if longest > max_dimension {
        let ratio = f64::from(max_dimension) / f64::from(longest);
        let new_width = ((f64::from(width) * ratio).round() as u32).max(1);
        let new_height = ((f64::from(height) * ratio).round() as u32).max(1);
        decoded.resize_exact(new_width, new_height, FilterType::Lanczos3)
    } else {
        decoded
    };

    // JPEG 不支援 alpha，一律轉 RGB 後輸出
    let rgb = resized.to_rgb8();
    let mut output = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut output, quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| MenuAiError::ImageLoad(e.to_string()))?;

    tracing::debug!(
        original = source.len(),
        compressed = output.len(),
        "圖片壓縮完成"
    );
    Ok(EmbeddableImage::new("image/jpeg", output))
}
