use thiserror::Error;

/// 共通錯誤型
///
/// 前四個變體對應使用者可見的失敗類別；其餘為底層轉換用。
#[derive(Error, Debug)]
pub enum MenuAiError {
    #[error("圖片載入失敗：{0}")]
    ImageLoad(String),

    #[error("{0}")]
    Validation(String),

    #[error("辨識失敗：{0}")]
    Recognition(String),

    #[error("{0}")]
    Persistence(String),

    #[error("HTTP 請求失敗：{0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON 解析錯誤：{0}")]
    Json(#[from] serde_json::Error),

    #[error("IO 錯誤：{0}")]
    Io(#[from] std::io::Error),

    #[error("設定錯誤：{0}")]
    Config(String),
}

impl MenuAiError {
    /// 是否為驗證類錯誤（未發出任何網路請求即被擋下）
    pub fn is_validation(&self) -> bool {
        matches!(self, MenuAiError::Validation(_))
    }
}

/// Result 型別名
pub type Result<T> = std::result::Result<T, MenuAiError>;
