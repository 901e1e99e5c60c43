//! HTTP 協作端
//!
//! 辨識、儲存與店家目錄都透過這個窄介面收發 JSON。
//! 回應本文一律以 JSON 解析；解析不了視為傳輸層失敗。

use std::time::Duration;

use serde_json::Value;

use crate::error::{MenuAiError, Result};

/// HTTP 回應：狀態碼 + JSON 本文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 後端失敗時的 `detail` 欄位
    pub fn detail(&self) -> Option<&str> {
        self.body.get("detail").and_then(Value::as_str)
    }
}

/// HTTP 用戶端介面
///
/// 路徑為以 API 前綴開頭的絕對路徑；實作負責接上伺服器位址。
pub trait ApiClient {
    fn get_json(&self, path: &str) -> impl std::future::Future<Output = Result<ApiResponse>>;

    fn post_json(
        &self,
        path: &str,
        body: &Value,
    ) -> impl std::future::Future<Output = Result<ApiResponse>>;

    /// 單檔 multipart 上傳（欄位名 `file`）
    fn post_multipart(
        &self,
        path: &str,
        file_name: &str,
        mime: &str,
        bytes: Vec<u8>,
    ) -> impl std::future::Future<Output = Result<ApiResponse>>;
}

/// reqwest 實作
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    base_url: String,
    auth_token: Option<String>,
    client: reqwest::Client,
}

impl HttpApiClient {
    pub fn new(base_url: impl Into<String>, timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self {
            base_url,
            auth_token: None,
            client,
        })
    }

    /// 附加 Bearer token（對應管理介面的 authFetch）
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.client.request(method, url);
        if let Some(token) = &self.auth_token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn read_json(response: reqwest::Response) -> Result<ApiResponse> {
        let status = response.status().as_u16();
        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text)?;
        Ok(ApiResponse { status, body })
    }
}

impl ApiClient for HttpApiClient {
    async fn get_json(&self, path: &str) -> Result<ApiResponse> {
        let response = self.request(reqwest::Method::GET, path).send().await?;
        Self::read_json(response).await
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<ApiResponse> {
        let response = self
            .request(reqwest::Method::POST, path)
            .json(body)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn post_multipart(
        &self,
        path: &str,
        file_name: &str,
        mime: &str,
        bytes: Vec<u8>,
    ) -> Result<ApiResponse> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime)
            .map_err(MenuAiError::Http)?;
        let form = reqwest::multipart::Form::new().part("file", part);
        let response = self
            .request(reqwest::Method::POST, path)
            .multipart(form)
            .send()
            .await?;
        Self::read_json(response).await
    }
}
