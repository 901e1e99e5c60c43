use crate::error::{MenuAiError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI 設定
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server_url: String,
    pub api_prefix: String,
    pub group_code: Option<String>,
    pub auth_token: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8000".into(),
            api_prefix: crate::endpoints::DEFAULT_API_PREFIX.into(),
            group_code: None,
            auth_token: None,
            timeout_seconds: 300, // 圖片辨識可能需要較長時間
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| MenuAiError::Config("找不到家目錄".into()))?;
        Ok(home.join(".config").join("menu-ai").join("config.json"))
    }

    fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// 取得認證 token；環境變數優先
    pub fn get_auth_token(&self) -> Option<String> {
        if let Ok(token) = std::env::var("MENU_AI_TOKEN") {
            if !token.trim().is_empty() {
                return Some(token);
            }
        }
        self.auth_token.clone()
    }

    /// 依設定組出端點組合器
    pub fn routes(&self) -> crate::endpoints::ApiRoutes {
        match &self.group_code {
            Some(code) => {
                crate::endpoints::ApiRoutes::with_group_code(self.api_prefix.clone(), code.clone())
            }
            None => crate::endpoints::ApiRoutes::new(self.api_prefix.clone()),
        }
    }
}
