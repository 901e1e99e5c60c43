//! API 端點組合
//!
//! 兩個獨立軸向決定路徑：
//! - 是否已知目標店家（路徑帶店家 id）
//! - 是否在群組範圍內（店家改以 by-code/{group_code} 前綴查找）

/// 預設 API 前綴
pub const DEFAULT_API_PREFIX: &str = "/api/admin";

/// 端點路徑組合器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRoutes {
    api_prefix: String,
    group_code: Option<String>,
}

impl Default for ApiRoutes {
    fn default() -> Self {
        Self::new(DEFAULT_API_PREFIX)
    }
}

impl ApiRoutes {
    pub fn new(api_prefix: impl Into<String>) -> Self {
        Self {
            api_prefix: api_prefix.into(),
            group_code: None,
        }
    }

    /// 群組範圍：店家端點改以群組代碼為前綴
    pub fn with_group_code(api_prefix: impl Into<String>, group_code: impl Into<String>) -> Self {
        Self {
            api_prefix: api_prefix.into(),
            group_code: Some(group_code.into()),
        }
    }

    pub fn group_code(&self) -> Option<&str> {
        self.group_code.as_deref()
    }

    /// 店家前綴：`{prefix}/stores/by-code/{code}` 或 `{prefix}/stores`
    fn store_base(&self) -> String {
        match &self.group_code {
            Some(code) => format!("{}/stores/by-code/{}", self.api_prefix, code),
            None => format!("{}/stores", self.api_prefix),
        }
    }

    /// 辨識端點
    ///
    /// 未指定店家時兩種範圍都走 `{prefix}/menu/recognize`
    /// （觀察到的既有路由；群組代碼不參與）。
    pub fn recognize(&self, store_id: Option<&str>) -> String {
        match store_id {
            Some(id) => format!("{}/{}/menu/recognize", self.store_base(), id),
            None => format!("{}/menu/recognize", self.api_prefix),
        }
    }

    /// 菜單讀取／完整覆蓋寫入
    pub fn menu(&self, store_id: &str) -> String {
        format!("{}/{}/menu", self.store_base(), store_id)
    }

    /// 差異模式儲存
    pub fn menu_save(&self, store_id: &str) -> String {
        format!("{}/{}/menu/save", self.store_base(), store_id)
    }

    /// 店家建立
    pub fn create_store(&self) -> String {
        self.store_base()
    }

    /// 店家列表
    pub fn stores(&self) -> String {
        self.store_base()
    }
}
