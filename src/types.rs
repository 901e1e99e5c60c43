//! 菜單與店家的型別定義
//!
//! 辨識流程共用的資料模型：
//! - MenuItem / MenuCategory / RecognizedMenu: 辨識結果
//! - MenuDiff / ModifiedItem: 與現有菜單的差異
//! - StoreProfile / StoreSummary: 店家資訊
//! - TargetStore: 儲存目標（現有店家或新店家）

use serde::{Deserialize, Serialize};

/// 品項變體（尺寸價格，例如 M / L）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuVariant {
    pub name: String,
    #[serde(deserialize_with = "de_price")]
    pub price: u32,
}

/// 菜單品項
///
/// `category` 是攤平後的分類標記：差異清單中的品項帶著原分類名稱，
/// 後端部分更新時據此重新分組。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuItem {
    pub name: String,
    #[serde(deserialize_with = "de_price")]
    pub price: u32,
    #[serde(
        deserialize_with = "de_null_string",
        skip_serializing_if = "String::is_empty"
    )]
    pub description: String,
    #[serde(deserialize_with = "de_null_vec", skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<MenuVariant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl MenuItem {
    pub fn new(name: impl Into<String>, price: u32) -> Self {
        Self {
            name: name.into(),
            price,
            ..Default::default()
        }
    }

    /// 以分類標記複製品項（差異比對攤平用）
    pub fn with_category(&self, category: &str) -> Self {
        let mut item = self.clone();
        item.category = Some(category.to_string());
        item
    }
}

/// 菜單分類；品項順序即顯示順序
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuCategory {
    pub name: String,
    #[serde(deserialize_with = "de_null_vec")]
    pub items: Vec<MenuItem>,
}

/// 辨識結果（或後端回傳的現有菜單）
///
/// 後端回傳的菜單可能帶有 id 等額外欄位，一律忽略。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizedMenu {
    #[serde(deserialize_with = "de_null_vec")]
    pub categories: Vec<MenuCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_info: Option<StoreProfile>,
    #[serde(deserialize_with = "de_null_vec", skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl RecognizedMenu {
    pub fn is_empty(&self) -> bool {
        self.categories.iter().all(|c| c.items.is_empty())
    }
}

/// 修改的品項：保留新舊快照與變更摘要
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModifiedItem {
    pub old: MenuItem,
    pub new: MenuItem,
    #[serde(deserialize_with = "de_null_vec", skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<String>,
}

/// 菜單差異
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuDiff {
    #[serde(deserialize_with = "de_null_vec")]
    pub added: Vec<MenuItem>,
    #[serde(deserialize_with = "de_null_vec")]
    pub modified: Vec<ModifiedItem>,
    #[serde(deserialize_with = "de_null_vec")]
    pub removed: Vec<MenuItem>,
    #[serde(deserialize_with = "de_null_vec")]
    pub unchanged: Vec<MenuItem>,
}

impl MenuDiff {
    /// 是否有任何需要確認的變更（僅 unchanged 不算）
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.modified.is_empty() || !self.removed.is_empty()
    }
}

/// 店家資訊（每個欄位皆可缺漏）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreProfile {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
}

impl StoreProfile {
    pub fn is_empty(&self) -> bool {
        fn blank(v: &Option<String>) -> bool {
            v.as_deref().map_or(true, |s| s.trim().is_empty())
        }
        blank(&self.name) && blank(&self.phone) && blank(&self.address) && blank(&self.description)
    }

    /// 正規化：修剪空白、空字串轉 None；全空則整體視為「無變更」
    pub fn normalized(&self) -> Option<StoreProfile> {
        fn clean(v: &Option<String>) -> Option<String> {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        }
        let normalized = StoreProfile {
            name: clean(&self.name),
            phone: clean(&self.phone),
            address: clean(&self.address),
            description: clean(&self.description),
        };
        if normalized.is_empty() {
            None
        } else {
            Some(normalized)
        }
    }
}

/// 店家列表的一列（本地快取的店家目錄）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSummary {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub can_edit: Option<bool>,
}

impl StoreSummary {
    /// 取出店家資訊欄位（差異比較用）
    pub fn profile(&self) -> StoreProfile {
        StoreProfile {
            name: if self.name.is_empty() {
                None
            } else {
                Some(self.name.clone())
            },
            phone: self.phone.clone(),
            address: self.address.clone(),
            description: self.description.clone(),
        }
    }
}

/// 儲存目標：現有店家或待建立的新店家
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetStore {
    Existing(String),
    New(String),
}

impl TargetStore {
    pub fn store_id(&self) -> Option<&str> {
        match self {
            TargetStore::Existing(id) => Some(id),
            TargetStore::New(_) => None,
        }
    }
}

/// null 視為空字串（後端的可空欄位）
fn de_null_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// null 視為空陣列
fn de_null_vec<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// 價格反序列化：後端將既有價格序列化為浮點數，辨識結果則為整數
fn de_price<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Null => Ok(0),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_u64() {
                Ok(i as u32)
            } else if let Some(f) = n.as_f64() {
                if f < 0.0 {
                    Err(D::Error::custom("價格不可為負數"))
                } else {
                    Ok(f.round() as u32)
                }
            } else {
                Err(D::Error::custom("價格不可為負數"))
            }
        }
        other => Err(D::Error::custom(format!("無法解析的價格格式: {other}"))),
    }
}
