//! 結果視圖模型
//!
//! 把工作階段狀態整理成結構化的視圖資料，渲染技術自行決定呈現方式：
//! - 一般模式：可編輯的分類／品項
//! - 差異模式：分組的變更清單（預設全選）
//! 店家資訊區塊兩種模式共用。

use crate::store_info::{self, FieldChange};
use crate::types::{MenuCategory, MenuDiff, MenuItem, ModifiedItem, RecognizedMenu, StoreProfile};

/// 結果步驟的視圖模型
#[derive(Debug, Clone, PartialEq)]
pub struct ResultView {
    pub warnings: Vec<String>,
    pub store_info: Vec<FieldChange>,
    pub body: ResultBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResultBody {
    /// 一般模式：整份菜單可編輯
    Editor { categories: Vec<MenuCategory> },
    /// 差異模式：使用者勾選要套用的變更
    Diff {
        added: Vec<DiffLine>,
        modified: Vec<DiffLine>,
        removed: Vec<DiffLine>,
        unchanged: Vec<DiffLine>,
    },
}

/// 差異清單的一列
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub name: String,
    pub price_label: String,
    pub category: Option<String>,
}

/// 組出結果視圖
///
/// `diff` 為 Some 時產生差異模式視圖，否則為一般編輯視圖。
pub fn build_result_view(
    result: &RecognizedMenu,
    diff: Option<&MenuDiff>,
    existing_info: Option<&StoreProfile>,
    recognized_info: Option<&StoreProfile>,
) -> ResultView {
    let body = match diff {
        Some(diff) => ResultBody::Diff {
            added: diff.added.iter().map(item_line).collect(),
            modified: diff.modified.iter().map(modified_line).collect(),
            removed: diff.removed.iter().map(item_line).collect(),
            unchanged: diff.unchanged.iter().map(item_line).collect(),
        },
        None => ResultBody::Editor {
            categories: result.categories.clone(),
        },
    };

    ResultView {
        warnings: result.warnings.clone(),
        store_info: store_info::compare_store_info(existing_info, recognized_info),
        body,
    }
}

/// 品項列：有變體時逐一列出尺寸價格，否則顯示單一價格
fn item_line(item: &MenuItem) -> DiffLine {
    let price_label = if item.variants.is_empty() {
        format!("${}", item.price)
    } else {
        item.variants
            .iter()
            .map(|v| format!("{} ${}", v.name, v.price))
            .collect::<Vec<_>>()
            .join(" / ")
    };
    DiffLine {
        name: item.name.clone(),
        price_label,
        category: item.category.clone(),
    }
}

/// 修改列：價格有變時顯示前後對照
fn modified_line(entry: &ModifiedItem) -> DiffLine {
    let price_label = if entry.old.price != entry.new.price {
        format!("${} → ${}", entry.old.price, entry.new.price)
    } else {
        format!("${}", entry.new.price)
    };
    DiffLine {
        name: entry.new.name.clone(),
        price_label,
        category: entry.new.category.clone(),
    }
}
