//! 菜單差異比對
//!
//! 純函數：辨識出的新菜單對上現有菜單，把品項分成
//! added / modified / removed / unchanged 四類。
//! 品項身分以修剪空白後的名稱精確比對；不做模糊比對。

use std::collections::HashMap;

use crate::types::{MenuDiff, MenuItem, ModifiedItem, RecognizedMenu};

/// 比較新舊菜單差異
///
/// 兩邊的品項先攤平並帶上分類標記。added / modified / unchanged
/// 依辨識結果的順序排列，removed 依現有菜單的順序排列。
/// 不會改動任何一邊的輸入。
pub fn compare_menus(existing: &RecognizedMenu, recognized: &RecognizedMenu) -> MenuDiff {
    let old_items = flatten(existing);
    let new_items = flatten(recognized);

    let old_by_name: HashMap<&str, &MenuItem> = old_items
        .iter()
        .map(|item| (item.name.trim(), item))
        .collect();
    let new_names: std::collections::HashSet<&str> =
        new_items.iter().map(|item| item.name.trim()).collect();

    let mut diff = MenuDiff::default();

    for new_item in &new_items {
        match old_by_name.get(new_item.name.trim()) {
            None => diff.added.push(new_item.clone()),
            Some(old_item) => {
                if items_differ(old_item, new_item) {
                    diff.modified.push(ModifiedItem {
                        old: (*old_item).clone(),
                        new: new_item.clone(),
                        changes: item_changes(old_item, new_item),
                    });
                } else {
                    diff.unchanged.push(new_item.clone());
                }
            }
        }
    }

    for old_item in &old_items {
        if !new_names.contains(old_item.name.trim()) {
            diff.removed.push(old_item.clone());
        }
    }

    diff
}

/// 攤平分類結構，品項帶上所屬分類名稱
fn flatten(menu: &RecognizedMenu) -> Vec<MenuItem> {
    menu.categories
        .iter()
        .flat_map(|cat| cat.items.iter().map(|item| item.with_category(&cat.name)))
        .collect()
}

/// 兩個品項是否不同（價格、說明、變體組合）
fn items_differ(old: &MenuItem, new: &MenuItem) -> bool {
    old.price != new.price
        || old.description != new.description
        || sorted_variants(old) != sorted_variants(new)
}

fn sorted_variants(item: &MenuItem) -> Vec<(&str, u32)> {
    let mut variants: Vec<(&str, u32)> = item
        .variants
        .iter()
        .map(|v| (v.name.as_str(), v.price))
        .collect();
    variants.sort();
    variants
}

/// 品項的變更摘要
fn item_changes(old: &MenuItem, new: &MenuItem) -> Vec<String> {
    let mut changes = Vec::new();

    if old.price != new.price {
        changes.push(format!("價格 ${} → ${}", old.price, new.price));
    }
    if old.description != new.description {
        changes.push("說明變更".to_string());
    }
    if sorted_variants(old) != sorted_variants(new) {
        changes.push("尺寸價格變更".to_string());
    }

    changes
}
