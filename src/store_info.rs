//! 店家資訊欄位比較
//!
//! 把辨識出的店家資訊與現有資料逐欄比對，產生變更標記與顯示值。
//! 新店家（無現有資料）時不得標記任何變更。

use crate::types::StoreProfile;

/// 比較的欄位順序（渲染順序即此順序）
const FIELDS: [(&str, &str); 4] = [
    ("name", "店名"),
    ("phone", "電話"),
    ("address", "地址"),
    ("description", "說明"),
];

/// 單一欄位的比較結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub key: &'static str,
    pub label: &'static str,
    pub changed: bool,
    pub old_value: String,
    pub new_value: String,
    /// 顯示值：辨識值非空優先，其次現有值，否則空字串
    pub display_value: String,
}

/// 逐欄比較店家資訊
///
/// `changed` 僅在現有資料存在且值不同時為真；`existing` 為 None
/// 時（新店家）所有欄位都視為未變更。
pub fn compare_store_info(
    existing: Option<&StoreProfile>,
    recognized: Option<&StoreProfile>,
) -> Vec<FieldChange> {
    FIELDS
        .iter()
        .map(|&(key, label)| {
            let old_value = existing.map(|p| field(p, key)).unwrap_or_default();
            let new_value = recognized.map(|p| field(p, key)).unwrap_or_default();
            let changed = existing.is_some() && old_value != new_value;
            let display_value = if !new_value.is_empty() {
                new_value.clone()
            } else {
                old_value.clone()
            };
            FieldChange {
                key,
                label,
                changed,
                old_value,
                new_value,
                display_value,
            }
        })
        .collect()
}

fn field(profile: &StoreProfile, key: &str) -> String {
    let value = match key {
        "name" => &profile.name,
        "phone" => &profile.phone,
        "address" => &profile.address,
        _ => &profile.description,
    };
    value.clone().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str, phone: &str) -> StoreProfile {
        StoreProfile {
            name: (!name.is_empty()).then(|| name.to_string()),
            phone: (!phone.is_empty()).then(|| phone.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_changed_only_when_existing_differs() {
        let existing = profile("小吃店", "02-11111111");
        let recognized = profile("小吃店", "02-22222222");

        let fields = compare_store_info(Some(&existing), Some(&recognized));
        let by_key = |k: &str| fields.iter().find(|f| f.key == k).unwrap();

        assert!(!by_key("name").changed);
        assert!(by_key("phone").changed);
        assert_eq!(by_key("phone").old_value, "02-11111111");
        assert_eq!(by_key("phone").new_value, "02-22222222");
    }

    #[test]
    fn test_absent_existing_marks_nothing_changed() {
        // 新店家路徑：沒有現有資料就不能捏造差異
        let recognized = profile("新店", "02-33333333");
        let fields = compare_store_info(None, Some(&recognized));
        assert!(fields.iter().all(|f| !f.changed));
    }

    #[test]
    fn test_display_prefers_recognized_value() {
        let existing = profile("舊店名", "02-11111111");
        let recognized = profile("新店名", "");

        let fields = compare_store_info(Some(&existing), Some(&recognized));
        let by_key = |k: &str| fields.iter().find(|f| f.key == k).unwrap();

        // 辨識值非空優先；辨識值空白時退回現有值
        assert_eq!(by_key("name").display_value, "新店名");
        assert_eq!(by_key("phone").display_value, "02-11111111");
    }

    #[test]
    fn test_cleared_field_counts_as_change() {
        let existing = profile("小吃店", "02-11111111");
        let recognized = profile("小吃店", "");

        let fields = compare_store_info(Some(&existing), Some(&recognized));
        let phone = fields.iter().find(|f| f.key == "phone").unwrap();
        assert!(phone.changed);
        assert_eq!(phone.new_value, "");
    }

    #[test]
    fn test_no_recognized_profile_falls_back_to_existing() {
        let existing = profile("小吃店", "02-11111111");
        let fields = compare_store_info(Some(&existing), None);
        let name = fields.iter().find(|f| f.key == "name").unwrap();
        assert_eq!(name.display_value, "小吃店");
    }

    #[test]
    fn test_field_order_is_stable() {
        let keys: Vec<&str> = compare_store_info(None, None)
            .iter()
            .map(|f| f.key)
            .collect();
        assert_eq!(keys, vec!["name", "phone", "address", "description"]);
    }
}
