//! 辨識工作階段狀態機
//!
//! 一次「上傳 → 辨識 → 確認 → 儲存」流程的所有暫態都收在這裡：
//! 選取的圖片、目標店家、辨識結果、菜單差異、店家資訊差異。
//! 呈現層透過 `ResultEditor` 在儲存時把編輯內容交回來；
//! 通知、店家目錄、完成回呼都是外部協作端。
//!
//! 所有操作都走 `&mut self`，同一工作階段不可能有並行的
//! recognize / save。

use serde_json::{json, Value};

use crate::api::ApiClient;
use crate::compressor::{self, EmbeddableImage};
use crate::diff;
use crate::endpoints::ApiRoutes;
use crate::error::{MenuAiError, Result};
use crate::types::{
    MenuCategory, MenuDiff, MenuItem, RecognizedMenu, StoreProfile, StoreSummary, TargetStore,
};
use crate::view::{self, ResultView};

/// 來源圖片的大小上限（壓縮前檢查）
pub const MAX_SOURCE_BYTES: usize = 10 * 1024 * 1024;

/// 工作階段狀態
///
/// `Idle` 是關閉後／儲存成功後的未初始化狀態，`open()` 進入 `Upload`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Upload,
    Recognizing,
    Result { diff_mode: bool },
}

/// 通知等級
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

/// 外部協作端掛勾（通知、店家目錄、儲存完成回呼）
pub struct SessionHooks {
    pub notify: Box<dyn Fn(&str, Severity)>,
    pub get_stores: Box<dyn Fn() -> Vec<StoreSummary>>,
    pub filter_editable_stores: Option<Box<dyn Fn(Vec<StoreSummary>) -> Vec<StoreSummary>>>,
    pub on_menu_saved: Box<dyn Fn()>,
}

impl SessionHooks {
    pub fn new(
        notify: impl Fn(&str, Severity) + 'static,
        get_stores: impl Fn() -> Vec<StoreSummary> + 'static,
        on_menu_saved: impl Fn() + 'static,
    ) -> Self {
        Self {
            notify: Box::new(notify),
            get_stores: Box::new(get_stores),
            filter_editable_stores: None,
            on_menu_saved: Box::new(on_menu_saved),
        }
    }

    pub fn with_filter(
        mut self,
        filter: impl Fn(Vec<StoreSummary>) -> Vec<StoreSummary> + 'static,
    ) -> Self {
        self.filter_editable_stores = Some(Box::new(filter));
        self
    }
}

impl Default for SessionHooks {
    fn default() -> Self {
        Self::new(|_, _| {}, Vec::new, || {})
    }
}

/// 差異清單中被勾選的項目（各清單內的索引）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffSelection {
    pub added: Vec<usize>,
    pub modified: Vec<usize>,
    pub removed: Vec<usize>,
}

impl DiffSelection {
    /// 全選（差異預覽的預設勾選狀態）
    pub fn select_all(diff: &MenuDiff) -> Self {
        Self {
            added: (0..diff.added.len()).collect(),
            modified: (0..diff.modified.len()).collect(),
            removed: (0..diff.removed.len()).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }
}

/// 呈現層在儲存時交回編輯內容的介面
///
/// 工作階段不深入任何渲染細節；儲存時透過這個介面讀回
/// 編輯後的菜單、店家資訊與差異勾選。
pub trait ResultEditor {
    fn edited_menu(&self) -> Vec<MenuCategory>;
    fn edited_profile(&self) -> Option<StoreProfile>;
    fn diff_selection(&self) -> DiffSelection;
}

/// `ResultEditor` 的資料實作：呈現層讀完控件後組出此結構即可
#[derive(Debug, Clone, Default)]
pub struct EditedResult {
    pub categories: Vec<MenuCategory>,
    pub store_info: Option<StoreProfile>,
    pub selection: DiffSelection,
}

impl ResultEditor for EditedResult {
    fn edited_menu(&self) -> Vec<MenuCategory> {
        self.categories.clone()
    }

    fn edited_profile(&self) -> Option<StoreProfile> {
        self.store_info.clone()
    }

    fn diff_selection(&self) -> DiffSelection {
        self.selection.clone()
    }
}

/// 辨識工作階段
pub struct RecognitionSession<A: ApiClient> {
    api: A,
    routes: ApiRoutes,
    hooks: SessionHooks,
    can_create_store: bool,

    phase: Phase,
    selected_image: Option<EmbeddableImage>,
    target: Option<TargetStore>,
    recognition_result: Option<RecognizedMenu>,
    existing_menu: Option<RecognizedMenu>,
    menu_diff: Option<MenuDiff>,
    recognized_store_info: Option<StoreProfile>,
    existing_store_info: Option<StoreProfile>,
}

impl<A: ApiClient> RecognitionSession<A> {
    pub fn new(api: A, routes: ApiRoutes, hooks: SessionHooks) -> Self {
        Self {
            api,
            routes,
            hooks,
            can_create_store: true,
            phase: Phase::Idle,
            selected_image: None,
            target: None,
            recognition_result: None,
            existing_menu: None,
            menu_diff: None,
            recognized_store_info: None,
            existing_store_info: None,
        }
    }

    /// 停用新店家建立（例如唯讀的群組管理情境）
    pub fn disallow_store_creation(mut self) -> Self {
        self.can_create_store = false;
        self
    }

    // === 狀態存取 ===

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_diff_mode(&self) -> bool {
        matches!(self.phase, Phase::Result { diff_mode: true })
    }

    pub fn selected_image(&self) -> Option<&EmbeddableImage> {
        self.selected_image.as_ref()
    }

    pub fn target(&self) -> Option<&TargetStore> {
        self.target.as_ref()
    }

    pub fn recognition_result(&self) -> Option<&RecognizedMenu> {
        self.recognition_result.as_ref()
    }

    pub fn menu_diff(&self) -> Option<&MenuDiff> {
        self.menu_diff.as_ref()
    }

    pub fn recognized_store_info(&self) -> Option<&StoreProfile> {
        self.recognized_store_info.as_ref()
    }

    pub fn existing_store_info(&self) -> Option<&StoreProfile> {
        self.existing_store_info.as_ref()
    }

    /// 可選擇的店家列表（套用可編輯篩選）
    pub fn stores(&self) -> Vec<StoreSummary> {
        let stores = (self.hooks.get_stores)();
        match &self.hooks.filter_editable_stores {
            Some(filter) => filter(stores),
            None => stores,
        }
    }

    // === 生命週期 ===

    /// 開啟上傳介面：完整重置後進入 Upload
    pub fn open(&mut self) {
        self.reset();
        self.phase = Phase::Upload;
    }

    /// 關閉：回到未初始化狀態
    pub fn close(&mut self) {
        self.reset();
        self.phase = Phase::Idle;
    }

    fn reset(&mut self) {
        self.selected_image = None;
        self.target = None;
        self.recognition_result = None;
        self.existing_menu = None;
        self.menu_diff = None;
        self.recognized_store_info = None;
        self.existing_store_info = None;
    }

    /// 回到上傳步驟：清除圖片與過時的辨識結果，保留目標店家
    pub fn back_to_upload(&mut self) {
        self.phase = Phase::Upload;
        self.selected_image = None;
        self.recognition_result = None;
        self.existing_menu = None;
        self.menu_diff = None;
        self.recognized_store_info = None;
    }

    // === 目標店家與圖片 ===

    /// 選擇儲存目標
    ///
    /// 現有店家：立即從本地快取的店家列表擷取店家資訊供後續比較。
    /// 新店家：名稱修剪後不可為空。切換目標會捨棄已過時的差異結果。
    pub fn select_target(&mut self, target: TargetStore) -> Result<()> {
        let target = match target {
            TargetStore::New(name) => {
                if !self.can_create_store {
                    return self.validation_failure("無法新增店家");
                }
                let trimmed = name.trim().to_string();
                if trimmed.is_empty() {
                    return self.validation_failure("請選擇店家或輸入新店家名稱");
                }
                self.existing_store_info = None;
                TargetStore::New(trimmed)
            }
            TargetStore::Existing(id) => {
                self.existing_store_info = (self.hooks.get_stores)()
                    .into_iter()
                    .find(|s| s.id == id)
                    .map(|s| s.profile());
                TargetStore::Existing(id)
            }
        };

        if self.target.as_ref() != Some(&target) {
            self.recognition_result = None;
            self.existing_menu = None;
            self.menu_diff = None;
            self.recognized_store_info = None;
            if matches!(self.phase, Phase::Result { .. }) {
                self.phase = Phase::Upload;
            }
        }
        self.target = Some(target);
        Ok(())
    }

    /// 選擇並壓縮來源圖片
    ///
    /// 超過大小上限的來源在壓縮與任何網路動作之前就被擋下。
    pub fn select_image(&mut self, source: &[u8]) -> Result<()> {
        if source.len() > MAX_SOURCE_BYTES {
            return self.validation_failure("圖片大小不能超過 10MB");
        }
        match compressor::compress(source) {
            Ok(image) => {
                self.selected_image = Some(image);
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "圖片處理失敗");
                self.notify("圖片處理失敗", Severity::Error);
                Err(e)
            }
        }
    }

    pub fn clear_image(&mut self) {
        self.selected_image = None;
    }

    // === 辨識 ===

    /// 送出辨識請求
    ///
    /// 失敗時回到 Upload 並保留已選圖片，使用者可直接重試。
    pub async fn recognize(&mut self) -> Result<()> {
        if self.phase != Phase::Upload {
            return self.validation_failure("目前無法進行辨識");
        }
        let Some(image) = &self.selected_image else {
            return self.validation_failure("請先選擇菜單圖片");
        };
        if self.target.is_none() {
            return self.validation_failure("請選擇店家或輸入新店家名稱");
        }
        let mime = image.mime().to_string();
        let bytes = image.bytes().to_vec();

        self.phase = Phase::Recognizing;
        match self.perform_recognize(mime, bytes).await {
            Ok(()) => Ok(()),
            Err(e) => {
                let err = match e {
                    MenuAiError::Recognition(_) => e,
                    other => MenuAiError::Recognition(other.to_string()),
                };
                tracing::warn!(error = %err, "辨識失敗");
                self.notify(&err.to_string(), Severity::Error);
                self.phase = Phase::Upload;
                Err(err)
            }
        }
    }

    async fn perform_recognize(&mut self, mime: String, bytes: Vec<u8>) -> Result<()> {
        let store_id = self.target.as_ref().and_then(|t| t.store_id());
        let url = self.routes.recognize(store_id);
        let response = self.api.post_multipart(&url, "menu.jpg", &mime, bytes).await?;
        self.apply_recognition(response.body)
    }

    /// 套用辨識回應
    ///
    /// 已知店家時後端會回 `recognized_menu` 信封並附上現有菜單與差異；
    /// 新店家則直接回菜單本體。錯誤欄位可能在頂層，也可能包在信封裡。
    fn apply_recognition(&mut self, body: Value) -> Result<()> {
        if let Some(message) = recognition_error(&body) {
            return Err(MenuAiError::Recognition(message));
        }

        if let Some(envelope) = body.get("recognized_menu") {
            let recognized: RecognizedMenu = serde_json::from_value(envelope.clone())?;
            let existing: Option<RecognizedMenu> = body
                .get("existing_menu")
                .filter(|v| !v.is_null())
                .map(|v| serde_json::from_value(v.clone()))
                .transpose()?;
            let mut menu_diff: Option<MenuDiff> = body
                .get("diff")
                .filter(|v| !v.is_null())
                .map(|v| serde_json::from_value(v.clone()))
                .transpose()?;

            // 信封缺差異但有現有菜單：就地重算
            if menu_diff.is_none() {
                if let Some(existing_menu) = &existing {
                    menu_diff = Some(diff::compare_menus(existing_menu, &recognized));
                }
            }

            let diff_mode =
                existing.is_some() && menu_diff.as_ref().is_some_and(MenuDiff::has_changes);

            self.recognized_store_info = recognized.store_info.clone();
            self.recognition_result = Some(recognized);
            self.existing_menu = existing;
            self.menu_diff = menu_diff;
            self.phase = Phase::Result { diff_mode };
        } else {
            let recognized: RecognizedMenu = serde_json::from_value(body)?;
            self.recognized_store_info = recognized.store_info.clone();
            self.recognition_result = Some(recognized);
            self.existing_menu = None;
            self.menu_diff = None;
            self.phase = Phase::Result { diff_mode: false };
        }
        Ok(())
    }

    // === 儲存 ===

    /// 儲存目前的結果
    ///
    /// 差異模式送部分更新，一般模式整份覆蓋。所有失敗都轉成
    /// 使用者可見的通知，工作階段停留在 Result 供修正後重試。
    pub async fn save(&mut self, editor: &dyn ResultEditor) -> Result<()> {
        match self.phase {
            Phase::Result { diff_mode: true } => self.save_diff(editor).await,
            Phase::Result { diff_mode: false } => self.save_normal(editor).await,
            _ => self.validation_failure("沒有可儲存的辨識結果"),
        }
    }

    async fn save_normal(&mut self, editor: &dyn ResultEditor) -> Result<()> {
        let categories = sanitize_categories(editor.edited_menu());
        if categories.is_empty() {
            return self.validation_failure("無有效菜單內容可儲存");
        }

        let store_id = match self.target.clone() {
            Some(TargetStore::Existing(id)) => id,
            Some(TargetStore::New(name)) => {
                let id = match self.create_store(&name).await {
                    Ok(id) => id,
                    Err(e) => {
                        self.notify(&e.to_string(), Severity::Error);
                        return Err(e);
                    }
                };
                self.notify(
                    &format!("店家「{name}」已建立，正在儲存菜單..."),
                    Severity::Info,
                );
                self.target = Some(TargetStore::Existing(id.clone()));
                id
            }
            None => return self.validation_failure("請選擇店家或輸入新店家名稱"),
        };

        let mut body = json!({ "categories": categories });
        if let Some(profile) = editor.edited_profile().and_then(|p| p.normalized()) {
            body["store_info"] = serde_json::to_value(profile)?;
        }

        let url = self.routes.menu(&store_id);
        match self.api.post_json(&url, &body).await {
            Ok(response) if response.ok() => {
                self.finish_save("菜單儲存成功！");
                Ok(())
            }
            Ok(response) => {
                let message = response.detail().unwrap_or("儲存失敗").to_string();
                self.notify(&message, Severity::Error);
                Err(MenuAiError::Persistence(message))
            }
            Err(e) => {
                let message = format!("儲存失敗：{e}");
                self.notify(&message, Severity::Error);
                Err(MenuAiError::Persistence(message))
            }
        }
    }

    async fn save_diff(&mut self, editor: &dyn ResultEditor) -> Result<()> {
        let store_id = match self.target.clone() {
            Some(TargetStore::Existing(id)) => id,
            _ => return self.validation_failure("未選擇店家，請重新操作"),
        };
        let Some(menu_diff) = self.menu_diff.clone() else {
            return self.validation_failure("沒有可套用的差異");
        };

        let selection = editor.diff_selection();
        let mut apply_items: Vec<MenuItem> = Vec::new();
        let mut remove_items: Vec<String> = Vec::new();
        for idx in &selection.added {
            if let Some(item) = menu_diff.added.get(*idx) {
                apply_items.push(item.clone());
            }
        }
        for idx in &selection.modified {
            if let Some(entry) = menu_diff.modified.get(*idx) {
                apply_items.push(entry.new.clone());
            }
        }
        for idx in &selection.removed {
            if let Some(item) = menu_diff.removed.get(*idx) {
                remove_items.push(item.name.clone());
            }
        }

        if apply_items.is_empty() && remove_items.is_empty() {
            return self.validation_failure("請至少選擇一項變更");
        }

        let mut body = json!({
            "diff_mode": true,
            "apply_items": apply_items,
            "remove_items": remove_items,
        });
        if let Some(profile) = editor.edited_profile().and_then(|p| p.normalized()) {
            body["store_info"] = serde_json::to_value(profile)?;
        }

        let url = self.routes.menu_save(&store_id);
        match self.api.post_json(&url, &body).await {
            Ok(response) if response.ok() => {
                self.finish_save("菜單已更新！");
                Ok(())
            }
            Ok(response) => {
                let message = response.detail().unwrap_or("套用失敗").to_string();
                self.notify(&message, Severity::Error);
                Err(MenuAiError::Persistence(message))
            }
            Err(e) => {
                self.notify("套用失敗", Severity::Error);
                Err(MenuAiError::Persistence(format!("套用失敗：{e}")))
            }
        }
    }

    /// 建立新店家並回傳其 id；群組範圍外預設 global scope
    async fn create_store(&self, name: &str) -> Result<String> {
        let mut body = json!({ "name": name });
        if self.routes.group_code().is_none() {
            body["scope"] = json!("global");
        }

        let response = self
            .api
            .post_json(&self.routes.create_store(), &body)
            .await
            .map_err(|e| MenuAiError::Persistence(format!("建立店家失敗：{e}")))?;
        if !response.ok() {
            let reason = response.detail().unwrap_or("未知錯誤");
            return Err(MenuAiError::Persistence(format!("建立店家失敗：{reason}")));
        }
        response
            .body
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| MenuAiError::Persistence("建立店家失敗：回應缺少店家 id".to_string()))
    }

    fn finish_save(&mut self, message: &str) {
        self.close();
        self.notify(message, Severity::Info);
        (self.hooks.on_menu_saved)();
    }

    // === 編輯現有菜單 ===

    /// 直接載入店家的現有菜單進入編輯（不經過辨識）
    pub async fn load_existing(&mut self, store_id: &str) -> Result<()> {
        self.reset();
        self.target = Some(TargetStore::Existing(store_id.to_string()));
        self.recognized_store_info = (self.hooks.get_stores)()
            .into_iter()
            .find(|s| s.id == store_id)
            .map(|s| s.profile());

        let url = self.routes.menu(store_id);
        let loaded: Result<RecognizedMenu> = match self.api.get_json(&url).await {
            Ok(response) if response.ok() => {
                serde_json::from_value(response.body).map_err(MenuAiError::from)
            }
            Ok(response) => Err(MenuAiError::Persistence(
                response.detail().unwrap_or("載入菜單失敗").to_string(),
            )),
            Err(e) => Err(e),
        };

        match loaded {
            Ok(menu) => {
                self.recognition_result = Some(menu);
                self.phase = Phase::Result { diff_mode: false };
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, store_id, "載入菜單失敗");
                self.notify("載入菜單失敗", Severity::Error);
                self.close();
                Err(e)
            }
        }
    }

    // === 呈現 ===

    /// 目前結果的視圖模型；非 Result 狀態時為 None
    pub fn result_view(&self) -> Option<ResultView> {
        let diff_mode = match self.phase {
            Phase::Result { diff_mode } => diff_mode,
            _ => return None,
        };
        let result = self.recognition_result.as_ref()?;
        Some(view::build_result_view(
            result,
            self.menu_diff.as_ref().filter(|_| diff_mode),
            self.existing_store_info.as_ref(),
            self.recognized_store_info.as_ref(),
        ))
    }

    // === 內部輔助 ===

    fn notify(&self, message: &str, severity: Severity) {
        (self.hooks.notify)(message, severity);
    }

    fn validation_failure(&self, message: &str) -> Result<()> {
        self.notify(message, Severity::Error);
        Err(MenuAiError::Validation(message.to_string()))
    }
}

/// 頂層或 `recognized_menu` 信封內的錯誤欄位（空字串不算）
fn recognition_error(body: &Value) -> Option<String> {
    let top = body.get("error").and_then(Value::as_str);
    let nested = body
        .get("recognized_menu")
        .and_then(|m| m.get("error"))
        .and_then(Value::as_str);
    top.or(nested)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// 整理編輯後的分類：修剪名稱、剔除空品項與空分類
///
/// 分類名稱留空時以「未命名」代替。
pub fn sanitize_categories(categories: Vec<MenuCategory>) -> Vec<MenuCategory> {
    categories
        .into_iter()
        .filter_map(|category| {
            let name = category.name.trim();
            let name = if name.is_empty() {
                "未命名".to_string()
            } else {
                name.to_string()
            };
            let items: Vec<MenuItem> = category
                .items
                .into_iter()
                .filter_map(|mut item| {
                    let trimmed = item.name.trim().to_string();
                    if trimmed.is_empty() {
                        return None;
                    }
                    item.name = trimmed;
                    item.description = item.description.trim().to_string();
                    Some(item)
                })
                .collect();
            if items.is_empty() {
                None
            } else {
                Some(MenuCategory { name, items })
            }
        })
        .collect()
}
