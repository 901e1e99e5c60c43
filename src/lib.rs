//! 菜單照片AI辨識・差異合併用戶端
//!
//! 管理介面的菜單辨識流程：上傳 → 壓縮 → 辨識 → 差異確認／編輯 → 儲存。
//! 辨識後端、通知與店家目錄都是外部協作端，透過窄介面接入：
//! - `compressor`: 上傳前圖片壓縮
//! - `session`: 一次上傳到儲存的工作階段狀態機
//! - `diff` / `store_info`: 菜單與店家資訊的差異比對
//! - `view`: 結果視圖模型（交給任意渲染技術）

pub mod api;
pub mod cli;
pub mod compressor;
pub mod config;
pub mod diff;
pub mod endpoints;
pub mod error;
pub mod session;
pub mod store_info;
pub mod types;
pub mod view;

pub use api::{ApiClient, ApiResponse, HttpApiClient};
pub use compressor::{compress, compress_with, EmbeddableImage};
pub use config::Config;
pub use diff::compare_menus;
pub use endpoints::ApiRoutes;
pub use error::{MenuAiError, Result};
pub use session::{
    DiffSelection, EditedResult, Phase, RecognitionSession, ResultEditor, SessionHooks, Severity,
};
pub use store_info::{compare_store_info, FieldChange};
pub use types::{
    MenuCategory, MenuDiff, MenuItem, MenuVariant, ModifiedItem, RecognizedMenu, StoreProfile,
    StoreSummary, TargetStore,
};
pub use view::{build_result_view, DiffLine, ResultBody, ResultView};
