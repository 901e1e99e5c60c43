use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "menu-ai")]
#[command(about = "菜單照片AI辨識・差異合併工具", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細記錄輸出
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 辨識菜單照片並儲存到店家
    Recognize {
        /// 菜單照片路徑
        #[arg(required = true)]
        image: PathBuf,

        /// 目標店家 id（省略時互動選擇）
        #[arg(short, long)]
        store: Option<String>,

        /// 建立新店家並以此為名
        #[arg(short, long, conflicts_with = "store")]
        new_store: Option<String>,

        /// 跳過確認，直接套用全部辨識結果
        #[arg(short, long)]
        yes: bool,
    },

    /// 列出可用的店家
    Stores,

    /// 顯示或更新設定
    Config {
        /// 伺服器位址
        #[arg(long)]
        server: Option<String>,

        /// API 前綴
        #[arg(long)]
        api_prefix: Option<String>,

        /// 群組代碼（留空字串可清除）
        #[arg(long)]
        group_code: Option<String>,

        /// 認證 token（留空字串可清除）
        #[arg(long)]
        token: Option<String>,
    },
}
