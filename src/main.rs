use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use menu_ai_rust::{api, cli, config, session, types, view};

use api::{ApiClient, HttpApiClient};
use cli::{Cli, Commands};
use config::Config;
use session::{
    DiffSelection, EditedResult, RecognitionSession, SessionHooks, Severity,
};
use types::{StoreProfile, StoreSummary, TargetStore};
use view::{ResultBody, ResultView};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Recognize {
            image,
            store,
            new_store,
            yes,
        } => run_recognize(image, store, new_store, yes).await?,
        Commands::Stores => run_stores().await?,
        Commands::Config {
            server,
            api_prefix,
            group_code,
            token,
        } => run_config(server, api_prefix, group_code, token)?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("menu_ai_rust=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("menu_ai_rust=info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn build_client(config: &Config) -> anyhow::Result<HttpApiClient> {
    let mut client = HttpApiClient::new(config.server_url.clone(), config.timeout_seconds)
        .context("建立 HTTP 用戶端失敗")?;
    if let Some(token) = config.get_auth_token() {
        client = client.with_token(token);
    }
    Ok(client)
}

/// 取回店家目錄（之後由工作階段同步讀取的本地快取）
async fn fetch_stores(client: &HttpApiClient, config: &Config) -> anyhow::Result<Vec<StoreSummary>> {
    let response = client
        .get_json(&config.routes().stores())
        .await
        .context("無法取得店家列表")?;
    if !response.ok() {
        anyhow::bail!("無法取得店家列表（HTTP {}）", response.status);
    }
    serde_json::from_value(response.body).context("店家列表格式不正確")
}

async fn run_recognize(
    image_path: std::path::PathBuf,
    store: Option<String>,
    new_store: Option<String>,
    yes: bool,
) -> anyhow::Result<()> {
    let config = Config::load()?;
    let client = build_client(&config)?;

    println!("📋 menu-ai - 菜單辨識\n");

    println!("[1/3] 載入店家列表...");
    let stores = fetch_stores(&client, &config).await?;
    println!("✔ {} 家店家\n", stores.len());

    let hooks_stores = stores.clone();
    let hooks = SessionHooks::new(
        |message, severity| match severity {
            Severity::Error => eprintln!("✖ {message}"),
            Severity::Info => println!("✔ {message}"),
        },
        move || hooks_stores.clone(),
        || {},
    );
    let mut session = RecognitionSession::new(client, config.routes(), hooks);
    session.open();

    let target = match (store, new_store) {
        (Some(id), _) => TargetStore::Existing(id),
        (None, Some(name)) => TargetStore::New(name),
        (None, None) => prompt_target(&stores)?,
    };
    if session.select_target(target).is_err() {
        std::process::exit(1);
    }

    let source = std::fs::read(&image_path)
        .with_context(|| format!("無法讀取圖片: {}", image_path.display()))?;
    if session.select_image(&source).is_err() {
        std::process::exit(1);
    }

    println!("\n[2/3] 辨識中...");
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("等待辨識結果（可能需要數分鐘）");
    spinner.enable_steady_tick(std::time::Duration::from_millis(120));
    let recognized = session.recognize().await;
    spinner.finish_and_clear();
    if recognized.is_err() {
        std::process::exit(1);
    }
    println!("✔ 辨識完成\n");

    let view = session
        .result_view()
        .context("辨識完成但沒有結果視圖")?;
    render_result(&view);

    let prompt = if session.is_diff_mode() {
        "套用勾選的變更？"
    } else {
        "確認並儲存？"
    };
    if !yes {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(true)
            .interact()
            .context("讀取輸入失敗")?;
        if !confirmed {
            println!("已取消，未做任何變更");
            return Ok(());
        }
    }

    println!("\n[3/3] 儲存中...");
    let editor = build_editor(&session, &view);
    if session.save(&editor).await.is_err() {
        std::process::exit(1);
    }

    Ok(())
}

fn prompt_target(stores: &[StoreSummary]) -> anyhow::Result<TargetStore> {
    let mut labels: Vec<String> = stores.iter().map(|s| s.name.clone()).collect();
    labels.push("+ 新增店家".to_string());

    let index = dialoguer::Select::new()
        .with_prompt("選擇目標店家")
        .items(&labels)
        .default(0)
        .interact()
        .context("讀取輸入失敗")?;

    if index < stores.len() {
        Ok(TargetStore::Existing(stores[index].id.clone()))
    } else {
        let name: String = dialoguer::Input::new()
            .with_prompt("新店家名稱")
            .interact_text()
            .context("讀取輸入失敗")?;
        Ok(TargetStore::New(name))
    }
}

/// CLI 的編輯介面實作：照單全收辨識結果、全選差異項目
fn build_editor<A: ApiClient>(
    session: &RecognitionSession<A>,
    view: &ResultView,
) -> EditedResult {
    let categories = session
        .recognition_result()
        .map(|menu| menu.categories.clone())
        .unwrap_or_default();
    let selection = session
        .menu_diff()
        .map(DiffSelection::select_all)
        .unwrap_or_default();
    EditedResult {
        categories,
        store_info: profile_from_view(view),
        selection,
    }
}

/// 店家資訊以顯示值送出（辨識值優先，退回現有值）
fn profile_from_view(view: &ResultView) -> Option<StoreProfile> {
    let mut profile = StoreProfile::default();
    for field in &view.store_info {
        let value = (!field.display_value.is_empty()).then(|| field.display_value.clone());
        match field.key {
            "name" => profile.name = value,
            "phone" => profile.phone = value,
            "address" => profile.address = value,
            _ => profile.description = value,
        }
    }
    profile.normalized()
}

fn render_result(view: &ResultView) {
    if !view.warnings.is_empty() {
        println!("⚠️ 注意事項：");
        for warning in &view.warnings {
            println!("  - {warning}");
        }
        println!();
    }

    match &view.body {
        ResultBody::Editor { categories } => {
            if categories.is_empty() {
                println!("未辨識到菜單內容");
            }
            for category in categories {
                println!("【{}】", category.name);
                for item in &category.items {
                    let price = if item.variants.is_empty() {
                        format!("${}", item.price)
                    } else {
                        item.variants
                            .iter()
                            .map(|v| format!("{} ${}", v.name, v.price))
                            .collect::<Vec<_>>()
                            .join(" / ")
                    };
                    if item.description.is_empty() {
                        println!("  {} {}", item.name, price);
                    } else {
                        println!("  {} {}（{}）", item.name, price, item.description);
                    }
                }
            }
        }
        ResultBody::Diff {
            added,
            modified,
            removed,
            unchanged,
        } => {
            render_diff_section("✅ 新增品項", added);
            render_diff_section("⚠️ 修改品項", modified);
            render_diff_section("❌ 刪除品項", removed);
            if !unchanged.is_empty() {
                println!("📋 未變更品項 ({})", unchanged.len());
            }
        }
    }

    let changed: Vec<_> = view.store_info.iter().filter(|f| f.changed).collect();
    if !changed.is_empty() {
        println!("\n🏪 店家資訊變更：");
        for field in changed {
            let old = if field.old_value.is_empty() {
                "(空)"
            } else {
                field.old_value.as_str()
            };
            let new = if field.new_value.is_empty() {
                "(清除)"
            } else {
                field.new_value.as_str()
            };
            println!("  {}：{} → {}", field.label, old, new);
        }
    }
    println!();
}

fn render_diff_section(title: &str, lines: &[view::DiffLine]) {
    if lines.is_empty() {
        return;
    }
    println!("{} ({})", title, lines.len());
    for line in lines {
        match &line.category {
            Some(category) => println!("  {} {} [{}]", line.name, line.price_label, category),
            None => println!("  {} {}", line.name, line.price_label),
        }
    }
}

async fn run_stores() -> anyhow::Result<()> {
    let config = Config::load()?;
    let client = build_client(&config)?;
    let stores = fetch_stores(&client, &config).await?;

    if stores.is_empty() {
        println!("目前沒有店家");
        return Ok(());
    }
    for store in &stores {
        let phone = store.phone.as_deref().unwrap_or("-");
        println!("{}  {}  {}", store.id, store.name, phone);
    }
    Ok(())
}

fn run_config(
    server: Option<String>,
    api_prefix: Option<String>,
    group_code: Option<String>,
    token: Option<String>,
) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    let mut dirty = false;

    if let Some(server) = server {
        config.server_url = server;
        dirty = true;
    }
    if let Some(prefix) = api_prefix {
        config.api_prefix = prefix;
        dirty = true;
    }
    if let Some(code) = group_code {
        config.group_code = (!code.is_empty()).then_some(code);
        dirty = true;
    }
    if let Some(token) = token {
        config.auth_token = (!token.is_empty()).then_some(token);
        dirty = true;
    }

    if dirty {
        config.save()?;
        println!("✔ 設定已儲存: {}", Config::config_path()?.display());
    }

    println!("伺服器位址: {}", config.server_url);
    println!("API 前綴:   {}", config.api_prefix);
    println!("群組代碼:   {}", config.group_code.as_deref().unwrap_or("(無)"));
    println!(
        "認證 token: {}",
        if config.get_auth_token().is_some() {
            "(已設定)"
        } else {
            "(無)"
        }
    );
    Ok(())
}
