//! Student Gate Bot - Main Entry Point
//!
//! A Telegram bot that authenticates students and answers their questions
//! from local data or a hosted assistant.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use student_gate_bot::config::{
    BotSettings, ChatbaseConfig, DataBundle, SheetsConfig, TelegramConfig,
};
use student_gate_bot::gate::{CredentialSet, SessionGate};
use student_gate_bot::integrations::{ChatbaseClient, EmailStore, SheetLogger};
use student_gate_bot::routing::Router;
use student_gate_bot::telegram::{BotServices, StudentBot};

/// Telegram bot for student questions behind a login gate.
#[derive(Parser, Debug)]
#[command(name = "student_gate_bot")]
#[command(about = "Answer student questions on Telegram behind an ID check")]
#[command(version)]
struct Args {
    /// Directory holding student_id.json, certificates_students.json and faq.json.
    #[arg(short, long, default_value = "data")]
    data_dir: String,

    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Write example data files into the data directory and exit.
    #[arg(long)]
    generate_data: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level);

    // Handle example data generation
    if args.generate_data {
        return generate_example_data(&args.data_dir);
    }

    // Load environment variables
    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    // Load configurations
    let tg_config = TelegramConfig::from_env()
        .context("Failed to load Telegram configuration from environment")?;
    let bot_settings = BotSettings::from_env_with_defaults();
    let chatbase_config = ChatbaseConfig::from_env();
    let sheets_config = SheetsConfig::from_env();

    // Load and validate data files
    let require_students = !bot_settings.uses_passcode();
    let data = DataBundle::load_from_dir(&args.data_dir, require_students)
        .with_context(|| format!("Failed to load data from {}", args.data_dir))?;

    let warnings = data
        .validate(require_students)
        .context("Data validation failed")?;
    for warning in &warnings {
        warn!("{}", warning);
    }

    // Passcode mode ignores the student directory for logins
    let credentials = match &bot_settings.access_passcode {
        Some(code) => CredentialSet::passcode(code),
        None => CredentialSet::student_ids(data.students.clone()),
    };
    if credentials.is_empty() {
        bail!("No credentials configured: set ACCESS_PASSCODE or provide a student directory");
    }

    info!(
        "Loaded {} credential(s) in {} mode, {} certificate link(s), {} resource(s), {} date(s)",
        credentials.len(),
        credentials.mode(),
        data.certificates.len(),
        data.faq.resources.len(),
        data.faq.dates.len()
    );

    let gate = Arc::new(SessionGate::in_memory(credentials, bot_settings.gate_settings()));
    let gate_settings = gate.settings();
    info!(
        "Rate limit: {} messages per {} ms",
        gate_settings.limit,
        gate_settings.window.num_milliseconds()
    );

    let router = Router::new(data.certificates, data.faq);
    debug!("Routing rules: {}", router.rule_names().join(", "));

    // Set up integrations
    let emails = match &bot_settings.email_store_path {
        Some(path) => EmailStore::open(path)
            .with_context(|| format!("Failed to open email store {}", path.display()))?,
        None => EmailStore::in_memory(),
    };
    if !emails.is_empty().await {
        info!("Loaded {} stored email(s)", emails.len().await);
    }

    let chatbase = if chatbase_config.is_configured() {
        Some(ChatbaseClient::from_config(&chatbase_config).context("Failed to create Chatbase client")?)
    } else {
        warn!("Chatbase is not configured; unmatched questions get the fallback reply");
        None
    };

    let sheets = SheetLogger::new(&sheets_config).context("Failed to create sheet logger")?;

    if tg_config.admin_chat_id.is_none() {
        warn!("ADMIN_TELEGRAM_ID not set; staff notifications are disabled");
    }

    let services =
        BotServices::new(&tg_config, Arc::clone(&gate), router, emails, chatbase, sheets);
    let bot = StudentBot::new(&tg_config, services);

    if let Err(e) = bot.register_commands().await {
        warn!("Failed to register command menu: {}", e);
    }

    info!("Bot is running. Use Ctrl+C to stop.");
    bot.run().await;

    info!("Shutting down... ({} user(s) seen this session)", gate.known_users());
    Ok(())
}

/// Initializes the logging subsystem.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Writes example data files.
fn generate_example_data(dir: &str) -> Result<()> {
    if Path::new(dir).join(student_gate_bot::config::STUDENTS_FILE).exists() {
        bail!("{dir} already contains data; refusing to overwrite");
    }

    DataBundle::example().save_to_dir(dir)?;

    println!("✓ Example data written to: {dir}/");
    println!("\nTo use this bot:");
    println!("1. Edit the JSON files in {dir}/ with your students and links");
    println!("2. Create a .env file with BOT_TOKEN (and optionally ADMIN_TELEGRAM_ID)");
    println!("3. Set CHATBASE_BOT_ID and CHATBASE_API_KEY to forward questions");
    println!("4. Run: student_gate_bot --data-dir {dir}");

    Ok(())
}
