//! StayBot Chat Relay - Entry Point

use staybot::config::LogFormat;
use staybot::{Config, Server};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    let config = Config::from_env()?;

    let log_level = std::env::var("RUST_LOG")
        .map(|s| match s.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        })
        .unwrap_or(Level::INFO);

    match config.log_format {
        LogFormat::Pretty => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(log_level)
                .with_ansi(true)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogFormat::Json => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(log_level)
                .with_ansi(false)
                .json()
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    info!("StayBot Chat Relay v{}", env!("CARGO_PKG_VERSION"));

    Server::new(config).run().await
}

fn print_help() {
    println!("StayBot Chat Relay v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Usage: staybot [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --help, -h         Show this help");
    println!();
    println!("Environment variables:");
    println!("  OPENAI_API_KEY            Model provider API key");
    println!("  OPENAI_BASE_URL           Completions base URL (default: https://api.openai.com/v1)");
    println!("  STAYBOT_MODEL             Model name (default: gpt-4o)");
    println!("  STAYBOT_LLM_TIMEOUT_SECS  Completion request timeout");
    println!("  TELEGRAM_BOT_TOKEN        Telegram bot token");
    println!("  PORT                      Listen port (default: 8000)");
    println!("  STAYBOT_BIND_ADDR         Listen address (default: 0.0.0.0)");
    println!("  CHAT_ID_STORE_PATH        Phone link file (default: chat_id_store.json)");
    println!("  STAYBOT_LOG_FORMAT        pretty | json");
    println!("  RUST_LOG                  trace | debug | info | warn | error");
}
