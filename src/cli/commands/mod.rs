
use crate::bus::{InboundMessage, MessageBus, OutboundMessage};
use crate::channels::manager::ChannelManager;
use crate::config::{Config, get_config_path, load_config, save_config};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "qqbridge")]
#[command(about = "QQ bot channel bridge", version = crate::VERSION)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Onboard,
    /// Run the enabled channels
    Gateway {
        /// Echo mode: reply to every inbound message with its own content
        #[arg(long)]
        echo: bool,
    },
    /// Show qqbridge status
    Status,
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration with secrets redacted
    Show,
    /// Print the config file location
    Path,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Onboard => onboard()?,
        Commands::Gateway { echo } => gateway(echo).await?,
        Commands::Status => status()?,
        Commands::Config { cmd } => match cmd {
            ConfigCommands::Show => {
                let config = load_config(None)?;
                println!("{}", redacted_config_json(&config)?);
            }
            ConfigCommands::Path => println!("{}", get_config_path()?.display()),
        },
    }

    Ok(())
}

fn onboard() -> Result<()> {
    println!("Initializing qqbridge...");

    let config_path = get_config_path()?;
    if config_path.exists() {
        println!("Config already exists at {}", config_path.display());
        println!("Overwrite? (y/N): ");
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            return Ok(());
        }
    }

    save_config(&Config::default(), Some(config_path.as_path()))?;
    println!("\u{2713} Created config at {}", config_path.display());

    println!("\nNext steps:");
    println!("  1. Set channels.qq.appId and channels.qq.secret in the config");
    println!("     (or QQBRIDGE_CHANNELS__QQ__APP_ID / QQBRIDGE_CHANNELS__QQ__SECRET)");
    println!("  2. Set channels.qq.enabled to true");
    println!("  3. Try it locally: qqbridge gateway --echo");

    Ok(())
}

fn status() -> Result<()> {
    let config_path = get_config_path()?;
    let config = load_config(Some(config_path.as_path()))?;
    let qq = &config.channels.qq;

    println!("qqbridge {} status\n", crate::VERSION);
    println!(
        "Config: {} {}",
        config_path.display(),
        if config_path.exists() {
            "\u{2713}"
        } else {
            "\u{2717}"
        }
    );
    println!("QQ channel: {}", if qq.enabled { "enabled" } else { "disabled" });
    println!(
        "QQ credentials: {}",
        if qq.has_credentials() {
            "\u{2713}"
        } else {
            "not set"
        }
    );
    println!("QQ transport: {}", qq.transport);
    println!(
        "Allowed senders: {}",
        if qq.allow_from.is_empty() {
            "everyone".to_string()
        } else {
            qq.allow_from.len().to_string()
        }
    );
    Ok(())
}

/// Pretty JSON of `config` with the QQ secret masked.
pub(crate) fn redacted_config_json(config: &Config) -> Result<String> {
    let mut value = serde_json::to_value(config).context("Failed to serialize config")?;
    if let Some(secret) = value.pointer_mut("/channels/qq/secret")
        && secret.as_str().is_some_and(|s| !s.is_empty())
    {
        *secret = Value::String("[REDACTED]".to_string());
    }
    Ok(serde_json::to_string_pretty(&value)?)
}

pub(crate) fn echo_reply(msg: &InboundMessage) -> OutboundMessage {
    OutboundMessage::in_reply_to(msg, format!("[echo] {}", msg.content))
}

/// Consume inbound messages until the bus closes. In echo mode each message
/// is answered on `outbound_tx`.
pub(crate) async fn run_inbound_loop(
    mut inbound_rx: mpsc::Receiver<InboundMessage>,
    outbound_tx: mpsc::Sender<OutboundMessage>,
    echo: bool,
) {
    info!("inbound loop started (echo={})", echo);
    while let Some(msg) = inbound_rx.recv().await {
        info!(
            "[{}] {} in {}: {}",
            msg.channel, msg.sender_id, msg.chat_id, msg.content
        );
        if echo && outbound_tx.send(echo_reply(&msg)).await.is_err() {
            warn!("outbound bus closed, stopping inbound loop");
            break;
        }
    }
}

async fn gateway(echo: bool) -> Result<()> {
    info!("Loading configuration...");
    let config = load_config(None)?;

    let mut bus = MessageBus::default();
    let inbound_rx = bus
        .take_inbound_rx()
        .context("Inbound receiver already taken")?;
    let outbound_rx = bus
        .take_outbound_rx()
        .context("Outbound receiver already taken")?;

    let mut channels = ChannelManager::new(&config, Arc::new(bus.inbound_tx.clone()));
    if channels.enabled_channels().is_empty() {
        warn!("No channels enabled; set channels.qq.enabled to true");
    }

    println!(
        "Starting qqbridge gateway{}...",
        if echo { " in ECHO mode" } else { "" }
    );
    println!("Enabled channels: {:?}", channels.enabled_channels());

    channels.start_all().await?;

    let outbound_tx = bus.outbound_tx.clone();
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            println!("\nShutting down...");
        }
        () = channels.dispatch_outbound(outbound_rx) => {}
        () = run_inbound_loop(inbound_rx, outbound_tx, echo) => {}
    }

    channels.stop_all().await?;
    info!("Gateway stopped");
    Ok(())
}
