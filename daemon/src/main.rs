//! Spotgate daemon: entry point for running the admission gate.

use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

use spotgate_admission::AdmissionMode;
use spotgate_crypto::{
    derive_address, encode_signature, generate_keypair, keypair_from_seed, sign_message,
    SignatureEncoding,
};
use spotgate_node::{GateConfig, GateNode};
use spotgate_store::AdmissionStore;
use spotgate_store_lmdb::LmdbEnvironment;

#[derive(Parser)]
#[command(name = "spotgate", about = "Capacity-limited admission gate for a Telegram group")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "SPOTGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the admission database.
    #[arg(long, env = "SPOTGATE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Address for the HTTP server, e.g. "0.0.0.0:3000".
    #[arg(long, env = "SPOTGATE_LISTEN_ADDR")]
    listen_addr: Option<SocketAddr>,

    /// Total number of admission slots.
    #[arg(long, env = "SPOTGATE_MAX_SPOTS")]
    max_spots: Option<u64>,

    /// Admission mode: "identity" (wallet signature) or "anonymous" (captcha).
    #[arg(long, env = "SPOTGATE_MODE")]
    mode: Option<AdmissionMode>,

    /// Message wallets must sign.
    #[arg(long, env = "SPOTGATE_CHALLENGE_MESSAGE")]
    challenge_message: Option<String>,

    /// Also require a captcha token in identity mode.
    #[arg(long, env = "SPOTGATE_REQUIRE_CAPTCHA")]
    require_captcha: bool,

    /// Captcha service secret.
    #[arg(long, env = "SPOTGATE_CAPTCHA_SECRET", hide_env_values = true)]
    captcha_secret: Option<String>,

    /// Captcha `siteverify` URL.
    #[arg(long, env = "SPOTGATE_CAPTCHA_VERIFY_URL")]
    captcha_verify_url: Option<String>,

    /// Telegram bot token.
    #[arg(long, env = "SPOTGATE_TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    telegram_bot_token: Option<String>,

    /// Group chat id (numeric or @username).
    #[arg(long, env = "SPOTGATE_TELEGRAM_CHAT_ID", allow_hyphen_values = true)]
    telegram_chat_id: Option<String>,

    /// Bot API base URL.
    #[arg(long, env = "SPOTGATE_TELEGRAM_API_URL")]
    telegram_api_url: Option<String>,

    /// Invite links expire this many seconds after creation.
    #[arg(long, env = "SPOTGATE_INVITE_TTL_SECS")]
    invite_ttl_secs: Option<u64>,

    /// Greet new members from the webhook.
    #[arg(long, env = "SPOTGATE_WELCOME")]
    welcome: bool,

    /// Greeting text; `{name}` is replaced by the member's name.
    #[arg(long, env = "SPOTGATE_WELCOME_TEMPLATE")]
    welcome_template: Option<String>,

    /// Expected Telegram webhook secret token.
    #[arg(long, env = "SPOTGATE_WEBHOOK_SECRET", hide_env_values = true)]
    webhook_secret: Option<String>,

    /// Allowed CORS origins (comma-separated). Empty allows any.
    #[arg(long, env = "SPOTGATE_CORS_ORIGINS", value_delimiter = ',')]
    cors_origins: Vec<String>,

    /// Take the client IP from X-Forwarded-For.
    #[arg(long, env = "SPOTGATE_TRUST_FORWARDED_FOR")]
    trust_forwarded_for: bool,

    /// Enable Prometheus metrics endpoint.
    #[arg(long, env = "SPOTGATE_ENABLE_METRICS")]
    metrics: bool,

    /// Log format: "human" or "json".
    #[arg(long, env = "SPOTGATE_LOG_FORMAT")]
    log_format: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "SPOTGATE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the HTTP server.
    Run,
    /// Print capacity usage from the local database.
    Spots,
    /// List stored admission records.
    Records,
    /// Generate a wallet key and a signature over the challenge message.
    Keygen {
        /// Reuse an existing 32-byte secret key (hex) instead of generating one.
        #[arg(long)]
        secret_hex: Option<String>,
    },
    /// Register the bot's webhook with Telegram.
    SetWebhook {
        /// Public URL of this server's `/telegram-webhook` endpoint.
        #[arg(long)]
        url: String,
    },
}

impl Cli {
    /// Layer CLI flags and environment variables over `base`.
    fn apply(&self, base: GateConfig) -> GateConfig {
        GateConfig {
            data_dir: self.data_dir.clone().unwrap_or(base.data_dir),
            listen_addr: self.listen_addr.unwrap_or(base.listen_addr),
            max_spots: self.max_spots.unwrap_or(base.max_spots),
            mode: self.mode.unwrap_or(base.mode),
            challenge_message: self
                .challenge_message
                .clone()
                .unwrap_or(base.challenge_message),
            require_captcha: self.require_captcha || base.require_captcha,
            captcha_secret: self.captcha_secret.clone().or(base.captcha_secret),
            captcha_verify_url: self
                .captcha_verify_url
                .clone()
                .unwrap_or(base.captcha_verify_url),
            telegram_bot_token: self.telegram_bot_token.clone().or(base.telegram_bot_token),
            telegram_chat_id: self.telegram_chat_id.clone().or(base.telegram_chat_id),
            telegram_api_url: self
                .telegram_api_url
                .clone()
                .unwrap_or(base.telegram_api_url),
            invite_ttl_secs: self.invite_ttl_secs.or(base.invite_ttl_secs),
            welcome_enabled: self.welcome || base.welcome_enabled,
            welcome_template: self
                .welcome_template
                .clone()
                .unwrap_or(base.welcome_template),
            webhook_secret: self.webhook_secret.clone().or(base.webhook_secret),
            cors_origins: if self.cors_origins.is_empty() {
                base.cors_origins
            } else {
                self.cors_origins.clone()
            },
            trust_forwarded_for: self.trust_forwarded_for || base.trust_forwarded_for,
            enable_metrics: self.metrics || base.enable_metrics,
            log_format: self.log_format.clone().unwrap_or(base.log_format),
            log_level: self.log_level.clone().unwrap_or(base.log_level),
            ..base
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let base = match &cli.config {
        Some(path) => GateConfig::from_toml_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => GateConfig::default(),
    };
    let config = cli.apply(base);

    spotgate_node::init_logging(config.log_format()?, &config.log_level);
    if let Some(path) = &cli.config {
        tracing::info!("Loaded config from {}", path.display());
    }

    match cli.command {
        Command::Run => {
            let mut node = GateNode::new(config)?;
            node.start().await?;

            tracing::info!("Shutdown signal received, stopping");
            node.stop().await?;

            tracing::info!("Spotgate exited cleanly");
        }
        Command::Spots => {
            let env = LmdbEnvironment::open(&config.data_dir, config.map_size_bytes())?;
            let used = env.admission_store().count()?;
            println!(
                "max: {}  used: {}  remaining: {}",
                config.max_spots,
                used,
                config.max_spots.saturating_sub(used)
            );
        }
        Command::Records => {
            let env = LmdbEnvironment::open(&config.data_dir, config.map_size_bytes())?;
            let records = env.admission_store().iter_records()?;
            for record in &records {
                println!("{}\t{}", record.created_at.as_secs(), record.key);
            }
            println!("{} record(s)", records.len());
        }
        Command::Keygen { secret_hex } => {
            let keypair = match secret_hex {
                Some(text) => {
                    let bytes = hex::decode(text.trim()).context("secret key is not hex")?;
                    let seed: [u8; 32] = bytes
                        .as_slice()
                        .try_into()
                        .map_err(|_| anyhow::anyhow!("secret key must be 32 bytes"))?;
                    keypair_from_seed(&seed)
                }
                None => generate_keypair(),
            };
            let signature = sign_message(config.challenge_message.as_bytes(), &keypair.private);
            println!("wallet:           {}", derive_address(&keypair.public));
            println!("secret (hex):     {}", hex::encode(keypair.private.0));
            println!(
                "signatureBase58:  {}",
                encode_signature(&signature, SignatureEncoding::Base58)
            );
            println!("challenge:        {}", config.challenge_message);
        }
        Command::SetWebhook { url } => {
            let bot = spotgate_node::bot_client(&config)?;
            let secret = config.webhook_secret();
            bot.set_webhook(&url, secret.as_deref()).await?;
            tracing::info!(url = %url, secret = secret.is_some(), "webhook registered");
        }
    }

    Ok(())
}
