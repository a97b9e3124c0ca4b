//! Wires storage, upstream clients, the admission controller and the HTTP
//! server into one running process.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use spotgate_admission::{AdmissionController, GateMetrics, SpotUsage, WelcomeNotifier};
use spotgate_captcha::CaptchaClient;
use spotgate_rpc::{RpcServer, RpcState};
use spotgate_store::AdmissionStore;
use spotgate_store_lmdb::LmdbEnvironment;
use spotgate_telegram::{BotClient, BotConfig};

use crate::config::GateConfig;
use crate::shutdown::ShutdownController;
use crate::NodeError;

/// Timeout for waiting on background tasks during shutdown.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Build the Bot API client described by `config`.
pub fn bot_client(config: &GateConfig) -> Result<BotClient, NodeError> {
    let token = config
        .telegram_bot_token
        .as_deref()
        .ok_or_else(|| NodeError::Config("telegram_bot_token is required".into()))?;
    let chat_id = config
        .telegram_chat_id
        .as_deref()
        .ok_or_else(|| NodeError::Config("telegram_chat_id is required".into()))?;

    let mut bot_config = BotConfig::new(token.trim(), chat_id.trim());
    bot_config.api_url = config.telegram_api_url.clone();
    bot_config.timeout = config.upstream_timeout();
    bot_config.invite_ttl_secs = config.invite_ttl_secs;
    bot_config.invite_name = config.invite_name.clone();
    Ok(BotClient::new(bot_config)?)
}

/// A configured, possibly running, Spotgate server.
pub struct GateNode {
    pub config: GateConfig,
    pub env: Arc<LmdbEnvironment>,
    pub controller: Arc<AdmissionController>,
    pub notifier: Option<Arc<WelcomeNotifier>>,
    pub metrics: Arc<GateMetrics>,
    pub shutdown: ShutdownController,
    /// Handles for spawned background tasks (joined during shutdown).
    task_handles: Vec<JoinHandle<()>>,
}

impl GateNode {
    /// Validate the configuration, open the store and build every client.
    /// Nothing is bound or spawned until [`GateNode::start`].
    pub fn new(config: GateConfig) -> Result<Self, NodeError> {
        config.validate()?;

        let env = Arc::new(LmdbEnvironment::open(
            &config.data_dir,
            config.map_size_bytes(),
        )?);
        let store: Arc<dyn AdmissionStore> = Arc::new(env.admission_store());
        let metrics = Arc::new(GateMetrics::new());
        let bot = Arc::new(bot_client(&config)?);

        let policy = config.policy();
        let needs_captcha = policy.needs_human_verification();
        let mut controller =
            AdmissionController::new(policy, store, bot.clone(), Arc::clone(&metrics));
        if needs_captcha {
            let secret = config.captcha_secret.clone().unwrap_or_default();
            let captcha = CaptchaClient::new(
                secret.trim(),
                config.captcha_verify_url.clone(),
                config.upstream_timeout(),
            )?;
            controller = controller.with_human_verifier(Arc::new(captcha));
        }

        let notifier = if config.welcome_enabled {
            let mut notifier = WelcomeNotifier::new(
                bot,
                config.welcome_template.clone(),
                Arc::clone(&metrics),
            );
            match config.numeric_chat_id() {
                Some(chat_id) => notifier = notifier.restrict_to_chat(chat_id),
                None => tracing::warn!(
                    "telegram_chat_id is not numeric; greeting joins in any chat the bot sees"
                ),
            }
            Some(Arc::new(notifier))
        } else {
            None
        };

        Ok(Self {
            config,
            env,
            controller: Arc::new(controller),
            notifier,
            metrics,
            shutdown: ShutdownController::new(),
            task_handles: Vec::new(),
        })
    }

    /// Shared state handed to the HTTP handlers.
    pub fn rpc_state(&self) -> Arc<RpcState> {
        Arc::new(RpcState {
            controller: Arc::clone(&self.controller),
            notifier: self.notifier.clone(),
            metrics: self
                .config
                .enable_metrics
                .then(|| Arc::clone(&self.metrics)),
            webhook_secret: self.config.webhook_secret(),
            trust_forwarded_for: self.config.trust_forwarded_for,
            cors_origins: self.config.cors_origins.clone(),
        })
    }

    pub fn spots(&self) -> Result<SpotUsage, NodeError> {
        Ok(self.controller.spots()?)
    }

    /// Start the HTTP server and wait for a shutdown signal.
    pub async fn start(&mut self) -> Result<(), NodeError> {
        let usage = self.controller.spots().ok();
        tracing::info!(
            mode = %self.config.mode,
            max_spots = self.config.max_spots,
            used = usage.map(|u| u.used),
            listen_addr = %self.config.listen_addr,
            data_dir = %self.config.data_dir.display(),
            welcome = self.notifier.is_some(),
            metrics = self.config.enable_metrics,
            "Spotgate starting"
        );

        let server = RpcServer::with_state(self.config.listen_addr, self.rpc_state());
        let drain = self.shutdown.signalled();
        let shutdown = self.shutdown.clone();
        let server_handle = tokio::spawn(async move {
            match server.start_with_shutdown(drain).await {
                Ok(()) => tracing::info!("HTTP server exited"),
                Err(e) => {
                    tracing::error!(error = %e, "HTTP server failed");
                    shutdown.shutdown();
                }
            }
        });
        self.task_handles.push(server_handle);

        tracing::info!("Spotgate started");

        tokio::select! {
            res = self.shutdown.wait_for_signal() => res?,
            _ = self.shutdown.signalled() => {}
        }
        Ok(())
    }

    /// Stop gracefully: signal tasks, wait for them, flush LMDB.
    pub async fn stop(&mut self) -> Result<(), NodeError> {
        tracing::info!("Spotgate stopping");
        self.shutdown.shutdown();

        let handles: Vec<JoinHandle<()>> = self.task_handles.drain(..).collect();
        let wait_all = async {
            for handle in handles {
                let _ = handle.await;
            }
        };
        if tokio::time::timeout(SHUTDOWN_TIMEOUT, wait_all)
            .await
            .is_err()
        {
            tracing::warn!(
                "shutdown timeout ({:?}), some requests may have been cut off",
                SHUTDOWN_TIMEOUT
            );
        }

        if let Err(e) = self.env.force_sync() {
            tracing::warn!(error = %e, "LMDB force_sync failed");
        } else {
            tracing::info!("LMDB flushed to disk");
        }

        tracing::info!("Spotgate stopped");
        Ok(())
    }
}
