//! Spotgate server assembly.
//!
//! Loads [`GateConfig`], opens the LMDB store, builds the captcha and
//! Telegram clients, and runs the HTTP API until SIGINT/SIGTERM.

pub mod config;
pub mod error;
pub mod logging;
pub mod node;
pub mod shutdown;

pub use config::GateConfig;
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use node::{bot_client, GateNode};
pub use shutdown::ShutdownController;
