use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("config error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(#[from] spotgate_store_lmdb::LmdbError),

    #[error("admission error: {0}")]
    Admission(#[from] spotgate_admission::AdmissionError),

    #[error("telegram client error: {0}")]
    Telegram(#[from] spotgate_telegram::TelegramError),

    #[error("captcha client error: {0}")]
    Captcha(#[from] spotgate_captcha::CaptchaError),

    #[error("HTTP server error: {0}")]
    Rpc(#[from] spotgate_rpc::RpcError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
