use std::fmt;

#[derive(Debug)]
pub enum AppError {
    /// The backend rejected the request (non-2xx with an error body).
    ApiError(String),
    /// Transport-level failure talking to the backend.
    HttpError(String),
    /// The RPC endpoint returned a JSON-RPC error object.
    RpcError(String),
    /// A contract return value or event log could not be decoded.
    ContractError(String),
    /// No usable access token or the session is not established.
    AuthError(String),
    ConfigError(String),
    SerializationError(String),
    /// Investment amount failed validation before any transaction was sent.
    InvalidAmount(String),
    InsufficientBalance(String),
    /// A submitted transaction was mined with a failure status.
    TxFailed(String),
    /// A record the operation needs does not exist.
    NotFound(String),
    /// The position is not in a state that allows the operation.
    Unavailable(String),
    /// The deploy receipt carried no CampaignCreated log.
    MissingEvent(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ApiError(msg) => write!(f, "API error: {}", msg),
            AppError::HttpError(msg) => write!(f, "HTTP error: {}", msg),
            AppError::RpcError(msg) => write!(f, "RPC error: {}", msg),
            AppError::ContractError(msg) => write!(f, "Contract error: {}", msg),
            AppError::AuthError(msg) => write!(f, "Auth error: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            AppError::InvalidAmount(msg) => write!(f, "Invalid investment amount: {}", msg),
            AppError::InsufficientBalance(msg) => write!(f, "Insufficient balance: {}", msg),
            AppError::TxFailed(msg) => write!(f, "Transaction failed: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Unavailable(msg) => write!(f, "Not available: {}", msg),
            AppError::MissingEvent(msg) => write!(f, "Missing event: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::HttpError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerializationError(err.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}
