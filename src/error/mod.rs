use std::net::IpAddr;
use thiserror::Error;

pub mod http;
pub use http::*;

pub type PortfolioResult<T> = Result<T, PortfolioError>;

#[derive(Debug, Error)]
pub enum PortfolioError {
    #[error("Failed to bind to {ip}:{port}: {source}")]
    BindFailed {
        ip: IpAddr,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("Server already running on port {port}")]
    ServerAlreadyRunning { port: u16 },

    #[error("IO operation '{operation}' failed: {source}")]
    IoError {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Store '{store}' could not be encoded or decoded: {source}")]
    Storage {
        store: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("HTTP {status} error: {message}")]
    HttpError { status: u16, message: String },

    #[error("Configuration error in '{field}': {reason}")]
    ConfigError { field: String, reason: String },

    #[error("Authentication failed: {reason}")]
    AuthError { reason: String },

    #[error("{resource} not found")]
    NotFound { resource: &'static str, id: u64 },

    #[error("{message}")]
    InvalidInput { message: String },

    #[error("Mail delivery failed: {reason}")]
    MailError { reason: String },
}

impl PortfolioError {
    pub fn bind_failed(ip: IpAddr, port: u16, source: std::io::Error) -> Self {
        Self::BindFailed { ip, port, source }
    }

    pub fn server_already_running(port: u16) -> Self {
        Self::ServerAlreadyRunning { port }
    }

    pub fn io_error(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::IoError {
            operation: operation.into(),
            source,
        }
    }

    pub fn storage(store: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Storage {
            store: store.into(),
            source,
        }
    }

    pub fn http_error(status: u16, message: impl Into<String>) -> Self {
        Self::HttpError {
            status,
            message: message.into(),
        }
    }

    pub fn config_error(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigError {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn auth_error(reason: impl Into<String>) -> Self {
        Self::AuthError {
            reason: reason.into(),
        }
    }

    pub fn not_found(resource: &'static str, id: u64) -> Self {
        Self::NotFound { resource, id }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn mail_error(reason: impl ToString) -> Self {
        Self::MailError {
            reason: reason.to_string(),
        }
    }
}

impl From<bevy_defer::AccessError> for PortfolioError {
    fn from(error: bevy_defer::AccessError) -> Self {
        use bevy_defer::AccessError;

        match error {
            AccessError::ChannelClosed => Self::io_error(
                "async channel access",
                std::io::Error::new(std::io::ErrorKind::BrokenPipe, "async channel closed"),
            ),
            AccessError::TaskPanicked => Self::io_error(
                "task execution",
                std::io::Error::other("task spawned has panicked"),
            ),
            AccessError::IO => Self::io_error(
                "bevy_defer io operation",
                std::io::Error::other("io error"),
            ),
            AccessError::ResourceNotFound { name } => {
                Self::config_error("resource", format!("resource <{}> not found", name))
            }
            AccessError::Custom(msg) => Self::config_error("custom", msg.to_string()),
            _ => Self::config_error(
                "world_access",
                format!("bevy_defer access error: {}", error),
            ),
        }
    }
}
