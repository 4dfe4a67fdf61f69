use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use shop_payment_engine::traits::{LedgerError, ProviderError, ReconciliationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("{0}")]
    Conflict(String),
    #[error("This feature is disabled. {0}")]
    FeatureDisabled(String),
    #[error("The payment provider did not respond within {0} seconds")]
    ProviderTimeout(u64),
    #[error("The payment provider returned an error. {0}")]
    ProviderError(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::ValidationError(_) => StatusCode::UNAUTHORIZED,
                AuthError::Expired => StatusCode::UNAUTHORIZED,
                AuthError::PoorlyFormattedToken(_) => StatusCode::UNAUTHORIZED,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::FeatureDisabled(_) => StatusCode::FORBIDDEN,
            Self::ProviderTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::ProviderError(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No bearer token was provided.")]
    MissingToken,
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("Access token signature is invalid. {0}")]
    ValidationError(String),
    #[error("Access token has expired.")]
    Expired,
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
}

impl From<LedgerError> for ServerError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::DuplicateOrder(_) => Self::Conflict(e.to_string()),
            LedgerError::ProductNotFound(_) => Self::NoRecordFound(e.to_string()),
            LedgerError::InsufficientStock { available, requested, .. } => {
                Self::InvalidRequestBody(format!("Insufficient stock. Available: {available}, Requested: {requested}"))
            },
            LedgerError::InvalidQuantity(_) => Self::InvalidRequestBody(e.to_string()),
            LedgerError::QueryError(s) => Self::InvalidRequestBody(s),
            LedgerError::DatabaseError(s) => {
                error!("🗃️ Ledger query failed. {s}");
                Self::BackendError(format!("Database error: {s}"))
            },
        }
    }
}

impl From<ReconciliationError> for ServerError {
    fn from(e: ReconciliationError) -> Self {
        error!("🗃️ Reconciliation failed. {e}");
        Self::BackendError(e.to_string())
    }
}

impl From<ProviderError> for ServerError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Timeout(secs) => Self::ProviderTimeout(secs),
            e => Self::ProviderError(e.to_string()),
        }
    }
}
