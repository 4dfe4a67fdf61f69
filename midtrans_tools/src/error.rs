use thiserror::Error;

#[derive(Debug, Error)]
pub enum MidtransApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid REST request: {0}")]
    RestRequestError(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    /// Midtrans answers most failures with HTTP 200 and puts the real status code in the body.
    #[error("Midtrans rejected the request with status code {status_code}. {message}")]
    Rejected { status_code: String, message: String },
}
