mod api;
mod config;
mod error;
mod helpers;

mod data_objects;

pub use api::MidtransApi;
pub use config::MidtransConfig;
pub use data_objects::MidtransNotification;
pub use error::MidtransApiError;
pub use helpers::{parse_transaction_time, signature_key, verify_signature};
