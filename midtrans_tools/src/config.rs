use log::*;
use spg_common::{parse_boolean_flag, Secret};

pub const SANDBOX_API_URL: &str = "https://api.sandbox.midtrans.com";
pub const PRODUCTION_API_URL: &str = "https://api.midtrans.com";

#[derive(Debug, Clone, Default)]
pub struct MidtransConfig {
    /// Used for basic auth against the Core API, and as the salt of notification signatures
    pub server_key: Secret<String>,
    pub is_production: bool,
    /// Base URL of the Core API, without a trailing slash
    pub api_url: String,
}

impl MidtransConfig {
    pub fn new<S: Into<String>>(server_key: Secret<String>, is_production: bool, api_url: S) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self { server_key, is_production, api_url }
    }

    pub fn new_from_env_or_default() -> Self {
        let server_key = Secret::new(std::env::var("SPG_MIDTRANS_SERVER_KEY").unwrap_or_else(|_| {
            warn!("🪛️ SPG_MIDTRANS_SERVER_KEY not set. Status queries and signature checks will fail.");
            String::default()
        }));
        let is_production = parse_boolean_flag(std::env::var("SPG_MIDTRANS_IS_PRODUCTION").ok(), false);
        let default_url = if is_production { PRODUCTION_API_URL } else { SANDBOX_API_URL };
        let api_url = std::env::var("SPG_MIDTRANS_API_URL").unwrap_or_else(|_| {
            info!("🪛️ SPG_MIDTRANS_API_URL not set, using {default_url}");
            default_url.to_string()
        });
        Self::new(server_key, is_production, api_url)
    }
}
