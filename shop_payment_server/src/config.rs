use std::{env, net::IpAddr, time::Duration};

use log::*;
use midtrans_tools::MidtransConfig as MidtransApiConfig;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use spg_common::{parse_boolean_flag, Secret};

use crate::errors::ServerError;

const DEFAULT_SPG_HOST: &str = "127.0.0.1";
const DEFAULT_SPG_PORT: u16 = 8470;
const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_EVENT_BUFFER_SIZE: usize = 25;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    /// Lets admins force a payment status via `/api/payment/manual-update`. Off by default.
    pub enable_manual_update: bool,
    /// How long to wait on the Midtrans status API before giving up
    pub provider_timeout: Duration,
    pub event_buffer_size: usize,
    pub midtrans: MidtransConfig,
}

#[derive(Clone, Debug, Default)]
pub struct MidtransConfig {
    pub api: MidtransApiConfig,
    /// Verify the `signature_key` of incoming notifications against the server key
    pub signature_checks: bool,
    /// If supplied, webhook calls will be checked against a whitelist of Midtrans IP addresses.
    /// To explicitly disable the whitelist, set this to "false", "none", or "0".
    pub whitelist: Option<Vec<IpAddr>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SPG_HOST.to_string(),
            port: DEFAULT_SPG_PORT,
            database_url: String::default(),
            auth: AuthConfig::default(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            enable_manual_update: false,
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            midtrans: MidtransConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SPG_HOST").ok().unwrap_or_else(|| DEFAULT_SPG_HOST.into());
        let port = env::var("SPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for SPG_PORT. {e} Using the default, {DEFAULT_SPG_PORT}, instead."
                    );
                    DEFAULT_SPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SPG_PORT);
        let database_url = env::var("SPG_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ SPG_DATABASE_URL is not set. Please set it to the URL for the shop payments database.");
            String::default()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let midtrans = MidtransConfig::from_env_or_defaults();
        let use_x_forwarded_for = parse_boolean_flag(env::var("SPG_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("SPG_USE_FORWARDED").ok(), false);
        let enable_manual_update = parse_boolean_flag(env::var("SPG_ENABLE_MANUAL_UPDATE").ok(), false);
        if enable_manual_update {
            warn!("🪛️ Manual payment status updates are enabled. Admins can mark orders as paid without Midtrans.");
        }
        let provider_timeout = env::var("SPG_PROVIDER_TIMEOUT_SECS")
            .map_err(|_| {
                info!(
                    "🪛️ SPG_PROVIDER_TIMEOUT_SECS is not set. Using the default value of {}s.",
                    DEFAULT_PROVIDER_TIMEOUT.as_secs()
                )
            })
            .and_then(|s| {
                s.parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|e| warn!("🪛️ Invalid configuration value for SPG_PROVIDER_TIMEOUT_SECS. {e}"))
            })
            .ok()
            .unwrap_or(DEFAULT_PROVIDER_TIMEOUT);
        let event_buffer_size = env::var("SPG_STOCK_ALERT_BUFFER")
            .ok()
            .and_then(|s| {
                s.parse::<usize>().map_err(|e| warn!("🪛️ Invalid value for SPG_STOCK_ALERT_BUFFER. {e}")).ok()
            })
            .unwrap_or(DEFAULT_EVENT_BUFFER_SIZE);
        Self {
            host,
            port,
            database_url,
            auth,
            use_x_forwarded_for,
            use_forwarded,
            enable_manual_update,
            provider_timeout,
            event_buffer_size,
            midtrans,
        }
    }
}

impl MidtransConfig {
    pub fn from_env_or_defaults() -> Self {
        let api = MidtransApiConfig::new_from_env_or_default();
        let signature_checks = parse_boolean_flag(env::var("SPG_MIDTRANS_SIGNATURE_CHECKS").ok(), true);
        if !signature_checks {
            warn!("🚨️ Midtrans notification signature checks are disabled. Anyone can post payment notifications.");
        }
        let whitelist = env::var("SPG_MIDTRANS_IP_WHITELIST").ok().and_then(|s| parse_whitelist(&s));
        match &whitelist {
            Some(whitelist) if whitelist.is_empty() => {
                warn!(
                    "🚨️ The Midtrans IP whitelist was configured, but is empty. The server will run, but won't \
                     accept any payment notifications."
                );
            },
            None => {
                info!("🪛️ No Midtrans IP whitelist is set. Only signature validation will be used.");
            },
            Some(v) => {
                let addrs = v.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ");
                info!("🪛️ Midtrans IP whitelist: {addrs}");
            },
        }
        Self { api, signature_checks, whitelist }
    }
}

fn parse_whitelist(s: &str) -> Option<Vec<IpAddr>> {
    if ["none", "false", "0", ""].contains(&s.trim().to_lowercase().as_str()) {
        info!(
            "🪛️ Midtrans IP whitelist is disabled. If this is not what you want, set SPG_MIDTRANS_IP_WHITELIST to a \
             comma-separated list of IP addresses to enable it."
        );
        return None;
    }
    let ip_addrs = s
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| {
            s.parse::<IpAddr>()
                .map_err(|e| warn!("🪛️ Ignoring invalid IP address ({s}) in SPG_MIDTRANS_IP_WHITELIST: {e}"))
                .ok()
        })
        .collect::<Vec<IpAddr>>();
    Some(ip_addrs)
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HS256 secret that bearer tokens are signed with
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. No token issued \
             elsewhere will be accepted. Set SPG_JWT_SECRET before running in production. 🚨️🚨️🚨️"
        );
        let secret = thread_rng().sample_iter(&Alphanumeric).take(64).map(char::from).collect::<String>();
        Self { jwt_secret: Secret::new(secret) }
    }
}

impl AuthConfig {
    pub fn new<S: Into<String>>(secret: S) -> Self {
        Self { jwt_secret: Secret::new(secret.into()) }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("SPG_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [SPG_JWT_SECRET]")))?;
        if secret.trim().is_empty() {
            return Err(ServerError::ConfigurationError("SPG_JWT_SECRET is empty".to_string()));
        }
        Ok(Self::new(secret))
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that is used to configure the server's behaviour. Generally we try to keep this
/// as small as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Copy, Debug, Default)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
    pub enable_manual_update: bool,
    pub provider_timeout: Duration,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            use_x_forwarded_for: config.use_x_forwarded_for,
            use_forwarded: config.use_forwarded,
            enable_manual_update: config.enable_manual_update,
            provider_timeout: config.provider_timeout,
        }
    }
}

/// The webhook's view of the Midtrans configuration.
#[derive(Clone, Debug, Default)]
pub struct SignatureCheck {
    pub enabled: bool,
    pub server_key: Secret<String>,
}

impl SignatureCheck {
    pub fn from_config(config: &MidtransConfig) -> Self {
        Self { enabled: config.signature_checks, server_key: config.api.server_key.clone() }
    }

    pub fn disabled() -> Self {
        Self { enabled: false, server_key: Secret::default() }
    }
}
