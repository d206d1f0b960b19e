use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use tracing::{info, warn};

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub redis_url: Option<String>,
    pub report_salt: Option<String>,
    pub public_origin: String,
    pub template_path: Option<String>,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("RUST_PORT", "1111"),
            redis_url: var("REDIS_URL").ok(),
            report_salt: try_load_secret("REPORT_SALT"),
            public_origin: try_load("PUBLIC_ORIGIN", "https://eatbit.top"),
            template_path: env::var("REPORT_TEMPLATE_PATH").ok(),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

/// Secrets come from the environment directly or from the Docker secrets
/// mount. Unlike required secrets, a missing salt only disables derived
/// report ids, so absence is not fatal.
fn try_load_secret(secret_name: &str) -> Option<String> {
    if let Ok(value) = env::var(secret_name) {
        return Some(value);
    }

    let path = format!("/run/secrets/{secret_name}");

    match read_to_string(&path) {
        Ok(value) => Some(value.trim().to_string()),
        Err(_) => {
            warn!("{secret_name} not set, uploads fall back to random report ids");
            None
        }
    }
}
