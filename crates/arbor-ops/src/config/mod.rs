use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::workflows::estimating::CostParameters;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub pricing: PricingConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let pricing = PricingConfig {
            setup_cost: pricing_var("APP_SETUP_COST", CostParameters::STANDARD.setup_cost)?,
            rate_per_point: pricing_var(
                "APP_RATE_PER_POINT",
                CostParameters::STANDARD.rate_per_point,
            )?,
            profit_multiplier: pricing_var(
                "APP_PROFIT_MULTIPLIER",
                CostParameters::STANDARD.profit_multiplier,
            )?,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            pricing,
        })
    }
}

fn pricing_var(name: &'static str, default: f64) -> Result<f64, ConfigError> {
    let raw = match env::var(name) {
        Ok(raw) => raw,
        Err(_) => return Ok(default),
    };

    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| ConfigError::InvalidPricing { var: name })?;

    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::InvalidPricing { var: name });
    }

    Ok(value)
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Deployment overrides for the estimating dials. Defaults come from the one
/// shared `CostParameters::STANDARD` constant so the full-assessment and
/// quick-estimate paths never drift apart.
#[derive(Debug, Clone)]
pub struct PricingConfig {
    pub setup_cost: f64,
    pub rate_per_point: f64,
    pub profit_multiplier: f64,
}

impl PricingConfig {
    pub fn cost_parameters(&self) -> CostParameters {
        CostParameters {
            setup_cost: self.setup_cost,
            rate_per_point: self.rate_per_point,
            profit_multiplier: self.profit_multiplier,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidPricing { var: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidPricing { var } => {
                write!(f, "{var} must be a positive finite number")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort => None,
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPricing { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("APP_SETUP_COST");
        env::remove_var("APP_RATE_PER_POINT");
        env::remove_var("APP_PROFIT_MULTIPLIER");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.pricing.cost_parameters(), CostParameters::STANDARD);
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn pricing_overrides_are_parsed() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_SETUP_COST", "350");
        env::set_var("APP_RATE_PER_POINT", "0.9");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.pricing.setup_cost, 350.0);
        assert_eq!(config.pricing.rate_per_point, 0.9);
        assert_eq!(
            config.pricing.profit_multiplier,
            CostParameters::STANDARD.profit_multiplier
        );
        reset_env();
    }

    #[test]
    fn rejects_non_positive_pricing_override() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_PROFIT_MULTIPLIER", "0");
        let error = AppConfig::load().expect_err("zero multiplier rejected");
        assert!(matches!(
            error,
            ConfigError::InvalidPricing {
                var: "APP_PROFIT_MULTIPLIER"
            }
        ));
        reset_env();
    }
}
