use std::env;
use std::time::Duration;

use crate::constants::{
    EDIT_SESSION_TTL_SECS, MIN_SESSION_SECRET_LEN, PIN_HASH_COST, PIN_MAX_ATTEMPTS,
    PIN_WINDOW_SECS, RATE_LIMIT_SWEEP_SECS,
};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_path: String,
    pub allowed_origins: Vec<String>,
    pub environment: String,
    /// HMAC key for edit session credentials
    pub session_secret: String,
    /// Header carrying the owner id set by the authentication layer
    pub owner_header: String,
    pub pin_max_attempts: u32,
    pub pin_window_secs: u64,
    pub edit_session_ttl_secs: u64,
    pub rate_limit_sweep_secs: u64,
    pub pin_hash_cost: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| "Invalid SERVER_PORT")?;

        let database_path =
            env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/fitlink.db".to_string());

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let session_secret = env::var("SESSION_SECRET")
            .map_err(|_| "SESSION_SECRET must be set for edit session signing")?;
        if session_secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(format!(
                "SESSION_SECRET must be at least {MIN_SESSION_SECRET_LEN} bytes"
            ));
        }

        let owner_header = env::var("OWNER_HEADER")
            .unwrap_or_else(|_| "x-authenticated-user".to_string())
            .to_ascii_lowercase();

        let pin_max_attempts = parse_var("PIN_MAX_ATTEMPTS", PIN_MAX_ATTEMPTS)?;
        let pin_window_secs = parse_var("PIN_WINDOW_SECS", PIN_WINDOW_SECS)?;
        let edit_session_ttl_secs = parse_var("EDIT_SESSION_TTL_SECS", EDIT_SESSION_TTL_SECS)?;
        let rate_limit_sweep_secs = parse_var("RATE_LIMIT_SWEEP_SECS", RATE_LIMIT_SWEEP_SECS)?;
        let pin_hash_cost = parse_var("PIN_HASH_COST", PIN_HASH_COST)?;

        if pin_max_attempts == 0 || pin_window_secs == 0 || rate_limit_sweep_secs == 0 {
            return Err(
                "PIN_MAX_ATTEMPTS, PIN_WINDOW_SECS and RATE_LIMIT_SWEEP_SECS must be positive"
                    .to_string(),
            );
        }

        Ok(Config {
            server_host,
            server_port,
            database_path,
            allowed_origins,
            environment,
            session_secret,
            owner_header,
            pin_max_attempts,
            pin_window_secs,
            edit_session_ttl_secs,
            rate_limit_sweep_secs,
            pin_hash_cost,
        })
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Edit session cookies are only marked `Secure` in production
    pub fn cookie_secure(&self) -> bool {
        self.environment == "production"
    }

    pub fn pin_window(&self) -> Duration {
        Duration::from_secs(self.pin_window_secs)
    }

    pub fn edit_session_ttl(&self) -> Duration {
        Duration::from_secs(self.edit_session_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.rate_limit_sweep_secs)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, String> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| format!("Invalid {name}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var_falls_back_to_default() {
        let value: u32 = parse_var("FITLINK_TEST_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn test_cookie_secure_only_in_production() {
        let mut config = Config {
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            database_path: String::new(),
            allowed_origins: vec![],
            environment: "development".to_string(),
            session_secret: "s".repeat(32),
            owner_header: "x-authenticated-user".to_string(),
            pin_max_attempts: PIN_MAX_ATTEMPTS,
            pin_window_secs: PIN_WINDOW_SECS,
            edit_session_ttl_secs: EDIT_SESSION_TTL_SECS,
            rate_limit_sweep_secs: RATE_LIMIT_SWEEP_SECS,
            pin_hash_cost: PIN_HASH_COST,
        };
        assert!(!config.cookie_secure());

        config.environment = "production".to_string();
        assert!(config.cookie_secure());
        assert_eq!(config.pin_window(), Duration::from_secs(900));
        assert_eq!(config.edit_session_ttl(), Duration::from_secs(3600));
    }
}
