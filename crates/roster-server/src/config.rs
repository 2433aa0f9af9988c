//! Environment-sourced application configuration.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use roster_auth::CognitoConfig;

/// Top-level configuration, assembled from the process environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
    pub cognito: CognitoConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path of the JSON file backing the record store.
    pub data_file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

impl AppConfig {
    /// Reads the configuration from the environment.
    ///
    /// Recognized variables: `AWS_REGION`, `AWS_COGNITO_USER_POOL_ID`,
    /// `AWS_COGNITO_CLIENT_ID`, `AWS_COGNITO_CLIENT_SECRET`,
    /// `AWS_COGNITO_RESOURCE_SERVER_ID`, `ROSTER_HOST`, `ROSTER_PORT`,
    /// `ROSTER_DATA_FILE`, `ROSTER_LOG`.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first unusable value.
    pub fn from_env() -> Result<Self, String> {
        let port_raw = env_or("ROSTER_PORT", "3000");
        let port: u16 = port_raw
            .parse()
            .map_err(|_| format!("ROSTER_PORT must be a port number, got {port_raw:?}"))?;

        Ok(Self {
            server: ServerConfig {
                host: env_or("ROSTER_HOST", "0.0.0.0"),
                port,
            },
            store: StoreConfig {
                data_file: PathBuf::from(env_or("ROSTER_DATA_FILE", "users.json")),
            },
            logging: LoggingConfig {
                level: env_or("ROSTER_LOG", "info"),
            },
            cognito: CognitoConfig {
                region: env_or("AWS_REGION", ""),
                user_pool_id: env_or("AWS_COGNITO_USER_POOL_ID", ""),
                app_client_id: env_or("AWS_COGNITO_CLIENT_ID", ""),
                resource_server_id: env_or("AWS_COGNITO_RESOURCE_SERVER_ID", ""),
                client_secret: env_or("AWS_COGNITO_CLIENT_SECRET", ""),
            },
        })
    }

    /// Validates the assembled configuration.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("ROSTER_PORT must be > 0".into());
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("ROSTER_LOG must be one of {valid_levels:?}"));
        }
        self.cognito
            .validate()
            .map_err(|e| format!("cognito config error: {e}"))?;
        Ok(())
    }

    /// Returns the socket address to bind.
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            store: StoreConfig {
                data_file: PathBuf::from("users.json"),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            cognito: CognitoConfig {
                region: "eu-west-1".to_string(),
                user_pool_id: "eu-west-1_AbCdEfGhI".to_string(),
                app_client_id: "client-123".to_string(),
                ..CognitoConfig::default()
            },
        }
    }

    #[test]
    fn test_validate_accepts_complete_config() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_level() {
        let mut cfg = config();
        cfg.logging.level = "verbose".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_missing_cognito_settings() {
        let mut cfg = config();
        cfg.cognito.region.clear();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_addr() {
        let cfg = config();
        assert_eq!(cfg.addr().to_string(), "127.0.0.1:3000");

        let mut cfg = config();
        cfg.server.host = "not an ip".to_string();
        assert_eq!(cfg.addr().to_string(), "0.0.0.0:3000");
    }
}
