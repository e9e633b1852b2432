use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::settlement::DEFAULT_PAYMENT_EPSILON;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub solver: SolverConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub enable_cors: bool,
    /// Origin of the trip web UI allowed through CORS
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3333,
            request_timeout_secs: 30,
            enable_cors: false,
            cors_origin: "http://localhost:4200".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    pub payment_epsilon: f64,
    pub max_people: usize,
    pub warm_up_on_start: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            payment_epsilon: DEFAULT_PAYMENT_EPSILON,
            max_people: 64,
            warm_up_on_start: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// `EnvFilter` directives, used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            filter: "info,roadtrip_settlement=debug,hyper=warn,tower_http=info".to_string(),
        }
    }
}

impl Config {
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("ROADTRIP__").split("__"))
    }

    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Ok(Self::figment().extract()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let cfg: Config = Figment::from(Serialized::defaults(Config::default()))
            .extract()
            .unwrap();
        assert_eq!(cfg.server.socket_addr().unwrap().port(), 3333);
        assert_eq!(cfg.solver.payment_epsilon, DEFAULT_PAYMENT_EPSILON);
    }

    #[test]
    fn env_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("ROADTRIP__SERVER__PORT", "8080");
            jail.set_env("ROADTRIP__SOLVER__MAX_PEOPLE", "12");
            jail.set_env("ROADTRIP__LOGGING__FORMAT", "pretty");
            let cfg: Config = Config::figment().extract()?;
            assert_eq!(cfg.server.port, 8080);
            assert_eq!(cfg.solver.max_people, 12);
            assert_eq!(cfg.logging.format, LogFormat::Pretty);
            Ok(())
        });
    }

    #[test]
    fn toml_file_is_merged() {
        figment::Jail::expect_with(|jail| {
            jail.create_dir("config")?;
            jail.create_file(
                "config/default.toml",
                r#"
                [server]
                host = "0.0.0.0"

                [solver]
                payment_epsilon = 0.001
                "#,
            )?;
            let cfg: Config = Config::figment().extract()?;
            assert_eq!(cfg.server.host, "0.0.0.0");
            assert_eq!(cfg.server.port, 3333);
            assert_eq!(cfg.solver.payment_epsilon, 0.001);
            Ok(())
        });
    }

    #[test]
    fn rejects_bad_host() {
        let server = ServerConfig {
            host: "not a host".to_string(),
            ..ServerConfig::default()
        };
        assert!(server.socket_addr().is_err());
    }
}
