use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use tracing::warn;

pub const DEV_JWT_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub token_ttl_minutes: i64,
    pub seed: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let jwt_secret = get("CANDOR_JWT_SECRET").unwrap_or_else(|| {
            warn!("CANDOR_JWT_SECRET not set, using the development secret");
            DEV_JWT_SECRET.into()
        });
        let db_path = PathBuf::from(get("CANDOR_DB_PATH").unwrap_or_else(|| "candor.db".into()));
        let host = get("CANDOR_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = get("CANDOR_PORT")
            .unwrap_or_else(|| "8000".into())
            .parse()
            .context("CANDOR_PORT must be a port number")?;
        let token_ttl_minutes: i64 = get("CANDOR_TOKEN_TTL_MINUTES")
            .unwrap_or_else(|| "60".into())
            .parse()
            .context("CANDOR_TOKEN_TTL_MINUTES must be a whole number of minutes")?;
        if token_ttl_minutes <= 0 {
            anyhow::bail!("CANDOR_TOKEN_TTL_MINUTES must be positive");
        }
        let seed = matches!(get("CANDOR_SEED").as_deref(), Some("1" | "true"));

        Ok(Self {
            jwt_secret,
            db_path,
            host,
            port,
            token_ttl_minutes,
            seed,
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.token_ttl_minutes)
    }
}
