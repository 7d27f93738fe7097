use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use anyhow::{Context, Result};
use tracing::{info, warn};

const DEV_JWT_SECRET: &str = "circle-development-secret-change-me";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub public_dir: PathBuf,
    pub uploads_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub cors_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: 3000,
            jwt_secret: String::from(DEV_JWT_SECRET),
            token_ttl_hours: 24,
            public_dir: PathBuf::from("public"),
            uploads_dir: PathBuf::from("uploads"),
            max_upload_bytes: 50 * 1024 * 1024,
            cors_origins: vec![
                String::from("http://localhost:3000"),
                String::from("http://127.0.0.1:3000"),
            ],
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let jwt_secret = var("JWT_SECRET").unwrap_or_else(|| {
            warn!("JWT_SECRET not set, using the development secret");
            defaults.jwt_secret.clone()
        });

        Ok(Self {
            host: try_load("HOST", defaults.host)?,
            port: try_load("PORT", defaults.port)?,
            jwt_secret,
            token_ttl_hours: try_load("TOKEN_TTL_HOURS", defaults.token_ttl_hours)?,
            public_dir: var("PUBLIC_DIR").map(PathBuf::from).unwrap_or(defaults.public_dir),
            uploads_dir: var("UPLOADS_DIR").map(PathBuf::from).unwrap_or(defaults.uploads_dir),
            max_upload_bytes: try_load("MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            cors_origins: var("CORS_ORIGINS")
                .map(|origins| parse_list(&origins))
                .unwrap_or(defaults.cors_origins),
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn try_load<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr + Display,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {key} value: {raw}")),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.token_ttl_hours, 24);
        assert_eq!(config.max_upload_bytes, 52_428_800);
        assert_eq!(config.address(), "0.0.0.0:3000");
    }

    #[test]
    fn unset_keys_fall_back() {
        let port: u16 = try_load("CIRCLE_TEST_UNSET_PORT", 8000).unwrap();
        assert_eq!(port, 8000);
    }

    #[test]
    fn bad_values_are_reported() {
        env::set_var("CIRCLE_TEST_BAD_PORT", "eighty");
        let err = try_load::<u16>("CIRCLE_TEST_BAD_PORT", 8000).unwrap_err();
        assert!(err.to_string().contains("CIRCLE_TEST_BAD_PORT"));
    }

    #[test]
    fn origin_lists() {
        assert_eq!(
            parse_list(" http://a.test , ,http://b.test"),
            ["http://a.test", "http://b.test"]
        );
    }
}
