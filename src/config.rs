use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,
    pub jwt_secret: String,
    pub access_token_ttl: usize,

    // Persistence
    pub data_file: PathBuf,
    pub directory_file: Option<PathBuf>,

    // Rate limiting
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
    pub log_dir: String,
}

fn var_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            access_token_ttl: var_or("ACCESS_TOKEN_TTL", 28_800)?, // default 8 hours

            data_file: var_or("DATA_FILE", PathBuf::from("attendance_data.json"))?,
            directory_file: env::var("DIRECTORY_FILE").ok().map(PathBuf::from),

            rate_protected_per_min: var_or("RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
        })
    }
}
