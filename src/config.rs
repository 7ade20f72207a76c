use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_days: i64,
    /// Set false for local development over plain HTTP.
    pub cookie_secure: bool,
    pub asset_upload_url: Option<String>,
    pub asset_api_key: String,
    pub port: u16,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/vidstream".to_string());

        let access_token_secret = env::var("ACCESS_TOKEN_SECRET")
            .unwrap_or_else(|_| "access-secret-change-this-in-production".to_string());

        let refresh_token_secret = env::var("REFRESH_TOKEN_SECRET")
            .unwrap_or_else(|_| "refresh-secret-change-this-in-production".to_string());

        let access_token_ttl_minutes = env::var("ACCESS_TOKEN_TTL_MINUTES")
            .unwrap_or_else(|_| "15".to_string())
            .parse()
            .unwrap_or(15);

        let refresh_token_ttl_days = env::var("REFRESH_TOKEN_TTL_DAYS")
            .unwrap_or_else(|_| "7".to_string())
            .parse()
            .unwrap_or(7);

        let cookie_secure = env::var("COOKIE_SECURE")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let asset_upload_url = env::var("ASSET_UPLOAD_URL").ok();
        let asset_api_key = env::var("ASSET_API_KEY").unwrap_or_default();

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .unwrap_or(3000);

        Ok(Config {
            database_url,
            access_token_secret,
            refresh_token_secret,
            access_token_ttl_minutes,
            refresh_token_ttl_days,
            cookie_secure,
            asset_upload_url,
            asset_api_key,
            port,
        })
    }
}
