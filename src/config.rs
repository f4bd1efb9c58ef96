use std::env;

use crate::{
    checkout::{CheckoutSettings, DEFAULT_STORE_NAME, DEFAULT_WHATSAPP_NUMBER},
    storage::MAX_IMAGE_BYTES,
};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    pub store_name: String,
    pub whatsapp_number: String,
    pub storage_dir: String,
    pub public_base_url: String,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let session_ttl_hours = env::var("SESSION_TTL_HOURS")
            .ok()
            .and_then(|h| h.parse::<i64>().ok())
            .filter(|h| *h > 0)
            .unwrap_or(24);
        let store_name = env::var("STORE_NAME").unwrap_or_else(|_| DEFAULT_STORE_NAME.to_string());
        let whatsapp_number =
            env::var("WHATSAPP_NUMBER").unwrap_or_else(|_| DEFAULT_WHATSAPP_NUMBER.to_string());
        let storage_dir = env::var("STORAGE_DIR").unwrap_or_else(|_| "storage".to_string());
        let public_base_url =
            env::var("PUBLIC_BASE_URL").unwrap_or_else(|_| format!("http://{host}:{port}"));
        let max_upload_bytes = env::var("MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|b| b.parse::<usize>().ok())
            .unwrap_or(MAX_IMAGE_BYTES);

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            session_ttl_hours,
            store_name,
            whatsapp_number,
            storage_dir,
            public_base_url,
            max_upload_bytes,
        })
    }

    pub fn checkout_settings(&self) -> CheckoutSettings {
        CheckoutSettings {
            store_name: self.store_name.clone(),
            whatsapp_number: self.whatsapp_number.clone(),
        }
    }
}
