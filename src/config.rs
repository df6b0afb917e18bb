use std::env;

use anyhow::{Context, bail};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub jwt_secret: String,
    pub ttl_hours: i64,
}

#[derive(Debug, Clone)]
pub struct AdminAccount {
    pub email: String,
    pub password: String,
}

/// Public identifiers the browser client needs to reach the auth provider.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectIdentity {
    pub api_key: String,
    pub project_id: String,
    pub app_id: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub session: SessionConfig,
    pub admin: AdminAccount,
    pub project: ProjectIdentity,
    pub public_base_url: String,
    pub otp_ttl_secs: i64,
    pub default_country_code: String,
    pub challenge_secret: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let store_backend = match env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .as_str()
        {
            "postgres" => StoreBackend::Postgres,
            "memory" => StoreBackend::Memory,
            other => bail!("unknown STORE_BACKEND `{other}` (expected postgres or memory)"),
        };
        let database_url = env::var("DATABASE_URL").ok();
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            bail!("DATABASE_URL is required when STORE_BACKEND=postgres");
        }

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);

        let session = SessionConfig {
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            ttl_hours: env::var("SESSION_TTL_HOURS")
                .ok()
                .and_then(|h| h.parse().ok())
                .unwrap_or(24),
        };

        let admin = AdminAccount {
            email: env::var("ADMIN_EMAIL")
                .context("ADMIN_EMAIL is not set")?
                .trim()
                .to_lowercase(),
            password: env::var("ADMIN_PASSWORD").context("ADMIN_PASSWORD is not set")?,
        };

        let project = ProjectIdentity {
            api_key: env::var("FIREBASE_API_KEY").unwrap_or_default(),
            project_id: env::var("FIREBASE_PROJECT_ID").unwrap_or_default(),
            app_id: env::var("FIREBASE_APP_ID").unwrap_or_default(),
        };

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://{host}:{port}"))
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            store_backend,
            database_url,
            port,
            host,
            session,
            admin,
            project,
            public_base_url,
            otp_ttl_secs: env::var("OTP_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(300),
            default_country_code: env::var("DEFAULT_COUNTRY_CODE")
                .unwrap_or_else(|_| "91".to_string()),
            challenge_secret: env::var("CHALLENGE_SECRET").ok().filter(|s| !s.is_empty()),
        })
    }
}
