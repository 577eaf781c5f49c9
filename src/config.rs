//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honored for local development.

use std::env;
use std::time::Duration;

const DEFAULT_IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const DEFAULT_MEMBERSHIP_TIMEOUT_SECS: u64 = 15;
const DEFAULT_INVITE_CODE_ATTEMPTS: u32 = 5;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Firebase web API key (identifies the project to Identity Toolkit)
    pub firebase_api_key: String,
    /// Identity Toolkit base URL (points at the auth emulator in dev)
    pub identity_toolkit_url: String,
    /// GCP project ID hosting Firestore
    pub gcp_project_id: String,
    /// Origin of the presentation shell, allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Upper bound on waiting for the first membership emission after sign-in
    pub membership_timeout: Duration,
    /// How many invite codes to try before giving up on a collision-free one
    pub invite_code_attempts: u32,
}

impl Config {
    /// Offline values for tests.
    pub fn test_default() -> Self {
        Self {
            firebase_api_key: "test_api_key".to_string(),
            identity_toolkit_url: "http://127.0.0.1:9099/identitytoolkit.googleapis.com/v1"
                .to_string(),
            gcp_project_id: "test-project".to_string(),
            frontend_url: "http://localhost:8081".to_string(),
            port: 8080,
            membership_timeout: Duration::from_secs(DEFAULT_MEMBERSHIP_TIMEOUT_SECS),
            invite_code_attempts: DEFAULT_INVITE_CODE_ATTEMPTS,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let membership_timeout_secs = match env::var("MEMBERSHIP_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::Invalid("MEMBERSHIP_TIMEOUT_SECS"))?,
            Err(_) => DEFAULT_MEMBERSHIP_TIMEOUT_SECS,
        };

        let invite_code_attempts = match env::var("INVITE_CODE_ATTEMPTS") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::Invalid("INVITE_CODE_ATTEMPTS"))?,
            Err(_) => DEFAULT_INVITE_CODE_ATTEMPTS,
        };

        Ok(Self {
            firebase_api_key: env::var("FIREBASE_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("FIREBASE_API_KEY"))?,
            identity_toolkit_url: env::var("IDENTITY_TOOLKIT_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_IDENTITY_TOOLKIT_URL.to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:8081".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            membership_timeout: Duration::from_secs(membership_timeout_secs),
            invite_code_attempts,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
