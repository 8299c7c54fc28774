// src/config/mod.rs
// All tunables come from the environment (or a .env file), each with a
// default that works out of the box except the oracle API key.

use once_cell::sync::Lazy;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct BasaltConfig {
    // ── Server
    pub host: String,
    pub port: u16,
    pub cors_origin: String,

    // ── Persistence
    pub data_file: PathBuf,

    // ── Analysis oracle
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub oracle_timeout: u64,

    // ── Transfer
    pub export_pacing_ms: u64,

    // ── Capture workflow
    pub workflow_ttl_secs: u64,
}

fn env_var_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(val) => {
            let clean = val.split('#').next().unwrap_or("").trim();
            match clean.parse::<T>() {
                Ok(parsed) => parsed,
                Err(_) => {
                    eprintln!("Config: {key} = '{val}' (parse failed, using default)");
                    default
                }
            }
        }
        Err(_) => default,
    }
}

impl BasaltConfig {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        Self {
            host: env_var_or("BASALT_HOST", "127.0.0.1".to_string()),
            port: env_var_or("BASALT_PORT", 3100),
            cors_origin: env_var_or("BASALT_CORS_ORIGIN", "http://localhost:3000".to_string()),
            data_file: std::env::var("BASALT_DATA_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_data_file()),
            gemini_api_key: std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()),
            gemini_model: env_var_or("BASALT_GEMINI_MODEL", "gemini-2.0-flash".to_string()),
            gemini_base_url: env_var_or(
                "BASALT_GEMINI_BASE_URL",
                "https://generativelanguage.googleapis.com".to_string(),
            ),
            oracle_timeout: env_var_or("BASALT_ORACLE_TIMEOUT", 60),
            export_pacing_ms: env_var_or("BASALT_EXPORT_PACING_MS", 300),
            workflow_ttl_secs: env_var_or("BASALT_WORKFLOW_TTL_SECS", 900),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn oracle_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout)
    }

    pub fn export_pacing(&self) -> Duration {
        Duration::from_millis(self.export_pacing_ms)
    }

    pub fn workflow_ttl(&self) -> Duration {
        Duration::from_secs(self.workflow_ttl_secs)
    }
}

fn default_data_file() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("basalt")
        .join("vault.json")
}

// Global config instance, loaded once at startup.
pub static CONFIG: Lazy<BasaltConfig> = Lazy::new(BasaltConfig::from_env);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_everything_but_the_api_key() {
        let config = BasaltConfig::from_env();
        assert!(!config.bind_address().is_empty());
        assert!(config.data_file.ends_with("vault.json") || config.data_file.is_absolute());
        assert_eq!(config.export_pacing(), Duration::from_millis(config.export_pacing_ms));
    }

    #[test]
    fn parse_failures_fall_back_to_defaults() {
        // SAFETY: test-only env mutation, no concurrent reader of this key.
        unsafe { std::env::set_var("BASALT_TEST_BAD_PORT", "not-a-number") };
        assert_eq!(env_var_or::<u16>("BASALT_TEST_BAD_PORT", 42), 42);
        unsafe { std::env::remove_var("BASALT_TEST_BAD_PORT") };
    }
}
