use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let shopping_api_key = require("SERPAPI_KEY")?;
    let social_api_key = require("TIKAPI_KEY")?;
    let orders_api_token = require("APIFY_API_TOKEN")?;
    let vision_api_key = require("OPENAI_API_KEY")?;

    let env = parse_environment(&or_default("FLIPSCOUT_ENV", "development"));

    let bind_addr = parse_addr("FLIPSCOUT_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("FLIPSCOUT_LOG_LEVEL", "info");
    let upload_dir = PathBuf::from(or_default("FLIPSCOUT_UPLOAD_DIR", "./uploads"));

    let request_timeout_secs = parse_u64("FLIPSCOUT_REQUEST_TIMEOUT_SECS", "30")?;
    let max_retries = parse_u32("FLIPSCOUT_MAX_RETRIES", "3")?;
    let retry_backoff_base_ms = parse_u64("FLIPSCOUT_RETRY_BACKOFF_BASE_MS", "1000")?;

    let social_page_size = parse_u32("FLIPSCOUT_SOCIAL_PAGE_SIZE", "30")?;
    let social_max_pages = parse_usize("FLIPSCOUT_SOCIAL_MAX_PAGES", "50")?;
    let social_max_posts = parse_usize("FLIPSCOUT_SOCIAL_MAX_POSTS", "2000")?;
    let social_inter_page_delay_ms = parse_u64("FLIPSCOUT_SOCIAL_INTER_PAGE_DELAY_MS", "1000")?;

    let shopping_quote_limit = parse_usize("FLIPSCOUT_SHOPPING_QUOTE_LIMIT", "5")?;
    let orders_listing_limit = parse_u32("FLIPSCOUT_ORDERS_LISTING_LIMIT", "10")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        upload_dir,
        shopping_api_key,
        social_api_key,
        orders_api_token,
        vision_api_key,
        request_timeout_secs,
        max_retries,
        retry_backoff_base_ms,
        social_page_size,
        social_max_pages,
        social_max_posts,
        social_inter_page_delay_ms,
        shopping_quote_limit,
        orders_listing_limit,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
