use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_ADJUST_ACTOR: &str = "auto_system";
pub const DEFAULT_MIN_FEEDBACK_COUNT: u32 = 3;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub generation_system_prompt: Option<String>,
    pub auto_adjust_actor: String,
    pub min_feedback_count: u32,
    /// `label:min-max` bands; the built-in table when unset.
    pub difficulty_thresholds: Option<String>,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            openai_api_key: get_env_opt("OPENAI_API_KEY"),
            openai_base_url: get_env_opt("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            openai_model: get_env_opt("OPENAI_MODEL")
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            generation_system_prompt: get_env_opt("GENERATION_SYSTEM_PROMPT"),
            auto_adjust_actor: get_env_opt("AUTO_ADJUST_ACTOR")
                .unwrap_or_else(|| DEFAULT_ADJUST_ACTOR.to_string()),
            min_feedback_count: match get_env_opt("MIN_FEEDBACK_COUNT") {
                Some(_) => get_env_parse("MIN_FEEDBACK_COUNT")?,
                None => DEFAULT_MIN_FEEDBACK_COUNT,
            },
            difficulty_thresholds: get_env_opt("DIFFICULTY_THRESHOLDS"),
        })
    }

    /// Settings for tests and embedding: no model key, defaults everywhere else.
    pub fn local(server_address: &str) -> Self {
        Self {
            server_address: server_address.to_string(),
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            generation_system_prompt: None,
            auto_adjust_actor: DEFAULT_ADJUST_ACTOR.to_string(),
            min_feedback_count: DEFAULT_MIN_FEEDBACK_COUNT,
            difficulty_thresholds: None,
        }
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

// Blank values count as unset.
fn get_env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_parse<T>(name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get_env(name)?;
    raw.trim()
        .parse()
        .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)))
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
