use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use finsight_core::UnknownCategoryPolicy;
use finsight_gateway::LlmClient;

use crate::state::ensure_finsight_home;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub llm: LlmSection,
    pub chat: ChatSection,
    pub categorize: CategorizeSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSection {
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    /// Name of the environment variable holding the API key. The key itself
    /// never lands in the config file.
    pub api_key_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSection {
    pub max_turns_context: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorizeSection {
    /// What to do with model-returned categories outside the fixed set.
    pub on_unknown_category: UnknownCategoryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmSection {
                model: "gemini-2.5-flash".to_string(),
                base_url: "https://generativelanguage.googleapis.com".to_string(),
                temperature: 0.4,
                api_key_env: "GEMINI_API_KEY".to_string(),
            },
            chat: ChatSection { max_turns_context: 12 },
            categorize: CategorizeSection {
                on_unknown_category: UnknownCategoryPolicy::Coerce,
            },
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_finsight_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).context("parse config.toml")
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

pub fn resolve_api_key(cfg: &Config) -> Result<String> {
    std::env::var(&cfg.llm.api_key_env)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .with_context(|| {
            format!(
                "no API key found; export {} with your generative-language API key",
                cfg.llm.api_key_env
            )
        })
}

pub fn build_client(cfg: &Config) -> Result<LlmClient> {
    let key = resolve_api_key(cfg)?;
    Ok(LlmClient::new(&cfg.llm.base_url, &cfg.llm.model, &key, cfg.llm.temperature))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let cfg = Config::default();
        let s = toml::to_string_pretty(&cfg).unwrap();
        let back: Config = toml::from_str(&s).unwrap();
        assert_eq!(back.llm.model, cfg.llm.model);
        assert_eq!(back.categorize.on_unknown_category, UnknownCategoryPolicy::Coerce);
    }

    #[test]
    fn test_policy_parses_from_lowercase() {
        let s = r#"
[llm]
model = "gemini-2.5-flash"
base_url = "https://generativelanguage.googleapis.com"
temperature = 0.4
api_key_env = "GEMINI_API_KEY"

[chat]
max_turns_context = 12

[categorize]
on_unknown_category = "accept"
"#;
        let cfg: Config = toml::from_str(s).unwrap();
        assert_eq!(cfg.categorize.on_unknown_category, UnknownCategoryPolicy::Accept);
    }
}
