use std::{collections::BTreeMap, env, fs, time::Duration};

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;

pub const CONFIG_PATH_ENV: &str = "CRYPTO_REPORT_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "crypto-report.toml";
pub const DEFAULT_WEBHOOK_ENV: &str = "CRYPTO_REPORT_WEBHOOK_URL";
pub const DEFAULT_TIMEZONE_LABEL: &str = "北京时间";
pub const MAX_PRECISION: u32 = 10;

const DEFAULT_PRECISION: [(&str, u32); 4] = [("BTC", 3), ("ETH", 3), ("SOL", 10), ("BONK", 10)];

#[derive(Debug, Clone)]
pub struct Config {
    pub webhook_url: String,
    pub timeout: Duration,
    pub timezone_label: String,
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SourceConfig {
    PriceQuote {
        title: String,
        url: String,
        api_key_env: Option<String>,
        #[serde(default = "default_api_key_header")]
        api_key_header: String,
        symbols: Vec<String>,
        /// Requested symbols paired with their precision, filled at load time.
        #[serde(skip)]
        quoted: Vec<(String, u32)>,
        #[serde(skip)]
        api_key: Option<String>,
    },
    ExchangeRate {
        title: String,
        url: String,
        api_key_env: Option<String>,
        from: String,
        to: String,
        #[serde(skip)]
        api_key: Option<String>,
    },
    SentimentIndex {
        title: String,
        url: String,
    },
    VenuePrices {
        title: String,
        url: String,
        #[serde(default = "default_venue_precision")]
        precision: u32,
    },
}

impl SourceConfig {
    pub fn title(&self) -> &str {
        match self {
            SourceConfig::PriceQuote { title, .. }
            | SourceConfig::ExchangeRate { title, .. }
            | SourceConfig::SentimentIndex { title, .. }
            | SourceConfig::VenuePrices { title, .. } => title,
        }
    }

    /// Credential resolved from `api_key_env` at load time.
    pub fn api_key(&self) -> Option<&str> {
        match self {
            SourceConfig::PriceQuote { api_key, .. } | SourceConfig::ExchangeRate { api_key, .. } => {
                api_key.as_deref()
            }
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    webhook_url: Option<String>,
    webhook_url_env: Option<String>,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
    #[serde(default = "default_timezone_label")]
    timezone_label: String,
    #[serde(default)]
    precision: BTreeMap<String, u32>,
    #[serde(default)]
    sources: Vec<SourceConfig>,
}

fn default_api_key_header() -> String {
    crate::datasources::DEFAULT_API_KEY_HEADER.to_owned()
}

fn default_venue_precision() -> u32 {
    2
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_timezone_label() -> String {
    DEFAULT_TIMEZONE_LABEL.to_owned()
}

impl Config {
    /// Reads `$CRYPTO_REPORT_CONFIG` (or `crypto-report.toml`) and resolves
    /// credentials from the process environment.
    pub fn load() -> Result<Config> {
        let path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_owned());
        let content = fs::read_to_string(&path).with_context(|| format!("reading config from {}", path))?;
        Config::from_toml(&content, |name| env::var(name).ok())
            .with_context(|| format!("invalid config {}", path))
    }

    pub fn from_toml(content: &str, lookup_env: impl Fn(&str) -> Option<String>) -> Result<Config> {
        let file: FileConfig = toml::from_str(content)?;

        let webhook_env = file.webhook_url_env.as_deref().unwrap_or(DEFAULT_WEBHOOK_ENV);
        let webhook_url = lookup_env(webhook_env)
            .or(file.webhook_url)
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| anyhow!("no webhook URL: set webhook_url or ${}", webhook_env))?;

        if file.timeout_secs == 0 {
            bail!("timeout_secs must be positive");
        }

        let mut precision: BTreeMap<String, u32> = DEFAULT_PRECISION
            .iter()
            .map(|(symbol, dp)| (symbol.to_string(), *dp))
            .collect();
        for (symbol, dp) in file.precision {
            if dp > MAX_PRECISION {
                bail!("precision for {} is {}, at most {} is supported", symbol, dp, MAX_PRECISION);
            }
            precision.insert(symbol.to_ascii_uppercase(), dp);
        }

        if file.sources.is_empty() {
            bail!("no data sources configured");
        }
        let sources = file
            .sources
            .into_iter()
            .map(|source| resolve_source(source, &precision, &lookup_env))
            .collect::<Result<Vec<_>>>()?;

        Ok(Config {
            webhook_url,
            timeout: Duration::from_secs(file.timeout_secs),
            timezone_label: file.timezone_label,
            sources,
        })
    }
}

fn resolve_source(
    mut source: SourceConfig,
    precision: &BTreeMap<String, u32>,
    lookup_env: &impl Fn(&str) -> Option<String>,
) -> Result<SourceConfig> {
    let title = source.title().to_owned();
    match &mut source {
        SourceConfig::PriceQuote {
            symbols,
            quoted,
            api_key_env,
            api_key,
            ..
        } => {
            if symbols.is_empty() {
                bail!("source {}: no symbols requested", title);
            }
            for symbol in symbols.iter_mut() {
                *symbol = symbol.to_ascii_uppercase();
                let dp = precision
                    .get(symbol.as_str())
                    .ok_or_else(|| anyhow!("source {}: symbol {} has no precision entry", title, symbol))?;
                quoted.push((symbol.clone(), *dp));
            }
            *api_key = resolve_key(&title, api_key_env.as_deref(), lookup_env)?;
        }
        SourceConfig::ExchangeRate {
            api_key_env, api_key, ..
        } => {
            *api_key = resolve_key(&title, api_key_env.as_deref(), lookup_env)?;
        }
        SourceConfig::VenuePrices { precision: dp, .. } => {
            if *dp > MAX_PRECISION {
                bail!("source {}: precision {} exceeds {}", title, dp, MAX_PRECISION);
            }
        }
        SourceConfig::SentimentIndex { .. } => {}
    }
    Ok(source)
}

fn resolve_key(
    title: &str,
    var: Option<&str>,
    lookup_env: &impl Fn(&str) -> Option<String>,
) -> Result<Option<String>> {
    match var {
        None => Ok(None),
        Some(var) => lookup_env(var)
            .map(Some)
            .ok_or_else(|| anyhow!("source {}: ${} is not set", title, var)),
    }
}
