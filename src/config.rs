use anyhow::{anyhow, Context};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use url::Url;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Where feeds come from: the JSON relay and the host the feed path is scoped to.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub base_url: String,
    pub feed_host: String,
    pub user_agent: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.allorigins.win/get".to_string(),
            feed_host: "medium.com".to_string(),
            user_agent: "PortfolioBlog/0.1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BlogConfig {
    pub handle: String,
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            handle: "mistarfid".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: String,
    pub level: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: "logs/portfolio-blog.log".to_string(),
            level: Some("info".to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub relay: RelayConfig,
    pub blog: BlogConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let explicit_path = std::env::var("CONFIG_FILE").ok();
        let config = if let Some(path) = explicit_path {
            let path = PathBuf::from(path);
            if !path.exists() {
                return Err(anyhow!("config file {:?} not found", path));
            }
            Self::load_from_file(&path)?
        } else {
            match locate_default_config() {
                Some(path) => Self::load_from_file(&path)?,
                None => AppConfig::default(),
            }
        };

        let config = Self::apply_env_overrides(config);
        config.validate()?;
        Ok(config)
    }

    fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {:?}", path))?;
        Self::from_yaml(&contents).with_context(|| format!("failed to parse config file {:?}", path))
    }

    pub fn from_yaml(contents: &str) -> anyhow::Result<Self> {
        let config: AppConfig = serde_yaml::from_str(contents)?;
        Ok(config)
    }

    fn apply_env_overrides(mut config: AppConfig) -> AppConfig {
        if let Ok(bind) = std::env::var("SERVER_BIND") {
            config.server.bind = bind;
        }

        if let Ok(base_url) = std::env::var("RELAY_BASE_URL") {
            config.relay.base_url = base_url;
        }

        if let Ok(host) = std::env::var("FEED_HOST") {
            config.relay.feed_host = host;
        }

        if let Ok(user_agent) = std::env::var("RELAY_USER_AGENT") {
            config.relay.user_agent = user_agent;
        }

        if let Ok(handle) = std::env::var("BLOG_HANDLE") {
            config.blog.handle = handle;
        }

        if let Ok(log_file) = std::env::var("LOG_FILE_PATH") {
            config.logging.file = log_file;
        }

        if let Ok(log_level) = std::env::var("LOG_LEVEL") {
            config.logging.level = Some(log_level);
        }

        config
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        Url::parse(&self.relay.base_url)
            .with_context(|| format!("invalid relay base url {:?}", self.relay.base_url))?;

        if self.relay.feed_host.trim().is_empty() {
            return Err(anyhow!(
                "feed host missing; set FEED_HOST env var or relay.feed_host in config file"
            ));
        }

        if self.blog.handle.trim().is_empty() {
            return Err(anyhow!(
                "blog handle missing; set BLOG_HANDLE env var or blog.handle in config file"
            ));
        }

        Ok(())
    }
}

fn locate_default_config() -> Option<PathBuf> {
    let candidates = [
        PathBuf::from("config/config.yaml"),
        PathBuf::from("../config/config.yaml"),
    ];

    candidates.into_iter().find(|path| path.exists())
}
