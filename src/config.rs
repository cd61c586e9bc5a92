use std::path::Path;

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use url::Url;

use crate::error::Result;
use crate::renderer::DEFAULT_TYPING_LABEL;

/// Config file picked up from the working directory when none is given.
const DEFAULT_CONFIG_FILE: &str = "chat.yaml";

#[derive(Parser, Debug)]
#[command(author, version, about = "Terminal client for a streaming chat endpoint", long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Chat endpoint receiving `{"message": ...}` POST requests
    #[arg(short, long, env = "CHAT_API_URL")]
    pub endpoint: Option<String>,

    /// Label shown while waiting for the first response chunk
    #[arg(long)]
    pub typing_label: Option<String>,

    /// Emit logs as JSON (bare flag means true)
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub log_json: Option<bool>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub endpoint: EndpointConfig,
    pub ui: UiConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EndpointConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UiConfig {
    pub typing_label: String,
    pub user_label: String,
    pub bot_label: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub json: bool,
    pub filter: String,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder()
            .set_default("endpoint.url", "http://127.0.0.1:5000/chat")?
            .set_default("ui.typing_label", DEFAULT_TYPING_LABEL)?
            .set_default("ui.user_label", "You")?
            .set_default("ui.bot_label", "Bot")?
            .set_default("logging.json", false)?
            .set_default("logging.filter", "info")?;

        // Explicit file must exist; the cwd fallback is optional.
        match &cli.config {
            Some(path) => builder = builder.add_source(File::with_name(path)),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                builder = builder.add_source(File::with_name(DEFAULT_CONFIG_FILE));
            }
            None => {}
        }

        // CHAT_ENDPOINT__URL=http://... , CHAT_UI__TYPING_LABEL=...
        builder = builder.add_source(
            Environment::with_prefix("CHAT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // Priority: CLI flag > CLI env var > prefixed env > config file > defaults.
        if let Some(endpoint) = cli.endpoint {
            builder = builder.set_override("endpoint.url", endpoint)?;
        }
        if let Some(label) = cli.typing_label {
            builder = builder.set_override("ui.typing_label", label)?;
        }
        if let Some(json) = cli.log_json {
            builder = builder.set_override("logging.json", json)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.endpoint_url()?;
        Ok(cfg)
    }

    /// Parsed chat endpoint.
    pub fn endpoint_url(&self) -> Result<Url> {
        Ok(Url::parse(&self.endpoint.url)?)
    }
}
