use clap::{Arg, ArgAction, ArgMatches, Command};
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::utils::gemini::{DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
use crate::utils::youtube_search::DEFAULT_YOUTUBE_BASE_URL;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_MAX_DOCUMENT_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required setting {0} (pass the flag or set the environment variable)")]
    MissingKey(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub youtube_api_key: String,
    pub youtube_base_url: String,
    pub host: IpAddr,
    pub port: u16,
    pub fetch_timeout: Duration,
    pub generation_timeout: Duration,
    pub video_timeout: Duration,
    pub max_document_bytes: u64,
    pub scratch_dir: PathBuf,
    pub expose_error_details: bool,
    pub quiet: bool,
}

pub fn build_cli() -> Command {
    Command::new("study-guide-server")
        .version(env!("CARGO_PKG_VERSION"))
        .about("HTTP service that turns lecture documents into study guides")
        .long_about(
            "POST /analyze-file-url with {\"fileUrl\": \"...\"} pointing at a PDF, DOCX or PPTX.\n\
            The document text is summarized into units with multiple-choice questions\n\
            by Gemini, and a related YouTube video is attached to the first and last unit.",
        )
        .arg(setting("gemini-api-key", "KEY", "Gemini API key [env: GEMINI_API_KEY]"))
        .arg(setting("gemini-model", "MODEL", "Gemini model identifier [env: GEMINI_MODEL]"))
        .arg(setting("gemini-base-url", "URL", "Gemini API base URL [env: GEMINI_BASE_URL]"))
        .arg(setting("youtube-api-key", "KEY", "YouTube Data API key [env: YOUTUBE_API_KEY]"))
        .arg(setting("youtube-base-url", "URL", "YouTube Data API base URL [env: YOUTUBE_BASE_URL]"))
        .arg(setting("host", "ADDR", "Address to bind [env: HOST] (default 0.0.0.0)"))
        .arg(setting("port", "PORT", "Port to listen on [env: PORT] (default 3001)"))
        .arg(setting("fetch-timeout-secs", "SECS", "Document download timeout (default 60)"))
        .arg(setting("generation-timeout-secs", "SECS", "Gemini call timeout (default 120)"))
        .arg(setting("video-timeout-secs", "SECS", "YouTube search timeout (default 30)"))
        .arg(setting("max-document-bytes", "BYTES", "Largest accepted document (default 50 MiB)"))
        .arg(setting("scratch-dir", "DIR", "Directory for temporary PPTX copies [env: SCRATCH_DIR]"))
        .arg(
            Arg::new("redact-error-details")
                .long("redact-error-details")
                .help("Omit underlying error messages from 500 responses")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .help("Suppress the startup banner and log only errors")
                .action(ArgAction::SetTrue),
        )
}

fn setting(name: &'static str, value_name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .value_name(value_name)
        .help(help)
        .action(ArgAction::Set)
}

impl AppConfig {
    pub fn from_matches(matches: &ArgMatches) -> Result<Self, ConfigError> {
        Self::resolve(matches, |key| env::var(key).ok())
    }

    /// Command-line values win over the environment lookup.
    fn resolve(
        matches: &ArgMatches,
        env_lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let value = |arg: &str, env_key: Option<&str>| -> Option<String> {
            matches
                .get_one::<String>(arg)
                .cloned()
                .or_else(|| env_key.and_then(&env_lookup))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let gemini_api_key = value("gemini-api-key", Some("GEMINI_API_KEY"))
            .ok_or(ConfigError::MissingKey("GEMINI_API_KEY"))?;
        let youtube_api_key = value("youtube-api-key", Some("YOUTUBE_API_KEY"))
            .ok_or(ConfigError::MissingKey("YOUTUBE_API_KEY"))?;

        let host = match value("host", Some("HOST")) {
            Some(raw) => raw.parse::<IpAddr>().map_err(|e| ConfigError::Invalid {
                name: "host",
                reason: e.to_string(),
            })?,
            None => IpAddr::from([0, 0, 0, 0]),
        };
        let port = parse_number("port", value("port", Some("PORT")), DEFAULT_PORT)?;

        let fetch_timeout = seconds("fetch-timeout-secs", value("fetch-timeout-secs", None), 60)?;
        let generation_timeout = seconds(
            "generation-timeout-secs",
            value("generation-timeout-secs", None),
            120,
        )?;
        let video_timeout = seconds("video-timeout-secs", value("video-timeout-secs", None), 30)?;

        let max_document_bytes = parse_number(
            "max-document-bytes",
            value("max-document-bytes", None),
            DEFAULT_MAX_DOCUMENT_BYTES,
        )?;
        if max_document_bytes == 0 {
            return Err(ConfigError::Invalid {
                name: "max-document-bytes",
                reason: "must be greater than zero".into(),
            });
        }

        let scratch_dir = value("scratch-dir", Some("SCRATCH_DIR"))
            .map(PathBuf::from)
            .unwrap_or_else(env::temp_dir);

        Ok(Self {
            gemini_api_key,
            gemini_model: value("gemini-model", Some("GEMINI_MODEL"))
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_base_url: value("gemini-base-url", Some("GEMINI_BASE_URL"))
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            youtube_api_key,
            youtube_base_url: value("youtube-base-url", Some("YOUTUBE_BASE_URL"))
                .unwrap_or_else(|| DEFAULT_YOUTUBE_BASE_URL.to_string()),
            host,
            port,
            fetch_timeout,
            generation_timeout,
            video_timeout,
            max_document_bytes,
            scratch_dir,
            expose_error_details: !matches.get_flag("redact-error-details"),
            quiet: matches.get_flag("quiet"),
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_number<T>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw.parse::<T>().map_err(|e| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn seconds(name: &'static str, raw: Option<String>, default: u64) -> Result<Duration, ConfigError> {
    let secs = parse_number(name, raw, default)?;
    if secs == 0 {
        return Err(ConfigError::Invalid {
            name,
            reason: "timeout must be at least one second".into(),
        });
    }
    Ok(Duration::from_secs(secs))
}
