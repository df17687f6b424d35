use crate::{
    cli::commands::api::{ARG_API_URL, ARG_SESSION_FILE, ARG_TIMEOUT},
    config::AppConfig,
};
use anyhow::{Context, Result};
use std::{path::PathBuf, time::Duration};

/// Settings shared by every subcommand.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub config: AppConfig,
}

impl GlobalArgs {
    #[must_use]
    pub const fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// # Errors
    /// Returns an error if the API URL is missing or invalid.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let api_url = matches
            .get_one::<String>(ARG_API_URL)
            .context("missing required argument: --api-url")?;

        let mut config = AppConfig::new(api_url).context("invalid TRUCKGATE_API_URL")?;

        if let Some(timeout) = matches.get_one::<Duration>(ARG_TIMEOUT) {
            config = config.with_request_timeout(*timeout);
        }
        if let Some(path) = matches.get_one::<PathBuf>(ARG_SESSION_FILE) {
            config = config.with_session_file(path);
        }

        Ok(Self::new(config))
    }
}
