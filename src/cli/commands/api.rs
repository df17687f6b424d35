use crate::config::{parse_timeout, ENV_API_URL, ENV_SESSION_FILE, ENV_TIMEOUT};
use clap::{builder::ValueParser, Arg, Command};
use std::path::PathBuf;

pub const ARG_API_URL: &str = "api-url";
pub const ARG_SESSION_FILE: &str = "session-file";
pub const ARG_TIMEOUT: &str = "timeout";

#[must_use]
pub fn validator_timeout() -> ValueParser {
    ValueParser::from(
        move |value: &str| -> std::result::Result<std::time::Duration, String> {
            parse_timeout(value).map_err(|e| e.to_string())
        },
    )
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_API_URL)
                .short('u')
                .long(ARG_API_URL)
                .help("Base URL of the gate API, example: https://gate.example/api")
                .env(ENV_API_URL)
                .global(true),
        )
        .arg(
            Arg::new(ARG_SESSION_FILE)
                .long(ARG_SESSION_FILE)
                .help("Session record location (default: ~/.truckgate/session.json)")
                .env(ENV_SESSION_FILE)
                .global(true)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new(ARG_TIMEOUT)
                .long(ARG_TIMEOUT)
                .help("Request timeout in seconds")
                .env(ENV_TIMEOUT)
                .global(true)
                .default_value("10")
                .value_parser(validator_timeout()),
        )
}
