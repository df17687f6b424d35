use crate::{api::Resource, GIT_COMMIT_HASH};
use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ArgAction, ArgGroup, ColorChoice, Command,
};

pub mod api;
pub mod logging;

pub const ENV_PASSWORD: &str = "TRUCKGATE_PASSWORD";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("truckgate")
        .about("Admin console client for the truck gate service")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(login())
        .subcommand(Command::new("logout").about("Sign out and forget the stored session"))
        .subcommand(Command::new("whoami").about("Check the stored session against the server"))
        .subcommand(
            Command::new("list")
                .about("List a collection")
                .arg(resource_arg())
                .arg(
                    Arg::new("query")
                        .short('q')
                        .long("query")
                        .help("Query parameter as key=value, repeatable")
                        .action(ArgAction::Append)
                        .value_parser(parse_query_pair),
                ),
        )
        .subcommand(
            Command::new("create")
                .about("Create an entity")
                .arg(resource_arg())
                .arg(data_arg()),
        )
        .subcommand(
            Command::new("update")
                .about("Update an entity")
                .arg(resource_arg())
                .arg(id_arg())
                .arg(data_arg()),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete an entity")
                .arg(resource_arg())
                .arg(id_arg()),
        )
        .subcommand(
            Command::new("register-truck")
                .about("Register a truck at the gate kiosk")
                .arg(data_arg()),
        )
        .subcommand(
            Command::new("check")
                .about("Show where a console path leads for the current session")
                .arg(
                    Arg::new("path")
                        .help("Console path, example: /admin/users")
                        .required(true),
                ),
        );

    let command = api::with_args(command);
    logging::with_args(command)
}

fn login() -> Command {
    Command::new("login")
        .about("Sign in and store the session")
        .arg(
            Arg::new("username")
                .long("username")
                .help("Account username"),
        )
        .arg(Arg::new("email").long("email").help("Account email"))
        .group(
            ArgGroup::new("identifier")
                .args(["username", "email"])
                .required(true),
        )
        .arg(
            Arg::new("password")
                .short('p')
                .long("password")
                .help("Account password")
                .env(ENV_PASSWORD)
                .hide_env_values(true)
                .required(true),
        )
}

fn resource_arg() -> Arg {
    Arg::new("resource")
        .help("One of: users, contractors, factories, gates, trucks")
        .required(true)
        .value_parser(clap::value_parser!(Resource))
}

fn id_arg() -> Arg {
    Arg::new("id")
        .long("id")
        .help("Entity id")
        .required(true)
}

fn data_arg() -> Arg {
    Arg::new("data")
        .short('d')
        .long("data")
        .help("JSON body")
        .required(true)
        .value_parser(parse_json)
}

fn parse_json(value: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(value).map_err(|e| format!("invalid JSON: {e}"))
}

fn parse_query_pair(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((key, val)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), val.to_string()))
        }
        _ => Err(format!("expected key=value, got {value:?}")),
    }
}
