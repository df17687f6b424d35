//! Maps validated CLI matches to an [`Action`].

use crate::api::{Entity, Resource};
use crate::cli::{
    actions::{resources, routes, session, Action},
    globals::GlobalArgs,
};
use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let globals = GlobalArgs::parse(matches)?;

    let (name, sub) = matches
        .subcommand()
        .ok_or_else(|| anyhow!("missing subcommand"))?;

    let action = match name {
        "login" => Action::Login(session::LoginArgs {
            globals,
            username: sub.get_one::<String>("username").cloned(),
            email: sub.get_one::<String>("email").cloned(),
            password: SecretString::from(
                sub.get_one::<String>("password")
                    .cloned()
                    .context("missing required argument: --password")?,
            ),
        }),
        "logout" => Action::Logout(globals),
        "whoami" => Action::Whoami(globals),
        "list" => Action::List(resources::ListArgs {
            globals,
            resource: resource(sub)?,
            query: sub
                .get_many::<(String, String)>("query")
                .map(|pairs| pairs.cloned().collect())
                .unwrap_or_default(),
        }),
        "create" => Action::Create(resources::WriteArgs {
            globals,
            resource: resource(sub)?,
            id: None,
            data: data(sub)?,
        }),
        "update" => Action::Update(resources::WriteArgs {
            globals,
            resource: resource(sub)?,
            id: Some(id(sub)?),
            data: data(sub)?,
        }),
        "delete" => Action::Delete(resources::DeleteArgs {
            globals,
            resource: resource(sub)?,
            id: id(sub)?,
        }),
        "register-truck" => Action::RegisterTruck(resources::RegisterArgs {
            globals,
            data: data(sub)?,
        }),
        "check" => Action::Check(routes::CheckArgs {
            globals,
            path: sub
                .get_one::<String>("path")
                .cloned()
                .context("missing required argument: <path>")?,
        }),
        other => return Err(anyhow!("unknown subcommand: {other}")),
    };

    Ok(action)
}

fn resource(matches: &clap::ArgMatches) -> Result<Resource> {
    matches
        .get_one::<Resource>("resource")
        .copied()
        .context("missing required argument: <resource>")
}

fn id(matches: &clap::ArgMatches) -> Result<String> {
    matches
        .get_one::<String>("id")
        .cloned()
        .context("missing required argument: --id")
}

fn data(matches: &clap::ArgMatches) -> Result<Entity> {
    matches
        .get_one::<Entity>("data")
        .cloned()
        .context("missing required argument: --data")
}
