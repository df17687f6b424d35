use super::{print_json, Console};
use crate::{
    api::{Entity, Resource},
    cli::globals::GlobalArgs,
};
use anyhow::Result;

#[derive(Debug)]
pub struct ListArgs {
    pub globals: GlobalArgs,
    pub resource: Resource,
    pub query: Vec<(String, String)>,
}

/// Create when `id` is `None`, update otherwise.
#[derive(Debug)]
pub struct WriteArgs {
    pub globals: GlobalArgs,
    pub resource: Resource,
    pub id: Option<String>,
    pub data: Entity,
}

#[derive(Debug)]
pub struct DeleteArgs {
    pub globals: GlobalArgs,
    pub resource: Resource,
    pub id: String,
}

#[derive(Debug)]
pub struct RegisterArgs {
    pub globals: GlobalArgs,
    pub data: Entity,
}

/// # Errors
/// Returns the API error, with a sign-in hint after a 401.
pub async fn list(args: ListArgs) -> Result<()> {
    let console = Console::open(&args.globals)?;
    let client = console.session.api().resource(args.resource);

    let result = if args.query.is_empty() {
        client.list().await
    } else {
        client.list_with_query(&args.query).await
    };

    match result {
        Ok(entities) => print_json(&entities),
        Err(err) => Err(console.explain(err.into())),
    }
}

/// # Errors
/// Returns the API error, with a sign-in hint after a 401.
pub async fn write(args: WriteArgs) -> Result<()> {
    let console = Console::open(&args.globals)?;
    let client = console.session.api().resource(args.resource);

    let result = match args.id.as_deref() {
        Some(id) => client.update(id, &args.data).await,
        None => client.create(&args.data).await,
    };

    match result {
        Ok(entity) => print_json(&entity),
        Err(err) => Err(console.explain(err.into())),
    }
}

/// # Errors
/// Returns the API error, with a sign-in hint after a 401.
pub async fn delete(args: DeleteArgs) -> Result<()> {
    let console = Console::open(&args.globals)?;

    match console
        .session
        .api()
        .resource(args.resource)
        .delete(&args.id)
        .await
    {
        Ok(entity) => print_json(&entity),
        Err(err) => Err(console.explain(err.into())),
    }
}

/// # Errors
/// Returns the API error.
pub async fn register_truck(args: RegisterArgs) -> Result<()> {
    let console = Console::open(&args.globals)?;

    match console.session.api().register_new_truck(&args.data).await {
        Ok(registration) => print_json(&registration),
        Err(err) => Err(console.explain(err.into())),
    }
}
