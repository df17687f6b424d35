use super::Console;
use crate::{
    cli::globals::GlobalArgs,
    routes::{resolve, Navigation, Route},
};
use anyhow::Result;
use tracing::debug;

#[derive(Debug)]
pub struct CheckArgs {
    pub globals: GlobalArgs,
    pub path: String,
}

/// Restores the session and reports what the console would do with `path`.
///
/// # Errors
/// Returns an error if the session cannot be opened.
pub async fn check(args: &CheckArgs) -> Result<()> {
    let console = Console::open(&args.globals)?;
    let state = console.session.restore().await;
    let route = Route::from_path(&args.path);

    debug!(%route, status = %state.status(), "Resolving route");

    match resolve(route, &state) {
        Navigation::Wait => println!("wait {route}"),
        Navigation::Render(route) => println!("render {route}"),
        Navigation::Redirect(to) => println!("redirect {to}"),
    }

    if let Some(message) = state.last_error() {
        println!("note: {message}");
    }

    Ok(())
}
