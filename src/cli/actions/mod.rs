pub mod resources;
pub mod routes;
pub mod session;

// Internal "interpreter" for `Action`.
mod run;

use crate::{
    cli::globals::GlobalArgs,
    routes::{NavigationState, Navigator, Route},
    session::{AuthSession, FileSessionStore},
};
use anyhow::{Context, Result};
use std::sync::Arc;

#[derive(Debug)]
pub enum Action {
    Login(session::LoginArgs),
    Logout(GlobalArgs),
    Whoami(GlobalArgs),
    List(resources::ListArgs),
    Create(resources::WriteArgs),
    Update(resources::WriteArgs),
    Delete(resources::DeleteArgs),
    RegisterTruck(resources::RegisterArgs),
    Check(routes::CheckArgs),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}

/// A session over the configured file store, plus the screen it would show.
pub(crate) struct Console {
    pub session: AuthSession,
    pub navigation: Arc<NavigationState>,
}

impl Console {
    pub(crate) fn open(globals: &GlobalArgs) -> Result<Self> {
        let store = Arc::new(FileSessionStore::new(&globals.config.session_file));
        let navigation = Arc::new(NavigationState::new(Route::Home));
        let session = AuthSession::new(
            &globals.config,
            store,
            Arc::clone(&navigation) as Arc<dyn Navigator>,
        )
        .context("failed to build API client")?;

        Ok(Self {
            session,
            navigation,
        })
    }

    /// Adds a hint when a 401 has just torn the session down.
    pub(crate) fn explain(&self, err: anyhow::Error) -> anyhow::Error {
        if self.navigation.current() == Route::Login {
            err.context("session expired, sign in again with `truckgate login`")
        } else {
            err
        }
    }
}

pub(crate) fn print_json(value: &impl serde::Serialize) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
