use super::{resources, routes, session, Action};
use anyhow::Result;

pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Login(args) => session::login(args).await,
        Action::Logout(globals) => session::logout(&globals),
        Action::Whoami(globals) => session::whoami(&globals).await,
        Action::List(args) => resources::list(args).await,
        Action::Create(args) | Action::Update(args) => resources::write(args).await,
        Action::Delete(args) => resources::delete(args).await,
        Action::RegisterTruck(args) => resources::register_truck(args).await,
        Action::Check(args) => routes::check(&args).await,
    }
}
