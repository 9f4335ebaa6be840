//! Command dispatch: bridges CLI args -> core Commands -> output formatting.

pub mod categories;
pub mod config_cmd;
pub mod link;
pub mod products;
pub mod reconcile;
pub mod reports;
pub mod reservations;
pub mod settings;
pub mod util;
pub mod watch;

use boutique_core::Controller;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a store-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    controller: &Controller,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Products(args) => products::handle(controller, args, global).await,
        Command::Categories(args) => categories::handle(controller, args, global).await,
        Command::Reservations(args) => reservations::handle(controller, args, global).await,
        Command::Settings(args) => settings::handle(controller, args, global).await,
        Command::Reports => reports::handle(controller, global),
        Command::Reconcile(args) => reconcile::handle(controller, args, global),
        Command::Link {
            product,
            name,
            phone,
        } => link::handle(controller, &product, &name, &phone, global),
        Command::Watch => watch::handle(controller, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
