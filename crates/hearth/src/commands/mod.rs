//! Command handlers. Each drives one or more feature stores against the
//! session's domain and prints what they converge to.

pub mod config_cmd;
mod entities;
mod favorites;
mod gateway;
mod list;
mod sensor;
mod watch;

use crate::cli::Command;
use crate::error::CliError;
use crate::session::Session;

pub async fn dispatch(cmd: Command, session: &Session) -> Result<(), CliError> {
    match cmd {
        Command::List(args) => list::handle(session, args).await,
        Command::Sensor(args) => sensor::handle(session, args).await,
        Command::Watch(args) => watch::handle(session, args).await,
        Command::Toggle(args) => favorites::toggle(session, args).await,
        Command::Reorder(args) => favorites::reorder(session, args).await,
        Command::Status => gateway::status(session).await,
        Command::Disconnect => gateway::disconnect(session).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
