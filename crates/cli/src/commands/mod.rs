pub mod connect;
pub mod contact;
pub mod serve;
pub mod visit;

use crate::cli::{Cli, Commands};

pub async fn dispatch(cli: Cli) -> anyhow::Result<()> {
	match cli.command {
		Commands::Serve(args) => serve::run(args).await,
		Commands::Connect(args) => connect::run(args).await,
		Commands::Contact { action } => contact::run(action).await,
		Commands::Visit { action } => visit::run(action).await,
	}
}
