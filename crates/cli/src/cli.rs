use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use emrpilot::login::{DEFAULT_BASE_URL, DEFAULT_PASSWORD, DEFAULT_USERNAME};

/// Root CLI.
#[derive(Parser, Debug)]
#[command(name = "emrpilot")]
#[command(about = "Stealth-browser automation for the OpenEMR demo")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Launch the engine and keep a persistent context/page alive.
	Serve(ServeArgs),
	/// Attach to a running engine and run the browser-control demo.
	Connect(ConnectArgs),
	/// Address-book operations.
	Contact {
		#[command(subcommand)]
		action: ContactAction,
	},
	/// Visit/encounter operations.
	Visit {
		#[command(subcommand)]
		action: VisitAction,
	},
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
	/// Run the browser without a visible window.
	#[arg(long)]
	pub headless: bool,

	/// Directory for the persisted endpoint/session files.
	#[arg(long, value_name = "DIR")]
	pub state_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ConnectArgs {
	/// WebSocket endpoint of a running engine (e.g. ws://127.0.0.1:35981/ab12cd).
	#[arg(value_name = "WS_ENDPOINT")]
	pub ws_endpoint: String,

	/// URL to drive during the demo.
	#[arg(long, default_value = "https://example.com")]
	pub url: String,
}

/// How a task command reaches a browser: an explicit endpoint, the persisted
/// server session, or a self-launched engine.
#[derive(Args, Debug, Clone, Default)]
pub struct SessionArgs {
	/// Attach to this endpoint instead of launching a browser.
	#[arg(long, value_name = "WS_ENDPOINT")]
	pub endpoint: Option<String>,

	/// Run a self-launched browser without a visible window.
	#[arg(long)]
	pub headless: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CredentialArgs {
	/// EMR login username.
	#[arg(long, default_value = DEFAULT_USERNAME)]
	pub username: String,

	/// EMR login password.
	#[arg(long, default_value = DEFAULT_PASSWORD)]
	pub password: String,

	/// Base URL of the EMR instance.
	#[arg(long, default_value = DEFAULT_BASE_URL)]
	pub base_url: String,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ContactAction {
	/// Add one address-book entry.
	Add(AddContactArgs),
	/// Bulk-import profiles from a JSON data file.
	Import(ImportArgs),
}

#[derive(Args, Debug, Clone)]
pub struct AddContactArgs {
	#[command(flatten)]
	pub session: SessionArgs,

	#[command(flatten)]
	pub credentials: CredentialArgs,

	/// Profile data file; the first record is used.
	#[arg(long, value_name = "FILE")]
	pub data: Option<PathBuf>,

	#[arg(long)]
	pub first_name: Option<String>,

	#[arg(long)]
	pub last_name: Option<String>,

	#[arg(long)]
	pub phone: Option<String>,

	#[arg(long)]
	pub email: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
	#[command(flatten)]
	pub session: SessionArgs,

	#[command(flatten)]
	pub credentials: CredentialArgs,

	/// JSON array of profile records.
	#[arg(long, value_name = "FILE")]
	pub data: PathBuf,

	/// Write the import summary to this JSON file.
	#[arg(long, value_name = "FILE")]
	pub output: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum VisitAction {
	/// Create a new encounter for a patient.
	Create(CreateVisitArgs),
	/// View the currently open encounter.
	Current(CurrentVisitArgs),
	/// Retrieve a patient's visit history.
	History(VisitHistoryArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CreateVisitArgs {
	#[command(flatten)]
	pub session: SessionArgs,

	#[command(flatten)]
	pub credentials: CredentialArgs,

	/// Patient name to search for.
	#[arg(long)]
	pub patient: String,

	/// Visit category (form default when empty).
	#[arg(long, default_value = "")]
	pub category: String,

	/// Reason for the visit.
	#[arg(long, default_value = "")]
	pub reason: String,

	/// Screenshot directory.
	#[arg(long, value_name = "DIR", default_value = "visits_screenshots")]
	pub screenshot_dir: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct CurrentVisitArgs {
	#[command(flatten)]
	pub session: SessionArgs,

	#[command(flatten)]
	pub credentials: CredentialArgs,

	/// Patient name to search for.
	#[arg(long)]
	pub patient: String,

	/// Specific encounter date to select (e.g. 2014-02-01).
	#[arg(long)]
	pub encounter: Option<String>,

	/// Screenshot directory.
	#[arg(long, value_name = "DIR", default_value = "visits_screenshots")]
	pub screenshot_dir: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct VisitHistoryArgs {
	#[command(flatten)]
	pub session: SessionArgs,

	#[command(flatten)]
	pub credentials: CredentialArgs,

	/// Patient name to search for.
	#[arg(long)]
	pub patient: String,

	/// Screenshot directory.
	#[arg(long, value_name = "DIR", default_value = "visits_screenshots")]
	pub screenshot_dir: PathBuf,

	/// Write the visit data to this JSON file.
	#[arg(long, value_name = "FILE")]
	pub output: Option<PathBuf>,
}
