//! Address-book task commands: add one contact, bulk-import a data file.

use std::path::Path;

use anyhow::Context;
use emrpilot::driver::PageDriver;
use emrpilot::login::{LoginConfig, login};
use emrpilot::menu::navigate_menu;
use emrpilot::ops::{AddressBook, ImportOutcome};
use emrpilot::profile::{Profile, map_profile_to_address};
use emrpilot_protocol::OperationResult;

use crate::cli::{AddContactArgs, ContactAction, CredentialArgs, ImportArgs};
use crate::output;
use crate::session::TaskSession;

const ADDRESS_BOOK_MENU: [&str; 2] = ["Admin", "Address Book"];

pub async fn run(action: ContactAction) -> anyhow::Result<()> {
	match action {
		ContactAction::Add(args) => add(args).await,
		ContactAction::Import(args) => import(args).await,
	}
}

async fn add(args: AddContactArgs) -> anyhow::Result<()> {
	output::banner("ADD CONTACT - OpenEMR Address Book");

	let profile = single_profile(&args)?;
	println!("Entry: {}", profile.display_name());

	let session = TaskSession::open(&args.session).await?;
	let result = run_add(&session.page, &args.credentials, &profile).await;
	session.close().await;

	output::summary(&result);
	if !result.success {
		std::process::exit(1);
	}
	Ok(())
}

async fn run_add(
	page: &dyn PageDriver,
	credentials: &CredentialArgs,
	profile: &Profile,
) -> OperationResult {
	if !login_step(page, credentials).await {
		return OperationResult::failed("Login failed");
	}

	output::step(2, "Navigating to Address Book...");
	if !navigate_menu(page, &ADDRESS_BOOK_MENU).await {
		return OperationResult::failed("Navigation failed");
	}
	output::substep("Navigation successful");

	output::step(3, "Adding address entry...");
	let fields = map_profile_to_address(profile);
	AddressBook::new(page).add_entry(&fields).await
}

async fn import(args: ImportArgs) -> anyhow::Result<()> {
	output::banner("IMPORT CONTACTS - OpenEMR Address Book");

	let profiles = load_profiles(&args.data)?;
	println!("Loaded {} profiles from {}", profiles.len(), args.data.display());

	let session = TaskSession::open(&args.session).await?;
	let outcome = run_import(&session.page, &args.credentials, &profiles).await;
	session.close().await;

	match outcome {
		Ok(outcome) => {
			output::banner("IMPORT SUMMARY");
			println!("  Total: {}", outcome.total);
			println!("  Success: {}", outcome.success);
			println!("  Failed: {}", outcome.failed);
			output::rule();

			if let Some(path) = &args.output {
				output::write_json(path, &outcome)?;
			}
			Ok(())
		}
		Err(result) => {
			output::summary(&result);
			std::process::exit(1);
		}
	}
}

/// Runs the bulk import; a failure before the first record (login or
/// navigation) aborts the whole task instead of producing N failures.
async fn run_import(
	page: &dyn PageDriver,
	credentials: &CredentialArgs,
	profiles: &[Profile],
) -> Result<ImportOutcome, OperationResult> {
	if !login_step(page, credentials).await {
		return Err(OperationResult::failed("Login failed"));
	}

	output::step(2, "Navigating to Address Book...");
	if !navigate_menu(page, &ADDRESS_BOOK_MENU).await {
		return Err(OperationResult::failed("Navigation failed"));
	}
	output::substep("Navigation successful");

	output::step(3, "Starting bulk import...");
	let total = profiles.len();
	let outcome = AddressBook::new(page)
		.import_all(profiles, |i, profile, result| {
			println!("  [{}/{}] Importing {}...", i + 1, total, profile.display_name());
			if result.success {
				println!("    SUCCESS");
			} else {
				println!("    FAILED: {}", result.message);
			}
		})
		.await;
	Ok(outcome)
}

async fn login_step(page: &dyn PageDriver, credentials: &CredentialArgs) -> bool {
	output::step(1, "Logging in...");
	let config = LoginConfig {
		base_url: credentials.base_url.clone(),
		username: credentials.username.clone(),
		password: credentials.password.clone(),
	};
	let ok = login(page, &config).await;
	if ok {
		output::substep("Login successful");
	}
	ok
}

fn load_profiles(path: &Path) -> anyhow::Result<Vec<Profile>> {
	let raw = std::fs::read_to_string(path)
		.with_context(|| format!("cannot read profile data file {}", path.display()))?;
	let profiles: Vec<Profile> = serde_json::from_str(&raw)
		.with_context(|| format!("{} is not a JSON array of profiles", path.display()))?;
	Ok(profiles)
}

/// The entry to add: first record of `--data` when given, flags otherwise.
fn single_profile(args: &AddContactArgs) -> anyhow::Result<Profile> {
	if let Some(path) = &args.data {
		let profiles = load_profiles(path)?;
		return profiles
			.into_iter()
			.next()
			.with_context(|| format!("{} holds no profiles", path.display()));
	}

	Ok(Profile {
		first_name: args.first_name.clone().unwrap_or_else(|| "Test".into()),
		last_name: args.last_name.clone().unwrap_or_else(|| "Contact".into()),
		phone: args.phone.clone().unwrap_or_default(),
		email: args.email.clone().unwrap_or_default(),
		..Profile::default()
	})
}
