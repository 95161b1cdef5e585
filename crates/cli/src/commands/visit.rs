//! Visit task commands: create an encounter, view the current one, fetch
//! the visit history.

use emrpilot::driver::PageDriver;
use emrpilot::login::{LoginConfig, login};
use emrpilot::ops::{VisitData, Visits};
use emrpilot_protocol::OperationResult;
use serde_json::Value;

use crate::cli::{CredentialArgs, CreateVisitArgs, CurrentVisitArgs, VisitAction, VisitHistoryArgs};
use crate::output;
use crate::session::TaskSession;

pub async fn run(action: VisitAction) -> anyhow::Result<()> {
	match action {
		VisitAction::Create(args) => create(args).await,
		VisitAction::Current(args) => current(args).await,
		VisitAction::History(args) => history(args).await,
	}
}

async fn create(args: CreateVisitArgs) -> anyhow::Result<()> {
	output::banner("CREATE VISIT - OpenEMR Automation");

	let session = TaskSession::open(&args.session).await?;
	let result = match login_step(&session.page, &args.credentials).await {
		true => {
			output::step(2, &format!("Creating visit for: {}", args.patient));
			let data = VisitData {
				category: args.category.clone(),
				reason: args.reason.clone(),
			};
			Visits::new(&session.page)
				.create(&args.patient, &data, Some(&args.screenshot_dir))
				.await
		}
		false => OperationResult::failed("Login failed"),
	};
	session.close().await;

	print_screenshot(&result);
	output::summary(&result);
	if !result.success {
		std::process::exit(1);
	}
	Ok(())
}

async fn current(args: CurrentVisitArgs) -> anyhow::Result<()> {
	output::banner("CURRENT VISIT - OpenEMR Automation");

	let session = TaskSession::open(&args.session).await?;
	let result = match login_step(&session.page, &args.credentials).await {
		true => {
			output::step(2, &format!("Opening current visit for: {}", args.patient));
			Visits::new(&session.page)
				.current(&args.patient, args.encounter.as_deref(), Some(&args.screenshot_dir))
				.await
		}
		false => OperationResult::failed("Login failed"),
	};
	session.close().await;

	if let Some(data) = &result.data {
		if let Some(date) = data.get("encounter_date").and_then(Value::as_str) {
			println!("Encounter: {date}");
		}
		print_section(data, "visit_summary", "Visit Summary");
		print_section(data, "soap_notes", "SOAP Notes");
	}
	print_screenshot(&result);
	output::summary(&result);
	if !result.success {
		std::process::exit(1);
	}
	Ok(())
}

async fn history(args: VisitHistoryArgs) -> anyhow::Result<()> {
	output::banner("VISIT HISTORY - OpenEMR Automation");

	let session = TaskSession::open(&args.session).await?;
	let result = match login_step(&session.page, &args.credentials).await {
		true => {
			output::step(2, &format!("Fetching visit history for: {}", args.patient));
			Visits::new(&session.page)
				.history(&args.patient, Some(&args.screenshot_dir))
				.await
		}
		false => OperationResult::failed("Login failed"),
	};
	session.close().await;

	if let Some(data) = &result.data {
		println!("Patient: {}", args.patient);
		println!(
			"Total Visits: {}",
			data.get("total_visits").and_then(Value::as_u64).unwrap_or(0)
		);
		if let Some(visits) = data.get("visits").and_then(Value::as_array)
			&& !visits.is_empty()
		{
			println!("\nVisit Records:");
			for (i, visit) in visits.iter().enumerate() {
				println!(
					"  {}. {} - {} - {}",
					i + 1,
					visit.get("date").and_then(Value::as_str).unwrap_or(""),
					visit.get("provider").and_then(Value::as_str).unwrap_or(""),
					truncate(visit.get("reason_form").and_then(Value::as_str).unwrap_or(""), 30),
				);
			}
		}

		if let Some(path) = &args.output
			&& result.success
		{
			output::write_json(path, data)?;
		}
	}
	print_screenshot(&result);
	output::summary(&result);
	if !result.success {
		std::process::exit(1);
	}
	Ok(())
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

fn print_screenshot(result: &OperationResult) {
	if let Some(path) = result
		.data
		.as_ref()
		.and_then(|d| d.get("screenshot_path"))
		.and_then(Value::as_str)
	{
		println!("Screenshot: {path}");
	}
}

fn print_section(data: &Value, key: &str, label: &str) {
	if let Some(section) = data.get(key)
		&& section.is_object()
	{
		println!("{label}: {section}");
	}
}

fn truncate(text: &str, max_chars: usize) -> &str {
	match text.char_indices().nth(max_chars) {
		Some((idx, _)) => &text[..idx],
		None => text,
	}
}
