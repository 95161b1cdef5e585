use clap::Parser;
use emrpilot_cli::cli::{Cli, Commands, ContactAction, VisitAction};

fn parse(args: &[&str]) -> Cli {
	Cli::try_parse_from(args).expect("args should parse")
}

#[test]
fn serve_defaults_to_headed() {
	let cli = parse(&["emrpilot", "serve"]);
	match cli.command {
		Commands::Serve(args) => {
			assert!(!args.headless);
			assert!(args.state_dir.is_none());
		}
		other => panic!("expected serve, got {other:?}"),
	}
}

#[test]
fn connect_takes_a_positional_endpoint_and_default_url() {
	let cli = parse(&["emrpilot", "connect", "ws://127.0.0.1:35981/ab12cd"]);
	match cli.command {
		Commands::Connect(args) => {
			assert_eq!(args.ws_endpoint, "ws://127.0.0.1:35981/ab12cd");
			assert_eq!(args.url, "https://example.com");
		}
		other => panic!("expected connect, got {other:?}"),
	}
}

#[test]
fn connect_requires_the_endpoint() {
	assert!(Cli::try_parse_from(["emrpilot", "connect"]).is_err());
}

#[test]
fn contact_import_carries_data_output_and_credentials() {
	let cli = parse(&[
		"emrpilot",
		"contact",
		"import",
		"--data",
		"demos/profiles.json",
		"--output",
		"summary.json",
		"--username",
		"clinician",
	]);
	match cli.command {
		Commands::Contact {
			action: ContactAction::Import(args),
		} => {
			assert_eq!(args.data.to_str(), Some("demos/profiles.json"));
			assert_eq!(args.output.as_deref().and_then(|p| p.to_str()), Some("summary.json"));
			assert_eq!(args.credentials.username, "clinician");
			assert_eq!(args.credentials.password, "pass");
		}
		other => panic!("expected contact import, got {other:?}"),
	}
}

#[test]
fn contact_import_requires_a_data_file() {
	assert!(Cli::try_parse_from(["emrpilot", "contact", "import"]).is_err());
}

#[test]
fn visit_create_takes_patient_category_and_reason() {
	let cli = parse(&[
		"emrpilot",
		"visit",
		"create",
		"--patient",
		"Belford",
		"--category",
		"Office Visit",
		"--reason",
		"Annual checkup",
		"--headless",
	]);
	match cli.command {
		Commands::Visit {
			action: VisitAction::Create(args),
		} => {
			assert_eq!(args.patient, "Belford");
			assert_eq!(args.category, "Office Visit");
			assert_eq!(args.reason, "Annual checkup");
			assert!(args.session.headless);
			assert_eq!(args.screenshot_dir.to_str(), Some("visits_screenshots"));
		}
		other => panic!("expected visit create, got {other:?}"),
	}
}

#[test]
fn visit_create_requires_a_patient() {
	assert!(Cli::try_parse_from(["emrpilot", "visit", "create"]).is_err());
}

#[test]
fn visit_current_accepts_an_encounter_date() {
	let cli = parse(&[
		"emrpilot",
		"visit",
		"current",
		"--patient",
		"Belford",
		"--encounter",
		"2014-02-01",
	]);
	match cli.command {
		Commands::Visit {
			action: VisitAction::Current(args),
		} => {
			assert_eq!(args.encounter.as_deref(), Some("2014-02-01"));
		}
		other => panic!("expected visit current, got {other:?}"),
	}
}

#[test]
fn visit_history_accepts_an_attach_endpoint() {
	let cli = parse(&[
		"emrpilot",
		"visit",
		"history",
		"--patient",
		"Belford",
		"--endpoint",
		"ws://127.0.0.1:40001/ffee",
		"--output",
		"visits.json",
	]);
	match cli.command {
		Commands::Visit {
			action: VisitAction::History(args),
		} => {
			assert_eq!(args.session.endpoint.as_deref(), Some("ws://127.0.0.1:40001/ffee"));
			assert_eq!(args.output.as_deref().and_then(|p| p.to_str()), Some("visits.json"));
		}
		other => panic!("expected visit history, got {other:?}"),
	}
}

#[test]
fn verbosity_flag_counts_occurrences() {
	let cli = parse(&["emrpilot", "-vv", "serve"]);
	assert_eq!(cli.verbose, 2);
}
