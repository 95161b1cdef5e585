//! The human-facing step trace.
//!
//! Every task command prints numbered steps to stdout as it goes and closes
//! with a SUCCESS/FAILED summary. Diagnostics go to stderr via `tracing`;
//! this module is only the progress surface.

use std::path::Path;

use colored::Colorize;
use emrpilot_protocol::OperationResult;
use serde::Serialize;

pub fn rule() {
	println!("{}", "=".repeat(60));
}

pub fn banner(title: &str) {
	rule();
	println!("{title}");
	rule();
}

pub fn step(n: usize, message: &str) {
	println!("[{n}] {message}");
}

pub fn substep(message: &str) {
	println!("    {message}");
}

pub fn summary(result: &OperationResult) {
	let verdict = if result.success {
		"SUCCESS".green().bold()
	} else {
		"FAILED".red().bold()
	};

	println!();
	rule();
	println!("Result: {verdict}");
	println!("Message: {}", result.message);
	rule();
}

pub fn write_json(path: &Path, value: &impl Serialize) -> anyhow::Result<()> {
	let rendered = serde_json::to_string_pretty(value)?;
	std::fs::write(path, rendered)?;
	substep(&format!("Data saved to: {}", path.display()));
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn write_json_renders_pretty_output() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("visits.json");

		write_json(&path, &serde_json::json!({ "total_visits": 2 })).unwrap();

		let raw = std::fs::read_to_string(&path).unwrap();
		assert!(raw.contains("\"total_visits\": 2"));
	}
}
