//! The persistent server: launch the engine, persist its endpoint, hold a
//! context/page open so state survives across task invocations.

use std::time::Duration;

use anyhow::Context;
use emrpilot::WirePage;
use emrpilot::driver::PageDriver;
use emrpilot_protocol::LaunchConfig;
use emrpilot_runtime::{Connection, SessionContext, default_state_dir, launch};

use crate::cli::ServeArgs;
use crate::output;

const HEARTBEAT: Duration = Duration::from_secs(60);

pub async fn run(args: ServeArgs) -> anyhow::Result<()> {
	output::banner("EMRPILOT SERVER WITH PERSISTENT STATE");
	println!("Headless: {}", args.headless);
	output::rule();

	output::step(1, "Launching browser...");
	let engine = launch(&LaunchConfig::new(args.headless))
		.await
		.context("failed to capture a WebSocket endpoint from the engine")?;

	output::step(2, &format!("WebSocket URL: {}", engine.endpoint));

	let state_dir = args.state_dir.unwrap_or_else(default_state_dir);
	let session = SessionContext::create(&state_dir, engine.endpoint.clone())?;
	output::step(3, &format!("Saved to {}", session.ws_url_path().display()));
	println!("SESSION_ID = \"{}\"", session.session_id);

	output::step(4, "Creating persistent context and page...");
	let conn = Connection::connect(&session.endpoint)
		.await
		.context("engine advertised an endpoint but refused the connection")?;
	let page = WirePage::attach(conn).await?;
	output::step(5, "Persistent context and page created");

	output::banner("SERVER READY - state will persist across invocations");

	// Hold the connection until a signal arrives; heartbeat in between so a
	// dead browser is noticed rather than silently leaving stale files.
	loop {
		tokio::select! {
			_ = shutdown_signal() => {
				println!("\n[SHUTDOWN] Cleaning up...");
				break;
			}
			_ = tokio::time::sleep(HEARTBEAT) => {
				match heartbeat(&page).await {
					Ok(line) => println!("[HEARTBEAT] {line}"),
					Err(e) => {
						eprintln!("[ERROR] Browser disconnected: {e}");
						break;
					}
				}
			}
		}
	}

	session.cleanup();
	engine.shutdown().await?;
	Ok(())
}

async fn heartbeat(page: &WirePage) -> anyhow::Result<String> {
	let contexts = page.context_count().await?;
	let url = page.url().await?;
	Ok(format!("{contexts} context(s), page URL: {url}"))
}

async fn shutdown_signal() {
	#[cfg(unix)]
	{
		use tokio::signal::unix::{SignalKind, signal};

		let mut term = match signal(SignalKind::terminate()) {
			Ok(term) => term,
			Err(_) => {
				let _ = tokio::signal::ctrl_c().await;
				return;
			}
		};
		tokio::select! {
			_ = tokio::signal::ctrl_c() => {}
			_ = term.recv() => {}
		}
	}

	#[cfg(not(unix))]
	{
		let _ = tokio::signal::ctrl_c().await;
	}
}
