//! Browser acquisition for task commands.
//!
//! Tasks reach a browser three ways, in priority order: an explicit
//! `--endpoint`, the persistent server's session files, or a self-launched
//! engine that is shut down when the task finishes. Persisted sessions are
//! validated by connecting - a stale file from a crashed server falls
//! through to a fresh launch instead of failing the task.

use anyhow::{Context, anyhow};
use emrpilot::WirePage;
use emrpilot_protocol::{LaunchConfig, WsEndpoint};
use emrpilot_runtime::{Connection, LaunchedEngine, SessionContext, default_state_dir, launch};
use tracing::{info, warn};

use crate::cli::SessionArgs;

pub struct TaskSession {
	pub page: WirePage,
	owned: Option<LaunchedEngine>,
}

impl TaskSession {
	pub async fn open(args: &SessionArgs) -> anyhow::Result<Self> {
		if let Some(raw) = &args.endpoint {
			let endpoint = WsEndpoint::parse(raw)
				.ok_or_else(|| anyhow!("not a WebSocket endpoint: {raw}"))?;
			let conn = Connection::connect(&endpoint)
				.await
				.with_context(|| format!("cannot attach to {endpoint}"))?;
			let page = WirePage::attach(conn).await?;
			return Ok(Self { page, owned: None });
		}

		if let Some(session) = SessionContext::load(&default_state_dir()) {
			match Connection::connect(&session.endpoint).await {
				Ok(conn) => {
					info!(target = "emrpilot.cli", endpoint = %session.endpoint, "attached to persisted session");
					let page = WirePage::attach(conn).await?;
					return Ok(Self { page, owned: None });
				}
				Err(e) => {
					warn!(target = "emrpilot.cli", error = %e, "persisted session is stale; launching a fresh browser");
				}
			}
		}

		let engine = launch(&LaunchConfig::new(args.headless))
			.await
			.context("engine launch failed")?;
		let conn = Connection::connect(&engine.endpoint)
			.await
			.with_context(|| format!("cannot attach to freshly launched engine at {}", engine.endpoint))?;
		let page = WirePage::attach(conn).await?;
		Ok(Self {
			page,
			owned: Some(engine),
		})
	}

	/// Releases the page; a self-launched engine goes down with it.
	pub async fn close(self) {
		let Self { page, owned } = self;
		if let Err(e) = page.close().await {
			warn!(target = "emrpilot.cli", error = %e, "page close failed");
		}
		if let Some(engine) = owned {
			if let Err(e) = engine.shutdown().await {
				warn!(target = "emrpilot.cli", error = %e, "engine shutdown failed");
			}
		}
	}
}
