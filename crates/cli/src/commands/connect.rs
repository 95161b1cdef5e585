//! Attach to a running engine and exercise the browser controls end to end:
//! navigation, cursor movement and clicking, script evaluation, screenshots.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, anyhow};
use emrpilot::driver::{PageDriver, TOP_FRAME};
use emrpilot::WirePage;
use emrpilot_protocol::{WaitUntil, WsEndpoint};
use emrpilot_runtime::Connection;
use serde_json::Value;

use crate::cli::ConnectArgs;
use crate::output;

const HEADING_BOX_JS: &str = r"(() => {
    const el = document.querySelector('h1');
    if (!el) return null;
    const r = el.getBoundingClientRect();
    return { x: r.x + r.width / 2, y: r.y + r.height / 2 };
})()";

const BANNER_JS: &str = r"(() => {
    const banner = document.createElement('div');
    banner.id = 'client-banner';
    banner.style.cssText = 'position:fixed;top:0;left:0;right:0;background:green;color:white;padding:10px;z-index:9999;text-align:center;';
    banner.textContent = 'Connected via emrpilot server!';
    document.body.prepend(banner);
    return true;
})()";

pub async fn run(args: ConnectArgs) -> anyhow::Result<()> {
	output::banner("EMRPILOT CLIENT");
	println!("Connecting to: {}", args.ws_endpoint);

	let endpoint = WsEndpoint::parse(&args.ws_endpoint)
		.ok_or_else(|| anyhow!("not a WebSocket endpoint: {}", args.ws_endpoint))?;
	let conn = Connection::connect(&endpoint)
		.await
		.with_context(|| format!("cannot attach to {endpoint}"))?;
	println!("Connected to browser!");

	let page = WirePage::attach(conn).await?;

	output::step(1, &format!("Navigating to {}...", args.url));
	page.goto(&args.url, WaitUntil::NetworkIdle, 30_000).await?;
	output::substep("Page loaded");

	output::step(2, "Cursor navigation + click");
	match page.evaluate(HEADING_BOX_JS).await? {
		Value::Object(center) => {
			let x = center.get("x").and_then(Value::as_f64).unwrap_or_default();
			let y = center.get("y").and_then(Value::as_f64).unwrap_or_default();
			page.mouse_move(x, y).await?;
			output::substep(&format!("Moved cursor to ({x:.0}, {y:.0})"));
			page.mouse_click(x, y).await?;
			output::substep("Clicked the heading");
		}
		_ => {
			output::substep("No heading found, clicking body");
			page.click(TOP_FRAME, "body").await?;
		}
	}

	output::step(3, "JavaScript execution");
	let title = page.evaluate("document.title").await?;
	output::substep(&format!(
		"document.title = '{}'",
		title.as_str().unwrap_or_default()
	));
	let sum = page.evaluate("10 + 20").await?;
	output::substep(&format!("JS calculation 10 + 20 = {sum}"));
	page.evaluate(BANNER_JS).await?;
	output::substep("Injected banner");

	page.sleep(Duration::from_secs(1)).await;

	output::step(4, "Screenshot");
	let screenshot = Path::new("client_screenshot.png");
	page.screenshot(screenshot, true).await?;
	output::substep(&format!("Screenshot saved to: {}", screenshot.display()));

	output::banner("ALL TESTS PASSED");
	println!("Browser connection remains open. Press Ctrl-C to disconnect.");
	let _ = tokio::signal::ctrl_c().await;

	println!("Disconnecting...");
	page.close().await?;
	Ok(())
}
