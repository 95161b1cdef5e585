//! The typed browser-control contract.
//!
//! Every DOM interaction the automation layer performs goes through this
//! trait, and every in-page lookup returns one of the typed shapes from
//! `emrpilot-protocol` rather than an ad-hoc JSON blob. Tests substitute
//! [`crate::testing::MockPage`]; production code uses [`crate::WirePage`].

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use emrpilot_protocol::{ElementKind, FrameId, FrameInfo, TableData, TextHit, WaitUntil};
use serde_json::Value;

use crate::error::Result;

/// The top-level document; always present, always index 0.
pub const TOP_FRAME: FrameId = FrameId(0);

#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigates the page and waits for the given load state.
    async fn goto(&self, url: &str, wait: WaitUntil, timeout_ms: u64) -> Result<()>;

    /// Waits for a load state on the current document. A timeout is an
    /// error here; callers that tolerate it ignore the result.
    async fn wait_for_load(&self, wait: WaitUntil, timeout_ms: u64) -> Result<()>;

    /// Suspends the task. On the wire driver this is a real sleep; the test
    /// double makes it instantaneous so suites never block on wall-clock.
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    async fn url(&self) -> Result<String>;

    async fn title(&self) -> Result<String>;

    /// All currently attached frames in attachment order, the top-level
    /// document first. Frames are transient; the list is a snapshot.
    async fn frames(&self) -> Result<Vec<FrameInfo>>;

    /// First element matching `selector` in `frame`, reported as its form
    /// control kind. `None` means no match (a normal outcome).
    async fn query(&self, frame: FrameId, selector: &str) -> Result<Option<ElementKind>>;

    /// Clicks the first element matching `selector` in `frame`.
    async fn click(&self, frame: FrameId, selector: &str) -> Result<()>;

    /// Clicks the element with exactly this visible text in the top-level
    /// document (the direct menu-entry click).
    async fn click_text(&self, text: &str) -> Result<()>;

    /// Clicks the first link in `frame` whose text contains `text`.
    /// Returns whether such a link existed.
    async fn click_link_by_text(&self, frame: FrameId, text: &str) -> Result<bool>;

    /// Sets a text input or textarea to `value`.
    async fn fill(&self, frame: FrameId, selector: &str, value: &str) -> Result<()>;

    /// Chooses the option with this value in a select element.
    async fn select_option(&self, frame: FrameId, selector: &str, value: &str) -> Result<()>;

    /// Checks a checkbox. There is deliberately no `uncheck` counterpart;
    /// see the form filler's one-directional contract.
    async fn check(&self, frame: FrameId, selector: &str) -> Result<()>;

    /// Locates an element by its visible text and reports the center of its
    /// bounding box plus its disabled state. Works on elements that are not
    /// independently clickable until a parent menu exposes them.
    async fn locate_by_text(&self, frame: FrameId, text: &str) -> Result<Option<TextHit>>;

    async fn mouse_move(&self, x: f64, y: f64) -> Result<()>;

    async fn mouse_click(&self, x: f64, y: f64) -> Result<()>;

    /// The frame's rendered text (`document.body.innerText`).
    async fn inner_text(&self, frame: FrameId) -> Result<String>;

    /// The frame's full markup.
    async fn content(&self, frame: FrameId) -> Result<String>;

    /// Trimmed text of every element matching `selector` in `frame`.
    async fn texts(&self, frame: FrameId, selector: &str) -> Result<Vec<String>>;

    /// Clicks the `index`-th element matching `selector`. Returns whether
    /// the index was in range.
    async fn click_nth(&self, frame: FrameId, selector: &str, index: usize) -> Result<bool>;

    /// First table in `frame` whose header row contains `header`, lifted
    /// into headers plus body rows of cell texts.
    async fn table_rows(&self, frame: FrameId, header: &str) -> Result<Option<TableData>>;

    /// Evaluates a JavaScript expression in the top-level document and
    /// returns its JSON value.
    async fn evaluate(&self, expression: &str) -> Result<Value>;

    async fn screenshot(&self, path: &Path, full_page: bool) -> Result<()>;
}
