//! Scripted test double for [`PageDriver`].
//!
//! `MockPage` holds a static script of frames, elements, text hits, and
//! canned lookup results, and records every interaction so tests can assert
//! on click sequences, fill payloads, and scan counts. Its `sleep` is a
//! no-op: suites built on it never wait on wall-clock time.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use emrpilot_protocol::{ElementKind, FrameId, FrameInfo, TableData, TextHit, WaitUntil};
use serde_json::Value;

use crate::driver::PageDriver;
use crate::error::{Error, Result};

type Key = (FrameId, String);

#[derive(Default)]
pub struct MockPage {
    frames: Mutex<Vec<FrameInfo>>,
    elements: Mutex<HashMap<Key, ElementKind>>,
    deferred_elements: Mutex<HashMap<Key, (ElementKind, usize)>>,
    text_hits: Mutex<HashMap<Key, TextHit>>,
    clickable_texts: Mutex<HashSet<String>>,
    links: Mutex<HashMap<FrameId, Vec<String>>>,
    links_after_scans: Mutex<HashMap<FrameId, Vec<(String, usize)>>>,
    canned_texts: Mutex<HashMap<Key, Vec<String>>>,
    tables: Mutex<HashMap<FrameId, TableData>>,
    inner_texts: Mutex<HashMap<FrameId, String>>,
    contents: Mutex<HashMap<FrameId, String>>,
    eval_results: Mutex<HashMap<String, Value>>,
    title: Mutex<String>,
    url: Mutex<String>,
    checked_boxes: Mutex<HashSet<Key>>,
    failing_fills: Mutex<HashSet<Key>>,

    frame_scans: AtomicUsize,
    query_counts: Mutex<HashMap<Key, usize>>,
    clicks: AtomicUsize,
    goto_urls: Mutex<Vec<String>>,
    filled: Mutex<Vec<(FrameId, String, String)>>,
    selected: Mutex<Vec<(FrameId, String, String)>>,
    checks: Mutex<Vec<(FrameId, String)>>,
    mouse_click_points: Mutex<Vec<(f64, f64)>>,
    mouse_move_points: Mutex<Vec<(f64, f64)>>,
    nth_clicks: Mutex<Vec<(FrameId, String, usize)>>,
    screenshots: Mutex<Vec<PathBuf>>,
}

impl MockPage {
    pub fn new() -> Self {
        Self::default()
    }

    // -- script construction ------------------------------------------------

    pub fn with_frame_urls(self, urls: &[&str]) -> Self {
        {
            let mut frames = self.frames.lock().unwrap();
            *frames = urls
                .iter()
                .enumerate()
                .map(|(i, url)| FrameInfo {
                    id: FrameId(i),
                    url: url.to_string(),
                })
                .collect();
        }
        self
    }

    pub fn with_element(self, frame: FrameId, selector: &str, kind: ElementKind) -> Self {
        self.elements
            .lock()
            .unwrap()
            .insert((frame, selector.to_string()), kind);
        self
    }

    /// Registers an element that only becomes visible once the same selector
    /// has been queried `after` times - a late-rendering UI element.
    pub fn add_element_after_queries(
        &self,
        frame: FrameId,
        selector: &str,
        kind: ElementKind,
        after: usize,
    ) {
        self.deferred_elements
            .lock()
            .unwrap()
            .insert((frame, selector.to_string()), (kind, after));
    }

    pub fn with_text_hit(self, frame: FrameId, text: &str, hit: TextHit) -> Self {
        self.text_hits
            .lock()
            .unwrap()
            .insert((frame, text.to_string()), hit);
        self
    }

    pub fn with_clickable_text(self, text: &str) -> Self {
        self.clickable_texts.lock().unwrap().insert(text.to_string());
        self
    }

    pub fn with_link(self, frame: FrameId, text: &str) -> Self {
        self.links
            .lock()
            .unwrap()
            .entry(frame)
            .or_default()
            .push(text.to_string());
        self
    }

    /// Registers a link that only exists once `frames()` has been called at
    /// least `min_scans` times - a frame that fills in while being polled.
    pub fn with_link_after_scans(self, frame: FrameId, text: &str, min_scans: usize) -> Self {
        self.links_after_scans
            .lock()
            .unwrap()
            .entry(frame)
            .or_default()
            .push((text.to_string(), min_scans));
        self
    }

    pub fn with_texts(self, frame: FrameId, selector: &str, texts: &[&str]) -> Self {
        self.canned_texts.lock().unwrap().insert(
            (frame, selector.to_string()),
            texts.iter().map(|t| t.to_string()).collect(),
        );
        self
    }

    pub fn with_table(self, frame: FrameId, table: TableData) -> Self {
        self.tables.lock().unwrap().insert(frame, table);
        self
    }

    pub fn with_inner_text(self, frame: FrameId, text: &str) -> Self {
        self.inner_texts
            .lock()
            .unwrap()
            .insert(frame, text.to_string());
        self
    }

    pub fn with_content(self, frame: FrameId, html: &str) -> Self {
        self.contents.lock().unwrap().insert(frame, html.to_string());
        self
    }

    pub fn with_eval(self, expression: &str, value: Value) -> Self {
        self.eval_results
            .lock()
            .unwrap()
            .insert(expression.to_string(), value);
        self
    }

    pub fn with_title(self, title: &str) -> Self {
        *self.title.lock().unwrap() = title.to_string();
        self
    }

    pub fn with_url(self, url: &str) -> Self {
        *self.url.lock().unwrap() = url.to_string();
        self
    }

    pub fn with_checked_box(self, frame: FrameId, selector: &str) -> Self {
        self.checked_boxes
            .lock()
            .unwrap()
            .insert((frame, selector.to_string()));
        self
    }

    pub fn with_failing_fill(self, frame: FrameId, selector: &str) -> Self {
        self.failing_fills
            .lock()
            .unwrap()
            .insert((frame, selector.to_string()));
        self
    }

    // -- recorded interactions ----------------------------------------------

    pub fn frame_scans(&self) -> usize {
        self.frame_scans.load(Ordering::SeqCst)
    }

    /// Every click of any kind: direct, text, link, coordinate, nth.
    pub fn click_count(&self) -> usize {
        self.clicks.load(Ordering::SeqCst)
    }

    pub fn goto_urls(&self) -> Vec<String> {
        self.goto_urls.lock().unwrap().clone()
    }

    pub fn filled(&self) -> Vec<(FrameId, String, String)> {
        self.filled.lock().unwrap().clone()
    }

    pub fn selected(&self) -> Vec<(FrameId, String, String)> {
        self.selected.lock().unwrap().clone()
    }

    pub fn checked(&self) -> Vec<(FrameId, String)> {
        self.checks.lock().unwrap().clone()
    }

    pub fn is_checked(&self, frame: FrameId, selector: &str) -> bool {
        self.checked_boxes
            .lock()
            .unwrap()
            .contains(&(frame, selector.to_string()))
    }

    pub fn mouse_clicks(&self) -> Vec<(f64, f64)> {
        self.mouse_click_points.lock().unwrap().clone()
    }

    pub fn mouse_moves(&self) -> Vec<(f64, f64)> {
        self.mouse_move_points.lock().unwrap().clone()
    }

    pub fn screenshots(&self) -> Vec<PathBuf> {
        self.screenshots.lock().unwrap().clone()
    }

    pub fn nth_clicks(&self) -> Vec<(FrameId, String, usize)> {
        self.nth_clicks.lock().unwrap().clone()
    }

    fn element_kind(&self, key: &Key) -> Option<ElementKind> {
        if let Some(kind) = self.elements.lock().unwrap().get(key) {
            return Some(*kind);
        }
        let seen = *self.query_counts.lock().unwrap().get(key).unwrap_or(&0);
        self.deferred_elements
            .lock()
            .unwrap()
            .get(key)
            .filter(|(_, after)| seen > *after)
            .map(|(kind, _)| *kind)
    }
}

#[async_trait]
impl PageDriver for MockPage {
    async fn goto(&self, url: &str, _wait: WaitUntil, _timeout_ms: u64) -> Result<()> {
        self.goto_urls.lock().unwrap().push(url.to_string());
        *self.url.lock().unwrap() = url.to_string();
        Ok(())
    }

    async fn wait_for_load(&self, _wait: WaitUntil, _timeout_ms: u64) -> Result<()> {
        Ok(())
    }

    async fn sleep(&self, _duration: Duration) {}

    async fn url(&self) -> Result<String> {
        Ok(self.url.lock().unwrap().clone())
    }

    async fn title(&self) -> Result<String> {
        Ok(self.title.lock().unwrap().clone())
    }

    async fn frames(&self) -> Result<Vec<FrameInfo>> {
        self.frame_scans.fetch_add(1, Ordering::SeqCst);
        Ok(self.frames.lock().unwrap().clone())
    }

    async fn query(&self, frame: FrameId, selector: &str) -> Result<Option<ElementKind>> {
        let key = (frame, selector.to_string());
        *self.query_counts.lock().unwrap().entry(key.clone()).or_insert(0) += 1;
        Ok(self.element_kind(&key))
    }

    async fn click(&self, frame: FrameId, selector: &str) -> Result<()> {
        let key = (frame, selector.to_string());
        if self.element_kind(&key).is_none() {
            return Err(Error::Lookup(format!("no element for {selector}")));
        }
        self.clicks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn click_text(&self, text: &str) -> Result<()> {
        if !self.clickable_texts.lock().unwrap().contains(text) {
            return Err(Error::Lookup(format!("no element with text {text}")));
        }
        self.clicks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn click_link_by_text(&self, frame: FrameId, text: &str) -> Result<bool> {
        let ready = self
            .links
            .lock()
            .unwrap()
            .get(&frame)
            .is_some_and(|links| links.iter().any(|l| l.contains(text)));
        let scans = self.frame_scans();
        let deferred_ready = self
            .links_after_scans
            .lock()
            .unwrap()
            .get(&frame)
            .is_some_and(|links| {
                links
                    .iter()
                    .any(|(l, min)| l.contains(text) && scans >= *min)
            });

        if ready || deferred_ready {
            self.clicks.fetch_add(1, Ordering::SeqCst);
            return Ok(true);
        }
        Ok(false)
    }

    async fn fill(&self, frame: FrameId, selector: &str, value: &str) -> Result<()> {
        let key = (frame, selector.to_string());
        if self.failing_fills.lock().unwrap().contains(&key) {
            return Err(Error::Lookup(format!("fill rejected for {selector}")));
        }
        self.filled
            .lock()
            .unwrap()
            .push((frame, selector.to_string(), value.to_string()));
        Ok(())
    }

    async fn select_option(&self, frame: FrameId, selector: &str, value: &str) -> Result<()> {
        self.selected
            .lock()
            .unwrap()
            .push((frame, selector.to_string(), value.to_string()));
        Ok(())
    }

    async fn check(&self, frame: FrameId, selector: &str) -> Result<()> {
        self.checks
            .lock()
            .unwrap()
            .push((frame, selector.to_string()));
        self.checked_boxes
            .lock()
            .unwrap()
            .insert((frame, selector.to_string()));
        Ok(())
    }

    async fn locate_by_text(&self, frame: FrameId, text: &str) -> Result<Option<TextHit>> {
        Ok(self
            .text_hits
            .lock()
            .unwrap()
            .get(&(frame, text.to_string()))
            .copied())
    }

    async fn mouse_move(&self, x: f64, y: f64) -> Result<()> {
        self.mouse_move_points.lock().unwrap().push((x, y));
        Ok(())
    }

    async fn mouse_click(&self, x: f64, y: f64) -> Result<()> {
        self.mouse_click_points.lock().unwrap().push((x, y));
        self.clicks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn inner_text(&self, frame: FrameId) -> Result<String> {
        Ok(self
            .inner_texts
            .lock()
            .unwrap()
            .get(&frame)
            .cloned()
            .unwrap_or_default())
    }

    async fn content(&self, frame: FrameId) -> Result<String> {
        Ok(self
            .contents
            .lock()
            .unwrap()
            .get(&frame)
            .cloned()
            .unwrap_or_default())
    }

    async fn texts(&self, frame: FrameId, selector: &str) -> Result<Vec<String>> {
        Ok(self
            .canned_texts
            .lock()
            .unwrap()
            .get(&(frame, selector.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn click_nth(&self, frame: FrameId, selector: &str, index: usize) -> Result<bool> {
        let in_range = self
            .canned_texts
            .lock()
            .unwrap()
            .get(&(frame, selector.to_string()))
            .is_some_and(|texts| index < texts.len());
        if in_range {
            self.clicks.fetch_add(1, Ordering::SeqCst);
            self.nth_clicks
                .lock()
                .unwrap()
                .push((frame, selector.to_string(), index));
        }
        Ok(in_range)
    }

    async fn table_rows(&self, frame: FrameId, header: &str) -> Result<Option<TableData>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .get(&frame)
            .filter(|t| t.headers.iter().any(|h| h == header))
            .cloned())
    }

    async fn evaluate(&self, expression: &str) -> Result<Value> {
        Ok(self
            .eval_results
            .lock()
            .unwrap()
            .get(expression)
            .cloned()
            .unwrap_or(Value::Null))
    }

    async fn screenshot(&self, path: &Path, _full_page: bool) -> Result<()> {
        self.screenshots.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}
