//! The wire-backed page driver.
//!
//! `WirePage` implements [`PageDriver`] over a live engine connection. The
//! protocol surface it uses is small: navigation, frame listing, input
//! primitives, screenshots, and `frame.evaluate`. Every non-trivial DOM
//! lookup is a fixed JavaScript snippet evaluated in the target frame, with
//! the result deserialized into the typed shapes from `emrpilot-protocol`.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use emrpilot_protocol::{
    DEFAULT_VIEWPORT, ElementKind, FrameId, FrameInfo, TableData, TextHit, Viewport, WaitUntil,
};
use emrpilot_runtime::Connection;
use serde_json::{Value, json};
use tracing::debug;

use crate::driver::PageDriver;
use crate::error::{Error, Result};

/// A page hosted by a connected engine.
pub struct WirePage {
    conn: Connection,
    page_id: String,
    context_id: String,
}

impl WirePage {
    /// Creates a fresh context and page on an already-connected engine.
    pub async fn attach(conn: Connection) -> Result<Self> {
        Self::attach_with_viewport(conn, DEFAULT_VIEWPORT).await
    }

    pub async fn attach_with_viewport(conn: Connection, viewport: Viewport) -> Result<Self> {
        let created = conn
            .send("browser.newContext", json!({ "viewport": viewport }))
            .await?;
        let context_id = required_str(&created, "contextId")?;

        let page = conn
            .send("context.newPage", json!({ "contextId": context_id }))
            .await?;
        let page_id = required_str(&page, "pageId")?;

        debug!(target = "emrpilot.page", %context_id, %page_id, "page attached");
        Ok(Self {
            conn,
            page_id,
            context_id,
        })
    }

    /// Number of contexts the engine currently holds. Used by the
    /// persistent server's heartbeat to notice a dead browser.
    pub async fn context_count(&self) -> Result<usize> {
        let value = self.conn.send("browser.contexts", json!({})).await?;
        let contexts = value
            .get("contexts")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::Lookup("browser.contexts returned no list".into()))?;
        Ok(contexts.len())
    }

    /// Closes the page's context; the engine itself keeps running.
    pub async fn close(self) -> Result<()> {
        self.conn
            .send("context.close", json!({ "contextId": self.context_id }))
            .await?;
        Ok(())
    }

    async fn eval_in(&self, frame: FrameId, expression: &str) -> Result<Value> {
        let result = self
            .conn
            .send(
                "frame.evaluate",
                json!({
                    "pageId": self.page_id,
                    "frameIndex": frame.0,
                    "expression": expression,
                }),
            )
            .await?;
        Ok(result.get("value").cloned().unwrap_or(Value::Null))
    }
}

/// Escapes a string for embedding in a single-quoted JS literal.
fn js_string(raw: &str) -> String {
    let escaped = raw
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('\n', "\\n");
    format!("'{escaped}'")
}

fn required_str(value: &Value, key: &str) -> Result<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| Error::Lookup(format!("engine response missing `{key}`")))
}

#[async_trait]
impl PageDriver for WirePage {
    async fn goto(&self, url: &str, wait: WaitUntil, timeout_ms: u64) -> Result<()> {
        self.conn
            .send_with_timeout(
                "page.navigate",
                json!({
                    "pageId": self.page_id,
                    "url": url,
                    "waitUntil": wait.as_str(),
                    "timeout": timeout_ms,
                }),
                timeout_ms.saturating_add(1_000),
            )
            .await?;
        Ok(())
    }

    async fn wait_for_load(&self, wait: WaitUntil, timeout_ms: u64) -> Result<()> {
        self.conn
            .send_with_timeout(
                "page.waitForLoadState",
                json!({
                    "pageId": self.page_id,
                    "state": wait.as_str(),
                    "timeout": timeout_ms,
                }),
                timeout_ms.saturating_add(1_000),
            )
            .await?;
        Ok(())
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    async fn url(&self) -> Result<String> {
        let value = self
            .conn
            .send("page.url", json!({ "pageId": self.page_id }))
            .await?;
        required_str(&value, "url")
    }

    async fn title(&self) -> Result<String> {
        let value = self
            .conn
            .send("page.title", json!({ "pageId": self.page_id }))
            .await?;
        required_str(&value, "title")
    }

    async fn frames(&self) -> Result<Vec<FrameInfo>> {
        let value = self
            .conn
            .send("page.frames", json!({ "pageId": self.page_id }))
            .await?;
        let urls = value
            .get("frames")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::Lookup("page.frames returned no list".into()))?;

        Ok(urls
            .iter()
            .enumerate()
            .map(|(i, f)| FrameInfo {
                id: FrameId(i),
                url: f
                    .get("url")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            })
            .collect())
    }

    async fn query(&self, frame: FrameId, selector: &str) -> Result<Option<ElementKind>> {
        let expr = format!(
            r#"(() => {{
                const el = document.querySelector({sel});
                if (!el) return null;
                const tag = el.tagName.toLowerCase();
                if (tag === 'select') return 'select';
                if (tag === 'textarea') return 'textarea';
                const type = (el.getAttribute('type') || '').toLowerCase();
                if (tag === 'input' && type === 'checkbox') return 'checkbox';
                return 'text';
            }})()"#,
            sel = js_string(selector)
        );

        match self.eval_in(frame, &expr).await? {
            Value::Null => Ok(None),
            value => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| Error::Lookup(format!("bad element kind: {e}"))),
        }
    }

    async fn click(&self, frame: FrameId, selector: &str) -> Result<()> {
        self.conn
            .send(
                "frame.click",
                json!({
                    "pageId": self.page_id,
                    "frameIndex": frame.0,
                    "selector": selector,
                }),
            )
            .await?;
        Ok(())
    }

    async fn click_text(&self, text: &str) -> Result<()> {
        self.conn
            .send(
                "frame.click",
                json!({
                    "pageId": self.page_id,
                    "frameIndex": 0,
                    "selector": format!("text={text}"),
                }),
            )
            .await?;
        Ok(())
    }

    async fn click_link_by_text(&self, frame: FrameId, text: &str) -> Result<bool> {
        let expr = format!(
            r#"(() => {{
                const needle = {needle};
                for (const a of document.querySelectorAll('a')) {{
                    if ((a.textContent || '').includes(needle)) {{
                        a.click();
                        return true;
                    }}
                }}
                return false;
            }})()"#,
            needle = js_string(text)
        );
        Ok(self.eval_in(frame, &expr).await?.as_bool().unwrap_or(false))
    }

    async fn fill(&self, frame: FrameId, selector: &str, value: &str) -> Result<()> {
        self.conn
            .send(
                "frame.fill",
                json!({
                    "pageId": self.page_id,
                    "frameIndex": frame.0,
                    "selector": selector,
                    "value": value,
                }),
            )
            .await?;
        Ok(())
    }

    async fn select_option(&self, frame: FrameId, selector: &str, value: &str) -> Result<()> {
        self.conn
            .send(
                "frame.selectOption",
                json!({
                    "pageId": self.page_id,
                    "frameIndex": frame.0,
                    "selector": selector,
                    "value": value,
                }),
            )
            .await?;
        Ok(())
    }

    async fn check(&self, frame: FrameId, selector: &str) -> Result<()> {
        self.conn
            .send(
                "frame.check",
                json!({
                    "pageId": self.page_id,
                    "frameIndex": frame.0,
                    "selector": selector,
                }),
            )
            .await?;
        Ok(())
    }

    async fn locate_by_text(&self, frame: FrameId, text: &str) -> Result<Option<TextHit>> {
        let expr = format!(
            r#"(() => {{
                const label = {label};
                const candidates = document.querySelectorAll(
                    '.menuLabel, .dropdown-toggle, .dropdown-item, a, button');
                for (const el of candidates) {{
                    if ((el.textContent || '').trim() !== label) continue;
                    const r = el.getBoundingClientRect();
                    return {{
                        x: r.x + r.width / 2,
                        y: r.y + r.height / 2,
                        disabled: el.classList.contains('menuDisabled') || el.disabled === true,
                    }};
                }}
                return null;
            }})()"#,
            label = js_string(text)
        );

        match self.eval_in(frame, &expr).await? {
            Value::Null => Ok(None),
            value => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| Error::Lookup(format!("bad text hit: {e}"))),
        }
    }

    async fn mouse_move(&self, x: f64, y: f64) -> Result<()> {
        self.conn
            .send(
                "page.mouseMove",
                json!({ "pageId": self.page_id, "x": x, "y": y }),
            )
            .await?;
        Ok(())
    }

    async fn mouse_click(&self, x: f64, y: f64) -> Result<()> {
        self.conn
            .send(
                "page.mouseClick",
                json!({ "pageId": self.page_id, "x": x, "y": y }),
            )
            .await?;
        Ok(())
    }

    async fn inner_text(&self, frame: FrameId) -> Result<String> {
        let value = self
            .eval_in(frame, "document.body ? document.body.innerText : ''")
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn content(&self, frame: FrameId) -> Result<String> {
        let value = self
            .eval_in(frame, "document.documentElement.outerHTML")
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn texts(&self, frame: FrameId, selector: &str) -> Result<Vec<String>> {
        let expr = format!(
            "Array.from(document.querySelectorAll({sel})).map(el => (el.textContent || '').trim())",
            sel = js_string(selector)
        );
        let value = self.eval_in(frame, &expr).await?;
        serde_json::from_value(value).map_err(|e| Error::Lookup(format!("bad text list: {e}")))
    }

    async fn click_nth(&self, frame: FrameId, selector: &str, index: usize) -> Result<bool> {
        let expr = format!(
            r#"(() => {{
                const els = document.querySelectorAll({sel});
                if ({index} >= els.length) return false;
                els[{index}].click();
                return true;
            }})()"#,
            sel = js_string(selector)
        );
        Ok(self.eval_in(frame, &expr).await?.as_bool().unwrap_or(false))
    }

    async fn table_rows(&self, frame: FrameId, header: &str) -> Result<Option<TableData>> {
        let expr = format!(
            r#"(() => {{
                const wanted = {wanted};
                for (const table of document.querySelectorAll('table')) {{
                    const headers = Array.from(table.querySelectorAll('th'))
                        .map(th => (th.textContent || '').trim());
                    if (!headers.includes(wanted)) continue;
                    const rows = [];
                    for (const tr of table.querySelectorAll('tbody tr, tr:not(:first-child)')) {{
                        const cells = Array.from(tr.querySelectorAll('td'))
                            .map(td => (td.textContent || '').trim());
                        if (cells.length > 0) rows.push(cells);
                    }}
                    return {{ headers, rows }};
                }}
                return null;
            }})()"#,
            wanted = js_string(header)
        );

        match self.eval_in(frame, &expr).await? {
            Value::Null => Ok(None),
            value => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| Error::Lookup(format!("bad table shape: {e}"))),
        }
    }

    async fn evaluate(&self, expression: &str) -> Result<Value> {
        self.eval_in(FrameId(0), expression).await
    }

    async fn screenshot(&self, path: &Path, full_page: bool) -> Result<()> {
        let value = self
            .conn
            .send(
                "page.screenshot",
                json!({ "pageId": self.page_id, "fullPage": full_page }),
            )
            .await?;

        let encoded = value
            .get("data")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Screenshot {
                path: path.display().to_string(),
                message: "engine returned no image data".into(),
            })?;
        let bytes = STANDARD.decode(encoded).map_err(|e| Error::Screenshot {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn js_string_escapes_quotes_and_backslashes() {
        assert_eq!(js_string("plain"), "'plain'");
        assert_eq!(js_string("O'Brien"), r"'O\'Brien'");
        assert_eq!(js_string(r"a\b"), r"'a\\b'");
        assert_eq!(js_string("two\nlines"), r"'two\nlines'");
    }
}
