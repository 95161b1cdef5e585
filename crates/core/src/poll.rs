//! Bounded fixed-interval polling for dynamic UI elements.
//!
//! The EMR's menus render asynchronously and its iframes reload with no
//! observable "ready" event, so the resolver scans on a fixed interval with
//! a hard attempt budget. Exhausting the budget is a normal "not found"
//! outcome - callers decide whether absence is an error.

use std::time::Duration;

use emrpilot_protocol::{ElementKind, FrameId, TextHit};
use tracing::{debug, trace};

use crate::driver::PageDriver;

/// Where to scan: one frame, or every attached frame in order.
#[derive(Debug, Clone, Copy)]
pub enum Scope {
    Frame(FrameId),
    AllFrames,
}

/// What to scan for.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    /// A CSS selector (selector lists allowed).
    Css(&'a str),
    /// Exact visible text.
    Text(&'a str),
}

impl Target<'_> {
    fn describe(&self) -> String {
        match self {
            Target::Css(s) => format!("css:{s}"),
            Target::Text(t) => format!("text:{t}"),
        }
    }
}

/// A successful resolution: which frame matched and what was found there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Found {
    Css { frame: FrameId, kind: ElementKind },
    Text { frame: FrameId, hit: TextHit },
}

impl Found {
    pub fn frame(&self) -> FrameId {
        match self {
            Found::Css { frame, .. } | Found::Text { frame, .. } => *frame,
        }
    }
}

/// Bounded polling parameters. The interval is injectable so tests run with
/// zero delay instead of wall-clock sleeps.
#[derive(Debug, Clone, Copy)]
pub struct Poller {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for Poller {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            interval: Duration::from_secs(2),
        }
    }
}

impl Poller {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Performs at most `max_attempts` scans, returning on the first hit
    /// without consuming the remaining budget. No delay follows the final
    /// failed attempt.
    pub async fn resolve(
        &self,
        page: &dyn PageDriver,
        scope: Scope,
        target: Target<'_>,
    ) -> Option<Found> {
        for attempt in 1..=self.max_attempts {
            if let Some(found) = self.scan_once(page, scope, target).await {
                trace!(
                    target = "emrpilot.poll",
                    attempt,
                    target = %target.describe(),
                    "resolved"
                );
                return Some(found);
            }
            if attempt < self.max_attempts {
                page.sleep(self.interval).await;
            }
        }

        debug!(
            target = "emrpilot.poll",
            attempts = self.max_attempts,
            target = %target.describe(),
            "exhausted without a match"
        );
        None
    }

    async fn scan_once(
        &self,
        page: &dyn PageDriver,
        scope: Scope,
        target: Target<'_>,
    ) -> Option<Found> {
        let frame_ids: Vec<FrameId> = match scope {
            Scope::Frame(id) => vec![id],
            Scope::AllFrames => match page.frames().await {
                Ok(frames) => frames.into_iter().map(|f| f.id).collect(),
                // The page may be mid-navigation; this attempt just misses.
                Err(e) => {
                    debug!(target = "emrpilot.poll", error = %e, "frame list unavailable");
                    return None;
                }
            },
        };

        for frame in frame_ids {
            // A frame that detaches mid-scan fails its lookup; skip it and
            // keep scanning the rest.
            match target {
                Target::Css(selector) => {
                    if let Ok(Some(kind)) = page.query(frame, selector).await {
                        return Some(Found::Css { frame, kind });
                    }
                }
                Target::Text(text) => {
                    if let Ok(Some(hit)) = page.locate_by_text(frame, text).await {
                        return Some(Found::Text { frame, hit });
                    }
                }
            }
        }
        None
    }
}
