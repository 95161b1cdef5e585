//! Menu traversal for the EMR's nested dropdown navigation.

use std::time::Duration;

use tracing::{debug, info};

use crate::driver::{PageDriver, TOP_FRAME};

/// Settle after a hover before clicking a submenu entry.
pub const HOVER_SETTLE: Duration = Duration::from_millis(500);
/// Settle after any menu click while the UI animates or navigates.
pub const CLICK_SETTLE: Duration = Duration::from_secs(2);

/// Clicks through an ordered path of menu labels.
///
/// The first label is clicked directly by its visible text. Deeper labels
/// are often not independently clickable until a parent menu exposes them,
/// so they go through the bounding-box lookup: locate by text, reject when
/// disabled, move the pointer to the center, click at that same point.
///
/// The first label that cannot be resolved (or is disabled) aborts the
/// remaining path and returns `false`. Success means every label received
/// exactly one click; the destination view is not verified.
pub async fn navigate_menu(page: &dyn PageDriver, path: &[&str]) -> bool {
    for (i, label) in path.iter().enumerate() {
        if i == 0 {
            if let Err(e) = page.click_text(label).await {
                debug!(target = "emrpilot.menu", label, error = %e, "direct click failed");
                return false;
            }
            page.sleep(HOVER_SETTLE).await;
            continue;
        }

        let hit = match page.locate_by_text(TOP_FRAME, label).await {
            Ok(Some(hit)) => hit,
            Ok(None) => {
                debug!(target = "emrpilot.menu", label, "menu item not found");
                return false;
            }
            Err(e) => {
                debug!(target = "emrpilot.menu", label, error = %e, "menu lookup failed");
                return false;
            }
        };
        if hit.disabled {
            debug!(target = "emrpilot.menu", label, "menu item disabled");
            return false;
        }

        if page.mouse_move(hit.x, hit.y).await.is_err() {
            return false;
        }
        page.sleep(HOVER_SETTLE).await;
        if page.mouse_click(hit.x, hit.y).await.is_err() {
            return false;
        }
        page.sleep(CLICK_SETTLE).await;
    }

    info!(target = "emrpilot.menu", path = ?path, "menu path traversed");
    true
}

#[cfg(test)]
mod tests {
    use emrpilot_protocol::TextHit;

    use super::*;
    use crate::testing::MockPage;

    fn enabled(x: f64, y: f64) -> TextHit {
        TextHit {
            x,
            y,
            disabled: false,
        }
    }

    #[tokio::test]
    async fn full_path_produces_one_click_per_label() {
        let page = MockPage::new()
            .with_clickable_text("Patient")
            .with_text_hit(TOP_FRAME, "Visits", enabled(100.0, 50.0))
            .with_text_hit(TOP_FRAME, "Create Visit", enabled(120.0, 90.0));

        assert!(navigate_menu(&page, &["Patient", "Visits", "Create Visit"]).await);
        assert_eq!(page.click_count(), 3);
        assert_eq!(page.mouse_clicks(), vec![(100.0, 50.0), (120.0, 90.0)]);
    }

    #[tokio::test]
    async fn unresolved_label_aborts_the_remaining_path() {
        let page = MockPage::new()
            .with_clickable_text("Patient")
            .with_text_hit(TOP_FRAME, "Visits", enabled(100.0, 50.0));

        assert!(!navigate_menu(&page, &["Patient", "Visits", "Nonexistent", "Deeper"]).await);
        // Clicks stop at the failing index: direct click + one submenu click.
        assert_eq!(page.click_count(), 2);
    }

    #[tokio::test]
    async fn disabled_label_aborts_without_clicking_it() {
        let page = MockPage::new()
            .with_clickable_text("Patient")
            .with_text_hit(TOP_FRAME, "Visits", enabled(100.0, 50.0))
            .with_text_hit(TOP_FRAME, "Current", TextHit {
                x: 130.0,
                y: 95.0,
                disabled: true,
            });

        assert!(!navigate_menu(&page, &["Patient", "Visits", "Current"]).await);
        assert_eq!(page.mouse_clicks().len(), 1);
    }

    #[tokio::test]
    async fn missing_first_label_fails_before_any_submenu_work() {
        let page = MockPage::new();
        assert!(!navigate_menu(&page, &["Ghost", "Entry"]).await);
        assert_eq!(page.click_count(), 0);
    }

    #[tokio::test]
    async fn single_label_path_is_just_the_direct_click() {
        let page = MockPage::new().with_clickable_text("Finder");
        assert!(navigate_menu(&page, &["Finder"]).await);
        assert_eq!(page.click_count(), 1);
    }
}
