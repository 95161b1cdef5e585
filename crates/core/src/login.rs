//! Login against the EMR's credential form.

use std::time::Duration;

use emrpilot_protocol::WaitUntil;
use tracing::{debug, warn};

use crate::driver::{PageDriver, TOP_FRAME};

pub const DEFAULT_BASE_URL: &str = "https://demo.openemr.io/openemr";
pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "pass";

const USERNAME_FIELD: &str = "[name='authUser']";
const PASSWORD_FIELD: &str = "[name='clearPass']";
const SUBMIT_BUTTON: &str = "#login-button";

/// Title must contain this after a successful login...
const APP_MARKER: &str = "OpenEMR";
/// ...and must not still contain this.
const LOGIN_MARKER: &str = "Login";

const POST_SUBMIT_QUIESCENCE_MS: u64 = 15_000;
const LOGIN_SETTLE: Duration = Duration::from_secs(2);

/// Where and as whom to log in.
#[derive(Debug, Clone)]
pub struct LoginConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            username: DEFAULT_USERNAME.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
        }
    }
}

impl LoginConfig {
    pub fn login_url(&self) -> String {
        format!(
            "{}/interface/login/login.php?site=default",
            self.base_url.trim_end_matches('/')
        )
    }
}

/// Navigates to the login page, submits credentials, and judges the outcome
/// from the resulting title.
///
/// Failure is a boolean, never an exception: engine errors on the way in are
/// logged and reported as a failed login, and the post-submit quiescence
/// wait is allowed to time out (the EMR keeps background requests alive long
/// past a usable dashboard).
pub async fn login(page: &dyn PageDriver, config: &LoginConfig) -> bool {
    let url = config.login_url();
    if let Err(e) = page.goto(&url, WaitUntil::NetworkIdle, 30_000).await {
        warn!(target = "emrpilot.login", error = %e, "login page unreachable");
        return false;
    }

    for (selector, value) in [
        (USERNAME_FIELD, config.username.as_str()),
        (PASSWORD_FIELD, config.password.as_str()),
    ] {
        if let Err(e) = page.fill(TOP_FRAME, selector, value).await {
            warn!(target = "emrpilot.login", selector, error = %e, "credential field unavailable");
            return false;
        }
    }

    if let Err(e) = page.click(TOP_FRAME, SUBMIT_BUTTON).await {
        warn!(target = "emrpilot.login", error = %e, "submit failed");
        return false;
    }

    if let Err(e) = page
        .wait_for_load(WaitUntil::NetworkIdle, POST_SUBMIT_QUIESCENCE_MS)
        .await
    {
        debug!(target = "emrpilot.login", error = %e, "quiescence wait expired; proceeding");
    }
    page.sleep(LOGIN_SETTLE).await;

    match page.title().await {
        Ok(title) => title.contains(APP_MARKER) && !title.contains(LOGIN_MARKER),
        Err(e) => {
            warn!(target = "emrpilot.login", error = %e, "title unavailable after submit");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use emrpilot_protocol::ElementKind;

    use super::*;
    use crate::testing::MockPage;

    fn login_ready_page() -> MockPage {
        MockPage::new()
            .with_element(TOP_FRAME, USERNAME_FIELD, ElementKind::Text)
            .with_element(TOP_FRAME, PASSWORD_FIELD, ElementKind::Text)
            .with_element(TOP_FRAME, SUBMIT_BUTTON, ElementKind::Text)
    }

    #[tokio::test]
    async fn succeeds_when_title_shows_the_app_and_not_the_login_page() {
        let page = login_ready_page().with_title("OpenEMR - Dashboard");
        assert!(login(&page, &LoginConfig::default()).await);

        let filled = page.filled();
        assert_eq!(filled[0].2, "admin");
        assert_eq!(filled[1].2, "pass");
    }

    #[tokio::test]
    async fn fails_when_title_still_carries_the_login_marker() {
        let page = login_ready_page().with_title("OpenEMR Login");
        assert!(!login(&page, &LoginConfig::default()).await);
    }

    #[tokio::test]
    async fn fails_when_the_app_marker_is_absent() {
        let page = login_ready_page().with_title("502 Bad Gateway");
        assert!(!login(&page, &LoginConfig::default()).await);
    }

    #[test]
    fn login_url_normalizes_the_trailing_slash() {
        let config = LoginConfig {
            base_url: "https://emr.test/openemr/".into(),
            ..LoginConfig::default()
        };
        assert_eq!(
            config.login_url(),
            "https://emr.test/openemr/interface/login/login.php?site=default"
        );
    }
}
