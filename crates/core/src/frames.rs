//! Frame location by URL substring.

use emrpilot_protocol::FrameInfo;
use tracing::debug;

use crate::driver::PageDriver;

/// First attached frame whose URL contains `url_substring` (case-sensitive),
/// in attachment order. `None` when nothing matches or the page has no
/// frames. A frame list that cannot be fetched (navigation in flight) is
/// treated as "not found", not an error.
pub async fn find_frame(page: &dyn PageDriver, url_substring: &str) -> Option<FrameInfo> {
    let frames = match page.frames().await {
        Ok(frames) => frames,
        Err(e) => {
            debug!(target = "emrpilot.frames", error = %e, "frame scan unavailable");
            return None;
        }
    };

    frames.into_iter().find(|f| f.url.contains(url_substring))
}

#[cfg(test)]
mod tests {
    use emrpilot_protocol::FrameId;

    use super::*;
    use crate::testing::MockPage;

    #[tokio::test]
    async fn returns_first_match_in_attachment_order() {
        let page = MockPage::new().with_frame_urls(&[
            "https://emr.test/main.php",
            "https://emr.test/addrbook_list.php?x=1",
            "https://emr.test/addrbook_list.php?x=2",
        ]);

        let frame = find_frame(&page, "addrbook_list").await.unwrap();
        assert_eq!(frame.id, FrameId(1));
    }

    #[tokio::test]
    async fn returns_none_without_match_or_frames() {
        let page = MockPage::new().with_frame_urls(&["https://emr.test/main.php"]);
        assert!(find_frame(&page, "addrbook_edit").await.is_none());

        let empty = MockPage::new();
        assert!(find_frame(&empty, "anything").await.is_none());
    }

    #[tokio::test]
    async fn match_is_case_sensitive() {
        let page = MockPage::new().with_frame_urls(&["https://emr.test/AddrBook_List.php"]);
        assert!(find_frame(&page, "addrbook_list").await.is_none());
    }
}
