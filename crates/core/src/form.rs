//! Best-effort form filling with element-kind dispatch.
//!
//! A single uniform "set value" is not correct across input kinds: selects
//! need option matching, checkboxes need boolean semantics. Each field is
//! independent - a failure fills the log, not the whole form.

use std::collections::{BTreeMap, HashMap};

use emrpilot_protocol::{ElementKind, FrameId};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::driver::PageDriver;

/// A single form field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
    Empty,
}

impl FieldValue {
    /// Blank values are skipped outright: the field is left as it was,
    /// never cleared.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Empty => true,
            FieldValue::Text(t) => t.is_empty(),
            FieldValue::Flag(_) => false,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Flag(b) => *b,
            FieldValue::Text(t) => !t.is_empty(),
            FieldValue::Empty => false,
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Text(t) => t.clone(),
            FieldValue::Flag(b) => b.to_string(),
            FieldValue::Empty => String::new(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

/// Field name to value, iterated in a stable order.
pub type FormData = BTreeMap<String, FieldValue>;

/// Optional per-field selector overrides; anything absent falls back to the
/// attribute selector `[name='<field>']`.
pub type SelectorOverrides = HashMap<String, String>;

/// Fills every non-blank field in `fields` inside `frame`.
///
/// Dispatch per element kind: select chooses the option by value, checkbox
/// checks only when the value is truthy (a falsy value never unchecks an
/// already-checked box), text and textarea receive the value's string form.
/// Absent elements are skipped silently; an engine failure on one field is
/// logged and the rest of the form proceeds.
pub async fn fill_form(
    page: &dyn PageDriver,
    frame: FrameId,
    fields: &FormData,
    overrides: &SelectorOverrides,
) {
    for (name, value) in fields {
        if value.is_blank() {
            continue;
        }

        let default_selector;
        let selector = match overrides.get(name) {
            Some(s) => s.as_str(),
            None => {
                default_selector = format!("[name='{name}']");
                &default_selector
            }
        };

        if let Err(e) = fill_one(page, frame, name, selector, value).await {
            warn!(target = "emrpilot.form", field = %name, error = %e, "field skipped");
        }
    }
}

async fn fill_one(
    page: &dyn PageDriver,
    frame: FrameId,
    name: &str,
    selector: &str,
    value: &FieldValue,
) -> crate::Result<()> {
    let Some(kind) = page.query(frame, selector).await? else {
        // No such element in this form; nothing to do.
        return Ok(());
    };

    match kind {
        ElementKind::Select => page.select_option(frame, selector, &value.as_text()).await,
        ElementKind::Checkbox => {
            if value.is_truthy() {
                page.check(frame, selector).await
            } else {
                // One-directional: never uncheck.
                Ok(())
            }
        }
        ElementKind::Text | ElementKind::Textarea => {
            page.fill(frame, selector, &value.as_text()).await
        }
    }
    .map(|_| {
        tracing::trace!(target = "emrpilot.form", field = %name, "filled");
    })
}

#[cfg(test)]
mod tests {
    use emrpilot_protocol::FrameId;

    use super::*;
    use crate::testing::MockPage;

    const FRAME: FrameId = FrameId(1);

    fn form(entries: &[(&str, FieldValue)]) -> FormData {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn dispatches_by_element_kind() {
        let page = MockPage::new()
            .with_element(FRAME, "[name='form_fname']", ElementKind::Text)
            .with_element(FRAME, "[name='form_notes']", ElementKind::Textarea)
            .with_element(FRAME, "[name='form_abook_type']", ElementKind::Select)
            .with_element(FRAME, "[name='form_active']", ElementKind::Checkbox);

        let fields = form(&[
            ("form_fname", "Ada".into()),
            ("form_notes", "Allergies: nuts".into()),
            ("form_abook_type", "oth".into()),
            ("form_active", true.into()),
        ]);
        fill_form(&page, FRAME, &fields, &SelectorOverrides::new()).await;

        assert_eq!(page.filled(), vec![
            (FRAME, "[name='form_fname']".into(), "Ada".into()),
            (FRAME, "[name='form_notes']".into(), "Allergies: nuts".into()),
        ]);
        assert_eq!(page.selected(), vec![(
            FRAME,
            "[name='form_abook_type']".into(),
            "oth".into()
        )]);
        assert_eq!(page.checked(), vec![(FRAME, "[name='form_active']".into())]);
    }

    #[tokio::test]
    async fn blank_values_and_missing_elements_are_skipped() {
        let page = MockPage::new().with_element(FRAME, "[name='form_lname']", ElementKind::Text);

        let fields = form(&[
            ("form_lname", "Lovelace".into()),
            ("form_mname", FieldValue::Empty),
            ("form_suffix", "".into()),
            ("form_missing", "value".into()),
        ]);
        fill_form(&page, FRAME, &fields, &SelectorOverrides::new()).await;

        assert_eq!(page.filled().len(), 1);
    }

    #[tokio::test]
    async fn selector_override_replaces_name_attribute_default() {
        let page = MockPage::new().with_element(FRAME, "#specialty", ElementKind::Text);

        let mut overrides = SelectorOverrides::new();
        overrides.insert("form_specialty".into(), "#specialty".into());

        let fields = form(&[("form_specialty", "Patient Contact".into())]);
        fill_form(&page, FRAME, &fields, &overrides).await;

        assert_eq!(page.filled()[0].1, "#specialty");
    }

    // Known limitation, preserved deliberately: a false flag leaves an
    // already-checked box checked because filling is one-directional.
    #[tokio::test]
    async fn false_flag_never_unchecks_a_checked_box() {
        let page = MockPage::new()
            .with_element(FRAME, "[name='form_active']", ElementKind::Checkbox)
            .with_checked_box(FRAME, "[name='form_active']");

        let fields = form(&[("form_active", false.into())]);
        fill_form(&page, FRAME, &fields, &SelectorOverrides::new()).await;

        assert!(page.is_checked(FRAME, "[name='form_active']"));
        assert!(page.checked().is_empty());
    }

    #[tokio::test]
    async fn engine_failure_on_one_field_does_not_abort_the_rest() {
        let page = MockPage::new()
            .with_element(FRAME, "[name='form_fname']", ElementKind::Text)
            .with_element(FRAME, "[name='form_lname']", ElementKind::Text)
            .with_failing_fill(FRAME, "[name='form_fname']");

        let fields = form(&[
            ("form_fname", "Ada".into()),
            ("form_lname", "Lovelace".into()),
        ]);
        fill_form(&page, FRAME, &fields, &SelectorOverrides::new()).await;

        assert_eq!(page.filled(), vec![(
            FRAME,
            "[name='form_lname']".into(),
            "Lovelace".into()
        )]);
    }
}
