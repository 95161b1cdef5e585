//! Address-book operations: add a single entry, bulk-import profiles.

use std::time::Duration;

use emrpilot_protocol::OperationResult;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::driver::PageDriver;
use crate::error::Result;
use crate::form::{FormData, SelectorOverrides, fill_form};
use crate::frames::find_frame;
use crate::profile::{Profile, map_profile_to_address};

pub const LIST_FRAME_MARKER: &str = "addrbook_list";
pub const EDIT_FRAME_MARKER: &str = "addrbook_edit";

const ADD_BUTTON: &str = "input[value='Add New']";
const SAVE_BUTTON: &str = "input[name='form_save']";
const ERROR_INDICATOR: &str = ".error-message, .alert-danger";

const FORM_SETTLE: Duration = Duration::from_secs(2);
const FIELD_SETTLE: Duration = Duration::from_millis(500);
const IMPORT_PACING: Duration = Duration::from_secs(1);

/// Outcome of one bulk import: the tally plus a per-record detail list.
///
/// `success + failed == total` and `details` carries exactly one entry per
/// input record, tagged with the record's id or its positional fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub details: Vec<ImportDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportDetail {
    pub profile_id: String,
    pub name: String,
    pub result: OperationResult,
}

/// Address-book automation over an already logged-in page that is showing
/// the address-book view.
pub struct AddressBook<'a> {
    page: &'a dyn PageDriver,
}

impl<'a> AddressBook<'a> {
    pub fn new(page: &'a dyn PageDriver) -> Self {
        Self { page }
    }

    /// Adds one entry and verifies it landed in the list view.
    pub async fn add_entry(&self, fields: &FormData) -> OperationResult {
        match self.add_entry_inner(fields).await {
            Ok(result) => result,
            Err(e) => OperationResult::failed(e.to_string()),
        }
    }

    async fn add_entry_inner(&self, fields: &FormData) -> Result<OperationResult> {
        let edit = match self.open_add_form().await? {
            FormAccess::Form(frame) => frame,
            FormAccess::Failed(result) => return Ok(result),
        };

        fill_form(self.page, edit, fields, &SelectorOverrides::new()).await;
        self.page.sleep(FIELD_SETTLE).await;

        if self.page.query(edit, SAVE_BUTTON).await?.is_none() {
            return Ok(OperationResult::failed("Save button not found"));
        }
        self.page.click(edit, SAVE_BUTTON).await?;
        self.page.sleep(FORM_SETTLE).await;

        // Saving returns to the list view; the surest confirmation is the
        // new last name showing up there.
        let last_name = field_text(fields, "form_lname");
        if !last_name.is_empty()
            && let Some(list) = find_frame(self.page, LIST_FRAME_MARKER).await
            && self.page.content(list.id).await?.contains(&last_name)
        {
            return Ok(OperationResult::ok_with(
                format!("Added entry: {}", entry_name(fields)),
                json!(fields),
            ));
        }

        // Not in the list; the edit form may be reporting a validation error.
        if let Some(edit) = find_frame(self.page, EDIT_FRAME_MARKER).await
            && self.page.query(edit.id, ERROR_INDICATOR).await?.is_some()
        {
            let messages = self.page.texts(edit.id, ERROR_INDICATOR).await?;
            let message = messages.first().cloned().unwrap_or_default();
            return Ok(OperationResult::failed(format!("Form error: {message}")));
        }

        Ok(OperationResult::ok_with(
            format!("Entry likely added: {}", entry_name(fields)),
            json!(fields),
        ))
    }

    /// Adds one entry without the post-save verification; the bulk importer
    /// trades certainty for throughput and tallies failures instead.
    async fn import_single(&self, fields: &FormData) -> Result<OperationResult> {
        let edit = match self.open_add_form().await? {
            FormAccess::Form(frame) => frame,
            FormAccess::Failed(result) => return Ok(result),
        };

        fill_form(self.page, edit, fields, &SelectorOverrides::new()).await;
        self.page.sleep(FIELD_SETTLE).await;

        if self.page.query(edit, SAVE_BUTTON).await?.is_some() {
            self.page.click(edit, SAVE_BUTTON).await?;
            self.page.sleep(FORM_SETTLE).await;
        }

        Ok(OperationResult::ok_with(
            format!("Added: {}", entry_name(fields)),
            json!(fields),
        ))
    }

    /// Imports every profile, keeping the tally across per-record failures.
    /// `on_record` fires after each record with its index and result.
    pub async fn import_all(
        &self,
        profiles: &[Profile],
        mut on_record: impl FnMut(usize, &Profile, &OperationResult),
    ) -> ImportOutcome {
        let mut outcome = ImportOutcome {
            total: profiles.len(),
            success: 0,
            failed: 0,
            details: Vec::with_capacity(profiles.len()),
        };

        for (i, profile) in profiles.iter().enumerate() {
            info!(
                target = "emrpilot.import",
                record = i + 1,
                total = profiles.len(),
                name = %profile.display_name(),
                "importing"
            );

            let fields = map_profile_to_address(profile);
            let result = match self.import_single(&fields).await {
                Ok(result) => result,
                Err(e) => OperationResult::failed(e.to_string()),
            };

            if result.success {
                outcome.success += 1;
            } else {
                outcome.failed += 1;
            }
            on_record(i, profile, &result);
            outcome.details.push(ImportDetail {
                profile_id: profile.identifier(i),
                name: profile.display_name(),
                result,
            });

            self.page.sleep(IMPORT_PACING).await;
        }

        outcome
    }

    /// Clicks through from the list view to a fresh add form.
    async fn open_add_form(&self) -> Result<FormAccess> {
        let Some(list) = find_frame(self.page, LIST_FRAME_MARKER).await else {
            return Ok(FormAccess::Failed(OperationResult::failed(
                "Address book list frame not found",
            )));
        };
        if self.page.query(list.id, ADD_BUTTON).await?.is_none() {
            return Ok(FormAccess::Failed(OperationResult::failed(
                "Add New button not found",
            )));
        }
        self.page.click(list.id, ADD_BUTTON).await?;
        self.page.sleep(FORM_SETTLE).await;

        match find_frame(self.page, EDIT_FRAME_MARKER).await {
            Some(edit) => Ok(FormAccess::Form(edit.id)),
            None => Ok(FormAccess::Failed(OperationResult::failed(
                "Add form frame not found",
            ))),
        }
    }
}

enum FormAccess {
    Form(emrpilot_protocol::FrameId),
    Failed(OperationResult),
}

fn field_text(fields: &FormData, name: &str) -> String {
    fields.get(name).map(|v| v.as_text()).unwrap_or_default()
}

fn entry_name(fields: &FormData) -> String {
    format!(
        "{} {}",
        field_text(fields, "form_fname"),
        field_text(fields, "form_lname")
    )
}
