//! Visit/encounter operations: create a visit, view the current one,
//! retrieve the visit history.

use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use emrpilot_protocol::{OperationResult, TableData};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::driver::{PageDriver, TOP_FRAME};
use crate::error::Result;
use crate::menu::navigate_menu;
use crate::poll::{Poller, Scope, Target};

const FINDER_SETTLE: Duration = Duration::from_secs(5);
const PATIENT_SETTLE: Duration = Duration::from_secs(4);
const FORM_LOAD_SETTLE: Duration = Duration::from_secs(2);
const SAVE_SETTLE: Duration = Duration::from_secs(4);
const DROPDOWN_SETTLE: Duration = Duration::from_secs(1);
const ENCOUNTER_SETTLE: Duration = Duration::from_secs(3);
const FIELD_SETTLE: Duration = Duration::from_millis(300);

/// The encounter form renders with any of these, depending on the EMR skin.
const SAVE_BUTTON: &str = "#save-form, input[name='form_save'], button[type='submit']";
const CATEGORY_SELECT: &str = "select[name*='category'], #pc_catid";
const REASON_INPUT: &str = "textarea[name*='reason'], #reason";
const ENCOUNTER_OPTIONS: &str = ".dropdown-item, .dropdown-menu a";
const REASON_ELEMENT: &str = "[class*='reason'], .visit-reason";

/// Details for a new encounter. Blank fields are left at the form defaults.
#[derive(Debug, Clone, Default)]
pub struct VisitData {
    pub category: String,
    pub reason: String,
}

/// One row of a patient's visit history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitRecord {
    pub date: String,
    pub issue: String,
    pub reason_form: String,
    pub provider: String,
    pub billing: String,
}

/// Free-text facts pulled off the current-visit view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoapNotes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subjective: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
}

/// Visit automation over an already logged-in page.
pub struct Visits<'a> {
    page: &'a dyn PageDriver,
    poller: Poller,
}

impl<'a> Visits<'a> {
    pub fn new(page: &'a dyn PageDriver) -> Self {
        Self {
            page,
            poller: Poller::default(),
        }
    }

    pub fn with_poller(page: &'a dyn PageDriver, poller: Poller) -> Self {
        Self { page, poller }
    }

    /// Selects a patient through the Finder: opens it, then polls every
    /// frame for a link carrying the patient's name. The finder frame loads
    /// asynchronously, hence the bounded retry.
    pub async fn select_patient(&self, patient: &str) -> bool {
        if self.page.click_text("Finder").await.is_err() {
            debug!(target = "emrpilot.visits", "Finder entry not clickable");
            return false;
        }
        self.page.sleep(FINDER_SETTLE).await;

        for attempt in 1..=self.poller.max_attempts {
            if let Ok(frames) = self.page.frames().await {
                for frame in frames {
                    if self
                        .page
                        .click_link_by_text(frame.id, patient)
                        .await
                        .unwrap_or(false)
                    {
                        info!(target = "emrpilot.visits", patient, attempt, "patient selected");
                        self.page.sleep(PATIENT_SETTLE).await;
                        return true;
                    }
                }
            }
            if attempt < self.poller.max_attempts {
                self.page.sleep(self.poller.interval).await;
            }
        }
        false
    }

    /// Creates a new encounter for `patient`.
    pub async fn create(
        &self,
        patient: &str,
        data: &VisitData,
        screenshot_dir: Option<&Path>,
    ) -> OperationResult {
        match self.create_inner(patient, data, screenshot_dir).await {
            Ok(result) => result,
            Err(e) => OperationResult::failed(e.to_string()),
        }
    }

    async fn create_inner(
        &self,
        patient: &str,
        data: &VisitData,
        screenshot_dir: Option<&Path>,
    ) -> Result<OperationResult> {
        if !self.select_patient(patient).await {
            return Ok(OperationResult::failed(format!(
                "Patient '{patient}' not found"
            )));
        }

        if !navigate_menu(self.page, &["Patient", "Visits", "Create Visit"]).await {
            return Ok(OperationResult::failed(
                "Create Visit menu item not available",
            ));
        }
        self.page.sleep(FORM_LOAD_SETTLE).await;

        let Some(found) = self
            .poller
            .resolve(self.page, Scope::AllFrames, Target::Css(SAVE_BUTTON))
            .await
        else {
            return Ok(OperationResult::failed(
                "Encounter form not found in any frame",
            ));
        };
        let frame = found.frame();

        if !data.category.is_empty() && self.page.query(frame, CATEGORY_SELECT).await?.is_some() {
            self.page
                .select_option(frame, CATEGORY_SELECT, &data.category)
                .await?;
            self.page.sleep(FIELD_SETTLE).await;
        }
        if !data.reason.is_empty() && self.page.query(frame, REASON_INPUT).await?.is_some() {
            self.page.fill(frame, REASON_INPUT, &data.reason).await?;
            self.page.sleep(FIELD_SETTLE).await;
        }

        self.page.click(frame, SAVE_BUTTON).await?;
        self.page.sleep(SAVE_SETTLE).await;

        let screenshot = self
            .capture(screenshot_dir, "create_visit_result.png")
            .await;
        Ok(OperationResult::ok_with(
            "Encounter created successfully",
            json!({ "screenshot_path": screenshot }),
        ))
    }

    /// Opens the current (active) encounter and extracts what it shows.
    pub async fn current(
        &self,
        patient: &str,
        encounter_date: Option<&str>,
        screenshot_dir: Option<&Path>,
    ) -> OperationResult {
        match self
            .current_inner(patient, encounter_date, screenshot_dir)
            .await
        {
            Ok(result) => result,
            Err(e) => OperationResult::failed(e.to_string()),
        }
    }

    async fn current_inner(
        &self,
        patient: &str,
        encounter_date: Option<&str>,
        screenshot_dir: Option<&Path>,
    ) -> Result<OperationResult> {
        if !self.select_patient(patient).await {
            return Ok(OperationResult::failed(format!(
                "Patient '{patient}' not found"
            )));
        }

        let selected = match self.select_encounter(encounter_date).await? {
            Ok(label) => label,
            Err(result) => return Ok(result),
        };

        if !navigate_menu(self.page, &["Patient", "Visits", "Current"]).await {
            return Ok(OperationResult::failed(
                "Current menu item not available (encounter may not be selected)",
            ));
        }

        let mut summary: Option<VisitSummary> = None;
        let mut soap: Option<SoapNotes> = None;
        for frame in self.page.frames().await.unwrap_or_default() {
            let Ok(text) = self.page.inner_text(frame.id).await else {
                continue;
            };
            if summary.is_none() {
                let mut extracted = extract_visit_summary(&text);
                if let Some(s) = extracted.as_mut()
                    && s.reason.is_none()
                    && let Ok(reasons) = self.page.texts(frame.id, REASON_ELEMENT).await
                {
                    s.reason = reasons.into_iter().find(|r| !r.is_empty());
                }
                summary = extracted;
            }
            if soap.is_none() {
                soap = extract_soap(&text);
            }
        }

        let screenshot = self.capture(screenshot_dir, "current_visit.png").await;
        Ok(OperationResult::ok_with(
            "Current visit loaded successfully",
            json!({
                "encounter_date": selected,
                "visit_summary": summary,
                "soap_notes": soap,
                "screenshot_path": screenshot,
            }),
        ))
    }

    /// Retrieves the visit-history table for `patient`.
    pub async fn history(&self, patient: &str, screenshot_dir: Option<&Path>) -> OperationResult {
        match self.history_inner(patient, screenshot_dir).await {
            Ok(result) => result,
            Err(e) => OperationResult::failed(e.to_string()),
        }
    }

    async fn history_inner(
        &self,
        patient: &str,
        screenshot_dir: Option<&Path>,
    ) -> Result<OperationResult> {
        if !self.select_patient(patient).await {
            return Ok(OperationResult::failed(format!(
                "Patient '{patient}' not found"
            )));
        }

        if !navigate_menu(self.page, &["Patient", "Visits", "Visit History"]).await {
            return Ok(OperationResult::failed(
                "Visit History menu item not available",
            ));
        }

        let mut visits: Vec<VisitRecord> = Vec::new();
        for frame in self.page.frames().await.unwrap_or_default() {
            if let Ok(Some(table)) = self.page.table_rows(frame.id, "Date").await {
                visits = parse_visit_table(&table);
                if !visits.is_empty() {
                    break;
                }
            }
        }

        let screenshot = self.capture(screenshot_dir, "visit_history.png").await;
        Ok(OperationResult::ok_with(
            format!("Found {} visit(s)", visits.len()),
            json!({
                "patient": patient,
                "total_visits": visits.len(),
                "visits": visits,
                "screenshot_path": screenshot,
            }),
        ))
    }

    /// Opens the encounter dropdown and picks either the requested date or
    /// the first entry that looks like one. `Err` carries the failed result.
    async fn select_encounter(
        &self,
        encounter_date: Option<&str>,
    ) -> Result<std::result::Result<String, OperationResult>> {
        let Some(hit) = self
            .page
            .locate_by_text(TOP_FRAME, "Select Encounter")
            .await?
        else {
            return Ok(Err(OperationResult::failed(
                "Select Encounter button not found",
            )));
        };
        self.page.mouse_click(hit.x, hit.y).await?;
        self.page.sleep(DROPDOWN_SETTLE).await;

        let options = self.page.texts(TOP_FRAME, ENCOUNTER_OPTIONS).await?;
        if options.is_empty() {
            return Ok(Err(OperationResult::failed(
                "No encounter dropdown options found",
            )));
        }

        let chosen = options.iter().enumerate().find(|(_, text)| {
            match encounter_date {
                Some(date) => text.contains(date),
                // Anything with a year in it counts as an encounter entry.
                None => text.contains("20"),
            }
        });
        let Some((index, label)) = chosen else {
            return Ok(Err(OperationResult::failed(
                "No encounters available to select",
            )));
        };

        self.page
            .click_nth(TOP_FRAME, ENCOUNTER_OPTIONS, index)
            .await?;
        self.page.sleep(ENCOUNTER_SETTLE).await;
        Ok(Ok(label.trim().to_string()))
    }

    async fn capture(&self, dir: Option<&Path>, file_name: &str) -> Option<String> {
        let path = dir?.join(file_name);
        match self.page.screenshot(&path, false).await {
            Ok(()) => Some(path.display().to_string()),
            Err(e) => {
                debug!(target = "emrpilot.visits", error = %e, "screenshot skipped");
                None
            }
        }
    }
}

/// Keeps only rows that actually carry a visit: at least a date plus the
/// issue/reason/provider cells, with the date in ISO form (calendar widgets
/// leave stray single-letter rows behind).
pub fn parse_visit_table(table: &TableData) -> Vec<VisitRecord> {
    static DATE: OnceLock<Regex> = OnceLock::new();
    let date_re = DATE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid pattern"));

    table
        .rows
        .iter()
        .filter(|cells| cells.len() >= 4 && date_re.is_match(&cells[0]))
        .map(|cells| VisitRecord {
            date: cells[0].clone(),
            issue: cells[1].clone(),
            reason_form: cells[2].clone(),
            provider: cells[3].clone(),
            billing: cells.get(4).cloned().unwrap_or_default(),
        })
        .collect()
}

/// Pulls provider and patient-type facts out of the rendered text. `None`
/// when nothing matched (the frame is not the visit view).
pub fn extract_visit_summary(text: &str) -> Option<VisitSummary> {
    static PROVIDER: OnceLock<Regex> = OnceLock::new();
    static PATIENT_TYPE: OnceLock<Regex> = OnceLock::new();

    let provider_re = PROVIDER.get_or_init(|| {
        Regex::new(r"(?i)(?:Provider|by)\s*[:\-]?\s*([A-Za-z][A-Za-z ,.]*)").expect("valid pattern")
    });
    let patient_type_re = PATIENT_TYPE.get_or_init(|| {
        Regex::new(r"(?i)(Established Patient|New Patient)").expect("valid pattern")
    });

    let summary = VisitSummary {
        reason: None,
        provider: provider_re
            .captures(text)
            .map(|c| c[1].trim().to_string()),
        patient_type: patient_type_re.captures(text).map(|c| c[1].to_string()),
    };

    (summary.provider.is_some() || summary.patient_type.is_some()).then_some(summary)
}

/// Extracts the four SOAP note lines. `None` when no section matched.
pub fn extract_soap(text: &str) -> Option<SoapNotes> {
    fn section(text: &str, re: &Regex) -> Option<String> {
        re.captures(text).map(|c| c[1].trim().to_string())
    }

    static SUBJECTIVE: OnceLock<Regex> = OnceLock::new();
    static OBJECTIVE: OnceLock<Regex> = OnceLock::new();
    static ASSESSMENT: OnceLock<Regex> = OnceLock::new();
    static PLAN: OnceLock<Regex> = OnceLock::new();

    let notes = SoapNotes {
        subjective: section(
            text,
            SUBJECTIVE
                .get_or_init(|| Regex::new(r"(?i)Subjective[:\s]+([^\n]+)").expect("valid pattern")),
        ),
        objective: section(
            text,
            OBJECTIVE
                .get_or_init(|| Regex::new(r"(?i)Objective[:\s]+([^\n]+)").expect("valid pattern")),
        ),
        assessment: section(
            text,
            ASSESSMENT
                .get_or_init(|| Regex::new(r"(?i)Assessment[:\s]+([^\n]+)").expect("valid pattern")),
        ),
        plan: section(
            text,
            PLAN.get_or_init(|| Regex::new(r"(?i)Plan[:\s]+([^\n]+)").expect("valid pattern")),
        ),
    };

    (notes.subjective.is_some()
        || notes.objective.is_some()
        || notes.assessment.is_some()
        || notes.plan.is_some())
    .then_some(notes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visit_table_rows_are_filtered_by_date_shape() {
        let table = TableData {
            headers: vec![
                "Date".into(),
                "Issue".into(),
                "Reason/Form".into(),
                "Provider".into(),
                "Billing".into(),
            ],
            rows: vec![
                vec![
                    "2014-02-01".into(),
                    "Hypertension".into(),
                    "Checkup".into(),
                    "Dr. Smith".into(),
                    "Paid".into(),
                ],
                // Calendar-widget residue and short rows must be dropped.
                vec!["M".into(), "".into(), "".into(), "".into()],
                vec!["2014-03-15".into(), "Follow-up".into()],
                vec![
                    "2015-07-09".into(),
                    "".into(),
                    "New visit".into(),
                    "Dr. Jones".into(),
                ],
            ],
        };

        let visits = parse_visit_table(&table);
        assert_eq!(visits.len(), 2);
        assert_eq!(visits[0].date, "2014-02-01");
        assert_eq!(visits[0].billing, "Paid");
        assert_eq!(visits[1].provider, "Dr. Jones");
        assert_eq!(visits[1].billing, "");
    }

    #[test]
    fn soap_sections_come_out_line_by_line() {
        let text = "Encounter 2014-02-01\nSubjective: headache for 3 days\nObjective: BP 130/85\nAssessment: tension headache\nPlan: hydration, follow up in 2 weeks\n";
        let notes = extract_soap(text).unwrap();
        assert_eq!(notes.subjective.as_deref(), Some("headache for 3 days"));
        assert_eq!(notes.plan.as_deref(), Some("hydration, follow up in 2 weeks"));
    }

    #[test]
    fn soap_extraction_yields_none_on_unrelated_text() {
        assert!(extract_soap("Patient demographics and billing only").is_none());
    }

    #[test]
    fn visit_summary_picks_up_provider_and_patient_type() {
        let text = "Established Patient seen by: Dr. Alice Wong\n";
        let summary = extract_visit_summary(text).unwrap();
        assert_eq!(summary.provider.as_deref(), Some("Dr. Alice Wong"));
        assert_eq!(summary.patient_type.as_deref(), Some("Established Patient"));
    }
}
