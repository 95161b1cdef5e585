//! External profile records and their mapping onto the address-book form.

use serde::{Deserialize, Serialize};

use crate::form::{FieldValue, FormData};

/// One record from the external profile data file: a flat JSON object of
/// name, contact, and medical-note fields. Unknown keys are ignored; absent
/// keys deserialize to their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub email: String,
    pub phone: String,
    pub birth_date: Option<String>,
    pub additional_context: Option<String>,
    pub current_medications: Option<String>,
    pub allergies: Option<String>,
    pub past_medical_history: Option<String>,
}

impl Profile {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// The record's identifier, or a positional fallback for untagged rows.
    pub fn identifier(&self, index: usize) -> String {
        self.id.clone().unwrap_or_else(|| format!("row_{index}"))
    }
}

/// Maps a profile onto the address-book form's field names.
///
/// Entries land as type "other" with a fixed specialty; the clinical fields
/// are folded into the notes block. Absent clinical data yields an empty
/// notes string, not an absent field.
pub fn map_profile_to_address(profile: &Profile) -> FormData {
    let mut fields = FormData::new();
    fields.insert("form_abook_type".into(), "oth".into());
    fields.insert(
        "form_title".into(),
        title_for_gender(&profile.gender).into(),
    );
    fields.insert("form_fname".into(), profile.first_name.clone().into());
    fields.insert("form_lname".into(), profile.last_name.clone().into());
    fields.insert(
        "form_phonecell".into(),
        normalize_phone(&profile.phone).into(),
    );
    fields.insert("form_email".into(), profile.email.clone().into());
    fields.insert("form_specialty".into(), "Patient Contact".into());
    fields.insert(
        "form_notes".into(),
        FieldValue::Text(clinical_notes(profile)),
    );
    fields
}

/// Gender to salutation. Anything unrecognized maps to no title.
pub fn title_for_gender(gender: &str) -> &'static str {
    match gender {
        "male" => "Mr.",
        "female" => "Ms.",
        _ => "",
    }
}

/// Converts an Australian `+61` number to its domestic trunk form and strips
/// its spacing. Every other prefix passes through unchanged.
pub fn normalize_phone(raw: &str) -> String {
    if raw.starts_with("+61") {
        raw.replacen("+61", "0", 1).replace(' ', "")
    } else {
        raw.to_string()
    }
}

fn clinical_notes(profile: &Profile) -> String {
    let mut parts: Vec<String> = Vec::new();
    let labeled = [
        ("Context", &profile.additional_context),
        ("Medications", &profile.current_medications),
        ("Allergies", &profile.allergies),
        ("History", &profile.past_medical_history),
        ("DOB", &profile.birth_date),
    ];
    for (label, value) in labeled {
        if let Some(text) = value
            && !text.is_empty()
        {
            parts.push(format!("{label}: {text}"));
        }
    }
    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_profile() -> Profile {
        Profile {
            id: Some("p-001".into()),
            first_name: "Jessica".into(),
            last_name: "Nguyen".into(),
            gender: "female".into(),
            email: "jess@example.com".into(),
            phone: "+61 412 345 678".into(),
            ..Profile::default()
        }
    }

    #[test]
    fn female_gender_and_au_phone_map_to_title_and_trunk_form() {
        let fields = map_profile_to_address(&base_profile());
        assert_eq!(fields["form_title"], FieldValue::Text("Ms.".into()));
        assert_eq!(
            fields["form_phonecell"],
            FieldValue::Text("0412345678".into())
        );
    }

    #[test]
    fn non_au_prefixes_pass_through_unchanged() {
        assert_eq!(normalize_phone("+1 555 123 4567"), "+1 555 123 4567");
        assert_eq!(normalize_phone("555-123-4567"), "555-123-4567");
        assert_eq!(normalize_phone(""), "");
    }

    #[test]
    fn profile_without_clinical_data_maps_to_empty_notes() {
        let fields = map_profile_to_address(&base_profile());
        assert_eq!(fields["form_notes"], FieldValue::Text(String::new()));
    }

    #[test]
    fn clinical_fields_fold_into_labeled_note_lines() {
        let mut profile = base_profile();
        profile.allergies = Some("penicillin".into());
        profile.birth_date = Some("1988-03-14".into());

        let fields = map_profile_to_address(&profile);
        assert_eq!(
            fields["form_notes"],
            FieldValue::Text("Allergies: penicillin\nDOB: 1988-03-14".into())
        );
    }

    #[test]
    fn unknown_gender_maps_to_no_title() {
        let mut profile = base_profile();
        profile.gender = "other".into();
        let fields = map_profile_to_address(&profile);
        assert_eq!(fields["form_title"], FieldValue::Text(String::new()));
    }

    #[test]
    fn identifier_falls_back_to_positional_id() {
        let mut profile = base_profile();
        assert_eq!(profile.identifier(4), "p-001");
        profile.id = None;
        assert_eq!(profile.identifier(4), "row_4");
    }

    #[test]
    fn deserializes_from_flat_json_with_missing_fields() {
        let profile: Profile =
            serde_json::from_str(r#"{"first_name": "Sam", "last_name": "Okafor"}"#).unwrap();
        assert_eq!(profile.display_name(), "Sam Okafor");
        assert!(profile.birth_date.is_none());
    }
}
