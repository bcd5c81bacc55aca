use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Status value counted as "Active Now" on the overview card
pub const STATUS_ACTIVE: &str = "Active";

/// Status value counted as "On Deployment" on the overview card
pub const STATUS_ON_DEPLOYMENT: &str = "On Deployment";

/// Message shown when the add-personnel form is incomplete
pub const MISSING_FIELDS_MESSAGE: &str = "Please fill in all fields.";

/// Message shown when the append request itself failed
pub const ADD_FAILED_MESSAGE: &str = "Failed to add personnel. Please try again.";

/// One row of the Personnel sheet
///
/// Field names follow the header row of the sheet (`ID`, `Name`, `Rank`,
/// `Division`, `Status`). Every field is optional on the wire: absent or
/// `null` cells deserialize to an empty string and numeric cells keep their
/// JSON text, so a partially filled sheet still renders.
///
/// Columns the dashboard does not display are kept in `extra` and passed
/// through untouched by the JSON API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonnelRecord {
    /// Identifier assigned by the sheet (not checked for uniqueness)
    #[serde(rename = "ID", default, deserialize_with = "cell_text")]
    pub id: String,

    /// Display name
    #[serde(rename = "Name", default, deserialize_with = "cell_text")]
    pub name: String,

    /// Rank, one of the ranks configured in the sheet
    #[serde(rename = "Rank", default, deserialize_with = "cell_text")]
    pub rank: String,

    /// Division the member belongs to
    #[serde(rename = "Division", default, deserialize_with = "cell_text")]
    pub division: String,

    /// Free-form status ("Active", "On Deployment", ...)
    #[serde(rename = "Status", default, deserialize_with = "cell_text")]
    pub status: String,

    /// Any other column returned by the backend
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PersonnelRecord {
    /// Build a record from its five displayed fields
    pub fn new(id: &str, name: &str, rank: &str, division: &str, status: &str) -> Self {
        PersonnelRecord {
            id: id.to_string(),
            name: name.to_string(),
            rank: rank.to_string(),
            division: division.to_string(),
            status: status.to_string(),
            extra: Map::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == STATUS_ACTIVE
    }

    pub fn is_on_deployment(&self) -> bool {
        self.status == STATUS_ON_DEPLOYMENT
    }
}

// Sheet cells come back as strings, numbers, booleans or null depending on
// how the cell was typed in the spreadsheet.
fn cell_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

/// Add-personnel form data as submitted by the dashboard
///
/// Missing form fields are accepted as empty strings so that validation, not
/// the extractor, decides what the user sees.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonnelForm {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub rank: String,

    #[serde(default)]
    pub division: String,

    /// Discord handle (write-only, never displayed)
    #[serde(default)]
    pub discord: String,

    /// Roblox username (write-only, never displayed)
    #[serde(default, rename = "robloxUsername")]
    pub roblox_username: String,
}

/// Error returned when the add-personnel form is incomplete
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Please fill in all fields.")]
pub struct ValidationError {
    /// Wire names of the fields that were empty after trimming
    pub missing: Vec<&'static str>,
}

impl PersonnelForm {
    /// Validate the form
    ///
    /// Every field is trimmed and must be non-empty. The trimmed values are
    /// what gets sent to the sheet.
    ///
    /// # Returns
    /// * `Result<NewPersonnel, ValidationError>` - The cleaned entry, or the list of empty fields
    ///
    /// # Examples
    /// ```
    /// use personnel_dashboard::record::PersonnelForm;
    ///
    /// let form = PersonnelForm {
    ///     name: " Kovacs ".to_string(),
    ///     rank: "Ensign".to_string(),
    ///     division: "Ops".to_string(),
    ///     discord: "kovacs#0001".to_string(),
    ///     roblox_username: "   ".to_string(),
    /// };
    /// let err = form.validate().unwrap_err();
    /// assert_eq!(err.missing, vec!["robloxUsername"]);
    /// assert_eq!(err.to_string(), "Please fill in all fields.");
    /// ```
    pub fn validate(&self) -> Result<NewPersonnel, ValidationError> {
        let fields = [
            ("name", self.name.trim()),
            ("rank", self.rank.trim()),
            ("division", self.division.trim()),
            ("discord", self.discord.trim()),
            ("robloxUsername", self.roblox_username.trim()),
        ];

        let missing: Vec<&'static str> = fields
            .iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(key, _)| *key)
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError { missing });
        }

        Ok(NewPersonnel {
            name: fields[0].1.to_string(),
            rank: fields[1].1.to_string(),
            division: fields[2].1.to_string(),
            discord: fields[3].1.to_string(),
            roblox_username: fields[4].1.to_string(),
        })
    }
}

/// A validated add-personnel entry, ready to append to the sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPersonnel {
    pub name: String,
    pub rank: String,
    pub division: String,
    pub discord: String,
    pub roblox_username: String,
}

impl NewPersonnel {
    /// Form fields in the order the sheet backend expects them
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("name", self.name.as_str()),
            ("rank", self.rank.as_str()),
            ("division", self.division.as_str()),
            ("discord", self.discord.as_str()),
            ("robloxUsername", self.roblox_username.as_str()),
        ]
    }
}

/// Result of an append reported by the sheet backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The row was written
    Added,
    /// The backend answered `success: false`
    Rejected { message: String },
}

impl AppendOutcome {
    /// Interpret the backend's JSON answer
    ///
    /// `success` is read with JavaScript truthiness, since the Apps Script
    /// backend is not strict about its type. A rejection carries the
    /// backend's `message` when it is a non-empty string, otherwise the
    /// compact JSON of the whole answer.
    pub fn from_response(result: &Value) -> Self {
        let success = result.get("success").map(is_truthy).unwrap_or(false);
        if success {
            return AppendOutcome::Added;
        }

        let message = match result.get("message") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(other) if is_truthy(other) => other.to_string(),
            _ => result.to_string(),
        };
        AppendOutcome::Rejected { message }
    }
}

impl fmt::Display for AppendOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppendOutcome::Added => write!(f, "Personnel added successfully!"),
            AppendOutcome::Rejected { message } => {
                write!(f, "Error adding personnel: {}", message)
            }
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn record_reads_sheet_columns() {
        let raw = json!({
            "ID": "P1",
            "Name": "Kovacs",
            "Rank": "Ensign",
            "Division": "Ops",
            "Status": "Active",
            "Discord": "kovacs#0001"
        });
        let record: PersonnelRecord = serde_json::from_value(raw).unwrap();

        assert_eq!(record.id, "P1");
        assert_eq!(record.name, "Kovacs");
        assert_eq!(record.rank, "Ensign");
        assert_eq!(record.division, "Ops");
        assert_eq!(record.status, "Active");
        assert_eq!(record.extra.get("Discord"), Some(&json!("kovacs#0001")));
    }

    #[test]
    fn missing_and_typed_cells_become_text() {
        let raw = json!({ "ID": 17, "Name": null, "Status": true });
        let record: PersonnelRecord = serde_json::from_value(raw).unwrap();

        assert_eq!(record.id, "17");
        assert_eq!(record.name, "");
        assert_eq!(record.rank, "");
        assert_eq!(record.status, "true");
    }

    #[test]
    fn status_match_is_exact() {
        assert!(PersonnelRecord::new("1", "a", "r", "d", "Active").is_active());
        assert!(!PersonnelRecord::new("1", "a", "r", "d", "active").is_active());
        assert!(!PersonnelRecord::new("1", "a", "r", "d", "ACTIVE").is_active());
        assert!(PersonnelRecord::new("1", "a", "r", "d", "On Deployment").is_on_deployment());
        assert!(!PersonnelRecord::new("1", "a", "r", "d", "on deployment").is_on_deployment());
    }

    #[test]
    fn validate_trims_and_orders_fields() {
        let form = PersonnelForm {
            name: "  Reyes ".to_string(),
            rank: "Ensign".to_string(),
            division: "Ops".to_string(),
            discord: " reyes ".to_string(),
            roblox_username: "ReyesRBX".to_string(),
        };
        let entry = form.validate().unwrap();

        assert_eq!(
            entry.fields(),
            vec![
                ("name", "Reyes"),
                ("rank", "Ensign"),
                ("division", "Ops"),
                ("discord", "reyes"),
                ("robloxUsername", "ReyesRBX"),
            ]
        );
    }

    #[test]
    fn validate_reports_every_blank_field() {
        let form = PersonnelForm {
            name: "\t".to_string(),
            division: "Ops".to_string(),
            ..Default::default()
        };
        let err = form.validate().unwrap_err();

        assert_eq!(err.missing, vec!["name", "rank", "discord", "robloxUsername"]);
        assert_eq!(err.to_string(), MISSING_FIELDS_MESSAGE);
    }

    #[test]
    fn rejected_append_uses_backend_message() {
        let outcome = AppendOutcome::from_response(&json!({
            "success": false,
            "message": "duplicate ID"
        }));

        assert_eq!(
            outcome,
            AppendOutcome::Rejected {
                message: "duplicate ID".to_string()
            }
        );
        assert_eq!(outcome.to_string(), "Error adding personnel: duplicate ID");
    }

    #[test]
    fn rejected_append_without_message_shows_raw_result() {
        let outcome = AppendOutcome::from_response(&json!({ "success": false, "code": 7 }));

        assert_eq!(
            outcome.to_string(),
            r#"Error adding personnel: {"success":false,"code":7}"#
        );
    }

    #[test]
    fn truthy_success_counts_as_added() {
        assert_eq!(AppendOutcome::from_response(&json!({ "success": true })), AppendOutcome::Added);
        assert_eq!(AppendOutcome::from_response(&json!({ "success": "yes" })), AppendOutcome::Added);
        assert!(matches!(
            AppendOutcome::from_response(&json!({ "success": 0 })),
            AppendOutcome::Rejected { .. }
        ));
        assert!(matches!(
            AppendOutcome::from_response(&json!([])),
            AppendOutcome::Rejected { .. }
        ));
    }
}
