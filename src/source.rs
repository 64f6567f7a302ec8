// 📥 Assignment Sources - letters and addendums from the data layer
//
// Raw records arrive with the backend's column names and loose types
// (ids as numbers or strings, team as JSON array or text, dates in a few
// formats). They are validated here, once, into the tagged union
// `Source = Letter | Addendum` before the engine sees them.

use crate::error::{Result, TimelineError};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;

// ============================================================================
// FIELD TYPES
// ============================================================================

/// Team column: a real JSON array, or free text (JSON array text, comma list, one name)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TeamField {
    List(Vec<String>),
    Text(String),
}

impl Default for TeamField {
    fn default() -> Self {
        TeamField::Text(String::new())
    }
}

impl TeamField {
    pub fn is_blank(&self) -> bool {
        match self {
            TeamField::List(items) => items.iter().all(|i| i.trim().is_empty()),
            TeamField::Text(text) => text.trim().is_empty(),
        }
    }
}

impl From<&str> for TeamField {
    fn from(text: &str) -> Self {
        TeamField::Text(text.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentStatus {
    Pending,
    Approved,
    Rejected,
    Other(String),
}

impl AssignmentStatus {
    /// Case-insensitive parse; unknown values are kept verbatim
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "" | "pending" => AssignmentStatus::Pending,
            "approved" => AssignmentStatus::Approved,
            "rejected" => AssignmentStatus::Rejected,
            _ => AssignmentStatus::Other(raw.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AssignmentStatus::Pending => "pending",
            AssignmentStatus::Approved => "approved",
            AssignmentStatus::Rejected => "rejected",
            AssignmentStatus::Other(s) => s.as_str(),
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, AssignmentStatus::Rejected)
    }
}

// ============================================================================
// RAW RECORDS (backend shape)
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LetterRecord {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,

    #[serde(default)]
    pub branch_name: String,

    #[serde(default, deserialize_with = "string_or_number")]
    pub letter_number: String,

    #[serde(default)]
    pub audit_type: Option<String>,

    #[serde(default)]
    pub team: TeamField,

    #[serde(default)]
    pub leader: String,

    #[serde(default)]
    pub audit_start_date: Option<String>,

    #[serde(default)]
    pub audit_end_date: Option<String>,

    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddendumRecord {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,

    #[serde(default)]
    pub branch_name: String,

    #[serde(default, deserialize_with = "string_or_number")]
    pub letter_number: String,

    /// Letter number of the letter this addendum amends
    #[serde(default, deserialize_with = "string_or_number")]
    pub assignment_letter_before: String,

    #[serde(default)]
    pub audit_type: Option<String>,

    #[serde(default)]
    pub team: TeamField,

    #[serde(default)]
    pub leader: String,

    #[serde(default)]
    pub new_team: TeamField,

    #[serde(default)]
    pub new_leader: String,

    #[serde(default)]
    pub audit_start_date: Option<String>,

    /// The amended end date
    #[serde(default, alias = "new_audit_end_date")]
    pub audit_end_date: Option<String>,

    #[serde(default)]
    pub status: String,
}

// ============================================================================
// VALIDATED SOURCES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Letter {
    pub id: String,
    pub branch: String,
    pub letter_no: String,
    pub audit_type: Option<String>,
    pub team: TeamField,
    pub leader: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub status: AssignmentStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Addendum {
    pub id: String,
    pub branch: String,
    pub letter_no: String,
    pub parent_letter_no: String,
    pub audit_type: Option<String>,
    pub team: TeamField,
    pub leader: String,
    pub new_team: TeamField,
    pub new_leader: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub status: AssignmentStatus,
}

impl Addendum {
    /// True when the alternate team/leader pair carries anyone
    pub fn has_replacement_team(&self) -> bool {
        !self.new_team.is_blank() || !self.new_leader.trim().is_empty()
    }
}

impl From<LetterRecord> for Letter {
    fn from(record: LetterRecord) -> Self {
        Letter {
            id: record.id,
            branch: record.branch_name.trim().to_string(),
            letter_no: record.letter_number.trim().to_string(),
            audit_type: non_blank(record.audit_type),
            team: record.team,
            leader: record.leader,
            start: record.audit_start_date.as_deref().and_then(parse_date),
            end: record.audit_end_date.as_deref().and_then(parse_date),
            status: AssignmentStatus::parse(&record.status),
        }
    }
}

impl From<AddendumRecord> for Addendum {
    fn from(record: AddendumRecord) -> Self {
        Addendum {
            id: record.id,
            branch: record.branch_name.trim().to_string(),
            letter_no: record.letter_number.trim().to_string(),
            parent_letter_no: record.assignment_letter_before.trim().to_string(),
            audit_type: non_blank(record.audit_type),
            team: record.team,
            leader: record.leader,
            new_team: record.new_team,
            new_leader: record.new_leader,
            start: record.audit_start_date.as_deref().and_then(parse_date),
            end: record.audit_end_date.as_deref().and_then(parse_date),
            status: AssignmentStatus::parse(&record.status),
        }
    }
}

/// One assignment source, tagged by kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Source {
    Letter(Letter),
    Addendum(Addendum),
}

impl Source {
    pub fn id(&self) -> &str {
        match self {
            Source::Letter(l) => &l.id,
            Source::Addendum(a) => &a.id,
        }
    }

    pub fn status(&self) -> &AssignmentStatus {
        match self {
            Source::Letter(l) => &l.status,
            Source::Addendum(a) => &a.status,
        }
    }

    pub fn is_addendum(&self) -> bool {
        matches!(self, Source::Addendum(_))
    }
}

/// Letters first, then addendums; this is the order names are first seen in
pub fn sources(letters: &[Letter], addendums: &[Addendum]) -> Vec<Source> {
    letters
        .iter()
        .cloned()
        .map(Source::Letter)
        .chain(addendums.iter().cloned().map(Source::Addendum))
        .collect()
}

// ============================================================================
// LOADING
// ============================================================================

/// Load letters from a `.json` array or a `.csv` file with a header row
pub fn load_letters<P: AsRef<Path>>(path: P) -> Result<Vec<Letter>> {
    let records: Vec<LetterRecord> = load_records(path.as_ref())?;
    Ok(records.into_iter().map(Letter::from).collect())
}

/// Load addendums from a `.json` array or a `.csv` file with a header row
pub fn load_addendums<P: AsRef<Path>>(path: P) -> Result<Vec<Addendum>> {
    let records: Vec<AddendumRecord> = load_records(path.as_ref())?;
    Ok(records.into_iter().map(Addendum::from).collect())
}

fn load_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match extension.as_deref() {
        Some("json") => {
            let content = fs::read_to_string(path).map_err(|source| TimelineError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            serde_json::from_str(&content).map_err(|source| TimelineError::Json {
                path: path.to_path_buf(),
                source,
            })
        }
        Some("csv") => {
            let mut reader = csv::Reader::from_path(path).map_err(|source| TimelineError::Csv {
                path: path.to_path_buf(),
                source,
            })?;

            let mut records = Vec::new();
            for result in reader.deserialize() {
                let record: T = result.map_err(|source| TimelineError::Csv {
                    path: path.to_path_buf(),
                    source,
                })?;
                records.push(record);
            }
            Ok(records)
        }
        _ => Err(TimelineError::UnsupportedFormat(path.to_path_buf())),
    }
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Parse a backend date (YYYY-MM-DD, RFC 3339, "YYYY-MM-DD HH:MM:SS", MM/DD/YYYY)
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }

    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(ts.date());
    }

    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(ts.date());
    }

    NaiveDate::parse_from_str(raw, "%m/%d/%Y").ok()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Text(String),
    Int(i64),
    Float(f64),
}

/// Ids and letter numbers come as strings from CSV and sometimes as numbers from JSON
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<StringOrNumber>::deserialize(deserializer)?;
    Ok(match value {
        Some(StringOrNumber::Text(s)) => s,
        Some(StringOrNumber::Int(n)) => n.to_string(),
        Some(StringOrNumber::Float(f)) => f.to_string(),
        None => String::new(),
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-01-10"), Some(date(2024, 1, 10)));
        assert_eq!(parse_date("2024-01-10T08:30:00Z"), Some(date(2024, 1, 10)));
        assert_eq!(parse_date("2024-01-10T08:30:00+07:00"), Some(date(2024, 1, 10)));
        assert_eq!(parse_date("2024-01-10 08:30:00"), Some(date(2024, 1, 10)));
        assert_eq!(parse_date("01/10/2024"), Some(date(2024, 1, 10)));
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date("2024-02-30"), None);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(AssignmentStatus::parse("Rejected"), AssignmentStatus::Rejected);
        assert_eq!(AssignmentStatus::parse(" APPROVED "), AssignmentStatus::Approved);
        assert_eq!(AssignmentStatus::parse(""), AssignmentStatus::Pending);
        assert_eq!(
            AssignmentStatus::parse("draft"),
            AssignmentStatus::Other("draft".to_string())
        );
        assert!(AssignmentStatus::parse("REJECTED").is_rejected());
    }

    #[test]
    fn test_letter_from_json_with_array_team_and_numeric_id() {
        let json = r#"{
            "id": 7,
            "branch_name": " Cabang X ",
            "letter_number": "ST-001",
            "team": ["Budi Santoso", "Ani"],
            "leader": "Budi Santoso",
            "audit_start_date": "2024-01-10",
            "audit_end_date": "2024-01-15",
            "status": "approved"
        }"#;

        let record: LetterRecord = serde_json::from_str(json).unwrap();
        let letter = Letter::from(record);

        assert_eq!(letter.id, "7");
        assert_eq!(letter.branch, "Cabang X");
        assert_eq!(
            letter.team,
            TeamField::List(vec!["Budi Santoso".to_string(), "Ani".to_string()])
        );
        assert_eq!(letter.start, Some(date(2024, 1, 10)));
        assert_eq!(letter.end, Some(date(2024, 1, 15)));
        assert_eq!(letter.status, AssignmentStatus::Approved);
    }

    #[test]
    fn test_addendum_from_json_with_text_team() {
        let json = r#"{
            "id": "a-1",
            "branch_name": "Cabang X",
            "letter_number": "ADD-001",
            "assignment_letter_before": "ST-001",
            "team": "[\"Budi Santoso\",\"Ani\"]",
            "leader": "Budi Santoso",
            "new_audit_end_date": "2024-01-20",
            "status": "pending"
        }"#;

        let record: AddendumRecord = serde_json::from_str(json).unwrap();
        let addendum = Addendum::from(record);

        assert_eq!(addendum.parent_letter_no, "ST-001");
        assert_eq!(addendum.end, Some(date(2024, 1, 20)));
        assert_eq!(addendum.start, None);
        assert!(matches!(addendum.team, TeamField::Text(_)));
        assert!(!addendum.has_replacement_team());
    }

    #[test]
    fn test_load_letters_csv() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(
            file,
            "id,branch_name,letter_number,team,leader,audit_start_date,audit_end_date,status"
        )
        .unwrap();
        writeln!(
            file,
            "1,Cabang X,ST-001,\"Budi Santoso, Ani\",Budi Santoso,2024-01-10,2024-01-15,approved"
        )
        .unwrap();

        let letters = load_letters(file.path()).unwrap();
        assert_eq!(letters.len(), 1);
        assert_eq!(letters[0].letter_no, "ST-001");
        assert_eq!(letters[0].team, TeamField::from("Budi Santoso, Ani"));
        assert_eq!(letters[0].end, Some(date(2024, 1, 15)));
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        let err = load_letters(file.path()).unwrap_err();
        assert!(matches!(err, TimelineError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_sources_orders_letters_first() {
        let letter = Letter::from(LetterRecord {
            id: "1".to_string(),
            ..LetterRecord::default()
        });
        let addendum = Addendum::from(AddendumRecord {
            id: "2".to_string(),
            ..AddendumRecord::default()
        });

        let all = sources(&[letter], &[addendum]);
        assert_eq!(all.len(), 2);
        assert!(!all[0].is_addendum());
        assert!(all[1].is_addendum());
        assert_eq!(all[1].id(), "2");
    }
}
