// 🧾 Assignment Extractor - one letter/addendum → (auditor, interval) facts
//
// Rules:
// - Letter interval: audit_start_date → audit_end_date
// - Addendum interval: parent letter's END → addendum's own (new) end, so the
//   addendum bar continues where the letter bar stops. Orphans fall back to
//   their own start date.
// - Rejected records, missing dates and start > end drop the whole record
// - Team text: JSON array → comma list → single name; leader appended; deduped
// - Title tokens and noise drop only that member

use crate::names;
use crate::resolver::{EntityId, EntityResolver};
use crate::source::{Addendum, AssignmentStatus, Letter, Source, TeamField};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub const ADDENDUM_SUFFIX: &str = "(Addendum)";

// ============================================================================
// ASSIGNMENT
// ============================================================================

/// One (auditor, interval, source record) fact, drawn as one bar
///
/// Invariant: `start <= end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub entity: EntityId,
    pub entity_key: String,
    pub source_id: String,
    pub branch_label: String,
    pub letter_no: String,
    pub type_label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub status: AssignmentStatus,
    pub is_addendum: bool,
}

impl Assignment {
    /// Closed-interval intersection
    pub fn overlaps(&self, other: &Assignment) -> bool {
        !(self.end < other.start || self.start > other.end)
    }

    /// Whether any day of the assignment falls inside [view_start, view_end]
    pub fn intersects_window(&self, view_start: NaiveDate, view_end: NaiveDate) -> bool {
        self.start <= view_end && self.end >= view_start
    }

    pub fn duration_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

// ============================================================================
// SKIP REASONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    Rejected,
    MissingStartDate,
    MissingEndDate,
    StartAfterEnd { start: NaiveDate, end: NaiveDate },
    NoMembers,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Rejected => write!(f, "status is rejected"),
            SkipReason::MissingStartDate => write!(f, "missing or unparseable start date"),
            SkipReason::MissingEndDate => write!(f, "missing or unparseable end date"),
            SkipReason::StartAfterEnd { start, end } => {
                write!(f, "start {} is after end {}", start, end)
            }
            SkipReason::NoMembers => write!(f, "no usable team member names"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRecord {
    pub source_id: String,
    pub is_addendum: bool,
    pub reason: SkipReason,
}

// ============================================================================
// ASSIGNMENT EXTRACTOR
// ============================================================================

pub struct AssignmentExtractor<'a> {
    /// Letters keyed by letter number; the first letter with a number wins
    letters_by_no: HashMap<&'a str, &'a Letter>,
}

impl<'a> AssignmentExtractor<'a> {
    pub fn new(letters: &'a [Letter]) -> Self {
        let mut letters_by_no = HashMap::new();
        for letter in letters {
            if !letter.letter_no.is_empty() {
                letters_by_no.entry(letter.letter_no.as_str()).or_insert(letter);
            }
        }

        AssignmentExtractor { letters_by_no }
    }

    /// Letter amended by this addendum, if it is in the snapshot
    pub fn parent_of(&self, addendum: &Addendum) -> Option<&'a Letter> {
        self.letters_by_no
            .get(addendum.parent_letter_no.as_str())
            .copied()
    }

    /// Effective [start, end] of a record, before status filtering
    pub fn interval(&self, source: &Source) -> Result<(NaiveDate, NaiveDate), SkipReason> {
        let (start, end) = match source {
            Source::Letter(letter) => (letter.start, letter.end),
            Source::Addendum(addendum) => {
                let chained = self.parent_of(addendum).and_then(|parent| parent.end);
                if chained.is_none() {
                    tracing::debug!(
                        addendum = %addendum.id,
                        parent = %addendum.parent_letter_no,
                        "no parent letter end to chain from, using the addendum's own start date"
                    );
                }
                (chained.or(addendum.start), addendum.end)
            }
        };

        let start = start.ok_or(SkipReason::MissingStartDate)?;
        let end = end.ok_or(SkipReason::MissingEndDate)?;

        if start > end {
            return Err(SkipReason::StartAfterEnd { start, end });
        }

        Ok((start, end))
    }

    /// Raw member names for a record (team entries + leader, deduplicated)
    pub fn members(&self, source: &Source) -> Vec<String> {
        match source {
            Source::Letter(letter) => team_members(&letter.team, &letter.leader),
            Source::Addendum(addendum) => {
                if addendum.has_replacement_team() {
                    return team_members(&addendum.new_team, &addendum.new_leader);
                }
                if !addendum.team.is_blank() || !addendum.leader.trim().is_empty() {
                    return team_members(&addendum.team, &addendum.leader);
                }
                match self.parent_of(addendum) {
                    Some(parent) => team_members(&parent.team, &parent.leader),
                    None => Vec::new(),
                }
            }
        }
    }

    /// Turn one record into assignments, resolving its members as they are seen
    pub fn extract(
        &self,
        source: &Source,
        resolver: &mut EntityResolver,
    ) -> Result<Vec<Assignment>, SkipReason> {
        // Rejected and invalid records return before any member reaches the
        // resolver, so their names never seed or rename an entity
        if source.status().is_rejected() {
            return Err(SkipReason::Rejected);
        }

        let (start, end) = self.interval(source)?;

        let (branch_label, letter_no, type_label, is_addendum) = match source {
            Source::Letter(letter) => (
                letter.branch.clone(),
                letter.letter_no.clone(),
                letter.audit_type.clone().unwrap_or_else(|| "Letter".to_string()),
                false,
            ),
            Source::Addendum(addendum) => {
                let branch = if addendum.branch.is_empty() {
                    self.parent_of(addendum)
                        .map(|p| p.branch.clone())
                        .unwrap_or_default()
                } else {
                    addendum.branch.clone()
                };
                (
                    format!("{} {}", branch, ADDENDUM_SUFFIX).trim().to_string(),
                    addendum.letter_no.clone(),
                    addendum
                        .audit_type
                        .clone()
                        .unwrap_or_else(|| "Addendum".to_string()),
                    true,
                )
            }
        };

        let mut seen: Vec<EntityId> = Vec::new();
        let mut assignments = Vec::new();

        for member in self.members(source) {
            let Some(name) = names::normalize(&member) else {
                tracing::debug!(source = %source.id(), member = %member, "skipping title/noise token");
                continue;
            };

            let resolution = resolver.resolve(&name);
            if seen.contains(&resolution.entity) {
                continue;
            }
            seen.push(resolution.entity);

            let entity_key = resolver
                .entity(resolution.entity)
                .map(|e| e.key.clone())
                .unwrap_or_default();

            assignments.push(Assignment {
                entity: resolution.entity,
                entity_key,
                source_id: source.id().to_string(),
                branch_label: branch_label.clone(),
                letter_no: letter_no.clone(),
                type_label: type_label.clone(),
                start,
                end,
                status: source.status().clone(),
                is_addendum,
            });
        }

        if assignments.is_empty() {
            return Err(SkipReason::NoMembers);
        }

        Ok(assignments)
    }
}

// ============================================================================
// TEAM PARSING
// ============================================================================

/// Split a team field into raw names: JSON array → comma list → whole string
pub fn parse_team(team: &TeamField) -> Vec<String> {
    match team {
        TeamField::List(items) => items
            .iter()
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty())
            .collect(),
        TeamField::Text(text) => {
            if let Ok(items) = serde_json::from_str::<Vec<String>>(text.trim()) {
                return items
                    .into_iter()
                    .map(|i| i.trim().to_string())
                    .filter(|i| !i.is_empty())
                    .collect();
            }

            let parts: Vec<String> = text
                .split(',')
                .map(|p| {
                    p.trim_matches(|c: char| c.is_whitespace() || matches!(c, '[' | ']' | '"' | '\''))
                        .to_string()
                })
                .filter(|p| !p.is_empty())
                .collect();

            if parts.is_empty() {
                vec![text.trim().to_string()]
            } else {
                parts
            }
        }
    }
}

/// Team entries plus leader, deduplicated on whitespace/case-insensitive form
pub fn team_members(team: &TeamField, leader: &str) -> Vec<String> {
    let mut members = parse_team(team);
    if !leader.trim().is_empty() {
        members.push(leader.trim().to_string());
    }

    let mut seen: Vec<String> = Vec::new();
    members
        .into_iter()
        .filter(|m| {
            let folded = m.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
            if seen.contains(&folded) {
                false
            } else {
                seen.push(folded);
                true
            }
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
