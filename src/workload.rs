// 📊 Workload Summary - per-auditor load inside a date window
//
// Counts are taken over assignments intersecting the window; busy days are
// clipped to the window and counted once even when assignments overlap.

use crate::extractor::Assignment;
use crate::timeline::TimelineIndex;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityWorkload {
    pub entity_key: String,
    pub display_name: String,
    pub assignment_count: usize,
    pub addendum_count: usize,
    /// Distinct days inside the window with at least one assignment
    pub busy_days: i64,
    /// Largest number of assignments running on the same day
    pub peak_concurrent: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadSummary {
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub window_days: i64,
    /// Busiest first, then by name
    pub entities: Vec<EntityWorkload>,
}

impl WorkloadSummary {
    /// Summarize every entity with at least one assignment in [start, end]
    ///
    /// A reversed window is swapped rather than rejected.
    pub fn for_window(index: &TimelineIndex, start: NaiveDate, end: NaiveDate) -> Self {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };

        let mut entities: Vec<EntityWorkload> = index
            .entities_by_name()
            .into_iter()
            .filter_map(|id| {
                let entity = index.resolver().entity(id)?;
                let visible: Vec<&Assignment> = index
                    .assignments_for(id)
                    .into_iter()
                    .filter(|a| a.intersects_window(start, end))
                    .collect();

                if visible.is_empty() {
                    return None;
                }

                Some(EntityWorkload {
                    entity_key: entity.key.clone(),
                    display_name: entity.display_name.clone(),
                    assignment_count: visible.len(),
                    addendum_count: visible.iter().filter(|a| a.is_addendum).count(),
                    busy_days: busy_days(&visible, start, end),
                    peak_concurrent: peak_concurrent(&visible),
                })
            })
            .collect();

        // Stable sort keeps alphabetical order among equals
        entities.sort_by(|a, b| b.busy_days.cmp(&a.busy_days));

        WorkloadSummary {
            window_start: start,
            window_end: end,
            window_days: (end - start).num_days() + 1,
            entities,
        }
    }

    /// Share of the window an entity is busy, 0.0 - 1.0
    pub fn utilization(&self, display_name: &str) -> Option<f64> {
        self.entities
            .iter()
            .find(|e| e.display_name == display_name)
            .map(|e| e.busy_days as f64 / self.window_days as f64)
    }
}

/// Days covered by the union of intervals, clipped to the window
fn busy_days(assignments: &[&Assignment], start: NaiveDate, end: NaiveDate) -> i64 {
    let mut spans: Vec<(NaiveDate, NaiveDate)> = assignments
        .iter()
        .map(|a| (a.start.max(start), a.end.min(end)))
        .collect();
    spans.sort();

    let mut total = 0;
    let mut current: Option<(NaiveDate, NaiveDate)> = None;

    for (s, e) in spans {
        current = match current {
            Some((cs, ce)) if s <= ce + Duration::days(1) => Some((cs, ce.max(e))),
            Some((cs, ce)) => {
                total += (ce - cs).num_days() + 1;
                Some((s, e))
            }
            None => Some((s, e)),
        };
    }

    if let Some((cs, ce)) = current {
        total += (ce - cs).num_days() + 1;
    }

    total
}

/// Sweep over start/end events; ends are exclusive the day after
fn peak_concurrent(assignments: &[&Assignment]) -> usize {
    let mut events: Vec<(NaiveDate, i32)> = Vec::with_capacity(assignments.len() * 2);
    for a in assignments {
        events.push((a.start, 1));
        events.push((a.end + Duration::days(1), -1));
    }
    // Ends sort before starts on the same day
    events.sort();

    let mut running = 0i32;
    let mut peak = 0i32;
    for (_, delta) in events {
        running += delta;
        peak = peak.max(running);
    }

    peak as usize
}
