// 🗓️ Auditor Timeline - the full pipeline
//
// Per data refresh:   sources → names → entities → assignments   (TimelineIndex::build)
// Per view change:    axis → positions → packed rows per entity  (TimelineIndex::layout)
//
// Both halves are pure over their inputs. The only state that outlives a call
// is what the caller chooses to keep: the index itself and an optional
// LayoutCache.

use crate::axis::{Column, TimeAxis, ViewMode};
use crate::config::TimelineConfig;
use crate::extractor::{Assignment, AssignmentExtractor, SkipReason, SkippedRecord};
use crate::layout::{layout_track, EntityTrack};
use crate::resolver::{EntityId, EntityResolver};
use crate::source::{self, Addendum, Letter};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

// ============================================================================
// TIMELINE LAYOUT (renderer-facing output)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineLayout {
    pub mode: ViewMode,
    pub columns: Vec<Column>,
    pub column_width: u32,
    pub total_width: u32,
    /// Sorted by display name, case-insensitive
    pub tracks: Vec<EntityTrack>,
}

impl TimelineLayout {
    pub fn track(&self, display_name: &str) -> Option<&EntityTrack> {
        self.tracks.iter().find(|t| t.display_name == display_name)
    }

    pub fn total_height(&self) -> u32 {
        self.tracks.iter().map(|t| t.track_height).sum()
    }
}

// ============================================================================
// TIMELINE INDEX
// ============================================================================

/// Resolved entities and their assignments for one data snapshot
#[derive(Debug, Clone, Default)]
pub struct TimelineIndex {
    resolver: EntityResolver,
    assignments: Vec<Assignment>,
    skipped: Vec<SkippedRecord>,
    record_count: usize,
}

impl TimelineIndex {
    /// Resolve names and extract assignments from letters then addendums
    pub fn build(letters: &[Letter], addendums: &[Addendum]) -> Self {
        let extractor = AssignmentExtractor::new(letters);
        let mut resolver = EntityResolver::new();
        let mut assignments = Vec::new();
        let mut skipped = Vec::new();

        let all = source::sources(letters, addendums);
        for record in &all {
            match extractor.extract(record, &mut resolver) {
                Ok(mut extracted) => assignments.append(&mut extracted),
                Err(reason) => {
                    match reason {
                        SkipReason::Rejected | SkipReason::NoMembers => {
                            tracing::debug!(source = %record.id(), %reason, "skipping record");
                        }
                        _ => {
                            tracing::warn!(source = %record.id(), %reason, "skipping record");
                        }
                    }
                    skipped.push(SkippedRecord {
                        source_id: record.id().to_string(),
                        is_addendum: record.is_addendum(),
                        reason,
                    });
                }
            }
        }

        tracing::info!(
            records = all.len(),
            assignments = assignments.len(),
            entities = resolver.len(),
            skipped = skipped.len(),
            "timeline index built"
        );

        TimelineIndex {
            resolver,
            assignments,
            skipped,
            record_count: all.len(),
        }
    }

    pub fn resolver(&self) -> &EntityResolver {
        &self.resolver
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// One entity's assignments in extraction order
    pub fn assignments_for(&self, entity: EntityId) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.entity == entity)
            .collect()
    }

    pub fn skipped(&self) -> &[SkippedRecord] {
        &self.skipped
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Entity ids sorted by display name (case-insensitive, then exact)
    pub fn entities_by_name(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.resolver.ids().collect();
        ids.sort_by(|a, b| {
            let name_a = self.resolver.display_name(*a).unwrap_or_default();
            let name_b = self.resolver.display_name(*b).unwrap_or_default();
            name_a
                .to_lowercase()
                .cmp(&name_b.to_lowercase())
                .then_with(|| name_a.cmp(name_b))
        });
        ids
    }

    /// Lay out every entity for a view mode, using the local date for fallbacks
    pub fn layout_now(&self, mode: ViewMode, config: &TimelineConfig) -> TimelineLayout {
        self.layout(mode, config, Local::now().date_naive())
    }

    /// Lay out every entity for a view mode
    pub fn layout(&self, mode: ViewMode, config: &TimelineConfig, today: NaiveDate) -> TimelineLayout {
        let axis = TimeAxis::generate(mode, config, today);

        let mut by_entity: HashMap<EntityId, Vec<&Assignment>> = HashMap::new();
        for assignment in &self.assignments {
            by_entity.entry(assignment.entity).or_default().push(assignment);
        }

        let tracks: Vec<EntityTrack> = self
            .entities_by_name()
            .into_iter()
            .filter_map(|id| {
                let entity = self.resolver.entity(id)?;
                let assignments = by_entity.get(&id).map(Vec::as_slice).unwrap_or(&[]);
                let track = layout_track(
                    &entity.key,
                    &entity.display_name,
                    assignments,
                    &axis,
                    config,
                );
                if config.skip_idle_entities && track.is_idle() {
                    None
                } else {
                    Some(track)
                }
            })
            .collect();

        tracing::debug!(
            mode = axis.mode.name(),
            columns = axis.columns.len(),
            tracks = tracks.len(),
            "timeline layout computed"
        );

        TimelineLayout {
            mode: axis.mode,
            columns: axis.columns,
            column_width: axis.column_width,
            total_width: axis.total_width,
            tracks,
        }
    }
}

// ============================================================================
// LAYOUT CACHE
// ============================================================================

/// Layouts kept by a `LayoutCache` unless another capacity is given
pub const DEFAULT_CACHE_CAPACITY: usize = 32;

/// Caller-owned memo of layouts for one index snapshot
///
/// Keyed by view mode and the fallback date. Holds at most `capacity`
/// layouts, evicting the oldest insert first, and drops everything when the
/// date moves on. Call `clear` whenever the index is rebuilt or the config
/// changes.
#[derive(Debug)]
pub struct LayoutCache {
    entries: HashMap<(ViewMode, NaiveDate), TimelineLayout>,
    order: VecDeque<(ViewMode, NaiveDate)>,
    capacity: usize,
    day: Option<NaiveDate>,
    hits: u64,
    misses: u64,
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl LayoutCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A capacity of 0 is treated as 1
    pub fn with_capacity(capacity: usize) -> Self {
        LayoutCache {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
            day: None,
            hits: 0,
            misses: 0,
        }
    }

    pub fn get_or_compute(
        &mut self,
        index: &TimelineIndex,
        mode: ViewMode,
        config: &TimelineConfig,
        today: NaiveDate,
    ) -> &TimelineLayout {
        if self.day != Some(today) {
            self.clear();
            self.day = Some(today);
        }

        let key = (mode, today);
        if self.entries.contains_key(&key) {
            self.hits += 1;
        } else {
            self.misses += 1;
            while self.entries.len() >= self.capacity {
                let Some(oldest) = self.order.pop_front() else {
                    break;
                };
                self.entries.remove(&oldest);
            }
            self.order.push_back(key);
        }

        self.entries
            .entry(key)
            .or_insert_with(|| index.layout(mode, config, today))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (hits, misses)
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

// ============================================================================
// TESTS
// ============================================================================
