// Auditor Timeline - Core Library
// Entity resolution + interval layout for audit assignment letters.
// Exposes all modules for use in the CLI, the API server, and tests.

pub mod error;
pub mod config;
pub mod names;       // Name Normalizer
pub mod resolver;    // Entity Resolver
pub mod source;      // Letters / addendums at the data boundary
pub mod extractor;   // Assignment Extractor
pub mod axis;        // Time Axis Generator
pub mod position;    // Position Mapper
pub mod layout;      // Row-Packing Layout Engine
pub mod timeline;    // Pipeline + caller-owned cache
pub mod workload;    // Per-auditor workload summary

// Re-export commonly used types
pub use error::{Result, TimelineError};
pub use config::TimelineConfig;
pub use names::{normalize, normalize_name, NormalizedName};
pub use resolver::{CanonicalEntity, EntityId, EntityResolver, MatchKind, Resolution};
pub use source::{
    load_addendums, load_letters, parse_date,
    Addendum, AddendumRecord, AssignmentStatus, Letter, LetterRecord, Source, TeamField,
};
pub use extractor::{
    parse_team, Assignment, AssignmentExtractor, SkipReason, SkippedRecord,
};
pub use axis::{Column, TimeAxis, ViewMode};
pub use position::{bar_geometry, map_position};
pub use layout::{pack_rows, EntityTrack, LayoutBar, TrackMetrics};
pub use timeline::{LayoutCache, TimelineIndex, TimelineLayout, DEFAULT_CACHE_CAPACITY};
pub use workload::{EntityWorkload, WorkloadSummary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the fmt subscriber used by the binaries
///
/// Filter comes from `AUDITOR_TIMELINE_LOG` (e.g. "debug",
/// "auditor_timeline::resolver=debug"), defaulting to "info". Logs go to
/// stderr so JSON output on stdout stays clean.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("AUDITOR_TIMELINE_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // Already installed when embedded or called twice
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
