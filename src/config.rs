// ⚙️ Timeline Config - pixel geometry and guards as data
// Loaded from JSON the same way classification rules are; every field has a default.

use crate::error::{Result, TimelineError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Pixel width of one day column in month mode
    pub month_column_width: u32,

    /// Pixel width of one week bucket in year mode
    pub year_column_width: u32,

    /// Pixel width of one day column in range mode
    pub range_column_width: u32,

    /// Lower bound for the total canvas width
    pub minimum_width: u32,

    /// Hard cap on generated range-mode columns
    pub max_range_columns: usize,

    /// Base height of one entity track
    pub track_height: u32,

    /// Floor for a single row's bar height
    pub min_bar_height: u32,

    /// Vertical padding inside a track (applied top and bottom)
    pub track_padding: u32,

    /// Drop entities with no visible bars from the layout
    pub skip_idle_entities: bool,

    /// Sort visible assignments by start date before row packing
    pub pack_by_start: bool,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        TimelineConfig {
            month_column_width: 40,
            year_column_width: 30,
            range_column_width: 40,
            minimum_width: 800,
            max_range_columns: 1000,
            track_height: 48,
            min_bar_height: 10,
            track_padding: 4,
            skip_idle_entities: false,
            pack_by_start: false,
        }
    }
}

impl TimelineConfig {
    /// Load config from a JSON file, then validate it
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| TimelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config: TimelineConfig =
            serde_json::from_str(&content).map_err(|source| TimelineError::Json {
                path: path.to_path_buf(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Reject geometry that would collapse the canvas
    pub fn validate(&self) -> Result<()> {
        let widths = [
            ("month_column_width", self.month_column_width),
            ("year_column_width", self.year_column_width),
            ("range_column_width", self.range_column_width),
            ("track_height", self.track_height),
            ("min_bar_height", self.min_bar_height),
        ];

        for (name, value) in widths {
            if value == 0 {
                return Err(TimelineError::InvalidConfig(format!("{} must be > 0", name)));
            }
        }

        if self.max_range_columns == 0 {
            return Err(TimelineError::InvalidConfig(
                "max_range_columns must be > 0".to_string(),
            ));
        }

        if self.track_padding.saturating_mul(2) >= self.track_height {
            return Err(TimelineError::InvalidConfig(format!(
                "track_padding {} leaves no room in track_height {}",
                self.track_padding, self.track_height
            )));
        }

        Ok(())
    }
}
