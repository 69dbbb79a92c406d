// [libs/domain/models/src/platform_map.rs]
/*!
 * Snapshot of a platform's content taxonomy, as rebuilt by a `Mapper` job.
 * Stored as JSON in `ml_platform_maps.taxonomy`; `compute_diff` flags new
 * and removed sections plus sections whose content count moved more than
 * 20% since the last snapshot, so a human reviewer can see what changed
 * without diffing the raw taxonomy by hand.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub section_id: String,
    pub section_name: String,
    pub platform: String,
    #[serde(default)]
    pub total_content: u64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub content_types: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformMap {
    pub platform: String,
    pub sections: Vec<Section>,
    pub snapshot_at: DateTime<Utc>,
}

impl PlatformMap {
    pub fn new(platform: impl Into<String>, sections: Vec<Section>) -> Self {
        Self { platform: platform.into(), sections, snapshot_at: Utc::now() }
    }

    pub fn sections_discovered(&self) -> usize {
        self.sections.len()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapDiff {
    pub new_sections: Vec<Section>,
    pub removed_section_ids: Vec<String>,
    /// `section_id` -> `(old_count, new_count)` for sections whose content
    /// count moved by more than 20% since `old_map`.
    pub count_changes: HashMap<String, (u64, u64)>,
}

const COUNT_CHANGE_THRESHOLD: f64 = 0.20;

/// Compares two snapshots of the same platform. `old_map` is `None` on a
/// platform's first mapping run, in which case every section is reported as
/// new and there are no count changes to flag.
pub fn compute_diff(old_map: Option<&PlatformMap>, new_map: &PlatformMap) -> MapDiff {
    let Some(old_map) = old_map else {
        return MapDiff {
            new_sections: new_map.sections.clone(),
            removed_section_ids: Vec::new(),
            count_changes: HashMap::new(),
        };
    };

    let old_ids: HashSet<&str> = old_map.sections.iter().map(|s| s.section_id.as_str()).collect();
    let new_ids: HashSet<&str> = new_map.sections.iter().map(|s| s.section_id.as_str()).collect();

    let new_sections = new_map.sections.iter().filter(|s| !old_ids.contains(s.section_id.as_str())).cloned().collect();
    let removed_section_ids =
        old_map.sections.iter().filter(|s| !new_ids.contains(s.section_id.as_str())).map(|s| s.section_id.clone()).collect();

    let mut count_changes = HashMap::new();
    for new_section in &new_map.sections {
        if let Some(old_section) = old_map.sections.iter().find(|s| s.section_id == new_section.section_id) {
            let old_count = old_section.total_content;
            let new_count = new_section.total_content;
            if old_count > 0 {
                let delta = (new_count as f64 - old_count as f64).abs() / old_count as f64;
                if delta > COUNT_CHANGE_THRESHOLD {
                    count_changes.insert(new_section.section_id.clone(), (old_count, new_count));
                }
            }
        }
    }

    MapDiff { new_sections, removed_section_ids, count_changes }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(id: &str, count: u64) -> Section {
        Section { section_id: id.to_string(), section_name: id.to_string(), platform: "civitai".to_string(), total_content: count, ..Default::default() }
    }

    #[test]
    fn to_json_then_from_json_round_trips_sections_counts_tags_and_snapshot_at() {
        let mut original = PlatformMap::new(
            "civitai",
            vec![Section { tags: vec!["sfw".to_string()], content_types: vec!["lora".to_string()], ..section("models", 42) }],
        );
        original.snapshot_at = DateTime::parse_from_rfc3339("2026-01-15T09:30:00.125Z").unwrap().with_timezone(&Utc);

        let raw = original.to_json().unwrap();
        let restored = PlatformMap::from_json(&raw).unwrap();

        assert_eq!(restored.platform, original.platform);
        assert_eq!(restored.sections, original.sections);
        assert_eq!(restored.snapshot_at, original.snapshot_at);
    }

    #[test]
    fn compute_diff_against_no_prior_map_reports_every_section_as_new() {
        let new_map = PlatformMap::new("civitai", vec![section("models", 10), section("images", 5)]);
        let diff = compute_diff(None, &new_map);
        assert_eq!(diff.new_sections.len(), 2);
        assert!(diff.removed_section_ids.is_empty());
        assert!(diff.count_changes.is_empty());
    }

    #[test]
    fn compute_diff_flags_new_sections_removed_sections_and_large_count_swings() {
        let old_map = PlatformMap::new("civitai", vec![section("models", 100), section("images", 40), section("articles", 12)]);
        let new_map = PlatformMap::new("civitai", vec![section("models", 135), section("loras", 3)]);

        let diff = compute_diff(Some(&old_map), &new_map);

        assert_eq!(diff.new_sections, vec![section("loras", 3)]);
        assert_eq!(diff.removed_section_ids, vec!["images".to_string(), "articles".to_string()]);
        assert_eq!(diff.count_changes.get("models"), Some(&(100, 135)));
    }

    #[test]
    fn compute_diff_ignores_count_swings_at_or_below_the_threshold() {
        let old_map = PlatformMap::new("civitai", vec![section("models", 100)]);
        let new_map = PlatformMap::new("civitai", vec![section("models", 118)]);

        let diff = compute_diff(Some(&old_map), &new_map);

        assert!(diff.count_changes.is_empty());
    }
}
