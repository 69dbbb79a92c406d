// [libs/domain/models/src/tier_config.rs]
/*!
 * Read-only tier configuration table. Every flag a contributor's
 * subscription class gates is looked up here rather than scattered across
 * call sites, so the gating algorithm in the matching stage has a single
 * source of truth.
 */

use crate::contributor::ContributorTier;

#[derive(Debug, Clone, Copy)]
pub struct TierConfig {
    pub reverse_image_interval_hours: i64,
    pub reverse_image_max_photos: Option<u32>,
    pub crawl_registry_primary_only: bool,
    pub capture_evidence: bool,
    pub ai_detection: bool,
    pub generate_takedown: bool,
    pub url_check: bool,
    pub notify_on_match: bool,
    pub store_match: bool,
    pub platform_crawl_matching: bool,
    pub show_full_details: bool,
    pub max_known_accounts: u32,
    pub priority_scanning: bool,
}

const FREE: TierConfig = TierConfig {
    reverse_image_interval_hours: 168,
    reverse_image_max_photos: Some(3),
    crawl_registry_primary_only: true,
    capture_evidence: false,
    ai_detection: false,
    generate_takedown: false,
    url_check: false,
    notify_on_match: true,
    store_match: true,
    platform_crawl_matching: true,
    show_full_details: false,
    max_known_accounts: 3,
    priority_scanning: false,
};

const PROTECTED: TierConfig = TierConfig {
    reverse_image_interval_hours: 24,
    reverse_image_max_photos: Some(10),
    crawl_registry_primary_only: false,
    capture_evidence: true,
    ai_detection: true,
    generate_takedown: true,
    url_check: true,
    notify_on_match: true,
    store_match: true,
    platform_crawl_matching: true,
    show_full_details: true,
    max_known_accounts: 10,
    priority_scanning: false,
};

const PREMIUM: TierConfig = TierConfig {
    reverse_image_interval_hours: 6,
    reverse_image_max_photos: None,
    crawl_registry_primary_only: false,
    capture_evidence: true,
    ai_detection: true,
    generate_takedown: true,
    url_check: true,
    notify_on_match: true,
    store_match: true,
    platform_crawl_matching: true,
    show_full_details: true,
    max_known_accounts: 25,
    priority_scanning: true,
};

impl TierConfig {
    pub fn for_tier(tier: ContributorTier) -> &'static TierConfig {
        match tier {
            ContributorTier::Free => &FREE,
            ContributorTier::Protected => &PROTECTED,
            ContributorTier::Premium => &PREMIUM,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_tier_never_gates_ai_or_evidence() {
        let config = TierConfig::for_tier(ContributorTier::Free);
        assert!(!config.ai_detection);
        assert!(!config.capture_evidence);
        assert!(!config.generate_takedown);
    }

    #[test]
    fn premium_tier_has_shortest_interval_and_unbounded_photos() {
        let config = TierConfig::for_tier(ContributorTier::Premium);
        assert_eq!(config.reverse_image_interval_hours, 6);
        assert!(config.reverse_image_max_photos.is_none());
        assert!(config.priority_scanning);
    }
}
