//! Zone classification and fuzzy zone matching.
//!
//! Zone labels are free-form strings ("Medical_Bay", "lab-2", "Cargo Hold"),
//! so container ranking scores them with a ladder of increasingly loose
//! comparisons. The semantic tier is backed by a closed category enumeration
//! with a static alias table; labels matching no category fall into
//! `Unclassified` and still receive the floor score; a zone mismatch lowers
//! rank but never disqualifies a container on its own.

/// Semantic category of a zone label.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoneCategory {
    Lab,
    Storage,
    Maintenance,
    Crew,
    Medical,
    Airlock,
    Cockpit,
    Unclassified,
}

/// Alias table keyed by category. An alias matches when it appears anywhere
/// in the normalized label.
const ZONE_ALIASES: &[(ZoneCategory, &[&str])] = &[
    (
        ZoneCategory::Lab,
        &["lab", "laboratory", "research", "science", "experiment"],
    ),
    (
        ZoneCategory::Storage,
        &["storage", "cargo", "warehouse", "bay", "hold"],
    ),
    (
        ZoneCategory::Maintenance,
        &["maintenance", "engineering", "repair", "workshop", "technical"],
    ),
    (
        ZoneCategory::Crew,
        &["crew", "quarters", "living", "personal", "residential"],
    ),
    (
        ZoneCategory::Medical,
        &["medical", "health", "hospital", "clinic", "treatment"],
    ),
    (
        ZoneCategory::Airlock,
        &["airlock", "entry", "exit", "hatch", "docking"],
    ),
    (
        ZoneCategory::Cockpit,
        &["cockpit", "bridge", "control", "command", "pilot"],
    ),
];

/// Score floor for labels with nothing in common. Nonzero on purpose.
const MISMATCH_FLOOR: f64 = 0.3;

/// Neutral score when either label is missing.
const NEUTRAL: f64 = 0.5;

impl ZoneCategory {
    /// Classifies a normalized label by the first alias it contains.
    pub fn classify(normalized: &str) -> Self {
        for (category, aliases) in ZONE_ALIASES {
            if aliases.iter().any(|alias| normalized.contains(alias)) {
                return *category;
            }
        }
        ZoneCategory::Unclassified
    }
}

/// Lowercases and folds separator characters to spaces.
fn normalize(label: &str) -> String {
    label
        .to_lowercase()
        .replace(['_', '-'], " ")
        .trim()
        .to_string()
}

/// Scores how well an item's preferred zone matches a container zone.
///
/// Ladder: exact 1.0, substring containment 0.8, shared word 0.7, same
/// semantic category 0.6, otherwise the mismatch floor. Missing labels score
/// a neutral 0.5.
pub fn zone_match_score(preferred_zone: &str, container_zone: &str) -> f64 {
    if preferred_zone.trim().is_empty() || container_zone.trim().is_empty() {
        return NEUTRAL;
    }

    let pref = normalize(preferred_zone);
    let cont = normalize(container_zone);

    if pref == cont {
        return 1.0;
    }

    if pref.contains(&cont) || cont.contains(&pref) {
        return 0.8;
    }

    let pref_words: Vec<&str> = pref.split_whitespace().collect();
    let cont_words: Vec<&str> = cont.split_whitespace().collect();
    if pref_words.iter().any(|word| cont_words.contains(word)) {
        return 0.7;
    }

    let pref_category = ZoneCategory::classify(&pref);
    let cont_category = ZoneCategory::classify(&cont);
    if pref_category != ZoneCategory::Unclassified && pref_category == cont_category {
        return 0.6;
    }

    MISMATCH_FLOOR
}

/// Exact zone equality after normalization; used by the forced-zone rule,
/// which is stricter than fuzzy ranking.
pub fn zones_equal(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_ignores_case_and_separators() {
        assert_eq!(zone_match_score("Medical_Bay", "medical bay"), 1.0);
        assert_eq!(zone_match_score("medical-bay", "Medical_Bay"), 1.0);
    }

    #[test]
    fn substring_containment_scores_point_eight() {
        assert_eq!(zone_match_score("Lab", "Lab Module 2"), 0.8);
        assert_eq!(zone_match_score("Lab Module 2", "Lab"), 0.8);
    }

    #[test]
    fn shared_word_scores_point_seven() {
        assert_eq!(zone_match_score("Forward Bay", "Aft Bay"), 0.7);
    }

    #[test]
    fn alias_category_scores_point_six() {
        // "laboratory" and "science" share no words but both classify as Lab.
        assert_eq!(zone_match_score("laboratory", "science"), 0.6);
        assert_eq!(zone_match_score("clinic", "health"), 0.6);
    }

    #[test]
    fn mismatch_keeps_nonzero_floor() {
        let score = zone_match_score("Greenhouse", "Cockpit");
        assert!(score > 0.0);
        assert_eq!(score, MISMATCH_FLOOR);
    }

    #[test]
    fn missing_labels_are_neutral() {
        assert_eq!(zone_match_score("", "Storage"), NEUTRAL);
        assert_eq!(zone_match_score("Storage", "  "), NEUTRAL);
    }

    #[test]
    fn classification_covers_alias_table() {
        assert_eq!(ZoneCategory::classify("research wing"), ZoneCategory::Lab);
        assert_eq!(ZoneCategory::classify("cargo hold"), ZoneCategory::Storage);
        assert_eq!(
            ZoneCategory::classify("observation deck"),
            ZoneCategory::Unclassified
        );
    }

    #[test]
    fn forced_zone_equality_is_strict() {
        assert!(zones_equal("Medical_Bay", "medical bay"));
        assert!(!zones_equal("Medical_Bay", "Medical"));
    }
}
