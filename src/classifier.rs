// Heuristic reclassification of generic activity listings into ground transfers

use crate::listing::TransferType;
use regex::Regex;
use std::sync::OnceLock;

pub const DEFAULT_TRANSFER_TYPE: TransferType = TransferType::Private;
pub const DEFAULT_CAPACITY: u32 = 3;

// Case-insensitive substring matching; in ordered tables the first hit wins
#[derive(Debug, Clone)]
pub struct TransferClassifier {
    transfer_keywords: Vec<String>,
    type_rules: Vec<(String, TransferType)>,
    capacity_rules: Vec<(String, u32)>,
    default_type: TransferType,
    default_capacity: u32,
}

impl Default for TransferClassifier {
    fn default() -> Self {
        Self::new(
            &[
                "transfer",
                "airport",
                "shuttle",
                "taxi",
                "chauffeur",
                "private car",
                "pickup",
                "pick-up",
                "drop-off",
                "limousine",
                "limo",
                "minibus",
                "ride to",
            ],
            &[
                ("shared", TransferType::Shared),
                ("shuttle", TransferType::Shuttle),
                ("taxi", TransferType::Taxi),
                ("limousine", TransferType::Luxury),
                ("limo", TransferType::Luxury),
                ("luxury", TransferType::Luxury),
                ("vip", TransferType::Luxury),
                ("private", TransferType::Private),
            ],
            &[
                ("minibus", 16),
                ("coach", 50),
                ("bus", 40),
                ("minivan", 7),
                ("van", 8),
                ("suv", 6),
                ("sedan", 3),
            ],
        )
    }
}

impl TransferClassifier {
    pub fn new(
        transfer_keywords: &[&str],
        type_rules: &[(&str, TransferType)],
        capacity_rules: &[(&str, u32)],
    ) -> Self {
        Self {
            transfer_keywords: transfer_keywords.iter().map(|k| k.to_lowercase()).collect(),
            type_rules: type_rules
                .iter()
                .map(|(k, t)| (k.to_lowercase(), *t))
                .collect(),
            capacity_rules: capacity_rules
                .iter()
                .map(|(k, c)| (k.to_lowercase(), *c))
                .collect(),
            default_type: DEFAULT_TRANSFER_TYPE,
            default_capacity: DEFAULT_CAPACITY,
        }
    }

    pub fn is_transfer(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.transfer_keywords.iter().any(|k| text.contains(k.as_str()))
    }

    pub fn classify(&self, text: &str) -> TransferType {
        let text = text.to_lowercase();
        self.type_rules
            .iter()
            .find(|(keyword, _)| text.contains(keyword.as_str()))
            .map(|(_, transfer_type)| *transfer_type)
            .unwrap_or(self.default_type)
    }

    // Falls back to sedan capacity when no vehicle word matches
    pub fn estimate_capacity(&self, text: &str) -> (u32, Option<&str>) {
        let text = text.to_lowercase();
        self.capacity_rules
            .iter()
            .find(|(keyword, _)| text.contains(keyword.as_str()))
            .map(|(keyword, capacity)| (*capacity, Some(keyword.as_str())))
            .unwrap_or((self.default_capacity, None))
    }
}

fn duration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)(\d+)\s*(hour|hr|min)").expect("valid duration regex"))
}

fn iso_duration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^PT(?:(\d+)H)?(?:(\d+)M)?(?:\d+S)?$").expect("valid iso duration regex")
    })
}

// First "<n> hour|hr|min" mention in free text, in minutes
pub fn estimate_duration_minutes(text: &str) -> Option<u32> {
    let captures = duration_pattern().captures(text)?;
    let amount: u32 = captures.get(1)?.as_str().parse().ok()?;
    let unit = captures.get(2)?.as_str().to_lowercase();
    if unit.starts_with('h') {
        amount.checked_mul(60)
    } else {
        Some(amount)
    }
}

// "PT1H15M" style durations
pub fn parse_iso_duration_minutes(text: &str) -> Option<u32> {
    let captures = iso_duration_pattern().captures(text.trim())?;
    let hours = captures.get(1).map(|m| m.as_str().parse::<u32>()).transpose().ok()?;
    let minutes = captures.get(2).map(|m| m.as_str().parse::<u32>()).transpose().ok()?;
    if hours.is_none() && minutes.is_none() {
        return None;
    }
    hours
        .unwrap_or(0)
        .checked_mul(60)?
        .checked_add(minutes.unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("Shared airport shuttle to Manhattan", TransferType::Shared; "first keyword wins over later ones")]
    #[test_case("JFK Airport Shuttle", TransferType::Shuttle; "shuttle")]
    #[test_case("Yellow TAXI pickup", TransferType::Taxi; "case insensitive")]
    #[test_case("Stretch limousine transfer", TransferType::Luxury; "limousine")]
    #[test_case("Airport transfer", TransferType::Private; "default when nothing matches")]
    fn test_classify(text: &str, expected: TransferType) {
        assert_eq!(TransferClassifier::default().classify(text), expected);
    }

    #[test]
    fn test_transfer_filter_rejects_unrelated_activities() {
        let classifier = TransferClassifier::default();
        assert!(classifier.is_transfer("Private Airport Transfer JFK"));
        assert!(classifier.is_transfer("Hotel pick-up included"));
        assert!(!classifier.is_transfer("Statue of Liberty guided tour"));
    }

    #[test]
    fn test_capacity_keywords() {
        let classifier = TransferClassifier::default();
        assert_eq!(classifier.estimate_capacity("Mercedes minibus"), (16, Some("minibus")));
        assert_eq!(classifier.estimate_capacity("Luxury VAN service").0, 8);
        assert_eq!(classifier.estimate_capacity("Comfort car"), (DEFAULT_CAPACITY, None));
    }

    #[test_case("Approx. 45 min drive", Some(45); "minutes")]
    #[test_case("2 hours door to door", Some(120); "hours")]
    #[test_case("takes 1hr", Some(60); "hr abbreviation")]
    #[test_case("quick ride", None; "no duration")]
    fn test_estimate_duration(text: &str, expected: Option<u32>) {
        assert_eq!(estimate_duration_minutes(text), expected);
    }

    #[test_case("PT45M", Some(45); "minutes only")]
    #[test_case("PT1H15M", Some(75); "hours and minutes")]
    #[test_case("PT2H", Some(120); "hours only")]
    #[test_case("PT", None; "empty duration")]
    #[test_case("45 minutes", None; "not iso")]
    #[test_case("PT99999999H", None; "overflowing hours")]
    #[test_case("PT71582788H59M", None; "overflowing sum")]
    fn test_parse_iso_duration(text: &str, expected: Option<u32>) {
        assert_eq!(parse_iso_duration_minutes(text), expected);
    }
}
