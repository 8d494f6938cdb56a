use std::collections::HashMap;
use std::sync::OnceLock;

use super::domain::ApplicationStatus;

/// Known free-text status phrases, scanned in this order for substring matches.
const STATUS_PHRASES: &[(&str, ApplicationStatus)] = &[
    ("pending", ApplicationStatus::Pending),
    ("for verification", ApplicationStatus::Pending),
    ("on process", ApplicationStatus::Pending),
    ("in process", ApplicationStatus::Pending),
    ("processing", ApplicationStatus::Pending),
    ("for approval", ApplicationStatus::Pending),
    ("submitted", ApplicationStatus::Pending),
    ("approved w/ cif", ApplicationStatus::Approved),
    ("approved with cif", ApplicationStatus::Approved),
    ("approved w/o cif", ApplicationStatus::Approved),
    ("card released", ApplicationStatus::Approved),
    ("application declined", ApplicationStatus::Rejected),
    ("disapproved", ApplicationStatus::Rejected),
    ("rejected", ApplicationStatus::Rejected),
    ("denied", ApplicationStatus::Rejected),
    ("cancelled", ApplicationStatus::Cancelled),
    ("canceled", ApplicationStatus::Cancelled),
    ("withdrawn", ApplicationStatus::Cancelled),
];

static EXACT_PHRASES: OnceLock<HashMap<&'static str, ApplicationStatus>> = OnceLock::new();

/// Maps a free-text status from any source onto a standard status category.
pub fn normalize_status(raw: Option<&str>) -> ApplicationStatus {
    let Some(raw) = raw else {
        return ApplicationStatus::Unknown;
    };

    let cleaned = clean(raw);
    if cleaned.is_empty() {
        return ApplicationStatus::Unknown;
    }

    if let Some(status) = exact_phrases().get(cleaned.as_str()) {
        return *status;
    }

    if let Some((_, status)) = STATUS_PHRASES
        .iter()
        .find(|(phrase, _)| cleaned.contains(*phrase))
    {
        return *status;
    }

    if cleaned.contains("declined") {
        ApplicationStatus::Rejected
    } else if cleaned.contains("approved") {
        ApplicationStatus::Approved
    } else {
        ApplicationStatus::Unknown
    }
}

/// The phrase dictionary in scan order.
pub fn status_phrases() -> &'static [(&'static str, ApplicationStatus)] {
    STATUS_PHRASES
}

fn exact_phrases() -> &'static HashMap<&'static str, ApplicationStatus> {
    EXACT_PHRASES.get_or_init(|| STATUS_PHRASES.iter().copied().collect())
}

fn clean(value: &str) -> String {
    value
        .replace(['\u{feff}', '\u{200b}'], "")
        .trim()
        .to_lowercase()
}
