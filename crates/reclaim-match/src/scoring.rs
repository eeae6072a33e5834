//! Rule-based compatibility scoring for (lost, found) record pairs.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use reclaim_core::{FoundRecordView, LostRecordView};

/// Points for an exact category match. Category is the strongest signal the
/// records carry, so it outweighs any single other rule.
pub const CATEGORY_POINTS: i32 = 30;

/// Points for place proximity (shared campus-area keyword or a common
/// substring of the normalized place strings).
pub const PLACE_POINTS: i32 = 20;

/// Points when the loss and find timestamps lie within the date window.
pub const DATE_POINTS: i32 = 15;

/// Points per distinct shared title/description keyword. Deliberately
/// unbounded: many shared keywords can outscore every other signal, and
/// ranking depends on that relative order.
pub const KEYWORD_POINTS: i32 = 10;

/// Day window for the date-proximity signal (inclusive).
pub const DATE_WINDOW_DAYS: i64 = 7;

/// Minimum length of a common substring for place proximity.
const PLACE_SUBSTRING_MIN: usize = 3;

/// Minimum token length kept by the keyword tokenizer.
const TOKEN_MIN_CHARS: usize = 2;

/// Campus-area keywords for place proximity. Compared against place strings
/// normalized to lowercase with whitespace removed.
const PLACE_KEYWORDS: [&str; 8] = [
    "engineering",
    "library",
    "studentcenter",
    "dormitory",
    "gym",
    "cafeteria",
    "cafe",
    "lecture",
];

/// Reason emitted when no signal fires.
pub const NO_SIGNAL_REASON: &str = "no match signals";

static TOKEN_SPLIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[\s,./;:!?()\[\]{}"']+"#).unwrap()
});

/// Scores one (lost, found) pair.
///
/// Pure and deterministic: identical inputs always yield identical points
/// and reasons. Absent fields (category, place, timestamp) simply fail
/// their signal; they never error. Returns the total points and the fired
/// signals in a stable order, or a single [`NO_SIGNAL_REASON`] entry when
/// nothing fired.
pub fn score(lost: &LostRecordView, found: &FoundRecordView) -> (i32, Vec<String>) {
    let mut points = 0;
    let mut reasons = Vec::new();

    if let (Some(lost_category), Some(found_category)) = (&lost.category, &found.category) {
        if lost_category == found_category {
            points += CATEGORY_POINTS;
            reasons.push("category match".to_string());
        }
    }

    if let (Some(lost_place), Some(found_place)) = (&lost.lost_place, &found.found_place) {
        if places_similar(lost_place, found_place) {
            points += PLACE_POINTS;
            reasons.push("place proximity".to_string());
        }
    }

    if let (Some(lost_at), Some(found_at)) = (lost.lost_at, found.found_at) {
        let days_apart = (found_at - lost_at).num_days().abs();
        if days_apart <= DATE_WINDOW_DAYS {
            points += DATE_POINTS;
            reasons.push(format!("date proximity ({} days apart)", days_apart));
        }
    }

    let shared = shared_keyword_count(lost, found);
    if shared > 0 {
        points += shared as i32 * KEYWORD_POINTS;
        reasons.push(format!("{} shared keywords", shared));
    }

    if reasons.is_empty() {
        reasons.push(NO_SIGNAL_REASON.to_string());
    }

    debug!(
        lost_id = lost.id,
        found_id = found.id,
        score = points,
        signal_count = reasons.len(),
        "pair scored"
    );

    (points, reasons)
}

/// Whether two place strings describe roughly the same area.
///
/// Both strings are normalized to lowercase with whitespace removed, then
/// compared by shared campus-area keyword first and by longest common
/// substring second. Substrings shorter than [`PLACE_SUBSTRING_MIN`] chars
/// never match, so very short place strings (even identical ones) are not
/// considered similar.
fn places_similar(a: &str, b: &str) -> bool {
    let a = normalize_place(a);
    let b = normalize_place(b);

    for keyword in PLACE_KEYWORDS {
        if a.contains(keyword) && b.contains(keyword) {
            return true;
        }
    }

    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let min_len = a_chars.len().min(b_chars.len());
    for len in (PLACE_SUBSTRING_MIN..=min_len).rev() {
        for window in a_chars.windows(len) {
            if contains_chars(&b_chars, window) {
                return true;
            }
        }
    }

    false
}

fn normalize_place(place: &str) -> String {
    place
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

fn contains_chars(haystack: &[char], needle: &[char]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Number of distinct keywords shared by the two records' titles and
/// descriptions.
fn shared_keyword_count(lost: &LostRecordView, found: &FoundRecordView) -> usize {
    let lost_keywords = extract_keywords(lost.title.as_deref(), lost.description.as_deref());
    let found_keywords = extract_keywords(found.title.as_deref(), found.description.as_deref());
    lost_keywords.intersection(&found_keywords).count()
}

fn extract_keywords(title: Option<&str>, description: Option<&str>) -> HashSet<String> {
    let mut keywords = HashSet::new();
    if let Some(title) = title {
        tokenize_into(title, &mut keywords);
    }
    if let Some(description) = description {
        tokenize_into(description, &mut keywords);
    }
    keywords
}

/// Splits on whitespace and punctuation, lowercases, and keeps tokens of at
/// least [`TOKEN_MIN_CHARS`] chars.
fn tokenize_into(text: &str, out: &mut HashSet<String>) {
    let lowered = text.to_lowercase();
    for token in TOKEN_SPLIT.split(&lowered) {
        if token.chars().count() >= TOKEN_MIN_CHARS {
            out.insert(token.to_string());
        }
    }
}
