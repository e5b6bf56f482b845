//! Copyright policy detection
//!
//! The model is instructed to only recommend poems that are safe to
//! reproduce. When it cannot, it tends to answer with an explanation
//! instead of a poem. This module spots those answers with a small keyword
//! scan so the service can retry once with firmer instructions.

/// Phrases that signal the model refused on copyright or ownership grounds
/// instead of producing a poem.
///
/// Matching is deliberately approximate: a substring scan over the
/// lowercased answer. A false positive costs one extra model call; a false
/// negative still returns text the client can display.
const OWNERSHIP_MARKERS: &[&str] = &[
    "저작권",
    "copyright",
    "소유권",
    "ownership",
    "권리",
    "rights",
    "퍼블릭 도메인이 아",
    "not public domain",
    "not in the public domain",
    "다시 추천",
    "recommend again",
];

/// Maximum number of policy retries a single request may report before the
/// service refuses to call the model again.
pub const POLICY_RETRY_CAP: u32 = 3;

/// True when `text` reads like a copyright or ownership refusal.
pub fn flags_ownership_concern(text: &str) -> bool {
    let lowered = text.to_lowercase();
    OWNERSHIP_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}
