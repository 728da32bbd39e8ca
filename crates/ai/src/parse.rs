//! Resolution of free-form transcribed entries against the item roster.
//!
//! Transcripts arrive messy: "choc chip, two tubs" must land on the item
//! actually named "Chocolate Chip". Matching is tiered: exact normalized name,
//! then substring containment, then word overlap. Each tier caps the
//! confidence reported to the caller.

use serde::{Deserialize, Serialize};

use scoopstock_core::{Form, ItemId};

/// One entry as transcribed, before resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedEntry {
    pub raw_name: String,
    pub form: Form,
    pub quantity: f64,
}

/// A roster match with its tiered confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameMatch {
    pub item_id: ItemId,
    pub name: String,
    pub confidence: f64,
}

fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn tokens(normalized: &str) -> Vec<&str> {
    normalized.split_whitespace().collect()
}

/// Minimum word-overlap ratio for the weakest tier to count as a match.
const MIN_OVERLAP: f64 = 0.5;

/// Match one transcribed name against the roster.
///
/// Tiers: exact normalized equality (confidence 1.0), substring containment
/// either way (0.85), then shared-word ratio against the longer name (at most
/// 0.8, rejected below [`MIN_OVERLAP`]). The best candidate wins; ties break
/// alphabetically so resolution is deterministic.
pub fn match_item_name(raw: &str, roster: &[(ItemId, String)]) -> Option<NameMatch> {
    let needle = normalize(raw);
    if needle.is_empty() {
        return None;
    }
    let needle_tokens = tokens(&needle);

    let mut best: Option<NameMatch> = None;
    for (item_id, name) in roster {
        let candidate = normalize(name);
        let confidence = if candidate == needle {
            1.0
        } else if candidate.contains(&needle) || needle.contains(&candidate) {
            0.85
        } else {
            let candidate_tokens = tokens(&candidate);
            let shared = needle_tokens
                .iter()
                .filter(|t| candidate_tokens.contains(t))
                .count();
            let ratio = shared as f64 / needle_tokens.len().max(candidate_tokens.len()) as f64;
            if ratio < MIN_OVERLAP {
                continue;
            }
            0.8 * ratio
        };

        let better = match &best {
            None => true,
            Some(b) => {
                confidence > b.confidence || (confidence == b.confidence && candidate < normalize(&b.name))
            }
        };
        if better {
            best = Some(NameMatch {
                item_id: *item_id,
                name: name.clone(),
                confidence,
            });
        }
    }
    best
}

/// One entry after resolution, ready to submit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedEntry {
    pub item_id: ItemId,
    pub name: String,
    pub form: Form,
    pub quantity: f64,
    pub confidence: f64,
    /// Every transcript fragment that landed on this (item, form).
    pub raw_names: Vec<String>,
}

/// Outcome of resolving a batch of transcribed entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Resolution {
    pub resolved: Vec<ResolvedEntry>,
    pub unmatched: Vec<ParsedEntry>,
}

/// Resolve a transcript batch against the roster.
///
/// Entries landing on the same (item, form) are merged: quantities sum, the
/// reported confidence is the strongest contributing match, and every merged
/// fragment stays listed in `raw_names` so the operator can review the
/// collapse. Unmatched entries are returned, never silently dropped.
pub fn resolve_entries(entries: &[ParsedEntry], roster: &[(ItemId, String)]) -> Resolution {
    let mut resolution = Resolution::default();
    for entry in entries {
        let Some(found) = match_item_name(&entry.raw_name, roster) else {
            resolution.unmatched.push(entry.clone());
            continue;
        };
        if let Some(existing) = resolution
            .resolved
            .iter_mut()
            .find(|r| r.item_id == found.item_id && r.form == entry.form)
        {
            existing.quantity += entry.quantity;
            existing.confidence = existing.confidence.max(found.confidence);
            existing.raw_names.push(entry.raw_name.clone());
        } else {
            resolution.resolved.push(ResolvedEntry {
                item_id: found.item_id,
                name: found.name,
                form: entry.form,
                quantity: entry.quantity,
                confidence: found.confidence,
                raw_names: vec![entry.raw_name.clone()],
            });
        }
    }
    resolution
}
