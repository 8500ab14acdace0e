//! Slot selection from free-text poll replies.
//!
//! Rules run in order and the first one that produces a selection wins:
//!
//! 1. `all` (but not `not all`) selects every slot
//! 2. `none`, `no slot`, `no slots` select nothing
//! 3. otherwise every number 1..=N in the text selects that slot
//!
//! Keywords beat numerals: "none of 1-3 work" selects nothing. Reordering the
//! rules changes results, so the order is part of the contract.

use std::sync::OnceLock;

use regex::Regex;

/// A rule returns `Some(selection)` when it applies to the (lowercased) text.
pub type SlotRule = fn(text: &str, slot_count: usize) -> Option<Vec<usize>>;

pub const SLOT_RULES: [(&str, SlotRule); 3] = [
    ("all_keyword", all_keyword),
    ("none_keyword", none_keyword),
    ("explicit_numbers", explicit_numbers),
];

fn all_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\ball\b").unwrap())
}

fn not_all_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bnot all\b").unwrap())
}

fn none_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bnone\b|\bno slots?\b").unwrap())
}

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[0-9]+").unwrap())
}

pub fn all_keyword(text: &str, slot_count: usize) -> Option<Vec<usize>> {
    if all_re().is_match(text) && !not_all_re().is_match(text) {
        Some((0..slot_count).collect())
    } else {
        None
    }
}

pub fn none_keyword(text: &str, _slot_count: usize) -> Option<Vec<usize>> {
    none_re().is_match(text).then(Vec::new)
}

/// Slot numbers are 1-based in replies; out-of-range numbers are ignored.
pub fn explicit_numbers(text: &str, slot_count: usize) -> Option<Vec<usize>> {
    let mut slots: Vec<usize> = number_re()
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<usize>().ok())
        .filter(|n| (1..=slot_count).contains(n))
        .map(|n| n - 1)
        .collect();
    slots.sort_unstable();
    slots.dedup();
    Some(slots)
}

/// Parse the slots an attendee said they can make, as sorted 0-based indices.
pub fn parse_slot_selection(reply: &str, slot_count: usize) -> Vec<usize> {
    let text = reply.to_lowercase();
    SLOT_RULES
        .iter()
        .find_map(|(_, rule)| rule(&text, slot_count))
        .unwrap_or_default()
}
