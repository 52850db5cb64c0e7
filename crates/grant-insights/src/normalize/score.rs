//! Weighted fuzzy similarity in `[0, 100]`.
//!
//! Modelled on the `WRatio` scorer of the thefuzz/rapidfuzz family: a plain
//! Indel ratio, promoted by token-order-insensitive variants when the two
//! strings are of similar length and by sliding-window partial variants when
//! one is much longer than the other. Case is preserved; callers fold case
//! before scoring when they want it ignored.

use rapidfuzz::distance::indel;
use std::collections::BTreeSet;

const UNBASE_SCALE: f64 = 0.95;
const PARTIAL_SCALE: f64 = 0.9;
const LONG_PARTIAL_SCALE: f64 = 0.6;

/// Scores `query` against `choice`. 100 means identical after processing.
pub fn weighted_ratio(query: &str, choice: &str) -> u8 {
    let p1 = process(query);
    let p2 = process(choice);
    if p1.is_empty() || p2.is_empty() {
        return 0;
    }

    let len1 = p1.chars().count() as f64;
    let len2 = p2.chars().count() as f64;
    let len_ratio = len1.max(len2) / len1.min(len2);

    let base = ratio(&p1, &p2);

    let best = if len_ratio < 1.5 {
        let token_sort = token_sort_ratio(&p1, &p2) * UNBASE_SCALE;
        let token_set = token_set_ratio(&p1, &p2) * UNBASE_SCALE;
        base.max(token_sort).max(token_set)
    } else {
        let scale = if len_ratio > 8.0 {
            LONG_PARTIAL_SCALE
        } else {
            PARTIAL_SCALE
        };
        let partial = partial_ratio(&p1, &p2) * scale;
        let partial_sort = partial_token_sort_ratio(&p1, &p2) * UNBASE_SCALE * scale;
        let partial_set = partial_token_set_ratio(&p1, &p2) * UNBASE_SCALE * scale;
        base.max(partial).max(partial_sort).max(partial_set)
    };

    best.round().clamp(0.0, 100.0) as u8
}

/// Replaces every non-alphanumeric character with a space and collapses runs
/// of whitespace.
pub(crate) fn process(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    indel::normalized_similarity(a.chars(), b.chars()) * 100.0
}

/// Best `ratio` of the shorter string against every equal-length window of
/// the longer one.
pub(crate) fn partial_ratio(a: &str, b: &str) -> f64 {
    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };

    let short_len = short.chars().count();
    if short_len == 0 {
        return 0.0;
    }

    let long_chars: Vec<char> = long.chars().collect();
    let mut best = 0.0_f64;
    for window in long_chars.windows(short_len) {
        let candidate: String = window.iter().collect();
        let score = ratio(short, &candidate);
        if score > best {
            best = score;
            if best >= 100.0 {
                break;
            }
        }
    }
    best
}

fn sorted_tokens(value: &str) -> String {
    let mut tokens: Vec<&str> = value.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

pub(crate) fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

fn partial_token_sort_ratio(a: &str, b: &str) -> f64 {
    partial_ratio(&sorted_tokens(a), &sorted_tokens(b))
}

struct TokenSplit {
    intersection: String,
    only_a: String,
    only_b: String,
}

fn split_tokens(a: &str, b: &str) -> TokenSplit {
    let set_a: BTreeSet<&str> = a.split_whitespace().collect();
    let set_b: BTreeSet<&str> = b.split_whitespace().collect();

    let join = |tokens: Vec<&str>| tokens.join(" ");
    TokenSplit {
        intersection: join(set_a.intersection(&set_b).copied().collect()),
        only_a: join(set_a.difference(&set_b).copied().collect()),
        only_b: join(set_b.difference(&set_a).copied().collect()),
    }
}

fn combine(head: &str, tail: &str) -> String {
    match (head.is_empty(), tail.is_empty()) {
        (true, _) => tail.to_string(),
        (false, true) => head.to_string(),
        (false, false) => format!("{head} {tail}"),
    }
}

pub(crate) fn token_set_ratio(a: &str, b: &str) -> f64 {
    let split = split_tokens(a, b);
    let combined_a = combine(&split.intersection, &split.only_a);
    let combined_b = combine(&split.intersection, &split.only_b);

    if split.intersection.is_empty() {
        return ratio(&combined_a, &combined_b);
    }

    ratio(&split.intersection, &combined_a)
        .max(ratio(&split.intersection, &combined_b))
        .max(ratio(&combined_a, &combined_b))
}

fn partial_token_set_ratio(a: &str, b: &str) -> f64 {
    let split = split_tokens(a, b);
    if !split.intersection.is_empty() {
        return 100.0;
    }
    partial_ratio(&split.only_a, &split.only_b)
}
