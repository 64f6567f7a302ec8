// 🪪 Name Normalizer - raw name token → stable matching key
//
// Problem solved:
// - "  budi   SANTOSO " and "Budi Santoso" → same key "budi santoso"
// - "Dr. Budi Santoso, S.E." → "budi santoso" (academic titles stripped at both ends)
// - "S.E.", "M.M.", "Dr." and tokens with ≤ 2 letters → None (never become an identity)
//
// Pure and total: every input yields Some(key) or None, nothing panics.

use serde::{Deserialize, Serialize};

/// Academic and professional title tokens, compared lowercase with dots removed
const TITLE_TOKENS: &[&str] = &[
    "se", "mm", "dr", "drs", "dra", "ir", "sh", "mh", "skom", "mkom", "msi", "mak", "sak",
    "ak", "ca", "cpa", "mba", "st", "mt", "spd", "ssi", "sip", "ssos", "msc", "bsc", "phd",
    "prof", "cia", "cisa", "qia", "crma", "amd",
];

/// Keys with fewer letters than this are treated as noise ("AB", "N/A", "...")
const MIN_KEY_LETTERS: usize = 3;

// ============================================================================
// NORMALIZED NAME
// ============================================================================

/// A name that survived normalization
///
/// `key` is what the resolver matches on; `display` keeps the original casing
/// so the canonical entity can show "Budi Santoso" instead of "budi santoso".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalizedName {
    pub key: String,
    pub display: String,
}

impl NormalizedName {
    /// First whitespace-delimited token of the key (the first name)
    pub fn first_token(&self) -> &str {
        first_token(&self.key)
    }

    pub fn char_len(&self) -> usize {
        self.key.chars().count()
    }
}

/// Normalize a raw name into key + display form
pub fn normalize(raw: &str) -> Option<NormalizedName> {
    let words = clean_words(raw);
    if words.is_empty() {
        return None;
    }

    let display = words.join(" ");
    let key = display.to_lowercase();

    if key.chars().filter(|c| c.is_alphabetic()).count() < MIN_KEY_LETTERS {
        return None;
    }

    Some(NormalizedName { key, display })
}

/// Normalize a raw name into its matching key only
///
/// `normalize_name(normalize_name(x)) == normalize_name(x)` for every x.
pub fn normalize_name(raw: &str) -> Option<String> {
    normalize(raw).map(|name| name.key)
}

/// Check whether a single token is an academic/professional title
///
/// Fused forms like "S.E.,M.M." count as titles when every piece is one.
pub fn is_title_token(token: &str) -> bool {
    let lowered = token.to_lowercase();
    let mut pieces = lowered
        .split(',')
        .map(|piece| piece.replace('.', ""))
        .filter(|piece| !piece.trim().is_empty())
        .peekable();

    if pieces.peek().is_none() {
        return false;
    }

    pieces.all(|piece| TITLE_TOKENS.contains(&piece.trim()))
}

pub fn first_token(key: &str) -> &str {
    key.split_whitespace().next().unwrap_or("")
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Split on whitespace, drop separator punctuation at word edges, then strip
/// title tokens from the front and back of the name
fn clean_words(raw: &str) -> Vec<&str> {
    let mut words: Vec<&str> = raw
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| c == ',' || c == ';'))
        .filter(|word| !word.is_empty())
        .collect();

    while words.first().map_or(false, |w| is_title_token(w)) {
        words.remove(0);
    }
    while words.last().map_or(false, |w| is_title_token(w)) {
        words.pop();
    }

    words
}

// ============================================================================
// TESTS
// ============================================================================
