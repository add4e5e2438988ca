//! Canonical form for answer comparison
//!
//! Case, accents and punctuation are ignored. Ñ survives as its own letter.

use unicode_normalization::char::decompose_canonical;
use unicode_normalization::UnicodeNormalization;

/// Canonicalize text: lower-case, strip diacritics (except ñ), keep only
/// `a-z`, `0-9` and `ñ`.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());

    // Compose first so a decomposed "n" + tilde is seen as ñ.
    for c in text.nfc().flat_map(char::to_lowercase) {
        if c == 'ñ' {
            out.push(c);
            continue;
        }
        decompose_canonical(c, |part| {
            if part.is_ascii_lowercase() || part.is_ascii_digit() {
                out.push(part);
            }
        });
    }

    out
}
