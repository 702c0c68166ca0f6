//! Typosquat candidate generation.
//!
//! Four independent mutation strategies run over a legitimate package name
//! and their outputs are concatenated in a fixed order, so a given input
//! always yields the same candidate sequence. The generator does not
//! deduplicate across strategies; the classifier filters candidates against
//! the store before any network traffic happens.

pub mod affixes;
pub mod edits;
pub mod homoglyph;

use crate::types::Candidate;

/// Generate every typosquat candidate for one legitimate name.
///
/// Strategy order is fixed: character edits, homograph substitution,
/// combosquatting affixes, separator swap. An empty name yields nothing,
/// and no candidate ever equals the name it was derived from.
pub fn candidates_for(name: &str) -> Vec<Candidate> {
    if name.is_empty() {
        return Vec::new();
    }
    let mut out = edits::edit_candidates(name);
    out.extend(homoglyph::homograph_candidates(name));
    out.extend(affixes::combo_candidates(name));
    out.extend(affixes::separator_candidates(name));
    out
}
