//! Combosquatting affixes and separator swaps.

use crate::types::{Candidate, DetectionMethod};

/// Ecosystem-flavored prefixes attackers staple onto popular names.
const PREFIXES: &[&str] = &[
    "node-", "js-", "npm-", "react-", "vue-", "web-", "webpack-", "babel-",
    "secure-", "safe-", "aws-", "azure-", "gcp-", "google-", "linux-",
    "windows-", "macos-",
];

/// Suffixes suggesting an official, fixed or upgraded flavor of a package.
const SUFFIXES: &[&str] = &[
    "-js", "-node", "-npm", "-core", "-api", "-sdk", "-cli", "-lib",
    "-utils", "-helper", "-tools", "-plugin", "-dev", "-v2", "-v3", "-new",
    "-official", "-update", "-fix",
];

/// Every prefix variant followed by every suffix variant.
pub fn combo_candidates(name: &str) -> Vec<Candidate> {
    let mut out = Vec::with_capacity(PREFIXES.len() + SUFFIXES.len());
    for prefix in PREFIXES {
        out.push(Candidate {
            name: format!("{prefix}{name}"),
            source: name.to_string(),
            method: DetectionMethod::Combosquatting,
        });
    }
    for suffix in SUFFIXES {
        out.push(Candidate {
            name: format!("{name}{suffix}"),
            source: name.to_string(),
            method: DetectionMethod::Combosquatting,
        });
    }
    out
}

/// At most one candidate: all hyphens turned to underscores, or, for a
/// hyphen-free name, all underscores turned to hyphens.
pub fn separator_candidates(name: &str) -> Vec<Candidate> {
    let swapped = if name.contains('-') {
        name.replace('-', "_")
    } else if name.contains('_') {
        name.replace('_', "-")
    } else {
        return Vec::new();
    };
    vec![Candidate {
        name: swapped,
        source: name.to_string(),
        method: DetectionMethod::SeparatorSwap,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combo_count_is_prefixes_plus_suffixes() {
        let candidates = combo_candidates("express");
        assert_eq!(candidates.len(), PREFIXES.len() + SUFFIXES.len());
        assert!(candidates.iter().any(|c| c.name == "node-express"));
        assert!(candidates.iter().any(|c| c.name == "express-official"));
    }

    #[test]
    fn test_combo_preserves_source_and_method() {
        for candidate in combo_candidates("left-pad") {
            assert_eq!(candidate.source, "left-pad");
            assert_eq!(candidate.method, DetectionMethod::Combosquatting);
        }
    }

    #[test]
    fn test_hyphens_become_underscores() {
        let candidates = separator_candidates("left-pad");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "left_pad");
    }

    #[test]
    fn test_underscores_become_hyphens() {
        let candidates = separator_candidates("lodash_utils");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "lodash-utils");
    }

    #[test]
    fn test_mixed_separators_swap_hyphens_only() {
        // hyphens win, exactly one candidate either way
        let candidates = separator_candidates("a-b_c");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "a_b_c");
    }

    #[test]
    fn test_no_separator_no_candidate() {
        assert!(separator_candidates("react").is_empty());
    }
}
