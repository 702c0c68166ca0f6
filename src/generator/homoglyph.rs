//! Homograph (confusable character) substitution.

use crate::types::{Candidate, DetectionMethod};

/// Visually confusable counterparts for characters legal in npm package
/// names. Cyrillic, Greek and Armenian lookalikes plus Latin diacritics;
/// digits and separators get their own rows.
const CONFUSABLES: &[(char, &[char])] = &[
    ('a', &['\u{0430}', '\u{0251}', '\u{00E0}', '\u{00E1}', '\u{00E2}', '\u{00E4}', '\u{00E3}']),
    ('b', &['\u{042C}', '\u{0184}', '\u{0185}', '\u{044C}']),
    ('c', &['\u{03F2}', '\u{0441}', '\u{0188}']),
    ('d', &['\u{0501}', '\u{0257}']),
    ('e', &['\u{0435}', '\u{0454}', '\u{212E}', '\u{00E9}', '\u{00EA}', '\u{00EB}']),
    ('f', &['\u{0493}', '\u{0192}']),
    ('g', &['\u{0261}', '\u{0121}', '\u{011F}']),
    ('h', &['\u{04BB}', '\u{0570}']),
    ('i', &['\u{04CF}', '\u{0131}', '\u{0130}', '\u{00A1}', 'l', '1']),
    ('j', &['\u{0458}']),
    ('k', &['\u{03BA}', '\u{043A}']),
    ('l', &['\u{0196}', '\u{04CF}', '\u{217C}', '\u{0399}']),
    ('m', &['\u{043C}']),
    ('n', &['\u{0576}', '\u{043F}']),
    ('o', &['\u{03BF}', '\u{043E}', '\u{0275}', '\u{00F6}', '\u{00F2}', '\u{00F3}']),
    ('p', &['\u{0440}', '\u{03C1}']),
    ('q', &['\u{0566}']),
    ('r', &['\u{0433}', '\u{1E5B}']),
    ('s', &['\u{0455}', '\u{0282}']),
    ('t', &['\u{03C4}', '\u{0442}']),
    ('u', &['\u{03C5}', '\u{00FC}', '\u{00FB}', '\u{00FA}']),
    ('v', &['\u{03BD}', '\u{0475}']),
    ('w', &['\u{0448}', '\u{051D}']),
    ('x', &['\u{0445}', '\u{03C7}']),
    ('y', &['\u{0443}', '\u{04AF}']),
    ('z', &['\u{0290}', '\u{017E}']),
    ('0', &['O', '\u{041E}', '\u{03BF}', '\u{25CB}']),
    ('1', &['l', 'I', '\u{04CF}']),
    ('2', &['\u{01A7}']),
    ('3', &['\u{0417}', '\u{025C}']),
    ('4', &['\u{13CE}']),
    ('5', &['\u{01BC}']),
    ('6', &['\u{0431}']),
    ('7', &['\u{03A4}']),
    ('8', &['\u{0A6A}']),
    ('9', &['\u{096F}']),
    ('-', &['\u{2010}', '\u{2011}', '\u{2013}', '\u{2014}', '\u{2212}']),
    ('.', &['\u{2024}', '\u{2022}', '\u{3002}']),
    ('_', &['\u{FE4D}', '\u{FF3F}']),
    ('/', &['\u{2215}']),
    ('\\', &['\u{FF3C}']),
];

/// Lookalikes for `c`, empty for characters without an entry.
pub fn confusables_for(c: char) -> &'static [char] {
    CONFUSABLES
        .iter()
        .find(|(key, _)| *key == c)
        .map(|(_, lookalikes)| *lookalikes)
        .unwrap_or(&[])
}

/// One candidate per (distinct character, lookalike) pair, replacing every
/// occurrence of that character at once. A repeated character is expanded
/// only on its first occurrence.
pub fn homograph_candidates(name: &str) -> Vec<Candidate> {
    let mut out = Vec::new();
    let mut expanded: Vec<char> = Vec::new();
    for c in name.chars() {
        if expanded.contains(&c) {
            continue;
        }
        expanded.push(c);
        for &lookalike in confusables_for(c) {
            let mutated: String = name
                .chars()
                .map(|x| if x == c { lookalike } else { x })
                .collect();
            if mutated != name {
                out.push(Candidate {
                    name: mutated,
                    source: name.to_string(),
                    method: DetectionMethod::Homograph {
                        original: c,
                        lookalike,
                    },
                });
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replaces_every_occurrence() {
        let candidates = homograph_candidates("oops");
        let cyrillic: Vec<&Candidate> = candidates
            .iter()
            .filter(|c| {
                matches!(
                    c.method,
                    DetectionMethod::Homograph { original: 'o', lookalike: '\u{043E}' }
                )
            })
            .collect();
        assert_eq!(cyrillic.len(), 1);
        assert_eq!(cyrillic[0].name, "\u{043E}\u{043E}ps");
    }

    #[test]
    fn test_repeated_char_expanded_once() {
        // 'o' appears twice but contributes one candidate set
        let candidates = homograph_candidates("oo");
        assert_eq!(candidates.len(), confusables_for('o').len());
    }

    #[test]
    fn test_never_emits_the_source_name() {
        for candidate in homograph_candidates("react-dom") {
            assert_ne!(candidate.name, "react-dom");
        }
    }

    #[test]
    fn test_unmapped_chars_are_skipped() {
        assert!(homograph_candidates("@").is_empty());
        assert!(confusables_for('~').is_empty());
    }

    #[test]
    fn test_digit_and_separator_rows() {
        assert!(confusables_for('0').contains(&'O'));
        assert!(confusables_for('-').contains(&'\u{2010}'));
    }

    #[test]
    fn test_tag_carries_codepoint() {
        let candidates = homograph_candidates("up");
        let tag = candidates[0].method.tag();
        assert!(tag.starts_with("homograph"), "unexpected tag: {tag}");
        assert!(tag.contains("U+"), "unexpected tag: {tag}");
    }
}
