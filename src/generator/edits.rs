//! Character-level edit mutations (the `levenshtein` strategy family).

use crate::types::{Candidate, DetectionMethod};

/// Physical QWERTY adjacency, digit row included. Only characters that can
/// appear in npm package names carry entries.
const KEYBOARD_NEIGHBORS: &[(char, &[char])] = &[
    ('1', &['2', 'q']),
    ('2', &['1', '3', 'q', 'w']),
    ('3', &['2', '4', 'w', 'e']),
    ('4', &['3', '5', 'e', 'r']),
    ('5', &['4', '6', 'r', 't']),
    ('6', &['5', '7', 't', 'y']),
    ('7', &['6', '8', 'y', 'u']),
    ('8', &['7', '9', 'u', 'i']),
    ('9', &['8', '0', 'i', 'o']),
    ('0', &['9', 'o', 'p']),
    ('q', &['1', '2', 'w', 'a']),
    ('w', &['2', '3', 'q', 'e', 'a', 's']),
    ('e', &['3', '4', 'w', 'r', 's', 'd']),
    ('r', &['4', '5', 'e', 't', 'd', 'f']),
    ('t', &['5', '6', 'r', 'y', 'f', 'g']),
    ('y', &['6', '7', 't', 'u', 'g', 'h']),
    ('u', &['7', '8', 'y', 'i', 'h', 'j']),
    ('i', &['8', '9', 'u', 'o', 'j', 'k']),
    ('o', &['9', '0', 'i', 'p', 'k', 'l']),
    ('p', &['0', 'o', 'l']),
    ('a', &['q', 'w', 's', 'z']),
    ('s', &['w', 'e', 'a', 'd', 'z', 'x']),
    ('d', &['e', 'r', 's', 'f', 'x', 'c']),
    ('f', &['r', 't', 'd', 'g', 'c', 'v']),
    ('g', &['t', 'y', 'f', 'h', 'v', 'b']),
    ('h', &['y', 'u', 'g', 'j', 'b', 'n']),
    ('j', &['u', 'i', 'h', 'k', 'n', 'm']),
    ('k', &['i', 'o', 'j', 'l', 'm']),
    ('l', &['o', 'p', 'k']),
    ('z', &['a', 's', 'x']),
    ('x', &['z', 's', 'd', 'c']),
    ('c', &['x', 'd', 'f', 'v']),
    ('v', &['c', 'f', 'g', 'b']),
    ('b', &['v', 'g', 'h', 'n']),
    ('n', &['b', 'h', 'j', 'm']),
    ('m', &['n', 'j', 'k']),
];

/// Keyboard neighbors of `c`, empty for characters without an entry.
pub fn neighbors_of(c: char) -> &'static [char] {
    KEYBOARD_NEIGHBORS
        .iter()
        .find(|(key, _)| *key == c)
        .map(|(_, adjacent)| *adjacent)
        .unwrap_or(&[])
}

/// All single-edit variants of `name`, in fixed order: trailing `s`,
/// position-wise duplication, position-wise deletion, adjacent-distinct
/// swaps, keyboard-neighbor substitution.
pub fn edit_candidates(name: &str) -> Vec<Candidate> {
    let chars: Vec<char> = name.chars().collect();
    let mut out = Vec::new();
    let mut push = |mutated: String| {
        if !mutated.is_empty() && mutated != name {
            out.push(Candidate {
                name: mutated,
                source: name.to_string(),
                method: DetectionMethod::Levenshtein,
            });
        }
    };

    push(format!("{name}s"));

    for i in 0..chars.len() {
        let mut mutated = chars.clone();
        mutated.insert(i, chars[i]);
        push(mutated.into_iter().collect());
    }

    for i in 0..chars.len() {
        let mut mutated = chars.clone();
        mutated.remove(i);
        push(mutated.into_iter().collect());
    }

    for i in 0..chars.len().saturating_sub(1) {
        if chars[i] != chars[i + 1] {
            let mut mutated = chars.clone();
            mutated.swap(i, i + 1);
            push(mutated.into_iter().collect());
        }
    }

    for i in 0..chars.len() {
        for &neighbor in neighbors_of(chars[i]) {
            let mut mutated = chars.clone();
            mutated[i] = neighbor;
            push(mutated.into_iter().collect());
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(candidates: &[Candidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_trailing_s_comes_first() {
        let candidates = edit_candidates("react");
        assert_eq!(candidates[0].name, "reacts");
    }

    #[test]
    fn test_duplication_and_deletion() {
        let candidates = edit_candidates("abc");
        let names = names(&candidates);
        assert!(names.contains(&"aabc"));
        assert!(names.contains(&"abbc"));
        assert!(names.contains(&"abcc"));
        assert!(names.contains(&"bc"));
        assert!(names.contains(&"ac"));
        assert!(names.contains(&"ab"));
    }

    #[test]
    fn test_swaps_skip_identical_pairs() {
        let candidates = edit_candidates("aab");
        let swapped: Vec<&Candidate> = candidates
            .iter()
            .filter(|c| c.name.len() == 3 && c.name.as_str() == "aba")
            .collect();
        assert_eq!(swapped.len(), 1);
        // "aa" must never swap into itself
        assert!(!names(&candidates).contains(&"aab"));
    }

    #[test]
    fn test_keyboard_substitution_uses_adjacency() {
        let candidates = edit_candidates("q");
        let names = names(&candidates);
        assert!(names.contains(&"w"));
        assert!(names.contains(&"a"));
        // 'm' is nowhere near 'q'
        assert!(!names.contains(&"m"));
    }

    #[test]
    fn test_digit_row_has_neighbors() {
        assert!(neighbors_of('5').contains(&'4'));
        assert!(neighbors_of('5').contains(&'t'));
        assert!(neighbors_of('-').is_empty());
    }

    #[test]
    fn test_single_char_name_never_yields_empty() {
        for candidate in edit_candidates("a") {
            assert!(!candidate.name.is_empty());
        }
    }

    #[test]
    fn test_deterministic_order() {
        assert_eq!(edit_candidates("lodash"), edit_candidates("lodash"));
    }

    #[test]
    fn test_all_tagged_levenshtein() {
        for candidate in edit_candidates("vue") {
            assert_eq!(candidate.method, DetectionMethod::Levenshtein);
            assert_eq!(candidate.source, "vue");
        }
    }
}
