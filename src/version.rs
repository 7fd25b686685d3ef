//! Versions as ordered sequences of segments, each drawn from a per-position alphabet.
//!
//! Unlike a semver triple, a [`VersionPattern`] doesn't assume three numeric segments: it's an
//! ordered list of alphabets, one per segment position, and a [`Version`] is only ever compared
//! against another parsed from the same pattern.

use crate::error::{self, Result};

/// The ordered alphabet for each segment position of a version id.
///
/// `alphabets[i]` lists every valid value a version's `i`th segment may take, in ascending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionPattern {
    sep: char,
    alphabets: Vec<Vec<String>>,
}

impl VersionPattern {
    pub fn new(sep: char, alphabets: Vec<Vec<String>>) -> VersionPattern {
        VersionPattern { sep, alphabets }
    }

    /// A pattern for plain dot-separated non-negative integer segments, e.g. `1.2.3`, with
    /// `width` segments each ranging `0..=max_value`.
    pub fn numeric(width: usize, max_value: u32) -> VersionPattern {
        let alphabet: Vec<String> = (0..=max_value).map(|n| n.to_string()).collect();
        VersionPattern {
            sep: '.',
            alphabets: std::iter::repeat(alphabet).take(width).collect(),
        }
    }

    pub fn separator(&self) -> char {
        self.sep
    }

    /// The smallest version in this pattern: every segment at index 0 of its alphabet.
    pub fn first_version(&self) -> Version {
        Version {
            indices: vec![0; self.alphabets.len()],
            saturated: false,
        }
    }

    /// Parses `id`, splitting on [`Self::separator`] and resolving each segment's position in its
    /// alphabet.
    ///
    /// Fails with [`error::Error::VersionMalformed`] unless `id` splits into exactly
    /// `alphabets.len()` segments, each present in its position's alphabet.
    pub fn parse(&self, id: &str) -> Result<Version> {
        let parts: Vec<&str> = id.split(self.sep).collect();
        if parts.len() != self.alphabets.len() {
            return error::VersionMalformedSnafu {
                id: id.to_string(),
                pattern_desc: format!("{} segments separated by '{}'", self.alphabets.len(), self.sep),
            }
            .fail();
        }
        let mut indices = Vec::with_capacity(parts.len());
        for (part, alphabet) in parts.iter().zip(&self.alphabets) {
            let idx = alphabet.iter().position(|s| s == part).ok_or_else(|| {
                error::VersionMalformedSnafu {
                    id: id.to_string(),
                    pattern_desc: format!("segment '{}' not in alphabet {:?}", part, alphabet),
                }
                .build()
            })?;
            indices.push(idx);
        }
        Ok(Version { indices, saturated: false })
    }

    pub fn format(&self, v: &Version) -> String {
        v.indices
            .iter()
            .zip(&self.alphabets)
            .map(|(idx, alphabet)| alphabet[*idx].clone())
            .collect::<Vec<_>>()
            .join(&self.sep.to_string())
    }

    /// Advances `v` by one step: the rightmost segment moves to the next element of its alphabet;
    /// if it was already at the alphabet's end, it wraps to the first element and the carry
    /// propagates left. If the leftmost segment overflows, the result is a saturated
    /// "beyond-last" version that compares greater than any non-saturated version from this
    /// pattern.
    pub fn next(&self, v: &Version) -> Version {
        if v.saturated {
            return v.clone();
        }
        let mut indices = v.indices.clone();
        for i in (0..indices.len()).rev() {
            let alphabet_len = self.alphabets[i].len();
            if indices[i] + 1 < alphabet_len {
                indices[i] += 1;
                return Version { indices, saturated: false };
            }
            indices[i] = 0;
        }
        Version { indices, saturated: true }
    }

    /// The ordered, inclusive-of-`to` sequence `next(from), next(next(from)), …, to`.
    ///
    /// Empty when `from >= to`. Used by the orchestrator to walk each version step strictly
    /// ascending from a document's current version up to the defaults' version.
    pub fn range(&self, from: &Version, to: &Version) -> Vec<Version> {
        let mut out = Vec::new();
        let mut v = self.next(from);
        while &v <= to {
            out.push(v.clone());
            if v.saturated {
                break;
            }
            v = self.next(&v);
        }
        out
    }
}

/// A parsed version id: an index into each segment position's alphabet, as defined by the
/// [`VersionPattern`] that parsed it.
///
/// Comparisons are only meaningful between versions produced by the same pattern; comparing
/// segment index vectors directly is valid because a pattern assigns indices in ascending
/// alphabet order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    // `saturated` sorts after any non-saturated vector of indices regardless of length or
    // content, since it's compared first by derive(Ord)'s field order.
    saturated: bool,
    indices: Vec<usize>,
}

impl Version {
    pub fn is_saturated(&self) -> bool {
        self.saturated
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_and_format_roundtrip() {
        let pattern = VersionPattern::numeric(2, 9);
        let v = pattern.parse("1.2").unwrap();
        assert_eq!(pattern.format(&v), "1.2");
    }

    #[test]
    fn parse_rejects_wrong_segment_count() {
        let pattern = VersionPattern::numeric(2, 9);
        assert!(pattern.parse("1.2.3").is_err());
    }

    #[test]
    fn parse_rejects_segment_outside_alphabet() {
        let pattern = VersionPattern::new('.', vec![vec!["a".into(), "b".into()]]);
        assert!(pattern.parse("c").is_err());
    }

    #[test]
    fn next_advances_rightmost_segment() {
        let pattern = VersionPattern::numeric(2, 9);
        let v = pattern.parse("1.2").unwrap();
        let next = pattern.next(&v);
        assert_eq!(pattern.format(&next), "1.3");
    }

    #[test]
    fn next_carries_into_next_segment_left() {
        let pattern = VersionPattern::numeric(2, 9);
        let v = pattern.parse("1.9").unwrap();
        let next = pattern.next(&v);
        assert_eq!(pattern.format(&next), "2.0");
    }

    #[test]
    fn next_saturates_on_leftmost_overflow() {
        let pattern = VersionPattern::numeric(2, 9);
        let v = pattern.parse("9.9").unwrap();
        let next = pattern.next(&v);
        assert!(next.is_saturated());
    }

    #[test]
    fn saturated_version_compares_greater_than_any_valid_version() {
        let pattern = VersionPattern::numeric(2, 9);
        let top = pattern.parse("9.9").unwrap();
        let saturated = pattern.next(&top);
        assert!(saturated > top);
    }

    #[test]
    fn first_version_is_all_zero_indices() {
        let pattern = VersionPattern::numeric(3, 5);
        let first = pattern.first_version();
        assert_eq!(pattern.format(&first), "0.0.0");
    }

    #[test]
    fn ordering_follows_alphabet_position() {
        let pattern = VersionPattern::numeric(1, 9);
        let a = pattern.parse("3").unwrap();
        let b = pattern.parse("7").unwrap();
        assert!(a < b);
    }

    #[test]
    fn range_is_exclusive_of_from_and_inclusive_of_to() {
        let pattern = VersionPattern::numeric(1, 9);
        let from = pattern.parse("1").unwrap();
        let to = pattern.parse("4").unwrap();
        let ids: Vec<String> = pattern.range(&from, &to).iter().map(|v| pattern.format(v)).collect();
        assert_eq!(ids, vec!["2", "3", "4"]);
    }

    #[test]
    fn range_is_empty_when_equal() {
        let pattern = VersionPattern::numeric(1, 9);
        let v = pattern.parse("3").unwrap();
        assert!(pattern.range(&v, &v).is_empty());
    }
}
