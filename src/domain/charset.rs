// ============================================================
// Layer 3 — Charset
// ============================================================
// Maps characters to integer token codes and back.
//
// Code layout:
//   0            → SOS (start of sequence, never in transcripts)
//   1            → EOS (end of sequence, never in transcripts)
//   2..N+1       → the N characters of the alphabet, sorted
//
// output_size = N + 2 is the size of the model's probability
// distribution over tokens. The SOS/EOS codes are fixed so a
// saved charset and a saved model always agree on them.
//
// Reference: Rust Book §8 (Collections)

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Reserved token code marking the start of a sequence.
pub const SOS_CODE: usize = 0;

/// Reserved token code marking the end of a sequence.
pub const EOS_CODE: usize = 1;

/// Number of reserved codes before the first real character.
const RESERVED: usize = 2;

/// The character alphabet of the training corpus.
/// Characters are kept sorted so the code assignment is
/// deterministic across runs and machines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Charset {
    chars: Vec<char>,
}

impl Charset {
    /// Build a charset from every character appearing in the corpus.
    /// BTreeSet gives us deduplication and sorted order in one pass.
    pub fn from_corpus<'a>(texts: impl IntoIterator<Item = &'a str>) -> Self {
        let set: BTreeSet<char> = texts
            .into_iter()
            .flat_map(|t| t.chars())
            .collect();
        Self { chars: set.into_iter().collect() }
    }

    /// Vocabulary size including the two reserved codes.
    pub fn output_size(&self) -> usize {
        self.chars.len() + RESERVED
    }

    pub fn sos(&self) -> usize {
        SOS_CODE
    }

    pub fn eos(&self) -> usize {
        EOS_CODE
    }

    /// Encode a transcript into token codes.
    /// Characters outside the alphabet are skipped — they cannot
    /// be represented in the model's output distribution anyway.
    pub fn encode(&self, text: &str) -> Vec<usize> {
        text.chars()
            .filter_map(|c| self.chars.binary_search(&c).ok())
            .map(|idx| idx + RESERVED)
            .collect()
    }

    /// Decode token codes back into text.
    /// Reserved and out-of-range codes are skipped.
    pub fn decode(&self, codes: &[usize]) -> String {
        codes
            .iter()
            .filter_map(|&code| code.checked_sub(RESERVED))
            .filter_map(|idx| self.chars.get(idx))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_codes_are_first() {
        let cs = Charset::from_corpus(["ab"]);
        assert_eq!(cs.sos(), 0);
        assert_eq!(cs.eos(), 1);
        // 'a' and 'b' start after the reserved block
        assert_eq!(cs.encode("ab"), vec![2, 3]);
    }

    #[test]
    fn test_output_size_includes_reserved() {
        let cs = Charset::from_corpus(["abc"]);
        assert_eq!(cs.output_size(), 5);
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let cs    = Charset::from_corpus(["hello world"]);
        let codes = cs.encode("hello world");
        assert_eq!(cs.decode(&codes), "hello world");
    }

    #[test]
    fn test_unknown_characters_are_skipped() {
        let cs = Charset::from_corpus(["abc"]);
        assert_eq!(cs.decode(&cs.encode("axbzc")), "abc");
    }

    #[test]
    fn test_decode_skips_reserved_codes() {
        let cs    = Charset::from_corpus(["ab"]);
        let codes = vec![SOS_CODE, 2, EOS_CODE, 3];
        assert_eq!(cs.decode(&codes), "ab");
    }

    #[test]
    fn test_deterministic_order() {
        let a = Charset::from_corpus(["cba"]);
        let b = Charset::from_corpus(["abc"]);
        assert_eq!(a, b);
    }
}
