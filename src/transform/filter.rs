//! Word-bounded censorship for text content
//!
//! Scans left to right. At each byte every filter word is tried in
//! configured order; a match needs an ASCII case-insensitive byte match
//! with a string edge or a non-alphanumeric byte on both sides. A match
//! emits the replacement token and skips the word, anything else copies
//! one byte.

use crate::error::Result;

use super::REPLACEMENT_TOKEN;

/// Ordered set of censored words
#[derive(Debug, Clone, Default)]
pub struct WordFilter {
    words: Vec<Vec<u8>>,
}

impl WordFilter {
    /// Build a filter. Empty words are dropped, duplicates kept.
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().as_bytes().to_vec())
            .filter(|w| !w.is_empty())
            .collect();
        WordFilter { words }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Length of the first filter word matching at `pos`
    fn match_at(&self, input: &[u8], pos: usize) -> Option<usize> {
        if pos > 0 && input[pos - 1].is_ascii_alphanumeric() {
            return None;
        }

        self.words.iter().find_map(|word| {
            let end = pos + word.len();
            let candidate = input.get(pos..end)?;
            let bounded = input.get(end).map_or(true, |b| !b.is_ascii_alphanumeric());
            (bounded && candidate.eq_ignore_ascii_case(word)).then_some(word.len())
        })
    }

    /// Apply the filter
    pub fn apply(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        out.try_reserve(input.len())?;

        if self.words.is_empty() {
            out.extend_from_slice(input);
            return Ok(out);
        }

        let mut pos = 0;
        while pos < input.len() {
            match self.match_at(input, pos) {
                Some(len) => {
                    out.try_reserve(REPLACEMENT_TOKEN.len())?;
                    out.extend_from_slice(REPLACEMENT_TOKEN.as_bytes());
                    pos += len;
                }
                None => {
                    out.try_reserve(1)?;
                    out.push(input[pos]);
                    pos += 1;
                }
            }
        }

        Ok(out)
    }
}

/// Whether `word` can match text that already contains the replacement
/// token, which would make a second pass change the output
///
/// True when the token occurs in `word` with a string edge or a
/// non-alphanumeric byte on both sides, ignoring ASCII case.
pub fn collides_with_token(word: &str) -> bool {
    let word = word.as_bytes();
    let token = REPLACEMENT_TOKEN.as_bytes();

    word.windows(token.len()).enumerate().any(|(pos, window)| {
        let before = pos
            .checked_sub(1)
            .map_or(true, |i| !word[i].is_ascii_alphanumeric());
        let after = word
            .get(pos + token.len())
            .map_or(true, |b| !b.is_ascii_alphanumeric());
        before && after && window.eq_ignore_ascii_case(token)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn censor(words: &[&str], text: &str) -> String {
        let filter = WordFilter::new(words);
        String::from_utf8(filter.apply(text.as_bytes()).unwrap()).unwrap()
    }

    #[test]
    fn test_replaces_word() {
        assert_eq!(censor(&["bad"], "this is bad stuff"), "this is lawak stuff");
    }

    #[test]
    fn test_word_boundaries() {
        assert_eq!(censor(&["cat"], "catalog"), "catalog");
        assert_eq!(censor(&["cat"], "bobcat"), "bobcat");
        assert_eq!(censor(&["cat"], "cat!"), "lawak!");
        assert_eq!(censor(&["cat"], "cat"), "lawak");
        assert_eq!(censor(&["cat"], "a cat_b"), "a lawak_b");
        assert_eq!(censor(&["cat"], "(cat)(cat)"), "(lawak)(lawak)");
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(censor(&["bad"], "BAD Bad bAd"), "lawak lawak lawak");
        assert_eq!(censor(&["BAD"], "bad"), "lawak");
    }

    #[test]
    fn test_first_listed_word_wins() {
        assert_eq!(censor(&["foo bar", "foo"], "foo bar"), "lawak");
        assert_eq!(censor(&["foo", "foo bar"], "foo bar"), "lawak bar");
    }

    #[test]
    fn test_longer_word_after_failed_shorter() {
        // "bad" fails the right boundary inside "badly", "badly" then matches
        assert_eq!(censor(&["bad", "badly"], "badly done"), "lawak done");
    }

    #[test]
    fn test_output_length_varies() {
        assert_eq!(censor(&["a"], "a b a"), "lawak b lawak");
        assert_eq!(censor(&["enormous"], "enormous"), "lawak");
    }

    #[test]
    fn test_idempotent() {
        let filter = WordFilter::new(["bad", "ugly"]);
        let once = filter.apply(b"bad, ugly and BAD-ugly").unwrap();
        let twice = filter.apply(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_token_inside_word_breaks_idempotence() {
        // Config validation rejects words like "lawak!"
        let filter = WordFilter::new(["bad", "lawak!"]);
        let once = filter.apply(b"bad!").unwrap();
        assert_eq!(once, b"lawak!");
        assert_eq!(filter.apply(&once).unwrap(), b"lawak");
        assert!(collides_with_token("lawak!"));

        // Token embedded without a boundary cannot match a token in output
        let filter = WordFilter::new(["bad", "lawakness", "x lawakish"]);
        let once = filter.apply(b"bad! x bad lawakness").unwrap();
        assert_eq!(once, b"lawak! x lawak lawak");
        assert_eq!(filter.apply(&once).unwrap(), once);
    }

    #[test]
    fn test_collides_with_token() {
        assert!(collides_with_token("lawak"));
        assert!(collides_with_token("LaWaK"));
        assert!(collides_with_token("lawak!"));
        assert!(collides_with_token("x lawak"));
        assert!(collides_with_token("(lawak)"));
        assert!(!collides_with_token("lawakness"));
        assert!(!collides_with_token("alawak"));
        assert!(!collides_with_token("law"));
        assert!(!collides_with_token(""));
    }

    #[test]
    fn test_non_ascii_passthrough() {
        let filter = WordFilter::new(["bad"]);
        let input = [0xff, b' ', b'b', b'a', b'd', b' ', 0xc3, 0xa9];
        let out = filter.apply(&input).unwrap();
        assert_eq!(out, [&[0xff, b' '][..], b"lawak", &[b' ', 0xc3, 0xa9]].concat());
    }

    #[test]
    fn test_empty_words_dropped() {
        let filter = WordFilter::new(["", "bad"]);
        assert_eq!(filter.len(), 1);
        assert!(WordFilter::new(Vec::<String>::new()).is_empty());
        assert_eq!(censor(&[], "bad"), "bad");
    }
}
