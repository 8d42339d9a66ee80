//! Token-level scoring of a typed submission against a reference text.
//!
//! Both strings are tokenized on whitespace/punctuation boundaries, aligned
//! with a minimum-edit-distance pass over the token sequences, and each
//! aligned pair is classified. Near-misses (small character edit distance)
//! count as `Almost` and contribute half credit to the accuracy score.

use crate::error::AlignError;
use crate::types::{AttemptResult, TokenStatus, TokenVerdict, VerdictCounts};

/// Score a submission against a reference text.
///
/// Pure function; always produces a well-formed [`AttemptResult`] unless the
/// reference contains no tokens at all.
pub fn score(reference: &str, answer: &str) -> Result<AttemptResult, AlignError> {
    let ref_tokens = tokenize(reference);
    if ref_tokens.is_empty() {
        return Err(AlignError::InvalidReference);
    }
    let ans_tokens = tokenize(answer);

    let pairs = align_tokens(&ref_tokens, &ans_tokens);

    let mut verdicts = Vec::with_capacity(pairs.len());
    let mut counts = VerdictCounts::default();
    for (ref_tok, ans_tok) in pairs {
        let status = classify(ref_tok, ans_tok);
        counts.record(status);
        verdicts.push(TokenVerdict {
            reference: ref_tok.map(str::to_owned),
            answer: ans_tok.map(str::to_owned),
            status,
        });
    }

    let total = ref_tokens.len() as f64;
    let accuracy =
        (100.0 * (counts.correct as f64 + 0.5 * counts.almost as f64) / total).clamp(0.0, 100.0);

    Ok(AttemptResult {
        verdicts,
        accuracy,
        counts,
    })
}

/// Split text into word tokens. A token is a maximal run of alphanumeric
/// characters plus intra-word apostrophes and hyphens; bare punctuation is
/// dropped and never counts toward the accuracy denominator.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for c in text.chars() {
        if c.is_alphanumeric() || c == '\'' || c == '-' {
            current.push(c);
        } else if !current.is_empty() {
            push_token(&mut tokens, &mut current);
        }
    }
    if !current.is_empty() {
        push_token(&mut tokens, &mut current);
    }

    tokens
}

fn push_token(tokens: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim_matches(|c| c == '\'' || c == '-');
    if !trimmed.is_empty() {
        tokens.push(trimmed.to_string());
    }
    current.clear();
}

/// Classify one aligned token pair.
fn classify(reference: Option<&str>, answer: Option<&str>) -> TokenStatus {
    match (reference, answer) {
        (Some(r), Some(a)) => {
            let r_lower = r.to_lowercase();
            let a_lower = a.to_lowercase();
            if r_lower == a_lower {
                TokenStatus::Correct
            } else if levenshtein_distance(&r_lower, &a_lower) <= typo_bound(&r_lower) {
                TokenStatus::Almost
            } else {
                TokenStatus::Incorrect
            }
        }
        (Some(_), None) => TokenStatus::Missing,
        (None, Some(_)) => TokenStatus::Extra,
        (None, None) => unreachable!("alignment never emits an empty pair"),
    }
}

/// Maximum character edit distance still counted as a typo: one edit for
/// short words, scaling with a quarter of the reference length.
fn typo_bound(reference: &str) -> usize {
    let len = reference.chars().count();
    1.max(len.div_ceil(4))
}

/// Align two token sequences with Wagner-Fischer (unit costs) and backtrack
/// into paired/unpaired tokens. Comparison is case-insensitive; ties prefer
/// pairing tokens over insert/delete.
fn align_tokens<'a>(
    reference: &'a [String],
    answer: &'a [String],
) -> Vec<(Option<&'a str>, Option<&'a str>)> {
    let ref_lower: Vec<String> = reference.iter().map(|t| t.to_lowercase()).collect();
    let ans_lower: Vec<String> = answer.iter().map(|t| t.to_lowercase()).collect();

    let m = reference.len();
    let n = answer.len();

    let mut dp = vec![vec![0usize; n + 1]; m + 1];
    for (i, row) in dp.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=n {
        dp[0][j] = j;
    }
    for i in 1..=m {
        for j in 1..=n {
            let sub_cost = usize::from(ref_lower[i - 1] != ans_lower[j - 1]);
            dp[i][j] = (dp[i - 1][j - 1] + sub_cost)
                .min(dp[i - 1][j] + 1)
                .min(dp[i][j - 1] + 1);
        }
    }

    let mut pairs = Vec::with_capacity(m.max(n));
    let (mut i, mut j) = (m, n);
    while i > 0 || j > 0 {
        if i > 0 && j > 0 {
            let sub_cost = usize::from(ref_lower[i - 1] != ans_lower[j - 1]);
            if dp[i][j] == dp[i - 1][j - 1] + sub_cost {
                pairs.push((
                    Some(reference[i - 1].as_str()),
                    Some(answer[j - 1].as_str()),
                ));
                i -= 1;
                j -= 1;
                continue;
            }
        }
        if i > 0 && dp[i][j] == dp[i - 1][j] + 1 {
            pairs.push((Some(reference[i - 1].as_str()), None));
            i -= 1;
        } else {
            pairs.push((None, Some(answer[j - 1].as_str())));
            j -= 1;
        }
    }
    pairs.reverse();
    pairs
}

/// Character-level Levenshtein distance, two-row formulation.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    let m = a_chars.len();
    let n = b_chars.len();

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    let mut prev = (0..=n).collect::<Vec<_>>();
    let mut curr = vec![0; n + 1];

    for i in 1..=m {
        curr[0] = i;

        for j in 1..=n {
            let cost = usize::from(a_chars[i - 1] != b_chars[j - 1]);
            curr[j] = (prev[j] + 1)
                .min(curr[j - 1] + 1)
                .min(prev[j - 1] + cost);
        }

        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("", ""), 0);
        assert_eq!(levenshtein_distance("abc", "abc"), 0);
        assert_eq!(levenshtein_distance("abc", ""), 3);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("quick", "quikc"), 2);
    }

    #[test]
    fn tokenize_strips_punctuation() {
        assert_eq!(
            tokenize("Hello, world! It's fine."),
            vec!["Hello", "world", "It's", "fine"]
        );
        assert_eq!(tokenize("...!?"), Vec::<String>::new());
    }

    #[test]
    fn identical_strings_score_full_accuracy() {
        let result = score("the quick brown fox", "the quick brown fox").unwrap();
        assert_eq!(result.accuracy, 100.0);
        assert_eq!(result.counts.correct, 4);
        assert_eq!(result.counts.almost, 0);
        assert_eq!(result.counts.incorrect, 0);
        assert_eq!(result.counts.missing, 0);
        assert_eq!(result.counts.extra, 0);
    }

    #[test]
    fn case_differences_are_correct() {
        let result = score("The Quick Fox", "the quick fox").unwrap();
        assert_eq!(result.accuracy, 100.0);
        assert_eq!(result.counts.correct, 3);
    }

    #[test]
    fn empty_answer_is_all_missing() {
        let result = score("one two three", "").unwrap();
        assert_eq!(result.accuracy, 0.0);
        assert_eq!(result.counts.missing, 3);
        assert!(result
            .verdicts
            .iter()
            .all(|v| v.status == TokenStatus::Missing));
    }

    #[test]
    fn empty_reference_is_rejected() {
        assert_eq!(score("", "anything"), Err(AlignError::InvalidReference));
        assert_eq!(score("?!.", "anything"), Err(AlignError::InvalidReference));
    }

    #[test]
    fn minor_typo_counts_as_almost() {
        let result = score("the quick fox", "the quikc fox").unwrap();
        assert_eq!(result.counts.correct, 2);
        assert_eq!(result.counts.almost, 1);
        assert_eq!(result.counts.incorrect, 0);
        // 100 * (2 + 0.5) / 3
        assert!(result.accuracy > 66.0 && result.accuracy < 100.0);
        assert!((result.accuracy - 83.333).abs() < 0.01);
    }

    #[test]
    fn wrong_word_counts_as_incorrect() {
        let result = score("the quick fox", "the elephant fox").unwrap();
        assert_eq!(result.counts.correct, 2);
        assert_eq!(result.counts.incorrect, 1);
        assert!((result.accuracy - 66.666).abs() < 0.01);
    }

    #[test]
    fn missing_word_in_middle() {
        let result = score("the quick brown fox", "the brown fox").unwrap();
        assert_eq!(result.counts.correct, 3);
        assert_eq!(result.counts.missing, 1);
        let missing: Vec<_> = result
            .verdicts
            .iter()
            .filter(|v| v.status == TokenStatus::Missing)
            .collect();
        assert_eq!(missing[0].reference.as_deref(), Some("quick"));
        assert_eq!(missing[0].answer, None);
    }

    #[test]
    fn extra_word_does_not_inflate_accuracy() {
        let result = score("the fox", "the very sly fox").unwrap();
        assert_eq!(result.counts.correct, 2);
        assert_eq!(result.counts.extra, 2);
        assert_eq!(result.accuracy, 100.0);
    }

    #[test]
    fn short_word_typo_bound_is_one_edit() {
        // "cat" vs "cta": distance 2, bound max(1, ceil(3/4)) = 1.
        let result = score("cat", "cta").unwrap();
        assert_eq!(result.counts.incorrect, 1);

        // "cat" vs "car": distance 1, within bound.
        let result = score("cat", "car").unwrap();
        assert_eq!(result.counts.almost, 1);
    }

    #[test]
    fn verdicts_preserve_original_spelling() {
        let result = score("The Fox", "the fxo").unwrap();
        assert_eq!(result.verdicts[0].reference.as_deref(), Some("The"));
        assert_eq!(result.verdicts[0].answer.as_deref(), Some("the"));
        assert_eq!(result.verdicts[1].answer.as_deref(), Some("fxo"));
    }
}
