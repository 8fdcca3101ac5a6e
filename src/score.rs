use std::collections::HashMap;

/// Highest n-gram order considered by the scorer.
const MAX_ORDER: usize = 4;

/// Weight of each n-gram order in the geometric mean.
const ORDER_WEIGHT: f64 = 1.0 / MAX_ORDER as f64;

/// Split a text into lowercase word tokens with all punctuation removed.
///
/// Punctuation characters are deleted outright rather than turned into
/// separators, so "test..." becomes "test", "don't" becomes "dont" and
/// "456.789" stays a single token "456789". Runs of whitespace collapse to a
/// single token boundary and tokens that end up empty are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter_map(|word| {
            let token: String = word
                .chars()
                .filter(|c| !is_punctuation(*c))
                .flat_map(char::to_lowercase)
                .collect();

            if token.is_empty() {
                None
            } else {
                Some(token)
            }
        })
        .collect()
}

/// Compute a BLEU-style similarity score between a reference translation and
/// a candidate translation.
///
/// Both inputs are tokenized with [`tokenize`], then compared with clipped
/// n-gram precision for orders 1 through 4, combined as a geometric mean
/// with equal 0.25 weights and multiplied by a brevity penalty when the
/// candidate is shorter than the reference.
///
/// The metric is deliberately strict and unsmoothed: a zero precision at any
/// order collapses the whole score to 0.0. An order the candidate cannot
/// attain (fewer than n tokens) contributes a zero precision rather than
/// being skipped, so texts shorter than four tokens always score 0.0 — the
/// conventional short-sentence BLEU behavior.
///
/// The result is always a finite value in [0.0, 1.0]. A score of 0.0 covers
/// both "no measurable similarity" and every degenerate condition (either
/// side tokenizes to nothing, or the computation produces a non-finite
/// value); callers cannot distinguish the two, and this conflation is part
/// of the contract. The function never panics and never returns an error.
pub fn score(reference: &str, candidate: &str) -> f64 {
    let reference_tokens = tokenize(reference);
    let candidate_tokens = tokenize(candidate);

    if reference_tokens.is_empty() || candidate_tokens.is_empty() {
        return 0.0;
    }

    let combined = match combined_precision(&reference_tokens, &candidate_tokens) {
        Some(precision) => precision,
        None => return 0.0,
    };

    let penalty = brevity_penalty(reference_tokens.len(), candidate_tokens.len());
    let score = combined * penalty;

    if !score.is_finite() {
        return 0.0;
    }

    score.clamp(0.0, 1.0)
}

/// Geometric mean of clipped n-gram precisions over orders 1..=4. Returns
/// `None` as soon as any order has a zero precision, since its logarithm
/// would collapse the mean to zero anyway.
fn combined_precision(reference: &[String], candidate: &[String]) -> Option<f64> {
    let mut log_sum = 0.0;

    for n in 1..=MAX_ORDER {
        let precision = modified_precision(reference, candidate, n);
        if precision <= 0.0 {
            return None;
        }
        log_sum += ORDER_WEIGHT * precision.ln();
    }

    Some(log_sum.exp())
}

/// Clipped n-gram precision of one order: candidate counts are clipped to
/// the reference counts, then divided by the total candidate n-grams. A
/// candidate with fewer than n tokens has zero precision for that order.
fn modified_precision(reference: &[String], candidate: &[String], n: usize) -> f64 {
    if candidate.len() < n {
        return 0.0;
    }

    let reference_counts = ngram_counts(reference, n);
    let candidate_counts = ngram_counts(candidate, n);

    let total: usize = candidate_counts.values().sum();
    let clipped: usize = candidate_counts
        .iter()
        .map(|(gram, count)| (*count).min(reference_counts.get(gram).copied().unwrap_or(0)))
        .sum();

    clipped as f64 / total as f64
}

/// Occurrence counts for every n-gram of the given order.
fn ngram_counts(tokens: &[String], n: usize) -> HashMap<&[String], usize> {
    let mut counts = HashMap::new();
    for gram in tokens.windows(n) {
        *counts.entry(gram).or_insert(0) += 1;
    }
    counts
}

/// Penalty for candidates shorter than the reference: exp(1 - r/c).
fn brevity_penalty(reference_len: usize, candidate_len: usize) -> f64 {
    if candidate_len >= reference_len {
        1.0
    } else {
        (1.0 - reference_len as f64 / candidate_len as f64).exp()
    }
}

fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation()
        || matches!(
            c,
            '\u{2018}' | '\u{2019}' | '\u{201C}' | '\u{201D}' // curly quotes
                | '\u{2026}' | '\u{2013}' | '\u{2014}' | '\u{00B7}' // ellipsis, dashes, middle dot
                | '\u{00A1}' | '\u{00BF}' | '\u{00AB}' | '\u{00BB}' // inverted marks, guillemets
                | '。' | '、' | '，' | '！' | '？' | '；' | '：'
                | '「' | '」' | '『' | '』' | '（' | '）'
                | '〈' | '〉' | '《' | '》'
        )
}
