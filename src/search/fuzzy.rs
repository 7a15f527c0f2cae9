//! Typo-tolerant substring matching
//!
//! Uses approximate substring edit distance (Sellers' variant of the
//! Levenshtein recurrence) so a misspelled query still matches anywhere
//! inside a longer field.

/// Smallest edit distance between `pattern` and any substring of `text`.
///
/// The match may start at any position of `text` without cost. `text` is
/// streamed once, so only one column of `pattern.len() + 1` cells is kept.
pub fn substring_distance(pattern: &[char], text: &str) -> usize {
    let m = pattern.len();
    if m == 0 {
        return 0;
    }

    let mut prev: Vec<usize> = (0..=m).collect();
    let mut curr: Vec<usize> = vec![0; m + 1];
    let mut best = m;

    for t in text.chars() {
        curr[0] = 0;
        for i in 1..=m {
            let cost = if pattern[i - 1] == t { 0 } else { 1 };
            curr[i] = (prev[i - 1] + cost) // substitution / match
                .min(prev[i] + 1) // extra text char
                .min(curr[i - 1] + 1); // missing text char
        }
        best = best.min(curr[m]);
        if best == 0 {
            return 0;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    best
}

/// [`substring_distance`] limited to `max` edits: `None` as soon as the
/// distance is known to exceed `max`.
///
/// Ukkonen's cut-off: only rows up to the last one still within `max` are
/// computed per column, and cells are clamped at `max + 1`. Work per text
/// char is O(max) instead of O(pattern length).
pub fn bounded_substring_distance(pattern: &[char], text: &str, max: usize) -> Option<usize> {
    let m = pattern.len();
    if m == 0 {
        return Some(0);
    }
    if max >= m {
        // every text aligns within m edits
        return Some(substring_distance(pattern, text));
    }

    let cap = max + 1;
    let mut prev: Vec<usize> = (0..=m).map(|i| i.min(cap)).collect();
    let mut curr: Vec<usize> = vec![cap; m + 1];
    // last row of `prev` still within max
    let mut last = max;
    let mut best = cap;

    for t in text.chars() {
        let rows = (last + 1).min(m);
        curr[0] = 0;
        for i in 1..=rows {
            let cost = if pattern[i - 1] == t { 0 } else { 1 };
            curr[i] = (prev[i - 1] + cost)
                .min(prev[i] + 1)
                .min(curr[i - 1] + 1)
                .min(cap);
        }
        if rows < m {
            curr[rows + 1] = cap;
        }

        last = rows;
        while last > 0 && curr[last] > max {
            last -= 1;
        }

        if rows == m {
            best = best.min(curr[m]);
            if best == 0 {
                return Some(0);
            }
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    (best <= max).then_some(best)
}

/// Normalized match score of `pattern` inside `text`: 0 = exact hit,
/// 1 = nothing in common. Both sides are expected lowercased.
pub fn match_score(pattern: &str, pattern_chars: &[char], text: &str) -> f64 {
    if pattern_chars.is_empty() || text.is_empty() {
        return 1.0;
    }
    if text.contains(pattern) {
        return 0.0;
    }
    let distance = substring_distance(pattern_chars, text);
    (distance as f64 / pattern_chars.len() as f64).min(1.0)
}

/// [`match_score`] for callers that only care about scores up to
/// `threshold`; `None` for anything worse.
pub fn match_score_within(
    pattern: &str,
    pattern_chars: &[char],
    text: &str,
    threshold: f64,
) -> Option<f64> {
    if pattern_chars.is_empty() || text.is_empty() || threshold < 0.0 {
        return None;
    }
    if text.contains(pattern) {
        return Some(0.0);
    }
    let m = pattern_chars.len();
    // slack absorbs float error in threshold * m; the final comparison decides
    let max_edits = ((threshold * m as f64) + 1e-9).floor() as usize;
    let distance = bounded_substring_distance(pattern_chars, text, max_edits)?;
    let score = (distance as f64 / m as f64).min(1.0);
    (score <= threshold).then_some(score)
}
