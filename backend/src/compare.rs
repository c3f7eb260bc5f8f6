//! Fuzzy text comparison for validating extracted verses against
//! reference output from other tools. Word-set similarity works well for
//! prose; single tokens fall back to a Levenshtein ratio.

#[derive(Debug, Clone)]
pub struct CompareOptions {
    /// Collapse runs of whitespace to single spaces before comparing.
    pub ignore_whitespace: bool,
    pub ignore_case: bool,
    pub ignore_punctuation: bool,
    /// Minimum similarity to count as a match.
    pub similarity_threshold: f64,
    /// Cap on diff output length.
    pub max_diff_lines: usize,
}

impl Default for CompareOptions {
    fn default() -> Self {
        CompareOptions {
            ignore_whitespace: true,
            ignore_case: false,
            ignore_punctuation: false,
            similarity_threshold: 0.99,
            max_diff_lines: 50,
        }
    }
}

impl CompareOptions {
    /// Exact matching, no normalization.
    pub fn strict() -> Self {
        CompareOptions {
            ignore_whitespace: false,
            ignore_case: false,
            ignore_punctuation: false,
            similarity_threshold: 1.0,
            max_diff_lines: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffKind {
    Added,
    Removed,
    Changed,
}

#[derive(Debug, Clone)]
pub struct DiffDetail {
    pub line: usize,
    pub kind: DiffKind,
    pub expected: String,
    pub actual: String,
}

#[derive(Debug, Clone)]
pub struct CompareResult {
    pub matched: bool,
    pub similarity: f64,
    pub diff: String,
    pub details: Vec<DiffDetail>,
}

pub fn compare(expected: &str, actual: &str, opts: &CompareOptions) -> CompareResult {
    let norm_expected = normalize(expected, opts);
    let norm_actual = normalize(actual, opts);

    if norm_expected == norm_actual {
        return CompareResult {
            matched: true,
            similarity: 1.0,
            diff: String::new(),
            details: Vec::new(),
        };
    }

    // Past the early return the normalized texts differ, and a threshold
    // of 1.0 means exact equality. Word-set similarity can still score
    // 1.0 on pure whitespace drift, so it must not decide here.
    let similarity = similarity(&norm_expected, &norm_actual);
    let matched = opts.similarity_threshold < 1.0 && similarity >= opts.similarity_threshold;
    CompareResult {
        matched,
        similarity,
        diff: generate_diff(expected, actual, opts.max_diff_lines),
        details: find_differences(expected, actual),
    }
}

fn normalize(text: &str, opts: &CompareOptions) -> String {
    let mut text = text.to_string();
    if opts.ignore_whitespace {
        text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    }
    if opts.ignore_case {
        text = text.to_lowercase();
    }
    if opts.ignore_punctuation {
        text.retain(|c| !c.is_ascii_punctuation());
    }
    text
}

/// Similarity in [0, 1]. Symmetric. Word-set matching over the larger
/// word count; character Levenshtein ratio when either side has no
/// word boundaries to speak of.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let words_a: Vec<&str> = a.split_whitespace().collect();
    let words_b: Vec<&str> = b.split_whitespace().collect();

    if words_a.len() <= 1 && words_b.len() <= 1 {
        let distance = levenshtein(a, b);
        let max_len = a.chars().count().max(b.chars().count());
        return 1.0 - distance as f64 / max_len as f64;
    }

    let mut used_b = vec![false; words_b.len()];
    let mut matches = 0usize;
    for word_a in &words_a {
        for (j, word_b) in words_b.iter().enumerate() {
            if !used_b[j] && word_a == word_b {
                matches += 1;
                used_b[j] = true;
                break;
            }
        }
    }

    let total = words_a.len().max(words_b.len());
    matches as f64 / total as f64
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            current[j + 1] = (prev[j + 1] + 1).min(current[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut current);
    }

    prev[b.len()]
}

fn generate_diff(expected: &str, actual: &str, max_lines: usize) -> String {
    let expected_lines: Vec<&str> = expected.split('\n').collect();
    let actual_lines: Vec<&str> = actual.split('\n').collect();

    let mut diff = String::from("--- expected\n+++ actual\n");
    let mut line_count = 0;

    for i in 0..expected_lines.len().max(actual_lines.len()) {
        if line_count >= max_lines {
            diff.push_str("... (truncated)\n");
            break;
        }
        let exp = expected_lines.get(i).copied().unwrap_or("");
        let act = actual_lines.get(i).copied().unwrap_or("");
        if exp != act {
            if !exp.is_empty() {
                diff.push('-');
                diff.push_str(exp);
                diff.push('\n');
                line_count += 1;
            }
            if !act.is_empty() {
                diff.push('+');
                diff.push_str(act);
                diff.push('\n');
                line_count += 1;
            }
        }
    }

    diff
}

fn find_differences(expected: &str, actual: &str) -> Vec<DiffDetail> {
    let expected_lines: Vec<&str> = expected.split('\n').collect();
    let actual_lines: Vec<&str> = actual.split('\n').collect();
    let mut details = Vec::new();

    for i in 0..expected_lines.len().max(actual_lines.len()) {
        let exp = expected_lines.get(i).copied().unwrap_or("");
        let act = actual_lines.get(i).copied().unwrap_or("");
        if exp != act {
            let kind = if exp.is_empty() {
                DiffKind::Added
            } else if act.is_empty() {
                DiffKind::Removed
            } else {
                DiffKind::Changed
            };
            details.push(DiffDetail {
                line: i + 1,
                kind,
                expected: exp.to_string(),
                actual: act.to_string(),
            });
        }
    }

    details
}
