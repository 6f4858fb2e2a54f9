/// A word and the 1-based code-point column where it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordPosition {
    pub word: String,
    pub column: usize,
}

/// Splits `line` into maximal runs of letters. Digits, punctuation and
/// whitespace all separate words.
pub fn word_positions(line: &str) -> Vec<WordPosition> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut start = 1;
    for (i, ch) in line.chars().enumerate() {
        if ch.is_alphabetic() {
            if current.is_empty() {
                start = i + 1;
            }
            current.push(ch);
        } else if !current.is_empty() {
            out.push(WordPosition {
                word: std::mem::take(&mut current),
                column: start,
            });
        }
    }
    if !current.is_empty() {
        out.push(WordPosition {
            word: current,
            column: start,
        });
    }
    out
}

/// Edit distance over code points.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (curr[j] + 1).min(prev[j + 1] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
