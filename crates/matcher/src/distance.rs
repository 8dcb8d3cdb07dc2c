/// Levenshtein distance between `a` and `b`, counted in `char`s.
///
/// Keeps a single row sized to the shorter string: the longer string drives
/// the outer loop, the shorter one the inner loop. No case folding is done
/// here.
pub fn distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let (short, long) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };

    if short.is_empty() {
        return long.len();
    }

    // row[i] = distance(short[..i], long[..j]) for the current j
    let mut row: Vec<usize> = (0..=short.len()).collect();

    for (j, &lc) in long.iter().enumerate() {
        // row[0] before overwrite is the diagonal for i = 1
        let mut diag = row[0];
        row[0] = j + 1;

        for (i, &sc) in short.iter().enumerate() {
            let above = row[i + 1];
            let cell = if sc == lc {
                diag
            } else {
                1 + diag.min(above).min(row[i])
            };
            diag = above;
            row[i + 1] = cell;
        }
    }

    row[short.len()]
}
