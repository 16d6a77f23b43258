//! Maximum-weight bipartite assignment over small score matrices.
//!
//! Rows and columns arrive in tie-break order (lexicographic table names), so
//! both solvers prefer lower indices when scores are equal.

use std::cmp::Ordering;

/// Exact assignment maximizing the total score.
///
/// Solves the square-padded minimum-cost problem with cost `1 - score`
/// (Kuhn-Munkres with potentials, O(n^3)). Padding cells cost 1.0, i.e. a
/// score of zero. Returns `(row, column)` pairs for real cells, sorted by row.
pub fn hungarian(scores: &[Vec<f64>]) -> Vec<(usize, usize)> {
    let rows = scores.len();
    let cols = scores.iter().map(Vec::len).max().unwrap_or(0);
    if rows == 0 || cols == 0 {
        return Vec::new();
    }
    let n = rows.max(cols);
    let cost = |i: usize, j: usize| -> f64 {
        scores
            .get(i)
            .and_then(|row| row.get(j))
            .map_or(1.0, |s| 1.0 - sanitize(*s))
    };

    // 1-indexed potentials; p[j] is the row matched to column j, 0 = free.
    let mut u = vec![0.0_f64; n + 1];
    let mut v = vec![0.0_f64; n + 1];
    let mut p = vec![0_usize; n + 1];
    let mut way = vec![0_usize; n + 1];

    for i in 1..=n {
        p[0] = i;
        let mut j0 = 0;
        let mut minv = vec![f64::INFINITY; n + 1];
        let mut used = vec![false; n + 1];
        loop {
            used[j0] = true;
            let i0 = p[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0;
            for j in 1..=n {
                if used[j] {
                    continue;
                }
                let cur = cost(i0 - 1, j - 1) - u[i0] - v[j];
                if cur < minv[j] {
                    minv[j] = cur;
                    way[j] = j0;
                }
                if minv[j] < delta {
                    delta = minv[j];
                    j1 = j;
                }
            }
            for j in 0..=n {
                if used[j] {
                    u[p[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }
            j0 = j1;
            if p[j0] == 0 {
                break;
            }
        }
        loop {
            let j1 = way[j0];
            p[j0] = p[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut out: Vec<(usize, usize)> = (1..=n)
        .filter_map(|j| {
            let i = p[j];
            let real = i >= 1 && i <= rows && j <= scores[i - 1].len();
            real.then(|| (i - 1, j - 1))
        })
        .collect();
    out.sort_unstable();
    out
}

/// Highest-score-first assignment.
///
/// Equal scores resolve by row index, then column index. Returns pairs
/// sorted by row.
pub fn greedy(scores: &[Vec<f64>]) -> Vec<(usize, usize)> {
    let mut cells: Vec<(f64, usize, usize)> = scores
        .iter()
        .enumerate()
        .flat_map(|(i, row)| row.iter().enumerate().map(move |(j, s)| (sanitize(*s), i, j)))
        .collect();
    cells.sort_by(|a, b| {
        b.0.total_cmp(&a.0)
            .then_with(|| a.1.cmp(&b.1))
            .then_with(|| a.2.cmp(&b.2))
    });

    let cols = scores.iter().map(Vec::len).max().unwrap_or(0);
    let mut row_used = vec![false; scores.len()];
    let mut col_used = vec![false; cols];
    let mut out = Vec::new();
    for (_, i, j) in cells {
        if row_used[i] || col_used[j] {
            continue;
        }
        row_used[i] = true;
        col_used[j] = true;
        out.push((i, j));
    }
    out.sort_unstable();
    out
}

/// Descending score order with name tie-breaks, shared by pairing stages.
pub(crate) fn by_score_then_names(
    a: (f64, &str, &str),
    b: (f64, &str, &str),
) -> Ordering {
    b.0.total_cmp(&a.0)
        .then_with(|| a.1.to_lowercase().cmp(&b.1.to_lowercase()))
        .then_with(|| a.1.cmp(b.1))
        .then_with(|| a.2.to_lowercase().cmp(&b.2.to_lowercase()))
        .then_with(|| a.2.cmp(b.2))
}

fn sanitize(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
