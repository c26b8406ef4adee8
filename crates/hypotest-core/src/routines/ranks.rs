// =============================================================================
// Ranking Helpers
// =============================================================================
//
// Rank-based tests (Spearman, Mann-Whitney, Wilcoxon, Kruskal-Wallis) all
// start from the same step: replace values by their 1-based ranks, giving
// tied values the average of the ranks they span. The sizes of the tie groups
// feed the variance corrections each test applies.
//
// =============================================================================

use std::cmp::Ordering;

/// Average ranks (1-based) plus the size of every tie group with more than
/// one member.
///
/// Values must be finite; callers check that before ranking.
pub fn rank_with_ties(values: &[f64]) -> (Vec<f64>, Vec<usize>) {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));

    let mut ranks = vec![0.0; n];
    let mut ties = Vec::new();

    let mut start = 0;
    while start < n {
        let mut end = start + 1;
        while end < n && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // Positions start..end share ranks start+1 ..= end
        let average = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = average;
        }
        if end - start > 1 {
            ties.push(end - start);
        }
        start = end;
    }

    (ranks, ties)
}

/// Average ranks (1-based).
pub fn rank_average(values: &[f64]) -> Vec<f64> {
    rank_with_ties(values).0
}

/// Σ (t³ − t) over tie group sizes.
pub fn tie_sum_cubed(ties: &[usize]) -> f64 {
    ties.iter()
        .map(|&t| {
            let t = t as f64;
            t * t * t - t
        })
        .sum()
}
