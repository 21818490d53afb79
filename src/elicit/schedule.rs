//! Split schedule: which `(left, right)` deviation sizes a question may use.
//!
//! Steps grow one split group at a time, in increasing total deviation with
//! the larger share first. Each step lists the newest splits first so the
//! top-level search tries the freshly unlocked sizes before the old ones.

use super::types::Split;

/// Split groups in unlock order for `max_dev` and `n_criteria`.
fn split_groups(max_dev: usize, n_criteria: usize) -> Vec<Vec<Split>> {
    let mut groups = Vec::new();
    for deviation in 1..max_dev {
        for big in (deviation / 2 + 1..=deviation).rev() {
            let small = deviation + 1 - big;
            if small > n_criteria {
                continue;
            }
            let mut group = vec![(big, small)];
            if big != small {
                group.push((small, big));
            }
            groups.push(group);
        }
    }
    groups
}

/// One entry per outer pass: the cumulative splits unlocked so far,
/// newest first.
pub fn split_schedule(max_dev: usize, n_criteria: usize) -> Vec<Vec<Split>> {
    let mut steps = Vec::new();
    let mut unlocked: Vec<Split> = Vec::new();
    for group in split_groups(max_dev, n_criteria) {
        unlocked.extend(group);
        steps.push(unlocked.iter().rev().copied().collect());
    }
    steps
}

/// Lexicographic `size`-combinations of the sorted `items`.
pub(crate) fn combinations(items: &[usize], size: usize) -> Vec<Vec<usize>> {
    if size > items.len() {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut picks: Vec<usize> = (0..size).collect();
    loop {
        out.push(picks.iter().map(|&i| items[i]).collect());
        // Advance the rightmost index that still has room.
        let Some(pos) = (0..size).rev().find(|&i| picks[i] != i + items.len() - size) else {
            return out;
        };
        picks[pos] += 1;
        for i in pos + 1..size {
            picks[i] = picks[i - 1] + 1;
        }
    }
}
