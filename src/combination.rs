use crate::models::Transaction;

/// Only the largest candidates are searched; beyond this the search would
/// branch 2^n and some valid combinations are knowingly missed.
pub const MAX_CANDIDATES: usize = 10;

/// Find two or more transactions whose amounts add up to exactly `target`.
///
/// Candidates are tried largest first, include-before-exclude, and the first
/// hit wins. The result is not necessarily the smallest combination.
pub fn find_combination(candidates: &[Transaction], target: i64) -> Option<Vec<Transaction>> {
    if target <= 0 {
        return None;
    }
    let mut sorted: Vec<&Transaction> = candidates.iter().collect();
    sorted.sort_by(|a, b| b.amount.cmp(&a.amount));
    sorted.truncate(MAX_CANDIDATES);

    let amounts: Vec<i64> = sorted.iter().map(|t| t.amount).collect();
    let picked = search(&amounts, target, 0, 0, Vec::new())?;
    Some(picked.into_iter().map(|i| sorted[i].clone()).collect())
}

fn search(amounts: &[i64], target: i64, index: usize, sum: i64, chosen: Vec<usize>) -> Option<Vec<usize>> {
    if sum == target && chosen.len() >= 2 {
        return Some(chosen);
    }
    if sum > target || index == amounts.len() {
        return None;
    }

    let mut with = chosen.clone();
    with.push(index);
    if let Some(found) = search(amounts, target, index + 1, sum + amounts[index], with) {
        return Some(found);
    }
    search(amounts, target, index + 1, sum, chosen)
}
