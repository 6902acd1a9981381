use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::combination::find_combination;
use crate::hierarchy::ClientTree;
use crate::models::{BankRecord, GroupMatchResult, MatchResult, Transaction};
use crate::names::names_match;

/// Deposit and order ids already used by earlier results in a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Consumed {
    pub record_ids: BTreeSet<i64>,
    pub transaction_ids: BTreeSet<i64>,
}

impl Consumed {
    pub fn from_matches(matches: &[MatchResult]) -> Self {
        Self {
            record_ids: matches.iter().map(|m| m.record.id).collect(),
            transaction_ids: matches.iter().map(|m| m.transaction.id).collect(),
        }
    }

    pub fn with_group(mut self, group: &GroupMatchResult) -> Self {
        self.record_ids.insert(group.record.id);
        self.transaction_ids
            .extend(group.transactions.iter().map(|t| t.id));
        self
    }

    pub fn has_record(&self, id: i64) -> bool {
        self.record_ids.contains(&id)
    }

    pub fn has_transaction(&self, id: i64) -> bool {
        self.transaction_ids.contains(&id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct GroupPass {
    pub matches: Vec<GroupMatchResult>,
    pub consumed: Consumed,
}

struct ClientGroup<'a> {
    root_id: i64,
    transactions: Vec<&'a Transaction>,
}

/// Outstanding, unconsumed orders bucketed by top-level client, buckets in
/// the order their first order appears.
fn group_by_root<'a>(
    transactions: &'a [Transaction],
    tree: &ClientTree,
    consumed: &Consumed,
) -> Vec<ClientGroup<'a>> {
    let mut groups: Vec<ClientGroup<'a>> = Vec::new();
    let mut index: HashMap<i64, usize> = HashMap::new();

    for txn in transactions {
        if !txn.is_outstanding() || consumed.has_transaction(txn.id) {
            continue;
        }
        let Some(root_id) = txn.client_id.and_then(|id| tree.root_id(id)) else {
            continue;
        };
        let slot = *index.entry(root_id).or_insert_with(|| {
            groups.push(ClientGroup {
                root_id,
                transactions: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].transactions.push(txn);
    }
    groups
}

/// Pair each leftover deposit with two or more orders from one client group
/// whose amounts add up to the deposit.
///
/// `consumed` holds what earlier passes already used; the returned snapshot
/// adds everything this pass used, so passes can be chained.
pub fn group_match(
    transactions: &[Transaction],
    records: &[BankRecord],
    tree: &ClientTree,
    consumed: &Consumed,
) -> GroupPass {
    let groups = group_by_root(transactions, tree, consumed);
    let mut consumed = consumed.clone();
    let mut matches = Vec::new();

    for record in records {
        if record.is_matched || consumed.has_record(record.id) {
            continue;
        }
        for group in &groups {
            let available: Vec<Transaction> = group
                .transactions
                .iter()
                .filter(|t| !consumed.has_transaction(t.id))
                .map(|t| (*t).clone())
                .collect();
            if available.len() < 2 {
                continue;
            }
            let Some(display_name) = tree.get(group.root_id).map(|c| c.name.as_str()) else {
                continue;
            };
            if !names_match(display_name, &record.depositor) {
                continue;
            }
            let Some(combo) = find_combination(&available, record.amount) else {
                continue;
            };

            debug!(
                record_id = record.id,
                client = display_name,
                parts = combo.len(),
                "group match"
            );
            let result = GroupMatchResult {
                transactions: combo,
                record: record.clone(),
                client_name: display_name.to_string(),
                total: record.amount,
            };
            consumed = consumed.with_group(&result);
            matches.push(result);
            break;
        }
    }

    GroupPass { matches, consumed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::fixtures::*;
    use crate::matcher::single_match;

    fn ids(group: &GroupMatchResult) -> Vec<i64> {
        group.transactions.iter().map(|t| t.id).collect()
    }

    #[test]
    fn test_sub_client_orders_combine_under_parent() {
        let xyz = client(1, "XYZ", None);
        let team_a = client(2, "XYZ 마케팅팀", Some(1));
        let team_b = client(3, "XYZ 영업팀", Some(1));
        let tree = ClientTree::build(&[xyz, team_a.clone(), team_b.clone()]).unwrap();
        let txns = vec![
            order(10, Some(&team_a), 30_000, Some("2024-01-02")),
            order(11, Some(&team_b), 20_000, Some("2024-01-03")),
        ];
        let recs = vec![deposit(100, "XYZ", 50_000, "2024-01-10")];

        let pass = group_match(&txns, &recs, &tree, &Consumed::default());
        assert_eq!(pass.matches.len(), 1);
        let hit = &pass.matches[0];
        assert_eq!(ids(hit), vec![10, 11]);
        assert_eq!(hit.client_name, "XYZ");
        assert_eq!(hit.total, 50_000);
        assert_eq!(hit.record.id, 100);
        assert!(pass.consumed.has_record(100));
        assert!(pass.consumed.has_transaction(10) && pass.consumed.has_transaction(11));
    }

    #[test]
    fn test_top_level_client_own_orders_combine() {
        let abc = client(1, "ABC", None);
        let tree = ClientTree::build(&[abc.clone()]).unwrap();
        let txns = vec![
            order(10, Some(&abc), 12_000, None),
            order(11, Some(&abc), 8_000, None),
            order(12, Some(&abc), 5_000, None),
        ];
        let recs = vec![deposit(100, "(주)ABC", 20_000, "2024-05-01")];
        let pass = group_match(&txns, &recs, &tree, &Consumed::default());
        assert_eq!(ids(&pass.matches[0]), vec![10, 11]);
    }

    #[test]
    fn test_depositor_must_match_top_level_name() {
        let xyz = client(1, "XYZ", None);
        let team = client(2, "Studio Nine", Some(1));
        let tree = ClientTree::build(&[xyz, team.clone()]).unwrap();
        let txns = vec![
            order(10, Some(&team), 30_000, None),
            order(11, Some(&team), 20_000, None),
        ];
        let recs = vec![deposit(100, "Studio Nine", 50_000, "2024-01-10")];
        assert!(group_match(&txns, &recs, &tree, &Consumed::default()).matches.is_empty());
    }

    #[test]
    fn test_groups_do_not_mix_clients() {
        let abc = client(1, "ABC", None);
        let abcd = client(2, "ABCD", None);
        let tree = ClientTree::build(&[abc.clone(), abcd.clone()]).unwrap();
        let txns = vec![
            order(10, Some(&abc), 30_000, None),
            order(11, Some(&abcd), 20_000, None),
        ];
        let recs = vec![deposit(100, "ABCD", 50_000, "2024-01-10")];
        assert!(group_match(&txns, &recs, &tree, &Consumed::default()).matches.is_empty());
    }

    #[test]
    fn test_one_group_per_deposit_and_no_reuse() {
        let abc = client(1, "ABC", None);
        let tree = ClientTree::build(&[abc.clone()]).unwrap();
        let txns = vec![
            order(10, Some(&abc), 30_000, None),
            order(11, Some(&abc), 20_000, None),
            order(12, Some(&abc), 25_000, None),
            order(13, Some(&abc), 25_000, None),
        ];
        let recs = vec![
            deposit(100, "ABC", 50_000, "2024-01-10"),
            deposit(101, "ABC", 50_000, "2024-01-11"),
            deposit(102, "ABC", 50_000, "2024-01-12"),
        ];
        let pass = group_match(&txns, &recs, &tree, &Consumed::default());
        assert_eq!(pass.matches.len(), 2);
        assert_eq!(ids(&pass.matches[0]), vec![10, 11]);
        assert_eq!(ids(&pass.matches[1]), vec![12, 13]);
        assert_eq!(pass.matches[1].record.id, 101);
    }

    #[test]
    fn test_respects_incoming_snapshot() {
        let abc = client(1, "ABC", None);
        let tree = ClientTree::build(&[abc.clone()]).unwrap();
        let txns = vec![
            order(10, Some(&abc), 30_000, None),
            order(11, Some(&abc), 20_000, None),
            order(12, Some(&abc), 20_000, None),
        ];
        let recs = vec![
            deposit(100, "ABC", 50_000, "2024-01-10"),
            deposit(101, "ABC", 50_000, "2024-01-11"),
        ];
        let mut prior = Consumed::default();
        prior.record_ids.insert(100);
        prior.transaction_ids.insert(11);

        let pass = group_match(&txns, &recs, &tree, &prior);
        assert_eq!(pass.matches.len(), 1);
        assert_eq!(pass.matches[0].record.id, 101);
        assert_eq!(ids(&pass.matches[0]), vec![10, 12]);
        assert!(pass.consumed.has_transaction(11));
        // the input snapshot is untouched
        assert!(!prior.has_record(101));
    }

    #[test]
    fn test_after_single_pass_nothing_is_reused() {
        let abc = client(1, "ABC", None);
        let tree = ClientTree::build(&[abc.clone()]).unwrap();
        let txns = vec![
            order(10, Some(&abc), 50_000, None),
            order(11, Some(&abc), 30_000, None),
            order(12, Some(&abc), 20_000, None),
        ];
        let recs = vec![
            deposit(100, "ABC", 50_000, "2024-01-10"),
            deposit(101, "ABC", 50_000, "2024-01-11"),
        ];
        let singles = single_match(&txns, &recs);
        let pass = group_match(&txns, &recs, &tree, &Consumed::from_matches(&singles));
        assert_eq!(singles.len(), 1);
        assert_eq!(pass.matches.len(), 1);
        assert_eq!(pass.matches[0].record.id, 101);
        assert_eq!(ids(&pass.matches[0]), vec![11, 12]);
    }

    #[test]
    fn test_capped_search_misses_small_eleventh_order() {
        let abc = client(1, "ABC", None);
        let tree = ClientTree::build(&[abc.clone()]).unwrap();
        let mut txns: Vec<Transaction> = (0..10).map(|i| order(10 + i, Some(&abc), 10_000, None)).collect();
        txns.push(order(99, Some(&abc), 1_000, None));
        let recs = vec![deposit(100, "ABC", 11_000, "2024-01-10")];
        assert!(group_match(&txns, &recs, &tree, &Consumed::default()).matches.is_empty());
    }

    #[test]
    fn test_matched_deposits_and_clientless_orders_ignored() {
        let abc = client(1, "ABC", None);
        let tree = ClientTree::build(&[abc.clone()]).unwrap();
        let txns = vec![
            order(10, Some(&abc), 30_000, None),
            order(11, None, 20_000, None),
        ];
        let mut done = deposit(100, "ABC", 30_000, "2024-01-10");
        done.is_matched = true;
        let recs = vec![done, deposit(101, "ABC", 50_000, "2024-01-10")];
        assert!(group_match(&txns, &recs, &tree, &Consumed::default()).matches.is_empty());
    }
}
