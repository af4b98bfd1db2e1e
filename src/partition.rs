//! Helpers for the partition-keyed list shape most collections share.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Replaced,
}

/// Replaces the first element whose key equals the record's key, else appends.
pub fn upsert_by<T, K, F>(list: &mut Vec<T>, key_fn: F, record: T) -> Upsert
where
    K: PartialEq,
    F: Fn(&T) -> K,
{
    let key = key_fn(&record);
    match list.iter().position(|existing| key_fn(existing) == key) {
        Some(i) => {
            list[i] = record;
            Upsert::Replaced
        }
        None => {
            list.push(record);
            Upsert::Inserted
        }
    }
}

pub fn delete_where<T, F>(list: &mut Vec<T>, predicate: F) -> usize
where
    F: Fn(&T) -> bool,
{
    let before = list.len();
    list.retain(|item| !predicate(item));
    before - list.len()
}

/// Drops partitions whose list became empty.
pub fn prune_empty<T>(map: &mut BTreeMap<String, Vec<T>>) {
    map.retain(|_, list| !list.is_empty());
}

pub fn find_in_partitions<T, F>(map: &BTreeMap<String, Vec<T>>, predicate: F) -> Option<(String, usize)>
where
    F: Fn(&T) -> bool,
{
    map.iter().find_map(|(key, list)| {
        list.iter()
            .position(|item| predicate(item))
            .map(|i| (key.clone(), i))
    })
}

/// Removes matching items from every partition; returns how many were removed.
pub fn delete_in_partitions<T, F>(map: &mut BTreeMap<String, Vec<T>>, predicate: F) -> usize
where
    F: Fn(&T) -> bool,
{
    map.values_mut()
        .map(|list| delete_where(list, &predicate))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        key: &'static str,
        n: u32,
    }

    #[test]
    fn upsert_replaces_first_match_then_appends() {
        let mut list = vec![Row { key: "a", n: 1 }, Row { key: "b", n: 2 }];
        assert_eq!(upsert_by(&mut list, |r| r.key, Row { key: "a", n: 9 }), Upsert::Replaced);
        assert_eq!(upsert_by(&mut list, |r| r.key, Row { key: "c", n: 3 }), Upsert::Inserted);
        assert_eq!(
            list,
            vec![Row { key: "a", n: 9 }, Row { key: "b", n: 2 }, Row { key: "c", n: 3 }]
        );
    }

    #[test]
    fn delete_and_prune_leave_no_empty_partitions() {
        let mut map = BTreeMap::from([
            ("x".to_string(), vec![Row { key: "a", n: 1 }]),
            ("y".to_string(), vec![Row { key: "a", n: 2 }, Row { key: "b", n: 3 }]),
        ]);
        assert_eq!(delete_in_partitions(&mut map, |r| r.key == "a"), 2);
        prune_empty(&mut map);
        assert_eq!(map.len(), 1);
        assert_eq!(find_in_partitions(&map, |r| r.key == "b"), Some(("y".to_string(), 0)));
        assert_eq!(find_in_partitions(&map, |r| r.key == "a"), None);
    }
}
