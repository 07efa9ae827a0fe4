use super::*;

use proptest::prelude::*;
use std::collections::{BTreeMap, HashMap};

type Entry = (String, u64);

fn validate_table<R: Record, H: KeyHasher>(t: &ChainedTable<R, H>) {
    let mut reachable = 0usize;
    for index in 0..t.bucket_count() {
        for record in t.chain(index) {
            assert!(!record.key().is_empty(), "empty key reachable");
            assert_eq!(
                t.bucket_index(record.key()),
                index,
                "record {:?} stored in the wrong bucket",
                record.key()
            );
            reachable += 1;
        }
    }
    assert_eq!(reachable, t.len(), "reachable node count must match len");
    assert_eq!(t.iter().count(), t.len());
}

#[derive(Clone, Debug)]
enum Op {
    Insert(String, u64),
    Remove(String),
    Search(String),
    Clear,
}

fn key_strategy() -> impl Strategy<Value = String> + Clone {
    // Small alphabet so keys repeat and chains collide.
    "[A-D]{1,3}"
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let key = key_strategy();
    let op = prop_oneof![
        50 => (key.clone(), any::<u64>()).prop_map(|(k, v)| Op::Insert(k, v)),
        25 => key.clone().prop_map(Op::Remove),
        24 => key.clone().prop_map(Op::Search),
        1 => Just(Op::Clear),
    ];
    prop::collection::vec(op, 0..=500)
}

fn bucket_count_strategy() -> impl Strategy<Value = usize> {
    prop_oneof![Just(1usize), Just(2), Just(11), Just(101)]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 10_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_replace_matches_btreemap(ops in ops_strategy(), buckets in bucket_count_strategy()) {
        let mut t: ChainedTable<Entry> = ChainedTable::new(buckets);
        let mut m: BTreeMap<String, u64> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    let old_t = t.insert((key.clone(), value)).unwrap().map(|e| e.1);
                    let old_m = m.insert(key, value);
                    prop_assert_eq!(old_t, old_m);
                }
                Op::Remove(key) => {
                    let old_t = t.remove(&key).map(|e| e.1);
                    let old_m = m.remove(&key);
                    prop_assert_eq!(old_t, old_m);
                    prop_assert!(!t.contains_key(&key));
                }
                Op::Search(key) => {
                    prop_assert_eq!(t.search(&key).map(|e| e.1), m.get(&key).copied());
                }
                Op::Clear => {
                    t.clear();
                    m.clear();
                }
            }

            prop_assert_eq!(t.len(), m.len());
        }

        validate_table(&t);
        let mut got: Vec<Entry> = t.iter().cloned().collect();
        got.sort();
        let expected: Vec<Entry> = m.into_iter().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_prepend_matches_stack_model(ops in ops_strategy(), buckets in bucket_count_strategy()) {
        let mut t: ChainedTable<Entry> = ChainedTable::with_config(Config {
            bucket_count: buckets,
            policy: InsertPolicy::Prepend,
        }).unwrap();
        // Per key, the values still stored, oldest first.
        let mut m: HashMap<String, Vec<u64>> = HashMap::new();
        let mut inserted = 0usize;

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    prop_assert_eq!(t.insert((key.clone(), value)).unwrap(), None);
                    m.entry(key).or_default().push(value);
                    inserted += 1;
                }
                Op::Remove(key) => {
                    let len_before = t.len();
                    let old_t = t.remove(&key).map(|e| e.1);
                    let old_m = m.get_mut(&key).and_then(|stack| stack.pop());
                    prop_assert_eq!(old_t, old_m);
                    if old_t.is_some() {
                        prop_assert_eq!(t.len(), len_before - 1);
                        inserted -= 1;
                    } else {
                        prop_assert_eq!(t.len(), len_before);
                    }
                }
                Op::Search(key) => {
                    let newest = m.get(&key).and_then(|stack| stack.last().copied());
                    prop_assert_eq!(t.search(&key).map(|e| e.1), newest);
                }
                Op::Clear => {
                    t.clear();
                    m.clear();
                    inserted = 0;
                }
            }

            prop_assert_eq!(t.len(), inserted);
        }

        validate_table(&t);
    }

    #[test]
    fn prop_search_after_insert(keys in prop::collection::vec("[a-z0-9]{1,12}", 1..200)) {
        let mut t: ChainedTable<String> = ChainedTable::new(11);
        for key in &keys {
            t.insert(key.clone()).unwrap();
            prop_assert_eq!(t.search(key), Some(key));
        }
        for key in &keys {
            prop_assert!(t.contains_key(key));
        }
        validate_table(&t);
    }
}

#[test]
fn exhaustive_remove_order_small_set() {
    let keys = ["a", "b", "c", "aa", "ab", "ba"];

    fn permutations(items: &[&'static str]) -> Vec<Vec<&'static str>> {
        if items.len() <= 1 {
            return vec![items.to_vec()];
        }
        let mut out = Vec::new();
        for i in 0..items.len() {
            let mut rest = items.to_vec();
            let head = rest.remove(i);
            for mut tail in permutations(&rest) {
                tail.insert(0, head);
                out.push(tail);
            }
        }
        out
    }

    let mut base: ChainedTable<String> = ChainedTable::new(2);
    for k in keys {
        base.insert(k.to_string()).unwrap();
    }

    for perm in permutations(&keys) {
        let mut t = base.clone();
        for (removed, k) in perm.iter().enumerate() {
            assert_eq!(t.remove(k).as_deref(), Some(*k));
            assert_eq!(t.len(), keys.len() - removed - 1);
            validate_table(&t);
        }
        assert!(t.is_empty());
    }
}
