use super::*;

use crate::compare::{natural, Compare};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
enum Op {
    Insert(u16, u32),
    Erase(u16),
    Get(u16),
    IndexDefault(u16),
    RemoveFront,
    CloneTree,
}

fn key_strategy() -> impl Strategy<Value = u16> + Clone {
    // Small key space so inserts, erases and lookups collide often.
    0u16..512
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let key = key_strategy();
    let op = prop_oneof![
        45 => (key.clone(), any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        25 => key.clone().prop_map(Op::Erase),
        20 => key.clone().prop_map(Op::Get),
        6 => key.clone().prop_map(Op::IndexDefault),
        3 => Just(Op::RemoveFront),
        1 => Just(Op::CloneTree),
    ];
    prop::collection::vec(op, 0..=2000)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_with_btreemap(ops in ops_strategy()) {
        let mut t: BstMap<u16, u32> = BstMap::new();
        let mut m: BTreeMap<u16, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    let (pos, inserted) = t.insert(key, value);
                    let old_m = m.insert(key, value);
                    prop_assert_eq!(inserted, old_m.is_none());
                    prop_assert_eq!(t.get_at(pos), Some((&key, &value)));
                }
                Op::Erase(key) => {
                    let removed_t = t.remove(&key);
                    let removed_m = m.remove_entry(&key);
                    prop_assert_eq!(removed_t, removed_m);
                    prop_assert_eq!(t.find(&key), t.end());
                }
                Op::Get(key) => {
                    prop_assert_eq!(t.get(&key), m.get(&key));
                    prop_assert_eq!(t.at(&key).ok(), m.get(&key));
                    prop_assert_eq!(t.contains_key(&key), m.contains_key(&key));
                }
                Op::IndexDefault(key) => {
                    let got_t = *t.get_or_insert_default(key);
                    let got_m = *m.entry(key).or_default();
                    prop_assert_eq!(got_t, got_m);
                }
                Op::RemoveFront => {
                    let removed_t = t.cursor_front_mut().remove_current();
                    let removed_m = m.pop_first();
                    prop_assert_eq!(removed_t, removed_m);
                }
                Op::CloneTree => {
                    let copy = t.clone();
                    copy.assert_invariants();
                    prop_assert_eq!(&copy, &t);
                    t = copy;
                }
            }

            prop_assert_eq!(t.len(), m.len());
        }

        t.assert_invariants();
        let got: Vec<(u16, u32)> = t.iter().map(|(k, v)| (*k, *v)).collect();
        let expected: Vec<(u16, u32)> = m.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(got, expected);

        let got_rev: Vec<u16> = t.keys().rev().copied().collect();
        let expected_rev: Vec<u16> = m.keys().rev().copied().collect();
        prop_assert_eq!(got_rev, expected_rev);
    }

    #[test]
    fn prop_reverse_comparator_iterates_descending(keys in prop::collection::vec(any::<i32>(), 0..300)) {
        let mut t = BstMap::with_comparator(natural().rev());
        for k in &keys {
            t.insert(*k, ());
        }
        t.assert_invariants();

        let mut expected = keys.clone();
        expected.sort_unstable_by(|a, b| b.cmp(a));
        expected.dedup();
        let got: Vec<i32> = t.keys().copied().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_positions_step_both_ways(keys in prop::collection::btree_set(any::<u32>(), 1..200)) {
        let t: BstMap<u32, ()> = keys.iter().map(|k| (*k, ())).collect();
        let sorted: Vec<u32> = keys.into_iter().collect();

        let mut pos = t.begin();
        for k in &sorted {
            prop_assert_eq!(t.get_at(pos).map(|(k, _)| *k), Some(*k));
            pos = t.successor(pos);
        }
        prop_assert_eq!(pos, t.end());

        for k in sorted.iter().rev() {
            pos = t.predecessor(pos);
            prop_assert_eq!(t.get_at(pos).map(|(k, _)| *k), Some(*k));
        }
        prop_assert_eq!(t.predecessor(pos), t.end());
    }

    #[test]
    fn prop_clone_is_independent(
        keys in prop::collection::vec(0u8..64, 0..100),
        erase in prop::collection::vec(0u8..64, 0..50),
        mutate_original in any::<bool>(),
    ) {
        let mut original: BstMap<u8, u8> = keys.iter().map(|k| (*k, *k)).collect();
        let mut copy = original.clone();

        // Mutate one side, then check the other still holds the initial pairs.
        let (changed, untouched) = if mutate_original {
            (&mut original, &copy)
        } else {
            (&mut copy, &original)
        };
        let snapshot: Vec<(u8, u8)> = untouched.iter().map(|(k, v)| (*k, *v)).collect();
        for k in &erase {
            changed.erase(k);
        }
        for v in changed.values_mut() {
            *v = v.wrapping_add(1);
        }
        changed.insert(200, 200);
        changed.assert_invariants();

        let after: Vec<(u8, u8)> = untouched.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(after, snapshot);
        prop_assert!(!untouched.contains_key(&200));
        untouched.assert_invariants();
    }
}

/// Calls `f` once per ordering of `items`, generated by swaps (Heap's method).
fn for_each_ordering<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    let mut current = items.to_vec();
    let mut swaps = vec![0usize; current.len()];
    f(current.clone());

    let mut level = 1;
    while level < current.len() {
        if swaps[level] < level {
            let other = if level % 2 == 0 { 0 } else { swaps[level] };
            current.swap(other, level);
            f(current.clone());
            swaps[level] += 1;
            level = 1;
        } else {
            swaps[level] = 0;
            level += 1;
        }
    }
}

#[test]
fn orderings_are_distinct_and_complete() {
    let mut seen = std::collections::HashSet::new();
    for_each_ordering(&[1, 2, 3, 4], |order| {
        assert!(seen.insert(order), "ordering produced twice");
    });
    assert_eq!(seen.len(), 24);
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys: Vec<u8> = vec![1, 2, 3, 4, 5, 6];

    for_each_ordering(&keys, |perm| {
        let mut t: BstMap<u8, usize> = BstMap::new();
        let mut m: BTreeMap<u8, usize> = BTreeMap::new();

        for (i, k) in perm.into_iter().enumerate() {
            let (_, inserted) = t.insert(k, i);
            assert_eq!(inserted, m.insert(k, i).is_none());
        }

        t.assert_invariants();
        let got: Vec<(u8, usize)> = t.iter().map(|(k, v)| (*k, *v)).collect();
        let expected: Vec<(u8, usize)> = m.into_iter().collect();
        assert_eq!(got, expected);
    });
}

#[test]
fn exhaustive_erase_order_small_set() {
    let keys: Vec<u8> = vec![4, 2, 6, 1, 3, 5, 7];

    // Insert in a fixed (balanced) order, then erase in every permutation so
    // that all three removal cases are hit at every depth.
    let mut base_tree: BstMap<u8, u8> = BstMap::new();
    let mut base_map: BTreeMap<u8, u8> = BTreeMap::new();
    for k in &keys {
        base_tree.insert(*k, *k * 10);
        base_map.insert(*k, *k * 10);
    }

    for_each_ordering(&keys, |perm| {
        let mut t = base_tree.clone();
        let mut m = base_map.clone();

        for k in perm {
            assert_eq!(t.remove(&k), m.remove_entry(&k));
            assert_eq!(t.len(), m.len());
            t.assert_invariants();
        }
        assert!(t.is_empty());
        assert_eq!(t.begin(), t.end());
    });
}

#[test]
fn shuffled_insert_then_cursor_drain() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut keys: Vec<u32> = (0..5_000).collect();
    keys.shuffle(&mut rng);

    let mut t: BstMap<u32, u32> = BstMap::new();
    for k in &keys {
        t.insert(*k, k.wrapping_mul(3));
    }
    t.assert_invariants();
    // Random insertion order keeps the tree shallow in practice.
    assert!(t.height() < 64, "height {} is unexpectedly deep", t.height());

    let mut c = t.cursor_front_mut();
    let mut expected = 0u32;
    while let Some((k, v)) = c.remove_current() {
        assert_eq!(k, expected);
        assert_eq!(v, k.wrapping_mul(3));
        expected += 1;
    }
    assert_eq!(expected, 5_000);
    assert!(t.is_empty());
    assert_eq!(t.begin(), t.end());
}

#[test]
fn random_erase_keeps_unrelated_positions_valid() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut keys: Vec<u32> = (0..400).collect();
    keys.shuffle(&mut rng);

    let mut t: BstMap<u32, u32> = BstMap::new();
    let positions: Vec<(u32, Position)> = keys.iter().map(|k| (*k, t.insert(*k, *k).0)).collect();

    // Leaves and one-child nodes are destroyed in place, so positions of every
    // other key must keep resolving to that key.
    let mut erased = std::collections::HashSet::new();
    for &(k, pos) in positions.iter().step_by(3) {
        if t.nodes.get(pos.0).child_count() == 2 {
            continue;
        }
        assert_eq!(t.erase(&k), 1);
        erased.insert(k);
    }
    for &(k, pos) in &positions {
        if !erased.contains(&k) {
            assert_eq!(t.get_at(pos).map(|(key, _)| *key), Some(k));
        }
    }
    t.assert_invariants();
}

#[test]
fn comparator_is_consulted_for_custom_order() {
    // Order by absolute value; -3 and 3 are the same key.
    let cmp = |a: &i32, b: &i32| a.abs().cmp(&b.abs());
    let mut t = BstMap::with_comparator(cmp);
    for k in [3, -1, 2, -3, 0] {
        t.insert(k, k);
    }
    assert_eq!(t.len(), 4);
    assert_eq!(t.comparator().compare(&-2, &1), std::cmp::Ordering::Greater);
    // The first-inserted key stays; the value is overwritten.
    assert_eq!(t.get_at(t.find(&-3)), Some((&3, &-3)));
    let keys: Vec<i32> = t.keys().copied().collect();
    assert_eq!(keys, vec![0, -1, 2, 3]);
}
