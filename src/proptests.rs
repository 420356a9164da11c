use crate::art::{SeekOp, Tree};
use crate::stream::{Stream, StreamId};

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::ops::Bound;

fn validate_tree<V>(t: &Tree<V>) {
    let issues = t.verify_integrity();
    assert!(issues.is_empty(), "tree integrity: {issues:?}");

    let keys: Vec<&[u8]> = t.iter().map(|(k, _)| k).collect();
    assert_eq!(keys.len(), t.len(), "iteration must visit every key");
    assert!(
        keys.windows(2).all(|w| w[0] < w[1]),
        "forward iteration must be strictly ascending"
    );

    let mut backward: Vec<&[u8]> = t.reverse_iter().map(|(k, _)| k).collect();
    backward.reverse();
    assert_eq!(backward, keys, "reverse iteration must mirror forward");
}

/// What the model says a seek should land on.
fn model_seek<'a>(m: &'a BTreeMap<Vec<u8>, u64>, probe: &[u8], op: SeekOp) -> Option<&'a [u8]> {
    let probe = probe.to_vec();
    let found = match op {
        SeekOp::Eq => m.get_key_value(&probe).map(|(k, _)| k),
        SeekOp::Ge => m.range(probe..).next().map(|(k, _)| k),
        SeekOp::Gt => m
            .range((Bound::Excluded(probe), Bound::Unbounded))
            .next()
            .map(|(k, _)| k),
        SeekOp::Le => m.range(..=probe).next_back().map(|(k, _)| k),
        SeekOp::Lt => m.range(..probe).next_back().map(|(k, _)| k),
        SeekOp::Start => m.keys().next(),
        SeekOp::End => m.keys().next_back(),
    };
    found.map(Vec::as_slice)
}

#[derive(Clone, Debug)]
enum Op<V> {
    Insert(Vec<u8>, V),
    Get(Vec<u8>),
}

fn key_strategy() -> impl Strategy<Value = Vec<u8>> + Clone {
    // A small alphabet that includes 0x00 so keys share prefixes, nest inside
    // each other and end where others continue with a zero byte.
    prop::collection::vec(prop::sample::select(vec![0u8, 1, b'a', b'b', b'c', 0xff]), 0..=12)
}

fn wide_key_strategy() -> impl Strategy<Value = Vec<u8>> + Clone {
    // Full byte range to push nodes through every fan-out class.
    prop::collection::vec(any::<u8>(), 0..=6)
}

fn ops_strategy(key: impl Strategy<Value = Vec<u8>> + Clone) -> impl Strategy<Value = Vec<Op<u64>>> {
    let op = prop_oneof![
        70 => (key.clone(), any::<u64>()).prop_map(|(k, v)| Op::Insert(k, v)),
        30 => key.prop_map(Op::Get),
    ];
    prop::collection::vec(op, 0..=1500)
}

fn seek_op_strategy() -> impl Strategy<Value = SeekOp> {
    prop::sample::select(vec![
        SeekOp::Eq,
        SeekOp::Ge,
        SeekOp::Le,
        SeekOp::Gt,
        SeekOp::Lt,
        SeekOp::Start,
        SeekOp::End,
    ])
}

fn run_ops(ops: Vec<Op<u64>>) -> Result<(Tree<u64>, BTreeMap<Vec<u8>, u64>), TestCaseError> {
    let mut t: Tree<u64> = Tree::new();
    let mut m: BTreeMap<Vec<u8>, u64> = BTreeMap::new();

    for op in ops {
        match op {
            Op::Insert(key, value) => {
                let old_t = t.insert(&key, value);
                let old_m = m.insert(key, value);
                prop_assert_eq!(old_t, old_m);
            }
            Op::Get(key) => {
                prop_assert_eq!(t.get(&key).copied(), m.get(key.as_slice()).copied());
                prop_assert_eq!(t.contains_key(&key), m.contains_key(key.as_slice()));
            }
        }
        prop_assert_eq!(t.len(), m.len());
    }
    Ok((t, m))
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_narrow(ops in ops_strategy(key_strategy())) {
        let (t, m) = run_ops(ops)?;
        validate_tree(&t);
        let got: Vec<(Vec<u8>, u64)> = t.iter().map(|(k, v)| (k.to_vec(), *v)).collect();
        let expected: Vec<(Vec<u8>, u64)> = m.iter().map(|(k, v)| (k.clone(), *v)).collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_equivalence_wide(ops in ops_strategy(wide_key_strategy())) {
        let (t, m) = run_ops(ops)?;
        validate_tree(&t);
        let got: Vec<Vec<u8>> = t.iter().map(|(k, _)| k.to_vec()).collect();
        let expected: Vec<Vec<u8>> = m.keys().cloned().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_seek_matches_model(
        keys in prop::collection::vec(key_strategy(), 0..200),
        probes in prop::collection::vec((key_strategy(), seek_op_strategy()), 1..50),
    ) {
        let mut t: Tree<u64> = Tree::new();
        let mut m: BTreeMap<Vec<u8>, u64> = BTreeMap::new();
        for (i, k) in keys.into_iter().enumerate() {
            t.insert(&k, i as u64);
            m.insert(k, i as u64);
        }

        let mut cursor = t.cursor();
        for (probe, op) in probes {
            let expected = model_seek(&m, &probe, op);
            let found = cursor.seek_with_operation(&probe, op);
            prop_assert_eq!(found, expected.is_some(), "{} {:?}", op, probe);
            prop_assert_eq!(cursor.peek_key(), expected, "{} {:?}", op, probe);

            // Continuing forward from the seek walks the model's tail.
            if let Some(start) = expected {
                let tail: Vec<&[u8]> = cursor.by_ref().take(3).map(|(k, _)| k).collect();
                let model_tail: Vec<&[u8]> = m
                    .range(start.to_vec()..)
                    .take(3)
                    .map(|(k, _)| k.as_slice())
                    .collect();
                prop_assert_eq!(tail, model_tail);
            }
        }
    }

    #[test]
    fn prop_reverse_seek_mirrors(
        keys in prop::collection::vec(key_strategy(), 1..100),
        probe in key_strategy(),
        op in seek_op_strategy(),
    ) {
        let t: Tree<u64> = keys.iter().map(|k| (k, 0)).collect();
        let m: BTreeMap<Vec<u8>, u64> = keys.iter().map(|k| (k.clone(), 0)).collect();

        let mut cursor = t.cursor();
        cursor.seek_with_operation_reverse(&probe, op);
        let expected = model_seek(&m, &probe, op.mirror());
        prop_assert_eq!(cursor.peek_key(), expected);
        if let Some(start) = expected {
            let walked: Vec<&[u8]> = cursor.map(|(k, _)| k).collect();
            let model: Vec<&[u8]> = m
                .range(..=start.to_vec())
                .rev()
                .map(|(k, _)| k.as_slice())
                .collect();
            prop_assert_eq!(walked, model);
        }
    }

    #[test]
    fn prop_stream_id_codec(a_ms: u64, a_seq: u64, b_ms: u64, b_seq: u64) {
        let a = StreamId::new(a_ms, a_seq);
        let b = StreamId::new(b_ms, b_seq);
        prop_assert_eq!(StreamId::decode(&a.encode()), Some(a));
        prop_assert_eq!(a.cmp(&b), a.encode().cmp(&b.encode()));

        let parsed = StreamId::parse(&a.to_string(), true, 0).map(|p| p.id);
        prop_assert_eq!(parsed, Ok(a));
    }

    #[test]
    fn prop_stream_id_incr_decr(ms: u64, seq: u64) {
        let original = StreamId::new(ms, seq);
        let mut id = original;
        if id.incr().is_ok() {
            prop_assert!(id > original);
            prop_assert!(id.decr().is_ok());
            prop_assert_eq!(id, original);
        } else {
            prop_assert_eq!(original, StreamId::MAX);
        }
    }

    #[test]
    fn prop_stream_ids_monotonic(clock in prop::collection::vec(0u64..50, 1..200)) {
        let mut stream = Stream::new();
        let mut last = StreamId::MIN;
        for now in clock {
            let id = stream.append_at(now, vec![("n".to_owned(), now.to_string())]).unwrap();
            prop_assert!(id > last);
            last = id;
        }
        let ids: Vec<StreamId> = stream.iter().map(|(id, _)| id).collect();
        prop_assert_eq!(ids.len() as u64, stream.length());
        prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys: Vec<Vec<u8>> = vec![
        b"a".to_vec(),
        b"".to_vec(),
        b"a\0".to_vec(),
        b"aa".to_vec(),
        b"ab".to_vec(),
        b"b".to_vec(),
    ];

    for_each_permutation(&keys, |perm| {
        let mut t: Tree<u64> = Tree::new();
        let mut m: BTreeMap<Vec<u8>, u64> = BTreeMap::new();

        for (i, k) in perm.into_iter().enumerate() {
            let v = i as u64;
            assert_eq!(t.insert(&k, v), m.insert(k, v));
        }

        validate_tree(&t);
        let got: Vec<(Vec<u8>, u64)> = t.iter().map(|(k, v)| (k.to_vec(), *v)).collect();
        let expected: Vec<(Vec<u8>, u64)> = m.iter().map(|(k, v)| (k.clone(), *v)).collect();
        assert_eq!(got, expected);
    });
}

#[test]
fn exhaustive_seek_small_set() {
    let keys: Vec<Vec<u8>> = vec![b"ab".to_vec(), b"abc".to_vec(), b"b".to_vec(), b"ba".to_vec()];
    let probes: Vec<&[u8]> = vec![b"", b"a", b"ab", b"abb", b"abc", b"abcd", b"b", b"b\0", b"bb", b"c"];
    let ops = [SeekOp::Eq, SeekOp::Ge, SeekOp::Le, SeekOp::Gt, SeekOp::Lt];

    for_each_permutation(&keys, |perm| {
        let t: Tree<u64> = perm.iter().map(|k| (k, 0)).collect();
        let m: BTreeMap<Vec<u8>, u64> = perm.iter().map(|k| (k.clone(), 0)).collect();
        let mut cursor = t.cursor();
        for probe in &probes {
            for op in ops {
                cursor.seek_with_operation(probe, op);
                assert_eq!(cursor.peek_key(), model_seek(&m, probe, op), "{op} {probe:?} in {perm:?}");
            }
        }
    });
}

#[test]
fn randomized_stream_keys() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut t: Tree<u64> = Tree::new();
    let mut m: BTreeMap<Vec<u8>, u64> = BTreeMap::new();

    // Clustered timestamps make long shared prefixes with dense fan-out at the tail.
    for i in 0..20_000u64 {
        let id = StreamId::new(1_700_000_000_000 + rng.gen_range(0..5_000), rng.gen_range(0..300));
        t.insert(&id.encode(), i);
        m.insert(id.encode().to_vec(), i);
    }
    validate_tree(&t);
    assert_eq!(t.len(), m.len());

    let stats = t.stats();
    assert_eq!(stats.leaf_count, m.len());
    assert!(stats.node256_count > 0 || stats.node48_count > 0);

    let mut cursor = t.cursor();
    for _ in 0..2_000 {
        let probe = StreamId::new(1_700_000_000_000 + rng.gen_range(0..5_100), rng.gen_range(0..400));
        let key = probe.encode();
        let op = [SeekOp::Ge, SeekOp::Le, SeekOp::Gt, SeekOp::Lt][rng.gen_range(0..4)];
        cursor.seek_with_operation(&key, op);
        assert_eq!(cursor.peek_key(), model_seek(&m, &key, op));
    }
}

#[test]
fn randomized_stream_ranges() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut stream = Stream::new();
    let mut now = 1_000u64;
    let mut ids = Vec::new();
    for _ in 0..3_000 {
        now += rng.gen_range(0..3);
        ids.push(stream.append_at(now, Vec::new()).unwrap());
    }

    for _ in 0..500 {
        let a = StreamId::new(rng.gen_range(990..now + 10), rng.gen_range(0..4));
        let b = StreamId::new(rng.gen_range(990..now + 10), rng.gen_range(0..4));
        let (start, end) = if a <= b { (a, b) } else { (b, a) };

        let forward: Vec<StreamId> = stream
            .range(start, end, false)
            .map(|(id, _)| id)
            .take_while(|id| *id <= end)
            .collect();
        let expected: Vec<StreamId> = ids.iter().copied().filter(|id| *id >= start && *id <= end).collect();
        assert_eq!(forward, expected);

        let mut backward: Vec<StreamId> = stream
            .range(start, end, true)
            .map(|(id, _)| id)
            .take_while(|id| *id >= start)
            .collect();
        backward.reverse();
        assert_eq!(backward, expected);
    }
}
