//! Cross-container scenarios exercising the documented contracts end to
//! end, plus randomized stress runs against std reference containers.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use plinth::collections::{
    BitSet, Deque, HashTable, PagedVector, ResetPolicy, Ring, Set, Vector,
};
use plinth::mem::BitUtil;

#[test]
fn vector_growth_scenario() {
    let mut v = Vector::new();

    for i in 0..17 {
        v.push(i);
    }

    assert!(v.capacity() >= 17);
    assert!(BitUtil::is_power_of_two(v.capacity()));

    for i in 0..17 {
        assert_eq!(v[i], i);
    }
}

#[test]
fn paged_vector_pointer_stability_scenario() {
    let mut v = PagedVector::new();

    v.push(42u64);
    let p = &v[0] as *const u64;

    for _ in 0..10_000 {
        v.push(0);
    }

    assert_eq!(unsafe { *p }, 42);
    assert!(std::ptr::eq(p, &v[0]));
}

#[test]
fn deque_center_policy_scenario() {
    let mut d = Deque::new(ResetPolicy::Center);

    d.push_back(1);
    d.push_front(2);
    d.push_back(3);

    assert_eq!([d[0], d[1], d[2]], [2, 1, 3]);

    d.pop_front().unwrap();
    d.pop_front().unwrap();
    d.pop_back().unwrap();

    assert_eq!(d.first_index(), d.capacity() / 2);
    assert_eq!(d.last_index(), d.capacity() / 2);
}

#[test]
fn ring_wraparound_scenario() {
    let mut r = Ring::new(4).unwrap();

    for v in [1, 2, 3, 4] {
        r.enqueue_back(v).unwrap();
    }

    assert!(r.is_full());
    assert!(r.enqueue_back(9).is_err());

    r.dequeue_front().unwrap();
    r.dequeue_front().unwrap();
    r.enqueue_back(5).unwrap();
    r.enqueue_back(6).unwrap();

    let drained: Vec<i32> = std::iter::from_fn(|| r.dequeue_front().ok()).collect();
    assert_eq!(drained, vec![3, 4, 5, 6]);
}

#[test]
fn bitset_tracks_every_bit() {
    let mut bits = BitSet::new();
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut reference = Vec::new();

    for _ in 0..1_000 {
        let value: bool = rng.gen();
        bits.push(value);
        reference.push(value);
    }

    for (i, &expected) in reference.iter().enumerate() {
        assert_eq!(bits.get(i), Some(expected));
    }
}

#[test]
fn hash_table_tracks_reference_map() {
    let mut table = HashTable::new();
    let mut reference = std::collections::HashMap::new();
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    for _ in 0..20_000 {
        let key: u16 = rng.gen();

        match rng.gen_range(0..3) {
            0 | 1 => {
                let value: u64 = rng.gen();
                table.insert(key, value);
                reference.insert(key, value);
            }
            _ => {
                assert_eq!(table.erase(&key), reference.remove(&key).is_some());
            }
        }
    }

    assert_eq!(table.len(), reference.len());

    for (key, value) in reference.iter() {
        assert_eq!(table.get(key), Some(value));
    }

    let mut seen = 0;
    for (key, value) in table.iter() {
        assert_eq!(reference.get(key), Some(value));
        seen += 1;
    }
    assert_eq!(seen, reference.len());
}

#[test]
fn set_tracks_reference_set() {
    let mut set = Set::new();
    let mut reference = std::collections::HashSet::new();
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    for _ in 0..10_000 {
        let key: u16 = rng.gen();

        if rng.gen_bool(0.7) {
            set.insert(key);
            reference.insert(key);
        } else {
            assert_eq!(set.erase(&key), reference.remove(&key));
        }
    }

    assert_eq!(set.len(), reference.len());

    for key in reference.iter() {
        assert!(set.contains(key));
    }
}

#[test]
fn deque_mixed_ends_against_reference() {
    let mut deque = Deque::new(ResetPolicy::Center);
    let mut reference = std::collections::VecDeque::new();
    let mut rng = ChaCha8Rng::seed_from_u64(99);

    for _ in 0..5_000 {
        match rng.gen_range(0..4) {
            0 => {
                let v: u32 = rng.gen();
                deque.push_front(v);
                reference.push_front(v);
            }
            1 => {
                let v: u32 = rng.gen();
                deque.push_back(v);
                reference.push_back(v);
            }
            2 => {
                assert_eq!(deque.pop_front().ok(), reference.pop_front());
            }
            _ => {
                assert_eq!(deque.pop_back().ok(), reference.pop_back());
            }
        }

        assert_eq!(deque.len(), reference.len());
    }

    let collected: Vec<u32> = deque.iter().copied().collect();
    let expected: Vec<u32> = reference.iter().copied().collect();
    assert_eq!(collected, expected);
}

#[test]
fn paged_vector_insert_erase_against_reference() {
    let mut paged = PagedVector::new();
    let mut reference = Vec::new();
    let mut rng = ChaCha8Rng::seed_from_u64(1234);

    for _ in 0..3_000 {
        match rng.gen_range(0..3) {
            0 | 1 => {
                let index = rng.gen_range(0..=reference.len());
                let value: u32 = rng.gen();
                paged.insert(index, value).unwrap();
                reference.insert(index, value);
            }
            _ if !reference.is_empty() => {
                let start = rng.gen_range(0..reference.len());
                let end = rng.gen_range(start..=reference.len().min(start + 8));
                paged.erase(start, end).unwrap();
                reference.drain(start..end);
            }
            _ => {}
        }
    }

    assert_eq!(paged.len(), reference.len());

    for (i, expected) in reference.iter().enumerate() {
        assert_eq!(paged[i], *expected);
    }
}
