//! Handle manager and object pool lifecycle scenarios: validity across
//! release and reuse, expiry under the discard policy, and pool resets.

use plinth::collections::PagedVector;
use plinth::handle::{ExpiryPolicy, Handle, HandleManager, ObjectPool};

struct Texture;

#[test]
fn handles_stay_valid_until_released() {
    let mut manager = HandleManager::<Texture>::new(ExpiryPolicy::Discard);

    let handle = manager.acquire().unwrap();
    let copy = handle;

    assert!(manager.is_valid(handle));
    assert!(manager.is_valid(copy));
    assert_eq!(handle, copy);

    manager.release(handle).unwrap();

    assert!(!manager.is_valid(handle));
    assert!(!manager.is_valid(copy));
}

#[test]
fn reuse_never_aliases_a_live_handle() {
    let mut manager = HandleManager::<Texture>::new(ExpiryPolicy::Recycle);
    let mut live = Vec::new();

    for _ in 0..64 {
        live.push(manager.acquire().unwrap());
    }

    // Release every other handle, then acquire a fresh batch.
    let mut released = Vec::new();
    for i in (0..64).step_by(2) {
        manager.release(live[i]).unwrap();
        released.push(live[i]);
    }

    let fresh: Vec<_> = (0..32).map(|_| manager.acquire().unwrap()).collect();

    for handle in &fresh {
        // No fresh handle equals any still-live or released handle.
        for old in live.iter().chain(released.iter()) {
            if handle.value() == old.value() {
                assert_ne!(handle, old, "reused slot must change generation");
            }
        }

        assert!(manager.is_valid(*handle));
    }

    for i in (1..64).step_by(2) {
        assert!(manager.is_valid(live[i]));
    }
}

#[test]
fn discard_expiry_and_reset_expired() {
    let mut manager = HandleManager::<Texture>::new(ExpiryPolicy::Discard);
    let page = PagedVector::<u32>::PAGE_SIZE;
    let max = Handle::<Texture>::MAX_GENERATION;

    // Pin down the rest of the first page so slot 0 is the only slot the
    // scan can recycle, then burn through its generations.
    let mut held: Vec<_> = (0..page).map(|_| manager.acquire().unwrap()).collect();
    let mut handle = held.remove(0);
    assert_eq!(handle.value(), 0);

    for _ in 1..=max {
        manager.release(handle).unwrap();
        handle = manager.acquire().unwrap();

        if handle.value() != 0 {
            break;
        }
    }

    // The slot expired, so the manager had to move to a fresh page.
    assert_ne!(handle.value(), 0);

    manager.reset_expired().unwrap();

    // After the reset the slot comes back at generation 0.
    let mut reborn = None;
    for _ in 0..manager.len() {
        let h = manager.acquire().unwrap();
        if h.value() == 0 {
            reborn = Some(h);
            break;
        }
    }

    let reborn = reborn.expect("expired slot did not come back");
    assert_eq!(reborn.generation(), 0);
}

#[test]
fn pool_round_trip_with_default_reset() {
    let mut pool = ObjectPool::new(String::from("<empty>"), ExpiryPolicy::Discard);

    let a = pool.acquire().unwrap();
    let b = pool.acquire().unwrap();

    pool.set(a, String::from("mesh")).unwrap();
    pool.set(b, String::from("shader")).unwrap();

    assert_eq!(pool.get(a), "mesh");
    assert_eq!(pool.get(b), "shader");

    pool.release(a).unwrap();

    // Released slot reads the default through the stale handle.
    assert_eq!(pool.get(a), "<empty>");
    assert!(!pool.is_valid(a));
    assert!(pool.is_valid(b));

    // Setting through the stale handle is rejected and leaves state
    // untouched.
    assert!(pool.set(a, String::from("ghost")).is_err());
    assert_eq!(pool.get(a), "<empty>");
}

#[test]
fn pool_for_each_matches_live_set() {
    let mut pool = ObjectPool::new(0u64, ExpiryPolicy::Recycle);
    let mut live = std::collections::HashMap::new();

    for i in 0..100u64 {
        let handle = pool.acquire().unwrap();
        pool.set(handle, i).unwrap();
        live.insert(handle, i);
    }

    let to_release: Vec<_> = live
        .keys()
        .copied()
        .filter(|h| h.value() % 3 == 0)
        .collect();

    for handle in to_release {
        pool.release(handle).unwrap();
        live.remove(&handle);
    }

    let mut visited = std::collections::HashMap::new();
    pool.for_each(|handle, value| {
        visited.insert(handle, *value);
    });

    assert_eq!(visited, live);
}
