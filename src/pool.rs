//! Bounded worker pool for the handful of operations that are safe to
//! parallelize across independent paths (§5): tree walking, change
//! analysis, clean-state validation, and index-entry construction. Plain
//! `std::thread::scope`, no async runtime, no work-stealing — a shared
//! index counter handed out to a fixed number of scoped threads.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Apply `f` to every item in `items`, spread across up to `worker_count`
/// scoped threads (clamped to `items.len()`, minimum 1). Results come back
/// in the same order as the input regardless of which thread produced
/// them.
pub fn map_parallel<T, R, F>(items: Vec<T>, worker_count: usize, f: F) -> Vec<R>
where
    T: Send,
    R: Send,
    F: Fn(T) -> R + Sync,
{
    if items.is_empty() {
        return Vec::new();
    }

    let worker_count = worker_count.max(1).min(items.len());
    if worker_count == 1 {
        return items.into_iter().map(f).collect();
    }

    let len = items.len();
    let next = AtomicUsize::new(0);
    let items: Vec<Mutex<Option<T>>> = items.into_iter().map(|i| Mutex::new(Some(i))).collect();
    let mut results: Vec<Mutex<Option<R>>> = Vec::with_capacity(len);
    for _ in 0..len {
        results.push(Mutex::new(None));
    }

    std::thread::scope(|scope| {
        for _ in 0..worker_count {
            scope.spawn(|| loop {
                let idx = next.fetch_add(1, Ordering::SeqCst);
                if idx >= len {
                    break;
                }
                let item = items[idx].lock().expect("pool item lock poisoned").take().unwrap();
                let result = f(item);
                *results[idx].lock().expect("pool result lock poisoned") = Some(result);
            });
        }
    });

    results
        .into_iter()
        .map(|m| m.into_inner().expect("pool result lock poisoned").expect("every index filled"))
        .collect()
}

/// The default worker width: the machine's available parallelism, falling
/// back to 1 if it can't be determined.
pub fn default_width() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_input_order() {
        let items: Vec<u32> = (0..50).collect();
        let results = map_parallel(items.clone(), 4, |n| n * 2);
        let expected: Vec<u32> = items.iter().map(|n| n * 2).collect();
        assert_eq!(results, expected);
    }

    #[test]
    fn single_worker_matches_sequential_map() {
        let items = vec![1, 2, 3, 4];
        let results = map_parallel(items.clone(), 1, |n| n + 1);
        assert_eq!(results, vec![2, 3, 4, 5]);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let results: Vec<i32> = map_parallel(Vec::new(), 4, |n| n);
        assert!(results.is_empty());
    }

    #[test]
    fn worker_count_clamped_above_item_count() {
        let items = vec![1, 2];
        let results = map_parallel(items, 100, |n| n * 10);
        assert_eq!(results, vec![10, 20]);
    }
}
