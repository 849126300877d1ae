use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use crate::error::Result;
use crate::indexed_min_heap::IndexedMinHeap;

/// A cloneable handle to one [`IndexedMinHeap`] behind a single async lock.
///
/// Each method holds the lock for the whole operation, so calls from
/// different tasks never interleave. Use [`lock`](Self::lock) when several
/// operations must happen without anyone else getting in between.
#[derive(Debug)]
pub struct SharedIndexedMinHeap<K, P> {
    heap: Arc<Mutex<IndexedMinHeap<K, P>>>,
}

impl<K, P> Clone for SharedIndexedMinHeap<K, P> {
    fn clone(&self) -> Self {
        Self {
            heap: self.heap.clone(),
        }
    }
}

impl<K, P> Default for SharedIndexedMinHeap<K, P> {
    fn default() -> Self {
        Self::from(IndexedMinHeap::default())
    }
}

impl<K, P> From<IndexedMinHeap<K, P>> for SharedIndexedMinHeap<K, P> {
    fn from(heap: IndexedMinHeap<K, P>) -> Self {
        Self {
            heap: Arc::new(Mutex::new(heap)),
        }
    }
}

impl<K, P> SharedIndexedMinHeap<K, P>
where
    K: Eq + std::hash::Hash + Clone,
    P: Ord + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to the underlying heap.
    pub async fn lock(&self) -> MutexGuard<'_, IndexedMinHeap<K, P>> {
        self.heap.lock().await
    }

    pub async fn len(&self) -> usize {
        self.heap.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.heap.lock().await.is_empty()
    }

    pub async fn insert(&self, key: K, priority: P) {
        self.heap.lock().await.insert(key, priority);
    }

    pub async fn peek(&self) -> Result<(K, P)> {
        self.heap.lock().await.peek()
    }

    pub async fn extract_min(&self) -> Result<(K, P)> {
        self.heap.lock().await.extract_min()
    }

    pub async fn delete(&self, key: &K) -> Result<(K, P)> {
        self.heap.lock().await.delete(key)
    }

    pub async fn change_priority(&self, key: &K, new_priority: P) -> Result<P> {
        self.heap.lock().await.change_priority(key, new_priority)
    }

    pub async fn select(&self, key: &K) -> Result<Vec<P>> {
        self.heap.lock().await.select(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HeapError;

    #[tokio::test]
    async fn it_works() {
        let heap = SharedIndexedMinHeap::new();
        assert!(heap.is_empty().await);
        assert_eq!(heap.peek().await, Err(HeapError::EmptyContainer));

        heap.insert("a", 3).await;
        heap.insert("b", 1).await;
        heap.insert("a", 2).await;

        assert_eq!(heap.len().await, 3);
        assert_eq!(heap.peek().await, Ok(("b", 1)));
        assert_eq!(
            heap.change_priority(&"a", 0).await,
            Err(HeapError::AmbiguousKey { occurrences: 2 })
        );

        let (_, removed) = heap.delete(&"a").await.unwrap();
        assert!(removed == 2 || removed == 3);
        assert_eq!(heap.change_priority(&"a", 0).await, Ok(5 - removed));
        assert_eq!(heap.select(&"a").await, Ok(vec![0]));
        assert_eq!(heap.extract_min().await, Ok(("a", 0)));
        assert_eq!(heap.extract_min().await, Ok(("b", 1)));
        assert_eq!(heap.extract_min().await, Err(HeapError::EmptyContainer));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_inserts() {
        let heap = SharedIndexedMinHeap::new();

        let mut handles = Vec::new();
        for task in 0..8u32 {
            let heap = heap.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..50u32 {
                    heap.insert(task, task * 50 + i).await;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let guard = heap.lock().await;
        guard.assert_invariants();
        assert_eq!(guard.len(), 400);
        for task in 0..8u32 {
            assert_eq!(guard.occurrences(&task), 50);
        }
        let sorted: Vec<_> = guard.clone().into_sorted_vec();
        drop(guard);

        let priorities: Vec<_> = sorted.into_iter().map(|(_, p)| p).collect();
        assert_eq!(priorities, (0..400).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_compound_operation_under_lock() {
        let heap = SharedIndexedMinHeap::from(IndexedMinHeap::heapify(vec![
            ("dee", 684),
            ("dee", 275),
            ("vlad", 285),
        ]));

        {
            let mut guard = heap.lock().await;
            while guard.occurrences(&"dee") > 1 {
                guard.delete(&"dee").unwrap();
            }
            guard.change_priority(&"dee", 7).unwrap();
        }

        assert_eq!(heap.peek().await, Ok(("dee", 7)));
        assert_eq!(heap.len().await, 2);
    }
}
