//! An indexed min-priority queue.
//!
//! [`IndexedMinHeap`] is a binary min-heap that also keeps, for every key,
//! the heap slots that key currently occupies. Keys may repeat.

mod error;
mod indexed_min_heap;
mod shared;

pub use error::{HeapError, Result};
pub use indexed_min_heap::IndexedMinHeap;
pub use shared::SharedIndexedMinHeap;
