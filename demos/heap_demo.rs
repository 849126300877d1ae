use rand::Rng;
use tokio::time::{sleep, Duration};

use ipq::{HeapError, IndexedMinHeap, SharedIndexedMinHeap};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut rng = rand::thread_rng();
    let names = ["chang", "sheng", "alhazen", "dee", "guang", "jin"];

    let entries: Vec<_> = (0..12)
        .map(|i| (names[i % names.len()], rng.gen_range(1..2000)))
        .collect();
    println!("[Input] {:?}", entries);

    let mut heap = IndexedMinHeap::heapify(entries);
    print!("{}", heap);

    let (key, priority) = heap.delete(&"dee")?;
    println!("[Delete] {} at {}, {} left", key, priority, heap.occurrences(&"dee"));

    match heap.change_priority(&"chang", 0) {
        Ok(old) => println!("[Change] chang {} -> 0", old),
        Err(err @ HeapError::AmbiguousKey { .. }) => println!("[Change] chang: {}", err),
        Err(err) => return Err(err.into()),
    }

    let shared = SharedIndexedMinHeap::from(heap);
    let writer = shared.clone();
    let handle = tokio::spawn(async move {
        sleep(Duration::from_millis(10)).await;
        writer.insert("late", 1).await;
    });
    handle.await?;

    while let Ok((key, priority)) = shared.extract_min().await {
        println!("[Extract] {} {}", key, priority);
    }

    Ok(())
}
