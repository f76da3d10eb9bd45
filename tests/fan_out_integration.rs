//! Integration tests for multi-pointer fan-out
//!
//! These tests drive the full path: a registry of virtual workers, shards
//! scattered across them, a multi-pointer handle built from pointers, and
//! fan-out retrieval in every mode. No real networking is involved; the
//! worker trait is the boundary a production transport plugs into.

use std::sync::Arc;
use std::time::Duration;
use tensormesh::{
    Gathered, MultiPointerTensor, ObjectId, PointerTensor, Tensor, TensorMeshError,
    VirtualWorker, Worker, WorkerId, WorkerRegistry,
};

/// Register `n` workers, store one shard on each (worker i holds a tensor
/// filled with i+1), and return the registry plus non-gc pointers to the
/// shards in registration order.
async fn scatter_shards(
    n: u32,
    shape: Vec<usize>,
) -> (WorkerRegistry, Vec<Arc<VirtualWorker>>, Vec<PointerTensor>) {
    let registry = WorkerRegistry::new();
    let mut workers = Vec::new();
    let mut pointers = Vec::new();

    for i in 0..n {
        let worker = Arc::new(VirtualWorker::new(format!("worker-{i}")));
        let object = ObjectId::random();
        worker
            .store_object(object, Tensor::filled(shape.clone(), (i + 1) as f32))
            .await
            .unwrap();
        pointers.push(
            worker
                .create_pointer(object)
                .unwrap()
                .with_garbage_collection(false),
        );
        registry.register(Arc::clone(&worker) as Arc<dyn Worker>).await;
        workers.push(worker);
    }

    (registry, workers, pointers)
}

#[tokio::test]
async fn fan_out_across_three_workers() {
    let (registry, _workers, pointers) = scatter_shards(3, vec![2, 2]).await;
    assert_eq!(registry.len().await, 3);

    let handle = MultiPointerTensor::new(pointers).unwrap();
    assert_eq!(handle.shape(), &[2, 2]);
    assert_eq!(handle.num_shards(), 3);

    // Unreduced: one tensor per shard, in construction order
    let shards = handle.get_shards().await.unwrap();
    assert_eq!(shards.len(), 3);
    for (i, shard) in shards.iter().enumerate() {
        assert_eq!(*shard, Tensor::filled(vec![2, 2], (i + 1) as f32));
    }

    // Reduced: elementwise sum of all shards (1 + 2 + 3 = 6)
    let sum = handle.get_sum().await.unwrap();
    assert_eq!(sum, Tensor::filled(vec![2, 2], 6.0));
}

#[tokio::test]
async fn reduced_equals_sum_of_unreduced() {
    let (_registry, _workers, pointers) = scatter_shards(5, vec![4]).await;
    let handle = MultiPointerTensor::new(pointers).unwrap();

    let shards = handle.get_shards().await.unwrap();
    let expected = Tensor::sum_all(&shards).unwrap();

    match handle.get(true).await.unwrap() {
        Gathered::Reduced(sum) => assert_eq!(sum, expected),
        other => panic!("expected reduced result, got {other:?}"),
    }
}

#[tokio::test]
async fn concurrent_fan_out_preserves_order_under_skewed_latency() {
    // First worker is the slowest; its shard must still come back first.
    let registry = WorkerRegistry::new();
    let mut pointers = Vec::new();

    for (i, delay_ms) in [60u64, 30, 5].iter().enumerate() {
        let worker = Arc::new(
            VirtualWorker::new(format!("worker-{i}"))
                .with_fetch_delay(Duration::from_millis(*delay_ms)),
        );
        let object = ObjectId::random();
        worker
            .store_object(object, Tensor::filled(vec![2], (i + 1) as f32))
            .await
            .unwrap();
        pointers.push(
            worker
                .create_pointer(object)
                .unwrap()
                .with_garbage_collection(false),
        );
        registry.register(worker).await;
    }

    let handle = MultiPointerTensor::new(pointers).unwrap();
    let shards = handle.get_shards().await.unwrap();

    assert_eq!(shards[0], Tensor::filled(vec![2], 1.0));
    assert_eq!(shards[1], Tensor::filled(vec![2], 2.0));
    assert_eq!(shards[2], Tensor::filled(vec![2], 3.0));
}

#[tokio::test]
async fn lost_shard_fails_whole_retrieval_but_partial_mode_recovers_rest() {
    let (_registry, workers, pointers) = scatter_shards(4, vec![3]).await;

    // Simulate a worker losing its object
    workers[2].forget_object(pointers[2].id_at_location());

    let handle = MultiPointerTensor::new(pointers).unwrap();

    // Default mode is all-or-nothing
    let err = handle.get(true).await.unwrap_err();
    assert!(matches!(err, TensorMeshError::ObjectMissing { .. }));

    // Partial mode returns the surviving shards and names the failure
    let partial = handle.get_partial().await;
    assert_eq!(partial.shards.len(), 3);
    assert_eq!(partial.failures.len(), 1);
    assert_eq!(partial.failures[0].0, WorkerId::from("worker-2"));

    let survivors: Vec<&WorkerId> = partial.shards.iter().map(|(id, _)| id).collect();
    assert_eq!(
        survivors,
        vec![
            &WorkerId::from("worker-0"),
            &WorkerId::from("worker-1"),
            &WorkerId::from("worker-3"),
        ]
    );
}

#[tokio::test]
async fn gc_pointers_tear_down_remote_shards_after_get() {
    // Pointers with garbage collection enabled delete their remote shard
    // as a side effect of retrieval.
    let registry = WorkerRegistry::new();
    let mut workers = Vec::new();
    let mut pointers = Vec::new();

    for i in 0..3u32 {
        let worker = Arc::new(VirtualWorker::new(format!("worker-{i}")));
        let object = ObjectId::random();
        worker
            .store_object(object, Tensor::filled(vec![2, 2], 1.0))
            .await
            .unwrap();
        pointers.push(worker.create_pointer(object).unwrap());
        registry.register(Arc::clone(&worker) as Arc<dyn Worker>).await;
        workers.push(worker);
    }

    let handle = MultiPointerTensor::new(pointers).unwrap();
    let sum = handle.get_sum().await.unwrap();
    assert_eq!(sum, Tensor::filled(vec![2, 2], 3.0));

    for worker in &workers {
        assert_eq!(worker.num_objects(), 0);
    }

    // A second retrieval finds nothing
    let err = handle.get_sum().await.unwrap_err();
    assert!(matches!(err, TensorMeshError::ObjectMissing { .. }));
}

#[tokio::test]
async fn registry_resolves_handle_locations() {
    let (registry, _workers, pointers) = scatter_shards(3, vec![2]).await;
    let handle = MultiPointerTensor::new(pointers).unwrap();

    for location in handle.locations() {
        let worker = registry.get(location).await;
        assert!(worker.is_some(), "location {location} not registered");
        assert_eq!(worker.unwrap().id(), location);
    }
}
