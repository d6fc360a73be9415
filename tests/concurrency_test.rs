#![allow(missing_docs)]

use std::sync::{Arc, Barrier};
use std::thread;

use graphcode::{CodecRegistry, Graphcode, GraphcodeObject};
use rayon::prelude::*;

#[derive(Debug, Clone, PartialEq, GraphcodeObject)]
struct Reading {
    sensor: String,
    samples: Vec<f32>,
    parent: Option<Arc<Reading>>,
}

fn reading(i: usize) -> Reading {
    let parent = Arc::new(Reading {
        sensor: format!("hub-{}", i % 4),
        samples: vec![],
        parent: None,
    });
    Reading {
        sensor: format!("sensor-{i}"),
        samples: (0..i).map(|x| x as f32 * 0.5).collect(),
        parent: Some(parent),
    }
}

/// Parallel Calls
/// One engine serves many threads; each call keeps its own graph state.
#[test]
fn test_parallel_round_trips() -> graphcode::Result<()> {
    let codec = Graphcode::new();

    let results: graphcode::Result<Vec<bool>> = (0..64usize)
        .into_par_iter()
        .map(|i| {
            let value = reading(i);
            let bytes = codec.serialize(&value)?;
            Ok(codec.deserialize::<Reading>(&bytes)? == Some(value))
        })
        .collect();

    assert!(results?.into_iter().all(|ok| ok));
    Ok(())
}

/// Codec Races
/// Threads racing to build the same codec all end up with the same cached instance.
#[test]
fn test_codec_cache_converges() -> graphcode::Result<()> {
    let registry = Arc::new(CodecRegistry::new());
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry.codec_for::<Reading>()
            })
        })
        .collect();

    let mut codecs = Vec::new();
    for handle in handles {
        let codec = handle
            .join()
            .map_err(|_| graphcode::GraphcodeError::Internal("worker panicked".into()))??;
        codecs.push(codec);
    }

    let first = &codecs[0];
    assert!(codecs.iter().all(|c| Arc::ptr_eq(c, first)));
    assert!(Arc::ptr_eq(first, &registry.resolve(first.descriptor().name())?));
    Ok(())
}

/// Shared Engines
/// Clones of an engine share the registry.
#[test]
fn test_cloned_engine_shares_registry() -> graphcode::Result<()> {
    let codec = Graphcode::new();
    let clone = codec.clone();
    codec.register::<Reading>()?;
    assert!(Arc::ptr_eq(codec.registry(), clone.registry()));
    assert!(clone.registry().contains_name("concurrency_test::Reading"));
    Ok(())
}
