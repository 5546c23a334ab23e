use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rbmap::RBTreeMap;

const COUNT: u64 = 10_000;

fn shuffled_keys() -> Vec<u64> {
    let mut keys: Vec<u64> = (0..COUNT).collect();
    keys.shuffle(&mut StdRng::seed_from_u64(0xb4c0));
    keys
}

fn insert_sequential(c: &mut Criterion) {
    c.bench_function("insert_sequential", |b| {
        b.iter(|| {
            let mut tree = RBTreeMap::new();
            for key in 0..COUNT {
                tree.insert(black_box(key), !key);
            }
            tree
        })
    });
}

fn insert_shuffled(c: &mut Criterion) {
    let keys = shuffled_keys();
    c.bench_function("insert_shuffled", |b| {
        b.iter(|| {
            let mut tree = RBTreeMap::new();
            for key in &keys {
                tree.insert(black_box(*key), !*key);
            }
            tree
        })
    });
}

fn get_shuffled(c: &mut Criterion) {
    let keys = shuffled_keys();
    let mut tree = RBTreeMap::new();
    for key in &keys {
        tree.insert(*key, !*key);
    }
    c.bench_function("get_shuffled", |b| {
        b.iter(|| {
            for key in &keys {
                let _ = black_box(tree.get(black_box(key)));
            }
        })
    });
}

fn erase_shuffled(c: &mut Criterion) {
    let keys = shuffled_keys();
    let mut tree = RBTreeMap::new();
    for key in &keys {
        tree.insert(*key, !*key);
    }
    c.bench_function("erase_shuffled", |b| {
        b.iter_batched(
            || tree.clone(),
            |mut tree| {
                for key in &keys {
                    tree.erase(black_box(key));
                }
            },
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(
    benches,
    insert_sequential,
    insert_shuffled,
    get_shuffled,
    erase_shuffled
);
criterion_main!(benches);
