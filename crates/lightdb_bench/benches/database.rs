//! Database operation benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lightdb_core::{Config, Database, Defaults, Record, Value};
use lightdb_storage::{InMemoryBackend, StorageBackend};
use rand::Rng;
use std::sync::Arc;
use tempfile::TempDir;

fn memory_db(auto_save: bool) -> Database {
    let backend: Arc<dyn StorageBackend> = Arc::new(InMemoryBackend::new());
    Database::open_with_backend(Config::new().auto_save(auto_save), backend)
}

/// Fill `db` with `count` users under `users.u<n>`.
fn populate(db: &mut Database, count: usize) {
    let mut rng = rand::thread_rng();
    for i in 0..count {
        db.set(&format!("users.u{i}.age"), rng.gen_range(18..90i64))
            .unwrap();
        db.set(&format!("users.u{i}.name"), format!("user {i}"))
            .unwrap();
    }
}

/// Benchmark single sets without persistence.
fn bench_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("set");

    for depth in [1, 4, 16].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(depth), depth, |b, &depth| {
            let mut db = memory_db(false);
            let key = (0..depth).map(|i| format!("k{i}")).collect::<Vec<_>>().join(".");
            let mut n = 0i64;

            b.iter(|| {
                n += 1;
                db.set(black_box(&key), n).unwrap();
            });
        });
    }
    group.finish();
}

/// Benchmark sets that auto-save the whole document.
fn bench_set_auto_save(c: &mut Criterion) {
    let mut group = c.benchmark_group("set_auto_save");

    for size in [10, 1000].iter() {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let mut db = memory_db(true);
            populate(&mut db, size);
            let mut n = 0i64;

            b.iter(|| {
                n += 1;
                db.set("counter", black_box(n)).unwrap();
            });
            db.flush().unwrap();
        });
    }
    group.finish();
}

/// Benchmark point reads.
fn bench_get(c: &mut Criterion) {
    let mut db = memory_db(false);
    populate(&mut db, 1000);

    c.bench_function("get", |b| {
        b.iter(|| {
            let value = db.get(black_box("users.u500.name")).unwrap();
            black_box(value);
        });
    });
}

/// Benchmark capturing views versus deep snapshots.
fn bench_views(c: &mut Criterion) {
    let mut group = c.benchmark_group("views");
    let mut db = memory_db(false);
    populate(&mut db, 1000);

    group.bench_function("document", |b| b.iter(|| black_box(db.document())));
    group.bench_function("to_snapshot", |b| b.iter(|| black_box(db.to_snapshot())));
    group.finish();
}

/// Benchmark collection inserts and scans.
fn bench_collection(c: &mut Criterion) {
    let mut group = c.benchmark_group("collection");
    group.sample_size(20);

    let temp_dir = TempDir::new().unwrap();
    let mut db = Database::open(
        Config::new()
            .data_file(temp_dir.path().join("db.json"))
            .collections_folder(temp_dir.path().join("collections"))
            .auto_save(false),
    );
    let people = db
        .create_collection("people", Defaults::new().auto_increment("id", 1))
        .unwrap();
    for i in 0..1000i64 {
        let mut record = Record::new();
        record.insert("age".to_string(), Value::from(i % 90));
        people.insert(record).unwrap();
    }

    group.bench_function("insert", |b| {
        b.iter(|| people.insert(black_box(Record::new())).unwrap());
    });
    group.bench_function("find", |b| {
        b.iter(|| people.find(|r| r.get("age") == Some(&Value::from(42))).len());
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_set,
    bench_set_auto_save,
    bench_get,
    bench_views,
    bench_collection,
);
criterion_main!(benches);
