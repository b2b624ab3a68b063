use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use minisql::{Database, RowValue};
use std::hint::black_box;

fn setup_populated_db(n: usize) -> Database {
    let mut db = Database::new("");

    db.execute(b"CREATE TABLE users (id INT, name VARCHAR, age INT, team VARCHAR)")
        .unwrap();

    let table = db.get_table_mut("users").unwrap();

    for i in 0..n {
        let row = [
            RowValue::new("id", i.to_string()),
            RowValue::new("name", format!("user{}", i)),
            RowValue::new("age", (i % 100).to_string()),
            RowValue::new("team", if i % 2 == 0 { "red" } else { "blue" }),
        ];
        table.insert(&row).unwrap();
    }
    db
}

fn bench_insert_sql(c: &mut Criterion) {
    let mut group = c.benchmark_group("Insert_SQL_Pipeline");
    group.bench_function("insert_single_row_sql", |b| {
        let mut db = Database::new("");
        db.execute(b"CREATE TABLE tests (id INT)").unwrap();
        b.iter(|| {
            db.execute(black_box(b"INSERT INTO tests (id) VALUES (42)"))
                .unwrap();
        });
    });
    group.finish();
}

fn bench_select_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("Select_Where_Performance");

    for n in [1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, &n| {
            let db = setup_populated_db(n);
            b.iter(|| {
                let res = db.query("SELECT * FROM users WHERE age = 42").unwrap();
                black_box(res);
            });
        });
    }
    group.finish();
}

fn bench_select_sorted(c: &mut Criterion) {
    let mut group = c.benchmark_group("Select_Order_By_Performance");

    for n in [1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, &n| {
            let mut db = setup_populated_db(n);
            b.iter(|| {
                let res = db
                    .execute(b"SELECT id, age FROM users WHERE 10 < age <= 60 ORDER BY age DESC, id")
                    .unwrap();
                black_box(res);
            });
        });
    }
    group.finish();
}

fn bench_update_performance(c: &mut Criterion) {
    let mut group = c.benchmark_group("Update_Performance");

    for n in [1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, &n| {
            b.iter_with_setup(
                || setup_populated_db(n),
                |mut db| {
                    db.execute(b"UPDATE users (age) VALUES (99) WHERE team = 'red'")
                        .unwrap();
                    black_box(db);
                },
            );
        });
    }
    group.finish();
}

fn bench_delete_performance(c: &mut Criterion) {
    let mut group = c.benchmark_group("Delete_Performance");

    for n in [1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, &n| {
            b.iter_with_setup(
                || setup_populated_db(n),
                |mut db| {
                    db.execute(b"DELETE FROM users WHERE age > 90").unwrap();
                    black_box(db);
                },
            );
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_insert_sql,
    bench_select_scaling,
    bench_select_sorted,
    bench_update_performance,
    bench_delete_performance
);
criterion_main!(benches);
