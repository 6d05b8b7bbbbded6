use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use kanban_core::model::{Board, Column, Task};
use kanban_core::ordering;
use kanban_core::protocol::decode_frame;
use kanban_core::store::{BoardEvent, BoardStore};
use kanban_core::trial;

fn make_tasks(columns: i64, per_column: i64) -> Vec<Task> {
    (0..columns)
        .flat_map(|column| {
            (0..per_column).map(move |index| Task {
                board: "bench".to_string(),
                column,
                task_id: column * per_column + index,
                task_index: index,
                text: format!("Task {index}"),
                updated_at: String::new(),
            })
        })
        .collect()
}

fn make_columns(count: i64) -> Vec<Column> {
    (0..count)
        .map(|index| Column {
            board: "bench".to_string(),
            column_id: index,
            column_title: format!("Column {index}"),
            column_index: index,
            wip_limit_on: false,
            wip_limit: 5,
            updated_at: String::new(),
        })
        .collect()
}

fn bench_move_task(c: &mut Criterion) {
    let mut group = c.benchmark_group("move_task");
    for per_column in [10, 100, 1000] {
        let tasks = make_tasks(5, per_column);
        group.bench_with_input(BenchmarkId::new("within", per_column), &tasks, |b, tasks| {
            b.iter(|| {
                black_box(ordering::move_task(
                    0,
                    0,
                    black_box(per_column - 1),
                    0,
                    0,
                    tasks.clone(),
                ))
            })
        });
        group.bench_with_input(BenchmarkId::new("across", per_column), &tasks, |b, tasks| {
            b.iter(|| {
                black_box(ordering::move_task(
                    0,
                    0,
                    black_box(per_column / 2),
                    0,
                    1,
                    tasks.clone(),
                ))
            })
        });
    }
    group.finish();
}

fn bench_delete_column(c: &mut Criterion) {
    let columns = make_columns(50);
    c.bench_function("delete_column_50", |b| {
        b.iter(|| black_box(ordering::delete_column(black_box(0), columns.clone())))
    });
}

fn bench_decode_board_loaded(c: &mut Criterion) {
    let mut board: Board = trial::trial_board();
    board.tasks = make_tasks(3, 200);
    let data = serde_json::to_value(&board).unwrap();
    let text = serde_json::json!({ "code": "BOARD_LOADED", "data": data }).to_string();

    c.bench_function("decode_board_loaded_600_tasks", |b| {
        b.iter(|| black_box(decode_frame(black_box(&text)).unwrap()))
    });
}

fn bench_store_optimistic_move(c: &mut Criterion) {
    c.bench_function("store_trial_move_task", |b| {
        b.iter_custom(|iters| {
            let mut store = BoardStore::new();
            store.dispatch(BoardEvent::LoadTrialBoard);
            let Some(board) = store.state().board.as_ref() else {
                return std::time::Duration::ZERO;
            };
            let first = board.sorted_columns()[0].column_id;
            let second = board.sorted_columns()[1].column_id;
            let task_id = board.tasks[0].task_id;

            let start = std::time::Instant::now();
            for i in 0..iters {
                let (from, to) = if i % 2 == 0 { (first, second) } else { (second, first) };
                store.dispatch(BoardEvent::MoveTask {
                    task_id,
                    old_index: 0,
                    new_index: 0,
                    old_column: from,
                    new_column: to,
                });
            }
            start.elapsed()
        })
    });
}

criterion_group!(
    benches,
    bench_move_task,
    bench_delete_column,
    bench_decode_board_loaded,
    bench_store_optimistic_move,
);
criterion_main!(benches);
