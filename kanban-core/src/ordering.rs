//! Dense index reassignment for columns and tasks.
//!
//! Every item carries an ordinal position inside a group: columns share a
//! single board-wide group, tasks are grouped by their owning column. After
//! any operation here the positions of each group are `0..len` with no gaps
//! and no duplicates, provided they were before.
//!
//! The same functions serve optimistic local edits and server-driven
//! replays, so both sides clamp and shift identically:
//!
//! ```text
//! move_within(c, 2 → 0)       move_across(t, X:2 → Y:5)
//! [a0 b1 c2]                  X: [p0 q1 t2 r3]   Y: [s0]
//!     │                           │                 │
//!     ▼                           ▼                 ▼
//! [c0 a1 b2]                  X: [p0 q1 r2]      Y: [s0 t1]   (5 clamped to 1)
//! ```
//!
//! Callers pass well-formed collections; unknown ids or indices simply leave
//! the input untouched.

use crate::model::{Column, Task};

/// Group shared by every column of a board.
pub const BOARD_GROUP: i64 = 0;

/// An item with an ordinal position inside a group.
pub trait Positioned {
    fn id(&self) -> i64;
    fn group(&self) -> i64;
    fn index(&self) -> i64;
    fn set_index(&mut self, index: i64);
    fn set_group(&mut self, group: i64);
}

impl Positioned for Column {
    fn id(&self) -> i64 {
        self.column_id
    }

    fn group(&self) -> i64 {
        BOARD_GROUP
    }

    fn index(&self) -> i64 {
        self.column_index
    }

    fn set_index(&mut self, index: i64) {
        self.column_index = index;
    }

    fn set_group(&mut self, _group: i64) {}
}

impl Positioned for Task {
    fn id(&self) -> i64 {
        self.task_id
    }

    fn group(&self) -> i64 {
        self.column
    }

    fn index(&self) -> i64 {
        self.task_index
    }

    fn set_index(&mut self, index: i64) {
        self.task_index = index;
    }

    fn set_group(&mut self, group: i64) {
        self.column = group;
    }
}

fn group_len<T: Positioned>(group: i64, items: &[T]) -> i64 {
    items.iter().filter(|item| item.group() == group).count() as i64
}

/// Remove the item at `index` within `group` and close the gap.
///
/// An index with no item is a no-op: a concurrent delete may already have
/// removed it.
pub fn delete_at<T: Positioned>(group: i64, index: i64, mut items: Vec<T>) -> Vec<T> {
    let Some(pos) = items
        .iter()
        .position(|item| item.group() == group && item.index() == index)
    else {
        return items;
    };
    items.remove(pos);

    for item in items.iter_mut() {
        if item.group() == group && item.index() > index {
            item.set_index(item.index() - 1);
        }
    }
    items
}

/// Rotate one item from `old_index` to `new_index` inside its group.
///
/// `new_index` is clamped to `[0, len - 1]`. Equal indices leave every
/// sibling untouched.
pub fn move_within<T: Positioned>(
    group: i64,
    item_id: i64,
    old_index: i64,
    new_index: i64,
    mut items: Vec<T>,
) -> Vec<T> {
    let len = group_len(group, &items);
    if len == 0 {
        return items;
    }
    let new_index = new_index.clamp(0, len - 1);
    if new_index == old_index {
        return items;
    }

    for item in items.iter_mut().filter(|item| item.group() == group) {
        if item.id() == item_id {
            item.set_index(new_index);
        } else if new_index < old_index && item.index() >= new_index && item.index() < old_index {
            item.set_index(item.index() + 1);
        } else if new_index > old_index && item.index() > old_index && item.index() <= new_index {
            item.set_index(item.index() - 1);
        }
    }
    items
}

/// Move one item from `old_group` to `new_group`.
///
/// `new_index` is clamped to `[0, destination_len]`, so the item may become
/// the new last element. The source group closes its gap and the
/// destination group opens a slot. A move inside one group is delegated to
/// [`move_within`].
pub fn move_across<T: Positioned>(
    item_id: i64,
    old_index: i64,
    new_index: i64,
    old_group: i64,
    new_group: i64,
    mut items: Vec<T>,
) -> Vec<T> {
    if old_group == new_group {
        return move_within(old_group, item_id, old_index, new_index, items);
    }

    let destination_len = items
        .iter()
        .filter(|item| item.group() == new_group && item.id() != item_id)
        .count() as i64;
    let new_index = new_index.clamp(0, destination_len);

    for item in items.iter_mut() {
        if item.id() == item_id {
            item.set_group(new_group);
            item.set_index(new_index);
        } else if item.group() == old_group && item.index() > old_index {
            item.set_index(item.index() - 1);
        } else if item.group() == new_group && item.index() >= new_index {
            item.set_index(item.index() + 1);
        }
    }
    items
}

/// Whether the positions of `group` are exactly `0..len`.
pub fn is_dense<T: Positioned>(group: i64, items: &[T]) -> bool {
    let mut indices: Vec<i64> = items
        .iter()
        .filter(|item| item.group() == group)
        .map(Positioned::index)
        .collect();
    indices.sort_unstable();
    indices.iter().enumerate().all(|(i, index)| i as i64 == *index)
}

// ── Column and task shorthands ──────────────────────────────────────

pub fn delete_column(column_index: i64, columns: Vec<Column>) -> Vec<Column> {
    delete_at(BOARD_GROUP, column_index, columns)
}

pub fn move_column(column_id: i64, old_index: i64, new_index: i64, columns: Vec<Column>) -> Vec<Column> {
    move_within(BOARD_GROUP, column_id, old_index, new_index, columns)
}

pub fn delete_task(column_id: i64, task_index: i64, tasks: Vec<Task>) -> Vec<Task> {
    delete_at(column_id, task_index, tasks)
}

pub fn move_task(
    task_id: i64,
    old_index: i64,
    new_index: i64,
    old_column: i64,
    new_column: i64,
    tasks: Vec<Task>,
) -> Vec<Task> {
    move_across(task_id, old_index, new_index, old_column, new_column, tasks)
}
