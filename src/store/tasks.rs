//! Task accessors
//!
//! The completion toggle carries the one derived field in the system:
//! completed_at is set when status flips to completed and cleared when it
//! flips back. Completing a recurring task instead advances its due date
//! one step and leaves it pending.

use crate::recur::Recurrence;
use crate::store::db::{enum_column, not_found, opt_json_column};
use crate::store::types::{now_ms, Priority, Task, TaskPatch, TaskStatus};
use crate::store::{Store, StoreError, StoreResult};
use rusqlite::{params, Row};

fn row_to_task(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        family_id: row.get(1)?,
        title: row.get(2)?,
        notes: row.get(3)?,
        assigned_to: row.get(4)?,
        created_by: row.get(5)?,
        due_at: row.get(6)?,
        priority: enum_column(row, 7, Priority::parse)?,
        status: enum_column(row, 8, TaskStatus::parse)?,
        completed_at: row.get(9)?,
        recurrence: opt_json_column(row, 10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

const TASK_COLS: &str = "id, family_id, title, notes, assigned_to, created_by, due_at, \
                         priority, status, completed_at, recurrence, created_at, updated_at";

/// Equality filters for task listings
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub assigned_to: Option<String>,
    pub status: Option<TaskStatus>,
}

impl Store {
    /// Insert a task record
    pub async fn insert_task(&self, task: &Task) -> StoreResult<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            &format!("INSERT INTO tasks ({TASK_COLS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"),
            params![
                task.id,
                task.family_id,
                task.title,
                task.notes,
                task.assigned_to,
                task.created_by,
                task.due_at,
                task.priority.as_str(),
                task.status.as_str(),
                task.completed_at,
                task.recurrence
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?,
                task.created_at,
                task.updated_at
            ],
        )?;
        Ok(())
    }

    /// A family's tasks, newest first, with optional equality filters
    pub async fn list_tasks(&self, family_id: &str, filter: &TaskFilter) -> StoreResult<Vec<Task>> {
        let conn = self.conn.lock().await;
        let mut sql = format!("SELECT {TASK_COLS} FROM tasks WHERE family_id = ?");
        let mut args: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(family_id.to_string())];

        if let Some(assigned_to) = &filter.assigned_to {
            sql.push_str(" AND assigned_to = ?");
            args.push(Box::new(assigned_to.clone()));
        }
        if let Some(status) = filter.status {
            sql.push_str(" AND status = ?");
            args.push(Box::new(status.as_str().to_string()));
        }
        sql.push_str(" ORDER BY created_at DESC");

        let mut stmt = conn.prepare(&sql)?;
        let tasks = stmt
            .query_map(rusqlite::params_from_iter(args.iter().map(|a| a.as_ref())), row_to_task)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    /// Fetch a task, scoped to a family
    pub async fn get_task(&self, family_id: &str, task_id: &str) -> StoreResult<Task> {
        let conn = self.conn.lock().await;
        conn.query_row(
            &format!("SELECT {TASK_COLS} FROM tasks WHERE family_id = ? AND id = ?"),
            params![family_id, task_id],
            row_to_task,
        )
        .map_err(not_found(format!("task {task_id}")))
    }

    /// Apply a patch to a task, refreshing updated_at
    pub async fn update_task(
        &self,
        family_id: &str,
        task_id: &str,
        patch: TaskPatch,
    ) -> StoreResult<Task> {
        let conn = self.conn.lock().await;
        let mut task = conn
            .query_row(
                &format!("SELECT {TASK_COLS} FROM tasks WHERE family_id = ? AND id = ?"),
                params![family_id, task_id],
                row_to_task,
            )
            .map_err(not_found(format!("task {task_id}")))?;

        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(notes) = patch.notes {
            task.notes = Some(notes);
        }
        if let Some(assigned_to) = patch.assigned_to {
            task.assigned_to = Some(assigned_to);
        }
        if let Some(due_at) = patch.due_at {
            task.due_at = Some(due_at);
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(recurrence) = patch.recurrence {
            task.recurrence = Some(recurrence);
        }
        task.updated_at = now_ms();

        persist_task(&conn, &task)?;
        Ok(task)
    }

    /// Toggle a task's completion state
    ///
    /// Pending -> completed stamps completed_at. Completed -> pending clears
    /// it. A pending *recurring* task advances due_at one step instead of
    /// completing.
    pub async fn toggle_task(&self, family_id: &str, task_id: &str) -> StoreResult<Task> {
        let conn = self.conn.lock().await;
        let mut task = conn
            .query_row(
                &format!("SELECT {TASK_COLS} FROM tasks WHERE family_id = ? AND id = ?"),
                params![family_id, task_id],
                row_to_task,
            )
            .map_err(not_found(format!("task {task_id}")))?;

        let now = now_ms();
        match (task.status, task.recurrence) {
            (TaskStatus::Pending, Some(rule)) => {
                let anchor = task.due_at.unwrap_or(now);
                task.due_at = Some(next_due(&rule, anchor, now));
                tracing::debug!(task_id = %task.id, due_at = ?task.due_at, "Advanced recurring task");
            }
            (TaskStatus::Pending, None) => {
                task.status = TaskStatus::Completed;
                task.completed_at = Some(now);
            }
            (TaskStatus::Completed, _) => {
                task.status = TaskStatus::Pending;
                task.completed_at = None;
            }
        }
        task.updated_at = now;

        persist_task(&conn, &task)?;
        Ok(task)
    }

    /// Delete a task
    pub async fn delete_task(&self, family_id: &str, task_id: &str) -> StoreResult<()> {
        let conn = self.conn.lock().await;
        let changed = conn.execute(
            "DELETE FROM tasks WHERE family_id = ? AND id = ?",
            params![family_id, task_id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("task {task_id}")));
        }
        Ok(())
    }
}

/// Next due date strictly after now, stepping from the previous anchor
fn next_due(rule: &Recurrence, anchor: i64, now: i64) -> i64 {
    let mut due = rule.next_after(anchor);
    while due <= now {
        let next = rule.next_after(due);
        if next <= due {
            break;
        }
        due = next;
    }
    due
}

fn persist_task(conn: &rusqlite::Connection, task: &Task) -> StoreResult<()> {
    conn.execute(
        "UPDATE tasks SET title = ?, notes = ?, assigned_to = ?, due_at = ?, priority = ?,
                status = ?, completed_at = ?, recurrence = ?, updated_at = ?
         WHERE id = ?",
        params![
            task.title,
            task.notes,
            task.assigned_to,
            task.due_at,
            task.priority.as_str(),
            task.status.as_str(),
            task.completed_at,
            task.recurrence
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?,
            task.updated_at,
            task.id
        ],
    )?;
    Ok(())
}
