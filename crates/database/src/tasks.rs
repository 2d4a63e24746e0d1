use chrono::Utc;
use model::{ScheduleRequest, ScheduleResponse, Task, TaskStatus};
use sqlx::types::Json;

use crate::error::{convert_sqlx_error, DatabaseError};

#[derive(Debug, sqlx::FromRow)]
struct TaskRow {
    id: String,
    request: Json<ScheduleRequest>,
    status: String,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
    error_message: Option<String>,
    response: Option<Json<ScheduleResponse>>,
}

impl TryFrom<TaskRow> for Task {
    type Error = DatabaseError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let status = match row.status.as_str() {
            "PENDING" => TaskStatus::Pending,
            "PROCESSING" => TaskStatus::Processing,
            "COMPLETED" => TaskStatus::Completed,
            "FAILED" => TaskStatus::Failed,
            other => {
                return Err(DatabaseError::Other(sqlx::Error::Decode(
                    format!("unknown task status {other}").into(),
                )))
            }
        };
        Ok(Task {
            id: row.id,
            request: row.request.0,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
            error_message: row.error_message,
            response: row.response.map(|json| json.0),
        })
    }
}

/// C8: the durable work queue fed by `POST /schedule` and drained by the
/// task executor (C9). `claim_batch` is the one place that must be atomic
/// under concurrent executors — it uses `FOR UPDATE SKIP LOCKED` so two
/// executor instances never claim the same row.
#[derive(Clone)]
pub struct TaskStore {
    pool: sqlx::PgPool,
}

impl TaskStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, request: ScheduleRequest) -> Result<String, DatabaseError> {
        let id = utility::id::new_task_id();
        sqlx::query(
            "INSERT INTO tasks (id, request, status, created_at, updated_at)
             VALUES ($1, $2, 'PENDING', now(), now())",
        )
        .bind(&id)
        .bind(Json(request))
        .execute(&self.pool)
        .await
        .map_err(convert_sqlx_error)?;
        Ok(id)
    }

    pub async fn get(&self, id: &str) -> Result<Task, DatabaseError> {
        let row: TaskRow = sqlx::query_as("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(convert_sqlx_error)?
            .ok_or(DatabaseError::NotFound)?;
        row.try_into()
    }

    /// Atomically moves up to `limit` pending tasks, oldest first, to
    /// `PROCESSING` and returns them. The `SELECT ... FOR UPDATE SKIP
    /// LOCKED` subquery is what makes this safe to call from several
    /// executor workers at once: a row already locked by a concurrent
    /// claim is simply skipped rather than waited on or double-claimed.
    pub async fn claim_batch(&self, limit: i64) -> Result<Vec<Task>, DatabaseError> {
        let rows: Vec<TaskRow> = sqlx::query_as(
            "UPDATE tasks SET status = 'PROCESSING', updated_at = now()
             WHERE id IN (
                 SELECT id FROM tasks
                 WHERE status = 'PENDING'
                 ORDER BY created_at
                 LIMIT $1
                 FOR UPDATE SKIP LOCKED
             )
             RETURNING *",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(convert_sqlx_error)?;
        rows.into_iter().map(Task::try_from).collect()
    }

    pub async fn complete(&self, id: &str, response: ScheduleResponse) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE tasks SET status = 'COMPLETED', response = $2, error_message = NULL, updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .bind(Json(response))
        .execute(&self.pool)
        .await
        .map_err(convert_sqlx_error)?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }

    pub async fn fail(&self, id: &str, error_message: String) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE tasks SET status = 'FAILED', error_message = $2, updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .bind(error_message)
        .execute(&self.pool)
        .await
        .map_err(convert_sqlx_error)?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }
}
