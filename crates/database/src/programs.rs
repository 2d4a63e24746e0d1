use chrono::Utc;
use model::{Program, ProgramInput, Vehicle};
use sqlx::types::Json;

use crate::error::{convert_sqlx_error, DatabaseError};

#[derive(Debug, sqlx::FromRow)]
struct ProgramRow {
    id: String,
    name: String,
    vehicles: Json<Vec<Vehicle>>,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
}

impl From<ProgramRow> for Program {
    fn from(row: ProgramRow) -> Self {
        Program {
            id: row.id,
            name: row.name,
            vehicles: row.vehicles.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// C4: read/write mapping of fleets and their vehicles.
#[derive(Clone)]
pub struct ProgramRepository {
    pool: sqlx::PgPool,
}

impl ProgramRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_all(&self) -> Result<Vec<Program>, DatabaseError> {
        let rows: Vec<ProgramRow> =
            sqlx::query_as("SELECT * FROM programs ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await
                .map_err(convert_sqlx_error)?;
        Ok(rows.into_iter().map(Program::from).collect())
    }

    pub async fn get(&self, id: &str) -> Result<Program, DatabaseError> {
        let row: ProgramRow = sqlx::query_as("SELECT * FROM programs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(convert_sqlx_error)?
            .ok_or(DatabaseError::NotFound)?;
        Ok(row.into())
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<Program>, DatabaseError> {
        let row: Option<ProgramRow> = sqlx::query_as("SELECT * FROM programs WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(convert_sqlx_error)?;
        Ok(row.map(Program::from))
    }

    pub async fn create(&self, input: ProgramInput) -> Result<Program, DatabaseError> {
        let id = utility::id::new_entity_id();
        let row: ProgramRow = sqlx::query_as(
            "INSERT INTO programs (id, name, vehicles, created_at, updated_at)
             VALUES ($1, $2, $3, now(), now())
             RETURNING *",
        )
        .bind(&id)
        .bind(&input.name)
        .bind(Json(input.vehicles))
        .fetch_one(&self.pool)
        .await
        .map_err(convert_sqlx_error)?;
        Ok(row.into())
    }

    pub async fn update(&self, id: &str, input: ProgramInput) -> Result<Program, DatabaseError> {
        let row: ProgramRow = sqlx::query_as(
            "UPDATE programs SET name = $2, vehicles = $3, updated_at = now()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&input.name)
        .bind(Json(input.vehicles))
        .fetch_optional(&self.pool)
        .await
        .map_err(convert_sqlx_error)?
        .ok_or(DatabaseError::NotFound)?;
        Ok(row.into())
    }

    pub async fn delete(&self, id: &str) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM programs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(convert_sqlx_error)?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }

    pub async fn add_vehicle(&self, program_id: &str, mut vehicle: Vehicle) -> Result<Program, DatabaseError> {
        if vehicle.id.is_empty() {
            vehicle.id = utility::id::new_entity_id();
        }
        let mut program = self.get(program_id).await?;
        program.vehicles.push(vehicle);
        self.replace_vehicles(program_id, program.vehicles).await
    }

    pub async fn update_vehicle(
        &self,
        program_id: &str,
        vehicle_id: &str,
        vehicle: Vehicle,
    ) -> Result<Program, DatabaseError> {
        let mut program = self.get(program_id).await?;
        let slot = program
            .vehicles
            .iter_mut()
            .find(|existing| existing.id == vehicle_id)
            .ok_or(DatabaseError::NotFound)?;
        *slot = vehicle;
        self.replace_vehicles(program_id, program.vehicles).await
    }

    pub async fn remove_vehicle(&self, program_id: &str, vehicle_id: &str) -> Result<Program, DatabaseError> {
        let mut program = self.get(program_id).await?;
        let before = program.vehicles.len();
        program.vehicles.retain(|v| v.id != vehicle_id);
        if program.vehicles.len() == before {
            return Err(DatabaseError::NotFound);
        }
        self.replace_vehicles(program_id, program.vehicles).await
    }

    async fn replace_vehicles(&self, program_id: &str, vehicles: Vec<Vehicle>) -> Result<Program, DatabaseError> {
        let row: ProgramRow = sqlx::query_as(
            "UPDATE programs SET vehicles = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(program_id)
        .bind(Json(vehicles))
        .fetch_one(&self.pool)
        .await
        .map_err(convert_sqlx_error)?;
        Ok(row.into())
    }
}
