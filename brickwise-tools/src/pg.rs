//! PostgreSQL implementation of the SQL source contract.

use crate::sql::SqlSource;
use brickwise_core::{BrickError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{Column, Row, TypeInfo};

pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| BrickError::Config(format!("database connection failed: {e}")))?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SqlSource for PgDatabase {
    async fn list_tables(&self) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT tablename FROM pg_catalog.pg_tables \
             WHERE schemaname = 'public' ORDER BY tablename",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| BrickError::Tool(format!("listing tables failed: {e}")))?;

        rows.iter()
            .map(|row| {
                row.try_get::<String, _>("tablename")
                    .map_err(|e| BrickError::Tool(format!("listing tables failed: {e}")))
            })
            .collect()
    }

    async fn table_schema(&self, table_names: &[String]) -> Result<String> {
        let rows = sqlx::query(
            "SELECT table_name, column_name, data_type, is_nullable \
             FROM information_schema.columns \
             WHERE table_schema = 'public' AND table_name = ANY($1) \
             ORDER BY table_name, ordinal_position",
        )
        .bind(table_names)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| BrickError::Tool(format!("schema lookup failed: {e}")))?;

        let mut description = String::new();
        let mut current_table = String::new();
        for row in &rows {
            let table: String = row
                .try_get("table_name")
                .map_err(|e| BrickError::Tool(format!("schema lookup failed: {e}")))?;
            let column: String = row
                .try_get("column_name")
                .map_err(|e| BrickError::Tool(format!("schema lookup failed: {e}")))?;
            let data_type: String = row
                .try_get("data_type")
                .map_err(|e| BrickError::Tool(format!("schema lookup failed: {e}")))?;
            let nullable: String = row
                .try_get("is_nullable")
                .map_err(|e| BrickError::Tool(format!("schema lookup failed: {e}")))?;

            if table != current_table {
                if !description.is_empty() {
                    description.push('\n');
                }
                description.push_str(&format!("TABLE {table}:\n"));
                current_table = table;
            }
            description.push_str(&format!(
                "  {column} {data_type}{}\n",
                if nullable == "YES" { "" } else { " NOT NULL" }
            ));
        }

        if description.is_empty() {
            return Err(BrickError::Tool(format!(
                "no columns found for tables: {}",
                table_names.join(", ")
            )));
        }
        Ok(description)
    }

    async fn run_query(&self, statement: &str) -> Result<Vec<Value>> {
        let rows = sqlx::query(statement)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| BrickError::Tool(format!("query execution failed: {e}")))?;

        Ok(rows.iter().map(row_to_json).collect())
    }
}

/// Best-effort dynamic row decoding for the common sensor-data types.
fn row_to_json(row: &PgRow) -> Value {
    let mut object = serde_json::Map::new();
    for column in row.columns() {
        let name = column.name();
        let value = match column.type_info().name() {
            "INT2" => row.try_get::<i16, _>(name).map(|v| json!(v)).ok(),
            "INT4" => row.try_get::<i32, _>(name).map(|v| json!(v)).ok(),
            "INT8" => row.try_get::<i64, _>(name).map(|v| json!(v)).ok(),
            "FLOAT4" => row.try_get::<f32, _>(name).map(|v| json!(v)).ok(),
            "FLOAT8" | "NUMERIC" => row.try_get::<f64, _>(name).map(|v| json!(v)).ok(),
            "BOOL" => row.try_get::<bool, _>(name).map(|v| json!(v)).ok(),
            "JSON" | "JSONB" => row.try_get::<Value, _>(name).ok(),
            "TIMESTAMPTZ" => row
                .try_get::<chrono::DateTime<chrono::Utc>, _>(name)
                .map(|v| json!(v.to_rfc3339()))
                .ok(),
            "TIMESTAMP" => row
                .try_get::<chrono::NaiveDateTime, _>(name)
                .map(|v| json!(v.to_string()))
                .ok(),
            _ => row.try_get::<String, _>(name).map(|v| json!(v)).ok(),
        };
        object.insert(name.to_string(), value.unwrap_or(Value::Null));
    }
    Value::Object(object)
}
