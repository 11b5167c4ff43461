mod event;
mod office_hour;
mod registration;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use officehours_ports::error::PortError;

#[derive(Clone)]
pub struct SqliteDb {
    pool: SqlitePool,
}

impl SqliteDb {
    pub async fn new(url: &str) -> Result<Self, PortError> {
        Self::connect(url, 5).await
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, PortError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| PortError::Connection(e.to_string()))?;

        let db = Self { pool };
        db.init_schema().await?;
        tracing::debug!(url, max_connections, "sqlite schema ready");
        Ok(db)
    }

    async fn init_schema(&self) -> Result<(), PortError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS office_hours (
                id TEXT PRIMARY KEY,
                course_id TEXT NOT NULL,
                data TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_office_hours_course ON office_hours(course_id)")
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Persistence(e.to_string()))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS office_hour_hosts (
                office_hour_id TEXT NOT NULL,
                host_id TEXT NOT NULL,
                PRIMARY KEY (office_hour_id, host_id)
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_office_hour_hosts_host ON office_hour_hosts(host_id)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS registrations (
                id TEXT PRIMARY KEY,
                office_hour_id TEXT NOT NULL,
                account_id TEXT NOT NULL,
                date TEXT NOT NULL,
                start_time TEXT NOT NULL,
                status TEXT NOT NULL,
                data TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        // At most one scheduled registration per slot of an occurrence.
        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_registrations_scheduled_slot
             ON registrations(office_hour_id, date, start_time)
             WHERE status = 'scheduled'",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_registrations_account ON registrations(account_id)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                event_type TEXT NOT NULL,
                data TEXT NOT NULL,
                occurred_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
