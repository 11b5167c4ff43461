use async_trait::async_trait;
use chrono::NaiveDate;

use officehours_core::ids::{AccountId, OfficeHourId, RegistrationId};
use officehours_core::registration::{Registration, RegistrationStatus};
use officehours_ports::error::PortError;
use officehours_ports::outbound::RegistrationRepository;

use super::SqliteDb;

fn status_str(status: RegistrationStatus) -> &'static str {
    match status {
        RegistrationStatus::Scheduled => "scheduled",
        RegistrationStatus::Cancelled => "cancelled",
    }
}

fn decode_all(rows: Vec<(String,)>) -> Result<Vec<Registration>, PortError> {
    let mut registrations = Vec::with_capacity(rows.len());
    for (data,) in rows {
        let registration: Registration =
            serde_json::from_str(&data).map_err(|e| PortError::Persistence(e.to_string()))?;
        registrations.push(registration);
    }
    Ok(registrations)
}

#[async_trait]
impl RegistrationRepository for SqliteDb {
    async fn insert(&self, registration: &Registration) -> Result<(), PortError> {
        let data = serde_json::to_string(registration)
            .map_err(|e| PortError::Persistence(e.to_string()))?;

        let result = sqlx::query(
            "INSERT INTO registrations
                (id, office_hour_id, account_id, date, start_time, status, data, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(registration.id().to_string())
        .bind(registration.office_hour_id().to_string())
        .bind(registration.account_id().to_string())
        .bind(registration.date().to_string())
        .bind(registration.slot().start().to_string())
        .bind(status_str(registration.status()))
        .bind(&data)
        .bind(registration.created_at().to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                tracing::warn!(
                    office_hour_id = %registration.office_hour_id(),
                    date = %registration.date(),
                    start = %registration.slot().start(),
                    "slot already held by a scheduled registration"
                );
                Err(PortError::Conflict(db.message().to_string()))
            }
            Err(e) => Err(PortError::Persistence(e.to_string())),
        }
    }

    async fn mark_cancelled(&self, registration: &Registration) -> Result<bool, PortError> {
        let id = registration.id().to_string();
        let data = serde_json::to_string(registration)
            .map_err(|e| PortError::Persistence(e.to_string()))?;

        let result = sqlx::query(
            "UPDATE registrations SET status = ?, data = ?
             WHERE id = ? AND status = 'scheduled'",
        )
        .bind(status_str(registration.status()))
        .bind(&data)
        .bind(&id)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        let exists: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM registrations WHERE id = ?")
            .bind(&id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PortError::Persistence(e.to_string()))?;
        match exists {
            Some(_) => Ok(false),
            None => Err(PortError::NotFound),
        }
    }

    async fn find_by_id(&self, id: &RegistrationId) -> Result<Option<Registration>, PortError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT data FROM registrations WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PortError::Persistence(e.to_string()))?;

        match row {
            Some((data,)) => {
                let registration: Registration = serde_json::from_str(&data)
                    .map_err(|e| PortError::Persistence(e.to_string()))?;
                Ok(Some(registration))
            }
            None => Ok(None),
        }
    }

    async fn find_for_occurrence(
        &self,
        office_hour_id: &OfficeHourId,
        date: NaiveDate,
    ) -> Result<Vec<Registration>, PortError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT data FROM registrations
             WHERE office_hour_id = ? AND date = ?
             ORDER BY start_time",
        )
        .bind(office_hour_id.to_string())
        .bind(date.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        decode_all(rows)
    }

    async fn find_by_account(&self, account: &AccountId) -> Result<Vec<Registration>, PortError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT data FROM registrations WHERE account_id = ?
             ORDER BY date, start_time",
        )
        .bind(account.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        decode_all(rows)
    }
}
