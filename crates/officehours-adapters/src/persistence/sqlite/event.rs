use async_trait::async_trait;

use officehours_core::events::DomainEvent;
use officehours_ports::error::PortError;
use officehours_ports::outbound::EventPublisher;

use super::SqliteDb;

/// Appends events to the `events` log table, one row each, in order.
#[async_trait]
impl EventPublisher for SqliteDb {
    async fn publish(&self, events: Vec<DomainEvent>) -> Result<(), PortError> {
        if events.is_empty() {
            return Ok(());
        }
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PortError::Persistence(e.to_string()))?;

        for event in &events {
            let data =
                serde_json::to_string(event).map_err(|e| PortError::Persistence(e.to_string()))?;

            sqlx::query("INSERT INTO events (event_type, data, occurred_at) VALUES (?, ?, ?)")
                .bind(event.event_type())
                .bind(&data)
                .bind(event.occurred_at().to_rfc3339())
                .execute(&mut *tx)
                .await
                .map_err(|e| PortError::Persistence(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| PortError::Persistence(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use officehours_core::events::{OccurrenceCancelled, RegistrationCancelled};
    use officehours_core::ids::{AccountId, OfficeHourId, RegistrationId};

    async fn db() -> SqliteDb {
        SqliteDb::new("sqlite::memory:").await.unwrap()
    }

    fn ts(s: &str) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::parse_from_rfc3339(s)
            .unwrap()
            .with_timezone(&chrono::Utc)
    }

    #[tokio::test]
    async fn publish_appends_events_in_order() {
        let db = db().await;
        let office_hour_id = OfficeHourId::new();

        let events = vec![
            DomainEvent::OccurrenceCancelled(OccurrenceCancelled {
                office_hour_id: office_hour_id.clone(),
                date: chrono::NaiveDate::from_ymd_opt(2023, 9, 4).unwrap(),
                occurred_at: ts("2023-09-01T10:00:00Z"),
            }),
            DomainEvent::RegistrationCancelled(RegistrationCancelled {
                registration_id: RegistrationId::new(),
                office_hour_id,
                cancelled_by: AccountId::new(),
                occurred_at: ts("2023-09-01T10:01:00Z"),
            }),
        ];

        db.publish(events).await.unwrap();

        let rows: Vec<(String,)> = sqlx::query_as("SELECT event_type FROM events ORDER BY id")
            .fetch_all(db.pool())
            .await
            .unwrap();
        let types: Vec<&str> = rows.iter().map(|(t,)| t.as_str()).collect();
        assert_eq!(types, vec!["occurrence.cancelled", "registration.cancelled"]);
    }

    #[tokio::test]
    async fn publish_nothing_writes_nothing() {
        let db = db().await;
        db.publish(vec![]).await.unwrap();

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM events")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count.0, 0);
    }
}
