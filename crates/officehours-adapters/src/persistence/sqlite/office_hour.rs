use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::NaiveDate;

use officehours_core::ids::{AccountId, CourseId, OfficeHourId};
use officehours_core::office_hour::OfficeHourRule;
use officehours_ports::error::PortError;
use officehours_ports::outbound::OfficeHourRepository;

use super::SqliteDb;

fn decode_all(rows: Vec<(String,)>) -> Result<Vec<OfficeHourRule>, PortError> {
    let mut rules = Vec::with_capacity(rows.len());
    for (data,) in rows {
        let rule: OfficeHourRule =
            serde_json::from_str(&data).map_err(|e| PortError::Persistence(e.to_string()))?;
        rules.push(rule);
    }
    Ok(rules)
}

#[async_trait]
impl OfficeHourRepository for SqliteDb {
    async fn save(&self, rule: &OfficeHourRule) -> Result<(), PortError> {
        let id = rule.id().to_string();
        let data =
            serde_json::to_string(rule).map_err(|e| PortError::Persistence(e.to_string()))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PortError::Persistence(e.to_string()))?;

        sqlx::query(
            "INSERT INTO office_hours (id, course_id, data)
             VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                course_id = excluded.course_id,
                data = excluded.data",
        )
        .bind(&id)
        .bind(rule.course_id().to_string())
        .bind(&data)
        .execute(&mut *tx)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        sqlx::query("DELETE FROM office_hour_hosts WHERE office_hour_id = ?")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(|e| PortError::Persistence(e.to_string()))?;

        for host in rule.hosts() {
            sqlx::query("INSERT INTO office_hour_hosts (office_hour_id, host_id) VALUES (?, ?)")
                .bind(&id)
                .bind(host.to_string())
                .execute(&mut *tx)
                .await
                .map_err(|e| PortError::Persistence(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| PortError::Persistence(e.to_string()))
    }

    async fn find_by_id(&self, id: &OfficeHourId) -> Result<Option<OfficeHourRule>, PortError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT data FROM office_hours WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PortError::Persistence(e.to_string()))?;

        match row {
            Some((data,)) => {
                let rule: OfficeHourRule = serde_json::from_str(&data)
                    .map_err(|e| PortError::Persistence(e.to_string()))?;
                Ok(Some(rule))
            }
            None => Ok(None),
        }
    }

    async fn find_by_host(&self, host: &AccountId) -> Result<Vec<OfficeHourRule>, PortError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT o.data FROM office_hours o
             JOIN office_hour_hosts h ON h.office_hour_id = o.id
             WHERE h.host_id = ?",
        )
        .bind(host.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        decode_all(rows)
    }

    async fn find_by_course(&self, course: &CourseId) -> Result<Vec<OfficeHourRule>, PortError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT data FROM office_hours WHERE course_id = ? ORDER BY rowid")
                .bind(course.to_string())
                .fetch_all(&self.pool)
                .await
                .map_err(|e| PortError::Persistence(e.to_string()))?;

        decode_all(rows)
    }

    async fn update_cancellations(
        &self,
        id: &OfficeHourId,
        dates: &BTreeSet<NaiveDate>,
    ) -> Result<(), PortError> {
        let dates =
            serde_json::to_string(dates).map_err(|e| PortError::Persistence(e.to_string()))?;

        let result = sqlx::query(
            "UPDATE office_hours SET data = json_set(data, '$.cancelled_dates', json(?))
             WHERE id = ?",
        )
        .bind(&dates)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use officehours_core::office_hour::OfficeHourDraft;
    use officehours_core::time::{DateRange, TimeOfDay, TimeWindow};

    fn ts(s: &str) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::parse_from_rfc3339(s)
            .unwrap()
            .with_timezone(&chrono::Utc)
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    async fn db() -> SqliteDb {
        SqliteDb::new("sqlite::memory:").await.unwrap()
    }

    fn make_rule(course: &CourseId, hosts: Vec<AccountId>) -> OfficeHourRule {
        let draft = OfficeHourDraft {
            course_id: course.clone(),
            hosts,
            time_window: TimeWindow::new(
                TimeOfDay::from_hms(9, 0, 0).unwrap(),
                TimeOfDay::from_hms(10, 0, 0).unwrap(),
            )
            .unwrap(),
            date_range: DateRange::new(date("2023-09-01"), date("2023-12-01")).unwrap(),
            weekdays: [Weekday::Mon, Weekday::Wed].into_iter().collect(),
            slot_minutes: 10,
            is_recurring: true,
            location: Some("Room 101".into()),
        };
        OfficeHourRule::new(draft, ts("2023-08-20T00:00:00Z")).unwrap().0
    }

    #[tokio::test]
    async fn save_and_find_by_id() {
        let db = db().await;
        let rule = make_rule(&CourseId::new(), vec![AccountId::new()]);

        db.save(&rule).await.unwrap();

        let found = db.find_by_id(rule.id()).await.unwrap().unwrap();
        assert_eq!(found, rule);
    }

    #[tokio::test]
    async fn find_by_id_missing_returns_none() {
        let db = db().await;
        assert!(db.find_by_id(&OfficeHourId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_by_host_matches_any_co_host() {
        let db = db().await;
        let alice = AccountId::new();
        let bob = AccountId::new();
        let course = CourseId::new();

        let shared = make_rule(&course, vec![alice.clone(), bob.clone()]);
        let alice_only = make_rule(&course, vec![alice.clone()]);
        db.save(&shared).await.unwrap();
        db.save(&alice_only).await.unwrap();

        assert_eq!(db.find_by_host(&alice).await.unwrap().len(), 2);
        let for_bob = db.find_by_host(&bob).await.unwrap();
        assert_eq!(for_bob.len(), 1);
        assert_eq!(for_bob[0].id(), shared.id());
        assert!(db.find_by_host(&AccountId::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn saving_twice_does_not_duplicate_hosts() {
        let db = db().await;
        let host = AccountId::new();
        let rule = make_rule(&CourseId::new(), vec![host.clone()]);

        db.save(&rule).await.unwrap();
        db.save(&rule).await.unwrap();

        assert_eq!(db.find_by_host(&host).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn find_by_course_filters_other_courses() {
        let db = db().await;
        let course = CourseId::new();
        db.save(&make_rule(&course, vec![AccountId::new()])).await.unwrap();
        db.save(&make_rule(&course, vec![AccountId::new()])).await.unwrap();
        db.save(&make_rule(&CourseId::new(), vec![AccountId::new()]))
            .await
            .unwrap();

        assert_eq!(db.find_by_course(&course).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_cancellations_replaces_the_set() {
        let db = db().await;
        let mut rule = make_rule(&CourseId::new(), vec![AccountId::new()]);
        db.save(&rule).await.unwrap();

        rule.add_cancellation(date("2023-09-04"), ts("2023-09-01T00:00:00Z"))
            .unwrap();
        db.update_cancellations(rule.id(), rule.cancelled_dates())
            .await
            .unwrap();

        let found = db.find_by_id(rule.id()).await.unwrap().unwrap();
        assert!(found.cancelled_dates().contains(&date("2023-09-04")));
        assert!(!found.produces_occurrence_on(date("2023-09-04")));
        assert!(found.produces_occurrence_on(date("2023-09-06")));
    }

    #[tokio::test]
    async fn update_cancellations_on_missing_rule_is_not_found() {
        let db = db().await;
        let result = db
            .update_cancellations(&OfficeHourId::new(), &BTreeSet::new())
            .await;
        assert!(matches!(result, Err(PortError::NotFound)));
    }
}
