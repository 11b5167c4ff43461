pub mod office_hours;
pub mod registrations;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/office-hours", post(office_hours::create_office_hour))
        .route("/office-hours/{id}", get(office_hours::get_office_hour))
        .route("/courses/{id}/office-hours", get(office_hours::list_for_course))
        .route("/office-hours/{id}/occurrences", get(office_hours::occurrences))
        .route("/office-hours/{id}/slots", get(office_hours::slots))
        .route(
            "/office-hours/{id}/cancellations",
            post(office_hours::cancel_occurrence),
        )
        .route(
            "/office-hours/{id}/registrations",
            post(registrations::register),
        )
        .route(
            "/registrations/{id}/cancel",
            post(registrations::cancel_registration),
        )
        .route(
            "/accounts/{id}/registrations",
            get(registrations::list_for_account),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use officehours_adapters::persistence::sqlite::SqliteDb;
    use officehours_core::ids::{AccountId, CourseId};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn app() -> Router {
        let db = SqliteDb::new("sqlite::memory:").await.unwrap();
        router(AppState::sqlite(db))
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// Mondays and Wednesdays, 2023-09-01..2023-12-01, 09:00-10:00, 10 minute slots.
    fn rule_body(host: &AccountId, course: &CourseId) -> Value {
        json!({
            "courseId": course.to_string(),
            "hosts": [host.to_string()],
            "startTime": "09:00:00",
            "endTime": "10:00:00",
            "startDate": "2023-09-01",
            "endDate": "2023-12-01",
            "daysOfWeek": ["Monday", "Wednesday"],
            "interval": 10,
            "isRecurring": true,
            "location": "Room 101"
        })
    }

    async fn create_rule(app: &Router) -> String {
        let (status, body) = send(
            app,
            "POST",
            "/office-hours",
            Some(rule_body(&AccountId::new(), &CourseId::new())),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    fn registration_body(account: &AccountId, date: &str, start: &str, end: &str) -> Value {
        json!({
            "accountId": account.to_string(),
            "date": date,
            "startTime": start,
            "endTime": end
        })
    }

    #[tokio::test]
    async fn create_and_fetch_office_hour() {
        let app = app().await;
        let course = CourseId::new();
        let (status, created) = send(
            &app,
            "POST",
            "/office-hours",
            Some(rule_body(&AccountId::new(), &course)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap();

        let (status, view) = send(&app, "GET", &format!("/office-hours/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["courseId"], course.to_string());
        assert_eq!(view["startTime"], "09:00:00");
        assert_eq!(view["daysOfWeek"], json!(["Monday", "Wednesday"]));
        assert_eq!(view["interval"], 10);
        assert_eq!(view["location"], "Room 101");

        let (status, listed) =
            send(&app, "GET", &format!("/courses/{course}/office-hours"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn overlapping_office_hour_for_same_host_is_conflict() {
        let app = app().await;
        let host = AccountId::new();
        let (status, first) = send(
            &app,
            "POST",
            "/office-hours",
            Some(rule_body(&host, &CourseId::new())),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let mut overlapping = rule_body(&host, &CourseId::new());
        overlapping["startTime"] = json!("09:30:00");
        overlapping["endTime"] = json!("10:30:00");
        overlapping["daysOfWeek"] = json!(["Wednesday"]);
        let (status, body) = send(&app, "POST", "/office-hours", Some(overlapping)).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["kind"], "HostConflict");
        assert_eq!(body["error"]["conflictingRuleIds"][0], first["id"]);
    }

    #[tokio::test]
    async fn malformed_office_hour_is_bad_request() {
        let app = app().await;
        let mut body = rule_body(&AccountId::new(), &CourseId::new());
        body["startTime"] = json!("9am");
        let (status, error) = send(&app, "POST", "/office-hours", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"]["kind"], "InvalidTime");

        let (status, error) = send(
            &app,
            "POST",
            "/office-hours",
            Some(json!({ "courseId": "c" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"]["kind"], "BadRequest");
    }

    #[tokio::test]
    async fn unknown_and_malformed_ids() {
        let app = app().await;
        let missing = CourseId::new();
        let (status, body) = send(&app, "GET", &format!("/office-hours/{missing}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);

        let (status, body) = send(&app, "GET", "/office-hours/not-an-id", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["kind"], "InvalidId");
    }

    #[tokio::test]
    async fn occurrences_and_slots() {
        let app = app().await;
        let id = create_rule(&app).await;

        let (status, dates) = send(
            &app,
            "GET",
            &format!("/office-hours/{id}/occurrences?from=2023-09-01&to=2023-09-10"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(dates, json!(["2023-09-04", "2023-09-06"]));

        let (status, slots) = send(
            &app,
            "GET",
            &format!("/office-hours/{id}/slots?date=2023-09-04"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let slots = slots.as_array().unwrap();
        assert_eq!(slots.len(), 6);
        assert_eq!(slots[0]["start"], "09:00:00");
        assert!(slots.iter().all(|s| s["available"] == true));

        let (status, _) = send(&app, "GET", &format!("/office-hours/{id}/slots"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn valid_registration_is_admitted_and_slot_marked_taken() {
        let app = app().await;
        let id = create_rule(&app).await;
        let student = AccountId::new();

        let (status, reg) = send(
            &app,
            "POST",
            &format!("/office-hours/{id}/registrations"),
            Some(registration_body(&student, "2023-09-04", "09:10:00", "09:20:00")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(reg["status"], "scheduled");
        assert_eq!(reg["accountId"], student.to_string());

        let (_, slots) = send(
            &app,
            "GET",
            &format!("/office-hours/{id}/slots?date=2023-09-04"),
            None,
        )
        .await;
        let taken: Vec<&Value> = slots
            .as_array()
            .unwrap()
            .iter()
            .filter(|s| s["available"] == false)
            .collect();
        assert_eq!(taken.len(), 1);
        assert_eq!(taken[0]["start"], "09:10:00");

        let (status, history) = send(
            &app,
            "GET",
            &format!("/accounts/{student}/registrations"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(history.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn registration_rejections_map_to_bad_request() {
        let app = app().await;
        let id = create_rule(&app).await;
        let uri = format!("/office-hours/{id}/registrations");

        // Tuesday
        let (status, body) = send(
            &app,
            "POST",
            &uri,
            Some(registration_body(&AccountId::new(), "2023-09-05", "09:10:00", "09:20:00")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["kind"], "InactiveOccurrence");

        let (status, body) = send(
            &app,
            "POST",
            &uri,
            Some(registration_body(&AccountId::new(), "2023-09-04", "09:00:00", "09:15:00")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["kind"], "WrongInterval");

        let (status, body) = send(
            &app,
            "POST",
            &uri,
            Some(registration_body(&AccountId::new(), "2023-09-04", "09:55:00", "10:05:00")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["kind"], "OutOfWindow");
    }

    #[tokio::test]
    async fn simultaneous_registrations_for_one_slot_admit_one() {
        let app = app().await;
        let id = create_rule(&app).await;
        let uri = format!("/office-hours/{id}/registrations");

        let first = send(
            &app,
            "POST",
            &uri,
            Some(registration_body(&AccountId::new(), "2023-09-04", "09:00:00", "09:10:00")),
        );
        let second = send(
            &app,
            "POST",
            &uri,
            Some(registration_body(&AccountId::new(), "2023-09-04", "09:00:00", "09:10:00")),
        );
        let ((a, _), (b, _)) = tokio::join!(first, second);

        let mut statuses = vec![a, b];
        statuses.sort();
        assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::CONFLICT]);
    }

    #[tokio::test]
    async fn cancelled_occurrence_blocks_registration() {
        let app = app().await;
        let id = create_rule(&app).await;
        let uri = format!("/office-hours/{id}/cancellations");

        let (status, _) = send(&app, "POST", &uri, Some(json!({ "date": "2023-09-04" }))).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(&app, "POST", &uri, Some(json!({ "date": "2023-09-04" }))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["kind"], "AlreadyCancelled");

        let (status, body) = send(
            &app,
            "POST",
            &format!("/office-hours/{id}/registrations"),
            Some(registration_body(&AccountId::new(), "2023-09-04", "09:10:00", "09:20:00")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["kind"], "InactiveOccurrence");

        let (_, slots) = send(
            &app,
            "GET",
            &format!("/office-hours/{id}/slots?date=2023-09-04"),
            None,
        )
        .await;
        assert_eq!(slots, json!([]));
    }

    #[tokio::test]
    async fn registration_cancellation_rules() {
        let app = app().await;
        let id = create_rule(&app).await;
        let student = AccountId::new();
        let (_, reg) = send(
            &app,
            "POST",
            &format!("/office-hours/{id}/registrations"),
            Some(registration_body(&student, "2023-09-04", "09:10:00", "09:20:00")),
        )
        .await;
        let cancel_uri = format!("/registrations/{}/cancel", reg["id"].as_str().unwrap());

        let (status, body) = send(
            &app,
            "POST",
            &cancel_uri,
            Some(json!({ "accountId": AccountId::new().to_string(), "role": "student" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["kind"], "NotPermitted");

        let owner = json!({ "accountId": student.to_string(), "role": "student" });
        let (status, first) = send(&app, "POST", &cancel_uri, Some(owner.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["status"], "cancelled");

        let (status, second) = send(&app, "POST", &cancel_uri, Some(owner)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["cancelledAt"], first["cancelledAt"]);

        let (status, _) = send(
            &app,
            "POST",
            &cancel_uri,
            Some(json!({ "accountId": student.to_string(), "role": "admin" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn simultaneous_cancels_emit_one_event() {
        let db = SqliteDb::new("sqlite::memory:").await.unwrap();
        let app = router(AppState::sqlite(db.clone()));
        let id = create_rule(&app).await;
        let student = AccountId::new();
        let (_, reg) = send(
            &app,
            "POST",
            &format!("/office-hours/{id}/registrations"),
            Some(registration_body(&student, "2023-09-04", "09:10:00", "09:20:00")),
        )
        .await;
        let cancel_uri = format!("/registrations/{}/cancel", reg["id"].as_str().unwrap());
        let owner = json!({ "accountId": student.to_string(), "role": "student" });

        let ((a, first), (b, second)) = tokio::join!(
            send(&app, "POST", &cancel_uri, Some(owner.clone())),
            send(&app, "POST", &cancel_uri, Some(owner)),
        );

        assert_eq!((a, b), (StatusCode::OK, StatusCode::OK));
        assert_eq!(first["cancelledAt"], second["cancelledAt"]);
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM events WHERE event_type = 'registration.cancelled'",
        )
        .fetch_one(db.pool())
        .await
        .unwrap();
        assert_eq!(count.0, 1);
    }
}
