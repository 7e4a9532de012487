//! Integration tests for the resource controllers.

mod helpers;

use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use taskpilot_core::error::ErrorKind;
use taskpilot_core::types::{NewTimeLog, TaskQuery, TaskStatus};

async fn mount_task_list(app: &helpers::TestApp) {
    Mock::given(method("GET"))
        .and(path("/tasks/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            helpers::task_json(1, "Write documentation", "pending"),
            helpers::task_json(2, "Fix bug #432", "in_progress"),
        ])))
        .mount(&app.server)
        .await;
}

#[tokio::test]
async fn test_unauthorized_operation_redirects_without_request() {
    let app = helpers::TestApp::new().await;

    let err = app
        .client
        .tasks
        .fetch_all(&TaskQuery::default())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Authentication);
    assert_eq!(app.client.tasks.state().redirect.as_deref(), Some("/login"));
    assert!(app.client.plans.load(NaiveDate::from_ymd_opt(2025, 7, 21).unwrap()).await.is_err());
    assert_eq!(app.request_count().await, 0);
}

#[tokio::test]
async fn test_fetch_all_sends_query_and_replaces_list() {
    let app = helpers::TestApp::logged_in().await;

    Mock::given(method("GET"))
        .and(path("/tasks/"))
        .and(query_param("skip", "0"))
        .and(query_param("limit", "10"))
        .and(query_param("search_name", "bug"))
        .and(header_exists("authorization"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([helpers::task_json(2, "Fix bug #432", "pending")])),
        )
        .expect(1)
        .mount(&app.server)
        .await;

    let query = TaskQuery {
        search_name: Some("bug".to_string()),
        ..Default::default()
    };
    let tasks = app.client.tasks.fetch_all(&query).await.unwrap();

    assert_eq!(tasks.len(), 1);
    let state = app.client.tasks.state();
    assert_eq!(state.items, tasks);
    assert!(state.error.is_none());
    assert!(!state.loading);
}

#[tokio::test]
async fn test_delete_removes_only_after_confirmation() {
    let app = helpers::TestApp::logged_in().await;
    mount_task_list(&app).await;
    app.client.tasks.fetch_all(&TaskQuery::default()).await.unwrap();

    Mock::given(method("DELETE"))
        .and(path("/tasks/1"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&app.server)
        .await;

    let err = app.client.tasks.delete(1).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ExternalService);
    let state = app.client.tasks.state();
    assert_eq!(state.items.len(), 2);
    assert!(state.error.is_some());

    Mock::given(method("DELETE"))
        .and(path("/tasks/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "detail": "Task deleted" })))
        .mount(&app.server)
        .await;

    app.client.tasks.delete(1).await.unwrap();
    let state = app.client.tasks.state();
    assert_eq!(state.items.iter().map(|t| t.id).collect::<Vec<_>>(), vec![2]);
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_start_rolls_back_on_failure() {
    let app = helpers::TestApp::logged_in().await;
    mount_task_list(&app).await;
    app.client.tasks.fetch_all(&TaskQuery::default()).await.unwrap();

    Mock::given(method("POST"))
        .and(path("/tasks/start/1"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({ "detail": "Task already running" })))
        .expect(1)
        .mount(&app.server)
        .await;

    let err = app.client.tasks.start(1).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let state = app.client.tasks.state();
    let task = state.items.iter().find(|t| t.id == 1).unwrap();
    assert_eq!(task.status, TaskStatus::Pending);
    assert_eq!(state.error.unwrap().kind, ErrorKind::Conflict);
}

#[tokio::test]
async fn test_stop_applies_server_copy() {
    let app = helpers::TestApp::logged_in().await;
    mount_task_list(&app).await;
    app.client.tasks.fetch_all(&TaskQuery::default()).await.unwrap();

    Mock::given(method("POST"))
        .and(path("/tasks/stop/2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(helpers::task_json(2, "Fix bug #432", "stopped")),
        )
        .expect(1)
        .mount(&app.server)
        .await;

    app.client.tasks.stop(2).await.unwrap();

    let state = app.client.tasks.state();
    let task = state.items.iter().find(|t| t.id == 2).unwrap();
    assert_eq!(task.status, TaskStatus::Stopped);
    assert!(task.is_stopped);
}

#[tokio::test]
async fn test_backend_401_records_redirect() {
    let app = helpers::TestApp::logged_in().await;

    Mock::given(method("GET"))
        .and(path("/tasks/analytics/3"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "Token revoked" })))
        .mount(&app.server)
        .await;

    let err = app.client.tasks.analytics(3).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authentication);
    assert_eq!(app.client.tasks.state().redirect.as_deref(), Some("/login"));
}

#[tokio::test]
async fn test_invalid_time_log_rejected_locally() {
    let app = helpers::TestApp::logged_in().await;

    let log = NewTimeLog {
        task_id: 1,
        plan_id: 5,
        start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
    };
    let err = app.client.timelogs.create(&log).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::Validation);
    assert!(app.client.timelogs.state().error.is_some());
    assert_eq!(app.request_count().await, 0);
}

#[tokio::test]
async fn test_time_logs_follow_loaded_day() {
    let app = helpers::TestApp::logged_in().await;
    let date = NaiveDate::from_ymd_opt(2025, 7, 21).unwrap();

    Mock::given(method("POST"))
        .and(path("/plans/"))
        .and(body_json(json!({ "date": "2025-07-21" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 5,
            "date": "2025-07-21",
            "times": [{
                "id": 11,
                "task_id": 1,
                "plan_id": 5,
                "start_time": "09:00:00",
                "end_time": "10:30:00",
                "done": false,
                "task": { "description": "Write documentation" }
            }]
        })))
        .mount(&app.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/plans/timelog"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 12,
            "task_id": 2,
            "plan_id": 5,
            "start_time": "11:00:00",
            "end_time": "12:00:00",
            "done": false
        })))
        .expect(1)
        .mount(&app.server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/plans/timelog/11"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 11,
            "task_id": 1,
            "plan_id": 5,
            "start_time": "09:00:00",
            "end_time": "10:30:00",
            "done": false
        })))
        .expect(1)
        .mount(&app.server)
        .await;

    let plan = app.client.timelogs.load_day(date).await.unwrap();
    assert_eq!(plan.planned_minutes(), 90);
    assert_eq!(app.client.timelogs.current_plan(), Some((5, date)));

    app.client
        .timelogs
        .create(&NewTimeLog {
            task_id: 2,
            plan_id: 5,
            start_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
        })
        .await
        .unwrap();
    app.client.timelogs.delete(11).await.unwrap();

    let ids: Vec<i64> = app.client.timelogs.state().items.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![12]);
}

#[tokio::test]
async fn test_plan_delete_sends_date_body() {
    let app = helpers::TestApp::logged_in().await;
    let date = NaiveDate::from_ymd_opt(2025, 7, 21).unwrap();
    let plan = json!({ "id": 5, "date": "2025-07-21", "times": [] });

    Mock::given(method("POST"))
        .and(path("/plans/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(plan.clone()))
        .mount(&app.server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/plans/"))
        .and(body_json(json!({ "date": "2025-07-21" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(plan))
        .expect(1)
        .mount(&app.server)
        .await;

    app.client.plans.load(date).await.unwrap();
    assert_eq!(app.client.plans.state().items.len(), 1);

    app.client.plans.delete(date).await.unwrap();
    assert!(app.client.plans.state().items.is_empty());
}

#[tokio::test]
async fn test_expired_session_refreshes_before_request() {
    let app = helpers::TestApp::new().await;
    app.store_tokens(&helpers::token_expiring_in(-10), "refresh-1");
    let fresh = helpers::token_expiring_in(3600);

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(json!({ "refresh_token": "refresh-1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": fresh,
            "refresh_token": "refresh-2"
        })))
        .expect(1)
        .mount(&app.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tasks/"))
        .and(header("authorization", format!("Bearer {fresh}").as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([helpers::task_json(1, "Write documentation", "pending")])),
        )
        .expect(1)
        .mount(&app.server)
        .await;

    let tasks = app.client.tasks.fetch_all(&TaskQuery::default()).await.unwrap();

    assert_eq!(tasks.len(), 1);
    assert_eq!(app.client.tasks.state().redirect, None);
    assert_eq!(app.refresh_token().as_deref(), Some("refresh-2"));
}

#[tokio::test]
async fn test_rejected_refresh_redirects_without_request() {
    let app = helpers::TestApp::new().await;
    app.store_tokens(&helpers::token_expiring_in(-10), "refresh-1");

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "Invalid token" })))
        .expect(1)
        .mount(&app.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tasks/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&app.server)
        .await;

    let err = app
        .client
        .tasks
        .fetch_all(&TaskQuery::default())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Authentication);
    assert_eq!(app.client.tasks.state().redirect.as_deref(), Some("/login"));
    assert_eq!(app.request_count().await, 1);
}

#[tokio::test]
async fn test_time_log_outside_loaded_day_is_not_held() {
    let app = helpers::TestApp::logged_in().await;

    Mock::given(method("POST"))
        .and(path("/plans/timelog"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 12,
            "task_id": 2,
            "plan_id": 5,
            "start_time": "11:00:00",
            "end_time": "12:00:00",
            "done": false
        })))
        .expect(1)
        .mount(&app.server)
        .await;

    let created = app
        .client
        .timelogs
        .create(&NewTimeLog {
            task_id: 2,
            plan_id: 5,
            start_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
        })
        .await
        .unwrap();

    assert_eq!(created.id, 12);
    assert_eq!(app.client.timelogs.current_plan(), None);
    assert!(app.client.timelogs.state().items.is_empty());
}
