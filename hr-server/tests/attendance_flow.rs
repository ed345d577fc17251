mod common;

use common::{EMPLOYEE, HR, MANAGER, spawn_app};
use http::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn second_clock_in_same_day_is_rejected() {
    let app = spawn_app().await;
    let (token, user_id) = app.login(EMPLOYEE).await;

    let res = app
        .post("/api/attendance/clock-in", &token, json!({ "notes": "On site" }))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json["message"], "Clocked in successfully");
    assert_eq!(res.data()["status"], "PRESENT");
    assert_eq!(res.data()["userId"], user_id.as_str());
    assert!(res.data()["clockIn"].as_i64().is_some());

    let res = app.post("/api/attendance/clock-in", &token, json!({})).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.code(), Some(10002));
    assert_eq!(res.json["success"], false);
}

#[tokio::test]
async fn clock_in_without_body() {
    let app = spawn_app().await;
    let (token, _) = app.login(EMPLOYEE).await;
    let res = app
        .request(Method::POST, "/api/attendance/clock-in", Some(&token), None)
        .await;
    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn clock_out_requires_clock_in_and_happens_once() {
    let app = spawn_app().await;
    let (token, _) = app.login(EMPLOYEE).await;

    let res = app.post("/api/attendance/clock-out", &token, json!({})).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.code(), Some(10003));

    app.post("/api/attendance/clock-in", &token, json!({})).await;
    let res = app.post("/api/attendance/clock-out", &token, json!({})).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json["message"], "Clocked out successfully");
    let hours = res.data()["totalHours"].as_f64().unwrap();
    assert!(hours >= 0.0);

    let res = app.post("/api/attendance/clock-out", &token, json!({})).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.code(), Some(10004));

    // The day is closed
    let res = app.post("/api/attendance/clock-in", &token, json!({})).await;
    assert_eq!(res.code(), Some(10002));
}

#[tokio::test]
async fn break_transitions() {
    let app = spawn_app().await;
    let (token, _) = app.login(MANAGER).await;

    let res = app.post("/api/attendance/break-start", &token, json!({})).await;
    assert_eq!(res.code(), Some(10003));

    app.post("/api/attendance/clock-in", &token, json!({})).await;
    let res = app.post("/api/attendance/break-end", &token, json!({})).await;
    assert_eq!(res.code(), Some(10006));

    let res = app.post("/api/attendance/break-start", &token, json!({})).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.data()["breakStartedAt"].as_i64().is_some());

    let res = app.post("/api/attendance/break-start", &token, json!({})).await;
    assert_eq!(res.code(), Some(10005));

    let res = app.post("/api/attendance/break-end", &token, json!({})).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.data()["breakStartedAt"].is_null());

    // Clock-out while on break closes the break
    app.post("/api/attendance/break-start", &token, json!({})).await;
    let res = app.post("/api/attendance/clock-out", &token, json!({})).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.data()["breakStartedAt"].is_null());
}

#[tokio::test]
async fn summary_and_records_are_self_or_permission() {
    let app = spawn_app().await;
    let (employee, employee_id) = app.login(EMPLOYEE).await;
    let (hr, hr_id) = app.login(HR).await;

    app.post("/api/attendance/clock-in", &employee, json!({})).await;

    let res = app
        .get(&format!("/api/attendance/user/{employee_id}/summary"), &employee)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["totalDays"], 1);
    assert_eq!(res.data()["presentDays"], 1);
    assert_eq!(res.data()["attendanceRate"], 100.0);

    let res = app
        .get(&format!("/api/attendance/user/{hr_id}/summary"), &hr)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["totalDays"], 0);
    assert_eq!(res.data()["attendanceRate"], 0.0);

    let res = app
        .get(&format!("/api/attendance/user/{employee_id}"), &hr)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data().as_array().unwrap().len(), 1);

    let res = app.get("/api/attendance/today", &hr).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data().as_array().unwrap().len(), 1);

    let res = app.get("/api/attendance?limit=5", &hr).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["total"], 1);
    assert_eq!(res.data()["limit"], 5);
}

#[tokio::test]
async fn invalid_summary_month_is_a_validation_error() {
    let app = spawn_app().await;
    let (token, user_id) = app.login(EMPLOYEE).await;
    let res = app
        .get(
            &format!("/api/attendance/user/{user_id}/summary?year=2025&month=13"),
            &token,
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.code(), Some(2));
}

#[tokio::test]
async fn time_entries_are_private_to_their_owner() {
    let app = spawn_app().await;
    let (employee, _) = app.login(EMPLOYEE).await;
    let (manager, _) = app.login(MANAGER).await;

    let res = app
        .post(
            "/api/attendance/time-tracking",
            &employee,
            json!({
                "projectName": "Website",
                "taskDescription": "Landing page copy",
                "startTime": 1_700_000_000_000i64,
                "endTime": 1_700_005_400_000i64,
                "billable": true
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.json["message"], "Time entry created successfully");
    let entry_id = res.data()["id"].as_str().unwrap().to_string();

    let res = app
        .post(
            "/api/attendance/time-tracking",
            &employee,
            json!({
                "taskDescription": "Backwards",
                "startTime": 1_700_005_400_000i64,
                "endTime": 1_700_000_000_000i64
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.code(), Some(10102));

    let uri = format!("/api/attendance/time-tracking/{entry_id}");
    assert_eq!(app.get(&uri, &manager).await.status, StatusCode::NOT_FOUND);
    let res = app
        .request(Method::DELETE, &uri, Some(&manager), None)
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app.get("/api/attendance/time-tracking", &manager).await;
    assert_eq!(res.data().as_array().unwrap().len(), 0);
    let res = app.get("/api/attendance/time-tracking", &employee).await;
    assert_eq!(res.data().as_array().unwrap().len(), 1);

    let res = app
        .put(
            &uri,
            &employee,
            json!({
                "taskDescription": "Landing page copy, second pass",
                "startTime": 1_700_000_000_000i64,
                "endTime": 1_700_007_200_000i64
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["billable"], false);

    let res = app.request(Method::DELETE, &uri, Some(&employee), None).await;
    assert_eq!(res.status, StatusCode::OK);
}
