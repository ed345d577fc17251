mod common;

use common::{EMPLOYEE, HR, MANAGER, TestApp, spawn_app};
use http::{Method, StatusCode};
use serde_json::{Value, json};

async fn submit(app: &TestApp, token: &str, type_id: &str, start: &str, end: &str) -> Value {
    let res = app
        .post(
            "/api/leave/requests",
            token,
            json!({
                "leaveTypeId": type_id,
                "startDate": start,
                "endDate": end,
                "reason": "Family wedding out of town"
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.json);
    res.data().clone()
}

#[tokio::test]
async fn approval_requires_permission_and_debits_balance() {
    let app = spawn_app().await;
    let (employee, employee_id) = app.login(EMPLOYEE).await;
    let (manager, manager_id) = app.login(MANAGER).await;
    let annual = app.leave_type_id(&employee, "Annual Leave").await;

    let request = submit(&app, &employee, &annual, "2030-06-10", "2030-06-12").await;
    assert_eq!(request["status"], "PENDING");
    assert_eq!(request["daysRequested"], 3);
    let id = request["id"].as_str().unwrap();
    let approve_uri = format!("/api/leave/requests/{id}/approve");

    let res = app.request(Method::PUT, &approve_uri, Some(&employee), None).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.code(), Some(2001));

    let res = app.request(Method::PUT, &approve_uri, Some(&manager), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json["message"], "Leave request approved successfully");
    assert_eq!(res.data()["status"], "APPROVED");
    assert_eq!(res.data()["approvedBy"], manager_id.as_str());
    assert!(res.data()["approvedAt"].as_i64().is_some());

    let res = app.request(Method::PUT, &approve_uri, Some(&manager), None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.code(), Some(11002));

    let res = app
        .get(
            &format!("/api/leave/balances/user/{employee_id}?year=2030"),
            &employee,
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    let balance = res
        .data()
        .as_array()
        .unwrap()
        .iter()
        .find(|b| b["leaveTypeId"] == annual.as_str())
        .cloned()
        .unwrap();
    assert_eq!(balance["leaveTypeName"], "Annual Leave");
    assert_eq!(balance["allocatedDays"], 25);
    assert_eq!(balance["usedDays"], 3);
    assert_eq!(balance["remainingDays"], 22);

    let res = app
        .get(&format!("/api/leave/balances/user/{manager_id}"), &employee)
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn approval_beyond_allowance_is_refused() {
    let app = spawn_app().await;
    let (employee, _) = app.login(EMPLOYEE).await;
    let (hr, _) = app.login(HR).await;
    let personal = app.leave_type_id(&employee, "Personal Leave").await;

    let request = submit(&app, &employee, &personal, "2030-04-01", "2030-04-06").await;
    assert_eq!(request["daysRequested"], 6);
    let id = request["id"].as_str().unwrap();

    let res = app
        .request(
            Method::PUT,
            &format!("/api/leave/requests/{id}/approve"),
            Some(&hr),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.code(), Some(11003));

    let res = app.get(&format!("/api/leave/requests/{id}"), &employee).await;
    assert_eq!(res.data()["status"], "PENDING");
}

#[tokio::test]
async fn reject_records_comments() {
    let app = spawn_app().await;
    let (employee, _) = app.login(EMPLOYEE).await;
    let (manager, _) = app.login(MANAGER).await;
    let sick = app.leave_type_id(&employee, "Sick Leave").await;

    let request = submit(&app, &employee, &sick, "2030-02-03", "2030-02-03").await;
    let id = request["id"].as_str().unwrap();

    let res = app
        .put(
            &format!("/api/leave/requests/{id}/reject"),
            &manager,
            json!({ "comments": "Quarter close" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json["message"], "Leave request rejected");
    assert_eq!(res.data()["status"], "REJECTED");
    assert_eq!(res.data()["comments"], "Quarter close");
}

#[tokio::test]
async fn employees_only_list_their_own_requests() {
    let app = spawn_app().await;
    let (employee, employee_id) = app.login(EMPLOYEE).await;
    let (manager, _) = app.login(MANAGER).await;
    let annual = app.leave_type_id(&employee, "Annual Leave").await;

    submit(&app, &employee, &annual, "2030-07-01", "2030-07-02").await;
    submit(&app, &manager, &annual, "2030-08-01", "2030-08-02").await;

    let res = app.get("/api/leave/requests", &employee).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["total"], 1);
    let items = res.data()["data"].as_array().unwrap();
    assert!(items.iter().all(|r| r["userId"] == employee_id.as_str()));

    // A userId filter cannot widen the view
    let res = app.get("/api/leave/requests?userId=someone-else", &employee).await;
    assert_eq!(res.data()["total"], 1);

    let res = app.get("/api/leave/requests", &manager).await;
    assert_eq!(res.data()["total"], 2);

    let manager_request = app.get("/api/leave/requests", &manager).await.data()["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["userId"] != employee_id.as_str())
        .and_then(|r| r["id"].as_str())
        .unwrap()
        .to_string();
    let res = app
        .get(&format!("/api/leave/requests/{manager_request}"), &employee)
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn leave_catalog_is_restricted_to_leave_admins() {
    let app = spawn_app().await;
    let (manager, _) = app.login(MANAGER).await;
    let (hr, _) = app.login(HR).await;
    let body = json!({
        "name": "Study Leave",
        "description": "Exams and courses",
        "maxDaysPerYear": 4
    });

    let res = app.post("/api/leave/types", &manager, body.clone()).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.code(), Some(2002));

    let res = app.post("/api/leave/types", &hr, body.clone()).await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.data()["name"], "Study Leave");
    assert_eq!(res.data()["isActive"], true);
    assert_eq!(res.data()["carryForward"], false);

    let res = app.post("/api/leave/types", &hr, body).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.code(), Some(11102));

    let id = app.leave_type_id(&manager, "Study Leave").await;
    let res = app
        .put(
            &format!("/api/leave/types/{id}"),
            &hr,
            json!({ "name": "Study Leave", "maxDaysPerYear": 4, "isActive": false }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);

    let active = app.get("/api/leave/types", &manager).await;
    assert!(!active.data().as_array().unwrap().iter().any(|t| t["id"] == id.as_str()));
    let all = app.get("/api/leave/types?all=true", &manager).await;
    assert!(all.data().as_array().unwrap().iter().any(|t| t["id"] == id.as_str()));

    let res = app
        .post(
            "/api/leave/requests",
            &manager,
            json!({
                "leaveTypeId": id,
                "startDate": "2030-03-04",
                "endDate": "2030-03-04",
                "reason": "Certification exam"
            }),
        )
        .await;
    assert_eq!(res.code(), Some(11103));
}

#[tokio::test]
async fn request_validation() {
    let app = spawn_app().await;
    let (employee, _) = app.login(EMPLOYEE).await;
    let annual = app.leave_type_id(&employee, "Annual Leave").await;

    let res = app
        .post(
            "/api/leave/requests",
            &employee,
            json!({
                "leaveTypeId": annual,
                "startDate": "2030-05-01",
                "endDate": "2030-05-02",
                "reason": "Trip"
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.code(), Some(2));
    assert!(res.json["details"].get("reason").is_some());

    let res = app
        .post(
            "/api/leave/requests",
            &employee,
            json!({
                "leaveTypeId": annual,
                "startDate": "2030-05-03",
                "endDate": "2030-05-01",
                "reason": "Dates are backwards here"
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.code(), Some(11004));

    let res = app
        .post(
            "/api/leave/requests",
            &employee,
            json!({
                "leaveTypeId": "missing",
                "startDate": "2030-05-01",
                "endDate": "2030-05-01",
                "reason": "Unknown type of leave"
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.code(), Some(11101));
}

#[tokio::test]
async fn cancel_is_final() {
    let app = spawn_app().await;
    let (employee, _) = app.login(EMPLOYEE).await;
    let (manager, _) = app.login(MANAGER).await;
    let annual = app.leave_type_id(&employee, "Annual Leave").await;

    let request = submit(&app, &employee, &annual, "2030-09-14", "2030-09-18").await;
    let id = request["id"].as_str().unwrap();
    let cancel_uri = format!("/api/leave/requests/{id}/cancel");

    let res = app.request(Method::PUT, &cancel_uri, Some(&manager), None).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app.request(Method::PUT, &cancel_uri, Some(&employee), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["status"], "CANCELLED");

    let res = app.request(Method::PUT, &cancel_uri, Some(&employee), None).await;
    assert_eq!(res.code(), Some(11002));

    let res = app
        .request(
            Method::PUT,
            &format!("/api/leave/requests/{id}/approve"),
            Some(&manager),
            None,
        )
        .await;
    assert_eq!(res.code(), Some(11002));
}
