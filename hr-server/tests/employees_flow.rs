mod common;

use common::{ADMIN, EMPLOYEE, HR, TestApp, spawn_app};
use http::StatusCode;
use serde_json::json;

async fn role_id_of(app: &TestApp, token: &str, user_id: &str) -> String {
    let res = app.get(&format!("/api/employees/{user_id}"), token).await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.json);
    res.data()["roleId"].as_str().expect("roleId").to_string()
}

#[tokio::test]
async fn hr_cannot_promote_itself() {
    let app = spawn_app().await;
    let (admin, admin_id) = app.login(ADMIN).await;
    let (hr, hr_id) = app.login(HR).await;
    let admin_role = role_id_of(&app, &admin, &admin_id).await;

    let res = app
        .put(
            &format!("/api/employees/{hr_id}"),
            &hr,
            json!({ "roleId": admin_role }),
        )
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.code(), Some(2003));

    let me = app.get("/api/auth/me", &hr).await;
    assert_eq!(me.data()["role"], "HR Manager");
}

#[tokio::test]
async fn hr_cannot_grant_a_wider_role() {
    let app = spawn_app().await;
    let (admin, admin_id) = app.login(ADMIN).await;
    let (hr, _) = app.login(HR).await;
    let (_, employee_id) = app.login(EMPLOYEE).await;
    let admin_role = role_id_of(&app, &admin, &admin_id).await;

    let res = app
        .put(
            &format!("/api/employees/{employee_id}"),
            &hr,
            json!({ "roleId": admin_role }),
        )
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.code(), Some(2004));

    let res = app
        .post(
            "/api/employees",
            &hr,
            json!({
                "employeeId": "EMP700",
                "email": "shadow.admin@example.com",
                "firstName": "Shadow",
                "lastName": "Admin",
                "roleId": admin_role
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.code(), Some(2004));

    // Administrators hold the wildcard and may grant it
    let res = app
        .put(
            &format!("/api/employees/{employee_id}"),
            &admin,
            json!({ "roleId": admin_role }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.json);
    assert_eq!(res.data()["roleName"], "Administrator");
}

#[tokio::test]
async fn hr_can_move_an_employee_to_a_narrower_role() {
    let app = spawn_app().await;
    let (hr, hr_id) = app.login(HR).await;
    let (_, employee_id) = app.login(EMPLOYEE).await;
    let employee_role = role_id_of(&app, &hr, &employee_id).await;
    let hr_role = role_id_of(&app, &hr, &hr_id).await;

    let res = app
        .put(
            &format!("/api/employees/{employee_id}"),
            &hr,
            json!({ "roleId": hr_role }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.json);
    assert_eq!(res.data()["roleName"], "HR Manager");

    let res = app
        .put(
            &format!("/api/employees/{employee_id}"),
            &hr,
            json!({ "roleId": employee_role }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["roleName"], "Employee");

    // Resubmitting one's current role is harmless
    let res = app
        .put(
            &format!("/api/employees/{hr_id}"),
            &hr,
            json!({ "roleId": hr_role, "phone": "555-0100" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.json);
}

#[tokio::test]
async fn duplicate_identity_on_create_is_bad_request() {
    let app = spawn_app().await;
    let (hr, _) = app.login(HR).await;
    let res = app
        .post(
            "/api/employees",
            &hr,
            json!({
                "employeeId": "EMP777",
                "email": " Employee@Example.com",
                "firstName": "Dup",
                "lastName": "Licate"
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.code(), Some(8002));
}
