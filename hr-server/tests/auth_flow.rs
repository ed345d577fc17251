mod common;

use common::{ADMIN, EMPLOYEE, MANAGER, spawn_app};
use http::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn health_is_public() {
    let app = spawn_app().await;
    let res = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json["status"], "ok");
    assert_eq!(res.json["service"], "hr-server");
}

#[tokio::test]
async fn login_returns_identity_and_tokens() {
    let app = spawn_app().await;
    let res = app.login_raw("  Admin@Example.com ", ADMIN.1).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json["success"], true);
    assert_eq!(res.json["message"], "Login successful");
    assert_eq!(res.data()["user"]["role"], "Administrator");
    assert_eq!(res.data()["user"]["employeeId"], "EMP001");
    assert!(res.data()["accessToken"].as_str().is_some());
    assert!(res.data()["refreshToken"].as_str().is_some());
    assert!(res.data()["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn unknown_email_and_wrong_password_are_indistinguishable() {
    let app = spawn_app().await;
    let wrong_password = app.login_raw(EMPLOYEE.0, "not-the-password").await;
    let unknown_email = app.login_raw("nobody@example.com", "not-the-password").await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.status, unknown_email.status);
    assert_eq!(wrong_password.bytes, unknown_email.bytes);
    assert_eq!(wrong_password.code(), Some(1002));
}

#[tokio::test]
async fn deactivated_account_cannot_login_or_use_tokens() {
    let app = spawn_app().await;
    let (admin, _) = app.login(ADMIN).await;
    let (employee, employee_id) = app.login(EMPLOYEE).await;

    let res = app
        .request(
            Method::DELETE,
            &format!("/api/employees/{employee_id}"),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);

    let res = app.login_raw(EMPLOYEE.0, EMPLOYEE.1).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.code(), Some(1007));

    // Identity is re-resolved on every request
    let res = app.get("/api/auth/me", &employee).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_issues_new_pair_and_rejects_access_tokens() {
    let app = spawn_app().await;
    let login = app.login_raw(MANAGER.0, MANAGER.1).await;
    let refresh_token = login.data()["refreshToken"].as_str().unwrap().to_string();
    let access_token = login.data()["accessToken"].as_str().unwrap().to_string();

    let res = app
        .request(
            Method::POST,
            "/api/auth/refresh",
            None,
            Some(json!({ "refreshToken": refresh_token })),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json["message"], "Token refreshed successfully");
    let new_access = res.data()["accessToken"].as_str().unwrap();
    assert_eq!(app.get("/api/auth/me", new_access).await.status, StatusCode::OK);

    let res = app
        .request(
            Method::POST,
            "/api/auth/refresh",
            None,
            Some(json!({ "refreshToken": access_token })),
        )
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.code(), Some(1008));
}

#[tokio::test]
async fn refresh_token_is_not_an_access_token() {
    let app = spawn_app().await;
    let login = app.login_raw(MANAGER.0, MANAGER.1).await;
    let refresh_token = login.data()["refreshToken"].as_str().unwrap();
    let res = app.get("/api/auth/me", refresh_token).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = spawn_app().await;
    let res = app
        .request(Method::GET, "/api/employees", None, None)
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.code(), Some(1001));
    assert_eq!(res.json["success"], false);

    let res = app.get("/api/employees", "garbage").await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.code(), Some(1004));
}

#[tokio::test]
async fn register_assigns_default_role_and_rejects_duplicates() {
    let app = spawn_app().await;
    let body = json!({
        "employeeId": "EMP900",
        "email": "new.hire@example.com",
        "password": "correct-horse",
        "firstName": "New",
        "lastName": "Hire"
    });
    let res = app
        .request(Method::POST, "/api/auth/register", None, Some(body.clone()))
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.json["message"], "User registered successfully");
    assert_eq!(res.data()["role"], "Employee");

    let res = app
        .request(Method::POST, "/api/auth/register", None, Some(body))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.code(), Some(8002));

    let (token, _) = app.login(("new.hire@example.com", "correct-horse")).await;
    assert_eq!(app.get("/api/auth/me", &token).await.status, StatusCode::OK);
}

#[tokio::test]
async fn register_validates_fields() {
    let app = spawn_app().await;
    let res = app
        .request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "employeeId": "E1",
                "email": "not-an-email",
                "password": "short",
                "firstName": "N",
                "lastName": "Hire"
            })),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.code(), Some(2));
    let details = &res.json["details"];
    assert!(details.get("employeeId").is_some() || details.get("employee_id").is_some());
    assert!(details.get("email").is_some());
    assert!(details.get("password").is_some());
}

#[tokio::test]
async fn forgot_password_does_not_reveal_accounts() {
    let app = spawn_app().await;
    let known = app
        .request(
            Method::POST,
            "/api/auth/forgot-password",
            None,
            Some(json!({ "email": EMPLOYEE.0 })),
        )
        .await;
    let unknown = app
        .request(
            Method::POST,
            "/api/auth/forgot-password",
            None,
            Some(json!({ "email": "ghost@example.com" })),
        )
        .await;
    assert_eq!(known.status, StatusCode::OK);
    assert_eq!(known.bytes, unknown.bytes);
}

#[tokio::test]
async fn logout_is_a_stateless_success() {
    let app = spawn_app().await;
    let res = app.request(Method::POST, "/api/auth/logout", None, None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json["message"], "Logged out successfully");
}

#[tokio::test]
async fn wildcard_role_passes_every_gate() {
    let app = spawn_app().await;
    let (admin, _) = app.login(ADMIN).await;
    let (employee, _) = app.login(EMPLOYEE).await;

    let me = app.get("/api/auth/me", &admin).await;
    let permissions = me.data()["permissions"].as_array().unwrap();
    assert!(permissions.iter().any(|p| p == "*"));

    for uri in [
        "/api/reports/dashboard/stats",
        "/api/employees",
        "/api/leave/balances",
    ] {
        assert_eq!(app.get(uri, &admin).await.status, StatusCode::OK, "{uri}");
        let denied = app.get(uri, &employee).await;
        assert_eq!(denied.status, StatusCode::FORBIDDEN, "{uri}");
        assert_eq!(denied.code(), Some(2001));
    }
}

#[tokio::test]
async fn padded_mixed_case_email_is_normalized_on_register() {
    let app = spawn_app().await;
    let res = app
        .request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "employeeId": "EMP901",
                "email": "  New.Hire@Example.COM ",
                "password": "correct-horse",
                "firstName": "New",
                "lastName": "Hire"
            })),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.json);
    assert_eq!(res.data()["email"], "new.hire@example.com");

    app.login(("new.hire@example.com", "correct-horse")).await;
    app.login((" NEW.HIRE@example.com", "correct-horse")).await;
}
