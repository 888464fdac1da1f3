use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use candor_api::auth::create_token;
use candor_api::{AppState, AppStateInner, router};
use candor_core::Tracker;
use candor_db::Database;
use candor_types::api::RegisterRequest;
use candor_types::models::{Role, User};

const SECRET: &str = "test-secret";

struct Harness {
    app: Router,
    state: AppState,
}

impl Harness {
    fn new() -> Self {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let state: AppState = Arc::new(AppStateInner {
            tracker: Tracker::new(db),
            jwt_secret: SECRET.to_string(),
            token_ttl: chrono::Duration::minutes(60),
        });
        Self {
            app: router(state.clone()),
            state,
        }
    }

    fn add_user(&self, email: &str, full_name: &str, role: Role, manager_id: Option<i64>) -> User {
        let req = RegisterRequest {
            email: email.to_string(),
            full_name: full_name.to_string(),
            password: "unused-here".to_string(),
            role,
            manager_id,
        };
        self.state.tracker.register(&req, "not-a-real-hash").unwrap()
    }

    async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let res = self.app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn call(&self, method: &str, uri: &str, user: Option<&User>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            let token = create_token(SECRET, &user.email, chrono::Duration::minutes(5)).unwrap();
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(req).await
    }
}

fn submission(employee_id: i64) -> Value {
    json!({
        "employee_id": employee_id,
        "content": "Great quarter",
        "strengths": "Ownership",
        "areas_to_improve": "Delegation",
        "sentiment": "positive",
        "tags": ["Leadership"]
    })
}

#[tokio::test]
async fn register_login_and_profile() {
    let h = Harness::new();

    let (status, body) = h
        .call(
            "POST",
            "/api/users/",
            None,
            Some(json!({
                "email": "mia@example.com",
                "full_name": "Mia Manager",
                "password": "password",
                "role": "manager"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "manager");

    let (status, body) = h
        .call(
            "POST",
            "/api/users/",
            None,
            Some(json!({
                "email": "short@example.com",
                "full_name": "Short",
                "password": "pw",
                "role": "employee"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("Password"));

    let login = |password: &str| {
        Request::builder()
            .method("POST")
            .uri("/token")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!("username=mia%40example.com&password={password}")))
            .unwrap()
    };

    let (status, _) = h.send(login("wrong-password")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = h.send(login("password")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    let token = body["access_token"].as_str().unwrap().to_string();

    let req = Request::builder()
        .uri("/api/users/me/")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = h.send(req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "mia@example.com");
    assert!(body.get("hashed_password").is_none());

    let (status, body) = h.call("GET", "/api/managers/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let h = Harness::new();

    let (status, body) = h.call("GET", "/api/feedback/", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Could not validate credentials");

    let req = Request::builder()
        .uri("/api/feedback/")
        .header(header::AUTHORIZATION, "Bearer not.a.token")
        .body(Body::empty())
        .unwrap();
    let (status, _) = h.send(req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A well-formed token for an account that does not exist.
    let ghost = User {
        id: 99,
        email: "ghost@example.com".to_string(),
        full_name: "Ghost".to_string(),
        role: Role::Employee,
        is_active: true,
        manager_id: None,
    };
    let (status, _) = h.call("GET", "/api/feedback/", Some(&ghost), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = h.call("GET", "/ping", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn downward_feedback_flow() {
    let h = Harness::new();
    let mia = h.add_user("mia@example.com", "Mia Manager", Role::Manager, None);
    let eli = h.add_user("eli@example.com", "Eli Employee", Role::Employee, Some(mia.id));

    let (status, fb) = h.call("POST", "/api/feedback/", Some(&mia), Some(submission(eli.id))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(fb["manager_id"], mia.id);
    assert_eq!(fb["employee_id"], eli.id);
    assert_eq!(fb["tags"], json!(["Leadership"]));
    let id = fb["id"].as_i64().unwrap();

    let (_, inbox) = h.call("GET", "/api/notifications/", Some(&eli), None).await;
    assert_eq!(inbox[0]["message"], "You have received new feedback from Mia Manager");

    let (status, list) = h.call("GET", "/api/feedback/", Some(&eli), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, _) = h
        .call("PUT", &format!("/api/feedback/{id}"), Some(&eli), Some(json!({ "content": "mine now" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, ack) = h
        .call("PUT", &format!("/api/feedback/{id}/acknowledge"), Some(&eli), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["is_acknowledged"], true);

    let (_, inbox) = h.call("GET", "/api/notifications/", Some(&mia), None).await;
    assert_eq!(inbox[0]["message"], "Eli Employee has acknowledged your feedback");

    let (status, _) = h.call("GET", "/api/feedback/4040", Some(&eli), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn targeting_rules_are_enforced() {
    let h = Harness::new();
    let mia = h.add_user("mia@example.com", "Mia Manager", Role::Manager, None);
    let omar = h.add_user("omar@example.com", "Omar Other", Role::Manager, None);
    let eli = h.add_user("eli@example.com", "Eli Employee", Role::Employee, Some(mia.id));
    let pat = h.add_user("pat@example.com", "Pat Peer", Role::Employee, Some(mia.id));

    let (status, body) = h.call("POST", "/api/feedback/", Some(&omar), Some(submission(eli.id))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], format!("Employee with ID {} not managed by you", eli.id));

    let (status, _) = h.call("POST", "/api/feedback/", Some(&eli), Some(submission(pat.id))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Upward feedback is stored with the employee as giver.
    let (status, fb) = h.call("POST", "/api/feedback/", Some(&eli), Some(submission(mia.id))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(fb["manager_id"], eli.id);
    assert_eq!(fb["employee_id"], mia.id);

    let (_, all) = h.call("GET", "/api/feedback/", Some(&omar), None).await;
    assert!(all.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn cited_request_completes_once() {
    let h = Harness::new();
    let mia = h.add_user("mia@example.com", "Mia Manager", Role::Manager, None);
    let eli = h.add_user("eli@example.com", "Eli Employee", Role::Employee, Some(mia.id));

    let (status, req) = h.call("POST", "/api/feedback-requests/", Some(&eli), None).await;
    assert_eq!(status, StatusCode::CREATED);
    let request_id = req["id"].as_i64().unwrap();

    let mut body = submission(eli.id);
    body["feedback_request_id"] = json!(request_id);

    let (status, _) = h.call("POST", "/api/feedback/", Some(&mia), Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, req) = h
        .call("GET", &format!("/api/feedback-requests/{request_id}"), Some(&eli), None)
        .await;
    assert_eq!(req["status"], "completed");

    let (status, _) = h.call("POST", "/api/feedback/", Some(&mia), Some(body)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, list) = h.call("GET", "/api/feedback/", Some(&mia), None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn dashboards_by_role() {
    let h = Harness::new();
    let mia = h.add_user("mia@example.com", "Mia Manager", Role::Manager, None);
    let eli = h.add_user("eli@example.com", "Eli Employee", Role::Employee, Some(mia.id));
    h.call("POST", "/api/feedback/", Some(&mia), Some(submission(eli.id))).await;

    let (status, d) = h.call("GET", "/api/dashboard/manager", Some(&mia), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(d["employees_count"], 1);
    assert_eq!(d["feedback_count"], 1);
    assert_eq!(d["feedback_by_sentiment"]["positive"], 1);
    assert_eq!(d["unavailable"], json!([]));

    let (status, body) = h.call("GET", "/api/dashboard/manager", Some(&eli), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "Not authorized. Manager role required.");

    let (_, d) = h.call("GET", "/api/dashboard/employee", Some(&eli), None).await;
    assert_eq!(d["feedback_count"], 1);

    let (_, d) = h.call("GET", "/api/dashboard/employee", Some(&mia), None).await;
    assert_eq!(d["feedback_count"], 0);
}

#[tokio::test]
async fn undecodable_input_is_reported_as_json() {
    let h = Harness::new();
    let mia = h.add_user("mia@example.com", "Mia Manager", Role::Manager, None);
    let eli = h.add_user("eli@example.com", "Eli Employee", Role::Employee, Some(mia.id));

    let mut body = submission(eli.id);
    body["sentiment"] = json!("furious");
    let (status, body) = h.call("POST", "/api/feedback/", Some(&mia), Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("sentiment"));

    let (status, body) = h.call("GET", "/api/feedback/?limit=lots", Some(&mia), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());

    let login = Request::builder()
        .method("POST")
        .uri("/token")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("username=mia%40example.com"))
        .unwrap();
    let (status, body) = h.send(login).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].is_string());
}
