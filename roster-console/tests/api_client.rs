use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, put},
};
use parking_lot::Mutex;
use roster_config::Credential;
use roster_console::{
    ConsoleError,
    infra::{
        ApiClient, ApiError,
        services::{AdminApiAdapter, AdminService},
    },
};
use roster_model::{Password, UserDraft, UserId};
use serde_json::{Value, json};

#[derive(Clone, Default)]
struct Received {
    bodies: Arc<Mutex<Vec<Value>>>,
}

fn authorized(headers: &HeaderMap) -> bool {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some("Bearer t0k3n");
    let cookie = headers.get(header::COOKIE).and_then(|v| v.to_str().ok())
        == Some("JSESSIONID=abc");
    bearer || cookie
}

fn login_redirect() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, "/login")]).into_response()
}

async fn info(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return login_redirect();
    }
    Json(json!({
        "id": 1,
        "firstName": "Ada",
        "lastName": "Admin",
        "age": 36,
        "email": "admin@example.com",
        "roles": [{"id": 1, "name": "ADMIN"}, {"id": 2, "name": "USER"}]
    }))
    .into_response()
}

async fn roles() -> Json<Value> {
    Json(json!([{"id": 1, "name": "ADMIN"}, {"id": 2, "name": "USER"}]))
}

async fn users(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return login_redirect();
    }
    Json(json!({
        "users": [
            {"id": 1, "firstName": "Ada", "lastName": "Admin", "email": "admin@example.com", "roles": [{"name": "ADMIN"}]},
            {"id": "3", "firstName": "Linus", "lastName": "Member", "age": null, "email": "linus@example.com", "roles": []}
        ]
    }))
    .into_response()
}

async fn create(State(received): State<Received>, Json(body): Json<Value>) -> Response {
    received.bodies.lock().push(body.clone());
    if body["email"] == "admin@example.com" {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "status": 500,
                "error": "Internal Server Error",
                "message": "User with email admin@example.com already exists"
            })),
        )
            .into_response();
    }
    let roles: Vec<Value> = body["roles"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .map(|name| json!({ "name": name }))
        .collect();
    (
        StatusCode::CREATED,
        Json(json!({
            "id": 5,
            "firstName": body["firstName"],
            "lastName": body["lastName"],
            "email": body["email"],
            "roles": roles
        })),
    )
        .into_response()
}

async fn update(
    State(received): State<Received>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Json<Value> {
    received.bodies.lock().push(body.clone());
    Json(json!({
        "id": id,
        "firstName": body.get("firstName").cloned().unwrap_or(json!("Ada")),
        "lastName": "Admin",
        "email": "admin@example.com",
        "roles": []
    }))
}

async fn remove(Path(id): Path<i64>) -> Response {
    if id == 9 {
        return (StatusCode::NOT_FOUND, "<html>Not Found</html>").into_response();
    }
    Json(json!({ "message": "User deleted successfully" })).into_response()
}

async fn serve() -> (String, Received) {
    let received = Received::default();
    let router = Router::new()
        .route("/api/user/info", get(info))
        .route("/api/admin/roles", get(roles))
        .route("/api/admin/users", get(users).post(create))
        .route("/api/admin/users/{id}", put(update).delete(remove))
        .with_state(received.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{addr}"), received)
}

async fn adapter(base_url: &str, credential: Option<Credential>) -> AdminApiAdapter {
    let client = ApiClient::new(base_url).unwrap();
    client.set_credential(credential).await;
    AdminApiAdapter::new(Arc::new(client))
}

#[tokio::test]
async fn bearer_token_is_sent_and_identity_decoded() {
    let (base, _) = serve().await;
    let service = adapter(&base, Some(Credential::bearer("t0k3n"))).await;

    let identity = service.current_identity().await.unwrap();
    assert_eq!(identity.id(), UserId(1));
    assert_eq!(identity.email(), "admin@example.com");
    assert_eq!(identity.as_user().first_name, "Ada");
    let names: Vec<_> = identity.roles().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["ADMIN", "USER"]);
}

#[tokio::test]
async fn session_cookie_is_replayed() {
    let (base, _) = serve().await;
    let service =
        adapter(&base, Some(Credential::session_cookie("JSESSIONID=abc"))).await;
    assert!(service.current_identity().await.is_ok());
}

#[tokio::test]
async fn login_redirect_is_not_followed() {
    let (base, _) = serve().await;
    let service = adapter(&base, None).await;

    let err = service.current_identity().await.unwrap_err();
    match &err {
        ApiError::Redirect {
            status, location, ..
        } => {
            assert_eq!(*status, 302);
            assert_eq!(location.as_deref(), Some("/login"));
        }
        other => panic!("expected redirect, got {other:?}"),
    }
    assert_eq!(ConsoleError::from(err), ConsoleError::Unauthorized);
}

#[tokio::test]
async fn user_listing_unwraps_envelope() {
    let (base, _) = serve().await;
    let service = adapter(&base, Some(Credential::bearer("t0k3n"))).await;

    let users = service.list_users().await.unwrap();
    let ids: Vec<_> = users.iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![UserId(1), UserId(3)]);
    assert!(users[1].roles.is_empty());
    assert_eq!(users[1].age, None);

    let roles = service.list_roles().await.unwrap();
    assert_eq!(roles.len(), 2);
}

#[tokio::test]
async fn create_sends_camel_case_body() {
    let (base, received) = serve().await;
    let service = adapter(&base, Some(Credential::bearer("t0k3n"))).await;
    let draft = UserDraft {
        first_name: " Grace ".into(),
        last_name: "Hopper".into(),
        age: None,
        email: "grace@example.com".into(),
        password: Password::new("cobol"),
        roles: vec!["USER".into()],
    };

    let created = service.create_user(draft.to_create_request()).await.unwrap();
    assert_eq!(created.id, UserId(5));
    assert_eq!(created.first_name, "Grace");

    let body = received.bodies.lock()[0].clone();
    assert_eq!(body["firstName"], "Grace");
    assert_eq!(body["password"], "cobol");
    assert_eq!(body["roles"], json!(["USER"]));
    assert!(body.get("age").is_none());
}

#[tokio::test]
async fn server_message_becomes_console_error() {
    let (base, _) = serve().await;
    let service = adapter(&base, Some(Credential::bearer("t0k3n"))).await;
    let draft = UserDraft {
        first_name: "Ada".into(),
        last_name: "Admin".into(),
        email: "admin@example.com".into(),
        password: Password::new("pw"),
        roles: vec!["ADMIN".into()],
        ..UserDraft::default()
    };

    let err = service
        .create_user(draft.to_create_request())
        .await
        .unwrap_err();
    assert_eq!(
        err.server_message(),
        Some("User with email admin@example.com already exists")
    );
    assert_eq!(
        ConsoleError::from(err),
        ConsoleError::Transient(
            "User with email admin@example.com already exists".into()
        )
    );
}

#[tokio::test]
async fn update_omits_blank_password() {
    let (base, received) = serve().await;
    let service = adapter(&base, Some(Credential::bearer("t0k3n"))).await;
    let draft = UserDraft {
        first_name: "Augusta".into(),
        roles: Vec::new(),
        ..UserDraft::default()
    };

    let updated = service
        .update_user(UserId(1), draft.to_update_request())
        .await
        .unwrap();
    assert_eq!(updated.first_name, "Augusta");

    let body = received.bodies.lock()[0].clone();
    assert!(body.get("password").is_none());
    assert!(body.get("email").is_none());
    assert_eq!(body["roles"], json!([]));
}

#[tokio::test]
async fn html_error_page_falls_back_to_status_text() {
    let (base, _) = serve().await;
    let service = adapter(&base, Some(Credential::bearer("t0k3n"))).await;

    let ack = service.delete_user(UserId(2)).await.unwrap();
    assert_eq!(ack.message, "User deleted successfully");

    let err = service.delete_user(UserId(9)).await.unwrap_err();
    assert_eq!(err.server_message(), None);
    assert_eq!(
        ConsoleError::from(err),
        ConsoleError::NotFound(
            "request to /api/admin/users/9 failed with HTTP 404".into()
        )
    );
}
