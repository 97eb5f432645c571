//! API integration tests.
//!
//! These drive the router end to end with a mock database. Every
//! authenticated request costs one token lookup before the handler runs,
//! so mock results are queued in request order.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    middleware,
    response::Response,
};
use coursedesk_api::{AppState, auth_middleware, router as api_router};
use coursedesk_common::LocalStorage;
use coursedesk_core::SessionStore;
use coursedesk_db::entities::{content_item, user::UserStatus};
use coursedesk_db::test_utils::fixtures;
use sea_orm::{DatabaseBackend, MockDatabase};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Build the API router over a mock database.
fn create_test_router(db: MockDatabase) -> Router {
    let storage = Arc::new(LocalStorage::new(
        std::env::temp_dir().join("coursedesk-api-tests"),
        "/files".to_string(),
    ));
    let state = AppState::new(
        Arc::new(db.into_connection()),
        storage,
        SessionStore::new(20, 4),
    );

    api_router()
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

fn post_json(uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .uri(uri)
        .method("POST")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn text_body(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn course_items() -> Vec<content_item::Model> {
    let mut nested = fixtures::item("n", content_item::ContentKind::Video, 0);
    nested.parent_id = Some("f".to_string());
    vec![
        fixtures::folder("f", "Unit 1"),
        fixtures::item("v", content_item::ContentKind::Video, 5),
        nested,
    ]
}

#[tokio::test]
async fn test_me_without_token_is_unauthorized() {
    let app = create_test_router(MockDatabase::new(DatabaseBackend::Postgres));

    let response = app.oneshot(post_json("/me", None, "{}")).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_me_returns_user_without_token() {
    let app = create_test_router(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![fixtures::admin("admin1")]]),
    );

    let response = app
        .oneshot(post_json("/me", Some("token-admin1"), "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["id"], "admin1");
    assert_eq!(body["data"]["role"], "admin");
    assert!(body["data"].get("token").is_none());
}

#[tokio::test]
async fn test_pending_student_is_forbidden() {
    let app = create_test_router(
        MockDatabase::new(DatabaseBackend::Postgres).append_query_results([vec![
            fixtures::student("s1", UserStatus::Pending, Some("10A")),
        ]]),
    );

    let response = app
        .oneshot(post_json("/me", Some("token-s1"), "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_student_cannot_open_students_view() {
    let app = create_test_router(
        MockDatabase::new(DatabaseBackend::Postgres).append_query_results([vec![
            fixtures::student("s1", UserStatus::Approved, Some("10A")),
        ]]),
    );

    let response = app
        .oneshot(post_json(
            "/nav/activate",
            Some("token-s1"),
            r#"{"view":"students"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_student_cannot_reorder() {
    let app = create_test_router(
        MockDatabase::new(DatabaseBackend::Postgres).append_query_results([vec![
            fixtures::student("s1", UserStatus::Approved, None),
        ]]),
    );

    let response = app
        .oneshot(post_json(
            "/content/reorder",
            Some("token-s1"),
            r#"{"ids":["a","b"]}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_listing_without_course_is_bad_request() {
    let app = create_test_router(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![fixtures::admin("admin1")]]),
    );

    let response = app
        .oneshot(post_json(
            "/content/list",
            Some("token-admin1"),
            r#"{"section":"content"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_browses_course_as_html() {
    let app = create_test_router(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![fixtures::admin("admin1")]])
            .append_query_results([vec![fixtures::course("course1", &["10A", "10B"])]])
            .append_query_results([vec![fixtures::admin("admin1")]])
            .append_query_results([course_items()]),
    );

    let response = app
        .clone()
        .oneshot(post_json(
            "/session/course",
            Some("token-admin1"),
            r#"{"courseId":"course1","subGroup":"10a"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["course"]["subGroup"], "10A");
    assert_eq!(body["data"]["view"], "home");

    let response = app
        .oneshot(post_json(
            "/nav/activate?format=html",
            Some("token-admin1"),
            r#"{"view":"content"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = text_body(response).await;
    assert!(html.contains("<h2>Way to Content</h2>"));
    assert!(html.contains("data-sortable=\"true\""));
    // Root listing only: the nested video stays inside its folder
    assert!(html.contains("data-id=\"f\""));
    assert!(html.contains("data-id=\"v\""));
    assert!(!html.contains("data-id=\"n\""));
}

#[tokio::test]
async fn test_out_of_range_breadcrumb_index_is_ignored() {
    let app = create_test_router(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![fixtures::admin("admin1")]])
            .append_query_results([vec![fixtures::course("course1", &[])]])
            .append_query_results([vec![fixtures::admin("admin1")]])
            .append_query_results([course_items()])
            .append_query_results([vec![fixtures::admin("admin1")]])
            .append_query_results([course_items()])
            .append_query_results([vec![fixtures::admin("admin1")]])
            .append_query_results([course_items()]),
    );

    for (uri, body) in [
        ("/session/course", r#"{"courseId":"course1"}"#),
        ("/nav/activate", r#"{"view":"content"}"#),
        ("/nav/folder", r#"{"folderId":"f","title":"Unit 1"}"#),
    ] {
        let response = app
            .clone()
            .oneshot(post_json(uri, Some("token-admin1"), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }

    let response = app
        .oneshot(post_json(
            "/nav/folder",
            Some("token-admin1"),
            r#"{"folderId":"f","breadcrumbIndex":18446744073709551615}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["currentFolderId"], "f");
    assert_eq!(body["data"]["breadcrumbs"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["breadcrumbs"][0]["id"], "f");
    assert_eq!(body["data"]["items"][0]["id"], "n");
}

#[tokio::test]
async fn test_admin_preview_rejects_unknown_sub_group() {
    let app = create_test_router(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![fixtures::admin("admin1")]])
            .append_query_results([vec![fixtures::course("course1", &["10A"])]]),
    );

    let response = app
        .oneshot(post_json(
            "/session/course",
            Some("token-admin1"),
            r#"{"courseId":"course1","subGroup":"12Z"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_reorder_while_filtered_is_conflict() {
    let app = create_test_router(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![fixtures::admin("admin1")]])
            .append_query_results([vec![fixtures::course("course1", &[])]])
            .append_query_results([vec![fixtures::admin("admin1")]])
            .append_query_results([course_items()])
            .append_query_results([vec![fixtures::admin("admin1")]])
            .append_query_results([vec![fixtures::admin("admin1")]]),
    );

    for (uri, body) in [
        ("/session/course", r#"{"courseId":"course1"}"#),
        ("/nav/activate", r#"{"view":"content"}"#),
        ("/content/filter", r#"{"term":"unit"}"#),
    ] {
        let response = app
            .clone()
            .oneshot(post_json(uri, Some("token-admin1"), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }

    let response = app
        .oneshot(post_json(
            "/content/reorder",
            Some("token-admin1"),
            r#"{"ids":["v","f"]}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_sessions_are_separated_by_client_id() {
    let app = create_test_router(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![fixtures::student("s1", UserStatus::Approved, None)]])
            .append_query_results([vec![fixtures::student("s1", UserStatus::Approved, None)]]),
    );

    let mut enter = post_json("/session/course", Some("token-s1"), "{}");
    enter
        .headers_mut()
        .insert("x-session-id", "tab-1".parse().unwrap());
    let response = app.clone().oneshot(enter).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut other_tab = post_json("/session", Some("token-s1"), "{}");
    other_tab
        .headers_mut()
        .insert("x-session-id", "tab-2".parse().unwrap());
    let response = app.oneshot(other_tab).await.unwrap();

    let body = json_body(response).await;
    assert!(body["data"]["course"].is_null());
}

#[tokio::test]
async fn test_delete_non_empty_folder_is_conflict() {
    let app = create_test_router(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![fixtures::admin("admin1")]])
            .append_query_results([vec![fixtures::folder("f", "Unit 1")]])
            .append_query_results([vec![maplit::btreemap! {
                "num_items" => sea_orm::Value::BigInt(Some(2)),
            }]]),
    );

    let response = app
        .oneshot(post_json(
            "/content/delete",
            Some("token-admin1"),
            r#"{"id":"f"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_admin_saves_folder_from_form() {
    let mut created = fixtures::folder("new1", "Unit 2");
    created.author_id = "admin1".to_string();

    let app = create_test_router(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![fixtures::admin("admin1")]])
            .append_query_results([vec![fixtures::course("course1", &[])]])
            .append_query_results([vec![fixtures::admin("admin1")]])
            .append_query_results([Vec::<content_item::Model>::new()])
            .append_query_results([vec![fixtures::admin("admin1")]])
            .append_query_results([vec![created.clone()]])
            .append_query_results([vec![created]]),
    );

    for (uri, body) in [
        ("/session/course", r#"{"courseId":"course1"}"#),
        ("/nav/activate", r#"{"view":"content"}"#),
    ] {
        let response = app
            .clone()
            .oneshot(post_json(uri, Some("token-admin1"), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }

    let boundary = "coursedesk-boundary";
    let form = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"kind\"\r\n\r\nfolder\r\n\
         --{boundary}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nUnit 2\r\n\
         --{boundary}--\r\n"
    );
    let request = Request::builder()
        .uri("/content/save")
        .method("POST")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .header(header::AUTHORIZATION, "Bearer token-admin1")
        .body(Body::from(form))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["title"], "Unit 2");
    assert_eq!(body["data"]["kind"], "folder");
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let app = create_test_router(MockDatabase::new(DatabaseBackend::Postgres));

    let response = app
        .oneshot(post_json("/nonexistent/endpoint", None, "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
