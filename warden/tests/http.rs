use axum::response::IntoResponse;
use http_body_util::BodyExt;
use warden::PermissionError;

async fn render(err: PermissionError) -> (u16, serde_json::Value) {
    let response = err.into_response();
    let status = response.status().as_u16();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_unauthorized_is_forbidden() {
    let (status, body) = render(PermissionError::UnauthorizedPermission(vec![
        "edit".into(),
        "publish".into(),
    ]))
    .await;
    assert_eq!(status, 403);
    assert_eq!(body["error"], "User does not have the right permissions edit, publish.");
}

#[tokio::test]
async fn test_guest_is_forbidden() {
    let (status, body) = render(PermissionError::NotLoggedIn).await;
    assert_eq!(status, 403);
    assert_eq!(body["error"], "User is not logged in.");
}

#[tokio::test]
async fn test_missing_and_duplicate() {
    let (status, _) = render(PermissionError::RoleDoesNotExist {
        name: "ghost".into(),
        guard_name: "web".into(),
    })
    .await;
    assert_eq!(status, 404);

    let (status, body) = render(PermissionError::PermissionAlreadyExists {
        name: "edit".into(),
        guard_name: "web".into(),
    })
    .await;
    assert_eq!(status, 409);
    assert_eq!(body["error"], "A permission `edit` already exists for guard `web`.");
}

#[tokio::test]
async fn test_store_failure_is_internal() {
    let (status, body) = render(PermissionError::Store("disk full".into())).await;
    assert_eq!(status, 500);
    assert_eq!(body["error"], "Store error: disk full");
}
