//! Contract tests for the collaborator clients against a mock server.
//!
//! These verify the wire shapes each client sends and accepts: paths,
//! status-update bodies, the page envelope, and the error taxonomy mapping.

use reclaim_clients::{
    HttpFoundRecordService, HttpLostRecordService, HttpNotificationService,
    HttpUserDirectoryService,
};
use reclaim_core::{
    Error, FoundRecordService, LostRecordService, NotificationKind, NotificationRequest,
    NotificationService, Role, UserDirectoryService,
};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn fetch_lost_record_parses_summary() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lost/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "userId": 42,
            "category": "ELECTRONICS",
            "title": "Black earbuds",
            "description": "Left in the reading room",
            "lostAt": "2026-05-01T09:30:00Z",
            "lostPlace": "Main Library",
            "status": "OPEN"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpLostRecordService::new(server.uri(), 5, 1000);
    let view = client.fetch(7).await.unwrap();
    assert_eq!(view.id, 7);
    assert_eq!(view.user_id, 42);
    assert_eq!(view.category.as_deref(), Some("ELECTRONICS"));
    assert_eq!(view.lost_place.as_deref(), Some("Main Library"));
}

#[tokio::test]
async fn fetch_missing_lost_record_maps_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lost/404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = HttpLostRecordService::new(server.uri(), 5, 1000);
    let err = client.fetch(404).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert!(err.to_string().contains("lost record 404"));
}

#[tokio::test]
async fn collaborator_error_status_maps_to_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lost/1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = HttpLostRecordService::new(server.uri(), 5, 1000);
    let err = client.fetch(1).await.unwrap_err();
    assert!(matches!(err, Error::CollaboratorUnavailable(_)));
}

#[tokio::test]
async fn list_open_unwraps_page_envelope_and_filters_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lost"))
        .and(query_param("size", "1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [
                {"id": 1, "userId": 5, "status": "OPEN", "title": "Umbrella"},
                {"id": 2, "userId": 6, "status": "CLOSED", "title": "Wallet"},
                {"id": 3, "userId": 7, "status": "OPEN", "title": "Badge"}
            ],
            "totalElements": 3
        })))
        .mount(&server)
        .await;

    let client = HttpLostRecordService::new(server.uri(), 5, 1000);
    let open = client.list_open().await.unwrap();
    let ids: Vec<i64> = open.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![1, 3]);
}

#[tokio::test]
async fn list_available_keeps_registered_and_stored_only() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/found"))
        .and(query_param("size", "500"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [
                {"id": 10, "ownerUserId": 5, "status": "REGISTERED"},
                {"id": 11, "ownerUserId": 5, "status": "STORED"},
                {"id": 12, "ownerUserId": 5, "status": "IN_HANDOVER"},
                {"id": 13, "ownerUserId": 5, "status": "HANDED_OVER"},
                {"id": 14, "ownerUserId": 5}
            ]
        })))
        .mount(&server)
        .await;

    let client = HttpFoundRecordService::new(server.uri(), 5, 500);
    let available = client.list_available().await.unwrap();
    let ids: Vec<i64> = available.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![10, 11]);
}

#[tokio::test]
async fn empty_page_envelope_degrades_to_no_items() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/found"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let client = HttpFoundRecordService::new(server.uri(), 5, 1000);
    assert!(client.list_available().await.unwrap().is_empty());
}

#[tokio::test]
async fn lost_scan_tolerates_envelope_without_content() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lost"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let client = HttpLostRecordService::new(server.uri(), 5, 1000);
    assert!(client.list_open().await.unwrap().is_empty());
}

#[tokio::test]
async fn close_sends_closed_status_update() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/lost/9/status"))
        .and(body_json(json!({"status": "CLOSED"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpLostRecordService::new(server.uri(), 5, 1000);
    client.close(9).await.unwrap();
}

#[tokio::test]
async fn mark_handed_over_sends_status_update() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/found/3/status"))
        .and(body_json(json!({"status": "HANDED_OVER"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpFoundRecordService::new(server.uri(), 5, 1000);
    client.mark_handed_over(3).await.unwrap();
}

#[tokio::test]
async fn notification_dispatch_sends_wire_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/notifications"))
        .and(body_json(json!({
            "userId": 20,
            "type": "HANDOVER_REQUESTED",
            "title": "New handover request",
            "content": "Handover #3 was requested for your found item.",
            "relatedHandoverId": 3
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpNotificationService::new(server.uri(), 5);
    client
        .send(NotificationRequest {
            user_id: 20,
            kind: NotificationKind::HandoverRequested,
            title: "New handover request".to_string(),
            content: "Handover #3 was requested for your found item.".to_string(),
            related_handover_id: Some(3),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn failed_notification_dispatch_surfaces_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/notifications"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = HttpNotificationService::new(server.uri(), 5);
    let err = client
        .send(NotificationRequest {
            user_id: 20,
            kind: NotificationKind::HandoverCanceled,
            title: "t".to_string(),
            content: "c".to_string(),
            related_handover_id: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::CollaboratorUnavailable(_)));
}

#[tokio::test]
async fn users_by_role_extracts_ids_from_user_objects() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/by-role/SECURITY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 4, "name": "Dana", "role": "SECURITY"},
            {"id": 5, "name": "Sam", "role": "SECURITY"},
            {"id": 9, "name": "Riley", "role": "SECURITY"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpUserDirectoryService::new(server.uri(), 5);
    let ids = client.ids_with_role(Role::Security).await.unwrap();
    assert_eq!(ids, vec![4, 5, 9]);
}

#[tokio::test]
async fn lookup_retries_once_after_timeout() {
    let server = MockServer::start().await;
    // First attempt stalls past the client timeout, the retry answers.
    Mock::given(method("GET"))
        .and(path("/lost/7"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(1500))
                .set_body_json(json!({"id": 7, "userId": 1, "status": "OPEN"})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/lost/7"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": 7, "userId": 1, "status": "OPEN"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpLostRecordService::new(server.uri(), 1, 1000);
    let view = client.fetch(7).await.unwrap();
    assert_eq!(view.id, 7);
}
