//! トリガーエンドポイントの統合テスト
//!
//! ルーターをモック依存で構築し、HTTP レベルでステータスコードと
//! レスポンスボディを検証する。

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    routing::{get, post},
};
use http::{Request, StatusCode};
use pretty_assertions::assert_eq;
use rosterly_domain::{
    clock::FixedClock,
    notification::{
        DeliveryStatus,
        EmailMessage,
        EmailTemplate,
        MailSender,
        NotificationError,
        NotificationId,
        NotificationKind,
        NotificationRecord,
    },
    user::{Email, UserId, UserProfile, UserRole},
};
use rosterly_infra::{
    mock::{
        MockEmailTemplateRepository,
        MockNotificationRepository,
        MockNotificationSender,
        MockUserDirectory,
    },
    notification::NotificationSender,
};
use rosterly_notification_dispatcher::{
    handler::{TriggerState, handle_notification_created, health_check},
    usecase::{DispatchSettings, NotificationDispatcher},
};
use serde_json::{Value, json};
use tower::ServiceExt;

const TRIGGER_PATH: &str = "/internal/triggers/notifications";

/// 送信に時間がかかるメール送信（タイムアウト検証用）
struct SlowNotificationSender;

#[async_trait]
impl NotificationSender for SlowNotificationSender {
    async fn send_email(&self, _email: &EmailMessage) -> Result<(), NotificationError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(())
    }
}

struct TestApp {
    notifications: MockNotificationRepository,
    router:        Router,
}

fn create_test_app(
    sender: Arc<dyn NotificationSender>,
    notifications: MockNotificationRepository,
    timeout: Duration,
) -> TestApp {
    let users = MockUserDirectory::new();
    users.add_user(UserProfile::new(
        UserId::new("U1").unwrap(),
        Some("alex@example.com".to_string()),
        Some("Alex".to_string()),
        UserRole::Employee,
    ));
    users.add_user(UserProfile::new(
        UserId::new("U2").unwrap(),
        Some("sam@example.com".to_string()),
        Some("Sam".to_string()),
        UserRole::Manager,
    ));

    let templates = MockEmailTemplateRepository::new();
    templates.add_template(EmailTemplate::new(
        NotificationKind::NewMessage.notification_type(),
        "{sender_first_name} sent you a message",
        "Hi {recipient_first_name}, see {messages_link}",
    ));

    let dispatcher = NotificationDispatcher::new(
        sender,
        Arc::new(notifications.clone()),
        Arc::new(users),
        Arc::new(templates),
        Arc::new(FixedClock::new(chrono::DateTime::UNIX_EPOCH)),
        DispatchSettings {
            base_url: "https://portal.example.com".to_string(),
            from:     MailSender {
                display_name: "Rosterly".to_string(),
                address:      Email::new("noreply@rosterly.example.com").unwrap(),
            },
        },
    );
    let state = Arc::new(TriggerState {
        dispatcher,
        timeout,
    });

    let router = Router::new()
        .route("/health", get(health_check))
        .route(TRIGGER_PATH, post(handle_notification_created))
        .with_state(state);

    TestApp {
        notifications,
        router,
    }
}

fn default_app() -> (TestApp, MockNotificationSender) {
    let sender = MockNotificationSender::new();
    let app = create_test_app(
        Arc::new(sender.clone()),
        MockNotificationRepository::new(),
        Duration::from_secs(60),
    );
    (app, sender)
}

fn new_message_snapshot() -> Value {
    json!({
        "type": "newMessage",
        "recipientId": "U1",
        "contextData": { "senderId": "U2" },
        "link": "/messages/T1",
        "status": "pending"
    })
}

fn store(notifications: &MockNotificationRepository, id: &str, data: &Value) {
    let record = NotificationRecord::from_snapshot(NotificationId::new(id).unwrap(), data).unwrap();
    notifications.add_record(record);
}

fn trigger_request(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(TRIGGER_PATH)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_作成イベントを受けてメールを送信し200を返す() {
    // Arrange
    let (app, sender) = default_app();
    let data = new_message_snapshot();
    store(&app.notifications, "N1", &data);
    let body = json!({ "documentId": "N1", "data": data }).to_string();

    // Act
    let (status, body) = send(app.router, trigger_request(body)).await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "documentId": "N1", "outcome": "sent" }));
    let sent = sender.sent_emails();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to.as_str(), "alex@example.com");
    assert_eq!(sent[0].subject, "Sam sent you a message");
    assert_eq!(
        sent[0].text_body,
        "Hi Alex, see https://portal.example.com/messages/T1"
    );
    let record = app
        .notifications
        .find(&NotificationId::new("N1").unwrap())
        .unwrap();
    assert_eq!(record.status(), DeliveryStatus::Sent);
}

#[tokio::test]
async fn test_データなしのイベントはスキップして200を返す() {
    let (app, sender) = default_app();

    let (status, body) = send(
        app.router,
        trigger_request(json!({ "documentId": "N1" }).to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "documentId": "N1", "outcome": "skipped", "reason": "missingPayload" })
    );
    assert!(sender.sent_emails().is_empty());
}

#[tokio::test]
async fn test_受信者が存在しなければfailedを書き戻して200を返す() {
    let (app, sender) = default_app();
    let data = json!({ "type": "newMessage", "recipientId": "U-missing" });
    store(&app.notifications, "N1", &data);

    let (status, body) = send(
        app.router,
        trigger_request(json!({ "documentId": "N1", "data": data }).to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "failed");
    assert_eq!(body["reason"], "recipient not found: U-missing");
    assert!(sender.sent_emails().is_empty());
}

#[tokio::test]
async fn test_不正なペイロードは400を返す() {
    let (app, sender) = default_app();

    let (status, body) = send(
        app.router,
        trigger_request(
            json!({ "documentId": "N1", "data": { "type": "newMessage" } }).to_string(),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert!(sender.sent_emails().is_empty());
}

#[tokio::test]
async fn test_jsonとして解釈できないボディは400を返す() {
    let (app, _) = default_app();

    let (status, body) = send(app.router, trigger_request("{not json".to_string())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn test_ステータスの書き戻しに失敗したら503を返す() {
    let sender = MockNotificationSender::new();
    let notifications = MockNotificationRepository::failing_updates();
    let app = create_test_app(
        Arc::new(sender.clone()),
        notifications,
        Duration::from_secs(60),
    );
    let data = new_message_snapshot();
    store(&app.notifications, "N1", &data);

    let (status, body) = send(
        app.router,
        trigger_request(json!({ "documentId": "N1", "data": data }).to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], 503);
    assert_eq!(sender.sent_emails().len(), 1);
}

#[tokio::test]
async fn test_制限時間を超えたら504を返しレコードはpendingのまま() {
    let app = create_test_app(
        Arc::new(SlowNotificationSender),
        MockNotificationRepository::new(),
        Duration::from_millis(50),
    );
    let data = new_message_snapshot();
    store(&app.notifications, "N1", &data);
    let notifications = app.notifications.clone();

    let (status, body) = send(
        app.router,
        trigger_request(json!({ "documentId": "N1", "data": data }).to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["status"], 504);
    let record = notifications
        .find(&NotificationId::new("N1").unwrap())
        .unwrap();
    assert_eq!(record.status(), DeliveryStatus::Pending);
    assert!(notifications.status_updates().is_empty());
}

#[tokio::test]
async fn test_ヘルスチェックは200を返す() {
    let (app, _) = default_app();

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app.router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}
