//! # 通知ディスパッチャー
//!
//! 通知レコードの作成イベントを受け取り、メールを送信して
//! 配信ステータスを書き戻す。
//!
//! ## 設計方針
//!
//! - **終端ステータスを残す**: レコードが存在する限り、どの経路でも
//!   `sent` か `failed` を書き戻す（受信者やテンプレートが無い場合も `failed`）
//! - **受信者と送信者は並行取得**: 両方の取得を待ってから次に進む
//! - **リトライしない**: 再配信されたイベントは再送し、ステータスを絶対値で上書きする
//! - **依存性注入**: 送信・リポジトリ・時刻はすべて trait で受け取り、
//!   プロセス全体で共有される可変状態を持たない
//!
//! ## 処理の流れ
//!
//! ```text
//! TriggerEvent ─ 検証 ─┬─ データなし / 終端済み ──────────────→ Skipped
//!                      └─ 受信者・送信者取得 → テンプレート取得
//!                           → レンダリング → 送信 ─┬─ 成功 → sent 書き戻し
//!                                                  └─ 失敗 → failed 書き戻し
//! ```

use std::sync::Arc;

use rosterly_domain::{
    DomainError,
    clock::Clock,
    notification::{EmailMessage, EmailTemplate, MailSender, NotificationRecord, StatusUpdate},
    trigger::{TriggerEvent, TriggerPayload},
    user::UserProfile,
};
use rosterly_infra::{
    InfraError,
    notification::NotificationSender,
    repository::{EmailTemplateRepository, NotificationRepository, UserDirectory},
};
use rosterly_shared::{
    event_log::{error, event},
    log_business_event,
};
use serde::Serialize;
use thiserror::Error;

use super::TemplateRenderer;

/// デプロイごとに固定のディスパッチ設定
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    /// ポータルのベース URL（`{messages_link}` の生成に使用）
    pub base_url: String,
    /// 送信元（表示名 + アドレス）
    pub from:     MailSender,
}

/// ディスパッチしなかった理由
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    /// イベントにデータが含まれていない
    MissingPayload,
    /// スナップショットが既に終端ステータスを持っている
    AlreadyTerminal,
}

/// ディスパッチ結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum DispatchOutcome {
    /// 何もしなかった
    Skipped { reason: SkipReason },
    /// 送信し、`sent` を書き戻した
    Sent,
    /// 送信せず（または送信に失敗し）、`failed` を書き戻した
    Failed { reason: String },
}

/// ディスパッチエラー
///
/// どちらもレコードに終端ステータスが残っていない状態を表す。
#[derive(Debug, Error)]
pub enum DispatchError {
    /// 作成イベントのスナップショットが不正
    #[error("不正なトリガーペイロード: {0}")]
    InvalidPayload(#[from] DomainError),

    /// 配信ステータスの書き戻しに失敗
    #[error("配信ステータスの書き戻しに失敗: {0}")]
    Writeback(#[source] InfraError),
}

/// 配信失敗の内容（`failed` として書き戻す）
#[derive(Debug)]
struct DeliveryFailure {
    category: &'static str,
    kind:     &'static str,
    message:  String,
}

impl DeliveryFailure {
    fn database(err: InfraError) -> Self {
        Self {
            category: error::category::INFRASTRUCTURE,
            kind:     error::kind::DATABASE,
            message:  err.to_string(),
        }
    }

    fn data_integrity(kind: &'static str, message: String) -> Self {
        Self {
            category: error::category::DATA_INTEGRITY,
            kind,
            message,
        }
    }

    fn mail_transport(message: String) -> Self {
        Self {
            category: error::category::EXTERNAL_SERVICE,
            kind:     error::kind::MAIL_TRANSPORT,
            message,
        }
    }
}

/// 通知ディスパッチャー
///
/// 依存はすべて起動時に 1 度だけ構築され、読み取り専用で共有される。
pub struct NotificationDispatcher {
    sender:        Arc<dyn NotificationSender>,
    notifications: Arc<dyn NotificationRepository>,
    users:         Arc<dyn UserDirectory>,
    templates:     Arc<dyn EmailTemplateRepository>,
    clock:         Arc<dyn Clock>,
    renderer:      TemplateRenderer,
    from:          MailSender,
}

impl NotificationDispatcher {
    pub fn new(
        sender: Arc<dyn NotificationSender>,
        notifications: Arc<dyn NotificationRepository>,
        users: Arc<dyn UserDirectory>,
        templates: Arc<dyn EmailTemplateRepository>,
        clock: Arc<dyn Clock>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            sender,
            notifications,
            users,
            templates,
            clock,
            renderer: TemplateRenderer::new(settings.base_url),
            from: settings.from,
        }
    }

    /// 作成イベントを 1 件処理する
    ///
    /// # エラー
    ///
    /// - スナップショットが不正な場合は [`DispatchError::InvalidPayload`]
    /// - ステータスの書き戻しに失敗した場合は [`DispatchError::Writeback`]
    #[tracing::instrument(skip_all, fields(document_id = %event.document_id))]
    pub async fn dispatch(&self, event: TriggerEvent) -> Result<DispatchOutcome, DispatchError> {
        let record = match event.into_payload()? {
            TriggerPayload::Missing { document_id } => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_SKIPPED,
                    event.entity_type = event::entity_type::NOTIFICATION,
                    event.entity_id = %document_id,
                    event.result = event::result::SKIPPED,
                    "作成イベントにデータがないためスキップ"
                );
                return Ok(DispatchOutcome::Skipped {
                    reason: SkipReason::MissingPayload,
                });
            }
            TriggerPayload::Record(record) => record,
        };

        if record.status().is_terminal() {
            log_business_event!(
                event.category = event::category::NOTIFICATION,
                event.action = event::action::NOTIFICATION_SKIPPED,
                event.entity_type = event::entity_type::NOTIFICATION,
                event.entity_id = %record.id(),
                event.result = event::result::SKIPPED,
                notification.status = %record.status(),
                "終端ステータスのレコードのためスキップ"
            );
            return Ok(DispatchOutcome::Skipped {
                reason: SkipReason::AlreadyTerminal,
            });
        }

        match self.deliver(&record).await {
            Ok(()) => {
                let sent_at = self.clock.now();
                self.write_status(&record, StatusUpdate::Sent { sent_at })
                    .await?;
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_SENT,
                    event.entity_type = event::entity_type::NOTIFICATION,
                    event.entity_id = %record.id(),
                    event.result = event::result::SUCCESS,
                    notification.notification_type = %record.notification_type(),
                    notification.recipient = %record.recipient_id(),
                    "通知メール送信成功"
                );
                Ok(DispatchOutcome::Sent)
            }
            Err(failure) => {
                self.write_status(
                    &record,
                    StatusUpdate::Failed {
                        error: failure.message.clone(),
                    },
                )
                .await?;
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_FAILED,
                    event.entity_type = event::entity_type::NOTIFICATION,
                    event.entity_id = %record.id(),
                    event.result = event::result::FAILURE,
                    notification.notification_type = %record.notification_type(),
                    notification.recipient = %record.recipient_id(),
                    error.category = failure.category,
                    error.kind = failure.kind,
                    error = %failure.message,
                    "通知メール送信失敗"
                );
                Ok(DispatchOutcome::Failed {
                    reason: failure.message,
                })
            }
        }
    }

    /// 受信者解決からメール送信までを行う
    async fn deliver(&self, record: &NotificationRecord) -> Result<(), DeliveryFailure> {
        let sender_lookup = async {
            match record.sender_id() {
                Some(sender_id) => self.users.find_by_id(sender_id).await,
                None => Ok(None),
            }
        };
        let (recipient, sender) = tokio::join!(
            self.users.find_by_id(record.recipient_id()),
            sender_lookup
        );

        let recipient = recipient.map_err(DeliveryFailure::database)?.ok_or_else(|| {
            DeliveryFailure::data_integrity(
                error::kind::RECIPIENT_NOT_FOUND,
                format!("recipient not found: {}", record.recipient_id()),
            )
        })?;
        let sender = sender.map_err(DeliveryFailure::database)?;
        if let (None, Some(sender_id)) = (&sender, record.sender_id()) {
            tracing::debug!(%sender_id, "送信者が見つからないため既定の名前を使用");
        }

        let template = self
            .templates
            .find_by_type(record.notification_type())
            .await
            .map_err(DeliveryFailure::database)?
            .ok_or_else(|| {
                DeliveryFailure::data_integrity(
                    error::kind::TEMPLATE_NOT_FOUND,
                    format!("email template not found: {}", record.notification_type()),
                )
            })?;

        let message = self.compose(record, &template, &recipient, sender.as_ref())?;

        self.sender
            .send_email(&message)
            .await
            .map_err(|e| DeliveryFailure::mail_transport(e.to_string()))
    }

    fn compose(
        &self,
        record: &NotificationRecord,
        template: &EmailTemplate,
        recipient: &UserProfile,
        sender: Option<&UserProfile>,
    ) -> Result<EmailMessage, DeliveryFailure> {
        let to = recipient.deliverable_email().map_err(|e| {
            DeliveryFailure::data_integrity(error::kind::INVALID_RECIPIENT_ADDRESS, e.to_string())
        })?;
        let rendered = self
            .renderer
            .render(template, recipient, sender, record.link());

        Ok(EmailMessage {
            from: self.from.clone(),
            to,
            subject: rendered.subject,
            text_body: rendered.body,
        })
    }

    /// ステータスを書き戻す
    ///
    /// レコードが削除済み（NotFound）の場合は書き戻しを諦めて成功扱いにする。
    async fn write_status(
        &self,
        record: &NotificationRecord,
        update: StatusUpdate,
    ) -> Result<(), DispatchError> {
        match self.notifications.update_status(record.id(), &update).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                tracing::warn!(
                    notification_id = %record.id(),
                    status = %update.status(),
                    "通知レコードが削除済みのためステータスを書き戻せません"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    error.category = error::category::INFRASTRUCTURE,
                    error.kind = error::kind::STATUS_WRITEBACK,
                    notification_id = %record.id(),
                    status = %update.status(),
                    "配信ステータスの書き戻しに失敗: {}",
                    e
                );
                Err(DispatchError::Writeback(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use rosterly_domain::{
        clock::FixedClock,
        notification::{DeliveryStatus, NotificationId, NotificationKind},
        user::{Email, UserId, UserRole},
    };
    use rosterly_infra::mock::{
        MockEmailTemplateRepository,
        MockNotificationRepository,
        MockNotificationSender,
        MockUserDirectory,
    };
    use serde_json::{Value, json};

    use super::*;

    const BASE_URL: &str = "https://portal.example.com";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 5).unwrap()
    }

    /// テスト用の依存一式
    struct Fixture {
        sender:        MockNotificationSender,
        notifications: MockNotificationRepository,
        users:         MockUserDirectory,
        templates:     MockEmailTemplateRepository,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with(MockNotificationSender::new(), MockNotificationRepository::new())
        }

        fn with(sender: MockNotificationSender, notifications: MockNotificationRepository) -> Self {
            let fixture = Self {
                sender,
                notifications,
                users: MockUserDirectory::new(),
                templates: MockEmailTemplateRepository::new(),
            };
            fixture.users.add_user(user("U1", Some("a@x.com"), Some("Alex")));
            fixture.users.add_user(user("U2", Some("sam@x.com"), Some("Sam")));
            fixture.templates.add_template(EmailTemplate::new(
                NotificationKind::NewMessage.notification_type(),
                "{sender_first_name} sent you a message",
                "Hi {recipient_first_name}, {sender_first_name} says hi. See: {messages_link}",
            ));
            fixture
        }

        fn dispatcher(&self) -> NotificationDispatcher {
            NotificationDispatcher::new(
                Arc::new(self.sender.clone()),
                Arc::new(self.notifications.clone()),
                Arc::new(self.users.clone()),
                Arc::new(self.templates.clone()),
                Arc::new(FixedClock::new(now())),
                DispatchSettings {
                    base_url: BASE_URL.to_string(),
                    from:     MailSender {
                        display_name: "Rosterly".to_string(),
                        address:      Email::new("noreply@rosterly.example.com").unwrap(),
                    },
                },
            )
        }

        /// スナップショットをレコードとして保存し、作成イベントを返す
        fn store(&self, id: &str, data: Value) -> TriggerEvent {
            let record =
                NotificationRecord::from_snapshot(NotificationId::new(id).unwrap(), &data).unwrap();
            self.notifications.add_record(record);
            TriggerEvent {
                document_id: id.to_string(),
                data:        Some(data),
            }
        }

        fn stored(&self, id: &str) -> NotificationRecord {
            self.notifications
                .find(&NotificationId::new(id).unwrap())
                .unwrap()
        }
    }

    fn user(uid: &str, email: Option<&str>, first_name: Option<&str>) -> UserProfile {
        UserProfile::new(
            UserId::new(uid).unwrap(),
            email.map(str::to_string),
            first_name.map(str::to_string),
            UserRole::Employee,
        )
    }

    fn new_message_snapshot() -> Value {
        json!({
            "type": "newMessage",
            "recipientId": "U1",
            "contextData": { "senderId": "U2" },
            "link": "/messages/T1"
        })
    }

    #[tokio::test]
    async fn test_メッセージ通知を送信してsentを書き戻す() {
        let fixture = Fixture::new();
        let event = fixture.store("N1", new_message_snapshot());

        let outcome = fixture.dispatcher().dispatch(event).await.unwrap();

        assert_eq!(outcome, DispatchOutcome::Sent);
        let sent = fixture.sender.sent_emails();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to.as_str(), "a@x.com");
        assert_eq!(sent[0].subject, "Sam sent you a message");
        assert_eq!(
            sent[0].text_body,
            "Hi Alex, Sam says hi. See: https://portal.example.com/messages/T1"
        );
        assert_eq!(sent[0].from.display_name, "Rosterly");
        assert_eq!(sent[0].from.address.as_str(), "noreply@rosterly.example.com");

        let record = fixture.stored("N1");
        assert_eq!(record.status(), DeliveryStatus::Sent);
        assert_eq!(record.sent_at(), Some(now()));
        assert_eq!(record.error(), None);
    }

    #[tokio::test]
    async fn test_送信者なしではsomeoneで置換され送信される() {
        let fixture = Fixture::new();
        let event = fixture.store(
            "N1",
            json!({ "type": "newMessage", "recipientId": "U1", "link": "/messages/T1" }),
        );

        let outcome = fixture.dispatcher().dispatch(event).await.unwrap();

        assert_eq!(outcome, DispatchOutcome::Sent);
        let sent = fixture.sender.sent_emails();
        assert_eq!(sent[0].subject, "Someone sent you a message");
        assert!(sent[0].text_body.contains("Someone says hi"));
    }

    #[tokio::test]
    async fn test_送信者プロフィールがなくても送信される() {
        let fixture = Fixture::new();
        let event = fixture.store(
            "N1",
            json!({
                "type": "newMessage",
                "recipientId": "U1",
                "contextData": { "senderId": "U-deleted" }
            }),
        );

        let outcome = fixture.dispatcher().dispatch(event).await.unwrap();

        assert_eq!(outcome, DispatchOutcome::Sent);
        assert_eq!(
            fixture.sender.sent_emails()[0].subject,
            "Someone sent you a message"
        );
    }

    #[tokio::test]
    async fn test_受信者の名が3回出現しても全て置換される() {
        let fixture = Fixture::new();
        fixture.templates.add_template(EmailTemplate::new(
            NotificationKind::AccountApproved.notification_type(),
            "Welcome",
            "{recipient_first_name}, {recipient_first_name}, {recipient_first_name}",
        ));
        let event = fixture.store(
            "N1",
            json!({ "type": "accountApproved", "recipientId": "U1", "link": "/dashboard" }),
        );

        fixture.dispatcher().dispatch(event).await.unwrap();

        assert_eq!(fixture.sender.sent_emails()[0].text_body, "Alex, Alex, Alex");
    }

    #[tokio::test]
    async fn test_受信者が存在しなければ送信せずfailedを書き戻す() {
        let fixture = Fixture::new();
        let event = fixture.store(
            "N1",
            json!({ "type": "newMessage", "recipientId": "U-missing" }),
        );

        let outcome = fixture.dispatcher().dispatch(event).await.unwrap();

        assert_eq!(
            outcome,
            DispatchOutcome::Failed {
                reason: "recipient not found: U-missing".to_string(),
            }
        );
        assert!(fixture.sender.sent_emails().is_empty());
        let record = fixture.stored("N1");
        assert_eq!(record.status(), DeliveryStatus::Failed);
        assert_eq!(record.error(), Some("recipient not found: U-missing"));
    }

    #[tokio::test]
    async fn test_テンプレートが存在しなければ送信せずfailedを書き戻す() {
        let fixture = Fixture::new();
        let event = fixture.store(
            "N1",
            json!({ "type": "shiftSwapRequested", "recipientId": "U1" }),
        );

        let outcome = fixture.dispatcher().dispatch(event).await.unwrap();

        assert_eq!(
            outcome,
            DispatchOutcome::Failed {
                reason: "email template not found: shiftSwapRequested".to_string(),
            }
        );
        assert!(fixture.sender.sent_emails().is_empty());
        assert_eq!(fixture.stored("N1").status(), DeliveryStatus::Failed);
    }

    #[tokio::test]
    async fn test_受信者にメールアドレスがなければfailedを書き戻す() {
        let fixture = Fixture::new();
        fixture.users.add_user(user("U3", None, Some("Kim")));
        let event = fixture.store("N1", json!({ "type": "newMessage", "recipientId": "U3" }));

        let outcome = fixture.dispatcher().dispatch(event).await.unwrap();

        assert!(matches!(outcome, DispatchOutcome::Failed { .. }));
        assert!(fixture.sender.sent_emails().is_empty());
        assert_eq!(fixture.stored("N1").status(), DeliveryStatus::Failed);
    }

    #[tokio::test]
    async fn test_送信失敗時はfailedとエラーメッセージを書き戻す() {
        let fixture = Fixture::with(
            MockNotificationSender::failing("550 mailbox unavailable"),
            MockNotificationRepository::new(),
        );
        let event = fixture.store("N1", new_message_snapshot());

        let outcome = fixture.dispatcher().dispatch(event).await.unwrap();

        let DispatchOutcome::Failed { reason } = outcome else {
            panic!("Failed であること: {outcome:?}");
        };
        assert!(reason.contains("550 mailbox unavailable"));
        let record = fixture.stored("N1");
        assert_eq!(record.status(), DeliveryStatus::Failed);
        assert_eq!(record.error(), Some(reason.as_str()));
        assert_eq!(record.sent_at(), None);
    }

    #[tokio::test]
    async fn test_受信者の取得エラーはfailedを書き戻す() {
        let fixture = Fixture::new();
        fixture.users.fail_lookup_for(UserId::new("U1").unwrap());
        let event = fixture.store("N1", new_message_snapshot());

        let outcome = fixture.dispatcher().dispatch(event).await.unwrap();

        assert!(matches!(outcome, DispatchOutcome::Failed { .. }));
        assert!(fixture.sender.sent_emails().is_empty());
        assert_eq!(fixture.stored("N1").status(), DeliveryStatus::Failed);
    }

    #[tokio::test]
    async fn test_テンプレートの取得エラーはfailedを書き戻す() {
        let fixture = Fixture::new();
        let dispatcher = NotificationDispatcher::new(
            Arc::new(fixture.sender.clone()),
            Arc::new(fixture.notifications.clone()),
            Arc::new(fixture.users.clone()),
            Arc::new(MockEmailTemplateRepository::failing()),
            Arc::new(FixedClock::new(now())),
            DispatchSettings {
                base_url: BASE_URL.to_string(),
                from:     MailSender {
                    display_name: "Rosterly".to_string(),
                    address:      Email::new("noreply@rosterly.example.com").unwrap(),
                },
            },
        );
        let event = fixture.store("N1", new_message_snapshot());

        let outcome = dispatcher.dispatch(event).await.unwrap();

        assert!(matches!(outcome, DispatchOutcome::Failed { .. }));
        assert_eq!(fixture.stored("N1").status(), DeliveryStatus::Failed);
    }

    #[tokio::test]
    async fn test_データなしのイベントは何もしない() {
        let fixture = Fixture::new();
        let event = TriggerEvent {
            document_id: "N1".to_string(),
            data:        None,
        };

        let outcome = fixture.dispatcher().dispatch(event).await.unwrap();

        assert_eq!(
            outcome,
            DispatchOutcome::Skipped {
                reason: SkipReason::MissingPayload,
            }
        );
        assert!(fixture.sender.sent_emails().is_empty());
        assert!(fixture.notifications.status_updates().is_empty());
    }

    #[tokio::test]
    async fn test_終端ステータスのスナップショットはスキップする() {
        let fixture = Fixture::new();
        let mut data = new_message_snapshot();
        data["status"] = json!("sent");
        data["sentAt"] = json!("2026-01-15T09:00:00.000Z");
        let event = fixture.store("N1", data);

        let outcome = fixture.dispatcher().dispatch(event).await.unwrap();

        assert_eq!(
            outcome,
            DispatchOutcome::Skipped {
                reason: SkipReason::AlreadyTerminal,
            }
        );
        assert!(fixture.sender.sent_emails().is_empty());
    }

    #[tokio::test]
    async fn test_不正なスナップショットはinvalid_payloadになる() {
        let fixture = Fixture::new();
        let event = TriggerEvent {
            document_id: "N1".to_string(),
            data:        Some(json!({ "type": "newMessage" })),
        };

        let result = fixture.dispatcher().dispatch(event).await;

        assert!(matches!(result, Err(DispatchError::InvalidPayload(_))));
        assert!(fixture.sender.sent_emails().is_empty());
    }

    #[tokio::test]
    async fn test_再配信されたイベントは再送してステータスを上書きする() {
        let fixture = Fixture::new();
        let event = fixture.store("N1", new_message_snapshot());
        let dispatcher = fixture.dispatcher();

        dispatcher.dispatch(event.clone()).await.unwrap();
        dispatcher.dispatch(event).await.unwrap();

        assert_eq!(fixture.sender.sent_emails().len(), 2);
        let updates = fixture.notifications.status_updates();
        assert_eq!(updates.len(), 2);
        assert!(updates.iter().all(|(_, u)| u.status() == DeliveryStatus::Sent));
        assert_eq!(fixture.stored("N1").status(), DeliveryStatus::Sent);
    }

    #[tokio::test]
    async fn test_書き戻しに失敗したらwritebackエラーになる() {
        let fixture = Fixture::with(
            MockNotificationSender::new(),
            MockNotificationRepository::failing_updates(),
        );
        let event = fixture.store("N1", new_message_snapshot());

        let result = fixture.dispatcher().dispatch(event).await;

        assert!(matches!(result, Err(DispatchError::Writeback(_))));
    }

    #[tokio::test]
    async fn test_削除済みレコードへの書き戻しは成功扱いにする() {
        let fixture = Fixture::new();
        // レコードを保存せずにイベントだけを届ける
        let event = TriggerEvent {
            document_id: "N-deleted".to_string(),
            data:        Some(new_message_snapshot()),
        };

        let outcome = fixture.dispatcher().dispatch(event).await.unwrap();

        assert_eq!(outcome, DispatchOutcome::Sent);
        assert!(fixture.notifications.records().is_empty());
    }

    /// 取得のたびに一定時間待つユーザーディレクトリ
    struct SlowUserDirectory {
        inner: MockUserDirectory,
        delay: std::time::Duration,
    }

    #[async_trait::async_trait]
    impl UserDirectory for SlowUserDirectory {
        async fn find_by_id(&self, uid: &UserId) -> Result<Option<UserProfile>, InfraError> {
            tokio::time::sleep(self.delay).await;
            self.inner.find_by_id(uid).await
        }

        async fn find_by_role(&self, role: UserRole) -> Result<Vec<UserProfile>, InfraError> {
            self.inner.find_by_role(role).await
        }

        async fn find_all(&self) -> Result<Vec<UserProfile>, InfraError> {
            self.inner.find_all().await
        }
    }

    #[tokio::test]
    async fn test_受信者と送信者の取得は並行して行われる() {
        let fixture = Fixture::new();
        let event = fixture.store("N1", new_message_snapshot());
        let delay = std::time::Duration::from_millis(300);
        let dispatcher = NotificationDispatcher::new(
            Arc::new(fixture.sender.clone()),
            Arc::new(fixture.notifications.clone()),
            Arc::new(SlowUserDirectory {
                inner: fixture.users.clone(),
                delay,
            }),
            Arc::new(fixture.templates.clone()),
            Arc::new(FixedClock::new(now())),
            DispatchSettings {
                base_url: BASE_URL.to_string(),
                from:     MailSender {
                    display_name: "Rosterly".to_string(),
                    address:      Email::new("noreply@rosterly.example.com").unwrap(),
                },
            },
        );

        let started = std::time::Instant::now();
        let outcome = dispatcher.dispatch(event).await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(outcome, DispatchOutcome::Sent);
        assert_eq!(
            fixture.sender.sent_emails()[0].subject,
            "Sam sent you a message"
        );
        assert!(
            elapsed < delay * 3 / 2,
            "2 件の取得が直列に実行されている: {elapsed:?}"
        );
    }

    #[test]
    fn test_dispatch_outcomeのjson表現() {
        assert_eq!(
            serde_json::to_value(DispatchOutcome::Sent).unwrap(),
            json!({ "outcome": "sent" })
        );
        assert_eq!(
            serde_json::to_value(DispatchOutcome::Skipped {
                reason: SkipReason::MissingPayload,
            })
            .unwrap(),
            json!({ "outcome": "skipped", "reason": "missingPayload" })
        );
        assert_eq!(
            serde_json::to_value(DispatchOutcome::Failed {
                reason: "x".to_string(),
            })
            .unwrap(),
            json!({ "outcome": "failed", "reason": "x" })
        );
    }
}
