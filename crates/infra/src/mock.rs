//! # テスト用モック
//!
//! ユースケーステストで使用するインメモリモック。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! rosterly-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rosterly_domain::{
    notification::{
        EmailMessage,
        EmailTemplate,
        NotificationError,
        NotificationId,
        NotificationRecord,
        NotificationType,
        StatusUpdate,
    },
    user::{UserId, UserProfile, UserRole},
};

use crate::{
    error::InfraError,
    notification::NotificationSender,
    repository::{EmailTemplateRepository, NotificationRepository, UserDirectory},
};

// ===== MockNotificationSender =====

/// 送信したメールを記録するモック
///
/// `failing` で作成した場合は常に `SendFailed` を返し、何も記録しない。
#[derive(Clone, Default)]
pub struct MockNotificationSender {
    sent_emails: Arc<Mutex<Vec<EmailMessage>>>,
    failure:     Option<String>,
}

impl MockNotificationSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            sent_emails: Arc::new(Mutex::new(Vec::new())),
            failure:     Some(message.into()),
        }
    }

    pub fn sent_emails(&self) -> Vec<EmailMessage> {
        self.sent_emails.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSender for MockNotificationSender {
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError> {
        if let Some(message) = &self.failure {
            return Err(NotificationError::SendFailed(message.clone()));
        }
        self.sent_emails.lock().unwrap().push(email.clone());
        Ok(())
    }
}

// ===== MockNotificationRepository =====

#[derive(Clone, Default)]
pub struct MockNotificationRepository {
    records:        Arc<Mutex<Vec<NotificationRecord>>>,
    status_updates: Arc<Mutex<Vec<(NotificationId, StatusUpdate)>>>,
    fail_updates:   bool,
    fail_inserts:   bool,
}

impl MockNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// ステータス書き戻しが常に失敗するモック
    pub fn failing_updates() -> Self {
        Self {
            fail_updates: true,
            ..Self::default()
        }
    }

    /// レコード作成が常に失敗するモック
    pub fn failing_inserts() -> Self {
        Self {
            fail_inserts: true,
            ..Self::default()
        }
    }

    pub fn add_record(&self, record: NotificationRecord) {
        self.records.lock().unwrap().push(record);
    }

    pub fn records(&self) -> Vec<NotificationRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn find(&self, id: &NotificationId) -> Option<NotificationRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id() == id)
            .cloned()
    }

    /// 書き戻されたステータス更新（適用順）
    pub fn status_updates(&self) -> Vec<(NotificationId, StatusUpdate)> {
        self.status_updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationRepository for MockNotificationRepository {
    async fn insert(&self, record: &NotificationRecord) -> Result<(), InfraError> {
        if self.fail_inserts {
            return Err(InfraError::dynamo_db("レコード作成に失敗（モック）"));
        }

        let mut records = self.records.lock().unwrap();
        if records.iter().any(|r| r.id() == record.id()) {
            return Err(InfraError::conflict("Notification", record.id().as_str()));
        }
        records.push(record.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &NotificationId,
    ) -> Result<Option<NotificationRecord>, InfraError> {
        Ok(self.find(id))
    }

    async fn update_status(
        &self,
        id: &NotificationId,
        update: &StatusUpdate,
    ) -> Result<(), InfraError> {
        if self.fail_updates {
            return Err(InfraError::dynamo_db("ステータス更新に失敗（モック）"));
        }

        let mut records = self.records.lock().unwrap();
        let Some(record) = records.iter_mut().find(|r| r.id() == id) else {
            return Err(InfraError::not_found("Notification", id.as_str()));
        };
        record.apply_status(update);
        self.status_updates
            .lock()
            .unwrap()
            .push((id.clone(), update.clone()));
        Ok(())
    }
}

// ===== MockUserDirectory =====

#[derive(Clone, Default)]
pub struct MockUserDirectory {
    users:        Arc<Mutex<Vec<UserProfile>>>,
    failing_uids: Arc<Mutex<Vec<UserId>>>,
}

impl MockUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, user: UserProfile) {
        self.users.lock().unwrap().push(user);
    }

    /// 指定したユーザーの取得をエラーにする
    pub fn fail_lookup_for(&self, uid: UserId) {
        self.failing_uids.lock().unwrap().push(uid);
    }
}

#[async_trait]
impl UserDirectory for MockUserDirectory {
    async fn find_by_id(&self, uid: &UserId) -> Result<Option<UserProfile>, InfraError> {
        if self.failing_uids.lock().unwrap().contains(uid) {
            return Err(InfraError::dynamo_db(format!(
                "ユーザーの取得に失敗（モック）: {uid}"
            )));
        }
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.uid() == uid)
            .cloned())
    }

    async fn find_by_role(&self, role: UserRole) -> Result<Vec<UserProfile>, InfraError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.role() == role)
            .cloned()
            .collect())
    }

    async fn find_all(&self) -> Result<Vec<UserProfile>, InfraError> {
        Ok(self.users.lock().unwrap().clone())
    }
}

// ===== MockEmailTemplateRepository =====

#[derive(Clone, Default)]
pub struct MockEmailTemplateRepository {
    templates:    Arc<Mutex<Vec<EmailTemplate>>>,
    fail_lookups: bool,
}

impl MockEmailTemplateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// テンプレート取得が常に失敗するモック
    pub fn failing() -> Self {
        Self {
            fail_lookups: true,
            ..Self::default()
        }
    }

    pub fn add_template(&self, template: EmailTemplate) {
        self.templates.lock().unwrap().push(template);
    }
}

#[async_trait]
impl EmailTemplateRepository for MockEmailTemplateRepository {
    async fn find_by_type(
        &self,
        notification_type: &NotificationType,
    ) -> Result<Option<EmailTemplate>, InfraError> {
        if self.fail_lookups {
            return Err(InfraError::dynamo_db(
                "メールテンプレートの取得に失敗（モック）",
            ));
        }
        Ok(self
            .templates
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id() == notification_type)
            .cloned())
    }
}
