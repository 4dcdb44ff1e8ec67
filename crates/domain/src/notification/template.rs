//! # メールテンプレート
//!
//! 通知種別ごとの件名・本文テンプレート。`{token_name}` 形式の
//! プレースホルダーを含む。管理画面で編集され、ディスパッチャーからは読み取り専用。

use super::NotificationType;

/// メールテンプレート
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailTemplate {
    id:      NotificationType,
    subject: String,
    body:    String,
}

impl EmailTemplate {
    pub fn new(id: NotificationType, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id,
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// テンプレート ID（対応する通知種別）
    pub fn id(&self) -> &NotificationType {
        &self.id
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}
