//! # EmailTemplateRepository
//!
//! 通知種別ごとのメールテンプレートを読み取るリポジトリ。
//! テンプレートは管理画面で編集され、ディスパッチャーからは読み取り専用。
//!
//! `email_templates` テーブル（PK = `id`、値は通知種別）に
//! `subject` / `body` を保持する。

use async_trait::async_trait;
use aws_sdk_dynamodb::{Client, types::AttributeValue};
use rosterly_domain::notification::{EmailTemplate, NotificationType};

use crate::{InfraError, dynamodb::get_s};

/// メールテンプレートリポジトリトレイト
#[async_trait]
pub trait EmailTemplateRepository: Send + Sync {
    /// 通知種別に対応するテンプレートを取得する
    async fn find_by_type(
        &self,
        notification_type: &NotificationType,
    ) -> Result<Option<EmailTemplate>, InfraError>;
}

/// DynamoDB 実装の EmailTemplateRepository
pub struct DynamoDbEmailTemplateRepository {
    client:     Client,
    table_name: String,
}

impl DynamoDbEmailTemplateRepository {
    pub fn new(client: Client, table_name: String) -> Self {
        Self { client, table_name }
    }
}

#[async_trait]
impl EmailTemplateRepository for DynamoDbEmailTemplateRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(%notification_type))]
    async fn find_by_type(
        &self,
        notification_type: &NotificationType,
    ) -> Result<Option<EmailTemplate>, InfraError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(notification_type.to_string()))
            .send()
            .await
            .map_err(|e| {
                InfraError::dynamo_db(format!("メールテンプレートの取得に失敗: {e}"))
            })?;

        let Some(item) = output.item else {
            return Ok(None);
        };

        let subject = get_s(&item, "subject").ok_or_else(|| {
            InfraError::invalid_data(format!(
                "メールテンプレート {notification_type} に subject がありません"
            ))
        })?;
        let body = get_s(&item, "body").ok_or_else(|| {
            InfraError::invalid_data(format!(
                "メールテンプレート {notification_type} に body がありません"
            ))
        })?;

        Ok(Some(EmailTemplate::new(
            notification_type.clone(),
            subject,
            body,
        )))
    }
}
