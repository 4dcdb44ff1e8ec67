//! # NotificationRepository
//!
//! 通知レコードの永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **DynamoDB**: `notifications` テーブル（PK = `id`）に 1 レコード 1 アイテムで格納
//! - **作成は 1 回だけ**: `attribute_not_exists(id)` 条件で上書きを防ぐ
//! - **部分更新**: ステータス書き戻しは `status` / `error` / `sentAt` だけを変更し、
//!   他の属性には触れない
//! - **幽霊レコードを作らない**: 更新は `attribute_exists(id)` 条件付き。
//!   削除済みのレコードへの書き戻しは NotFound になる
//!
//! `status` と `error` は DynamoDB の予約語なので式属性名で参照する。

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::{Client, types::AttributeValue};
use chrono::SecondsFormat;
use rosterly_domain::notification::{NotificationId, NotificationRecord, StatusUpdate};

use crate::{
    InfraError,
    dynamodb::{item_to_json, json_to_item},
};

/// 通知リポジトリトレイト
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// 新しい通知レコードを作成する
    ///
    /// 同じ ID のレコードが既に存在する場合は Conflict。
    async fn insert(&self, record: &NotificationRecord) -> Result<(), InfraError>;

    /// ID で通知レコードを取得する
    async fn find_by_id(
        &self,
        id: &NotificationId,
    ) -> Result<Option<NotificationRecord>, InfraError>;

    /// ステータスを書き戻す（部分更新）
    ///
    /// レコードが存在しない場合は NotFound。
    async fn update_status(
        &self,
        id: &NotificationId,
        update: &StatusUpdate,
    ) -> Result<(), InfraError>;
}

/// DynamoDB 実装の NotificationRepository
pub struct DynamoDbNotificationRepository {
    client:     Client,
    table_name: String,
}

impl DynamoDbNotificationRepository {
    pub fn new(client: Client, table_name: String) -> Self {
        Self { client, table_name }
    }
}

#[async_trait]
impl NotificationRepository for DynamoDbNotificationRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(id = %record.id()))]
    async fn insert(&self, record: &NotificationRecord) -> Result<(), InfraError> {
        let mut item = json_to_item(&record.to_document())?;
        item.insert(
            "id".to_string(),
            AttributeValue::S(record.id().to_string()),
        );

        let result = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(id)")
            .send()
            .await;

        if let Err(err) = result {
            let is_conflict = err
                .as_service_error()
                .map(|e| e.is_conditional_check_failed_exception())
                .unwrap_or(false);
            if is_conflict {
                return Err(InfraError::conflict("Notification", record.id().as_str()));
            }
            return Err(InfraError::dynamo_db(format!(
                "通知レコードの作成に失敗: {err}"
            )));
        }

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find_by_id(
        &self,
        id: &NotificationId,
    ) -> Result<Option<NotificationRecord>, InfraError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(id.to_string()))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| InfraError::dynamo_db(format!("通知レコードの取得に失敗: {e}")))?;

        let Some(item) = output.item else {
            return Ok(None);
        };

        let snapshot = item_to_json(&item)?;
        let record = NotificationRecord::from_snapshot(id.clone(), &snapshot)?;
        Ok(Some(record))
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id, status = %update.status()))]
    async fn update_status(
        &self,
        id: &NotificationId,
        update: &StatusUpdate,
    ) -> Result<(), InfraError> {
        let mut names = HashMap::new();
        names.insert("#status".to_string(), "status".to_string());

        let mut values = HashMap::new();
        values.insert(
            ":status".to_string(),
            AttributeValue::S(update.status().to_string()),
        );

        let update_expression = match update {
            StatusUpdate::Sent { sent_at } => {
                names.insert("#error".to_string(), "error".to_string());
                values.insert(
                    ":sent_at".to_string(),
                    AttributeValue::S(sent_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
                );
                "SET #status = :status, sentAt = :sent_at REMOVE #error"
            }
            StatusUpdate::Failed { error } => {
                names.insert("#error".to_string(), "error".to_string());
                values.insert(":error".to_string(), AttributeValue::S(error.clone()));
                "SET #status = :status, #error = :error REMOVE sentAt"
            }
        };

        let result = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(id.to_string()))
            .update_expression(update_expression)
            .condition_expression("attribute_exists(id)")
            .set_expression_attribute_names(Some(names))
            .set_expression_attribute_values(Some(values))
            .send()
            .await;

        if let Err(err) = result {
            let is_missing = err
                .as_service_error()
                .map(|e| e.is_conditional_check_failed_exception())
                .unwrap_or(false);
            if is_missing {
                return Err(InfraError::not_found("Notification", id.as_str()));
            }
            return Err(InfraError::dynamo_db(format!(
                "通知ステータスの更新に失敗: {err}"
            )));
        }

        Ok(())
    }
}
