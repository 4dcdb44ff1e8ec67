//! # 通知レコード
//!
//! ドキュメントストアの `notifications` コレクションに保存される通知レコード。
//!
//! スナップショット（緩い型の JSON）は [`NotificationRecord::from_snapshot`] で検証し、
//! 型付きのレコードに変換してから扱う。書き込み時は
//! [`NotificationRecord::to_document`] で同じ形式の JSON に戻す。

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{DeliveryStatus, NotificationId, NotificationType, StatusUpdate};
use crate::{DomainError, user::UserId};

/// `contextData` 内で送信者を表すキー
const SENDER_ID_KEY: &str = "senderId";

/// 通知の文脈データ
///
/// 自由形式のマップだが、解釈するキーは `senderId` のみ。
/// その他のキーは保存値を保つためにそのまま保持する。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextData {
    sender_id: Option<UserId>,
    extra:     Map<String, Value>,
}

impl ContextData {
    /// 送信者付きの文脈データを作成する
    pub fn with_sender(sender_id: UserId) -> Self {
        Self {
            sender_id: Some(sender_id),
            extra:     Map::new(),
        }
    }

    pub fn sender_id(&self) -> Option<&UserId> {
        self.sender_id.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.sender_id.is_none() && self.extra.is_empty()
    }

    fn from_map(mut map: Map<String, Value>) -> Result<Self, DomainError> {
        let sender_id = match map.remove(SENDER_ID_KEY) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(Value::String(s)) => Some(UserId::new(s)?),
            Some(other) => {
                return Err(DomainError::Validation(format!(
                    "contextData.senderId は文字列である必要があります: {other}"
                )));
            }
        };
        Ok(Self {
            sender_id,
            extra: map,
        })
    }

    fn to_map(&self) -> Map<String, Value> {
        let mut map = self.extra.clone();
        if let Some(sender_id) = &self.sender_id {
            map.insert(
                SENDER_ID_KEY.to_string(),
                Value::String(sender_id.to_string()),
            );
        }
        map
    }
}

/// 通知レコード
///
/// ステータス関連（`status` / `error` / `sentAt`）以外は作成後に変更されない。
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationRecord {
    id:                NotificationId,
    notification_type: NotificationType,
    recipient_id:      UserId,
    link:              Option<String>,
    context_data:      ContextData,
    created_at:        Option<DateTime<Utc>>,
    status:            DeliveryStatus,
    error:             Option<String>,
    sent_at:           Option<DateTime<Utc>>,
}

/// 新規通知レコードのパラメータ
pub struct NewNotificationRecord {
    pub id:                NotificationId,
    pub notification_type: NotificationType,
    pub recipient_id:      UserId,
    pub link:              Option<String>,
    pub context_data:      ContextData,
    pub created_at:        DateTime<Utc>,
}

/// 保存されている時刻の表現
///
/// RFC 3339 文字列とエポックミリ秒の両方を受け付ける。
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredTimestamp {
    Text(DateTime<Utc>),
    EpochMillis(i64),
}

impl StoredTimestamp {
    fn into_datetime(self, field: &str) -> Result<DateTime<Utc>, DomainError> {
        match self {
            Self::Text(dt) => Ok(dt),
            Self::EpochMillis(ms) => DateTime::from_timestamp_millis(ms).ok_or_else(|| {
                DomainError::Validation(format!("{field} が範囲外の時刻です: {ms}"))
            }),
        }
    }
}

/// スナップショットの生の形
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NotificationDocument {
    #[serde(rename = "type")]
    notification_type: Option<String>,
    recipient_id:      Option<String>,
    link:              Option<String>,
    context_data:      Option<Map<String, Value>>,
    created_at:        Option<StoredTimestamp>,
    status:            Option<String>,
    error:             Option<String>,
    sent_at:           Option<StoredTimestamp>,
}

impl NotificationRecord {
    /// 新しい通知レコードを作成する（ステータスは `Pending`）
    pub fn new(params: NewNotificationRecord) -> Self {
        Self {
            id:                params.id,
            notification_type: params.notification_type,
            recipient_id:      params.recipient_id,
            link:              params.link,
            context_data:      params.context_data,
            created_at:        Some(params.created_at),
            status:            DeliveryStatus::Pending,
            error:             None,
            sent_at:           None,
        }
    }

    /// ドキュメントのスナップショットを検証して通知レコードに変換する
    ///
    /// # エラー
    ///
    /// - スナップショットがオブジェクトでない、または属性の型が不正
    /// - `recipientId` / `type` が存在しない、または空
    pub fn from_snapshot(id: NotificationId, snapshot: &Value) -> Result<Self, DomainError> {
        let document: NotificationDocument = serde_json::from_value(snapshot.clone())
            .map_err(|e| DomainError::Validation(format!("通知ドキュメントの形式が不正です: {e}")))?;

        let notification_type = NotificationType::new(document.notification_type.unwrap_or_default())?;
        let recipient_id = UserId::new(document.recipient_id.unwrap_or_default())
            .map_err(|_| DomainError::Validation("recipientId は必須です".to_string()))?;
        let context_data = match document.context_data {
            Some(map) => ContextData::from_map(map)?,
            None => ContextData::default(),
        };
        let created_at = document
            .created_at
            .map(|t| t.into_datetime("createdAt"))
            .transpose()?;
        let sent_at = document
            .sent_at
            .map(|t| t.into_datetime("sentAt"))
            .transpose()?;

        Ok(Self {
            id,
            notification_type,
            recipient_id,
            link: document.link.filter(|l| !l.is_empty()),
            context_data,
            created_at,
            status: DeliveryStatus::from_stored(document.status.as_deref())?,
            error: document.error,
            sent_at,
        })
    }

    /// ドキュメントストアに保存する形式（camelCase の JSON）に変換する
    ///
    /// `Pending` の場合は `status` 属性を出力しない。
    pub fn to_document(&self) -> Value {
        let mut doc = Map::new();
        doc.insert(
            "type".to_string(),
            Value::String(self.notification_type.to_string()),
        );
        doc.insert(
            "recipientId".to_string(),
            Value::String(self.recipient_id.to_string()),
        );
        if let Some(link) = &self.link {
            doc.insert("link".to_string(), Value::String(link.clone()));
        }
        if !self.context_data.is_empty() {
            doc.insert(
                "contextData".to_string(),
                Value::Object(self.context_data.to_map()),
            );
        }
        if let Some(created_at) = self.created_at {
            doc.insert("createdAt".to_string(), Value::String(rfc3339(created_at)));
        }
        if self.status.is_terminal() {
            doc.insert("status".to_string(), Value::String(self.status.to_string()));
        }
        if let Some(error) = &self.error {
            doc.insert("error".to_string(), Value::String(error.clone()));
        }
        if let Some(sent_at) = self.sent_at {
            doc.insert("sentAt".to_string(), Value::String(rfc3339(sent_at)));
        }
        Value::Object(doc)
    }

    /// ステータス更新を適用する
    ///
    /// `error` は `Failed` のときだけ、`sentAt` は `Sent` のときだけ保持する。
    pub fn apply_status(&mut self, update: &StatusUpdate) {
        self.status = update.status();
        match update {
            StatusUpdate::Sent { sent_at } => {
                self.sent_at = Some(*sent_at);
                self.error = None;
            }
            StatusUpdate::Failed { error } => {
                self.error = Some(error.clone());
                self.sent_at = None;
            }
        }
    }

    pub fn id(&self) -> &NotificationId {
        &self.id
    }

    pub fn notification_type(&self) -> &NotificationType {
        &self.notification_type
    }

    pub fn recipient_id(&self) -> &UserId {
        &self.recipient_id
    }

    pub fn link(&self) -> Option<&str> {
        self.link.as_deref()
    }

    pub fn context_data(&self) -> &ContextData {
        &self.context_data
    }

    pub fn sender_id(&self) -> Option<&UserId> {
        self.context_data.sender_id()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn status(&self) -> DeliveryStatus {
        self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        self.sent_at
    }
}

fn rfc3339(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}
