//! # 通知作成イベント
//!
//! ドキュメントストアが `notifications` コレクションへの挿入ごとに配信する
//! 作成イベント。配信は at-least-once で、順序は保証されない。
//!
//! イベントのスナップショットは信頼せず、[`TriggerEvent::into_payload`] で
//! 型付きの [`NotificationRecord`] か「ペイロードなし」のいずれかに変換する。

use serde::Deserialize;
use serde_json::Value;

use crate::{
    DomainError,
    notification::{NotificationId, NotificationRecord},
};

/// 作成イベント（トリガー入力）
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerEvent {
    /// 作成されたドキュメントの ID
    pub document_id: String,
    /// 作成時点のフィールドスナップショット
    #[serde(default)]
    pub data:        Option<Value>,
}

/// 検証済みのトリガーペイロード
#[derive(Debug)]
pub enum TriggerPayload {
    /// イベントにデータが含まれていない（削除との競合など）。処理不要
    Missing {
        document_id: String,
    },
    /// 検証済みの通知レコード
    Record(NotificationRecord),
}

impl TriggerEvent {
    /// スナップショットを検証してペイロードに変換する
    ///
    /// `data` が存在しない、または `null` の場合は [`TriggerPayload::Missing`]。
    pub fn into_payload(self) -> Result<TriggerPayload, DomainError> {
        let data = match self.data {
            None | Some(Value::Null) => {
                return Ok(TriggerPayload::Missing {
                    document_id: self.document_id,
                });
            }
            Some(data) => data,
        };

        let id = NotificationId::new(self.document_id)?;
        NotificationRecord::from_snapshot(id, &data).map(TriggerPayload::Record)
    }
}
