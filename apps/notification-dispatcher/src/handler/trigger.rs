//! # 通知作成トリガーハンドラ
//!
//! ドキュメントストアの作成イベントを HTTP push で受け取り、ディスパッチする。
//!
//! ## エンドポイント
//!
//! ```text
//! POST /internal/triggers/notifications
//! ```
//!
//! ## リクエスト例
//!
//! ```json
//! {
//!   "documentId": "N1",
//!   "data": { "type": "newMessage", "recipientId": "U1", "link": "/messages/T1" }
//! }
//! ```
//!
//! ## レスポンス例
//!
//! ```json
//! { "documentId": "N1", "outcome": "sent" }
//! ```
//!
//! 1 回の呼び出しには制限時間があり、超過すると処理を打ち切って 504 を返す。
//! 打ち切られたレコードはそれまでの状態のまま残る。

use std::{sync::Arc, time::Duration};

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use rosterly_domain::trigger::TriggerEvent;
use serde::Serialize;

use crate::{
    error::DispatcherError,
    usecase::{DispatchOutcome, NotificationDispatcher},
};

/// トリガーハンドラの State
pub struct TriggerState {
    pub dispatcher: NotificationDispatcher,
    /// 1 回のディスパッチに許す時間
    pub timeout:    Duration,
}

/// トリガーレスポンス
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerResponse {
    pub document_id: String,
    #[serde(flatten)]
    pub outcome:     DispatchOutcome,
}

/// 通知レコードの作成イベントを処理する
///
/// `POST /internal/triggers/notifications`
pub async fn handle_notification_created(
    State(state): State<Arc<TriggerState>>,
    payload: Result<Json<TriggerEvent>, JsonRejection>,
) -> Result<Json<TriggerResponse>, DispatcherError> {
    let Json(event) = payload.map_err(|e| DispatcherError::BadRequest(e.body_text()))?;
    let document_id = event.document_id.clone();

    let outcome = tokio::time::timeout(state.timeout, state.dispatcher.dispatch(event))
        .await
        .map_err(|_| DispatcherError::Timeout {
            document_id: document_id.clone(),
            timeout:     state.timeout,
        })??;

    Ok(Json(TriggerResponse {
        document_id,
        outcome,
    }))
}
