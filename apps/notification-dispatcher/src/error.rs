//! # 通知ディスパッチャーのエラー定義
//!
//! HTTP 境界で発生するエラーと、RFC 9457 形式のレスポンスへの変換を定義する。
//!
//! | エラー | HTTP ステータス | 作成イベントの送信元の扱い |
//! |-------|----------------|------------------------|
//! | `BadRequest` / `InvalidPayload` | 400 | 再送しない |
//! | `Writeback` | 503 | 再送してよい |
//! | `Timeout` | 504 | 任意（レコードは元の状態のまま） |
//! | `Internal` | 500 | 通知レコードの作成（プロデューサー API）に失敗 |

use std::time::Duration;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rosterly_infra::InfraError;
use rosterly_shared::ErrorResponse;
use thiserror::Error;

use crate::usecase::DispatchError;

/// 通知ディスパッチャーで発生するエラー
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// リクエストボディを解釈できない
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),

    /// 作成イベントのスナップショットが不正
    #[error("不正なトリガーペイロード: {0}")]
    InvalidPayload(String),

    /// 配信ステータスの書き戻しに失敗
    #[error("配信ステータスの書き戻しに失敗: {0}")]
    Writeback(String),

    /// ディスパッチが制限時間内に終わらなかった
    #[error("ディスパッチがタイムアウトしました（{}秒）: {document_id}", .timeout.as_secs())]
    Timeout {
        document_id: String,
        timeout:     Duration,
    },

    /// 内部エラー（詳細はログにのみ出力する）
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl From<DispatchError> for DispatcherError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::InvalidPayload(e) => Self::InvalidPayload(e.to_string()),
            DispatchError::Writeback(e) => Self::Writeback(e.to_string()),
        }
    }
}

impl From<InfraError> for DispatcherError {
    fn from(err: InfraError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl IntoResponse for DispatcherError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            DispatcherError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorResponse::bad_request(msg))
            }
            DispatcherError::InvalidPayload(msg) => {
                tracing::warn!("不正なトリガーペイロード: {}", msg);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::validation_error(msg),
                )
            }
            DispatcherError::Writeback(msg) => {
                tracing::error!("配信ステータスの書き戻しに失敗: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorResponse::service_unavailable("配信ステータスを記録できませんでした"),
                )
            }
            DispatcherError::Timeout { .. } => {
                tracing::error!("{}", self);
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    ErrorResponse::timeout(self.to_string()),
                )
            }
            DispatcherError::Internal(msg) => {
                tracing::error!("内部エラー: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::internal_error(),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
