//! # ヘルスチェックハンドラ
//!
//! 通知ディスパッチャーの稼働状態を確認するためのエンドポイント。
//!
//! ## エンドポイント
//!
//! ```text
//! GET /health        # liveness
//! GET /health/ready  # readiness（DynamoDB への接続確認）
//! ```
//!
//! ## レスポンス例
//!
//! ```json
//! {
//!   "status": "healthy",
//!   "version": "0.1.0"
//! }
//! ```

use std::{collections::HashMap, sync::Arc};

use axum::{Json, extract::State, http::StatusCode};
use rosterly_infra::dynamodb;
use rosterly_shared::{CheckStatus, HealthResponse, ReadinessResponse, ReadinessStatus};

/// Readiness チェックの依存
pub struct ReadinessState {
    pub dynamodb: aws_sdk_dynamodb::Client,
}

/// ヘルスチェックエンドポイント
///
/// サーバーが正常に稼働していることを確認するためのエンドポイント。
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status:  "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness チェックエンドポイント
///
/// DynamoDB に接続できない場合は 503 を返す。
pub async fn readiness_check(
    State(state): State<Arc<ReadinessState>>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let dynamodb_status = match dynamodb::check_connection(&state.dynamodb).await {
        Ok(()) => CheckStatus::Ok,
        Err(e) => {
            tracing::warn!(error = %e, "DynamoDB の readiness チェックに失敗");
            CheckStatus::Error
        }
    };

    let response = ReadinessResponse::from_checks(HashMap::from([(
        "dynamodb".to_string(),
        dynamodb_status,
    )]));
    let status = match response.status {
        ReadinessStatus::Ready => StatusCode::OK,
        ReadinessStatus::NotReady => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status, Json(response))
}
