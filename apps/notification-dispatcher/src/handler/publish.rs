//! # 通知作成ハンドラ（プロデューサー API）
//!
//! ポータルの各機能で発生したイベントを受け取り、通知レコードを作成する。
//! メール送信は行わず、作成イベント経由でディスパッチャーに任せる。
//!
//! ## エンドポイント
//!
//! ```text
//! POST /internal/notifications/new-message
//! POST /internal/notifications/schedule-uploaded
//! POST /internal/notifications/new-user-pending-approval
//! POST /internal/notifications/account-approved
//! POST /internal/notifications/time-off-reviewed
//! POST /internal/notifications/announcement-posted
//! ```
//!
//! ## レスポンス例
//!
//! ```json
//! { "notificationIds": ["0194b7d2-..."] }
//! ```

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use rosterly_domain::{notification::NotificationId, user::UserId};
use serde::{Deserialize, Serialize};

use crate::{error::DispatcherError, usecase::NotificationPublisher};

/// プロデューサー API の State
pub struct PublishState {
    pub publisher: NotificationPublisher,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessageRequest {
    pub recipient_id: UserId,
    pub sender_id:    UserId,
    pub thread_id:    String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleUploadedRequest {
    pub recipient_id: UserId,
    pub uploaded_by:  UserId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserPendingApprovalRequest {
    pub new_user_id: UserId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountApprovedRequest {
    pub user_id:     UserId,
    pub approved_by: UserId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeOffReviewedRequest {
    pub recipient_id: UserId,
    pub reviewer_id:  UserId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementPostedRequest {
    pub author_id: UserId,
}

/// 作成した通知レコードの ID 一覧
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResponse {
    pub notification_ids: Vec<String>,
}

impl PublishResponse {
    fn created(ids: Vec<NotificationId>) -> (StatusCode, Json<Self>) {
        let notification_ids = ids.iter().map(|id| id.as_str().to_string()).collect();
        (StatusCode::CREATED, Json(Self { notification_ids }))
    }
}

type PublishResult = Result<(StatusCode, Json<PublishResponse>), DispatcherError>;

fn parse<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, DispatcherError> {
    payload
        .map(|Json(req)| req)
        .map_err(|e| DispatcherError::BadRequest(e.body_text()))
}

/// ダイレクトメッセージの受信を通知する
///
/// `POST /internal/notifications/new-message`
pub async fn publish_new_message(
    State(state): State<Arc<PublishState>>,
    payload: Result<Json<NewMessageRequest>, JsonRejection>,
) -> PublishResult {
    let req = parse(payload)?;
    if req.thread_id.trim().is_empty() {
        return Err(DispatcherError::BadRequest(
            "threadId は必須です".to_string(),
        ));
    }

    let id = state
        .publisher
        .new_message(&req.recipient_id, &req.sender_id, req.thread_id.trim())
        .await?;
    Ok(PublishResponse::created(vec![id]))
}

/// シフト表のアップロードを通知する
///
/// `POST /internal/notifications/schedule-uploaded`
pub async fn publish_schedule_uploaded(
    State(state): State<Arc<PublishState>>,
    payload: Result<Json<ScheduleUploadedRequest>, JsonRejection>,
) -> PublishResult {
    let req = parse(payload)?;
    let id = state
        .publisher
        .schedule_uploaded(&req.recipient_id, &req.uploaded_by)
        .await?;
    Ok(PublishResponse::created(vec![id]))
}

/// 新規ユーザーの承認待ちをマネージャー全員に通知する
///
/// `POST /internal/notifications/new-user-pending-approval`
pub async fn publish_new_user_pending_approval(
    State(state): State<Arc<PublishState>>,
    payload: Result<Json<NewUserPendingApprovalRequest>, JsonRejection>,
) -> PublishResult {
    let req = parse(payload)?;
    let ids = state
        .publisher
        .new_user_pending_approval(&req.new_user_id)
        .await?;
    Ok(PublishResponse::created(ids))
}

/// アカウントの承認を本人に通知する
///
/// `POST /internal/notifications/account-approved`
pub async fn publish_account_approved(
    State(state): State<Arc<PublishState>>,
    payload: Result<Json<AccountApprovedRequest>, JsonRejection>,
) -> PublishResult {
    let req = parse(payload)?;
    let id = state
        .publisher
        .account_approved(&req.user_id, &req.approved_by)
        .await?;
    Ok(PublishResponse::created(vec![id]))
}

/// 休暇申請の審査完了を通知する
///
/// `POST /internal/notifications/time-off-reviewed`
pub async fn publish_time_off_reviewed(
    State(state): State<Arc<PublishState>>,
    payload: Result<Json<TimeOffReviewedRequest>, JsonRejection>,
) -> PublishResult {
    let req = parse(payload)?;
    let id = state
        .publisher
        .time_off_reviewed(&req.recipient_id, &req.reviewer_id)
        .await?;
    Ok(PublishResponse::created(vec![id]))
}

/// お知らせの掲載を投稿者以外の全員に通知する
///
/// `POST /internal/notifications/announcement-posted`
pub async fn publish_announcement_posted(
    State(state): State<Arc<PublishState>>,
    payload: Result<Json<AnnouncementPostedRequest>, JsonRejection>,
) -> PublishResult {
    let req = parse(payload)?;
    let ids = state.publisher.announcement_posted(&req.author_id).await?;
    Ok(PublishResponse::created(ids))
}
