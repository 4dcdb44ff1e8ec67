//! # 通知プロデューサー
//!
//! ポータルの各機能で発生したイベントを通知レコードとして書き込む。
//!
//! ## 設計方針
//!
//! - **fire-and-forget**: レコードを書き込んだ時点で責務を終える。
//!   メール送信とステータス管理はディスパッチャーに任せる
//! - **ファンアウト**: マネージャー全員・ユーザー全員への通知は
//!   受信者ごとに 1 レコードを作成する
//!
//! | メソッド | 通知種別 | リンク | 送信者 |
//! |---------|---------|-------|-------|
//! | [`NotificationPublisher::new_message`] | `newMessage` | `/messages/{thread_id}` | メッセージ送信者 |
//! | [`NotificationPublisher::schedule_uploaded`] | `scheduleUploaded` | `/schedule` | アップロードしたユーザー |
//! | [`NotificationPublisher::new_user_pending_approval`] | `newUserPendingApproval` | `/admin/approvals` | 新規ユーザー |
//! | [`NotificationPublisher::account_approved`] | `accountApproved` | `/dashboard` | 承認者 |
//! | [`NotificationPublisher::time_off_reviewed`] | `timeOffReviewed` | `/time-off` | 審査者 |
//! | [`NotificationPublisher::announcement_posted`] | `announcementPosted` | `/announcements` | 投稿者 |

use std::sync::Arc;

use rosterly_domain::{
    clock::Clock,
    notification::{
        ContextData,
        NewNotificationRecord,
        NotificationId,
        NotificationKind,
        NotificationRecord,
    },
    user::{UserId, UserRole},
};
use rosterly_infra::{
    InfraError,
    repository::{NotificationRepository, UserDirectory},
};
use rosterly_shared::{event_log::event, log_business_event};

/// 通知プロデューサー
pub struct NotificationPublisher {
    notifications: Arc<dyn NotificationRepository>,
    users:         Arc<dyn UserDirectory>,
    clock:         Arc<dyn Clock>,
}

impl NotificationPublisher {
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        users: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            notifications,
            users,
            clock,
        }
    }

    /// ダイレクトメッセージの受信を通知する
    pub async fn new_message(
        &self,
        recipient: &UserId,
        sender: &UserId,
        thread_id: &str,
    ) -> Result<NotificationId, InfraError> {
        self.publish(
            NotificationKind::NewMessage,
            recipient,
            format!("/messages/{thread_id}"),
            sender,
        )
        .await
    }

    /// シフト表のアップロードを通知する
    pub async fn schedule_uploaded(
        &self,
        recipient: &UserId,
        uploaded_by: &UserId,
    ) -> Result<NotificationId, InfraError> {
        self.publish(
            NotificationKind::ScheduleUploaded,
            recipient,
            "/schedule".to_string(),
            uploaded_by,
        )
        .await
    }

    /// 新規ユーザーの承認待ちをマネージャー全員に通知する
    pub async fn new_user_pending_approval(
        &self,
        new_user: &UserId,
    ) -> Result<Vec<NotificationId>, InfraError> {
        let managers = self.users.find_by_role(UserRole::Manager).await?;

        let mut ids = Vec::with_capacity(managers.len());
        for manager in &managers {
            let id = self
                .publish(
                    NotificationKind::NewUserPendingApproval,
                    manager.uid(),
                    "/admin/approvals".to_string(),
                    new_user,
                )
                .await?;
            ids.push(id);
        }
        Ok(ids)
    }

    /// アカウントの承認を本人に通知する
    pub async fn account_approved(
        &self,
        user: &UserId,
        approved_by: &UserId,
    ) -> Result<NotificationId, InfraError> {
        self.publish(
            NotificationKind::AccountApproved,
            user,
            "/dashboard".to_string(),
            approved_by,
        )
        .await
    }

    /// 休暇申請の審査完了を申請者に通知する
    pub async fn time_off_reviewed(
        &self,
        recipient: &UserId,
        reviewer: &UserId,
    ) -> Result<NotificationId, InfraError> {
        self.publish(
            NotificationKind::TimeOffReviewed,
            recipient,
            "/time-off".to_string(),
            reviewer,
        )
        .await
    }

    /// お知らせの掲載を投稿者以外の全ユーザーに通知する
    pub async fn announcement_posted(
        &self,
        author: &UserId,
    ) -> Result<Vec<NotificationId>, InfraError> {
        let users = self.users.find_all().await?;

        let mut ids = Vec::new();
        for user in users.iter().filter(|u| u.uid() != author) {
            let id = self
                .publish(
                    NotificationKind::AnnouncementPosted,
                    user.uid(),
                    "/announcements".to_string(),
                    author,
                )
                .await?;
            ids.push(id);
        }
        Ok(ids)
    }

    async fn publish(
        &self,
        kind: NotificationKind,
        recipient: &UserId,
        link: String,
        sender: &UserId,
    ) -> Result<NotificationId, InfraError> {
        let record = NotificationRecord::new(NewNotificationRecord {
            id:                NotificationId::generate(),
            notification_type: kind.notification_type(),
            recipient_id:      recipient.clone(),
            link:              Some(link),
            context_data:      ContextData::with_sender(sender.clone()),
            created_at:        self.clock.now(),
        });

        self.notifications.insert(&record).await?;

        log_business_event!(
            event.category = event::category::NOTIFICATION,
            event.action = event::action::NOTIFICATION_PUBLISHED,
            event.entity_type = event::entity_type::NOTIFICATION,
            event.entity_id = %record.id(),
            event.result = event::result::SUCCESS,
            notification.notification_type = %kind,
            notification.recipient = %recipient,
            "通知レコードを作成"
        );

        Ok(record.id().clone())
    }
}
