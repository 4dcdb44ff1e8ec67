//! # 通知
//!
//! 通知レコードとメール配信に関するドメインモデルを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 備考 |
//! |---|------------|------|
//! | [`NotificationRecord`] | 通知レコード | 利用者へ知らせる意図。ディスパッチャーが 1 回だけ消費する |
//! | [`EmailTemplate`] | メールテンプレート | 通知種別ごとの件名・本文（`{token}` プレースホルダー付き） |
//! | [`DeliveryStatus`] | 配信ステータス | `pending` → `sent` \| `failed`（終端） |
//! | [`NotificationKind`] | 通知イベント種別 | ポータル内のイベントと通知種別の対応 |
//!
//! ## 設計方針
//!
//! - **fire-and-forget**: プロデューサーはレコードを書き込むだけで、送信結果を知らない
//! - **終端ステータス**: ステータスの書き込みはディスパッチャーだけが行う
//! - **絶対値の上書き**: ステータス更新は加算ではなく値の設定なので、再配信されても冪等

mod email;
mod record;
mod template;

use chrono::{DateTime, Utc};
pub use email::{EmailMessage, MailSender};
pub use record::{ContextData, NewNotificationRecord, NotificationRecord};
use serde::{Deserialize, Serialize};
pub use template::EmailTemplate;
use thiserror::Error;

use crate::DomainError;

define_string_id! {
    /// 通知レコード ID
    ///
    /// ドキュメントストアが作成時に割り当てる不透明な識別子。
    pub struct NotificationId {
        label: "通知 ID",
    }
}

define_validated_string! {
    /// 通知種別
    ///
    /// メールテンプレートを選択するキー。テンプレートは管理画面から追加されるため、
    /// 既知の [`NotificationKind`] 以外の値も受け付ける。
    pub struct NotificationType {
        label: "通知種別",
        max_length: 64,
    }
}

/// 通知送信エラー
#[derive(Debug, Error)]
pub enum NotificationError {
    /// メール送信に失敗
    #[error("メール送信に失敗: {0}")]
    SendFailed(String),

    /// メールアドレスが不正
    #[error("メールアドレスが不正: {0}")]
    InvalidAddress(String),
}

/// 通知イベント種別
///
/// ポータルの各機能が発行する通知の種類。`type` 属性には camelCase で保存される。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
    strum::EnumIter,
)]
#[strum(serialize_all = "camelCase")]
pub enum NotificationKind {
    /// ダイレクトメッセージ受信
    NewMessage,
    /// シフト表ファイルのアップロード
    ScheduleUploaded,
    /// 新規ユーザー登録（マネージャーの承認待ち）
    NewUserPendingApproval,
    /// アカウント承認
    AccountApproved,
    /// 休暇申請の審査完了
    TimeOffReviewed,
    /// お知らせ掲載
    AnnouncementPosted,
}

impl NotificationKind {
    /// 通知種別（テンプレートキー）に変換する
    pub fn notification_type(self) -> NotificationType {
        let value: &'static str = self.into();
        NotificationType(value.to_string())
    }
}

/// 配信ステータス
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    /// 未処理（作成直後は属性自体が存在しない）
    #[default]
    Pending,
    /// 送信済み
    Sent,
    /// 送信失敗
    Failed,
}

impl DeliveryStatus {
    /// 保存値からステータスを復元する（属性なしは `Pending`）
    pub fn from_stored(value: Option<&str>) -> Result<Self, DomainError> {
        match value {
            None => Ok(Self::Pending),
            Some(v) => v
                .parse()
                .map_err(|_| DomainError::Validation(format!("不明な配信ステータスです: {v}"))),
        }
    }

    /// 終端ステータスかどうか
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Sent | Self::Failed)
    }
}

/// ディスパッチャーが通知レコードに書き戻すステータス
///
/// 部分更新として適用され、ステータス関連以外の属性には触れない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    /// `{status: "sent", sentAt}`
    Sent { sent_at: DateTime<Utc> },
    /// `{status: "failed", error}`
    Failed { error: String },
}

impl StatusUpdate {
    pub fn status(&self) -> DeliveryStatus {
        match self {
            Self::Sent { .. } => DeliveryStatus::Sent,
            Self::Failed { .. } => DeliveryStatus::Failed,
        }
    }
}
