//! # ビジネスイベントログの構造化ヘルパー
//!
//! 通知の配信状況を `jq` で追跡できるよう、ログフィールドの命名規約と
//! ヘルパーマクロを提供する。
//!
//! [`log_business_event!`] で出力したログには `event.kind = "business_event"` が
//! 自動付与され、`jq 'select(.["event.kind"] == "business_event")'` でフィルタできる。
//!
//! フィールド名はドット記法（`event.category`、`error.kind`）を使用する。

/// ビジネスイベントを構造化ログとして出力する。
///
/// `event.kind = "business_event"` マーカーを自動付与し、
/// `tracing::info!` レベルで出力する。
///
/// ## 必須フィールド（慣例）
///
/// - `event.category`: イベントカテゴリ（[`event::category`] の定数を使用）
/// - `event.action`: アクション名（[`event::action`] の定数を使用）
/// - `event.result`: 結果（[`event::result`] の定数を使用）
///
/// ## 推奨フィールド
///
/// - `event.entity_type`: エンティティ種別（[`event::entity_type`] の定数を使用）
/// - `event.entity_id`: エンティティ ID
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(
            event.kind = "business_event",
            $($args)*
        )
    };
}

/// イベントフィールドの定数
pub mod event {
    /// イベントカテゴリ
    pub mod category {
        pub const NOTIFICATION: &str = "notification";
    }

    /// イベントアクション
    pub mod action {
        pub const NOTIFICATION_PUBLISHED: &str = "notification.published";
        pub const NOTIFICATION_SKIPPED: &str = "notification.skipped";
        pub const NOTIFICATION_SENT: &str = "notification.sent";
        pub const NOTIFICATION_FAILED: &str = "notification.failed";
    }

    /// エンティティ種別
    pub mod entity_type {
        pub const NOTIFICATION: &str = "notification";
    }

    /// イベント結果
    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const FAILURE: &str = "failure";
        pub const SKIPPED: &str = "skipped";
    }
}

/// エラーコンテキストフィールドの定数
pub mod error {
    /// エラーカテゴリ
    pub mod category {
        /// インフラストラクチャ（DynamoDB）
        pub const INFRASTRUCTURE: &str = "infrastructure";
        /// 外部サービス呼び出し（SMTP リレー、SES）
        pub const EXTERNAL_SERVICE: &str = "external_service";
        /// データ不整合（ぶら下がり参照、テンプレート未設定）
        pub const DATA_INTEGRITY: &str = "data_integrity";
    }

    /// エラー種別
    pub mod kind {
        pub const DATABASE: &str = "database";
        pub const MAIL_TRANSPORT: &str = "mail_transport";
        pub const RECIPIENT_NOT_FOUND: &str = "recipient_not_found";
        pub const INVALID_RECIPIENT_ADDRESS: &str = "invalid_recipient_address";
        pub const TEMPLATE_NOT_FOUND: &str = "template_not_found";
        pub const STATUS_WRITEBACK: &str = "status_writeback";
    }
}
