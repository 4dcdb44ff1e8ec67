//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置
//! - 親モジュール（この `handler.rs`）で re-export し、フラットな API を提供
//! - ハンドラは薄く保ち、配信処理と通知作成はユースケースに委譲

pub mod health;
pub mod publish;
pub mod trigger;

pub use health::{ReadinessState, health_check, readiness_check};
pub use publish::{
    PublishResponse,
    PublishState,
    publish_account_approved,
    publish_announcement_posted,
    publish_new_message,
    publish_new_user_pending_approval,
    publish_schedule_uploaded,
    publish_time_off_reviewed,
};
pub use trigger::{TriggerResponse, TriggerState, handle_notification_created};
