//! # ユースケース層
//!
//! 通知ディスパッチャーのビジネスロジックを実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: リポジトリとメール送信を `Arc<dyn Trait>` で外部から注入
//! - **薄いハンドラ**: ハンドラは薄く保ち、ロジックはユースケースに集約

pub mod notification;

pub use notification::{
    DispatchError,
    DispatchOutcome,
    DispatchSettings,
    NotificationDispatcher,
    NotificationPublisher,
    SkipReason,
    TemplateRenderer,
};
