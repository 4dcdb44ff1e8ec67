//! # 通知ユースケース
//!
//! 通知レコードの作成（プロデューサー）と、作成イベントを受けた
//! メール送信・ステータス書き戻し（ディスパッチャー）を提供する。
//!
//! ## モジュール構成
//!
//! - [`dispatcher`] - 作成イベント 1 件分の配信処理
//! - [`publisher`] - ポータルのイベントから通知レコードを作成
//! - [`template_renderer`] - `{token}` プレースホルダーの置換

pub mod dispatcher;
pub mod publisher;
pub mod template_renderer;

pub use dispatcher::{
    DispatchError,
    DispatchOutcome,
    DispatchSettings,
    NotificationDispatcher,
    SkipReason,
};
pub use publisher::NotificationPublisher;
pub use template_renderer::TemplateRenderer;
