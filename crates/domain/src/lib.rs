//! # Rosterly ドメイン層
//!
//! 通知ディスパッチの中核となるドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **型付きドキュメント**: ドキュメントストアから受け取る緩い型のスナップショットは
//!   境界で検証し、型付きの [`notification::NotificationRecord`] に変換する
//! - **値オブジェクト**: ID やメールアドレスは生成時に検証する
//! - **インフラ非依存**: DynamoDB や SMTP の詳細はインフラ層に閉じ込める
//!
//! ## 依存関係の方向
//!
//! ```text
//! apps → infra → domain
//!   ↘      ↘
//!     shared
//! ```
//!
//! ## モジュール構成
//!
//! - [`clock`] - 時刻プロバイダ
//! - [`error`] - ドメイン層エラー
//! - [`notification`] - 通知レコード、メールテンプレート、メールメッセージ
//! - [`trigger`] - 通知作成イベント（トリガー入力）
//! - [`user`] - ユーザーディレクトリのプロフィール

#[macro_use]
mod macros;

pub mod clock;
pub mod error;
pub mod notification;
pub mod trigger;
pub mod user;

pub use error::DomainError;
