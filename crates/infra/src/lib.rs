//! # Rosterly インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 設計方針
//!
//! このクレートはリポジトリトレイトとメール送信トレイトの具体的な実装を提供する。
//! 外部システムの詳細をカプセル化し、ユースケースを外部サービスの変更から保護する。
//!
//! ## 責務
//!
//! - **ドキュメントストア接続**: DynamoDB クライアントの生成とテーブルの自動作成
//! - **リポジトリ実装**: 通知レコード、ユーザーディレクトリ、メールテンプレート
//! - **メール送信**: SMTP リレー / SES / Noop
//!
//! ## 依存関係
//!
//! ```text
//! apps → infra → domain
//! ```
//!
//! ## モジュール構成
//!
//! - [`dynamodb`] - DynamoDB 接続管理と属性値の変換
//! - [`error`] - インフラ層エラー定義
//! - [`notification`] - メール送信（Mail Transport）
//! - [`repository`] - リポジトリ実装
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use rosterly_infra::{dynamodb, repository::DynamoDbNotificationRepository};
//!
//! async fn setup() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = dynamodb::create_client(Some("http://localhost:18000")).await;
//!     let repo = DynamoDbNotificationRepository::new(client, "notifications".to_string());
//!     Ok(())
//! }
//! ```

pub mod dynamodb;
pub mod error;
pub mod notification;
pub mod repository;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use error::{InfraError, InfraErrorKind};
