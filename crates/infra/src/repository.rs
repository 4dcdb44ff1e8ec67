//! # リポジトリ実装
//!
//! ディスパッチャーとプロデューサーが使うリポジトリトレイトと、
//! その DynamoDB 実装を提供する。
//!
//! ## 設計方針
//!
//! - **依存性逆転**: ユースケースはトレイトにのみ依存する
//! - **スナップショット検証の共有**: 読み取ったアイテムは JSON に変換し、
//!   ドメイン層の検証ロジックを通して型付きの値にする
//! - **テスタビリティ**: トレイト経由でモック可能な設計

pub mod email_template_repository;
pub mod notification_repository;
pub mod user_directory;

pub use email_template_repository::{DynamoDbEmailTemplateRepository, EmailTemplateRepository};
pub use notification_repository::{DynamoDbNotificationRepository, NotificationRepository};
pub use user_directory::{DynamoDbUserDirectory, UserDirectory};
