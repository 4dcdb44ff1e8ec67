//! # ドメイン層エラー定義
//!
//! ビジネスルール違反やドメイン固有の例外状態を表現するエラー型。
//!
//! ## エラーの種類と HTTP ステータスの対応
//!
//! | エラー種別 | HTTP ステータス | 用途 |
//! |-----------|----------------|------|
//! | `Validation` | 400 Bad Request | トリガーペイロードや入力値の検証失敗 |
//!
//! ## 使用例
//!
//! ```rust
//! use rosterly_domain::DomainError;
//!
//! fn validate_link(link: &str) -> Result<(), DomainError> {
//!     if !link.starts_with('/') {
//!         return Err(DomainError::Validation(
//!             "link は / で始まる必要があります".to_string(),
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// ドメイン層で発生するエラー
#[derive(Debug, Error)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// 入力値（トリガーペイロード、ID、メールアドレスなど）が
    /// 期待する形式に合致しない場合に使用する。
    #[error("バリデーションエラー: {0}")]
    Validation(String),
}
