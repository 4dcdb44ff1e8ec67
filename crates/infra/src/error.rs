//! # インフラ層エラー定義
//!
//! ドキュメントストアとの通信で発生するエラーを表現する。
//!
//! ## 設計方針
//!
//! - **エラーの変換**: AWS SDK のエラーや serde_json::Error をラップ
//! - **SpanTrace 自動捕捉**: `From` 実装や convenience constructor で
//!   エラー生成時の呼び出し経路を自動記録する
//!
//! ## 構造
//!
//! `std::io::Error` と同じ struct + enum パターンを採用:
//! - [`InfraError`]: エラー種別（[`InfraErrorKind`]）と [`SpanTrace`] を保持するラッパー
//! - [`InfraErrorKind`]: エラーの具体的な種別（DynamoDb, NotFound 等）

use std::fmt;

use derive_more::Display;
use rosterly_domain::DomainError;
use thiserror::Error;
use tracing_error::SpanTrace;

/// インフラ層で発生するエラー
///
/// エラー種別（[`InfraErrorKind`]）と [`SpanTrace`]（呼び出し経路）を保持する。
///
/// ## パターンマッチ
///
/// ```ignore
/// match error.kind() {
///     InfraErrorKind::NotFound { entity, id } => { /* 対象なし */ }
///     _ => { /* その他 */ }
/// }
/// ```
#[derive(Display)]
#[display("{kind}")]
pub struct InfraError {
    kind:       InfraErrorKind,
    span_trace: SpanTrace,
}

/// インフラ層エラーの種別
#[derive(Debug, Error)]
pub enum InfraErrorKind {
    /// DynamoDB エラー
    ///
    /// AWS SDK のエラー型はジェネリクスが深く `#[from]` が困難なため、
    /// 手動で String にマップする。
    #[error("DynamoDB エラー: {0}")]
    DynamoDb(String),

    /// シリアライズ/デシリアライズエラー
    #[error("シリアライズエラー: {0}")]
    Serialization(#[source] serde_json::Error),

    /// 更新対象のドキュメントが存在しない
    #[error("対象が見つかりません: {entity}(id={id})")]
    NotFound {
        /// エンティティ名（例: "Notification"）
        entity: String,
        /// エンティティの ID
        id:     String,
    },

    /// 同じ ID のドキュメントが既に存在する
    #[error("競合が発生しました: {entity}(id={id})")]
    Conflict {
        /// エンティティ名（例: "Notification"）
        entity: String,
        /// エンティティの ID
        id:     String,
    },

    /// 保存されているドキュメントの形式が不正
    ///
    /// 属性の欠落や型違いなど。ドメイン層の検証エラーもここに変換される。
    #[error("保存データが不正です: {0}")]
    InvalidData(String),
}

// ===== InfraError のメソッド =====

impl InfraError {
    /// エラー種別を取得する
    pub fn kind(&self) -> &InfraErrorKind {
        &self.kind
    }

    /// SpanTrace を取得する
    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    /// NotFound かどうか
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, InfraErrorKind::NotFound { .. })
    }

    fn from_kind(kind: InfraErrorKind) -> Self {
        Self {
            kind,
            span_trace: SpanTrace::capture(),
        }
    }

    // ===== Convenience constructors =====

    /// DynamoDB エラーを生成する
    pub fn dynamo_db(msg: impl Into<String>) -> Self {
        Self::from_kind(InfraErrorKind::DynamoDb(msg.into()))
    }

    /// 対象なしエラーを生成する
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::from_kind(InfraErrorKind::NotFound {
            entity: entity.into(),
            id:     id.into(),
        })
    }

    /// 競合エラーを生成する
    pub fn conflict(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::from_kind(InfraErrorKind::Conflict {
            entity: entity.into(),
            id:     id.into(),
        })
    }

    /// 保存データ不正エラーを生成する
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::from_kind(InfraErrorKind::InvalidData(msg.into()))
    }
}

// ===== トレイト実装 =====

impl fmt::Debug for InfraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfraError")
            .field("kind", &self.kind)
            .field("span_trace", &self.span_trace)
            .finish()
    }
}

impl std::error::Error for InfraError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.kind.source()
    }
}

// ===== From 実装（SpanTrace 自動キャプチャ） =====

impl From<serde_json::Error> for InfraError {
    fn from(source: serde_json::Error) -> Self {
        Self::from_kind(InfraErrorKind::Serialization(source))
    }
}

impl From<DomainError> for InfraError {
    fn from(source: DomainError) -> Self {
        Self::from_kind(InfraErrorKind::InvalidData(source.to_string()))
    }
}
