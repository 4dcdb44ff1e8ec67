//! # ユーザー
//!
//! ユーザーディレクトリのプロフィールと関連する値オブジェクトを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 備考 |
//! |---|------------|------|
//! | [`UserProfile`] | ユーザープロフィール | ディスパッチャーからは読み取り専用 |
//! | [`UserRole`] | ユーザー区分 | 従業員 / マネージャー / 管理者 |
//! | [`Email`] | メールアドレス | 送信直前に検証する |
//!
//! ## 名前フィールドの揺れ
//!
//! 過去のバージョンでは名を `first_name`、現行では `firstName` で保存している。
//! 読み取り側（インフラ層）で両方を受け付け、ドメインでは
//! [`UserProfile::first_name`] に正規化する。

use serde::{Deserialize, Serialize};

use crate::DomainError;

define_string_id! {
    /// ユーザー ID（ユーザーディレクトリのキー）
    ///
    /// 認証プロバイダが払い出す不透明な文字列。
    pub struct UserId {
        label: "ユーザー ID",
    }
}

/// メールアドレス（値オブジェクト）
///
/// 生成時にバリデーションを実行し、不正な値の作成を防ぐ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// メールアドレスを作成する
    ///
    /// # バリデーション
    ///
    /// - 空文字列ではない
    /// - `local@domain` の形式
    /// - 最大 255 文字
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_string();

        if value.is_empty() {
            return Err(DomainError::Validation(
                "メールアドレスは必須です".to_string(),
            ));
        }

        let Some((local, domain)) = value.split_once('@') else {
            return Err(DomainError::Validation(
                "メールアドレスの形式が不正です".to_string(),
            ));
        };

        if local.is_empty() || domain.is_empty() {
            return Err(DomainError::Validation(
                "メールアドレスの形式が不正です".to_string(),
            ));
        }

        if value.len() > 255 {
            return Err(DomainError::Validation(
                "メールアドレスは255文字以内である必要があります".to_string(),
            ));
        }

        Ok(Self(value))
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// ユーザー区分
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
pub enum UserRole {
    /// 従業員
    #[default]
    Employee,
    /// マネージャー（新規ユーザーの承認者）
    Manager,
    /// 管理者
    Admin,
}

impl UserRole {
    /// 保存値から区分を復元する
    ///
    /// 未知の値は [`UserRole::Employee`] として扱う。
    pub fn from_stored(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }
}

/// ユーザープロフィール
///
/// ディスパッチに必要な属性のみを保持する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    uid:        UserId,
    email:      Option<String>,
    first_name: Option<String>,
    role:       UserRole,
}

impl UserProfile {
    pub fn new(
        uid: UserId,
        email: Option<String>,
        first_name: Option<String>,
        role: UserRole,
    ) -> Self {
        Self {
            uid,
            email,
            first_name,
            role,
        }
    }

    pub fn uid(&self) -> &UserId {
        &self.uid
    }

    /// 保存されているメールアドレス（未検証）
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// 名（空白のみの場合は未設定として扱う）
    pub fn first_name(&self) -> Option<&str> {
        self.first_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    pub fn role(&self) -> UserRole {
        self.role
    }

    /// 送信先として使える検証済みメールアドレスを返す
    pub fn deliverable_email(&self) -> Result<Email, DomainError> {
        match self.email() {
            Some(email) => Email::new(email),
            None => Err(DomainError::Validation(format!(
                "ユーザー {} にメールアドレスが登録されていません",
                self.uid
            ))),
        }
    }
}
