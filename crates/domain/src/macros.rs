/// ドキュメントストアの不透明な文字列 ID 型を定義する宣言型マクロ
///
/// 以下のボイラープレートを一括生成する:
/// - Newtype 構造体（`String` をラップ）
/// - `derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)`
/// - `new()`: trim + 空チェック付きの生成
/// - `generate()`: UUID v7 文字列で新規採番
/// - `as_str()`: 内部文字列への参照
///
/// デシリアライズ時も `new()` の検証を通す（`serde(try_from = "String")`）。
///
/// # 使用例
///
/// ```rust
/// use rosterly_domain::user::UserId;
///
/// let id = UserId::new("U1").unwrap();
/// assert_eq!(id.as_str(), "U1");
/// assert!(UserId::new("  ").is_err());
/// ```
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident {
            label: $label:expr $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash,
            serde::Serialize, serde::Deserialize,
            derive_more::Display,
        )]
        #[display("{_0}")]
        #[serde(try_from = "String", into = "String")]
        $vis struct $Name(String);

        impl $Name {
            /// 文字列から ID を作成する（空文字列は不可）
            pub fn new(value: impl Into<String>) -> Result<Self, $crate::DomainError> {
                let value = value.into().trim().to_string();
                if value.is_empty() {
                    return Err($crate::DomainError::Validation(format!(
                        "{}は必須です",
                        $label
                    )));
                }
                Ok(Self(value))
            }

            /// 新しい ID を採番する（UUID v7 文字列）
            pub fn generate() -> Self {
                Self(uuid::Uuid::now_v7().to_string())
            }

            /// 文字列参照を取得する
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $Name {
            type Error = $crate::DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$Name> for String {
            fn from(id: $Name) -> Self {
                id.0
            }
        }
    };
}

/// バリデーション付き String Newtype を定義する宣言型マクロ
///
/// 以下のボイラープレートを一括生成する:
/// - Newtype 構造体（`String` をラップ）
/// - `new()`: trim + 空チェック + 最大長チェック
/// - `as_str()`: 文字列参照
/// - `Display` impl
///
/// # 引数
///
/// - `$label`: エラーメッセージに使うラベル（例: `"通知種別"`）
/// - `$max_length`: 最大文字数（`chars().count()` でカウント）
macro_rules! define_validated_string {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident {
            label: $label:expr,
            max_length: $max_length:expr $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash,
            serde::Serialize, serde::Deserialize,
        )]
        $vis struct $Name(String);

        impl $Name {
            pub fn new(value: impl Into<String>) -> Result<Self, $crate::DomainError> {
                let value = value.into().trim().to_string();

                if value.is_empty() {
                    return Err($crate::DomainError::Validation(format!(
                        "{}は必須です",
                        $label
                    )));
                }

                if value.chars().count() > $max_length {
                    return Err($crate::DomainError::Validation(format!(
                        "{}は {} 文字以内である必要があります",
                        $label, $max_length
                    )));
                }

                Ok(Self(value))
            }

            /// 文字列参照を取得する
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $Name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}
