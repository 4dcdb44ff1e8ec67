//! # 通知ディスパッチャー設定
//!
//! 環境変数から通知ディスパッチャーの設定を読み込む。
//!
//! 値の解析は [`DispatcherConfig::from_lookup`] に集約し、
//! テストでは環境変数を書き換えずにマップから読み込む。

use std::{env, str::FromStr, time::Duration};

use rosterly_infra::notification::SmtpTls;
use thiserror::Error;

/// 設定読み込みエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// 必須の環境変数が未設定
    #[error("{0} が設定されていません")]
    Missing(&'static str),

    /// 値の形式が不正
    #[error("{key} の値が不正です: {value}")]
    Invalid { key: &'static str, value: String },
}

/// 通知ディスパッチャーの設定
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// バインドアドレス
    pub host: String,
    /// ポート番号
    pub port: u16,
    /// DynamoDB エンドポイント URL（DynamoDB Local 使用時に設定）
    pub dynamodb_endpoint: Option<String>,
    /// 起動時にテーブルを作成するか
    pub ensure_tables: bool,
    /// テーブル名
    pub tables: TableNames,
    /// 1 回のディスパッチに許す時間
    pub dispatch_timeout: Duration,
    /// 通知設定
    pub notification: NotificationConfig,
}

/// DynamoDB テーブル名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub notifications:   String,
    pub users:           String,
    pub email_templates: String,
}

/// メール送信バックエンド
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum NotificationBackend {
    /// SMTP リレー（開発環境では Mailpit）
    Smtp,
    /// Amazon SES v2
    Ses,
    /// 送信しない（ログ出力のみ）
    #[default]
    Noop,
}

/// 通知機能の設定
///
/// `NOTIFICATION_BACKEND` 環境変数で送信バックエンドを切り替える。
/// SMTP の認証情報はデプロイ先のシークレット管理から注入される。
#[derive(Clone)]
pub struct NotificationConfig {
    /// 送信バックエンド
    pub backend:          NotificationBackend,
    /// SMTP ホスト（backend=smtp の場合に使用）
    pub smtp_host:        String,
    /// SMTP ポート（backend=smtp の場合に使用）
    pub smtp_port:        u16,
    /// SMTP 接続のセキュリティ方式
    pub smtp_tls:         SmtpTls,
    /// SMTP 認証情報（ユーザー名, パスワード）
    pub smtp_credentials: Option<(String, String)>,
    /// 送信元の表示名
    pub from_name:        String,
    /// 送信元メールアドレス
    pub from_address:     String,
    /// ポータルのベース URL（メール内リンク用）
    pub base_url:         String,
}

// パスワードをログに出さない
impl std::fmt::Debug for NotificationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationConfig")
            .field("backend", &self.backend)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_tls", &self.smtp_tls)
            .field(
                "smtp_username",
                &self.smtp_credentials.as_ref().map(|(user, _)| user),
            )
            .field("from_name", &self.from_name)
            .field("from_address", &self.from_address)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl DispatcherConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 任意の参照関数から設定を読み込む
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = lookup("DISPATCHER_PORT").ok_or(ConfigError::Missing("DISPATCHER_PORT"))?;

        Ok(Self {
            host: lookup("DISPATCHER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_value("DISPATCHER_PORT", &port)?,
            dynamodb_endpoint: lookup("DYNAMODB_ENDPOINT").filter(|v| !v.is_empty()),
            ensure_tables: parse_or(&lookup, "DYNAMODB_ENSURE_TABLES", false)?,
            tables: TableNames {
                notifications:   lookup("NOTIFICATIONS_TABLE")
                    .unwrap_or_else(|| "notifications".to_string()),
                users:           lookup("USERS_TABLE").unwrap_or_else(|| "users".to_string()),
                email_templates: lookup("EMAIL_TEMPLATES_TABLE")
                    .unwrap_or_else(|| "email_templates".to_string()),
            },
            dispatch_timeout: parse_timeout(&lookup)?,
            notification: NotificationConfig::from_lookup(&lookup)?,
        })
    }
}

impl NotificationConfig {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let smtp_credentials = match (lookup("SMTP_USERNAME"), lookup("SMTP_PASSWORD")) {
            (Some(user), Some(password)) if !user.is_empty() => Some((user, password)),
            (Some(user), None) if !user.is_empty() => {
                return Err(ConfigError::Missing("SMTP_PASSWORD"));
            }
            _ => None,
        };

        Ok(Self {
            backend: parse_or(lookup, "NOTIFICATION_BACKEND", NotificationBackend::Noop)?,
            smtp_host: lookup("SMTP_HOST").unwrap_or_else(|| "localhost".to_string()),
            smtp_port: parse_or(lookup, "SMTP_PORT", 1025)?,
            smtp_tls: parse_or(lookup, "SMTP_TLS", SmtpTls::None)?,
            smtp_credentials,
            from_name: lookup("NOTIFICATION_FROM_NAME").unwrap_or_else(|| "Rosterly".to_string()),
            from_address: lookup("NOTIFICATION_FROM_ADDRESS")
                .unwrap_or_else(|| "noreply@rosterly.example.com".to_string()),
            base_url: lookup("NOTIFICATION_BASE_URL")
                .unwrap_or_else(|| "http://localhost:5173".to_string()),
        })
    }
}

fn parse_value<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}

/// 1 回のディスパッチに許す時間（0 秒は全件タイムアウトになるため拒否する）
fn parse_timeout(lookup: &impl Fn(&str) -> Option<String>) -> Result<Duration, ConfigError> {
    let secs: u64 = parse_or(lookup, "DISPATCH_TIMEOUT_SECS", 60)?;
    if secs == 0 {
        return Err(ConfigError::Invalid {
            key:   "DISPATCH_TIMEOUT_SECS",
            value: secs.to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(value) => parse_value(key, &value),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<DispatcherConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        DispatcherConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_最小構成ではデフォルト値が使われる() {
        let config = load(&[("DISPATCHER_PORT", "3100")]).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3100);
        assert_eq!(config.dynamodb_endpoint, None);
        assert!(!config.ensure_tables);
        assert_eq!(config.tables.notifications, "notifications");
        assert_eq!(config.tables.users, "users");
        assert_eq!(config.tables.email_templates, "email_templates");
        assert_eq!(config.dispatch_timeout, Duration::from_secs(60));
        assert_eq!(config.notification.backend, NotificationBackend::Noop);
        assert_eq!(config.notification.smtp_tls, SmtpTls::None);
        assert!(config.notification.smtp_credentials.is_none());
        assert_eq!(config.notification.from_name, "Rosterly");
    }

    #[test]
    fn test_dispatcher_portがなければmissingエラー() {
        assert_eq!(
            load(&[]).unwrap_err(),
            ConfigError::Missing("DISPATCHER_PORT")
        );
    }

    #[test]
    fn test_不正なポート番号はinvalidエラー() {
        assert!(matches!(
            load(&[("DISPATCHER_PORT", "abc")]),
            Err(ConfigError::Invalid {
                key: "DISPATCHER_PORT",
                ..
            })
        ));
    }

    #[test]
    fn test_タイムアウト0秒はinvalidエラー() {
        assert_eq!(
            load(&[("DISPATCHER_PORT", "3100"), ("DISPATCH_TIMEOUT_SECS", "0")]).unwrap_err(),
            ConfigError::Invalid {
                key:   "DISPATCH_TIMEOUT_SECS",
                value: "0".to_string(),
            }
        );
    }

    #[test]
    fn test_タイムアウト秒数を読み込む() {
        let config = load(&[("DISPATCHER_PORT", "3100"), ("DISPATCH_TIMEOUT_SECS", "5")]).unwrap();

        assert_eq!(config.dispatch_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_smtpリレーの設定を読み込む() {
        let config = load(&[
            ("DISPATCHER_PORT", "3100"),
            ("NOTIFICATION_BACKEND", "smtp"),
            ("SMTP_HOST", "smtp.relay.example.com"),
            ("SMTP_PORT", "587"),
            ("SMTP_TLS", "starttls"),
            ("SMTP_USERNAME", "relay-user"),
            ("SMTP_PASSWORD", "relay-pass"),
            ("DISPATCH_TIMEOUT_SECS", "30"),
        ])
        .unwrap();

        assert_eq!(config.notification.backend, NotificationBackend::Smtp);
        assert_eq!(config.notification.smtp_port, 587);
        assert_eq!(config.notification.smtp_tls, SmtpTls::StartTls);
        assert_eq!(
            config.notification.smtp_credentials,
            Some(("relay-user".to_string(), "relay-pass".to_string()))
        );
        assert_eq!(config.dispatch_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_ユーザー名だけではsmtp_passwordのmissingエラー() {
        assert_eq!(
            load(&[("DISPATCHER_PORT", "3100"), ("SMTP_USERNAME", "relay-user")]).unwrap_err(),
            ConfigError::Missing("SMTP_PASSWORD")
        );
    }

    #[test]
    fn test_不明なバックエンドはinvalidエラー() {
        assert!(matches!(
            load(&[("DISPATCHER_PORT", "3100"), ("NOTIFICATION_BACKEND", "sendgrid")]),
            Err(ConfigError::Invalid {
                key: "NOTIFICATION_BACKEND",
                ..
            })
        ));
    }

    #[test]
    fn test_debug出力にパスワードが含まれない() {
        let config = load(&[
            ("DISPATCHER_PORT", "3100"),
            ("SMTP_USERNAME", "relay-user"),
            ("SMTP_PASSWORD", "s3cret"),
        ])
        .unwrap();

        let debug = format!("{:?}", config.notification);
        assert!(debug.contains("relay-user"));
        assert!(!debug.contains("s3cret"));
    }
}
