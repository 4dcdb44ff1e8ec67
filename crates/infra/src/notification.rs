//! # メール送信（Mail Transport）
//!
//! 通知メールの送信を担当するインフラストラクチャモジュール。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `NotificationSender` trait でメール送信を抽象化
//! - **3 つの実装**: SMTP リレー（Mailpit / 本番リレー）、SES、Noop（既定）
//! - **環境変数切替**: `NOTIFICATION_BACKEND` でランタイム選択
//! - **プレーンテキストのみ**: HTML パートや添付ファイルは扱わない

mod noop;
mod ses;
mod smtp;

use async_trait::async_trait;
use lettre::{
    Address,
    message::{
        Mailbox,
        Mailboxes,
        header::{self, Headers},
    },
};
pub use noop::NoopNotificationSender;
use rosterly_domain::{
    notification::{EmailMessage, MailSender, NotificationError},
    user::Email,
};
pub use ses::SesNotificationSender;
pub use smtp::{SmtpNotificationSender, SmtpTls};

/// メール送信トレイト
///
/// ディスパッチャーが送信方法に依存しないよう抽象化する。
/// 実装はプロセス起動時に 1 度だけ構築され、読み取り専用で共有される。
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// メールを送信する
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError>;
}

fn parse_address(email: &Email) -> Result<Address, NotificationError> {
    email
        .as_str()
        .parse()
        .map_err(|e| NotificationError::InvalidAddress(format!("{}: {e}", email.as_str())))
}

fn mailbox(sender: &MailSender) -> Result<Mailbox, NotificationError> {
    Ok(Mailbox::new(
        Some(sender.display_name.clone()),
        parse_address(&sender.address)?,
    ))
}

/// 送信元を `From` ヘッダーの値としてエンコードする
///
/// 表示名は必要に応じて引用符付き文字列、または RFC 2047 の encoded-word になる。
/// 折り返しの CRLF は取り除いた 1 行で返す。
fn encoded_from(sender: &MailSender) -> Result<String, NotificationError> {
    let mut headers = Headers::new();
    headers.set(header::From::from(Mailboxes::from(mailbox(sender)?)));

    let rendered = headers.to_string();
    let value = rendered.strip_prefix("From: ").unwrap_or(&rendered);
    Ok(value.trim_end().replace("\r\n", ""))
}
