//! SMTP 通知送信実装
//!
//! lettre の `AsyncSmtpTransport` を使用してメールを送信する。
//! 開発環境では Mailpit（ローカル SMTP サーバー）、本番ではメールリレーに接続する。
//!
//! 認証情報はデプロイ先のシークレット管理から環境変数として注入される。

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport,
    AsyncTransport,
    Tokio1Executor,
    message::{Mailbox, Message, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use rosterly_domain::notification::{EmailMessage, NotificationError};

use super::{NotificationSender, mailbox, parse_address};

/// SMTP 接続のセキュリティ方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SmtpTls {
    /// 平文（Mailpit 等のローカル SMTP 向け）
    #[default]
    None,
    /// STARTTLS で昇格
    StartTls,
    /// 接続時から TLS（SMTPS）
    Tls,
}

/// SMTP 通知送信
///
/// `lettre::AsyncSmtpTransport<Tokio1Executor>` をラップする。
pub struct SmtpNotificationSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpNotificationSender {
    /// 新しい SMTP 送信インスタンスを作成
    ///
    /// # 引数
    ///
    /// - `host`: SMTP サーバーのホスト名（例: "localhost"）
    /// - `port`: SMTP サーバーのポート番号（例: 1025 for Mailpit）
    /// - `tls`: 接続のセキュリティ方式
    /// - `credentials`: ユーザー名とパスワード（リレーが認証を要求する場合）
    pub fn new(
        host: &str,
        port: u16,
        tls: SmtpTls,
        credentials: Option<(String, String)>,
    ) -> Result<Self, NotificationError> {
        let builder = match tls {
            SmtpTls::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host),
            SmtpTls::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| NotificationError::SendFailed(format!("STARTTLS 設定失敗: {e}")))?,
            SmtpTls::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .map_err(|e| NotificationError::SendFailed(format!("TLS 設定失敗: {e}")))?,
        };

        let builder = builder.port(port);
        let builder = match credentials {
            Some((username, password)) => builder.credentials(Credentials::new(username, password)),
            None => builder,
        };

        Ok(Self {
            transport: builder.build(),
        })
    }
}

/// プレーンテキストのみのメッセージを構築する
pub(crate) fn build_message(email: &EmailMessage) -> Result<Message, NotificationError> {
    Message::builder()
        .from(mailbox(&email.from)?)
        .to(Mailbox::new(None, parse_address(&email.to)?))
        .subject(&email.subject)
        .header(ContentType::TEXT_PLAIN)
        .body(email.text_body.clone())
        .map_err(|e| NotificationError::SendFailed(format!("メッセージ構築失敗: {e}")))
}

#[async_trait]
impl NotificationSender for SmtpNotificationSender {
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError> {
        let message = build_message(email)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| NotificationError::SendFailed(format!("SMTP 送信失敗: {e}")))?;

        Ok(())
    }
}
