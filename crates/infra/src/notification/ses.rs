//! SES 通知送信実装
//!
//! AWS SES v2 API を使用してメールを送信する。

use async_trait::async_trait;
use aws_sdk_sesv2::{
    Client,
    types::{Body, Content, Destination, EmailContent, Message},
};
use rosterly_domain::notification::{EmailMessage, NotificationError};

use super::{NotificationSender, encoded_from};

/// SES 通知送信
///
/// `aws_sdk_sesv2::Client` をラップする。送信元アドレスは SES で検証済みであること。
pub struct SesNotificationSender {
    client: Client,
}

impl SesNotificationSender {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NotificationSender for SesNotificationSender {
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError> {
        let from = encoded_from(&email.from)?;
        let destination = Destination::builder()
            .to_addresses(email.to.as_str())
            .build();

        let subject = Content::builder()
            .data(&email.subject)
            .build()
            .map_err(|e| NotificationError::SendFailed(format!("件名構築失敗: {e}")))?;
        let text = Content::builder()
            .data(&email.text_body)
            .build()
            .map_err(|e| NotificationError::SendFailed(format!("テキスト本文構築失敗: {e}")))?;

        let content = EmailContent::builder()
            .simple(
                Message::builder()
                    .subject(subject)
                    .body(Body::builder().text(text).build())
                    .build(),
            )
            .build();

        self.client
            .send_email()
            .from_email_address(from)
            .destination(destination)
            .content(content)
            .send()
            .await
            .map_err(|e| NotificationError::SendFailed(format!("SES 送信失敗: {e}")))?;

        Ok(())
    }
}
