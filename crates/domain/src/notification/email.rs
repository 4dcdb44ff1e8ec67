//! # メールメッセージ
//!
//! テンプレートレンダリングの出力。メール送信トレイトに渡される。
//! 本文はプレーンテキストのみ（HTML・添付ファイルなし）。

use crate::user::Email;

/// 送信元（表示名 + アドレス）
///
/// デプロイごとに固定され、リクエストごとには変わらない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailSender {
    pub display_name: String,
    pub address:      Email,
}

/// メールメッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// 送信元
    pub from:      MailSender,
    /// 送信先メールアドレス
    pub to:        Email,
    /// 件名
    pub subject:   String,
    /// プレーンテキスト本文
    pub text_body: String,
}
