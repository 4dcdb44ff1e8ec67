//! # テンプレートレンダラー
//!
//! メールテンプレートの `{token_name}` プレースホルダーを置換し、
//! 件名と本文を生成する。
//!
//! ## 置換規則
//!
//! | トークン | 件名 | 本文 | 値 |
//! |---------|------|------|-----|
//! | `{sender_first_name}` | ○ | ○ | 送信者の名。送信者なし・名なしは `"Someone"` |
//! | `{recipient_first_name}` | - | ○ | 受信者の名。名なしは `"User"` |
//! | `{messages_link}` | - | ○ | ベース URL + レコードの `link` |
//!
//! - 置換はすべての出現箇所に対して行う
//! - 置換は 1 パスで行い、置換後の値に含まれる `{...}` は再解釈しない
//! - 未知のトークンはそのまま残す

use rosterly_domain::{notification::EmailTemplate, user::UserProfile};

/// 送信者の名が得られないときの既定値
pub const DEFAULT_SENDER_NAME: &str = "Someone";
/// 受信者の名が得られないときの既定値
pub const DEFAULT_RECIPIENT_NAME: &str = "User";

/// レンダリング結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub body:    String,
}

/// テンプレートレンダラー
///
/// ポータルのベース URL はデプロイごとに固定のため、構築時に受け取る。
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    base_url: String,
}

impl TemplateRenderer {
    /// 新しいレンダラーを作成する
    ///
    /// 末尾の `/` は取り除く（`link` は `/` で始まる）。
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// テンプレートをレンダリングする
    pub fn render(
        &self,
        template: &EmailTemplate,
        recipient: &UserProfile,
        sender: Option<&UserProfile>,
        link: Option<&str>,
    ) -> RenderedEmail {
        let sender_first_name = sender
            .and_then(UserProfile::first_name)
            .unwrap_or(DEFAULT_SENDER_NAME);
        let recipient_first_name = recipient.first_name().unwrap_or(DEFAULT_RECIPIENT_NAME);
        let messages_link = self.messages_link(link);

        let subject = substitute(template.subject(), &[(
            "sender_first_name",
            sender_first_name,
        )]);
        let body = substitute(template.body(), &[
            ("recipient_first_name", recipient_first_name),
            ("sender_first_name", sender_first_name),
            ("messages_link", &messages_link),
        ]);

        RenderedEmail { subject, body }
    }

    /// `{messages_link}` の値（ベース URL と `link` の単純な連結）
    pub fn messages_link(&self, link: Option<&str>) -> String {
        format!("{}{}", self.base_url, link.unwrap_or_default())
    }
}

/// `{name}` 形式のトークンを 1 パスで置換する
fn substitute(text: &str, values: &[(&str, &str)]) -> String {
    let mut output = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('{') {
        output.push_str(&rest[..start]);
        let candidate = &rest[start + 1..];

        let replaced = candidate.find('}').and_then(|end| {
            let name = &candidate[..end];
            values
                .iter()
                .find(|(token, _)| *token == name)
                .map(|(_, value)| (*value, end))
        });

        match replaced {
            Some((value, end)) => {
                output.push_str(value);
                rest = &candidate[end + 1..];
            }
            None => {
                output.push('{');
                rest = candidate;
            }
        }
    }

    output.push_str(rest);
    output
}
