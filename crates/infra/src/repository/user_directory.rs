//! # UserDirectory
//!
//! ユーザーディレクトリ（`users` テーブル、PK = `uid`）の読み取りを担当する。
//!
//! ## 設計方針
//!
//! - **読み取り専用**: プロフィールの作成・更新はポータル側の責務
//! - **名前属性の揺れを吸収**: `firstName` を優先し、無ければ過去の `first_name` を読む
//! - **全件スキャン**: マネージャー一覧や全ユーザーへの配信はスキャンで取得する
//!   （1 事業所規模のユーザー数を前提とする）

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::{Client, types::AttributeValue};
use rosterly_domain::user::{UserId, UserProfile, UserRole};

use crate::{
    InfraError,
    dynamodb::{Item, get_s},
};

/// ユーザーディレクトリトレイト
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// ID でプロフィールを取得する
    async fn find_by_id(&self, uid: &UserId) -> Result<Option<UserProfile>, InfraError>;

    /// 指定した区分のユーザーを取得する
    async fn find_by_role(&self, role: UserRole) -> Result<Vec<UserProfile>, InfraError>;

    /// 全ユーザーを取得する
    async fn find_all(&self) -> Result<Vec<UserProfile>, InfraError>;
}

/// スキャン時のフィルタ式
struct ScanFilter {
    expression: &'static str,
    names:      HashMap<String, String>,
    values:     HashMap<String, AttributeValue>,
}

/// DynamoDB 実装の UserDirectory
pub struct DynamoDbUserDirectory {
    client:     Client,
    table_name: String,
}

impl DynamoDbUserDirectory {
    pub fn new(client: Client, table_name: String) -> Self {
        Self { client, table_name }
    }

    /// フィルタ付きでテーブル全体をスキャンする（ページネーション込み）
    async fn scan(&self, filter: Option<ScanFilter>) -> Result<Vec<UserProfile>, InfraError> {
        let mut profiles = Vec::new();
        let mut exclusive_start_key: Option<Item> = None;

        loop {
            let mut request = self
                .client
                .scan()
                .table_name(&self.table_name)
                .set_exclusive_start_key(exclusive_start_key.take());

            if let Some(filter) = &filter {
                request = request
                    .filter_expression(filter.expression)
                    .set_expression_attribute_names(Some(filter.names.clone()))
                    .set_expression_attribute_values(Some(filter.values.clone()));
            }

            let output = request
                .send()
                .await
                .map_err(|e| InfraError::dynamo_db(format!("ユーザーのスキャンに失敗: {e}")))?;

            for item in output.items() {
                profiles.push(item_to_profile(item)?);
            }

            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => exclusive_start_key = Some(key),
                _ => break,
            }
        }

        Ok(profiles)
    }
}

#[async_trait]
impl UserDirectory for DynamoDbUserDirectory {
    #[tracing::instrument(skip_all, level = "debug", fields(%uid))]
    async fn find_by_id(&self, uid: &UserId) -> Result<Option<UserProfile>, InfraError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("uid", AttributeValue::S(uid.to_string()))
            .send()
            .await
            .map_err(|e| InfraError::dynamo_db(format!("ユーザーの取得に失敗: {e}")))?;

        output.item.as_ref().map(item_to_profile).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%role))]
    async fn find_by_role(&self, role: UserRole) -> Result<Vec<UserProfile>, InfraError> {
        let mut names = HashMap::new();
        names.insert("#role".to_string(), "role".to_string());
        let mut values = HashMap::new();
        values.insert(":role".to_string(), AttributeValue::S(role.to_string()));

        self.scan(Some(ScanFilter {
            expression: "#role = :role",
            names,
            values,
        }))
        .await
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_all(&self) -> Result<Vec<UserProfile>, InfraError> {
        self.scan(None).await
    }
}

/// アイテムをプロフィールに変換する
fn item_to_profile(item: &Item) -> Result<UserProfile, InfraError> {
    let uid = get_s(item, "uid")
        .ok_or_else(|| InfraError::invalid_data("ユーザーに uid がありません"))?;
    // 空白のみの firstName は未設定として旧属性名を参照する
    let first_name = ["firstName", "first_name"]
        .into_iter()
        .filter_map(|key| get_s(item, key))
        .find(|name| !name.trim().is_empty());

    Ok(UserProfile::new(
        UserId::new(uid)?,
        get_s(item, "email").map(str::to_string),
        first_name.map(str::to_string),
        UserRole::from_stored(get_s(item, "role")),
    ))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn item(pairs: &[(&str, &str)]) -> Item {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), AttributeValue::S(v.to_string())))
            .collect()
    }

    #[test]
    fn test_first_nameが優先される() {
        let profile = item_to_profile(&item(&[
            ("uid", "U1"),
            ("email", "alex@example.com"),
            ("firstName", "Alex"),
            ("first_name", "Old"),
            ("role", "manager"),
        ]))
        .unwrap();

        assert_eq!(profile.uid().as_str(), "U1");
        assert_eq!(profile.email(), Some("alex@example.com"));
        assert_eq!(profile.first_name(), Some("Alex"));
        assert_eq!(profile.role(), UserRole::Manager);
    }

    #[test]
    fn test_旧属性名first_nameにフォールバックする() {
        let profile = item_to_profile(&item(&[("uid", "U1"), ("first_name", "Sam")])).unwrap();

        assert_eq!(profile.first_name(), Some("Sam"));
        assert_eq!(profile.email(), None);
        assert_eq!(profile.role(), UserRole::Employee);
    }

    #[rstest]
    #[case::空文字("")]
    #[case::空白のみ("   ")]
    fn test_空のfirst_nameは旧属性名first_nameで補われる(#[case] blank: &str) {
        let profile = item_to_profile(&item(&[
            ("uid", "U1"),
            ("firstName", blank),
            ("first_name", "Alex"),
        ]))
        .unwrap();

        assert_eq!(profile.first_name(), Some("Alex"));
    }

    #[test]
    fn test_どちらの名前も空ならfirst_nameはnone() {
        let profile = item_to_profile(&item(&[
            ("uid", "U1"),
            ("firstName", ""),
            ("first_name", " "),
        ]))
        .unwrap();

        assert_eq!(profile.first_name(), None);
    }

    #[test]
    fn test_uidがないアイテムはエラーになる() {
        assert!(item_to_profile(&item(&[("email", "alex@example.com")])).is_err());
    }
}
