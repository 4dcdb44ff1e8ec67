//! # DynamoDB 接続管理
//!
//! ドキュメントストア（Amazon DynamoDB）への接続管理を行う。
//!
//! ## 設計方針
//!
//! - **ローカル開発**: DynamoDB Local を使用（`-sharedDb -inMemory`）
//! - **本番環境**: 既定の認証情報チェーン（IAM ロール等）で Amazon DynamoDB に接続
//! - **テーブル自動作成**: 起動時にテーブルが存在しなければ作成（冪等）
//! - **JSON ブリッジ**: ドキュメントはドメイン層で JSON として検証するため、
//!   `AttributeValue` と `serde_json::Value` を相互変換する
//!
//! ## テーブル
//!
//! | テーブル | パーティションキー | 用途 |
//! |---------|------------------|------|
//! | `notifications` | `id` | 通知レコード |
//! | `users` | `uid` | ユーザーディレクトリ |
//! | `email_templates` | `id` | 通知種別ごとのメールテンプレート |
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use rosterly_infra::dynamodb;
//!
//! async fn setup() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = dynamodb::create_client(Some("http://localhost:18000")).await;
//!     dynamodb::ensure_table(&client, "notifications", "id").await?;
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;

use aws_sdk_dynamodb::{
    Client,
    types::{
        AttributeDefinition,
        AttributeValue,
        BillingMode,
        KeySchemaElement,
        KeyType,
        ScalarAttributeType,
    },
};
use serde_json::{Map, Number, Value};

use crate::InfraError;

/// DynamoDB のアイテム表現
pub type Item = HashMap<String, AttributeValue>;

/// 作成対象テーブルの定義
#[derive(Debug, Clone, Copy)]
pub struct TableSpec<'a> {
    pub table_name:    &'a str,
    pub partition_key: &'a str,
}

/// DynamoDB クライアントを作成する
///
/// `endpoint` が指定された場合は DynamoDB Local 用のクライアントを作成する。
/// 認証情報はダミー値を使用する（DynamoDB Local の `-sharedDb` モードでは検証されない）。
///
/// `endpoint` が `None` の場合は既定の認証情報チェーンとリージョン設定を使う。
pub async fn create_client(endpoint: Option<&str>) -> Client {
    let config = match endpoint {
        Some(endpoint) => {
            aws_config::defaults(aws_config::BehaviorVersion::latest())
                .endpoint_url(endpoint)
                .region(aws_config::Region::new("ap-northeast-1"))
                // DynamoDB Local はクレデンシャルを検証しないが、SDK はプロバイダが必要
                .credentials_provider(aws_sdk_dynamodb::config::Credentials::new(
                    "local", "local", None, None, "local",
                ))
                .load()
                .await
        }
        None => aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await,
    };

    Client::new(&config)
}

/// テーブルが存在しなければ作成する（冪等）
///
/// パーティションキーのみ（String 型）のテーブルを PAY_PER_REQUEST で作成する。
pub async fn ensure_table(
    client: &Client,
    table_name: &str,
    partition_key: &str,
) -> Result<(), InfraError> {
    match client.describe_table().table_name(table_name).send().await {
        Ok(_) => {
            tracing::debug!("テーブル '{}' は既に存在します", table_name);
            return Ok(());
        }
        Err(err) => {
            // ResourceNotFoundException の場合のみテーブル作成に進む
            let not_found = err
                .as_service_error()
                .map(|e| e.is_resource_not_found_exception())
                .unwrap_or(false);
            if !not_found {
                return Err(InfraError::dynamo_db(format!(
                    "テーブル '{table_name}' の確認に失敗: {err}"
                )));
            }
        }
    }

    tracing::info!("テーブル '{}' を作成します", table_name);

    let create_result = client
        .create_table()
        .table_name(table_name)
        .key_schema(
            KeySchemaElement::builder()
                .attribute_name(partition_key)
                .key_type(KeyType::Hash)
                .build()
                .map_err(|e| InfraError::dynamo_db(format!("KeySchema 構築エラー: {e}")))?,
        )
        .attribute_definitions(
            AttributeDefinition::builder()
                .attribute_name(partition_key)
                .attribute_type(ScalarAttributeType::S)
                .build()
                .map_err(|e| {
                    InfraError::dynamo_db(format!("AttributeDefinition 構築エラー: {e}"))
                })?,
        )
        .billing_mode(BillingMode::PayPerRequest)
        .send()
        .await;

    if let Err(err) = create_result {
        // ResourceInUseException は並行起動時に発生しうる（テーブルが作成中）
        let is_resource_in_use = err
            .as_service_error()
            .map(|e| e.is_resource_in_use_exception())
            .unwrap_or(false);
        if !is_resource_in_use {
            return Err(InfraError::dynamo_db(format!(
                "テーブル '{table_name}' の作成に失敗: {err}"
            )));
        }
        tracing::debug!(
            "テーブル '{}' は既に作成中または存在します（ResourceInUseException）",
            table_name
        );
        return Ok(());
    }

    tracing::info!("テーブル '{}' を作成しました", table_name);

    Ok(())
}

/// 複数のテーブルを順に作成する（冪等）
pub async fn ensure_tables(client: &Client, tables: &[TableSpec<'_>]) -> Result<(), InfraError> {
    for table in tables {
        ensure_table(client, table.table_name, table.partition_key).await?;
    }
    Ok(())
}

/// 接続確認（readiness チェック用）
pub async fn check_connection(client: &Client) -> Result<(), InfraError> {
    client
        .list_tables()
        .limit(1)
        .send()
        .await
        .map_err(|e| InfraError::dynamo_db(format!("DynamoDB への接続に失敗: {e}")))?;
    Ok(())
}

// ===== AttributeValue ⇔ JSON 変換 =====

/// JSON オブジェクトを DynamoDB アイテムに変換する
///
/// トップレベルがオブジェクトでない場合はエラー。
pub fn json_to_item(value: &Value) -> Result<Item, InfraError> {
    let Value::Object(map) = value else {
        return Err(InfraError::invalid_data(
            "DynamoDB アイテムは JSON オブジェクトである必要があります",
        ));
    };

    Ok(map
        .iter()
        .map(|(key, value)| (key.clone(), json_to_attribute(value)))
        .collect())
}

/// JSON 値を AttributeValue に変換する
pub fn json_to_attribute(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(values) => AttributeValue::L(values.iter().map(json_to_attribute).collect()),
        Value::Object(map) => AttributeValue::M(
            map.iter()
                .map(|(k, v)| (k.clone(), json_to_attribute(v)))
                .collect(),
        ),
    }
}

/// DynamoDB アイテムを JSON オブジェクトに変換する
pub fn item_to_json(item: &Item) -> Result<Value, InfraError> {
    let mut map = Map::with_capacity(item.len());
    for (key, value) in item {
        map.insert(key.clone(), attribute_to_json(value)?);
    }
    Ok(Value::Object(map))
}

/// AttributeValue を JSON 値に変換する
///
/// 数値は整数として解釈できればそのまま、できなければ浮動小数点として扱う。
/// セット型はリストとして表現する。バイナリは扱わない。
pub fn attribute_to_json(value: &AttributeValue) -> Result<Value, InfraError> {
    let json = match value {
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => parse_number(n)?,
        AttributeValue::L(values) => Value::Array(
            values
                .iter()
                .map(attribute_to_json)
                .collect::<Result<_, _>>()?,
        ),
        AttributeValue::M(map) => {
            let mut object = Map::with_capacity(map.len());
            for (k, v) in map {
                object.insert(k.clone(), attribute_to_json(v)?);
            }
            Value::Object(object)
        }
        AttributeValue::Ss(values) => {
            Value::Array(values.iter().cloned().map(Value::String).collect())
        }
        AttributeValue::Ns(values) => Value::Array(
            values
                .iter()
                .map(String::as_str)
                .map(parse_number)
                .collect::<Result<_, _>>()?,
        ),
        AttributeValue::B(_) | AttributeValue::Bs(_) => {
            return Err(InfraError::invalid_data(
                "バイナリ属性は JSON に変換できません",
            ));
        }
        _ => {
            return Err(InfraError::invalid_data(
                "未対応の AttributeValue 型です",
            ));
        }
    };
    Ok(json)
}

fn parse_number(raw: &str) -> Result<Value, InfraError> {
    if let Ok(i) = raw.parse::<i64>() {
        return Ok(Value::Number(i.into()));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| InfraError::invalid_data(format!("数値属性を解釈できません: {raw}")))
}

/// アイテムから String 属性を取得する
pub(crate) fn get_s<'a>(item: &'a Item, key: &str) -> Option<&'a str> {
    item.get(key).and_then(|v| v.as_s().ok()).map(String::as_str)
}

#[cfg(test)]
mod tests {
    use aws_sdk_dynamodb::primitives::Blob;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_json_to_itemはネストした値を変換する() {
        let value = json!({
            "id": "N1",
            "count": 3,
            "active": true,
            "link": null,
            "contextData": { "senderId": "U2" },
            "tags": ["a", "b"]
        });

        let item = json_to_item(&value).unwrap();

        assert_eq!(item.get("id"), Some(&AttributeValue::S("N1".to_string())));
        assert_eq!(item.get("count"), Some(&AttributeValue::N("3".to_string())));
        assert_eq!(item.get("active"), Some(&AttributeValue::Bool(true)));
        assert_eq!(item.get("link"), Some(&AttributeValue::Null(true)));
        let Some(AttributeValue::M(context)) = item.get("contextData") else {
            panic!("contextData は M 型であること");
        };
        assert_eq!(
            context.get("senderId"),
            Some(&AttributeValue::S("U2".to_string()))
        );
        assert_eq!(
            item.get("tags"),
            Some(&AttributeValue::L(vec![
                AttributeValue::S("a".to_string()),
                AttributeValue::S("b".to_string()),
            ]))
        );
    }

    #[test]
    fn test_json_to_itemはオブジェクト以外を拒否する() {
        assert!(json_to_item(&json!(["N1"])).is_err());
        assert!(json_to_item(&json!("N1")).is_err());
    }

    #[test]
    fn test_item_to_jsonは数値を整数と小数で区別する() {
        let mut item = Item::new();
        item.insert(
            "createdAt".to_string(),
            AttributeValue::N("1735689600000".to_string()),
        );
        item.insert("ratio".to_string(), AttributeValue::N("0.5".to_string()));

        let value = item_to_json(&item).unwrap();

        assert_eq!(value, json!({ "createdAt": 1_735_689_600_000_i64, "ratio": 0.5 }));
    }

    #[test]
    fn test_item_to_jsonは文字列セットを配列にする() {
        let mut item = Item::new();
        item.insert(
            "roles".to_string(),
            AttributeValue::Ss(vec!["manager".to_string()]),
        );

        let value = item_to_json(&item).unwrap();

        assert_eq!(value, json!({ "roles": ["manager"] }));
    }

    #[test]
    fn test_item_to_jsonはバイナリ属性を拒否する() {
        let mut item = Item::new();
        item.insert(
            "raw".to_string(),
            AttributeValue::B(Blob::new(vec![0u8, 1u8])),
        );

        assert!(item_to_json(&item).is_err());
    }

    #[test]
    fn test_不正な数値属性はエラーになる() {
        assert!(attribute_to_json(&AttributeValue::N("abc".to_string())).is_err());
    }

    #[test]
    fn test_get_sは文字列属性のみ返す() {
        let mut item = Item::new();
        item.insert("uid".to_string(), AttributeValue::S("U1".to_string()));
        item.insert("age".to_string(), AttributeValue::N("30".to_string()));

        assert_eq!(get_s(&item, "uid"), Some("U1"));
        assert_eq!(get_s(&item, "age"), None);
        assert_eq!(get_s(&item, "missing"), None);
    }
}
