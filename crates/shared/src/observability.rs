//! # Observability 基盤
//!
//! 通知ディスパッチャーのトレーシング初期化を提供する。
//!
//! ## 設計方針
//!
//! - **出力形式**: `LOG_FORMAT=json` でログ基盤向けの 1 行 JSON、
//!   それ以外はローカル開発向けの Pretty 出力
//! - **不正な設定値**: 起動を止めず Pretty で動かし、subscriber の初期化後に警告を出す
//! - **SpanTrace**: `ErrorLayer` を登録し、`InfraError` に呼び出し経路を残す
//!
//! ## JSON 出力例
//!
//! ```json
//! {"timestamp":"...","level":"INFO","event.action":"notification.sent","span":{"service":"notification-dispatcher"}}
//! ```

/// ログ出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 1 行 JSON（ログ基盤への転送用）
    Json,
    /// 人間が読みやすい形式
    #[default]
    Pretty,
}

impl LogFormat {
    /// `LOG_FORMAT` の値を解釈する（大文字小文字・前後の空白は無視）
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pretty" => Some(Self::Pretty),
            _ => None,
        }
    }
}

/// トレーシング初期化設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// サービス名（ルートスパンの `service` フィールド）
    pub service_name:       String,
    pub log_format:         LogFormat,
    /// 解釈できなかった `LOG_FORMAT` の値（初期化後に警告する）
    pub unknown_log_format: Option<String>,
}

impl TracingConfig {
    pub fn new(service_name: impl Into<String>, log_format: LogFormat) -> Self {
        Self {
            service_name: service_name.into(),
            log_format,
            unknown_log_format: None,
        }
    }

    /// 環境変数から設定を読み取る
    pub fn from_env(service_name: impl Into<String>) -> Self {
        Self::from_lookup(service_name, |key| std::env::var(key).ok())
    }

    /// 任意の参照関数から設定を読み取る
    pub fn from_lookup(
        service_name: impl Into<String>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let mut config = Self::new(service_name, LogFormat::default());
        if let Some(value) = lookup("LOG_FORMAT") {
            match LogFormat::parse(&value) {
                Some(format) => config.log_format = format,
                None => config.unknown_log_format = Some(value),
            }
        }
        config
    }
}

/// トレーシングを初期化し、サービス名付きのルートスパンを返す
///
/// フィルタは `RUST_LOG`、未設定なら `info,rosterly=debug`。
/// 呼び出し元は戻り値のスパンを `entered()` で保持する。
#[cfg(feature = "observability")]
pub fn init_tracing(config: TracingConfig) -> tracing::Span {
    use tracing_subscriber::{Layer as _, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,rosterly=debug".into());

    let fmt_layer = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(tracing_error::ErrorLayer::default())
        .init();

    if let Some(value) = &config.unknown_log_format {
        tracing::warn!(log_format = %value, "不明な LOG_FORMAT のため pretty で出力します");
    }

    tracing::info_span!("app", service = %config.service_name)
}
