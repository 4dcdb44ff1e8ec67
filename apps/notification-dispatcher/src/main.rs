//! # 通知ディスパッチャー サーバー
//!
//! 通知レコードの作成イベントを受け取り、メールを送信して
//! 配信ステータスを書き戻す内部サービス。
//!
//! ## 役割
//!
//! - **トリガー受信**: ドキュメントストアの作成イベントを HTTP push で受け取る
//! - **メール送信**: テンプレートをレンダリングし、SMTP / SES で送信
//! - **ステータス書き戻し**: `sent` / `failed` を通知レコードに記録
//! - **通知作成**: ポータルの各機能からの呼び出しで通知レコードを作成（プロデューサー API）
//!
//! ```text
//! ┌──────────────┐  作成イベント  ┌──────────────────┐   送信   ┌──────────────┐
//! │ ドキュメント │───────────────→│ Notification     │─────────→│ SMTP / SES   │
//! │ ストア       │←───────────────│ Dispatcher       │          └──────────────┘
//! └──────────────┘  ステータス    └──────────────────┘
//! ```
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `DISPATCHER_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `DISPATCHER_PORT` | **Yes** | ポート番号 |
//! | `DYNAMODB_ENDPOINT` | No | DynamoDB Local の URL |
//! | `DYNAMODB_ENSURE_TABLES` | No | 起動時にテーブルを作成する（デフォルト: `false`） |
//! | `NOTIFICATIONS_TABLE` / `USERS_TABLE` / `EMAIL_TEMPLATES_TABLE` | No | テーブル名 |
//! | `DISPATCH_TIMEOUT_SECS` | No | 1 回のディスパッチの制限時間（デフォルト: `60`） |
//! | `NOTIFICATION_BACKEND` | No | `smtp` / `ses` / `noop`（デフォルト: `noop`） |
//! | `SMTP_HOST` / `SMTP_PORT` / `SMTP_TLS` | No | SMTP 接続先 |
//! | `SMTP_USERNAME` / `SMTP_PASSWORD` | No | SMTP 認証情報 |
//! | `NOTIFICATION_FROM_NAME` / `NOTIFICATION_FROM_ADDRESS` | No | 送信元 |
//! | `NOTIFICATION_BASE_URL` | No | メール内リンクのベース URL |
//!
//! ## 起動方法
//!
//! ```bash
//! # 開発環境（DynamoDB Local + Mailpit）
//! DISPATCHER_PORT=3100 DYNAMODB_ENDPOINT=http://localhost:8000 DYNAMODB_ENSURE_TABLES=true \
//!   NOTIFICATION_BACKEND=smtp cargo run -p rosterly-notification-dispatcher
//! ```

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context as _;
use axum::{
    Router,
    routing::{get, post},
};
use rosterly_domain::{
    clock::{Clock, SystemClock},
    notification::MailSender,
    user::Email,
};
use rosterly_infra::{
    dynamodb::{self, TableSpec},
    notification::{
        NoopNotificationSender,
        NotificationSender,
        SesNotificationSender,
        SmtpNotificationSender,
    },
    repository::{
        DynamoDbEmailTemplateRepository,
        DynamoDbNotificationRepository,
        DynamoDbUserDirectory,
        EmailTemplateRepository,
        NotificationRepository,
        UserDirectory,
    },
};
use rosterly_notification_dispatcher::{
    config::{DispatcherConfig, NotificationBackend, NotificationConfig},
    handler::{
        PublishState,
        ReadinessState,
        TriggerState,
        handle_notification_created,
        health_check,
        publish_account_approved,
        publish_announcement_posted,
        publish_new_message,
        publish_new_user_pending_approval,
        publish_schedule_uploaded,
        publish_time_off_reviewed,
        readiness_check,
    },
    usecase::{DispatchSettings, NotificationDispatcher, NotificationPublisher},
};
use rosterly_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

/// 通知ディスパッチャーのエントリーポイント
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    // トレーシング初期化
    let _tracing_guard =
        init_tracing(TracingConfig::from_env("notification-dispatcher")).entered();

    // 設定読み込み
    let config = DispatcherConfig::from_env().context("設定の読み込みに失敗しました")?;

    tracing::info!(
        "通知ディスパッチャーを起動します: {}:{}",
        config.host,
        config.port
    );

    // DynamoDB クライアントを作成
    let dynamodb_client = dynamodb::create_client(config.dynamodb_endpoint.as_deref()).await;
    if config.ensure_tables {
        dynamodb::ensure_tables(&dynamodb_client, &[
            TableSpec {
                table_name:    &config.tables.notifications,
                partition_key: "id",
            },
            TableSpec {
                table_name:    &config.tables.users,
                partition_key: "uid",
            },
            TableSpec {
                table_name:    &config.tables.email_templates,
                partition_key: "id",
            },
        ])
        .await
        .context("テーブルの作成に失敗しました")?;
        tracing::info!("DynamoDB テーブルを確認しました");
    }

    // Readiness Check 用 State
    let readiness_state = Arc::new(ReadinessState {
        dynamodb: dynamodb_client.clone(),
    });

    // 依存コンポーネントを初期化
    let sender = build_notification_sender(&config.notification).await?;
    let settings = DispatchSettings {
        base_url: config.notification.base_url.clone(),
        from:     MailSender {
            display_name: config.notification.from_name.clone(),
            address:      Email::new(&config.notification.from_address)
                .context("NOTIFICATION_FROM_ADDRESS が不正です")?,
        },
    };
    let notification_repo: Arc<dyn NotificationRepository> = Arc::new(
        DynamoDbNotificationRepository::new(
            dynamodb_client.clone(),
            config.tables.notifications.clone(),
        ),
    );
    let user_directory: Arc<dyn UserDirectory> = Arc::new(DynamoDbUserDirectory::new(
        dynamodb_client.clone(),
        config.tables.users.clone(),
    ));
    let template_repo: Arc<dyn EmailTemplateRepository> =
        Arc::new(DynamoDbEmailTemplateRepository::new(
            dynamodb_client,
            config.tables.email_templates.clone(),
        ));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let dispatcher = NotificationDispatcher::new(
        sender,
        notification_repo.clone(),
        user_directory.clone(),
        template_repo,
        clock.clone(),
        settings,
    );
    let publish_state = Arc::new(PublishState {
        publisher: NotificationPublisher::new(notification_repo, user_directory, clock),
    });
    let trigger_state = Arc::new(TriggerState {
        dispatcher,
        timeout: config.dispatch_timeout,
    });

    // ルーター構築
    let app = Router::new()
        .route("/health", get(health_check))
        .merge(
            Router::new()
                .route("/health/ready", get(readiness_check))
                .with_state(readiness_state),
        )
        .route(
            "/internal/triggers/notifications",
            post(handle_notification_created),
        )
        .with_state(trigger_state)
        .merge(
            Router::new()
                .route(
                    "/internal/notifications/new-message",
                    post(publish_new_message),
                )
                .route(
                    "/internal/notifications/schedule-uploaded",
                    post(publish_schedule_uploaded),
                )
                .route(
                    "/internal/notifications/new-user-pending-approval",
                    post(publish_new_user_pending_approval),
                )
                .route(
                    "/internal/notifications/account-approved",
                    post(publish_account_approved),
                )
                .route(
                    "/internal/notifications/time-off-reviewed",
                    post(publish_time_off_reviewed),
                )
                .route(
                    "/internal/notifications/announcement-posted",
                    post(publish_announcement_posted),
                )
                .with_state(publish_state),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("アドレスのパースに失敗しました")?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("通知ディスパッチャーが起動しました: {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// 設定に応じたメール送信の実装を構築する
async fn build_notification_sender(
    config: &NotificationConfig,
) -> anyhow::Result<Arc<dyn NotificationSender>> {
    let sender: Arc<dyn NotificationSender> = match config.backend {
        NotificationBackend::Smtp => {
            tracing::info!(
                "SMTP でメールを送信します: {}:{} (tls={})",
                config.smtp_host,
                config.smtp_port,
                config.smtp_tls
            );
            Arc::new(
                SmtpNotificationSender::new(
                    &config.smtp_host,
                    config.smtp_port,
                    config.smtp_tls,
                    config.smtp_credentials.clone(),
                )
                .context("SMTP トランスポートの構築に失敗しました")?,
            )
        }
        NotificationBackend::Ses => {
            tracing::info!("Amazon SES でメールを送信します");
            let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
            Arc::new(SesNotificationSender::new(aws_sdk_sesv2::Client::new(
                &aws_config,
            )))
        }
        NotificationBackend::Noop => {
            tracing::info!("メールを送信しません（noop）");
            Arc::new(NoopNotificationSender)
        }
    };
    Ok(sender)
}
