/// Slack通知Lambda関数
///
/// 受信したイベントをそのままJSON文字列化し、Slack Incoming Webhookへ転送する。
/// Webhook URLはコールドスタート時に一度だけ環境変数から読み込み、
/// 読み込めない場合はinvocationを受け付ける前に終了する。
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use slack_notifier::application::Notifier;
use slack_notifier::infrastructure::{init_logging, ReqwestWebhookTransport, SlackWebhookConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // 構造化ログを初期化
    init_logging();

    // 設定を環境変数から読み込み（失敗時は起動しない）
    let config = match SlackWebhookConfig::from_env() {
        Ok(config) => {
            info!(config = ?config, "Slack Webhook設定を読み込み");
            config
        }
        Err(err) => {
            error!(error = %err, "Slack Webhook設定読み込み失敗");
            return Err(err.into());
        }
    };

    // HTTPクライアント（コネクションプール）はinvocation間で共有する
    let notifier = Notifier::new(config, ReqwestWebhookTransport::new());
    let notifier = &notifier;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        slack_notifier::handler(notifier, event).await
    }))
    .await
}
