use lambda_runtime::{Error, LambdaEvent};
use serde_json::Value;
use tracing::{info, info_span, warn, Instrument};

use crate::application::{NotificationResult, Notifier};
use crate::infrastructure::WebhookTransport;

// Application layer modules
pub mod application;

// Infrastructure layer modules
pub mod infrastructure;

/// Lambda関数のメインハンドラー
///
/// # 処理フロー
/// 1. invocationのrequest_idをspanに記録
/// 2. Notifierでイベントを転送
/// 3. Webhookのステータスとボディを`{"statusCode", "body"}`として返却
///
/// エラーは変換せずランタイムへ返す（ログとアラートはランタイム側の責務）。
pub async fn handler<T: WebhookTransport>(
    notifier: &Notifier<T>,
    event: LambdaEvent<Value>,
) -> Result<NotificationResult, Error> {
    let (payload, context) = event.into_parts();
    let span = info_span!("invocation", request_id = %context.request_id);

    async move {
        info!("イベントを受信");

        let result = notifier.handle(&payload).await?;

        if (200..300).contains(&result.status_code) {
            info!(status = result.status_code, "Slack通知完了");
        } else {
            // ボディはプロキシのHTMLエラーページ等の可能性があるため長さのみ記録
            warn!(
                status = result.status_code,
                body_bytes = result.body.len(),
                "Webhookが非2xxを返却"
            );
        }

        Ok::<_, Error>(result)
    }
    .instrument(span)
    .await
}
