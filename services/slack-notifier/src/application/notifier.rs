//! Slack通知処理
//!
//! 受信したイベントをJSON文字列化し、`{"text": ...}`形式のメッセージとして
//! Webhookに1回だけPOSTする。再試行は行わない。

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::infrastructure::{SlackWebhookConfig, WebhookError, WebhookTransport};

/// 通知処理のエラー型
///
/// いずれもローカルでは回復せず、Lambdaランタイムへそのまま伝播する。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifierError {
    /// イベントをJSONにシリアライズできない
    #[error("シリアライズエラー: {0}")]
    Serialization(String),

    /// Webhookへの送信に失敗
    #[error(transparent)]
    Network(#[from] WebhookError),

    /// レスポンスボディがUTF-8として不正
    #[error("レスポンスのデコードエラー: {0}")]
    ResponseDecode(String),
}

/// Slackに送信するメッセージ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackMessage {
    /// メッセージ本文（イベントのJSON文字列）
    pub text: String,
}

/// 通知結果
///
/// Webhookのレスポンスをそのまま写したもの。非2xxでもエラーにはしない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationResult {
    /// Webhookが返したHTTPステータスコード
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    /// Webhookが返したレスポンスボディ
    pub body: String,
}

/// イベントから送信ボディを組み立てる
///
/// `{"text": <eventのJSON文字列>}`をJSONバイト列にしたものを返す。
pub fn build_message_body<E>(event: &E) -> Result<Vec<u8>, NotifierError>
where
    E: Serialize + ?Sized,
{
    let text = serde_json::to_string(event).map_err(|e| {
        error!(error = %e, "イベントのシリアライズに失敗");
        NotifierError::Serialization(e.to_string())
    })?;

    serde_json::to_vec(&SlackMessage { text })
        .map_err(|e| NotifierError::Serialization(e.to_string()))
}

/// Slack通知ハンドラー
///
/// 設定と送信手段はコンストラクタで受け取り、invocation間で共有する。
pub struct Notifier<T: WebhookTransport> {
    config: SlackWebhookConfig,
    transport: T,
}

impl<T: WebhookTransport> std::fmt::Debug for Notifier<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<T: WebhookTransport> Notifier<T> {
    /// 新しいNotifierを作成
    pub fn new(config: SlackWebhookConfig, transport: T) -> Self {
        Self { config, transport }
    }

    /// イベントをWebhookに転送する
    ///
    /// # 処理フロー
    /// 1. イベントを`{"text": ...}`形式のJSONボディに変換
    /// 2. WebhookにPOST（1回のみ）
    /// 3. レスポンスボディをUTF-8としてデコード
    ///
    /// # 戻り値
    /// * `Ok(NotificationResult)` - Webhookのステータスとボディ（非2xxを含む）
    /// * `Err(NotifierError)` - シリアライズ、送信、デコードのいずれかに失敗
    #[instrument(skip_all)]
    pub async fn handle<E>(&self, event: &E) -> Result<NotificationResult, NotifierError>
    where
        E: Serialize + Sync + ?Sized,
    {
        let body = build_message_body(event)?;
        debug!(body_bytes = body.len(), "Slackメッセージを作成");

        let response = self
            .transport
            .post_json(self.config.webhook_url(), body)
            .await?;

        let status_code = response.status;
        let body = String::from_utf8(response.body).map_err(|e| {
            error!(status = status_code, error = %e, "レスポンスボディのデコードに失敗");
            NotifierError::ResponseDecode(e.to_string())
        })?;

        Ok(NotificationResult { status_code, body })
    }
}


#[cfg(test)]
mod tests {
    use super::mock::MockWebhookTransport;
    use super::*;
    use serde::Serializer;
    use serde_json::json;

    const WEBHOOK_URL: &str = "https://hooks.slack.com/services/T000/B000/XXXX";

    fn notifier(transport: MockWebhookTransport) -> Notifier<MockWebhookTransport> {
        Notifier::new(SlackWebhookConfig::new(WEBHOOK_URL).unwrap(), transport)
    }

    /// JSONにできない値（生のバイナリオブジェクト相当）
    struct RawBinary;

    impl Serialize for RawBinary {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("raw binary object is not JSON serializable"))
        }
    }

    // ==================== build_message_body テスト ====================

    #[test]
    fn test_build_message_body_wraps_serialized_event() {
        let body = build_message_body(&json!({"a": 1})).unwrap();

        assert_eq!(body, br#"{"text":"{\"a\":1}"}"#.to_vec());
    }

    #[test]
    fn test_build_message_body_keeps_arrival_key_order() {
        let event: serde_json::Value =
            serde_json::from_str(r#"{"source":"aws.cloudwatch","detail-type":"Alarm","account":"1"}"#).unwrap();

        let body = build_message_body(&event).unwrap();

        assert_eq!(
            String::from_utf8(body).unwrap(),
            r#"{"text":"{\"source\":\"aws.cloudwatch\",\"detail-type\":\"Alarm\",\"account\":\"1\"}"}"#
        );
    }

    #[test]
    fn test_build_message_body_matches_double_serialization() {
        let events = vec![
            json!({}),
            json!({"source": "aws.cloudwatch", "detail": {"state": "ALARM", "value": 3.5}}),
            json!({"message": "改行\nと\"引用符\"を含む"}),
            json!({"records": [1, null, true, "x"]}),
        ];

        for event in events {
            let expected =
                serde_json::to_vec(&json!({"text": serde_json::to_string(&event).unwrap()})).unwrap();
            assert_eq!(build_message_body(&event).unwrap(), expected);
        }
    }

    #[test]
    fn test_build_message_body_serialization_error() {
        let result = build_message_body(&RawBinary);

        match result {
            Err(NotifierError::Serialization(message)) => {
                assert!(message.contains("raw binary object"));
            }
            other => panic!("Expected Serialization error, got {:?}", other),
        }
    }

    #[test]
    fn test_notification_result_serialize() {
        let result = NotificationResult {
            status_code: 200,
            body: "ok".to_string(),
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json, json!({"statusCode": 200, "body": "ok"}));
    }

    #[test]
    fn test_notifier_error_display() {
        let error = NotifierError::Serialization("key must be a string".to_string());
        assert_eq!(error.to_string(), "シリアライズエラー: key must be a string");

        let error = NotifierError::from(WebhookError::Network("timed out".to_string()));
        assert_eq!(error.to_string(), "ネットワークエラー: timed out");
    }

    // ==================== Notifier::handle テスト ====================

    #[tokio::test]
    async fn test_handle_returns_webhook_success() {
        let notifier = notifier(MockWebhookTransport::responding(200, "ok"));

        let result = notifier.handle(&json!({"a": 1})).await.unwrap();

        assert_eq!(
            result,
            NotificationResult {
                status_code: 200,
                body: "ok".to_string()
            }
        );

        let requests = notifier.transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, WEBHOOK_URL);
        assert_eq!(requests[0].1, br#"{"text":"{\"a\":1}"}"#.to_vec());
    }

    #[tokio::test]
    async fn test_handle_passes_through_non_2xx() {
        let notifier = notifier(MockWebhookTransport::responding(500, "error"));

        let result = notifier.handle(&json!({"a": 1})).await.unwrap();

        assert_eq!(result.status_code, 500);
        assert_eq!(result.body, "error");
    }

    #[tokio::test]
    async fn test_handle_serialization_error_makes_no_request() {
        let notifier = notifier(MockWebhookTransport::responding(200, "ok"));

        let result = notifier.handle(&RawBinary).await;

        assert!(matches!(result, Err(NotifierError::Serialization(_))));
        assert!(notifier.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_handle_propagates_network_error() {
        let notifier = notifier(MockWebhookTransport::failing());

        let result = notifier.handle(&json!({"a": 1})).await;

        assert_eq!(
            result,
            Err(NotifierError::Network(WebhookError::Network(
                "mock connection refused".to_string()
            )))
        );
        assert_eq!(notifier.transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_handle_invalid_utf8_body() {
        let notifier = notifier(MockWebhookTransport::responding(200, vec![0xff, 0xfe]));

        let result = notifier.handle(&json!({"a": 1})).await;

        assert!(matches!(result, Err(NotifierError::ResponseDecode(_))));
    }

    #[tokio::test]
    async fn test_handle_twice_sends_independent_requests() {
        let notifier = notifier(MockWebhookTransport::responding(200, "ok"));

        notifier.handle(&json!({"first": 1})).await.unwrap();
        notifier.handle(&json!({"second": 2})).await.unwrap();

        let requests = notifier.transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].1, br#"{"text":"{\"first\":1}"}"#.to_vec());
        assert_eq!(requests[1].1, br#"{"text":"{\"second\":2}"}"#.to_vec());
    }
}
