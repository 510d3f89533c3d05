//! Webhook送信モジュール
//!
//! Slack Incoming WebhookへのHTTP POSTを抽象化する。
//! - `WebhookTransport`: テスト用にモック差し替え可能な送信トレイト
//! - `ReqwestWebhookTransport`: reqwestによる実装（コネクションプールを保持）

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::error::Error as _;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// JSONボディのContent-Type
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Webhook送信のエラー型
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WebhookError {
    /// ネットワークエラー（接続失敗、タイムアウト、TLSエラー、レスポンス読み込み失敗）
    #[error("ネットワークエラー: {0}")]
    Network(String),
}

/// Webhookからのレスポンス
///
/// ステータスコードに関わらずそのまま保持する（非2xxもエラーにしない）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookResponse {
    /// HTTPステータスコード
    pub status: u16,
    /// レスポンスボディ（未デコード）
    pub body: Vec<u8>,
}

/// Webhook送信トレイト
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    /// JSONボディをPOSTする
    ///
    /// # 引数
    /// * `url` - 送信先Webhook URL
    /// * `body` - シリアライズ済みJSONボディ
    ///
    /// # 戻り値
    /// * `Ok(WebhookResponse)` - レスポンスを受信できた（ステータスコードは問わない）
    /// * `Err(WebhookError)` - レスポンスを受信できなかった
    async fn post_json(&self, url: &Url, body: Vec<u8>) -> Result<WebhookResponse, WebhookError>;
}

/// reqwestを使用したWebhook送信実装
///
/// `Client`は内部にコネクションプールを持つため、
/// Lambdaの複数invocation間で同じインスタンスを使い回す。
/// タイムアウトはreqwestのデフォルトのまま変更しない。
#[derive(Debug, Clone, Default)]
pub struct ReqwestWebhookTransport {
    client: Client,
}

impl ReqwestWebhookTransport {
    /// デフォルト設定のクライアントで作成
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WebhookTransport for ReqwestWebhookTransport {
    async fn post_json(&self, url: &Url, body: Vec<u8>) -> Result<WebhookResponse, WebhookError> {
        debug!(body_bytes = body.len(), "Webhookリクエスト送信");

        let response = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                let message = describe_error(e);
                warn!(error = %message, "Webhookリクエスト失敗");
                WebhookError::Network(message)
            })?;

        let status = response.status().as_u16();

        let body = response.bytes().await.map_err(|e| {
            let message = describe_error(e);
            warn!(status = status, error = %message, "Webhookレスポンス読み込み失敗");
            WebhookError::Network(message)
        })?;

        debug!(status = status, body_bytes = body.len(), "Webhookレスポンス受信");

        Ok(WebhookResponse {
            status,
            body: body.to_vec(),
        })
    }
}

/// reqwestのエラーを原因チェーン込みの文字列にする
///
/// Webhook URLは秘密情報のため、エラーメッセージからは除去する。
fn describe_error(err: reqwest::Error) -> String {
    let err = err.without_url();
    let mut message = err.to_string();

    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    message
}
