/// Slack Webhook設定
///
/// 通知先のSlack Incoming Webhook URLを環境変数から読み込む。
/// Lambdaのコールドスタート時に一度だけ読み込み、以降は使い回す。
use std::env::VarError;

use thiserror::Error;
use url::Url;

/// Webhook URL環境変数名
pub const SLACK_WEBHOOK_URL_ENV: &str = "SLACK_WEBHOOK_URL";

/// Slack Webhook設定のエラー型
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SlackWebhookConfigError {
    /// 必須の環境変数が設定されていない
    #[error("環境変数が設定されていません: {0}")]
    MissingEnvVar(String),

    /// URLとして解釈できない
    #[error("Webhook URLが不正です: {0}")]
    InvalidUrl(String),
}

/// Slack Webhook設定
///
/// 以下の環境変数から読み込む:
/// - SLACK_WEBHOOK_URL: Slack Incoming WebhookのURL（必須）
///
/// Webhook URLはそれ自体が認証情報を兼ねるため、Debug出力には含めない。
#[derive(Clone)]
pub struct SlackWebhookConfig {
    webhook_url: Url,
}

impl std::fmt::Debug for SlackWebhookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackWebhookConfig")
            .field("host", &self.webhook_url.host_str())
            .finish_non_exhaustive()
    }
}

impl SlackWebhookConfig {
    /// 明示的なURLで設定を作成
    ///
    /// # エラー
    /// URLとして解釈できない場合は`InvalidUrl`を返す
    pub fn new(webhook_url: impl AsRef<str>) -> Result<Self, SlackWebhookConfigError> {
        let webhook_url = Url::parse(webhook_url.as_ref())
            .map_err(|e| SlackWebhookConfigError::InvalidUrl(e.to_string()))?;

        Ok(Self { webhook_url })
    }

    /// 環境変数から設定を読み込む
    ///
    /// # エラー
    /// - `SLACK_WEBHOOK_URL`が未設定の場合は`MissingEnvVar`
    /// - 値がUTF-8でない、またはURLとして不正な場合は`InvalidUrl`
    pub fn from_env() -> Result<Self, SlackWebhookConfigError> {
        let webhook_url = std::env::var(SLACK_WEBHOOK_URL_ENV).map_err(|e| match e {
            VarError::NotPresent => {
                SlackWebhookConfigError::MissingEnvVar(SLACK_WEBHOOK_URL_ENV.to_string())
            }
            // 設定はされているがUTF-8でない
            VarError::NotUnicode(_) => SlackWebhookConfigError::InvalidUrl(format!(
                "{}がUTF-8文字列ではありません",
                SLACK_WEBHOOK_URL_ENV
            )),
        })?;

        Self::new(webhook_url)
    }

    /// Webhook URLを取得
    pub fn webhook_url(&self) -> &Url {
        &self.webhook_url
    }
}
