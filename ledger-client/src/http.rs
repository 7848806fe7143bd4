// ledger-client/src/http.rs
// HTTP ledger - talks to the spreadsheet-backed ledger endpoint

use crate::ledger::{Ledger, Rows};
use crate::{ClientError, ClientResult, LedgerConfig};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::ErrorCode;
use shared::action::{MutationAck, MutationEnvelope};
use shared::models::{MadeLogQuery, MadeLogRow, Masters, OrderRow, StorageAggRow};
use shared::util::format_ledger_date;
use std::time::Duration;

/// Error body the ledger sends with non-success statuses
#[derive(serde::Deserialize)]
struct LedgerErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Ledger reached over HTTP.
///
/// Every call goes to the single base URL: reads as `GET ?path=<name>&...`,
/// writes as `POST` with `path` inside the JSON body.
#[derive(Debug, Clone)]
pub struct HttpLedger {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpLedger {
    pub fn new(config: &LedgerConfig) -> ClientResult<Self> {
        if config.base_url.trim().is_empty() {
            return Err(ClientError::Config("ledger base URL is empty".into()));
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim().to_string(),
            api_key: config.api_key.clone(),
            timeout: config.timeout,
        })
    }

    /// 获取基础 URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn transport(&self, err: reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout(self.timeout)
        } else {
            ClientError::Http(err)
        }
    }

    fn query<'a>(&'a self, path: &'a str, params: &[(&'a str, String)]) -> Vec<(&'a str, String)> {
        let mut query = Vec::with_capacity(params.len() + 2);
        query.push(("path", path.to_string()));
        query.extend(params.iter().cloned());
        if let Some(key) = &self.api_key {
            query.push(("key", key.clone()));
        }
        query
    }

    fn with_key(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.header("x-api-key", key),
            None => req,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> ClientResult<T> {
        tracing::debug!(path, "ledger GET");
        let req = self.client.get(&self.base_url).query(&self.query(path, params));
        let response = self
            .with_key(req)
            .send()
            .await
            .map_err(|e| self.transport(e))?;
        self.handle_response(response).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(&self, body: &B) -> ClientResult<T> {
        let mut req = self.client.post(&self.base_url).json(body);
        if let Some(key) = &self.api_key {
            req = req.query(&[("key", key.as_str())]);
        }
        let response = self
            .with_key(req)
            .send()
            .await
            .map_err(|e| self.transport(e))?;
        self.handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();
        let text = response.text().await.map_err(|e| self.transport(e))?;
        if !status.is_success() {
            return Err(self.status_error(status, text));
        }
        serde_json::from_str(&text).map_err(|e| {
            ClientError::InvalidResponse(format!("{} (body: {})", e, truncate(&text, 200)))
        })
    }

    fn status_error(&self, status: StatusCode, text: String) -> ClientError {
        // 尝试解析为 ledger 错误响应
        let message = serde_json::from_str::<LedgerErrorBody>(&text)
            .ok()
            .and_then(|b| b.error.or(b.message))
            .unwrap_or(text);
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Unauthorized,
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            StatusCode::BAD_REQUEST => ClientError::Validation(message),
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                ClientError::Timeout(self.timeout)
            }
            _ => ClientError::Rejected {
                code: ErrorCode::from_http_status(status),
                message,
            },
        }
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[async_trait]
impl Ledger for HttpLedger {
    async fn masters(&self) -> ClientResult<Masters> {
        self.get("masters", &[]).await
    }

    async fn orders(&self, factory_code: &str, archived: Option<bool>) -> ClientResult<Vec<OrderRow>> {
        let mut params = vec![("factory", factory_code.to_string())];
        if let Some(archived) = archived {
            params.push(("archived", archived.to_string()));
        }
        let rows: Rows<OrderRow> = self.get("orders", &params).await?;
        rows.into_result()
    }

    async fn storage_agg(&self, factory_code: &str) -> ClientResult<Vec<StorageAggRow>> {
        let rows: Rows<StorageAggRow> = self
            .get("storage-agg", &[("factory", factory_code.to_string())])
            .await?;
        rows.into_result()
    }

    async fn made_log(&self, query: &MadeLogQuery) -> ClientResult<Vec<MadeLogRow>> {
        let rows: Rows<MadeLogRow> = self
            .get(
                "made-log",
                &[
                    ("factory", query.factory_code.clone()),
                    ("start", format_ledger_date(query.start)),
                    ("end", format_ledger_date(query.end)),
                ],
            )
            .await?;
        rows.into_result()
    }

    async fn submit(&self, envelope: &MutationEnvelope) -> ClientResult<MutationAck> {
        tracing::debug!(
            path = envelope.mutation.path(),
            request_id = %envelope.request_id,
            "ledger POST"
        );
        self.post(envelope).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> HttpLedger {
        HttpLedger::new(&LedgerConfig::new("https://ledger.test/exec").with_api_key("secret")).unwrap()
    }

    #[test]
    fn test_empty_base_url_is_config_error() {
        let err = HttpLedger::new(&LedgerConfig::new("  ")).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_query_carries_path_and_key() {
        let ledger = ledger();
        let query = ledger.query("orders", &[("factory", "GT".to_string())]);
        assert_eq!(
            query,
            vec![
                ("path", "orders".to_string()),
                ("factory", "GT".to_string()),
                ("key", "secret".to_string()),
            ]
        );
    }

    #[test]
    fn test_status_mapping() {
        let ledger = ledger();
        assert!(matches!(
            ledger.status_error(StatusCode::UNAUTHORIZED, String::new()),
            ClientError::Unauthorized
        ));
        assert!(matches!(
            ledger.status_error(StatusCode::GATEWAY_TIMEOUT, String::new()),
            ClientError::Timeout(_)
        ));
        match ledger.status_error(StatusCode::CONFLICT, r#"{"error": "lot exists"}"#.to_string()) {
            ClientError::Rejected { code, message } => {
                assert_eq!(code, ErrorCode::AlreadyExists);
                assert_eq!(message, "lot exists");
            }
            other => panic!("unexpected {:?}", other),
        }
        match ledger.status_error(StatusCode::BAD_REQUEST, "plain text".to_string()) {
            ClientError::Validation(message) => assert_eq!(message, "plain text"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("冷蔵庫です", 3), "冷蔵庫");
        assert_eq!(truncate("abc", 10), "abc");
    }
}
