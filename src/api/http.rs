use async_trait::async_trait;
use log::{debug, error, info, warn};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

use crate::api::error::FetchError;
use crate::api::provider::{DataProvider, DataSourceStatus};
use crate::config::Config;
use crate::model::*;

/// Thin GET-only client for the vault proxy.
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

/// Data Loader backed by the `{API_BASE}/api/vaults` proxy.
pub struct ProxyProvider {
    api: ApiClient,
    chain_id: u64,
}

impl ApiClient {
    pub fn new(base_url: Url, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                FetchError::Transport(format!("{} cannot be used as a base URL", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn get_request(&self, url: Url) -> Result<(StatusCode, String), FetchError> {
        debug!("📡 GET {}", url);

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            error!("❌ HTTP request to {} failed: {}", url, e);
            FetchError::from(e)
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!("❌ Failed to read response body from {}: {}", url, e);
            FetchError::from(e)
        })?;

        debug!("✅ {} answered {} ({} bytes)", url, status, body.len());
        Ok((status, body))
    }
}

impl ProxyProvider {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        info!("🚀 Initializing ProxyProvider with API: {}", config.api_base);

        let base_url = Url::parse(&config.api_base)?;
        let api = ApiClient::new(base_url, Duration::from_millis(config.request_timeout_ms))?;

        Ok(Self {
            api,
            chain_id: config.chain_id,
        })
    }

    fn vaults_url(&self) -> Result<Url, FetchError> {
        let mut url = self.api.endpoint(&["api", "vaults"])?;
        url.query_pairs_mut()
            .append_pair("chain_id", &self.chain_id.to_string());
        Ok(url)
    }

    fn detail_url(&self, key: &VaultKey) -> Result<Url, FetchError> {
        let mut url = self.api.endpoint(&["api", "vaults", &key.address])?;
        url.query_pairs_mut()
            .append_pair("chain_id", &key.chain_id.to_string());
        Ok(url)
    }
}

#[async_trait]
impl DataProvider for ProxyProvider {
    async fn load_vaults(&self) -> Result<Vec<VaultSummary>, FetchError> {
        info!("📊 Fetching vault listing for chain {}", self.chain_id);
        let (status, body) = self.api.get_request(self.vaults_url()?).await?;
        interpret_vaults(status, &body)
    }

    async fn load_vault_detail(&self, key: &VaultKey) -> Result<VaultDetail, FetchError> {
        info!("📊 Fetching vault detail for {}", key);
        let (status, body) = self.api.get_request(self.detail_url(key)?).await?;
        interpret_detail(status, &body)
    }

    async fn get_status(&self) -> DataSourceStatus {
        let url = match self.api.endpoint(&["api", ""]) {
            Ok(url) => url,
            Err(e) => return DataSourceStatus::Error(e.to_string()),
        };
        match self.api.get_request(url).await {
            Ok((status, _)) if status.is_success() => DataSourceStatus::Connected,
            Ok((status, _)) => DataSourceStatus::Error(format!("backend answered {}", status)),
            Err(_) => DataSourceStatus::Disconnected,
        }
    }

    fn describe(&self) -> String {
        format!("{} (chain {})", self.api.base_url, self.chain_id)
    }
}

fn failure_from_status(status: StatusCode, body: &str) -> FetchError {
    let message = serde_json::from_str::<FailureBody>(body)
        .ok()
        .and_then(FailureBody::message);
    error!("❌ Backend answered {}: {}", status, message.as_deref().unwrap_or(body));
    FetchError::Provider(message)
}

pub fn interpret_vaults(status: StatusCode, body: &str) -> Result<Vec<VaultSummary>, FetchError> {
    if !status.is_success() {
        return Err(failure_from_status(status, body));
    }

    let envelope: VaultsEnvelope = serde_json::from_str(body).map_err(|e| {
        error!("❌ Failed to parse vault listing: {}", e);
        FetchError::from(e)
    })?;

    if !envelope.success {
        let message = envelope.error.filter(|m| !m.trim().is_empty());
        warn!("⚠️ Backend reported listing failure: {:?}", message);
        return Err(FetchError::Provider(message));
    }

    let vaults = envelope.vaults.ok_or_else(|| {
        FetchError::Decode("listing marked successful but has no vaults".to_string())
    })?;

    if let Some(total) = envelope.total {
        if total != vaults.len() {
            warn!("⚠️ Listing says total={} but carries {} vaults", total, vaults.len());
        }
    }

    info!("✅ Loaded {} vaults", vaults.len());
    Ok(vaults)
}

pub fn interpret_detail(status: StatusCode, body: &str) -> Result<VaultDetail, FetchError> {
    if !status.is_success() {
        return Err(failure_from_status(status, body));
    }

    let envelope: VaultDetailEnvelope = serde_json::from_str(body).map_err(|e| {
        error!("❌ Failed to parse vault detail: {}", e);
        FetchError::from(e)
    })?;

    if !envelope.success {
        let message = envelope.error.filter(|m| !m.trim().is_empty());
        warn!("⚠️ Backend reported detail failure: {:?}", message);
        return Err(FetchError::Provider(message));
    }

    envelope
        .data
        .ok_or_else(|| FetchError::Decode("detail marked successful but has no data".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::GENERIC_VAULTS_MESSAGE;
    use rust_decimal_macros::dec;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    const LISTING: &str = r#"{
        "success": true,
        "total": 2,
        "vaults": [
            {"address": "0x1", "chain_id": 1, "name": "A", "expiry": "", "liquidity": 500},
            {"address": "0x2", "chain_id": 1, "name": "B", "expiry": "", "liquidity": 1500}
        ]
    }"#;

    /// Serves one canned HTTP response and reports the request line it received.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let request = String::from_utf8_lossy(&request);
            let first_line = request.lines().next().unwrap_or_default().to_string();
            let _ = tx.send(first_line);

            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\n\
                 content-length: {}\r\nconnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        (format!("http://{}", addr), rx)
    }

    fn provider_for(base: &str, timeout_ms: u64) -> ProxyProvider {
        let config = Config {
            api_base: base.to_string(),
            request_timeout_ms: timeout_ms,
            ..Config::default()
        };
        ProxyProvider::new(&config).unwrap()
    }

    #[tokio::test]
    async fn loads_listing_in_provider_order() {
        let (base, request) = serve_once("200 OK", LISTING).await;
        let provider = provider_for(&base, 5_000);

        let vaults = provider.load_vaults().await.unwrap();

        assert_eq!(request.await.unwrap(), "GET /api/vaults?chain_id=1 HTTP/1.1");
        let addresses: Vec<_> = vaults.iter().map(|v| v.address.as_str()).collect();
        assert_eq!(addresses, vec!["0x1", "0x2"]);
        assert_eq!(vaults[1].liquidity, dec!(1500));
    }

    #[tokio::test]
    async fn detail_request_is_scoped_by_chain() {
        let body =
            r#"{"success": true, "data": {"ptPrice": 0.95, "impliedApy": 0.08, "foo": "bar"}}"#;
        let (base, request) = serve_once("200 OK", body).await;
        let provider = provider_for(&base, 5_000);

        let detail = provider
            .load_vault_detail(&VaultKey::new("0xabc", 42161))
            .await
            .unwrap();

        assert_eq!(request.await.unwrap(), "GET /api/vaults/0xabc?chain_id=42161 HTTP/1.1");
        assert_eq!(detail.pt_price(), Some(dec!(0.95)));
        assert_eq!(detail.extra().len(), 1);
    }

    #[tokio::test]
    async fn provider_failure_message_is_kept() {
        let body = r#"{"success": false, "vaults": [], "error": "X"}"#;
        let (base, _) = serve_once("200 OK", body).await;
        let provider = provider_for(&base, 5_000);

        let err = provider.load_vaults().await.unwrap_err();

        assert!(matches!(err, FetchError::Provider(Some(ref m)) if m == "X"));
        assert_eq!(err.user_message(GENERIC_VAULTS_MESSAGE), "X");
    }

    #[tokio::test]
    async fn http_500_detail_body_becomes_provider_error() {
        let (base, _) = serve_once(
            "500 Internal Server Error",
            r#"{"detail": "Failed to fetch vault details: 404 Not Found"}"#,
        )
        .await;
        let provider = provider_for(&base, 5_000);

        let err = provider
            .load_vault_detail(&VaultKey::new("0xdead", 1))
            .await
            .unwrap_err();

        let expected = "Failed to fetch vault details: 404 Not Found";
        assert!(matches!(err, FetchError::Provider(Some(ref m)) if m == expected));
    }

    #[tokio::test]
    async fn unreachable_backend_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let provider = provider_for(&format!("http://{}", addr), 5_000);

        let err = provider.load_vaults().await.unwrap_err();

        assert!(matches!(err, FetchError::Transport(_)));
        assert_eq!(err.user_message(GENERIC_VAULTS_MESSAGE), GENERIC_VAULTS_MESSAGE);
    }

    #[tokio::test]
    async fn silent_backend_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });
        let provider = provider_for(&format!("http://{}", addr), 200);

        let err = provider.load_vaults().await.unwrap_err();

        assert!(matches!(err, FetchError::Transport(_)));
    }

    #[test]
    fn garbage_body_is_decode_error() {
        let err = interpret_vaults(StatusCode::OK, "<html>gateway</html>").unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
        assert_eq!(err.user_message(GENERIC_VAULTS_MESSAGE), GENERIC_VAULTS_MESSAGE);
    }

    #[test]
    fn success_without_payload_is_decode_error() {
        assert!(matches!(
            interpret_detail(StatusCode::OK, r#"{"success": true}"#),
            Err(FetchError::Decode(_))
        ));
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let api = ApiClient::new(
            Url::parse("http://localhost:8001/proxy/").unwrap(),
            Duration::from_secs(1),
        )
        .unwrap();
        let url = api.endpoint(&["api", "vaults"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8001/proxy/api/vaults");
    }
}
