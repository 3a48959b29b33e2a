//! HTTP client for a remote provider and the dialer that creates it.

use super::{Dialer, ProviderLink};
use crate::error::{ApiError, StorageError};
use crate::model::{Contract, PeerInfo, ProviderInfo};
use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;

/// Provider reached over HTTP at `host:port`.
#[derive(Debug, Clone)]
pub struct RemoteProvider {
    addr: String,
    client: reqwest::Client,
}

impl RemoteProvider {
    pub fn new(addr: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            addr: addr.into(),
            client,
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    fn transport(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::unreachable(&self.addr, "request timed out")
        } else {
            ApiError::unreachable(&self.addr, e)
        }
    }

    async fn check(&self, resp: Response, id: &str) -> Result<Response, ApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        match status {
            StatusCode::CONFLICT => Err(StorageError::AlreadyExists(id.to_string()).into()),
            StatusCode::NOT_FOUND => Err(StorageError::NotFound(id.to_string()).into()),
            StatusCode::BAD_REQUEST => Err(StorageError::InvalidId(id.to_string()).into()),
            StatusCode::FORBIDDEN => Err(ApiError::InvalidSeal {
                block_id: id.to_string(),
            }),
            _ => {
                let body = resp.text().await.unwrap_or_default();
                Err(ApiError::unreachable(
                    &self.addr,
                    format!("status {}: {}", status, body.trim()),
                ))
            }
        }
    }

    async fn decode<T: DeserializeOwned>(&self, resp: Response) -> Result<T, ApiError> {
        resp.json::<T>()
            .await
            .map_err(|e| ApiError::MalformedResponse {
                provider: self.addr.clone(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl ProviderLink for RemoteProvider {
    async fn info(&self) -> Result<ProviderInfo, ApiError> {
        let resp = self
            .client
            .get(self.url("/info"))
            .send()
            .await
            .map_err(|e| self.transport(e))?;
        let resp = self.check(resp, "").await?;
        self.decode(resp).await
    }

    async fn negotiate(&self, contract: &Contract) -> Result<Contract, ApiError> {
        let resp = self
            .client
            .post(self.url("/negotiate"))
            .json(contract)
            .send()
            .await
            .map_err(|e| self.transport(e))?;
        let resp = self.check(resp, &contract.block_id).await?;
        self.decode(resp).await
    }

    async fn store_block(&self, id: &str, data: &[u8]) -> Result<(), ApiError> {
        let resp = self
            .client
            .put(self.url(&format!("/blocks/{}", id)))
            .body(data.to_vec())
            .send()
            .await
            .map_err(|e| self.transport(e))?;
        self.check(resp, id).await?;
        Ok(())
    }

    async fn update_block(&self, id: &str, data: &[u8]) -> Result<(), ApiError> {
        let resp = self
            .client
            .put(self.url(&format!("/metadata/{}", id)))
            .body(data.to_vec())
            .send()
            .await
            .map_err(|e| self.transport(e))?;
        self.check(resp, id).await?;
        Ok(())
    }

    async fn get_block(&self, id: &str) -> Result<Vec<u8>, ApiError> {
        let resp = self
            .client
            .get(self.url(&format!("/blocks/{}", id)))
            .send()
            .await
            .map_err(|e| self.transport(e))?;
        let resp = self.check(resp, id).await?;
        let bytes = resp.bytes().await.map_err(|e| self.transport(e))?;
        Ok(bytes.to_vec())
    }

    async fn cancel(&self, contract: &Contract) -> Result<(), ApiError> {
        let resp = self
            .client
            .post(self.url("/cancel"))
            .json(contract)
            .send()
            .await
            .map_err(|e| self.transport(e))?;
        self.check(resp, &contract.block_id).await?;
        Ok(())
    }
}

/// Dials peers over TCP and hands out [`RemoteProvider`]s.
///
/// Dialing only proves the address accepts connections within
/// `dial_timeout`; every later request is bounded by the client's request
/// timeout.
#[derive(Debug, Clone)]
pub struct HttpDialer {
    client: reqwest::Client,
    dial_timeout: Duration,
}

impl HttpDialer {
    pub fn new(dial_timeout: Duration, request_timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .connect_timeout(dial_timeout)
            .timeout(request_timeout)
            .build()
            .map_err(|e| ApiError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            dial_timeout,
        })
    }
}

#[async_trait]
impl Dialer for HttpDialer {
    async fn dial(&self, peer: &PeerInfo) -> Result<Arc<dyn ProviderLink>, ApiError> {
        match tokio::time::timeout(self.dial_timeout, TcpStream::connect(peer.addr.as_str())).await
        {
            Err(_) => Err(ApiError::unreachable(&peer.addr, "dial timed out")),
            Ok(Err(e)) => Err(ApiError::unreachable(&peer.addr, e)),
            Ok(Ok(_probe)) => Ok(Arc::new(RemoteProvider::new(
                peer.addr.clone(),
                self.client.clone(),
            ))),
        }
    }
}
