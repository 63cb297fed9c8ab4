use crate::app::config::HttpConfig;
use crate::core::demand::encoding::RequestEncoder;
use crate::core::wire::WireRequest;
use anyhow::{anyhow, bail};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode, redirect, retry};
use tracing::debug;

/// Delivers one compiled wire request and hands back the raw body.
///
/// Any error, including a non 200 status, means the request
/// contributes no bids.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, req: &WireRequest) -> Result<Bytes, anyhow::Error>;
}

/// Reqwest backed transport
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    fn init_client(cfg: &HttpConfig) -> Result<Client, anyhow::Error> {
        reqwest::ClientBuilder::new()
            .user_agent(cfg.user_agent.as_str())
            .connect_timeout(cfg.connect_timeout)
            .pool_max_idle_per_host(cfg.pool_max_idle_per_host)
            .pool_idle_timeout(Some(cfg.pool_idle_timeout))
            .retry(retry::never())
            .referer(false)
            .redirect(redirect::Policy::none())
            .timeout(cfg.request_timeout)
            .tcp_nodelay(true)
            .deflate(true)
            .gzip(true)
            .hickory_dns(true)
            .build()
            .map_err(anyhow::Error::from)
    }

    /// Builds the underlying client eagerly so a bad setup fails
    /// at startup rather than on the first auction
    pub fn new(cfg: &HttpConfig) -> Result<Self, anyhow::Error> {
        Ok(Self {
            client: Self::init_client(cfg)?,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, req: &WireRequest) -> Result<Bytes, anyhow::Error> {
        if tracing::event_enabled!(tracing::Level::TRACE) {
            tracing::trace!(format = %req.format, "{}", req.data);
        }

        let encoded = RequestEncoder::encode(req);

        let mut headers = HeaderMap::new();
        for header in encoded.headers {
            let key = HeaderName::from_static(header.key);
            let value = HeaderValue::from_str(&header.value)
                .map_err(|e| anyhow!("Invalid header value: {}", e))?;

            headers.insert(key, value);
        }

        let http_req = self
            .client
            .post(&req.url)
            .headers(headers)
            .body(encoded.data)
            .build()
            .map_err(|e| anyhow!("Failed to build http request for {}: {}", req.format, e))?;

        let res = self.client.execute(http_req).await.map_err(|e| {
            anyhow!(
                "Failed to execute http request for {}: {}",
                req.format,
                e
            )
        })?;

        let status = res.status();
        if status != StatusCode::OK {
            debug!(format = %req.format, status = status.as_u16(), "Non 200 status, early exit");
            bail!("{} endpoint answered {}", req.format, status);
        }

        debug!("Http 200 - awaiting body");

        res.bytes()
            .await
            .map_err(|e| anyhow!("Failed to read http response for {}: {}", req.format, e))
    }
}
