//! Purpose: HTTP client for the cart document endpoint (JSON over http/https).
//! Exports: `RemoteClient`.
//! Role: The transport behind cart synchronization; one GET and one PUT shape.
//! Invariants: The base URL is scheme http/https with no path, query, or fragment.
//! Invariants: The whole document travels on every request; there is no partial update.

use crate::api::sync::CartTransport;
use crate::core::cart::{CartDocument, CartState};
use crate::core::error::{Error, ErrorKind};
use serde::Deserialize;
use std::sync::Arc;
use url::Url;

type ApiResult<T> = Result<T, Error>;

#[derive(Clone)]
pub struct RemoteClient {
    inner: Arc<RemoteClientInner>,
}

struct RemoteClientInner {
    base_url: Url,
    agent: ureq::Agent,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: RemoteError,
}

#[derive(Deserialize)]
struct RemoteError {
    kind: String,
    message: Option<String>,
}

impl RemoteClient {
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        let agent = ureq::AgentBuilder::new().build();
        Ok(Self {
            inner: Arc::new(RemoteClientInner { base_url, agent }),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// One GET of the whole cart document.
    pub fn fetch_cart(&self) -> ApiResult<CartDocument> {
        let url = build_url(&self.inner.base_url, "cart")?;
        let response = self
            .inner
            .agent
            .request("GET", url.as_str())
            .set("Accept", "application/json")
            .call();
        let value = match response {
            Ok(resp) => read_json_response(resp)?,
            Err(ureq::Error::Status(code, resp)) => return Err(parse_error_response(code, resp)),
            Err(ureq::Error::Transport(err)) => {
                return Err(Error::new(ErrorKind::Io)
                    .with_message("request failed")
                    .with_source(err));
            }
        };
        CartDocument::from_value(value)
    }

    /// PUT of the full cart state as the document's new contents. Any 2xx
    /// status is success; the response body is ignored.
    pub fn put_cart(&self, cart: &CartState) -> ApiResult<()> {
        let url = build_url(&self.inner.base_url, "cart")?;
        let payload = serde_json::to_string(cart).map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("failed to encode cart json")
                .with_source(err)
        })?;
        let response = self
            .inner
            .agent
            .request("PUT", url.as_str())
            .set("Accept", "application/json")
            .set("Content-Type", "application/json")
            .send_string(&payload);
        match response {
            Ok(_) => Ok(()),
            Err(ureq::Error::Status(code, resp)) => Err(parse_error_response(code, resp)),
            Err(ureq::Error::Transport(err)) => Err(Error::new(ErrorKind::Io)
                .with_message("request failed")
                .with_source(err)),
        }
    }
}

impl CartTransport for RemoteClient {
    fn fetch_cart(&self) -> ApiResult<CartDocument> {
        RemoteClient::fetch_cart(self)
    }

    fn put_cart(&self, cart: &CartState) -> ApiResult<()> {
        RemoteClient::put_cart(self, cart)
    }
}

fn normalize_base_url(raw: String) -> ApiResult<Url> {
    let mut url = Url::parse(&raw).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid remote base url")
            .with_source(err)
    })?;
    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("remote base url must use http or https scheme"));
    }
    if url.path() != "/" && !url.path().is_empty() {
        return Err(
            Error::new(ErrorKind::Usage).with_message("remote base url must not include a path")
        );
    }
    url.set_path("/");
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn build_url(base_url: &Url, segment: &str) -> ApiResult<Url> {
    let mut url = base_url.clone();
    {
        let mut path = url.path_segments_mut().map_err(|_| {
            Error::new(ErrorKind::Usage).with_message("remote base url cannot be a base")
        })?;
        path.clear();
        path.push(segment);
    }
    Ok(url)
}

fn read_json_response(response: ureq::Response) -> ApiResult<serde_json::Value> {
    let body = response.into_string().map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read response body")
            .with_source(err)
    })?;
    serde_json::from_str(&body).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("invalid response json")
            .with_source(err)
    })
}

fn parse_error_response(status: u16, response: ureq::Response) -> Error {
    let body = response.into_string().unwrap_or_default();
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(&body) {
        return error_from_remote(envelope.error).with_status(status);
    }
    let kind = error_kind_from_status(status);
    Error::new(kind)
        .with_message(format!("remote error status {status}"))
        .with_status(status)
}

fn error_from_remote(remote: RemoteError) -> Error {
    let kind = parse_error_kind(&remote.kind);
    let mut err = Error::new(kind);
    if let Some(message) = remote.message {
        err = err.with_message(message);
    }
    err
}

fn parse_error_kind(kind: &str) -> ErrorKind {
    match kind {
        "Internal" => ErrorKind::Internal,
        "Usage" => ErrorKind::Usage,
        "NotFound" => ErrorKind::NotFound,
        "Remote" => ErrorKind::Remote,
        "Io" => ErrorKind::Io,
        _ => ErrorKind::Internal,
    }
}

fn error_kind_from_status(status: u16) -> ErrorKind {
    match status {
        400 | 413 => ErrorKind::Usage,
        404 => ErrorKind::NotFound,
        500..=599 => ErrorKind::Remote,
        _ => ErrorKind::Io,
    }
}
