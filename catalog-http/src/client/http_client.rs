use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::HeaderMap;
use hyper::{Method, Request, StatusCode};
use hyper_util::rt::TokioIo;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::net::TcpStream;

// A simple type alias so as to DRY.
pub type HttpClientResult<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// A fully buffered response
#[derive(Debug)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpResponse {
    /// Deserializes the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> HttpClientResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

pub fn parse_url_to_uri(url: &str) -> HttpClientResult<hyper::Uri> {
    Ok(url.parse::<hyper::Uri>()?)
}

pub async fn get(url: &str) -> HttpClientResult<HttpResponse> {
    request_url(Method::GET, parse_url_to_uri(url)?, &[], None).await
}

/// GET with an `X-User-Id` header
pub async fn get_as_user(url: &str, user_id: &str) -> HttpClientResult<HttpResponse> {
    request_url(Method::GET, parse_url_to_uri(url)?, &[("x-user-id", user_id)], None).await
}

pub async fn post_json<T: Serialize + ?Sized>(url: &str, value: &T) -> HttpClientResult<HttpResponse> {
    let body = Bytes::from(serde_json::to_vec(value)?);
    request_url(Method::POST, parse_url_to_uri(url)?, &[], Some(body)).await
}

pub async fn put_json<T: Serialize + ?Sized>(url: &str, value: &T) -> HttpClientResult<HttpResponse> {
    let body = Bytes::from(serde_json::to_vec(value)?);
    request_url(Method::PUT, parse_url_to_uri(url)?, &[], Some(body)).await
}

pub async fn delete(url: &str) -> HttpClientResult<HttpResponse> {
    request_url(Method::DELETE, parse_url_to_uri(url)?, &[], None).await
}

/// Sends a single request over a fresh HTTP/1.1 connection
pub async fn request_url(
    method: Method,
    uri: hyper::Uri,
    headers: &[(&str, &str)],
    body: Option<Bytes>,
) -> HttpClientResult<HttpResponse> {
    let host = uri.host().ok_or("uri has no host")?.to_string();
    let port = uri.port_u16().unwrap_or(80);
    let addr = format!("{}:{}", host, port);
    let stream = TcpStream::connect(addr).await?;
    let io = TokioIo::new(stream);

    let (mut sender, conn) = hyper::client::conn::http1::handshake(io).await?;
    tokio::task::spawn(async move {
        if let Err(err) = conn.await {
            log::error!("Connection failed: {:?}", err);
        }
    });

    log::trace!("HTTP client connected to {}:{}", host, port);

    let authority = uri.authority().ok_or("uri has no authority")?.clone();
    let path = uri
        .path_and_query()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());

    let mut builder = Request::builder()
        .uri(path)
        .method(method)
        .header(hyper::header::HOST, authority.as_str());
    if body.is_some() {
        builder = builder.header(hyper::header::CONTENT_TYPE, "application/json");
    }
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let req = builder.body(Full::new(body.unwrap_or_default()))?;

    if log::log_enabled!(log::Level::Trace) {
        log::trace!("Request:\n{:#?}", req);
    }

    let res = sender.send_request(req).await?;
    let status = res.status();
    let headers = res.headers().clone();
    let body = res.into_body().collect().await?.to_bytes();

    if log::log_enabled!(log::Level::Trace) {
        log::trace!("Response status: {}", status);
        log::trace!("Response headers:\n{:#?}", headers);
    }

    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}
