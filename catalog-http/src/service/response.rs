use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;
use thiserror::Error;

use catalog_storage::StorageError;

pub type HttpResponse = Response<Full<Bytes>>;

/// Errors surfaced to HTTP clients
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Item no encontrado")]
    ItemNotFound,

    #[error("{0}")]
    Validation(String),

    #[error("Not Found")]
    RouteNotFound,

    #[error("Method Not Allowed")]
    MethodNotAllowed(&'static str),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) => ApiError::ItemNotFound,
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::ItemNotFound | ApiError::RouteNotFound => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    /// Renders the error as `{"detail": <message>}`
    pub fn into_response(self) -> HttpResponse {
        let status = self.status();
        let mut response = json_response(status, &ErrorBody { detail: self.to_string() });
        if let ApiError::MethodNotAllowed(allow) = self {
            response.headers_mut().insert(
                hyper::header::ALLOW,
                hyper::header::HeaderValue::from_static(allow),
            );
        }
        response
    }
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

/// A JSON response with status code
pub fn json_response<T: Serialize + ?Sized>(status_code: StatusCode, value: &T) -> HttpResponse {
    let body = match serde_json::to_vec(value) {
        Ok(body) => body,
        Err(err) => {
            log::error!("unable to serialize response: {}", err);
            return send_error_500();
        }
    };

    match Response::builder()
        .status(status_code)
        .header(hyper::header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body)))
    {
        Ok(response) => response,
        Err(err) => {
            log::error!("unable to build response: {}", err);
            send_error_500()
        }
    }
}

/// HTTP status code 500
pub fn send_error_500() -> HttpResponse {
    blank_response(StatusCode::INTERNAL_SERVER_ERROR)
}

/// A blank response with status code
pub fn blank_response(status_code: StatusCode) -> HttpResponse {
    let mut response = Response::<Full<Bytes>>::new(Full::new(Bytes::new()));
    *response.status_mut() = status_code;
    response
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;

    async fn body_json(response: HttpResponse) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn not_found_response_test() {
        let response = ApiError::from(StorageError::NotFound(3)).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"detail": "Item no encontrado"})
        );
    }

    #[tokio::test]
    async fn validation_response_test() {
        let response = ApiError::Validation("missing field `precio`".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            response.headers()[hyper::header::CONTENT_TYPE],
            "application/json"
        );
        assert_eq!(
            body_json(response).await["detail"],
            "missing field `precio`"
        );
    }

    #[test]
    fn method_not_allowed_response_test() {
        let response = ApiError::MethodNotAllowed("GET, POST").into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[hyper::header::ALLOW], "GET, POST");
    }

    #[test]
    fn blank_response_test() {
        let response = blank_response(StatusCode::NO_CONTENT);
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().get(hyper::header::CONTENT_TYPE).is_none());
    }
}
