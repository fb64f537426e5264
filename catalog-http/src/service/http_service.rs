use std::net::SocketAddr;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::JoinHandle;

use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::header::HeaderMap;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Result};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use catalog_utils::Config;

use super::app_state::AppState;
use super::handlers::{self, ANONYMOUS_USER_KEY};
use super::response::{ApiError, HttpResponse};
use super::router::{self, Route};

// A simple type alias so as to DRY.
type ServiceResult<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub const USER_ID_HEADER: &str = "x-user-id";

pub struct HttpService {
    state: Arc<AppState>,
    config: Arc<Config>,
}

impl HttpService {
    pub fn with_config(state: Arc<AppState>, config: Arc<Config>) -> Self {
        HttpService { state, config }
    }

    /// Runs the service on a dedicated thread with its own runtime.
    ///
    /// The bound address is sent through `ready_sender` once the listener is up.
    /// The thread ends after `shutdown` is cancelled and open connections are drained.
    pub fn start(
        &self,
        ready_sender: Sender<SocketAddr>,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let listen_on = match self.config.http.listen_on.first() {
            Some(listen_on) => *listen_on,
            None => Config::default().http.listen_on[0],
        };
        if self.config.http.listen_on.len() > 1 {
            log::warn!("only the first listen address is used: {}", listen_on);
        }

        let state = self.state.clone();
        log::info!("Starting HTTP service...");
        std::thread::spawn(move || {
            let async_runtime = match Runtime::new() {
                Ok(async_runtime) => async_runtime,
                Err(err) => {
                    log::error!("could not create the HTTP service runtime: {:?}", err);
                    return;
                }
            };
            async_runtime.block_on(async {
                if let Err(err) = run(state, listen_on, ready_sender, shutdown).await {
                    log::error!("HTTP service failed: {:?}", err);
                }
            });
        })
    }
}

async fn run(
    state: Arc<AppState>,
    listen_on: SocketAddr,
    ready_sender: Sender<SocketAddr>,
    shutdown: CancellationToken,
) -> ServiceResult<()> {
    let listener = TcpListener::bind(listen_on).await?;
    let local_addr = listener.local_addr()?;

    // send the ready signal
    if let Err(err) = ready_sender.send(local_addr) {
        return Err(err.to_string().into());
    }

    log::info!("HTTP service running on http://{}", local_addr);
    serve(listener, state, shutdown).await;
    Ok(())
}

/// Accepts connections until `shutdown` is cancelled, then waits for the
/// open connections to finish gracefully.
pub async fn serve(listener: TcpListener, state: Arc<AppState>, shutdown: CancellationToken) {
    let tasks = TaskTracker::new();

    loop {
        let (stream, remote_addr) = tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(err) => {
                    log::error!("Failed to accept connection: {:?}", err);
                    continue;
                }
            },
        };

        if log::log_enabled!(log::Level::Trace) {
            log::trace!("accepted connection from {}", remote_addr);
        }

        let state = state.clone();
        let shutdown = shutdown.clone();
        tasks.spawn(async move {
            let io = TokioIo::new(stream);
            let service = service_fn(move |req| request_service(state.clone(), req));
            let conn = http1::Builder::new().serve_connection(io, service);
            tokio::pin!(conn);

            tokio::select! {
                result = conn.as_mut() => {
                    if let Err(err) = result {
                        log::error!("Failed to serve connection: {:?}", err);
                    }
                }
                _ = shutdown.cancelled() => {
                    conn.as_mut().graceful_shutdown();
                    if let Err(err) = conn.await {
                        log::error!("Failed to close connection: {:?}", err);
                    }
                }
            }
        });
    }

    tasks.close();
    tasks.wait().await;
    log::info!("HTTP service stopped");
}

async fn request_service(state: Arc<AppState>, req: Request<Incoming>) -> Result<HttpResponse> {
    if log::log_enabled!(log::Level::Trace) {
        log::trace!("received request:{:#?}", req);
    }

    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let user_key = user_key(req.headers());

    let result = match router::resolve(&method, &path) {
        Route::Root => handlers::root(),
        Route::ListItems => handlers::list_items(&state),
        Route::CreateItem => {
            let body = req.into_body().collect().await?.to_bytes();
            handlers::create_item(&state, &body)
        }
        Route::GetItem(raw_id) => handlers::get_item(&state, &raw_id),
        Route::ReplaceItem(raw_id) => {
            let body = req.into_body().collect().await?.to_bytes();
            handlers::replace_item(&state, &raw_id, &body)
        }
        Route::DeleteItem(raw_id) => handlers::delete_item(&state, &raw_id),
        Route::ItemPrice(raw_id) => handlers::item_price(&state, &raw_id, &user_key).await,
        Route::FlagDebug => handlers::flag_debug(&state, &user_key).await,
        Route::MethodNotAllowed(allow) => Err(ApiError::MethodNotAllowed(allow)),
        Route::NotFound => Err(ApiError::RouteNotFound),
    };

    let response = match result {
        Ok(response) => response,
        Err(err) => {
            if log::log_enabled!(log::Level::Debug) {
                log::debug!("{} {} rejected: {}", method, path, err);
            }
            err.into_response()
        }
    };

    if log::log_enabled!(log::Level::Debug) {
        log::debug!("{} {} -> {}", method, path, response.status());
    }
    Ok(response)
}

/// Returns the `X-User-Id` header value, or the anonymous key
fn user_key(headers: &HeaderMap) -> String {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
        .unwrap_or_else(|| ANONYMOUS_USER_KEY.to_string())
}
