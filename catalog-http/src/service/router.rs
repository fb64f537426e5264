use hyper::Method;

/// Resolved endpoint of a request.
///
/// Item ids are kept as raw path segments, handlers validate them.
#[derive(Debug, PartialEq, Eq)]
pub enum Route {
    Root,
    ListItems,
    CreateItem,
    GetItem(String),
    ReplaceItem(String),
    DeleteItem(String),
    ItemPrice(String),
    FlagDebug,

    /// known path, unsupported method; carries the `Allow` header value
    MethodNotAllowed(&'static str),
    NotFound,
}

pub fn resolve(method: &Method, path: &str) -> Route {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match segments.as_slice() {
        [] => match *method {
            Method::GET => Route::Root,
            _ => Route::MethodNotAllowed("GET"),
        },
        ["items"] => match *method {
            Method::GET => Route::ListItems,
            Method::POST => Route::CreateItem,
            _ => Route::MethodNotAllowed("GET, POST"),
        },
        ["items", id] => match *method {
            Method::GET => Route::GetItem(id.to_string()),
            Method::PUT => Route::ReplaceItem(id.to_string()),
            Method::DELETE => Route::DeleteItem(id.to_string()),
            _ => Route::MethodNotAllowed("GET, PUT, DELETE"),
        },
        ["items", id, "precio"] => match *method {
            Method::GET => Route::ItemPrice(id.to_string()),
            _ => Route::MethodNotAllowed("GET"),
        },
        ["debug", "launchdarkly"] => match *method {
            Method::GET => Route::FlagDebug,
            _ => Route::MethodNotAllowed("GET"),
        },
        _ => Route::NotFound,
    }
}
