use axum::{
    extract::{Query, State},
    response::Html,
};
use axum_extra::extract::cookie::CookieJar;
use datalayer::{PublishOptions, PushOptions};
use serde::Deserialize;

use crate::errors::ApiError;
use crate::routes::AppState;
use crate::session::{request_store, resolve_session};

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    /// Pushed as an immediate `event` entry when present
    pub event: Option<String>,
    /// Keep the session copy after publishing
    #[serde(default)]
    pub keep: bool,
}

/// Demo page: publishes the session's data layer in `<head>` and the
/// `<noscript>` fallback at the top of `<body>`.
pub async fn home(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<PageQuery>,
) -> Result<(CookieJar, Html<String>), ApiError> {
    let (jar, id) = resolve_session(jar, &state.datalayer.session_cookie);
    let mut store = request_store(&state, &id)?;
    store.set("pagePath", "/", PushOptions::default())?;
    store.publish(PublishOptions::default().with_clear(!query.keep))?;
    if let Some(event) = query.event {
        store.set("event", event, PushOptions::echo())?;
    }
    let head = store.take_output();
    store.no_script(None)?;
    let body = store.take_output();

    let html = format!(
        "<!doctype html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>datalayer</title>\n{head}\n</head>\n<body>\n{body}\n<h1>datalayer</h1>\n</body>\n</html>\n"
    );
    Ok((jar, Html(html)))
}
