use crate::daemon::{Command, CommandSender};
use crate::prefs::PreferenceUpdate;
use crate::store::JsonStore;
use anyhow::Result;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Request, State,
    },
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::{from_fn, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rust_embed::Embed;
use serde::Deserialize;
use std::path::PathBuf;
use tokio::sync::oneshot;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use tower_http::set_header::SetResponseHeaderLayer;

pub const ADDR: &str = "127.0.0.1:42710";

const LOOPBACK_HOSTS: &[&str] = &["127.0.0.1", "localhost"];

pub fn url() -> String {
    format!("http://{}/", ADDR)
}

#[derive(Clone)]
struct PaneState {
    store: JsonStore,
    commands: CommandSender,
}

#[derive(Embed)]
#[folder = "ui/"]
struct UiAssets;

#[derive(Deserialize)]
struct PreferenceChange {
    key: String,
    value: serde_json::Value,
}

#[derive(Deserialize)]
struct AddFavourites {
    paths: Vec<PathBuf>,
}

pub struct PaneHandle {
    #[allow(dead_code)]
    shutdown_tx: oneshot::Sender<()>,
}

/// Routes of the preferences pane. Reads come straight from the store, writes are
/// forwarded to the shell thread as commands.
pub fn router(store: JsonStore, commands: CommandSender) -> Router {
    let api = Router::new()
        .route("/preferences", get(get_preferences).put(set_preference))
        .route("/buttons/{id}", post(press_button))
        .route("/favourites", post(add_favourites))
        .route("/ws", get(changes_ws))
        .with_state(PaneState { store, commands });

    let no_cache = SetResponseHeaderLayer::overriding(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );

    Router::new()
        .nest("/api", api)
        .route("/", get(serve_embedded_index))
        .route("/{*path}", get(serve_embedded))
        .layer(no_cache)
        .layer(from_fn(same_origin_only))
}

pub async fn start(store: JsonStore, commands: CommandSender) -> Result<PaneHandle> {
    let app = router(store, commands);
    let listener = tokio::net::TcpListener::bind(ADDR).await?;
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .ok();
    });

    log::info!("Preferences pane listening on {}", url());
    Ok(PaneHandle { shutdown_tx })
}

/// Only the pane's own page may talk to it: the Host must be loopback, and a browser
/// Origin, when sent, must name that same host.
async fn same_origin_only(request: Request, next: Next) -> Response {
    let headers = request.headers();
    let host = header_text(headers, header::HOST);
    let origin = header_text(headers, header::ORIGIN);

    if !is_trusted(host, origin) {
        log::warn!(
            "Refused {} {} from origin {:?} (host {:?})",
            request.method(),
            request.uri().path(),
            origin,
            host
        );
        return (StatusCode::FORBIDDEN, "Cross-origin request refused").into_response();
    }
    next.run(request).await
}

fn header_text(headers: &HeaderMap, name: header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn is_trusted(host: Option<&str>, origin: Option<&str>) -> bool {
    let Some(host) = host else {
        return false;
    };
    let hostname = host.rsplit_once(':').map_or(host, |(name, _)| name);
    if !LOOPBACK_HOSTS.contains(&hostname) {
        return false;
    }
    match origin {
        None => true,
        Some(origin) => origin == format!("http://{}", host),
    }
}

async fn get_preferences(State(state): State<PaneState>) -> Json<serde_json::Value> {
    Json(state.store.snapshot())
}

async fn set_preference(
    State(state): State<PaneState>,
    Json(change): Json<PreferenceChange>,
) -> Response {
    let update = match PreferenceUpdate::parse(&change.key, change.value) {
        Ok(update) => update,
        Err(e) => {
            log::warn!("Rejected preference change: {:#}", e);
            return (StatusCode::BAD_REQUEST, format!("{:#}", e)).into_response();
        }
    };

    forward(&state, Command::SetPreference(update))
}

async fn press_button(State(state): State<PaneState>, Path(id): Path<String>) -> Response {
    log::debug!("Pane button pressed: {}", id);
    forward(&state, Command::Button(id))
}

async fn add_favourites(
    State(state): State<PaneState>,
    Json(request): Json<AddFavourites>,
) -> Response {
    if request.paths.is_empty() {
        return (StatusCode::BAD_REQUEST, "No paths given").into_response();
    }
    forward(&state, Command::Drop(request.paths))
}

fn forward(state: &PaneState, command: Command) -> Response {
    if state.commands.send(command).is_err() {
        log::error!("Shell is gone, dropping pane request");
        return (StatusCode::SERVICE_UNAVAILABLE, "Shutting down").into_response();
    }
    StatusCode::ACCEPTED.into_response()
}

async fn changes_ws(ws: WebSocketUpgrade, State(state): State<PaneState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| push_snapshots(socket, state.store))
}

/// Sends the whole store once, then again after every change.
async fn push_snapshots(mut socket: WebSocket, store: JsonStore) {
    let mut changes = BroadcastStream::new(store.events().subscribe());
    log::debug!("Pane socket connected, {} listener(s) on the bus", store.events().listeners());

    loop {
        let text = store.snapshot().to_string();
        if socket.send(Message::Text(text.into())).await.is_err() {
            break;
        }
        match changes.next().await {
            Some(Ok(_)) => {}
            Some(Err(e)) => log::debug!("Pane socket lagged: {}", e),
            None => break,
        }
    }
}

async fn serve_embedded(Path(path): Path<String>) -> Response {
    serve_embedded_file(&path)
}

async fn serve_embedded_index() -> Response {
    serve_embedded_file("index.html")
}

fn serve_embedded_file(path: &str) -> Response {
    let mime = match path.rsplit('.').next() {
        Some("html") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("png") => "image/png",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    };

    match UiAssets::get(path) {
        Some(content) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, mime)],
            content.data.into_owned(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daemon::{command_channel, EventBus};
    use crate::prefs::SortMode;
    use crate::store::StoreDocument;
    use serde_json::json;
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn state() -> (PaneState, crate::daemon::CommandReceiver) {
        let store = JsonStore::in_memory(StoreDocument::default(), Arc::new(EventBus::new()));
        let (commands, rx) = command_channel();
        (PaneState { store, commands }, rx)
    }

    #[tokio::test]
    async fn valid_preference_is_forwarded() {
        // Arrange
        let (state, mut rx) = state();
        let change = PreferenceChange { key: "pref_sort".into(), value: json!("name") };

        // Act
        let response = set_preference(State(state), Json(change)).await;

        // Assert
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(matches!(
            rx.try_recv().unwrap(),
            Command::SetPreference(PreferenceUpdate::Sort(SortMode::Name))
        ));
    }

    #[tokio::test]
    async fn invalid_preference_is_rejected() {
        let cases = [
            ("pref_sort", json!("random")),
            ("favourites", json!([])),
            ("pref_unknown", json!(true)),
        ];

        for (key, value) in cases {
            let (state, mut rx) = state();
            let change = PreferenceChange { key: key.into(), value };

            let response = set_preference(State(state), Json(change)).await;

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "key: {}", key);
            assert!(rx.try_recv().is_err());
        }
    }

    #[tokio::test]
    async fn buttons_and_drops_become_commands() {
        let (state, mut rx) = state();

        press_button(State(state.clone()), Path("clear_all".into())).await;
        add_favourites(State(state), Json(AddFavourites { paths: vec!["/a".into()] })).await;

        assert!(matches!(rx.try_recv().unwrap(), Command::Button(ref id) if id == "clear_all"));
        assert!(matches!(rx.try_recv().unwrap(), Command::Drop(ref p) if p == &[PathBuf::from("/a")]));
    }

    #[tokio::test]
    async fn empty_drop_is_rejected() {
        let (state, mut rx) = state();

        let response = add_favourites(State(state), Json(AddFavourites { paths: vec![] })).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn closed_shell_reports_unavailable() {
        let (state, rx) = state();
        drop(rx);

        let response = press_button(State(state), Path("add".into())).await;

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn preferences_snapshot_uses_store_keys() {
        let (state, _rx) = state();

        let Json(snapshot) = get_preferences(State(state)).await;

        assert_eq!(snapshot["pref_sort"], "type");
        assert_eq!(snapshot["pref_action"], "submenu");
        assert_eq!(snapshot["favourites"], json!([]));
    }

    #[test]
    fn is_trusted_cases() {
        let cases = [
            (Some("127.0.0.1:42710"), None, true),
            (Some("127.0.0.1:42710"), Some("http://127.0.0.1:42710"), true),
            (Some("localhost:42710"), Some("http://localhost:42710"), true),
            (Some("127.0.0.1:42710"), Some("http://localhost:42710"), false),
            (Some("127.0.0.1:42710"), Some("https://evil.example"), false),
            (Some("127.0.0.1:42710"), Some("null"), false),
            (Some("evil.example:42710"), None, false),
            (Some("evil.example:42710"), Some("http://evil.example:42710"), false),
            (None, None, false),
        ];

        for (host, origin, expected) in cases {
            assert_eq!(is_trusted(host, origin), expected, "host {:?}, origin {:?}", host, origin);
        }
    }

    async fn post_button(addr: std::net::SocketAddr, origin: &str) -> String {
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let request = format!(
            "POST /api/buttons/add HTTP/1.1\r\nHost: {addr}\r\nOrigin: {origin}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
        );
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn foreign_origin_posts_are_refused() {
        // Arrange
        let (state, mut rx) = state();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state.store, state.commands)).await.ok();
        });

        // Act
        let foreign = post_button(addr, "https://evil.example").await;
        let refused = rx.try_recv();
        let own = post_button(addr, &format!("http://{}", addr)).await;

        // Assert
        assert!(foreign.starts_with("HTTP/1.1 403"), "{}", foreign);
        assert!(refused.is_err());
        assert!(own.starts_with("HTTP/1.1 202"), "{}", own);
        assert!(matches!(rx.try_recv().unwrap(), Command::Button(ref id) if id == "add"));
    }

    #[test]
    fn embedded_index_is_served() {
        let ok = serve_embedded_file("index.html");
        let missing = serve_embedded_file("nope.js");

        assert_eq!(ok.status(), StatusCode::OK);
        assert_eq!(
            ok.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/html; charset=utf-8"
        );
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }
}
