//! Spinewatch server: device WebSocket plus offline upload endpoint.

use anyhow::Context;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Multipart, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use spinewatch::classifier::ModelClassifier;
use spinewatch::dispatch::{AlertDispatcher, EmergencyContactHandler, LogAlertHandler, LogNotifier};
use spinewatch::ingest::process_upload;
use spinewatch::store::MemoryStore;
use spinewatch::{Connection, MonitorConfig, MonitorEnv};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "spinewatch", version, about = "Posture and fall alerting server")]
struct Args {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on, overrides the config file
    #[arg(long)]
    bind: Option<String>,

    /// Directory holding the model files, overrides the config file
    #[arg(long)]
    models: Option<PathBuf>,
}

#[derive(Clone)]
struct AppState {
    env: MonitorEnv,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => MonitorConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => MonitorConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(models) = args.models {
        config.models.dir = models;
    }

    let classifier = ModelClassifier::load_dir(&config.models.dir);
    let store = MemoryStore::with_users(config.users.clone())
        .with_retention(config.store.retained_records);
    let dispatcher = AlertDispatcher::new()
        .with_handler(Box::new(LogAlertHandler))
        .with_handler(Box::new(EmergencyContactHandler::new(Arc::new(LogNotifier))));

    let env = MonitorEnv::new(Arc::new(classifier), Arc::new(store), Arc::new(dispatcher))
        .with_policy(config.policy)
        .with_vibration(config.vibration.clone());

    let app = Router::new()
        .route("/ws/posture/", get(ws_handler))
        .route("/api/upload-offline-data/", post(upload_handler))
        .route("/health", get(health))
        .with_state(AppState { env });

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("binding {}", config.server.bind))?;
    tracing::info!(
        bind = %config.server.bind,
        users = config.users.len(),
        retained_records = config.store.retained_records,
        window_secs = config.policy.window_secs,
        "Spinewatch listening"
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let mut connection = Connection::new(state.env);
    tracing::info!(connection_id = %connection.id(), "WebSocket connected");

    'frames: while let Some(Ok(msg)) = receiver.next().await {
        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => break,
            Message::Binary(_) => {
                tracing::debug!("Ignoring binary WebSocket message");
                continue;
            }
            Message::Ping(_) | Message::Pong(_) => continue,
        };

        for outbound in connection.handle_text(&text, Utc::now()).await {
            let json = match outbound.to_json() {
                Ok(json) => json,
                Err(e) => {
                    tracing::warn!(error = %e, kind = outbound.kind(), "Failed to encode message");
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break 'frames;
            }
        }
    }

    connection.close(Utc::now()).await;
}

async fn upload_handler(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return bad_request(format!("Invalid upload: {e}")),
        };
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return bad_request(format!("Failed to read file: {e}")),
        };

        return match process_upload(&*state.env.classifier, &file_name, &content) {
            Ok(report) => (StatusCode::OK, Json(report)).into_response(),
            Err(e) => {
                tracing::warn!(file_name = %file_name, error = %e, "Rejected offline upload");
                bad_request(e.to_string())
            }
        };
    }

    bad_request("No file provided".to_string())
}

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}
