//! Object upload, listing, and download endpoints.

use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing;
use axum::{Json, Router};
use serde::Serialize;

use filegate_service::{ObjectEntry, key};

use crate::endpoints::common::{ApiError, ApiResult};
use crate::state::ServiceState;

pub fn router() -> Router<ServiceState> {
    Router::new()
        .route("/upload", routing::post(upload))
        .route("/files", routing::get(files))
        .route("/download/{*key}", routing::get(download))
}

/// Response returned when uploading an object.
#[derive(Debug, Serialize)]
struct UploadResponse {
    ok: bool,
    key: String,
}

#[tracing::instrument(skip_all)]
async fn upload(
    State(state): State<ServiceState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let mut file = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::server("Falha no upload", err))?
    {
        if field.name() != Some("file") {
            continue;
        }
        // A `file` part without a filename is a plain form value, not an
        // upload.
        let Some(filename) = field.file_name().map(str::to_owned) else {
            continue;
        };

        let declared_type = field.content_type().map(str::to_owned);
        let content = field
            .bytes()
            .await
            .map_err(|err| ApiError::server("Falha no upload", err))?;

        file = Some((filename, declared_type, content));
        break;
    }

    let Some((filename, declared_type, content)) = file else {
        return Err(ApiError::Validation("Nenhum arquivo enviado"));
    };

    let key = state
        .objects
        .put(&filename, declared_type.as_deref(), content)
        .await
        .map_err(|err| ApiError::server("Falha no upload", err))?;

    Ok(Json(UploadResponse { ok: true, key }))
}

/// Response returned when listing objects.
#[derive(Debug, Serialize)]
struct ListResponse {
    ok: bool,
    items: Vec<ListItem>,
}

/// A single object summary in a listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListItem {
    key: String,
    size: u64,
    last_modified: String,
}

impl From<ObjectEntry> for ListItem {
    fn from(entry: ObjectEntry) -> Self {
        Self {
            key: entry.key,
            size: entry.size,
            last_modified: entry.last_modified,
        }
    }
}

#[tracing::instrument(skip_all)]
async fn files(State(state): State<ServiceState>) -> ApiResult<Json<ListResponse>> {
    let entries = state
        .objects
        .list()
        .await
        .map_err(|err| ApiError::server("Falha ao listar arquivos", err))?;

    let items = entries.into_iter().map(ListItem::from).collect();
    Ok(Json(ListResponse { ok: true, items }))
}

#[tracing::instrument(skip_all, fields(key))]
async fn download(
    State(state): State<ServiceState>,
    Path(key): Path<String>,
) -> ApiResult<Response> {
    let Some(download) = state
        .objects
        .get(&key)
        .await
        .map_err(|err| ApiError::server("Falha no download", err))?
    else {
        return Err(ApiError::NotFound("Arquivo não encontrado"));
    };

    // Force a save-as download named after the key's basename.
    let disposition = format!("attachment; filename=\"{}\"", key::basename(&key));
    let headers = [
        (header::CONTENT_TYPE, download.content_type),
        (header::CONTENT_DISPOSITION, disposition),
    ];

    Ok((headers, Body::from_stream(download.stream)).into_response())
}
