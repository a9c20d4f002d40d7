//! HTTP boundary: one `POST /convert/<slug>` route per [`TargetKind`].
//!
//! Uploads are `multipart/form-data` with the document in the `file` field.
//! A success is the converted file as an attachment; a failure is an
//! [`ErrorBody`](crate::error::ErrorBody) as JSON with status 400 (validation)
//! or 500 (everything else).
//!
//! ```text
//! POST /convert/pdf-to-docx    .pdf  → .docx
//! POST /convert/pptx-to-pdf    .pptx → .pdf
//! POST /convert/xlsx-to-pdf    .xlsx → .pdf
//! POST /convert/xlsx-to-csv    .xlsx → .csv
//! POST /convert/docx-to-pdf    .docx → .pdf
//! GET  /health                       → 200 ok
//! ```

use crate::convert::Converter;
use crate::error::{ConvertError, FILE_TOO_LARGE, NO_FILE};
use crate::output::ConvertedFile;
use crate::request::{ConversionRequest, TargetKind};
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::net::SocketAddr;
use tracing::{debug, error, info};

/// Multipart field carrying the uploaded document.
pub const FILE_FIELD: &str = "file";

/// Default listen address of the `serve` command.
pub const DEFAULT_BIND: &str = "0.0.0.0:8080";

// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the router. Each request runs in its own workspace, so the router
/// can be served with any degree of concurrency.
pub fn router(converter: Converter) -> Router {
    let limit = match converter.config().max_upload_bytes {
        0 => DefaultBodyLimit::disable(),
        n => DefaultBodyLimit::max(
            usize::try_from(n)
                .unwrap_or(usize::MAX)
                .saturating_add(MULTIPART_OVERHEAD),
        ),
    };

    let mut app = Router::new().route("/health", get(|| async { "ok" }));
    for target in TargetKind::ALL {
        app = app.route(
            &format!("/convert/{}", target.slug()),
            post(
                move |State(converter): State<Converter>, multipart: Multipart| async move {
                    convert_upload(converter, target, multipart).await
                },
            ),
        );
    }
    app.layer(limit).with_state(converter)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(converter: Converter, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(converter)).await
}

async fn convert_upload(
    converter: Converter,
    target: TargetKind,
    mut multipart: Multipart,
) -> Result<Response, ConvertError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        upload = Some((name, bytes));
        break;
    }
    let (name, bytes) = upload.ok_or_else(|| ConvertError::validation(NO_FILE))?;

    let file = converter
        .convert_to_bytes(ConversionRequest::new(bytes.to_vec(), name, target))
        .await?;
    Ok(attachment(file))
}

fn multipart_error(e: MultipartError) -> ConvertError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ConvertError::validation(FILE_TOO_LARGE)
    } else {
        debug!("unreadable multipart body: {}", e.body_text());
        ConvertError::validation(NO_FILE)
    }
}

fn attachment(file: ConvertedFile) -> Response {
    let disposition = format!(
        "attachment; filename=\"{}\"",
        header_safe_filename(&file.file_name)
    );
    let disposition = HeaderValue::from_str(&disposition)
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(file.mime_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    )
        .into_response()
}

/// Restrict a download name to what fits in a quoted header parameter.
fn header_safe_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect()
}

impl IntoResponse for ConvertError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!("request failed: {self}");
        } else {
            debug!("request rejected: {self}");
        }
        (status, Json(self.to_body())).into_response()
    }
}
