use axum::{
    extract::{multipart::MultipartRejection, Host, Multipart, Path, State},
    http::{header, HeaderMap},
    response::{Html, IntoResponse},
    Json,
};

use crate::adapters::http::error::ApiResult;
use crate::adapters::http::state::HttpState;
use crate::application::dto::{HealthResponse, UploadForm, UploadedImage};
use crate::application::ports::ImageBucket;
use crate::domain::{errors::DomainError, prediction::PredictionReport};

const INDEX_HTML: &str = r#"<!doctype html>
<html>
  <head><meta charset="utf-8"><title>Weed detection</title></head>
  <body>
    <h2>YOLO weed detection with fertilizer recommendation</h2>
    <p>Upload an image to detect weeds and get fertilizer suggestions.</p>
    <form action="/predict" method="post" enctype="multipart/form-data">
      <input type="file" name="file">
      <input type="submit" value="Upload &amp; Detect">
    </form>
  </body>
</html>
"#;

const IMAGE_CONTENT_TYPE: &str = "image/jpeg";

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Origen público de la petición (`esquema://host`) para construir URLs absolutas.
/// El host llega ya resuelto por el extractor `Host` (Forwarded, X-Forwarded-Host, Host, URI).
pub fn base_url(headers: &HeaderMap, host: Option<&str>, fallback_host: &str) -> String {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("http");
    let host = host.filter(|h| !h.is_empty()).unwrap_or(fallback_host);
    format!("{scheme}://{host}")
}

/// `filename=""` declarado pero vacío: input de fichero enviado sin seleccionar nada.
fn declares_filename(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("filename="))
}

/// Recoge las partes con fichero de los campos `file` e `image` (la primera de cada uno).
async fn read_upload_form(mut multipart: Multipart) -> ApiResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        // Sin filename no es un fichero: se ignora como haría un formulario normal.
        let filename = match field.file_name() {
            Some(name) => name.to_string(),
            None if declares_filename(field.headers()) => String::new(),
            None => continue,
        };
        let slot = match field.name() {
            Some("file") => &mut form.file,
            Some("image") => &mut form.image,
            _ => continue,
        };
        if slot.is_some() {
            continue;
        }
        let bytes = field.bytes().await?;
        *slot = Some(UploadedImage { filename, bytes: bytes.to_vec() });
    }
    Ok(form)
}

pub async fn predict(
    State(st): State<HttpState>,
    host: Option<Host>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<PredictionReport>> {
    // Un cuerpo que no es multipart equivale a no haber subido nada.
    let form = match multipart {
        Ok(multipart) => read_upload_form(multipart).await?,
        Err(_) => UploadForm::default(),
    };
    let upload = form.into_upload()?;

    let base = base_url(&headers, host.as_ref().map(|Host(h)| h.as_str()), &st.fallback_host);
    let report = st.prediction.predict(upload, &base).await?;
    Ok(Json(report))
}

async fn serve_image(st: &HttpState, bucket: ImageBucket, filename: &str) -> ApiResult<impl IntoResponse> {
    let bytes = st.prediction.fetch(bucket, filename).await.map_err(|e| match e {
        DomainError::NotFound(name) => DomainError::NotFound(format!("File not found: {name}")),
        other => other,
    })?;
    Ok(([(header::CONTENT_TYPE, IMAGE_CONTENT_TYPE)], bytes))
}

pub async fn result_image(State(st): State<HttpState>, Path(filename): Path<String>) -> ApiResult<impl IntoResponse> {
    serve_image(&st, ImageBucket::Results, &filename).await
}

pub async fn uploaded_image(State(st): State<HttpState>, Path(filename): Path<String>) -> ApiResult<impl IntoResponse> {
    serve_image(&st, ImageBucket::Uploads, &filename).await
}

pub async fn health(State(st): State<HttpState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        classes: st.prediction.class_count(),
        fertilizers: st.prediction.fertilizer_count(),
    })
}
