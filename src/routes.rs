use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::{
        HeaderMap, StatusCode,
        header::{CONTENT_LENGTH, CONTENT_TYPE},
    },
    response::{Html, IntoResponse},
};
use serde_json::Value;
use tracing::{info, warn};

use crate::{
    database::{REPORT_TTL, report_key},
    error::AppError,
    identity::derive_report_id,
    merge::{carry_profile, merge_avatar_and_title},
    models::{DEFAULT_EDIT_PW, Profile, ProfileUpdate, ReportRecord, UploadResponse},
    render::render_report,
    state::AppState,
};

pub const STUDENT_KEY_HEADER: &str = "x-eatbit-student-key";
pub const EDIT_PASSWORD_HEADER: &str = "x-edit-password";

/// Whole-document uploads carry a full report page with inlined assets.
pub const MAX_HTML_BYTES: usize = 500_000;
/// Structured uploads carry data only, the page is filled at read time.
pub const MAX_JSON_BYTES: usize = 300_000;

/// `POST /api/reports`. One endpoint for both upload shapes: a JSON
/// content type selects the structured revision, anything else is taken as a
/// whole report document.
pub async fn upload_report(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));

    let student_key = headers
        .get(STUDENT_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    let id = derive_report_id(student_key, state.config.report_salt.as_deref());
    let key = report_key(&id);

    let value = if is_json {
        build_record(&state, &headers, &key, body).await?
    } else {
        merge_html(&state, &key, body).await?
    };

    state.store.put(&key, value, REPORT_TTL).await?;
    info!("Stored report {id}");

    Ok(Json(UploadResponse {
        url: format!("{}/r/{id}", state.config.public_origin),
        id,
    }))
}

async fn build_record(
    state: &AppState,
    headers: &HeaderMap,
    key: &str,
    body: Bytes,
) -> Result<String, AppError> {
    let declared_len = headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<usize>().ok());
    if declared_len.is_some_and(|len| len > MAX_JSON_BYTES) || body.len() > MAX_JSON_BYTES {
        return Err(AppError::PayloadTooLarge);
    }

    let payload: Value = serde_json::from_slice(&body).map_err(|_| AppError::InvalidJson)?;

    let daily_stats = payload.get("daily_stats").filter(|v| !v.is_null()).cloned();
    let ach_state = payload.get("ach_state").filter(|v| !v.is_null()).cloned();
    let (Some(daily_stats), Some(ach_state)) = (daily_stats, ach_state) else {
        return Err(AppError::MissingFields);
    };

    let edit_pw = match payload.get("edit_pw").and_then(Value::as_str) {
        Some(pw) if !pw.is_empty() => pw.to_string(),
        _ => DEFAULT_EDIT_PW.to_string(),
    };

    // A read failure must not fail the upload, it only forfeits the old profile.
    let profile = match state.store.get(key).await {
        Ok(Some(old)) => carry_profile(&old).unwrap_or_default(),
        Ok(None) => Profile::default(),
        Err(e) => {
            warn!("Failed to read existing report at {key}: {e}");
            Profile::default()
        }
    };

    let record = ReportRecord {
        daily_stats,
        ach_state,
        edit_pw,
        profile,
    };

    Ok(serde_json::to_string(&record)?)
}

async fn merge_html(state: &AppState, key: &str, body: Bytes) -> Result<String, AppError> {
    if body.is_empty() || body.len() > MAX_HTML_BYTES {
        return Err(AppError::InvalidBody);
    }
    let html = String::from_utf8(body.to_vec()).map_err(|_| AppError::InvalidBody)?;

    match state.store.get(key).await {
        Ok(Some(old_html)) => Ok(merge_avatar_and_title(&old_html, &html)),
        Ok(None) => Ok(html),
        Err(e) => {
            warn!("Failed to read existing report at {key}: {e}");
            Ok(html)
        }
    }
}

/// `PUT /api/reports/{id}`. Raw save used by the report page's own save
/// button: anyone who knows the id may overwrite the document. The edit
/// password only gates profile patches.
pub async fn overwrite_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    if body.is_empty() || body.len() > MAX_HTML_BYTES {
        return Err(AppError::InvalidBody);
    }
    let html = String::from_utf8(body.to_vec()).map_err(|_| AppError::InvalidBody)?;

    state.store.put(&report_key(&id), html, REPORT_TTL).await?;
    info!("Overwrote report {id}");

    Ok("ok")
}

/// `PATCH /api/reports/{id}/profile`. The only password-gated mutation.
pub async fn patch_profile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let key = report_key(&id);

    let stored = state.store.get(&key).await?.ok_or(AppError::NotFound)?;
    let mut record: ReportRecord =
        serde_json::from_str(&stored).map_err(|_| AppError::CorruptedData)?;

    let provided = headers
        .get(EDIT_PASSWORD_HEADER)
        .and_then(|value| value.to_str().ok());
    if provided != Some(record.edit_pw.as_str()) {
        return Err(AppError::Forbidden);
    }

    let updates: Value = serde_json::from_slice(&body).map_err(|_| AppError::InvalidJson)?;
    record.profile.apply(ProfileUpdate::from_value(&updates)?);

    state
        .store
        .put(&key, serde_json::to_string(&record)?, REPORT_TTL)
        .await?;

    Ok(Json(serde_json::json!({ "success": true })))
}

/// `GET /r/{id}`. Stored documents are served verbatim, stored records are
/// rendered through the report template.
pub async fn view_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let stored = state
        .store
        .get(&report_key(&id))
        .await?
        .ok_or(AppError::NotFound)?;

    if stored.trim_start().starts_with('{') {
        let record: ReportRecord =
            serde_json::from_str(&stored).map_err(|_| AppError::CorruptedData)?;

        return Ok(Html(render_report(&state.template, &record, &id)));
    }

    Ok(Html(stored))
}

pub async fn index() -> impl IntoResponse {
    "Hello from the eatbit report server"
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not found")
}
