use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{auth::AuthUser, state::AppState};

use super::dto::{ProfileResponse, UpdateProfileRequest};
use super::repo::{self, ProfileUpdate};

const AVATAR_URL_TTL: std::time::Duration = std::time::Duration::from_secs(600);

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route(
            "/profile/avatar",
            get(get_avatar)
                .post(upload_avatar)
                .layer(DefaultBodyLimit::max(5 * 1024 * 1024)),
        )
}

fn internal(e: impl std::fmt::Display) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProfileResponse>, (StatusCode, String)> {
    let response = match repo::get(&state.db, user_id).await.map_err(internal)? {
        Some(record) => ProfileResponse::from_record(record),
        None => ProfileResponse::defaults(user_id),
    };
    Ok(Json(response))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, (StatusCode, String)> {
    payload
        .validate()
        .map_err(|msg| (StatusCode::UNPROCESSABLE_ENTITY, msg))?;

    let record = repo::upsert(
        &state.db,
        user_id,
        ProfileUpdate {
            first_name: payload.first_name.as_deref(),
            last_name: payload.last_name.as_deref(),
            calorie_goal: payload.calorie_goal,
            protein_goal: payload.protein_goal,
            carb_goal: payload.carb_goal,
            fat_goal: payload.fat_goal,
        },
    )
    .await
    .map_err(internal)?;

    info!(user_id = %user_id, "profile updated");
    Ok(Json(ProfileResponse::from_record(record)))
}

/// POST /profile/avatar (multipart, field `file`)
#[instrument(skip(state, mp))]
pub async fn upload_avatar(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut mp: Multipart,
) -> Result<StatusCode, (StatusCode, String)> {
    let mut upload = None;
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| (e.status(), e.body_text()))?
    {
        if field.name() == Some("file") {
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".into());
            let data = field
                .bytes()
                .await
                .map_err(|e| (e.status(), e.body_text()))?;
            upload = Some((data, content_type));
        }
    }
    let Some((body, content_type)) = upload else {
        return Err((StatusCode::BAD_REQUEST, "file is required".into()));
    };

    let Some(ext) = ext_from_mime(&content_type) else {
        return Err((
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            format!("unsupported content type {content_type}"),
        ));
    };

    let key = format!("avatars/{}/{}.{}", user_id, Uuid::new_v4(), ext);
    state
        .storage
        .upload(&key, body, &content_type)
        .await
        .map_err(internal)?;

    let previous = repo::set_avatar_key(&state.db, user_id, &key)
        .await
        .map_err(internal)?;
    if let Some(old_key) = previous {
        if let Err(e) = state.storage.remove(&old_key).await {
            warn!(error = %e, key = %old_key, "failed to delete previous avatar");
        }
    }

    info!(user_id = %user_id, key = %key, "avatar uploaded");
    Ok(StatusCode::CREATED)
}

/// 302 → presigned URL of the current avatar.
#[instrument(skip(state))]
pub async fn get_avatar(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let record = repo::get(&state.db, user_id).await.map_err(internal)?;
    let Some(key) = record.and_then(|p| p.avatar_key) else {
        return Err((StatusCode::NOT_FOUND, "No avatar set".into()));
    };
    let url = state
        .storage
        .download_url(&key, AVATAR_URL_TTL)
        .await
        .map_err(internal)?;
    Ok(Redirect::temporary(&url))
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ext_from_mime_covers_supported_images() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("application/pdf"), None);
    }

    #[tokio::test]
    async fn fake_storage_presigns_avatar_keys() {
        let state = crate::state::AppState::fake();
        let url = state
            .storage
            .download_url("avatars/u/a.jpg", AVATAR_URL_TTL)
            .await
            .unwrap();
        assert!(url.contains("avatars/u/a.jpg"));
    }

    #[tokio::test]
    async fn truncated_avatar_upload_surfaces_the_read_error() {
        use axum::body::Body;
        use axum::extract::FromRef;
        use axum::http::{header, Request};
        use http_body_util::BodyExt;
        use tower::ServiceExt;

        use crate::auth::jwt::JwtKeys;

        let state = crate::state::AppState::fake();
        let token = JwtKeys::from_ref(&state)
            .sign_access(Uuid::new_v4())
            .expect("sign token");
        let app = Router::new().merge(routes()).with_state(state);

        // Stream ends mid-headers; the multipart reader must report that,
        // not fall through to the missing-field response.
        let body = "--BOUND\r\nContent-Disposition: form-data; name=\"file\"";
        let response = app
            .oneshot(
                Request::post("/profile/avatar")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "multipart/form-data; boundary=BOUND")
                    .body(Body::from(body))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = response.into_body().collect().await.expect("body").to_bytes();
        let text = String::from_utf8_lossy(&bytes);
        assert_ne!(text, "file is required");
    }
}
