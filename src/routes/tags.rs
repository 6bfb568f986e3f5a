use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect},
    routing::{get, post},
};
use serde::Deserialize;
use url::form_urlencoded;

use crate::AppState;
use crate::api::ApiError;
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::{Tag, TagType};

const DEFAULT_COLOR: &str = "#6b7280";

#[derive(Template)]
#[template(path = "tags/list.html")]
struct TagListTemplate {
    tags: Vec<TagRow>,
    tag_types: Vec<TagType>,
    error: Option<String>,
    notice: Option<String>,
    static_hash: &'static str,
    email: String,
}

struct TagRow {
    id: i64,
    name: String,
    type_name: String,
    color: String,
}

#[derive(Deserialize)]
pub struct TagListQuery {
    error: Option<String>,
    notice: Option<String>,
}

#[derive(Deserialize)]
pub struct NewTagForm {
    name: String,
    tag_type: String,
}

#[derive(Deserialize)]
pub struct NewTagTypeForm {
    name: String,
    color: Option<String>,
}

#[derive(Deserialize)]
pub struct TagTypeColorForm {
    color: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tags", get(list_tags))
        .route("/tags", post(create_tag))
        .route("/tags/{id}/delete", post(delete_tag))
        .route("/tags/types", post(create_tag_type))
        .route("/tags/types/{id}", post(update_tag_type))
        .route("/tags/types/{id}/delete", post(delete_tag_type))
}

fn banner_href(param: &str, message: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(message.as_bytes()).collect();
    format!("/tags?{param}={encoded}")
}

fn redirect_error(message: &str) -> Redirect {
    Redirect::to(&banner_href("error", message))
}

fn redirect_notice(message: &str) -> Redirect {
    Redirect::to(&banner_href("notice", message))
}

async fn list_tags(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<TagListQuery>,
) -> Result<impl IntoResponse, AppError> {
    // Both listings degrade to empty on gateway failure.
    let tags: Vec<Tag> = match state.api.tags().await {
        Ok(tags) => tags,
        Err(e) => {
            tracing::error!("Failed to fetch tags: {e}");
            vec![]
        }
    };
    let tag_types = match state.api.tag_types().await {
        Ok(types) => types,
        Err(e) => {
            tracing::error!("Failed to fetch tag types: {e}");
            vec![]
        }
    };

    let template = TagListTemplate {
        tags: tags
            .into_iter()
            .map(|tag| TagRow {
                id: tag.id,
                name: tag.name,
                type_name: tag.tag_type.name,
                color: tag.tag_type.color,
            })
            .collect(),
        tag_types,
        error: query.error,
        notice: query.notice,
        static_hash: crate::STATIC_HASH,
        email: user.email,
    };
    Ok(Html(template.render()?))
}

async fn create_tag(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Form(form): Form<NewTagForm>,
) -> Result<impl IntoResponse, AppError> {
    let name = form.name.trim();
    if name.is_empty() {
        return Ok(redirect_error("Tag name cannot be empty"));
    }

    match state.api.create_tag(&user.token, name, form.tag_type.trim()).await {
        Ok(_) => Ok(redirect_notice("Tag created")),
        Err(ApiError::Validation(_)) => Ok(redirect_error("Tag was rejected by the API")),
        Err(ApiError::Conflict(_)) => Ok(redirect_error("A tag with that name already exists")),
        Err(e) => Err(e.into()),
    }
}

async fn delete_tag(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    match state.api.delete_tag(&user.token, id).await {
        Ok(()) => Ok(redirect_notice("Tag deleted")),
        Err(ApiError::NotFound(_)) => Ok(redirect_error("That tag no longer exists")),
        Err(e) => Err(e.into()),
    }
}

async fn create_tag_type(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Form(form): Form<NewTagTypeForm>,
) -> Result<impl IntoResponse, AppError> {
    let name = form.name.trim();
    if name.is_empty() {
        return Ok(redirect_error("Tag type name cannot be empty"));
    }
    let color = form
        .color
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_COLOR);

    match state.api.create_tag_type(&user.token, name, color).await {
        Ok(_) => Ok(redirect_notice("Tag type created")),
        Err(ApiError::Validation(_)) => Ok(redirect_error("Tag type was rejected by the API")),
        Err(ApiError::Conflict(_)) => Ok(redirect_error("A tag type with that name already exists")),
        Err(e) => Err(e.into()),
    }
}

async fn update_tag_type(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Form(form): Form<TagTypeColorForm>,
) -> Result<impl IntoResponse, AppError> {
    match state.api.update_tag_type(&user.token, id, form.color.trim()).await {
        Ok(_) => Ok(redirect_notice("Tag type updated")),
        Err(ApiError::NotFound(_)) => Ok(redirect_error("That tag type no longer exists")),
        Err(e) => Err(e.into()),
    }
}

/// Deleting a tag type that still has tags is refused by the API; the
/// two failure modes get distinct banner wording.
async fn delete_tag_type(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    match state.api.delete_tag_type(&user.token, id).await {
        Ok(()) => Ok(redirect_notice("Tag type deleted")),
        Err(ApiError::Conflict(_)) => {
            Ok(redirect_error("Tag type still has tags and cannot be deleted"))
        }
        Err(ApiError::NotFound(_)) => Ok(redirect_error("That tag type no longer exists")),
        Err(e) => Err(e.into()),
    }
}
