use std::collections::HashMap;

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect},
    routing::{get, post},
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::AppState;
use crate::api::ApiError;
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::{Post, PostInput, Tag};

#[derive(Template)]
#[template(path = "posts/show.html")]
struct PostTemplate {
    id: i64,
    title: String,
    content: String,
    created: String,
    tags: Vec<TagChip>,
    static_hash: &'static str,
    email: String,
}

struct TagChip {
    name: String,
    color: String,
}

#[derive(Template)]
#[template(path = "posts/form.html")]
struct PostFormTemplate {
    heading: String,
    action: String,
    title: String,
    content: String,
    date: String,
    tags_string: String,
    available_tags: Vec<String>,
    errors: HashMap<String, String>,
    static_hash: &'static str,
    email: String,
}

#[derive(Deserialize)]
pub struct NewPostQuery {
    /// Preset calendar day, from the calendar's empty-day panel.
    date: Option<NaiveDate>,
}

#[derive(Deserialize)]
pub struct PostForm {
    title: String,
    content: String,
    /// Comma-separated tag names.
    tags: Option<String>,
    /// Optional "YYYY-MM-DDTHH:MM" or "YYYY-MM-DD" local input value.
    date: Option<String>,
}

fn validate_post_form(form: &PostForm) -> HashMap<String, String> {
    let mut errors = HashMap::new();

    if form.title.trim().is_empty() {
        errors.insert("title".to_string(), "Title is required".to_string());
    }
    if form.title.len() > 500 {
        errors.insert("title".to_string(), "Title must be under 500 characters".to_string());
    }
    if let Some(date) = form.date.as_deref().filter(|d| !d.is_empty()) {
        if parse_form_date(date).is_none() {
            errors.insert("date".to_string(), "Date must be YYYY-MM-DD".to_string());
        }
    }

    errors
}

fn parse_form_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M") {
        return Some(dt.and_utc());
    }
    raw.parse::<NaiveDate>()
        .ok()
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .map(|dt| dt.and_utc())
}

fn split_tag_names(raw: Option<&str>) -> Vec<String> {
    raw.map(|csv| {
        csv.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

fn form_input(form: &PostForm) -> PostInput {
    PostInput {
        title: form.title.trim().to_string(),
        content: form.content.clone(),
        tags: split_tag_names(form.tags.as_deref()),
        created_at: form
            .date
            .as_deref()
            .filter(|d| !d.is_empty())
            .and_then(parse_form_date),
    }
}

async fn available_tag_names(state: &AppState) -> Vec<String> {
    match state.api.tags().await {
        Ok(tags) => tags.into_iter().map(|t: Tag| t.name).collect(),
        Err(e) => {
            tracing::error!("Failed to fetch tags: {e}");
            vec![]
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts/new", get(new_post_form))
        .route("/posts", post(create_post))
        .route("/posts/{id}", get(show_post))
        .route("/posts/{id}/edit", get(edit_post_form))
        .route("/posts/{id}", post(update_post))
        .route("/posts/{id}/delete", post(delete_post))
}

async fn show_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let post: Post = match state.api.post(id).await {
        Ok(post) => post,
        Err(ApiError::NotFound(_)) => return Err(AppError::NotFound),
        Err(e) => return Err(e.into()),
    };

    let template = PostTemplate {
        id: post.id,
        title: post.title,
        content: post.content,
        created: post.created_at.format("%B %e, %Y at %H:%M").to_string(),
        tags: post
            .tags
            .into_iter()
            .map(|tag| TagChip {
                name: tag.name,
                color: tag.tag_type.color,
            })
            .collect(),
        static_hash: crate::STATIC_HASH,
        email: user.email,
    };
    Ok(Html(template.render()?))
}

async fn new_post_form(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<NewPostQuery>,
) -> Result<impl IntoResponse, AppError> {
    let template = PostFormTemplate {
        heading: "New Post".to_string(),
        action: "/posts".to_string(),
        title: String::new(),
        content: String::new(),
        date: query.date.map(|d| d.to_string()).unwrap_or_default(),
        tags_string: String::new(),
        available_tags: available_tag_names(&state).await,
        errors: HashMap::new(),
        static_hash: crate::STATIC_HASH,
        email: user.email,
    };
    Ok(Html(template.render()?))
}

async fn create_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Form(form): Form<PostForm>,
) -> Result<impl IntoResponse, AppError> {
    let errors = validate_post_form(&form);
    if !errors.is_empty() {
        let template = PostFormTemplate {
            heading: "New Post".to_string(),
            action: "/posts".to_string(),
            title: form.title,
            content: form.content,
            date: form.date.unwrap_or_default(),
            tags_string: form.tags.unwrap_or_default(),
            available_tags: available_tag_names(&state).await,
            errors,
            static_hash: crate::STATIC_HASH,
            email: user.email,
        };
        return Ok(Html(template.render()?).into_response());
    }

    let created = state.api.create_post(&user.token, &form_input(&form)).await?;
    Ok(Redirect::to(&format!("/posts/{}", created.id)).into_response())
}

async fn edit_post_form(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let post = match state.api.post(id).await {
        Ok(post) => post,
        Err(ApiError::NotFound(_)) => return Err(AppError::NotFound),
        Err(e) => return Err(e.into()),
    };

    let tag_names: Vec<String> = post.tags.iter().map(|t| t.name.clone()).collect();
    let template = PostFormTemplate {
        heading: "Edit Post".to_string(),
        action: format!("/posts/{id}"),
        title: post.title,
        content: post.content,
        date: post.created_at.format("%Y-%m-%dT%H:%M").to_string(),
        tags_string: tag_names.join(", "),
        available_tags: available_tag_names(&state).await,
        errors: HashMap::new(),
        static_hash: crate::STATIC_HASH,
        email: user.email,
    };
    Ok(Html(template.render()?))
}

async fn update_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Form(form): Form<PostForm>,
) -> Result<impl IntoResponse, AppError> {
    let errors = validate_post_form(&form);
    if !errors.is_empty() {
        let template = PostFormTemplate {
            heading: "Edit Post".to_string(),
            action: format!("/posts/{id}"),
            title: form.title,
            content: form.content,
            date: form.date.unwrap_or_default(),
            tags_string: form.tags.unwrap_or_default(),
            available_tags: available_tag_names(&state).await,
            errors,
            static_hash: crate::STATIC_HASH,
            email: user.email,
        };
        return Ok(Html(template.render()?).into_response());
    }

    match state.api.update_post(&user.token, id, &form_input(&form)).await {
        Ok(_) => Ok(Redirect::to(&format!("/posts/{id}")).into_response()),
        Err(ApiError::NotFound(_)) => Err(AppError::NotFound),
        Err(e) => Err(e.into()),
    }
}

async fn delete_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    match state.api.delete_post(&user.token, id).await {
        Ok(()) => Ok(Redirect::to("/")),
        Err(ApiError::NotFound(_)) => Err(AppError::NotFound),
        Err(e) => Err(e.into()),
    }
}
