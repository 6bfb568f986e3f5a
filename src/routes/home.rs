use askama::Template;
use axum::{
    Router,
    extract::{Query, State},
    response::{Html, IntoResponse},
    routing::get,
};
use serde::Deserialize;

use crate::AppState;
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::Post;
use crate::routes::{PageLink, page_window, plain_excerpt};

const FEED_PAGE_SIZE: i64 = 5;
const EXCERPT_CHARS: usize = 300;

#[derive(Template)]
#[template(path = "index.html")]
struct HomeTemplate {
    posts: Vec<PostCard>,
    page: i64,
    total_pages: i64,
    pages: Vec<PageLink>,
    show_first: bool,
    show_last: bool,
    static_hash: &'static str,
    email: String,
}

pub struct PostCard {
    pub id: i64,
    pub title: String,
    pub created: String,
    pub excerpt: String,
    pub tags: Vec<TagChip>,
}

pub struct TagChip {
    pub name: String,
    pub color: String,
}

pub(crate) fn post_card(post: Post) -> PostCard {
    PostCard {
        id: post.id,
        title: post.title,
        created: post.created_at.format("%B %e, %Y at %H:%M").to_string(),
        excerpt: plain_excerpt(&post.content, EXCERPT_CHARS),
        tags: post
            .tags
            .into_iter()
            .map(|tag| TagChip {
                name: tag.name,
                color: tag.tag_type.color,
            })
            .collect(),
    }
}

#[derive(Deserialize)]
pub struct FeedQuery {
    page: Option<i64>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(feed))
}

async fn feed(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<FeedQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = query.page.unwrap_or(1).max(1);

    // A dead API renders as an empty feed, not an error page.
    let feed = match state.api.posts(page, FEED_PAGE_SIZE).await {
        Ok(feed) => feed,
        Err(e) => {
            tracing::error!("Failed to fetch posts: {e}");
            crate::models::PostPage {
                posts: vec![],
                total_pages: 0,
            }
        }
    };

    let window = page_window(page, feed.total_pages, 6);
    let template = HomeTemplate {
        posts: feed.posts.into_iter().map(post_card).collect(),
        page,
        total_pages: feed.total_pages,
        pages: window.pages,
        show_first: window.show_first,
        show_last: window.show_last,
        static_hash: crate::STATIC_HASH,
        email: user.email,
    };
    Ok(Html(template.render()?))
}
