use askama::Template;
use axum::{
    Router,
    extract::{Query, State},
    response::{Html, IntoResponse},
    routing::get,
};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;

use crate::AppState;
use crate::auth::AuthUser;
use crate::calendar::{MonthView, TagFilter};
use crate::error::AppError;
use crate::models::Tag;

#[derive(Template)]
#[template(path = "calendar.html")]
struct CalendarTemplate {
    month_label: String,
    prev_href: String,
    next_href: String,
    clear_href: String,
    filter_active: bool,
    weeks: Vec<Vec<DayCell>>,
    tag_groups: Vec<TagGroup>,
    panel: Option<DayPanel>,
    static_hash: &'static str,
    email: String,
}

struct DayCell {
    day: u32,
    in_month: bool,
    selected: bool,
    href: String,
    posts: Vec<PostLink>,
}

struct PostLink {
    id: i64,
    title: String,
}

struct TagGroup {
    name: String,
    color: String,
    tags: Vec<TagOption>,
}

struct TagOption {
    name: String,
    color: String,
    active: bool,
    href: String,
}

struct DayPanel {
    date_label: String,
    close_href: String,
    new_href: String,
    posts: Vec<PostLink>,
}

#[derive(Deserialize)]
pub struct CalendarQuery {
    year: Option<i32>,
    month: Option<u32>,
    /// Comma-separated tag ids, e.g. "3,17".
    tags: Option<String>,
    day: Option<NaiveDate>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/calendar", get(calendar))
}

fn parse_tag_ids(raw: Option<&str>) -> Vec<i64> {
    raw.map(|csv| csv.split(',').filter_map(|s| s.trim().parse().ok()).collect())
        .unwrap_or_default()
}

fn calendar_href(year: i32, month: u32, ids: &[i64], day: Option<NaiveDate>) -> String {
    let mut href = format!("/calendar?year={year}&month={month}");
    if !ids.is_empty() {
        let csv: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        href.push_str(&format!("&tags={}", csv.join(",")));
    }
    if let Some(day) = day {
        href.push_str(&format!("&day={day}"));
    }
    href
}

fn prev_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 { (year - 1, 12) } else { (year, month - 1) }
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 { (year + 1, 1) } else { (year, month + 1) }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (ny, nm) = next_month(year, month);
    NaiveDate::from_ymd_opt(ny, nm, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(30)
}

/// Lay the month out as Sunday-first weeks. Cells outside the month are
/// blank padding.
fn month_weeks(
    year: i32,
    month: u32,
    view: &MonthView,
    ids: &[i64],
    selected: Option<NaiveDate>,
) -> Vec<Vec<DayCell>> {
    let buckets = view.buckets();
    let first = match NaiveDate::from_ymd_opt(year, month, 1) {
        Some(d) => d,
        None => return vec![],
    };
    let lead = first.weekday().num_days_from_sunday();
    let total = days_in_month(year, month);

    let blank = |weeks: &mut Vec<Vec<DayCell>>| {
        if let Some(week) = weeks.last_mut() {
            week.push(DayCell {
                day: 0,
                in_month: false,
                selected: false,
                href: String::new(),
                posts: vec![],
            });
        }
    };

    let mut weeks: Vec<Vec<DayCell>> = vec![Vec::with_capacity(7)];
    for _ in 0..lead {
        blank(&mut weeks);
    }
    for day in 1..=total {
        if weeks.last().map(|w| w.len()) == Some(7) {
            weeks.push(Vec::with_capacity(7));
        }
        let date = NaiveDate::from_ymd_opt(year, month, day).expect("valid day of month");
        let posts = buckets
            .get(&date)
            .map(|posts| {
                posts
                    .iter()
                    .map(|p| PostLink {
                        id: p.id,
                        title: p.title.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        weeks.last_mut().expect("week row exists").push(DayCell {
            day,
            in_month: true,
            selected: selected == Some(date),
            href: calendar_href(year, month, ids, Some(date)),
            posts,
        });
    }
    while weeks.last().map(|w| w.len()) != Some(7) {
        blank(&mut weeks);
    }
    weeks
}

/// Group the tag list by tag type for the filter panel, preserving
/// first-seen type order.
fn group_tags(tags: Vec<Tag>, filter: &TagFilter, year: i32, month: u32, ids: &[i64]) -> Vec<TagGroup> {
    let mut groups: Vec<TagGroup> = Vec::new();
    for tag in tags {
        let active = filter.is_active(tag.id);
        // Toggling a tag flips its id in the link's csv.
        let mut toggled: Vec<i64> = ids.iter().copied().filter(|&id| id != tag.id).collect();
        if !active {
            toggled.push(tag.id);
        }
        let option = TagOption {
            name: tag.name,
            color: tag.tag_type.color.clone(),
            active,
            href: calendar_href(year, month, &toggled, None),
        };
        match groups.iter_mut().find(|g| g.name == tag.tag_type.name) {
            Some(group) => group.tags.push(option),
            None => groups.push(TagGroup {
                name: tag.tag_type.name,
                color: tag.tag_type.color,
                tags: vec![option],
            }),
        }
    }
    groups
}

async fn calendar(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<CalendarQuery>,
) -> Result<impl IntoResponse, AppError> {
    let today = Utc::now().date_naive();
    // Clamp query-supplied values so month arithmetic stays in range.
    let year = query.year.unwrap_or_else(|| today.year()).clamp(1, 9999);
    let month = query.month.unwrap_or_else(|| today.month()).clamp(1, 12);
    let ids = parse_tag_ids(query.tags.as_deref());

    let mut view = MonthView::new();
    view.set_filter(TagFilter::from_ids(ids.iter().copied()));
    view.load(&state.api, year, month).await;
    if let Some(day) = query.day {
        view.select_day(day);
    }

    // The tag list loads independently of the posts; if it fails the grid
    // still renders, just without the filter panel.
    let tags = match state.api.tags().await {
        Ok(tags) => tags,
        Err(e) => {
            tracing::error!("Failed to fetch tags: {e}");
            vec![]
        }
    };

    let selected = view.selected_day();
    let panel = selected.map(|date| DayPanel {
        date_label: date.format("%B %e, %Y").to_string(),
        close_href: calendar_href(year, month, &ids, None),
        new_href: format!("/posts/new?date={date}"),
        posts: view
            .posts_for(date)
            .into_iter()
            .map(|p| PostLink {
                id: p.id,
                title: p.title,
            })
            .collect(),
    });

    let (py, pm) = prev_month(year, month);
    let (ny, nm) = next_month(year, month);
    let template = CalendarTemplate {
        month_label: NaiveDate::from_ymd_opt(year, month, 1)
            .map(|d| d.format("%B %Y").to_string())
            .unwrap_or_default(),
        prev_href: calendar_href(py, pm, &ids, None),
        next_href: calendar_href(ny, nm, &ids, None),
        clear_href: calendar_href(year, month, &[], None),
        filter_active: !ids.is_empty(),
        weeks: month_weeks(year, month, &view, &ids, selected),
        tag_groups: group_tags(tags, view.filter(), year, month, &ids),
        panel,
        static_hash: crate::STATIC_HASH,
        email: user.email,
    };
    Ok(Html(template.render()?))
}
