pub mod auth;
pub mod calendar;
pub mod export;
pub mod home;
pub mod posts;
pub mod search;
pub mod tags;

/// Strip markup from rich-text content and cut it down to a preview.
///
/// Content arrives as trusted HTML from the remote API; for list views we
/// only want the text. Tags are dropped wholesale, entities are left as
/// they are, and the cut happens on a char boundary with an ellipsis.
pub(crate) fn plain_excerpt(html: &str, max_chars: usize) -> String {
    let mut text = String::new();
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => text.push(c),
            _ => {}
        }
    }
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.chars().count() > max_chars {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}...")
    } else {
        text
    }
}

/// A window of page numbers around the current page, for pagination
/// controls. `show_first`/`show_last` tell the template whether to render
/// jump links outside the window.
pub(crate) struct PageWindow {
    pub pages: Vec<PageLink>,
    pub show_first: bool,
    pub show_last: bool,
}

pub(crate) struct PageLink {
    pub number: i64,
    pub current: bool,
}

pub(crate) fn page_window(page: i64, total_pages: i64, max_pages: i64) -> PageWindow {
    // `page` comes straight from the query string; saturate rather than
    // trust it to stay in range.
    let mut start = page.saturating_sub(max_pages / 2).max(1);
    let mut end = start.saturating_add(max_pages - 1);
    if end > total_pages {
        end = total_pages;
        start = (end - max_pages + 1).max(1);
    }
    PageWindow {
        pages: (start..=end)
            .map(|number| PageLink {
                number,
                current: number == page,
            })
            .collect(),
        show_first: start > 1,
        show_last: end < total_pages,
    }
}
