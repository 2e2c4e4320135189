//! Server-side HTML pages.
//!
//! Every piece of provider or user text goes through [`html_escape`].

use std::fmt::Write as _;

use monthcal_core::EventsView;

/// Escapes text for use in HTML element content and attribute values.
pub fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>{title}</title>\n\
         </head>\n\
         <body>\n\
         <h1>{title}</h1>\n\
         {body}\n\
         </body>\n\
         </html>\n",
        title = html_escape(title),
        body = body,
    )
}

/// The landing page with the login link.
pub fn home_page() -> String {
    layout(
        "Google Calendar",
        "<p>See everything on your calendar for the next month.</p>\n\
         <p><a href=\"/auth\">Log in with Google</a></p>",
    )
}

/// The events table, or the empty state when there is nothing to show.
pub fn events_page(view: &EventsView) -> String {
    let body = match view {
        EventsView::Empty => "<p>No upcoming events found.</p>".to_string(),
        EventsView::Events(events) => {
            let mut rows = String::new();
            for event in events {
                // Writing to a String cannot fail.
                let _ = writeln!(
                    rows,
                    "<tr><td>{}</td><td>{}</td></tr>",
                    html_escape(&event.date),
                    html_escape(&event.summary)
                );
            }
            format!(
                "<table>\n<thead><tr><th>Date</th><th>Summary</th></tr></thead>\n\
                 <tbody>\n{}</tbody>\n</table>",
                rows
            )
        }
    };
    layout(
        "Upcoming Events",
        &format!("{}\n<p><a href=\"/\">Home</a></p>", body),
    )
}

/// A failure page with a follow-up link.
pub fn error_page(title: &str, message: &str, link: (&str, &str)) -> String {
    let (href, label) = link;
    layout(
        title,
        &format!(
            "<p>{}</p>\n<p><a href=\"{}\">{}</a></p>",
            html_escape(message),
            html_escape(href),
            html_escape(label)
        ),
    )
}
