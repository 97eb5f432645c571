//! HTML fragments of a session's current listing.

use coursedesk_core::NavigationSession;
use coursedesk_db::entities::content_item::{self, ContentKind, MediaType};

/// Escape HTML special characters.
#[must_use]
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Render the breadcrumbs, heading and cards of the displayed listing.
///
/// Views without content render an empty container the client fills in.
/// Admins get a sortable grid unless a filter narrows the listing.
#[must_use]
pub fn section_fragment(session: &NavigationSession, is_admin: bool) -> String {
    let view = session.view();
    let Some(section) = view.section() else {
        return format!("<section class=\"view\" data-view=\"{}\"></section>", view.as_str());
    };

    let mut html = format!(
        "<section class=\"view\" data-view=\"{}\">",
        html_escape(view.as_str())
    );

    if session.current_folder().is_some() {
        html.push_str(&breadcrumbs(session));
    }

    let heading = if session.current_folder().is_some() {
        "Folder Contents"
    } else {
        section.heading()
    };
    html.push_str(&format!("<h2>{}</h2>", html_escape(heading)));

    let items = session.displayed_items();
    if items.is_empty() {
        let message = match session.filter() {
            Some(term) => format!("No results found for \"{}\".", html_escape(term)),
            None => "This section is empty.".to_string(),
        };
        html.push_str(&format!("<p class=\"empty\">{message}</p>"));
    } else {
        let sortable = is_admin && !session.is_filtered();
        html.push_str(&format!(
            "<div id=\"content-list\" class=\"content-grid\" data-sortable=\"{sortable}\">"
        ));
        for item in &items {
            html.push_str(&card(item));
        }
        html.push_str("</div>");
    }

    html.push_str("</section>");
    html
}

fn breadcrumbs(session: &NavigationSession) -> String {
    let mut html = String::from(
        "<nav class=\"breadcrumbs\"><a href=\"#\" data-folder-id=\"\">Back to Root</a>",
    );
    for (index, crumb) in session.breadcrumbs().iter().enumerate() {
        let title = crumb.title.as_deref().unwrap_or("…");
        html.push_str(&format!(
            "<span class=\"sep\">/</span><a href=\"#\" data-folder-id=\"{}\" data-index=\"{index}\">{}</a>",
            html_escape(&crumb.id),
            html_escape(title)
        ));
    }
    html.push_str("</nav>");
    html
}

fn card(item: &content_item::Model) -> String {
    let kind = match item.kind {
        ContentKind::Folder => "folder",
        ContentKind::Video => "video",
        ContentKind::File => "file",
        ContentKind::Announcement => "announcement",
    };
    let id = html_escape(&item.id);
    let title = html_escape(&item.title);

    let mut html = format!("<article class=\"card card-{kind}\" data-id=\"{id}\">");

    if item.kind.is_folder() {
        html.push_str(&format!(
            "<a href=\"#\" class=\"open-folder\" data-folder-id=\"{id}\" data-title=\"{title}\"><h3>{title}</h3></a>"
        ));
        html.push_str("</article>");
        return html;
    }

    html.push_str(&format!("<h3>{title}</h3>"));

    if let Some(label) = &item.topic_label {
        let topic = match item.topic_index {
            Some(index) => format!("{index}. {label}"),
            None => label.clone(),
        };
        html.push_str(&format!("<p class=\"topic\">{}</p>", html_escape(&topic)));
    }

    if let Some(body) = &item.body {
        html.push_str(&format!("<p class=\"body\">{}</p>", html_escape(body)));
    }

    if let Some(url) = &item.primary_url {
        html.push_str(&format!(
            "<a class=\"primary\" href=\"{}\" target=\"_blank\" rel=\"noopener\">Open</a>",
            html_escape(url)
        ));
    }

    let attachments = item.attachment_list();
    if !attachments.is_empty() {
        html.push_str("<ul class=\"attachments\">");
        for attachment in attachments {
            let media = match attachment.media_type {
                MediaType::Video => "video",
                MediaType::File => "file",
            };
            html.push_str(&format!(
                "<li class=\"{media}\"><a href=\"{}\" target=\"_blank\" rel=\"noopener\">{}</a></li>",
                html_escape(&attachment.url),
                html_escape(&attachment.name)
            ));
        }
        html.push_str("</ul>");
    }

    html.push_str("</article>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use coursedesk_core::{CourseContext, View};
    use coursedesk_db::entities::content_item::{Attachment, Section, attachments_to_json};
    use coursedesk_db::test_utils::fixtures;

    fn session_with(items: Vec<content_item::Model>) -> NavigationSession {
        let mut session = NavigationSession::new(10);
        session.enter_course(CourseContext {
            course_id: "course1".to_string(),
            sub_group: None,
        });
        session.set_view(View::Section(Section::Content));
        session.set_listing(items);
        session
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape("<a href=\"x\">Tom & Jerry's</a>"),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#x27;s&lt;/a&gt;"
        );
    }

    #[test]
    fn test_root_fragment_uses_section_heading() {
        let html = section_fragment(&session_with(vec![fixtures::folder("f", "Unit 1")]), true);

        assert!(html.contains("<h2>Way to Content</h2>"));
        assert!(!html.contains("Back to Root"));
        assert!(html.contains("data-sortable=\"true\""));
        assert!(html.contains("data-folder-id=\"f\""));
    }

    #[test]
    fn test_folder_fragment_has_breadcrumbs() {
        let mut session = session_with(Vec::new());
        session.navigate_to(Some("f"), None, Some("Unit <1>"));
        session.set_listing(Vec::new());

        let html = section_fragment(&session, false);

        assert!(html.contains("Back to Root"));
        assert!(html.contains("Unit &lt;1&gt;"));
        assert!(html.contains("<h2>Folder Contents</h2>"));
        assert!(html.contains("This section is empty."));
    }

    #[test]
    fn test_filtered_fragment_is_not_sortable() {
        let mut session = session_with(vec![fixtures::item("v", ContentKind::Video, 0)]);
        session.set_filter("zzz");
        assert!(section_fragment(&session, true).contains("No results found for \"zzz\"."));

        session.set_filter("item");
        let html = section_fragment(&session, true);
        assert!(html.contains("data-sortable=\"false\""));
    }

    #[test]
    fn test_card_lists_attachments() {
        let mut item = fixtures::item("f1", ContentKind::File, 0);
        item.attachments = attachments_to_json(&[Attachment {
            name: "sheet.pdf".to_string(),
            url: "https://blobs.example/course_uploads/1_sheet.pdf".to_string(),
            media_type: MediaType::File,
        }]);

        let html = card(&item);

        assert!(html.contains("class=\"card card-file\""));
        assert!(html.contains(">sheet.pdf</a>"));
    }

    #[test]
    fn test_non_section_view_is_an_empty_container() {
        let mut session = NavigationSession::new(10);
        session.set_view(View::Students);

        assert_eq!(
            section_fragment(&session, true),
            "<section class=\"view\" data-view=\"students\"></section>"
        );
    }
}
