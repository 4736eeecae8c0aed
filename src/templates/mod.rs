use handlebars::{no_escape, Handlebars};
use serde_json::json;

use crate::error::Result;
use crate::models::{CallerIdentity, NotificationKind, NotificationRequest, RenderedMessage};

pub const WELCOME_SUBJECT: &str = "Welcome to SciTech Support";
pub const PASSWORD_RESET_SUBJECT: &str = "Password Reset Request";

/// Greeting used when a welcome email has no full name
const FALLBACK_NAME: &str = "there";

const TEMPLATES: [(NotificationKind, &str, &str); 3] = [
    (
        NotificationKind::CommentNotification,
        include_str!("comment_notification.txt.hbs"),
        include_str!("comment_notification.html.hbs"),
    ),
    (
        NotificationKind::WelcomeEmail,
        include_str!("welcome_email.txt.hbs"),
        include_str!("welcome_email.html.hbs"),
    ),
    (
        NotificationKind::PasswordReset,
        include_str!("password_reset.txt.hbs"),
        include_str!("password_reset.html.hbs"),
    ),
];

/// Text and HTML template registries; HTML output escapes interpolated values
pub struct Renderer {
    text: Handlebars<'static>,
    html: Handlebars<'static>,
}

impl Renderer {
    pub fn new() -> Result<Self> {
        let mut text = Handlebars::new();
        text.set_strict_mode(true);
        text.register_escape_fn(no_escape);

        let mut html = Handlebars::new();
        html.set_strict_mode(true);
        html.register_escape_fn(escape_html);

        for (kind, text_source, html_source) in TEMPLATES {
            text.register_template_string(kind.as_str(), text_source)?;
            html.register_template_string(kind.as_str(), html_source)?;
        }

        Ok(Self { text, html })
    }

    pub fn render(
        &self,
        request: &NotificationRequest,
        caller: &CallerIdentity,
    ) -> Result<RenderedMessage> {
        let (subject, data) = match request {
            NotificationRequest::CommentNotification {
                ticket_no,
                comment,
                ticket_url,
                ..
            } => (
                format!("New comment on your support ticket #{}", ticket_no),
                json!({
                    "commenter": caller.display_name(),
                    "ticket_no": ticket_no,
                    "comment": comment,
                    "ticket_url": ticket_url,
                }),
            ),
            NotificationRequest::WelcomeEmail { full_name, .. } => (
                WELCOME_SUBJECT.to_string(),
                json!({ "full_name": full_name.as_deref().unwrap_or(FALLBACK_NAME) }),
            ),
            NotificationRequest::PasswordReset { reset_link, .. } => (
                PASSWORD_RESET_SUBJECT.to_string(),
                json!({ "reset_link": reset_link }),
            ),
        };

        let name = request.kind().as_str();
        Ok(RenderedMessage {
            subject,
            text_body: self.text.render(name, &data)?,
            html_body: self.html.render(name, &data)?,
        })
    }
}

/// Escape the characters that can break out of element content or a quoted attribute
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
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
