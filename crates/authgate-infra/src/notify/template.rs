//! Password-change email body, rendered with Tera (HTML autoescaped).

use tera::{Context, Tera};

use authgate_core::domain::PasswordChangeNotice;
use authgate_core::ports::NotifyError;

pub const SUBJECT: &str = "Your password has been changed";

const TEMPLATE_NAME: &str = "password_changed.html";

/// Compiled notice template.
pub struct NoticeTemplate {
    tera: Tera,
}

impl NoticeTemplate {
    pub fn new() -> Result<Self, NotifyError> {
        let mut tera = Tera::default();
        tera.add_raw_template(
            TEMPLATE_NAME,
            include_str!("../../templates/password_changed.html"),
        )
        .map_err(|e| NotifyError::Template(e.to_string()))?;

        Ok(Self { tera })
    }

    /// Render the HTML body for a notice.
    pub fn render(&self, notice: &PasswordChangeNotice) -> Result<String, NotifyError> {
        let mut context = Context::new();
        context.insert("name", notice.display_name());
        context.insert("date", &notice.changed_at.format("%B %-d, %Y").to_string());
        context.insert("time", &notice.changed_at.format("%H:%M UTC").to_string());

        self.tera
            .render(TEMPLATE_NAME, &context)
            .map_err(|e| NotifyError::Template(e.to_string()))
    }
}
