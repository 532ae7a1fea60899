use chrono::{DateTime, Utc};
use tera::{Context, Tera};

use crate::config::Program;
use crate::submission::Submission;

const CONFIRMATION: &str = "application_confirmation.html";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locale {
    Vietnamese,
    English,
}

impl Locale {
    /// `"vi"` selects Vietnamese; every other value falls back to English.
    pub fn from_language(language: &str) -> Self {
        if language == "vi" {
            Locale::Vietnamese
        } else {
            Locale::English
        }
    }

    /// Matches `toLocaleDateString` for vi-VN and en-US.
    pub fn format_date(&self, at: DateTime<Utc>) -> String {
        match self {
            Locale::Vietnamese => at.format("%-d/%-m/%Y").to_string(),
            Locale::English => at.format("%-m/%-d/%Y").to_string(),
        }
    }

    pub fn lang_tag(&self) -> &'static str {
        match self {
            Locale::Vietnamese => "vi",
            Locale::English => "en",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Clone)]
pub struct EmailTemplates {
    tera: Tera,
    program: Program,
}

impl EmailTemplates {
    pub fn new(program: Program) -> Result<Self, anyhow::Error> {
        let mut tera = Tera::default();

        // Registered under an .html name so tera escapes every interpolated value.
        tera.add_raw_template(
            CONFIRMATION,
            include_str!("../../templates/application_confirmation.html"),
        )?;

        Ok(Self { tera, program })
    }

    pub fn subject(&self, locale: Locale) -> String {
        match locale {
            Locale::Vietnamese => format!("Xác nhận ứng tuyển - Chương trình {}", self.program.name),
            Locale::English => format!("Application Confirmation - {} Program", self.program.name),
        }
    }

    pub fn render_confirmation(
        &self,
        submission: &Submission,
        submitted_at: DateTime<Utc>,
    ) -> Result<RenderedEmail, tera::Error> {
        let locale = submission.locale;
        let subject = self.subject(locale);

        let mut context = Context::new();
        context.insert("lang", locale.lang_tag());
        context.insert("subject", &subject);
        context.insert("program", &self.program);
        context.insert("name", &submission.name);
        context.insert("fullname", &submission.fullname);
        context.insert("email", &submission.email);
        context.insert("submitted", &locale.format_date(submitted_at));

        let html = self.tera.render(CONFIRMATION, &context)?;

        Ok(RenderedEmail { subject, html })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn submission(language: &str) -> Submission {
        Submission {
            name: "An".to_string(),
            fullname: "Nguyen Van An".to_string(),
            email: "An@Example.com".to_string(),
            lookup_email: "an@example.com".to_string(),
            locale: Locale::from_language(language),
        }
    }

    fn templates() -> EmailTemplates {
        EmailTemplates::new(Program::default()).unwrap()
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 7, 9, 30, 0).unwrap()
    }

    #[test]
    fn locale_selection_is_binary() {
        assert_eq!(Locale::from_language("vi"), Locale::Vietnamese);
        assert_eq!(Locale::from_language("en"), Locale::English);
        assert_eq!(Locale::from_language("VI"), Locale::English);
        assert_eq!(Locale::from_language("fr"), Locale::English);
    }

    #[test]
    fn dates_follow_locale_order() {
        assert_eq!(Locale::Vietnamese.format_date(at()), "7/3/2025");
        assert_eq!(Locale::English.format_date(at()), "3/7/2025");
    }

    #[test]
    fn renders_vietnamese_copy() {
        let rendered = templates().render_confirmation(&submission("vi"), at()).unwrap();

        assert_eq!(rendered.subject, "Xác nhận ứng tuyển - Chương trình GTP 2025");
        assert!(rendered.html.contains("Chào An,"));
        assert!(rendered.html.contains("Họ và tên:"));
        assert!(rendered.html.contains("Nguyen Van An"));
        assert!(rendered.html.contains("7/3/2025"));
        assert!(rendered.html.contains("<html lang=\"vi\">"));
        assert!(!rendered.html.contains("Dear An"));
    }

    #[test]
    fn renders_english_copy_for_other_languages() {
        let rendered = templates().render_confirmation(&submission("de"), at()).unwrap();

        assert_eq!(rendered.subject, "Application Confirmation - GTP 2025 Program");
        assert!(rendered.html.contains("Dear An,"));
        assert!(rendered.html.contains("Full Name:"));
        assert!(rendered.html.contains("An@Example.com"));
        assert!(rendered.html.contains("3/7/2025"));
        assert!(rendered.html.contains("hr@vinamilk.com.vn"));
    }

    #[test]
    fn escapes_user_supplied_text() {
        let mut hostile = submission("en");
        hostile.name = "<script>alert(1)</script>".to_string();
        hostile.fullname = "<b onclick=\"x\">An</b>".to_string();

        let rendered = templates().render_confirmation(&hostile, at()).unwrap();

        assert!(!rendered.html.contains("<script>"));
        assert!(!rendered.html.contains("<b onclick"));
        assert!(rendered.html.contains("&lt;script&gt;"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let templates = templates();
        let first = templates.render_confirmation(&submission("vi"), at()).unwrap();
        let second = templates.render_confirmation(&submission("vi"), at()).unwrap();
        assert_eq!(first, second);
    }
}
