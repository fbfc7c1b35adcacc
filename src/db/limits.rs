//! Column widths, in characters. The migrations build their `VARCHAR`
//! columns from these and the handlers reject longer values with a 400.

use super::models::{BlogPostDraft, NewMessage, ProjectDraft};

pub const USERNAME: usize = 50;
pub const TITLE: usize = 255;
pub const CATEGORY: usize = 100;
pub const YEAR: usize = 10;
pub const PROJECT_TYPE: usize = 50;
pub const CLIENT: usize = 100;
pub const PROJECT_ROLE: usize = 100;
pub const POST_DATE: usize = 50;
pub const READ_TIME: usize = 20;
pub const AUTHOR_NAME: usize = 100;
pub const AUTHOR_ROLE: usize = 100;
pub const SENDER_NAME: usize = 100;
pub const SENDER_EMAIL: usize = 100;
pub const SERVICE: usize = 100;
pub const BUDGET: usize = 50;

/// Postgres counts `VARCHAR(n)` in characters, not bytes.
fn check(field: &str, value: Option<&str>, max: usize) -> Result<(), String> {
    match value {
        Some(v) if v.chars().count() > max => {
            Err(format!("{} must be at most {} characters", field, max))
        }
        _ => Ok(()),
    }
}

pub fn check_project(draft: &ProjectDraft) -> Result<(), String> {
    check("title", Some(&draft.title), TITLE)?;
    check("category", draft.category.as_deref(), CATEGORY)?;
    check("year", draft.year.as_deref(), YEAR)?;
    check("type", draft.kind.as_deref(), PROJECT_TYPE)?;
    check("client", draft.client.as_deref(), CLIENT)?;
    check("role", draft.role.as_deref(), PROJECT_ROLE)
}

pub fn check_post(draft: &BlogPostDraft) -> Result<(), String> {
    check("title", Some(&draft.title), TITLE)?;
    check("date", draft.date.as_deref(), POST_DATE)?;
    check("readTime", draft.read_time.as_deref(), READ_TIME)?;
    check("category", draft.category.as_deref(), CATEGORY)?;
    if let Some(author) = &draft.author {
        check("author name", author.name.as_deref(), AUTHOR_NAME)?;
        check("author role", author.role.as_deref(), AUTHOR_ROLE)?;
    }
    Ok(())
}

pub fn check_message(message: &NewMessage) -> Result<(), String> {
    check("name", Some(&message.name), SENDER_NAME)?;
    check("email", Some(&message.email), SENDER_EMAIL)?;
    check("service", message.service.as_deref(), SERVICE)?;
    check("budget", message.budget.as_deref(), BUDGET)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_counts_characters() {
        // 10 characters, 20 bytes.
        let year = "ğğğğğğğğğğ".to_string();
        let mut draft = ProjectDraft {
            title: "T".to_string(),
            year: Some(year),
            ..Default::default()
        };
        assert!(check_project(&draft).is_ok());

        draft.year = Some("2023 - 2024".to_string());
        assert_eq!(
            check_project(&draft).unwrap_err(),
            "year must be at most 10 characters"
        );
    }

    #[test]
    fn test_message_widths_match_proposals_columns() {
        let mut message = NewMessage {
            name: "n".repeat(SENDER_NAME),
            email: "a@x.com".to_string(),
            service: None,
            budget: Some("$1k - $5k".to_string()),
            message: "Hi".to_string(),
        };
        assert!(check_message(&message).is_ok());
        message.name.push('n');
        assert!(check_message(&message).is_err());
    }
}
