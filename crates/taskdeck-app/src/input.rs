//! Validation of user-facing inputs before they reach the stores.

use taskdeck_core::{NewTodo, ProfilePatch, TodoPatch};
use thiserror::Error;
use time::{OffsetDateTime, UtcOffset, format_description::well_known::Rfc3339};
use unicode_segmentation::UnicodeSegmentation;

/// Maximum title length in grapheme clusters.
pub const MAX_TITLE_LEN: usize = 100;
/// Maximum description length in grapheme clusters.
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Error type returned while normalizing user input.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("title is {len} characters long (max {max})")]
    TitleTooLong { len: usize, max: usize },
    #[error("description is {len} characters long (max {max})")]
    DescriptionTooLong { len: usize, max: usize },
    #[error("name must not be empty")]
    EmptyName,
    #[error("email must not be empty")]
    EmptyEmail,
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
    #[error("invalid due date (RFC3339 required): {source}")]
    InvalidDueDate {
        #[source]
        source: time::error::Parse,
    },
}

/// Result alias for input helpers.
pub type InputResult<T> = Result<T, InputError>;

/// Raw fields of the add/edit todo form.
#[derive(Debug, Clone, Default)]
pub struct TodoForm {
    /// Title as typed.
    pub title: String,
    /// Description as typed.
    pub description: String,
    /// Due date (RFC3339) as typed.
    pub due: Option<String>,
}

impl TodoForm {
    /// Normalize into a [`NewTodo`].
    ///
    /// # Errors
    /// Returns an error when the title is blank, a field is too long, or the due
    /// date does not parse.
    pub fn into_new_todo(self) -> InputResult<NewTodo> {
        let title = normalize_title(&self.title)?;
        let description = normalize_description(&self.description)?;
        let due_date = self.due.as_deref().map(parse_due).transpose()?;

        Ok(NewTodo {
            title,
            description: (!description.is_empty()).then_some(description),
            due_date,
        })
    }
}

/// Raw fields of an edit request. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct TodoEditForm {
    /// New title.
    pub title: Option<String>,
    /// New description (empty clears).
    pub description: Option<String>,
    /// New due date (RFC3339).
    pub due: Option<String>,
    /// Drop the due date.
    pub clear_due: bool,
}

impl TodoEditForm {
    /// Normalize into a [`TodoPatch`].
    ///
    /// # Errors
    /// Returns an error when a provided field fails validation.
    pub fn into_patch(self) -> InputResult<TodoPatch> {
        let mut patch = TodoPatch::default();
        if let Some(title) = self.title {
            patch.title = Some(normalize_title(&title)?);
        }
        if let Some(description) = self.description {
            patch.description = Some(normalize_description(&description)?);
        }
        if self.clear_due {
            patch = patch.clear_due();
        } else if let Some(due) = self.due {
            patch = patch.due(parse_due(&due)?);
        }
        Ok(patch)
    }
}

/// Raw fields of the profile form.
#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    /// Display name as typed.
    pub name: String,
    /// Email as typed.
    pub email: String,
}

impl ProfileForm {
    /// Normalize into a [`ProfilePatch`].
    ///
    /// # Errors
    /// Returns an error when the name or email is blank or the email is malformed.
    pub fn into_patch(self) -> InputResult<ProfilePatch> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(InputError::EmptyName);
        }
        let email = self.email.trim();
        if email.is_empty() {
            return Err(InputError::EmptyEmail);
        }
        if !looks_like_email(email) {
            return Err(InputError::InvalidEmail(email.to_owned()));
        }
        Ok(ProfilePatch {
            name: Some(name.to_owned()),
            email: Some(email.to_owned()),
            avatar: None,
        })
    }
}

/// Trim and bound a title.
///
/// # Errors
/// Returns an error for blank or over-long titles.
pub fn normalize_title(raw: &str) -> InputResult<String> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(InputError::EmptyTitle);
    }
    let len = title.graphemes(true).count();
    if len > MAX_TITLE_LEN {
        return Err(InputError::TitleTooLong {
            len,
            max: MAX_TITLE_LEN,
        });
    }
    Ok(title.to_owned())
}

/// Trim and bound a description.
///
/// # Errors
/// Returns an error for over-long descriptions.
pub fn normalize_description(raw: &str) -> InputResult<String> {
    let description = raw.trim();
    let len = description.graphemes(true).count();
    if len > MAX_DESCRIPTION_LEN {
        return Err(InputError::DescriptionTooLong {
            len,
            max: MAX_DESCRIPTION_LEN,
        });
    }
    Ok(description.to_owned())
}

/// Parse an RFC3339 due date and normalize it to UTC.
///
/// # Errors
/// Returns an error if the string does not conform to RFC3339.
pub fn parse_due(raw: &str) -> InputResult<OffsetDateTime> {
    OffsetDateTime::parse(raw.trim(), &Rfc3339)
        .map(|due| due.to_offset(UtcOffset::UTC))
        .map_err(|source| InputError::InvalidDueDate { source })
}

// `local@domain` without whitespace, where some dot in `domain` has text on both sides.
fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .match_indices('.')
        .any(|(idx, _)| idx > 0 && idx + 1 < domain.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn todo_form_trims_and_drops_empty_description() {
        let todo = TodoForm {
            title: "  Buy milk ".into(),
            description: "   ".into(),
            due: Some("2025-01-01T09:00:00+09:00".into()),
        }
        .into_new_todo()
        .unwrap_or_else(|err| panic!("valid form: {err}"));

        assert_eq!(todo.title, "Buy milk");
        assert_eq!(todo.description, None);
        assert_eq!(todo.due_date, Some(datetime!(2025-01-01 00:00 UTC)));
        assert_eq!(todo.due_date.map(OffsetDateTime::offset), Some(UtcOffset::UTC));
    }

    #[test]
    fn todo_form_rejects_blank_title() {
        let result = TodoForm {
            title: " \t".into(),
            ..TodoForm::default()
        }
        .into_new_todo();
        assert!(matches!(result, Err(InputError::EmptyTitle)));
    }

    #[test]
    fn length_limits_count_graphemes() {
        let flags = "🇯🇵".repeat(MAX_TITLE_LEN);
        assert!(normalize_title(&flags).is_ok());

        let too_long = "a".repeat(MAX_TITLE_LEN + 1);
        assert!(matches!(
            normalize_title(&too_long),
            Err(InputError::TitleTooLong { len: 101, max: 100 })
        ));
        assert!(normalize_description(&"b".repeat(MAX_DESCRIPTION_LEN + 1)).is_err());
    }

    #[test]
    fn edit_form_builds_patch() {
        let patch = TodoEditForm {
            title: Some(" Walk dog ".into()),
            description: Some(String::new()),
            due: Some("2025-03-01T10:00:00Z".into()),
            clear_due: true,
        }
        .into_patch()
        .unwrap_or_else(|err| panic!("valid edit: {err}"));

        assert_eq!(patch.title.as_deref(), Some("Walk dog"));
        assert_eq!(patch.description.as_deref(), Some(""));
        assert_eq!(patch.due_date, Some(taskdeck_core::DueDatePatch::Clear));
        assert!(TodoEditForm::default().into_patch().is_ok_and(|patch| patch.is_empty()));
    }

    #[test]
    fn rejects_malformed_due_dates() {
        assert!(matches!(parse_due("tomorrow"), Err(InputError::InvalidDueDate { .. })));
    }

    #[test]
    fn profile_form_validates_email() {
        let patch = ProfileForm {
            name: " Ada ".into(),
            email: " ada@example.com ".into(),
        }
        .into_patch()
        .unwrap_or_else(|err| panic!("valid profile: {err}"));
        assert_eq!(patch.name.as_deref(), Some("Ada"));
        assert_eq!(patch.email.as_deref(), Some("ada@example.com"));

        for email in [
            "ada",
            "ada@",
            "@example.com",
            "ada@example",
            "ada@.example",
            "ada@example.",
            "a da@example.com",
            "a@b@c.d",
        ] {
            let result = ProfileForm {
                name: "Ada".into(),
                email: email.into(),
            }
            .into_patch();
            assert!(matches!(result, Err(InputError::InvalidEmail(_))), "{email} must be rejected");
        }

        let result = ProfileForm {
            name: "  ".into(),
            email: "ada@example.com".into(),
        }
        .into_patch();
        assert!(matches!(result, Err(InputError::EmptyName)));
    }

    #[test]
    fn email_domain_needs_one_inner_dot() {
        for email in ["a@b.c.", "a@b..c", "ada@mail.example.co.uk"] {
            let result = ProfileForm {
                name: "Ada".into(),
                email: email.into(),
            }
            .into_patch();
            assert!(result.is_ok(), "{email} must be accepted");
        }
    }
}
