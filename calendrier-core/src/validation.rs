//! Input validation for drafts and patches.
//!
//! Runs before any store call; nothing that fails here reaches storage.

use crate::error::ValidationErrors;
use crate::event::{EventDate, EventDraft, EventPatch, NewEvent, ValidatedPatch};

/// Validate a full draft: `date` must parse, `titre` and `description`
/// must be non-empty after trimming.
pub fn validate(draft: &EventDraft) -> Result<NewEvent, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let date = match draft.date.as_deref() {
        None => {
            errors.push("date", "date is required");
            None
        }
        Some(raw) => check_date(raw, &mut errors),
    };
    let titre = required_text("titre", draft.titre.as_deref(), &mut errors);
    let description = required_text("description", draft.description.as_deref(), &mut errors);

    match (date, titre, description) {
        (Some(date), Some(titre), Some(description)) if errors.is_empty() => Ok(NewEvent {
            date,
            titre,
            description,
        }),
        _ => Err(errors),
    }
}

/// Validate only the fields a patch supplies.
pub fn validate_patch(patch: &EventPatch) -> Result<ValidatedPatch, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let date = patch
        .date
        .as_deref()
        .and_then(|raw| check_date(raw, &mut errors));
    let titre = patch
        .titre
        .as_deref()
        .and_then(|t| required_text("titre", Some(t), &mut errors));
    let description = patch
        .description
        .as_deref()
        .and_then(|d| required_text("description", Some(d), &mut errors));

    errors.into_result(ValidatedPatch {
        date,
        titre,
        description,
    })
}

fn check_date(raw: &str, errors: &mut ValidationErrors) -> Option<EventDate> {
    match raw.parse::<EventDate>() {
        Ok(date) => Some(date),
        Err(message) => {
            errors.push("date", message);
            None
        }
    }
}

fn required_text(
    field: &'static str,
    value: Option<&str>,
    errors: &mut ValidationErrors,
) -> Option<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        Some(_) => {
            errors.push(field, format!("{field} must not be empty"));
            None
        }
        None => {
            errors.push(field, format!("{field} is required"));
            None
        }
    }
}
