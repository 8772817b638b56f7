pub mod invoice;
pub mod lookup;
pub mod project;
pub mod purchase_order;
pub mod report;

use opsboard_core::error::{CoreError, FieldErrors};

/// Append one message to a field's error list.
pub(crate) fn push_field_error(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.into());
}

/// Fold a field-level [`CoreError`] into `errors`; other variants pass through.
pub(crate) fn merge_field_errors(errors: &mut FieldErrors, err: CoreError) -> Result<(), CoreError> {
    match err {
        CoreError::InvalidFields(fields) => {
            for (field, messages) in fields {
                errors.entry(field).or_default().extend(messages);
            }
            Ok(())
        }
        other => Err(other),
    }
}

/// `Err(InvalidFields)` when any field failed.
pub(crate) fn into_result(errors: FieldErrors) -> Result<(), CoreError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(CoreError::InvalidFields(errors))
    }
}
