use time::{macros::format_description, OffsetDateTime, UtcOffset};

use crate::documents::DocumentError;

/// Rendered into the consent id when the user has not accepted a policy yet.
pub const UNSET_CONSENT_TIMESTAMP: &str = "None";

/// `January 31, 2024 at 00:00 UTC`
pub fn display_timestamp(at: OffsetDateTime) -> Result<String, DocumentError> {
    at.to_offset(UtcOffset::UTC)
        .format(format_description!(
            "[month repr:long] [day], [year] at [hour]:[minute] UTC"
        ))
        .map_err(|e| DocumentError::Rendering(e.to_string()))
}

/// `2024-01-31 00:00:00+00:00`, with `.ffffff` appended when there are microseconds.
///
/// This rendering is hashed into consent ids, so changing it invalidates every id issued so far.
pub fn consent_timestamp(at: Option<OffsetDateTime>) -> Result<String, DocumentError> {
    let Some(at) = at else {
        return Ok(UNSET_CONSENT_TIMESTAMP.to_string());
    };
    let at = at.to_offset(UtcOffset::UTC);
    let formatted = if at.microsecond() == 0 {
        at.format(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second]+00:00"
        ))
    } else {
        at.format(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]+00:00"
        ))
    };
    formatted.map_err(|e| DocumentError::Rendering(e.to_string()))
}
