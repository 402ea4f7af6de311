use time::OffsetDateTime;

use crate::accounts::User;
use crate::documents::{
    format::display_timestamp,
    layout::{Layout, INCH},
    style::StyleName,
    DocumentError,
};
use crate::retention::RETENTION_WINDOW;

pub const CERTIFICATE_TITLE: &str = "Account Deletion Certificate";

/// Content of the certificate handed out when a user asks for their account to be deleted.
pub fn certificate_layout(
    user: &User,
    organization: &str,
    generated_at: OffsetDateTime,
) -> Result<Layout, DocumentError> {
    let requested_at = user
        .deletion_requested_at
        .ok_or(DocumentError::MissingDeletionRequest(user.id))?;
    let scheduled_at = requested_at + RETENTION_WINDOW;
    let grace_days = RETENTION_WINDOW.whole_days();

    let mut layout = Layout::new(CERTIFICATE_TITLE);
    layout
        .spacer(0.5 * INCH)
        .paragraph(StyleName::Title, CERTIFICATE_TITLE)
        .spacer(0.3 * INCH)
        .paragraph(StyleName::Heading, "Certificate of Account Deletion Request")
        .spacer(0.2 * INCH)
        .field(StyleName::Body, "User Email", user.email.as_str())
        .field(StyleName::Body, "User ID", user.id.to_string())
        .spacer(0.2 * INCH)
        .paragraph(StyleName::Heading, "Deletion Request Details:")
        .paragraph(
            StyleName::Body,
            format!("Request Date: {}", display_timestamp(requested_at)?),
        )
        .paragraph(
            StyleName::Body,
            format!("Scheduled Deletion Date: {}", display_timestamp(scheduled_at)?),
        )
        .spacer(0.3 * INCH)
        .paragraph(StyleName::Heading, "Important Notice:")
        .paragraph(
            StyleName::Body,
            "This certificate confirms that your account deletion request has been received \
             and processed. Your account has been immediately deactivated. All personally \
             identifiable information (PII) will be permanently removed from our systems on \
             the scheduled deletion date shown above.",
        )
        .paragraph(
            StyleName::Body,
            format!(
                "You have a {grace_days}-day grace period during which you may contact support \
                 to cancel this deletion request and restore your account. After the scheduled \
                 deletion date, this action cannot be reversed."
            ),
        )
        .spacer(0.5 * INCH)
        .paragraph(
            StyleName::Footer,
            format!("Generated on {}", display_timestamp(generated_at)?),
        )
        .paragraph(
            StyleName::Footer,
            format!("{organization} - Privacy & Data Protection"),
        );
    Ok(layout)
}
