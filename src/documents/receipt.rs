use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::accounts::User;
use crate::documents::{
    format::{consent_timestamp, display_timestamp},
    layout::{Layout, INCH},
    style::StyleName,
    DocumentError,
};

pub const RECEIPT_TITLE: &str = "Policy Acceptance Receipt";
const CONSENT_ID_LEN: usize = 16;

/// Fingerprint of one acceptance event: the first 16 uppercase hex digits of
/// `SHA-256("<user id>:<accepted at>:<version>")`.
pub fn consent_id(
    user_id: Uuid,
    accepted_at: Option<OffsetDateTime>,
    version: &str,
) -> Result<String, DocumentError> {
    if version.trim().is_empty() {
        return Err(DocumentError::MissingPolicyVersion);
    }
    let material = format!("{user_id}:{}:{version}", consent_timestamp(accepted_at)?);
    let mut id = hex::encode_upper(Sha256::digest(material.as_bytes()));
    id.truncate(CONSENT_ID_LEN);
    Ok(id)
}

pub fn receipt_layout(
    user: &User,
    version: &str,
    organization: &str,
) -> Result<Layout, DocumentError> {
    let consent_id = consent_id(user.id, user.policy_accepted_at, version)?;
    let timestamp = match user.policy_accepted_at {
        Some(at) => display_timestamp(at)?,
        None => "N/A".to_string(),
    };

    let mut layout = Layout::new(RECEIPT_TITLE);
    layout
        .spacer(0.5 * INCH)
        .paragraph(StyleName::Title, RECEIPT_TITLE)
        .spacer(0.3 * INCH)
        .paragraph(StyleName::Heading, "User Information:")
        .paragraph(StyleName::Body, format!("Full Name: {}", user.display_name()))
        .paragraph(StyleName::Body, format!("Email: {}", user.email))
        .paragraph(StyleName::Heading, "Acceptance Details:")
        .paragraph(StyleName::Body, format!("Policy Version: v{version}"))
        .paragraph(StyleName::Body, format!("Timestamp: {timestamp}"))
        .paragraph(StyleName::Body, format!("Consent ID: {consent_id}"))
        .spacer(INCH)
        .paragraph(StyleName::Heading, "Legal Acknowledgement:")
        .paragraph(
            StyleName::Body,
            format!(
                "By accepting these terms, you have agreed to {organization}'s data processing \
                 agreement, privacy policy, and terms of service. This document serves as a \
                 digital proof of consent."
            ),
        );
    Ok(layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::repo_types::sample_user;
    use time::macros::datetime;

    const USER_ID: Uuid = Uuid::from_u128(1);

    #[test]
    fn consent_id_matches_known_digests() {
        assert_eq!(
            consent_id(USER_ID, Some(datetime!(2024-01-01 00:00 UTC)), "1.0").unwrap(),
            "4005790ECD758215"
        );
        assert_eq!(consent_id(USER_ID, None, "1.0").unwrap(), "967EC1FFAE44645A");
        assert_eq!(
            consent_id(USER_ID, Some(datetime!(2024-05-17 09:30:15.25 UTC)), "2.1").unwrap(),
            "7622D629E531A2B7"
        );
    }

    #[test]
    fn consent_id_is_deterministic_and_input_sensitive() {
        let at = Some(datetime!(2024-03-03 03:03 UTC));
        let base = consent_id(USER_ID, at, "1.0").unwrap();

        assert_eq!(base, consent_id(USER_ID, at, "1.0").unwrap());
        assert_eq!(base.len(), 16);
        assert!(base.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));

        assert_ne!(base, consent_id(Uuid::from_u128(2), at, "1.0").unwrap());
        assert_ne!(
            base,
            consent_id(USER_ID, Some(datetime!(2024-03-03 03:04 UTC)), "1.0").unwrap()
        );
        assert_ne!(base, consent_id(USER_ID, at, "1.1").unwrap());
    }

    #[test]
    fn consent_id_rejects_blank_version() {
        assert!(matches!(
            consent_id(USER_ID, None, "  "),
            Err(DocumentError::MissingPolicyVersion)
        ));
    }

    #[test]
    fn receipt_lists_acceptance_details() {
        let mut user = sample_user("grace@example.com");
        user.first_name = "Grace".into();
        user.last_name = "Hopper".into();
        user.accept_policy("2.0", datetime!(2024-06-01 14:45 UTC));

        let layout = receipt_layout(&user, "2.0", "SecureMed").unwrap();
        let text = layout.plain_text();

        assert_eq!(layout.title, RECEIPT_TITLE);
        assert!(text.contains("Full Name: Grace Hopper"));
        assert!(text.contains("Email: grace@example.com"));
        assert!(text.contains("Policy Version: v2.0"));
        assert!(text.contains("Timestamp: June 01, 2024 at 14:45 UTC"));
        let expected = consent_id(user.id, user.policy_accepted_at, "2.0").unwrap();
        assert!(text.contains(&format!("Consent ID: {expected}")));
        assert!(text.contains("SecureMed's data processing agreement"));
    }

    #[test]
    fn receipt_without_acceptance_shows_na() {
        let user = sample_user("grace@example.com");
        let layout = receipt_layout(&user, "1.0", "SecureMed").unwrap();
        let text = layout.plain_text();
        assert!(text.contains("Timestamp: N/A"));
        assert!(text.contains("Full Name: grace"));
    }

    #[test]
    fn scrubbed_account_receipt_names_deleted_user() {
        let mut user = sample_user("grace@example.com");
        crate::retention::anonymize(&mut user, &mut rand::thread_rng());
        let text = receipt_layout(&user, "1.0", "SecureMed").unwrap().plain_text();
        assert!(text.contains("Full Name: Deleted User"));
    }
}
