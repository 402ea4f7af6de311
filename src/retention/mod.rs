//! Permanent anonymization of accounts whose deletion grace period has lapsed.

mod scrubber;

pub use scrubber::{
    anonymize, cutoff_for, is_eligible, run, ScrubError, ScrubFailure, ScrubReport,
    RETENTION_WINDOW, SCRUBBED_EMAIL_DOMAIN,
};
