use std::io::Write;

use rand::{rngs::StdRng, Rng, SeedableRng};
use time::{Duration, OffsetDateTime};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::accounts::{password::make_unusable_password, StoreError, User, UserStore};
use crate::documents::format::consent_timestamp;

/// Time between a deletion request and the permanent scrub.
pub const RETENTION_WINDOW: Duration = Duration::days(30);
pub const SCRUBBED_EMAIL_DOMAIN: &str = "scrubbed.local";
const SCRUBBED_FIRST_NAME: &str = "Deleted";
const SCRUBBED_LAST_NAME: &str = "User";

#[derive(Debug, thiserror::Error)]
pub enum ScrubError {
    #[error("could not load users pending deletion: {0}")]
    Store(#[from] StoreError),
    #[error("could not write progress: {0}")]
    Output(#[from] std::io::Error),
}

#[derive(Debug)]
pub struct ScrubFailure {
    pub user_id: Uuid,
    pub error: StoreError,
}

#[derive(Debug)]
pub struct ScrubReport {
    pub cutoff: OffsetDateTime,
    pub scrubbed: usize,
    pub failed: Vec<ScrubFailure>,
}

impl ScrubReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

pub fn cutoff_for(now: OffsetDateTime) -> OffsetDateTime {
    now - RETENTION_WINDOW
}

pub fn is_eligible(user: &User, cutoff: OffsetDateTime) -> bool {
    !user.is_active && user.deletion_requested_at.is_some_and(|at| at <= cutoff)
}

/// Overwrite every identifying field and invalidate credentials in place.
pub fn anonymize<R: Rng>(user: &mut User, rng: &mut R) {
    user.username = placeholder(user.id, rng);
    user.email = format!("{}@{SCRUBBED_EMAIL_DOMAIN}", placeholder(user.id, rng));
    user.first_name = SCRUBBED_FIRST_NAME.to_string();
    user.last_name = SCRUBBED_LAST_NAME.to_string();

    user.password_hash = make_unusable_password(rng);
    user.mfa_secret = None;
    user.mfa_enabled = false;
    user.mfa_recovery_codes.clear();

    user.deletion_requested_at = None;
}

fn placeholder<R: Rng>(id: Uuid, rng: &mut R) -> String {
    format!("deleted_{}_{:08x}", id, rng.gen::<u32>())
}

/// Scrub every eligible user, writing operator progress to `out`.
///
/// A failed save is logged and recorded in the report; the remaining users are still processed.
/// Only a failure to load the eligible set aborts the run.
#[instrument(skip(store, out))]
pub async fn run<W: Write>(
    store: &dyn UserStore,
    now: OffsetDateTime,
    out: &mut W,
) -> Result<ScrubReport, ScrubError> {
    let cutoff = cutoff_for(now);
    let shown = consent_timestamp(Some(cutoff)).unwrap_or_else(|_| cutoff.to_string());
    writeln!(out, "Searching for users requesting deletion before {shown}...")?;

    let users = store.find_eligible_for_scrub(cutoff).await.map_err(|e| {
        error!(error = %e, "eligible user query failed");
        e
    })?;

    let mut report = ScrubReport {
        cutoff,
        scrubbed: 0,
        failed: Vec::new(),
    };

    if users.is_empty() {
        info!("no users pending permanent deletion");
        writeln!(out, "No users found pending permanent deletion.")?;
        return Ok(report);
    }

    let mut rng = StdRng::from_entropy();
    for mut user in users {
        writeln!(out, "Scrubbing user ID {} (formerly {})...", user.id, user.email)?;
        let user_id = user.id;
        anonymize(&mut user, &mut rng);

        match store.save(&user).await {
            Ok(()) => {
                info!(%user_id, "user scrubbed");
                report.scrubbed += 1;
            }
            Err(e) => {
                error!(%user_id, error = %e, "failed to save scrubbed user; continuing");
                writeln!(out, "Failed to scrub user ID {user_id}: {e}")?;
                report.failed.push(ScrubFailure { user_id, error: e });
            }
        }
    }

    if report.is_clean() {
        writeln!(out, "✓ Successfully scrubbed {} users.", report.scrubbed)?;
    } else {
        warn!(
            scrubbed = report.scrubbed,
            failed = report.failed.len(),
            "scrub finished with failures"
        );
        writeln!(
            out,
            "Scrubbed {} users; {} could not be saved.",
            report.scrubbed,
            report.failed.len()
        )?;
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::{memory::MemoryUserStore, password, repo_types::sample_user};
    use regex::Regex;
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2024-03-01 12:00 UTC);

    fn pending(email: &str, requested_at: OffsetDateTime) -> User {
        let mut user = sample_user(email);
        user.mfa_secret = Some("JBSWY3DPEHPK3PXP".into());
        user.mfa_enabled = true;
        user.mfa_recovery_codes = vec!["aaaa-bbbb".into(), "cccc-dddd".into()];
        user.request_deletion(requested_at);
        user
    }

    fn assert_scrubbed(user: &User) {
        let username_re = Regex::new(&format!("^deleted_{}_[0-9a-f]{{8}}$", user.id)).unwrap();
        let email_re = Regex::new(&format!(
            r"^deleted_{}_[0-9a-f]{{8}}@scrubbed\.local$",
            user.id
        ))
        .unwrap();
        assert!(username_re.is_match(&user.username), "{}", user.username);
        assert!(email_re.is_match(&user.email), "{}", user.email);
        assert_eq!(user.first_name, "Deleted");
        assert_eq!(user.last_name, "User");
        assert!(!password::is_password_usable(&user.password_hash));
        assert!(!password::verify_password("correct-horse", &user.password_hash).unwrap());
        assert_eq!(user.mfa_secret, None);
        assert!(!user.mfa_enabled);
        assert!(user.mfa_recovery_codes.is_empty());
        assert_eq!(user.deletion_requested_at, None);
    }

    #[test]
    fn eligibility_requires_inactive_and_old_request() {
        let cutoff = cutoff_for(NOW);

        let old = pending("old@example.com", cutoff - Duration::days(1));
        assert!(is_eligible(&old, cutoff));

        let at_cutoff = pending("edge@example.com", cutoff);
        assert!(is_eligible(&at_cutoff, cutoff));

        let recent = pending("recent@example.com", cutoff + Duration::seconds(1));
        assert!(!is_eligible(&recent, cutoff));

        let mut reactivated = pending("back@example.com", cutoff - Duration::days(5));
        reactivated.is_active = true;
        assert!(!is_eligible(&reactivated, cutoff));

        let mut inactive_only = sample_user("banned@example.com");
        inactive_only.is_active = false;
        assert!(!is_eligible(&inactive_only, cutoff));
    }

    #[test]
    fn cutoff_is_thirty_days_back() {
        assert_eq!(cutoff_for(NOW), datetime!(2024-01-31 12:00 UTC));
    }

    #[test]
    fn anonymize_wipes_pii_and_credentials() {
        let mut user = pending("ada@example.com", NOW - Duration::days(40));
        user.first_name = "Ada".into();
        user.last_name = "Lovelace".into();
        let id = user.id;

        anonymize(&mut user, &mut rand::thread_rng());

        assert_eq!(user.id, id);
        assert_scrubbed(&user);
        assert!(!user.email.contains("ada"));
    }

    #[tokio::test]
    async fn run_scrubs_only_eligible_users() {
        let old = pending("old@example.com", NOW - Duration::days(31));
        let recent = pending("recent@example.com", NOW - Duration::days(29));
        let active = sample_user("active@example.com");
        let mut active_with_stale_request = pending("undo@example.com", NOW - Duration::days(90));
        active_with_stale_request.is_active = true;

        let store = MemoryUserStore::with_users([
            old.clone(),
            recent.clone(),
            active.clone(),
            active_with_stale_request.clone(),
        ]);
        let mut out = Vec::new();

        let report = run(&store, NOW, &mut out).await.unwrap();

        assert_eq!(report.scrubbed, 1);
        assert!(report.is_clean());
        assert_scrubbed(&store.get(old.id).unwrap());
        assert_eq!(store.get(recent.id).unwrap(), recent);
        assert_eq!(store.get(active.id).unwrap(), active);
        assert_eq!(
            store.get(active_with_stale_request.id).unwrap(),
            active_with_stale_request
        );

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains(&format!("Scrubbing user ID {} (formerly old@example.com)", old.id)));
        assert!(out.contains("Successfully scrubbed 1 users."));
    }

    #[tokio::test]
    async fn cutoff_is_printed_at_microsecond_precision() {
        let store = MemoryUserStore::default();
        let mut out = Vec::new();
        run(&store, datetime!(2024-03-01 12:00:00.123456789 UTC), &mut out)
            .await
            .unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with(
            "Searching for users requesting deletion before 2024-01-31 12:00:00.123456+00:00..."
        ));

        let mut out = Vec::new();
        run(&store, NOW, &mut out).await.unwrap();
        assert!(String::from_utf8(out)
            .unwrap()
            .starts_with("Searching for users requesting deletion before 2024-01-31 12:00:00+00:00..."));
    }

    #[tokio::test]
    async fn second_run_scrubs_nothing() {
        let store = MemoryUserStore::with_users([
            pending("a@example.com", NOW - Duration::days(45)),
            pending("b@example.com", NOW - Duration::days(60)),
        ]);

        let first = run(&store, NOW, &mut Vec::new()).await.unwrap();
        assert_eq!(first.scrubbed, 2);

        let mut out = Vec::new();
        let second = run(&store, NOW, &mut out).await.unwrap();
        assert_eq!(second.scrubbed, 0);
        assert!(second.is_clean());
        assert!(String::from_utf8(out)
            .unwrap()
            .contains("No users found pending permanent deletion."));
    }

    #[tokio::test]
    async fn empty_store_reports_zero() {
        let store = MemoryUserStore::default();
        let report = run(&store, NOW, &mut Vec::new()).await.unwrap();
        assert_eq!(report.scrubbed, 0);
        assert_eq!(report.cutoff, cutoff_for(NOW));
    }

    #[tokio::test]
    async fn failed_save_is_skipped_and_run_continues() {
        let broken = pending("broken@example.com", NOW - Duration::days(50));
        let fine = pending("fine@example.com", NOW - Duration::days(40));
        let store = MemoryUserStore::with_users([broken.clone(), fine.clone()]);
        store.fail_saves_for(broken.id);

        let mut out = Vec::new();
        let report = run(&store, NOW, &mut out).await.unwrap();

        assert_eq!(report.scrubbed, 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].user_id, broken.id);
        assert_eq!(store.get(broken.id).unwrap(), broken);
        assert_scrubbed(&store.get(fine.id).unwrap());

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("1 could not be saved"));
    }

    #[tokio::test]
    async fn unavailable_store_aborts_run() {
        let store = MemoryUserStore::with_users([pending("a@example.com", NOW - Duration::days(45))]);
        store.set_unavailable();

        let err = run(&store, NOW, &mut Vec::new()).await.unwrap_err();
        assert!(matches!(err, ScrubError::Store(StoreError::Unavailable(_))));
    }
}
