use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::{distributions::Alphanumeric, Rng};
use tracing::error;

/// Hashes starting with this prefix never verify.
pub const UNUSABLE_PASSWORD_PREFIX: &str = "!";
const UNUSABLE_PASSWORD_SUFFIX_LEN: usize = 40;

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    if !is_password_usable(hash) {
        return Ok(false);
    }
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// A credential marker that cannot be produced by hashing any password.
pub fn make_unusable_password<R: Rng>(rng: &mut R) -> String {
    let suffix: String = (0..UNUSABLE_PASSWORD_SUFFIX_LEN)
        .map(|_| char::from(rng.sample(Alphanumeric)))
        .collect();
    format!("{UNUSABLE_PASSWORD_PREFIX}{suffix}")
}

pub fn is_password_usable(hash: &str) -> bool {
    !hash.starts_with(UNUSABLE_PASSWORD_PREFIX)
}
