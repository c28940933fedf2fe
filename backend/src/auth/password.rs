use std::sync::OnceLock;

use pwhash::bcrypt::{self, BcryptSetup};

pub const BCRYPT_COST: u32 = 12;

/// Salted bcrypt hash at [`BCRYPT_COST`].
pub fn hash_password(password: &str) -> Result<String, pwhash::error::Error> {
    bcrypt::hash_with(
        BcryptSetup {
            cost: Some(BCRYPT_COST),
            ..Default::default()
        },
        password,
    )
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash)
}

/// Checks a login attempt. Without a stored hash the password is still run
/// through bcrypt against a throwaway hash, so an unknown account takes as
/// long to reject as a wrong password.
pub fn verify_login(password: &str, stored: Option<&str>) -> bool {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    match stored {
        Some(hash) => verify_password(password, hash),
        None => {
            if let Some(dummy) = DUMMY.get_or_init(|| hash_password("no such account").ok()) {
                verify_password(password, dummy);
            }
            false
        }
    }
}
