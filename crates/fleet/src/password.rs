use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tokio::task;

use crate::{RequestError, RequestResult};

fn hash_error(why: argon2::password_hash::Error) -> RequestError {
    RequestError::Other(why.to_string().into())
}

/// Hashes a password into a PHC string. Runs on the blocking pool.
pub(crate) async fn hash(password: String) -> RequestResult<String> {
    task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(hash_error)
    })
    .await
    .map_err(RequestError::other)?
}

pub(crate) async fn verify(password: String, hash: String) -> RequestResult<bool> {
    task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&hash).map_err(hash_error)?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(RequestError::other)?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hashes_verify_only_the_original_password() {
        let hashed = hash("s3cret".to_owned()).await.unwrap();
        assert_ne!(hashed, "s3cret");
        assert!(verify("s3cret".to_owned(), hashed.clone()).await.unwrap());
        assert!(!verify("secret".to_owned(), hashed).await.unwrap());
    }
}
