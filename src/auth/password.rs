use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use super::AuthError;

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let argon2 = Argon2::default();
    let salt = SaltString::generate(&mut OsRng);

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Internal(e.to_string()))
}

pub fn verify_password(password: &str, hashed: &str) -> Result<(), AuthError> {
    let argon2 = Argon2::default();
    let parsed = PasswordHash::new(hashed).map_err(|e| AuthError::Internal(e.to_string()))?;

    argon2
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_round_trips_only_for_the_right_password() {
        let hashed = hash_password("hunter22").unwrap();
        assert!(verify_password("hunter22", &hashed).is_ok());
        assert!(matches!(
            verify_password("hunter23", &hashed),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
