use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed")]
    Hashing(#[source] bcrypt::BcryptError),
    #[error("hashing task failed to complete")]
    Join(#[source] tokio::task::JoinError),
}

/// One-way hashing and verification of user passwords.
///
/// bcrypt salts per call, so identical plaintexts produce different stored
/// hashes; the cost factor comes from configuration. Hashing runs on the
/// blocking thread pool to keep the async runtime free.
#[derive(Clone, Copy, Debug)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub async fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        let plaintext = plaintext.to_string();
        let cost = self.cost;

        tokio::task::spawn_blocking(move || {
            bcrypt::hash(plaintext, cost).map_err(PasswordError::Hashing)
        })
        .await
        .map_err(PasswordError::Join)?
    }

    /// Compare a plaintext password against a stored hash.
    ///
    /// A malformed stored hash can never match; it yields `Ok(false)` rather
    /// than an error.
    pub async fn verify(&self, plaintext: &str, hashed: &str) -> Result<bool, PasswordError> {
        let plaintext = plaintext.to_string();
        let hashed = hashed.to_string();

        tokio::task::spawn_blocking(move || Ok(bcrypt::verify(plaintext, &hashed).unwrap_or(false)))
            .await
            .map_err(PasswordError::Join)?
    }
}
