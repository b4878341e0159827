use std::collections::HashMap;
use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params};

use super::traits::{BoxError, CredentialVerifier};
use crate::error::Error;
use crate::types::Principal;

/// Argon2-backed admin credential table.
///
/// Unknown usernames are checked against a decoy hash so a failed login
/// costs the same whether or not the account exists.
#[derive(Clone)]
pub struct Argon2Verifier {
    params: Params,
    accounts: Arc<HashMap<String, String>>,
    decoy: Arc<String>,
}

impl Argon2Verifier {
    /// Create an empty verifier with default Argon2id parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Hash`] if the decoy hash cannot be generated.
    pub fn new() -> Result<Self, Error> {
        Self::with_params(Params::default())
    }

    /// Create an empty verifier with custom Argon2 cost parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Hash`] if the decoy hash cannot be generated.
    pub fn with_params(params: Params) -> Result<Self, Error> {
        let decoy_secret: [u8; 16] = rand::random();
        let decoy = hash_with(&params, &decoy_secret)?;
        Ok(Self {
            params,
            accounts: Arc::new(HashMap::new()),
            decoy: Arc::new(decoy),
        })
    }

    /// Register an account from a plaintext secret.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Hash`] if hashing fails.
    pub fn with_account(self, username: impl Into<String>, secret: &str) -> Result<Self, Error> {
        let hash = hash_with(&self.params, secret.as_bytes())?;
        self.with_account_hash(username, hash)
    }

    /// Register an account from a stored PHC hash string.
    ///
    /// The hash must be Argon2id with this verifier's cost parameters, so a
    /// known account costs the same to check as the decoy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Hash`] if `phc` does not parse or was produced with
    /// different parameters.
    pub fn with_account_hash(
        mut self,
        username: impl Into<String>,
        phc: impl Into<String>,
    ) -> Result<Self, Error> {
        let phc = phc.into();
        self.check_cost(&phc)?;
        Arc::make_mut(&mut self.accounts).insert(username.into(), phc);
        Ok(self)
    }

    fn check_cost(&self, phc: &str) -> Result<(), Error> {
        let parsed = PasswordHash::new(phc).map_err(|e| Error::Hash(e.to_string()))?;
        if parsed.algorithm != Algorithm::Argon2id.ident() {
            let found = parsed.algorithm;
            return Err(Error::Hash(format!("expected argon2id hash, got {found}")));
        }
        let stored = Params::try_from(&parsed).map_err(|e| Error::Hash(e.to_string()))?;
        let expected = &self.params;
        if (stored.m_cost(), stored.t_cost(), stored.p_cost())
            != (expected.m_cost(), expected.t_cost(), expected.p_cost())
        {
            return Err(Error::Hash(format!(
                "hash cost m={},t={},p={} does not match verifier m={},t={},p={}",
                stored.m_cost(),
                stored.t_cost(),
                stored.p_cost(),
                expected.m_cost(),
                expected.t_cost(),
                expected.p_cost(),
            )));
        }
        Ok(())
    }

    fn verify_blocking(params: Params, phc: &str, decoy: &str, secret: &str) -> bool {
        let argon2 = hasher(params);
        match PasswordHash::new(phc) {
            Ok(parsed) => argon2.verify_password(secret.as_bytes(), &parsed).is_ok(),
            Err(_) => {
                // Still pay for one verification.
                if let Ok(parsed) = PasswordHash::new(decoy) {
                    let _ = argon2.verify_password(secret.as_bytes(), &parsed);
                }
                false
            }
        }
    }
}

impl CredentialVerifier for Argon2Verifier {
    async fn verify(&self, username: &str, secret: &str) -> Result<Option<Principal>, BoxError> {
        let (phc, known) = match self.accounts.get(username) {
            Some(phc) if !secret.is_empty() => (phc.clone(), true),
            _ => (self.decoy.as_str().to_string(), false),
        };
        let params = self.params.clone();
        let decoy = self.decoy.clone();
        let secret = secret.to_string();

        let matched = tokio::task::spawn_blocking(move || {
            Self::verify_blocking(params, &phc, &decoy, &secret)
        })
        .await?;

        Ok((matched && known).then(|| Principal::from(username.to_string())))
    }
}

fn hasher(params: Params) -> Argon2<'static> {
    Argon2::new(Algorithm::Argon2id, argon2::Version::V0x13, params)
}

fn hash_with(params: &Params, secret: &[u8]) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    hasher(params.clone())
        .hash_password(secret, &salt)
        .map(|h| h.to_string())
        .map_err(|e| Error::Hash(e.to_string()))
}

#[cfg(test)]
pub(crate) fn test_params() -> Params {
    Params::new(Params::MIN_M_COST, 1, 1, None).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verifier() -> Argon2Verifier {
        Argon2Verifier::with_params(test_params())
            .unwrap()
            .with_account("admin", "admin123")
            .unwrap()
    }

    #[tokio::test]
    async fn correct_secret_yields_principal() {
        let principal = verifier().verify("admin", "admin123").await.unwrap();
        assert_eq!(principal, Some(Principal::from("admin".to_string())));
    }

    #[tokio::test]
    async fn wrong_secret_and_unknown_user_look_the_same() {
        let v = verifier();
        let wrong = v.verify("admin", "nope").await.unwrap();
        let unknown = v.verify("ghost", "admin123").await.unwrap();
        assert_eq!(wrong, None);
        assert_eq!(unknown, None);
    }

    #[tokio::test]
    async fn empty_inputs_rejected() {
        let v = verifier();
        assert_eq!(v.verify("", "admin123").await.unwrap(), None);
        assert_eq!(v.verify("admin", "").await.unwrap(), None);
    }

    #[tokio::test]
    async fn stored_phc_hash_accepted() {
        let phc = hash_with(&test_params(), b"s3cret").unwrap();
        let v = Argon2Verifier::with_params(test_params())
            .unwrap()
            .with_account_hash("ops", phc)
            .unwrap();
        assert!(v.verify("ops", "s3cret").await.unwrap().is_some());
    }

    #[test]
    fn malformed_hash_rejected() {
        let result = Argon2Verifier::with_params(test_params())
            .unwrap()
            .with_account_hash("ops", "not-a-phc-string");
        assert!(matches!(result, Err(Error::Hash(_))));
    }

    #[test]
    fn hash_with_other_cost_rejected() {
        let other = Params::new(Params::MIN_M_COST, 2, 1, None).unwrap();
        let phc = hash_with(&other, b"s3cret").unwrap();
        let result = Argon2Verifier::with_params(test_params())
            .unwrap()
            .with_account_hash("ops", phc);
        assert!(matches!(result, Err(Error::Hash(_))));
    }

    #[test]
    fn unparsable_hash_still_runs_decoy() {
        let decoy = hash_with(&test_params(), b"decoy").unwrap();
        assert!(!Argon2Verifier::verify_blocking(
            test_params(),
            "not-a-phc-string",
            &decoy,
            "decoy",
        ));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_with(&test_params(), b"same").unwrap();
        let b = hash_with(&test_params(), b"same").unwrap();
        assert_ne!(a, b);
    }
}
