//! Registration and login against stored credential records.
//!
//! Credentials live under the `auth_<email>` key family as plain JSON
//! with the password in the clear. This is a simulation, not a
//! security boundary: there is no hashing, no tokens, and login is a
//! straight string comparison. Validation mirrors the dashboard form:
//! the email needs an `@` and a `.`, the password a minimum length,
//! and every failure maps to the exact message the user sees.

use serde::{Deserialize, Serialize};

use broker_common::{BrokerError, Result};

use crate::storage::{credential_key, KeyValueStore};

/// Minimum number of characters a registration password must have.
const MIN_PASSWORD_CHARS: usize = 6;

/// Stored credential record: the unique lowercased email plus the
/// plaintext password it was registered with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Normalized (trimmed, lowercased) email; also the key suffix.
    pub email: String,
    /// Password exactly as entered at registration.
    pub password: String,
}

/// Trim and lowercase an email so it can serve as a store key.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Validate an email field and return its normalized form.
fn validate_email(raw: &str) -> Result<String> {
    if raw.trim().is_empty() {
        return Err(BrokerError::EmailMissing);
    }
    if !raw.contains('@') || !raw.contains('.') {
        return Err(BrokerError::EmailInvalid);
    }
    Ok(normalize_email(raw))
}

/// Validate that a password field is not blank.
///
/// Registration and login word this failure differently, so the caller
/// picks the variant.
fn validate_password(raw: &str, blank: BrokerError) -> Result<()> {
    if raw.trim().is_empty() {
        return Err(blank);
    }
    Ok(())
}

/// Create a credential record for a new account.
///
/// Checks run in the same order as the signup form: blank email,
/// malformed email, blank password, short password, duplicate account.
/// On success the record is stored under `auth_<normalized email>` and
/// the normalized email is returned. Registration does not log the
/// user in.
pub fn register(store: &impl KeyValueStore, email: &str, password: &str) -> Result<String> {
    let email = validate_email(email)?;
    validate_password(password, BrokerError::PasswordMissing)?;
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(BrokerError::PasswordTooShort);
    }

    let key = credential_key(&email);
    if store.get(&key)?.is_some() {
        return Err(BrokerError::AccountExists);
    }

    let record = CredentialRecord {
        email: email.clone(),
        password: password.to_string(),
    };
    store.put(&key, &serde_json::to_string(&record)?)?;
    Ok(email)
}

/// Check a login attempt against the stored record.
///
/// Returns the normalized email as the session identity on success.
/// Never mutates the store.
pub fn login(store: &impl KeyValueStore, email: &str, password: &str) -> Result<String> {
    let email = validate_email(email)?;
    validate_password(password, BrokerError::LoginPasswordMissing)?;

    let raw = store
        .get(&credential_key(&email))?
        .ok_or(BrokerError::AccountNotFound)?;
    let record: CredentialRecord = serde_json::from_str(&raw)?;

    if record.password != password {
        return Err(BrokerError::PasswordMismatch);
    }
    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{DirStore, MemoryStore};

    #[test]
    fn register_rejects_blank_and_malformed_email() {
        let store = MemoryStore::default();
        assert!(matches!(
            register(&store, "   ", "secret1"),
            Err(BrokerError::EmailMissing)
        ));
        assert!(matches!(
            register(&store, "nobody", "secret1"),
            Err(BrokerError::EmailInvalid)
        ));
        assert!(matches!(
            register(&store, "nobody@host", "secret1"),
            Err(BrokerError::EmailInvalid)
        ));
    }

    #[test]
    fn register_enforces_password_length_boundary() {
        let store = MemoryStore::default();
        assert!(matches!(
            register(&store, "a@b.com", "five5"),
            Err(BrokerError::PasswordTooShort)
        ));
        // Exactly six characters is accepted.
        assert_eq!(register(&store, "a@b.com", "sixsix").unwrap(), "a@b.com");
    }

    #[test]
    fn register_rejects_blank_password_before_length() {
        let store = MemoryStore::default();
        assert!(matches!(
            register(&store, "a@b.com", "   "),
            Err(BrokerError::PasswordMissing)
        ));
    }

    #[test]
    fn login_blank_password_uses_the_login_wording() {
        let store = MemoryStore::default();
        register(&store, "a@b.com", "secret1").unwrap();
        assert!(matches!(
            login(&store, "a@b.com", ""),
            Err(BrokerError::LoginPasswordMissing)
        ));
    }

    #[test]
    fn duplicate_registration_is_case_insensitive() {
        let store = MemoryStore::default();
        register(&store, "A@B.com", "secret1").unwrap();
        assert!(matches!(
            register(&store, "a@b.COM", "other-password"),
            Err(BrokerError::AccountExists)
        ));
    }

    #[test]
    fn login_succeeds_with_matching_password() {
        let store = MemoryStore::default();
        register(&store, "a@b.com", "secret1").unwrap();
        assert_eq!(login(&store, "A@b.com", "secret1").unwrap(), "a@b.com");
    }

    #[test]
    fn login_with_wrong_password_leaves_record_untouched() {
        let store = MemoryStore::default();
        register(&store, "a@b.com", "secret1").unwrap();
        let before = store.get("auth_a@b.com").unwrap();

        assert!(matches!(
            login(&store, "a@b.com", "wrong-password"),
            Err(BrokerError::PasswordMismatch)
        ));
        assert_eq!(store.get("auth_a@b.com").unwrap(), before);
    }

    #[test]
    fn login_unknown_account_is_reported() {
        let store = MemoryStore::default();
        assert!(matches!(
            login(&store, "ghost@b.com", "secret1"),
            Err(BrokerError::AccountNotFound)
        ));
    }

    #[test]
    fn emails_differing_only_in_symbols_get_separate_accounts() {
        // On disk the slash and the hash land in different files.
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::open(dir.path()).unwrap();

        register(&store, "a/b@c.d", "first-secret").unwrap();
        register(&store, "a#b@c.d", "second-secret").unwrap();

        assert_eq!(login(&store, "a/b@c.d", "first-secret").unwrap(), "a/b@c.d");
        assert_eq!(login(&store, "a#b@c.d", "second-secret").unwrap(), "a#b@c.d");
        assert!(matches!(
            login(&store, "a#b@c.d", "first-secret"),
            Err(BrokerError::PasswordMismatch)
        ));
    }
}
