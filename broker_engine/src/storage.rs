//! Persistent key-value store backing accounts and profiles.
//!
//! The store is a string-to-string map with two key families:
//!
//! - `auth_<lowercased email>`: JSON credential record
//! - `user_<lowercased email>`: JSON profile record
//!
//! `DirStore` persists each key as one JSON file inside a data
//! directory; `MemoryStore` keeps everything in a map and is what the
//! tests (and anything wanting a throwaway session) use. Neither does
//! caching, cross-process locking or retries. A read of a missing key
//! is `Ok(None)`, never an error.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use broker_common::Result;

/// Minimal persistent string-to-string store.
pub trait KeyValueStore {
    /// Read the value stored under `key`, or `None` if the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write `value` under `key`, replacing any previous value.
    fn put(&self, key: &str, value: &str) -> Result<()>;
}

/// Storage key for the credential record of `email` (already normalized).
pub fn credential_key(email: &str) -> String {
    format!("auth_{}", email)
}

/// Storage key for the profile record of `email` (already normalized).
pub fn profile_key(email: &str) -> String {
    format!("user_{}", email)
}

/// Turn a store key into a safe file name.
///
/// Keys embed email addresses, so ASCII alphanumerics and `@ . _ + -`
/// pass through; every other byte is written as `%XX`. The mapping is
/// injective: `%` itself is always escaped, so distinct keys never
/// share a file.
fn file_name(key: &str) -> String {
    let mut safe = String::with_capacity(key.len());
    for byte in key.bytes() {
        let c = char::from(byte);
        if c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '_' | '+' | '-') {
            safe.push(c);
        } else {
            safe.push_str(&format!("%{byte:02X}"));
        }
    }
    format!("{}.json", safe)
}

/// Directory-backed store: one JSON file per key.
#[derive(Debug)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Directory this store reads and writes.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(file_name(key))
    }
}

impl KeyValueStore for DirStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        fs::write(self.path_for(key), value)?;
        Ok(())
    }
}

/// In-memory store with no persistence, for tests and throwaway runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock()?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock()?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_families_prefix_the_email() {
        assert_eq!(credential_key("a@b.com"), "auth_a@b.com");
        assert_eq!(profile_key("a@b.com"), "user_a@b.com");
    }

    #[test]
    fn file_name_keeps_email_characters() {
        assert_eq!(file_name("auth_a@b.com"), "auth_a@b.com.json");
        assert_eq!(file_name("user_x+y@z.io"), "user_x+y@z.io.json");
    }

    #[test]
    fn file_name_encodes_path_separators() {
        assert_eq!(file_name("auth_../evil"), "auth_..%2Fevil.json");
        assert_eq!(file_name("a b\\c"), "a%20b%5Cc.json");
    }

    #[test]
    fn file_name_keeps_distinct_keys_distinct() {
        // A slash and a hash differ only in an escaped byte.
        assert_eq!(file_name("auth_a/b@c.d"), "auth_a%2Fb@c.d.json");
        assert_eq!(file_name("auth_a#b@c.d"), "auth_a%23b@c.d.json");
        assert_eq!(file_name("auth_a%b@c.d"), "auth_a%25b@c.d.json");
    }

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryStore::default();
        assert_eq!(store.get("k").unwrap(), None);
        store.put("k", "v1").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v1"));
        store.put("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v2"));
    }

    #[test]
    fn dir_store_round_trips_and_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = DirStore::open(dir.path()).unwrap();
            assert_eq!(store.get("auth_a@b.com").unwrap(), None);
            store.put("auth_a@b.com", "{\"email\":\"a@b.com\"}").unwrap();
        }
        let store = DirStore::open(dir.path()).unwrap();
        assert_eq!(
            store.get("auth_a@b.com").unwrap().as_deref(),
            Some("{\"email\":\"a@b.com\"}")
        );
    }

    #[test]
    fn dir_store_separates_keys_differing_in_escaped_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::open(dir.path()).unwrap();

        store.put("auth_a/b@c.d", "first").unwrap();
        store.put("auth_a#b@c.d", "second").unwrap();

        assert_eq!(store.get("auth_a/b@c.d").unwrap().as_deref(), Some("first"));
        assert_eq!(store.get("auth_a#b@c.d").unwrap().as_deref(), Some("second"));
    }
}
