//! Durable client-side storage for the `authData` record.
//!
//! The record is a single JSON file shared by every client instance in the
//! process. Reads go through an in-memory cache so each outgoing request
//! does not touch the filesystem; writes land on disk first and then update
//! the cache. Opening a store never fails: a missing or malformed file is
//! simply a logged-out session.

use crate::auth::credentials::{parse_credentials, Credentials, UserProfile};
use secrecy::SecretString;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
    cached: Arc<RwLock<Credentials>>,
}

impl TokenStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cached = match fs::read_to_string(&path) {
            Ok(raw) => parse_credentials(&raw),
            Err(err) => {
                debug!("no auth record at {}: {}", path.display(), err);
                Credentials::default()
            }
        };

        Self {
            path,
            cached: Arc::new(RwLock::new(cached)),
        }
    }

    #[must_use]
    pub fn credentials(&self) -> Credentials {
        self.cached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn access_token(&self) -> Option<SecretString> {
        self.credentials().access_token
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<SecretString> {
        self.credentials().refresh_token
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.credentials().is_authenticated()
    }

    /// Replace the whole record.
    ///
    /// # Errors
    /// Returns an error if the record cannot be written to disk.
    pub fn save(&self, credentials: Credentials) -> io::Result<()> {
        fs::write(&self.path, credentials.to_record().to_string())?;
        *self.cached.write().unwrap_or_else(PoisonError::into_inner) = credentials;
        Ok(())
    }

    /// Overwrite token material in place, keeping the cached user. A refresh
    /// that does not rotate the refresh token keeps the stored one.
    ///
    /// # Errors
    /// Returns an error if the record cannot be written to disk.
    pub fn update_tokens(
        &self,
        access_token: SecretString,
        refresh_token: Option<SecretString>,
    ) -> io::Result<()> {
        let mut credentials = self.credentials();
        credentials.access_token = Some(access_token);
        if refresh_token.is_some() {
            credentials.refresh_token = refresh_token;
        }
        self.save(credentials)
    }

    /// Attach the fetched profile to the stored record.
    ///
    /// # Errors
    /// Returns an error if the record cannot be written to disk.
    pub fn set_user(&self, user: UserProfile) -> io::Result<()> {
        let mut credentials = self.credentials();
        credentials.user = Some(user);
        self.save(credentials)
    }

    /// Delete the record entirely. A store with no record is "logged out".
    ///
    /// # Errors
    /// Returns an error if the record exists but cannot be removed.
    pub fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }
        *self.cached.write().unwrap_or_else(PoisonError::into_inner) = Credentials::default();
        Ok(())
    }
}
