use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "jobdeck-tui";

/// OS-keychain storage for saved login passwords, keyed by account email.
///
/// This only prefills the login form between runs; it is unrelated to the
/// bearer-token store and never touched by the request path.
pub struct SavedLogin;

impl SavedLogin {
    /// Remember the password for an email in the OS keychain
    pub fn remember(email: &str, password: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, email).context("Failed to create keyring entry")?;
        entry
            .set_password(password)
            .context("Failed to store password in keychain")?;
        Ok(())
    }

    /// Retrieve the saved password for an email
    pub fn password(email: &str) -> Result<String> {
        let entry = Entry::new(SERVICE_NAME, email).context("Failed to create keyring entry")?;
        entry
            .get_password()
            .context("Failed to retrieve password from keychain")
    }

    /// Forget the saved password for an email
    pub fn forget(email: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, email).context("Failed to create keyring entry")?;
        entry
            .delete_credential()
            .context("Failed to delete credential from keychain")?;
        Ok(())
    }

    /// Check whether a password is saved for an email
    pub fn exists(email: &str) -> bool {
        match Entry::new(SERVICE_NAME, email) {
            Ok(entry) => entry.get_password().is_ok(),
            Err(_) => false,
        }
    }
}
