use std::{fmt, str::FromStr, sync::Arc};

use crate::error::{BillingError, Result};

/// An API credential identifying one tenant.
///
/// Cloning is cheap; the key is shared. `Debug` and `Display` never print the
/// full key.
///
/// # Examples
///
/// ```
/// use tenant_billing::session::Credential;
///
/// let credential = Credential::new("a1b2c3d4e5f6a7b8").unwrap();
/// assert_eq!(credential.to_string(), "a1b2...a7b8");
/// assert_eq!(credential.expose(), "a1b2c3d4e5f6a7b8");
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential(Arc<str>);

impl Credential {
    /// Wraps an API key.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::InvalidInput`] if the key is blank or contains
    /// control characters.
    pub fn new(key: impl AsRef<str>) -> Result<Self> {
        let key = key.as_ref();
        if key.trim().is_empty() {
            return Err(BillingError::InvalidInput("credential cannot be empty".to_owned()));
        }
        if key.chars().any(char::is_control) {
            return Err(BillingError::InvalidInput(
                "credential cannot contain control characters".to_owned(),
            ));
        }
        Ok(Self(Arc::from(key)))
    }

    /// The raw key, for the transport's authorization header.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl FromStr for Credential {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// Masks a key for logs: first and last four characters of long keys, stars
/// otherwise.
fn mask(key: &str) -> String {
    let count = key.chars().count();
    if count <= 8 {
        return "*".repeat(count);
    }
    let head: String = key.chars().take(4).collect();
    let tail: String = key.chars().skip(count - 4).collect();
    format!("{head}...{tail}")
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&mask(&self.0))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&mask(&self.0)).finish()
    }
}
