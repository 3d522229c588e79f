//! SASL credentials and the redacting wrapper used for the password.

use std::fmt;
use std::io;

const REDACTED: &str = "********";

/// A value that must never show up in diagnostic output.
///
/// `Debug` and `Display` print a fixed mask; use [`Secret::expose`] to hand the
/// real value to the client library.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wraps a sensitive value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the wrapped value.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// The mask printed in place of the value.
    pub const fn redacted() -> &'static str {
        REDACTED
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret({REDACTED})")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

/// One of the three values a probe needs from the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Bootstrap server list.
    Broker,
    /// SASL username.
    Username,
    /// SASL password.
    Password,
}

impl Field {
    /// Label used when the value is missing from the command line.
    pub const fn flag_label(self) -> &'static str {
        match self {
            Self::Broker => "Bootstrap Servers (--broker)",
            Self::Username => "Username (--username)",
            Self::Password => "Password (--password)",
        }
    }

    /// Short human name used by the interactive prompts.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Broker => "Broker URL",
            Self::Username => "Username",
            Self::Password => "Password",
        }
    }
}

/// Why credentials could not be acquired.
#[derive(Debug)]
pub enum CredentialError {
    /// A required flag was absent or had a blank value.
    Missing(Field),
    /// An interactive answer was blank.
    Empty(Field),
    /// The terminal could not be read.
    Input(io::Error),
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(field) => write!(f, "{} is required.", field.flag_label()),
            Self::Empty(field) => write!(f, "{} cannot be empty.", field.name()),
            Self::Input(err) => write!(f, "Failed to read input: {err}"),
        }
    }
}

impl std::error::Error for CredentialError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Input(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for CredentialError {
    fn from(err: io::Error) -> Self {
        Self::Input(err)
    }
}

/// Validated broker address, username and password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    broker: String,
    username: String,
    password: Secret,
}

impl Credentials {
    /// Builds credentials from optional command-line values.
    ///
    /// Fields are checked in order broker, username, password; the first one
    /// that is absent or blank is reported as [`CredentialError::Missing`].
    pub fn from_flags(
        broker: Option<String>,
        username: Option<String>,
        password: Option<String>,
    ) -> Result<Self, CredentialError> {
        let broker = non_blank(broker).ok_or(CredentialError::Missing(Field::Broker))?;
        let username = non_blank(username).ok_or(CredentialError::Missing(Field::Username))?;
        let password = non_blank(password).ok_or(CredentialError::Missing(Field::Password))?;
        Ok(Self {
            broker,
            username,
            password: Secret::new(password),
        })
    }

    /// Builds credentials from already-read values, rejecting blank ones with
    /// [`CredentialError::Empty`].
    pub fn from_answers(
        broker: String,
        username: String,
        password: String,
    ) -> Result<Self, CredentialError> {
        Self::from_flags(Some(broker), Some(username), Some(password)).map_err(|err| match err {
            CredentialError::Missing(field) => CredentialError::Empty(field),
            other => other,
        })
    }

    /// Bootstrap server list as given by the user.
    pub fn broker(&self) -> &str {
        &self.broker
    }

    /// SASL username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// SASL password.
    pub const fn password(&self) -> &Secret {
        &self.password
    }
}

// Values are kept verbatim; only all-whitespace input counts as absent.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_never_formats_value() {
        let secret = Secret::new("hunter2");
        assert_eq!(secret.to_string(), "********");
        assert_eq!(format!("{secret:?}"), "Secret(********)");
        assert_eq!(secret.expose(), "hunter2");
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::from_flags(
            Some("localhost:9092".to_string()),
            Some("alice".to_string()),
            Some("secret".to_string()),
        )
        .unwrap();

        let debug = format!("{creds:?}");
        assert!(debug.contains("alice"));
        assert!(!debug.contains("secret\""));
        assert!(debug.contains("Secret(********)"));
    }

    #[test]
    fn test_missing_fields_reported_in_order() {
        let err = Credentials::from_flags(None, None, None).unwrap_err();
        assert!(matches!(err, CredentialError::Missing(Field::Broker)));

        let err = Credentials::from_flags(Some("b:9092".into()), Some("  ".into()), None)
            .unwrap_err();
        assert!(matches!(err, CredentialError::Missing(Field::Username)));

        let err = Credentials::from_flags(Some("b:9092".into()), Some("u".into()), None)
            .unwrap_err();
        assert_eq!(err.to_string(), "Password (--password) is required.");
    }

    #[test]
    fn test_blank_answer_is_empty_error() {
        let err = Credentials::from_answers("b:9092".into(), "u".into(), "\t ".into())
            .unwrap_err();
        assert!(matches!(err, CredentialError::Empty(Field::Password)));
        assert_eq!(err.to_string(), "Password cannot be empty.");
    }

    #[test]
    fn test_values_kept_verbatim() {
        let creds =
            Credentials::from_answers("b:9092".into(), " u ".into(), " p ".into()).unwrap();
        assert_eq!(creds.username(), " u ");
        assert_eq!(creds.password().expose(), " p ");
    }
}
