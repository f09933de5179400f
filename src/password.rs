//! Password strength checks and bcrypt hashing for account credentials.

use std::fmt::{self, Display};

use zxcvbn::{Entropy, Score, zxcvbn};

use crate::Error;

/// The lowest zxcvbn score accepted when registering an account.
const MIN_SCORE: Score = Score::Three;

/// A plain text password that passed the strength check but is not hashed yet.
///
/// The only way to store one is to turn it into a [PasswordHash].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Check the strength of `raw_password` with zxcvbn.
    ///
    /// `user_inputs` are words tied to the account, such as the username,
    /// which make a password easier to guess when it contains them.
    ///
    /// # Errors
    ///
    /// Returns [Error::TooWeak] with zxcvbn's warning and suggestions if the
    /// password scores below three out of four.
    pub fn new(raw_password: &str, user_inputs: &[&str]) -> Result<Self, Error> {
        let entropy = zxcvbn(raw_password, user_inputs);

        if entropy.score() >= MIN_SCORE {
            Ok(Self(raw_password.to_owned()))
        } else {
            Err(Error::TooWeak(weakness_reason(&entropy)))
        }
    }

    /// Wrap `raw_password` without checking its strength, e.g. for test accounts.
    pub fn new_unchecked(raw_password: &str) -> Self {
        Self(raw_password.to_owned())
    }
}

impl Display for ValidatedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("********")
    }
}

/// Explain why zxcvbn rejected a password and how to improve it.
fn weakness_reason(entropy: &Entropy) -> String {
    let Some(feedback) = entropy.feedback() else {
        return "it is too easy to guess, try a longer password".to_owned();
    };

    feedback
        .warning()
        .map(|warning| warning.to_string())
        .into_iter()
        .chain(feedback.suggestions().iter().map(|tip| tip.to_string()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// A salted bcrypt hash of an account's password, as stored in the database.
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// The bcrypt cost used outside of tests.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Salt and hash `password`.
    ///
    /// Each step up in `cost` doubles the time needed to hash and verify.
    ///
    /// # Errors
    ///
    /// Returns [Error::HashingError] if bcrypt rejects the cost.
    pub fn new(password: ValidatedPassword, cost: u32) -> Result<Self, Error> {
        bcrypt::hash(password.0, cost)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Wrap a hash that was read back from the database.
    pub fn new_unchecked(stored_hash: &str) -> Self {
        Self(stored_hash.to_owned())
    }

    /// Whether `raw_password` is the password this hash was made from.
    ///
    /// # Errors
    ///
    /// Returns [Error::HashingError] if the stored hash is not a bcrypt hash.
    pub fn verify(&self, raw_password: &str) -> Result<bool, Error> {
        bcrypt::verify(raw_password, &self.0).map_err(|error| {
            tracing::error!("Could not check a password against its stored hash: {error}");
            Error::HashingError(error.to_string())
        })
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
