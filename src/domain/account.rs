//! Account data model.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Coin balance granted to every account on first authentication.
pub const STARTING_BALANCE: i64 = 100;

/// Maximum allowed length for a username.
pub const USERNAME_MAX: usize = 64;

/// Validation errors returned by [`Username::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsernameValidationError {
    Empty,
    TooLong { max: usize },
    InvalidCharacters,
}

impl fmt::Display for UsernameValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "username must not be empty"),
            Self::TooLong { max } => write!(f, "username must be at most {max} characters"),
            Self::InvalidCharacters => {
                write!(f, "username may only contain ASCII letters and digits")
            }
        }
    }
}

impl std::error::Error for UsernameValidationError {}

static USERNAME_RE: OnceLock<Regex> = OnceLock::new();

fn username_regex() -> &'static Regex {
    USERNAME_RE.get_or_init(|| {
        // Length is enforced separately; this constrains allowed characters.
        Regex::new(r"^[A-Za-z0-9]+$").unwrap_or_else(|err| panic!("invalid username regex: {err}"))
    })
}

/// Unique account name presented at authentication and used as the
/// counterparty identity in transfer history.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validate and construct a [`Username`] from borrowed input.
    pub fn new(name: impl AsRef<str>) -> Result<Self, UsernameValidationError> {
        Self::from_owned(name.as_ref().to_owned())
    }

    fn from_owned(name: String) -> Result<Self, UsernameValidationError> {
        if name.is_empty() {
            return Err(UsernameValidationError::Empty);
        }
        if name.len() > USERNAME_MAX {
            return Err(UsernameValidationError::TooLong { max: USERNAME_MAX });
        }
        if !username_regex().is_match(&name) {
            return Err(UsernameValidationError::InvalidCharacters);
        }
        Ok(Self(name))
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl TryFrom<String> for Username {
    type Error = UsernameValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Stable account identifier assigned by the ledger's backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(i32);

impl AccountId {
    /// Wrap a raw storage identifier.
    pub fn new(id: i32) -> Self {
        Self(id)
    }

    /// Access the raw storage identifier.
    pub fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account snapshot as returned by the ledger.
///
/// Balances are mutated only through ledger operations; this value is a
/// point-in-time read, not a live handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    id: AccountId,
    username: Username,
    balance: i64,
}

impl Account {
    /// Assemble an account snapshot.
    pub fn new(id: AccountId, username: Username, balance: i64) -> Self {
        Self {
            id,
            username,
            balance,
        }
    }

    /// Ledger-assigned identifier.
    pub fn id(&self) -> AccountId {
        self.id
    }

    /// Unique account name.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Coin balance at the time of the read.
    pub fn balance(&self) -> i64 {
        self.balance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("alice")]
    #[case("Bob99")]
    #[case("X")]
    fn accepts_ascii_alphanumeric_names(#[case] name: &str) {
        let username = Username::new(name).expect("valid username");
        assert_eq!(username.as_ref(), name);
    }

    #[rstest]
    #[case("", UsernameValidationError::Empty)]
    #[case("has space", UsernameValidationError::InvalidCharacters)]
    #[case("tab\tchar", UsernameValidationError::InvalidCharacters)]
    #[case("émile", UsernameValidationError::InvalidCharacters)]
    #[case("semi;colon", UsernameValidationError::InvalidCharacters)]
    fn rejects_invalid_names(#[case] name: &str, #[case] expected: UsernameValidationError) {
        assert_eq!(Username::new(name).expect_err("must fail"), expected);
    }

    #[rstest]
    fn rejects_overlong_names() {
        let name = "a".repeat(USERNAME_MAX + 1);
        assert_eq!(
            Username::new(name).expect_err("must fail"),
            UsernameValidationError::TooLong { max: USERNAME_MAX }
        );
    }

    #[rstest]
    fn serde_round_trips_through_validation() {
        let username: Username = serde_json::from_str("\"carol\"").expect("valid");
        assert_eq!(username.as_ref(), "carol");
        assert!(serde_json::from_str::<Username>("\"not ok\"").is_err());
    }
}
