use derive_more::Display;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyStringError;

impl std::fmt::Display for EmptyStringError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "value must be non-empty")
    }
}

impl std::error::Error for EmptyStringError {}

#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Display, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct NonEmptyString(String);

impl NonEmptyString {
    pub fn try_new(value: String) -> Result<Self, EmptyStringError> {
        if value.is_empty() {
            Err(EmptyStringError)
        } else {
            Ok(Self(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for NonEmptyString {
    type Error = EmptyStringError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Name of a colorscheme as the editor knows it.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Display, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ThemeName(NonEmptyString);

impl ThemeName {
    pub fn try_new(value: String) -> Result<Self, EmptyStringError> {
        NonEmptyString::try_new(value).map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn into_string(self) -> String {
        self.0.into_string()
    }
}

impl From<NonEmptyString> for ThemeName {
    fn from(value: NonEmptyString) -> Self {
        Self(value)
    }
}

/// Key identifying a collapsible group in the picker (e.g. a plugin or
/// flavour section).
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Display, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct GroupKey(NonEmptyString);

impl GroupKey {
    pub fn try_new(value: String) -> Result<Self, EmptyStringError> {
        NonEmptyString::try_new(value).map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn into_string(self) -> String {
        self.0.into_string()
    }
}

impl From<NonEmptyString> for GroupKey {
    fn from(value: NonEmptyString) -> Self {
        Self(value)
    }
}
