//! Documented user property names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Reference for the web services API and its user properties.
pub const DOC_URL: &str = "https://www.papercut.com/help/manuals/ng-mf/common/tools-web-services/";

macro_rules! known_properties {
    ($($variant:ident => $name:literal,)+) => {
        /// A user property named in the PaperCut web services documentation.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum KnownProperty {
            $($variant,)+
        }

        impl KnownProperty {
            /// Every documented property, in documentation order.
            pub const ALL: &'static [KnownProperty] = &[$(KnownProperty::$variant,)+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(KnownProperty::$variant => $name,)+
                }
            }
        }

        impl FromStr for KnownProperty {
            type Err = UnknownProperty;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(KnownProperty::$variant),)+
                    other => Err(UnknownProperty(other.to_string())),
                }
            }
        }
    };
}

known_properties! {
    Balance => "balance",
    PrimaryCardNumber => "primary-card-number",
    SecondaryCardNumber => "secondary-card-number",
    Department => "department",
    Office => "office",
    Email => "email",
    FullName => "full-name",
    Notes => "notes",
    Restricted => "restricted",
    Home => "home",
    UsernameAlias => "username-alias",
    AutoSharedAccount => "auto-shared-account",
    DisabledPrint => "disabled-print",
    DisabledNet => "disabled-net",
    AccountSelectionMode => "account-selection.mode",
    PrintStatsPageCount => "print-stats.page-count",
    PrintStatsJobCount => "print-stats.job-count",
    NetStatsDataMb => "net-stats.data-mb",
    NetStatsTimeHours => "net-stats.time-hours",
    DontHoldJobsInReleaseStation => "dont-hold-jobs-in-release-station",
    CardPin => "card-pin",
    OtherEmails => "other-emails",
    Internal => "internal",
    Unauthenticated => "unauthenticated",
}

impl KnownProperty {
    /// Names of every documented property, in documentation order.
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|p| p.as_str()).collect()
    }
}

impl fmt::Display for KnownProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownProperty(pub String);

impl fmt::Display for UnknownProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "undocumented user property {:?}", self.0)
    }
}

impl std::error::Error for UnknownProperty {}

/// A requested user property: a documented name or any other non-empty name.
///
/// The documented list is advisory; undocumented names are passed upstream
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UserProperty {
    Known(KnownProperty),
    Other(String),
}

impl UserProperty {
    pub fn as_str(&self) -> &str {
        match self {
            UserProperty::Known(known) => known.as_str(),
            UserProperty::Other(name) => name,
        }
    }
}

impl fmt::Display for UserProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<KnownProperty> for UserProperty {
    fn from(known: KnownProperty) -> Self {
        UserProperty::Known(known)
    }
}

impl FromStr for UserProperty {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err("property name must not be empty");
        }
        Ok(s.parse::<KnownProperty>()
            .map(UserProperty::Known)
            .unwrap_or_else(|_| UserProperty::Other(s.to_string())))
    }
}

impl<'de> Deserialize<'de> for UserProperty {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

impl Serialize for UserProperty {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
