//! Social network identifiers.

use crate::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A social network a user can prove account ownership on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialNetwork {
    Twitter,
    Facebook,
}

impl SocialNetwork {
    pub const ALL: [Self; 2] = [Self::Twitter, Self::Facebook];

    /// Name used in storage rows, template paths and alert messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Twitter => "twitter",
            Self::Facebook => "facebook",
        }
    }
}

impl fmt::Display for SocialNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SocialNetwork {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "twitter" | "x" => Ok(Self::Twitter),
            "facebook" => Ok(Self::Facebook),
            _ => Err(TypesError::UnknownNetwork(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_forms_round_trip() {
        for network in SocialNetwork::ALL {
            assert_eq!(network.as_str().parse::<SocialNetwork>(), Ok(network));
        }
        assert_eq!("X".parse::<SocialNetwork>(), Ok(SocialNetwork::Twitter));
        assert!("myspace".parse::<SocialNetwork>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&SocialNetwork::Facebook).unwrap();
        assert_eq!(json, "\"facebook\"");
    }
}
