//! Post-login routing.

use serde::{Deserialize, Serialize};

/// Where a freshly signed-in user is sent.
///
/// Wire format: the route path (`"/onboarding"` or `"/dashboard"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Destination {
    #[serde(rename = "/onboarding")]
    Onboarding,
    #[serde(rename = "/dashboard")]
    Dashboard,
}

impl Destination {
    /// Users who have not finished onboarding go there first.
    pub fn for_user(onboarded: bool) -> Self {
        if onboarded {
            Self::Dashboard
        } else {
            Self::Onboarding
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Self::Onboarding => "/onboarding",
            Self::Dashboard => "/dashboard",
        }
    }
}
