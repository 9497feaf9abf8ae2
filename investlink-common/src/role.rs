//! Viewer role model
//!
//! Investors act on companies and companies act on investors. Every endpoint
//! and every display accessor is symmetric under that swap, so both directions
//! are driven from this one tag instead of boolean flags.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Which side of the marketplace an account sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Investor,
    Company,
}

/// Payload keys holding the role-dependent display attributes
///
/// Keys are the field names the server uses for an entity of this role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayKeys {
    pub id: &'static str,
    pub name: &'static str,
    pub location: &'static str,
    pub stage: &'static str,
    pub industries: &'static str,
    pub description: &'static str,
    /// Lower bound of the financial range, or the single amount for companies
    pub amount_min: &'static str,
    /// Upper bound of the financial range (investors only)
    pub amount_max: Option<&'static str>,
    pub website: &'static str,
    pub image: &'static str,
}

const INVESTOR_KEYS: DisplayKeys = DisplayKeys {
    id: "user_id",
    name: "name",
    location: "places",
    stage: "fund_stage",
    industries: "industry",
    description: "invest_requirements",
    amount_min: "check_size_min",
    amount_max: Some("check_size_max"),
    website: "website",
    image: "pic_link",
};

const COMPANY_KEYS: DisplayKeys = DisplayKeys {
    id: "company_id",
    name: "name",
    location: "place",
    stage: "funding_stage",
    industries: "industry",
    description: "desc",
    amount_min: "fund_size",
    amount_max: None,
    website: "link",
    image: "img",
};

impl Role {
    pub const ALL: [Role; 2] = [Role::Investor, Role::Company];

    /// The role this viewer swipes on
    pub fn counterpart(self) -> Role {
        match self {
            Role::Investor => Role::Company,
            Role::Company => Role::Investor,
        }
    }

    /// Endpoint path segment (`/recommendations/{role}/...`)
    pub fn path_segment(self) -> &'static str {
        match self {
            Role::Investor => "investor",
            Role::Company => "company",
        }
    }

    /// Entity kind used by the search endpoint (`/search/{kind}`)
    pub fn search_kind(self) -> &'static str {
        match self {
            Role::Investor => "investors",
            Role::Company => "companies",
        }
    }

    /// Display payload keys for an entity of this role
    pub fn display_keys(self) -> &'static DisplayKeys {
        match self {
            Role::Investor => &INVESTOR_KEYS,
            Role::Company => &COMPANY_KEYS,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "investor" | "investors" | "user" => Ok(Role::Investor),
            "company" | "companies" | "startup" => Ok(Role::Company),
            other => Err(Error::InvalidInput(format!("unknown role '{}'", other))),
        }
    }
}
