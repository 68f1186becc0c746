//! Authenticated principal types carried in access tokens.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a principal inside an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Platform operator, not bound to one organization.
    PlatformAdmin,
    /// Organization owner.
    Owner,
    /// Organization administrator.
    Admin,
    /// Finance staff.
    Accountant,
    /// Front-desk fee collection.
    Cashier,
    /// Read-only access.
    Viewer,
}

impl Role {
    /// Returns the wire name of the role.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PlatformAdmin => "platform_admin",
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Accountant => "accountant",
            Self::Cashier => "cashier",
            Self::Viewer => "viewer",
        }
    }

    /// Whether the role may act on any organization.
    pub const fn is_platform_admin(self) -> bool {
        matches!(self, Self::PlatformAdmin)
    }

    /// Posting and cancelling challans.
    pub const fn can_post_challans(self) -> bool {
        matches!(self, Self::Owner | Self::Admin | Self::Accountant)
    }

    /// Recording payments against challans.
    pub const fn can_reconcile_payments(self) -> bool {
        matches!(
            self,
            Self::Owner | Self::Admin | Self::Accountant | Self::Cashier
        )
    }

    /// Closing and adjusting revenue cycles.
    pub const fn can_manage_revenue_cycles(self) -> bool {
        matches!(self, Self::PlatformAdmin | Self::Owner | Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "platform_admin" => Ok(Self::PlatformAdmin),
            "owner" => Ok(Self::Owner),
            "admin" => Ok(Self::Admin),
            "accountant" => Ok(Self::Accountant),
            "cashier" => Ok(Self::Cashier),
            "viewer" => Ok(Self::Viewer),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// Organization ID (current context).
    pub org: Uuid,
    /// Campus the principal is restricted to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campus: Option<Uuid>,
    /// User's role in the organization.
    pub role: Role,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(
        user_id: Uuid,
        org_id: Uuid,
        campus_id: Option<Uuid>,
        role: Role,
        expires_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            org: org_id,
            campus: campus_id,
            role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.sub
    }

    /// Returns the organization ID from claims.
    #[must_use]
    pub const fn organization_id(&self) -> Uuid {
        self.org
    }

    /// Whether the principal may act on `org_id`.
    #[must_use]
    pub fn can_access_organization(&self, org_id: Uuid) -> bool {
        self.role.is_platform_admin() || self.org == org_id
    }

    /// Whether the principal may act on `campus_id`.
    ///
    /// Principals without a campus restriction can reach every campus.
    #[must_use]
    pub fn can_access_campus(&self, campus_id: Uuid) -> bool {
        self.campus.is_none_or(|c| c == campus_id)
    }
}
