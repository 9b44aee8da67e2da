use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::route::DiveRoute;

/// Site role of the caller, as reported by the session provider.
///
/// Ordered from least to most trusted; `Moderator` and above may hide any
/// route, not just their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Regular authenticated user. Can create and copy routes, manage their own.
    User = 0,
    /// Can manage any route.
    Moderator = 1,
    /// Full administrative access.
    Admin = 2,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Moderator => write!(f, "moderator"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl Role {
    /// Build the role from the session provider's flags. Admin wins over moderator.
    pub fn from_flags(is_admin: bool, is_moderator: bool) -> Self {
        if is_admin {
            Role::Admin
        } else if is_moderator {
            Role::Moderator
        } else {
            Role::User
        }
    }

    /// Returns `true` if `self` has at least the required role.
    pub fn has_role(&self, required: Role) -> bool {
        *self >= required
    }
}

/// The authenticated user on whose behalf lifecycle calls are made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    /// Divemap user id, compared against a route's `created_by`.
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

impl Caller {
    pub fn new(user_id: i64, username: impl Into<String>, role: Role) -> Self {
        Self {
            user_id,
            username: username.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_moderator(&self) -> bool {
        self.role == Role::Moderator
    }

    /// Whether edit/hide controls should be offered for `route`.
    ///
    /// Advisory only: the server re-checks every mutation.
    pub fn can_manage(&self, route: &DiveRoute) -> bool {
        self.user_id == route.created_by || self.role.has_role(Role::Moderator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn route_by(created_by: i64) -> DiveRoute {
        DiveRoute {
            id: 9,
            dive_site_id: Some(1),
            name: "Wall drift".to_string(),
            description: None,
            route_type: "line".to_string(),
            route_data: serde_json::json!({ "type": "Point", "coordinates": [23.1, 37.9] }),
            creator: None,
            created_by,
            created_at: Utc::now(),
            view_count: 0,
            hidden: false,
        }
    }

    #[test]
    fn test_role_ordering() {
        assert!(Role::Admin > Role::Moderator);
        assert!(Role::Moderator > Role::User);
    }

    #[test]
    fn test_from_flags() {
        assert_eq!(Role::from_flags(true, true), Role::Admin);
        assert_eq!(Role::from_flags(false, true), Role::Moderator);
        assert_eq!(Role::from_flags(false, false), Role::User);
    }

    #[test]
    fn test_display() {
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Moderator.to_string(), "moderator");
        assert_eq!(Role::Admin.to_string(), "admin");
    }

    #[test]
    fn test_owner_can_manage() {
        let owner = Caller::new(7, "reefwalker", Role::User);
        assert!(owner.can_manage(&route_by(7)));
        assert!(!owner.can_manage(&route_by(8)));
    }

    #[test]
    fn test_staff_can_manage_any_route() {
        let moderator = Caller::new(1, "mod", Role::Moderator);
        let admin = Caller::new(2, "admin", Role::Admin);
        assert!(moderator.can_manage(&route_by(99)));
        assert!(admin.can_manage(&route_by(99)));
        assert!(admin.is_admin());
        assert!(!admin.is_moderator());
    }
}
