//! Role vocabulary and permission-tier resolution.
//!
//! Roles are ranked by declaration order; `Ord` on [`Role`] is the rank. All
//! resolution functions are pure and never fail: anything that cannot be read
//! as a known role is dropped on the way into a [`RoleSet`].

pub mod cache;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

pub use cache::RoleCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Agent,
    AgentPro,
    ManagerPro,
    ManagerProGold,
    ManagerProPlatinum,
    BetaUser,
    SystemAdmin,
}

impl Role {
    /// Every role, lowest rank first.
    pub const ALL: [Role; 7] = [
        Role::Agent,
        Role::AgentPro,
        Role::ManagerPro,
        Role::ManagerProGold,
        Role::ManagerProPlatinum,
        Role::BetaUser,
        Role::SystemAdmin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Agent => "agent",
            Role::AgentPro => "agent_pro",
            Role::ManagerPro => "manager_pro",
            Role::ManagerProGold => "manager_pro_gold",
            Role::ManagerProPlatinum => "manager_pro_platinum",
            Role::BetaUser => "beta_user",
            Role::SystemAdmin => "system_admin",
        }
    }

    pub fn rank(&self) -> usize {
        *self as usize
    }

    pub fn is_manager(&self) -> bool {
        matches!(self, Role::ManagerPro | Role::ManagerProGold | Role::ManagerProPlatinum)
    }

    /// Tiers that are sold as a subscription.
    pub fn is_paid_tier(&self) -> bool {
        matches!(self, Role::AgentPro) || self.is_manager()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == wanted)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// The roles held by one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from role names, silently skipping names outside the vocabulary.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(names.into_iter().filter_map(|n| n.as_ref().parse().ok()).collect())
    }

    /// Coerce a loosely-typed JSON value. `null`, numbers, objects and unknown
    /// names all contribute nothing; a bare string is treated as one role.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::String(s) => Self::from_names([s]),
            Value::Array(items) => Self::from_names(items.iter().filter_map(Value::as_str)),
            _ => Self::default(),
        }
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn insert(&mut self, role: Role) -> bool {
        self.0.insert(role)
    }

    pub fn remove(&mut self, role: Role) -> bool {
        self.0.remove(&role)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.iter().map(|r| r.as_str()).collect()
    }

    pub fn has_manager_role(&self) -> bool {
        self.iter().any(|r| r.is_manager())
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<T: IntoIterator<Item = Role>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for RoleSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(RoleSet::from_json(&value))
    }
}

pub fn check_system_admin_role(roles: &RoleSet) -> bool {
    roles.contains(Role::SystemAdmin)
}

/// Route/feature gate. No requirement means open access; `system_admin`
/// passes every gate; otherwise at least one required role must be held.
pub fn check_required_role(user_roles: &RoleSet, required_roles: Option<&[Role]>) -> bool {
    let required = match required_roles {
        None => return true,
        Some(r) if r.is_empty() => return true,
        Some(r) => r,
    };

    if check_system_admin_role(user_roles) {
        return true;
    }

    if user_roles.is_empty() {
        return false;
    }

    required.iter().any(|role| user_roles.contains(*role))
}

pub fn highest_role(user_roles: &RoleSet) -> Option<Role> {
    Role::ALL.into_iter().rev().find(|role| user_roles.contains(*role))
}

/// A user without any role may upgrade to anything.
pub fn can_upgrade_to(current_roles: &RoleSet, target: Role) -> bool {
    match highest_role(current_roles) {
        Some(current) => current.rank() < target.rank(),
        None => true,
    }
}
