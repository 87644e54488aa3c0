//! Route gates for the client application, evaluated server-side.
//!
//! A [`RouteTable`] is built once at bootstrap and owned by the application
//! state. Each rule carries an ordered list of gates; the first gate that
//! fails decides the redirect.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::roles::{check_required_role, check_system_admin_role, highest_role, Role, RoleSet};

pub const LOGIN_PATH: &str = "/login";
pub const PRICING_PATH: &str = "/pricing";
pub const DEFAULT_FALLBACK: &str = "/dashboard";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "gate", rename_all = "snake_case")]
pub enum Gate {
    /// Signed-in users only.
    Authenticated,
    /// At least one of `required` (system_admin always passes).
    Roles { required: Vec<Role>, fallback: String },
    /// Live subscription, or a `system_admin`/`beta_user` role.
    Subscription,
    /// Subscription check applied only when the highest role is a paid tier.
    ConditionalSubscription,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteRule {
    pub path: String,
    pub gates: Vec<Gate>,
}

impl RouteRule {
    pub fn public(path: &str) -> Self {
        Self {
            path: path.to_string(),
            gates: Vec::new(),
        }
    }

    pub fn protected(path: &str) -> Self {
        Self {
            path: path.to_string(),
            gates: vec![Gate::Authenticated],
        }
    }

    pub fn with_roles(mut self, required: &[Role]) -> Self {
        self.gates.push(Gate::Roles {
            required: required.to_vec(),
            fallback: DEFAULT_FALLBACK.to_string(),
        });
        self
    }

    pub fn with_subscription(mut self) -> Self {
        self.gates.push(Gate::Subscription);
        self
    }

    pub fn with_conditional_subscription(mut self) -> Self {
        self.gates.push(Gate::ConditionalSubscription);
        self
    }

    fn matches(&self, path: &str) -> bool {
        if self.path == "/" {
            return path == "/";
        }
        path == self.path
            || path
                .strip_prefix(self.path.as_str())
                .map_or(false, |rest| rest.starts_with('/'))
    }
}

/// What the gates know about the viewer.
#[derive(Debug, Clone, Default)]
pub struct AccessSubject {
    pub roles: RoleSet,
    pub subscription_status: Option<String>,
}

impl AccessSubject {
    pub fn has_live_subscription(&self) -> bool {
        matches!(self.subscription_status.as_deref(), Some("active") | Some("trialing"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum RouteDecision {
    Allow,
    Redirect { to: String, return_to: Option<String> },
}

impl RouteDecision {
    fn redirect(to: &str, return_to: Option<&str>) -> Self {
        RouteDecision::Redirect {
            to: to.to_string(),
            return_to: return_to.map(str::to_string),
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, RouteDecision::Allow)
    }
}

pub fn subscription_satisfied(subject: &AccessSubject) -> bool {
    subject.has_live_subscription()
        || check_system_admin_role(&subject.roles)
        || subject.roles.contains(Role::BetaUser)
}

fn evaluate(gate: &Gate, path: &str, subject: Option<&AccessSubject>) -> Option<RouteDecision> {
    let Some(subject) = subject else {
        return Some(RouteDecision::redirect(LOGIN_PATH, Some(path)));
    };

    match gate {
        Gate::Authenticated => None,
        Gate::Roles { required, fallback } => {
            (!check_required_role(&subject.roles, Some(required))).then(|| RouteDecision::redirect(fallback, None))
        }
        Gate::Subscription => {
            (!subscription_satisfied(subject)).then(|| RouteDecision::redirect(PRICING_PATH, Some(path)))
        }
        Gate::ConditionalSubscription => {
            let paid = highest_role(&subject.roles).map_or(false, |r| r.is_paid_tier());
            (paid && !subscription_satisfied(subject)).then(|| RouteDecision::redirect(PRICING_PATH, Some(path)))
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    pub fn new(rules: Vec<RouteRule>) -> Self {
        Self { rules }
    }

    /// The application's client routes.
    pub fn default_routes() -> Self {
        let managers = [Role::ManagerPro, Role::ManagerProGold, Role::ManagerProPlatinum];

        Self::new(vec![
            RouteRule::public("/"),
            RouteRule::public("/login"),
            RouteRule::public("/signup"),
            RouteRule::public("/reset-password"),
            RouteRule::public("/auth/callback"),
            RouteRule::public("/pricing"),
            RouteRule::protected("/dashboard"),
            RouteRule::protected("/profile"),
            RouteRule::protected("/settings"),
            RouteRule::protected("/billing"),
            RouteRule::protected("/bulletins"),
            RouteRule::protected("/clients").with_conditional_subscription(),
            RouteRule::protected("/assessments").with_conditional_subscription(),
            RouteRule::protected("/metrics").with_conditional_subscription(),
            RouteRule::protected("/expenses").with_conditional_subscription(),
            RouteRule::protected("/forms")
                .with_roles(&[Role::AgentPro, Role::ManagerPro, Role::ManagerProGold, Role::ManagerProPlatinum])
                .with_subscription(),
            RouteRule::protected("/team").with_roles(&managers).with_subscription(),
            RouteRule::protected("/team/nested")
                .with_roles(&[Role::ManagerProGold, Role::ManagerProPlatinum])
                .with_subscription(),
            RouteRule::protected("/admin").with_roles(&[Role::SystemAdmin]),
        ])
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    /// Longest matching rule wins.
    fn rule_for(&self, path: &str) -> Option<&RouteRule> {
        self.rules
            .iter()
            .filter(|rule| rule.matches(path))
            .max_by_key(|rule| rule.path.len())
    }

    /// Decide whether `subject` (None when signed out) may open `path`.
    /// Unknown paths require sign-in and nothing else.
    pub fn resolve(&self, path: &str, subject: Option<&AccessSubject>) -> RouteDecision {
        let path = normalize(path);
        let fallback_gates = [Gate::Authenticated];
        let gates: &[Gate] = match self.rule_for(&path) {
            Some(rule) => &rule.gates,
            None => &fallback_gates,
        };

        for gate in gates {
            if let Some(decision) = evaluate(gate, &path, subject) {
                debug!(path = %path, ?decision, "Route gate redirected");
                return decision;
            }
        }
        RouteDecision::Allow
    }
}

fn normalize(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject(roles: &[Role], status: Option<&str>) -> AccessSubject {
        AccessSubject {
            roles: roles.iter().copied().collect(),
            subscription_status: status.map(str::to_string),
        }
    }

    fn redirect_target(decision: RouteDecision) -> String {
        match decision {
            RouteDecision::Redirect { to, .. } => to,
            RouteDecision::Allow => panic!("expected a redirect"),
        }
    }

    #[test]
    fn public_routes_need_nothing() {
        let table = RouteTable::default_routes();
        assert!(table.resolve("/", None).is_allowed());
        assert!(table.resolve("/pricing", None).is_allowed());
        assert!(table.resolve("/login/", None).is_allowed());
    }

    #[test]
    fn signed_out_viewers_go_to_login_with_return_path() {
        let table = RouteTable::default_routes();
        assert_eq!(
            table.resolve("/team/nested?x=1", None),
            RouteDecision::Redirect {
                to: "/login".into(),
                return_to: Some("/team/nested".into())
            }
        );
        assert_eq!(redirect_target(table.resolve("/somewhere-unknown", None)), "/login");
    }

    #[test]
    fn unknown_paths_allow_signed_in_viewers() {
        let table = RouteTable::default_routes();
        assert!(table.resolve("/nope", Some(&subject(&[], None))).is_allowed());
    }

    #[test]
    fn role_gate_falls_back_to_dashboard() {
        let table = RouteTable::default_routes();
        let agent = subject(&[Role::Agent], Some("active"));
        assert_eq!(redirect_target(table.resolve("/admin", Some(&agent))), "/dashboard");
        assert_eq!(redirect_target(table.resolve("/team", Some(&agent))), "/dashboard");

        let admin = subject(&[Role::SystemAdmin], None);
        assert!(table.resolve("/admin/users", Some(&admin)).is_allowed());
    }

    #[test]
    fn subscription_gate() {
        let table = RouteTable::default_routes();
        let lapsed = subject(&[Role::ManagerPro], Some("canceled"));
        assert_eq!(redirect_target(table.resolve("/team", Some(&lapsed))), "/pricing");

        let trialing = subject(&[Role::ManagerPro], Some("trialing"));
        assert!(table.resolve("/team", Some(&trialing)).is_allowed());

        let beta = subject(&[Role::BetaUser, Role::ManagerPro], None);
        assert!(table.resolve("/team", Some(&beta)).is_allowed());
    }

    #[test]
    fn longest_prefix_wins() {
        let table = RouteTable::default_routes();
        let manager = subject(&[Role::ManagerPro], Some("active"));
        assert!(table.resolve("/team", Some(&manager)).is_allowed());
        assert_eq!(redirect_target(table.resolve("/team/nested", Some(&manager))), "/dashboard");
        assert!(!RouteRule::public("/team").matches("/teams"));
    }

    #[test]
    fn conditional_subscription_only_binds_paid_tiers() {
        let table = RouteTable::default_routes();
        let free = subject(&[Role::Agent], None);
        assert!(table.resolve("/metrics", Some(&free)).is_allowed());

        let roleless = subject(&[], None);
        assert!(table.resolve("/metrics", Some(&roleless)).is_allowed());

        let unpaid_pro = subject(&[Role::AgentPro], None);
        assert_eq!(redirect_target(table.resolve("/metrics", Some(&unpaid_pro))), "/pricing");

        let paid_pro = subject(&[Role::AgentPro], Some("active"));
        assert!(table.resolve("/metrics", Some(&paid_pro)).is_allowed());

        let admin = subject(&[Role::Agent, Role::SystemAdmin], None);
        assert!(table.resolve("/metrics", Some(&admin)).is_allowed());
    }
}
