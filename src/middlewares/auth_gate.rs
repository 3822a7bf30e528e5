use crate::models::{AuthUser, Role};

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Admit,
    RedirectToLogin,
    RedirectHome,
}

impl GateDecision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, GateDecision::Admit)
    }

    pub fn redirect_target(&self) -> Option<&'static str> {
        match self {
            GateDecision::Admit => None,
            GateDecision::RedirectToLogin => Some(LOGIN_PATH),
            GateDecision::RedirectHome => Some(HOME_PATH),
        }
    }
}

/// Admission for one screen, given who is signed in.
pub fn gate(user: Option<&AuthUser>, required: Option<Role>) -> GateDecision {
    match (user, required) {
        (None, _) => GateDecision::RedirectToLogin,
        (Some(user), Some(role)) if user.role != role => GateDecision::RedirectHome,
        _ => GateDecision::Admit,
    }
}

// 受保护路由配置
struct ProtectedRoute {
    prefix: &'static str,
    role: Option<Role>,
}

/// Route table on top of [`gate`]: paths not listed are public.
pub struct AuthGate {
    protected: Vec<ProtectedRoute>,
}

impl Default for AuthGate {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthGate {
    pub fn new() -> Self {
        Self {
            protected: vec![
                ProtectedRoute {
                    prefix: "/admin",
                    role: Some(Role::Admin),
                },
                ProtectedRoute {
                    prefix: "/account",
                    role: None,
                },
            ],
        }
    }

    /// `None` for public paths, otherwise the role the path demands (which
    /// may itself be `None`: any signed-in user).
    pub fn requirement(&self, path: &str) -> Option<Option<Role>> {
        self.protected
            .iter()
            .find(|route| matches_prefix(path, route.prefix))
            .map(|route| route.role)
    }

    pub fn check(&self, path: &str, user: Option<&AuthUser>) -> GateDecision {
        match self.requirement(path) {
            None => GateDecision::Admit,
            Some(role) => {
                let decision = gate(user, role);
                if !decision.is_admitted() {
                    log::warn!("Access to {path} denied: {decision:?}");
                }
                decision
            }
        }
    }
}

fn matches_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            id: "7".to_string(),
            username: "staff01".to_string(),
            role,
        }
    }

    #[test]
    fn test_gate_predicate() {
        assert_eq!(gate(None, None), GateDecision::RedirectToLogin);
        assert_eq!(gate(None, Some(Role::Admin)), GateDecision::RedirectToLogin);
        assert_eq!(
            gate(Some(&user(Role::Staff)), Some(Role::Admin)),
            GateDecision::RedirectHome
        );
        assert_eq!(gate(Some(&user(Role::Staff)), None), GateDecision::Admit);
        assert_eq!(
            gate(Some(&user(Role::Admin)), Some(Role::Admin)),
            GateDecision::Admit
        );
    }

    #[test]
    fn test_route_table() {
        let gate = AuthGate::new();
        let admin = user(Role::Admin);
        let customer = user(Role::Customer);

        assert!(gate.check("/", None).is_admitted());
        assert!(gate.check("/payment", None).is_admitted());
        assert!(gate.check("/administrator", None).is_admitted());

        assert_eq!(gate.check("/admin/shows", None), GateDecision::RedirectToLogin);
        assert_eq!(
            gate.check("/admin", Some(&customer)),
            GateDecision::RedirectHome
        );
        assert!(gate.check("/admin/tickets", Some(&admin)).is_admitted());
        assert!(gate.check("/account", Some(&customer)).is_admitted());
        assert_eq!(
            gate.check("/account", None).redirect_target(),
            Some(LOGIN_PATH)
        );
    }
}
