use shared::Role;
use uuid::Uuid;

use crate::backend::domain::commands::state_change::Actor;

/// Authenticated user on whose behalf an operation runs.
///
/// Built per request by the REST layer and passed explicitly into every
/// operation that needs the acting user or a permission check.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user_id: Uuid,
    pub role: Role,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl Session {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self {
            user_id,
            role,
            name: None,
            email: None,
        }
    }

    /// Name shown in history; falls back to the email
    pub fn display_name(&self) -> Option<String> {
        self.name.clone().or_else(|| self.email.clone())
    }

    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.user_id,
            name: self.display_name(),
        }
    }

    pub fn can_edit(&self) -> bool {
        self.role.can_edit()
    }

    pub fn can_import(&self) -> bool {
        self.role.can_import()
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_prefers_name_over_email() {
        let mut session = Session::new(Uuid::new_v4(), Role::Gestor);
        session.email = Some("ana@example.com".to_string());
        assert_eq!(session.actor().name.as_deref(), Some("ana@example.com"));

        session.name = Some("Ana Ruiz".to_string());
        let actor = session.actor();
        assert_eq!(actor.user_id, session.user_id);
        assert_eq!(actor.name.as_deref(), Some("Ana Ruiz"));
    }

    #[test]
    fn test_permissions_follow_role() {
        assert!(Session::new(Uuid::new_v4(), Role::Admin).is_admin());
        assert!(Session::new(Uuid::new_v4(), Role::Gestor).can_import());
        assert!(!Session::new(Uuid::new_v4(), Role::Viewer).can_import());
        assert!(Session::new(Uuid::new_v4(), Role::Promotor).can_edit());
        assert!(!Session::new(Uuid::new_v4(), Role::Viewer).can_edit());
    }
}
