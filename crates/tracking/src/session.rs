use model::{
    user::{Role, User},
    WithId,
};

use crate::backend::{BackendError, RouteBackend};

/// Who the view works for. Routes are listed, saved and reported under the
/// profile of this context.
#[derive(Debug, Clone)]
pub struct SessionContext {
    user: Option<WithId<User>>,
    profile_id: String,
}

impl SessionContext {
    pub fn from_login(user: WithId<User>) -> Self {
        Self {
            profile_id: user.content.profile_id.clone(),
            user: Some(user),
        }
    }

    /// A context for a known profile without a logged in user.
    pub fn anonymous<S: Into<String>>(profile_id: S) -> Self {
        Self {
            user: None,
            profile_id: profile_id.into(),
        }
    }

    pub async fn login(
        backend: &dyn RouteBackend,
        email: &str,
        password: &str,
    ) -> Result<Self, BackendError> {
        let user = backend.login(email.trim(), password).await?;
        log::info!(
            "logged in as {} ({})",
            user.content.email,
            user.content.role
        );
        Ok(Self::from_login(user))
    }

    pub fn owner_id(&self) -> &str {
        &self.profile_id
    }

    pub fn user(&self) -> Option<&WithId<User>> {
        self.user.as_ref()
    }

    pub fn role(&self) -> Role {
        self.user
            .as_ref()
            .map(|user| user.content.role)
            .unwrap_or_default()
    }

    /// Forgets the user but keeps working on the same profile.
    pub fn logout(&mut self) {
        if let Some(user) = self.user.take() {
            log::info!("logged out {}", user.content.email);
        }
    }
}

#[cfg(test)]
mod tests {
    use utility::id::Id;

    use super::*;

    fn driver() -> WithId<User> {
        WithId::new(
            Id::new(7),
            User {
                email: "ana@mail.com".to_owned(),
                name: "Ana".to_owned(),
                role: Role::Driver,
                profile_id: "p7".to_owned(),
            },
        )
    }

    #[test]
    fn login_context_uses_the_user_profile() {
        let session = SessionContext::from_login(driver());
        assert_eq!(session.owner_id(), "p7");
        assert_eq!(session.role(), Role::Driver);
        assert_eq!(session.user().map(|u| u.id), Some(Id::new(7)));
    }

    #[test]
    fn logout_keeps_the_profile() {
        let mut session = SessionContext::from_login(driver());
        session.logout();
        assert!(session.user().is_none());
        assert_eq!(session.owner_id(), "p7");
        assert_eq!(session.role(), Role::User);
    }

    #[test]
    fn anonymous_has_default_role() {
        let session = SessionContext::anonymous("p1");
        assert_eq!(session.owner_id(), "p1");
        assert_eq!(session.role(), Role::User);
    }
}
