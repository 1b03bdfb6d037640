use contracts::system::auth::SapEnvironment;
use leptos::prelude::*;

use crate::shared::status::StatusMessage;

/// Состояние входа. Пароль здесь не хранится.
#[derive(Clone, Debug, Default)]
pub struct AuthState {
    pub user_display: Option<String>,
    pub environment: Option<SapEnvironment>,
    /// Message shown on the login page (errors, "session closed")
    pub notice: Option<StatusMessage>,
}

impl AuthState {
    pub fn logged_in(user_display: impl Into<String>, environment: SapEnvironment) -> Self {
        Self {
            user_display: Some(user_display.into()),
            environment: Some(environment),
            notice: None,
        }
    }

    pub fn logged_out() -> Self {
        Self {
            notice: Some(StatusMessage::info("Sesión cerrada.")),
            ..Self::default()
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_display.is_some()
    }

    /// "Usuario: X (ENV)"
    pub fn label(&self) -> String {
        match (&self.user_display, self.environment) {
            (Some(user), Some(env)) => format!("Usuario: {} ({})", user, env),
            (Some(user), None) => format!("Usuario: {}", user),
            _ => String::new(),
        }
    }
}

/// Auth context provider component
#[component]
pub fn AuthProvider(children: ChildrenFn) -> impl IntoView {
    let (auth_state, set_auth_state) = signal(AuthState::default());

    provide_context(auth_state);
    provide_context(set_auth_state);

    children()
}

/// Hook to access auth state
pub fn use_auth() -> (ReadSignal<AuthState>, WriteSignal<AuthState>) {
    let auth_state =
        use_context::<ReadSignal<AuthState>>().expect("AuthProvider not found in component tree");
    let set_auth_state =
        use_context::<WriteSignal<AuthState>>().expect("AuthProvider not found in component tree");

    (auth_state, set_auth_state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_includes_environment() {
        let state = AuthState::logged_in("JPEREZ", SapEnvironment::Qas);
        assert!(state.is_authenticated());
        assert_eq!(state.label(), "Usuario: JPEREZ (QAS)");
    }

    #[test]
    fn test_logged_out_keeps_notice_only() {
        let state = AuthState::logged_out();
        assert!(!state.is_authenticated());
        assert_eq!(state.label(), "");
        assert_eq!(
            state.notice.map(|n| n.text),
            Some("Sesión cerrada.".to_string())
        );
    }
}
