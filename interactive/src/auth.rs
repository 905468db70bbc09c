use std::sync::Arc;

use leptos::ev::MouseEvent;
use leptos::prelude::*;
use rewear_shared::{
    messages, ChangePasswordRequest, GoogleTokenRequest, LoginRequest, PasswordResetRequest,
    RegisterRequest, User, UserUpdate,
};
use wasm_bindgen_futures::spawn_local;

use crate::api::Backend;
use crate::error::ApiError;

/// Reactive auth state shared via context.
///
/// The session itself is an HTTP-only cookie owned by the auth service; this
/// only mirrors the profile of whoever the cookie belongs to.
#[derive(Clone)]
pub struct AuthState {
    pub user: RwSignal<Option<User>>,
    /// True until the startup session check has finished.
    pub loading: RwSignal<bool>,
    backend: Arc<dyn Backend>,
}

impl AuthState {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            user: RwSignal::new(None),
            loading: RwSignal::new(true),
            backend,
        }
    }

    pub fn backend(&self) -> Arc<dyn Backend> {
        Arc::clone(&self.backend)
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.with(Option::is_some)
    }

    pub fn is_admin(&self) -> bool {
        self.user.with(|u| u.as_ref().is_some_and(User::is_admin))
    }

    /// Restores an existing session. Never fails: any error leaves the user
    /// signed out.
    pub async fn initialize(&self) {
        match self.restore().await {
            Ok(Some(user)) => {
                tracing::info!(user = %user.id, "session restored");
                self.user.set(Some(user));
            }
            Ok(None) => self.user.set(None),
            Err(e) => {
                tracing::warn!(error = %e, "auth check failed");
                self.user.set(None);
            }
        }
        self.loading.set(false);
    }

    async fn restore(&self) -> Result<Option<User>, ApiError> {
        if !self.backend.check_authentication().await? {
            return Ok(None);
        }
        self.backend.profile().await.map(Some)
    }

    pub async fn refresh_profile(&self) -> Result<(), ApiError> {
        let user = self.backend.profile().await?;
        self.user.set(Some(user));
        Ok(())
    }

    /// `Ok(true)` once signed in; `Ok(false)` when the service answered
    /// with something other than its success message.
    pub async fn login(&self, email: &str, password: &str) -> Result<bool, ApiError> {
        let reply = self
            .backend
            .login(&LoginRequest {
                email: email.trim().to_string(),
                password: password.to_string(),
            })
            .await?;
        if !reply.is(messages::LOGIN_SUCCESSFUL) {
            tracing::warn!(message = %reply.message, "unexpected login reply");
            return Ok(false);
        }
        self.refresh_profile().await?;
        Ok(true)
    }

    pub async fn register(&self, email: &str, password: &str, name: &str) -> Result<bool, ApiError> {
        let reply = self
            .backend
            .register(&RegisterRequest {
                email: email.trim().to_string(),
                password: password.to_string(),
                name: name.trim().to_string(),
                phone: None,
                location: None,
                bio: None,
            })
            .await?;
        if reply != messages::REGISTERED {
            tracing::warn!(message = %reply, "unexpected registration reply");
            return Ok(false);
        }
        self.refresh_profile().await?;
        Ok(true)
    }

    /// Exchanges a Google identity credential for a session.
    pub async fn google_login(&self, credential: &str) -> Result<bool, ApiError> {
        let reply = self
            .backend
            .google_login(&GoogleTokenRequest {
                credential: credential.to_string(),
            })
            .await?;
        match reply.user {
            Some(user) if reply.message == messages::GOOGLE_LOGIN_SUCCESSFUL => {
                self.user.set(Some(user));
                Ok(true)
            }
            _ => {
                tracing::warn!(message = %reply.message, "unexpected google login reply");
                Ok(false)
            }
        }
    }

    /// Best effort: the local user is cleared even when the service call
    /// fails.
    pub async fn logout(&self) {
        if let Err(e) = self.backend.logout().await {
            tracing::warn!(error = %e, "logout failed, clearing local session anyway");
        }
        self.user.set(None);
    }

    pub async fn update_user(&self, update: &UserUpdate) -> Result<bool, ApiError> {
        let reply = self.backend.update_profile(update).await?;
        match reply.user {
            Some(user) if reply.message == messages::PROFILE_UPDATED => {
                self.user.set(Some(user));
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// `Ok(false)` when the service answered with something other than its
    /// confirmation.
    pub async fn change_password(&self, old: &str, new: &str) -> Result<bool, ApiError> {
        let email = self
            .user
            .with_untracked(|u| u.as_ref().map(|u| u.email.clone()))
            .ok_or(ApiError::NotAuthenticated)?;
        let reply = self
            .backend
            .change_password(&ChangePasswordRequest {
                email,
                old_password: old.to_string(),
                new_password: new.to_string(),
            })
            .await?;
        if !reply.is(messages::PASSWORD_CHANGED) {
            tracing::warn!(message = %reply.message, "unexpected password change reply");
            return Ok(false);
        }
        Ok(true)
    }

    pub async fn reset_password(&self, email: &str, password: &str) -> Result<bool, ApiError> {
        let reply = self
            .backend
            .reset_password(&PasswordResetRequest {
                email: email.trim().to_string(),
                password: password.to_string(),
            })
            .await?;
        if !reply.is(messages::PASSWORD_RESET) {
            tracing::warn!(message = %reply.message, "unexpected password reset reply");
            return Ok(false);
        }
        Ok(true)
    }
}

/// Provider component: wraps children with auth context and kicks off the
/// session check.
#[component]
pub fn AuthProvider(children: Children) -> impl IntoView {
    let backend = expect_context::<Arc<dyn Backend>>();
    let auth = AuthState::new(backend);
    provide_context(auth.clone());

    spawn_local(async move {
        auth.initialize().await;
    });

    children()
}

/// Header account area: avatar and menu when signed in, sign-in link
/// otherwise.
#[component]
pub fn AccountMenu() -> impl IntoView {
    let auth = expect_context::<AuthState>();
    let navigate = leptos_router::hooks::use_navigate();

    let on_logout = {
        let auth = auth.clone();
        move |_: MouseEvent| {
            let auth = auth.clone();
            let navigate = navigate.clone();
            spawn_local(async move {
                auth.logout().await;
                navigate("/", Default::default());
            });
        }
    };

    move || {
        if auth.loading.get() {
            return view! { <span class="rewear-auth-pending"></span> }.into_any();
        }
        match auth.user.get() {
            Some(user) => {
                let avatar = match user.picture.clone() {
                    Some(src) => view! { <img src=src alt="" class="rewear-avatar" width="32" height="32" /> }.into_any(),
                    None => view! { <span class="rewear-avatar rewear-avatar-initials">{user.initials()}</span> }.into_any(),
                };
                view! {
                    <div class="rewear-auth">
                        {avatar}
                        <a class="rewear-username" href="/dashboard">{user.display_name().to_string()}</a>
                        {user.is_admin().then(|| view! { <a class="rewear-btn rewear-btn-sm" href="/admin">"Admin"</a> })}
                        <button class="rewear-btn rewear-btn-sm" on:click=on_logout.clone()>"Logout"</button>
                    </div>
                }
                .into_any()
            }
            None => view! { <a class="rewear-btn" href="/login">"Sign In"</a> }.into_any(),
        }
    }
}
