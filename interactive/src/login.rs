use leptos::ev::{MouseEvent, SubmitEvent};
use leptos::prelude::*;
use leptos_router::hooks::use_navigate;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;

use crate::auth::AuthState;
use crate::notify::Notices;
use crate::profile::check_new_password;

/// Window event the host page fires from its Google Identity Services
/// callback, with the ID token string as `detail`.
pub const GOOGLE_CREDENTIAL_EVENT: &str = "rewear:google-credential";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    SignIn,
    SignUp,
    Reset,
}

impl Mode {
    fn heading(self) -> &'static str {
        match self {
            Mode::SignIn => "Welcome Back!",
            Mode::SignUp => "Join ReWear",
            Mode::Reset => "Reset Password",
        }
    }

    fn action(self) -> &'static str {
        match self {
            Mode::SignIn => "Sign In",
            Mode::SignUp => "Create Account",
            Mode::Reset => "Reset Password",
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Credentials {
    name: String,
    email: String,
    password: String,
    confirm: String,
}

fn check_form(mode: Mode, form: &Credentials) -> Result<(), &'static str> {
    let email = form.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err("Please enter a valid email address");
    }
    match mode {
        Mode::SignIn if form.password.is_empty() => Err("Please enter your password"),
        Mode::SignIn => Ok(()),
        Mode::SignUp if form.name.trim().is_empty() => Err("Please enter your full name"),
        Mode::SignUp | Mode::Reset => check_new_password(&form.password, &form.confirm),
    }
}

/// Listens for credentials handed over by the Google button on the host
/// page and exchanges them for a session.
#[component]
fn GoogleSignIn() -> impl IntoView {
    let auth = expect_context::<AuthState>();
    let notices = expect_context::<Notices>();
    let navigate = use_navigate();

    let handle = window_event_listener_untyped(GOOGLE_CREDENTIAL_EVENT, move |ev| {
        let credential = ev
            .dyn_into::<web_sys::CustomEvent>()
            .ok()
            .and_then(|ev| ev.detail().as_string());
        let Some(credential) = credential else {
            tracing::warn!("google credential event without a token");
            notices.error("Sign In Failed", "Google authentication failed");
            return;
        };
        let auth = auth.clone();
        let navigate = navigate.clone();
        spawn_local(async move {
            match auth.google_login(&credential).await {
                Ok(true) => {
                    notices.success("Welcome!", "Signed in with Google.");
                    navigate("/dashboard", Default::default());
                }
                Ok(false) => notices.error("Sign In Failed", "Google authentication failed"),
                Err(e) => notices.error("Sign In Failed", e),
            }
        });
    });
    on_cleanup(move || handle.remove());

    view! {
        <div class="rewear-divider"><span>"or"</span></div>
        <div class="rewear-google g_id_signin" data-type="standard" data-width="320"></div>
    }
}

#[component]
pub fn LoginPage() -> impl IntoView {
    let auth = expect_context::<AuthState>();
    let notices = expect_context::<Notices>();
    let navigate = use_navigate();

    let mode = RwSignal::new(Mode::SignIn);
    let form = RwSignal::new(Credentials::default());
    let show_password = RwSignal::new(false);
    let problem: RwSignal<Option<String>> = RwSignal::new(None);
    let submitting = RwSignal::new(false);

    let switch_to = move |next: Mode| {
        mode.set(next);
        problem.set(None);
        form.update(|f| {
            f.password.clear();
            f.confirm.clear();
        });
    };

    let on_submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        let current = mode.get_untracked();
        let creds = form.get_untracked();
        if let Err(msg) = check_form(current, &creds) {
            problem.set(Some(msg.to_string()));
            return;
        }
        problem.set(None);
        submitting.set(true);

        let auth = auth.clone();
        let navigate = navigate.clone();
        spawn_local(async move {
            let outcome = match current {
                Mode::SignIn => auth.login(&creds.email, &creds.password).await,
                Mode::SignUp => auth.register(&creds.email, &creds.password, &creds.name).await,
                Mode::Reset => auth.reset_password(&creds.email, &creds.password).await,
            };
            submitting.set(false);
            match (current, outcome) {
                (Mode::Reset, Ok(true)) => {
                    notices.success("Password Reset", "You can now sign in with your new password.");
                    switch_to(Mode::SignIn);
                }
                (Mode::Reset, Ok(false)) => problem.set(Some("Password reset failed".into())),
                (_, Ok(true)) => {
                    tracing::info!(email = %creds.email.trim(), "signed in");
                    navigate("/dashboard", Default::default());
                }
                (Mode::SignUp, Ok(false)) => problem.set(Some("Registration failed".into())),
                (_, Ok(false)) => problem.set(Some("Login failed".into())),
                (_, Err(e)) => problem.set(Some(e.to_string())),
            }
        });
    };

    let input = move |label: &'static str,
                      kind: &'static str,
                      get: fn(&Credentials) -> String,
                      set: fn(&mut Credentials, String)| {
        view! {
            <label class="rewear-field">
                <span>{label}</span>
                <input
                    class="rewear-input"
                    type=move || if kind == "password" && show_password.get() { "text" } else { kind }
                    required=true
                    prop:value=move || form.with(get)
                    on:input=move |ev| {
                        let value = event_target_value(&ev);
                        form.update(|f| set(f, value));
                    }
                />
            </label>
        }
    };

    let password_label = move || if mode.get() == Mode::Reset { "New Password" } else { "Password" };

    view! {
        <section class="rewear-login">
            <h1>{move || mode.get().heading()}</h1>
            <p class="rewear-meta">
                {move || match mode.get() {
                    Mode::SignUp => "Start your sustainable fashion journey today",
                    Mode::SignIn => "Ready to continue your sustainable fashion journey?",
                    Mode::Reset => "Choose a new password for your account",
                }}
            </p>
            <form class="rewear-form" on:submit=on_submit>
                <Show when=move || mode.get() == Mode::SignUp>
                    {input("Full Name", "text", |f| f.name.clone(), |f, v| f.name = v)}
                </Show>
                {input("Email Address", "email", |f| f.email.clone(), |f, v| f.email = v)}
                <label class="rewear-field">
                    <span>{password_label}</span>
                    <input
                        class="rewear-input"
                        type=move || if show_password.get() { "text" } else { "password" }
                        required=true
                        prop:value=move || form.with(|f| f.password.clone())
                        on:input=move |ev| {
                            let value = event_target_value(&ev);
                            form.update(|f| f.password = value);
                        }
                    />
                </label>
                <Show when=move || mode.get() != Mode::SignIn>
                    {input("Confirm Password", "password", |f| f.confirm.clone(), |f, v| f.confirm = v)}
                </Show>
                <label class="rewear-check">
                    <input type="checkbox" prop:checked=move || show_password.get()
                        on:change=move |_| show_password.update(|s| *s = !*s) />
                    "Show password"
                </label>
                <Show when=move || mode.get() == Mode::SignIn>
                    <button type="button" class="rewear-link" on:click=move |_: MouseEvent| switch_to(Mode::Reset)>
                        "Forgot password?"
                    </button>
                </Show>
                {move || problem.get().map(|p| view! { <p class="rewear-error">{p}</p> })}
                <button class="rewear-btn rewear-btn-primary" type="submit" disabled=move || submitting.get()>
                    {move || if submitting.get() { "Please wait..." } else { mode.get().action() }}
                </button>
            </form>
            <Show when=move || mode.get() != Mode::Reset>
                <GoogleSignIn />
            </Show>
            <p class="rewear-switch">
                {move || match mode.get() {
                    Mode::SignIn => view! {
                        "Don't have an account? "
                        <button type="button" class="rewear-link" on:click=move |_: MouseEvent| switch_to(Mode::SignUp)>
                            "Sign up"
                        </button>
                    }
                    .into_any(),
                    Mode::SignUp | Mode::Reset => view! {
                        "Already have an account? "
                        <button type="button" class="rewear-link" on:click=move |_: MouseEvent| switch_to(Mode::SignIn)>
                            "Sign in"
                        </button>
                    }
                    .into_any(),
                }}
            </p>
        </section>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(name: &str, email: &str, password: &str, confirm: &str) -> Credentials {
        Credentials {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            confirm: confirm.into(),
        }
    }

    #[test]
    fn sign_in_needs_email_and_password() {
        assert_eq!(
            check_form(Mode::SignIn, &creds("", "sarah", "x", "")),
            Err("Please enter a valid email address")
        );
        assert_eq!(
            check_form(Mode::SignIn, &creds("", "sarah@rewear.dev", "", "")),
            Err("Please enter your password")
        );
        assert_eq!(check_form(Mode::SignIn, &creds("", " sarah@rewear.dev ", "x", "")), Ok(()));
    }

    #[test]
    fn sign_up_checks_name_and_confirmation() {
        assert_eq!(
            check_form(Mode::SignUp, &creds(" ", "sarah@rewear.dev", "hunter22", "hunter22")),
            Err("Please enter your full name")
        );
        assert_eq!(
            check_form(Mode::SignUp, &creds("Sarah", "sarah@rewear.dev", "hunter22", "hunter2")),
            Err("Passwords do not match")
        );
        assert_eq!(
            check_form(Mode::SignUp, &creds("Sarah", "sarah@rewear.dev", "hunter22", "hunter22")),
            Ok(())
        );
    }

    #[test]
    fn reset_requires_a_long_enough_password() {
        assert_eq!(
            check_form(Mode::Reset, &creds("", "sarah@rewear.dev", "abc", "abc")),
            Err("Password must be at least 6 characters")
        );
    }
}
