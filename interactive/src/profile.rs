use std::sync::Arc;

use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use leptos_router::hooks::use_navigate;
use rewear_shared::{Product, User, UserUpdate, WishlistFilter};
use wasm_bindgen_futures::spawn_local;

use crate::api::Backend;
use crate::auth::AuthState;
use crate::browse::ItemCard;
use crate::error::ApiError;
use crate::notify::Notices;
use crate::wishlist::WishlistState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Overview,
    MyItems,
    Impact,
}

impl Tab {
    const ALL: [Tab; 3] = [Tab::Overview, Tab::MyItems, Tab::Impact];

    fn label(self) -> &'static str {
        match self {
            Tab::Overview => "Overview",
            Tab::MyItems => "My Items",
            Tab::Impact => "Impact",
        }
    }
}

#[component]
fn SignInPrompt(what: &'static str) -> impl IntoView {
    view! {
        <div class="rewear-empty">
            <h3>{format!("Sign in to see your {what}")}</h3>
            <a class="rewear-btn rewear-btn-primary" href="/login">"Sign In"</a>
        </div>
    }
}

// ── Dashboard ──

#[component]
pub fn DashboardPage() -> impl IntoView {
    let auth = expect_context::<AuthState>();

    // Counters such as points and swaps change server side, so re-read the
    // profile whenever the dashboard opens.
    {
        let auth = auth.clone();
        let notices = expect_context::<Notices>();
        spawn_local(async move {
            if auth.user.get_untracked().is_none() {
                return;
            }
            if let Err(e) = auth.refresh_profile().await {
                tracing::warn!(error = %e, "could not refresh profile");
                notices.error("Error", "Failed to load user profile");
            }
        });
    }

    let user = auth.user;
    view! {
        <section class="rewear-dashboard">
            {move || match user.get() {
                Some(user) => view! { <Dashboard user=user /> }.into_any(),
                None => view! { <SignInPrompt what="dashboard" /> }.into_any(),
            }}
        </section>
    }
}

#[component]
fn Dashboard(user: User) -> impl IntoView {
    let wishlist = expect_context::<WishlistState>();
    let tab = RwSignal::new(Tab::Overview);
    let impact = user.eco_impact();
    let owner = user.email.clone();

    let avatar = match user.picture.clone() {
        Some(src) => view! { <img class="rewear-avatar rewear-avatar-lg" src=src alt="" /> }.into_any(),
        None => view! { <span class="rewear-avatar rewear-avatar-lg rewear-avatar-initials">{user.initials()}</span> }.into_any(),
    };

    let stat = |label: &'static str, value: String| {
        view! {
            <div class="rewear-stat">
                <strong>{value}</strong>
                <span>{label}</span>
            </div>
        }
    };

    view! {
        <header class="rewear-profile-head">
            {avatar}
            <div>
                <h1>{user.display_name().to_string()}</h1>
                <p class="rewear-meta">{user.location.clone().unwrap_or_else(|| "Location not set".to_string())}</p>
                <p class="rewear-meta">{format!("Member since {}", user.member_since())}</p>
                {user.bio.clone().map(|bio| view! { <p>{bio}</p> })}
            </div>
            <a class="rewear-btn rewear-btn-sm" href="/profile">"Edit Profile"</a>
        </header>
        <div class="rewear-stats">
            {stat("Points", user.points_label())}
            {stat("Rating", format!("{:.1}", user.rating))}
            {stat("Swaps", user.swaps.to_string())}
            {stat("Items Listed", user.items_listed.to_string())}
        </div>
        <nav class="rewear-tabs">
            {Tab::ALL
                .into_iter()
                .map(|t| view! {
                    <button
                        class="rewear-tab"
                        class:active=move || tab.get() == t
                        on:click=move |_| tab.set(t)
                    >
                        {t.label()}
                    </button>
                })
                .collect_view()}
        </nav>
        {move || match tab.get() {
            Tab::Overview => {
                let wishlist = wishlist.clone();
                view! {
                    <div class="rewear-overview">
                        <div class="rewear-stat">
                            <strong>{move || wishlist.count(WishlistFilter::All)}</strong>
                            <span>"Saved in wishlist"</span>
                        </div>
                        <div class="rewear-stat">
                            <strong>{user.favorites}</strong>
                            <span>"Favorites"</span>
                        </div>
                        <div class="rewear-quick-links">
                            <a class="rewear-btn" href="/list-item">"List an Item"</a>
                            <a class="rewear-btn" href="/browse">"Browse Items"</a>
                            <a class="rewear-btn" href="/wishlist">"View Wishlist"</a>
                        </div>
                    </div>
                }
                .into_any()
            }
            Tab::MyItems => view! { <MyItems owner=owner.clone() /> }.into_any(),
            Tab::Impact => view! {
                <div class="rewear-impact">
                    <div class="rewear-stat">
                        <strong>{impact.items_saved}</strong>
                        <span>"Items saved from landfill"</span>
                    </div>
                    <div class="rewear-stat">
                        <strong>{impact.co2_label()}</strong>
                        <span>"CO\u{2082} saved"</span>
                    </div>
                    <div class="rewear-stat">
                        <strong>{impact.water_label()}</strong>
                        <span>"Water saved"</span>
                    </div>
                </div>
            }
            .into_any(),
        }}
    }
}

/// Listings created by `owner`.
///
/// The product service stamps `owner_id` with the session email, so that is
/// the key to look them up by, not the account id.
pub(crate) async fn own_listings(
    backend: &dyn Backend,
    owner: &str,
) -> Result<Vec<Product>, ApiError> {
    backend.products_by_user(owner).await
}

#[component]
fn MyItems(owner: String) -> impl IntoView {
    let backend = expect_context::<Arc<dyn Backend>>();
    let items: RwSignal<Vec<Product>> = RwSignal::new(Vec::new());
    let loading = RwSignal::new(true);
    let error: RwSignal<Option<String>> = RwSignal::new(None);

    spawn_local(async move {
        match own_listings(backend.as_ref(), &owner).await {
            Ok(list) => items.set(list),
            Err(e) => {
                tracing::warn!(error = %e, "could not load own listings");
                error.set(Some(e.to_string()));
            }
        }
        loading.set(false);
    });

    view! {
        <div class="rewear-my-items">
            <Show when=move || loading.get()>
                <p class="rewear-loading">"Loading..."</p>
            </Show>
            {move || error.get().map(|e| view! { <p class="rewear-error">{e}</p> })}
            <Show when=move || !loading.get() && items.with(Vec::is_empty) && error.with(Option::is_none)>
                <div class="rewear-empty">
                    <p>"You have not listed anything yet."</p>
                    <a class="rewear-btn rewear-btn-primary" href="/list-item">"List an Item"</a>
                </div>
            </Show>
            <div class="rewear-grid">
                <For each=move || items.get() key=|p| p.id.clone() let:product>
                    <ItemCard product=product />
                </For>
            </div>
        </div>
    }
}

// ── Edit profile ──

fn form_from(user: &User) -> UserUpdate {
    UserUpdate {
        name: user.name.clone(),
        email: Some(user.email.clone()),
        phone: user.phone.clone(),
        location: user.location.clone(),
        bio: user.bio.clone(),
    }
}

#[component]
pub fn EditProfilePage() -> impl IntoView {
    let auth = expect_context::<AuthState>();
    let user = auth.user;

    view! {
        <section class="rewear-edit-profile">
            <h1>"Edit Profile"</h1>
            {move || match user.get() {
                Some(current) => view! {
                    <ProfileForm current=current />
                    <PasswordForm />
                }
                .into_any(),
                None => view! { <SignInPrompt what="profile" /> }.into_any(),
            }}
        </section>
    }
}

#[component]
fn ProfileForm(current: User) -> impl IntoView {
    let auth = expect_context::<AuthState>();
    let notices = expect_context::<Notices>();
    let navigate = use_navigate();
    let form = RwSignal::new(form_from(&current));
    let saving = RwSignal::new(false);
    let current = StoredValue::new(current);

    let on_submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        let update = current.with_value(|c| UserUpdate::diff(c, &form.get_untracked()));
        if update.is_empty() {
            notices.info("No Changes", "No changes were made to save");
            return;
        }
        saving.set(true);
        let auth = auth.clone();
        let navigate = navigate.clone();
        spawn_local(async move {
            match auth.update_user(&update).await {
                Ok(_) => {
                    notices.success("Success", "Profile updated successfully!");
                    navigate("/dashboard", Default::default());
                }
                Err(e) => notices.error("Error", e),
            }
            saving.set(false);
        });
    };

    let field = move |label: &'static str,
                      kind: &'static str,
                      get: fn(&UserUpdate) -> Option<String>,
                      set: fn(&mut UserUpdate, String)| {
        view! {
            <label class="rewear-field">
                <span>{label}</span>
                <input
                    class="rewear-input"
                    type=kind
                    prop:value=move || form.with(get).unwrap_or_default()
                    on:input=move |ev| {
                        let value = event_target_value(&ev);
                        form.update(|f| set(f, value));
                    }
                />
            </label>
        }
    };

    view! {
        <form class="rewear-form" on:submit=on_submit>
            {field("Full Name", "text", |f| f.name.clone(), |f, v| f.name = Some(v))}
            {field("Email", "email", |f| f.email.clone(), |f, v| f.email = Some(v))}
            {field("Phone", "tel", |f| f.phone.clone(), |f, v| f.phone = Some(v))}
            {field("Location", "text", |f| f.location.clone(), |f, v| f.location = Some(v))}
            <label class="rewear-field">
                <span>"Bio"</span>
                <textarea
                    class="rewear-textarea"
                    prop:value=move || form.with(|f| f.bio.clone()).unwrap_or_default()
                    on:input=move |ev| {
                        let value = event_target_value(&ev);
                        form.update(|f| f.bio = Some(value));
                    }
                />
            </label>
            <div class="rewear-form-actions">
                <a class="rewear-btn rewear-btn-ghost" href="/dashboard">"Cancel"</a>
                <button class="rewear-btn rewear-btn-primary" type="submit" disabled=move || saving.get()>
                    {move || if saving.get() { "Saving..." } else { "Save Changes" }}
                </button>
            </div>
        </form>
    }
}

/// Checks the new password pair before anything is sent.
pub(crate) fn check_new_password(new: &str, confirm: &str) -> Result<(), &'static str> {
    if new.chars().count() < 6 {
        return Err("Password must be at least 6 characters");
    }
    if new != confirm {
        return Err("Passwords do not match");
    }
    Ok(())
}

#[component]
fn PasswordForm() -> impl IntoView {
    let auth = expect_context::<AuthState>();
    let notices = expect_context::<Notices>();
    let old = RwSignal::new(String::new());
    let new = RwSignal::new(String::new());
    let confirm = RwSignal::new(String::new());
    let saving = RwSignal::new(false);

    let on_submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        let (old_pw, new_pw) = (old.get_untracked(), new.get_untracked());
        if let Err(msg) = check_new_password(&new_pw, &confirm.get_untracked()) {
            notices.error("Change Password", msg);
            return;
        }
        saving.set(true);
        let auth = auth.clone();
        spawn_local(async move {
            match auth.change_password(&old_pw, &new_pw).await {
                Ok(true) => {
                    notices.success("Password Changed", "Your password has been updated.");
                    for signal in [old, new, confirm] {
                        signal.set(String::new());
                    }
                }
                Ok(false) => notices.error("Change Password", "Password change failed"),
                Err(e) => notices.error("Change Password", e),
            }
            saving.set(false);
        });
    };

    let input = |label: &'static str, value: RwSignal<String>| {
        view! {
            <label class="rewear-field">
                <span>{label}</span>
                <input
                    class="rewear-input"
                    type="password"
                    prop:value=move || value.get()
                    on:input=move |ev| value.set(event_target_value(&ev))
                />
            </label>
        }
    };

    view! {
        <form class="rewear-form" on:submit=on_submit>
            <h2>"Change Password"</h2>
            {input("Current Password", old)}
            {input("New Password", new)}
            {input("Confirm New Password", confirm)}
            <button class="rewear-btn" type="submit" disabled=move || saving.get()>
                {move || if saving.get() { "Updating..." } else { "Update Password" }}
            </button>
        </form>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_password_must_be_confirmed() {
        assert_eq!(check_new_password("hunter22", "hunter22"), Ok(()));
        assert_eq!(check_new_password("hunter22", "hunter23"), Err("Passwords do not match"));
        assert_eq!(
            check_new_password("abc", "abc"),
            Err("Password must be at least 6 characters")
        );
    }

    #[test]
    fn unchanged_form_produces_no_update() {
        let user: User = serde_json::from_value(serde_json::json!({
            "_id": "u1",
            "email": "sarah@rewear.dev",
            "name": "Sarah Johnson",
            "location": "Portland, OR",
        }))
        .unwrap();
        let mut form = form_from(&user);
        assert!(UserUpdate::diff(&user, &form).is_empty());

        form.bio = Some("Thrifting since 2015".into());
        let update = UserUpdate::diff(&user, &form);
        assert_eq!(update.bio.as_deref(), Some("Thrifting since 2015"));
        assert_eq!(update.email, None);
    }

    #[test]
    fn new_listing_shows_up_under_my_items() {
        use futures::executor::block_on;
        use rewear_shared::NewProduct;

        use crate::api::fake::{product, user, FakeBackend};

        let sarah = user("u1", "sarah@rewear.dev");
        let backend = FakeBackend::new()
            .with_session(sarah.clone())
            .with_products(vec![product("p1", "Wool Scarf", 12.0)]);
        let draft = NewProduct::from(&product("draft", "Linen Shirt", 20.0));
        let created = block_on(backend.create_product(&draft)).unwrap().product;
        assert!(created.is_owned_by(&sarah.id, &sarah.email));

        let mine = block_on(own_listings(&backend, &sarah.email)).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, created.id);
        assert_eq!(mine[0].title, "Linen Shirt");
    }
}
