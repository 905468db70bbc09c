use std::sync::Arc;

use leptos::prelude::*;
use rewear_shared::{Product, User, Wishlist, WishlistEntry, WishlistFilter};
use wasm_bindgen_futures::spawn_local;

use crate::api::Backend;
use crate::auth::AuthState;
use crate::cart::AddToCart;
use crate::error::ApiError;
use crate::notify::Notices;

/// Server-backed wishlist cache.
///
/// The server is the source of truth: every successful add or remove is
/// followed by a full reload. Failures land in `error` instead of being
/// returned, so views read them from the store.
#[derive(Clone)]
pub struct WishlistState {
    pub list: RwSignal<Wishlist>,
    pub loading: RwSignal<bool>,
    pub error: RwSignal<Option<String>>,
    user: RwSignal<Option<User>>,
    backend: Arc<dyn Backend>,
}

impl WishlistState {
    pub fn new(user: RwSignal<Option<User>>, backend: Arc<dyn Backend>) -> Self {
        Self {
            list: RwSignal::new(Wishlist::default()),
            loading: RwSignal::new(false),
            error: RwSignal::new(None),
            user,
            backend,
        }
    }

    pub fn for_session(auth: &AuthState) -> Self {
        Self::new(auth.user, auth.backend())
    }

    fn signed_in(&self) -> bool {
        self.user.with_untracked(Option::is_some)
    }

    fn fail(&self, what: &str, e: &ApiError) {
        tracing::warn!(error = %e, "{what} failed");
        self.error.set(Some(e.to_string()));
    }

    fn session_id(&self) -> Option<String> {
        self.user.with_untracked(|u| u.as_ref().map(|u| u.id.clone()))
    }

    /// Replaces the cache with the server's list.
    pub async fn load(&self) {
        let owner = self.session_id();
        self.loading.set(true);
        let result = self.backend.wishlist().await;
        self.apply_load(owner.as_deref(), result);
    }

    /// Stores a finished load, unless the session it was issued for has
    /// ended or changed hands in the meantime. Returns whether it was kept.
    fn apply_load(
        &self,
        owner: Option<&str>,
        result: Result<Vec<WishlistEntry>, ApiError>,
    ) -> bool {
        if self.session_id().as_deref() != owner {
            tracing::debug!("dropping wishlist load for a previous session");
            return false;
        }
        match result {
            Ok(entries) => {
                let list = Wishlist::from_entries(entries);
                tracing::debug!(entries = list.len(), "wishlist loaded");
                self.list.set(list);
                self.error.set(None);
            }
            Err(e) => self.fail("wishlist load", &e),
        }
        self.loading.set(false);
        true
    }

    pub async fn add(&self, product_id: &str) -> bool {
        if !self.signed_in() {
            self.error
                .set(Some("Please log in to add items to your wishlist".to_string()));
            return false;
        }
        match self.backend.add_to_wishlist(product_id).await {
            Ok(_) => {
                self.load().await;
                true
            }
            Err(e) => {
                self.fail("wishlist add", &e);
                false
            }
        }
    }

    pub async fn remove(&self, product_id: &str) -> bool {
        if !self.signed_in() {
            self.error.set(Some(ApiError::NotAuthenticated.to_string()));
            return false;
        }
        match self.backend.remove_from_wishlist(product_id).await {
            Ok(_) => {
                self.load().await;
                true
            }
            Err(e) => {
                self.fail("wishlist remove", &e);
                false
            }
        }
    }

    /// Asks the server directly instead of consulting the cache.
    pub async fn check_remote(&self, product_id: &str) -> Result<bool, ApiError> {
        self.backend.in_wishlist(product_id).await
    }

    pub fn contains(&self, product_id: &str) -> bool {
        self.list.with(|list| list.contains(product_id))
    }

    pub fn count(&self, filter: WishlistFilter) -> usize {
        self.list.with(|list| list.count(filter))
    }

    pub fn clear_error(&self) {
        self.error.set(None);
    }

    /// Drops everything cached for the previous user.
    pub fn reset(&self) {
        self.list.set(Wishlist::default());
        self.error.set(None);
        self.loading.set(false);
    }
}

/// What a change of signed-in user means for the wishlist cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionChange {
    SignedIn,
    SignedOut,
    Unchanged,
}

pub fn session_change(previous: Option<&str>, current: Option<&str>) -> SessionChange {
    match (previous, current) {
        (prev, cur) if prev == cur => SessionChange::Unchanged,
        (_, Some(_)) => SessionChange::SignedIn,
        (_, None) => SessionChange::SignedOut,
    }
}

/// Provides [`WishlistState`] and keeps it in step with the session: a new
/// user triggers a load, signing out clears it.
#[component]
pub fn WishlistProvider(children: Children) -> impl IntoView {
    let auth = expect_context::<AuthState>();
    let wishlist = WishlistState::for_session(&auth);
    provide_context(wishlist.clone());

    Effect::new(move |previous: Option<Option<String>>| {
        let current = auth.user.with(|u| u.as_ref().map(|u| u.id.clone()));
        match session_change(previous.flatten().as_deref(), current.as_deref()) {
            SessionChange::SignedIn => {
                let wishlist = wishlist.clone();
                spawn_local(async move { wishlist.load().await });
            }
            SessionChange::SignedOut => wishlist.reset(),
            SessionChange::Unchanged => {}
        }
        current
    });

    children()
}

/// Heart toggle. Flips immediately and settles on the server's answer.
///
/// With `verify`, the cached membership is checked against the server on
/// mount and the cache reloaded when they disagree.
#[component]
pub fn WishlistToggle(product_id: String, #[prop(optional)] verify: bool) -> impl IntoView {
    let wishlist = expect_context::<WishlistState>();
    let auth = expect_context::<AuthState>();
    let notices = expect_context::<Notices>();
    // Optimistic value while a request is in flight.
    let pending: RwSignal<Option<bool>> = RwSignal::new(None);
    let product_id = StoredValue::new(product_id);

    if verify && auth.user.with_untracked(Option::is_some) {
        let wishlist = wishlist.clone();
        let id = product_id.get_value();
        spawn_local(async move {
            match wishlist.check_remote(&id).await {
                Ok(remote) if remote != wishlist.list.with_untracked(|l| l.contains(&id)) => {
                    tracing::debug!(product = %id, remote, "wishlist cache out of date");
                    wishlist.load().await;
                }
                Ok(_) => {}
                Err(e) => tracing::debug!(product = %id, error = %e, "wishlist check failed"),
            }
        });
    }

    let saved = {
        let wishlist = wishlist.clone();
        move || {
            pending
                .get()
                .unwrap_or_else(|| product_id.with_value(|id| wishlist.contains(id)))
        }
    };

    let toggle = {
        let saved = saved.clone();
        move |_| {
            if !auth.is_authenticated() {
                notices.error("Sign in required", "Please log in to add items to your wishlist");
                return;
            }
            if pending.get_untracked().is_some() {
                return;
            }
            let was_saved = saved();
            pending.set(Some(!was_saved));

            let wishlist = wishlist.clone();
            let id = product_id.get_value();
            spawn_local(async move {
                let ok = if was_saved {
                    wishlist.remove(&id).await
                } else {
                    wishlist.add(&id).await
                };
                pending.set(None);
                if ok {
                    if was_saved {
                        notices.info("Removed from Wishlist", "Item has been removed from your wishlist.");
                    } else {
                        notices.success("Added to Wishlist", "Item has been added to your wishlist.");
                    }
                } else {
                    let reason = wishlist.error.get_untracked().unwrap_or_default();
                    notices.error("Wishlist", reason);
                    wishlist.clear_error();
                }
            });
        }
    };

    let label = {
        let saved = saved.clone();
        move || if saved() { "Remove from wishlist" } else { "Save to wishlist" }
    };

    view! {
        <button
            class="rewear-heart"
            class:active=saved
            aria-label=label
            on:click=toggle
        >
            "\u{2665}"
        </button>
    }
}

#[component]
fn WishlistCard(entry: WishlistEntry) -> impl IntoView {
    let wishlist = expect_context::<WishlistState>();
    let notices = expect_context::<Notices>();
    let product: Product = entry.product.clone();
    let available = entry.is_available();
    let id = StoredValue::new(entry.product_id.clone());

    let remove = move |_| {
        let wishlist = wishlist.clone();
        let id = id.get_value();
        spawn_local(async move {
            if wishlist.remove(&id).await {
                notices.info("Removed from Wishlist", "Item has been removed from your wishlist.");
            }
        });
    };

    view! {
        <div class="rewear-card" class:rewear-card-sold={!available}>
            <a href=format!("/item/{}", product.id)>
                <img src=product.main_image().unwrap_or_default().to_string() alt=product.title.clone() />
            </a>
            <div class="rewear-card-body">
                <h4>{product.title.clone()}</h4>
                <p class="rewear-meta">
                    {format!("Size {} · {}", product.size.clone().unwrap_or_default(), product.condition.clone().unwrap_or_default())}
                </p>
                <strong>{product.price_label()}</strong>
                <span class="rewear-badge">{product.status.label()}</span>
                {entry.added_at.clone().map(|at| view! { <p class="rewear-meta">{format!("Saved {at}")}</p> })}
                <div class="rewear-card-actions">
                    <AddToCart product=product.clone() />
                    <button class="rewear-btn rewear-btn-sm rewear-btn-ghost" on:click=remove>"Remove"</button>
                </div>
            </div>
        </div>
    }
}

#[component]
pub fn WishlistPage() -> impl IntoView {
    let wishlist = expect_context::<WishlistState>();
    let auth = expect_context::<AuthState>();
    let filter = RwSignal::new(WishlistFilter::All);
    let loading = wishlist.loading;

    let tab = {
        let wishlist = wishlist.clone();
        move |f: WishlistFilter| {
            let wishlist = wishlist.clone();
            view! {
                <button
                    class="rewear-tab"
                    class:active=move || filter.get() == f
                    on:click=move |_| filter.set(f)
                >
                    {move || format!("{} ({})", f.label(), wishlist.count(f))}
                </button>
            }
        }
    };

    let entries = {
        let wishlist = wishlist.clone();
        move || wishlist.list.with(|list| list.filtered(filter.get()))
    };

    let error = {
        let wishlist = wishlist.clone();
        move || {
            wishlist.error.get().map(|e| {
                let wishlist = wishlist.clone();
                view! {
                    <div class="rewear-error" on:click=move |_| wishlist.clear_error()>{e}</div>
                }
            })
        }
    };

    view! {
        <section class="rewear-wishlist">
            <h1>"My Wishlist"</h1>
            <Show
                when=move || auth.is_authenticated()
                fallback=|| view! {
                    <div class="rewear-empty">
                        <h3>"Sign in to see your wishlist"</h3>
                        <a class="rewear-btn rewear-btn-primary" href="/login">"Sign In"</a>
                    </div>
                }
            >
                {error.clone()}
                <div class="rewear-tabs">
                    {tab(WishlistFilter::All)}
                    {tab(WishlistFilter::Available)}
                    {tab(WishlistFilter::Sold)}
                </div>
                <Show when=move || loading.get()>
                    <p class="rewear-loading">"Loading..."</p>
                </Show>
                <div class="rewear-grid">
                    <For each=entries.clone() key=|e| e.product_id.clone() let:entry>
                        <WishlistCard entry=entry />
                    </For>
                </div>
            </Show>
        </section>
    }
}
