use std::sync::Arc;

use leptos::prelude::*;
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;
use rewear_shared::search::{sorted, SortBy};
use rewear_shared::{Product, WishlistFilter};
use wasm_bindgen_futures::spawn_local;

use crate::admin::AdminPage;
use crate::api::Backend;
use crate::auth::AccountMenu;
use crate::browse::{BrowsePage, ItemCard};
use crate::cart::{CartPage, CartState};
use crate::item::ItemPage;
use crate::listing::ListItemPage;
use crate::login::LoginPage;
use crate::notify::NoticeTray;
use crate::profile::{DashboardPage, EditProfilePage};
use crate::wishlist::{WishlistPage, WishlistState};

const FEATURED: usize = 4;

#[component]
pub fn App() -> impl IntoView {
    view! {
        <Router>
            <div class="rewear-app">
                <Header />
                <main class="rewear-main">
                    <Routes fallback=|| view! { <NotFound /> }>
                        <Route path=path!("/") view=HomePage />
                        <Route path=path!("/browse") view=BrowsePage />
                        <Route path=path!("/item/:id") view=ItemPage />
                        <Route path=path!("/list-item") view=ListItemPage />
                        <Route path=path!("/cart") view=CartPage />
                        <Route path=path!("/wishlist") view=WishlistPage />
                        <Route path=path!("/dashboard") view=DashboardPage />
                        <Route path=path!("/profile") view=EditProfilePage />
                        <Route path=path!("/login") view=LoginPage />
                        <Route path=path!("/signup") view=LoginPage />
                        <Route path=path!("/admin") view=AdminPage />
                    </Routes>
                </main>
                <NoticeTray />
            </div>
        </Router>
    }
}

#[component]
fn Header() -> impl IntoView {
    let cart = expect_context::<CartState>();
    let wishlist = expect_context::<WishlistState>();

    let cart_count = Memo::new(move |_| cart.total_count());
    let saved_count = Memo::new(move |_| wishlist.count(WishlistFilter::All));

    view! {
        <header class="rewear-header">
            <a href="/" class="rewear-logo">"ReWear"</a>
            <nav class="rewear-nav">
                <a href="/browse">"Browse"</a>
                <a href="/list-item">"List an Item"</a>
                <a href="/wishlist">
                    "Wishlist"
                    <Show when=move || { saved_count.get() > 0 }>
                        <span class="rewear-count">{saved_count}</span>
                    </Show>
                </a>
                <a href="/cart">
                    "Cart"
                    <Show when=move || { cart_count.get() > 0 }>
                        <span class="rewear-count">{cart_count}</span>
                    </Show>
                </a>
            </nav>
            <AccountMenu />
        </header>
    }
}

#[component]
fn HomePage() -> impl IntoView {
    let backend = expect_context::<Arc<dyn Backend>>();
    let featured: RwSignal<Vec<Product>> = RwSignal::new(Vec::new());

    spawn_local(async move {
        match backend.all_products().await {
            Ok(list) => {
                let mut newest = sorted(&list, SortBy::Newest);
                newest.retain(|p| p.status.is_available());
                newest.truncate(FEATURED);
                featured.set(newest);
            }
            Err(e) => tracing::warn!(error = %e, "could not load featured items"),
        }
    });

    view! {
        <section class="rewear-hero">
            <h1>"Give your clothes a second life"</h1>
            <p>"Swap, buy and sell pre-loved fashion with a community that cares about the planet."</p>
            <div class="rewear-hero-actions">
                <a class="rewear-btn rewear-btn-primary" href="/browse">"Start Swapping"</a>
                <a class="rewear-btn" href="/list-item">"List an Item"</a>
            </div>
        </section>
        <Show when=move || featured.with(|f| !f.is_empty())>
            <section class="rewear-featured">
                <h2>"Just Listed"</h2>
                <div class="rewear-grid">
                    <For each=move || featured.get() key=|p| p.id.clone() let:product>
                        <ItemCard product=product />
                    </For>
                </div>
            </section>
        </Show>
    }
}

#[component]
fn NotFound() -> impl IntoView {
    view! {
        <div class="rewear-empty">
            <h1>"404"</h1>
            <p>"Oops! Page not found"</p>
            <a class="rewear-btn" href="/">"Return to Home"</a>
        </div>
    }
}
