use std::sync::Arc;

use leptos::prelude::*;
use leptos_router::hooks::{use_navigate, use_params_map};
use rewear_shared::{messages, NewProduct, Product, ProductStatus, TransactionType, User};
use wasm_bindgen_futures::spawn_local;

use crate::api::Backend;
use crate::auth::AuthState;
use crate::cart::AddToCart;
use crate::error::ApiError;
use crate::notify::Notices;
use crate::wishlist::WishlistToggle;

// ── Item detail ──

/// Tracks whether whoever is signed in owns `product`, so owner controls
/// follow sign-in and sign-out.
fn owner_check(
    user: RwSignal<Option<User>>,
    product: &Product,
) -> impl Fn() -> bool + Clone + Send + Sync + 'static {
    let product = product.clone();
    move || user.with(|u| u.as_ref().is_some_and(|u| product.is_owned_by(&u.id, &u.email)))
}

/// `Ok(false)` when the service answered without its delete confirmation.
pub(crate) async fn delete_listing(backend: &dyn Backend, id: &str) -> Result<bool, ApiError> {
    let reply = backend.delete_product(id).await?;
    if !reply.is(messages::PRODUCT_DELETED) {
        tracing::warn!(product = %id, message = %reply.message, "unexpected delete reply");
        return Ok(false);
    }
    Ok(true)
}

#[component]
pub fn ItemPage() -> impl IntoView {
    let backend = expect_context::<Arc<dyn Backend>>();
    let params = use_params_map();
    let product: RwSignal<Option<Product>> = RwSignal::new(None);
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let loading = RwSignal::new(true);

    let item_id = Memo::new(move |_| params.get().get("id").unwrap_or_default());

    Effect::new(move |_| {
        let id = item_id.get();
        let backend = Arc::clone(&backend);
        loading.set(true);
        spawn_local(async move {
            match backend.product(&id).await {
                Ok(p) => {
                    product.set(Some(p));
                    error.set(None);
                }
                Err(e) => {
                    tracing::warn!(item = %id, error = %e, "could not load item");
                    product.set(None);
                    let message = match e.status() {
                        Some(404) => "Item not found".to_string(),
                        _ => e.to_string(),
                    };
                    error.set(Some(message));
                }
            }
            loading.set(false);
        });
    });

    view! {
        <section class="rewear-item">
            <a class="rewear-back" href="/browse">"\u{2190} Back to Browse"</a>
            <Show when=move || loading.get()>
                <p class="rewear-loading">"Loading..."</p>
            </Show>
            {move || error.get().map(|e| view! { <p class="rewear-error">{e}</p> })}
            {move || product.get().map(|p| view! { <ItemDetail product=p listing=product /> })}
        </section>
    }
}

#[component]
fn ItemDetail(product: Product, listing: RwSignal<Option<Product>>) -> impl IntoView {
    let auth = expect_context::<AuthState>();
    let selected = RwSignal::new(0usize);
    let images = product.images.clone();
    let image_count = images.len();

    let owned = owner_check(auth.user, &product);
    let for_actions = product.clone();

    let main_image = {
        let images = images.clone();
        move || images.get(selected.get()).cloned()
    };

    view! {
        <div class="rewear-item-layout">
            <div class="rewear-gallery">
                {move || match main_image() {
                    Some(src) => view! { <img class="rewear-gallery-main" src=src alt="" /> }.into_any(),
                    None => view! { <div class="rewear-no-image">"No Image"</div> }.into_any(),
                }}
                <Show when=move || { image_count > 1 }>
                    <div class="rewear-thumbs">
                        {images
                            .iter()
                            .enumerate()
                            .map(|(idx, src)| view! {
                                <button
                                    class="rewear-thumb"
                                    class:active=move || selected.get() == idx
                                    on:click=move |_| selected.set(idx)
                                >
                                    <img src=src.clone() alt="" />
                                </button>
                            })
                            .collect_view()}
                    </div>
                </Show>
            </div>
            <div class="rewear-item-info">
                <div class="rewear-item-head">
                    <h1>{product.title.clone()}</h1>
                    <WishlistToggle product_id=product.id.clone() verify=true />
                </div>
                <p class="rewear-price">
                    <strong>{product.price_label()}</strong>
                    {product.points.map(|pts| view! { <span class="rewear-points">{format!(" or {pts} pts")}</span> })}
                </p>
                <span class="rewear-badge">{product.status.label()}</span>
                <dl class="rewear-facts">
                    {[
                        ("Category", product.category.clone()),
                        ("Size", product.size.clone()),
                        ("Condition", product.condition.clone()),
                        ("Brand", product.brand.clone()),
                        ("Color", product.color.clone()),
                    ]
                        .into_iter()
                        .filter_map(|(k, v)| v.map(|v| view! { <dt>{k}</dt><dd>{v}</dd> }))
                        .collect_view()}
                </dl>
                {product.description.clone().map(|d| view! { <p class="rewear-description">{d}</p> })}
                <p class="rewear-meta">
                    {format!("Listed by {} · {} likes · {} views", product.seller(), product.likes, product.views)}
                </p>
                {move || if owned() {
                    view! { <OwnerActions product=for_actions.clone() listing=listing /> }.into_any()
                } else {
                    view! {
                        <div class="rewear-item-actions">
                            <AddToCart product=for_actions.clone() />
                            <AddToCart product=for_actions.clone() kind=TransactionType::Swap />
                        </div>
                    }
                    .into_any()
                }}
            </div>
        </div>
    }
}

/// Mark-as-sold and delete, shown to the listing's owner.
#[component]
fn OwnerActions(product: Product, listing: RwSignal<Option<Product>>) -> impl IntoView {
    let backend = expect_context::<Arc<dyn Backend>>();
    let notices = expect_context::<Notices>();
    let navigate = use_navigate();
    let busy = RwSignal::new(false);
    let product = StoredValue::new(product);

    let mark_sold = {
        let backend = Arc::clone(&backend);
        move |_| {
            let backend = Arc::clone(&backend);
            let current = product.get_value();
            let payload = NewProduct {
                status: ProductStatus::Sold,
                ..NewProduct::from(&current)
            };
            busy.set(true);
            spawn_local(async move {
                match backend.update_product(&current.id, &payload).await {
                    Ok(_) => {
                        listing.set(Some(Product {
                            status: ProductStatus::Sold,
                            ..current
                        }));
                        notices.success("Listing Updated", "Item marked as sold.");
                    }
                    Err(e) => notices.error("Update failed", e),
                }
                busy.set(false);
            });
        }
    };

    let delete = move |_| {
        let backend = Arc::clone(&backend);
        let navigate = navigate.clone();
        let id = product.with_value(|p| p.id.clone());
        busy.set(true);
        spawn_local(async move {
            match delete_listing(backend.as_ref(), &id).await {
                Ok(true) => {
                    notices.success("Listing Deleted", "Your listing has been removed.");
                    navigate("/dashboard", Default::default());
                }
                Ok(false) => {
                    notices.error("Delete failed", "The listing could not be deleted.");
                    busy.set(false);
                }
                Err(e) => {
                    notices.error("Delete failed", e);
                    busy.set(false);
                }
            }
        });
    };

    let sold = product.with_value(|p| p.status == ProductStatus::Sold);

    view! {
        <div class="rewear-item-actions">
            <button class="rewear-btn" disabled=move || busy.get() || sold on:click=mark_sold>
                "Mark as Sold"
            </button>
            <button class="rewear-btn rewear-btn-danger" disabled=move || busy.get() on:click=delete>
                "Delete Listing"
            </button>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::api::fake::{product, user, FakeBackend};

    #[test]
    fn ownership_follows_the_signed_in_user() {
        let current: RwSignal<Option<User>> = RwSignal::new(None);
        let listing = product("p1", "Denim Jacket", 45.0);
        let owned = owner_check(current, &listing);
        assert!(!owned());

        current.set(Some(user("u-emma", "emma@rewear.dev")));
        assert!(owned());

        current.set(Some(user("u2", "sarah@rewear.dev")));
        assert!(!owned());

        current.set(None);
        assert!(!owned());
    }

    #[test]
    fn ownership_matches_the_owner_email() {
        let current: RwSignal<Option<User>> = RwSignal::new(None);
        let mut listing = product("p1", "Denim Jacket", 45.0);
        listing.owner_id = Some("emma@rewear.dev".into());
        let owned = owner_check(current, &listing);

        current.set(Some(user("u-emma", "emma@rewear.dev")));
        assert!(owned());
    }

    #[test]
    fn delete_listing_checks_the_confirmation() {
        let backend = FakeBackend::new().with_products(vec![
            product("p1", "Denim Jacket", 45.0),
            product("p2", "Wool Scarf", 12.0),
        ]);
        assert!(block_on(delete_listing(&backend, "p1")).unwrap());

        backend.update(|s| s.reply = Some("Product not found".into()));
        assert!(!block_on(delete_listing(&backend, "p2")).unwrap());
        assert_eq!(backend.calls(), ["delete_product", "delete_product"]);
    }
}
