use std::sync::Arc;

use leptos::ev::MouseEvent;
use leptos::prelude::*;
use rewear_shared::{promo_rate, Cart, CartChange, CartItem, Product, TransactionType};

use crate::notify::Notices;
use crate::storage::KeyValueStore;

pub const CART_KEY: &str = "rewear-cart";

/// Client-only shopping cart, mirrored to local storage after every change.
#[derive(Clone)]
pub struct CartState {
    pub cart: RwSignal<Cart>,
    storage: Arc<dyn KeyValueStore>,
}

/// Reads the stored cart. Missing, unreadable or corrupt data gives an
/// empty cart.
fn restore(storage: &dyn KeyValueStore) -> Cart {
    let raw = match storage.get(CART_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Cart::new(),
        Err(e) => {
            tracing::warn!(error = %e, "could not read saved cart");
            return Cart::new();
        }
    };
    Cart::from_json(&raw).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "discarding corrupt saved cart");
        Cart::new()
    })
}

impl CartState {
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let cart = restore(storage.as_ref());
        tracing::debug!(lines = cart.items().len(), "cart restored");
        Self {
            cart: RwSignal::new(cart),
            storage,
        }
    }

    fn persist(&self, cart: &Cart) {
        let json = match cart.to_json() {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "could not serialize cart");
                return;
            }
        };
        if let Err(e) = self.storage.set(CART_KEY, &json) {
            tracing::warn!(error = %e, "could not save cart");
        }
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut Cart) -> R) -> R {
        let mut cart = self.cart.get_untracked();
        let result = f(&mut cart);
        self.persist(&cart);
        self.cart.set(cart);
        result
    }

    pub fn add(&self, product: &Product, kind: TransactionType) -> CartChange {
        self.mutate(|cart| cart.add(CartItem::from_product(product, kind)))
    }

    pub fn remove(&self, id: &str) -> bool {
        self.mutate(|cart| cart.remove(id))
    }

    pub fn set_quantity(&self, id: &str, quantity: i64) -> bool {
        self.mutate(|cart| cart.set_quantity(id, quantity))
    }

    /// Empties the cart and drops the saved copy.
    pub fn clear(&self) {
        if let Err(e) = self.storage.remove(CART_KEY) {
            tracing::warn!(error = %e, "could not remove saved cart");
        }
        self.cart.set(Cart::new());
    }

    pub fn total_count(&self) -> u32 {
        self.cart.with(Cart::total_count)
    }
}

fn money(amount: f64) -> String {
    format!("${amount:.2}")
}

/// "Add to cart" button used on cards and the detail page.
#[component]
pub fn AddToCart(product: Product, #[prop(optional)] kind: TransactionType) -> impl IntoView {
    let cart = expect_context::<CartState>();
    let notices = expect_context::<Notices>();
    let available = product.status.is_available();

    let on_click = move |_| match cart.add(&product, kind) {
        CartChange::Added => notices.success("Added to Cart", "Item has been added to your cart."),
        CartChange::Incremented(_) => {
            notices.info("Item Updated", "Item quantity increased in your cart.")
        }
    };

    view! {
        <button class="rewear-btn rewear-btn-primary" disabled={!available} on:click=on_click>
            {match kind {
                TransactionType::Purchase => "Add to Cart",
                TransactionType::Swap => "Request Swap",
            }}
        </button>
    }
}

#[component]
fn CartLine(item: CartItem) -> impl IntoView {
    let cart = expect_context::<CartState>();
    let notices = expect_context::<Notices>();
    let id = StoredValue::new(item.id.clone());
    let quantity = i64::from(item.quantity);

    let dec = {
        let cart = cart.clone();
        move |_| {
            cart.set_quantity(&id.get_value(), quantity - 1);
        }
    };
    let inc = {
        let cart = cart.clone();
        move |_| {
            cart.set_quantity(&id.get_value(), quantity + 1);
        }
    };
    let remove = move |_| {
        if cart.remove(&id.get_value()) {
            notices.info("Item Removed", "Item has been removed from your cart.");
        }
    };

    view! {
        <div class="rewear-cart-line">
            <img src=item.image.clone() alt=item.title.clone() class="rewear-cart-thumb" />
            <div class="rewear-cart-info">
                <a href=format!("/item/{}", item.id)>{item.title.clone()}</a>
                <p class="rewear-meta">
                    {format!("Size {} · {} · {}", item.size, item.condition, item.brand)}
                </p>
                <p class="rewear-meta">{format!("Sold by {}", item.seller)}</p>
                {(item.kind == TransactionType::Swap)
                    .then(|| view! { <span class="rewear-badge">"Swap"</span> })}
            </div>
            <div class="rewear-cart-qty">
                <button class="rewear-btn rewear-btn-sm" on:click=dec>"-"</button>
                <span>{item.quantity}</span>
                <button class="rewear-btn rewear-btn-sm" on:click=inc>"+"</button>
            </div>
            <div class="rewear-cart-price">
                <strong>{money(item.subtotal())}</strong>
                {(item.original_price > item.price)
                    .then(|| view! { <s>{money(item.original_price)}</s> })}
            </div>
            <button class="rewear-btn rewear-btn-sm rewear-btn-ghost" on:click=remove>"Remove"</button>
        </div>
    }
}

#[component]
pub fn CartPage() -> impl IntoView {
    let cart = expect_context::<CartState>();
    let notices = expect_context::<Notices>();
    let promo = RwSignal::new(String::new());
    let discount = RwSignal::new(0.0_f64);

    let summary = {
        let cart = cart.clone();
        Memo::new(move |_| cart.cart.with(|c| c.summary(discount.get())))
    };

    let apply_promo = move |_: MouseEvent| match promo_rate(&promo.get_untracked()) {
        Some(rate) => {
            discount.set(rate);
            notices.success("Promo Code Applied", "10% discount has been applied to your order.");
        }
        None => notices.error("Invalid Promo Code", "The promo code you entered is not valid."),
    };

    let clear = {
        let cart = cart.clone();
        move |_: MouseEvent| {
            cart.clear();
            notices.info("Cart Cleared", "All items have been removed from your cart.");
        }
    };

    let checkout = move |_: MouseEvent| notices.info("Proceeding to Checkout", "Redirecting to secure payment...");

    let lines = {
        let cart = cart.clone();
        move |kind: TransactionType| {
            let cart = cart.clone();
            move || cart.cart.with(|c| c.of_kind(kind).cloned().collect::<Vec<_>>())
        }
    };

    let is_empty = {
        let cart = cart.clone();
        move || cart.cart.with(Cart::is_empty)
    };

    view! {
        <section class="rewear-cart">
            <h1>"Shopping Cart"</h1>
            <p class="rewear-meta">{move || format!("{} items in your cart", cart.total_count())}</p>
            <Show
                when=move || !is_empty()
                fallback=|| view! {
                    <div class="rewear-empty">
                        <h3>"Your cart is empty"</h3>
                        <a class="rewear-btn rewear-btn-primary" href="/browse">"Start Shopping"</a>
                    </div>
                }
            >
                <div class="rewear-cart-lines">
                    <button class="rewear-btn rewear-btn-sm rewear-btn-ghost" on:click=clear.clone()>"Clear Cart"</button>
                    <For each=lines(TransactionType::Purchase) key=|i| (i.id.clone(), i.quantity) let:item>
                        <CartLine item=item />
                    </For>
                    <For each=lines(TransactionType::Swap) key=|i| (i.id.clone(), i.quantity) let:item>
                        <CartLine item=item />
                    </For>
                </div>
                <aside class="rewear-cart-summary">
                    <h3>"Order Summary"</h3>
                    <dl>
                        <dt>"Subtotal"</dt>
                        <dd>{move || money(summary.get().subtotal)}</dd>
                        <Show when=move || { summary.get().discount > 0.0 }>
                            <dt>"Discount"</dt>
                            <dd>{move || format!("-{}", money(summary.get().discount))}</dd>
                        </Show>
                        <dt>"Shipping"</dt>
                        <dd>
                            {move || {
                                let shipping = summary.get().shipping;
                                if shipping == 0.0 { "Free".to_string() } else { money(shipping) }
                            }}
                        </dd>
                        <dt>"Tax"</dt>
                        <dd>{move || money(summary.get().tax)}</dd>
                        <dt>"Total"</dt>
                        <dd><strong>{move || money(summary.get().total)}</strong></dd>
                    </dl>
                    <div class="rewear-promo">
                        <input
                            class="rewear-input"
                            type="text"
                            placeholder="Enter promo code"
                            prop:value=move || promo.get()
                            on:input=move |ev| promo.set(event_target_value(&ev))
                        />
                        <button class="rewear-btn" on:click=apply_promo.clone()>"Apply"</button>
                    </div>
                    <button class="rewear-btn rewear-btn-primary" on:click=checkout.clone()>"Proceed to Checkout"</button>
                    <p class="rewear-meta">"Free shipping on orders over $50"</p>
                </aside>
            </Show>
        </section>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::product;
    use crate::storage::MemoryStorage;

    fn stored(storage: &MemoryStorage) -> Cart {
        Cart::from_json(&storage.get(CART_KEY).unwrap().unwrap()).unwrap()
    }

    #[test]
    fn corrupt_saved_cart_starts_empty() {
        let storage = Arc::new(MemoryStorage::with(CART_KEY, "{not json"));
        let state = CartState::load(storage);
        assert!(state.cart.get_untracked().is_empty());
    }

    #[test]
    fn saved_cart_is_restored() {
        let storage = Arc::new(MemoryStorage::with(
            CART_KEY,
            r#"[{"id":"p1","title":"Vintage Denim Jacket","price":45,"originalPrice":80,"quantity":2,"type":"purchase"}]"#,
        ));
        let state = CartState::load(storage);
        let cart = state.cart.get_untracked();
        assert_eq!(cart.total_count(), 2);
        assert_eq!(cart.savings(), 70.0);
    }

    #[test]
    fn every_change_is_written_through() {
        let storage = Arc::new(MemoryStorage::default());
        let state = CartState::load(storage.clone());
        let jacket = product("p1", "Vintage Denim Jacket", 45.0);

        assert_eq!(state.add(&jacket, TransactionType::Purchase), CartChange::Added);
        assert_eq!(
            state.add(&jacket, TransactionType::Purchase),
            CartChange::Incremented(2)
        );
        assert_eq!(stored(&storage).total_count(), 2);

        assert!(state.set_quantity("p1", 0));
        assert!(stored(&storage).is_empty());
        assert_eq!(state.cart.get_untracked().total_price(), 0.0);
    }

    #[test]
    fn clear_drops_the_saved_cart() {
        let storage = Arc::new(MemoryStorage::default());
        let state = CartState::load(storage.clone());
        state.add(&product("p1", "Silk Scarf", 20.0), TransactionType::Swap);
        state.clear();
        assert_eq!(storage.get(CART_KEY).unwrap(), None);
        assert!(state.cart.get_untracked().is_empty());
    }
}
