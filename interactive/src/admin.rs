use std::sync::Arc;

use leptos::prelude::*;
use rewear_shared::{Product, ProductStatus};
use wasm_bindgen_futures::spawn_local;

use crate::api::Backend;
use crate::auth::AuthState;
use crate::item::delete_listing;
use crate::notify::Notices;

fn status_class(status: ProductStatus) -> &'static str {
    match status {
        ProductStatus::Available => "rewear-badge rewear-badge-ok",
        ProductStatus::Pending => "rewear-badge rewear-badge-warn",
        ProductStatus::Sold | ProductStatus::Unknown => "rewear-badge rewear-badge-muted",
    }
}

#[component]
pub fn AdminPage() -> impl IntoView {
    let auth = expect_context::<AuthState>();

    view! {
        <section class="rewear-admin">
            <h1>"Admin Panel"</h1>
            <Show
                when=move || auth.is_admin()
                fallback=|| view! {
                    <div class="rewear-empty">
                        <h3>"Access denied"</h3>
                        <p>"You need administrator rights to view this page."</p>
                    </div>
                }
            >
                <ListingTable />
            </Show>
        </section>
    }
}

#[component]
fn ListingTable() -> impl IntoView {
    let backend = expect_context::<Arc<dyn Backend>>();
    let notices = expect_context::<Notices>();
    let products: RwSignal<Vec<Product>> = RwSignal::new(Vec::new());
    let loading = RwSignal::new(true);

    {
        let backend = Arc::clone(&backend);
        spawn_local(async move {
            match backend.all_products().await {
                Ok(list) => products.set(list),
                Err(e) => {
                    tracing::warn!(error = %e, "could not load listings for review");
                    notices.error("Error", e);
                }
            }
            loading.set(false);
        });
    }

    let remove = move |id: String| {
        let backend = Arc::clone(&backend);
        spawn_local(async move {
            match delete_listing(backend.as_ref(), &id).await {
                Ok(true) => {
                    tracing::info!(product = %id, "listing removed by admin");
                    products.update(|list| list.retain(|p| p.id != id));
                    notices.success("Listing Deleted", "The listing has been removed.");
                }
                Ok(false) => notices.error("Delete failed", "The listing could not be deleted."),
                Err(e) => notices.error("Delete failed", e),
            }
        });
    };

    view! {
        <p class="rewear-meta">{move || format!("{} listings", products.with(Vec::len))}</p>
        <Show when=move || loading.get()>
            <p class="rewear-loading">"Loading..."</p>
        </Show>
        <table class="rewear-table">
            <thead>
                <tr>
                    <th>"Item"</th>
                    <th>"Owner"</th>
                    <th>"Price"</th>
                    <th>"Status"</th>
                    <th></th>
                </tr>
            </thead>
            <tbody>
                <For each=move || products.get() key=|p| p.id.clone() let:product>
                    {
                        let remove = remove.clone();
                        let id = product.id.clone();
                        view! {
                            <tr>
                                <td><a href=format!("/item/{}", product.id)>{product.title.clone()}</a></td>
                                <td>{product.seller().to_string()}</td>
                                <td>{product.price_label()}</td>
                                <td><span class=status_class(product.status)>{product.status.label()}</span></td>
                                <td>
                                    <button class="rewear-btn rewear-btn-sm rewear-btn-danger"
                                        on:click=move |_| remove(id.clone())>
                                        "Delete"
                                    </button>
                                </td>
                            </tr>
                        }
                    }
                </For>
            </tbody>
        </table>
    }
}
