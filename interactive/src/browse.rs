use std::sync::Arc;

use leptos::prelude::*;
use rewear_shared::listing::{CATEGORIES, CONDITIONS, SIZES};
use rewear_shared::search::sorted;
use rewear_shared::{Product, RequestSequence, SearchFilters, SortBy};
use wasm_bindgen_futures::spawn_local;

use crate::api::Backend;
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::wishlist::WishlistToggle;

/// Results of the most recent catalog query.
///
/// Requests are never aborted; each one takes a ticket from a
/// [`RequestSequence`] and its response is only applied if no newer request
/// has been dispatched in the meantime.
#[derive(Clone)]
pub struct CatalogSearch {
    pub results: RwSignal<Vec<Product>>,
    pub loading: RwSignal<bool>,
    pub error: RwSignal<Option<String>>,
    sequence: StoredValue<RequestSequence>,
    backend: Arc<dyn Backend>,
}

impl CatalogSearch {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            results: RwSignal::new(Vec::new()),
            loading: RwSignal::new(false),
            error: RwSignal::new(None),
            sequence: StoredValue::new(RequestSequence::default()),
            backend,
        }
    }

    fn dispatch(&self) -> u64 {
        let mut ticket = 0;
        self.sequence.update_value(|seq| ticket = seq.begin());
        self.loading.set(true);
        ticket
    }

    /// Returns false when the response was stale and dropped.
    fn apply(&self, ticket: u64, result: Result<Vec<Product>, ApiError>) -> bool {
        if !self.sequence.with_value(|seq| seq.is_latest(ticket)) {
            tracing::debug!(ticket, "dropping stale search response");
            return false;
        }
        match result {
            Ok(products) => {
                self.results.set(products);
                self.error.set(None);
            }
            Err(e) => {
                tracing::warn!(error = %e, "catalog search failed");
                self.error.set(Some(e.to_string()));
            }
        }
        self.loading.set(false);
        true
    }

    pub async fn run(&self, filters: &SearchFilters) {
        let plan = filters.plan();
        let ticket = self.dispatch();
        tracing::debug!(ticket, path = %plan.path(), "catalog search");
        let result = self.backend.search(&plan).await;
        self.apply(ticket, result);
    }
}

/// Empty input means "no bound"; anything unparsable is ignored as well.
fn parse_price(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok()
}

fn choice(raw: String) -> Option<String> {
    Some(raw).filter(|v| !v.trim().is_empty())
}

#[component]
pub fn ItemCard(product: Product) -> impl IntoView {
    let href = format!("/item/{}", product.id);
    let image = product.main_image().map(str::to_string);
    let meta = [product.category.clone(), product.size.clone().map(|s| format!("Size {s}")), product.condition.clone()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" · ");

    view! {
        <article class="rewear-card" class:rewear-card-sold={!product.status.is_available()}>
            <a href=href.clone() class="rewear-card-image">
                {match image {
                    Some(src) => view! { <img src=src alt=product.title.clone() loading="lazy" /> }.into_any(),
                    None => view! { <span class="rewear-no-image">"No Image"</span> }.into_any(),
                }}
            </a>
            <WishlistToggle product_id=product.id.clone() />
            {product.points.map(|pts| view! { <span class="rewear-points">{format!("{pts} pts")}</span> })}
            <div class="rewear-card-body">
                <a href=href><h4>{product.title.clone()}</h4></a>
                <p class="rewear-meta">{meta}</p>
                <div class="rewear-card-footer">
                    <strong>{product.price_label()}</strong>
                    <span class="rewear-meta">{product.seller().to_string()}</span>
                </div>
            </div>
        </article>
    }
}

#[component]
fn FacetSelect(label: &'static str, options: &'static [&'static str], value: RwSignal<String>) -> impl IntoView {
    view! {
        <select
            class="rewear-select"
            aria-label=label
            prop:value=move || value.get()
            on:change=move |ev| value.set(event_target_value(&ev))
        >
            <option value="">{format!("All {label}")}</option>
            {options
                .iter()
                .map(|opt| view! { <option value=*opt>{*opt}</option> })
                .collect_view()}
        </select>
    }
}

#[component]
pub fn BrowsePage() -> impl IntoView {
    let backend = expect_context::<Arc<dyn Backend>>();
    let config = expect_context::<AppConfig>();
    let search = CatalogSearch::new(backend);

    let query = RwSignal::new(String::new());
    let category = RwSignal::new(String::new());
    let size = RwSignal::new(String::new());
    let condition = RwSignal::new(String::new());
    let brand = RwSignal::new(String::new());
    let color = RwSignal::new(String::new());
    let min_price = RwSignal::new(String::new());
    let max_price = RwSignal::new(String::new());
    let sort = RwSignal::new(SortBy::Newest);
    let list_view = RwSignal::new(false);
    let show_filters = RwSignal::new(false);

    let filters = Memo::new(move |_| SearchFilters {
        query: query.get(),
        category: choice(category.get()),
        size: choice(size.get()),
        condition: choice(condition.get()),
        brand: choice(brand.get()),
        color: choice(color.get()),
        min_price: parse_price(&min_price.get()),
        max_price: parse_price(&max_price.get()),
    });

    // Debounced dispatch. The first run fires immediately so the page is not
    // empty on arrival.
    let timer: StoredValue<Option<TimeoutHandle>> = StoredValue::new(None);
    {
        let search = search.clone();
        let delay = config.search_debounce;
        Effect::new(move |prev: Option<()>| {
            let filters = filters.get();
            if let Some(handle) = timer.get_value() {
                handle.clear();
            }
            let search = search.clone();
            if prev.is_none() {
                spawn_local(async move { search.run(&filters).await });
                return;
            }
            let handle = set_timeout_with_handle(
                move || spawn_local(async move { search.run(&filters).await }),
                delay,
            );
            match handle {
                Ok(handle) => timer.set_value(Some(handle)),
                Err(e) => tracing::error!(error = ?e, "could not schedule search"),
            }
        });
    }

    let results = search.results;
    let shown = Memo::new(move |_| results.with(|products| sorted(products, sort.get())));
    let loading = search.loading;
    let error = search.error;

    let clear_filters = move |_| {
        for signal in [query, category, size, condition, brand, color, min_price, max_price] {
            signal.set(String::new());
        }
    };

    view! {
        <section class="rewear-browse">
            <h1>"Browse Items"</h1>
            <div class="rewear-search-bar">
                <input
                    class="rewear-input"
                    type="search"
                    placeholder="Search for items, brands, or styles..."
                    prop:value=move || query.get()
                    on:input=move |ev| query.set(event_target_value(&ev))
                />
                <button class="rewear-btn" on:click=move |_| show_filters.update(|v| *v = !*v)>
                    {move || if show_filters.get() { "Hide Filters" } else { "More Filters" }}
                </button>
            </div>
            <div class="rewear-filters">
                <FacetSelect label="Categories" options=&CATEGORIES value=category />
                <FacetSelect label="Sizes" options=&SIZES value=size />
                <FacetSelect label="Conditions" options=&CONDITIONS value=condition />
                <select
                    class="rewear-select"
                    aria-label="Sort by"
                    on:change=move |ev| {
                        if let Some(key) = SortBy::from_key(&event_target_value(&ev)) {
                            sort.set(key);
                        }
                    }
                >
                    {SortBy::ALL
                        .iter()
                        .map(|s| view! { <option value=s.key() selected={*s == SortBy::Newest}>{s.label()}</option> })
                        .collect_view()}
                </select>
                <button class="rewear-btn rewear-btn-sm" on:click=move |_| list_view.update(|v| *v = !*v)>
                    {move || if list_view.get() { "Grid" } else { "List" }}
                </button>
            </div>
            <Show when=move || show_filters.get()>
                <div class="rewear-filters rewear-filters-extra">
                    <input
                        class="rewear-input"
                        placeholder="Brand"
                        prop:value=move || brand.get()
                        on:input=move |ev| brand.set(event_target_value(&ev))
                    />
                    <input
                        class="rewear-input"
                        placeholder="Color"
                        prop:value=move || color.get()
                        on:input=move |ev| color.set(event_target_value(&ev))
                    />
                    <input
                        class="rewear-input"
                        type="number"
                        min="0"
                        placeholder="Min price"
                        prop:value=move || min_price.get()
                        on:input=move |ev| min_price.set(event_target_value(&ev))
                    />
                    <input
                        class="rewear-input"
                        type="number"
                        min="0"
                        placeholder="Max price"
                        prop:value=move || max_price.get()
                        on:input=move |ev| max_price.set(event_target_value(&ev))
                    />
                    <button class="rewear-btn rewear-btn-sm rewear-btn-ghost" on:click=clear_filters>
                        "Clear Filters"
                    </button>
                </div>
            </Show>
            {move || error.get().map(|e| view! { <p class="rewear-error">{e}</p> })}
            <p class="rewear-meta">
                {move || format!("{} items found", shown.with(Vec::len))}
                <Show when=move || loading.get()>
                    <span class="rewear-loading">" · Searching..."</span>
                </Show>
            </p>
            <div class="rewear-grid" class:rewear-list=move || list_view.get()>
                <For each=move || shown.get() key=|p| p.id.clone() let:product>
                    <ItemCard product=product />
                </For>
            </div>
            <Show when=move || !loading.get() && shown.with(Vec::is_empty)>
                <div class="rewear-empty">
                    <h3>"No items found"</h3>
                    <p>"Try adjusting your search or filters."</p>
                </div>
            </Show>
        </section>
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::api::fake::{product, FakeBackend};

    fn catalog() -> (CatalogSearch, Arc<FakeBackend>) {
        let backend = Arc::new(FakeBackend::new().with_products(vec![
            product("p1", "Vintage Denim Jacket", 45.0),
            product("p2", "Designer Silk Scarf", 35.0),
        ]));
        (CatalogSearch::new(backend.clone()), backend)
    }

    #[test]
    fn stale_response_is_discarded() {
        let (search, _) = catalog();
        let older = search.dispatch();
        let newer = search.dispatch();

        let fresh = vec![product("p2", "Designer Silk Scarf", 35.0)];
        assert!(search.apply(newer, Ok(fresh.clone())));
        assert!(!search.apply(older, Ok(vec![product("p1", "Vintage Denim Jacket", 45.0)])));

        assert_eq!(search.results.get_untracked(), fresh);
        assert!(!search.loading.get_untracked());
    }

    #[test]
    fn stale_error_does_not_clobber_results() {
        let (search, _) = catalog();
        let older = search.dispatch();
        let newer = search.dispatch();
        assert!(search.apply(newer, Ok(Vec::new())));
        assert!(!search.apply(older, Err(ApiError::Network("offline".into()))));
        assert_eq!(search.error.get_untracked(), None);
    }

    #[test]
    fn empty_filters_hit_the_unfiltered_listing() {
        let (search, backend) = catalog();
        block_on(search.run(&SearchFilters::default()));
        assert_eq!(backend.calls(), ["search /product/all"]);
        assert_eq!(search.results.get_untracked().len(), 2);
    }

    #[test]
    fn facet_only_routes_to_advanced_search() {
        let (search, backend) = catalog();
        let filters = SearchFilters {
            brand: choice("Patagonia".to_string()),
            category: choice("  ".to_string()),
            ..SearchFilters::default()
        };
        block_on(search.run(&filters));
        assert_eq!(
            backend.calls(),
            ["search /product/advanced-search?brand=Patagonia"]
        );
    }

    #[test]
    fn failed_search_keeps_previous_results() {
        let (search, backend) = catalog();
        block_on(search.run(&SearchFilters::default()));
        backend.update(|s| s.offline = true);
        block_on(search.run(&SearchFilters::default()));
        assert_eq!(search.results.get_untracked().len(), 2);
        assert!(search.error.get_untracked().is_some());
    }

    #[test]
    fn price_inputs_parse_leniently() {
        assert_eq!(parse_price(" 25.5 "), Some(25.5));
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("cheap"), None);
    }
}
