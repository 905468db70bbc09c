use std::sync::Arc;

use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use leptos_router::hooks::use_navigate;
use rewear_shared::listing::{CATEGORIES, CONDITIONS, MAX_IMAGES, SIZES, SUGGESTED_TAGS};
use rewear_shared::{messages, DraftError, ListingDraft};
use wasm_bindgen_futures::spawn_local;

use crate::api::Backend;
use crate::auth::AuthState;
use crate::notify::Notices;

/// Applies the free-text number fields to the draft.
fn with_numbers(mut draft: ListingDraft, points: &str, price: &str) -> Result<ListingDraft, DraftError> {
    draft.points = points.trim().parse().map_err(|_| DraftError::InvalidPoints)?;
    draft.price = match price.trim() {
        "" => 0.0,
        raw => raw.parse().map_err(|_| DraftError::InvalidPrice)?,
    };
    Ok(draft)
}

#[component]
fn OptionSelect(
    label: &'static str,
    options: &'static [&'static str],
    value: Signal<String>,
    on_pick: Callback<String>,
) -> impl IntoView {
    view! {
        <label class="rewear-field">
            <span>{label}</span>
            <select
                class="rewear-select"
                prop:value=move || value.get()
                on:change=move |ev| on_pick.run(event_target_value(&ev))
            >
                <option value="">{format!("Select {}", label.to_lowercase())}</option>
                {options.iter().map(|o| view! { <option value=*o>{*o}</option> }).collect_view()}
            </select>
        </label>
    }
}

#[component]
fn ListingForm() -> impl IntoView {
    let backend = expect_context::<Arc<dyn Backend>>();
    let notices = expect_context::<Notices>();
    let navigate = use_navigate();

    let draft = RwSignal::new(ListingDraft::default());
    let points = RwSignal::new(rewear_shared::listing::DEFAULT_POINTS.to_string());
    let price = RwSignal::new(String::new());
    let image_url = RwSignal::new(String::new());
    let problem: RwSignal<Option<String>> = RwSignal::new(None);
    let submitting = RwSignal::new(false);

    let add_image = move |_| {
        let url = image_url.get_untracked().trim().to_string();
        if url.is_empty() {
            return;
        }
        let mut outcome = Ok(());
        draft.update(|d| outcome = d.add_image(url));
        match outcome {
            Ok(()) => image_url.set(String::new()),
            Err(e) => problem.set(Some(e.to_string())),
        }
    };

    let on_submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        let payload = with_numbers(draft.get_untracked(), &points.get_untracked(), &price.get_untracked())
            .and_then(|d| d.to_new_product());
        let payload = match payload {
            Ok(payload) => payload,
            Err(e) => {
                problem.set(Some(e.to_string()));
                return;
            }
        };
        problem.set(None);
        submitting.set(true);

        let backend = Arc::clone(&backend);
        let navigate = navigate.clone();
        spawn_local(async move {
            match backend.create_product(&payload).await {
                Ok(created) if created.message == messages::PRODUCT_ADDED => {
                    tracing::info!(product = %created.product.id, "listing created");
                    notices.success("Item Listed", "Your item is now live on ReWear.");
                    navigate(&format!("/item/{}", created.product.id), Default::default());
                }
                Ok(created) => {
                    tracing::warn!(message = %created.message, "unexpected create reply");
                    problem.set(Some(created.message));
                }
                Err(e) => problem.set(Some(e.to_string())),
            }
            submitting.set(false);
        });
    };

    let text_input = move |label: &'static str, get: fn(&ListingDraft) -> String, set: fn(&mut ListingDraft, String)| {
        view! {
            <label class="rewear-field">
                <span>{label}</span>
                <input
                    class="rewear-input"
                    type="text"
                    prop:value=move || draft.with(get)
                    on:input=move |ev| {
                        let value = event_target_value(&ev);
                        draft.update(|d| set(d, value));
                    }
                />
            </label>
        }
    };

    view! {
        <form class="rewear-form" on:submit=on_submit>
            {text_input("Title", |d| d.title.clone(), |d, v| d.title = v)}
            <label class="rewear-field">
                <span>"Description"</span>
                <textarea
                    class="rewear-textarea"
                    prop:value=move || draft.with(|d| d.description.clone())
                    on:input=move |ev| {
                        let value = event_target_value(&ev);
                        draft.update(|d| d.description = value);
                    }
                />
            </label>
            <OptionSelect
                label="Category"
                options=&CATEGORIES
                value=Signal::derive(move || draft.with(|d| d.category.clone()))
                on_pick=Callback::new(move |v: String| draft.update(|d| d.category = v))
            />
            <OptionSelect
                label="Size"
                options=&SIZES
                value=Signal::derive(move || draft.with(|d| d.size.clone()))
                on_pick=Callback::new(move |v: String| draft.update(|d| d.size = v))
            />
            <OptionSelect
                label="Condition"
                options=&CONDITIONS
                value=Signal::derive(move || draft.with(|d| d.condition.clone()))
                on_pick=Callback::new(move |v: String| draft.update(|d| d.condition = v))
            />
            {text_input("Brand", |d| d.brand.clone(), |d, v| d.brand = v)}
            <div class="rewear-field-row">
                <label class="rewear-field">
                    <span>"Points"</span>
                    <input class="rewear-input" type="number" min="1"
                        prop:value=move || points.get()
                        on:input=move |ev| points.set(event_target_value(&ev)) />
                </label>
                <label class="rewear-field">
                    <span>"Price ($)"</span>
                    <input class="rewear-input" type="number" min="0" step="0.01"
                        prop:value=move || price.get()
                        on:input=move |ev| price.set(event_target_value(&ev)) />
                </label>
            </div>
            {text_input("Tags", |d| d.tags.clone(), |d, v| d.tags = v)}
            <div class="rewear-tags">
                {SUGGESTED_TAGS
                    .into_iter()
                    .map(|tag: &'static str| view! {
                        <button
                            type="button"
                            class="rewear-tag"
                            class:active=move || draft.with(|d| d.parsed_tags().iter().any(|t| t == tag))
                            on:click=move |_| draft.update(|d| d.toggle_tag(tag))
                        >
                            {tag}
                        </button>
                    })
                    .collect_view()}
            </div>
            <fieldset class="rewear-images">
                <legend>{format!("Photos (up to {MAX_IMAGES})")}</legend>
                <div class="rewear-thumbs">
                    <For
                        each=move || draft.with(|d| d.images().iter().cloned().enumerate().collect::<Vec<_>>())
                        key=|(idx, url)| (*idx, url.clone())
                        let:image
                    >
                        <div class="rewear-thumb">
                            <img src=image.1.clone() alt="" />
                            {(image.0 == 0).then(|| view! { <span class="rewear-badge">"Main"</span> })}
                            <button type="button" class="rewear-btn rewear-btn-sm"
                                on:click=move |_| { draft.update(|d| { d.remove_image(image.0); }); }>
                                "\u{00D7}"
                            </button>
                        </div>
                    </For>
                </div>
                <input class="rewear-input" type="url" placeholder="https://..."
                    prop:value=move || image_url.get()
                    on:input=move |ev| image_url.set(event_target_value(&ev)) />
                <button type="button" class="rewear-btn rewear-btn-sm" on:click=add_image
                    disabled=move || draft.with(|d| d.images().len() >= MAX_IMAGES)>
                    "Add Photo"
                </button>
            </fieldset>
            {move || problem.get().map(|p| view! { <p class="rewear-error">{p}</p> })}
            <button class="rewear-btn rewear-btn-primary" type="submit" disabled=move || submitting.get()>
                {move || if submitting.get() { "Listing..." } else { "List Item" }}
            </button>
        </form>
    }
}

#[component]
pub fn ListItemPage() -> impl IntoView {
    let auth = expect_context::<AuthState>();

    view! {
        <section class="rewear-list-item">
            <h1>"List an Item"</h1>
            <p class="rewear-meta">"Give your pre-loved clothes a second life."</p>
            <Show
                when=move || auth.is_authenticated()
                fallback=|| view! {
                    <div class="rewear-empty">
                        <h3>"Sign in to list an item"</h3>
                        <a class="rewear-btn rewear-btn-primary" href="/login">"Sign In"</a>
                    </div>
                }
            >
                <ListingForm />
            </Show>
        </section>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titled() -> ListingDraft {
        let mut draft = ListingDraft::default();
        draft.title = "Vintage Leather Jacket".into();
        draft
    }

    #[test]
    fn number_fields_are_parsed() {
        let draft = with_numbers(titled(), " 150 ", "45.50").unwrap();
        assert_eq!(draft.points, 150);
        assert_eq!(draft.price, 45.5);
    }

    #[test]
    fn blank_price_means_free() {
        assert_eq!(with_numbers(titled(), "100", " ").unwrap().price, 0.0);
    }

    #[test]
    fn garbage_numbers_are_rejected() {
        assert_eq!(with_numbers(titled(), "lots", "1").unwrap_err(), DraftError::InvalidPoints);
        assert_eq!(with_numbers(titled(), "100", "free").unwrap_err(), DraftError::InvalidPrice);
    }

    #[test]
    fn draft_without_title_is_rejected() {
        let draft = with_numbers(ListingDraft::default(), "100", "").unwrap();
        assert_eq!(draft.to_new_product().unwrap_err(), DraftError::Missing("title"));
    }
}
