mod admin;
mod api;
mod app;
mod auth;
mod browse;
mod cart;
mod config;
mod error;
mod item;
mod listing;
mod logging;
mod login;
mod notify;
mod profile;
mod storage;
mod wishlist;

use std::sync::Arc;

use leptos::prelude::*;
use wasm_bindgen::JsCast;

use crate::api::{ApiClient, Backend};
use crate::config::AppConfig;

/// Element the app renders into; the page body is used when it is missing.
const MOUNT_ID: &str = "rewear-app";

fn main() {
    console_error_panic_hook::set_once();

    let (config, problems) = AppConfig::from_document();
    logging::init(&config.log);
    for problem in &problems {
        tracing::warn!(error = %problem, "ignoring invalid setting");
    }
    tracing::info!(
        auth_api = %config.auth_api,
        product_api = %config.product_api,
        "starting ReWear"
    );

    let backend: Arc<dyn Backend> = Arc::new(ApiClient::new(&config));
    let storage = storage::local_storage();

    let document = web_sys::window()
        .expect("no window")
        .document()
        .expect("no document");

    let root = move || {
        provide_context(Arc::clone(&backend));
        provide_context(config.clone());
        provide_context(notify::Notices::new());
        provide_context(cart::CartState::load(Arc::clone(&storage)));
        view! {
            <auth::AuthProvider>
                <wishlist::WishlistProvider>
                    <app::App />
                </wishlist::WishlistProvider>
            </auth::AuthProvider>
        }
    };

    match document.get_element_by_id(MOUNT_ID) {
        Some(el) => {
            let html_el: web_sys::HtmlElement = el.unchecked_into();
            leptos::mount::mount_to(html_el, root).forget();
        }
        None => {
            tracing::debug!("no #{MOUNT_ID} element, mounting to body");
            leptos::mount::mount_to_body(root);
        }
    }
}
