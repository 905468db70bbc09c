//! Wire schemas and platform-independent state logic for the ReWear client.
//!
//! Everything here compiles and runs without a browser, so the
//! arithmetic behind the cart, the wishlist and catalog search can be
//! tested natively. The `rewear-interactive` crate wraps these types in
//! reactive stores.

mod serde_util;

pub mod cart;
pub mod listing;
pub mod messages;
pub mod product;
pub mod search;
pub mod user;
pub mod wishlist;

pub use cart::{promo_rate, Cart, CartChange, CartItem, OrderSummary, TransactionType};
pub use listing::{DraftError, ListingDraft};
pub use product::{NewProduct, Product, ProductCreated, ProductStatus};
pub use search::{RequestSequence, SearchFilters, SearchPlan, SortBy};
pub use user::{
    ChangePasswordRequest, EcoImpact, GoogleTokenRequest, LoginRequest, MessageResponse,
    PasswordResetRequest, ProfileEnvelope, RegisterRequest, Role, User, UserUpdate,
};
pub use wishlist::{Wishlist, WishlistCheck, WishlistEntry, WishlistFilter, WishlistPayload, WishlistRequest};

/// Body of a non-2xx response from either service.
///
/// FastAPI puts a string in `detail` for handled errors and an array of
/// validation problems for rejected payloads, so the raw value is kept.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Human readable detail, if the server sent one.
    pub fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            serde_json::Value::String(_) | serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}
