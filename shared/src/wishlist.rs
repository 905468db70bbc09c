use serde::{Deserialize, Serialize};

use crate::product::Product;

// ── Wishlist ──

/// A saved product. The server owns the list; availability follows the
/// embedded product snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "EntryRecord")]
pub struct WishlistEntry {
    pub product_id: String,
    pub product: Product,
    pub added_at: Option<String>,
}

impl WishlistEntry {
    pub fn is_available(&self) -> bool {
        self.product.status.is_available()
    }
}

/// Entries either embed the product or are the product itself.
#[derive(Deserialize)]
#[serde(untagged)]
enum EntryRecord {
    Embedded {
        #[serde(default)]
        product_id: Option<String>,
        product: Product,
        #[serde(default, alias = "addedDate", alias = "created_at")]
        added_at: Option<String>,
    },
    Bare(Product),
}

impl From<EntryRecord> for WishlistEntry {
    fn from(record: EntryRecord) -> Self {
        match record {
            EntryRecord::Embedded {
                product_id,
                product,
                added_at,
            } => Self {
                product_id: product_id
                    .filter(|id| !id.is_empty())
                    .unwrap_or_else(|| product.id.clone()),
                product,
                added_at,
            },
            EntryRecord::Bare(product) => Self {
                product_id: product.id.clone(),
                product,
                added_at: None,
            },
        }
    }
}

/// `GET /wishlist` body: a bare array or `{"wishlist": [...]}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WishlistPayload {
    Wrapped { wishlist: Vec<WishlistEntry> },
    Bare(Vec<WishlistEntry>),
}

impl WishlistPayload {
    pub fn into_entries(self) -> Vec<WishlistEntry> {
        match self {
            Self::Wrapped { wishlist } | Self::Bare(wishlist) => wishlist,
        }
    }
}

/// Body of `POST /wishlist/add` and `POST /wishlist/remove`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WishlistRequest {
    pub product_id: String,
}

/// `GET /wishlist/check/{id}` reply.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WishlistCheck {
    #[serde(alias = "is_in_wishlist", alias = "exists")]
    pub in_wishlist: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WishlistFilter {
    #[default]
    All,
    Available,
    Sold,
}

impl WishlistFilter {
    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Available => "Available",
            Self::Sold => "Sold",
        }
    }

    fn accepts(self, entry: &WishlistEntry) -> bool {
        match self {
            Self::All => true,
            Self::Available => entry.is_available(),
            Self::Sold => !entry.is_available(),
        }
    }
}

/// Client cache of the server wishlist. At most one entry per product.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Wishlist {
    entries: Vec<WishlistEntry>,
}

impl Wishlist {
    /// Builds the cache from a server response, keeping the first entry
    /// for each product if the server returned duplicates.
    pub fn from_entries(entries: Vec<WishlistEntry>) -> Self {
        let mut unique: Vec<WishlistEntry> = Vec::with_capacity(entries.len());
        for entry in entries {
            if !unique.iter().any(|e| e.product_id == entry.product_id) {
                unique.push(entry);
            }
        }
        Self { entries: unique }
    }

    pub fn entries(&self) -> &[WishlistEntry] {
        &self.entries
    }

    pub fn contains(&self, product_id: &str) -> bool {
        self.entries.iter().any(|e| e.product_id == product_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, filter: WishlistFilter) -> usize {
        self.entries.iter().filter(|e| filter.accepts(e)).count()
    }

    pub fn filtered(&self, filter: WishlistFilter) -> Vec<WishlistEntry> {
        self.entries
            .iter()
            .filter(|e| filter.accepts(e))
            .cloned()
            .collect()
    }
}
