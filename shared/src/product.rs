use serde::{Deserialize, Serialize};

use crate::serde_util::null_default;

// ── Products ──

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    #[default]
    Available,
    Pending,
    Sold,
    #[serde(other)]
    Unknown,
}

impl ProductStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::Pending => "Pending",
            Self::Sold => "Sold",
            Self::Unknown => "Unknown",
        }
    }

    /// Anything not sold can still be wished for or swapped.
    pub fn is_available(self) -> bool {
        self != Self::Sold
    }
}

/// A catalog listing. Read-only on the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ProductRecord")]
pub struct Product {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub points: Option<i64>,
    pub category: Option<String>,
    pub size: Option<String>,
    pub condition: Option<String>,
    pub brand: Option<String>,
    pub color: Option<String>,
    pub images: Vec<String>,
    pub owner: Option<String>,
    pub owner_id: Option<String>,
    pub likes: u32,
    pub views: u32,
    pub status: ProductStatus,
    pub created_at: Option<String>,
}

impl Product {
    pub fn main_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    pub fn price_label(&self) -> String {
        format!("${:.2}", self.price)
    }

    /// Seller shown on cards: the owner name, else the owner id.
    pub fn seller(&self) -> &str {
        self.owner
            .as_deref()
            .or(self.owner_id.as_deref())
            .unwrap_or("ReWear member")
    }

    pub fn is_owned_by(&self, user_id: &str, email: &str) -> bool {
        matches!(self.owner_id.as_deref(), Some(owner) if owner == user_id || owner == email)
    }
}

/// Documents written by `POST /product` carry both `id` and `_id`; older ones
/// only `_id`. Both keys are read and folded into [`Product::id`].
#[derive(Deserialize)]
struct ProductRecord {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "_id", default)]
    object_id: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    price: f64,
    #[serde(default)]
    points: Option<i64>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    condition: Option<String>,
    #[serde(default)]
    brand: Option<String>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    images: Vec<String>,
    #[serde(default)]
    owner: Option<String>,
    #[serde(default)]
    owner_id: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    likes: u32,
    #[serde(default, deserialize_with = "null_default")]
    views: u32,
    #[serde(default, deserialize_with = "null_default")]
    status: ProductStatus,
    #[serde(default)]
    created_at: Option<String>,
}

impl From<ProductRecord> for Product {
    fn from(r: ProductRecord) -> Self {
        Self {
            id: r.id.or(r.object_id).unwrap_or_default(),
            title: r.title,
            description: r.description,
            price: r.price,
            points: r.points,
            category: r.category,
            size: r.size,
            condition: r.condition,
            brand: r.brand,
            color: r.color,
            images: r.images,
            owner: r.owner,
            owner_id: r.owner_id,
            likes: r.likes,
            views: r.views,
            status: r.status,
            created_at: r.created_at,
        }
    }
}

/// Payload for `POST /product` and `PUT /product/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub category: Option<String>,
    pub size: Option<String>,
    pub condition: Option<String>,
    pub points: Option<i64>,
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<String>,
    pub status: ProductStatus,
}

impl From<&Product> for NewProduct {
    fn from(p: &Product) -> Self {
        Self {
            title: p.title.clone(),
            description: p.description.clone(),
            price: p.price,
            category: p.category.clone(),
            size: p.size.clone(),
            condition: p.condition.clone(),
            points: p.points,
            images: p.images.clone(),
            brand: p.brand.clone(),
            tags: Vec::new(),
            status: p.status,
        }
    }
}

/// `POST /product` reply.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductCreated {
    pub message: String,
    pub product: Product,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_with_both_ids_parses() {
        let json = r#"{"id":"a1","_id":"a1","title":"vintage denim jacket","price":45.0,
            "images":null,"status":"pending","likes":12}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, "a1");
        assert!(product.images.is_empty());
        assert_eq!(product.status, ProductStatus::Pending);
        assert_eq!(product.likes, 12);
    }

    #[test]
    fn legacy_record_uses_object_id_and_defaults_status() {
        let json = r#"{"_id":"b2","title":"silk dress","price":80}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, "b2");
        assert_eq!(product.status, ProductStatus::Available);
        assert_eq!(product.price_label(), "$80.00");
    }

    #[test]
    fn unknown_status_is_tolerated_and_counts_as_available() {
        let product: Product =
            serde_json::from_str(r#"{"_id":"c","title":"t","price":1,"status":"swapped"}"#)
                .unwrap();
        assert_eq!(product.status, ProductStatus::Unknown);
        assert!(product.status.is_available());
        assert!(!ProductStatus::Sold.is_available());
    }

    #[test]
    fn seller_prefers_owner_name() {
        let mut product: Product =
            serde_json::from_str(r#"{"_id":"c","title":"t","price":1,"owner_id":"e@x.io"}"#)
                .unwrap();
        assert_eq!(product.seller(), "e@x.io");
        assert!(product.is_owned_by("nope", "e@x.io"));
        product.owner = Some("Emma".into());
        assert_eq!(product.seller(), "Emma");
    }
}
