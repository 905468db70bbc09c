//! Cart line items and arithmetic.
//!
//! The cart is client-owned and lives only in local storage, so the field
//! names follow the camelCase layout already stored under `rewear-cart`.

use serde::{Deserialize, Serialize};

use crate::product::Product;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    #[default]
    Purchase,
    Swap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Product id; a product occupies at most one line.
    pub id: String,
    pub title: String,
    pub price: f64,
    #[serde(default)]
    pub original_price: f64,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub seller: String,
    pub quantity: u32,
    #[serde(rename = "type", default)]
    pub kind: TransactionType,
}

impl CartItem {
    /// Denormalizes a product into a single-quantity line.
    pub fn from_product(product: &Product, kind: TransactionType) -> Self {
        Self {
            id: product.id.clone(),
            title: product.title.clone(),
            price: product.price,
            original_price: product.price,
            image: product.main_image().unwrap_or_default().to_string(),
            condition: product.condition.clone().unwrap_or_default(),
            size: product.size.clone().unwrap_or_default(),
            brand: product.brand.clone().unwrap_or_default(),
            seller: product.seller().to_string(),
            quantity: 1,
            kind,
        }
    }

    pub fn subtotal(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }

    fn savings(&self) -> f64 {
        (self.original_price - self.price).max(0.0) * f64::from(self.quantity)
    }
}

/// Result of [`Cart::add`], used by views to pick a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartChange {
    Added,
    Incremented(u32),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the stored form, dropping zero-quantity lines and merging
    /// duplicate product ids.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let items: Vec<CartItem> = serde_json::from_str(raw)?;
        let mut cart = Self::new();
        for item in items.into_iter().filter(|i| i.quantity > 0) {
            match cart.items.iter_mut().find(|existing| existing.id == item.id) {
                Some(existing) => existing.quantity = existing.quantity.saturating_add(item.quantity),
                None => cart.items.push(item),
            }
        }
        Ok(cart)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.items)
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Increments the line for `item.id` if present, otherwise appends the
    /// item with quantity 1. The incoming quantity is ignored.
    pub fn add(&mut self, item: CartItem) -> CartChange {
        if let Some(existing) = self.items.iter_mut().find(|i| i.id == item.id) {
            existing.quantity = existing.quantity.saturating_add(1);
            return CartChange::Incremented(existing.quantity);
        }
        self.items.push(CartItem { quantity: 1, ..item });
        CartChange::Added
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != id);
        self.items.len() < before
    }

    /// Sets the quantity of a line; zero or less removes it.
    ///
    /// Returns false when no line matched.
    pub fn set_quantity(&mut self, id: &str, quantity: i64) -> bool {
        if quantity <= 0 {
            return self.remove(id);
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        match self.items.iter_mut().find(|i| i.id == id) {
            Some(item) => {
                item.quantity = quantity;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.iter().any(|i| i.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of price x quantity.
    pub fn total_price(&self) -> f64 {
        self.items.iter().map(CartItem::subtotal).sum()
    }

    /// Sum of quantities.
    pub fn total_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn savings(&self) -> f64 {
        self.items.iter().map(CartItem::savings).sum()
    }

    pub fn of_kind(&self, kind: TransactionType) -> impl Iterator<Item = &CartItem> {
        self.items.iter().filter(move |i| i.kind == kind)
    }
}

// ── Checkout summary ──

/// The one promotional code the storefront accepts, matched case-insensitively.
pub const PROMO_CODE: &str = "rewear10";
pub const PROMO_RATE: f64 = 0.10;
pub const FREE_SHIPPING_OVER: f64 = 50.0;
pub const SHIPPING_FEE: f64 = 8.99;
pub const TAX_RATE: f64 = 0.08;

/// Discount rate granted by a promo code, if it is valid.
pub fn promo_rate(code: &str) -> Option<f64> {
    code.trim()
        .eq_ignore_ascii_case(PROMO_CODE)
        .then_some(PROMO_RATE)
}

/// Totals shown beside the cart. Tax applies after the discount; shipping
/// is free above [`FREE_SHIPPING_OVER`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderSummary {
    pub subtotal: f64,
    pub discount: f64,
    pub shipping: f64,
    pub tax: f64,
    pub total: f64,
}

impl OrderSummary {
    pub fn new(subtotal: f64, discount_rate: f64) -> Self {
        let discount = subtotal * discount_rate.clamp(0.0, 1.0);
        let shipping = if subtotal > FREE_SHIPPING_OVER {
            0.0
        } else {
            SHIPPING_FEE
        };
        let tax = (subtotal - discount) * TAX_RATE;
        Self {
            subtotal,
            discount,
            shipping,
            tax,
            total: subtotal - discount + shipping + tax,
        }
    }
}

impl Cart {
    pub fn summary(&self, discount_rate: f64) -> OrderSummary {
        OrderSummary::new(self.total_price(), discount_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, price: f64) -> CartItem {
        CartItem {
            id: id.to_string(),
            title: format!("item {id}"),
            price,
            original_price: price,
            image: String::new(),
            condition: "Good".into(),
            size: "M".into(),
            brand: "Levi's".into(),
            seller: "Sarah".into(),
            quantity: 7,
            kind: TransactionType::Purchase,
        }
    }

    #[test]
    fn adding_same_product_twice_increments_one_line() {
        let mut cart = Cart::new();
        assert_eq!(cart.add(item("a", 10.0)), CartChange::Added);
        assert_eq!(cart.add(item("a", 10.0)), CartChange::Incremented(2));
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 2);
        assert_eq!(cart.total_count(), 2);
    }

    #[test]
    fn zero_quantity_removes_line_and_updates_totals() {
        let mut cart = Cart::new();
        cart.add(item("a", 10.5));
        cart.add(item("b", 4.0));
        cart.set_quantity("a", 2);
        assert_eq!(cart.total_price(), 25.0);
        assert_eq!(cart.total_count(), 3);

        assert!(cart.set_quantity("a", 0));
        assert!(!cart.contains("a"));
        assert_eq!(cart.total_price(), 4.0);
        assert_eq!(cart.total_count(), 1);

        assert!(cart.set_quantity("b", -3));
        assert!(cart.is_empty());
        assert!(!cart.set_quantity("missing", 2));
    }

    #[test]
    fn savings_ignore_markups() {
        let mut cart = Cart::new();
        cart.add(CartItem { original_price: 30.0, ..item("a", 20.0) });
        cart.add(CartItem { original_price: 5.0, ..item("b", 8.0) });
        cart.set_quantity("a", 2);
        assert_eq!(cart.savings(), 20.0);
    }

    #[test]
    fn splits_purchases_from_swaps() {
        let mut cart = Cart::new();
        cart.add(item("a", 1.0));
        cart.add(CartItem { kind: TransactionType::Swap, ..item("b", 0.0) });
        assert_eq!(cart.of_kind(TransactionType::Swap).count(), 1);
        assert_eq!(cart.of_kind(TransactionType::Purchase).next().unwrap().id, "a");
    }

    #[test]
    fn stored_form_uses_original_layout() {
        let mut cart = Cart::new();
        cart.add(CartItem { kind: TransactionType::Swap, ..item("a", 12.0) });
        let json = cart.to_json().unwrap();
        assert!(json.contains(r#""originalPrice":12.0"#));
        assert!(json.contains(r#""type":"swap""#));
        assert_eq!(Cart::from_json(&json).unwrap(), cart);
    }

    #[test]
    fn parsing_normalizes_duplicates_and_empty_lines() {
        let raw = r#"[
            {"id":"a","title":"A","price":2,"quantity":1},
            {"id":"a","title":"A","price":2,"quantity":2},
            {"id":"b","title":"B","price":3,"quantity":0}
        ]"#;
        let cart = Cart::from_json(raw).unwrap();
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.total_count(), 3);
    }

    #[test]
    fn corrupt_json_is_an_error() {
        assert!(Cart::from_json("{not json").is_err());
        assert!(Cart::from_json(r#"{"id":"a"}"#).is_err());
    }

    #[test]
    fn summary_applies_promo_before_tax() {
        assert_eq!(promo_rate(" ReWear10 "), Some(PROMO_RATE));
        assert_eq!(promo_rate("rewear20"), None);

        let summary = OrderSummary::new(100.0, PROMO_RATE);
        assert!((summary.discount - 10.0).abs() < 1e-9);
        assert_eq!(summary.shipping, 0.0);
        assert!((summary.tax - 7.2).abs() < 1e-9);
        assert!((summary.total - 97.2).abs() < 1e-9);
    }

    #[test]
    fn small_orders_pay_shipping() {
        let summary = OrderSummary::new(50.0, 0.0);
        assert_eq!(summary.shipping, SHIPPING_FEE);
        assert!((summary.total - (50.0 + SHIPPING_FEE + 4.0)).abs() < 1e-9);
    }
}
