//! Catalog search composition and client-side ordering.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::product::Product;

/// Everything the browse view lets a shopper constrain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub query: String,
    pub category: Option<String>,
    pub size: Option<String>,
    pub condition: Option<String>,
    pub brand: Option<String>,
    pub color: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

/// Which endpoint a set of filters resolves to, with its query parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchPlan {
    /// `GET /product/all`
    All,
    /// `GET /product/search`: text, category and price only.
    Basic(Vec<(&'static str, String)>),
    /// `GET /product/advanced-search`: every facet.
    Advanced(Vec<(&'static str, String)>),
}

/// A choice counts as unset when blank or when it is one of the
/// "All Categories" style placeholders of the select boxes.
fn active(value: &Option<String>) -> Option<&str> {
    let value = value.as_deref()?.trim();
    if value.is_empty() || value.to_ascii_lowercase().starts_with("all ") || value.eq_ignore_ascii_case("all") {
        None
    } else {
        Some(value)
    }
}

fn price(value: Option<f64>) -> Option<f64> {
    value.filter(|p| p.is_finite() && *p >= 0.0)
}

impl SearchFilters {
    pub fn text(&self) -> Option<&str> {
        let q = self.query.trim();
        (!q.is_empty()).then_some(q)
    }

    /// True when a constraint only the advanced endpoint understands is set.
    pub fn has_facets(&self) -> bool {
        [&self.size, &self.condition, &self.brand, &self.color]
            .into_iter()
            .any(|f| active(f).is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.text().is_none()
            && active(&self.category).is_none()
            && price(self.min_price).is_none()
            && price(self.max_price).is_none()
            && !self.has_facets()
    }

    pub fn plan(&self) -> SearchPlan {
        if self.is_empty() {
            return SearchPlan::All;
        }

        let mut params = Vec::new();
        if let Some(q) = self.text() {
            params.push(("title", q.to_string()));
        }
        if let Some(c) = active(&self.category) {
            params.push(("category", c.to_string()));
        }
        if let Some(min) = price(self.min_price) {
            params.push(("min_price", min.to_string()));
        }
        if let Some(max) = price(self.max_price) {
            params.push(("max_price", max.to_string()));
        }

        if !self.has_facets() {
            return SearchPlan::Basic(params);
        }

        for (key, value) in [
            ("size", &self.size),
            ("condition", &self.condition),
            ("brand", &self.brand),
            ("color", &self.color),
        ] {
            if let Some(v) = active(value) {
                params.push((key, v.to_string()));
            }
        }
        SearchPlan::Advanced(params)
    }
}

impl SearchPlan {
    /// Path and query string relative to the product service.
    pub fn path(&self) -> String {
        let (base, params) = match self {
            Self::All => return "/product/all".to_string(),
            Self::Basic(params) => ("/product/search", params),
            Self::Advanced(params) => ("/product/advanced-search", params),
        };
        if params.is_empty() {
            return base.to_string();
        }
        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{base}?{query}")
    }
}

// ── Sorting ──

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    Newest,
    PriceLowHigh,
    PriceHighLow,
    Popular,
}

impl SortBy {
    pub const ALL: [SortBy; 4] = [
        SortBy::Newest,
        SortBy::PriceLowHigh,
        SortBy::PriceHighLow,
        SortBy::Popular,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Newest => "Newest",
            Self::PriceLowHigh => "Price: Low to High",
            Self::PriceHighLow => "Price: High to Low",
            Self::Popular => "Most Popular",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::PriceLowHigh => "price_low_high",
            Self::PriceHighLow => "price_high_low",
            Self::Popular => "popular",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.key() == key)
    }

    fn compare(self, a: &Product, b: &Product) -> Ordering {
        match self {
            // ISO timestamps order lexically; undated listings go last.
            Self::Newest => match (&a.created_at, &b.created_at) {
                (Some(x), Some(y)) => y.cmp(x),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            Self::PriceLowHigh => a.price.total_cmp(&b.price),
            Self::PriceHighLow => b.price.total_cmp(&a.price),
            Self::Popular => (b.likes, b.views).cmp(&(a.likes, a.views)),
        }
    }
}

/// Returns a sorted copy; `products` is left in fetch order.
pub fn sorted(products: &[Product], sort: SortBy) -> Vec<Product> {
    let mut copy = products.to_vec();
    copy.sort_by(|a, b| sort.compare(a, b));
    copy
}

// ── Stale response guard ──

/// Hands out increasing tickets for dispatched searches so a response that
/// resolves after a newer request was sent can be recognized and dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestSequence {
    latest: u64,
}

impl RequestSequence {
    pub fn begin(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    pub fn is_latest(&self, ticket: u64) -> bool {
        ticket == self.latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, price: f64, likes: u32, created_at: Option<&str>) -> Product {
        serde_json::from_value(serde_json::json!({
            "_id": id,
            "title": id,
            "price": price,
            "likes": likes,
            "created_at": created_at,
        }))
        .unwrap()
    }

    #[test]
    fn no_filters_routes_to_unfiltered_listing() {
        let filters = SearchFilters::default();
        assert_eq!(filters.plan(), SearchPlan::All);
        assert_eq!(filters.plan().path(), "/product/all");

        let placeholders = SearchFilters {
            query: "   ".into(),
            category: Some("All Categories".into()),
            size: Some("".into()),
            ..Default::default()
        };
        assert_eq!(placeholders.plan(), SearchPlan::All);
    }

    #[test]
    fn text_category_and_price_use_basic_search() {
        let filters = SearchFilters {
            query: "denim jacket".into(),
            category: Some("Jackets".into()),
            max_price: Some(50.0),
            ..Default::default()
        };
        assert_eq!(
            filters.plan().path(),
            "/product/search?title=denim%20jacket&category=Jackets&max_price=50"
        );
    }

    #[test]
    fn facet_only_routes_to_advanced_search() {
        let filters = SearchFilters {
            brand: Some("Levi's".into()),
            ..Default::default()
        };
        let plan = filters.plan();
        assert!(matches!(plan, SearchPlan::Advanced(_)));
        assert_eq!(plan.path(), "/product/advanced-search?brand=Levi%27s");
    }

    #[test]
    fn advanced_search_carries_every_active_parameter() {
        let filters = SearchFilters {
            query: "boots".into(),
            category: Some("Shoes".into()),
            size: Some("M".into()),
            condition: Some("All Conditions".into()),
            min_price: Some(10.0),
            ..Default::default()
        };
        assert_eq!(
            filters.plan(),
            SearchPlan::Advanced(vec![
                ("title", "boots".into()),
                ("category", "Shoes".into()),
                ("min_price", "10".into()),
                ("size", "M".into()),
            ])
        );
    }

    #[test]
    fn negative_prices_are_ignored() {
        let filters = SearchFilters {
            min_price: Some(-1.0),
            ..Default::default()
        };
        assert!(filters.is_empty());
    }

    #[test]
    fn sorting_returns_a_copy() {
        let fetched = vec![
            product("old", 30.0, 1, Some("2024-01-08T10:00:00")),
            product("undated", 5.0, 9, None),
            product("new", 20.0, 4, Some("2024-03-05T09:00:00")),
        ];

        let ids = |v: Vec<Product>| v.into_iter().map(|p| p.id).collect::<Vec<_>>();
        assert_eq!(ids(sorted(&fetched, SortBy::Newest)), ["new", "old", "undated"]);
        assert_eq!(ids(sorted(&fetched, SortBy::PriceLowHigh)), ["undated", "new", "old"]);
        assert_eq!(ids(sorted(&fetched, SortBy::PriceHighLow)), ["old", "new", "undated"]);
        assert_eq!(ids(sorted(&fetched, SortBy::Popular)), ["undated", "new", "old"]);

        assert_eq!(fetched[0].id, "old");
        assert_eq!(fetched[1].id, "undated");
    }

    #[test]
    fn sort_keys_round_trip_through_labels() {
        for sort in SortBy::ALL {
            assert_eq!(SortBy::from_key(sort.key()), Some(sort));
        }
        assert_eq!(SortBy::from_key("random"), None);
    }

    #[test]
    fn only_the_latest_ticket_is_current() {
        let mut seq = RequestSequence::default();
        let first = seq.begin();
        let second = seq.begin();
        assert!(!seq.is_latest(first));
        assert!(seq.is_latest(second));
    }
}
