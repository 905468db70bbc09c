//! Listing drafts composed on the "List an item" page.

use thiserror::Error;

use crate::product::{NewProduct, ProductStatus};

pub const CATEGORIES: [&str; 10] = [
    "Dresses",
    "Tops",
    "Bottoms",
    "Jackets",
    "Sweaters",
    "Shoes",
    "Accessories",
    "Bags",
    "Jewelry",
    "Other",
];

pub const SIZES: [&str; 6] = ["XS", "S", "M", "L", "XL", "XXL"];

pub const CONDITIONS: [&str; 3] = ["Excellent", "Good", "Fair"];

pub const SUGGESTED_TAGS: [&str; 8] = [
    "vintage", "designer", "casual", "formal", "summer", "winter", "trendy", "classic",
];

pub const MAX_IMAGES: usize = 5;

pub const DEFAULT_POINTS: i64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{field} must be one of the listed options, got {value:?}")]
    NotAnOption { field: &'static str, value: String },

    #[error("add at least one photo")]
    NoImages,

    #[error("at most {} photos can be attached", MAX_IMAGES)]
    TooManyImages,

    #[error("points must be positive")]
    InvalidPoints,

    #[error("price cannot be negative")]
    InvalidPrice,
}

/// A listing being composed. Images are data URLs or uploaded URLs; the
/// first one is the main image.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingDraft {
    pub title: String,
    pub description: String,
    pub category: String,
    pub size: String,
    pub condition: String,
    pub tags: String,
    pub points: i64,
    pub price: f64,
    pub brand: String,
    images: Vec<String>,
}

impl Default for ListingDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            category: String::new(),
            size: String::new(),
            condition: String::new(),
            tags: String::new(),
            points: DEFAULT_POINTS,
            price: 0.0,
            brand: String::new(),
            images: Vec::new(),
        }
    }
}

fn one_of(field: &'static str, value: &str, options: &[&str]) -> Result<(), DraftError> {
    if value.trim().is_empty() {
        return Err(DraftError::Missing(field));
    }
    if options.contains(&value.trim()) {
        Ok(())
    } else {
        Err(DraftError::NotAnOption {
            field,
            value: value.to_string(),
        })
    }
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl ListingDraft {
    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn add_image(&mut self, url: impl Into<String>) -> Result<(), DraftError> {
        if self.images.len() >= MAX_IMAGES {
            return Err(DraftError::TooManyImages);
        }
        self.images.push(url.into());
        Ok(())
    }

    pub fn remove_image(&mut self, index: usize) -> Option<String> {
        (index < self.images.len()).then(|| self.images.remove(index))
    }

    /// Splits the comma separated tag field, lowercased and de-duplicated.
    pub fn parsed_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        for tag in self.tags.split(',').map(|t| t.trim().to_lowercase()) {
            if !tag.is_empty() && !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        tags
    }

    /// Adds the tag, or removes it when already present.
    pub fn toggle_tag(&mut self, tag: &str) {
        let mut tags = self.parsed_tags();
        let tag = tag.trim().to_lowercase();
        if let Some(pos) = tags.iter().position(|t| *t == tag) {
            tags.remove(pos);
        } else {
            tags.push(tag);
        }
        self.tags = tags.join(", ");
    }

    pub fn validate(&self) -> Result<(), DraftError> {
        if self.title.trim().is_empty() {
            return Err(DraftError::Missing("title"));
        }
        if self.description.trim().is_empty() {
            return Err(DraftError::Missing("description"));
        }
        one_of("category", &self.category, &CATEGORIES)?;
        one_of("size", &self.size, &SIZES)?;
        one_of("condition", &self.condition, &CONDITIONS)?;
        if self.images.is_empty() {
            return Err(DraftError::NoImages);
        }
        if self.images.len() > MAX_IMAGES {
            return Err(DraftError::TooManyImages);
        }
        if self.points <= 0 {
            return Err(DraftError::InvalidPoints);
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(DraftError::InvalidPrice);
        }
        Ok(())
    }

    /// Validates and converts into the create payload.
    pub fn to_new_product(&self) -> Result<NewProduct, DraftError> {
        self.validate()?;
        Ok(NewProduct {
            title: self.title.trim().to_string(),
            description: optional(&self.description),
            price: self.price,
            category: optional(&self.category),
            size: optional(&self.size),
            condition: optional(&self.condition),
            points: Some(self.points),
            images: self.images.clone(),
            brand: optional(&self.brand),
            tags: self.parsed_tags(),
            status: ProductStatus::Available,
        })
    }
}
