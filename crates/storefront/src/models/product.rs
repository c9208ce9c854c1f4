//! Catalog models.

use chrono::{DateTime, Utc};
use reqwest::multipart::Form;
use serde::{Deserialize, Serialize};

use hearth_core::{AuthorSummary, Money, ProductId, ReviewId};

use super::Upload;
use crate::validation::FieldErrors;

/// A product as returned by `/products` and `/products/:id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id", alias = "id")]
    pub id: ProductId,
    #[serde(default, alias = "name")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, alias = "countInStock")]
    pub stock: Option<u32>,
    #[serde(default)]
    pub num_reviews: u32,
}

impl Product {
    /// Whether the backend reported the product as sold out.
    #[must_use]
    pub fn is_sold_out(&self) -> bool {
        self.stock == Some(0)
    }
}

/// One page of the product listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "first_page")]
    pub pages: u32,
}

const fn first_page() -> u32 {
    1
}

impl ProductPage {
    /// Whether another page follows this one.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.pages
    }
}

/// The listing endpoint answers either with a page envelope or a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ProductListing {
    Paged(ProductPage),
    Bare(Vec<Product>),
}

impl From<ProductListing> for ProductPage {
    fn from(listing: ProductListing) -> Self {
        match listing {
            ProductListing::Paged(page) => page,
            ProductListing::Bare(products) => Self {
                products,
                page: 1,
                pages: 1,
            },
        }
    }
}

/// Filters for the product listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProductQuery {
    #[serde(rename = "keyword", skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "pageNumber", skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

/// A product review.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id", alias = "id")]
    pub id: ReviewId,
    pub user: AuthorSummary,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// A review submitted by the current principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewReview {
    pub rating: u8,
    pub comment: String,
}

impl NewReview {
    /// Check the review before it is sent.
    #[must_use]
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.check(
            (1..=5).contains(&self.rating),
            "rating",
            "must be between 1 and 5",
        );
        errors.require("comment", &self.comment);
        errors
    }
}

/// Fields for creating or updating a product from the admin dashboard.
#[derive(Debug, Clone)]
pub struct ProductDraft {
    pub title: String,
    pub description: String,
    pub price: Money,
    pub category: Option<String>,
    pub stock: u32,
    pub image: Option<Upload>,
}

impl ProductDraft {
    /// Check the draft before it is sent.
    #[must_use]
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require("title", &self.title);
        errors.require("description", &self.description);
        errors.check(!self.price.is_negative(), "price", "must not be negative");
        if let Some(image) = &self.image {
            image.check_image(&mut errors, "image");
        }
        errors
    }

    /// Build the multipart body.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the image content type is invalid.
    pub fn into_form(self) -> Result<Form, reqwest::Error> {
        let mut form = Form::new()
            .text("title", self.title)
            .text("description", self.description)
            .text("price", self.price.amount().to_string())
            .text("stock", self.stock.to_string());
        if let Some(category) = self.category {
            form = form.text("category", category);
        }
        if let Some(image) = self.image {
            form = form.part("image", image.into_part()?);
        }
        Ok(form)
    }
}
