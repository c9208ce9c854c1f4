//! Product catalog and reviews.

use reqwest::Method;
use tracing::instrument;

use hearth_core::ProductId;

use super::{SubmitError, ensure_valid};
use crate::models::product::ProductListing;
use crate::models::{NewReview, Product, ProductDraft, ProductPage, ProductQuery, Review};
use crate::transport::{ApiClient, ApiError, segment};

/// `/products` endpoints.
#[derive(Debug, Clone)]
pub struct CatalogApi {
    api: ApiClient,
}

impl CatalogApi {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// List products matching `query`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn list(&self, query: &ProductQuery) -> Result<ProductPage, ApiError> {
        let listing: ProductListing = self.api.get_with_query("/products", query).await?;
        Ok(listing.into())
    }

    /// Fetch one product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails or the product does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get(&self, id: &ProductId) -> Result<Product, ApiError> {
        let path = format!("/products/{}", segment(id.as_str())?);
        self.api.get(&path).await
    }

    /// Reviews for a product, newest first as the backend sorts them.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn reviews(&self, id: &ProductId) -> Result<Vec<Review>, ApiError> {
        let path = format!("/products/{}/reviews", segment(id.as_str())?);
        self.api.get(&path).await
    }

    /// Review a product as the current principal.
    ///
    /// # Errors
    ///
    /// Returns `SubmitError::Invalid` without sending anything if the review
    /// fails validation, or `SubmitError::Api` if the backend rejects it.
    #[instrument(skip(self, review), fields(product_id = %id))]
    pub async fn add_review(&self, id: &ProductId, review: &NewReview) -> Result<Review, SubmitError> {
        ensure_valid(review.validate())?;
        let path = format!("/products/{}/reviews", segment(id.as_str())?);
        Ok(self.api.post_json(&path, review).await?)
    }

    /// Create a product (admin).
    ///
    /// # Errors
    ///
    /// See [`CatalogApi::add_review`].
    #[instrument(skip(self, draft), fields(title = %draft.title))]
    pub async fn create(&self, draft: ProductDraft) -> Result<Product, SubmitError> {
        ensure_valid(draft.validate())?;
        let form = draft.into_form()?;
        Ok(self.api.send_multipart(Method::POST, "/products", form).await?)
    }

    /// Replace a product's fields (admin).
    ///
    /// # Errors
    ///
    /// See [`CatalogApi::add_review`].
    #[instrument(skip(self, draft), fields(product_id = %id))]
    pub async fn update(&self, id: &ProductId, draft: ProductDraft) -> Result<Product, SubmitError> {
        ensure_valid(draft.validate())?;
        let path = format!("/products/{}", segment(id.as_str())?);
        let form = draft.into_form()?;
        Ok(self.api.send_multipart(Method::PUT, &path, form).await?)
    }

    /// Delete a product (admin).
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete(&self, id: &ProductId) -> Result<(), ApiError> {
        let path = format!("/products/{}", segment(id.as_str())?);
        self.api.delete(&path).await
    }
}
