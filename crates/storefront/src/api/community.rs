//! Community feed: blog posts, comments and events.

use chrono::Utc;
use reqwest::Method;
use tracing::instrument;

use hearth_core::{Comment, CommentId, CommentTree, EventId, PostId};

use super::{SubmitError, ensure_valid};
use crate::models::{BlogPost, CommunityEvent, NewComment, NewEvent, NewPost};
use crate::transport::{ApiClient, ApiError, segment};

/// `/blog`, `/comments` and `/community-events` endpoints.
#[derive(Debug, Clone)]
pub struct CommunityApi {
    api: ApiClient,
}

impl CommunityApi {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    // =========================================================================
    // Posts
    // =========================================================================

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn posts(&self) -> Result<Vec<BlogPost>, ApiError> {
        self.api.get("/blog").await
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(post_id = %id))]
    pub async fn post(&self, id: &PostId) -> Result<BlogPost, ApiError> {
        let path = format!("/blog/{}", segment(id.as_str())?);
        self.api.get(&path).await
    }

    /// Publish a post.
    ///
    /// # Errors
    ///
    /// Returns `SubmitError::Invalid` without sending anything if the post
    /// fails validation, or `SubmitError::Api` if the backend rejects it.
    #[instrument(skip(self, post), fields(title = %post.title))]
    pub async fn create_post(&self, post: NewPost) -> Result<BlogPost, SubmitError> {
        ensure_valid(post.validate())?;
        let form = post.into_form()?;
        Ok(self.api.send_multipart(Method::POST, "/blog", form).await?)
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(post_id = %id))]
    pub async fn delete_post(&self, id: &PostId) -> Result<(), ApiError> {
        let path = format!("/blog/{}", segment(id.as_str())?);
        self.api.delete(&path).await
    }

    /// Toggle the current principal's like and return the post as the
    /// backend now has it.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(post_id = %id))]
    pub async fn like_post(&self, id: &PostId) -> Result<BlogPost, ApiError> {
        let path = format!("/blog/{}/like", segment(id.as_str())?);
        self.api
            .send_json(Method::PUT, &path, &serde_json::json!({}))
            .await
    }

    // =========================================================================
    // Comments
    // =========================================================================

    /// Comments on a post, arranged as a reply tree.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(post_id = %post))]
    pub async fn comments(&self, post: &PostId) -> Result<CommentTree, ApiError> {
        let path = format!("/comments/post/{}", segment(post.as_str())?);
        let comments: Vec<Comment> = self.api.get(&path).await?;
        Ok(CommentTree::build(comments))
    }

    /// Comment on a post or reply to a comment.
    ///
    /// # Errors
    ///
    /// See [`CommunityApi::create_post`].
    #[instrument(skip(self, comment), fields(post_id = %comment.post))]
    pub async fn add_comment(&self, comment: &NewComment) -> Result<Comment, SubmitError> {
        ensure_valid(comment.validate())?;
        Ok(self.api.post_json("/comments", comment).await?)
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(comment_id = %id))]
    pub async fn delete_comment(&self, id: &CommentId) -> Result<(), ApiError> {
        let path = format!("/comments/{}", segment(id.as_str())?);
        self.api.delete(&path).await
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self))]
    pub async fn events(&self) -> Result<Vec<CommunityEvent>, ApiError> {
        self.api.get("/community-events").await
    }

    /// Schedule an event.
    ///
    /// # Errors
    ///
    /// See [`CommunityApi::create_post`].
    #[instrument(skip(self, event), fields(title = %event.title))]
    pub async fn create_event(&self, event: &NewEvent) -> Result<CommunityEvent, SubmitError> {
        ensure_valid(event.validate(Utc::now()))?;
        Ok(self.api.post_json("/community-events", event).await?)
    }

    /// Join an event and return it as the backend now has it.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails, e.g. the event is full.
    #[instrument(skip(self), fields(event_id = %id))]
    pub async fn join_event(&self, id: &EventId) -> Result<CommunityEvent, ApiError> {
        let path = format!("/community-events/{}/join", segment(id.as_str())?);
        self.api.post_json(&path, &serde_json::json!({})).await
    }

    /// Leave an event and return it as the backend now has it.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(event_id = %id))]
    pub async fn leave_event(&self, id: &EventId) -> Result<CommunityEvent, ApiError> {
        let path = format!("/community-events/{}/leave", segment(id.as_str())?);
        self.api.post_json(&path, &serde_json::json!({})).await
    }

    /// # Errors
    ///
    /// Returns `ApiError` if the request fails.
    #[instrument(skip(self), fields(event_id = %id))]
    pub async fn delete_event(&self, id: &EventId) -> Result<(), ApiError> {
        let path = format!("/community-events/{}", segment(id.as_str())?);
        self.api.delete(&path).await
    }
}
