//! Community models: blog posts, comments and events.

use chrono::{DateTime, Utc};
use reqwest::multipart::Form;
use serde::{Deserialize, Serialize};

use hearth_core::{AuthorSummary, CommentId, EventId, PostId, UserId};

use super::Upload;
use crate::validation::FieldErrors;

/// A blog post in the community feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    #[serde(rename = "_id", alias = "id")]
    pub id: PostId,
    pub author: AuthorSummary,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Ids of users who liked the post.
    #[serde(default)]
    pub likes: Vec<UserId>,
    pub created_at: DateTime<Utc>,
}

impl BlogPost {
    #[must_use]
    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    /// Whether `user` is among the likers.
    #[must_use]
    pub fn is_liked_by(&self, user: &UserId) -> bool {
        self.likes.contains(user)
    }

    /// Whether `user` may delete the post.
    #[must_use]
    pub fn is_authored_by(&self, user: &UserId) -> bool {
        &self.author.id == user
    }
}

/// A community event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityEvent {
    #[serde(rename = "_id", alias = "id")]
    pub id: EventId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(alias = "startsAt")]
    pub date: DateTime<Utc>,
    pub organizer: AuthorSummary,
    /// Ids of users who joined.
    #[serde(default)]
    pub attendees: Vec<UserId>,
    #[serde(default)]
    pub max_attendees: Option<u32>,
    #[serde(default)]
    pub image: Option<String>,
}

impl CommunityEvent {
    #[must_use]
    pub fn attendee_count(&self) -> usize {
        self.attendees.len()
    }

    #[must_use]
    pub fn is_attending(&self, user: &UserId) -> bool {
        self.attendees.contains(user)
    }

    /// Whether the event has reached its attendee limit.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.max_attendees
            .is_some_and(|max| self.attendees.len() >= max as usize)
    }
}

/// A new blog post, sent as multipart because it may carry an image.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub image: Option<Upload>,
}

impl NewPost {
    #[must_use]
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require("title", &self.title);
        errors.require("content", &self.content);
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
            .text("content", self.content)
            .text("tags", self.tags.join(","));
        if let Some(image) = self.image {
            form = form.part("image", image.into_part()?);
        }
        Ok(form)
    }
}

/// A new comment or reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub post: PostId,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_comment: Option<CommentId>,
}

impl NewComment {
    #[must_use]
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require("content", &self.content);
        errors
    }
}

/// A new community event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub location: String,
    pub date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attendees: Option<u32>,
}

impl NewEvent {
    /// Check the event against `now`; events cannot be scheduled in the past.
    #[must_use]
    pub fn validate(&self, now: DateTime<Utc>) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require("title", &self.title);
        errors.require("location", &self.location);
        errors.check(self.date > now, "date", "must be in the future");
        errors.check(
            self.max_attendees != Some(0),
            "maxAttendees",
            "must be at least 1",
        );
        errors
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_post_likes() {
        let json = r#"{
            "_id": "b1",
            "author": {"_id": "u1", "name": "Ada"},
            "title": "Sourdough notes",
            "likes": ["u2", "u3"],
            "createdAt": "2024-05-01T09:00:00Z"
        }"#;
        let post: BlogPost = serde_json::from_str(json).unwrap();
        assert_eq!(post.like_count(), 2);
        assert!(post.is_liked_by(&UserId::from("u3")));
        assert!(!post.is_liked_by(&UserId::from("u1")));
        assert!(post.is_authored_by(&UserId::from("u1")));
        assert!(post.tags.is_empty());
    }

    #[test]
    fn test_event_capacity() {
        let json = r#"{
            "_id": "e1",
            "title": "Market day",
            "startsAt": "2030-05-01T09:00:00Z",
            "organizer": {"_id": "u1"},
            "attendees": ["u2", "u3"],
            "maxAttendees": 2
        }"#;
        let event: CommunityEvent = serde_json::from_str(json).unwrap();
        assert!(event.is_full());
        assert!(event.is_attending(&UserId::from("u2")));

        let open: CommunityEvent = serde_json::from_str(
            r#"{"_id":"e2","title":"Open","date":"2030-05-01T09:00:00Z","organizer":{"_id":"u1"}}"#,
        )
        .unwrap();
        assert!(!open.is_full());
        assert_eq!(open.attendee_count(), 0);
    }

    #[test]
    fn test_new_event_must_be_in_future() {
        let now = Utc::now();
        let event = NewEvent {
            title: "Swap meet".to_string(),
            description: String::new(),
            location: "Hall".to_string(),
            date: now - Duration::hours(1),
            max_attendees: Some(0),
        };
        let errors = event.validate(now);
        assert_eq!(errors.get("date"), Some("must be in the future"));
        assert_eq!(errors.get("maxAttendees"), Some("must be at least 1"));
        assert!(errors.get("title").is_none());
    }

    #[test]
    fn test_new_comment_omits_missing_parent() {
        let comment = NewComment {
            post: PostId::from("b1"),
            content: "Lovely".to_string(),
            parent_comment: None,
        };
        assert!(comment.validate().is_empty());
        assert_eq!(
            serde_json::to_value(&comment).unwrap(),
            serde_json::json!({"post": "b1", "content": "Lovely"})
        );
    }
}
