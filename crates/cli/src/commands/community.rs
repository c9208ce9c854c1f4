//! Blog and event commands.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use hearth_core::{CommentId, EventId, PostId};
use hearth_storefront::models::{NewComment, NewEvent, NewPost};

use super::{Context, confirm, read_upload};
use crate::error::{AppError, Result};
use crate::output;

// =============================================================================
// Blog
// =============================================================================

/// `hearth blog list`
pub async fn list_posts(ctx: &Context) -> Result<()> {
    let posts = ctx.community.posts().await?;
    output::posts(&posts);
    Ok(())
}

/// `hearth blog show`
pub async fn show_post(ctx: &Context, id: &PostId) -> Result<()> {
    let (post, comments) = tokio::try_join!(ctx.community.post(id), ctx.community.comments(id))?;
    output::post(&post, &comments);
    Ok(())
}

/// `hearth blog post`
pub async fn create_post(
    ctx: &Context,
    title: String,
    content: String,
    tags: Vec<String>,
    image: Option<PathBuf>,
) -> Result<()> {
    ctx.principal()?;
    let image = match &image {
        Some(path) => Some(read_upload(path).await?),
        None => None,
    };
    let post = ctx
        .community
        .create_post(NewPost {
            title,
            content,
            tags,
            image,
        })
        .await?;
    output::done(&format!("Published post {}.", post.id));
    Ok(())
}

/// `hearth blog like`
pub async fn like(ctx: &Context, id: &PostId) -> Result<()> {
    let principal = ctx.principal()?;
    let post = ctx.community.like_post(id).await?;
    let verb = if post.is_liked_by(&principal.id) { "Liked" } else { "Unliked" };
    output::done(&format!("{verb} \"{}\" ({} like(s)).", post.title, post.like_count()));
    Ok(())
}

/// `hearth blog comment`
pub async fn comment(
    ctx: &Context,
    post: PostId,
    content: String,
    reply_to: Option<CommentId>,
) -> Result<()> {
    ctx.principal()?;
    let comment = ctx
        .community
        .add_comment(&NewComment {
            post,
            content,
            parent_comment: reply_to,
        })
        .await?;
    output::done(&format!("Comment {} posted.", comment.id));
    Ok(())
}

/// `hearth blog delete`
pub async fn delete_post(ctx: &Context, id: &PostId, yes: bool) -> Result<()> {
    ctx.principal()?;
    confirm(yes, format!("delete post {id}"))?;
    ctx.community.delete_post(id).await?;
    output::done("Post deleted.");
    Ok(())
}

/// `hearth blog delete-comment`
pub async fn delete_comment(ctx: &Context, id: &CommentId, yes: bool) -> Result<()> {
    ctx.principal()?;
    confirm(yes, format!("delete comment {id}"))?;
    ctx.community.delete_comment(id).await?;
    output::done("Comment deleted.");
    Ok(())
}

// =============================================================================
// Events
// =============================================================================

/// `hearth events list`
pub async fn list_events(ctx: &Context) -> Result<()> {
    let events = ctx.community.events().await?;
    output::events(&events);
    Ok(())
}

/// `hearth events create`
pub async fn create_event(
    ctx: &Context,
    title: String,
    description: String,
    location: String,
    date: &str,
    max_attendees: Option<u32>,
) -> Result<()> {
    ctx.principal()?;
    let date: DateTime<Utc> = DateTime::parse_from_rfc3339(date)
        .map_err(|e| AppError::InvalidArgument(format!("date must be RFC 3339: {e}")))?
        .with_timezone(&Utc);
    let event = ctx
        .community
        .create_event(&NewEvent {
            title,
            description,
            location,
            date,
            max_attendees,
        })
        .await?;
    output::done(&format!("Scheduled event {}.", event.id));
    Ok(())
}

/// `hearth events join`
pub async fn join(ctx: &Context, id: &EventId) -> Result<()> {
    ctx.principal()?;
    let event = ctx.community.join_event(id).await?;
    output::event(&event);
    Ok(())
}

/// `hearth events leave`
pub async fn leave(ctx: &Context, id: &EventId) -> Result<()> {
    ctx.principal()?;
    let event = ctx.community.leave_event(id).await?;
    output::event(&event);
    Ok(())
}

/// `hearth events delete`
pub async fn delete_event(ctx: &Context, id: &EventId, yes: bool) -> Result<()> {
    ctx.principal()?;
    confirm(yes, format!("delete event {id}"))?;
    ctx.community.delete_event(id).await?;
    output::done("Event deleted.");
    Ok(())
}
