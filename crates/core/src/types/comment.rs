//! Comment threads.
//!
//! The backend returns comments for a post as a flat list where each reply
//! points at its parent. [`CommentTree`] turns that list into an arena-backed
//! tree with reply depth capped at [`MAX_REPLY_DEPTH`], and flattens it back
//! into display order without recursion.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{CommentId, PostId, UserId};

/// Maximum nesting depth for replies. Top-level comments are depth 0.
///
/// A reply to a comment already at this depth is attached next to its
/// parent instead of below it.
pub const MAX_REPLY_DEPTH: usize = 2;

/// Minimal author information embedded in community content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSummary {
    #[serde(rename = "_id")]
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// A comment on a blog post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: CommentId,
    pub post: PostId,
    pub author: AuthorSummary,
    pub content: String,
    #[serde(default)]
    pub parent_comment: Option<CommentId>,
    #[serde(default)]
    pub likes: u32,
    pub created_at: DateTime<Utc>,
}

/// A comment placed in a [`CommentTree`].
#[derive(Debug, Clone)]
pub struct CommentNode {
    pub comment: Comment,
    /// Display depth, never greater than [`MAX_REPLY_DEPTH`].
    pub depth: usize,
    children: Vec<usize>,
}

impl CommentNode {
    /// Number of direct replies shown under this comment.
    #[must_use]
    pub fn reply_count(&self) -> usize {
        self.children.len()
    }
}

/// A thread of comments with bounded reply depth.
#[derive(Debug, Clone, Default)]
pub struct CommentTree {
    nodes: Vec<CommentNode>,
    roots: Vec<usize>,
}

impl CommentTree {
    /// Build a tree from a flat list of comments.
    ///
    /// Input order is kept among siblings. Replies whose parent is missing
    /// from the list, or that form a parent cycle, are shown at the top level.
    #[must_use]
    pub fn build(comments: Vec<Comment>) -> Self {
        let index: HashMap<CommentId, usize> = comments
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect();

        let parents: Vec<Option<usize>> = comments
            .iter()
            .enumerate()
            .map(|(i, c)| {
                c.parent_comment
                    .as_ref()
                    .and_then(|p| index.get(p).copied())
                    .filter(|&p| p != i)
            })
            .collect();

        // Ancestor chain for each node, nearest first. A chain longer than the
        // number of comments means a cycle; such nodes become roots.
        let chains: Vec<Vec<usize>> = (0..comments.len())
            .map(|i| {
                let mut chain = Vec::new();
                let mut cursor = parents.get(i).copied().flatten();
                while let Some(p) = cursor {
                    if chain.len() > comments.len() {
                        return Vec::new();
                    }
                    chain.push(p);
                    cursor = parents.get(p).copied().flatten();
                }
                chain
            })
            .collect();

        let mut nodes: Vec<CommentNode> = Vec::with_capacity(comments.len());
        let mut attach_to: Vec<Option<usize>> = Vec::with_capacity(comments.len());

        for (comment, chain) in comments.into_iter().zip(&chains) {
            let depth = chain.len().min(MAX_REPLY_DEPTH);
            // Walk up until the parent sits one level above the capped depth.
            let parent = depth
                .checked_sub(1)
                .and_then(|d| chain.get(chain.len() - 1 - d).copied());
            attach_to.push(parent);
            nodes.push(CommentNode {
                comment,
                depth,
                children: Vec::new(),
            });
        }

        let mut roots = Vec::new();
        for (i, parent) in attach_to.into_iter().enumerate() {
            match parent.and_then(|p| nodes.get_mut(p)) {
                Some(node) => node.children.push(i),
                None => roots.push(i),
            }
        }

        Self { nodes, roots }
    }

    /// Total number of comments in the thread.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the thread has no comments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Top-level comments in input order.
    pub fn roots(&self) -> impl Iterator<Item = &CommentNode> {
        self.roots.iter().filter_map(|&i| self.nodes.get(i))
    }

    /// Direct replies shown under `node`.
    pub fn replies<'a>(&'a self, node: &'a CommentNode) -> impl Iterator<Item = &'a CommentNode> {
        node.children.iter().filter_map(|&i| self.nodes.get(i))
    }

    /// All comments in display order (each comment followed by its replies).
    #[must_use]
    pub fn flatten(&self) -> Vec<&CommentNode> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();

        while let Some(i) = stack.pop() {
            let Some(node) = self.nodes.get(i) else {
                continue;
            };
            out.push(node);
            stack.extend(node.children.iter().rev());
        }

        out
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn comment(id: &str, parent: Option<&str>) -> Comment {
        Comment {
            id: CommentId::new(id),
            post: PostId::new("post-1"),
            author: AuthorSummary {
                id: UserId::new("u1"),
                name: "Ada".to_string(),
                username: "ada".to_string(),
                avatar: None,
            },
            content: format!("comment {id}"),
            parent_comment: parent.map(CommentId::new),
            likes: 0,
            created_at: Utc::now(),
        }
    }

    fn order(tree: &CommentTree) -> Vec<(String, usize)> {
        tree.flatten()
            .into_iter()
            .map(|n| (n.comment.id.to_string(), n.depth))
            .collect()
    }

    #[test]
    fn test_builds_nested_display_order() {
        let tree = CommentTree::build(vec![
            comment("a", None),
            comment("b", None),
            comment("a1", Some("a")),
            comment("a1x", Some("a1")),
            comment("b1", Some("b")),
        ]);

        assert_eq!(tree.len(), 5);
        assert_eq!(
            order(&tree),
            vec![
                ("a".to_string(), 0),
                ("a1".to_string(), 1),
                ("a1x".to_string(), 2),
                ("b".to_string(), 0),
                ("b1".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_caps_reply_depth() {
        let tree = CommentTree::build(vec![
            comment("a", None),
            comment("a1", Some("a")),
            comment("a2", Some("a1")),
            comment("a3", Some("a2")),
            comment("a4", Some("a3")),
        ]);

        let flat = order(&tree);
        assert!(flat.iter().all(|(_, depth)| *depth <= MAX_REPLY_DEPTH));
        // a3 and a4 sit beside a2 under a1.
        let a1 = tree.flatten()[1];
        let replies: Vec<_> = tree
            .replies(a1)
            .map(|n| n.comment.id.to_string())
            .collect();
        assert_eq!(replies, vec!["a2", "a3", "a4"]);
    }

    #[test]
    fn test_reply_before_parent_in_input() {
        let tree = CommentTree::build(vec![comment("r", Some("p")), comment("p", None)]);
        assert_eq!(
            order(&tree),
            vec![("p".to_string(), 0), ("r".to_string(), 1)]
        );
    }

    #[test]
    fn test_orphans_and_cycles_become_roots() {
        let tree = CommentTree::build(vec![
            comment("orphan", Some("deleted")),
            comment("x", Some("y")),
            comment("y", Some("x")),
            comment("self", Some("self")),
        ]);

        assert_eq!(tree.roots().count(), 4);
        assert!(tree.flatten().iter().all(|n| n.depth == 0));
    }

    #[test]
    fn test_deserializes_backend_shape() {
        let json = r#"{
            "_id": "c1",
            "post": "p1",
            "author": {"_id": "u1", "name": "Ada", "username": "ada"},
            "content": "hi",
            "parentComment": null,
            "createdAt": "2024-05-01T12:00:00Z"
        }"#;
        let parsed: Comment = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.id.as_str(), "c1");
        assert!(parsed.parent_comment.is_none());
        assert_eq!(parsed.likes, 0);
    }
}
