use super::{row, unknown_action, unknown_query};
use crate::store::Collection;
use async_trait::async_trait;
use concord_engine::{require_str, Concept, ConceptError, MethodRef, Outcome, Record};
use serde_json::json;

#[derive(Debug, Clone)]
struct Post {
    author: String,
    content: String,
}

/// Short text posts owned by an author
#[derive(Debug)]
pub struct Posting {
    posts: Collection<Post>,
}

impl Posting {
    pub const CREATE: MethodRef = MethodRef::of("Posting", "create");
    pub const DELETE: MethodRef = MethodRef::of("Posting", "delete");
    pub const GET_POSTS_BY_AUTHOR: MethodRef = MethodRef::of("Posting", "_getPostsByAuthor");

    pub fn new() -> Self {
        Self {
            posts: Collection::new("post"),
        }
    }
}

impl Default for Posting {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Concept for Posting {
    fn name(&self) -> &str {
        "Posting"
    }

    fn actions(&self) -> &[&'static str] {
        &["create", "delete"]
    }

    fn queries(&self) -> &[&'static str] {
        &["_getPostsByAuthor"]
    }

    async fn perform(&self, action: &str, input: Record) -> Result<Outcome, ConceptError> {
        match action {
            "create" => {
                let author = require_str(&input, "author")?;
                let content = require_str(&input, "content")?;
                if content.trim().is_empty() {
                    return Ok(Outcome::error("post content must not be empty"));
                }
                let post = Collection::<Post>::fresh_id();
                let doc = Post {
                    author: author.to_string(),
                    content: content.to_string(),
                };
                if let Err(err) = self.posts.insert(post.clone(), doc) {
                    return Ok(err.into());
                }
                Ok(Outcome::with("post", post))
            }
            "delete" => {
                let post = require_str(&input, "post")?;
                Ok(match self.posts.delete(post) {
                    Ok(_) => Outcome::empty(),
                    Err(err) => err.into(),
                })
            }
            other => Err(unknown_action(self.name(), other)),
        }
    }

    async fn query(&self, query: &str, input: Record) -> Result<Vec<Record>, ConceptError> {
        match query {
            "_getPostsByAuthor" => {
                let author = require_str(&input, "author")?;
                Ok(self
                    .posts
                    .find(|p| p.author == author)
                    .into_iter()
                    .map(|(post, p)| row([("post", json!(post)), ("content", json!(p.content))]))
                    .collect())
            }
            other => Err(unknown_query(self.name(), other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_posts_are_listed_per_author() {
        let posting = Posting::new();
        for (author, content) in [("a", "one"), ("b", "two"), ("a", "three")] {
            posting
                .perform(
                    "create",
                    row([("author", json!(author)), ("content", json!(content))]),
                )
                .await
                .unwrap();
        }

        let rows = posting
            .query("_getPostsByAuthor", row([("author", json!("a"))]))
            .await
            .unwrap();
        let contents: Vec<_> = rows.iter().map(|r| r["content"].clone()).collect();
        assert_eq!(contents, [json!("one"), json!("three")]);
    }

    #[tokio::test]
    async fn test_empty_content_is_rejected() {
        let posting = Posting::new();
        let out = posting
            .perform("create", row([("author", json!("a")), ("content", json!("  "))]))
            .await
            .unwrap();
        assert!(out.is_error());
    }
}
