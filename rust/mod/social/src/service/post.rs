use recharge_core::now_rfc3339;
use recharge_sql::Value;
use tracing::info;

use crate::model::{CreatePost, Post};
use crate::service::{SocialError, SocialService, require};

impl SocialService {
    /// Create a post. Does not touch the author's feed counter.
    pub fn create_post(&self, input: CreatePost) -> Result<Post, SocialError> {
        require("authorId", &input.author_id)?;
        require("title", &input.title)?;

        let now = now_rfc3339();
        let rows = self.sql.query(
            "INSERT INTO posts (author_id, title, content, created_at)
             VALUES (?1, ?2, ?3, ?4) RETURNING id",
            &[
                Value::Text(input.author_id.clone()),
                Value::Text(input.title.clone()),
                Value::Text(input.content.clone()),
                Value::Text(now.clone()),
            ],
        )?;
        let id = rows
            .first()
            .and_then(|r| r.get_i64("id"))
            .ok_or_else(|| SocialError::Internal("insert returned no post id".into()))?;

        info!(post_id = id, author = %input.author_id, "post created");
        Ok(Post {
            id,
            author_id: input.author_id,
            title: input.title,
            content: input.content,
            created_at: now,
        })
    }

    /// Delete one of the author's posts. Posts of other authors are NotFound.
    pub fn delete_post(&self, id: i64, author_id: &str) -> Result<(), SocialError> {
        let affected = self.sql.exec(
            "DELETE FROM posts WHERE id = ?1 AND author_id = ?2",
            &[Value::Integer(id), Value::Text(author_id.to_string())],
        )?;
        if affected == 0 {
            return Err(SocialError::NotFound(format!("posts/{}", id)));
        }
        Ok(())
    }

    /// Authoritative post count for an author.
    pub fn count_posts_by_author(&self, author_id: &str) -> Result<i64, SocialError> {
        let rows = self.sql.query(
            "SELECT COUNT(*) AS cnt FROM posts WHERE author_id = ?1",
            &[Value::Text(author_id.to_string())],
        )?;
        Ok(rows.first().and_then(|r| r.get_i64("cnt")).unwrap_or(0))
    }
}
