//! The social graph and the post engine behind one owner, so that operations spanning both
//! (the quota check before a post is written) are applied as a unit.

use chrono::{DateTime, NaiveDate, Utc};
use circle_common::{CommentView, LikeResponse, Media, MaxPosts, PostId, PostView, PublicUser, UserId};
use tracing::warn;

use crate::error::SocialError;
use crate::graph::SocialGraph;
use crate::posts::{Author, PostStore};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserStats {
    pub friend_count: usize,
    pub posts_today: usize,
    pub max_posts: MaxPosts,
    pub can_post: bool,
}

#[derive(Default)]
pub struct Store {
    pub graph: SocialGraph,
    pub posts: PostStore,
}

impl Store {
    pub fn posts_today(&self, user: &UserId, today: NaiveDate) -> usize {
        self.posts.posts_on(user, today)
    }

    pub fn user_stats(&self, user: &UserId, today: NaiveDate) -> UserStats {
        let friend_count = self.graph.friend_count(user);
        let posts_today = self.posts_today(user, today);
        let max_posts = MaxPosts::for_friend_count(friend_count);
        UserStats {
            friend_count,
            posts_today,
            max_posts,
            can_post: max_posts.allows(posts_today),
        }
    }

    pub fn create_post(
        &mut self,
        author: &PublicUser,
        content: Option<String>,
        media: Option<Media>,
        now: DateTime<Utc>,
    ) -> Result<PostView, SocialError> {
        let has_text = content.as_deref().map_or(false, |text| !text.trim().is_empty());
        if !has_text && media.is_none() {
            return Err(SocialError::EmptyPost);
        }
        let stats = self.user_stats(&author.id, now.date_naive());
        if !stats.can_post {
            warn!(
                user = %author.id,
                friend_count = stats.friend_count,
                posts_today = stats.posts_today,
                "daily post limit reached"
            );
            return Err(SocialError::QuotaExceeded {
                friend_count: stats.friend_count,
                posts_today: stats.posts_today,
            });
        }
        let author = Author {
            id: author.id.clone(),
            username: author.username.clone(),
        };
        let post = self.posts.insert(author, content, media, now);
        Ok(post.view(&post.author_id))
    }

    pub fn list_posts(&self, viewer: &UserId) -> Vec<PostView> {
        self.posts.list().map(|post| post.view(viewer)).collect()
    }

    pub fn post(&self, id: &PostId, viewer: &UserId) -> Result<PostView, SocialError> {
        Ok(self.posts.get(id)?.view(viewer))
    }

    pub fn toggle_like(&mut self, id: &PostId, user: &UserId) -> Result<LikeResponse, SocialError> {
        self.posts.toggle_like(id, user)
    }

    pub fn add_comment(
        &mut self,
        id: &PostId,
        author: &PublicUser,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<CommentView, SocialError> {
        let author = Author {
            id: author.id.clone(),
            username: author.username.clone(),
        };
        Ok(self.posts.add_comment(id, author, text, now)?.view())
    }

    pub fn share_post(&mut self, id: &PostId) -> Result<u64, SocialError> {
        self.posts.share(id)
    }
}
