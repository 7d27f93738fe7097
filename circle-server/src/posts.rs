//! Posts with their embedded likes, comments and share counter.
//!
//! Posts are kept in a map keyed by id plus a creation-ordered index, listing walks the index
//! backwards so the newest post comes first. Author names on posts and comments are snapshots
//! taken when they were written.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use circle_common::{CommentId, CommentView, LikeResponse, Media, PostId, PostView, UserId};
use uuid::Uuid;

use crate::error::SocialError;

#[derive(Clone, Debug)]
pub struct Comment {
    pub id: CommentId,
    pub author_id: UserId,
    pub author_username: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn view(&self) -> CommentView {
        CommentView {
            id: self.id.clone(),
            user_id: self.author_id.clone(),
            username: self.author_username.clone(),
            text: self.text.clone(),
            created_at: self.created_at,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Post {
    pub id: PostId,
    pub author_id: UserId,
    pub author_username: String,
    pub content: Option<String>,
    pub media: Option<Media>,
    pub likes: Vec<UserId>,
    pub comments: Vec<Comment>,
    pub shares: u64,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn is_liked_by(&self, user: &UserId) -> bool {
        self.likes.contains(user)
    }

    pub fn view(&self, viewer: &UserId) -> PostView {
        PostView {
            id: self.id.clone(),
            user_id: self.author_id.clone(),
            username: self.author_username.clone(),
            content: self.content.clone(),
            media_url: self.media.as_ref().map(|media| media.url.clone()),
            media_type: self.media.as_ref().map(|media| media.kind),
            likes_count: self.likes.len(),
            is_liked: self.is_liked_by(viewer),
            comments_count: self.comments.len(),
            comments: self.comments.iter().map(Comment::view).collect(),
            shares: self.shares,
            created_at: self.created_at,
        }
    }
}

/// Author of a post or comment as it should be displayed from now on.
#[derive(Clone, Debug)]
pub struct Author {
    pub id: UserId,
    pub username: String,
}

#[derive(Default)]
pub struct PostStore {
    posts: HashMap<PostId, Post>,
    // creation order, oldest first
    order: Vec<PostId>,
    by_author: HashMap<UserId, Vec<PostId>>,
}

impl PostStore {
    /// Stores a post as is. Emptiness and the quota are the engine's business, blank content is
    /// only normalized to `None` here.
    pub fn insert(
        &mut self,
        author: Author,
        content: Option<String>,
        media: Option<Media>,
        now: DateTime<Utc>,
    ) -> &Post {
        let content = content.filter(|text| !text.trim().is_empty());
        let post = Post {
            id: PostId(Uuid::new_v4().to_string()),
            author_id: author.id,
            author_username: author.username,
            content,
            media,
            likes: Vec::new(),
            comments: Vec::new(),
            shares: 0,
            created_at: now,
        };
        let id = post.id.clone();
        self.order.push(id.clone());
        self.by_author.entry(post.author_id.clone()).or_default().push(id.clone());
        self.posts.entry(id).or_insert(post)
    }

    pub fn get(&self, id: &PostId) -> Result<&Post, SocialError> {
        self.posts.get(id).ok_or(SocialError::PostNotFound)
    }

    fn get_mut(&mut self, id: &PostId) -> Result<&mut Post, SocialError> {
        self.posts.get_mut(id).ok_or(SocialError::PostNotFound)
    }

    /// Most recently created first.
    pub fn list(&self) -> impl Iterator<Item = &Post> {
        self.order.iter().rev().filter_map(|id| self.posts.get(id))
    }

    pub fn posts_on(&self, author: &UserId, day: NaiveDate) -> usize {
        self.by_author.get(author).map_or(0, |ids| {
            ids.iter()
                .filter_map(|id| self.posts.get(id))
                .filter(|post| post.created_at.date_naive() == day)
                .count()
        })
    }

    pub fn toggle_like(&mut self, id: &PostId, user: &UserId) -> Result<LikeResponse, SocialError> {
        let post = self.get_mut(id)?;
        let liked = match post.likes.iter().position(|liker| liker == user) {
            Some(index) => {
                post.likes.remove(index);
                false
            }
            None => {
                post.likes.push(user.clone());
                true
            }
        };
        Ok(LikeResponse {
            liked,
            likes_count: post.likes.len(),
        })
    }

    pub fn add_comment(
        &mut self,
        id: &PostId,
        author: Author,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<&Comment, SocialError> {
        let post = self.get_mut(id)?;
        let text = text.trim();
        if text.is_empty() {
            return Err(SocialError::EmptyComment);
        }
        post.comments.push(Comment {
            id: CommentId(Uuid::new_v4().to_string()),
            author_id: author.id,
            author_username: author.username,
            text: text.to_string(),
            created_at: now,
        });
        Ok(&post.comments[post.comments.len() - 1])
    }

    pub fn share(&mut self, id: &PostId) -> Result<u64, SocialError> {
        let post = self.get_mut(id)?;
        post.shares += 1;
        Ok(post.shares)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn author(name: &str) -> Author {
        Author {
            id: UserId(format!("{name}-id")),
            username: name.to_string(),
        }
    }

    fn text(content: &str) -> Option<String> {
        Some(content.to_string())
    }

    #[test]
    fn blank_content_is_stored_as_none() {
        let mut store = PostStore::default();
        let media = Media {
            url: String::from("/uploads/cat.png"),
            kind: circle_common::MediaKind::Image,
        };
        let post = store.insert(author("malek"), text("  \n"), Some(media), Utc::now());
        assert_eq!(post.content, None);
    }

    #[test]
    fn media_alone_is_enough() {
        let mut store = PostStore::default();
        let media = Media {
            url: String::from("/uploads/cat.png"),
            kind: circle_common::MediaKind::Image,
        };
        let post = store.insert(author("malek"), None, Some(media.clone()), Utc::now());
        assert_eq!(post.media, Some(media));
        assert_eq!(post.content, None);
    }

    #[test]
    fn newest_first() {
        let mut store = PostStore::default();
        let first = store.insert(author("malek"), text("one"), None, Utc::now()).id.clone();
        let second = store.insert(author("malek"), text("two"), None, Utc::now()).id.clone();
        let ids: Vec<_> = store.list().map(|p| p.id.clone()).collect();
        assert_eq!(ids, [second, first]);
    }

    #[test]
    fn toggle_like_twice_restores_state() {
        let mut store = PostStore::default();
        let id = store.insert(author("malek"), text("hi"), None, Utc::now()).id.clone();
        let lyuma = author("lyuma").id;
        let sam = author("sam").id;
        store.toggle_like(&id, &sam).unwrap();

        let liked = store.toggle_like(&id, &lyuma).unwrap();
        assert_eq!(liked, LikeResponse { liked: true, likes_count: 2 });
        assert!(store.get(&id).unwrap().view(&lyuma).is_liked);

        let unliked = store.toggle_like(&id, &lyuma).unwrap();
        assert_eq!(unliked, LikeResponse { liked: false, likes_count: 1 });
        assert!(!store.get(&id).unwrap().view(&lyuma).is_liked);
        assert_eq!(store.get(&id).unwrap().likes, [sam]);
    }

    #[test]
    fn comments_are_appended_in_order() {
        let mut store = PostStore::default();
        let id = store.insert(author("malek"), text("hi"), None, Utc::now()).id.clone();
        store.add_comment(&id, author("lyuma"), "first", Utc::now()).unwrap();
        store.add_comment(&id, author("malek"), "second", Utc::now()).unwrap();
        assert_eq!(
            store.add_comment(&id, author("sam"), "  ", Utc::now()).unwrap_err(),
            SocialError::EmptyComment
        );
        let view = store.get(&id).unwrap().view(&author("sam").id);
        let texts: Vec<_> = view.comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["first", "second"]);
        assert_eq!(view.comments_count, 2);
        assert_eq!(view.comments[0].username, "lyuma");
    }

    #[test]
    fn every_share_counts() {
        let mut store = PostStore::default();
        let id = store.insert(author("malek"), text("hi"), None, Utc::now()).id.clone();
        assert_eq!(store.share(&id).unwrap(), 1);
        assert_eq!(store.share(&id).unwrap(), 2);
        assert_eq!(store.get(&id).unwrap().shares, 2);
    }

    #[test]
    fn unknown_post() {
        let mut store = PostStore::default();
        let missing = PostId(String::from("missing"));
        let user = author("malek");
        assert_eq!(store.toggle_like(&missing, &user.id).unwrap_err(), SocialError::PostNotFound);
        assert_eq!(store.share(&missing).unwrap_err(), SocialError::PostNotFound);
        assert_eq!(
            store.add_comment(&missing, user, "hello", Utc::now()).unwrap_err(),
            SocialError::PostNotFound
        );
    }

    #[test]
    fn posts_on_counts_one_day_per_author() {
        let mut store = PostStore::default();
        let now = Utc::now();
        let yesterday = now - Duration::days(1);
        store.insert(author("malek"), text("old"), None, yesterday);
        store.insert(author("malek"), text("new"), None, now);
        store.insert(author("lyuma"), text("other"), None, now);
        assert_eq!(store.posts_on(&author("malek").id, now.date_naive()), 1);
        assert_eq!(store.posts_on(&author("malek").id, yesterday.date_naive()), 1);
        assert_eq!(store.posts_on(&author("sam").id, now.date_naive()), 0);
    }
}
