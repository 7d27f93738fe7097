pub mod quota;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use quota::MaxPosts;

#[derive(Eq, PartialEq, Ord, PartialOrd, Hash, Clone, Debug, Serialize, Deserialize, Default)]
pub struct UserId(pub String);
#[derive(Eq, PartialEq, Ord, PartialOrd, Hash, Clone, Debug, Serialize, Deserialize, Default)]
pub struct PostId(pub String);
#[derive(Eq, PartialEq, Hash, Clone, Debug, Serialize, Deserialize, Default)]
pub struct CommentId(pub String);
#[derive(Eq, PartialEq, Hash, Clone, Debug, Serialize, Deserialize, Default)]
pub struct FriendshipId(pub String);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
impl std::fmt::Display for PostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The identity every authenticated request carries.
#[derive(Clone, Debug, Serialize, Deserialize, Default, Eq, PartialEq)]
pub struct PublicUser {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: PublicUser,
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct Media {
    pub url: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: CommentId,
    pub user_id: UserId,
    pub username: String,
    #[serde(rename = "comment", alias = "text")]
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A post as seen by one particular viewer.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: PostId,
    pub user_id: UserId,
    pub username: String,
    pub content: Option<String>,
    pub media_url: Option<String>,
    pub media_type: Option<MediaKind>,
    pub likes_count: usize,
    pub is_liked: bool,
    pub comments_count: usize,
    pub comments: Vec<CommentView>,
    pub shares: u64,
    pub created_at: DateTime<Utc>,
}

impl PostView {
    pub fn media(&self) -> Option<Media> {
        match (&self.media_url, self.media_type) {
            (Some(url), Some(kind)) => Some(Media { url: url.clone(), kind }),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct CommentRequest {
    #[serde(default, alias = "comment")]
    pub text: String,
}
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub liked: bool,
    pub likes_count: usize,
}
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct ShareResponse {
    pub shares: u64,
}

/// Names the new friend either by email, as the browser client does, or by id.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AddFriendRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friend_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friend_id: Option<UserId>,
}
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFriendResponse {
    pub message: String,
    pub friend_count: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub user: PublicUser,
    pub friend_count: usize,
    pub posts_today: usize,
    pub max_posts: MaxPosts,
    pub can_post: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = PostId(String::from("p1"));
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"p1\"");
    }

    #[test]
    fn views_use_camel_case_fields() {
        let info = UserInfo {
            user: PublicUser::default(),
            friend_count: 3,
            posts_today: 1,
            max_posts: MaxPosts::Limited(2),
            can_post: true,
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["friendCount"], 3);
        assert_eq!(json["postsToday"], 1);
        assert_eq!(json["maxPosts"], 2);
        assert_eq!(json["canPost"], true);
    }

    #[test]
    fn media_kind_is_lowercase_type_field() {
        let media = Media { url: String::from("/uploads/a.mp4"), kind: MediaKind::Video };
        let json = serde_json::to_value(&media).unwrap();
        assert_eq!(json["type"], "video");
    }

    #[test]
    fn browser_client_field_names() {
        let request: CommentRequest = serde_json::from_str(r#"{"comment":"nice"}"#).unwrap();
        assert_eq!(request.text, "nice");
        let request: AddFriendRequest = serde_json::from_str(r#"{"friendEmail":"lyuma@example.com"}"#).unwrap();
        assert_eq!(request.friend_email.as_deref(), Some("lyuma@example.com"));
        assert_eq!(request.friend_id, None);

        let post = PostView {
            id: PostId(String::from("p1")),
            user_id: UserId(String::from("u1")),
            username: String::from("malek"),
            content: None,
            media_url: Some(String::from("/uploads/a.png")),
            media_type: Some(MediaKind::Image),
            likes_count: 0,
            is_liked: false,
            comments_count: 1,
            comments: vec![CommentView {
                id: CommentId(String::from("c1")),
                user_id: UserId(String::from("u2")),
                username: String::from("lyuma"),
                text: String::from("cute"),
                created_at: Utc::now(),
            }],
            shares: 0,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["mediaUrl"], "/uploads/a.png");
        assert_eq!(json["mediaType"], "image");
        assert_eq!(json["comments"][0]["comment"], "cute");
        assert_eq!(post.media().map(|media| media.kind), Some(MediaKind::Image));
    }
}
