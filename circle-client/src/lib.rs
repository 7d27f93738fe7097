use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use circle_common::{AuthResponse, ErrorBody};
use thiserror::Error;


/// A non-success answer from the server, with the message from its `{ "error": ... }` body.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{status}: {message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

/// Where the server lives and who we are on it.
#[derive(Clone, Debug)]
pub struct Session {
    pub base_url: String,
    pub token: String,
}

impl Session {
    pub fn new(base_url: impl Into<String>, auth: &AuthResponse) -> Self {
        Self {
            base_url: base_url.into(),
            token: auth.token.clone(),
        }
    }
    fn url(&self, path: &str) -> String {
        url(&self.base_url, path)
    }
}

/// A file to attach to a new post.
#[derive(Clone, Debug)]
pub struct MediaFile {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

fn url(base_url: &str, path: &str) -> String {
    String::from(base_url.trim_end_matches('/')) + "/api" + path
}

async fn read<T: DeserializeOwned>(response: Response) -> anyhow::Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => String::from(status.canonical_reason().unwrap_or("Unknown error")),
    };
    Err(ApiError { status, message }.into())
}

/// The `ApiError` inside `err`, if that is what it is.
pub fn api_error(err: &anyhow::Error) -> Option<&ApiError> {
    err.downcast_ref::<ApiError>()
}

pub mod client {
    use reqwest::multipart::{Form, Part};
    use reqwest::Client;
    use circle_common::{
        AddFriendRequest, AddFriendResponse, AuthResponse, CommentRequest, CommentView, LikeResponse, LoginRequest,
        PostId, PostView, PublicUser, RegisterRequest, ShareResponse, UserId, UserInfo,
    };
    use anyhow::Result;
    use crate::{read, url, MediaFile, Session};

    pub async fn register(client: &Client, base_url: &str, username: &str, email: &str, password: &str) -> Result<AuthResponse> {
        read(client.post(url(base_url, "/register"))
            .json(&RegisterRequest {
                username: username.to_string(),
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?
        ).await
    }
    pub async fn login(client: &Client, base_url: &str, email: &str, password: &str) -> Result<AuthResponse> {
        read(client.post(url(base_url, "/login"))
            .json(&LoginRequest { email: email.to_string(), password: password.to_string() })
            .send()
            .await?
        ).await
    }
    pub async fn create_post(client: &Client, session: &Session, content: Option<&str>, media: Option<MediaFile>) -> Result<PostView> {
        let mut form = Form::new();
        if let Some(content) = content {
            form = form.text("content", content.to_string());
        }
        if let Some(media) = media {
            form = form.part("media", Part::bytes(media.bytes).file_name(media.file_name).mime_str(&media.mime)?);
        }
        read(client.post(session.url("/posts"))
            .bearer_auth(&session.token)
            .multipart(form)
            .send()
            .await?
        ).await
    }
    pub async fn list_posts(client: &Client, session: &Session) -> Result<Vec<PostView>> {
        read(client.get(session.url("/posts"))
            .bearer_auth(&session.token)
            .send()
            .await?
        ).await
    }
    pub async fn toggle_like(client: &Client, session: &Session, post: &PostId) -> Result<LikeResponse> {
        read(client.post(session.url(&format!("/posts/{}/like", post.0)))
            .bearer_auth(&session.token)
            .send()
            .await?
        ).await
    }
    pub async fn comment(client: &Client, session: &Session, post: &PostId, text: &str) -> Result<CommentView> {
        read(client.post(session.url(&format!("/posts/{}/comment", post.0)))
            .bearer_auth(&session.token)
            .json(&CommentRequest { text: text.to_string() })
            .send()
            .await?
        ).await
    }
    pub async fn share(client: &Client, session: &Session, post: &PostId) -> Result<ShareResponse> {
        read(client.post(session.url(&format!("/posts/{}/share", post.0)))
            .bearer_auth(&session.token)
            .send()
            .await?
        ).await
    }
    pub async fn add_friend(client: &Client, session: &Session, friend: &UserId) -> Result<AddFriendResponse> {
        read(client.post(session.url("/friends/add"))
            .bearer_auth(&session.token)
            .json(&AddFriendRequest { friend_id: Some(friend.clone()), ..Default::default() })
            .send()
            .await?
        ).await
    }
    pub async fn add_friend_by_email(client: &Client, session: &Session, email: &str) -> Result<AddFriendResponse> {
        read(client.post(session.url("/friends/add"))
            .bearer_auth(&session.token)
            .json(&AddFriendRequest { friend_email: Some(email.to_string()), ..Default::default() })
            .send()
            .await?
        ).await
    }
    pub async fn friends(client: &Client, session: &Session) -> Result<Vec<PublicUser>> {
        read(client.get(session.url("/friends"))
            .bearer_auth(&session.token)
            .send()
            .await?
        ).await
    }
    pub async fn user_info(client: &Client, session: &Session) -> Result<UserInfo> {
        read(client.get(session.url("/user/info"))
            .bearer_auth(&session.token)
            .send()
            .await?
        ).await
    }
}
