use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use circle_common::ErrorBody;
use thiserror::Error;
use tracing::error;

use crate::auth::AuthError;
use crate::media::MediaError;

pub type Result<T> = std::result::Result<T, AppError>;

/// Rule violations raised by the social graph and the post engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SocialError {
    #[error("User not found")]
    UserNotFound,
    #[error("You cannot add yourself as a friend")]
    SelfFriendship,
    #[error("You are already friends")]
    AlreadyFriends,
    #[error("User already exists")]
    EmailTaken,
    #[error("Post must have text content or media")]
    EmptyPost,
    #[error("Daily post limit reached. You have {friend_count} friends and have already posted {posts_today} times today.")]
    QuotaExceeded { friend_count: usize, posts_today: usize },
    #[error("Post not found")]
    PostNotFound,
    #[error("Comment text is required")]
    EmptyComment,
    #[error("Friend email is required")]
    MissingFriend,
}

impl SocialError {
    pub fn status(&self) -> StatusCode {
        match self {
            SocialError::UserNotFound | SocialError::PostNotFound => StatusCode::NOT_FOUND,
            SocialError::QuotaExceeded { .. } => StatusCode::FORBIDDEN,
            SocialError::SelfFriendship
            | SocialError::AlreadyFriends
            | SocialError::EmailTaken
            | SocialError::EmptyPost
            | SocialError::EmptyComment
            | SocialError::MissingFriend => StatusCode::BAD_REQUEST,
        }
    }
}

pub struct AppError(anyhow::Error);

impl AppError {
    pub fn status(&self) -> StatusCode {
        if let Some(err) = self.0.downcast_ref::<SocialError>() {
            return err.status();
        }
        if let Some(err) = self.0.downcast_ref::<AuthError>() {
            return err.status();
        }
        if let Some(err) = self.0.downcast_ref::<MediaError>() {
            return err.status();
        }
        if self.0.is::<MultipartError>()
            || self.0.is::<JsonRejection>()
            || self.0.is::<PathRejection>()
            || self.0.is::<MultipartRejection>()
        {
            return StatusCode::BAD_REQUEST;
        }
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

// Tell axum how to convert `AppError` into a response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!("Request failed: {:#}", self.0);
            String::from("Something went wrong!")
        } else {
            self.0.to_string()
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

// This enables using `?` on anything that converts into `anyhow::Error`, the status is recovered
// from the concrete error type when the response is built.
impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, HttpBody};
    use axum::extract::FromRequest;
    use axum::http::Request;
    use circle_common::AddFriendRequest;

    use super::*;
    use crate::extract::Json as JsonBody;

    async fn error_body(response: Response) -> serde_json::Value {
        let mut body = response.into_body();
        let bytes = body.data().await.unwrap().unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn extract_friend_request(content_type: Option<&str>, body: &'static str) -> AppError {
        let mut request = Request::builder().method("POST").uri("/api/friends/add");
        if let Some(content_type) = content_type {
            request = request.header("content-type", content_type);
        }
        let request = request.body(Body::from(body)).unwrap();
        match JsonBody::<AddFriendRequest>::from_request(request, &()).await {
            Ok(_) => panic!("malformed body was accepted"),
            Err(err) => err,
        }
    }

    #[test]
    fn quota_message_names_both_counts() {
        let err = SocialError::QuotaExceeded { friend_count: 2, posts_today: 2 };
        let message = err.to_string();
        assert!(message.contains("2 friends"));
        assert!(message.contains("posted 2 times"));
    }

    #[test]
    fn statuses_follow_the_error_kind() {
        assert_eq!(AppError::from(SocialError::PostNotFound).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::from(SocialError::UserNotFound).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::from(SocialError::QuotaExceeded { friend_count: 0, posts_today: 0 }).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(AppError::from(SocialError::AlreadyFriends).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::from(AuthError::MissingToken).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::from(AuthError::InvalidToken).status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::from(anyhow::anyhow!("disk on fire")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn rejected_bodies_answer_with_json_errors() {
        for (content_type, body) in [
            (None, r#"{"friendEmail":"lyuma@example.com"}"#),
            (Some("application/json"), "{not json"),
            (Some("application/json"), r#"{"friendEmail":42}"#),
        ] {
            let err = extract_friend_request(content_type, body).await;
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let json = error_body(response).await;
            assert!(json["error"].as_str().map_or(false, |message| !message.is_empty()));
        }
    }

    #[tokio::test]
    async fn server_errors_hide_their_cause() {
        let response = AppError::from(anyhow::anyhow!("disk on fire")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error_body(response).await["error"], "Something went wrong!");
    }
}
