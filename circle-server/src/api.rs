use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::Utc;
use circle_common::{
    AddFriendRequest, AddFriendResponse, AuthResponse, CommentRequest, LoginRequest, PostId, PublicUser,
    RegisterRequest, ShareResponse, UserInfo,
};
use tracing::{info, warn};

use crate::auth::{hash_password, verify_password, AuthError, AuthUser};
use crate::error::{Result, SocialError};
use crate::extract::{Json as JsonBody, Multipart, Path};
use crate::media::Upload;
use crate::State;

pub async fn register(
    Extension(state): Extension<State>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<impl IntoResponse> {
    let username = payload.username.trim().to_string();
    let email = payload.email.trim().to_string();
    if username.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(AuthError::MissingFields("All fields are required").into());
    }
    let password = payload.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password)).await??;
    let user = state
        .write(|store| store.graph.register(username, email, password_hash, Utc::now()))
        .await?
        .public();
    let token = state.keys.issue(&user)?;
    info!(user = %user.id, username = %user.username, "registered");
    Ok(Json(AuthResponse {
        message: String::from("Registration successful"),
        token,
        user,
    }))
}

pub async fn login(
    Extension(state): Extension<State>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse> {
    let email = payload.email.trim().to_string();
    if email.is_empty() || payload.password.is_empty() {
        return Err(AuthError::MissingFields("Email and password are required").into());
    }
    let (user, password_hash) = state
        .read(|store| {
            store
                .graph
                .user_by_email(&email)
                .map(|user| (user.public(), user.password_hash.clone()))
        })
        .await
        .ok_or(AuthError::InvalidCredentials)?;
    let password = payload.password;
    tokio::task::spawn_blocking(move || verify_password(&password, &password_hash)).await??;
    let token = state.keys.issue(&user)?;
    info!(user = %user.id, "logged in");
    Ok(Json(AuthResponse {
        message: String::from("Login successful"),
        token,
        user,
    }))
}

pub async fn create_post(
    Extension(state): Extension<State>,
    AuthUser(user): AuthUser,
    Multipart(mut multipart): Multipart,
) -> Result<impl IntoResponse> {
    let mut content = None;
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "content" => content = Some(field.text().await?),
            "media" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(String::from);
                let bytes = field.bytes().await?;
                if !bytes.is_empty() {
                    upload = Some(Upload {
                        file_name,
                        content_type,
                        bytes,
                    });
                }
            }
            _ => {}
        }
    }

    let media = match upload {
        Some(upload) => Some(state.media.store(upload).await?),
        None => None,
    };
    let created = state
        .write(|store| store.create_post(&user, content, media.clone(), Utc::now()))
        .await;
    match created {
        Ok(post) => {
            info!(user = %user.id, post = %post.id, "post created");
            Ok((StatusCode::CREATED, Json(post)))
        }
        Err(err) => {
            if let Some(media) = &media {
                if let Err(e) = state.media.discard(media).await {
                    warn!(url = %media.url, "Error discarding media of a refused post: {e}");
                }
            }
            Err(err.into())
        }
    }
}

pub async fn list_posts(Extension(state): Extension<State>, AuthUser(user): AuthUser) -> Result<impl IntoResponse> {
    Ok(Json(state.read(|store| store.list_posts(&user.id)).await))
}

pub async fn toggle_like(
    Extension(state): Extension<State>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = PostId(id);
    let like = state.write(|store| store.toggle_like(&id, &user.id)).await?;
    info!(user = %user.id, post = %id, liked = like.liked, "like toggled");
    Ok(Json(like))
}

pub async fn add_comment(
    Extension(state): Extension<State>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<CommentRequest>,
) -> Result<impl IntoResponse> {
    let id = PostId(id);
    let comment = state
        .write(|store| store.add_comment(&id, &user, &payload.text, Utc::now()))
        .await?;
    info!(user = %user.id, post = %id, "comment added");
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn share_post(
    Extension(state): Extension<State>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = PostId(id);
    let shares = state.write(|store| store.share_post(&id)).await?;
    info!(user = %user.id, post = %id, shares, "post shared");
    Ok(Json(ShareResponse { shares }))
}

pub async fn add_friend(
    Extension(state): Extension<State>,
    AuthUser(user): AuthUser,
    JsonBody(payload): JsonBody<AddFriendRequest>,
) -> Result<impl IntoResponse> {
    let email = payload.friend_email.as_deref().map(str::trim).filter(|email| !email.is_empty());
    let (friend, friend_count) = state
        .write(|store| {
            let friend = match (email, &payload.friend_id) {
                (Some(email), _) => {
                    let friend = store.graph.user_by_email(email).ok_or(SocialError::UserNotFound)?;
                    friend.id.clone()
                }
                (None, Some(id)) => id.clone(),
                (None, None) => return Err(SocialError::MissingFriend),
            };
            store.graph.add_friendship(&user.id, &friend, Utc::now())?;
            Ok::<_, SocialError>((friend, store.graph.friend_count(&user.id)))
        })
        .await?;
    info!(user = %user.id, friend = %friend, friend_count, "friend added");
    Ok(Json(AddFriendResponse {
        message: String::from("Friend added successfully"),
        friend_count,
    }))
}

pub async fn friends(Extension(state): Extension<State>, AuthUser(user): AuthUser) -> Result<impl IntoResponse> {
    let friends: Vec<PublicUser> = state
        .read(|store| store.graph.friends(&user.id).into_iter().map(|f| f.public()).collect())
        .await;
    Ok(Json(friends))
}

pub async fn user_info(Extension(state): Extension<State>, AuthUser(user): AuthUser) -> Result<impl IntoResponse> {
    let stats = state
        .read(|store| store.user_stats(&user.id, Utc::now().date_naive()))
        .await;
    Ok(Json(UserInfo {
        user,
        friend_count: stats.friend_count,
        posts_today: stats.posts_today,
        max_posts: stats.max_posts,
        can_post: stats.can_post,
    }))
}
