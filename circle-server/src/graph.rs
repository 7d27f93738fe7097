//! Users and the undirected friendship edges between them.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use circle_common::{FriendshipId, PublicUser, UserId};
use uuid::Uuid;

use crate::error::SocialError;

#[derive(Clone, Debug)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Friendship {
    pub id: FriendshipId,
    pub user1: UserId,
    pub user2: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct SocialGraph {
    users: HashMap<UserId, User>,
    by_email: HashMap<String, UserId>,
    friendships: Vec<Friendship>,
    // both directions of every edge
    adjacency: HashMap<UserId, HashSet<UserId>>,
}

impl SocialGraph {
    pub fn register(
        &mut self,
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<User, SocialError> {
        let email = email.into();
        if self.by_email.contains_key(&email) {
            return Err(SocialError::EmailTaken);
        }
        let user = User {
            id: UserId(Uuid::new_v4().to_string()),
            username: username.into(),
            email: email.clone(),
            password_hash: password_hash.into(),
            created_at: now,
        };
        self.by_email.insert(email, user.id.clone());
        self.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    pub fn user(&self, id: &UserId) -> Option<&User> {
        self.users.get(id)
    }

    pub fn user_by_email(&self, email: &str) -> Option<&User> {
        self.by_email.get(email).and_then(|id| self.users.get(id))
    }

    pub fn add_friendship(
        &mut self,
        user_a: &UserId,
        user_b: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Friendship, SocialError> {
        if user_a == user_b {
            return Err(SocialError::SelfFriendship);
        }
        if !self.users.contains_key(user_a) || !self.users.contains_key(user_b) {
            return Err(SocialError::UserNotFound);
        }
        if self.are_friends(user_a, user_b) {
            return Err(SocialError::AlreadyFriends);
        }
        self.adjacency.entry(user_a.clone()).or_default().insert(user_b.clone());
        self.adjacency.entry(user_b.clone()).or_default().insert(user_a.clone());
        let friendship = Friendship {
            id: FriendshipId(Uuid::new_v4().to_string()),
            user1: user_a.clone(),
            user2: user_b.clone(),
            created_at: now,
        };
        self.friendships.push(friendship.clone());
        Ok(friendship)
    }

    pub fn are_friends(&self, user_a: &UserId, user_b: &UserId) -> bool {
        self.adjacency
            .get(user_a)
            .map_or(false, |friends| friends.contains(user_b))
    }

    pub fn friend_count(&self, user: &UserId) -> usize {
        self.adjacency.get(user).map_or(0, HashSet::len)
    }

    /// Friends of `user`, oldest friendship first.
    pub fn friends(&self, user: &UserId) -> Vec<&User> {
        self.friendships
            .iter()
            .filter_map(|f| {
                if &f.user1 == user {
                    Some(&f.user2)
                } else if &f.user2 == user {
                    Some(&f.user1)
                } else {
                    None
                }
            })
            .filter_map(|id| self.users.get(id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with(names: &[&str]) -> (SocialGraph, Vec<UserId>) {
        let mut graph = SocialGraph::default();
        let ids = names
            .iter()
            .map(|name| {
                graph
                    .register(*name, format!("{name}@example.com"), "hash", Utc::now())
                    .unwrap()
                    .id
            })
            .collect();
        (graph, ids)
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let (mut graph, _) = graph_with(&["malek"]);
        let err = graph
            .register("other", "malek@example.com", "hash", Utc::now())
            .unwrap_err();
        assert_eq!(err, SocialError::EmailTaken);
        assert_eq!(graph.user_by_email("malek@example.com").unwrap().username, "malek");
    }

    #[test]
    fn friendship_counts_for_both_sides() {
        let (mut graph, ids) = graph_with(&["malek", "lyuma"]);
        graph.add_friendship(&ids[0], &ids[1], Utc::now()).unwrap();
        assert_eq!(graph.friend_count(&ids[0]), 1);
        assert_eq!(graph.friend_count(&ids[1]), 1);
        assert!(graph.are_friends(&ids[1], &ids[0]));
    }

    #[test]
    fn duplicate_friendship_in_either_direction() {
        let (mut graph, ids) = graph_with(&["malek", "lyuma"]);
        graph.add_friendship(&ids[0], &ids[1], Utc::now()).unwrap();
        assert_eq!(
            graph.add_friendship(&ids[0], &ids[1], Utc::now()).unwrap_err(),
            SocialError::AlreadyFriends
        );
        assert_eq!(
            graph.add_friendship(&ids[1], &ids[0], Utc::now()).unwrap_err(),
            SocialError::AlreadyFriends
        );
        assert_eq!(graph.friend_count(&ids[0]), 1);
    }

    #[test]
    fn self_and_unknown_users() {
        let (mut graph, ids) = graph_with(&["malek"]);
        assert_eq!(
            graph.add_friendship(&ids[0], &ids[0], Utc::now()).unwrap_err(),
            SocialError::SelfFriendship
        );
        let ghost = UserId(String::from("ghost"));
        assert_eq!(
            graph.add_friendship(&ids[0], &ghost, Utc::now()).unwrap_err(),
            SocialError::UserNotFound
        );
        assert_eq!(
            graph.add_friendship(&ghost, &ids[0], Utc::now()).unwrap_err(),
            SocialError::UserNotFound
        );
        assert_eq!(graph.friend_count(&ids[0]), 0);
    }

    #[test]
    fn friends_in_creation_order() {
        let (mut graph, ids) = graph_with(&["malek", "lyuma", "sam"]);
        graph.add_friendship(&ids[2], &ids[0], Utc::now()).unwrap();
        graph.add_friendship(&ids[0], &ids[1], Utc::now()).unwrap();
        let names: Vec<_> = graph.friends(&ids[0]).iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, ["sam", "lyuma"]);
        assert!(graph.friends(&ids[1]).iter().all(|u| u.id == ids[0]));
    }
}
