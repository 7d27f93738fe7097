//! Daily posting allowance, derived from how many friends a user has.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const UNLIMITED: &str = "unlimited";

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MaxPosts {
    Limited(usize),
    Unlimited,
}

impl MaxPosts {
    /// 0 friends: 0, 1 friend: 1, 2-9 friends: 2, 10 or more: no limit.
    pub fn for_friend_count(friend_count: usize) -> Self {
        match friend_count {
            0 => MaxPosts::Limited(0),
            1 => MaxPosts::Limited(1),
            2..=9 => MaxPosts::Limited(2),
            _ => MaxPosts::Unlimited,
        }
    }

    pub fn allows(&self, posts_today: usize) -> bool {
        match self {
            MaxPosts::Limited(max) => posts_today < *max,
            MaxPosts::Unlimited => true,
        }
    }
}

impl Serialize for MaxPosts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MaxPosts::Limited(max) => serializer.serialize_u64(*max as u64),
            MaxPosts::Unlimited => serializer.serialize_str(UNLIMITED),
        }
    }
}

impl<'de> Deserialize<'de> for MaxPosts {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Count(usize),
            Word(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Count(max) => Ok(MaxPosts::Limited(max)),
            Raw::Word(word) if word == UNLIMITED => Ok(MaxPosts::Unlimited),
            Raw::Word(word) => Err(serde::de::Error::custom(format!(
                "expected a post count or \"{UNLIMITED}\", got \"{word}\""
            ))),
        }
    }
}
