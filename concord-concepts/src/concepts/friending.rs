use super::{row, unknown_action, unknown_query};
use crate::store::Collection;
use async_trait::async_trait;
use concord_engine::{require_str, Concept, ConceptError, MethodRef, Outcome, Record};
use serde_json::json;

#[derive(Debug, Clone)]
struct Pending {
    requester: String,
    target: String,
}

/// Unordered pair; `a <= b`
#[derive(Debug, Clone)]
struct Friendship {
    a: String,
    b: String,
}

impl Friendship {
    fn new(x: &str, y: &str) -> Self {
        let (a, b) = if x <= y { (x, y) } else { (y, x) };
        Self {
            a: a.to_string(),
            b: b.to_string(),
        }
    }

    fn joins(&self, x: &str, y: &str) -> bool {
        let key = Friendship::new(x, y);
        self.a == key.a && self.b == key.b
    }

    fn other(&self, user: &str) -> Option<&str> {
        if self.a == user {
            Some(&self.b)
        } else if self.b == user {
            Some(&self.a)
        } else {
            None
        }
    }
}

/// Friend requests and mutual friendships
#[derive(Debug)]
pub struct Friending {
    pending: Collection<Pending>,
    friendships: Collection<Friendship>,
}

impl Friending {
    pub const SEND_REQUEST: MethodRef = MethodRef::of("Friending", "sendRequest");
    pub const ACCEPT_REQUEST: MethodRef = MethodRef::of("Friending", "acceptRequest");
    pub const REMOVE_FRIEND: MethodRef = MethodRef::of("Friending", "removeFriend");
    pub const GET_FRIENDS: MethodRef = MethodRef::of("Friending", "_getFriends");
    pub const ARE_FRIENDS: MethodRef = MethodRef::of("Friending", "_areFriends");

    pub fn new() -> Self {
        Self {
            pending: Collection::new("friend request"),
            friendships: Collection::new("friendship"),
        }
    }

    fn are_friends(&self, x: &str, y: &str) -> bool {
        self.friendships.find_one(|f| f.joins(x, y)).is_some()
    }

    fn send_request(&self, input: &Record) -> Result<Outcome, ConceptError> {
        let requester = require_str(input, "requester")?;
        let target = require_str(input, "target")?;
        if requester == target {
            return Ok(Outcome::error("cannot befriend yourself"));
        }
        if self.are_friends(requester, target) {
            return Ok(Outcome::error("already friends"));
        }
        let duplicate = self.pending.find_one(|p| {
            (p.requester == requester && p.target == target)
                || (p.requester == target && p.target == requester)
        });
        if duplicate.is_some() {
            return Ok(Outcome::error("a friend request is already pending"));
        }
        let pending = Pending {
            requester: requester.to_string(),
            target: target.to_string(),
        };
        if let Err(err) = self.pending.insert(Collection::<Pending>::fresh_id(), pending) {
            return Ok(err.into());
        }
        Ok(Outcome::empty())
    }

    fn accept_request(&self, input: &Record) -> Result<Outcome, ConceptError> {
        let requester = require_str(input, "requester")?;
        let target = require_str(input, "target")?;
        let accepted = self
            .pending
            .delete_where(|p| p.requester == requester && p.target == target);
        if accepted == 0 {
            return Ok(Outcome::error("no pending friend request"));
        }
        let friendship = Friendship::new(requester, target);
        if let Err(err) = self
            .friendships
            .insert(Collection::<Friendship>::fresh_id(), friendship)
        {
            return Ok(err.into());
        }
        Ok(Outcome::empty())
    }

    fn remove_friend(&self, input: &Record) -> Result<Outcome, ConceptError> {
        let user = require_str(input, "user")?;
        let friend = require_str(input, "friend")?;
        if self.friendships.delete_where(|f| f.joins(user, friend)) == 0 {
            return Ok(Outcome::error("not friends"));
        }
        Ok(Outcome::empty())
    }
}

impl Default for Friending {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Concept for Friending {
    fn name(&self) -> &str {
        "Friending"
    }

    fn actions(&self) -> &[&'static str] {
        &["sendRequest", "acceptRequest", "removeFriend"]
    }

    fn queries(&self) -> &[&'static str] {
        &["_getFriends", "_areFriends"]
    }

    async fn perform(&self, action: &str, input: Record) -> Result<Outcome, ConceptError> {
        match action {
            "sendRequest" => self.send_request(&input),
            "acceptRequest" => self.accept_request(&input),
            "removeFriend" => self.remove_friend(&input),
            other => Err(unknown_action(self.name(), other)),
        }
    }

    async fn query(&self, query: &str, input: Record) -> Result<Vec<Record>, ConceptError> {
        match query {
            "_getFriends" => {
                let user = require_str(&input, "user")?;
                Ok(self
                    .friendships
                    .find(|f| f.other(user).is_some())
                    .into_iter()
                    .filter_map(|(_, f)| f.other(user).map(|friend| row([("friend", json!(friend))])))
                    .collect())
            }
            // existence check: one empty row or none
            "_areFriends" => {
                let user = require_str(&input, "user")?;
                let friend = require_str(&input, "friend")?;
                Ok(if self.are_friends(user, friend) {
                    vec![Record::new()]
                } else {
                    Vec::new()
                })
            }
            other => Err(unknown_query(self.name(), other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(requester: &str, target: &str) -> Record {
        row([("requester", json!(requester)), ("target", json!(target))])
    }

    fn friends_of(user: &str) -> Record {
        row([("user", json!(user))])
    }

    #[tokio::test]
    async fn test_request_accept_remove() {
        let friending = Friending::new();
        assert_eq!(
            friending.perform("sendRequest", pair("a", "b")).await.unwrap(),
            Outcome::empty()
        );
        assert!(friending
            .perform("sendRequest", pair("b", "a"))
            .await
            .unwrap()
            .is_error());
        friending.perform("acceptRequest", pair("a", "b")).await.unwrap();

        let rows = friending.query("_getFriends", friends_of("b")).await.unwrap();
        assert_eq!(rows, [row([("friend", json!("a"))])]);
        let check = row([("user", json!("b")), ("friend", json!("a"))]);
        assert_eq!(friending.query("_areFriends", check.clone()).await.unwrap().len(), 1);

        let removal = row([("user", json!("a")), ("friend", json!("b"))]);
        assert_eq!(
            friending.perform("removeFriend", removal).await.unwrap(),
            Outcome::empty()
        );
        assert!(friending.query("_areFriends", check).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_accept_without_request_fails() {
        let friending = Friending::new();
        let out = friending.perform("acceptRequest", pair("x", "y")).await.unwrap();
        assert_eq!(out, Outcome::error("no pending friend request"));
    }
}
