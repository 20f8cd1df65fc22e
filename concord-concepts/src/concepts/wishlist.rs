use super::{row, unknown_action, unknown_query};
use crate::store::Collection;
use async_trait::async_trait;
use concord_engine::{require_str, Concept, ConceptError, MethodRef, Outcome, Record};
use serde_json::json;

#[derive(Debug, Clone)]
struct Entry {
    user: String,
    place: String,
}

/// Places a user wants to visit
#[derive(Debug)]
pub struct Wishlist {
    entries: Collection<Entry>,
}

impl Wishlist {
    pub const ADD_PLACE: MethodRef = MethodRef::of("Wishlist", "addPlace");
    pub const REMOVE_PLACE: MethodRef = MethodRef::of("Wishlist", "removePlace");
    pub const GET_PLACES: MethodRef = MethodRef::of("Wishlist", "_getPlaces");

    pub fn new() -> Self {
        Self {
            entries: Collection::new("wishlist entry"),
        }
    }

    fn add_place(&self, input: &Record) -> Result<Outcome, ConceptError> {
        let user = require_str(input, "user")?;
        let place = require_str(input, "place")?;
        if self
            .entries
            .find_one(|e| e.user == user && e.place == place)
            .is_some()
        {
            return Ok(Outcome::error(format!("{place} is already in the wishlist")));
        }
        let entry = Entry {
            user: user.to_string(),
            place: place.to_string(),
        };
        if let Err(err) = self.entries.insert(Collection::<Entry>::fresh_id(), entry) {
            return Ok(err.into());
        }
        Ok(Outcome::with("place", place))
    }

    fn remove_place(&self, input: &Record) -> Result<Outcome, ConceptError> {
        let user = require_str(input, "user")?;
        let place = require_str(input, "place")?;
        let removed = self
            .entries
            .delete_where(|e| e.user == user && e.place == place);
        if removed == 0 {
            return Ok(Outcome::error(format!("{place} is not in the wishlist")));
        }
        Ok(Outcome::empty())
    }
}

impl Default for Wishlist {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Concept for Wishlist {
    fn name(&self) -> &str {
        "Wishlist"
    }

    fn actions(&self) -> &[&'static str] {
        &["addPlace", "removePlace"]
    }

    fn queries(&self) -> &[&'static str] {
        &["_getPlaces"]
    }

    async fn perform(&self, action: &str, input: Record) -> Result<Outcome, ConceptError> {
        match action {
            "addPlace" => self.add_place(&input),
            "removePlace" => self.remove_place(&input),
            other => Err(unknown_action(self.name(), other)),
        }
    }

    async fn query(&self, query: &str, input: Record) -> Result<Vec<Record>, ConceptError> {
        match query {
            "_getPlaces" => {
                let user = require_str(&input, "user")?;
                Ok(self
                    .entries
                    .find(|e| e.user == user)
                    .into_iter()
                    .map(|(_, e)| row([("place", json!(e.place))]))
                    .collect())
            }
            other => Err(unknown_query(self.name(), other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(user: &str, place: &str) -> Record {
        row([("user", json!(user)), ("place", json!(place))])
    }

    #[tokio::test]
    async fn test_add_remove_and_list() {
        let wishlist = Wishlist::new();
        assert_eq!(
            wishlist.perform("addPlace", entry("u", "Kyoto")).await.unwrap(),
            Outcome::with("place", "Kyoto")
        );
        assert!(wishlist
            .perform("addPlace", entry("u", "Kyoto"))
            .await
            .unwrap()
            .is_error());

        let places = wishlist
            .query("_getPlaces", row([("user", json!("u"))]))
            .await
            .unwrap();
        assert_eq!(places, [row([("place", json!("Kyoto"))])]);

        wishlist.perform("removePlace", entry("u", "Kyoto")).await.unwrap();
        let places = wishlist
            .query("_getPlaces", row([("user", json!("u"))]))
            .await
            .unwrap();
        assert!(places.is_empty());
    }
}
