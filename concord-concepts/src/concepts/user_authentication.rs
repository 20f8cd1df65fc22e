use super::{row, unknown_action, unknown_query};
use crate::store::{Collection, StoreError};
use async_trait::async_trait;
use concord_engine::{require_str, Concept, ConceptError, MethodRef, Outcome, Record};
use serde_json::json;

#[derive(Debug, Clone)]
struct Credentials {
    username: String,
    salt: String,
    hash: String,
}

/// Username and password registration and checking
#[derive(Debug)]
pub struct UserAuthentication {
    users: Collection<Credentials>,
}

impl UserAuthentication {
    pub const REGISTER: MethodRef = MethodRef::of("UserAuthentication", "register");
    pub const AUTHENTICATE: MethodRef = MethodRef::of("UserAuthentication", "authenticate");
    pub const GET_USER_BY_USERNAME: MethodRef =
        MethodRef::of("UserAuthentication", "_getUserByUsername");
    pub const GET_USERNAME: MethodRef = MethodRef::of("UserAuthentication", "_getUsername");

    pub fn new() -> Self {
        Self {
            users: Collection::new("user"),
        }
    }

    fn register(&self, input: &Record) -> Result<Outcome, ConceptError> {
        let username = require_str(input, "username")?;
        let password = require_str(input, "password")?;
        if username.is_empty() {
            return Ok(Outcome::error("username must not be empty"));
        }
        if password.is_empty() {
            return Ok(Outcome::error("password must not be empty"));
        }
        let salt = Collection::<Credentials>::fresh_id();
        let credentials = Credentials {
            username: username.to_string(),
            hash: hash_password(&salt, password),
            salt,
        };
        let user = Collection::<Credentials>::fresh_id();
        match self
            .users
            .insert_unique(user.clone(), credentials, |c| c.username == username)
        {
            Ok(()) => {}
            Err(StoreError::Conflict(_)) => {
                return Ok(Outcome::error(format!("username {username} is already taken")))
            }
            Err(err) => return Ok(err.into()),
        }
        tracing::debug!(%user, username, "registered user");
        Ok(Outcome::with("user", user))
    }

    fn authenticate(&self, input: &Record) -> Result<Outcome, ConceptError> {
        let username = require_str(input, "username")?;
        let password = require_str(input, "password")?;
        let valid = self
            .users
            .find_one(|c| c.username == username)
            .is_some_and(|(_, c)| hash_password(&c.salt, password) == c.hash);
        if valid {
            Ok(Outcome::empty())
        } else {
            Ok(Outcome::error("invalid username or password"))
        }
    }
}

impl Default for UserAuthentication {
    fn default() -> Self {
        Self::new()
    }
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hasher.finalize().to_hex().to_string()
}

#[async_trait]
impl Concept for UserAuthentication {
    fn name(&self) -> &str {
        "UserAuthentication"
    }

    fn actions(&self) -> &[&'static str] {
        &["register", "authenticate"]
    }

    fn queries(&self) -> &[&'static str] {
        &["_getUserByUsername", "_getUsername"]
    }

    async fn perform(&self, action: &str, input: Record) -> Result<Outcome, ConceptError> {
        match action {
            "register" => self.register(&input),
            "authenticate" => self.authenticate(&input),
            other => Err(unknown_action(self.name(), other)),
        }
    }

    async fn query(&self, query: &str, input: Record) -> Result<Vec<Record>, ConceptError> {
        match query {
            "_getUserByUsername" => {
                let username = require_str(&input, "username")?;
                Ok(self
                    .users
                    .find(|c| c.username == username)
                    .into_iter()
                    .map(|(user, _)| row([("user", json!(user))]))
                    .collect())
            }
            "_getUsername" => {
                let user = require_str(&input, "user")?;
                Ok(self
                    .users
                    .get(user)
                    .map(|c| row([("username", json!(c.username))]))
                    .into_iter()
                    .collect())
            }
            other => Err(unknown_query(self.name(), other)),
        }
    }
}
