use super::{row, unknown_action, unknown_query};
use crate::store::Collection;
use async_trait::async_trait;
use concord_engine::{require_str, Concept, ConceptError, MethodRef, Outcome, Record, Value};
use serde_json::json;

#[derive(Debug, Clone)]
struct Pending {
    input: Record,
    response: Option<Record>,
}

/// The boundary between the transport and the syncs
///
/// `request` turns an inbound call into a completion carrying its `path`
/// and body; syncs answer with `respond`. A transport may pick the request
/// id itself by passing `request`, otherwise a fresh one is generated. The transport collects the answer
/// with [`Requesting::take_response`].
#[derive(Debug)]
pub struct Requesting {
    requests: Collection<Pending>,
}

impl Requesting {
    pub const REQUEST: MethodRef = MethodRef::of("Requesting", "request");
    pub const RESPOND: MethodRef = MethodRef::of("Requesting", "respond");
    pub const GET_RESPONSE: MethodRef = MethodRef::of("Requesting", "_getResponse");

    pub fn new() -> Self {
        Self {
            requests: Collection::new("request"),
        }
    }

    /// Remove a finished request, returning its response if one was sent
    pub fn take_response(&self, request: &str) -> Option<Record> {
        self.requests.delete(request).ok()?.response
    }

    /// Requests still waiting for a transport to collect them
    pub fn pending(&self) -> usize {
        self.requests.len()
    }

    fn request(&self, input: Record) -> Result<Outcome, ConceptError> {
        require_str(&input, "path")?;
        let request = match input.get("request") {
            Some(_) => require_str(&input, "request")?.to_string(),
            None => Collection::<Pending>::fresh_id(),
        };
        let pending = Pending {
            input,
            response: None,
        };
        if let Err(err) = self.requests.insert(request.clone(), pending) {
            return Ok(err.into());
        }
        Ok(Outcome::with("request", request))
    }

    fn respond(&self, mut input: Record) -> Result<Outcome, ConceptError> {
        let request = match input.remove("request") {
            Some(Value::String(id)) => id,
            Some(_) => {
                return Err(ConceptError::InvalidField {
                    field: "request".into(),
                    expected: "a string",
                })
            }
            None => return Err(ConceptError::MissingField("request".into())),
        };

        let mut answered = false;
        let updated = self.requests.update(&request, |pending| {
            answered = pending.response.is_some();
            if !answered {
                pending.response = Some(input);
            }
        });
        Ok(match updated {
            Ok(_) if answered => Outcome::error(format!("request {request} was already answered")),
            Ok(pending) => {
                tracing::debug!(
                    %request,
                    path = ?pending.input.get("path"),
                    "responded"
                );
                Outcome::with("request", request)
            }
            Err(err) => err.into(),
        })
    }
}

impl Default for Requesting {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Concept for Requesting {
    fn name(&self) -> &str {
        "Requesting"
    }

    fn actions(&self) -> &[&'static str] {
        &["request", "respond"]
    }

    fn queries(&self) -> &[&'static str] {
        &["_getResponse"]
    }

    async fn perform(&self, action: &str, input: Record) -> Result<Outcome, ConceptError> {
        match action {
            "request" => self.request(input),
            "respond" => self.respond(input),
            other => Err(unknown_action(self.name(), other)),
        }
    }

    async fn query(&self, query: &str, input: Record) -> Result<Vec<Record>, ConceptError> {
        match query {
            "_getResponse" => {
                let request = require_str(&input, "request")?;
                Ok(self
                    .requests
                    .get(request)
                    .and_then(|pending| pending.response)
                    .map(|response| row([("response", Value::Object(response))]))
                    .into_iter()
                    .collect())
            }
            other => Err(unknown_query(self.name(), other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_request_respond_take() {
        let requesting = Requesting::new();
        let out = requesting
            .perform("request", row([("path", json!("/ping"))]))
            .await
            .unwrap()
            .to_record();
        let request = out["request"].as_str().unwrap().to_string();

        let answer = row([("request", json!(request)), ("pong", json!(true))]);
        requesting.perform("respond", answer.clone()).await.unwrap();
        assert!(requesting
            .perform("respond", answer)
            .await
            .unwrap()
            .is_error());

        let rows = requesting
            .query("_getResponse", row([("request", json!(request))]))
            .await
            .unwrap();
        assert_eq!(rows, [row([("response", json!({ "pong": true }))])]);

        assert_eq!(requesting.take_response(&request), Some(row([("pong", json!(true))])));
        assert_eq!(requesting.pending(), 0);
        assert_eq!(requesting.take_response(&request), None);
    }

    #[tokio::test]
    async fn test_request_accepts_transport_id() {
        let requesting = Requesting::new();
        let input = row([("path", json!("/ping")), ("request", json!("r-1"))]);
        let out = requesting.perform("request", input.clone()).await.unwrap();
        assert_eq!(out.to_record(), row([("request", json!("r-1"))]));
        assert!(requesting.perform("request", input).await.unwrap().is_error());

        assert_eq!(requesting.take_response("r-1"), None);
        assert_eq!(requesting.pending(), 0);
    }

    #[tokio::test]
    async fn test_request_requires_path() {
        let requesting = Requesting::new();
        let err = requesting.perform("request", Record::new()).await.unwrap_err();
        assert_eq!(err, ConceptError::MissingField("path".into()));
    }
}
