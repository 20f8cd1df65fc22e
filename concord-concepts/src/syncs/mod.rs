//! Sync rules wiring the reference concepts into a request/response API
//!
//! Every endpoint follows the same shape: a rule reacting to
//! `Requesting.request` on a path invokes the target action, and separate
//! rules join the request with that action's success or error completion
//! to answer through `Requesting.respond`.

mod auth;
mod friending;
mod posting;
mod wishlist;

use crate::concepts::{Requesting, Sessioning};
use concord_engine::{
    actions, pattern, ActionPattern, EngineError, Frames, MethodRef, Pattern, Queries, SyncRule,
    Var,
};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde_json::json;

/// Every sync rule the reference application registers
pub fn all() -> Vec<SyncRule> {
    let mut rules = Vec::new();
    rules.extend(auth::rules());
    rules.extend(posting::rules());
    rules.extend(wishlist::rules());
    rules.extend(friending::rules());
    rules
}

/// `Requesting.request` on `path` with the given body fields
pub(crate) fn on_request(path: &'static str, body: Pattern, request: &Var) -> ActionPattern {
    let input = body.field("path", path);
    ActionPattern::new(Requesting::REQUEST, input).output(pattern! { "request" => request })
}

/// Answer a request with the error of `method` on `path`
pub(crate) fn error_response(name: &str, path: &'static str, method: MethodRef) -> SyncRule {
    let [request, error] = Var::many(["request", "error"]);
    SyncRule::new(name)
        .when(actions([
            on_request(path, pattern! {}, &request),
            ActionPattern::new(method, pattern! {}).output(pattern! { "error" => &error }),
        ]))
        .then(actions([(
            Requesting::RESPOND,
            pattern! { "request" => &request, "error" => &error },
        )]))
}

/// Answer a request whose session does not resolve to a user
pub(crate) fn invalid_session(name: &str, path: &'static str) -> SyncRule {
    let [request, session] = Var::many(["request", "session"]);
    let lookup = session.clone();
    SyncRule::new(name)
        .when(actions([on_request(
            path,
            pattern! { "session" => &session },
            &request,
        )]))
        .where_(move |frames: Frames, queries: Queries| {
            let session = lookup.clone();
            async move {
                absent(
                    frames,
                    &queries,
                    &Sessioning::GET_USER,
                    &pattern! { "session" => &session },
                    &pattern! {},
                )
                .await
            }
        })
        .then(actions([(
            Requesting::RESPOND,
            pattern! { "request" => &request, "error" => "invalid session" },
        )]))
}

/// Bind `user` from `session` through `Sessioning._getUser`
pub(crate) async fn session_user(
    frames: Frames,
    queries: &Queries,
    session: &Var,
    user: &Var,
) -> Result<Frames, EngineError> {
    frames
        .query(
            queries,
            &Sessioning::GET_USER,
            &pattern! { "session" => session },
            &pattern! { "user" => user },
        )
        .await
}

/// A `where` stage that only resolves `session` to `user`
pub(crate) fn resolve_user(
    session: &Var,
    user: &Var,
) -> impl Fn(Frames, Queries) -> BoxFuture<'static, Result<Frames, EngineError>> + Send + Sync + 'static
{
    let vars = (session.clone(), user.clone());
    move |frames: Frames, queries: Queries| {
        let (session, user) = vars.clone();
        async move { session_user(frames, &queries, &session, &user).await }.boxed()
    }
}

/// Keep only the frames for which a query finds nothing
pub(crate) async fn absent(
    frames: Frames,
    queries: &Queries,
    method: &MethodRef,
    input: &Pattern,
    output: &Pattern,
) -> Result<Frames, EngineError> {
    let mut kept = Frames::new();
    for frame in frames {
        let found = Frames::singleton(frame.clone())
            .query(queries, method, input, output)
            .await?;
        if found.is_empty() {
            kept.push(frame);
        }
    }
    Ok(kept)
}

/// Fold `found` into one `results` array per request, or answer `[]`
///
/// `original` are the frames before the query that produced `found`; when
/// it produced nothing they are kept and given an empty array, so the
/// request is still answered exactly once.
pub(crate) fn collect_or_empty(
    original: Frames,
    found: Frames,
    vars: &[Var],
    results: &Var,
) -> Frames {
    if found.is_empty() {
        original.bind_all(results, json!([]))
    } else {
        found.collect_as(vars, results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concord_engine::Catalog;
    use std::collections::HashSet;

    #[test]
    fn test_rules_have_unique_names() {
        let rules = all();
        let names: HashSet<_> = rules.iter().map(|rule| rule.name()).collect();
        assert_eq!(names.len(), rules.len());
    }

    #[test]
    fn test_rules_validate_against_concepts() {
        let concepts = crate::Concepts::new();
        let catalog = concepts.register(Catalog::builder()).syncs(all()).build();
        assert!(catalog.is_ok(), "{:?}", catalog.err());
    }

    #[test]
    fn test_collect_or_empty_falls_back() {
        let [request, results] = Var::many(["request", "results"]);
        let original: Frames = [concord_engine::Frame::new()
            .with(request.clone(), json!("r1"))
            .unwrap()]
        .into_iter()
        .collect();

        let frames = collect_or_empty(original, Frames::new(), &[], &results);
        assert_eq!(frames.len(), 1);
        let frame = frames.iter().next().unwrap();
        assert_eq!(frame.get(&results), Some(&json!([])));
        assert_eq!(frame.get(&request), Some(&json!("r1")));
    }
}
