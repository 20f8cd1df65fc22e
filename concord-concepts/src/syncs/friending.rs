//! Friend requests and friend lists

use super::{
    collect_or_empty, error_response, invalid_session, on_request, resolve_user, session_user,
};
use crate::concepts::{Friending, Requesting};
use concord_engine::{actions, pattern, Frames, Queries, SyncRule, Var};

const SEND: &str = "/Friending/sendRequest";
const ACCEPT: &str = "/Friending/acceptRequest";
const REMOVE: &str = "/Friending/removeFriend";
const LIST: &str = "/Friending/_getFriends";

pub(super) fn rules() -> Vec<SyncRule> {
    vec![
        send_request(),
        error_response("SendFriendRequestError", SEND, Friending::SEND_REQUEST),
        invalid_session("SendFriendRequestInvalidSession", SEND),
        accept_request(),
        error_response("AcceptFriendRequestError", ACCEPT, Friending::ACCEPT_REQUEST),
        invalid_session("AcceptFriendRequestInvalidSession", ACCEPT),
        remove_friend(),
        error_response("RemoveFriendError", REMOVE, Friending::REMOVE_FRIEND),
        invalid_session("RemoveFriendInvalidSession", REMOVE),
        get_friends(),
        invalid_session("GetFriendsInvalidSession", LIST),
    ]
}

fn send_request() -> SyncRule {
    let [request, session, target, user] = Var::many(["request", "session", "target", "user"]);
    SyncRule::new("SendFriendRequest")
        .when(actions([on_request(
            SEND,
            pattern! { "session" => &session, "target" => &target },
            &request,
        )]))
        .where_(resolve_user(&session, &user))
        .binds([&user])
        .then(actions([
            (
                Friending::SEND_REQUEST,
                pattern! { "requester" => &user, "target" => &target },
                pattern! {},
            ),
            (
                Requesting::RESPOND,
                pattern! { "request" => &request, "target" => &target },
                pattern! {},
            ),
        ]))
}

/// The session's user accepts a request sent to them
fn accept_request() -> SyncRule {
    let [request, session, requester, user] =
        Var::many(["request", "session", "requester", "user"]);
    SyncRule::new("AcceptFriendRequest")
        .when(actions([on_request(
            ACCEPT,
            pattern! { "session" => &session, "requester" => &requester },
            &request,
        )]))
        .where_(resolve_user(&session, &user))
        .binds([&user])
        .then(actions([
            (
                Friending::ACCEPT_REQUEST,
                pattern! { "requester" => &requester, "target" => &user },
                pattern! {},
            ),
            (
                Requesting::RESPOND,
                pattern! { "request" => &request, "friend" => &requester },
                pattern! {},
            ),
        ]))
}

fn remove_friend() -> SyncRule {
    let [request, session, friend, user] = Var::many(["request", "session", "friend", "user"]);
    SyncRule::new("RemoveFriend")
        .when(actions([on_request(
            REMOVE,
            pattern! { "session" => &session, "friend" => &friend },
            &request,
        )]))
        .where_(resolve_user(&session, &user))
        .binds([&user])
        .then(actions([
            (
                Friending::REMOVE_FRIEND,
                pattern! { "user" => &user, "friend" => &friend },
                pattern! {},
            ),
            (
                Requesting::RESPOND,
                pattern! { "request" => &request, "removed" => &friend },
                pattern! {},
            ),
        ]))
}

fn get_friends() -> SyncRule {
    let [request, session, user, friend, results] =
        Var::many(["request", "session", "user", "friend", "results"]);
    let vars = (session.clone(), user.clone(), friend.clone(), results.clone());
    SyncRule::new("GetFriendsRequest")
        .when(actions([on_request(
            LIST,
            pattern! { "session" => &session },
            &request,
        )]))
        .where_(move |frames: Frames, queries: Queries| {
            let (session, user, friend, results) = vars.clone();
            async move {
                let original = session_user(frames, &queries, &session, &user).await?;
                let found = original
                    .clone()
                    .query(
                        &queries,
                        &Friending::GET_FRIENDS,
                        &pattern! { "user" => &user },
                        &pattern! { "friend" => &friend },
                    )
                    .await?;
                Ok(collect_or_empty(original, found, &[friend], &results))
            }
        })
        .binds([&results])
        .then(actions([(
            Requesting::RESPOND,
            pattern! { "request" => &request, "results" => &results },
        )]))
}
