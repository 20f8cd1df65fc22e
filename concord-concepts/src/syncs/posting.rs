//! Creating, deleting and listing posts

use super::{
    absent, collect_or_empty, error_response, invalid_session, on_request, resolve_user,
    session_user,
};
use crate::concepts::{Friending, Posting, Requesting};
use concord_engine::{actions, pattern, ActionPattern, Frames, Queries, SyncRule, Var};

const CREATE: &str = "/Posting/create";
const DELETE: &str = "/Posting/delete";
const MINE: &str = "/Posting/_getPostsByAuthor";
const FRIEND: &str = "/Posting/_getFriendPosts";

pub(super) fn rules() -> Vec<SyncRule> {
    vec![
        create_request(),
        create_response(),
        error_response("CreatePostError", CREATE, Posting::CREATE),
        invalid_session("CreatePostInvalidSession", CREATE),
        delete_request(),
        delete_not_owned(),
        delete_response(),
        error_response("DeletePostError", DELETE, Posting::DELETE),
        invalid_session("DeletePostInvalidSession", DELETE),
        my_posts_request(),
        invalid_session("GetMyPostsInvalidSession", MINE),
        friend_posts_request(),
        friend_posts_not_friends(),
        invalid_session("GetFriendPostsInvalidSession", FRIEND),
    ]
}

fn create_request() -> SyncRule {
    let [request, session, content, user] =
        Var::many(["request", "session", "content", "user"]);
    SyncRule::new("CreatePostRequest")
        .when(actions([on_request(
            CREATE,
            pattern! { "session" => &session, "content" => &content },
            &request,
        )]))
        .where_(resolve_user(&session, &user))
        .binds([&user])
        .then(actions([(
            Posting::CREATE,
            pattern! { "author" => &user, "content" => &content },
        )]))
}

fn create_response() -> SyncRule {
    let [request, content, post] = Var::many(["request", "content", "post"]);
    SyncRule::new("CreatePostResponse")
        .when(actions([
            on_request(CREATE, pattern! { "content" => &content }, &request),
            ActionPattern::new(Posting::CREATE, pattern! { "content" => &content })
                .output(pattern! { "post" => &post }),
        ]))
        .then(actions([(
            Requesting::RESPOND,
            pattern! { "request" => &request, "post" => &post },
        )]))
}

/// Delete only posts the session's user wrote
fn delete_request() -> SyncRule {
    let [request, session, post, user] = Var::many(["request", "session", "post", "user"]);
    let vars = (session.clone(), post.clone(), user.clone());
    SyncRule::new("DeletePostRequest")
        .when(actions([on_request(
            DELETE,
            pattern! { "session" => &session, "post" => &post },
            &request,
        )]))
        .where_(move |frames: Frames, queries: Queries| {
            let (session, post, user) = vars.clone();
            async move {
                session_user(frames, &queries, &session, &user)
                    .await?
                    .query(
                        &queries,
                        &Posting::GET_POSTS_BY_AUTHOR,
                        &pattern! { "author" => &user },
                        &pattern! { "post" => &post },
                    )
                    .await
            }
        })
        .binds([&user])
        .then(actions([(Posting::DELETE, pattern! { "post" => &post })]))
}

fn delete_not_owned() -> SyncRule {
    let [request, session, post, user] = Var::many(["request", "session", "post", "user"]);
    let vars = (session.clone(), post.clone(), user.clone());
    SyncRule::new("DeletePostNotOwned")
        .when(actions([on_request(
            DELETE,
            pattern! { "session" => &session, "post" => &post },
            &request,
        )]))
        .where_(move |frames: Frames, queries: Queries| {
            let (session, post, user) = vars.clone();
            async move {
                let frames = session_user(frames, &queries, &session, &user).await?;
                absent(
                    frames,
                    &queries,
                    &Posting::GET_POSTS_BY_AUTHOR,
                    &pattern! { "author" => &user },
                    &pattern! { "post" => &post },
                )
                .await
            }
        })
        .then(actions([(
            Requesting::RESPOND,
            pattern! { "request" => &request, "error" => "post not found" },
        )]))
}

fn delete_response() -> SyncRule {
    let [request, post] = Var::many(["request", "post"]);
    SyncRule::new("DeletePostResponse")
        .when(actions([
            on_request(DELETE, pattern! { "post" => &post }, &request),
            ActionPattern::new(Posting::DELETE, pattern! { "post" => &post }).output(pattern! {}),
        ]))
        .then(actions([(
            Requesting::RESPOND,
            pattern! { "request" => &request, "deleted" => &post },
        )]))
}

fn my_posts_request() -> SyncRule {
    let [request, session, user, post, content, results] =
        Var::many(["request", "session", "user", "post", "content", "results"]);
    let vars = (
        session.clone(),
        user.clone(),
        post.clone(),
        content.clone(),
        results.clone(),
    );
    SyncRule::new("GetMyPostsRequest")
        .when(actions([on_request(
            MINE,
            pattern! { "session" => &session },
            &request,
        )]))
        .where_(move |frames: Frames, queries: Queries| {
            let (session, user, post, content, results) = vars.clone();
            async move {
                let original = session_user(frames, &queries, &session, &user).await?;
                let found = original
                    .clone()
                    .query(
                        &queries,
                        &Posting::GET_POSTS_BY_AUTHOR,
                        &pattern! { "author" => &user },
                        &pattern! { "post" => &post, "content" => &content },
                    )
                    .await?;
                Ok(collect_or_empty(original, found, &[post, content], &results))
            }
        })
        .binds([&results])
        .then(actions([(
            Requesting::RESPOND,
            pattern! { "request" => &request, "results" => &results },
        )]))
}

/// Posts by a friend; `_areFriends` prunes frames for strangers
fn friend_posts_request() -> SyncRule {
    let [request, session, user, friend, post, content, results] = Var::many([
        "request", "session", "user", "friend", "post", "content", "results",
    ]);
    let vars = (
        session.clone(),
        user.clone(),
        friend.clone(),
        post.clone(),
        content.clone(),
        results.clone(),
    );
    SyncRule::new("GetFriendPostsRequest")
        .when(actions([on_request(
            FRIEND,
            pattern! { "session" => &session, "friend" => &friend },
            &request,
        )]))
        .where_(move |frames: Frames, queries: Queries| {
            let (session, user, friend, post, content, results) = vars.clone();
            async move {
                let original = session_user(frames, &queries, &session, &user)
                    .await?
                    .query(
                        &queries,
                        &Friending::ARE_FRIENDS,
                        &pattern! { "user" => &user, "friend" => &friend },
                        &pattern! {},
                    )
                    .await?;
                let found = original
                    .clone()
                    .query(
                        &queries,
                        &Posting::GET_POSTS_BY_AUTHOR,
                        &pattern! { "author" => &friend },
                        &pattern! { "post" => &post, "content" => &content },
                    )
                    .await?;
                Ok(collect_or_empty(original, found, &[post, content], &results))
            }
        })
        .binds([&results])
        .then(actions([(
            Requesting::RESPOND,
            pattern! { "request" => &request, "results" => &results },
        )]))
}

fn friend_posts_not_friends() -> SyncRule {
    let [request, session, user, friend] = Var::many(["request", "session", "user", "friend"]);
    let vars = (session.clone(), user.clone(), friend.clone());
    SyncRule::new("GetFriendPostsNotFriends")
        .when(actions([on_request(
            FRIEND,
            pattern! { "session" => &session, "friend" => &friend },
            &request,
        )]))
        .where_(move |frames: Frames, queries: Queries| {
            let (session, user, friend) = vars.clone();
            async move {
                let frames = session_user(frames, &queries, &session, &user).await?;
                absent(
                    frames,
                    &queries,
                    &Friending::ARE_FRIENDS,
                    &pattern! { "user" => &user, "friend" => &friend },
                    &pattern! {},
                )
                .await
            }
        })
        .then(actions([(
            Requesting::RESPOND,
            pattern! { "request" => &request, "error" => "not friends" },
        )]))
}
