//! Registration, login and logout

use super::{error_response, invalid_session, on_request, session_user};
use crate::concepts::{Requesting, Sessioning, UserAuthentication};
use concord_engine::{actions, pattern, ActionPattern, Frames, Queries, SyncRule, Var};

const REGISTER: &str = "/UserAuthentication/register";
const LOGIN: &str = "/UserAuthentication/authenticate";
const LOGOUT: &str = "/Sessioning/delete";
const WHOAMI: &str = "/UserAuthentication/_getUsername";

pub(super) fn rules() -> Vec<SyncRule> {
    vec![
        register_request(),
        error_response("RegisterError", REGISTER, UserAuthentication::REGISTER),
        login_request(),
        login_creates_session(),
        login_response(),
        error_response("LoginError", LOGIN, UserAuthentication::AUTHENTICATE),
        logout_request(),
        logout_response(),
        error_response("LogoutError", LOGOUT, Sessioning::DELETE),
        whoami_request(),
        invalid_session("WhoAmIInvalidSession", WHOAMI),
    ]
}

fn register_request() -> SyncRule {
    let [request, username, password, user] =
        Var::many(["request", "username", "password", "user"]);
    SyncRule::new("RegisterRequest")
        .when(actions([on_request(
            REGISTER,
            pattern! { "username" => &username, "password" => &password },
            &request,
        )]))
        .then(actions([
            (
                UserAuthentication::REGISTER,
                pattern! { "username" => &username, "password" => &password },
                pattern! { "user" => &user },
            ),
            (
                Requesting::RESPOND,
                pattern! { "request" => &request, "user" => &user },
                pattern! {},
            ),
        ]))
}

fn login_request() -> SyncRule {
    let [request, username, password] = Var::many(["request", "username", "password"]);
    SyncRule::new("LoginRequest")
        .when(actions([on_request(
            LOGIN,
            pattern! { "username" => &username, "password" => &password },
            &request,
        )]))
        .then(actions([(
            UserAuthentication::AUTHENTICATE,
            pattern! { "username" => &username, "password" => &password },
        )]))
}

fn login_creates_session() -> SyncRule {
    let [request, username, user] = Var::many(["request", "username", "user"]);
    let (name, id) = (username.clone(), user.clone());
    SyncRule::new("LoginCreatesSession")
        .when(actions([
            on_request(LOGIN, pattern! { "username" => &username }, &request),
            ActionPattern::new(
                UserAuthentication::AUTHENTICATE,
                pattern! { "username" => &username },
            )
            .output(pattern! {}),
        ]))
        .where_(move |frames: Frames, queries: Queries| {
            let (username, user) = (name.clone(), id.clone());
            async move {
                frames
                    .query(
                        &queries,
                        &UserAuthentication::GET_USER_BY_USERNAME,
                        &pattern! { "username" => &username },
                        &pattern! { "user" => &user },
                    )
                    .await
            }
        })
        .binds([&user])
        .then(actions([(Sessioning::CREATE, pattern! { "user" => &user })]))
}

/// Joins the request, the successful check and the new session
fn login_response() -> SyncRule {
    let [request, username, user, session] =
        Var::many(["request", "username", "user", "session"]);
    SyncRule::new("LoginResponse")
        .when(actions([
            on_request(LOGIN, pattern! { "username" => &username }, &request),
            ActionPattern::new(
                UserAuthentication::AUTHENTICATE,
                pattern! { "username" => &username },
            )
            .output(pattern! {}),
            ActionPattern::new(Sessioning::CREATE, pattern! { "user" => &user })
                .output(pattern! { "session" => &session }),
        ]))
        .then(actions([(
            Requesting::RESPOND,
            pattern! { "request" => &request, "session" => &session, "user" => &user },
        )]))
}

fn logout_request() -> SyncRule {
    let [request, session] = Var::many(["request", "session"]);
    SyncRule::new("LogoutRequest")
        .when(actions([on_request(
            LOGOUT,
            pattern! { "session" => &session },
            &request,
        )]))
        .then(actions([(Sessioning::DELETE, pattern! { "session" => &session })]))
}

fn logout_response() -> SyncRule {
    let [request, session] = Var::many(["request", "session"]);
    SyncRule::new("LogoutResponse")
        .when(actions([
            on_request(LOGOUT, pattern! { "session" => &session }, &request),
            ActionPattern::new(Sessioning::DELETE, pattern! { "session" => &session })
                .output(pattern! {}),
        ]))
        .then(actions([(Requesting::RESPOND, pattern! { "request" => &request })]))
}

/// Resolve a session to the username behind it
fn whoami_request() -> SyncRule {
    let [request, session, user, username] =
        Var::many(["request", "session", "user", "username"]);
    let vars = (session.clone(), user.clone(), username.clone());
    SyncRule::new("WhoAmIRequest")
        .when(actions([on_request(
            WHOAMI,
            pattern! { "session" => &session },
            &request,
        )]))
        .where_(move |frames: Frames, queries: Queries| {
            let (session, user, username) = vars.clone();
            async move {
                session_user(frames, &queries, &session, &user)
                    .await?
                    .query(
                        &queries,
                        &UserAuthentication::GET_USERNAME,
                        &pattern! { "user" => &user },
                        &pattern! { "username" => &username },
                    )
                    .await
            }
        })
        .binds([&user, &username])
        .then(actions([(
            Requesting::RESPOND,
            pattern! { "request" => &request, "user" => &user, "username" => &username },
        )]))
}
