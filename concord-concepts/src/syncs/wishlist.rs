//! Wishlist endpoints

use super::{
    collect_or_empty, error_response, invalid_session, on_request, resolve_user, session_user,
};
use crate::concepts::{Requesting, Wishlist};
use concord_engine::{actions, pattern, Frames, Queries, SyncRule, Var};

const ADD: &str = "/Wishlist/addPlace";
const REMOVE: &str = "/Wishlist/removePlace";
const LIST: &str = "/Wishlist/_getPlaces";

pub(super) fn rules() -> Vec<SyncRule> {
    vec![
        add_place_request(),
        error_response("AddPlaceError", ADD, Wishlist::ADD_PLACE),
        invalid_session("AddPlaceInvalidSession", ADD),
        remove_place_request(),
        error_response("RemovePlaceError", REMOVE, Wishlist::REMOVE_PLACE),
        invalid_session("RemovePlaceInvalidSession", REMOVE),
        get_places_request(),
        invalid_session("GetPlacesInvalidSession", LIST),
    ]
}

fn add_place_request() -> SyncRule {
    let [request, session, place, user] = Var::many(["request", "session", "place", "user"]);
    SyncRule::new("AddPlaceRequest")
        .when(actions([on_request(
            ADD,
            pattern! { "session" => &session, "place" => &place },
            &request,
        )]))
        .where_(resolve_user(&session, &user))
        .binds([&user])
        .then(actions([
            (
                Wishlist::ADD_PLACE,
                pattern! { "user" => &user, "place" => &place },
                pattern! { "place" => &place },
            ),
            (
                Requesting::RESPOND,
                pattern! { "request" => &request, "place" => &place },
                pattern! {},
            ),
        ]))
}

fn remove_place_request() -> SyncRule {
    let [request, session, place, user] = Var::many(["request", "session", "place", "user"]);
    SyncRule::new("RemovePlaceRequest")
        .when(actions([on_request(
            REMOVE,
            pattern! { "session" => &session, "place" => &place },
            &request,
        )]))
        .where_(resolve_user(&session, &user))
        .binds([&user])
        .then(actions([
            (
                Wishlist::REMOVE_PLACE,
                pattern! { "user" => &user, "place" => &place },
                pattern! {},
            ),
            (
                Requesting::RESPOND,
                pattern! { "request" => &request, "removed" => &place },
                pattern! {},
            ),
        ]))
}

/// One response per request, `results: []` when the wishlist is empty
fn get_places_request() -> SyncRule {
    let [request, session, user, place, results] =
        Var::many(["request", "session", "user", "place", "results"]);
    let vars = (session.clone(), user.clone(), place.clone(), results.clone());
    SyncRule::new("GetPlacesRequest")
        .when(actions([on_request(
            LIST,
            pattern! { "session" => &session },
            &request,
        )]))
        .where_(move |frames: Frames, queries: Queries| {
            let (session, user, place, results) = vars.clone();
            async move {
                let original = session_user(frames, &queries, &session, &user).await?;
                let found = original
                    .clone()
                    .query(
                        &queries,
                        &Wishlist::GET_PLACES,
                        &pattern! { "user" => &user },
                        &pattern! { "place" => &place },
                    )
                    .await?;
                Ok(collect_or_empty(original, found, &[place], &results))
            }
        })
        .binds([&results])
        .then(actions([(
            Requesting::RESPOND,
            pattern! { "request" => &request, "results" => &results },
        )]))
}
