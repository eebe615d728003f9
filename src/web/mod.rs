pub mod middleware;
pub mod routes;

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post, put},
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use middleware::auth as auth_middleware;

/// The full application router. Everything except the token exchange sits
/// behind the session middleware; per-endpoint role checks happen inside the
/// handlers.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        // Session
        .route("/auth/me", get(routes::auth::me_handler))
        .route(
            "/auth/can-access-dashboard",
            get(routes::auth::can_access_dashboard_handler),
        )
        .route("/auth/logout", post(routes::auth::logout_handler))
        .route("/auth/block-user", post(routes::auth::block_user_handler))
        .route(
            "/auth/unblock-user",
            post(routes::auth::unblock_user_handler),
        )
        // Events
        .route(
            "/events",
            get(routes::events::list_events_handler).post(routes::events::create_event_handler),
        )
        .route(
            "/events/:event_id",
            get(routes::events::get_event_handler)
                .put(routes::events::update_event_handler)
                .delete(routes::events::delete_event_handler),
        )
        .route(
            "/events/:event_id/slots",
            patch(routes::events::adjust_slots_handler),
        )
        .route(
            "/events/:event_id/toggle-active",
            patch(routes::events::toggle_active_handler),
        )
        .route(
            "/events/:event_id/toggle-lock",
            patch(routes::events::toggle_lock_handler),
        )
        // Participants
        .route(
            "/participants",
            get(routes::participants::list_participants_handler)
                .post(routes::participants::create_participant_handler),
        )
        .route(
            "/participants/my",
            get(routes::participants::my_participants_handler),
        )
        .route(
            "/participants/event/:event_id",
            get(routes::participants::participants_by_event_handler),
        )
        .route(
            "/participants/:id/approve",
            patch(routes::participants::approve_participant_handler),
        )
        .route(
            "/participants/:id/reject",
            patch(routes::participants::reject_participant_handler),
        )
        .route(
            "/participants/:id",
            put(routes::participants::update_participant_handler)
                .delete(routes::participants::delete_participant_handler),
        )
        // Profiles
        .route(
            "/profile",
            get(routes::profile::list_profiles_handler)
                .post(routes::profile::create_profile_handler)
                .put(routes::profile::update_profile_handler),
        )
        .route("/profile/me", get(routes::profile::my_profile_handler))
        .route("/profile/:id", get(routes::profile::get_profile_handler))
        .route(
            "/profile/:id/approve",
            patch(routes::profile::approve_profile_handler),
        )
        .route(
            "/profile/:id/reject",
            patch(routes::profile::reject_profile_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::require_auth,
        ));

    Router::new()
        .route("/auth/validate", post(routes::auth::validate_handler))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .with_state(state)
}
