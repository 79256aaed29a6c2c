//! HTTP route handlers for the Store Ratings API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                    - Liveness
//! GET    /health/ready              - Readiness (database ping)
//!
//! # Auth (register and login are rate limited)
//! POST   /api/auth/register         - Self-registration
//! POST   /api/auth/login            - Password login
//! POST   /api/auth/logout           - Logout
//! GET    /api/auth/me               - Caller's profile
//! PUT    /api/auth/password         - Change own password
//!
//! # Profile (requires auth)
//! GET    /api/profile               - Own profile
//! PATCH  /api/profile               - Update own name/address
//!
//! # Stores
//! GET    /api/stores                - Stores with rating summaries
//! GET    /api/stores/{id}           - One store summary
//! PATCH  /api/stores/{id}           - Update store (admin or owner)
//! DELETE /api/stores/{id}           - Delete store (admin)
//! GET    /api/stores/{id}/ratings   - Ratings with rater name/email
//! PUT    /api/stores/{id}/rating    - Submit or replace own rating
//! DELETE /api/stores/{id}/rating    - Remove own rating
//!
//! # Dashboards (requires auth)
//! GET    /api/dashboard             - Stores plus the caller's own scores
//! GET    /api/owner/store           - Owner's store summary and its ratings
//!
//! # Admin
//! GET    /api/admin/stats           - Totals
//! GET    /api/admin/profiles        - List/filter/sort profiles
//! GET    /api/admin/profiles/{id}   - Profile detail with owned store
//! PATCH  /api/admin/profiles/{id}   - Update any profile (incl. role)
//! DELETE /api/admin/profiles/{id}   - Delete profile (cascades)
//! POST   /api/admin/users           - Create an account with a role
//! POST   /api/admin/stores          - Create a store
//! ```

pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod health;
pub mod owner;
pub mod profile;
pub mod stores;

use axum::{
    Router,
    extract::FromRequest,
    routing::{get, post, put},
};

use crate::error::AppError;
use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// JSON body extractor whose rejections use the API error format.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Json<T>(pub T);

impl<T: serde::Serialize> axum::response::IntoResponse for Json<T> {
    fn into_response(self) -> axum::response::Response {
        axum::Json(self.0).into_response()
    }
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(auth_rate_limiter());

    Router::new()
        .merge(limited)
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .route("/password", put(auth::change_password))
}

/// Create the store routes router.
pub fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(stores::index))
        .route(
            "/{id}",
            get(stores::show)
                .patch(stores::update)
                .delete(stores::destroy),
        )
        .route("/{id}/ratings", get(stores::ratings))
        .route(
            "/{id}/rating",
            put(stores::rate).delete(stores::remove_rating),
        )
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(admin::stats))
        .route("/profiles", get(admin::profiles))
        .route(
            "/profiles/{id}",
            get(admin::profile)
                .patch(admin::update_profile)
                .delete(admin::delete_profile),
        )
        .route("/users", post(admin::create_user))
        .route("/stores", post(admin::create_store))
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api/auth", auth_routes())
        .route("/api/profile", get(profile::show).patch(profile::update))
        .nest("/api/stores", store_routes())
        .route("/api/dashboard", get(dashboard::index))
        .route("/api/owner/store", get(owner::store))
        .nest("/api/admin", admin_routes())
}
