// ABOUTME: HTTP API layer for Porchlight providing REST endpoints and routing
// ABOUTME: Integration layer that depends on all domain packages

use axum::{
    routing::{delete, get, post, put},
    Router,
};

pub mod content_handlers;
pub mod dashboard_handlers;
pub mod error;
pub mod experiments_handlers;
pub mod forms_handlers;
pub mod health_handlers;
pub mod leads_handlers;
pub mod links_handlers;
pub mod response;
pub mod state;
pub mod testimonials_handlers;
pub mod timeline_handlers;

pub use error::{ApiResult, AppError};
pub use response::ApiResponse;
pub use state::AppState;

/// Public site endpoints (nested under /api)
pub fn create_public_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handlers::health_check))
        .route("/timeline", get(timeline_handlers::get_timeline))
        .nest("/timelines", create_timelines_router())
        .nest("/forms", create_forms_router())
        .route(
            "/testimonials",
            get(testimonials_handlers::list_public).post(testimonials_handlers::submit),
        )
        .route("/articles", get(content_handlers::list_published))
        .route("/articles/{slug}", get(content_handlers::get_published))
        .route("/faq", get(content_handlers::list_faq))
        .route(
            "/experiments/{key}/assignment",
            get(experiments_handlers::get_assignment),
        )
        .route(
            "/experiments/{key}/events",
            post(experiments_handlers::record_event),
        )
}

/// Saved timelines (nested under /api/timelines)
pub fn create_timelines_router() -> Router<AppState> {
    Router::new()
        .route("/", post(timeline_handlers::create_timeline))
        .route("/{id}", get(timeline_handlers::get_saved_timeline))
        .route("/{id}", put(timeline_handlers::update_notice_date))
        .route("/{id}/progress", put(timeline_handlers::update_progress))
        .route("/{id}/pdf", get(timeline_handlers::download_pdf))
}

/// Lead capture forms (nested under /api/forms)
pub fn create_forms_router() -> Router<AppState> {
    Router::new()
        .route("/contact", post(forms_handlers::submit_contact))
        .route("/exit-intent", post(forms_handlers::submit_exit_intent))
        .route("/cash-offer", post(forms_handlers::submit_cash_offer))
        .route("/guide-download", post(forms_handlers::submit_guide_download))
}

/// Short-link redirects, mounted at the site root
pub fn create_redirect_router() -> Router<AppState> {
    Router::new().route("/l/{code}", get(links_handlers::follow_link))
}

/// Admin endpoints (nested under /api/admin); callers add the token check
pub fn create_admin_router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard_handlers::overview))
        .nest("/leads", create_leads_router())
        .nest("/offers", create_offers_router())
        .nest("/testimonials", create_admin_testimonials_router())
        .nest("/links", create_links_router())
        .nest("/experiments", create_experiments_router())
        .nest("/articles", create_articles_router())
        .nest("/faq", create_faq_router())
}

/// Creates the admin leads router
pub fn create_leads_router() -> Router<AppState> {
    Router::new()
        .route("/", get(leads_handlers::list_leads))
        .route("/sync-pending", post(leads_handlers::sync_pending))
        .route("/{id}", get(leads_handlers::get_lead))
        .route("/{id}", delete(leads_handlers::delete_lead))
        .route("/{id}/status", put(leads_handlers::update_lead_status))
        .route("/{id}/notes", put(leads_handlers::update_lead_notes))
        .route("/{id}/sync", post(leads_handlers::sync_lead))
        .route("/{id}/restore", post(leads_handlers::restore_lead))
}

/// Creates the admin cash-offer router
pub fn create_offers_router() -> Router<AppState> {
    Router::new()
        .route("/", get(leads_handlers::list_offers))
        .route("/{id}", get(leads_handlers::get_offer))
        .route("/{id}", delete(leads_handlers::delete_offer))
        .route("/{id}/status", put(leads_handlers::update_offer_status))
}

/// Creates the admin testimonials router
pub fn create_admin_testimonials_router() -> Router<AppState> {
    Router::new()
        .route("/", get(testimonials_handlers::list_admin))
        .route("/{id}", delete(testimonials_handlers::delete_testimonial))
        .route("/{id}/moderation", put(testimonials_handlers::moderate))
        .route("/{id}/featured", put(testimonials_handlers::set_featured))
}

/// Creates the admin links router
pub fn create_links_router() -> Router<AppState> {
    Router::new()
        .route("/", get(links_handlers::list_links))
        .route("/", post(links_handlers::create_link))
        .route("/overview", get(links_handlers::links_overview))
        .route("/{id}", get(links_handlers::get_link))
        .route("/{id}", put(links_handlers::update_link))
        .route("/{id}", delete(links_handlers::delete_link))
        .route("/{id}/archive", post(links_handlers::archive_link))
        .route("/{id}/unarchive", post(links_handlers::unarchive_link))
        .route("/{id}/analytics", get(links_handlers::link_analytics))
}

/// Creates the admin experiments router
pub fn create_experiments_router() -> Router<AppState> {
    Router::new()
        .route("/", get(experiments_handlers::list_experiments))
        .route("/", post(experiments_handlers::create_experiment))
        .route("/{id}", get(experiments_handlers::get_experiment))
        .route("/{id}", put(experiments_handlers::update_experiment))
        .route("/{id}", delete(experiments_handlers::delete_experiment))
        .route("/{id}/status", put(experiments_handlers::set_status))
        .route("/{id}/results", get(experiments_handlers::get_results))
}

/// Creates the admin articles router
pub fn create_articles_router() -> Router<AppState> {
    Router::new()
        .route("/", get(content_handlers::list_articles))
        .route("/", post(content_handlers::create_article))
        .route("/{id}", get(content_handlers::get_article))
        .route("/{id}", put(content_handlers::update_article))
        .route("/{id}", delete(content_handlers::delete_article))
        .route("/{id}/publish", post(content_handlers::publish_article))
        .route("/{id}/unpublish", post(content_handlers::unpublish_article))
}

/// Creates the admin FAQ router
pub fn create_faq_router() -> Router<AppState> {
    Router::new()
        .route("/", get(content_handlers::list_faq))
        .route("/", post(content_handlers::create_faq_entry))
        .route("/{id}", put(content_handlers::update_faq_entry))
        .route("/{id}", delete(content_handlers::delete_faq_entry))
}
