// ABOUTME: Shared handler state: one storage handle per domain
// ABOUTME: Built once at startup from the SQLite pool and integrations

use std::sync::Arc;

use porchlight_content::{ArticleStorage, FaqStorage};
use porchlight_experiments::ExperimentStorage;
use porchlight_integrations::Integrations;
use porchlight_leads::{LeadIntake, LeadStorage, OfferStorage};
use porchlight_links::LinkStorage;
use porchlight_testimonials::TestimonialStorage;
use porchlight_timeline::ProgressStorage;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub leads: Arc<LeadStorage>,
    pub offers: Arc<OfferStorage>,
    pub intake: Arc<LeadIntake>,
    pub trackers: Arc<ProgressStorage>,
    pub testimonials: Arc<TestimonialStorage>,
    pub links: Arc<LinkStorage>,
    pub experiments: Arc<ExperimentStorage>,
    pub articles: Arc<ArticleStorage>,
    pub faq: Arc<FaqStorage>,
    pub integrations: Integrations,
}

impl AppState {
    pub fn new(
        pool: SqlitePool,
        integrations: Integrations,
        public_base_url: Option<String>,
    ) -> Self {
        let intake = LeadIntake::new(pool.clone(), integrations.clone())
            .with_public_base_url(public_base_url);

        Self {
            leads: Arc::new(LeadStorage::new(pool.clone())),
            offers: Arc::new(OfferStorage::new(pool.clone())),
            intake: Arc::new(intake),
            trackers: Arc::new(ProgressStorage::new(pool.clone())),
            testimonials: Arc::new(TestimonialStorage::new(pool.clone())),
            links: Arc::new(LinkStorage::new(pool.clone())),
            experiments: Arc::new(ExperimentStorage::new(pool.clone())),
            articles: Arc::new(ArticleStorage::new(pool.clone())),
            faq: Arc::new(FaqStorage::new(pool.clone())),
            pool,
            integrations,
        }
    }
}
