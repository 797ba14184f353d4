// ABOUTME: Lead capture for Porchlight's public forms
// ABOUTME: Lead and cash-offer storage, form validation and the intake pipeline

pub mod intake;
pub mod offers;
pub mod storage;
pub mod types;
pub mod validation;

pub use intake::{LeadIntake, SyncSummary, TimelineSignup};
pub use offers::{
    CashOfferInput, CashOfferRequest, NewCashOffer, OfferStats, OfferStatus, OfferStatusUpdate,
    OfferStorage, PropertyCondition, SellTimeline,
};
pub use storage::{CrmSyncOutcome, LeadStorage};
pub use types::{
    ContactFormInput, CrmSyncStatus, ExitIntentInput, GuideDownloadInput, Lead, LeadCreateInput,
    LeadFilter, LeadSource, LeadStats, LeadStatus, TimelineSignupInput, UtmParams,
};
