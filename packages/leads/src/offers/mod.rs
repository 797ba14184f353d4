// ABOUTME: Cash-offer requests submitted from the "get a cash offer" form
// ABOUTME: Each request owns a linked lead with source cash_offer

pub mod storage;
pub mod types;

pub use storage::OfferStorage;
pub use types::{
    CashOfferInput, CashOfferRequest, NewCashOffer, OfferStats, OfferStatus, OfferStatusUpdate,
    PropertyCondition, SellTimeline,
};
