// ABOUTME: Short links for campaigns and printed mailers
// ABOUTME: Code validation, redirect resolution and click analytics

pub mod storage;
pub mod types;

pub use storage::LinkStorage;
pub use types::{
    referrer_host, validate_code, ClickInput, DailyClicks, Link, LinkAnalytics, LinkCreateInput,
    LinkOverview, LinkUpdateInput, ReferrerCount, GENERATED_CODE_LEN,
};
