// ABOUTME: Homeowner testimonials for the public site
// ABOUTME: Visitors submit, admins approve, reject and feature

pub mod storage;
pub mod types;

pub use storage::TestimonialStorage;
pub use types::{
    Testimonial, TestimonialInput, TestimonialStats, TestimonialStatus,
};
