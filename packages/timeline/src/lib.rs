// ABOUTME: Foreclosure timeline calculator and checklist tracker
// ABOUTME: Pure generation from a notice date plus persisted per-visitor progress

pub mod generator;
pub mod progress;
pub mod render;
pub mod storage;
pub mod templates;
pub mod types;

pub use generator::{classify_status, generate, generate_today, parse_notice_date, CURRENT_WINDOW_DAYS};
pub use progress::{merge, ActionItem, CompletionMap, TrackedMilestone, TrackedTimeline};
pub use render::timeline_html;
pub use storage::{ActionProgress, ProgressStorage, TimelineTracker, TrackerCreateInput};
pub use templates::{find_template, templates, STANDARD_OFFSETS, STATUTORY_OFFSETS};
pub use types::{
    Milestone, MilestoneStatus, MilestoneTemplate, Timeline, TimelineError, TimelineVariant,
    Urgency,
};
