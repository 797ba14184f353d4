// ABOUTME: Pure foreclosure timeline generation from a Notice of Default date
// ABOUTME: Milestone date = seed + fixed offset; status derived from "today"

use std::sync::LazyLock;

use chrono::{Days, NaiveDate, Utc};
use regex::Regex;

use crate::templates::templates;
use crate::types::{Milestone, MilestoneStatus, Timeline, TimelineError, TimelineVariant};

static NOTICE_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("notice date regex is valid")
});

/// Milestones this many days away (or fewer) count as current
pub const CURRENT_WINDOW_DAYS: i64 = 3;

/// Classify a milestone date against today.
///
/// past: date < today; current: 0 <= days until <= 3; upcoming: otherwise.
pub fn classify_status(date: NaiveDate, today: NaiveDate) -> MilestoneStatus {
    let days_until = (date - today).num_days();
    if days_until < 0 {
        MilestoneStatus::Past
    } else if days_until <= CURRENT_WINDOW_DAYS {
        MilestoneStatus::Current
    } else {
        MilestoneStatus::Upcoming
    }
}

/// Build the milestone sequence for a notice date, classified against `today`
pub fn generate(
    notice_date: NaiveDate,
    variant: TimelineVariant,
    today: NaiveDate,
) -> Result<Timeline, TimelineError> {
    let milestones = templates(variant)
        .iter()
        .map(|template| {
            let date = notice_date
                .checked_add_days(Days::new(template.day_offset as u64))
                .ok_or(TimelineError::DateOutOfRange {
                    date: notice_date,
                    offset: template.day_offset,
                })?;

            Ok(Milestone {
                id: template.id.to_string(),
                title: template.title.to_string(),
                date,
                day_offset: template.day_offset,
                description: template.description.to_string(),
                action_items: template.action_items.iter().map(|s| s.to_string()).collect(),
                urgency: template.urgency,
                status: classify_status(date, today),
                days_until: (date - today).num_days(),
            })
        })
        .collect::<Result<Vec<_>, TimelineError>>()?;

    Ok(Timeline {
        notice_date,
        variant,
        generated_for: today,
        milestones,
    })
}

/// `generate` against the current UTC date
pub fn generate_today(
    notice_date: NaiveDate,
    variant: TimelineVariant,
) -> Result<Timeline, TimelineError> {
    generate(notice_date, variant, Utc::now().date_naive())
}

/// Parse a `YYYY-MM-DD` notice date.
///
/// Exactly four year digits and two each for month and day; chrono alone
/// would also accept `2026-1-5` or a signed `+262142-12-31`.
pub fn parse_notice_date(input: &str) -> Result<NaiveDate, TimelineError> {
    let trimmed = input.trim();
    if !NOTICE_DATE_RE.is_match(trimmed) {
        return Err(TimelineError::InvalidDate(input.to_string()));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|_| TimelineError::InvalidDate(input.to_string()))
}
