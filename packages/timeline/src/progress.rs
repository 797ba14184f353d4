// ABOUTME: Merges a generated timeline with stored checklist completion
// ABOUTME: Pure functions; persistence lives in storage.rs

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::types::{MilestoneStatus, Timeline, TimelineVariant, Urgency};

/// Completion flags keyed by (milestone id, action index)
pub type CompletionMap = HashMap<(String, usize), bool>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
    pub index: usize,
    pub text: String,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedMilestone {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    pub day_offset: i64,
    pub description: String,
    pub urgency: Urgency,
    pub status: MilestoneStatus,
    pub days_until: i64,
    pub actions: Vec<ActionItem>,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedTimeline {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracker_id: Option<String>,
    pub notice_date: NaiveDate,
    pub variant: TimelineVariant,
    pub generated_for: NaiveDate,
    pub milestones: Vec<TrackedMilestone>,
    pub completed_actions: usize,
    pub total_actions: usize,
    /// 0..=100, rounded down
    pub completion_percent: u8,
}

impl TrackedTimeline {
    pub fn next_milestone(&self) -> Option<&TrackedMilestone> {
        self.milestones
            .iter()
            .find(|m| m.status != MilestoneStatus::Past)
    }
}

/// Annotate every action item with its stored completion flag
pub fn merge(timeline: Timeline, completion: &CompletionMap) -> TrackedTimeline {
    let mut completed_actions = 0;
    let mut total_actions = 0;

    let milestones = timeline
        .milestones
        .into_iter()
        .map(|m| {
            let actions: Vec<ActionItem> = m
                .action_items
                .into_iter()
                .enumerate()
                .map(|(index, text)| ActionItem {
                    index,
                    completed: completion
                        .get(&(m.id.clone(), index))
                        .copied()
                        .unwrap_or(false),
                    text,
                })
                .collect();

            let done = actions.iter().filter(|a| a.completed).count();
            completed_actions += done;
            total_actions += actions.len();

            TrackedMilestone {
                completed: !actions.is_empty() && done == actions.len(),
                id: m.id,
                title: m.title,
                date: m.date,
                day_offset: m.day_offset,
                description: m.description,
                urgency: m.urgency,
                status: m.status,
                days_until: m.days_until,
                actions,
            }
        })
        .collect();

    let completion_percent = if total_actions == 0 {
        0
    } else {
        (completed_actions * 100 / total_actions) as u8
    };

    TrackedTimeline {
        tracker_id: None,
        notice_date: timeline.notice_date,
        variant: timeline.variant,
        generated_for: timeline.generated_for,
        milestones,
        completed_actions,
        total_actions,
        completion_percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{generate, parse_notice_date};

    fn timeline() -> Timeline {
        let seed = parse_notice_date("2026-02-01").unwrap();
        generate(seed, TimelineVariant::Standard, seed).unwrap()
    }

    #[test]
    fn test_merge_without_progress() {
        let tracked = merge(timeline(), &CompletionMap::new());

        assert_eq!(tracked.milestones.len(), 5);
        assert_eq!(tracked.completed_actions, 0);
        assert_eq!(tracked.total_actions, 17);
        assert_eq!(tracked.completion_percent, 0);
        assert!(tracked.milestones.iter().all(|m| !m.completed));
    }

    #[test]
    fn test_merge_marks_completed_actions() {
        let mut map = CompletionMap::new();
        for i in 0..4 {
            map.insert(("notice-of-default".to_string(), i), true);
        }
        map.insert(("cash-offer-window".to_string(), 1), true);
        map.insert(("cash-offer-window".to_string(), 2), false);
        // Stale rows for unknown milestones are ignored
        map.insert(("retired-milestone".to_string(), 0), true);

        let tracked = merge(timeline(), &map);

        assert!(tracked.milestones[0].completed);
        assert!(!tracked.milestones[1].completed);
        assert!(tracked.milestones[1].actions[1].completed);
        assert!(!tracked.milestones[1].actions[2].completed);
        assert_eq!(tracked.completed_actions, 5);
        // 5 / 17 = 29.4%
        assert_eq!(tracked.completion_percent, 29);
    }

    #[test]
    fn test_serialized_shape() {
        let tracked = merge(timeline(), &CompletionMap::new());
        let json = serde_json::to_value(&tracked).unwrap();

        assert_eq!(json["noticeDate"], "2026-02-01");
        assert_eq!(json["variant"], "standard");
        assert_eq!(json["milestones"][0]["status"], "current");
        assert_eq!(json["milestones"][0]["urgency"], "critical");
        assert_eq!(json["milestones"][0]["actions"][0]["index"], 0);
        assert!(json.get("trackerId").is_none());
    }
}
