// ABOUTME: HTML rendering of a tracked timeline
// ABOUTME: Output feeds the PDF renderer and the timeline email

use std::fmt::Write;

use porchlight_core::escape_html;

use crate::progress::TrackedTimeline;
use crate::types::{MilestoneStatus, Urgency};

const STYLE: &str = "body{font-family:Georgia,serif;color:#1f2933;margin:32px}\
h1{font-size:24px;margin-bottom:4px}\
.meta{color:#52606d;margin-bottom:24px}\
.milestone{border-left:4px solid #9aa5b1;padding:8px 16px;margin-bottom:16px}\
.critical{border-color:#c81e1e}.warning{border-color:#d97706}.safe{border-color:#15803d}\
.past{opacity:.6}.current{background:#fff7ed}\
.date{font-weight:bold}\
ul{list-style:none;padding-left:0}li{margin:4px 0}";

fn urgency_class(urgency: Urgency) -> &'static str {
    match urgency {
        Urgency::Critical => "critical",
        Urgency::Warning => "warning",
        Urgency::Safe => "safe",
    }
}

fn status_label(status: MilestoneStatus, days_until: i64) -> String {
    match status {
        MilestoneStatus::Past => "Passed".to_string(),
        MilestoneStatus::Current if days_until == 0 => "Today".to_string(),
        MilestoneStatus::Current | MilestoneStatus::Upcoming => {
            format!("In {} day{}", days_until, if days_until == 1 { "" } else { "s" })
        }
    }
}

/// Render a standalone HTML document for a tracked timeline
pub fn timeline_html(timeline: &TrackedTimeline, recipient_name: Option<&str>) -> String {
    let mut html = String::with_capacity(4096);

    let heading = match recipient_name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => format!("Foreclosure Timeline for {}", escape_html(name)),
        None => "Your Foreclosure Timeline".to_string(),
    };

    // Writing to a String cannot fail
    let _ = write!(
        html,
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>Foreclosure Timeline</title>\
         <style>{}</style></head><body><h1>{}</h1>\
         <p class=\"meta\">Notice of Default: {} &middot; Generated {} &middot; {}% of action items complete</p>",
        STYLE,
        heading,
        timeline.notice_date.format("%B %-d, %Y"),
        timeline.generated_for.format("%B %-d, %Y"),
        timeline.completion_percent,
    );

    for milestone in &timeline.milestones {
        let status_class = match milestone.status {
            MilestoneStatus::Past => "past",
            MilestoneStatus::Current => "current",
            MilestoneStatus::Upcoming => "upcoming",
        };

        let _ = write!(
            html,
            "<div class=\"milestone {} {}\"><p class=\"date\">{} (day {}) &middot; {}</p><h2>{}</h2><p>{}</p><ul>",
            urgency_class(milestone.urgency),
            status_class,
            milestone.date.format("%a %b %-d, %Y"),
            milestone.day_offset,
            status_label(milestone.status, milestone.days_until),
            escape_html(&milestone.title),
            escape_html(&milestone.description),
        );

        for action in &milestone.actions {
            let _ = write!(
                html,
                "<li>{} {}</li>",
                if action.completed { "&#9745;" } else { "&#9744;" },
                escape_html(&action.text)
            );
        }
        html.push_str("</ul></div>");
    }

    html.push_str(
        "<p class=\"meta\">Dates are estimates based on typical California non-judicial \
         foreclosure timelines. Confirm every deadline with your servicer, trustee or attorney.</p>\
         </body></html>",
    );
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{generate, parse_notice_date};
    use crate::progress::{merge, CompletionMap};
    use crate::types::TimelineVariant;

    fn tracked() -> TrackedTimeline {
        let seed = parse_notice_date("2026-01-15").unwrap();
        let today = parse_notice_date("2026-02-04").unwrap();
        let mut map = CompletionMap::new();
        map.insert(("notice-of-default".to_string(), 0), true);
        merge(generate(seed, TimelineVariant::Standard, today).unwrap(), &map)
    }

    #[test]
    fn test_renders_every_milestone() {
        let html = timeline_html(&tracked(), None);

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("Your Foreclosure Timeline"));
        assert!(html.contains("Notice of Default: January 15, 2026"));
        assert!(html.contains("Trustee Sale (Auction)"));
        assert!(html.contains("Thu May 21, 2026"));
        assert_eq!(html.matches("class=\"milestone").count(), 5);
        assert_eq!(html.matches("&#9745;").count(), 1);
    }

    #[test]
    fn test_current_milestone_is_today() {
        // Day 20 is the cash-offer window
        let html = timeline_html(&tracked(), None);
        assert!(html.contains("safe current"));
        assert!(html.contains("&middot; Today</p>"));
    }

    #[test]
    fn test_recipient_name_is_escaped() {
        let html = timeline_html(&tracked(), Some("<b>Dana</b>"));
        assert!(html.contains("Foreclosure Timeline for &lt;b&gt;Dana&lt;/b&gt;"));
        assert!(!html.contains("<b>Dana</b>"));
    }
}
