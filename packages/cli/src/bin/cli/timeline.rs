// ABOUTME: `porchlight timeline` command
// ABOUTME: Prints the milestone table for a notice date without starting the server

use chrono::Utc;
use colored::*;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use porchlight_timeline::{
    generate, parse_notice_date, Milestone, MilestoneStatus, TimelineVariant, Urgency,
};

pub fn print(
    date: &str,
    variant: &str,
    today: Option<&str>,
    show_actions: bool,
) -> anyhow::Result<()> {
    let notice_date = parse_notice_date(date)?;
    let variant: TimelineVariant = variant.parse()?;
    let today = match today {
        Some(raw) => parse_notice_date(raw)?,
        None => Utc::now().date_naive(),
    };

    let timeline = generate(notice_date, variant, today)?;

    println!(
        "{}",
        format!(
            "Foreclosure timeline ({}) for notice dated {}",
            variant,
            notice_date.format("%B %-d, %Y")
        )
        .blue()
        .bold()
    );
    println!();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec!["Date", "Milestone", "Day", "Days away", "Urgency", "Status"]);

    for milestone in &timeline.milestones {
        table.add_row(vec![
            milestone.date.format("%b %-d, %Y").to_string(),
            milestone.title.clone(),
            milestone.day_offset.to_string(),
            days_away(milestone.days_until),
            urgency_label(milestone.urgency).to_string(),
            status_label(milestone.status).to_string(),
        ]);
    }

    println!("{}", table);

    match timeline.next_milestone() {
        Some(next) => print_next(next),
        None => println!("{}", "Every milestone on this timeline has passed.".yellow()),
    }

    if show_actions {
        println!();
        for milestone in &timeline.milestones {
            println!("{}", milestone.title.bold());
            for item in &milestone.action_items {
                println!("  - {}", item);
            }
        }
    }

    Ok(())
}

fn print_next(next: &Milestone) {
    let when = match next.days_until {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        n => format!("in {} days", n),
    };
    let line = format!("Next: {} {}", next.title, when);
    let line = match next.urgency {
        Urgency::Critical => line.red().bold(),
        Urgency::Warning => line.yellow().bold(),
        Urgency::Safe => line.green().bold(),
    };
    println!("{}", line);
}

fn days_away(days_until: i64) -> String {
    if days_until < 0 {
        format!("{} ago", -days_until)
    } else {
        days_until.to_string()
    }
}

fn urgency_label(urgency: Urgency) -> &'static str {
    match urgency {
        Urgency::Critical => "Critical",
        Urgency::Warning => "Warning",
        Urgency::Safe => "Safe",
    }
}

fn status_label(status: MilestoneStatus) -> &'static str {
    match status {
        MilestoneStatus::Past => "Past",
        MilestoneStatus::Current => "Current",
        MilestoneStatus::Upcoming => "Upcoming",
    }
}
