// ABOUTME: Fixed milestone tables for each timeline variant
// ABOUTME: Offsets are days after the Notice of Default is recorded

use crate::types::{MilestoneTemplate, TimelineVariant, Urgency};

pub const STANDARD_OFFSETS: [i64; 5] = [0, 20, 75, 105, 126];
pub const STATUTORY_OFFSETS: [i64; 5] = [0, 30, 90, 111, 132];

const NOTICE_OF_DEFAULT_ACTIONS: &[&str] = &[
    "Read the Notice of Default and note the amount required to reinstate",
    "Gather mortgage statements, income documents and a hardship letter",
    "Call your servicer's loss-mitigation department and ask for options in writing",
    "Request a free cash-offer evaluation of your home",
];

const NOTICE_OF_SALE_ACTIONS: &[&str] = &[
    "Write down the sale date, time and location printed on the notice",
    "Ask the trustee whether the sale can be postponed",
    "Close any pending sale or short sale before the auction date",
    "Talk to a HUD-approved housing counselor or an attorney",
];

const TRUSTEE_SALE_ACTIONS: &[&str] = &[
    "Confirm with the trustee whether the sale was postponed",
    "Plan your move if the sale goes ahead",
    "Ask the new owner about relocation assistance or cash for keys",
];

static STANDARD: [MilestoneTemplate; 5] = [
    MilestoneTemplate {
        id: "notice-of-default",
        title: "Notice of Default Recorded",
        day_offset: STANDARD_OFFSETS[0],
        description: "Your lender recorded a Notice of Default with the county. The reinstatement period starts today.",
        action_items: NOTICE_OF_DEFAULT_ACTIONS,
        urgency: Urgency::Critical,
    },
    MilestoneTemplate {
        id: "cash-offer-window",
        title: "Best Window for a Cash Sale",
        day_offset: STANDARD_OFFSETS[1],
        description: "Most of the reinstatement period is still ahead, so you have the widest choice of options and the most negotiating leverage.",
        action_items: &[
            "Compare a cash offer with a traditional listing",
            "Get a broker price opinion or an appraisal",
            "Ask your servicer about a loan modification or forbearance",
        ],
        urgency: Urgency::Safe,
    },
    MilestoneTemplate {
        id: "reinstatement-deadline",
        title: "Reinstatement Period Ending",
        day_offset: STANDARD_OFFSETS[2],
        description: "About two weeks remain before the lender can record a Notice of Trustee Sale. Reinstating the loan still stops the foreclosure.",
        action_items: &[
            "Confirm the final reinstatement figure with your servicer",
            "Choose between reinstating, selling or a short sale",
            "Sign any sale agreement before the notice of sale is recorded",
        ],
        urgency: Urgency::Warning,
    },
    MilestoneTemplate {
        id: "notice-of-sale",
        title: "Notice of Trustee Sale Recorded",
        day_offset: STANDARD_OFFSETS[3],
        description: "A trustee sale date is now scheduled at least 21 days out. Your options narrow quickly from here.",
        action_items: NOTICE_OF_SALE_ACTIONS,
        urgency: Urgency::Critical,
    },
    MilestoneTemplate {
        id: "trustee-sale",
        title: "Trustee Sale (Auction)",
        day_offset: STANDARD_OFFSETS[4],
        description: "The home can be sold at public auction. The right to reinstate ends five business days before this date.",
        action_items: TRUSTEE_SALE_ACTIONS,
        urgency: Urgency::Critical,
    },
];

static STATUTORY: [MilestoneTemplate; 5] = [
    MilestoneTemplate {
        id: "notice-of-default",
        title: "Notice of Default Recorded",
        day_offset: STATUTORY_OFFSETS[0],
        description: "The lender recorded a Notice of Default. State law gives you a 90-day cure period before a sale can be noticed.",
        action_items: NOTICE_OF_DEFAULT_ACTIONS,
        urgency: Urgency::Critical,
    },
    MilestoneTemplate {
        id: "first-month-review",
        title: "First Month Review",
        day_offset: STATUTORY_OFFSETS[1],
        description: "One month into the cure period. This is the time to lock in a plan while every option is still open.",
        action_items: &[
            "Follow up on any loss-mitigation application you submitted",
            "Get a written cash offer to compare against your other options",
            "List the debts and deadlines you need to resolve",
        ],
        urgency: Urgency::Safe,
    },
    MilestoneTemplate {
        id: "cure-period-ends",
        title: "Cure Period Ends",
        day_offset: STATUTORY_OFFSETS[2],
        description: "The statutory cure period is over. The lender may now record a Notice of Trustee Sale at any time.",
        action_items: &[
            "Get the current reinstatement amount in writing",
            "Make a final decision on selling or reinstating",
            "Keep copies of every letter and call log with your servicer",
        ],
        urgency: Urgency::Warning,
    },
    MilestoneTemplate {
        id: "notice-of-sale",
        title: "Notice of Trustee Sale Recorded",
        day_offset: STATUTORY_OFFSETS[3],
        description: "The Notice of Trustee Sale has been posted and recorded. The auction can happen 21 days later.",
        action_items: NOTICE_OF_SALE_ACTIONS,
        urgency: Urgency::Critical,
    },
    MilestoneTemplate {
        id: "trustee-sale",
        title: "Trustee Sale (Auction)",
        day_offset: STATUTORY_OFFSETS[4],
        description: "Earliest date the home can be sold at public auction.",
        action_items: TRUSTEE_SALE_ACTIONS,
        urgency: Urgency::Critical,
    },
];

/// Milestone templates for a variant, in ascending offset order
pub fn templates(variant: TimelineVariant) -> &'static [MilestoneTemplate] {
    match variant {
        TimelineVariant::Standard => &STANDARD,
        TimelineVariant::Statutory => &STATUTORY,
    }
}

pub fn find_template(variant: TimelineVariant, milestone_id: &str) -> Option<&'static MilestoneTemplate> {
    templates(variant).iter().find(|t| t.id == milestone_id)
}
