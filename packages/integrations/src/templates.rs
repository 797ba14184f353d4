// ABOUTME: HTML email templates for lead notifications and visitor confirmations
// ABOUTME: All interpolated values are HTML-escaped

use porchlight_core::escape_html;

/// Subject and body of a rendered email
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

const BRAND: &str = "Porchlight Home Solutions";

fn layout(heading: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html><body style="font-family: Arial, sans-serif; color: #1f2933; max-width: 600px; margin: 0 auto;">
<h2 style="color: #0b4f6c;">{heading}</h2>
{body}
<hr style="border: none; border-top: 1px solid #d9e2ec; margin-top: 32px;">
<p style="font-size: 12px; color: #829ab1;">{brand}</p>
</body></html>"#,
        heading = escape_html(heading),
        body = body,
        brand = BRAND,
    )
}

fn greeting(name: Option<&str>) -> String {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(n) => format!("<p>Hi {},</p>", escape_html(n)),
        None => "<p>Hi there,</p>".to_string(),
    }
}

/// Internal notification sent to the brokerage for every new lead
pub fn lead_notification(form_label: &str, fields: &[(&str, Option<String>)]) -> RenderedEmail {
    let rows: String = fields
        .iter()
        .filter_map(|(label, value)| {
            value.as_ref().map(|v| {
                format!(
                    "<tr><td style=\"padding: 4px 12px 4px 0; font-weight: bold;\">{}</td><td>{}</td></tr>",
                    escape_html(label),
                    escape_html(v)
                )
            })
        })
        .collect();

    RenderedEmail {
        subject: format!("New lead: {}", form_label),
        html: layout(
            &format!("New {} submission", form_label),
            &format!("<table>{}</table>", rows),
        ),
    }
}

/// Confirmation sent to a visitor after a contact or popup form
pub fn visitor_confirmation(name: Option<&str>) -> RenderedEmail {
    let body = format!(
        "{}<p>Thanks for reaching out. A foreclosure specialist will contact you within one business day.</p>\
         <p>If your situation is urgent, reply to this email with your trustee sale date and we will prioritise your request.</p>",
        greeting(name)
    );

    RenderedEmail {
        subject: "We received your request".to_string(),
        html: layout("We're on it", &body),
    }
}

/// Receipt sent after a cash-offer request
pub fn cash_offer_receipt(name: Option<&str>, property_address: &str) -> RenderedEmail {
    let body = format!(
        "{}<p>We received your cash-offer request for <strong>{}</strong>.</p>\
         <p>Our team reviews every property within 24 hours and will send a no-obligation offer once the review is complete.</p>",
        greeting(name),
        escape_html(property_address)
    );

    RenderedEmail {
        subject: "Your cash offer request".to_string(),
        html: layout("Cash offer request received", &body),
    }
}

/// Link to a saved foreclosure timeline
pub fn timeline_link(name: Option<&str>, timeline_url: &str, next_step: Option<&str>) -> RenderedEmail {
    let next = next_step
        .map(|s| format!("<p>Your next milestone: <strong>{}</strong>.</p>", escape_html(s)))
        .unwrap_or_default();

    let body = format!(
        "{}<p>Your personalised foreclosure timeline is ready.</p>{}\
         <p><a href=\"{}\">View your timeline and checklist</a></p>",
        greeting(name),
        next,
        escape_html(timeline_url)
    );

    RenderedEmail {
        subject: "Your foreclosure timeline".to_string(),
        html: layout("Your foreclosure timeline", &body),
    }
}

/// Download link for a published guide
pub fn guide_delivery(name: Option<&str>, guide_url: &str) -> RenderedEmail {
    let body = format!(
        "{}<p>Thanks for requesting our guide. You can read it any time at the link below.</p>\
         <p><a href=\"{}\">Open your guide</a></p>\
         <p>Questions about your own situation? Reply to this email and a specialist will get back to you.</p>",
        greeting(name),
        escape_html(guide_url)
    );

    RenderedEmail {
        subject: "Your Porchlight guide".to_string(),
        html: layout("Your guide is ready", &body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lead_notification_skips_missing_fields_and_escapes() {
        let email = lead_notification(
            "Contact Form",
            &[
                ("Name", Some("<script>x</script>".to_string())),
                ("Phone", None),
            ],
        );

        assert_eq!(email.subject, "New lead: Contact Form");
        assert!(email.html.contains("&lt;script&gt;"));
        assert!(!email.html.contains("<script>"));
        assert!(!email.html.contains("Phone"));
    }

    #[test]
    fn test_greeting_falls_back_without_name() {
        let email = visitor_confirmation(Some("  "));
        assert!(email.html.contains("Hi there,"));
    }

    #[test]
    fn test_timeline_link_includes_url_and_next_step() {
        let email = timeline_link(
            Some("Lee"),
            "https://example.com/timeline/t-1?a=1&b=2",
            Some("Notice of Trustee Sale"),
        );
        assert!(email.html.contains("https://example.com/timeline/t-1?a=1&amp;b=2"));
        assert!(email.html.contains("Notice of Trustee Sale"));
    }

    #[test]
    fn test_guide_delivery_links_to_guide() {
        let email = guide_delivery(None, "https://example.com/guides/sale-date-basics");
        assert_eq!(email.subject, "Your Porchlight guide");
        assert!(email.html.contains("href=\"https://example.com/guides/sale-date-basics\""));
        assert!(email.html.contains("Hi there,"));
    }
}
