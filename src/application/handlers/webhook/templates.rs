//! Email rendering helpers for reconciler notifications.
//!
//! Bodies are intentionally minimal; visual design of the email
//! templates lives with the frontend team.

use crate::domain::booking::InvoiceNumber;
use crate::domain::business::Plan;
use crate::domain::foundation::{Money, Timestamp};
use crate::ports::Email;

/// Booking confirmation sent to the client after payment.
pub(crate) fn booking_confirmation(
    client_email: &str,
    client_name: &str,
    business_name: &str,
    service_name: &str,
    starts_at: Timestamp,
    total: Money,
    invoice: Option<(&InvoiceNumber, &str)>,
) -> Email {
    let mut html = format!(
        "<h2>Your booking is confirmed</h2>\
         <p>Hi {client_name},</p>\
         <p>Your payment of {total} for <strong>{service_name}</strong> at \
         {business_name} has been received.</p>\
         <p>Appointment: {}</p>",
        starts_at.as_datetime().format("%A, %B %e %Y at %H:%M UTC"),
    );

    if let Some((number, url)) = invoice {
        html.push_str(&format!(
            "<p>Your invoice {number} is available <a href=\"{url}\">here</a>.</p>"
        ));
    }

    html.push_str(&format!("<p>See you soon,<br>{business_name}</p>"));

    Email::new(
        client_email,
        format!("Booking confirmed at {business_name}"),
        html,
    )
}

/// One-time welcome sent to the owner when their subscription first
/// becomes active.
pub(crate) fn subscription_welcome(
    owner_email: &str,
    business_name: &str,
    plan: Plan,
    billing_period: Option<&str>,
) -> Email {
    let period_line = match billing_period {
        Some("yearly") => "You are on yearly billing.",
        Some("monthly") => "You are on monthly billing.",
        _ => "Manage billing any time from your dashboard.",
    };

    let html = format!(
        "<h2>Welcome to Chairside {plan_name}</h2>\
         <p>{business_name} is now on the {plan_name} plan. {period_line}</p>\
         <p>Thanks for building your business with us.</p>",
        plan_name = plan.display_name(),
    );

    Email::new(
        owner_email,
        format!("Welcome to Chairside {}", plan.display_name()),
        html,
    )
}

/// Heads-up sent to the owner when a subscription payment fails.
pub(crate) fn payment_failed_notice(owner_email: &str, business_name: &str) -> Email {
    let html = format!(
        "<h2>Payment issue</h2>\
         <p>The latest subscription payment for {business_name} did not go \
         through. We will retry automatically; please check your payment \
         method to keep your plan active.</p>"
    );

    Email::new(owner_email, "Action needed: payment failed", html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::BookingId;

    #[test]
    fn confirmation_includes_invoice_link_when_present() {
        let number = InvoiceNumber::generate(Timestamp::from_unix_secs(1705276800), BookingId::new());
        let email = booking_confirmation(
            "client@example.com",
            "Dana",
            "Shear Bliss",
            "Balayage",
            Timestamp::from_unix_secs(1705276800),
            Money::from_major_minor(120, 0),
            Some((&number, "https://chairside.app/invoices/x.html")),
        );

        assert_eq!(email.to, "client@example.com");
        assert!(email.html.contains("https://chairside.app/invoices/x.html"));
        assert!(email.html.contains(number.as_str()));
    }

    #[test]
    fn confirmation_omits_invoice_link_when_absent() {
        let email = booking_confirmation(
            "client@example.com",
            "Dana",
            "Shear Bliss",
            "Balayage",
            Timestamp::now(),
            Money::from_major_minor(120, 0),
            None,
        );

        assert!(!email.html.contains("invoice"));
    }

    #[test]
    fn welcome_mentions_plan_and_period() {
        let email = subscription_welcome(
            "owner@example.com",
            "Shear Bliss",
            Plan::Pro,
            Some("yearly"),
        );

        assert!(email.subject.contains("Pro"));
        assert!(email.html.contains("yearly billing"));
    }

    #[test]
    fn payment_failed_notice_addresses_owner() {
        let email = payment_failed_notice("owner@example.com", "Shear Bliss");
        assert_eq!(email.to, "owner@example.com");
        assert!(email.html.contains("Shear Bliss"));
    }
}
