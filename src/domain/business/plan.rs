//! Subscription plan and status tags.

use serde::{Deserialize, Serialize};

/// Subscription plan of a business account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    /// No paid subscription.
    #[default]
    Free,
    /// Paid plan for single-location businesses.
    Pro,
    /// Paid plan for multi-location businesses.
    Business,
}

impl Plan {
    /// Parse a plan from its metadata tag.
    pub fn from_tag(s: &str) -> Option<Self> {
        match s {
            "free" => Some(Self::Free),
            "pro" => Some(Self::Pro),
            "business" => Some(Self::Business),
            _ => None,
        }
    }

    /// The plan's metadata tag.
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Pro => "pro",
            Self::Business => "business",
        }
    }

    /// Display name used in email copy.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Free => "Free",
            Self::Pro => "Pro",
            Self::Business => "Business",
        }
    }
}

/// Subscription status mirrored from the payment provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Subscription is current.
    Active,
    /// Payment failed, provider is retrying.
    PastDue,
    /// Subscription ended.
    Canceled,
}

impl SubscriptionStatus {
    /// Map a provider status string onto the local status tags.
    ///
    /// Provider statuses outside the local model (e.g. `incomplete`)
    /// return `None`; callers leave the stored status untouched for those.
    pub fn from_provider(s: &str) -> Option<Self> {
        match s {
            "active" | "trialing" => Some(Self::Active),
            "past_due" | "unpaid" => Some(Self::PastDue),
            "canceled" | "incomplete_expired" => Some(Self::Canceled),
            _ => None,
        }
    }

    /// The status tag as persisted.
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::PastDue => "past_due",
            Self::Canceled => "canceled",
        }
    }
}
