//! Subscription state, termination reasons and class (RFC 6665 §4.1.3)

use std::fmt;

use serde::Serialize;

/// Reason a subscription was terminated
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TerminationReason {
    Deactivated,
    Probation,
    Rejected,
    Timeout,
    GiveUp,
    NoResource,
    InvariantViolation,
    /// Reason token not defined by RFC 6665
    Extension(String),
}

impl TerminationReason {
    /// Parse the `reason` parameter of a Subscription-State header
    pub fn from_token(token: &str) -> Self {
        match token.to_ascii_lowercase().as_str() {
            "deactivated" => Self::Deactivated,
            "probation" => Self::Probation,
            "rejected" => Self::Rejected,
            "timeout" => Self::Timeout,
            "giveup" => Self::GiveUp,
            "noresource" => Self::NoResource,
            "invariant" => Self::InvariantViolation,
            _ => Self::Extension(token.to_string()),
        }
    }

    /// Wire token as carried in a Subscription-State header
    pub fn as_str(&self) -> &str {
        match self {
            Self::Deactivated => "deactivated",
            Self::Probation => "probation",
            Self::Rejected => "rejected",
            Self::Timeout => "timeout",
            Self::GiveUp => "giveup",
            Self::NoResource => "noresource",
            Self::InvariantViolation => "invariant",
            Self::Extension(token) => token,
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subscription state as seen by the dialog
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubscriptionStatus {
    /// Created, no NOTIFY exchanged yet
    Neutral,
    Active,
    Pending,
    Terminated(TerminationReason),
    /// State token not defined by RFC 6665
    Extension(String),
}

impl SubscriptionStatus {
    pub fn is_terminated(&self) -> bool {
        matches!(self, Self::Terminated(_))
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Neutral => f.write_str("neutral"),
            Self::Active => f.write_str("active"),
            Self::Pending => f.write_str("pending"),
            Self::Terminated(reason) => write!(f, "terminated;reason={}", reason),
            Self::Extension(token) => f.write_str(token),
        }
    }
}

/// Which side of the subscription we are
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionClass {
    /// We sent the SUBSCRIBE (subscriber)
    Initiator,
    /// We received the SUBSCRIBE (notifier)
    Receiver,
}

impl fmt::Display for SubscriptionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initiator => f.write_str("initiator"),
            Self::Receiver => f.write_str("receiver"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_tokens() {
        assert_eq!(TerminationReason::from_token("giveup"), TerminationReason::GiveUp);
        assert_eq!(TerminationReason::from_token("NoResource"), TerminationReason::NoResource);
        assert_eq!(TerminationReason::from_token("invariant"), TerminationReason::InvariantViolation);
        assert_eq!(
            TerminationReason::from_token("x-custom"),
            TerminationReason::Extension("x-custom".to_string())
        );
        assert_eq!(TerminationReason::GiveUp.to_string(), "giveup");
    }

    #[test]
    fn test_status_display() {
        assert_eq!(SubscriptionStatus::Active.to_string(), "active");
        assert_eq!(
            SubscriptionStatus::Terminated(TerminationReason::Timeout).to_string(),
            "terminated;reason=timeout"
        );
        assert!(SubscriptionStatus::Terminated(TerminationReason::Rejected).is_terminated());
        assert!(!SubscriptionStatus::Pending.is_terminated());
    }

    #[test]
    fn test_serialized_names() {
        let json = serde_json::to_value(SubscriptionStatus::Terminated(TerminationReason::GiveUp)).unwrap();
        assert_eq!(json, serde_json::json!({ "terminated": "give-up" }));
        assert_eq!(serde_json::to_value(SubscriptionClass::Receiver).unwrap(), "receiver");
    }
}
