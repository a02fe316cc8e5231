//! Subscription state machine
//!
//! `Idle → Subscribed → Closed`, one way. A closed subscription is never
//! reopened.

/// Why a subscription closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Completed,
    Failed,
    TransportError,
}

/// Lifecycle of the single stream subscription of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubscriptionState {
    #[default]
    Idle,
    Subscribed,
    Closed(CloseReason),
}

impl SubscriptionState {
    pub fn is_subscribed(&self) -> bool {
        matches!(self, SubscriptionState::Subscribed)
    }

    /// `Idle → Subscribed`. Returns false from any other state.
    pub(crate) fn subscribe(&mut self) -> bool {
        match self {
            SubscriptionState::Idle => {
                *self = SubscriptionState::Subscribed;
                true
            }
            _ => false,
        }
    }

    /// `Subscribed → Closed`. Returns false from any other state.
    pub(crate) fn close(&mut self, reason: CloseReason) -> bool {
        match self {
            SubscriptionState::Subscribed => {
                *self = SubscriptionState::Closed(reason);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_way_transitions() {
        let mut state = SubscriptionState::default();
        assert!(!state.close(CloseReason::Completed));
        assert_eq!(state, SubscriptionState::Idle);

        assert!(state.subscribe());
        assert!(state.is_subscribed());
        assert!(!state.subscribe());

        assert!(state.close(CloseReason::Failed));
        assert_eq!(state, SubscriptionState::Closed(CloseReason::Failed));

        assert!(!state.close(CloseReason::TransportError));
        assert!(!state.subscribe());
        assert_eq!(state, SubscriptionState::Closed(CloseReason::Failed));
    }
}
