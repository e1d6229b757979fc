//! Billing decision types returned by the policy rules.

/// Describes what should happen to a project's billing association.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionKind {
    /// Leave the association untouched.
    Keep,
    /// Clear the billing account, disabling billing.
    Detach,
    /// Link the project back to the sandbox billing account.
    Attach,
}

/// Structured decision emitted by the billing policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingDecision {
    kind: DecisionKind,
    reason: String,
}

impl BillingDecision {
    /// Returns a keep decision with an explanatory reason.
    #[must_use]
    pub fn keep(reason: impl Into<String>) -> Self {
        Self {
            kind: DecisionKind::Keep,
            reason: reason.into(),
        }
    }

    /// Returns a detach decision.
    #[must_use]
    pub fn detach(reason: impl Into<String>) -> Self {
        Self {
            kind: DecisionKind::Detach,
            reason: reason.into(),
        }
    }

    /// Returns an attach decision.
    #[must_use]
    pub fn attach(reason: impl Into<String>) -> Self {
        Self {
            kind: DecisionKind::Attach,
            reason: reason.into(),
        }
    }

    /// Returns the decision kind.
    #[must_use]
    pub fn kind(&self) -> DecisionKind {
        self.kind
    }

    /// Returns true when no mutation is required.
    #[must_use]
    pub fn is_keep(&self) -> bool {
        self.kind == DecisionKind::Keep
    }

    /// Returns true when billing must be disabled.
    #[must_use]
    pub fn is_detach(&self) -> bool {
        self.kind == DecisionKind::Detach
    }

    /// Returns true when billing must be restored.
    #[must_use]
    pub fn is_attach(&self) -> bool {
        self.kind == DecisionKind::Attach
    }

    /// Returns the reason associated with the decision.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}
