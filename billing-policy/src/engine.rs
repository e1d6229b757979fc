//! Spend evaluation and billing-state rules.

use billing_primitives::ProjectBillingInfo;

use crate::decision::BillingDecision;

/// Cost and budget amounts reported by a budget notification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpendReport {
    cost_amount: f64,
    budget_amount: f64,
}

impl SpendReport {
    /// Creates a report from the notification amounts.
    #[must_use]
    pub const fn new(cost_amount: f64, budget_amount: f64) -> Self {
        Self {
            cost_amount,
            budget_amount,
        }
    }

    /// Returns the accrued cost.
    #[must_use]
    pub const fn cost_amount(&self) -> f64 {
        self.cost_amount
    }

    /// Returns the budgeted amount.
    #[must_use]
    pub const fn budget_amount(&self) -> f64 {
        self.budget_amount
    }

    /// Share of the budget already spent, in percent.
    ///
    /// Only meaningful for logging; a zero budget yields infinity or NaN.
    #[must_use]
    pub fn used_percent(&self) -> f64 {
        self.cost_amount * 100.0 / self.budget_amount
    }

    /// Returns true once the cost has reached the budget.
    #[must_use]
    pub fn exceeds_budget(&self) -> bool {
        self.cost_amount >= self.budget_amount
    }
}

/// Returns true when the project still has some billing association.
///
/// Either a linked account or the enabled flag counts.
#[must_use]
pub fn has_billing_attached(info: &ProjectBillingInfo) -> bool {
    !info.billing_account_name().is_empty() || info.billing_enabled()
}

/// Returns true when the project is missing a linked account or has billing
/// switched off.
#[must_use]
pub fn needs_billing_restored(info: &ProjectBillingInfo) -> bool {
    info.billing_account_name().is_empty() || !info.billing_enabled()
}

/// Decides what to do with an over-budget project.
#[must_use]
pub fn decide_over_budget(info: &ProjectBillingInfo) -> BillingDecision {
    if has_billing_attached(info) {
        BillingDecision::detach("cost threshold reached")
    } else {
        BillingDecision::keep("billing already disabled")
    }
}

/// Decides whether a sandbox project must be linked back to billing.
#[must_use]
pub fn decide_reassignment(info: &ProjectBillingInfo) -> BillingDecision {
    if needs_billing_restored(info) {
        BillingDecision::attach("billing disabled")
    } else {
        BillingDecision::keep("billing already enabled")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn under_budget_is_not_exceeded() {
        let report = SpendReport::new(99.99, 100.0);
        assert!(!report.exceeds_budget());
        assert!((report.used_percent() - 99.99).abs() < 1e-9);
    }

    #[test]
    fn reaching_budget_exactly_counts_as_exceeded() {
        assert!(SpendReport::new(100.0, 100.0).exceeds_budget());
        assert!(SpendReport::new(150.0, 100.0).exceeds_budget());
        assert!(SpendReport::new(0.0, 0.0).exceeds_budget());
    }

    #[test]
    fn zero_cost_never_exceeds_positive_budget() {
        for budget in [0.01, 1.0, 100.0, 1e9] {
            assert!(!SpendReport::new(0.0, budget).exceeds_budget());
        }
    }

    #[test]
    fn detach_when_account_or_flag_present() {
        let linked = ProjectBillingInfo::new("billingAccounts/B1", true);
        let flag_only = ProjectBillingInfo::new("", true);
        let account_only = ProjectBillingInfo::new("billingAccounts/B1", false);

        assert!(decide_over_budget(&linked).is_detach());
        assert!(decide_over_budget(&flag_only).is_detach());
        assert!(decide_over_budget(&account_only).is_detach());
        assert!(decide_over_budget(&ProjectBillingInfo::detached()).is_keep());
    }

    #[test]
    fn attach_when_account_missing_or_flag_off() {
        let linked = ProjectBillingInfo::new("billingAccounts/B1", true);
        let account_only = ProjectBillingInfo::new("billingAccounts/B1", false);

        assert!(decide_reassignment(&linked).is_keep());
        assert!(decide_reassignment(&account_only).is_attach());
        assert!(decide_reassignment(&ProjectBillingInfo::new("", true)).is_attach());
        assert!(decide_reassignment(&ProjectBillingInfo::detached()).is_attach());
    }
}
