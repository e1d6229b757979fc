//! Snapshots of remote resources fetched during one invocation.

use crate::ids::ProjectId;

/// Budget resource, reduced to the parts the enforcer reads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Budget {
    name: String,
    display_name: Option<String>,
    projects: Vec<ProjectId>,
}

impl Budget {
    /// Creates a budget scoped to the supplied projects.
    #[must_use]
    pub fn new(name: impl Into<String>, projects: Vec<ProjectId>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            projects,
        }
    }

    /// Sets the human-readable display name.
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Returns the budget resource name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the display name if the budget has one.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Returns the projects listed in the budget filter.
    #[must_use]
    pub fn projects(&self) -> &[ProjectId] {
        &self.projects
    }
}

/// Billing association of a single project.
///
/// An empty account name means the project is detached from billing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProjectBillingInfo {
    billing_account_name: String,
    billing_enabled: bool,
}

impl ProjectBillingInfo {
    /// Creates a snapshot from its raw fields.
    #[must_use]
    pub fn new(billing_account_name: impl Into<String>, billing_enabled: bool) -> Self {
        Self {
            billing_account_name: billing_account_name.into(),
            billing_enabled,
        }
    }

    /// Snapshot of a project with no billing account attached.
    #[must_use]
    pub fn detached() -> Self {
        Self::default()
    }

    /// Returns the linked account name (`billingAccounts/{id}`), or `""`.
    #[must_use]
    pub fn billing_account_name(&self) -> &str {
        &self.billing_account_name
    }

    /// Returns the enabled flag reported by the billing service.
    #[must_use]
    pub const fn billing_enabled(&self) -> bool {
        self.billing_enabled
    }
}

/// Entry returned by the project listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectSummary {
    project_id: ProjectId,
    project_number: Option<String>,
    lifecycle_state: Option<String>,
}

impl ProjectSummary {
    /// Creates a summary for the supplied project.
    #[must_use]
    pub fn new(project_id: ProjectId) -> Self {
        Self {
            project_id,
            project_number: None,
            lifecycle_state: None,
        }
    }

    /// Sets the numeric project identifier.
    #[must_use]
    pub fn with_project_number(mut self, number: impl Into<String>) -> Self {
        self.project_number = Some(number.into());
        self
    }

    /// Sets the lifecycle state (e.g. `ACTIVE`).
    #[must_use]
    pub fn with_lifecycle_state(mut self, state: impl Into<String>) -> Self {
        self.lifecycle_state = Some(state.into());
        self
    }

    /// Returns the project identifier.
    #[must_use]
    pub fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    /// Returns the numeric project identifier if reported.
    #[must_use]
    pub fn project_number(&self) -> Option<&str> {
        self.project_number.as_deref()
    }

    /// Returns the lifecycle state if reported.
    #[must_use]
    pub fn lifecycle_state(&self) -> Option<&str> {
        self.lifecycle_state.as_deref()
    }
}
