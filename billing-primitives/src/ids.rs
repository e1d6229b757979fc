//! Identifier types for the cloud resources the enforcer touches.
//!
//! All identifiers end up in REST paths or query filters, so they are
//! validated once at construction and never re-checked downstream.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const MAX_ID_LEN: usize = 128;
const PROJECTS_PREFIX: &str = "projects/";
const BILLING_ACCOUNTS_PREFIX: &str = "billingAccounts/";

/// Identifier of a Cloud Billing account (e.g. `012345-6789AB-CDEF01`).
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BillingAccountId(String);

impl BillingAccountId {
    /// Creates a billing account identifier after validating its format.
    ///
    /// A leading `billingAccounts/` prefix is accepted and stripped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidId`] if the identifier is empty, too long, or
    /// contains characters that cannot appear in a resource path segment.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let id = id.strip_prefix(BILLING_ACCOUNTS_PREFIX).unwrap_or(&id);
        validate_segment("billing account", id)?;
        Ok(Self(id.to_owned()))
    }

    /// Returns the bare identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the resource name, `billingAccounts/{id}`.
    #[must_use]
    pub fn resource_name(&self) -> String {
        format!("{BILLING_ACCOUNTS_PREFIX}{}", self.0)
    }
}

/// Identifier of a budget within a billing account.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BudgetId(String);

impl BudgetId {
    /// Creates a budget identifier after validating its format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidId`] when the identifier is not a valid path segment.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        validate_segment("budget", &id)?;
        Ok(Self(id))
    }

    /// Returns the bare identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Fully qualified budget name, `billingAccounts/{account}/budgets/{budget}`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct BudgetName {
    account: BillingAccountId,
    budget: BudgetId,
}

impl BudgetName {
    /// Combines an account and a budget identifier.
    #[must_use]
    pub fn new(account: BillingAccountId, budget: BudgetId) -> Self {
        Self { account, budget }
    }
}

impl Display for BudgetName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/budgets/{}",
            self.account.resource_name(),
            self.budget.as_str()
        )
    }
}

/// Identifier of a project, either its project ID or its project number.
///
/// Budget filters reference projects by number while the project listing
/// reports IDs; the billing API accepts both.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectId(String);

impl ProjectId {
    /// Creates a project identifier, accepting either `my-project` or
    /// `projects/my-project`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidId`] when the identifier is not a valid path segment.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let id = id.strip_prefix(PROJECTS_PREFIX).unwrap_or(&id);
        validate_segment("project", id)?;
        Ok(Self(id.to_owned()))
    }

    /// Returns the bare identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the resource name, `projects/{id}`.
    #[must_use]
    pub fn resource_name(&self) -> String {
        format!("{PROJECTS_PREFIX}{}", self.0)
    }
}

/// Identifier of the folder that parents the sandbox projects.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FolderId(String);

impl FolderId {
    /// Creates a folder identifier, accepting an optional `folders/` prefix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidId`] when the identifier is not a valid path segment.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let id = id.strip_prefix("folders/").unwrap_or(&id);
        validate_segment("folder", id)?;
        Ok(Self(id.to_owned()))
    }

    /// Returns the bare identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn validate_segment(kind: &'static str, id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::InvalidId {
            kind,
            id: String::new(),
            reason: "identifier cannot be empty".into(),
        });
    }

    if id.len() > MAX_ID_LEN {
        return Err(Error::InvalidId {
            kind,
            id: id.into(),
            reason: format!("identifier length must be <= {MAX_ID_LEN}"),
        });
    }

    // ':' shows up in domain-scoped project IDs such as `example.com:sandbox`.
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
    {
        return Err(Error::InvalidId {
            kind,
            id: id.into(),
            reason: "identifier must contain alphanumeric, dash, underscore, dot, or colon".into(),
        });
    }

    Ok(())
}

macro_rules! string_id_impls {
    ($($ty:ident),+ $(,)?) => {
        $(
            impl Display for $ty {
                fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }

            impl FromStr for $ty {
                type Err = Error;

                fn from_str(s: &str) -> Result<Self> {
                    Self::new(s)
                }
            }

            impl TryFrom<String> for $ty {
                type Error = Error;

                fn try_from(value: String) -> Result<Self> {
                    Self::new(value)
                }
            }

            impl From<$ty> for String {
                fn from(value: $ty) -> Self {
                    value.0
                }
            }
        )+
    };
}

string_id_impls!(BillingAccountId, BudgetId, ProjectId, FolderId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_id_strips_resource_prefix() {
        let bare = ProjectId::new("sandbox-1").expect("bare id");
        let prefixed = ProjectId::new("projects/sandbox-1").expect("prefixed id");
        assert_eq!(bare, prefixed);
        assert_eq!(prefixed.resource_name(), "projects/sandbox-1");
    }

    #[test]
    fn budget_name_formats_resource_path() {
        let name = BudgetName::new(
            BillingAccountId::new("012345-6789AB-CDEF01").unwrap(),
            BudgetId::new("b-42").unwrap(),
        );
        assert_eq!(
            name.to_string(),
            "billingAccounts/012345-6789AB-CDEF01/budgets/b-42"
        );
    }

    #[test]
    fn rejects_empty_and_path_like_ids() {
        assert!(matches!(
            BillingAccountId::new(""),
            Err(Error::InvalidId { kind: "billing account", .. })
        ));
        assert!(FolderId::new("123/../456").is_err());
        assert!(BudgetId::new("has space").is_err());
    }

    #[test]
    fn domain_scoped_project_ids_are_valid() {
        let id: ProjectId = "example.com:sandbox".parse().expect("parse");
        assert_eq!(id.as_str(), "example.com:sandbox");
    }

    #[test]
    fn billing_account_accepts_resource_name() {
        let id = BillingAccountId::new("billingAccounts/B1").unwrap();
        assert_eq!(id.as_str(), "B1");
        assert_eq!(id.resource_name(), "billingAccounts/B1");
    }

    #[test]
    fn deserialization_validates() {
        let id: ProjectId = serde_json::from_str("\"projects/123456\"").expect("valid");
        assert_eq!(id.as_str(), "123456");
        assert!(serde_json::from_str::<FolderId>("\"\"").is_err());
    }
}
