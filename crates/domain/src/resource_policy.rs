//! Table-driven per-resource-type visibility rules.
//!
//! A [`ResourcePolicyCatalog`] is an explicitly constructed value handed to the
//! authorization service. It maps role slugs to scopes and visible field
//! categories for each resource type, and knows which record fields carry
//! branch, tenant, assignment and ownership information.

use std::collections::{BTreeMap, BTreeSet};

use scopegate_core::{BranchId, TenantId, UserId};

use crate::{DataFilter, ScopeTag};

/// Field group on a resource guarded by one permission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCategory {
    /// Permission slugs required to view the category.
    pub permissions: Vec<String>,
    /// Record fields belonging to the category.
    pub fields: Vec<String>,
}

/// Visibility rules for one resource type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePolicy {
    resource_type: String,
    role_scopes: BTreeMap<String, ScopeTag>,
    field_categories: BTreeMap<String, FieldCategory>,
    role_field_categories: BTreeMap<String, BTreeSet<String>>,
    default_field_categories: BTreeSet<String>,
    tenant_field: String,
    branch_field: Option<String>,
    assignment_field: Option<String>,
    owner_field: String,
}

impl ResourcePolicy {
    /// Starts a policy for a resource type with conventional field names.
    #[must_use]
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            role_scopes: BTreeMap::new(),
            field_categories: BTreeMap::new(),
            role_field_categories: BTreeMap::new(),
            default_field_categories: BTreeSet::new(),
            tenant_field: "agency_id".to_owned(),
            branch_field: Some("branch_id".to_owned()),
            assignment_field: None,
            owner_field: "created_by".to_owned(),
        }
    }

    /// Maps a role slug to its scope for this resource type.
    #[must_use]
    pub fn with_role_scope(mut self, role_slug: &str, scope: ScopeTag) -> Self {
        self.role_scopes.insert(role_slug.to_owned(), scope);
        self
    }

    /// Declares a field category and the permission guarding it.
    #[must_use]
    pub fn with_field_category(mut self, category: &str, permission: &str, fields: &[&str]) -> Self {
        self.field_categories.insert(
            category.to_owned(),
            FieldCategory {
                permissions: vec![permission.to_owned()],
                fields: fields.iter().map(|field| (*field).to_owned()).collect(),
            },
        );
        self
    }

    /// Declares which categories a role may view.
    #[must_use]
    pub fn with_role_fields(mut self, role_slug: &str, categories: &[&str]) -> Self {
        self.role_field_categories.insert(
            role_slug.to_owned(),
            categories.iter().map(|category| (*category).to_owned()).collect(),
        );
        self
    }

    /// Declares categories visible to roles absent from the role table.
    #[must_use]
    pub fn with_default_fields(mut self, categories: &[&str]) -> Self {
        self.default_field_categories = categories
            .iter()
            .map(|category| (*category).to_owned())
            .collect();
        self
    }

    /// Marks the record field that names the assigned principal.
    #[must_use]
    pub fn with_assignment_field(mut self, field: &str) -> Self {
        self.assignment_field = Some(field.to_owned());
        self
    }

    /// Marks the resource as agency-level, without a branch column.
    #[must_use]
    pub fn without_branch_field(mut self) -> Self {
        self.branch_field = None;
        self
    }

    /// Returns the resource type.
    #[must_use]
    pub fn resource_type(&self) -> &str {
        self.resource_type.as_str()
    }

    /// Returns the scope mapped for a role slug.
    #[must_use]
    pub fn role_scope(&self, role_slug: &str) -> Option<ScopeTag> {
        self.role_scopes.get(&role_slug.to_ascii_lowercase()).copied()
    }

    /// Returns whether records carry an assignee.
    #[must_use]
    pub fn has_assignment(&self) -> bool {
        self.assignment_field.is_some()
    }

    /// Returns the declared field categories.
    #[must_use]
    pub fn field_categories(&self) -> &BTreeMap<String, FieldCategory> {
        &self.field_categories
    }

    /// Returns field category → permission slugs visible to any of the role slugs.
    #[must_use]
    pub fn visible_field_permissions<'a>(
        &self,
        role_slugs: impl IntoIterator<Item = &'a str>,
    ) -> BTreeMap<String, Vec<String>> {
        let mut visible = BTreeSet::new();
        let mut any_role = false;

        for slug in role_slugs {
            any_role = true;
            match self.role_field_categories.get(slug) {
                Some(categories) => visible.extend(categories.iter().cloned()),
                None => visible.extend(self.default_field_categories.iter().cloned()),
            }
        }

        if !any_role {
            visible.extend(self.default_field_categories.iter().cloned());
        }

        visible
            .into_iter()
            .filter_map(|category| {
                self.field_categories
                    .get(&category)
                    .map(|definition| (category, definition.permissions.clone()))
            })
            .collect()
    }

    /// Builds the listing predicate for an effective scope.
    #[must_use]
    pub fn data_filter(&self, scope: ScopeTag, subject: &FilterSubject<'_>) -> DataFilter {
        match scope {
            ScopeTag::Global => DataFilter::Unrestricted,
            ScopeTag::Agency => DataFilter::eq(self.tenant_field.as_str(), subject.tenant_id),
            ScopeTag::Branch => match self.branch_field.as_deref() {
                Some(branch_field) => DataFilter::one_of(branch_field, subject.accessible_branches),
                None => DataFilter::eq(self.tenant_field.as_str(), subject.tenant_id),
            },
            ScopeTag::Assigned => {
                let mut alternatives = Vec::new();
                if let Some(assignment_field) = self.assignment_field.as_deref() {
                    alternatives.push(DataFilter::eq(assignment_field, subject.user_id));
                }
                match (self.branch_field.as_deref(), subject.branch_id) {
                    (Some(branch_field), Some(branch_id)) => {
                        alternatives.push(DataFilter::eq(branch_field, branch_id));
                    }
                    _ => alternatives.push(DataFilter::eq(self.owner_field.as_str(), subject.user_id)),
                }
                DataFilter::Any {
                    filters: alternatives,
                }
            }
            ScopeTag::Own => DataFilter::eq(self.owner_field.as_str(), subject.user_id),
        }
    }
}

/// Principal attributes referenced by data filters.
#[derive(Debug, Clone, Copy)]
pub struct FilterSubject<'a> {
    /// Principal id.
    pub user_id: UserId,
    /// Principal tenant.
    pub tenant_id: TenantId,
    /// Principal home branch.
    pub branch_id: Option<BranchId>,
    /// Branches resolved for the resource type.
    pub accessible_branches: &'a BTreeSet<BranchId>,
}

/// Resource policies keyed by resource type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourcePolicyCatalog {
    policies: BTreeMap<String, ResourcePolicy>,
}

impl ResourcePolicyCatalog {
    /// Creates an empty catalog; every resource falls back to role scope tags.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Adds or replaces one resource policy.
    #[must_use]
    pub fn with_policy(mut self, policy: ResourcePolicy) -> Self {
        self.policies
            .insert(policy.resource_type().to_owned(), policy);
        self
    }

    /// Returns the policy for a resource type.
    #[must_use]
    pub fn policy(&self, resource_type: &str) -> Option<&ResourcePolicy> {
        self.policies.get(resource_type)
    }

    /// Returns the scope mapped for a role on a resource type.
    #[must_use]
    pub fn role_scope(&self, resource_type: &str, role_slug: &str) -> Option<ScopeTag> {
        self.policy(resource_type)
            .and_then(|policy| policy.role_scope(role_slug))
    }

    /// Default rules for the education-agency CRM resources.
    #[must_use]
    pub fn education_agency_defaults() -> Self {
        use crate::catalog::role_slugs::{
            ACCOUNTANT, AGENCY_ADMIN, BRANCH_MANAGER, CONSULTANT, RECEPTIONIST, STUDENT,
            SUPER_ADMIN,
        };

        let students = ResourcePolicy::new("students")
            .with_role_scope(SUPER_ADMIN, ScopeTag::Global)
            .with_role_scope(AGENCY_ADMIN, ScopeTag::Agency)
            .with_role_scope(BRANCH_MANAGER, ScopeTag::Branch)
            .with_role_scope(CONSULTANT, ScopeTag::Assigned)
            .with_role_scope(RECEPTIONIST, ScopeTag::Branch)
            .with_role_scope(ACCOUNTANT, ScopeTag::Agency)
            .with_role_scope(STUDENT, ScopeTag::Own)
            .with_field_category(
                "personal",
                "students.read",
                &["first_name", "last_name", "email", "phone", "date_of_birth"],
            )
            .with_field_category(
                "academic",
                "students.read_academic",
                &["qualifications", "test_scores", "preferred_courses"],
            )
            .with_field_category(
                "financial",
                "students.read_financial",
                &["budget", "payment_status", "invoices"],
            )
            .with_field_category(
                "documents",
                "documents.read",
                &["passport_number", "visa_status", "attachments"],
            )
            .with_role_fields(SUPER_ADMIN, &["personal", "academic", "financial", "documents"])
            .with_role_fields(AGENCY_ADMIN, &["personal", "academic", "financial", "documents"])
            .with_role_fields(BRANCH_MANAGER, &["personal", "academic", "financial", "documents"])
            .with_role_fields(CONSULTANT, &["personal", "academic"])
            .with_role_fields(RECEPTIONIST, &["personal"])
            .with_role_fields(ACCOUNTANT, &["personal", "financial"])
            .with_role_fields(STUDENT, &["personal", "academic", "documents"])
            .with_default_fields(&["personal"])
            .with_assignment_field("assigned_to");

        let applications = ResourcePolicy::new("applications")
            .with_role_scope(SUPER_ADMIN, ScopeTag::Global)
            .with_role_scope(AGENCY_ADMIN, ScopeTag::Agency)
            .with_role_scope(BRANCH_MANAGER, ScopeTag::Branch)
            .with_role_scope(CONSULTANT, ScopeTag::Assigned)
            .with_role_scope(ACCOUNTANT, ScopeTag::Agency)
            .with_role_scope(STUDENT, ScopeTag::Own)
            .with_field_category("summary", "applications.read", &["institution", "course", "intake", "status"])
            .with_field_category("financial", "applications.read_financial", &["tuition_fee", "commission"])
            .with_role_fields(CONSULTANT, &["summary"])
            .with_role_fields(STUDENT, &["summary"])
            .with_default_fields(&["summary", "financial"])
            .with_assignment_field("assigned_to");

        let leads = ResourcePolicy::new("leads")
            .with_role_scope(SUPER_ADMIN, ScopeTag::Global)
            .with_role_scope(AGENCY_ADMIN, ScopeTag::Agency)
            .with_role_scope(BRANCH_MANAGER, ScopeTag::Branch)
            .with_role_scope(CONSULTANT, ScopeTag::Assigned)
            .with_role_scope(RECEPTIONIST, ScopeTag::Branch)
            .with_field_category("contact", "leads.read", &["name", "email", "phone", "source"])
            .with_default_fields(&["contact"])
            .with_assignment_field("assigned_to");

        let tasks = ResourcePolicy::new("tasks")
            .with_role_scope(SUPER_ADMIN, ScopeTag::Global)
            .with_role_scope(AGENCY_ADMIN, ScopeTag::Agency)
            .with_role_scope(BRANCH_MANAGER, ScopeTag::Branch)
            .with_role_scope(CONSULTANT, ScopeTag::Assigned)
            .with_role_scope(RECEPTIONIST, ScopeTag::Assigned)
            .with_role_scope(ACCOUNTANT, ScopeTag::Assigned)
            .with_assignment_field("assigned_to");

        let invoices = ResourcePolicy::new("invoices")
            .with_role_scope(SUPER_ADMIN, ScopeTag::Global)
            .with_role_scope(AGENCY_ADMIN, ScopeTag::Agency)
            .with_role_scope(ACCOUNTANT, ScopeTag::Agency)
            .with_role_scope(BRANCH_MANAGER, ScopeTag::Branch)
            .with_role_scope(STUDENT, ScopeTag::Own)
            .with_field_category("billing", "invoices.read", &["amount", "currency", "due_date", "status"])
            .with_default_fields(&["billing"]);

        let branches = ResourcePolicy::new("branches")
            .with_role_scope(SUPER_ADMIN, ScopeTag::Global)
            .with_role_scope(AGENCY_ADMIN, ScopeTag::Agency)
            .with_role_scope(BRANCH_MANAGER, ScopeTag::Branch);

        let reports = ResourcePolicy::new("reports")
            .with_role_scope(SUPER_ADMIN, ScopeTag::Global)
            .with_role_scope(AGENCY_ADMIN, ScopeTag::Agency)
            .with_role_scope(ACCOUNTANT, ScopeTag::Agency)
            .with_role_scope(BRANCH_MANAGER, ScopeTag::Branch)
            .without_branch_field();

        Self::empty()
            .with_policy(students)
            .with_policy(applications)
            .with_policy(leads)
            .with_policy(tasks)
            .with_policy(invoices)
            .with_policy(branches)
            .with_policy(reports)
    }
}
