//! Default permission catalog and role templates for education agencies.

use scopegate_core::{AppResult, RoleId, TenantId};

use crate::{Permission, PermissionKey, Role, RoleInput, RolePermissionGrant, ScopeTag};

/// Slugs of the built-in roles.
pub mod role_slugs {
    /// System-wide administrator.
    pub const SUPER_ADMIN: &str = "super_admin";
    /// Agency-wide administrator.
    pub const AGENCY_ADMIN: &str = "agency_admin";
    /// Branch office manager.
    pub const BRANCH_MANAGER: &str = "branch_manager";
    /// Student counsellor working assigned records.
    pub const CONSULTANT: &str = "consultant";
    /// Finance staff.
    pub const ACCOUNTANT: &str = "accountant";
    /// Front desk staff.
    pub const RECEPTIONIST: &str = "receptionist";
    /// Student self-service account.
    pub const STUDENT: &str = "student";
}

struct ResourceSpec {
    resource: &'static str,
    category: &'static str,
    actions: &'static [&'static str],
}

const CRUD: &[&str] = &["create", "read", "update", "delete"];

const RESOURCE_SPECS: [ResourceSpec; 18] = [
    ResourceSpec {
        resource: "students",
        category: "core",
        actions: &[
            "create",
            "read",
            "update",
            "delete",
            "assign",
            "export",
            "read_academic",
            "read_financial",
        ],
    },
    ResourceSpec {
        resource: "applications",
        category: "core",
        actions: &[
            "create",
            "read",
            "update",
            "delete",
            "assign",
            "approve",
            "read_financial",
        ],
    },
    ResourceSpec {
        resource: "leads",
        category: "core",
        actions: &["create", "read", "update", "delete", "assign", "export"],
    },
    ResourceSpec {
        resource: "tasks",
        category: "core",
        actions: &["create", "read", "update", "delete", "assign"],
    },
    ResourceSpec {
        resource: "documents",
        category: "core",
        actions: &["create", "read", "update", "delete", "approve"],
    },
    ResourceSpec {
        resource: "invoices",
        category: "finance",
        actions: &["create", "read", "update", "delete", "approve", "export"],
    },
    ResourceSpec {
        resource: "billing",
        category: "finance",
        actions: &["read", "manage"],
    },
    ResourceSpec {
        resource: "reports",
        category: "analytics",
        actions: &["read", "export"],
    },
    ResourceSpec {
        resource: "marketing",
        category: "marketing",
        actions: CRUD,
    },
    ResourceSpec {
        resource: "events",
        category: "marketing",
        actions: CRUD,
    },
    ResourceSpec {
        resource: "branches",
        category: "administration",
        actions: &["create", "read", "update", "delete", "manage"],
    },
    ResourceSpec {
        resource: "users",
        category: "administration",
        actions: &["create", "read", "update", "delete", "manage"],
    },
    ResourceSpec {
        resource: "settings",
        category: "administration",
        actions: &["read", "manage"],
    },
    ResourceSpec {
        resource: "roles",
        category: "security",
        actions: &["create", "read", "update", "delete", "manage", "assign"],
    },
    ResourceSpec {
        resource: "permissions",
        category: "security",
        actions: &["read", "manage"],
    },
    ResourceSpec {
        resource: "restrictions",
        category: "security",
        actions: &["read", "manage"],
    },
    ResourceSpec {
        resource: "policies",
        category: "security",
        actions: &["read", "manage"],
    },
    ResourceSpec {
        resource: "audit_logs",
        category: "security",
        actions: &["read", "export"],
    },
];

/// Returns the default permission catalog.
pub fn list_default_permissions() -> AppResult<Vec<Permission>> {
    RESOURCE_SPECS
        .iter()
        .flat_map(|spec| {
            spec.actions.iter().map(move |action| {
                Permission::new(
                    spec.resource,
                    *action,
                    spec.category,
                    format!("{} {}", action.replace('_', " "), spec.resource),
                )
            })
        })
        .collect()
}

/// Built-in role shape used by bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleTemplate {
    /// Role slug.
    pub slug: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Authority level.
    pub level: i32,
    /// Default scope.
    pub scope: ScopeTag,
    /// Parent template slug, created before this one.
    pub parent_slug: Option<&'static str>,
    /// Granted permission slugs; `*` is accepted on either side.
    pub permissions: &'static [&'static str],
    /// System roles are tenant-less and created once per installation.
    pub is_system: bool,
}

impl RoleTemplate {
    /// Materializes the template as a role for `tenant_id`.
    pub fn to_role(
        &self,
        role_id: RoleId,
        tenant_id: Option<TenantId>,
        parent_role_id: Option<RoleId>,
    ) -> AppResult<Role> {
        let grants = self
            .permissions
            .iter()
            .map(|slug| PermissionKey::from_slug(slug).map(RolePermissionGrant::full))
            .collect::<AppResult<Vec<_>>>()?;

        Role::new(
            role_id,
            RoleInput {
                tenant_id,
                slug: self.slug.to_owned(),
                name: self.name.to_owned(),
                level: self.level,
                scope: self.scope,
                branch_id: None,
                parent_role_id,
                grants,
            },
        )
    }
}

const ROLE_TEMPLATES: [RoleTemplate; 7] = [
    RoleTemplate {
        slug: role_slugs::SUPER_ADMIN,
        name: "Super Admin",
        level: 100,
        scope: ScopeTag::Global,
        parent_slug: None,
        permissions: &["*.*"],
        is_system: true,
    },
    RoleTemplate {
        slug: role_slugs::CONSULTANT,
        name: "Consultant",
        level: 50,
        scope: ScopeTag::Assigned,
        parent_slug: None,
        permissions: &[
            "students.create",
            "students.read",
            "students.update",
            "students.read_academic",
            "applications.*",
            "leads.read",
            "leads.update",
            "tasks.*",
            "documents.create",
            "documents.read",
            "events.read",
        ],
        is_system: false,
    },
    RoleTemplate {
        slug: role_slugs::BRANCH_MANAGER,
        name: "Branch Manager",
        level: 70,
        scope: ScopeTag::Branch,
        parent_slug: Some(role_slugs::CONSULTANT),
        permissions: &[
            "students.*",
            "leads.*",
            "documents.*",
            "reports.read",
            "branches.read",
            "users.read",
            "invoices.read",
            "events.*",
        ],
        is_system: false,
    },
    RoleTemplate {
        slug: role_slugs::AGENCY_ADMIN,
        name: "Agency Admin",
        level: 90,
        scope: ScopeTag::Agency,
        parent_slug: Some(role_slugs::BRANCH_MANAGER),
        permissions: &[
            "roles.*",
            "permissions.*",
            "restrictions.*",
            "policies.*",
            "branches.*",
            "users.*",
            "settings.*",
            "reports.*",
            "audit_logs.*",
            "billing.*",
            "invoices.*",
            "marketing.*",
        ],
        is_system: false,
    },
    RoleTemplate {
        slug: role_slugs::ACCOUNTANT,
        name: "Accountant",
        level: 60,
        scope: ScopeTag::Agency,
        parent_slug: None,
        permissions: &[
            "students.read",
            "students.read_financial",
            "applications.read",
            "applications.read_financial",
            "invoices.*",
            "billing.*",
            "reports.read",
        ],
        is_system: false,
    },
    RoleTemplate {
        slug: role_slugs::RECEPTIONIST,
        name: "Receptionist",
        level: 30,
        scope: ScopeTag::Branch,
        parent_slug: None,
        permissions: &[
            "students.create",
            "students.read",
            "leads.create",
            "leads.read",
            "tasks.create",
            "tasks.read",
            "events.read",
        ],
        is_system: false,
    },
    RoleTemplate {
        slug: role_slugs::STUDENT,
        name: "Student",
        level: 10,
        scope: ScopeTag::Own,
        parent_slug: None,
        permissions: &[
            "students.read",
            "students.update",
            "applications.read",
            "documents.create",
            "documents.read",
            "invoices.read",
        ],
        is_system: false,
    },
];

/// Returns every built-in role template, parents before children.
#[must_use]
pub fn list_default_role_templates() -> &'static [RoleTemplate] {
    &ROLE_TEMPLATES
}
