use std::collections::{BTreeSet, HashMap};

use scopegate_core::{BranchId, RoleId};
use scopegate_domain::{
    Branch, BranchAccessRule, Principal, ResourcePolicyCatalog, Role, ScopeTag,
};

use crate::role_graph::EffectiveRoles;

/// Branch visibility resolved for one principal and resource type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScopeResolution {
    /// Widest scope across the principal's roles, if any role applies.
    pub scope: Option<ScopeTag>,
    /// Union of the per-role branch sets.
    pub branches: BTreeSet<BranchId>,
    /// Branch access rules that narrowed at least one role.
    pub applied_rules: Vec<String>,
}

/// Pure resolver from roles and branch data to accessible branches.
pub struct ScopeResolver<'a> {
    policies: &'a ResourcePolicyCatalog,
    branches: &'a [Branch],
    rules: &'a [BranchAccessRule],
}

struct ScopedRole {
    role_id: Option<RoleId>,
    scope: ScopeTag,
    bound_branches: Vec<BranchId>,
}

impl<'a> ScopeResolver<'a> {
    /// Creates a resolver over already loaded branches and rules.
    #[must_use]
    pub fn new(
        policies: &'a ResourcePolicyCatalog,
        branches: &'a [Branch],
        rules: &'a [BranchAccessRule],
    ) -> Self {
        Self {
            policies,
            branches,
            rules,
        }
    }

    /// Resolves the scope of one role for a resource type.
    ///
    /// The resource table wins over the role's own tag. Tenant roles never
    /// resolve wider than `AGENCY`.
    #[must_use]
    pub fn role_scope(&self, role: &Role, resource_type: &str) -> ScopeTag {
        let scope = self
            .policies
            .role_scope(resource_type, role.slug())
            .unwrap_or(role.scope());

        if role.is_system() {
            scope
        } else {
            scope.narrowed_to(ScopeTag::Agency)
        }
    }

    /// Returns the widest scope the principal resolves for a resource type.
    #[must_use]
    pub fn widest_scope(
        &self,
        principal: &Principal,
        roles: &EffectiveRoles,
        resource_type: &str,
        requested_scope: Option<ScopeTag>,
    ) -> Option<ScopeTag> {
        self.scoped_roles(principal, roles, resource_type, requested_scope)
            .iter()
            .map(|scoped| scoped.scope)
            .reduce(ScopeTag::widest)
    }

    /// Resolves the branches reachable for a resource type.
    #[must_use]
    pub fn resolve(
        &self,
        principal: &Principal,
        roles: &EffectiveRoles,
        resource_type: &str,
        action: Option<&str>,
        requested_scope: Option<ScopeTag>,
    ) -> ScopeResolution {
        let mut resolution = ScopeResolution::default();

        for scoped in self.scoped_roles(principal, roles, resource_type, requested_scope) {
            let mut reachable = self.expand(principal, &scoped);

            for rule in self.rules.iter().filter(|rule| {
                rule.tenant_id == principal.tenant_id
                    && rule.applies_to(scoped.role_id, resource_type, action)
            }) {
                reachable = reachable.intersection(&rule.branch_ids).copied().collect();
                let label = format!("branch_rule:{}", rule.name);
                if !resolution.applied_rules.contains(&label) {
                    resolution.applied_rules.push(label);
                }
            }

            resolution.scope = Some(match resolution.scope {
                Some(current) => current.widest(scoped.scope),
                None => scoped.scope,
            });
            resolution.branches.extend(reachable);
        }

        resolution
    }

    fn scoped_roles(
        &self,
        principal: &Principal,
        roles: &EffectiveRoles,
        resource_type: &str,
        requested_scope: Option<ScopeTag>,
    ) -> Vec<ScopedRole> {
        let narrow = |scope: ScopeTag| match requested_scope {
            Some(ceiling) => scope.narrowed_to(ceiling),
            None => scope,
        };

        if roles.is_empty() {
            return principal
                .legacy_role
                .as_deref()
                .and_then(|legacy| self.policies.role_scope(resource_type, legacy))
                .map(|scope| ScopedRole {
                    role_id: None,
                    scope: narrow(scope.narrowed_to(ScopeTag::Agency)),
                    bound_branches: Vec::new(),
                })
                .into_iter()
                .collect();
        }

        roles
            .direct
            .iter()
            .map(|direct| ScopedRole {
                role_id: Some(direct.role.id()),
                scope: narrow(self.role_scope(&direct.role, resource_type)),
                bound_branches: direct
                    .role
                    .branch_id()
                    .into_iter()
                    .chain(direct.assignment.branch_id)
                    .collect(),
            })
            .collect()
    }

    fn expand(&self, principal: &Principal, scoped: &ScopedRole) -> BTreeSet<BranchId> {
        match scoped.scope {
            ScopeTag::Global => self.branches.iter().map(|branch| branch.id).collect(),
            ScopeTag::Agency => self
                .branches
                .iter()
                .filter(|branch| branch.tenant_id == principal.tenant_id)
                .map(|branch| branch.id)
                .collect(),
            ScopeTag::Branch => {
                let roots = principal
                    .branch_id
                    .into_iter()
                    .chain(principal.managed_branch_ids.iter().copied())
                    .chain(scoped.bound_branches.iter().copied());
                self.with_descendants(roots)
            }
            ScopeTag::Assigned | ScopeTag::Own => principal.branch_id.into_iter().collect(),
        }
    }

    fn with_descendants(&self, roots: impl Iterator<Item = BranchId>) -> BTreeSet<BranchId> {
        let mut children: HashMap<BranchId, Vec<BranchId>> = HashMap::new();
        for branch in self.branches {
            if let Some(parent_id) = branch.parent_branch_id {
                children.entry(parent_id).or_default().push(branch.id);
            }
        }

        let mut reachable = BTreeSet::new();
        let mut pending: Vec<BranchId> = roots.collect();
        while let Some(branch_id) = pending.pop() {
            if reachable.insert(branch_id)
                && let Some(descendants) = children.get(&branch_id)
            {
                pending.extend(descendants.iter().copied());
            }
        }

        reachable
    }
}
