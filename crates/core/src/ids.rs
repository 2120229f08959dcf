use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppError, AppResult};

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID value.
            #[must_use]
            pub fn from_uuid(value: Uuid) -> Self {
                Self(value)
            }

            /// Parses an identifier from its transport representation.
            pub fn parse(value: &str) -> AppResult<Self> {
                Uuid::parse_str(value.trim())
                    .map(Self)
                    .map_err(|error| {
                        AppError::Validation(format!("invalid {} '{value}': {error}", $label))
                    })
            }

            /// Returns the underlying UUID value.
            #[must_use]
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Display for $name {
            fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
                write!(formatter, "{}", self.0)
            }
        }
    };
}

uuid_identifier!(
    /// Tenant (agency) identifier used as the partition key for every persisted resource.
    TenantId,
    "tenant id"
);
uuid_identifier!(
    /// Branch identifier; branches are the unit of data-visibility scoping.
    BranchId,
    "branch id"
);
uuid_identifier!(
    /// Principal (user) identifier.
    UserId,
    "user id"
);
uuid_identifier!(
    /// Role identifier.
    RoleId,
    "role id"
);
uuid_identifier!(
    /// Role assignment identifier.
    AssignmentId,
    "assignment id"
);
uuid_identifier!(
    /// Direct user permission grant identifier.
    GrantId,
    "grant id"
);
uuid_identifier!(
    /// Access policy identifier.
    PolicyId,
    "policy id"
);
uuid_identifier!(
    /// Resource restriction identifier.
    RestrictionId,
    "restriction id"
);
uuid_identifier!(
    /// Branch access rule identifier.
    BranchRuleId,
    "branch rule id"
);
