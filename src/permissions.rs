use serde::{Deserialize, Serialize};

use crate::models::{ProjectId, UserId};

/// What a requester may do with a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Permissions {
    pub view: bool,
    pub edit: bool,
}

impl Permissions {
    pub const NONE: Permissions = Permissions {
        view: false,
        edit: false,
    };
    pub const READ_ONLY: Permissions = Permissions {
        view: true,
        edit: false,
    };
    pub const FULL: Permissions = Permissions {
        view: true,
        edit: true,
    };

    pub const fn allows(self, access: Access) -> bool {
        match access {
            Access::View => self.view,
            Access::Edit => self.edit,
        }
    }
}

/// The right an operation needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    View,
    Edit,
}

/// The project columns the evaluator reads, plus whether the requester has a
/// membership row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectAccess {
    pub project_id: ProjectId,
    pub owner_id: UserId,
    pub public_view: bool,
    pub public_edit: bool,
    pub is_member: bool,
}

impl ProjectAccess {
    pub fn is_owner(&self, requester: Option<UserId>) -> bool {
        requester == Some(self.owner_id)
    }
}

/// Resolves the rights of `requester` (anonymous when `None`) on a project.
///
/// Owners and members get full rights. Everyone else gets what the public
/// flags grant, where editing always requires viewing.
pub fn evaluate(access: &ProjectAccess, requester: Option<UserId>) -> Permissions {
    if requester.is_some() && (access.is_owner(requester) || access.is_member) {
        return Permissions::FULL;
    }

    if !access.public_view {
        Permissions::NONE
    } else if !access.public_edit {
        Permissions::READ_ONLY
    } else {
        Permissions::FULL
    }
}

/// Result for a project that does not exist.
pub fn evaluate_missing() -> Permissions {
    Permissions::NONE
}
