use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

/// Permission codenames as stored in `group_permissions`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    AddBlog,
    ChangeBlog,
    DeleteBlog,
    ViewBlog,
    CanCancelPublication,
    CanChangeDescription,
    CanChangeCategory,
}

impl Permission {
    pub const ALL: [Permission; 7] = [
        Permission::AddBlog,
        Permission::ChangeBlog,
        Permission::DeleteBlog,
        Permission::ViewBlog,
        Permission::CanCancelPublication,
        Permission::CanChangeDescription,
        Permission::CanChangeCategory,
    ];

    pub fn codename(self) -> &'static str {
        match self {
            Permission::AddBlog => "add_blog",
            Permission::ChangeBlog => "change_blog",
            Permission::DeleteBlog => "delete_blog",
            Permission::ViewBlog => "view_blog",
            Permission::CanCancelPublication => "can_cancel_publication",
            Permission::CanChangeDescription => "can_change_description",
            Permission::CanChangeCategory => "can_change_category",
        }
    }

    pub fn from_codename(codename: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.codename() == codename)
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.codename())
    }
}

/// The two bootstrap groups and their fixed permission sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    ContentManager,
    Moderator,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::ContentManager, Role::Moderator];

    pub fn group_name(self) -> &'static str {
        match self {
            Role::ContentManager => "content_manager",
            Role::Moderator => "moderator",
        }
    }

    pub fn permissions(self) -> &'static [Permission] {
        match self {
            Role::ContentManager => &[
                Permission::AddBlog,
                Permission::ChangeBlog,
                Permission::DeleteBlog,
                Permission::ViewBlog,
            ],
            Role::Moderator => &[
                Permission::CanCancelPublication,
                Permission::CanChangeDescription,
                Permission::CanChangeCategory,
            ],
        }
    }
}

/// Effective permissions of one user: the union of its groups, or
/// everything for a superuser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    superuser: bool,
    granted: BTreeSet<Permission>,
}

impl PermissionSet {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn superuser() -> Self {
        Self {
            superuser: true,
            granted: BTreeSet::new(),
        }
    }

    pub fn from_permissions(perms: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            superuser: false,
            granted: perms.into_iter().collect(),
        }
    }

    /// Unknown codenames are ignored.
    pub fn from_codenames<I, S>(codenames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_permissions(
            codenames
                .into_iter()
                .filter_map(|c| Permission::from_codename(c.as_ref())),
        )
    }

    pub fn has(&self, perm: Permission) -> bool {
        self.superuser || self.granted.contains(&perm)
    }

    pub fn has_any(&self, perms: &[Permission]) -> bool {
        perms.iter().any(|p| self.has(*p))
    }

    pub fn require(&self, perm: Permission) -> AppResult<()> {
        if self.has(perm) {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}
