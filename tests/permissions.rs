use storefront_api::{
    error::AppError,
    permissions::{Permission, PermissionSet, Role},
};

#[test]
fn bootstrap_roles_carry_their_codenames() {
    let content: Vec<&str> = Role::ContentManager
        .permissions()
        .iter()
        .map(|p| p.codename())
        .collect();
    assert_eq!(content, ["add_blog", "change_blog", "delete_blog", "view_blog"]);

    let moderator: Vec<&str> = Role::Moderator
        .permissions()
        .iter()
        .map(|p| p.codename())
        .collect();
    assert_eq!(
        moderator,
        [
            "can_cancel_publication",
            "can_change_description",
            "can_change_category"
        ]
    );
}

#[test]
fn codenames_round_trip_and_unknown_ones_are_ignored() {
    for perm in Permission::ALL {
        assert_eq!(Permission::from_codename(perm.codename()), Some(perm));
    }

    let perms = PermissionSet::from_codenames(["add_blog", "delete_everything"]);
    assert!(perms.has(Permission::AddBlog));
    assert!(!perms.has(Permission::ChangeBlog));
}

#[test]
fn superuser_holds_every_permission() {
    let perms = PermissionSet::superuser();
    assert!(Permission::ALL.iter().all(|p| perms.has(*p)));
}

#[test]
fn require_reports_forbidden() {
    let perms = PermissionSet::none();
    assert!(matches!(
        perms.require(Permission::AddBlog),
        Err(AppError::Forbidden)
    ));
    assert!(!perms.has_any(&[Permission::CanChangeCategory, Permission::ChangeBlog]));
}
