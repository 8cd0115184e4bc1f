use storefront_api::{
    dto::versions::VersionEdit,
    models::ProductVersion,
    services::version_service::{SINGLE_CURRENT_MESSAGE, VersionOp, plan_version_changes},
    validation::FieldErrors,
};
use uuid::Uuid;

fn version(product_id: Uuid, number: &str, is_current: bool) -> ProductVersion {
    ProductVersion {
        id: Uuid::new_v4(),
        product_id,
        version_number: number.to_string(),
        version_name: format!("Release {number}"),
        is_current,
    }
}

fn assert_single_current_error(errors: &FieldErrors) {
    assert_eq!(
        errors.get(FieldErrors::NON_FIELD),
        Some(&[SINGLE_CURRENT_MESSAGE.to_string()][..])
    );
}

#[test]
fn two_new_current_versions_are_rejected() {
    let errors = plan_version_changes(
        &[],
        &[
            VersionEdit::new_version("1.0", "First", true),
            VersionEdit::new_version("2.0", "Second", true),
        ],
    )
    .expect_err("two current versions");
    assert_single_current_error(&errors);
}

#[test]
fn promoting_while_another_stays_current_is_rejected() {
    let product_id = Uuid::new_v4();
    let v1 = version(product_id, "1.0", true);
    let v2 = version(product_id, "2.0", false);

    let errors = plan_version_changes(&[v1, v2.clone()], &[VersionEdit::set_current(v2.id, true)])
        .expect_err("v1 is still current");
    assert_single_current_error(&errors);
}

#[test]
fn swapping_the_current_version_demotes_before_promoting() {
    let product_id = Uuid::new_v4();
    let v1 = version(product_id, "1.0", true);
    let v2 = version(product_id, "2.0", false);

    let ops = plan_version_changes(
        &[v1.clone(), v2.clone()],
        &[
            VersionEdit::set_current(v2.id, true),
            VersionEdit::set_current(v1.id, false),
        ],
    )
    .expect("valid swap");

    let promotion = ops.iter().position(VersionOp::is_promotion).expect("promotion");
    let demotion = ops
        .iter()
        .position(|op| matches!(op, VersionOp::Update { id, is_current: false, .. } if *id == v1.id))
        .expect("demotion");
    assert!(demotion < promotion);
}

#[test]
fn deleting_the_current_version_frees_the_slot() {
    let product_id = Uuid::new_v4();
    let v1 = version(product_id, "1.0", true);

    let ops = plan_version_changes(
        &[v1.clone()],
        &[
            VersionEdit::new_version("2.0", "Second", true),
            VersionEdit::remove(v1.id),
        ],
    )
    .expect("delete then insert");

    assert_eq!(ops.first(), Some(&VersionOp::Delete(v1.id)));
    assert!(matches!(ops.last(), Some(VersionOp::Insert { is_current: true, .. })));
}

#[test]
fn row_errors_are_keyed_by_position() {
    let errors = plan_version_changes(
        &[],
        &[
            VersionEdit::new_version("1.0", "First", false),
            VersionEdit::new_version("", "Second", false),
        ],
    )
    .expect_err("missing number");
    assert!(errors.contains("versions[1].version_number"));
    assert!(!errors.contains("versions[0].version_number"));
}

#[test]
fn foreign_and_repeated_ids_are_rejected() {
    let product_id = Uuid::new_v4();
    let v1 = version(product_id, "1.0", false);

    let errors = plan_version_changes(&[v1.clone()], &[VersionEdit::remove(Uuid::new_v4())])
        .expect_err("unknown version");
    assert!(errors.contains("versions[0]"));

    let errors = plan_version_changes(
        &[v1.clone()],
        &[
            VersionEdit::set_current(v1.id, false),
            VersionEdit::remove(v1.id),
        ],
    )
    .expect_err("same version twice");
    assert!(errors.contains("versions[1]"));
}

#[test]
fn untouched_fields_keep_their_stored_values() {
    let product_id = Uuid::new_v4();
    let v1 = version(product_id, "1.0", false);

    let ops = plan_version_changes(&[v1.clone()], &[VersionEdit::set_current(v1.id, true)])
        .expect("single promotion");
    assert_eq!(
        ops,
        vec![VersionOp::Update {
            id: v1.id,
            version_number: "1.0".to_string(),
            version_name: "Release 1.0".to_string(),
            is_current: true,
        }]
    );
}
