use storefront_api::routes::params::Pagination;

#[test]
fn first_page_starts_at_zero() {
    assert_eq!(Pagination::default().normalize(10), (1, 10, 0));
    assert_eq!(Pagination::page(3).normalize(10), (3, 10, 20));
}

#[test]
fn page_size_and_page_are_clamped() {
    let pagination = Pagination {
        page: Some(-4),
        per_page: Some(500),
    };
    assert_eq!(pagination.normalize(10), (1, 100, 0));

    let pagination = Pagination {
        page: Some(2),
        per_page: Some(0),
    };
    assert_eq!(pagination.normalize(10), (2, 1, 1));
}

#[test]
fn huge_page_numbers_saturate_instead_of_overflowing() {
    let (page, per_page, offset) = Pagination {
        page: Some(i64::MAX),
        per_page: None,
    }
    .normalize(10);
    assert_eq!(page, i64::MAX);
    assert_eq!(per_page, 10);
    assert_eq!(offset, i64::MAX);

    let (_, _, offset) = Pagination {
        page: Some(i64::MAX / 2),
        per_page: Some(100),
    }
    .normalize(10);
    assert_eq!(offset, i64::MAX);
}
