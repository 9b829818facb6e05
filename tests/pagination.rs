use grocery_drive_api::{response::PageMeta, routes::params::Pagination};

#[test]
fn pagination_defaults_and_bounds() {
    assert_eq!(Pagination::default().normalize(), (1, 20, 0));

    let page = Pagination {
        page: Some(3),
        per_page: Some(10),
    };
    assert_eq!(page.normalize(), (3, 10, 20));

    let out_of_range = Pagination {
        page: Some(-4),
        per_page: Some(1000),
    };
    assert_eq!(out_of_range.normalize(), (1, 100, 0));
}

#[test]
fn page_meta_counts_partial_pages() {
    assert_eq!(PageMeta::new(1, 20, 0).total_pages, 0);
    assert_eq!(PageMeta::new(1, 20, 20).total_pages, 1);
    assert_eq!(PageMeta::new(2, 20, 41).total_pages, 3);
}
