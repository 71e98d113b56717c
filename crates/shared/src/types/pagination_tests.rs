use super::*;

#[test]
fn test_page_request_default() {
    let request = PageRequest::default();
    assert_eq!(request.page, 1);
    assert_eq!(request.per_page, 50);
}

#[test]
fn test_page_request_offset() {
    let request = PageRequest {
        page: 1,
        per_page: 20,
    };
    assert_eq!(request.offset(), 0);

    let request = PageRequest {
        page: 3,
        per_page: 20,
    };
    assert_eq!(request.offset(), 40);
}

#[test]
fn test_huge_page_offset_saturates() {
    let request = PageRequest::new(Some(u64::MAX), Some(50));
    assert_eq!(request.offset(), i64::MAX.unsigned_abs());
}

#[test]
fn test_page_request_new_clamps() {
    let request = PageRequest::new(Some(0), Some(0));
    assert_eq!(request.page, 1);
    assert_eq!(request.per_page, 1);

    let request = PageRequest::new(None, Some(10_000));
    assert_eq!(request.per_page, MAX_PER_PAGE);
}

#[test]
fn test_page_meta_middle_page() {
    let meta = PageMeta::new(&PageRequest::new(Some(2), Some(10)), 35);

    assert_eq!(meta.pages, 4);
    assert!(meta.has_next);
    assert!(meta.has_prev);
}

#[test]
fn test_page_meta_last_page() {
    let meta = PageMeta::new(&PageRequest::new(Some(4), Some(10)), 35);
    assert!(!meta.has_next);
    assert!(meta.has_prev);
}

#[test]
fn test_page_meta_empty() {
    let meta = PageMeta::new(&PageRequest::default(), 0);
    assert_eq!(meta.pages, 0);
    assert!(!meta.has_next);
    assert!(!meta.has_prev);
}
