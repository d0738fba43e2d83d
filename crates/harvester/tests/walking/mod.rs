use super::*;

mod cancellation;

fn catalog(n: usize) -> MemorySource { MemorySource::new().with_records(Entity::Works, numbered_works(n)) }

#[traced_test]
#[tokio::test]
async fn test_cap_smaller_than_first_page() {
  let source = catalog(230);
  let query = Query::new("concepts.id:C41008148").with_page_size(200).with_cap(50);

  let records = Walker::new(&source).fetch(&query).await;

  assert_eq!(records.len(), 50);
  assert_eq!(records[0]["id"], json!("https://openalex.org/W0"));
  assert_eq!(source.calls(), 1);
}

#[traced_test]
#[tokio::test]
async fn test_source_exhausted_before_cap() {
  let source = catalog(230);
  let query = Query::new("concepts.id:C41008148").with_page_size(200).with_cap(250);

  let records = Walker::new(&source).fetch(&query).await;

  assert_eq!(records.len(), 230);
  assert_eq!(source.calls(), 2);
}

#[traced_test]
#[tokio::test]
async fn test_failed_first_request_is_not_an_error() {
  let source = catalog(230).fail_from_call(1);
  let records = Walker::new(&source).fetch(&Query::new("").with_cap(100)).await;
  assert!(records.is_empty());
}

#[traced_test]
#[tokio::test]
async fn test_cap_is_never_exceeded() {
  let source = catalog(75);
  for cap in [0, 1, 9, 10, 11, 74, 75, 76, 1000] {
    let query = Query::new("").with_page_size(10).with_cap(cap);
    let records = Walker::new(&source).fetch(&query).await;
    assert_eq!(records.len(), cap.min(75), "cap {cap}");
  }
}

#[traced_test]
#[tokio::test]
async fn test_cursor_and_offset_agree() {
  let source = catalog(64);
  let offset = Query::new("").with_page_size(25).with_cap(60);
  let cursor = offset.clone().with_pagination(Pagination::Cursor);

  let by_offset = Walker::new(&source).fetch(&offset).await;
  let by_cursor = Walker::new(&source).fetch(&cursor).await;

  assert_eq!(by_offset, by_cursor);
  assert_eq!(by_offset.len(), 60);
}

#[traced_test]
#[tokio::test]
async fn test_filter_reaches_the_source() {
  let source = MemorySource::new().with_records(Entity::Works, fixture_works());
  let query = Query::new("institutions.country_code:CA").with_cap(10);

  let records = Walker::new(&source).fetch(&query).await;

  assert_eq!(records.len(), 2);
  assert_eq!(source.requests()[0].filter.as_deref(), Some("institutions.country_code:CA"));
}

#[traced_test]
#[tokio::test]
async fn test_slow_page_ends_walk() {
  let source = catalog(10).with_delay(Duration::from_millis(250));
  let records = Walker::new(&source)
    .with_timeout(Duration::from_millis(20))
    .fetch(&Query::new("").with_cap(10))
    .await;
  assert!(records.is_empty());
  assert_eq!(source.calls(), 1);
}
