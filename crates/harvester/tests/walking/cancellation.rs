use super::*;

/// Serves from an inner catalog and cancels the walk once `after` pages have been served.
struct CancelAfter {
  inner:  MemorySource,
  cancel: CancellationToken,
  after:  usize,
  served: AtomicUsize,
}

#[async_trait::async_trait]
impl CatalogSource for CancelAfter {
  async fn fetch_page(&self, request: &PageRequest) -> Result<Page, HarvesterError> {
    let page = self.inner.fetch_page(request).await?;
    if self.served.fetch_add(1, Ordering::SeqCst) + 1 >= self.after {
      self.cancel.cancel();
    }
    Ok(page)
  }

  async fn fetch_entity(&self, entity: Entity, id: &str) -> Result<RawRecord, HarvesterError> {
    self.inner.fetch_entity(entity, id).await
  }
}

#[traced_test]
#[tokio::test]
async fn test_cancel_mid_walk_keeps_fetched_pages() {
  let cancel = CancellationToken::new();
  let source = CancelAfter {
    inner:  MemorySource::new().with_records(Entity::Works, numbered_works(100)),
    cancel: cancel.clone(),
    after:  2,
    served: AtomicUsize::new(0),
  };
  let query = Query::new("").with_page_size(10).with_cap(100);

  let records = Walker::new(&source).with_cancellation(cancel).fetch(&query).await;

  assert_eq!(records.len(), 20);
  assert_eq!(source.inner.calls(), 2);
}

#[traced_test]
#[tokio::test]
async fn test_cancelled_harvest_makes_no_requests() {
  let harvester =
    Harvester::new(MemorySource::new().with_records(Entity::Works, numbered_works(10)), Config::default());
  let cancel = CancellationToken::new();
  cancel.cancel();

  let harvest = harvester.by_field_with_cancel("C41008148", 10, &["Title"], cancel).await.unwrap();

  assert_eq!(harvest, Harvest::default());
  assert_eq!(harvester.source().calls(), 0);
}
