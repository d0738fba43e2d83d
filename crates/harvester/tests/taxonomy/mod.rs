use super::*;

fn catalog() -> MemorySource {
  MemorySource::new().with_records(Entity::Concepts, vec![
    concept("C41008148", "Computer science", 0, None),
    concept("C86803240", "Biology", 0, None),
    concept("C185592680", "Chemistry", 0, None),
    concept("C154945302", "Artificial intelligence", 1, Some("C41008148")),
    concept("C119857082", "Machine learning", 1, Some("C41008148")),
    concept("C54355233", "Genetics", 1, Some("C86803240")),
    concept("C108583219", "Deep learning", 2, Some("C119857082")),
  ])
}

fn harvester_with_clock(config: Config) -> (Harvester<MemorySource>, Arc<ManualClock>) {
  let clock = Arc::new(ManualClock::default());
  let cache = Arc::new(TaxonomyCache::new(config.cache_ttl()).with_clock(clock.clone()));
  (Harvester::new(catalog(), config).with_cache(cache), clock)
}

#[traced_test]
#[tokio::test]
async fn test_repeat_within_ttl_is_served_from_cache() {
  let (harvester, clock) = harvester_with_clock(Config::default());

  let first = harvester.root_concepts().await;
  clock.advance(Duration::from_secs(120));
  let second = harvester.concepts(0, None, 1).await;

  assert_eq!(first, second);
  assert_eq!(first.len(), 3);
  assert_eq!(harvester.source().calls(), 1);
  assert_eq!(harvester.source().requests()[0].per_page, Some(50));
}

#[traced_test]
#[tokio::test]
async fn test_expired_entry_is_refetched() {
  let (harvester, clock) = harvester_with_clock(Config::default().with_cache_ttl(Duration::from_secs(60)));

  harvester.root_concepts().await;
  clock.advance(Duration::from_secs(61));
  harvester.root_concepts().await;

  assert_eq!(harvester.source().calls(), 2);
  assert_eq!(harvester.cache().len(), 1);
}

#[traced_test]
#[tokio::test]
async fn test_children_are_cached_per_parent_and_page() {
  let (harvester, _clock) = harvester_with_clock(Config::default());

  let cs = harvester.concepts(1, Some("C41008148"), 1).await;
  let biology = harvester.concepts(1, Some("C86803240"), 1).await;
  let cs_page_two = harvester.concepts(1, Some("C41008148"), 2).await;
  harvester.concepts(1, Some("https://openalex.org/C41008148"), 1).await;

  assert_eq!(cs.iter().map(|node| node.name.as_str()).collect::<Vec<_>>(), vec![
    "Artificial intelligence",
    "Machine learning"
  ]);
  assert!(cs.iter().all(|node| node.parent.as_deref() == Some("C41008148")));
  assert_eq!(biology.len(), 1);
  assert!(cs_page_two.is_empty());
  assert_eq!(harvester.source().calls(), 3);
  assert_eq!(harvester.source().requests()[0].filter.as_deref(), Some("level:1,ancestors.id:C41008148"));
}

#[traced_test]
#[tokio::test]
async fn test_failed_listing_is_retried() {
  let clock = Arc::new(ManualClock::default());
  let cache = Arc::new(TaxonomyCache::new(Duration::from_secs(300)).with_clock(clock));
  let failing = Harvester::new(catalog().fail_from_call(1), Config::default()).with_cache(Arc::clone(&cache));

  assert!(failing.root_concepts().await.is_empty());
  assert!(cache.is_empty());

  // A second harvester sharing the cache fills it on its first call.
  let healthy = Harvester::new(catalog(), Config::default()).with_cache(Arc::clone(&cache));
  assert_eq!(healthy.root_concepts().await.len(), 3);
  assert_eq!(failing.root_concepts().await.len(), 3);
  assert_eq!(failing.source().calls(), 1);
}

#[traced_test]
#[tokio::test]
async fn test_concept_counts() {
  let (harvester, _clock) = harvester_with_clock(Config::default());

  let counts = harvester.concept_counts().await;

  assert_eq!(counts.get(&0), Some(&3));
  assert_eq!(counts.get(&1), Some(&3));
  assert_eq!(counts.get(&2), Some(&1));
  assert_eq!(counts.get(&4), Some(&0));
  assert!(harvester.cache().is_empty());
}

#[traced_test]
#[tokio::test]
async fn test_deep_level_passes_through() {
  let (harvester, _clock) = harvester_with_clock(Config::default());
  assert!(harvester.concepts(7, None, 1).await.is_empty());
  assert_eq!(harvester.source().requests()[0].filter.as_deref(), Some("level:7"));
}

#[traced_test]
#[tokio::test]
async fn test_page_zero_shares_the_first_page() {
  let (harvester, _clock) = harvester_with_clock(Config::default());

  let zero = harvester.concepts(0, None, 0).await;
  let first = harvester.concepts(0, None, 1).await;

  assert_eq!(zero, first);
  assert_eq!(harvester.source().calls(), 1);
  assert_eq!(harvester.cache().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shared_harvester_across_tasks() -> TestResult<()> {
  let source = catalog().with_records(Entity::Works, numbered_works(30));
  let harvester = Arc::new(Harvester::new(source, Config::default()));

  let tasks: Vec<_> = (0..16)
    .map(|i| {
      let harvester = Arc::clone(&harvester);
      tokio::spawn(async move {
        if i % 2 == 0 {
          let roots = harvester.root_concepts().await;
          let children = harvester.concepts(1, Some("C41008148"), 1).await;
          (roots.len(), children.len(), None)
        } else {
          let harvest = harvester.by_field("C41008148", 10, &["Title"]).await.ok();
          (0, 0, harvest.map(|harvest| harvest.retrieved))
        }
      })
    })
    .collect();

  for (i, task) in tasks.into_iter().enumerate() {
    let (roots, children, retrieved) = task.await?;
    if i % 2 == 0 {
      assert_eq!((roots, children), (3, 2));
    } else {
      assert_eq!(retrieved, Some(10));
    }
  }
  assert_eq!(harvester.cache().len(), 2);
  Ok(())
}
