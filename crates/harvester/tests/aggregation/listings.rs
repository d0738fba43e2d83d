use super::*;

fn catalog() -> MemorySource {
  MemorySource::new()
    .with_records(Entity::Institutions, vec![
      institution(1, "Sorbonne Université", "FR"),
      institution(2, "Harvard University", "US"),
      institution(3, "Stanford University", "US"),
      institution(4, "University of Tokyo", "JP"),
      institution(5, "MIT", "US"),
    ])
    .with_records(Entity::Works, fixture_works())
}

#[traced_test]
#[tokio::test]
async fn test_countries_largest_first() {
  let harvester = Harvester::new(catalog(), Config::default());

  let countries = harvester.countries().await;

  let codes: Vec<&str> = countries.iter().map(|country| country.code.as_str()).collect();
  assert_eq!(codes, vec!["US", "FR", "JP"]);
  assert_eq!(countries[0].count, 3);
  assert_eq!(harvester.source().requests()[0].group_by.as_deref(), Some("country_code"));
}

#[traced_test]
#[tokio::test]
async fn test_countries_fail_open() {
  let harvester = Harvester::new(catalog().fail_from_call(1), Config::default());
  assert!(harvester.countries().await.is_empty());
}

#[traced_test]
#[tokio::test]
async fn test_institutions_in_country_walks_cursor() {
  let harvester = Harvester::new(catalog(), Config::default().with_page_size(2));

  let institutions = harvester.institutions_in_country("US").await;

  let names: Vec<&str> = institutions.iter().map(|institution| institution.name.as_str()).collect();
  assert_eq!(names, vec!["Harvard University", "Stanford University", "MIT"]);
  assert_eq!(institutions[2].works_count, 50);
  let requests = harvester.source().requests();
  assert_eq!(requests.len(), 2);
  assert!(requests.iter().all(|request| request.filter.as_deref() == Some("country_code:US")));
}

#[traced_test]
#[tokio::test]
async fn test_listing_cap_bounds_institutions() {
  let config = Config::default().with_page_size(2).with_listing_cap(1);
  let harvester = Harvester::new(catalog(), config);
  assert_eq!(harvester.institutions_in_country("US").await.len(), 1);
  assert_eq!(harvester.source().calls(), 1);
}

#[traced_test]
#[tokio::test]
async fn test_institution_detail() -> TestResult<()> {
  let harvester = Harvester::new(catalog(), Config::default());

  let tokyo = harvester.institution("https://openalex.org/I4").await?;
  assert_eq!(tokyo.name, "University of Tokyo");
  assert_eq!(tokyo.country, "JP");
  assert_eq!(tokyo.cited_by_count, 400);

  assert!(matches!(harvester.institution("I404").await, Err(HarvesterError::NotFound(id)) if id == "I404"));
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_recent_publications() {
  let harvester = Harvester::new(catalog(), Config::default());
  let publications = harvester.recent_publications("I204465549", 10).await;
  assert_eq!(publications.len(), 1);
  assert_eq!(publications[0].publication_date, "1951-11-01");
  assert!(harvester.recent_publications("I204465549", 0).await.is_empty());
}
