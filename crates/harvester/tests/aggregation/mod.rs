use super::*;

mod listings;

fn harvester() -> Harvester<MemorySource> {
  let source = MemorySource::new()
    .with_records(Entity::Works, fixture_works())
    .with_records(Entity::Institutions, vec![
      institution(57206974, "New York University", "US"),
      institution(70931966, "Université de Montréal", "CA"),
    ]);
  Harvester::new(source, Config::default())
}

#[traced_test]
#[tokio::test]
async fn test_by_country_projects_selected_columns() -> TestResult<()> {
  let harvester = harvester();

  let harvest = harvester.by_country("CA", 10, &["Title", "Pages", "Venue", "Open Access"]).await?;

  assert_eq!(harvest.retrieved, 2);
  let first = &harvest.rows[0];
  assert_eq!(first.columns().collect::<Vec<_>>(), vec![
    Column::Title,
    Column::Pages,
    Column::Venue,
    Column::OpenAccess
  ]);
  assert_eq!(first.get(Column::Pages), Some(&Cell::Text("e4375".into())));
  assert_eq!(first.get(Column::Venue), Some(&Cell::Text("PeerJ".into())));
  assert_eq!(first.get(Column::OpenAccess), Some(&Cell::Flag(true)));

  let second = &harvest.rows[1];
  assert_eq!(second.get(Column::Title), Some(&Cell::Text("Deep learning".into())));
  assert_eq!(second.get(Column::Pages), Some(&Cell::Text("436-444".into())));
  assert_eq!(second.get(Column::Venue), Some(&Cell::Text("Nature".into())));

  let request = &harvester.source().requests()[0];
  assert_eq!(request.filter.as_deref(), Some("institutions.country_code:CA"));
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_by_field_defaults_missing_attributes() -> TestResult<()> {
  let harvester = harvester();

  let harvest = harvester
    .by_field("https://openalex.org/C86803240", 10, &[
      "DOI",
      "Authors",
      "Cited by Count",
      "Is Retracted",
      "Language",
    ])
    .await?;

  assert_eq!(harvest.retrieved, 1);
  let values: Vec<String> = harvest.rows[0].values().map(ToString::to_string).collect();
  assert_eq!(values, vec!["N/A", "N/A", "0", "N/A", "N/A"]);
  assert_eq!(harvester.source().requests()[0].filter.as_deref(), Some("concepts.id:C86803240"));
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_by_institution_with_identifier() -> TestResult<()> {
  let harvester = harvester();

  let harvest = harvester.by_institution("I57206974", 10, &["Authors"]).await?;

  assert_eq!(harvest.retrieved, 1);
  assert_eq!(
    harvest.rows[0].get(Column::Authors),
    Some(&Cell::Text("Yann LeCun, Yoshua Bengio, Geoffrey Hinton".into()))
  );
  assert_eq!(harvester.source().calls(), 1);
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_by_institution_with_name() -> TestResult<()> {
  let harvester = harvester();

  let harvest = harvester.by_institution("montréal", 10, &["Title"]).await?;

  assert_eq!(harvest.retrieved, 1);
  assert_eq!(harvester.source().requests()[1].filter.as_deref(), Some("institutions.id:I70931966"));
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_unknown_column_fails_before_any_request() {
  let harvester = harvester();

  let result = harvester.by_country("US", 10, &["Title", "DOI", "Bogus"]).await;

  assert!(matches!(result, Err(HarvesterError::InvalidColumn(name)) if name == "Bogus"));
  assert_eq!(harvester.source().calls(), 0);
}

#[traced_test]
#[tokio::test]
async fn test_column_names_are_exact() {
  let harvester = harvester();
  assert!(matches!(
    harvester.by_country("US", 10, &["title"]).await,
    Err(HarvesterError::InvalidColumn(name)) if name == "title"
  ));
}

#[traced_test]
#[tokio::test]
async fn test_failing_catalog_yields_empty_harvest() -> TestResult<()> {
  let source = MemorySource::new().with_records(Entity::Works, fixture_works()).fail_from_call(1);
  let harvester = Harvester::new(source, Config::default());

  let harvest = harvester.by_country("US", 50, &["Title"]).await?;

  assert_eq!(harvest.retrieved, 0);
  assert!(harvest.rows.is_empty());
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_duplicate_columns_are_kept() -> TestResult<()> {
  let harvester = harvester();
  let harvest = harvester.by_country("US", 1, &["DOI", "Title", "DOI"]).await?;
  assert_eq!(harvest.rows[0].len(), 3);
  Ok(())
}

#[test]
fn test_fixture_normalization() {
  let works = fixture_works();
  let publications: Vec<Publication> = works.iter().map(Publication::from_raw).collect();

  let state_of_oa = &publications[0];
  assert_eq!(state_of_oa.abstract_text, "Despite growing interest in Open Access");
  assert_eq!(state_of_oa.publisher, "PeerJ, Inc.");
  assert_eq!(state_of_oa.license, "cc-by");
  assert_eq!(state_of_oa.volume, "6");
  assert_eq!(state_of_oa.issue, "N/A");
  assert_eq!(state_of_oa.references_count, 41);

  let deep_learning = &publications[1];
  assert_eq!(deep_learning.volume, "521");
  assert_eq!(deep_learning.issue, "7553");
  assert_eq!(deep_learning.source_url, "https://www.nature.com/articles/nature14539");
  assert_eq!(deep_learning.open_access, Some(false));

  let lowry = &publications[2];
  assert_eq!(lowry.cited_by_count, 0);
  assert_eq!(lowry.authors, "N/A");
  assert_eq!(lowry.is_paratext, None);
}

#[traced_test]
#[tokio::test]
async fn test_harvest_serializes_rows_in_column_order() -> TestResult<()> {
  let harvester = harvester();
  let harvest = harvester.by_field("C108583219", 5, &["Cited by Count", "Title", "Open Access"]).await?;

  let json = serde_json::to_string(&harvest.rows[0])?;
  assert_eq!(json, r#"{"Cited by Count":52000,"Title":"Deep learning","Open Access":false}"#);
  Ok(())
}
