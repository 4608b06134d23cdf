mod common;

use common::{Script, candidate, discovery, nairobi};
use healthcheck::application::discovery::{ClinicDiscovery, PRIMARY_RESULT_CAP};
use healthcheck::domain::facility::DEFAULT_FACILITY_NAME;
use healthcheck::domain::geo::Coordinate;
use healthcheck::error::CoreError;
use healthcheck::infrastructure::overpass::{OverpassConfig, OverpassFacilitySource};
use healthcheck::interfaces::csv::facility_reader::CsvFacilityTable;
use std::sync::atomic::Ordering;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_secondary_untouched_when_primary_has_results() {
    let (discovery, primary_calls, secondary_calls) = discovery(
        Script::Rows(vec![candidate("osm_node_1", -1.2950, 36.8200)]),
        Script::Rows(vec![candidate("local_1", -1.2921, 36.8219)]),
    );

    let result = discovery.find_nearby(nairobi()).await.unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].id, "osm_node_1");
    assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
    assert_eq!(secondary_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_primary_results_capped_and_sorted() {
    let rows = (0..30)
        .rev()
        .map(|i| candidate(&format!("osm_node_{}", i), -1.2921 - 0.001 * i as f64, 36.8219))
        .collect();
    let (discovery, _, _) = discovery(Script::Rows(rows), Script::Fail);

    let result = discovery.find_nearby(nairobi()).await.unwrap();

    assert_eq!(result.len(), PRIMARY_RESULT_CAP);
    assert_eq!(result[0].id, "osm_node_0");
    assert!(
        result
            .windows(2)
            .all(|pair| pair[0].distance_km <= pair[1].distance_km)
    );
}

#[tokio::test]
async fn test_primary_failure_falls_back_to_secondary() {
    let (discovery, _, secondary_calls) = discovery(
        Script::Fail,
        Script::Rows(vec![candidate("local_1", -1.3000, 36.8300)]),
    );

    let result = discovery.find_nearby(nairobi()).await.unwrap();

    assert_eq!(secondary_calls.load(Ordering::SeqCst), 1);
    assert_eq!(result.len(), 1);
    assert!((result[0].distance_km - 1.258).abs() < 0.01);
}

#[tokio::test]
async fn test_both_tiers_failing_is_discovery_unavailable() {
    let (discovery, _, _) = discovery(Script::Fail, Script::Fail);
    let result = discovery.find_nearby(nairobi()).await;
    assert!(matches!(result, Err(CoreError::DiscoveryUnavailable)));
}

#[tokio::test]
async fn test_empty_primary_and_failed_secondary_is_empty_answer() {
    let (discovery, _, _) = discovery(Script::Rows(vec![]), Script::Fail);
    assert!(discovery.find_nearby(nairobi()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_center_queries_nothing() {
    let (discovery, primary_calls, secondary_calls) =
        discovery(Script::Rows(vec![]), Script::Rows(vec![]));
    let center = Coordinate {
        latitude: 91.0,
        longitude: 0.0,
    };

    let result = discovery.find_nearby(center).await;

    assert!(matches!(result, Err(CoreError::InvalidCoordinate { .. })));
    assert_eq!(primary_calls.load(Ordering::SeqCst), 0);
    assert_eq!(secondary_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_overpass_outage_served_from_csv_table() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(504))
        .mount(&server)
        .await;

    let primary = OverpassFacilitySource::new(OverpassConfig::new(server.uri())).unwrap();
    let secondary = CsvFacilityTable::new("tests/fixtures/facilities.csv");
    let discovery = ClinicDiscovery::new(Box::new(primary), Box::new(secondary));

    let result = discovery.find_nearby(nairobi()).await.unwrap();

    let ids: Vec<&str> = result.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["local_4", "local_1", "local_2"]);
    assert_eq!(result[0].name, DEFAULT_FACILITY_NAME);
}
