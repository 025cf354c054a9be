//! Live OSRM table test.
//!
//! Needs Docker and a Greater London dataset already processed for the MLD
//! pipeline (`osrm-extract`, `osrm-partition`, `osrm-customize` with the car
//! profile) in `$OSRM_DATA_DIR`, as `greater-london-latest.osrm*`.
//! Run with `cargo test --test osrm_integration -- --ignored`.

mod fixtures;

use std::env;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime};

use testcontainers::ReuseDirective;
use testcontainers::core::{IntoContainerPort, Mount};
use testcontainers::runners::SyncRunner;
use testcontainers::{Container, GenericImage, ImageExt, TestcontainersError};

use waypoint_planner::osrm::{OsrmClient, OsrmConfig};
use waypoint_planner::solver::DistanceMatrix;
use waypoint_planner::traits::{DistanceMatrixProvider, TransportMode};
use waypoint_planner::{CanonicalCoordinate, PlannerError};

const DATASET: &str = "greater-london-latest.osrm";

fn osrm_container() -> Result<(Container<GenericImage>, String), TestcontainersError> {
    let data_dir = PathBuf::from(env::var("OSRM_DATA_DIR").unwrap_or_else(|_| "osrm-data".to_string()));
    let partition = data_dir.join(DATASET).with_extension("osrm.partition");
    let mtime = std::fs::metadata(&partition)
        .map_err(|err| TestcontainersError::other(format!("missing {}: {err}", partition.display())))?
        .modified()
        .ok()
        .and_then(|time| time.duration_since(SystemTime::UNIX_EPOCH).ok())
        .map(|duration| duration.as_secs())
        .unwrap_or(0);
    let container_name = format!("osrm-london-mld-{mtime}");

    let image = GenericImage::new("osrm/osrm-backend", "latest")
        .with_exposed_port(5000.tcp())
        .with_mount(Mount::bind_mount(data_dir.to_string_lossy().to_string(), "/data"))
        .with_cmd(vec![
            "osrm-routed".to_string(),
            "--algorithm".to_string(),
            "mld".to_string(),
            format!("/data/{DATASET}"),
        ])
        .with_container_name(container_name)
        .with_startup_timeout(Duration::from_secs(30))
        .with_reuse(ReuseDirective::Always);

    let container = image.start()?;
    let port = container.get_host_port_ipv4(5000.tcp())?;
    let base_url = format!("http://127.0.0.1:{port}");

    Ok((container, base_url))
}

#[test]
#[ignore = "needs Docker and a processed OSRM dataset"]
fn osrm_table_returns_matrix() {
    let (container, base_url) = osrm_container().expect("start OSRM container");
    let client = OsrmClient::new(OsrmConfig {
        base_url,
        timeout_secs: 10,
    })
    .expect("build OSRM client");

    let locations: Vec<CanonicalCoordinate> = fixtures::LONDON
        .iter()
        .map(|l| CanonicalCoordinate::new(l.lat, l.lng).unwrap())
        .collect();

    // osrm-routed may still be loading the dataset when the port opens.
    let started = Instant::now();
    let matrix: Result<DistanceMatrix, PlannerError> = loop {
        let attempt = client.matrix_for(&locations, TransportMode::Driving);
        if attempt.is_ok() || started.elapsed() > Duration::from_secs(15) {
            break attempt;
        }
        std::thread::sleep(Duration::from_millis(500));
    };

    let matrix = match matrix {
        Ok(matrix) => matrix,
        Err(err) => {
            if let Ok(stderr) = container.stderr_to_vec() {
                eprintln!("OSRM stderr:\n{}", String::from_utf8_lossy(&stderr));
            }
            panic!("OSRM table failed: {err}");
        }
    };

    assert_eq!(matrix.len(), locations.len());
    for i in 0..matrix.len() {
        assert_eq!(matrix.cost(i, i), 0);
        for j in 0..matrix.len() {
            if i != j {
                assert!(matrix.cost(i, j) > 0, "{i} -> {j}");
            }
        }
    }

    drop(container);
}

#[test]
fn transit_is_not_routable() {
    let client = OsrmClient::new(OsrmConfig::default()).expect("build OSRM client");
    let here = CanonicalCoordinate::new(51.5, -0.1).unwrap();
    assert!(matches!(
        client.matrix_for(&[here], TransportMode::Transit),
        Err(PlannerError::UnsupportedMode(_))
    ));
}
