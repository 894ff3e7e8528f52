//! Offline and online pipeline runs for the CLI.

use std::path::{Path, PathBuf};

use retail_radar_analysis::{AnalysisReport, analyze_report, map::to_feature_collection};
use retail_radar_analysis_models::{AnalysisParams, ClusterBrief, NeighborSearchKind};
use retail_radar_classify::ClassifierRules;
use retail_radar_geocoder::Geocoder;
use retail_radar_population::PopulationTable;
use retail_radar_server_models::{ClustersResponse, ScanResponse};
use retail_radar_source::OverpassClient;
use retail_radar_store_models::{GeoPoint, RawRecord};

/// Arguments of the `scan` subcommand.
pub struct ScanOptions {
    pub address: String,
    pub radius: f64,
    pub eps: f64,
    pub min_pts: usize,
    pub insight: bool,
    pub population: Option<PathBuf>,
}

fn noise_ids(report: &AnalysisReport) -> Vec<String> {
    report.noise_ids().into_iter().map(String::from).collect()
}

/// Clusters the records in `input` and prints the result as JSON.
///
/// # Errors
///
/// Returns an error if the input cannot be read or parsed, the
/// parameters are out of range, or the `GeoJSON` file cannot be written.
pub fn analyze_file(
    input: &Path,
    eps: f64,
    min_pts: usize,
    rtree: bool,
    geojson: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(input)?;
    let records: Vec<RawRecord> = serde_json::from_str(&contents)?;
    log::info!("Loaded {} records from {}", records.len(), input.display());

    let params = AnalysisParams {
        eps_meters: eps,
        min_pts,
        neighbor_search: if rtree {
            NeighborSearchKind::Rtree
        } else {
            NeighborSearchKind::BruteForce
        },
    };
    let report = analyze_report(&records, &params, &ClassifierRules::default())?;

    if let Some(path) = geojson {
        let collection = to_feature_collection(&report);
        std::fs::write(path, serde_json::to_string_pretty(&collection)?)?;
        log::info!("Wrote map features to {}", path.display());
    }

    let noise = noise_ids(&report);
    let response = ClustersResponse {
        clusters: report.summaries,
        noise,
    };
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}

/// Geocodes the address, fetches nearby shops, clusters them and prints
/// the scan. With `insight`, also prints the AI description of the
/// clusters.
///
/// # Errors
///
/// Returns an error if any pipeline stage fails or the address cannot be
/// found.
pub async fn scan(opts: &ScanOptions) -> Result<(), Box<dyn std::error::Error>> {
    if !opts.radius.is_finite() || opts.radius <= 0.0 {
        return Err(format!(
            "radius must be a positive number of meters, got {}",
            opts.radius
        )
        .into());
    }
    // Fail before any network traffic.
    retail_radar_cluster::validate_params(opts.eps, opts.min_pts)?;

    let client = reqwest::Client::builder()
        .user_agent(retail_radar_geocoder::USER_AGENT)
        .build()?;

    let geocoder = Geocoder::new(client.clone());
    let location = geocoder
        .geocode(&opts.address)
        .await?
        .ok_or_else(|| format!("Location not found: {}", opts.address))?;
    log::info!(
        "Geocoded '{}' to ({}, {}) via {}",
        opts.address,
        location.lat,
        location.lon,
        location.provider
    );
    let center = GeoPoint::new(location.lat, location.lon);

    let overpass = OverpassClient::from_env(client);
    let records = overpass.fetch_stores(center, opts.radius).await?;

    let params = AnalysisParams {
        eps_meters: opts.eps,
        min_pts: opts.min_pts,
        ..AnalysisParams::default()
    };
    let report = analyze_report(&records, &params, &ClassifierRules::default())?;

    let briefs: Vec<ClusterBrief> = report.summaries.iter().map(|s| s.brief()).collect();
    let noise = noise_ids(&report);
    let response = ScanResponse {
        center,
        stores: report.stores,
        clusters: report.summaries,
        noise,
    };
    println!("{}", serde_json::to_string_pretty(&response)?);

    if opts.insight {
        print_insight(opts, &briefs).await?;
    }

    Ok(())
}

async fn print_insight(
    opts: &ScanOptions,
    briefs: &[ClusterBrief],
) -> Result<(), Box<dyn std::error::Error>> {
    let population = load_population(opts.population.as_deref());
    let context = population.context_for(&opts.address);

    let prompt = retail_radar_ai::build_prompt(&opts.address, briefs, context.as_deref())?;
    let provider = retail_radar_ai::create_provider_from_env()?;
    log::info!("Requesting insight from {} ({})", provider.name(), provider.model());

    let insight = provider.generate(&prompt).await?;
    for section in retail_radar_ai::split_sections(&insight) {
        if let Some(heading) = &section.heading {
            println!("\n== {heading} ==");
        }
        println!("{}", section.body);
    }

    Ok(())
}

/// Loads the population table from `path`, else `POPULATION_PATH`, else
/// the bundled table. An unreadable file also falls back to the bundled
/// table.
fn load_population(path: Option<&Path>) -> PopulationTable {
    let path = path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os("POPULATION_PATH").map(PathBuf::from));

    let Some(path) = path else {
        return PopulationTable::bundled();
    };

    PopulationTable::load(&path).unwrap_or_else(|e| {
        log::warn!("Failed to load population data from {}: {e}", path.display());
        PopulationTable::bundled()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scan_rejects_bad_radius_before_network() {
        let opts = ScanOptions {
            address: "Ikeja, Lagos".to_string(),
            radius: -1.0,
            eps: 500.0,
            min_pts: 3,
            insight: false,
            population: None,
        };
        assert!(scan(&opts).await.is_err());
    }

    #[tokio::test]
    async fn scan_rejects_bad_cluster_params_before_network() {
        let opts = ScanOptions {
            address: "Ikeja, Lagos".to_string(),
            radius: 5000.0,
            eps: 500.0,
            min_pts: 0,
            insight: false,
            population: None,
        };
        assert!(scan(&opts).await.is_err());
    }

    #[test]
    fn missing_population_file_falls_back_to_bundled() {
        let table = load_population(Some(Path::new("/nonexistent/population.json")));
        assert_eq!(table, PopulationTable::bundled());
        assert!(table.context_for("Allen Avenue, Ikeja, Lagos").is_some());
    }

    #[test]
    fn population_file_overrides_bundled() {
        let dir = std::env::temp_dir().join(format!("retail_radar_pop_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("population.json");
        std::fs::write(&path, r#"{"Oyo": {"Ibadan North": 308119}}"#).unwrap();

        let table = load_population(Some(&path));
        assert_eq!(table.len(), 1);
        assert_eq!(table.population("Oyo", "Ibadan North"), Some(308_119));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn analyze_file_rejects_out_of_range_location() {
        let dir = std::env::temp_dir().join(format!("retail_radar_bad_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let input = dir.join("records.json");
        std::fs::write(
            &input,
            r#"[
                {"id":"a","location":{"lat":-20.0,"lng":0.0}},
                {"id":"b","location":{"lat":-20.00001,"lng":0.0}},
                {"id":"bad","location":{"lat":200.0,"lng":179.99995}}
            ]"#,
        )
        .unwrap();

        let err = analyze_file(&input, 10.0, 2, true, None).unwrap_err();
        assert!(err.to_string().contains("bad"), "{err}");
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn analyze_file_reads_records() {
        let dir = std::env::temp_dir().join(format!("retail_radar_cli_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let input = dir.join("records.json");
        let geojson = dir.join("map.geojson");
        std::fs::write(
            &input,
            r#"[
                {"id":"a","location":{"lat":6.6000,"lng":3.3500},"tags":{"shop":"bakery"}},
                {"id":"b","location":{"lat":6.6005,"lng":3.3500},"tags":{"shop":"bakery"}},
                {"id":"c","location":{"lat":6.6010,"lng":3.3500},"tags":{"shop":"bakery"}}
            ]"#,
        )
        .unwrap();

        analyze_file(&input, 500.0, 3, false, Some(&geojson)).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&geojson).unwrap()).unwrap();
        assert_eq!(written["type"], "FeatureCollection");
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
