//! statlookup — command-line client for a statlookup proxy server
//!
//! Sends the same requests the browser page does and prints the results as
//! tab-separated lines (or the raw WDS JSON with `--json`).
//!
//! # Subcommands
//! - `vector <ids>... [-n <latestN>] [--json]` — latest data points per vector
//! - `series <ids>... [--json]`                — series titles
//! - `cube <productIds>... [--json]`           — cube titles
//! - `lookup <productId> [--json]`             — vectors listed in the local table
//! - `status`                                  — server health

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use statlookup_core::records::{
    data_points, display_value, str_field, success_objects, vector_label,
};
use statlookup_core::{LookupTable, ProductLookupEntry, DEFAULT_LATEST_N};

const DEFAULT_SERVER: &str = "http://127.0.0.1:8787";

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "statlookup", version, about = "Query StatCan WDS through a statlookup server")]
struct Cli {
    /// statlookup server URL (overrides STATLOOKUP_HTTP_URL env var)
    #[arg(long, env = "STATLOOKUP_HTTP_URL", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch the latest N periods for one or more vectors
    Vector {
        /// Vector ids, with or without the `v` prefix
        #[arg(required = true)]
        ids: Vec<String>,

        /// Number of most recent periods (1-1000)
        #[arg(short = 'n', long, default_value_t = DEFAULT_LATEST_N)]
        latest_n: u32,

        /// Print the raw WDS JSON
        #[arg(long)]
        json: bool,
    },

    /// Show series titles for one or more vectors
    Series {
        #[arg(required = true)]
        ids: Vec<String>,

        #[arg(long)]
        json: bool,
    },

    /// Show cube metadata for one or more products
    Cube {
        #[arg(required = true)]
        product_ids: Vec<String>,

        #[arg(long)]
        json: bool,
    },

    /// List the vectors recorded for a product in the server's lookup table
    Lookup {
        product_id: String,

        #[arg(long)]
        json: bool,
    },

    /// Show server status
    Status,
}

// ============================================================================
// Output formatting
// ============================================================================

/// One `v<id>\t<refPer>\t<value>` line per data point of every successful vector.
pub fn format_vector_data(payload: &Value) -> Option<Vec<String>> {
    let objects = success_objects(payload)?;
    let mut lines = Vec::new();
    for object in objects {
        let label = vector_label(object);
        for point in data_points(object).unwrap_or(&[]) {
            lines.push(format!(
                "{}\t{}\t{}",
                label,
                str_field(point, "refPer"),
                display_value(point.get("value").unwrap_or(&Value::Null)),
            ));
        }
    }
    Some(lines)
}

pub fn format_series_info(payload: &Value) -> Option<Vec<String>> {
    let objects = success_objects(payload)?;
    Some(
        objects
            .iter()
            .map(|o| {
                format!(
                    "v{}\t{}",
                    display_value(o.get("vectorId").unwrap_or(&Value::Null)),
                    str_field(o, "SeriesTitleEn")
                )
            })
            .collect(),
    )
}

pub fn format_cube_metadata(payload: &Value) -> Option<Vec<String>> {
    let objects = success_objects(payload)?;
    Some(
        objects
            .iter()
            .map(|o| {
                format!(
                    "{}\t{}",
                    display_value(o.get("productId").unwrap_or(&Value::Null)),
                    str_field(o, "cubeTitleEn")
                )
            })
            .collect(),
    )
}

pub fn format_lookup(entry: &ProductLookupEntry) -> Vec<String> {
    std::iter::once(entry.description.clone())
        .chain(
            entry
                .vectors
                .iter()
                .map(|v| format!("{}\t{}", v.vector_id, v.text)),
        )
        .collect()
}

fn print_lines(payload: &Value, lines: Option<Vec<String>>, empty: &str) -> anyhow::Result<()> {
    match lines {
        // Not a WDS array: show what came back instead of guessing
        None => println!("{}", serde_json::to_string_pretty(payload)?),
        Some(lines) if lines.is_empty() => eprintln!("{}", empty),
        Some(lines) => {
            for line in lines {
                println!("{}", line);
            }
        }
    }
    Ok(())
}

// ============================================================================
// HTTP Client Calls
// ============================================================================

fn client() -> anyhow::Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?)
}

fn post_json(server: &str, endpoint: &str, body: &Value) -> anyhow::Result<Value> {
    let url = format!("{}/{}", server, endpoint);
    let resp = client()?
        .post(&url)
        .json(body)
        .send()
        .with_context(|| format!("connection failed to {}", url))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let text = resp.text().unwrap_or_default();
        bail!("Request failed {}: {}", status.as_u16(), text);
    }

    resp.json().context("failed to parse server response")
}

fn do_vector(server: &str, ids: &[String], latest_n: u32, json_output: bool) -> anyhow::Result<()> {
    let body: Vec<Value> = ids
        .iter()
        .map(|id| json!({ "vectorId": id, "latestN": latest_n }))
        .collect();
    let payload = post_json(server, "getDataFromVectors", &Value::Array(body))?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }
    print_lines(&payload, format_vector_data(&payload), "No datapoints returned.")
}

fn do_series(server: &str, ids: &[String], json_output: bool) -> anyhow::Result<()> {
    let body: Vec<Value> = ids.iter().map(|id| json!({ "vectorId": id })).collect();
    let payload = post_json(server, "getSeriesInfo", &Value::Array(body))?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }
    print_lines(&payload, format_series_info(&payload), "No series info.")
}

fn do_cube(server: &str, product_ids: &[String], json_output: bool) -> anyhow::Result<()> {
    let body: Vec<Value> = product_ids
        .iter()
        .map(|id| json!({ "productId": id }))
        .collect();
    let payload = post_json(server, "getCubeMetadata", &Value::Array(body))?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }
    print_lines(&payload, format_cube_metadata(&payload), "No metadata.")
}

fn do_lookup(server: &str, product_id: &str, json_output: bool) -> anyhow::Result<()> {
    let url = format!("{}/data.json", server);
    let resp = client()?
        .get(&url)
        .send()
        .with_context(|| format!("connection failed to {}", url))?;
    if !resp.status().is_success() {
        bail!("Failed to load data.json (HTTP {})", resp.status().as_u16());
    }

    let entries: Vec<ProductLookupEntry> = resp.json().context("malformed data.json")?;
    let table = LookupTable::from_entries(entries);

    let Some(entry) = table.find_raw(product_id) else {
        eprintln!("No match found for that Product ID.");
        return Ok(());
    };

    if json_output {
        println!("{}", serde_json::to_string_pretty(entry)?);
    } else {
        for line in format_lookup(entry) {
            println!("{}", line);
        }
    }
    Ok(())
}

/// Show the server status by calling GET /health.
fn do_status(server: &str) -> anyhow::Result<()> {
    let url = format!("{}/health", server);
    let resp = client()?.get(&url).send();

    match resp {
        Ok(r) if r.status().is_success() => {
            let body: Value = r.json().unwrap_or_default();
            println!("statlookup server: {}", body["status"].as_str().unwrap_or("unknown"));
            println!("Version:           {}", body["version"].as_str().unwrap_or("?"));
            println!("Upstream:          {}", body["upstream"].as_str().unwrap_or("?"));
            println!("Lookup entries:    {}", body["lookup_entries"]);
        }
        Ok(r) => {
            eprintln!("statlookup: server unhealthy (HTTP {})", r.status());
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("statlookup: cannot reach {} — {}", url, e);
            std::process::exit(1);
        }
    }

    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/').to_string();

    let result = match cli.command {
        Commands::Vector { ids, latest_n, json } => do_vector(&server, &ids, latest_n, json),
        Commands::Series { ids, json } => do_series(&server, &ids, json),
        Commands::Cube { product_ids, json } => do_cube(&server, &product_ids, json),
        Commands::Lookup { product_id, json } => do_lookup(&server, &product_id, json),
        Commands::Status => do_status(&server),
    };

    if let Err(e) = result {
        eprintln!("statlookup: {:#}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use statlookup_core::VectorRef;

    #[test]
    fn test_vector_lines_cover_every_successful_vector() {
        let payload = json!([
            {"status": "SUCCESS", "object": {"vectorId": 1, "vectorDataPoint": [
                {"refPer": "2024-01-01", "value": 10.5},
                {"refPer": "2024-02-01", "value": 11}
            ]}},
            {"status": "FAILED", "object": "Vector 2 not found"},
            {"status": "SUCCESS", "object": {"vectorId": 3, "vectorData": [
                {"refPer": "2023-12-01", "value": null}
            ]}}
        ]);

        assert_eq!(
            format_vector_data(&payload).unwrap(),
            vec![
                "v1\t2024-01-01\t10.5",
                "v1\t2024-02-01\t11",
                "v3\t2023-12-01\tnull",
            ]
        );
    }

    #[test]
    fn test_non_array_payload_has_no_lines() {
        assert!(format_vector_data(&json!({"error": "x"})).is_none());
        assert!(format_series_info(&json!("x")).is_none());
        assert!(format_cube_metadata(&Value::Null).is_none());
    }

    #[test]
    fn test_series_and_cube_lines() {
        let series = json!([{"status": "SUCCESS", "object": {"vectorId": 41690973, "SeriesTitleEn": "Canada;All-items"}}]);
        assert_eq!(format_series_info(&series).unwrap(), vec!["v41690973\tCanada;All-items"]);

        let cube = json!([{"status": "SUCCESS", "object": {"productId": "18100004", "cubeTitleEn": "Consumer Price Index"}}]);
        assert_eq!(format_cube_metadata(&cube).unwrap(), vec!["18100004\tConsumer Price Index"]);
    }

    #[test]
    fn test_lookup_lines() {
        let entry = ProductLookupEntry {
            product_id: 18100004,
            description: "Consumer Price Index".to_string(),
            vectors: vec![VectorRef {
                vector_id: "v41690973".to_string(),
                text: "Canada; All-items".to_string(),
            }],
        };
        assert_eq!(
            format_lookup(&entry),
            vec!["Consumer Price Index", "v41690973\tCanada; All-items"]
        );
    }

    #[test]
    fn test_cli_parses_vector_command() {
        let cli = Cli::try_parse_from(["statlookup", "vector", "v1", "2", "-n", "24"]).unwrap();
        match cli.command {
            Commands::Vector { ids, latest_n, json } => {
                assert_eq!(ids, vec!["v1", "2"]);
                assert_eq!(latest_n, 24);
                assert!(!json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
