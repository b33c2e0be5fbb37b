//! `planner-cli`: a thin demonstration binary over `planner-core`.
//!
//! Not part of the core's contract — CSV ingestion and output formatting
//! live here, not in the library.

use std::collections::HashSet;
use std::fs::File;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

use planner_core::cluster::{cluster_sites, presets};
use planner_core::{PlanRequest, Site, TeamConfig, Workday};

#[derive(Parser)]
#[command(name = "planner-cli", about = "Field-service route planner demonstration CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan routes for a site CSV
    Plan {
        #[arg(long)]
        sites: PathBuf,
        #[arg(long, default_value_t = 1)]
        teams: usize,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long)]
        fast: bool,
        #[arg(long)]
        clusters: bool,
        #[arg(long, default_value_t = 480)]
        max_route_minutes: i64,
        #[arg(long, default_value_t = 8)]
        max_sites_per_crew: usize,
        #[arg(long)]
        minimize_crews: bool,
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Cluster a site CSV and print the partition
    Cluster {
        #[arg(long)]
        sites: PathBuf,
        #[arg(long, default_value_t = presets::NORMAL)]
        max_diameter_miles: f64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Table,
}

#[derive(Debug, serde::Deserialize)]
struct SiteRecord {
    site_id: String,
    lat: f64,
    lon: f64,
    service_minutes: Option<i64>,
    cluster_id: Option<u32>,
    name: Option<String>,
    street: Option<String>,
    city: Option<String>,
    state: Option<String>,
}

fn read_sites(path: &PathBuf) -> Result<Vec<Site>> {
    let file = File::open(path).with_context(|| format!("opening site CSV {}", path.display()))?;
    let mut reader = csv::Reader::from_reader(file);
    let mut sites = Vec::new();
    for record in reader.deserialize() {
        let record: SiteRecord = record.context("parsing site CSV row")?;
        sites.push(Site {
            id: record.site_id,
            lat: record.lat,
            lon: record.lon,
            service_minutes: record.service_minutes,
            cluster_id: record.cluster_id,
            name: record.name,
            street: record.street,
            city: record.city,
            state: record.state,
        });
    }
    if sites.is_empty() {
        bail!("no sites found in {}", path.display());
    }
    Ok(sites)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Plan {
            sites,
            teams,
            start,
            end,
            fast,
            clusters,
            max_route_minutes,
            max_sites_per_crew,
            minimize_crews,
            format,
        } => {
            let sites = read_sites(&sites)?;
            let request = PlanRequest {
                sites,
                team_config: TeamConfig {
                    teams,
                    workday: Workday::default(),
                },
                use_clusters: clusters,
                start_date: start,
                end_date: end,
                holidays: HashSet::new(),
                max_route_minutes,
                service_minutes_per_site: None,
                break_minutes: 0,
                fast_mode: fast,
                max_sites_per_crew_per_day: max_sites_per_crew,
                minimize_crews,
            };

            let result = planner_core::plan(&request).map_err(|err| {
                let recommendations = err.recommendations().join(", ");
                anyhow::anyhow!("{err}{}", if recommendations.is_empty() {
                    String::new()
                } else {
                    format!(" (try: {recommendations})")
                })
            })?;

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&result)?);
                }
                OutputFormat::Table => {
                    println!("{:<12} {:<10} {:>8} {:>10} {:>10} {:>6}", "team", "date", "cluster", "service", "route", "stops");
                    for team_day in &result.team_days {
                        println!(
                            "{:<12} {:<10} {:>8} {:>10} {:>10} {:>6}",
                            team_day.team_id,
                            team_day.date,
                            team_day.cluster_id.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string()),
                            team_day.service_minutes,
                            team_day.route_minutes,
                            team_day.site_ids.len(),
                        );
                    }
                    println!("unassigned: {}", result.unassigned);
                }
            }
        }
        Commands::Cluster { sites, max_diameter_miles } => {
            let sites = read_sites(&sites)?;
            let clusters = cluster_sites(&sites, max_diameter_miles);
            for cluster in &clusters {
                println!("cluster {}: {} sites -> {:?}", cluster.cluster_id, cluster.site_ids.len(), cluster.site_ids);
            }
        }
    }

    Ok(())
}
