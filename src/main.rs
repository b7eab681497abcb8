use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

mod config;
mod describe;
mod embedding;
mod engine;
mod geo;
mod imagery;
mod net;
mod poi;
mod retrieval;
#[cfg(test)]
mod tests;

use config::Config;
use engine::MatchEngine;
use geo::Coordinate;
use imagery::ImageStore;
use retrieval::overpass::OverpassClient;
use retrieval::wikipedia::WikipediaSearch;
use retrieval::Retriever;

#[derive(Parser)]
#[command(
    name = "poilens",
    about = "Locate nearby points of interest and match camera frames against them"
)]
struct Args {
    /// Path to the YAML config file; created with defaults if missing
    #[arg(long, default_value = "poilens.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List POIs near a coordinate, closest first
    Pois {
        lat: f64,
        lon: f64,
        #[arg(long, default_value_t = 5.0)]
        radius_km: f64,
        #[arg(long, default_value_t = 100)]
        max_results: usize,
    },
    /// Retrieve POIs, build reference embeddings, and match frame images
    Match {
        lat: f64,
        lon: f64,
        /// Frame image files to score, in order
        #[arg(required = true)]
        frames: Vec<PathBuf>,
        #[arg(long, default_value_t = 1.0)]
        radius_km: f64,
        #[arg(long, default_value_t = 50)]
        max_results: usize,
        /// Matches scoring below this are labelled low confidence
        #[arg(long, default_value_t = 0.5)]
        threshold: f32,
    },
    /// Print a short description of a named place
    Describe { title: String },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = Config::load_with(&args.config);

    match args.command {
        Command::Pois {
            lat,
            lon,
            radius_km,
            max_results,
        } => {
            let retriever = build_retriever(&config);
            let pois = retriever.retrieve(Coordinate::new(lat, lon), radius_km, max_results);
            if pois.is_empty() {
                println!("no POIs found");
                return Ok(());
            }
            for poi in &pois {
                let position = poi
                    .coordinate
                    .map(|c| format!("({:.5}, {:.5})", c.lat, c.lon))
                    .unwrap_or_else(|| "(unknown)".to_string());
                let image = poi
                    .image_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{} {} image={}", poi.name, position, image);
            }
        }

        Command::Match {
            lat,
            lon,
            frames,
            radius_km,
            max_results,
            threshold,
        } => {
            let retriever = build_retriever(&config);
            let pois = retriever.retrieve(Coordinate::new(lat, lon), radius_km, max_results);
            log::info!("found {} POIs within {radius_km} km", pois.len());

            let embedder =
                embedding::from_config(&config.embedding).context("embedding backend init")?;
            let mut engine = MatchEngine::new(embedder, config.matching.clone());
            engine
                .prepare(pois)
                .context("building reference embeddings")?;
            log::info!("{} references prepared", engine.reference_count());

            let describer = describe::Describer::new(config.imagery.request_timeout());
            for frame in &frames {
                match engine.match_frame(frame)? {
                    Some(result) if result.score >= threshold => {
                        let info = describer.fetch_info(&result.poi.name);
                        println!(
                            "{}: {} ({:.3}) - {}",
                            frame.display(),
                            info.name,
                            result.score,
                            info.description
                        );
                    }
                    Some(result) => {
                        println!(
                            "{}: {} ({:.3}, low confidence)",
                            frame.display(),
                            result.poi.name,
                            result.score
                        );
                    }
                    None => println!("{}: no match", frame.display()),
                }
            }
        }

        Command::Describe { title } => {
            let describer = describe::Describer::new(config.imagery.request_timeout());
            let info = describer.fetch_info(&title);
            println!("{} - {}", info.name, info.description);
        }
    }

    Ok(())
}

fn build_retriever(config: &Config) -> Retriever {
    let timeout = config.retrieval.request_timeout();
    Retriever::new(
        Box::new(OverpassClient::new(timeout)),
        Box::new(WikipediaSearch::new(timeout)),
        ImageStore::new(&config.imagery),
        config.retrieval.clone(),
    )
}
