pub mod color;
pub mod config;
pub mod data;
pub mod projection;
pub mod render;
pub mod renderer;
pub mod scale;
pub mod scroller;
pub mod types;

use anyhow::Result;
use clap::{Parser, Subcommand};
use renderer::{ChoroplethRenderer, IndicatorRegistry};
use scroller::{Scroller, Step};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a map snapshot for every step of the story
    Render {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Print the legend an indicator would get
    Legend {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        #[arg(short, long)]
        indicator: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Render { config } => {
            info!("Rendering story with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(config)?;
            let renderer = build_renderer(&app_config)?;

            let steps: Vec<Step> = app_config.scroll.steps.iter().map(Step::from).collect();
            for (i, step) in steps.iter().enumerate() {
                if let renderer::Action::ShowIndicator(id) = step.action() {
                    if !renderer.registry().contains(&id) {
                        warn!("Step {} names unregistered indicator {:?}", i, id);
                    }
                }
            }

            let mut scroller = Scroller::new(
                steps,
                app_config.scroll.offset,
                app_config.viewport_height(),
            );
            let frames = render::collect_frames(&renderer, &mut scroller);
            let written = render::write_story(&app_config.output.dir, &renderer, &frames)?;

            println!("Wrote {} files to {:?}", written.len(), app_config.output.dir);
        }
        Commands::Legend { config, indicator } => {
            let app_config = config::AppConfig::load_from_file(config)?;
            let renderer = build_renderer(&app_config)?;

            if !renderer.registry().contains(indicator) {
                let known: Vec<&str> = renderer.registry().ids().collect();
                println!("Unknown indicator {:?}; registered: {}", indicator, known.join(", "));
                return Ok(());
            }

            let view = renderer.show_indicator(indicator);
            println!("{}", view.title.text);
            match view.legend {
                Some(legend) => {
                    println!("{}", legend.heading);
                    for row in legend.rows {
                        println!("  {}  {}", row.color.to_hex(), row.label);
                    }
                }
                None => println!("  no numeric values"),
            }
        }
    }

    Ok(())
}

fn build_renderer(app_config: &config::AppConfig) -> Result<ChoroplethRenderer> {
    let regions = data::load_regions(&app_config.input.geojson)?;
    let registry = IndicatorRegistry::new(app_config.indicators.clone());
    ChoroplethRenderer::new(&app_config.map, registry, regions)
}
