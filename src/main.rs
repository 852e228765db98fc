use clap::{Parser, ValueEnum};
use futures::StreamExt;
use market_insights::llm::{GeminiConfig, GeminiNarrator};
use market_insights::{
    load_source, ChartData, ChartOutcome, ExportOptions, InsightsConfig, InsightsPipeline,
    PlottersRenderer, PromptTemplate, Result, WordStream,
};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "market-insights",
    about = "Compare agency metrics against the market with an LLM-written analysis"
)]
struct Args {
    /// Agency metrics JSON file
    #[arg(long)]
    agency: PathBuf,

    /// Market metrics JSON file
    #[arg(long)]
    market: PathBuf,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum)]
    prompt: Option<PromptChoice>,

    /// Read the analysis instructions from a file instead
    #[arg(long, conflicts_with = "prompt")]
    prompt_file: Option<PathBuf>,

    /// Gemini model name (overrides GEMINI_MODEL)
    #[arg(long)]
    model: Option<String>,

    #[arg(long)]
    no_charts: bool,

    /// Write a PDF report into this directory
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Pause between revealed words
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Print chart figures as JSON instead of a summary
    #[arg(long)]
    figures: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PromptChoice {
    General,
    Travel,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let mut config = match &args.config {
        Some(path) => InsightsConfig::from_file(path)?,
        None => InsightsConfig::default(),
    };
    match (args.prompt, &args.prompt_file) {
        (Some(PromptChoice::General), _) => config.prompt = PromptTemplate::General,
        (Some(PromptChoice::Travel), _) => config.prompt = PromptTemplate::TravelAgency,
        (None, Some(path)) => {
            config.prompt = PromptTemplate::Custom(std::fs::read_to_string(path)?)
        }
        (None, None) => {}
    }
    if args.no_charts {
        config.charts_enabled = false;
    }
    if let Some(dir) = args.export_dir {
        config.export = Some(ExportOptions {
            output_dir: dir,
            ..config.export.take().unwrap_or_default()
        });
    }
    if let Some(ms) = args.delay_ms {
        config.reveal_delay_ms = ms;
    }
    config.validate()?;

    let agency = load_source(&args.agency)?;
    let market = load_source(&args.market)?;

    let mut gemini = GeminiConfig::from_env()?;
    if let Some(model) = args.model {
        gemini = gemini.with_model(model);
    }

    let delay = config.reveal_delay();
    let pipeline = InsightsPipeline::new(config, Arc::new(GeminiNarrator::from_config(gemini)))
        .with_renderer(Arc::new(PlottersRenderer::default()));
    let report = pipeline
        .run(agency.as_deref(), market.as_deref(), None)
        .await?;

    match &report.narrative {
        Ok(result) => {
            println!("Detailed Analysis and Recommendations\n");
            let mut stdout = std::io::stdout();
            let mut words = Box::pin(WordStream::new(result.text.as_str()).paced(delay));
            while let Some(token) = words.next().await {
                print!("{}", token);
                stdout.flush()?;
            }
            println!();
        }
        Err(e) => eprintln!("{}", e),
    }

    if !report.charts.is_empty() {
        println!("\nVisual Analysis");
        for outcome in &report.charts {
            match outcome {
                ChartOutcome::Rendered { chart } if args.figures => {
                    println!("{}", serde_json::to_string_pretty(&chart.to_figure())?);
                }
                ChartOutcome::Rendered { chart } => println!("  {}", summarize(chart)),
                ChartOutcome::Unavailable { title, reason } => {
                    println!("  {}: {}", title, reason)
                }
            }
        }
    }

    match &report.export {
        Some(Ok(artifact)) => println!(
            "\nPDF written to {} (download as {})",
            artifact.path.display(),
            artifact.download_name
        ),
        Some(Err(e)) => eprintln!("{}", e),
        None => {}
    }

    Ok(if report.narrative.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn summarize(chart: &ChartData) -> String {
    match chart {
        ChartData::Pie {
            title,
            labels,
            values,
        } => {
            let slices: Vec<String> = labels
                .iter()
                .zip(values)
                .map(|(label, value)| format!("{}={}", label, value))
                .collect();
            format!("{}: {}", title, slices.join(", "))
        }
        ChartData::GroupedBar {
            title,
            categories,
            series,
        }
        | ChartData::Line {
            title,
            categories,
            series,
        } => {
            let lines: Vec<String> = series
                .iter()
                .map(|s| {
                    let points: Vec<String> = categories
                        .iter()
                        .zip(&s.values)
                        .map(|(category, value)| format!("{}={}", category, value))
                        .collect();
                    format!("{} [{}]", s.name, points.join(", "))
                })
                .collect();
            format!("{}: {}", title, lines.join("; "))
        }
    }
}
