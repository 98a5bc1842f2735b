//! MedDrug: command-line client for the molecular analysis backend.

mod render;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use meddrug_client::presenter::{analysis_notification, DashboardView};
use meddrug_client::{
    AnalysisSession, HttpTransport, MoleculeGenerator, Notifier, TracingNotifier, WireDialect,
};
use meddrug_common::{AnalysisKind, AnalysisRequest, MedDrugConfig, ModelVariant};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "meddrug")]
#[command(version)]
#[command(about = "Drug-likeness, binding and ADMET analysis against a MedDrug backend", long_about = None)]
struct Cli {
    /// Backend base URL; overrides meddrug.toml and MEDDRUG_BASE_URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Full analysis: drug-likeness, binding, ADMET and AI narrative
    Analyze(AnalyzeArgs),

    /// Lipinski rule-of-five check
    Lipinski(MoleculeArgs),

    /// Binding affinity prediction
    Binding(BindingArgs),

    /// ADMET profile
    Admet(MoleculeArgs),

    /// Generate candidate molecules
    Generate(GenerateArgs),
}

#[derive(Args, Debug)]
struct MoleculeArgs {
    /// Molecule as a SMILES string
    #[arg(long)]
    smiles: String,
}

#[derive(Args, Debug)]
struct BindingArgs {
    #[arg(long)]
    smiles: String,

    /// Target protein, e.g. EGFR
    #[arg(long)]
    target: String,

    /// CNN, GNN or Transformer (defaults to session.default_model)
    #[arg(long)]
    model: Option<ModelVariant>,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    #[command(flatten)]
    binding: BindingArgs,

    /// Question for the AI agent
    #[arg(long)]
    question: Option<String>,

    /// Keep asking follow-up questions from stdin until EOF or an empty line
    #[arg(long, short = 'i')]
    interactive: bool,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Number of molecules (1-10)
    #[arg(long, default_value_t = 5)]
    count: u32,

    /// Seed SMILES to generate around
    #[arg(long)]
    seed: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("meddrug=info,warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = MedDrugConfig::load().context("Could not load meddrug.toml")?;
    if let Some(url) = cli.base_url {
        config.backend.base_url = url;
        config.validate()?;
    }
    info!(base_url = %config.backend.base_url, "Using analysis backend");

    let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);
    let transport = Arc::new(HttpTransport::new(&config.backend, notifier.clone())?);
    let dialect = WireDialect::from_config(&config.backend);
    let session = AnalysisSession::new(transport.clone(), notifier.clone())
        .with_dialect(dialect)
        .with_policy(config.session.concurrency)
        .with_completion_note(analysis_notification);
    let default_model = config.session.default_model;

    let request = match cli.command {
        Commands::Analyze(args) => {
            let mut request = AnalysisRequest::new(args.binding.smiles)
                .with_target(args.binding.target)
                .with_model(args.binding.model.unwrap_or(default_model));
            if let Some(question) = args.question {
                request = request.with_question(question);
            }
            session.submit(request).await?;
            show(&session, cli.json)?;
            if args.interactive {
                ask_loop(&session, cli.json).await?;
            }
            return Ok(());
        }
        Commands::Lipinski(args) => AnalysisRequest::new(args.smiles).with_kind(AnalysisKind::Lipinski),
        Commands::Admet(args) => AnalysisRequest::new(args.smiles).with_kind(AnalysisKind::Admet),
        Commands::Binding(args) => AnalysisRequest::new(args.smiles)
            .with_kind(AnalysisKind::Binding)
            .with_target(args.target)
            .with_model(args.model.unwrap_or(default_model)),
        Commands::Generate(args) => {
            let generator = MoleculeGenerator::new(transport, notifier).with_dialect(dialect);
            let generated = generator.generate(args.count, args.seed.as_deref()).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&generated)?);
            } else {
                print!("{}", render::Generated(&generated));
            }
            return Ok(());
        }
    };

    session.submit(request).await?;
    show(&session, cli.json)
}

fn show(session: &AnalysisSession, json: bool) -> Result<()> {
    let Some(result) = session.result() else {
        return Ok(());
    };
    let view = DashboardView::from_result(&result);
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print!("{}", render::Dashboard(&view));
    }
    Ok(())
}

/// Follow-up questions about the current result. A failed question is
/// reported and the loop goes on.
async fn ask_loop(session: &AnalysisSession, json: bool) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"question> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            break;
        }

        if let Err(e) = session.ask_followup(question).await {
            // Backend failures were already logged by the notifier.
            if !e.is_user_visible() {
                eprintln!("{e}");
            }
            continue;
        }
        if let Some(result) = session.result() {
            let view = DashboardView::from_result(&result);
            if json {
                println!("{}", serde_json::to_string_pretty(&view.narrative)?);
            } else {
                print!("{}", render::Narrative(&view.narrative));
            }
        }
    }
    Ok(())
}
