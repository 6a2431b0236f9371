//! # careprint CLI
//!
//! Usage:
//!   careprint conversations conversation.json --subject "Joseph Martinez"
//!   careprint panels panels.json --subject "Joseph Martinez" --physician "Dr. Warren"
//!   careprint --example panels > panels.json

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use careprint::{
    artifact_file_name, assemble, export_conversations, export_panels, parse_conversations_json,
    parse_panels_json, save_artifact, ArtifactKind, LayoutConfig, ReportMeta,
};

#[derive(Parser)]
#[command(name = "careprint")]
#[command(about = "Export care conversations and test panels as paginated PDF documents")]
struct Cli {
    /// Print an example input document and exit
    #[arg(long, value_enum)]
    example: Option<Example>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Example {
    Conversations,
    Panels,
}

#[derive(clap::Args)]
struct ExportArgs {
    /// JSON file holding the records
    input: PathBuf,
    /// Patient name, printed in the title and used in the file name
    #[arg(long)]
    subject: String,
    /// Responsible physician
    #[arg(long)]
    physician: Option<String>,
    /// Directory the PDF is written to
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
    /// Layout configuration overrides (JSON)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a conversation history
    Conversations {
        #[command(flatten)]
        args: ExportArgs,
        /// Only export records from this period bucket
        #[arg(long)]
        period: Option<u32>,
    },
    /// Export a comprehensive health report from test panels
    Panels {
        #[command(flatten)]
        args: ExportArgs,
    },
}

fn main() -> ExitCode {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("careprint=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Some(example) = cli.example {
        match example {
            Example::Conversations => print!("{}", example_conversations_json()),
            Example::Panels => print!("{}", example_panels_json()),
        }
        return ExitCode::SUCCESS;
    }

    let Some(command) = cli.command else {
        eprintln!("No command provided. Use --help for usage.");
        return ExitCode::FAILURE;
    };

    match run(command) {
        Ok(path) => {
            eprintln!("✓ Written {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> careprint::Result<PathBuf> {
    let now = Local::now().naive_local();

    match command {
        Commands::Conversations { args, period } => {
            let config = load_config(args.config.as_deref(), LayoutConfig::conversation())?;
            let mut records = parse_conversations_json(&fs::read_to_string(&args.input)?)?;
            if let Some(period) = period {
                records = assemble::records_in_period(&records, period);
            }
            let meta = meta(&args, now);
            let bytes = export_conversations(&records, &meta, &config)?;
            let name = artifact_file_name(&meta.subject, ArtifactKind::Conversations, now.date());
            save_artifact(&args.out_dir, &name, &bytes)
        }
        Commands::Panels { args } => {
            let config = load_config(args.config.as_deref(), LayoutConfig::panel())?;
            let panels = parse_panels_json(&fs::read_to_string(&args.input)?)?;
            let meta = meta(&args, now);
            let bytes = export_panels(&panels, &meta, &config)?;
            let name = artifact_file_name(&meta.subject, ArtifactKind::HealthReport, now.date());
            save_artifact(&args.out_dir, &name, &bytes)
        }
    }
}

fn meta(args: &ExportArgs, now: chrono::NaiveDateTime) -> ReportMeta {
    let meta = ReportMeta::new(args.subject.clone(), now);
    match &args.physician {
        Some(physician) => meta.with_physician(physician.clone()),
        None => meta,
    }
}

/// Values in a configuration file override the export's preset.
fn load_config(path: Option<&Path>, preset: LayoutConfig) -> careprint::Result<LayoutConfig> {
    match path {
        Some(path) => LayoutConfig::from_json_over(&fs::read_to_string(path)?, &preset),
        None => Ok(preset),
    }
}

fn example_conversations_json() -> &'static str {
    r##"[
  {
    "id": "msg-001",
    "date": "2025-01-15T09:30:00",
    "sender": "Ruby",
    "role": "Staff",
    "message": "Welcome to the programme, Joseph. Your baseline labs are in and we'll go through them together this week.",
    "topic": "Onboarding",
    "linked_to": [],
    "month": 1
  },
  {
    "id": "msg-002",
    "date": "2025-01-15T10:05:00",
    "sender": "Joseph Martinez",
    "role": "Member",
    "message": "Thanks. I'm most worried about my sleep; I've been waking up around 3am most nights.",
    "month": 1
  },
  {
    "id": "msg-003",
    "date": "2025-01-15T11:20:00",
    "sender": "Dr. Warren",
    "role": "Staff",
    "message": "Let's start with a two-week sleep diary before changing anything else.",
    "topic": "Sleep",
    "decision": "Begin sleep diary",
    "reason": "Establish a baseline before introducing CBT-I techniques, so we can tell which change helped.",
    "linked_to": ["msg-002"],
    "month": 1
  },
  {
    "id": "msg-004",
    "date": "2025-01-29T16:45:00",
    "sender": "Joseph Martinez",
    "role": "Member",
    "message": "Diary attached. Averaging 5h40m; caffeine after 2pm seems to make it worse.",
    "linked_to": ["msg-003"],
    "month": 1
  }
]
"##
}

fn example_panels_json() -> &'static str {
    r##"[
  {
    "id": "lipid-2025-01",
    "testType": "Lipid Panel",
    "category": "Cardiovascular",
    "date": "2025-01-10",
    "results": {
      "Total Cholesterol": { "value": "182 mg/dL", "status": "improved", "trend": "down 14%" },
      "LDL": { "value": "105 mg/dL", "status": "improved", "trend": "down 27%" },
      "HDL": { "value": "52 mg/dL", "status": "optimal", "trend": "up 11%" },
      "Triglycerides": { "value": "148 mg/dL", "status": "monitor", "trend": "stable" }
    },
    "interpretation": "Significant improvement in LDL since the last panel. HDL is now in the optimal range. Triglycerides remain borderline and should be rechecked.",
    "physicianNotes": "Diet changes are working. Continue current statin dose.",
    "recommendations": [
      "Keep saturated fat under 7% of daily calories",
      "Recheck triglycerides in three months"
    ]
  },
  {
    "id": "metabolic-2025-01",
    "testType": "Metabolic Panel",
    "category": "Metabolic",
    "date": "2025-01-10",
    "results": {
      "HbA1c": { "value": "5.6%", "status": "optimal", "trend": "down 0.3" },
      "Fasting Glucose": { "value": "96 mg/dL", "status": "optimal", "trend": "stable" },
      "Insulin": { "value": "9 uIU/mL", "status": "improved", "trend": "down 18%" }
    },
    "interpretation": "Glycaemic control is in the normal range. Insulin sensitivity has improved alongside weight loss.",
    "recommendations": [
      "Maintain current activity level"
    ]
  }
]
"##
}
