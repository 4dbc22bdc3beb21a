use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::errors::PipelineError;
use crate::sections::{
    default_section_specs, load_section_specs, select_specs, validate_specs, SectionSpec,
};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Command-line arguments. Secrets and service settings fall back to the
/// environment (a `.env` file is loaded first).
#[derive(Debug, Clone, Parser)]
#[command(name = "cv-matcher")]
#[command(about = "Adapt a LaTeX CV to a job description using the Gemini API")]
#[command(version)]
pub struct Args {
    /// Path to the LaTeX CV file
    #[arg(long, default_value = "./LaTeX/resume.tex")]
    pub cv: PathBuf,

    /// Job description text, or a path to a file containing it
    #[arg(long)]
    pub job_description: String,

    /// Path to save the adapted CV
    #[arg(long, default_value = "./LaTeX/resume_adapted.tex")]
    pub output: PathBuf,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Gemini model to use
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Base URL of the Gemini REST API
    #[arg(long, env = "GEMINI_API_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    pub api_base_url: String,

    /// Timeout for the adaptation request, in seconds
    #[arg(long, default_value_t = 120)]
    pub timeout_secs: u64,

    /// JSON file describing section markers (defaults to the built-in set)
    #[arg(long)]
    pub markers: Option<PathBuf>,

    /// Only adapt these sections (repeatable)
    #[arg(long = "section")]
    pub sections: Vec<String>,

    /// Print the adapted CV to stdout instead of writing it
    #[arg(long)]
    pub dry_run: bool,
}

/// Run configuration, resolved once at startup and passed by reference.
#[derive(Debug, Clone)]
pub struct Config {
    pub cv_path: PathBuf,
    pub output_path: PathBuf,
    /// Raw `--job-description` value; resolved to text by the pipeline.
    pub job_description: String,
    pub api_key: String,
    pub model: String,
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub section_specs: Vec<SectionSpec>,
    pub dry_run: bool,
}

impl Config {
    pub fn from_args(args: Args) -> Result<Self, PipelineError> {
        let api_key = args
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                PipelineError::Configuration(
                    "Gemini API key not provided. Use --api-key or set GEMINI_API_KEY environment variable."
                        .to_string(),
                )
            })?;

        if args.model.trim().is_empty() {
            return Err(PipelineError::Configuration(
                "--model cannot be empty".to_string(),
            ));
        }

        if args.timeout_secs == 0 {
            return Err(PipelineError::Configuration(
                "--timeout-secs must be at least 1".to_string(),
            ));
        }

        let specs = match &args.markers {
            Some(path) => load_section_specs(path),
            None => Ok(default_section_specs()),
        }
        .and_then(|specs| select_specs(specs, &args.sections))
        .and_then(|specs| validate_specs(&specs).map(|_| specs))
        .map_err(|e| PipelineError::Configuration(format!("{e:#}")))?;

        Ok(Config {
            cv_path: args.cv,
            output_path: args.output,
            job_description: args.job_description,
            api_key,
            model: args.model,
            api_base_url: args.api_base_url,
            request_timeout: Duration::from_secs(args.timeout_secs),
            section_specs: specs,
            dry_run: args.dry_run,
        })
    }
}
