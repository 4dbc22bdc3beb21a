//! CV adaptation pipeline — wires the stages together.
//!
//! Flow: read CV → extract sections → resolve job description → LLM adapt →
//!       substitute → write (atomic) or print (dry run).
//!
//! Any failure stops every later stage. In particular nothing is written unless
//! the adaptation reply was fully validated.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::adaptation::adapter::adapt_sections;
use crate::config::Config;
use crate::errors::PipelineError;
use crate::llm_client::TextGenerator;
use crate::sections::extractor::extract_sections;
use crate::sections::writer::{apply_adaptations, fit_replacement, write_document};
use crate::sections::SectionId;

/// Per-section outcome, for the final summary.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionChange {
    pub id: SectionId,
    pub changed: bool,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    /// `None` on a dry run.
    pub output_path: Option<PathBuf>,
    pub adapted_document: String,
    pub sections: Vec<SectionChange>,
}

/// Runs the whole pipeline once.
pub async fn run(
    config: &Config,
    generator: &dyn TextGenerator,
) -> Result<RunReport, PipelineError> {
    if !config.dry_run {
        ensure_distinct_paths(&config.cv_path, &config.output_path)?;
    }

    info!("Reading original CV from {}", config.cv_path.display());
    let document = tokio::fs::read_to_string(&config.cv_path)
        .await
        .map_err(|e| {
            PipelineError::Configuration(format!(
                "Cannot read CV '{}': {e}",
                config.cv_path.display()
            ))
        })?;

    info!("Extracting {} CV sections", config.section_specs.len());
    let sections = extract_sections(&document, &config.section_specs)?;

    let job_description = resolve_job_description(&config.job_description).await?;

    info!("Analyzing CV and job description with {}", config.model);
    let result = adapt_sections(generator, &sections, &job_description).await?;

    let adapted_document = apply_adaptations(&document, &sections, &result)?;

    let changes: Vec<SectionChange> = sections
        .iter()
        .map(|s| SectionChange {
            id: s.id.clone(),
            changed: result
                .get(&s.id)
                .map(|text| fit_replacement(s, text) != s.content)
                .unwrap_or(false),
        })
        .collect();

    let output_path = if config.dry_run {
        info!("Dry run: adapted CV not written");
        None
    } else {
        info!("Saving adapted CV to {}", config.output_path.display());
        write_document(&config.output_path, &adapted_document)?;
        Some(config.output_path.clone())
    };

    Ok(RunReport {
        output_path,
        adapted_document,
        sections: changes,
    })
}

/// An existing file path is read; anything else is the job description itself.
pub async fn resolve_job_description(input: &str) -> Result<String, PipelineError> {
    let path = Path::new(input);
    let is_file = !input.contains('\n')
        && tokio::fs::metadata(path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);

    let text = if is_file {
        info!("Reading job description from file: {}", path.display());
        tokio::fs::read_to_string(path).await.map_err(|e| {
            PipelineError::Configuration(format!(
                "Cannot read job description '{}': {e}",
                path.display()
            ))
        })?
    } else {
        info!("Using job description from command line argument");
        input.to_string()
    };

    if text.trim().is_empty() {
        return Err(PipelineError::Configuration(
            "Job description is empty".to_string(),
        ));
    }
    Ok(text)
}

/// Refuses to run when the output would overwrite the input CV.
fn ensure_distinct_paths(input: &Path, output: &Path) -> Result<(), PipelineError> {
    let same = match (std::fs::canonicalize(input), canonical_output(output)) {
        (Ok(a), Some(b)) => a == b,
        _ => input == output,
    };
    if same {
        return Err(PipelineError::Configuration(format!(
            "Output path '{}' is the input CV; choose a different --output",
            output.display()
        )));
    }
    Ok(())
}

fn canonical_output(output: &Path) -> Option<PathBuf> {
    if let Ok(path) = std::fs::canonicalize(output) {
        return Some(path);
    }
    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let name = output.file_name()?;
    std::fs::canonicalize(parent).ok().map(|p| p.join(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use tempfile::TempDir;

    use crate::adaptation::adapter::tests::ScriptedGenerator;
    use crate::config::{DEFAULT_API_BASE_URL, DEFAULT_MODEL};
    use crate::sections::default_section_specs;
    use crate::sections::extractor::tests::SAMPLE_CV;

    const JOB: &str = "Seeking a cloud engineer with Kubernetes experience";

    fn workspace() -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let cv = dir.path().join("resume.tex");
        std::fs::write(&cv, SAMPLE_CV).unwrap();
        (dir, cv)
    }

    fn tagline_config(cv: &Path, output: &Path) -> Config {
        Config {
            cv_path: cv.to_path_buf(),
            output_path: output.to_path_buf(),
            job_description: JOB.to_string(),
            api_key: "test-key".to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(5),
            section_specs: default_section_specs().into_iter().take(1).collect(),
            dry_run: false,
        }
    }

    fn section_config(cv: &Path, output: &Path, id: &str) -> Config {
        let mut config = tagline_config(cv, output);
        config.section_specs = default_section_specs()
            .into_iter()
            .filter(|s| s.id.as_str() == id)
            .collect();
        config
    }

    fn reply(text: &str) -> ScriptedGenerator {
        ScriptedGenerator::new(Ok(text.to_string()))
    }

    #[tokio::test]
    async fn test_tagline_scenario_writes_adapted_copy() {
        let (dir, cv) = workspace();
        let output = dir.path().join("resume_adapted.tex");
        let config = tagline_config(&cv, &output);
        let generator =
            reply(r#"{"tagline": "Cloud-focused engineer with Kubernetes experience"}"#);

        let report = run(&config, &generator).await.unwrap();

        let expected = SAMPLE_CV.replace(
            "\\tagline{Original tagline text}",
            "\\tagline{Cloud-focused engineer with Kubernetes experience}",
        );
        assert_eq!(std::fs::read_to_string(&output).unwrap(), expected);
        assert_eq!(std::fs::read_to_string(&cv).unwrap(), SAMPLE_CV);
        assert_eq!(report.output_path.as_deref(), Some(output.as_path()));
        assert_eq!(
            report.sections,
            vec![SectionChange {
                id: SectionId::new("tagline"),
                changed: true
            }]
        );
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_mainbar_reply_keeping_layout_brace_is_written() {
        let (dir, cv) = workspace();
        let output = dir.path().join("resume_adapted.tex");
        let config = section_config(&cv, &output, "mainbar");
        let generator = reply(
            r#"{"mainbar": "\\section{Work History}\n  \\cvevent{Platform Engineer}{Acme}{2020 -- now}\n  Built Kubernetes-based internal tooling.\n}"}"#,
        );

        let report = run(&config, &generator).await.unwrap();

        let written = std::fs::read_to_string(&output).unwrap();
        assert!(written.contains("Built Kubernetes-based internal tooling.\n}\n\\makebody"));
        assert_eq!(written.matches("\\mainbar{").count(), 1);
        assert!(report.sections[0].changed);
        assert!(generator
            .last_prompt
            .lock()
            .unwrap()
            .contains("unmatched closing brace"));
    }

    #[tokio::test]
    async fn test_missing_marker_aborts_before_network_call() {
        let (dir, cv) = workspace();
        std::fs::write(&cv, SAMPLE_CV.replace("\\tagline{Original tagline text}", "")).unwrap();
        let output = dir.path().join("out.tex");
        let generator = reply(r#"{"tagline": "x"}"#);

        let err = run(&tagline_config(&cv, &output), &generator)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::MissingSection(_)));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_unparseable_reply_creates_no_output() {
        let (dir, cv) = workspace();
        let output = dir.path().join("out.tex");
        let generator = reply("I rewrote your CV! It looks great now.");

        let err = run(&tagline_config(&cv, &output), &generator)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::AdaptationParse(_)));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_key_mismatch_creates_no_output() {
        let (dir, cv) = workspace();
        let output = dir.path().join("out.tex");

        for body in [
            r#"{}"#,
            r#"{"tagline": "x", "skills": "y"}"#,
        ] {
            let err = run(&tagline_config(&cv, &output), &reply(body))
                .await
                .unwrap_err();
            assert!(matches!(err, PipelineError::AdaptationParse(_)), "{body}");
            assert!(!output.exists());
        }
    }

    #[tokio::test]
    async fn test_missing_output_directory_leaves_input_untouched() {
        let (dir, cv) = workspace();
        let output = dir.path().join("no-such-dir").join("out.tex");
        let generator = reply(r#"{"tagline": "Cloud engineer"}"#);

        let err = run(&tagline_config(&cv, &output), &generator)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::WriteTarget { .. }));
        assert_eq!(std::fs::read_to_string(&cv).unwrap(), SAMPLE_CV);
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_request_failure_is_reported_as_adapt_stage() {
        let (dir, cv) = workspace();
        let output = dir.path().join("out.tex");
        let generator = ScriptedGenerator::new(Err(crate::llm_client::LlmError::Timeout {
            secs: 5,
        }));

        let err = run(&tagline_config(&cv, &output), &generator)
            .await
            .unwrap_err();

        assert_eq!(err.stage(), "adapt");
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_output_equal_to_input_is_rejected() {
        let (_dir, cv) = workspace();
        let generator = reply(r#"{"tagline": "x"}"#);

        let err = run(&tagline_config(&cv, &cv), &generator).await.unwrap_err();

        assert!(matches!(err, PipelineError::Configuration(_)));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(std::fs::read_to_string(&cv).unwrap(), SAMPLE_CV);
    }

    #[tokio::test]
    async fn test_unreadable_cv_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let cv = dir.path().join("missing.tex");
        let output = dir.path().join("out.tex");
        let generator = reply(r#"{"tagline": "x"}"#);

        let err = run(&tagline_config(&cv, &output), &generator)
            .await
            .unwrap_err();

        assert_eq!(err.stage(), "configuration");
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let (dir, cv) = workspace();
        let output = dir.path().join("out.tex");
        let mut config = tagline_config(&cv, &output);
        config.dry_run = true;
        let generator = reply(r#"{"tagline": "Original tagline text"}"#);

        let report = run(&config, &generator).await.unwrap();

        assert!(report.output_path.is_none());
        assert_eq!(report.adapted_document, SAMPLE_CV);
        assert!(!report.sections[0].changed);
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_job_description_is_read_from_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.txt");
        std::fs::write(&path, "Platform role, Terraform a plus").unwrap();

        let text = resolve_job_description(path.to_str().unwrap()).await.unwrap();
        assert_eq!(text, "Platform role, Terraform a plus");
    }

    #[tokio::test]
    async fn test_job_description_literal_text_is_used_as_is() {
        let text = resolve_job_description(JOB).await.unwrap();
        assert_eq!(text, JOB);
    }

    #[tokio::test]
    async fn test_empty_job_description_aborts_before_network_call() {
        let (dir, cv) = workspace();
        let output = dir.path().join("out.tex");
        let mut config = tagline_config(&cv, &output);
        config.job_description = "   ".to_string();
        let generator = reply(r#"{"tagline": "x"}"#);

        let err = run(&config, &generator).await.unwrap_err();

        assert_eq!(err.stage(), "configuration");
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }
}
