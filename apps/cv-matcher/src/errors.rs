use std::path::PathBuf;

use thiserror::Error;

use crate::adaptation::AdaptationError;
use crate::llm_client::LlmError;
use crate::sections::extractor::SectionError;
use crate::sections::writer::SubstitutionError;

/// Pipeline-level error type.
/// Every variant names the stage that failed; `main` maps it to an exit status.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Missing section: {0}")]
    MissingSection(SectionError),

    #[error("Adaptation request failed: {0}")]
    AdaptationRequest(LlmError),

    #[error("Adaptation response rejected: {0}")]
    AdaptationParse(AdaptationError),

    #[error("Cannot write output '{}': {source}", path.display())]
    WriteTarget {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// Short stage name used in diagnostics.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Configuration(_) => "configuration",
            PipelineError::MissingSection(_) => "extract",
            PipelineError::AdaptationRequest(_) => "adapt",
            PipelineError::AdaptationParse(_) => "parse",
            PipelineError::WriteTarget { .. } => "write",
        }
    }

    /// Process exit status. Never 2, which clap uses for usage errors.
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::Configuration(_) => 3,
            PipelineError::MissingSection(_) => 4,
            PipelineError::AdaptationRequest(_) => 5,
            PipelineError::AdaptationParse(_) => 6,
            PipelineError::WriteTarget { .. } => 7,
        }
    }
}

impl From<SectionError> for PipelineError {
    fn from(err: SectionError) -> Self {
        match err {
            // A marker that cannot be compiled is a bad marker file, not a changed document.
            SectionError::InvalidMarker { .. } => PipelineError::Configuration(err.to_string()),
            other => PipelineError::MissingSection(other),
        }
    }
}

impl From<LlmError> for PipelineError {
    fn from(err: LlmError) -> Self {
        if matches!(err, LlmError::MissingCredential) {
            PipelineError::Configuration(err.to_string())
        } else if err.is_reply_shape() {
            PipelineError::AdaptationParse(AdaptationError::Reply(err))
        } else {
            PipelineError::AdaptationRequest(err)
        }
    }
}

impl From<AdaptationError> for PipelineError {
    fn from(err: AdaptationError) -> Self {
        match err {
            AdaptationError::Reply(inner) => PipelineError::from(inner),
            other => PipelineError::AdaptationParse(other),
        }
    }
}

impl From<SubstitutionError> for PipelineError {
    fn from(err: SubstitutionError) -> Self {
        match err {
            SubstitutionError::UnknownSection(id) => {
                PipelineError::AdaptationParse(AdaptationError::UnknownSection(id))
            }
            SubstitutionError::StaleDocument => PipelineError::Configuration(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::SectionId;

    #[test]
    fn test_exit_codes_are_distinct_per_stage() {
        let errors = [
            PipelineError::Configuration("x".to_string()),
            PipelineError::MissingSection(SectionError::MissingStart {
                section: SectionId::new("tagline"),
                marker: "\\tagline{".to_string(),
            }),
            PipelineError::AdaptationRequest(LlmError::Timeout { secs: 120 }),
            PipelineError::AdaptationParse(AdaptationError::NotAnObject),
            PipelineError::WriteTarget {
                path: PathBuf::from("/nope/out.tex"),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            },
        ];
        let mut codes: Vec<u8> = errors.iter().map(|e| e.exit_code()).collect();
        codes.dedup();
        assert_eq!(codes, vec![3, 4, 5, 6, 7]);
        assert!(!codes.contains(&2), "2 is clap's usage-error status");
        assert_eq!(errors[1].stage(), "extract");
        assert_eq!(errors[4].stage(), "write");
    }

    #[test]
    fn test_reply_shape_llm_errors_become_parse_errors() {
        let err = PipelineError::from(LlmError::EmptyContent);
        assert!(matches!(err, PipelineError::AdaptationParse(_)));

        let err = PipelineError::from(LlmError::Api {
            status: 500,
            message: "boom".to_string(),
        });
        assert!(matches!(err, PipelineError::AdaptationRequest(_)));

        let err = PipelineError::from(LlmError::MissingCredential);
        assert_eq!(err.stage(), "configuration");
    }

    #[test]
    fn test_unknown_section_in_writer_is_a_parse_error() {
        let err = PipelineError::from(SubstitutionError::UnknownSection(SectionId::new("hobbies")));
        assert_eq!(err.stage(), "parse");
    }
}
