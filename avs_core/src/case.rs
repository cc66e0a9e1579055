//! Case file loading and templates.
//!
//! Cases arrive as JSON or TOML documents matching [`CaseInput`];
//! the format is picked by file extension. Parsing is strict: a case
//! file is required input and a malformed one is a fatal error, not
//! something to paper over with defaults.

use crate::error::{Error, Result};
use crate::types::{CaseInput, CaseMeta, Panel, PhaseInput, PhaseSelection, SampleRow};
use crate::units::UnitSelection;
use std::path::Path;
use std::str::FromStr;

/// Load a case from a JSON or TOML file
pub fn load_case(path: &Path) -> Result<CaseInput> {
    let text = std::fs::read_to_string(path)?;
    let case = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&text)?,
        Some("toml") => toml::from_str(&text)?,
        other => {
            return Err(Error::Case(format!(
                "unsupported case file extension {} (expected .json or .toml)",
                other.unwrap_or("<none>")
            )))
        }
    };
    tracing::debug!("Loaded case from {:?}", path);
    Ok(case)
}

/// Serialization format for generated templates
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemplateFormat {
    Json,
    Toml,
}

impl FromStr for TemplateFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(TemplateFormat::Json),
            "toml" => Ok(TemplateFormat::Toml),
            other => Err(Error::Case(format!(
                "unrecognized template format '{other}' (expected json or toml)"
            ))),
        }
    }
}

/// Render a ready-to-edit example case
///
/// The values are a worked post-stimulation study that classifies
/// cleanly, so a new user can run it unchanged and then substitute
/// their own numbers.
pub fn template(format: TemplateFormat) -> Result<String> {
    let case = example_case();
    let text = match format {
        TemplateFormat::Json => serde_json::to_string_pretty(&case)?,
        TemplateFormat::Toml => toml::to_string_pretty(&case)
            .map_err(|e| Error::Case(format!("template serialization failed: {e}")))?,
    };
    Ok(text)
}

fn example_case() -> CaseInput {
    let row = |primary: f64, companion: f64, drawn_at: &str| SampleRow {
        primary: Some(primary),
        companion: Some(companion),
        drawn_at: Some(drawn_at.to_string()),
    };
    CaseInput {
        panel: Panel::Aldosterone,
        phases: PhaseSelection::Post,
        units: UnitSelection::default(),
        pre: None,
        post: Some(PhaseInput {
            left: vec![row(180.0, 850.0, "09:12")],
            right: vec![row(2400.0, 900.0, "09:16"), row(2150.0, 880.0, "09:20")],
            ivc: vec![row(15.0, 20.0, "09:10")],
        }),
        meta: CaseMeta {
            initials: Some("AB".to_string()),
            exam_date: None,
            nodule_side: None,
            notes: Some("example study; replace every value".to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::SampleLimits;
    use crate::evaluate::evaluate_case;
    use crate::types::Conclusion;
    use std::io::Write;

    #[test]
    fn test_toml_template_parses_and_evaluates() {
        let text = template(TemplateFormat::Toml).unwrap();
        let case: CaseInput = toml::from_str(&text).unwrap();
        let evaluation = evaluate_case(&case, &SampleLimits::default()).unwrap();
        assert!(matches!(
            evaluation.phases[0].classification.conclusion,
            Conclusion::Unilateral { .. }
        ));
    }

    #[test]
    fn test_json_template_parses() {
        let text = template(TemplateFormat::Json).unwrap();
        let case: CaseInput = serde_json::from_str(&text).unwrap();
        assert_eq!(case.panel, Panel::Aldosterone);
        assert!(case.post.is_some());
    }

    #[test]
    fn test_load_case_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("case.json");
        std::fs::File::create(&json_path)
            .unwrap()
            .write_all(template(TemplateFormat::Json).unwrap().as_bytes())
            .unwrap();
        let case = load_case(&json_path).unwrap();
        assert_eq!(case.panel, Panel::Aldosterone);

        let toml_path = dir.path().join("case.toml");
        std::fs::File::create(&toml_path)
            .unwrap()
            .write_all(template(TemplateFormat::Toml).unwrap().as_bytes())
            .unwrap();
        let case = load_case(&toml_path).unwrap();
        assert_eq!(case.phases, PhaseSelection::Post);
    }

    #[test]
    fn test_unknown_extension_is_a_case_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("case.yaml");
        std::fs::write(&path, "panel: aldosterone").unwrap();
        let err = load_case(&path).unwrap_err();
        match err {
            Error::Case(message) => assert!(message.contains("yaml")),
            other => panic!("expected Case error, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_toml_is_a_typed_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("case.toml");
        std::fs::write(&path, "panel = \"aldosterone\"\nphases = [not toml").unwrap();
        let err = load_case(&path).unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let err = load_case(Path::new("/nonexistent/case.json")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_template_format_parsing() {
        assert_eq!("toml".parse::<TemplateFormat>().unwrap(), TemplateFormat::Toml);
        assert_eq!("JSON".parse::<TemplateFormat>().unwrap(), TemplateFormat::Json);
        assert!("yaml".parse::<TemplateFormat>().is_err());
    }
}
