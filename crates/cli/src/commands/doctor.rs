use bakecast_core::config::{AppConfig, LoadOptions};
use bakecast_core::errors::TrendError;
use bakecast_core::predictor::ArtifactStore;
use bakecast_core::{ContextAssembler, EnhancedTrendCalculator};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

const DEPENDENT_CHECKS: [&str; 3] = ["artifact_bundle", "threshold_document", "context_tables"];

pub fn run(json_output: bool, options: LoadOptions) -> String {
    let report = build_report(options);

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report(options: LoadOptions) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(options) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: format!(
                    "configuration loaded ({} via {})",
                    config.llm.model,
                    config.llm.provider.as_str()
                ),
            });
            checks.push(check_artifact_bundle(&config));
            checks.push(check_threshold_document(&config));
            checks.push(check_context_tables(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in DEPENDENT_CHECKS {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_artifact_bundle(config: &AppConfig) -> DoctorCheck {
    let store = ArtifactStore::new(&config.model.artifact_dir);
    match store.load(&config.model.name) {
        Ok(bundle) => DoctorCheck {
            name: "artifact_bundle",
            status: CheckStatus::Pass,
            details: format!(
                "`{}` trained {} with {} feature columns",
                bundle.name,
                bundle.trained_at.format("%Y-%m-%d"),
                bundle.feature_columns.len()
            ),
        },
        Err(TrendError::ModelNotTrained { .. }) => DoctorCheck {
            name: "artifact_bundle",
            status: CheckStatus::Fail,
            details: format!(
                "no bundle at `{}`; run `bakecast train --data <records.json>`",
                store.path_for(&config.model.name).display()
            ),
        },
        Err(error) => DoctorCheck {
            name: "artifact_bundle",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn check_threshold_document(config: &AppConfig) -> DoctorCheck {
    let path = config.thresholds.path.as_deref();
    match EnhancedTrendCalculator::from_optional_path(path) {
        Ok(_) => DoctorCheck {
            name: "threshold_document",
            status: CheckStatus::Pass,
            details: match path {
                Some(path) => format!("loaded `{}`", path.display()),
                None => "using built-in thresholds".to_string(),
            },
        },
        Err(error) => DoctorCheck {
            name: "threshold_document",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn check_context_tables(config: &AppConfig) -> DoctorCheck {
    let path = config.context.tables_path.as_deref();
    match ContextAssembler::from_optional_path(path) {
        Ok(_) => DoctorCheck {
            name: "context_tables",
            status: CheckStatus::Pass,
            details: match path {
                Some(path) => format!("loaded `{}`", path.display()),
                None => "using built-in tables".to_string(),
            },
        },
        Err(error) => DoctorCheck {
            name: "context_tables",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
