use bakecast_agent::RecipeRuntime;
use bakecast_core::config::LoadOptions;
use bakecast_core::errors::TrendError;
use chrono::{NaiveDate, Utc};

use crate::commands::{interface_failure, load_config, CommandResult, EXIT_ARTIFACT, EXIT_MODEL_NOT_TRAINED};

#[derive(Debug, Clone)]
pub struct PredictArgs {
    pub segment: String,
    pub date: Option<NaiveDate>,
}

pub fn run(args: &PredictArgs, options: LoadOptions) -> CommandResult {
    let config = match load_config("predict", options) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match RecipeRuntime::from_config(&config) {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure("predict", "runtime_setup", error.to_string(), EXIT_ARTIFACT)
        }
    };

    let date = args.date.unwrap_or_else(|| Utc::now().date_naive());
    match runtime.predict(date, &args.segment) {
        Ok(insight) => CommandResult::success_with(
            "predict",
            format!(
                "{} on {date}: {:.3} ({})",
                insight.market.segment_id, insight.enhanced_strength, insight.level
            ),
            &insight,
        ),
        Err(error @ TrendError::ModelNotTrained { .. }) => CommandResult::failure(
            "predict",
            "model_not_trained",
            format!("{error}; run `bakecast train --data <records.json>` first"),
            EXIT_MODEL_NOT_TRAINED,
        ),
        Err(error) => interface_failure("predict", error, EXIT_ARTIFACT),
    }
}
