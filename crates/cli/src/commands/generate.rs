use bakecast_agent::{GenerationAttempt, RecipeRequest, RecipeRuntime};
use bakecast_core::config::LoadOptions;
use bakecast_core::domain::recipe::Language;
use chrono::NaiveDate;
use serde_json::json;

use crate::commands::{async_runtime, load_config, CommandResult, EXIT_RUNTIME_INIT};

#[derive(Debug, Clone, Default)]
pub struct GenerateArgs {
    pub segment: String,
    pub date: Option<NaiveDate>,
    pub trend: Option<String>,
    pub occasion: Option<String>,
    pub ingredients: Option<String>,
    pub language: Option<Language>,
}

pub fn run(args: &GenerateArgs, options: LoadOptions) -> CommandResult {
    let config = match load_config("generate", options) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match RecipeRuntime::from_config(&config) {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "generate",
                "runtime_setup",
                error.to_string(),
                EXIT_RUNTIME_INIT,
            )
        }
    };
    let executor = match async_runtime("generate") {
        Ok(executor) => executor,
        Err(result) => return result,
    };

    let generated = executor.block_on(runtime.generate(RecipeRequest {
        date: args.date,
        segment: args.segment.clone(),
        trend: args.trend.clone(),
        occasion: args.occasion.clone(),
        ingredients: args.ingredients.clone(),
        language: args.language,
        auxiliary_output: None,
    }));

    let stages: Vec<_> = generated.attempts.iter().map(stage_trace).collect();
    let message = format!(
        "`{}` produced by {} stage after {} attempt(s)",
        generated.recipe.title,
        generated.recipe.produced_by,
        generated.attempts.len()
    );
    CommandResult::success_with(
        "generate",
        message,
        &json!({
            "correlation_id": generated.correlation_id,
            "model_scored": generated.model_scored,
            "stages": stages,
            "recipe": generated.recipe,
        }),
    )
}

fn stage_trace(attempt: &GenerationAttempt) -> serde_json::Value {
    json!({
        "stage": attempt.stage,
        "outcome": attempt.outcome,
        "parse_tier": attempt.parse_tier,
        "error": attempt.error,
        "raw_chars": attempt.raw_text.chars().count(),
        "at": attempt.timestamp,
    })
}
