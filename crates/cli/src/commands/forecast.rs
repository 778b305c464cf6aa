use bakecast_agent::{ForecastRequest, RecipeRuntime};
use bakecast_core::config::LoadOptions;
use bakecast_core::domain::recipe::Language;
use chrono::NaiveDate;

use crate::commands::{async_runtime, load_config, CommandResult, EXIT_RUNTIME_INIT};

#[derive(Debug, Clone)]
pub struct ForecastArgs {
    pub segment: String,
    pub start: Option<NaiveDate>,
    pub horizon_days: u32,
    pub top_k: usize,
    pub language: Option<Language>,
    pub skip_market_analysis: bool,
}

impl Default for ForecastArgs {
    fn default() -> Self {
        let request = ForecastRequest::default();
        Self {
            segment: String::new(),
            start: None,
            horizon_days: request.horizon_days,
            top_k: request.top_k,
            language: None,
            skip_market_analysis: false,
        }
    }
}

pub fn run(args: &ForecastArgs, options: LoadOptions) -> CommandResult {
    let config = match load_config("forecast", options) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match RecipeRuntime::from_config(&config) {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "forecast",
                "runtime_setup",
                error.to_string(),
                EXIT_RUNTIME_INIT,
            )
        }
    };
    let executor = match async_runtime("forecast") {
        Ok(executor) => executor,
        Err(result) => return result,
    };

    let forecast = executor.block_on(runtime.forecast(ForecastRequest {
        start: args.start,
        segment: args.segment.clone(),
        horizon_days: args.horizon_days,
        top_k: args.top_k,
        language: args.language,
        include_market_analysis: !args.skip_market_analysis,
    }));

    let message = format!(
        "{} to {}: {} event(s), average strength {:.3}",
        forecast.start,
        forecast.end,
        forecast.top_events.len(),
        forecast.summary.avg_trend_strength
    );
    CommandResult::success_with("forecast", message, &forecast)
}
