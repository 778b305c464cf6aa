//! Staged recipe generation.
//!
//! Every request walks Primary → EnhancedTranslate → Template, stopping at the
//! first stage whose parsed draft is complete. Transitions are decided by
//! [`next_stage`]; generator failures are recorded on the attempt and
//! escalated, never returned. A complete primary draft that was sent through
//! enhancement is kept when enhancement does not produce a complete one.

use std::sync::Arc;

use bakecast_core::domain::context::{MarketContext, SeasonalContext};
use bakecast_core::domain::recipe::{GenerationStage, Language, ParsedRecipeDraft};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::llm::{Enhancer, GenerationOptions, LlmClient, NoopEnhancer, NoopTranslator, Translator};
use crate::parser::{ParseTier, RecipeParser};
use crate::prompt::{primary_prompt, PromptContext};
use crate::template::{template_recipe, TemplateRequest};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Complete,
    Incomplete,
    GeneratorFailed,
}

/// One stage execution, kept for the stage trace.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationAttempt {
    pub stage: GenerationStage,
    pub raw_text: String,
    pub timestamp: DateTime<Utc>,
    pub outcome: AttemptOutcome,
    pub parse_tier: Option<ParseTier>,
    pub error: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageTransition {
    pub from: GenerationStage,
    pub to: Option<GenerationStage>,
    pub outcome: AttemptOutcome,
}

/// Transition function of the stage machine. `to == None` ends the run.
pub fn next_stage(
    current: GenerationStage,
    outcome: AttemptOutcome,
    enhance_primary: bool,
) -> StageTransition {
    let to = match (current, outcome) {
        (GenerationStage::Primary, AttemptOutcome::GeneratorFailed) => {
            Some(GenerationStage::Template)
        }
        (GenerationStage::Primary, _) if enhance_primary => Some(GenerationStage::EnhancedTranslate),
        (GenerationStage::Primary, AttemptOutcome::Complete) => None,
        (GenerationStage::Primary, AttemptOutcome::Incomplete) => Some(GenerationStage::Template),
        (GenerationStage::EnhancedTranslate, AttemptOutcome::Complete) => None,
        (GenerationStage::EnhancedTranslate, _) => Some(GenerationStage::Template),
        (GenerationStage::Template, _) => None,
    };
    StageTransition { from: current, to, outcome }
}

/// Raw text from an upstream ingredient-conditioned generator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuxiliaryOutput {
    pub raw: String,
    pub language: Language,
}

#[derive(Clone, Debug)]
pub struct OrchestrationRequest {
    pub seasonal: SeasonalContext,
    pub market: MarketContext,
    pub trend_strength: f64,
    pub trend: Option<String>,
    pub occasion: Option<String>,
    pub ingredients: Option<String>,
    pub language: Language,
    /// When present the run starts at Stage S with this text.
    pub auxiliary_output: Option<AuxiliaryOutput>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrchestrationResult {
    pub correlation_id: Uuid,
    pub draft: ParsedRecipeDraft,
    pub produced_by: GenerationStage,
    pub attempts: Vec<GenerationAttempt>,
}

struct StageRun {
    attempt: GenerationAttempt,
    draft: ParsedRecipeDraft,
}

pub struct GenerationOrchestrator {
    llm: Arc<dyn LlmClient>,
    translator: Arc<dyn Translator>,
    enhancer: Arc<dyn Enhancer>,
    options: GenerationOptions,
    enhance_primary: bool,
}

impl GenerationOrchestrator {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            translator: Arc::new(NoopTranslator),
            enhancer: Arc::new(NoopEnhancer),
            options: GenerationOptions::default(),
            enhance_primary: false,
        }
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = translator;
        self
    }

    pub fn with_enhancer(mut self, enhancer: Arc<dyn Enhancer>) -> Self {
        self.enhancer = enhancer;
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// Sends every successful primary output through Stage S.
    pub fn with_enhance_primary(mut self, enhance_primary: bool) -> Self {
        self.enhance_primary = enhance_primary;
        self
    }

    pub async fn run(&self, request: &OrchestrationRequest) -> OrchestrationResult {
        let correlation_id = Uuid::new_v4();
        let parser = RecipeParser::new(request.language);
        let mut attempts = Vec::new();
        let mut carried = request.auxiliary_output.clone();
        let mut complete_primary: Option<ParsedRecipeDraft> = None;
        let mut stage = if carried.is_some() {
            GenerationStage::EnhancedTranslate
        } else {
            GenerationStage::Primary
        };

        loop {
            let run = match stage {
                GenerationStage::Primary => self.primary(request, &parser).await,
                GenerationStage::EnhancedTranslate => {
                    self.enhanced_translate(carried.take(), request.language, &parser).await
                }
                GenerationStage::Template => template_stage(request),
            };

            if stage == GenerationStage::Primary
                && run.attempt.outcome != AttemptOutcome::GeneratorFailed
            {
                carried = Some(AuxiliaryOutput {
                    raw: run.attempt.raw_text.clone(),
                    language: request.language,
                });
            }

            let transition = next_stage(stage, run.attempt.outcome, self.enhance_primary);
            let outcome = run.attempt.outcome;
            attempts.push(run.attempt);

            if stage == GenerationStage::Primary && outcome == AttemptOutcome::Complete {
                complete_primary = Some(run.draft.clone());
            }

            if transition.to == Some(GenerationStage::Template) {
                if let Some(draft) = complete_primary.take() {
                    info!(
                        event_name = "generation.primary.kept",
                        correlation_id = %correlation_id,
                        outcome = ?outcome,
                        "enhancement incomplete; keeping complete primary draft"
                    );
                    return finished(correlation_id, draft, GenerationStage::Primary, attempts);
                }
            }

            let Some(next) = transition.to else {
                return finished(correlation_id, run.draft, stage, attempts);
            };

            info!(
                event_name = "generation.stage.escalated",
                correlation_id = %correlation_id,
                from = %transition.from,
                to = %next,
                outcome = ?transition.outcome,
                "escalating to next generation stage"
            );
            stage = next;
        }
    }

    async fn primary(&self, request: &OrchestrationRequest, parser: &RecipeParser) -> StageRun {
        let prompt = primary_prompt(&PromptContext {
            seasonal: &request.seasonal,
            market: &request.market,
            trend_strength: request.trend_strength,
            trend: request.trend.as_deref(),
            occasion: request.occasion.as_deref(),
            ingredients: request.ingredients.as_deref(),
            language: request.language,
        });

        match self.llm.generate(&prompt, self.options).await {
            Ok(raw) => parsed_run(GenerationStage::Primary, raw, parser),
            Err(error) => {
                warn!(
                    event_name = "generation.stage.failed",
                    stage = %GenerationStage::Primary,
                    error_kind = error.kind(),
                    error = %error,
                    "generator call failed"
                );
                StageRun {
                    attempt: GenerationAttempt {
                        stage: GenerationStage::Primary,
                        raw_text: String::new(),
                        timestamp: Utc::now(),
                        outcome: AttemptOutcome::GeneratorFailed,
                        parse_tier: None,
                        error: Some(error.to_string()),
                    },
                    draft: parser.parse("").into_draft(parser.language()),
                }
            }
        }
    }

    async fn enhanced_translate(
        &self,
        input: Option<AuxiliaryOutput>,
        target: Language,
        parser: &RecipeParser,
    ) -> StageRun {
        let Some(input) = input else {
            return StageRun {
                attempt: GenerationAttempt {
                    stage: GenerationStage::EnhancedTranslate,
                    raw_text: String::new(),
                    timestamp: Utc::now(),
                    outcome: AttemptOutcome::GeneratorFailed,
                    parse_tier: None,
                    error: Some("no upstream output to enhance".to_string()),
                },
                draft: parser.parse("").into_draft(target),
            };
        };

        let translated = self.translator.translate(&input.raw, input.language, target).await;
        let enhanced = self.enhancer.enhance(&translated).await;
        parsed_run(GenerationStage::EnhancedTranslate, enhanced, parser)
    }
}

fn finished(
    correlation_id: Uuid,
    draft: ParsedRecipeDraft,
    produced_by: GenerationStage,
    attempts: Vec<GenerationAttempt>,
) -> OrchestrationResult {
    info!(
        event_name = "generation.completed",
        correlation_id = %correlation_id,
        stage = %produced_by,
        attempts = attempts.len(),
        "recipe generation finished"
    );
    OrchestrationResult { correlation_id, draft, produced_by, attempts }
}

fn parsed_run(stage: GenerationStage, raw: String, parser: &RecipeParser) -> StageRun {
    let parsed = parser.parse(&raw);
    let parse_tier = parsed.tier();
    let draft = parsed.into_draft(parser.language());
    let outcome =
        if draft.is_complete() { AttemptOutcome::Complete } else { AttemptOutcome::Incomplete };
    StageRun {
        attempt: GenerationAttempt {
            stage,
            raw_text: raw,
            timestamp: Utc::now(),
            outcome,
            parse_tier,
            error: None,
        },
        draft,
    }
}

fn template_stage(request: &OrchestrationRequest) -> StageRun {
    let draft = template_recipe(&TemplateRequest {
        trend: request.trend.as_deref(),
        segment: &request.market.segment_id,
        occasion: request.occasion.as_deref(),
        season: request.seasonal.season,
        language: request.language,
    });
    StageRun {
        attempt: GenerationAttempt {
            stage: GenerationStage::Template,
            raw_text: String::new(),
            timestamp: Utc::now(),
            outcome: AttemptOutcome::Complete,
            parse_tier: None,
            error: None,
        },
        draft,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use bakecast_core::context::ContextAssembler;
    use bakecast_core::domain::recipe::{GenerationStage, Language};
    use chrono::NaiveDate;

    use super::{
        next_stage, AttemptOutcome, AuxiliaryOutput, GenerationOrchestrator, OrchestrationRequest,
    };
    use crate::llm::{Enhancer, GenerationError, GenerationOptions, LlmClient};

    const MATCHA: &str = r#"{"title":"Matcha Cake","ingredients":[{"name":"flour","quantity":"200","unit":"g"}],"instructions":["Mix"]}"#;

    struct ScriptedClient {
        responses: Mutex<VecDeque<Result<String, GenerationError>>>,
    }

    impl ScriptedClient {
        fn new(responses: Vec<Result<String, GenerationError>>) -> Arc<Self> {
            Arc::new(Self { responses: Mutex::new(responses.into()) })
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedClient {
        async fn generate(
            &self,
            _prompt: &str,
            _options: GenerationOptions,
        ) -> Result<String, GenerationError> {
            match self.responses.lock() {
                Ok(mut queue) => queue.pop_front().unwrap_or(Err(GenerationError::Empty)),
                Err(_) => Err(GenerationError::Empty),
            }
        }
    }

    struct FixedEnhancer(&'static str);

    #[async_trait]
    impl Enhancer for FixedEnhancer {
        async fn enhance(&self, _raw: &str) -> String {
            self.0.to_string()
        }
    }

    fn request(language: Language) -> OrchestrationRequest {
        let Some(date) = NaiveDate::from_ymd_opt(2025, 10, 20) else {
            panic!("valid date");
        };
        let (seasonal, market) = ContextAssembler::default().assemble(date, "gen_z");
        OrchestrationRequest {
            seasonal,
            market,
            trend_strength: 0.5,
            trend: Some("Pumpkin".to_string()),
            occasion: None,
            ingredients: None,
            language,
            auxiliary_output: None,
        }
    }

    #[test]
    fn transition_table() {
        use AttemptOutcome::{Complete, GeneratorFailed, Incomplete};
        use GenerationStage::{EnhancedTranslate, Primary, Template};

        assert_eq!(next_stage(Primary, Complete, false).to, None);
        assert_eq!(next_stage(Primary, Incomplete, false).to, Some(Template));
        assert_eq!(next_stage(Primary, GeneratorFailed, false).to, Some(Template));
        assert_eq!(next_stage(Primary, Complete, true).to, Some(EnhancedTranslate));
        assert_eq!(next_stage(Primary, Incomplete, true).to, Some(EnhancedTranslate));
        assert_eq!(next_stage(Primary, GeneratorFailed, true).to, Some(Template));
        assert_eq!(next_stage(EnhancedTranslate, Complete, false).to, None);
        assert_eq!(next_stage(EnhancedTranslate, Incomplete, true).to, Some(Template));
        assert_eq!(next_stage(Template, Incomplete, true).to, None);
    }

    #[tokio::test]
    async fn complete_primary_output_stops_at_primary() {
        let orchestrator = GenerationOrchestrator::new(ScriptedClient::new(vec![Ok(MATCHA.into())]));
        let result = orchestrator.run(&request(Language::En)).await;

        assert_eq!(result.produced_by, GenerationStage::Primary);
        assert_eq!(result.draft.title, "Matcha Cake");
        assert_eq!(result.attempts.len(), 1);
    }

    #[tokio::test]
    async fn generator_failure_escalates_to_template() {
        let orchestrator = GenerationOrchestrator::new(ScriptedClient::new(vec![Err(
            GenerationError::Blocked("SAFETY".to_string()),
        )]));
        let result = orchestrator.run(&request(Language::Vi)).await;

        assert_eq!(result.produced_by, GenerationStage::Template);
        assert_eq!(result.attempts[0].outcome, AttemptOutcome::GeneratorFailed);
        assert!(result.attempts[0].error.is_some());
        assert_eq!(result.draft.title, "Bánh Pumpkin Đặc Biệt");
    }

    #[tokio::test]
    async fn lightweight_primary_goes_through_enhancement() {
        let orchestrator = GenerationOrchestrator::new(ScriptedClient::new(vec![Ok(
            "cake with some flour".into(),
        )]))
        .with_enhancer(Arc::new(FixedEnhancer(MATCHA)))
        .with_enhance_primary(true);
        let result = orchestrator.run(&request(Language::En)).await;

        assert_eq!(result.produced_by, GenerationStage::EnhancedTranslate);
        let stages: Vec<_> = result.attempts.iter().map(|attempt| attempt.stage).collect();
        assert_eq!(stages, vec![GenerationStage::Primary, GenerationStage::EnhancedTranslate]);
    }

    #[tokio::test]
    async fn complete_primary_survives_incomplete_enhancement() {
        let orchestrator = GenerationOrchestrator::new(ScriptedClient::new(vec![Ok(MATCHA.into())]))
            .with_enhancer(Arc::new(FixedEnhancer("just some words")))
            .with_enhance_primary(true);
        let result = orchestrator.run(&request(Language::En)).await;

        assert_eq!(result.produced_by, GenerationStage::Primary);
        assert_eq!(result.draft.title, "Matcha Cake");
        let outcomes: Vec<_> = result.attempts.iter().map(|attempt| attempt.outcome).collect();
        assert_eq!(outcomes, vec![AttemptOutcome::Complete, AttemptOutcome::Incomplete]);
    }

    #[tokio::test]
    async fn auxiliary_output_starts_at_enhancement_stage() {
        let orchestrator = GenerationOrchestrator::new(ScriptedClient::new(Vec::new()));
        let mut request = request(Language::En);
        request.auxiliary_output =
            Some(AuxiliaryOutput { raw: MATCHA.to_string(), language: Language::En });
        let result = orchestrator.run(&request).await;

        assert_eq!(result.produced_by, GenerationStage::EnhancedTranslate);
        assert_eq!(result.attempts.len(), 1);
        assert_eq!(result.draft.ingredients.len(), 1);
    }

    #[tokio::test]
    async fn incomplete_auxiliary_output_falls_back_to_template() {
        let orchestrator = GenerationOrchestrator::new(ScriptedClient::new(Vec::new()));
        let mut request = request(Language::En);
        request.auxiliary_output =
            Some(AuxiliaryOutput { raw: "just some words".to_string(), language: Language::Vi });
        let result = orchestrator.run(&request).await;

        assert_eq!(result.produced_by, GenerationStage::Template);
        assert_eq!(result.attempts[0].outcome, AttemptOutcome::Incomplete);
        assert!(result.draft.is_complete());
    }
}
