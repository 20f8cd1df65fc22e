//! The dispatcher: drives completions through sync rules to quiescence.
//!
//! Each call to [`Engine::invoke`] roots a flow. The driver keeps an
//! explicit LIFO work stack instead of recursing:
//!
//! ```text
//!   invoke(root)
//!       │
//!       ▼
//!   ┌────────────────────── work stack (LIFO) ──────────────────────┐
//!   │ Dispatch(c)  -> match every sync's `when` against c + history │
//!   │                 run `where`, push one Continue per frame      │
//!   │ Continue(p)  -> run the next `then` action of program p,      │
//!   │                 push Continue(p') then Dispatch(new) on top   │
//!   └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pushing the new completion's dispatch above the rest of its `then`
//! program makes every action's ripple effects settle before its next
//! sibling runs (depth-first). Limits on causal depth and flow size
//! guarantee termination.

mod catalog;
mod error;
mod flow;
mod settings;

pub use catalog::{Catalog, CatalogBuilder, CatalogError};
pub use error::{EngineError, Result};
pub use flow::{Cause, Completion, Firing, FlowTrace};
pub use settings::EngineSettings;

use crate::concept::Queries;
use crate::frames::{Frame, Frames};
use crate::sync::SyncRule;
use crate::types::{FlowId, MethodRef, Record};
use flow::FlowState;
use std::sync::Arc;
use tracing::Instrument;

/// A `then` clause in progress for one frame
struct Program {
    sync: usize,
    frame: Frame,
    step: usize,
    trigger: usize,
}

enum Work {
    /// Index into the flow's completions
    Dispatch(usize),
    Continue(Program),
}

/// The sync engine
///
/// Holds no per-request state: every flow's frames and history live only
/// for the duration of its `invoke` call, so one engine can serve
/// overlapping requests.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use concord_engine::{
///     actions, pattern, Catalog, Concept, ConceptError, Engine, EngineSettings, MethodRef,
///     Outcome, Record, SyncRule, Var,
/// };
/// use std::sync::Arc;
///
/// struct Bell;
///
/// #[async_trait]
/// impl Concept for Bell {
///     fn name(&self) -> &str { "Bell" }
///     fn actions(&self) -> &[&'static str] { &["press", "ring"] }
///     fn queries(&self) -> &[&'static str] { &[] }
///     async fn perform(&self, _action: &str, _input: Record) -> Result<Outcome, ConceptError> {
///         Ok(Outcome::empty())
///     }
///     async fn query(&self, query: &str, _input: Record) -> Result<Vec<Record>, ConceptError> {
///         Err(ConceptError::UnknownQuery { concept: "Bell".into(), query: query.into() })
///     }
/// }
///
/// const PRESS: MethodRef = MethodRef::of("Bell", "press");
/// const RING: MethodRef = MethodRef::of("Bell", "ring");
///
/// # tokio_test();
/// # fn tokio_test() {
/// # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// # rt.block_on(async {
/// let catalog = Catalog::builder()
///     .concept(Arc::new(Bell))
///     .sync(
///         SyncRule::new("PressRings")
///             .when(actions([(PRESS, pattern! {})]))
///             .then(actions([(RING, pattern! {})])),
///     )
///     .build()
///     .unwrap();
///
/// let engine = Engine::new(Arc::new(catalog), EngineSettings::default());
/// let trace = engine.invoke(&PRESS, Record::new()).await.unwrap();
/// assert_eq!(trace.methods(), ["Bell.press", "Bell.ring"]);
/// # });
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Engine {
    catalog: Arc<Catalog>,
    settings: EngineSettings,
}

impl Engine {
    pub fn new(catalog: Arc<Catalog>, settings: EngineSettings) -> Self {
        Self { catalog, settings }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Perform a root action and propagate its effects to quiescence
    ///
    /// Returns the trace of every completion in the flow. A defect (an
    /// exceeded limit, an unbound variable, a failing `where` stage) aborts
    /// the flow; effects already performed stay committed.
    pub async fn invoke(&self, method: &MethodRef, input: Record) -> Result<FlowTrace> {
        let flow = FlowId::new();
        let span = tracing::debug_span!("flow", %flow, root = %method);
        self.drive(flow, method, input).instrument(span).await
    }

    async fn drive(&self, flow: FlowId, method: &MethodRef, input: Record) -> Result<FlowTrace> {
        let mut state = FlowState::new(flow);
        let root = self.perform(&mut state, method, input, None, 0).await?;

        let mut stack = vec![Work::Dispatch(root)];
        while let Some(work) = stack.pop() {
            let step = match work {
                Work::Dispatch(index) => self.dispatch(&mut state, index, &mut stack).await,
                Work::Continue(program) => self.advance(&mut state, program, &mut stack).await,
            };
            if let Err(err) = step {
                let last = state.trace.completions.last();
                tracing::error!(
                    %flow,
                    error = %err,
                    last_method = ?last.map(|c| c.method.to_string()),
                    last_input = ?last.map(|c| &c.input),
                    "flow aborted"
                );
                return Err(err);
            }
        }

        tracing::debug!(
            completions = state.trace.completions.len(),
            firings = state.trace.firings.len(),
            "flow quiescent"
        );
        Ok(state.trace)
    }

    /// Run one action and record its completion
    async fn perform(
        &self,
        state: &mut FlowState,
        method: &MethodRef,
        input: Record,
        cause: Option<flow::Cause>,
        depth: usize,
    ) -> Result<usize> {
        if depth > self.settings.max_depth {
            return Err(EngineError::DepthExceeded {
                flow: state.flow(),
                limit: self.settings.max_depth,
                method: method.to_string(),
            });
        }
        if state.trace.completions.len() >= self.settings.max_steps {
            return Err(EngineError::StepLimitExceeded {
                flow: state.flow(),
                limit: self.settings.max_steps,
            });
        }

        let concept = self.catalog.concepts().action(method)?;
        let output = concept.perform(&method.method, input.clone()).await?;
        let completion = Completion {
            id: crate::types::ActionId::new(),
            flow: state.flow(),
            method: method.clone(),
            input,
            output,
            depth,
            cause,
            at: chrono::Utc::now(),
        };
        tracing::debug!(
            action = %completion.method,
            id = %completion.id,
            depth,
            output = %completion.output,
            "completed"
        );
        state.trace.completions.push(completion);
        Ok(state.trace.completions.len() - 1)
    }

    /// Evaluate every sync against a new completion
    async fn dispatch(
        &self,
        state: &mut FlowState,
        index: usize,
        stack: &mut Vec<Work>,
    ) -> Result<()> {
        let completion = state.trace.completions[index].clone();
        let mut programs = Vec::new();
        let mut handled = false;

        for (sync_index, rule) in self.catalog.syncs().iter().enumerate() {
            let frames: Frames = match_when(rule, &completion, &state.trace.completions)
                .into_iter()
                .filter(|frame| state.claim(sync_index, frame.matched()))
                .collect();
            if frames.is_empty() {
                continue;
            }
            handled = true;

            let frames = match rule.refine() {
                Some(refine) => {
                    let queries = Queries::new(self.catalog.concepts().clone(), state.flow());
                    refine(frames, queries)
                        .await
                        .map_err(|err| err.in_sync(rule.name()))?
                }
                None => frames,
            };

            tracing::debug!(
                sync = rule.name(),
                trigger = %completion.id,
                frames = frames.len(),
                "sync fired"
            );
            if self.settings.trace_frames {
                for frame in &frames {
                    tracing::trace!(sync = rule.name(), bindings = ?frame.to_record(), "frame");
                }
            }
            state.trace.firings.push(Firing {
                sync: rule.name().to_string(),
                trigger: completion.id,
                frames: frames.len(),
            });

            programs.extend(frames.into_iter().map(|frame| Program {
                sync: sync_index,
                frame,
                step: 0,
                trigger: index,
            }));
        }

        if completion.output.is_error() && !handled {
            tracing::warn!(
                action = %completion.method,
                id = %completion.id,
                output = %completion.output,
                "unhandled error outcome"
            );
            state.trace.unhandled_errors.push(completion.id);
        }

        stack.extend(programs.into_iter().rev().map(Work::Continue));
        Ok(())
    }

    /// Run the next `then` action of a program
    async fn advance(
        &self,
        state: &mut FlowState,
        mut program: Program,
        stack: &mut Vec<Work>,
    ) -> Result<()> {
        let rule = &self.catalog.syncs()[program.sync];
        let Some(triple) = rule.then_actions().get(program.step) else {
            return Ok(());
        };

        let trigger = &state.trace.completions[program.trigger];
        let cause = flow::Cause {
            sync: rule.name().to_string(),
            trigger: trigger.id,
        };
        let depth = trigger.depth + 1;

        let input = triple
            .input
            .substitute(&program.frame)
            .map_err(|err| err.in_sync(rule.name()))?;
        let index = self
            .perform(state, &triple.method, input, Some(cause), depth)
            .await
            .map_err(|err| err.in_sync(rule.name()))?;

        program.step += 1;
        let next = match &triple.output {
            Some(output) => {
                let produced = state.trace.completions[index].output.to_record();
                output.match_output(&produced, &program.frame)
            }
            None => Some(program.frame.clone()),
        };

        match next {
            Some(frame) if program.step < rule.then_actions().len() => {
                program.frame = frame;
                stack.push(Work::Continue(program));
            }
            Some(_) => {}
            None => tracing::debug!(
                sync = rule.name(),
                action = %triple.method,
                "then sequence stopped: output did not match"
            ),
        }
        stack.push(Work::Dispatch(index));
        Ok(())
    }
}

/// Build the frames of `rule`'s `when` clause that involve `completion`
///
/// Each triple that matches the new completion seeds a frame; the other
/// triples are then matched one at a time against the flow history,
/// discarding contradictory combinations.
fn match_when(rule: &SyncRule, completion: &Completion, history: &[Completion]) -> Frames {
    let when = rule.when_actions();
    let mut matched = Frames::new();

    for (seed_index, seed) in when.iter().enumerate() {
        let Some(frame) = seed.match_completion(completion, &Frame::new()) else {
            continue;
        };
        let mut frames = Frames::singleton(frame);

        for (other_index, other) in when.iter().enumerate() {
            if other_index == seed_index {
                continue;
            }
            let mut next = Frames::new();
            for frame in &frames {
                next.extend(
                    history
                        .iter()
                        .filter_map(|past| other.match_completion(past, frame)),
                );
            }
            frames = next;
            if frames.is_empty() {
                break;
            }
        }
        matched.extend(frames);
    }
    matched
}
