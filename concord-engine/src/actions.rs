//! The `actions(...)` builder used by `when` and `then` clauses.

use crate::frames::Frame;
use crate::pattern::Pattern;
use crate::runtime::Completion;
use crate::types::MethodRef;

/// One `(method, input pattern, output pattern)` triple
#[derive(Debug, Clone, PartialEq)]
pub struct ActionPattern {
    pub method: MethodRef,
    pub input: Pattern,
    /// In `when`, a missing output pattern behaves like `{}`. In `then`,
    /// it means the result is not captured.
    pub output: Option<Pattern>,
}

impl ActionPattern {
    pub fn new(method: MethodRef, input: Pattern) -> Self {
        Self {
            method,
            input,
            output: None,
        }
    }

    pub fn output(mut self, output: Pattern) -> Self {
        self.output = Some(output);
        self
    }

    /// Match a completed invocation, extending `frame`
    pub fn match_completion(&self, completion: &Completion, frame: &Frame) -> Option<Frame> {
        if completion.method != self.method {
            return None;
        }
        let frame = self.input.match_record(&completion.input, frame)?;
        let output = completion.output.to_record();
        let mut frame = match &self.output {
            Some(pattern) => pattern.match_output(&output, &frame)?,
            None => Pattern::new().match_output(&output, &frame)?,
        };
        frame.record_match(completion.id);
        Some(frame)
    }
}

impl From<(MethodRef, Pattern)> for ActionPattern {
    fn from((method, input): (MethodRef, Pattern)) -> Self {
        ActionPattern::new(method, input)
    }
}

impl From<(MethodRef, Pattern, Pattern)> for ActionPattern {
    fn from((method, input, output): (MethodRef, Pattern, Pattern)) -> Self {
        ActionPattern::new(method, input).output(output)
    }
}

/// An ordered list of action patterns; pure data describing intent
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Actions(Vec<ActionPattern>);

impl Actions {
    pub fn iter(&self) -> std::slice::Iter<'_, ActionPattern> {
        self.0.iter()
    }

    pub fn get(&self, index: usize) -> Option<&ActionPattern> {
        self.0.get(index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Actions {
    type Item = &'a ActionPattern;
    type IntoIter = std::slice::Iter<'a, ActionPattern>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Declare a list of action patterns
///
/// ```
/// use concord_engine::{actions, pattern, MethodRef, Var};
///
/// const AUTHENTICATE: MethodRef = MethodRef::of("UserAuthentication", "authenticate");
///
/// let [username, error] = Var::many(["username", "error"]);
/// let when = actions([(
///     AUTHENTICATE,
///     pattern! { "username" => &username },
///     pattern! { "error" => &error },
/// )]);
/// assert_eq!(when.len(), 1);
/// ```
pub fn actions<I, A>(items: I) -> Actions
where
    I: IntoIterator<Item = A>,
    A: Into<ActionPattern>,
{
    Actions(items.into_iter().map(Into::into).collect())
}
