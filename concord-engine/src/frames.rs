//! Binding environments threaded through sync evaluation.
//!
//! A [`Frame`] is one candidate set of variable bindings; [`Frames`] is the
//! ordered collection of every candidate still alive. An empty [`Frames`]
//! is the universal "nothing to do" state: it is never an error, and every
//! later stage simply runs zero times.

use crate::concept::Queries;
use crate::pattern::Pattern;
use crate::runtime::EngineError;
use crate::types::{ActionId, MethodRef, Record, Value, Var};
use std::collections::HashMap;

/// A single variable-binding environment
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    bindings: HashMap<Var, Value>,
    /// Completion events matched while building this frame
    matched: Vec<ActionId>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, var: &Var) -> Option<&Value> {
        self.bindings.get(var)
    }

    pub fn is_bound(&self, var: &Var) -> bool {
        self.bindings.contains_key(var)
    }

    /// Bind `var` to `value`
    ///
    /// Returns false (leaving the frame untouched) if `var` is already bound
    /// to a different value.
    pub fn bind(&mut self, var: Var, value: Value) -> bool {
        match self.bindings.get(&var) {
            Some(existing) => *existing == value,
            None => {
                self.bindings.insert(var, value);
                true
            }
        }
    }

    /// Consuming form of [`Frame::bind`]
    pub fn with(mut self, var: Var, value: Value) -> Option<Self> {
        if self.bind(var, value) {
            Some(self)
        } else {
            None
        }
    }

    pub fn bound_vars(&self) -> impl Iterator<Item = &Var> {
        self.bindings.keys()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn matched(&self) -> &[ActionId] {
        &self.matched
    }

    pub(crate) fn record_match(&mut self, id: ActionId) {
        self.matched.push(id);
    }

    /// Bindings keyed by variable name, for logs and diagnostics
    pub fn to_record(&self) -> Record {
        let mut entries: Vec<_> = self.bindings.iter().collect();
        entries.sort_by_key(|(var, _)| var.id());
        entries
            .into_iter()
            .map(|(var, value)| (var.name().to_string(), value.clone()))
            .collect()
    }

    fn without(&self, vars: &[Var]) -> Frame {
        let bindings = self
            .bindings
            .iter()
            .filter(|(var, _)| !vars.contains(var))
            .map(|(var, value)| (var.clone(), value.clone()))
            .collect();
        Frame {
            bindings,
            matched: self.matched.clone(),
        }
    }
}

/// The set of candidate frames surviving so far
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frames {
    frames: Vec<Frame>,
}

impl Frames {
    /// No candidates
    pub fn new() -> Self {
        Self::default()
    }

    pub fn singleton(frame: Frame) -> Self {
        Self {
            frames: vec![frame],
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    /// Run a query once per frame and unify each result row
    ///
    /// Every parent frame contributes one descendant per result row that
    /// unifies with `output`; a parent with no such row disappears. The
    /// result is the concatenation of all descendants in parent order.
    pub async fn query(
        self,
        queries: &Queries,
        method: &MethodRef,
        input: &Pattern,
        output: &Pattern,
    ) -> Result<Frames, EngineError> {
        let mut next = Vec::new();
        for frame in self.frames {
            let args = input.substitute(&frame)?;
            let rows = queries.query(method, args).await?;
            next.extend(rows.iter().filter_map(|row| output.match_record(row, &frame)));
        }
        tracing::trace!(query = %method, frames = next.len(), "refined frames");
        Ok(Frames { frames: next })
    }

    /// Keep only frames satisfying the predicate
    pub fn filter<F>(self, predicate: F) -> Frames
    where
        F: Fn(&Frame) -> bool,
    {
        Frames {
            frames: self.frames.into_iter().filter(|f| predicate(f)).collect(),
        }
    }

    /// Derive a new binding from each frame
    ///
    /// Frames for which `derive` returns `None`, or whose existing binding
    /// of `var` disagrees, are dropped.
    pub fn map_bind<F>(self, var: &Var, derive: F) -> Frames
    where
        F: Fn(&Frame) -> Option<Value>,
    {
        Frames {
            frames: self
                .frames
                .into_iter()
                .filter_map(|frame| {
                    let value = derive(&frame)?;
                    frame.with(var.clone(), value)
                })
                .collect(),
        }
    }

    /// Bind the same value in every frame
    pub fn bind_all(self, var: &Var, value: Value) -> Frames {
        self.map_bind(var, |_| Some(value.clone()))
    }

    /// Fold frames that differ only in `vars` into one frame each
    ///
    /// Frames are grouped by their remaining bindings (in order of first
    /// appearance). Each group yields one frame with `result` bound to the
    /// array of collected tuples, each tuple an object keyed by variable
    /// name. Collecting zero frames yields zero frames; sync rules that must
    /// answer with an empty array check for that before collecting.
    pub fn collect_as(self, vars: &[Var], result: &Var) -> Frames {
        let mut groups: Vec<(Frame, Vec<Value>)> = Vec::new();
        for frame in self.frames {
            let base = frame.without(vars);
            let tuple: Record = vars
                .iter()
                .filter_map(|var| {
                    frame
                        .get(var)
                        .map(|value| (var.name().to_string(), value.clone()))
                })
                .collect();
            match groups.iter_mut().find(|(existing, _)| existing.bindings == base.bindings) {
                Some((_, items)) => items.push(Value::Object(tuple)),
                None => groups.push((base, vec![Value::Object(tuple)])),
            }
        }
        Frames {
            frames: groups
                .into_iter()
                .filter_map(|(base, items)| base.with(result.clone(), Value::Array(items)))
                .collect(),
        }
    }
}

impl IntoIterator for Frames {
    type Item = Frame;
    type IntoIter = std::vec::IntoIter<Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.into_iter()
    }
}

impl<'a> IntoIterator for &'a Frames {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

impl FromIterator<Frame> for Frames {
    fn from_iter<I: IntoIterator<Item = Frame>>(iter: I) -> Self {
        Self {
            frames: iter.into_iter().collect(),
        }
    }
}

impl Extend<Frame> for Frames {
    fn extend<I: IntoIterator<Item = Frame>>(&mut self, iter: I) {
        self.frames.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_conflicting_bind_is_rejected() {
        let x = Var::new("x");
        let mut frame = Frame::new();
        assert!(frame.bind(x.clone(), json!(1)));
        assert!(frame.bind(x.clone(), json!(1)));
        assert!(!frame.bind(x.clone(), json!(2)));
        assert_eq!(frame.get(&x), Some(&json!(1)));
    }

    #[test]
    fn test_filter_drops_silently() {
        let n = Var::new("n");
        let frames: Frames = (1..=4)
            .filter_map(|i| Frame::new().with(n.clone(), json!(i)))
            .collect();
        let even = frames.filter(|f| f.get(&n).and_then(|v| v.as_i64()).unwrap_or(0) % 2 == 0);
        assert_eq!(even.len(), 2);
    }

    #[test]
    fn test_collect_as_groups_by_remaining_bindings() {
        let [request, place] = Var::many(["request", "place"]);
        let results = Var::new("results");

        let frames: Frames = [("r1", "paris"), ("r1", "oslo"), ("r2", "lima")]
            .into_iter()
            .filter_map(|(r, p)| {
                Frame::new()
                    .with(request.clone(), json!(r))?
                    .with(place.clone(), json!(p))
            })
            .collect();

        let collected = frames.collect_as(&[place.clone()], &results);
        assert_eq!(collected.len(), 2);

        let first = collected.iter().next().expect("first group");
        assert_eq!(first.get(&request), Some(&json!("r1")));
        assert_eq!(
            first.get(&results),
            Some(&json!([{ "place": "paris" }, { "place": "oslo" }]))
        );
        assert!(!first.is_bound(&place));
    }

    #[test]
    fn test_collect_as_on_empty_frames_is_empty() {
        let place = Var::new("place");
        let results = Var::new("results");
        assert!(Frames::new().collect_as(&[place], &results).is_empty());
    }

    #[test]
    fn test_bind_all_and_map_bind() {
        let [a, b] = Var::many(["a", "b"]);
        let frames = Frames::singleton(Frame::new().with(a.clone(), json!(2)).unwrap());

        let doubled = frames
            .clone()
            .map_bind(&b, |f| f.get(&a).and_then(|v| v.as_i64()).map(|n| json!(n * 2)));
        assert_eq!(doubled.iter().next().and_then(|f| f.get(&b)), Some(&json!(4)));

        assert_eq!(frames.clone().bind_all(&a, json!(2)).len(), 1);
        assert!(frames.bind_all(&a, json!(3)).is_empty());
    }

    #[test]
    fn test_to_record_uses_names() {
        let user = Var::new("user");
        let frame = Frame::new().with(user, json!("u1")).unwrap();
        assert_eq!(Value::Object(frame.to_record()), json!({ "user": "u1" }));
    }
}
