//! Check logs and path tracking during recursive validation.
//!
//! A [`Context`] is passed explicitly through every `test` and `read` call. It
//! assigns ids to the [`Check`]s types write and remembers the path under which
//! each one was written. Two implementations exist:
//!
//! - [`ReportContext`] keeps every check and can render a report.
//! - [`NoopContext`] discards everything. It is the fast path for callers that
//!   only want a yes/no answer and gives up all observability in exchange.

use std::collections::{HashSet, VecDeque};
use std::fmt::{self, Display};

use stillwater::prelude::*;

use crate::check::Check;
use crate::error::ReportError;
use crate::path::{CheckPath, PathSegment};

/// The address of a check inside the context that wrote it.
///
/// Ids are only meaningful relative to their originating context. The
/// [`NoopContext`] hands out [`CheckId::DISCARDED`], which never collides with
/// an id of a real log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CheckId(Option<usize>);

impl CheckId {
    /// The id of a check that was not recorded.
    pub const DISCARDED: CheckId = CheckId(None);

    /// Returns the log index, or `None` for a discarded check.
    pub fn index(self) -> Option<usize> {
        self.0
    }

    /// Returns true if the check behind this id was discarded.
    pub fn is_discarded(self) -> bool {
        self.0.is_none()
    }
}

impl Display for CheckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(index) => write!(f, "#{}", index),
            None => f.write_str("#discarded"),
        }
    }
}

/// Result of a fallible validation step.
pub type CheckResult<T> = Result<T, CheckId>;

/// A sink for checks plus the path stack of the current descent.
pub trait Context {
    /// Records a check under the current path and returns its id.
    fn write(&mut self, check: Check) -> CheckId;

    /// Pushes a path segment. Prefer [`enter`](trait.Context.html#method.enter).
    fn push_path(&mut self, segment: PathSegment);

    /// Pops the last path segment.
    fn pop_path(&mut self);

    /// Renders the report rooted at `id`, if this context keeps one.
    fn report(&self, _id: CheckId) -> Option<String> {
        None
    }

    /// Builds the error returned to callers who want a single failure value.
    fn fail(&self, id: CheckId) -> ReportError {
        ReportError::new(self.report(id))
    }
}

/// Pops the path segment on every exit, unwinding included.
struct PathGuard<'a, 'b> {
    cx: &'a mut (dyn Context + 'b),
}

impl Drop for PathGuard<'_, '_> {
    fn drop(&mut self) {
        self.cx.pop_path();
    }
}

impl dyn Context + '_ {
    /// Runs `f` with `key` appended to the current path.
    ///
    /// # Example
    ///
    /// ```rust
    /// use kryo::{Check, Context, ReportContext};
    ///
    /// let mut cx = ReportContext::new();
    /// let cx: &mut dyn Context = &mut cx;
    /// let id = cx.enter("outer", |cx| {
    ///     cx.enter("inner", |cx| cx.write(Check::Custom { message: "bad".into() }))
    /// });
    /// assert_eq!(cx.report(id).unwrap(), "outer.inner#0: bad");
    /// ```
    pub fn enter<R>(
        &mut self,
        key: impl Into<PathSegment>,
        f: impl FnOnce(&mut dyn Context) -> R,
    ) -> R {
        self.push_path(key.into());
        let mut guard = PathGuard { cx: self };
        f(&mut *guard.cx)
    }

    /// Folds sibling failures into one `Aggregate` check.
    ///
    /// Returns `Ok(())` when there is nothing to report.
    pub fn aggregate(&mut self, failures: Vec<CheckId>) -> CheckResult<()> {
        match NonEmptyVec::from_vec(failures) {
            None => Ok(()),
            Some(children) => Err(self.write(Check::Aggregate {
                children: children.into_vec(),
            })),
        }
    }

    /// Like [`aggregate`](#method.aggregate), but a single failure is
    /// returned as is.
    pub fn combine(&mut self, mut failures: Vec<CheckId>) -> CheckResult<()> {
        match failures.len() {
            0 => Ok(()),
            1 => Err(failures.remove(0)),
            _ => self.aggregate(failures),
        }
    }
}

/// A context that keeps every check and renders reports.
///
/// # Example
///
/// ```rust
/// use kryo::{Check, Context, ReportContext};
///
/// let mut cx = ReportContext::new();
/// let id = cx.write(Check::Custom { message: "boom".into() });
/// assert_eq!(cx.report(id).unwrap(), "#0: boom");
/// ```
#[derive(Debug, Default)]
pub struct ReportContext {
    log: Vec<(CheckPath, Check)>,
    path: CheckPath,
}

impl ReportContext {
    /// Creates an empty context at the root path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the check behind `id`.
    pub fn get(&self, id: CheckId) -> Option<&Check> {
        id.index().and_then(|i| self.log.get(i)).map(|(_, check)| check)
    }

    /// Returns the path `id` was written under.
    pub fn path_of(&self, id: CheckId) -> Option<&CheckPath> {
        id.index().and_then(|i| self.log.get(i)).map(|(path, _)| path)
    }

    /// Returns the number of recorded checks.
    pub fn len(&self) -> usize {
        self.log.len()
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// Returns the current path.
    pub fn current_path(&self) -> &CheckPath {
        &self.path
    }

    /// Returns every check reachable from `id`, `id` first, each once.
    pub fn causes(&self, id: CheckId) -> Vec<CheckId> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut worklist = VecDeque::from([id]);
        while let Some(next) = worklist.pop_front() {
            let Some(check) = self.get(next) else {
                continue;
            };
            if !seen.insert(next) {
                continue;
            }
            order.push(next);
            worklist.extend(check.children());
        }
        order
    }
}

impl Context for ReportContext {
    fn write(&mut self, check: Check) -> CheckId {
        let id = CheckId(Some(self.log.len()));
        self.log.push((self.path.clone(), check));
        id
    }

    fn push_path(&mut self, segment: PathSegment) {
        self.path.push(segment);
    }

    fn pop_path(&mut self) {
        self.path.pop();
    }

    fn report(&self, id: CheckId) -> Option<String> {
        let lines: Vec<String> = self
            .causes(id)
            .into_iter()
            .filter_map(|cause| {
                let (path, check) = self.log.get(cause.index()?)?;
                Some(format!("{}{}: {}", path, cause, check))
            })
            .collect();
        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }
}

/// A context that records nothing.
///
/// Every write returns [`CheckId::DISCARDED`] and paths are not tracked.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopContext;

impl Context for NoopContext {
    fn write(&mut self, _check: Check) -> CheckId {
        CheckId::DISCARDED
    }

    fn push_path(&mut self, _segment: PathSegment) {}

    fn pop_path(&mut self) {}
}
