//! Pull-based record streams used by expression evaluation.
//!
//! Every stream is a boxed iterator of `Result<LogRecord, FilterError>`.
//! Consumers pull; each pull may pull upstream. Cancellation is observed on
//! every pull and, for the buffering operators, on every buffered item.

use super::error::FilterError;
use super::expression::FilterExpression;
use crate::record::{LogRecord, RecordKey};
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub type RecordStream<'a> = Box<dyn Iterator<Item = Result<LogRecord, FilterError>> + 'a>;

/// Wrap an infallible record source as a stream
pub fn from_records<'a, I>(records: I) -> RecordStream<'a>
where
    I: IntoIterator<Item = LogRecord>,
    I::IntoIter: 'a,
{
    Box::new(records.into_iter().map(Ok))
}

/// Yields a single `Cancelled` error once the token fires, then ends
pub fn cancellable<'a>(inner: RecordStream<'a>, cancel: &CancellationToken) -> RecordStream<'a> {
    Box::new(Cancellable {
        inner,
        cancel: cancel.clone(),
        done: false,
    })
}

/// Ends the stream right after the first error item
pub fn abort_on_error(inner: RecordStream<'_>) -> RecordStream<'_> {
    Box::new(AbortOnError { inner, done: false })
}

struct Cancellable<'a> {
    inner: RecordStream<'a>,
    cancel: CancellationToken,
    done: bool,
}

impl Iterator for Cancellable<'_> {
    type Item = Result<LogRecord, FilterError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.cancel.is_cancelled() {
            self.done = true;
            return Some(Err(FilterError::Cancelled));
        }
        self.inner.next()
    }
}

struct AbortOnError<'a> {
    inner: RecordStream<'a>,
    done: bool,
}

impl Iterator for AbortOnError<'_> {
    type Item = Result<LogRecord, FilterError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.inner.next();
        if matches!(item, None | Some(Err(_))) {
            self.done = true;
        }
        item
    }
}

/// Drain a source into memory, checking for cancellation per item
fn buffer_source(
    source: RecordStream<'_>,
    cancel: &CancellationToken,
) -> Result<Vec<LogRecord>, FilterError> {
    let mut buffer = Vec::new();
    for item in source {
        if cancel.is_cancelled() {
            return Err(FilterError::Cancelled);
        }
        buffer.push(item?);
    }
    Ok(buffer)
}

fn replay(buffer: Arc<Vec<LogRecord>>) -> RecordStream<'static> {
    Box::new((0..buffer.len()).map(move |idx| Ok(buffer[idx].clone())))
}

/// OR evaluation: every child runs against the same buffered source; output
/// is children in configured order, first occurrence of a record wins.
pub(crate) struct UnionStream<'a> {
    children: Vec<FilterExpression>,
    source: Option<RecordStream<'a>>,
    buffer: Option<Arc<Vec<LogRecord>>>,
    current: Option<RecordStream<'static>>,
    next_child: usize,
    seen: HashSet<RecordKey>,
    cancel: CancellationToken,
    finished: bool,
}

impl<'a> UnionStream<'a> {
    pub(crate) fn new(
        children: Vec<FilterExpression>,
        source: RecordStream<'a>,
        cancel: &CancellationToken,
    ) -> Self {
        Self {
            children,
            source: Some(source),
            buffer: None,
            current: None,
            next_child: 0,
            seen: HashSet::new(),
            cancel: cancel.clone(),
            finished: false,
        }
    }

    fn fail(&mut self, err: FilterError) -> Option<Result<LogRecord, FilterError>> {
        self.finished = true;
        self.current = None;
        Some(Err(err))
    }
}

impl Iterator for UnionStream<'_> {
    type Item = Result<LogRecord, FilterError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.finished {
                return None;
            }
            if self.cancel.is_cancelled() {
                return self.fail(FilterError::Cancelled);
            }

            if self.buffer.is_none() {
                let source = self.source.take()?;
                match buffer_source(source, &self.cancel) {
                    Ok(records) => self.buffer = Some(Arc::new(records)),
                    Err(err) => return self.fail(err),
                }
            }

            if let Some(stream) = self.current.as_mut() {
                match stream.next() {
                    Some(Ok(record)) => {
                        if self.seen.insert(record.key()) {
                            return Some(Ok(record));
                        }
                        continue;
                    }
                    Some(Err(err)) => return self.fail(err),
                    None => self.current = None,
                }
            }

            let Some(child) = self.children.get(self.next_child) else {
                self.finished = true;
                return None;
            };
            self.next_child += 1;
            let buffer = self.buffer.clone().unwrap_or_default();
            self.current = Some(child.evaluate(replay(buffer), &self.cancel));
        }
    }
}

/// NOT evaluation: buffers the whole source, materializes the set of records
/// the child matches, then re-streams the source skipping that set.
///
/// Memory grows with the full input size; this is inherent to taking a
/// complement over a single-pass source.
pub(crate) struct ComplementStream<'a> {
    child: FilterExpression,
    source: Option<RecordStream<'a>>,
    remaining: Option<std::vec::IntoIter<LogRecord>>,
    excluded: HashSet<RecordKey>,
    cancel: CancellationToken,
    finished: bool,
}

impl<'a> ComplementStream<'a> {
    pub(crate) fn new(
        child: FilterExpression,
        source: RecordStream<'a>,
        cancel: &CancellationToken,
    ) -> Self {
        Self {
            child,
            source: Some(source),
            remaining: None,
            excluded: HashSet::new(),
            cancel: cancel.clone(),
            finished: false,
        }
    }

    fn materialize(&mut self, source: RecordStream<'_>) -> Result<Vec<LogRecord>, FilterError> {
        let buffer = Arc::new(buffer_source(source, &self.cancel)?);
        for item in self.child.evaluate(replay(Arc::clone(&buffer)), &self.cancel) {
            self.excluded.insert(item?.key());
        }
        Ok(Arc::try_unwrap(buffer).unwrap_or_else(|shared| shared.as_ref().clone()))
    }
}

impl Iterator for ComplementStream<'_> {
    type Item = Result<LogRecord, FilterError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if self.remaining.is_none() {
            let source = self.source.take()?;
            match self.materialize(source) {
                Ok(records) => self.remaining = Some(records.into_iter()),
                Err(err) => {
                    self.finished = true;
                    return Some(Err(err));
                }
            }
        }

        let remaining = self.remaining.as_mut()?;
        loop {
            if self.cancel.is_cancelled() {
                self.finished = true;
                return Some(Err(FilterError::Cancelled));
            }
            match remaining.next() {
                Some(record) if self.excluded.contains(&record.key()) => continue,
                Some(record) => return Some(Ok(record)),
                None => {
                    self.finished = true;
                    return None;
                }
            }
        }
    }
}
