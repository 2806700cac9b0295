/// Progress events emitted while an engine call runs.
///
/// One `CutoffStart`/`CutoffFinish` pair per cutoff radius, with batched
/// `AtomsProcessed` increments in between. Increment batching keeps the
/// callback off the hot path when the per-atom loop runs in parallel.
#[derive(Debug, Clone)]
pub enum Progress {
    CutoffStart {
        index: usize,
        total: usize,
        radius: f32,
        atoms: u64,
    },
    AtomsProcessed {
        count: u64,
    },
    CutoffFinish,

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

/// Fan-out point for progress events. A reporter without a callback is a
/// no-op, so library callers that do not care about progress pay nothing.
#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}
