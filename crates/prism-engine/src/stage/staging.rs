use std::task::Poll;

use anyhow::Result;

use crate::device::{GraphicsDevice, TextureHandle};
use crate::imaging::{self, ImageFuture, ImageSource};

/// One image load belonging to a batch.
pub(crate) struct PendingLoad {
    name: String,
    revision: u64,
    future: Option<ImageFuture>,
    outcome: Option<Result<ImageSource>>,
}

impl PendingLoad {
    pub(crate) fn new(name: String, revision: u64, future: ImageFuture) -> Self {
        Self {
            name,
            revision,
            future: Some(future),
            outcome: None,
        }
    }
}

/// Result of one load, tagged with the uniform revision it was started for.
pub(crate) struct LoadOutcome {
    pub name: String,
    pub revision: u64,
    pub result: Result<ImageSource>,
}

/// Group of loads that complete together.
pub(crate) struct LoadBatch {
    loads: Vec<PendingLoad>,
}

impl LoadBatch {
    pub(crate) fn new(loads: Vec<PendingLoad>) -> Self {
        Self { loads }
    }

    /// Polls unfinished loads once. Returns true when every load has finished.
    fn poll(&mut self) -> bool {
        let mut done = true;
        for load in &mut self.loads {
            let Some(future) = load.future.as_mut() else { continue };
            match imaging::poll_once(future) {
                Poll::Ready(result) => {
                    load.outcome = Some(result);
                    load.future = None;
                }
                Poll::Pending => done = false,
            }
        }
        done
    }

    fn into_outcomes(self) -> Vec<LoadOutcome> {
        self.loads
            .into_iter()
            .filter_map(|load| {
                let result = load.outcome?;
                Some(LoadOutcome {
                    name: load.name,
                    revision: load.revision,
                    result,
                })
            })
            .collect()
    }
}

/// Decoded image waiting for upload on the next flush.
pub(crate) struct StagedTexture {
    pub name: String,
    pub revision: u64,
    pub source: ImageSource,
}

/// Texture work deferred to the next flush, plus the in-flight load batch.
#[derive(Default)]
pub(crate) struct StagingQueue {
    to_release: Vec<TextureHandle>,
    to_create: Vec<StagedTexture>,
    batch: Option<LoadBatch>,
}

impl StagingQueue {
    pub(crate) fn release(&mut self, texture: TextureHandle) {
        if !self.to_release.contains(&texture) {
            self.to_release.push(texture);
        }
    }

    /// Drops a queued release; used when a handle is handed back in.
    pub(crate) fn cancel_release(&mut self, texture: TextureHandle) {
        self.to_release.retain(|t| *t != texture);
    }

    pub(crate) fn create(&mut self, staged: StagedTexture) {
        self.to_create.push(staged);
    }

    pub(crate) fn take_creates(&mut self) -> Vec<StagedTexture> {
        std::mem::take(&mut self.to_create)
    }

    #[cfg(test)]
    pub(crate) fn pending_releases(&self) -> &[TextureHandle] {
        &self.to_release
    }

    /// Destroys every queued texture. Returns how many were destroyed.
    pub(crate) fn release_all(&mut self, device: &mut dyn GraphicsDevice) -> usize {
        let count = self.to_release.len();
        for texture in self.to_release.drain(..) {
            device.destroy_texture(texture);
        }
        count
    }

    #[inline]
    pub(crate) fn has_batch(&self) -> bool {
        self.batch.is_some()
    }

    pub(crate) fn start_batch(&mut self, batch: LoadBatch) {
        debug_assert!(self.batch.is_none(), "only one load batch may be in flight");
        self.batch = Some(batch);
    }

    /// Polls the in-flight batch. Yields its outcomes once every load finished.
    pub(crate) fn poll_batch(&mut self) -> Option<Vec<LoadOutcome>> {
        if !self.batch.as_mut()?.poll() {
            return None;
        }
        self.batch.take().map(LoadBatch::into_outcomes)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::future::Future;
    use std::pin::Pin;
    use std::rc::Rc;
    use std::task::Context;

    use super::*;

    /// Pending until the shared flag flips.
    struct Gate(Rc<Cell<bool>>);

    impl Future for Gate {
        type Output = Result<ImageSource>;

        fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
            if self.0.get() {
                Poll::Ready(ImageSource::solid(1, 1, [255; 4]))
            } else {
                Poll::Pending
            }
        }
    }

    #[test]
    fn releases_are_deduplicated() {
        let mut q = StagingQueue::default();
        let t = TextureHandle::from_raw(4);
        q.release(t);
        q.release(t);
        assert_eq!(q.pending_releases(), &[t]);
        q.cancel_release(t);
        assert!(q.pending_releases().is_empty());
    }

    #[test]
    fn batch_completes_only_when_every_load_finished() {
        let open = Rc::new(Cell::new(false));
        let mut q = StagingQueue::default();
        q.start_batch(LoadBatch::new(vec![
            PendingLoad::new("a".into(), 1, Box::pin(Gate(Rc::clone(&open)))),
            PendingLoad::new("b".into(), 1, imaging::ready(ImageSource::solid(1, 1, [0; 4]))),
        ]));

        assert!(q.poll_batch().is_none());
        assert!(q.has_batch());

        open.set(true);
        let outcomes = q.poll_batch().unwrap();
        assert!(!q.has_batch());
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.result.is_ok()));
    }

    #[test]
    fn polling_without_batch_yields_nothing() {
        assert!(StagingQueue::default().poll_batch().is_none());
    }
}
