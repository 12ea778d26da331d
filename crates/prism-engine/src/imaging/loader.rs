use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};
use std::thread;

use anyhow::{Context as _, Result};

use super::ImageSource;

/// Pending decode of one image.
///
/// Futures are polled cooperatively from the render thread; they need not be `Send`.
pub type ImageFuture = Pin<Box<dyn Future<Output = Result<ImageSource>>>>;

/// Asynchronous image loading capability injected into stages.
pub trait ImageLoader {
    /// Starts loading `url`. Must not block; errors surface through the future.
    fn load(&self, url: &str) -> ImageFuture;
}

/// Wraps an already available result as an [`ImageFuture`].
pub fn ready(result: Result<ImageSource>) -> ImageFuture {
    Box::pin(std::future::ready(result))
}

/// Polls `future` once without registering for wake-ups.
pub(crate) fn poll_once(future: &mut ImageFuture) -> Poll<Result<ImageSource>> {
    let mut cx = Context::from_waker(Waker::noop());
    future.as_mut().poll(&mut cx)
}

/// Loads images from the local filesystem.
///
/// Accepts plain paths and `file://` URLs. Relative paths resolve against
/// `root` when one is set. The first poll hands decoding to a worker thread
/// and returns `Pending`; the caller's thread never decodes.
#[derive(Debug, Clone, Default)]
pub struct FileImageLoader {
    root: Option<PathBuf>,
}

impl FileImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, url: &str) -> Result<PathBuf> {
        let raw = match url.split_once("://") {
            None => url,
            Some(("file", rest)) => rest,
            Some((scheme, _)) => anyhow::bail!("unsupported image url scheme `{scheme}` in `{url}`"),
        };
        anyhow::ensure!(!raw.is_empty(), "empty image path");

        let path = Path::new(raw);
        Ok(match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        })
    }
}

impl ImageLoader for FileImageLoader {
    fn load(&self, url: &str) -> ImageFuture {
        match self.resolve(url) {
            Ok(path) => Box::pin(DecodeFuture(Decode::Idle(path))),
            Err(err) => ready(Err(err)),
        }
    }
}

fn decode(path: &Path) -> Result<ImageSource> {
    let decoded =
        image::open(path).with_context(|| format!("failed to decode image {}", path.display()))?;
    log::debug!(
        "decoded {} ({}x{})",
        path.display(),
        decoded.width(),
        decoded.height()
    );
    Ok(ImageSource::from(decoded.to_rgba8()))
}

// ── worker decode ─────────────────────────────────────────────────────────

/// Shared between a decode worker and the future waiting on it.
#[derive(Default)]
struct DecodeState {
    result: Mutex<Option<Result<ImageSource>>>,
    waker: Mutex<Option<Waker>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

enum Decode {
    /// Not polled yet.
    Idle(PathBuf),
    Running(Arc<DecodeState>),
    Finished,
}

struct DecodeFuture(Decode);

impl DecodeFuture {
    fn start(path: PathBuf, waker: &Waker) -> Result<Arc<DecodeState>> {
        let state = Arc::new(DecodeState::default());
        *lock(&state.waker) = Some(waker.clone());

        let worker = Arc::clone(&state);
        thread::Builder::new()
            .name("prism-image-decode".into())
            .spawn(move || {
                let result = decode(&path);
                *lock(&worker.result) = Some(result);
                if let Some(waker) = lock(&worker.waker).take() {
                    waker.wake();
                }
            })
            .context("failed to spawn image decode worker")?;
        Ok(state)
    }
}

impl Future for DecodeFuture {
    type Output = Result<ImageSource>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match std::mem::replace(&mut self.0, Decode::Finished) {
            Decode::Idle(path) => match Self::start(path, cx.waker()) {
                Ok(state) => {
                    self.0 = Decode::Running(state);
                    Poll::Pending
                }
                Err(err) => Poll::Ready(Err(err)),
            },
            Decode::Running(state) => {
                if let Some(result) = lock(&state.result).take() {
                    return Poll::Ready(result);
                }
                *lock(&state.waker) = Some(cx.waker().clone());
                // the worker may have finished between the check and the registration
                if let Some(result) = lock(&state.result).take() {
                    return Poll::Ready(result);
                }
                self.0 = Decode::Running(state);
                Poll::Pending
            }
            Decode::Finished => Poll::Ready(Err(anyhow::anyhow!("image decode polled after completion"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_on(fut: ImageFuture) -> Result<ImageSource> {
        pollster::block_on(fut)
    }

    #[test]
    fn resolves_file_urls_and_relative_paths() {
        let loader = FileImageLoader::with_root("/assets");
        assert_eq!(loader.resolve("file:///tmp/a.png").unwrap(), PathBuf::from("/tmp/a.png"));
        assert_eq!(loader.resolve("lut.png").unwrap(), PathBuf::from("/assets/lut.png"));
        assert_eq!(loader.resolve("/abs/b.png").unwrap(), PathBuf::from("/abs/b.png"));
    }

    #[test]
    fn first_poll_leaves_decoding_to_a_worker() {
        let mut fut = FileImageLoader::new().load("/definitely/not/here.png");
        assert!(poll_once(&mut fut).is_pending());
        assert!(block_on(fut).is_err());
    }

    #[test]
    fn unsupported_scheme_fails_without_a_worker() {
        let mut fut = FileImageLoader::new().load("ftp://host/a.png");
        assert!(matches!(poll_once(&mut fut), Poll::Ready(Err(_))));
    }

    #[test]
    fn rejects_network_urls() {
        let err = block_on(FileImageLoader::new().load("https://example.com/a.png")).unwrap_err();
        assert!(err.to_string().contains("https"));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(block_on(FileImageLoader::new().load("/definitely/not/here.png")).is_err());
    }

    #[test]
    fn decodes_png_from_disk() {
        let dir = std::env::temp_dir().join(format!("prism-loader-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("px.png");
        image::RgbaImage::from_pixel(2, 3, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let img = block_on(FileImageLoader::with_root(&dir).load("px.png")).unwrap();
        assert_eq!((img.width(), img.height()), (2, 3));
        assert_eq!(&img.pixels()[..4], &[10, 20, 30, 255]);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn ready_future_yields_immediately() {
        let img = ImageSource::solid(1, 1, [0, 0, 0, 255]).unwrap();
        assert_eq!(block_on(ready(Ok(img.clone()))).unwrap(), img);
    }
}
