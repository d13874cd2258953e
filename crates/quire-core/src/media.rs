//! Media loading contract.
//!
//! The converter never waits on media. When it meets an `img`, `video` or
//! `audio` tag it inserts a placeholder span and hands a [`MediaRequest`] to
//! the host's [`MediaLoader`]. The loader reports back through
//! [`MediaCallbacks`] whenever it likes; swapping the placeholder's visual is
//! the host's business.

use smol_str::SmolStr;

use crate::span::{MediaKind, SpanId};

/// A load the converter asks the host to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRequest {
    pub kind: MediaKind,
    pub source: SmolStr,
    /// Placeholder span the result belongs to.
    pub span: SpanId,
    pub max_width: u32,
    pub min_width: Option<u32>,
}

/// Decoded media handed back by a loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedMedia {
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

/// Progress notifications for one request.
pub trait MediaCallbacks {
    fn on_loading(&mut self, placeholder: Option<&LoadedMedia>);
    fn on_loaded(&mut self, media: LoadedMedia);
    fn on_failed(&mut self);
}

/// Host-side media loader. Calls return immediately.
pub trait MediaLoader {
    fn load_image(&self, request: MediaRequest);

    fn load_video_thumbnail(&self, request: MediaRequest);

    /// Route a request by kind. Audio has nothing to preview.
    fn load(&self, request: MediaRequest) {
        match request.kind {
            MediaKind::Image => self.load_image(request),
            MediaKind::Video => self.load_video_thumbnail(request),
            MediaKind::Audio => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Pending,
    Loading,
    Loaded,
    Failed,
}

/// Wraps host callbacks and drops notifications that arrive out of order.
///
/// Each callback fires at most once, and only in the order
/// loading, then loaded or failed.
#[derive(Debug, Default)]
pub struct OrderedCallbacks<C> {
    inner: C,
    state: LoadState,
}

impl<C: MediaCallbacks> OrderedCallbacks<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            state: LoadState::Pending,
        }
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C: MediaCallbacks> MediaCallbacks for OrderedCallbacks<C> {
    fn on_loading(&mut self, placeholder: Option<&LoadedMedia>) {
        if self.state != LoadState::Pending {
            tracing::debug!(state = ?self.state, "dropping late loading notification");
            return;
        }
        self.state = LoadState::Loading;
        self.inner.on_loading(placeholder);
    }

    fn on_loaded(&mut self, media: LoadedMedia) {
        if matches!(self.state, LoadState::Loaded | LoadState::Failed) {
            tracing::debug!(state = ?self.state, "dropping duplicate completion");
            return;
        }
        self.state = LoadState::Loaded;
        self.inner.on_loaded(media);
    }

    fn on_failed(&mut self) {
        if matches!(self.state, LoadState::Loaded | LoadState::Failed) {
            tracing::debug!(state = ?self.state, "dropping duplicate completion");
            return;
        }
        self.state = LoadState::Failed;
        self.inner.on_failed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Log(Vec<&'static str>);

    impl MediaCallbacks for Log {
        fn on_loading(&mut self, _: Option<&LoadedMedia>) {
            self.0.push("loading");
        }
        fn on_loaded(&mut self, _: LoadedMedia) {
            self.0.push("loaded");
        }
        fn on_failed(&mut self) {
            self.0.push("failed");
        }
    }

    fn media() -> LoadedMedia {
        LoadedMedia {
            width: 1,
            height: 1,
            bytes: vec![0],
        }
    }

    #[test]
    fn test_each_callback_fires_once_in_order() {
        let mut callbacks = OrderedCallbacks::new(Log::default());
        callbacks.on_loading(None);
        callbacks.on_loading(None);
        callbacks.on_loaded(media());
        callbacks.on_failed();
        callbacks.on_loading(None);
        assert_eq!(callbacks.state(), LoadState::Loaded);
        assert_eq!(callbacks.into_inner().0, vec!["loading", "loaded"]);
    }

    #[test]
    fn test_failure_without_loading() {
        let mut callbacks = OrderedCallbacks::new(Log::default());
        callbacks.on_failed();
        callbacks.on_loaded(media());
        assert_eq!(callbacks.into_inner().0, vec!["failed"]);
    }
}
