//! Lock-free handoff from the audio callback to the analysis thread.
//!
//! Each signal path owns one `ringbuf` SPSC ring of stereo frames. The
//! producer half lives in [`AudioFeed`] on the audio thread and never blocks,
//! allocates or locks; the consumer half lives in the engine.

use ringbuf::{HeapCons, HeapProd, HeapRb, traits::*};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StereoSample {
    pub left: f32,
    pub right: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalPath {
    /// The analyzed output of the host.
    Post,
    /// Optional reference taken before processing.
    Pre,
}

/// State shared between the two halves besides the ring itself.
#[derive(Debug, Default)]
pub(crate) struct IngestShared {
    pub pre_enabled: AtomicBool,
    pub dropped_post: AtomicUsize,
    pub dropped_pre: AtomicUsize,
}

impl IngestShared {
    fn dropped(&self, path: SignalPath) -> &AtomicUsize {
        match path {
            SignalPath::Post => &self.dropped_post,
            SignalPath::Pre => &self.dropped_pre,
        }
    }
}

/// Producer side, moved into the audio callback.
pub struct AudioFeed {
    post: HeapProd<StereoSample>,
    pre: HeapProd<StereoSample>,
    shared: Arc<IngestShared>,
}

impl AudioFeed {
    /// Copy `left`/`right` into the ring of `path`. A missing right channel is
    /// treated as mono. Returns the number of frames actually stored; frames
    /// that do not fit are counted as dropped, never written over unread data.
    pub fn push(&mut self, left: &[f32], right: Option<&[f32]>, path: SignalPath) -> usize {
        let Some(prod) = self.producer(path) else {
            return 0;
        };

        let frames = match right {
            Some(right) => {
                let n = left.len().min(right.len());
                prod.push_iter(
                    left[..n]
                        .iter()
                        .zip(&right[..n])
                        .map(|(&left, &right)| StereoSample { left, right }),
                )
            }
            None => prod.push_iter(left.iter().map(|&s| StereoSample { left: s, right: s })),
        };

        let wanted = right.map_or(left.len(), |r| left.len().min(r.len()));
        self.note_dropped(path, wanted - frames);
        frames
    }

    /// Push a device callback buffer of `channels` interleaved samples.
    /// Mono buffers feed both sides; extra channels beyond two are ignored.
    pub fn push_interleaved(&mut self, data: &[f32], channels: usize, path: SignalPath) -> usize {
        if channels == 0 {
            return 0;
        }
        let Some(prod) = self.producer(path) else {
            return 0;
        };

        let wanted = data.len() / channels;
        let frames = if channels == 1 {
            prod.push_iter(data.iter().map(|&s| StereoSample { left: s, right: s }))
        } else {
            prod.push_iter(data.chunks_exact(channels).map(|frame| StereoSample {
                left: frame[0],
                right: frame[1],
            }))
        };

        self.note_dropped(path, wanted - frames);
        frames
    }

    fn producer(&mut self, path: SignalPath) -> Option<&mut HeapProd<StereoSample>> {
        match path {
            SignalPath::Post => Some(&mut self.post),
            SignalPath::Pre if self.shared.pre_enabled.load(Ordering::Acquire) => Some(&mut self.pre),
            SignalPath::Pre => None,
        }
    }

    fn note_dropped(&self, path: SignalPath, count: usize) {
        if count > 0 {
            self.shared.dropped(path).fetch_add(count, Ordering::Relaxed);
        }
    }
}

/// Consumer side of one path's ring.
pub(crate) struct IngestConsumer {
    cons: HeapCons<StereoSample>,
}

impl IngestConsumer {
    /// Fill `hop` completely or leave the ring untouched.
    pub fn pop_hop(&mut self, hop: &mut [StereoSample]) -> bool {
        if hop.is_empty() || self.cons.occupied_len() < hop.len() {
            return false;
        }
        self.cons.pop_slice(hop) == hop.len()
    }

    pub fn available(&self) -> usize {
        self.cons.occupied_len()
    }

    pub fn discard_all(&mut self) -> usize {
        self.cons.clear()
    }
}

pub(crate) struct IngestChannels {
    pub post: IngestConsumer,
    pub pre: IngestConsumer,
    pub shared: Arc<IngestShared>,
}

/// Create both rings with `capacity` stereo frames each.
pub(crate) fn channels(capacity: usize) -> (AudioFeed, IngestChannels) {
    let capacity = capacity.max(1);
    let (post_prod, post_cons) = HeapRb::<StereoSample>::new(capacity).split();
    let (pre_prod, pre_cons) = HeapRb::<StereoSample>::new(capacity).split();
    let shared = Arc::new(IngestShared::default());

    (
        AudioFeed {
            post: post_prod,
            pre: pre_prod,
            shared: shared.clone(),
        },
        IngestChannels {
            post: IngestConsumer { cons: post_cons },
            pre: IngestConsumer { cons: pre_cons },
            shared,
        },
    )
}
