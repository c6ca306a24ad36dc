//! Container size observation.
//!
//! The host measures its container and reports through a [`SizeReporter`].
//! Measurements travel over an unbounded channel to the [`SizeFeed`], which a
//! controller consumes when it mounts. The reporter forwards only changes:
//! reporting the size it reported last is a no-op.
//!
//! Mounting turns the feed into a [`SizeObserver`]. Disposing the observer
//! closes the channel and aborts the task draining it, so nothing reported
//! afterwards reaches the controller.

use std::cell::Cell;

use futures::{
    channel::mpsc::{self, UnboundedReceiver, UnboundedSender},
    future::AbortHandle,
};
use log::{debug, trace};

use clickgraph_core::geometry::ContainerSize;

/// Creates a connected reporter/feed pair.
pub fn size_channel() -> (SizeReporter, SizeFeed) {
    let (sender, receiver) = mpsc::unbounded();
    (
        SizeReporter {
            sender: sender.clone(),
            last: Cell::new(None),
        },
        SizeFeed {
            receiver,
            closer: sender,
        },
    )
}

/// Host side of the size channel.
#[derive(Debug)]
pub struct SizeReporter {
    sender: UnboundedSender<ContainerSize>,
    last: Cell<Option<ContainerSize>>,
}

impl SizeReporter {
    /// Reports a measurement of the container.
    ///
    /// Returns `false` once the observer has been disposed. A measurement
    /// equal to the previous one is accepted but not forwarded.
    pub fn report(&self, size: ContainerSize) -> bool {
        if self.sender.is_closed() {
            debug!(size:%; "Size reported after the observer was disposed");
            return false;
        }
        if self.last.get() == Some(size) {
            trace!(size:%; "Container size unchanged");
            return true;
        }
        match self.sender.unbounded_send(size) {
            Ok(()) => {
                self.last.set(Some(size));
                true
            }
            Err(_) => false,
        }
    }

    /// Returns `true` while an observer (or a feed waiting to be mounted) listens.
    pub fn is_connected(&self) -> bool {
        !self.sender.is_closed()
    }
}

/// Controller side of the size channel, consumed on mount.
#[derive(Debug)]
pub struct SizeFeed {
    receiver: UnboundedReceiver<ContainerSize>,
    closer: UnboundedSender<ContainerSize>,
}

impl SizeFeed {
    /// Splits the feed into its event stream and an observer controlling it.
    pub(crate) fn into_parts(self, abort: AbortHandle) -> (UnboundedReceiver<ContainerSize>, SizeObserver) {
        (
            self.receiver,
            SizeObserver {
                abort,
                closer: self.closer,
            },
        )
    }
}

/// A live subscription to container size changes.
///
/// [`SizeObserver::dispose`] consumes the observer, so it can only be
/// disposed once.
#[derive(Debug)]
pub struct SizeObserver {
    abort: AbortHandle,
    closer: UnboundedSender<ContainerSize>,
}

impl SizeObserver {
    /// Stops emission of size events.
    pub fn dispose(self) {
        debug!("Disposing size observer");
        self.closer.close_channel();
        self.abort.abort();
    }
}
