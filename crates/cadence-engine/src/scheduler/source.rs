/// Opaque handle to one pending platform frame request.
///
/// Only used to cancel the request; carries no timing information.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FrameHandle(u64);

impl FrameHandle {
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Platform animation-frame primitive.
///
/// A request asks the platform for exactly one future frame. When that frame fires,
/// the platform calls [`FrameScheduler::dispatch_frame`] with the frame timestamp
/// taken from the same clock as [`now`](FrameSource::now).
///
/// [`FrameScheduler::dispatch_frame`]: super::FrameScheduler::dispatch_frame
pub trait FrameSource {
    /// Monotonic time in milliseconds.
    fn now(&self) -> f64;

    /// Requests one frame callback.
    fn request_frame(&mut self) -> FrameHandle;

    /// Withdraws a pending request. Unknown or already-fired handles are ignored.
    fn cancel_frame(&mut self, handle: FrameHandle);
}
