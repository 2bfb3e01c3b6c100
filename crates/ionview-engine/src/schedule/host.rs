/// Opaque handle for one pending frame callback.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FrameToken(u64);

impl FrameToken {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Display-synchronized callback source.
///
/// A host delivers at most one callback per requested token, passing a
/// timestamp in milliseconds. Timestamps are normally increasing but callers
/// must tolerate regressions.
pub trait FrameHost {
    /// Requests one callback at the next display refresh.
    fn request_frame(&mut self) -> FrameToken;

    /// Withdraws a pending request. Returns `false` if `token` was not pending.
    fn cancel_frame(&mut self, token: FrameToken) -> bool;
}

/// Host-side bookkeeping for a single pending frame request.
///
/// Used by the window runtime; the runtime drains it with
/// [`FrameRequests::take_pending`] when it delivers a redraw.
#[derive(Debug, Default)]
pub struct FrameRequests {
    next: u64,
    pending: Option<FrameToken>,
    requested: u64,
    cancelled: u64,
}

impl FrameRequests {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Consumes the pending request, if any.
    pub fn take_pending(&mut self) -> Option<FrameToken> {
        self.pending.take()
    }

    /// Total number of requests observed.
    pub fn requested(&self) -> u64 {
        self.requested
    }

    /// Total number of successful cancellations.
    pub fn cancelled(&self) -> u64 {
        self.cancelled
    }
}

impl FrameHost for FrameRequests {
    fn request_frame(&mut self) -> FrameToken {
        self.next = self.next.wrapping_add(1);
        let token = FrameToken::new(self.next);
        if self.pending.replace(token).is_some() {
            log::trace!("frame request {} replaced an earlier pending request", token.raw());
        }
        self.requested += 1;
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) -> bool {
        if self.pending == Some(token) {
            self.pending = None;
            self.cancelled += 1;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_then_take() {
        let mut req = FrameRequests::new();
        let t = req.request_frame();
        assert!(req.is_pending());
        assert_eq!(req.take_pending(), Some(t));
        assert!(!req.is_pending());
    }

    #[test]
    fn cancel_only_matches_pending_token() {
        let mut req = FrameRequests::new();
        let old = req.request_frame();
        let new = req.request_frame();
        assert_ne!(old, new);

        assert!(!req.cancel_frame(old));
        assert!(req.cancel_frame(new));
        assert!(!req.cancel_frame(new));
        assert_eq!(req.cancelled(), 1);
        assert_eq!(req.requested(), 2);
    }
}
