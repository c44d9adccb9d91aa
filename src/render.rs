//! Batched redraw notifications.
//!
//! A [`RenderBatch`] guard suppresses redraw requests for as long as it is
//! alive. Guards nest by reference count; when the outermost one drops, the
//! sink receives exactly one redraw, on every exit path including `?`
//! propagation and unwinding.
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// The external rendering surface.
pub trait RenderSink {
    fn redraw(&mut self);
}

impl<F: FnMut()> RenderSink for F {
    fn redraw(&mut self) {
        self()
    }
}

pub struct RenderGate {
    depth: Cell<usize>,
    redraws: Cell<u64>,
    sink: RefCell<Box<dyn RenderSink>>,
}

impl RenderGate {
    pub fn new(sink: Box<dyn RenderSink>) -> Rc<Self> {
        Rc::new(Self {
            depth: Cell::new(0),
            redraws: Cell::new(0),
            sink: RefCell::new(sink),
        })
    }

    /// Gate whose redraws go nowhere.
    pub fn detached() -> Rc<Self> {
        Self::new(Box::new(|| {}))
    }

    /// Enter a batch. The returned guard must be kept alive for its scope.
    #[must_use = "the batch ends as soon as the guard is dropped"]
    pub fn batch(self: &Rc<Self>) -> RenderBatch {
        self.depth.set(self.depth.get() + 1);
        RenderBatch { gate: self.clone() }
    }

    pub fn is_batching(&self) -> bool {
        self.depth.get() > 0
    }

    /// Redraw now unless a batch is open; an open batch redraws on exit.
    pub fn request_redraw(&self) {
        if !self.is_batching() {
            self.fire();
        }
    }

    /// Total redraws delivered to the sink.
    pub fn redraws(&self) -> u64 {
        self.redraws.get()
    }

    pub fn replace_sink(&self, sink: Box<dyn RenderSink>) {
        *self.sink.borrow_mut() = sink;
    }

    fn fire(&self) {
        self.redraws.set(self.redraws.get() + 1);
        self.sink.borrow_mut().redraw();
    }
}

impl fmt::Debug for RenderGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderGate")
            .field("depth", &self.depth.get())
            .field("redraws", &self.redraws.get())
            .finish()
    }
}

pub struct RenderBatch {
    gate: Rc<RenderGate>,
}

impl Drop for RenderBatch {
    fn drop(&mut self) {
        let depth = self.gate.depth.get() - 1;
        self.gate.depth.set(depth);
        if depth == 0 {
            self.gate.fire();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting_gate() -> (Rc<RenderGate>, Rc<Cell<usize>>) {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        (RenderGate::new(Box::new(move || c.set(c.get() + 1))), count)
    }

    #[test]
    fn nested_batches_fire_once() {
        let (gate, count) = counting_gate();
        {
            let _outer = gate.batch();
            {
                let _inner = gate.batch();
                gate.request_redraw();
            }
            assert_eq!(count.get(), 0);
            gate.request_redraw();
        }
        assert_eq!(count.get(), 1);
        assert_eq!(gate.redraws(), 1);
    }

    #[test]
    fn request_outside_batch_fires_immediately() {
        let (gate, count) = counting_gate();
        gate.request_redraw();
        assert_eq!(count.get(), 1);
        assert!(!gate.is_batching());
    }

    #[test]
    fn batch_fires_on_error_path() {
        let (gate, count) = counting_gate();
        let failing = |g: &Rc<RenderGate>| -> Result<(), &'static str> {
            let _batch = g.batch();
            let outcome: Result<(), &'static str> = Err("boom");
            outcome?;
            Ok(())
        };
        assert!(failing(&gate).is_err());
        assert_eq!(count.get(), 1);
        assert!(!gate.is_batching());
    }
}
