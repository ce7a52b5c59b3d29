//! Instrumentation for checking what a primitive actually allowed to happen.
//!
//! [`Occupancy`] counts how many workers are inside a guarded section at once, and [`Timeline`]
//! records the order in which workers pass the two sides of a rendezvous.
//!
//! [`Occupancy`]: struct.Occupancy.html
//! [`Timeline`]: struct.Timeline.html

use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_queue::SegQueue;

/// A counter of how many threads are inside a section right now, and how many were at most.
///
/// Call `enter` on the way into the guarded section and keep the returned guard alive until the
/// way out. The counter is updated with atomic instructions only, so it never serializes the
/// workers it's observing.
///
/// # Example
///
/// ```
/// use syncbench::Occupancy;
///
/// let occupancy = Occupancy::new();
/// {
///     let _a = occupancy.enter();
///     let _b = occupancy.enter();
///     assert_eq!(occupancy.current(), 2);
/// }
/// assert_eq!(occupancy.current(), 0);
/// assert_eq!(occupancy.peak(), 2);
/// ```
#[derive(Debug, Default)]
pub struct Occupancy {
    current: AtomicUsize,
    peak: AtomicUsize,
    entries: AtomicUsize,
    exits: AtomicUsize,
}

/// Guard struct returned by [`Occupancy::enter`]; leaves the section on drop.
///
/// [`Occupancy::enter`]: struct.Occupancy.html#method.enter
#[derive(Debug)]
pub struct Inside<'a> {
    occupancy: &'a Occupancy,
}

impl Occupancy {
    /// Creates a new `Occupancy` with nobody inside.
    pub fn new() -> Occupancy {
        Occupancy::default()
    }

    /// Records one thread entering the section.
    pub fn enter(&self) -> Inside<'_> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.entries.fetch_add(1, Ordering::SeqCst);

        Inside { occupancy: self }
    }

    /// Returns how many threads are inside right now.
    pub fn current(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    /// Returns the most threads that were ever inside at once.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Returns how many times the section was entered.
    pub fn entries(&self) -> usize {
        self.entries.load(Ordering::SeqCst)
    }

    /// Returns how many times the section was left.
    pub fn exits(&self) -> usize {
        self.exits.load(Ordering::SeqCst)
    }
}

impl Drop for Inside<'_> {
    fn drop(&mut self) {
        self.occupancy.exits.fetch_add(1, Ordering::SeqCst);
        self.occupancy.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Which side of a rendezvous a [`Timeline`] mark was recorded on.
///
/// [`Timeline`]: struct.Timeline.html
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Recorded before the worker arrived at the rendezvous.
    Before,
    /// Recorded after the worker was released from the rendezvous.
    After,
}

/// A single entry in a [`Timeline`].
///
/// [`Timeline`]: struct.Timeline.html
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Mark {
    /// The ordinal of the worker that recorded the mark.
    pub ordinal: usize,
    /// Which side of the rendezvous it was recorded on.
    pub phase: Phase,
    /// The value of the timeline's global counter when the mark was recorded.
    pub tick: usize,
}

/// A log of "before" and "after" marks stamped with a global, strictly increasing tick.
///
/// Workers record marks concurrently; the marks go into a lock-free queue so that recording one
/// never blocks. Once every worker is done, `finish` folds the marks into a [`PhaseSummary`].
///
/// [`PhaseSummary`]: struct.PhaseSummary.html
#[derive(Debug, Default)]
pub struct Timeline {
    tick: AtomicUsize,
    marks: SegQueue<Mark>,
}

/// What a [`Timeline`] saw, once all the marks are in.
///
/// [`Timeline`]: struct.Timeline.html
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct PhaseSummary {
    /// How many "before" marks were recorded.
    pub befores: usize,
    /// How many "after" marks were recorded.
    pub afters: usize,
    /// The tick of the latest "before" mark.
    pub last_before: Option<usize>,
    /// The tick of the earliest "after" mark.
    pub first_after: Option<usize>,
}

impl Timeline {
    /// Creates an empty `Timeline`.
    pub fn new() -> Timeline {
        Timeline::default()
    }

    /// Records a "before" mark for the given worker.
    pub fn before(&self, ordinal: usize) {
        self.record(ordinal, Phase::Before);
    }

    /// Records an "after" mark for the given worker.
    pub fn after(&self, ordinal: usize) {
        self.record(ordinal, Phase::After);
    }

    fn record(&self, ordinal: usize, phase: Phase) {
        let tick = self.tick.fetch_add(1, Ordering::SeqCst);
        self.marks.push(Mark { ordinal, phase, tick });
    }

    /// Consumes the timeline, returning every mark it recorded in tick order.
    pub fn into_marks(self) -> Vec<Mark> {
        let mut marks = Vec::with_capacity(self.marks.len());
        while let Some(mark) = self.marks.pop() {
            marks.push(mark);
        }
        marks.sort_by_key(|mark| mark.tick);
        marks
    }

    /// Consumes the timeline and summarizes its marks.
    pub fn finish(self) -> PhaseSummary {
        self.into_marks()
            .into_iter()
            .fold(PhaseSummary::default(), |mut summary, mark| {
                match mark.phase {
                    Phase::Before => {
                        summary.befores += 1;
                        summary.last_before = summary.last_before.max(Some(mark.tick));
                    }
                    Phase::After => {
                        summary.afters += 1;
                        if summary.first_after.map_or(true, |first| mark.tick < first) {
                            summary.first_after = Some(mark.tick);
                        }
                    }
                }
                summary
            })
    }
}

impl PhaseSummary {
    /// Returns whether every "before" mark was recorded ahead of every "after" mark.
    pub fn is_ordered(&self) -> bool {
        match (self.last_before, self.first_after) {
            (Some(before), Some(after)) => before < after,
            _ => true,
        }
    }
}
