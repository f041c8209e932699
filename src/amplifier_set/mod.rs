//! Containers for all (or some of) the amplifiers of one detector.
//!
//! Sets come in four shapes along two independent axes: trim state
//! (trimmed / untrimmed) and assembly state (unassembled / assembled). An
//! *assembled* set additionally owns a single detector-sized canvas
//! section; every member amplifier of an assembled set is a view into that
//! canvas, so pixel edits through either the canvas or a member are
//! mutually visible.
//!
//! Whether a set contains every amplifier of its detector
//! (`is_complete`) is supplied by whoever constructs an unassembled set,
//! typically instrument-specific code that knows the detector layout; it
//! is propagated through transformations, never recomputed. Assembled sets
//! are complete by construction.
//!
//! Each set threads an opaque `observation_info` JSON value through
//! unchanged; the core never inspects it.

pub mod trimmed;
pub mod untrimmed;

pub use trimmed::{AssembledTrimmedAmplifierSet, UnassembledTrimmedAmplifierSet};
pub use untrimmed::{AssembledUntrimmedAmplifierSet, UnassembledUntrimmedAmplifierSet};

use crate::amplifier::Amplifier;

/// Insertion-ordered storage for one detector's amplifiers, keyed by
/// amplifier ID.
///
/// Inserting an amplifier whose ID is already present replaces the old
/// one in place. Detectors have at most a few dozen amplifiers, so lookup
/// is a linear scan.
#[derive(Debug, Clone)]
pub(crate) struct AmplifierBank<A> {
    amps: Vec<A>,
}

impl<A: Amplifier> AmplifierBank<A> {
    pub(crate) fn from_amplifiers(amplifiers: impl IntoIterator<Item = A>) -> Self {
        let mut bank = Self { amps: Vec::new() };
        for amp in amplifiers {
            bank.insert(amp);
        }
        bank
    }

    fn insert(&mut self, amp: A) {
        match self
            .amps
            .iter_mut()
            .find(|existing| existing.amplifier_id() == amp.amplifier_id())
        {
            Some(existing) => *existing = amp,
            None => self.amps.push(amp),
        }
    }

    pub(crate) fn get(&self, amplifier_id: u32) -> Option<&A> {
        self.amps
            .iter()
            .find(|amp| amp.amplifier_id() == amplifier_id)
    }

    pub(crate) fn iter(&self) -> std::slice::Iter<'_, A> {
        self.amps.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.amps.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.amps.is_empty()
    }
}
