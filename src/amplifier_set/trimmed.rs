//! Sets of trimmed amplifiers, separate or assembled onto one canvas.

use serde_json::Value;
use tracing::debug;

use crate::amplifier::{Amplifier, TrimmedAmplifier};
use crate::amplifier_set::AmplifierBank;
use crate::bounding_box::BoundingBox;
use crate::error::{AmplifierImageError, Result};
use crate::section::{ImagePayload, ImageSection};

/// A set of trimmed amplifiers held as separate, single-amplifier images.
#[derive(Debug, Clone)]
pub struct UnassembledTrimmedAmplifierSet {
    amps: AmplifierBank<TrimmedAmplifier>,
    is_complete: bool,
    observation_info: Option<Value>,
}

impl UnassembledTrimmedAmplifierSet {
    /// Creates a set from individual trimmed amplifiers.
    ///
    /// `is_complete` states whether every amplifier of the detector is
    /// included; only the caller can know that, so it is taken on trust
    /// and propagated, never recomputed. An amplifier with a duplicate ID
    /// replaces the earlier one.
    pub fn new(
        amplifiers: impl IntoIterator<Item = TrimmedAmplifier>,
        is_complete: bool,
        observation_info: Option<Value>,
    ) -> Self {
        Self {
            amps: AmplifierBank::from_amplifiers(amplifiers),
            is_complete,
            observation_info,
        }
    }

    /// The amplifier with the given ID, if present.
    pub fn get(&self, amplifier_id: u32) -> Option<&TrimmedAmplifier> {
        self.amps.get(amplifier_id)
    }

    /// Iterates over the amplifiers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &TrimmedAmplifier> {
        self.amps.iter()
    }

    pub fn len(&self) -> usize {
        self.amps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amps.is_empty()
    }

    /// Opaque observation metadata shared by all amplifiers of the
    /// detector, passed through unchanged by every transformation.
    pub fn observation_info(&self) -> Option<&Value> {
        self.observation_info.as_ref()
    }

    /// `true` if this set contains all amplifiers for its detector, as
    /// declared at construction.
    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    /// A copy whose amplifiers share no pixel storage with this set.
    pub fn deep_copy(&self) -> Self {
        Self {
            amps: AmplifierBank::from_amplifiers(self.iter().map(Amplifier::deep_copy)),
            is_complete: self.is_complete,
            observation_info: self.observation_info.clone(),
        }
    }

    /// An equivalent set with no image data, just geometry and metadata.
    pub fn without_images(&self) -> Self {
        Self {
            amps: AmplifierBank::from_amplifiers(self.iter().map(Amplifier::without_images)),
            is_complete: self.is_complete,
            observation_info: self.observation_info.clone(),
        }
    }

    /// The set itself: its members are already trimmed. The returned
    /// amplifiers share pixels with this set.
    pub fn trimmed_view(&self) -> Self {
        self.clone()
    }

    /// A new set whose every member satisfies
    /// `readout_transform().is_identity()`.
    ///
    /// With `allow_view` set, short-circuits to a view of `self` when all
    /// members are already in readout coordinates.
    pub fn into_readout_coordinates(&self, allow_view: bool) -> Result<Self> {
        if allow_view
            && self
                .iter()
                .all(|amp| amp.readout_transform().is_identity())
        {
            return Ok(self.clone());
        }
        let amps: Vec<TrimmedAmplifier> = self
            .iter()
            .map(|amp| amp.into_readout_coordinates(allow_view))
            .collect::<Result<_>>()?;
        Ok(Self::new(
            amps,
            self.is_complete,
            self.observation_info.clone(),
        ))
    }

    /// Assembles the members into a single trimmed detector image.
    ///
    /// The canvas box is the union of every member's physical output box;
    /// each member is transformed into physical coordinates and written
    /// into a freshly allocated canvas, so the result never shares pixels
    /// with this set.
    ///
    /// Fails with [`AmplifierImageError::IncompleteSet`] unless the set is
    /// complete and non-empty.
    pub fn assemble_into_trimmed(&self) -> Result<AssembledTrimmedAmplifierSet> {
        let first = match (self.is_complete, self.amps.iter().next()) {
            (true, Some(first)) => first,
            _ => return Err(AmplifierImageError::IncompleteSet),
        };
        let mut detector_bbox = BoundingBox::new_empty();
        for amp in self.iter() {
            detector_bbox = detector_bbox.union(&amp.physical_transform().output_bbox());
        }
        debug!(
            "assembling {} trimmed amplifiers into {}",
            self.len(),
            detector_bbox
        );
        let detector = first.data().make_empty(detector_bbox);
        let mut assembled = Vec::with_capacity(self.len());
        for amp in self.iter() {
            let amp = amp.into_physical_coordinates(true)?;
            detector.assign(&amp.data())?;
            assembled.push(amp);
        }
        AssembledTrimmedAmplifierSet::new(detector, assembled, self.observation_info.clone())
    }
}

/// A complete set of all trimmed amplifiers for a detector, assembled
/// into a single image.
///
/// Member amplifiers are guaranteed to be in physical coordinates and to
/// be views into the detector canvas.
#[derive(Debug, Clone)]
pub struct AssembledTrimmedAmplifierSet {
    detector: ImageSection,
    amps: AmplifierBank<TrimmedAmplifier>,
    observation_info: Option<Value>,
}

impl AssembledTrimmedAmplifierSet {
    /// Creates an assembled set from a detector canvas and amplifiers.
    ///
    /// Each amplifier is brought into physical coordinates and re-wrapped
    /// so its data section is a view into `detector`; any pixel data the
    /// amplifiers carry is discarded in favor of the canvas (use
    /// [`UnassembledTrimmedAmplifierSet::assemble_into_trimmed`] to build
    /// the canvas *from* existing amplifier pixels).
    pub fn new(
        detector: ImageSection,
        amplifiers: impl IntoIterator<Item = TrimmedAmplifier>,
        observation_info: Option<Value>,
    ) -> Result<Self> {
        let mut amps = Vec::new();
        for amp in amplifiers {
            let amp = amp.into_physical_coordinates(true)?;
            let view = detector.subimage(amp.data().bbox())?;
            amps.push(amp.with_new_data_image(view.payload().clone())?);
        }
        Ok(Self {
            detector,
            amps: AmplifierBank::from_amplifiers(amps),
            observation_info,
        })
    }

    /// Creates an assembled set from a canvas and existing views into it,
    /// with no checking.
    ///
    /// Every amplifier must already be in physical coordinates and a
    /// proper view into `detector`; nothing verifies that, and misuse
    /// silently breaks the aliasing guarantees of the assembled set. For
    /// callers that can establish those invariants themselves and want to
    /// skip the re-wrapping done by [`AssembledTrimmedAmplifierSet::new`].
    pub fn from_views(
        detector: ImageSection,
        amplifiers: impl IntoIterator<Item = TrimmedAmplifier>,
        observation_info: Option<Value>,
    ) -> Self {
        Self {
            detector,
            amps: AmplifierBank::from_amplifiers(amplifiers),
            observation_info,
        }
    }

    /// The full trimmed detector image. A view sharing pixels with every
    /// member amplifier.
    pub fn detector(&self) -> ImageSection {
        self.detector.clone()
    }

    /// The amplifier with the given ID, if present.
    pub fn get(&self, amplifier_id: u32) -> Option<&TrimmedAmplifier> {
        self.amps.get(amplifier_id)
    }

    /// Iterates over the amplifiers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &TrimmedAmplifier> {
        self.amps.iter()
    }

    pub fn len(&self) -> usize {
        self.amps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amps.is_empty()
    }

    /// Opaque observation metadata shared by all amplifiers of the
    /// detector, passed through unchanged by every transformation.
    pub fn observation_info(&self) -> Option<&Value> {
        self.observation_info.as_ref()
    }

    /// Always `true`: an assembled set is complete by construction.
    pub fn is_complete(&self) -> bool {
        true
    }

    /// A copy whose canvas and amplifiers share no pixel storage with
    /// this set.
    ///
    /// Cannot actually fail for a set whose members are views into its
    /// canvas, which every constructor except
    /// [`AssembledTrimmedAmplifierSet::from_views`] guarantees.
    pub fn deep_copy(&self) -> Result<Self> {
        Self::new(
            self.detector.copy(),
            self.iter().cloned(),
            self.observation_info.clone(),
        )
    }

    /// An equivalent set with no image data, just geometry and metadata.
    pub fn without_images(&self) -> Self {
        if !self.detector.has_image() {
            return self.clone();
        }
        Self::from_views(
            self.detector.without_payload(),
            self.iter().map(Amplifier::without_images),
            self.observation_info.clone(),
        )
    }

    /// The set itself: its members are already trimmed. The returned
    /// amplifiers share pixels with this set.
    pub fn trimmed_view(&self) -> Self {
        self.clone()
    }

    /// An unassembled set whose every member satisfies
    /// `readout_transform().is_identity()`.
    ///
    /// The result is unassembled because readout coordinates are
    /// per-amplifier; the canvas does not survive the conversion.
    pub fn into_readout_coordinates(&self, allow_view: bool) -> Result<UnassembledTrimmedAmplifierSet> {
        UnassembledTrimmedAmplifierSet::new(
            self.iter().cloned(),
            true,
            self.observation_info.clone(),
        )
        .into_readout_coordinates(allow_view)
    }

    /// Already assembled: returns a view of `self` when `allow_view`,
    /// otherwise a deep copy.
    pub fn assemble_into_trimmed(&self, allow_view: bool) -> Result<Self> {
        if allow_view {
            Ok(self.clone())
        } else {
            self.deep_copy()
        }
    }

    /// The same set with the detector pixels replaced by `payload`, which
    /// must cover the detector bounding box. Member amplifiers are
    /// re-wrapped as views into the new canvas.
    ///
    /// [`ImagePayload::NoData`] is equivalent to
    /// [`AssembledTrimmedAmplifierSet::without_images`].
    pub fn with_new_detector_image(&self, payload: ImagePayload) -> Result<Self> {
        if let ImagePayload::NoData = payload {
            return Ok(self.without_images());
        }
        Self::new(
            self.detector.with_new_payload(payload)?,
            self.iter().cloned(),
            self.observation_info.clone(),
        )
    }
}
