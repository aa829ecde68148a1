//! Tier -> phase segment catalog.
//!
//! The catalog is plain data handed to the calendar generator. The defaults
//! below describe the shipped products; configuration may replace any tier's
//! segment list (see [`crate::storage::CatalogConfig`]).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{PhaseType, SubscriptionTier};
use crate::error::{CoreError, ValidationError};

/// One ordered, fixed-length piece of a tier's program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSegment {
    pub order: u32,
    pub phase_type: PhaseType,
    pub duration_days: u32,
}

/// Segment as written in configuration: order is implied by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentSpec {
    pub phase: PhaseType,
    pub days: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseCatalog {
    tiers: BTreeMap<SubscriptionTier, Vec<PhaseSegment>>,
}

impl Default for PhaseCatalog {
    fn default() -> Self {
        use PhaseType::*;

        let mut catalog = Self::empty();
        let defaults: [(SubscriptionTier, &[(PhaseType, u32)]); 4] = [
            (SubscriptionTier::Discovery, &[(Detox, 7), (Balance, 21)]),
            (
                SubscriptionTier::Essential,
                &[(Detox, 7), (Balance, 49), (Consolidation, 28)],
            ),
            (
                SubscriptionTier::Premium,
                &[
                    (DetoxPlus, 14),
                    (Balance, 70),
                    (Consolidation, 42),
                    (Maintenance, 42),
                ],
            ),
            (
                SubscriptionTier::Classic,
                &[(Detox, 7), (Attack, 28), (Balance, 28), (Consolidation, 21)],
            ),
        ];
        for (tier, segments) in defaults {
            catalog.tiers.insert(tier, number(segments.iter().copied()));
        }
        catalog
    }
}

impl PhaseCatalog {
    /// A catalog that knows no tier.
    pub fn empty() -> Self {
        Self {
            tiers: BTreeMap::new(),
        }
    }

    /// Ordered segments for `tier`.
    ///
    /// # Errors
    /// [`CoreError::UnknownTier`] if the tier has no entry.
    pub fn segments(&self, tier: SubscriptionTier) -> Result<&[PhaseSegment], CoreError> {
        self.tiers
            .get(&tier)
            .map(Vec::as_slice)
            .ok_or_else(|| CoreError::UnknownTier(tier.to_string()))
    }

    /// Replace (or add) one tier's segment list.
    ///
    /// # Errors
    /// Rejects an empty list or a zero-day segment.
    pub fn with_tier(
        mut self,
        tier: SubscriptionTier,
        specs: &[SegmentSpec],
    ) -> Result<Self, ValidationError> {
        if specs.is_empty() {
            return Err(ValidationError::EmptyTier(tier.to_string()));
        }
        if let Some(pos) = specs.iter().position(|s| s.days == 0) {
            return Err(ValidationError::EmptySegment {
                tier: tier.to_string(),
                order: pos as u32 + 1,
            });
        }
        self.tiers
            .insert(tier, number(specs.iter().map(|s| (s.phase, s.days))));
        Ok(self)
    }

    /// Defaults with configured overrides applied on top.
    pub fn with_overrides(
        overrides: &BTreeMap<SubscriptionTier, Vec<SegmentSpec>>,
    ) -> Result<Self, ValidationError> {
        overrides
            .iter()
            .try_fold(Self::default(), |catalog, (tier, specs)| {
                catalog.with_tier(*tier, specs)
            })
    }

    pub fn tiers(&self) -> impl Iterator<Item = SubscriptionTier> + '_ {
        self.tiers.keys().copied()
    }

    /// Total program length in days.
    pub fn total_days(&self, tier: SubscriptionTier) -> Result<u32, CoreError> {
        Ok(self.segments(tier)?.iter().map(|s| s.duration_days).sum())
    }
}

fn number(segments: impl Iterator<Item = (PhaseType, u32)>) -> Vec<PhaseSegment> {
    segments
        .enumerate()
        .map(|(i, (phase_type, duration_days))| PhaseSegment {
            order: i as u32 + 1,
            phase_type,
            duration_days,
        })
        .collect()
}
