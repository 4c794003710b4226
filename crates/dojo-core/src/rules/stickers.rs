//! # Sticker Tier Table
//!
//! Reward ladder keyed by lifetime training units. A tier's threshold is
//! both its key and the unit count at which it is handed out.

use crate::DojoError;
use serde::{Deserialize, Serialize};

const STANDARD_TIERS: &[(u32, &str)] = &[
    (0, "Anfänger"),
    (25, "Weisser Stern"),
    (50, "Gelber Stern"),
    (75, "Oranger Stern"),
    (100, "Grüner Stern"),
    (150, "Blauer Stern"),
    (200, "Violetter Stern"),
    (250, "Brauner Stern"),
    (300, "Schwarzer Stern"),
    (400, "Bronze"),
    (500, "Silber"),
    (600, "Gold"),
    (700, "Platin"),
    (800, "Diamant"),
];

/// One rung of the sticker ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StickerTier {
    pub threshold: u32,
    pub name: String,
}

impl StickerTier {
    /// Create a tier.
    #[must_use]
    pub fn new(threshold: u32, name: impl Into<String>) -> Self {
        Self {
            threshold,
            name: name.into(),
        }
    }
}

/// Immutable, strictly ascending sticker ladder starting at 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StickerTable {
    tiers: Vec<StickerTier>,
}

impl StickerTable {
    /// Build a table; thresholds must start at 0 and strictly increase.
    pub fn new(tiers: Vec<StickerTier>) -> Result<Self, DojoError> {
        match tiers.first() {
            None => {
                return Err(DojoError::InvalidRules(
                    "sticker table is empty".to_string(),
                ));
            }
            Some(first) if first.threshold != 0 => {
                return Err(DojoError::InvalidRules(format!(
                    "first sticker tier must be 0, got {}",
                    first.threshold
                )));
            }
            Some(_) => {}
        }
        for pair in tiers.windows(2) {
            if pair[1].threshold <= pair[0].threshold {
                return Err(DojoError::InvalidRules(format!(
                    "sticker thresholds not ascending: {} then {}",
                    pair[0].threshold, pair[1].threshold
                )));
            }
        }
        Ok(Self { tiers })
    }

    /// The school's standard ladder (0 to 800).
    #[must_use]
    pub fn standard() -> Self {
        Self {
            tiers: STANDARD_TIERS
                .iter()
                .map(|&(threshold, name)| StickerTier::new(threshold, name))
                .collect(),
        }
    }

    /// Iterate tiers in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &StickerTier> {
        self.tiers.iter()
    }

    fn position(&self, threshold: u32) -> Result<usize, DojoError> {
        self.tiers
            .iter()
            .position(|t| t.threshold == threshold)
            .ok_or(DojoError::UnknownStickerTier(threshold))
    }

    /// Look up a tier by threshold.
    pub fn get(&self, threshold: u32) -> Result<&StickerTier, DojoError> {
        self.position(threshold).map(|i| &self.tiers[i])
    }

    /// Highest threshold of the ladder.
    #[must_use]
    pub fn max_threshold(&self) -> u32 {
        self.tiers.last().map(|t| t.threshold).unwrap_or(0)
    }

    /// Check if `threshold` is the last tier.
    pub fn is_last(&self, threshold: u32) -> Result<bool, DojoError> {
        Ok(self.position(threshold)? + 1 == self.tiers.len())
    }

    /// The tier after `current`.
    pub fn next_tier(&self, current: u32) -> Result<&StickerTier, DojoError> {
        let index = self.position(current)?;
        self.tiers
            .get(index + 1)
            .ok_or(DojoError::NoSuccessorTier(current))
    }
}

impl Default for StickerTable {
    fn default() -> Self {
        Self::standard()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_is_valid() {
        let tiers: Vec<_> = StickerTable::standard().iter().cloned().collect();
        assert!(StickerTable::new(tiers).is_ok());
        assert_eq!(StickerTable::standard().max_threshold(), 800);
    }

    #[test]
    fn next_tier_follows_table() {
        let table = StickerTable::standard();
        assert_eq!(table.next_tier(0).expect("next").threshold, 25);
        assert_eq!(table.next_tier(300).expect("next").name, "Bronze");
    }

    #[test]
    fn last_tier_has_no_successor() {
        let table = StickerTable::standard();
        assert!(table.is_last(800).expect("known"));
        assert!(matches!(
            table.next_tier(800),
            Err(DojoError::NoSuccessorTier(800))
        ));
    }

    #[test]
    fn unknown_tier_rejected() {
        let table = StickerTable::standard();
        assert!(matches!(
            table.next_tier(30),
            Err(DojoError::UnknownStickerTier(30))
        ));
    }

    #[test]
    fn invalid_tables_rejected() {
        assert!(StickerTable::new(Vec::new()).is_err());
        assert!(StickerTable::new(vec![StickerTier::new(5, "x")]).is_err());
        assert!(
            StickerTable::new(vec![
                StickerTier::new(0, "a"),
                StickerTier::new(50, "b"),
                StickerTier::new(50, "c"),
            ])
            .is_err()
        );
    }
}
