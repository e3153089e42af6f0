//! Priority tiers.
//!
//! Ascending order of the whole ladder:
//!
//! ```text
//! Phasing(Low) < Phasing(Medium) < Phasing(High) < Phasing(HighPersistent)
//!   < Active(Low) < Active(Medium) < Active(High) < Active(HighPersistent)
//!   < Transition < Blend
//! ```
//!
//! The phasing ladder mirrors the active one rung for rung and only matters
//! while a transition is fencing off pixels that still belong to retiring
//! content.

use serde::Deserialize;
use std::ops::{BitOr, BitOrAssign};

/// A rung shared by the active and phasing ladders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rung {
    Low,
    Medium,
    High,
    /// High priority that survives the end-of-frame decay.
    HighPersistent,
}

impl Rung {
    pub const ALL: [Rung; 4] = [Rung::Low, Rung::Medium, Rung::High, Rung::HighPersistent];

    pub const fn is_persistent(self) -> bool {
        matches!(self, Rung::HighPersistent)
    }
}

/// The claim recorded against a pixel, or the tier a writer requests.
///
/// Variant order is the priority order; the derived `Ord` is the comparison
/// used by the write protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    /// Content being retired by an in-progress transition.
    Phasing(Rung),
    /// Ordinary content.
    Active(Rung),
    /// A transition writer.
    Transition,
    /// Open to every writer until the end of the frame.
    Blend,
}

impl Tier {
    pub const LOW: Tier = Tier::Active(Rung::Low);
    pub const MEDIUM: Tier = Tier::Active(Rung::Medium);
    pub const HIGH: Tier = Tier::Active(Rung::High);
    pub const HIGH_PERSISTENT: Tier = Tier::Active(Rung::HighPersistent);
    pub const PHASING_LOW: Tier = Tier::Phasing(Rung::Low);

    pub const fn is_phasing(self) -> bool {
        matches!(self, Tier::Phasing(_))
    }

    pub const fn is_persistent(self) -> bool {
        match self {
            Tier::Phasing(r) | Tier::Active(r) => r.is_persistent(),
            Tier::Transition | Tier::Blend => false,
        }
    }

    /// Shift an active tier onto the phasing ladder, keeping its rung.
    /// Transition and blend have no phasing counterpart and are returned as is.
    pub const fn to_phasing(self) -> Tier {
        match self {
            Tier::Active(r) => Tier::Phasing(r),
            other => other,
        }
    }

    /// Promote a phasing tier back onto the active ladder.
    pub const fn to_active(self) -> Tier {
        match self {
            Tier::Phasing(r) => Tier::Active(r),
            other => other,
        }
    }

    /// The tier a pixel holds after the end-of-frame decay.
    pub const fn decayed(self) -> Tier {
        if self.is_persistent() {
            self
        } else {
            self.released()
        }
    }

    /// The unclaimed tier of this tier's class, persistent or not.
    pub const fn released(self) -> Tier {
        if self.is_phasing() {
            Tier::PHASING_LOW
        } else {
            Tier::LOW
        }
    }
}

impl Default for Tier {
    fn default() -> Self {
        Tier::LOW
    }
}

/// The tier a slot declares when it is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Low,
    Medium,
    High,
    Persistent,
    Transition,
}

impl Layer {
    pub const ALL: [Layer; 5] = [
        Layer::Low,
        Layer::Medium,
        Layer::High,
        Layer::Persistent,
        Layer::Transition,
    ];

    /// The active-ladder tier this layer runs at.
    pub const fn tier(self) -> Tier {
        match self {
            Layer::Low => Tier::LOW,
            Layer::Medium => Tier::MEDIUM,
            Layer::High => Tier::HIGH,
            Layer::Persistent => Tier::HIGH_PERSISTENT,
            Layer::Transition => Tier::Transition,
        }
    }

    pub const fn is_transition(self) -> bool {
        matches!(self, Layer::Transition)
    }

    /// Pick a default layer from a slot's tags.
    pub fn for_tags(tags: Tags) -> Layer {
        if tags.is_transition_only() {
            Layer::Transition
        } else if tags.is_audio_analysis() {
            Layer::Persistent
        } else {
            Layer::Medium
        }
    }
}

/// Check that layers line up with the active ladder and that every active
/// rung maps onto the phasing ladder and back without loss.
///
/// Run once at start-up.
pub fn ladder_is_aligned() -> bool {
    let layers_ascend = Layer::ALL
        .windows(2)
        .all(|w| w[0] < w[1] && w[0].tier() < w[1].tier());
    let round_trips = Rung::ALL.iter().all(|&r| {
        let active = Tier::Active(r);
        let phasing = active.to_phasing();
        phasing == Tier::Phasing(r)
            && phasing.to_active() == active
            && phasing.is_persistent() == active.is_persistent()
    });
    let fenced_below = Rung::ALL
        .iter()
        .all(|&r| Tier::Phasing(r) < Tier::LOW && Tier::Phasing(r) < Tier::Active(r));
    layers_ascend && round_trips && fenced_below && Tier::Transition < Tier::Blend
}

/// Descriptive tags carried by a slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Tags(u8);

impl Tags {
    pub const NONE: Tags = Tags(0);
    /// Keeps a private list of pixels it wrote and revisits them.
    pub const REMEMBRANCE: Tags = Tags(0x01);
    pub const VISUAL: Tags = Tags(0x02);
    pub const TRANSITION: Tags = Tags(0x04);
    pub const AUDIO_REACTIVE: Tags = Tags(0x08);
    pub const GRID_OPTIMIZED: Tags = Tags(0x10);
    pub const GIF: Tags = Tags(0x20);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Tags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Tagged as a transition and as nothing that could play on its own.
    pub const fn is_transition_only(self) -> bool {
        self.contains(Tags::TRANSITION) && !self.contains(Tags::VISUAL)
    }

    /// Plots analysis data (spectrum bars) rather than reacting visually.
    pub const fn is_audio_analysis(self) -> bool {
        self.contains(Tags::AUDIO_REACTIVE) && self.contains(Tags::GRID_OPTIMIZED)
    }
}

impl BitOr for Tags {
    type Output = Tags;

    fn bitor(self, rhs: Tags) -> Tags {
        Tags(self.0 | rhs.0)
    }
}

impl BitOrAssign for Tags {
    fn bitor_assign(&mut self, rhs: Tags) {
        self.0 |= rhs.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ladder_order() {
        let ladder = [
            Tier::PHASING_LOW,
            Tier::Phasing(Rung::Medium),
            Tier::Phasing(Rung::High),
            Tier::Phasing(Rung::HighPersistent),
            Tier::LOW,
            Tier::MEDIUM,
            Tier::HIGH,
            Tier::HIGH_PERSISTENT,
            Tier::Transition,
            Tier::Blend,
        ];
        assert!(ladder.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn ladder_alignment_holds() {
        assert!(ladder_is_aligned());
    }

    #[test]
    fn phasing_mapping_keeps_persistence() {
        assert_eq!(
            Tier::HIGH_PERSISTENT.to_phasing(),
            Tier::Phasing(Rung::HighPersistent)
        );
        assert!(Tier::HIGH_PERSISTENT.to_phasing().is_persistent());
        assert_eq!(Tier::Transition.to_phasing(), Tier::Transition);
        assert_eq!(Tier::Blend.to_active(), Tier::Blend);
    }

    #[test]
    fn decay_targets() {
        assert_eq!(Tier::HIGH.decayed(), Tier::LOW);
        assert_eq!(Tier::Transition.decayed(), Tier::LOW);
        assert_eq!(Tier::Blend.decayed(), Tier::LOW);
        assert_eq!(Tier::Phasing(Rung::High).decayed(), Tier::PHASING_LOW);
        assert_eq!(Tier::HIGH_PERSISTENT.decayed(), Tier::HIGH_PERSISTENT);
        assert_eq!(
            Tier::Phasing(Rung::HighPersistent).decayed(),
            Tier::Phasing(Rung::HighPersistent)
        );
    }

    #[test]
    fn layers_from_tags() {
        assert_eq!(Layer::for_tags(Tags::TRANSITION), Layer::Transition);
        assert_eq!(
            Layer::for_tags(Tags::REMEMBRANCE | Tags::VISUAL | Tags::TRANSITION),
            Layer::Medium
        );
        assert_eq!(
            Layer::for_tags(Tags::AUDIO_REACTIVE | Tags::GRID_OPTIMIZED),
            Layer::Persistent
        );
        assert_eq!(Layer::for_tags(Tags::AUDIO_REACTIVE | Tags::VISUAL), Layer::Medium);
        assert_eq!(Layer::for_tags(Tags::NONE), Layer::Medium);
    }

    #[test]
    fn layer_parses_snake_case() {
        #[derive(Deserialize)]
        struct Wrap {
            layer: Layer,
        }
        let w: Wrap = toml::from_str("layer = \"persistent\"").unwrap();
        assert_eq!(w.layer, Layer::Persistent);
    }
}
