//! Card Catalog
//!
//! The fixed table of 96 card definitions and the factory that turns a
//! catalog id into a [`CardInstance`] bound to one match.
//!
//! ## Layout
//!
//! Each element owns a block of 32 consecutive ids:
//!
//! | Offset  | Role                     | Power |
//! |---------|--------------------------|-------|
//! | 1-8     | Arch                     | 1,1,2,2,3,3,4,5 |
//! | 9-14    | Dino head                | 1,1,2,2,3,3 |
//! | 15-16   | Chest (complete)         | 3 |
//! | 17-18   | Chest (arms)             | 1 |
//! | 19-20   | Chest (arms + legs)      | 2 |
//! | 21-24   | Left arm                 | 1 |
//! | 25-28   | Right arm                | 1 |
//! | 29-32   | Legs                     | 2 |
//!
//! Sand is 1-32, Water 33-64, Wind 65-96.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::ids::CardId;

/// Number of cards in the catalog.
pub const CATALOG_SIZE: usize = 96;

/// Highest power printed on any card.
pub const MAX_CARD_POWER: u8 = 5;

// =============================================================================
// ELEMENT
// =============================================================================

/// Elemental affinity. Partitions armies, dinos and battles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    /// Sand
    Sand,
    /// Water
    Water,
    /// Wind
    Wind,
}

impl Element {
    /// All elements in board order.
    pub const ALL: [Element; 3] = [Element::Sand, Element::Water, Element::Wind];

    /// Board slot for this element.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Lowercase display name.
    pub fn name(self) -> &'static str {
        match self {
            Element::Sand => "sand",
            Element::Water => "water",
            Element::Wind => "wind",
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for an element name that matches no element.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown element: {0:?}")]
pub struct UnknownElement(pub String);

impl FromStr for Element {
    type Err = UnknownElement;

    /// Case- and whitespace-insensitive (`"Sand"`, `" SAND "`, `"sand"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Element::ALL
            .into_iter()
            .find(|e| e.name() == normalized)
            .ok_or_else(|| UnknownElement(s.to_string()))
    }
}

// =============================================================================
// ROLE
// =============================================================================

/// Chest variant; decides which limbs a dino can still take.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChestKind {
    /// Full torso. Nothing attaches after it.
    Complete,
    /// Accepts arms only.
    Arms,
    /// Accepts arms and legs.
    ArmsLegs,
}

impl ChestKind {
    /// Whether a limb of this kind fits on this chest.
    pub fn accepts(self, limb: BodyPartKind) -> bool {
        match (self, limb) {
            (_, BodyPartKind::Chest(_)) => false,
            (ChestKind::Complete, _) => false,
            (ChestKind::Arms, BodyPartKind::LeftArm | BodyPartKind::RightArm) => true,
            (ChestKind::Arms, BodyPartKind::Legs) => false,
            (ChestKind::ArmsLegs, _) => true,
        }
    }
}

/// Body part subtype.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyPartKind {
    /// Torso; must come first.
    Chest(ChestKind),
    /// Left arm
    LeftArm,
    /// Right arm
    RightArm,
    /// Pair of legs
    Legs,
}

impl BodyPartKind {
    /// Whether two parts occupy the same slot on a dino.
    pub fn same_slot(self, other: BodyPartKind) -> bool {
        matches!(
            (self, other),
            (BodyPartKind::Chest(_), BodyPartKind::Chest(_))
                | (BodyPartKind::LeftArm, BodyPartKind::LeftArm)
                | (BodyPartKind::RightArm, BodyPartKind::RightArm)
                | (BodyPartKind::Legs, BodyPartKind::Legs)
        )
    }
}

/// What a card does when it comes into play.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Joins its element's army on the central board.
    Arch,
    /// Starts a new dino.
    DinoHead,
    /// Attaches to an existing dino.
    BodyPart(BodyPartKind),
}

impl Role {
    /// Arch cards never stay in a hand.
    #[inline]
    pub fn is_arch(self) -> bool {
        matches!(self, Role::Arch)
    }

    /// Body part subtype, if any.
    #[inline]
    pub fn body_part(self) -> Option<BodyPartKind> {
        match self {
            Role::BodyPart(kind) => Some(kind),
            _ => None,
        }
    }
}

// =============================================================================
// DEFINITIONS AND INSTANCES
// =============================================================================

/// Immutable printed card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDefinition {
    /// Catalog id
    pub id: CardId,
    /// Power (0-5)
    pub power: u8,
    /// Role
    pub role: Role,
    /// Element
    pub element: Element,
}

impl CardDefinition {
    const fn arch(id: u16, power: u8, element: Element) -> Self {
        Self { id: CardId::new(id), power, role: Role::Arch, element }
    }

    const fn head(id: u16, power: u8, element: Element) -> Self {
        Self { id: CardId::new(id), power, role: Role::DinoHead, element }
    }

    const fn part(id: u16, power: u8, element: Element, kind: BodyPartKind) -> Self {
        Self { id: CardId::new(id), power, role: Role::BodyPart(kind), element }
    }
}

/// A card occurrence in a running match.
///
/// Plain value; its location is whichever collection currently holds it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardInstance {
    /// Catalog id
    pub id: CardId,
    /// Power
    pub power: u8,
    /// Role
    pub role: Role,
    /// Element
    pub element: Element,
}

impl From<&CardDefinition> for CardInstance {
    fn from(def: &CardDefinition) -> Self {
        Self {
            id: def.id,
            power: def.power,
            role: def.role,
            element: def.element,
        }
    }
}

static CATALOG: [CardDefinition; CATALOG_SIZE] = [
    // Sand
    CardDefinition::arch(1, 1, Element::Sand),
    CardDefinition::arch(2, 1, Element::Sand),
    CardDefinition::arch(3, 2, Element::Sand),
    CardDefinition::arch(4, 2, Element::Sand),
    CardDefinition::arch(5, 3, Element::Sand),
    CardDefinition::arch(6, 3, Element::Sand),
    CardDefinition::arch(7, 4, Element::Sand),
    CardDefinition::arch(8, 5, Element::Sand),
    CardDefinition::head(9, 1, Element::Sand),
    CardDefinition::head(10, 1, Element::Sand),
    CardDefinition::head(11, 2, Element::Sand),
    CardDefinition::head(12, 2, Element::Sand),
    CardDefinition::head(13, 3, Element::Sand),
    CardDefinition::head(14, 3, Element::Sand),
    CardDefinition::part(15, 3, Element::Sand, BodyPartKind::Chest(ChestKind::Complete)),
    CardDefinition::part(16, 3, Element::Sand, BodyPartKind::Chest(ChestKind::Complete)),
    CardDefinition::part(17, 1, Element::Sand, BodyPartKind::Chest(ChestKind::Arms)),
    CardDefinition::part(18, 1, Element::Sand, BodyPartKind::Chest(ChestKind::Arms)),
    CardDefinition::part(19, 2, Element::Sand, BodyPartKind::Chest(ChestKind::ArmsLegs)),
    CardDefinition::part(20, 2, Element::Sand, BodyPartKind::Chest(ChestKind::ArmsLegs)),
    CardDefinition::part(21, 1, Element::Sand, BodyPartKind::LeftArm),
    CardDefinition::part(22, 1, Element::Sand, BodyPartKind::LeftArm),
    CardDefinition::part(23, 1, Element::Sand, BodyPartKind::LeftArm),
    CardDefinition::part(24, 1, Element::Sand, BodyPartKind::LeftArm),
    CardDefinition::part(25, 1, Element::Sand, BodyPartKind::RightArm),
    CardDefinition::part(26, 1, Element::Sand, BodyPartKind::RightArm),
    CardDefinition::part(27, 1, Element::Sand, BodyPartKind::RightArm),
    CardDefinition::part(28, 1, Element::Sand, BodyPartKind::RightArm),
    CardDefinition::part(29, 2, Element::Sand, BodyPartKind::Legs),
    CardDefinition::part(30, 2, Element::Sand, BodyPartKind::Legs),
    CardDefinition::part(31, 2, Element::Sand, BodyPartKind::Legs),
    CardDefinition::part(32, 2, Element::Sand, BodyPartKind::Legs),
    // Water
    CardDefinition::arch(33, 1, Element::Water),
    CardDefinition::arch(34, 1, Element::Water),
    CardDefinition::arch(35, 2, Element::Water),
    CardDefinition::arch(36, 2, Element::Water),
    CardDefinition::arch(37, 3, Element::Water),
    CardDefinition::arch(38, 3, Element::Water),
    CardDefinition::arch(39, 4, Element::Water),
    CardDefinition::arch(40, 5, Element::Water),
    CardDefinition::head(41, 1, Element::Water),
    CardDefinition::head(42, 1, Element::Water),
    CardDefinition::head(43, 2, Element::Water),
    CardDefinition::head(44, 2, Element::Water),
    CardDefinition::head(45, 3, Element::Water),
    CardDefinition::head(46, 3, Element::Water),
    CardDefinition::part(47, 3, Element::Water, BodyPartKind::Chest(ChestKind::Complete)),
    CardDefinition::part(48, 3, Element::Water, BodyPartKind::Chest(ChestKind::Complete)),
    CardDefinition::part(49, 1, Element::Water, BodyPartKind::Chest(ChestKind::Arms)),
    CardDefinition::part(50, 1, Element::Water, BodyPartKind::Chest(ChestKind::Arms)),
    CardDefinition::part(51, 2, Element::Water, BodyPartKind::Chest(ChestKind::ArmsLegs)),
    CardDefinition::part(52, 2, Element::Water, BodyPartKind::Chest(ChestKind::ArmsLegs)),
    CardDefinition::part(53, 1, Element::Water, BodyPartKind::LeftArm),
    CardDefinition::part(54, 1, Element::Water, BodyPartKind::LeftArm),
    CardDefinition::part(55, 1, Element::Water, BodyPartKind::LeftArm),
    CardDefinition::part(56, 1, Element::Water, BodyPartKind::LeftArm),
    CardDefinition::part(57, 1, Element::Water, BodyPartKind::RightArm),
    CardDefinition::part(58, 1, Element::Water, BodyPartKind::RightArm),
    CardDefinition::part(59, 1, Element::Water, BodyPartKind::RightArm),
    CardDefinition::part(60, 1, Element::Water, BodyPartKind::RightArm),
    CardDefinition::part(61, 2, Element::Water, BodyPartKind::Legs),
    CardDefinition::part(62, 2, Element::Water, BodyPartKind::Legs),
    CardDefinition::part(63, 2, Element::Water, BodyPartKind::Legs),
    CardDefinition::part(64, 2, Element::Water, BodyPartKind::Legs),
    // Wind
    CardDefinition::arch(65, 1, Element::Wind),
    CardDefinition::arch(66, 1, Element::Wind),
    CardDefinition::arch(67, 2, Element::Wind),
    CardDefinition::arch(68, 2, Element::Wind),
    CardDefinition::arch(69, 3, Element::Wind),
    CardDefinition::arch(70, 3, Element::Wind),
    CardDefinition::arch(71, 4, Element::Wind),
    CardDefinition::arch(72, 5, Element::Wind),
    CardDefinition::head(73, 1, Element::Wind),
    CardDefinition::head(74, 1, Element::Wind),
    CardDefinition::head(75, 2, Element::Wind),
    CardDefinition::head(76, 2, Element::Wind),
    CardDefinition::head(77, 3, Element::Wind),
    CardDefinition::head(78, 3, Element::Wind),
    CardDefinition::part(79, 3, Element::Wind, BodyPartKind::Chest(ChestKind::Complete)),
    CardDefinition::part(80, 3, Element::Wind, BodyPartKind::Chest(ChestKind::Complete)),
    CardDefinition::part(81, 1, Element::Wind, BodyPartKind::Chest(ChestKind::Arms)),
    CardDefinition::part(82, 1, Element::Wind, BodyPartKind::Chest(ChestKind::Arms)),
    CardDefinition::part(83, 2, Element::Wind, BodyPartKind::Chest(ChestKind::ArmsLegs)),
    CardDefinition::part(84, 2, Element::Wind, BodyPartKind::Chest(ChestKind::ArmsLegs)),
    CardDefinition::part(85, 1, Element::Wind, BodyPartKind::LeftArm),
    CardDefinition::part(86, 1, Element::Wind, BodyPartKind::LeftArm),
    CardDefinition::part(87, 1, Element::Wind, BodyPartKind::LeftArm),
    CardDefinition::part(88, 1, Element::Wind, BodyPartKind::LeftArm),
    CardDefinition::part(89, 1, Element::Wind, BodyPartKind::RightArm),
    CardDefinition::part(90, 1, Element::Wind, BodyPartKind::RightArm),
    CardDefinition::part(91, 1, Element::Wind, BodyPartKind::RightArm),
    CardDefinition::part(92, 1, Element::Wind, BodyPartKind::RightArm),
    CardDefinition::part(93, 2, Element::Wind, BodyPartKind::Legs),
    CardDefinition::part(94, 2, Element::Wind, BodyPartKind::Legs),
    CardDefinition::part(95, 2, Element::Wind, BodyPartKind::Legs),
    CardDefinition::part(96, 2, Element::Wind, BodyPartKind::Legs),
];

/// The whole catalog, ordered by id.
pub fn catalog() -> &'static [CardDefinition] {
    &CATALOG
}

/// Every catalog id, ordered.
pub fn all_ids() -> Vec<CardId> {
    CATALOG.iter().map(|def| def.id).collect()
}

/// Look up a definition by id.
pub fn definition_for(id: CardId) -> Option<&'static CardDefinition> {
    let index = (id.raw() as usize).checked_sub(1)?;
    CATALOG.get(index).filter(|def| def.id == id)
}

/// Build a runtime card from a catalog id. Unknown ids yield `None`.
pub fn instantiate(id: CardId) -> Option<CardInstance> {
    definition_for(id).map(CardInstance::from)
}
