//! Central Board
//!
//! Shared piles of Arch cards, one army per element.

use serde::{Deserialize, Serialize};

use crate::game::card::{CardInstance, Element};

/// The three elemental Arch armies of a match.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CentralBoard {
    armies: [Vec<CardInstance>; 3],
}

impl CentralBoard {
    /// Empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an Arch card to the army of its element.
    pub fn add_arch(&mut self, card: CardInstance) {
        self.armies[card.element.index()].push(card);
    }

    /// Cards in one army.
    pub fn army(&self, element: Element) -> &[CardInstance] {
        &self.armies[element.index()]
    }

    /// Combined power of one army.
    pub fn army_power(&self, element: Element) -> u32 {
        self.army(element).iter().map(|c| c.power as u32).sum()
    }

    /// Remove and return every card of one army.
    pub fn take_army(&mut self, element: Element) -> Vec<CardInstance> {
        std::mem::take(&mut self.armies[element.index()])
    }

    /// Total Arch cards on the board.
    pub fn card_count(&self) -> usize {
        self.armies.iter().map(Vec::len).sum()
    }

    /// Drop all armies (used when a session is re-initialized).
    pub fn clear(&mut self) {
        for army in &mut self.armies {
            army.clear();
        }
    }

    /// Read-only copy keyed by element.
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            sand: self.army(Element::Sand).to_vec(),
            water: self.army(Element::Water).to_vec(),
            wind: self.army(Element::Wind).to_vec(),
        }
    }
}

/// Serializable view of the board.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    /// Sand army
    pub sand: Vec<CardInstance>,
    /// Water army
    pub water: Vec<CardInstance>,
    /// Wind army
    pub wind: Vec<CardInstance>,
}

impl BoardSnapshot {
    /// Cards in one army.
    pub fn army(&self, element: Element) -> &[CardInstance] {
        match element {
            Element::Sand => &self.sand,
            Element::Water => &self.water,
            Element::Wind => &self.wind,
        }
    }
}
