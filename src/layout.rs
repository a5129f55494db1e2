//! Fixed polar positions for every individual.
//!
//! Individuals are laid out on a golden-angle (Vogel) spiral filling the unit disk. Positions
//! carry no health information; they only give each index a stable place for a renderer to draw.

use std::f64::consts::PI;

use serde::Serialize;

use crate::PersonIndex;

/// A polar coordinate in the unit disk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub theta: f64,
    pub r: f64,
}

/// The immutable sequence of positions for a population, indexed by [`PersonIndex`].
#[derive(Debug, Clone)]
pub struct PopulationLayout {
    positions: Vec<Position>,
}

impl PopulationLayout {
    /// Lays out `n` individuals. Index `i` is placed at
    /// `theta = pi * (1 + sqrt(5)) * (i + 0.5)` and `r = sqrt((i + 0.5) / n)`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn generate(n: usize) -> Self {
        let golden_turn = PI * (1.0 + 5f64.sqrt());
        let positions = (0..n)
            .map(|i| {
                let offset = i as f64 + 0.5;
                Position {
                    theta: golden_turn * offset,
                    r: (offset / n as f64).sqrt(),
                }
            })
            .collect();
        PopulationLayout { positions }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// # Panics
    ///
    /// Panics if `index` is not in the population.
    #[must_use]
    pub fn position(&self, index: PersonIndex) -> Position {
        self.positions[index]
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Position> {
        self.positions.iter()
    }
}
