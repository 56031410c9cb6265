//! Rectangle shape
//!
//! A shape has a position on the plane and can be translated; a rectangle
//! adds two strictly positive dimensions (`longueur`, `largeur`) and derives
//! its surface and perimeter from them.

use crate::core::ContractError;
use crate::registry::entity::ManagedEntity;
use serde::{Deserialize, Serialize};

/// Common behaviour of positioned shapes
pub trait Shape {
    fn surface(&self) -> u128;
    fn perimeter(&self) -> u128;
    fn position(&self) -> (i64, i64);

    /// Move the shape by the given offsets
    fn translate(&mut self, dx: i64, dy: i64) -> Result<(), ContractError>;
}

/// Creation arguments for a rectangle
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RectangleInit {
    pub longueur: u64,
    pub largeur: u64,
    #[serde(default)]
    pub x: i64,
    #[serde(default)]
    pub y: i64,
}

impl RectangleInit {
    /// Rectangle at the origin
    pub fn new(longueur: u64, largeur: u64) -> Self {
        Self {
            longueur,
            largeur,
            x: 0,
            y: 0,
        }
    }
}

/// Mutations a rectangle accepts
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RectangleChange {
    Resize { longueur: u64, largeur: u64 },
    Move { dx: i64, dy: i64 },
}

/// Everything queryable about a rectangle, in one value
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RectangleSnapshot {
    pub longueur: u64,
    pub largeur: u64,
    #[serde(with = "crate::core::decimal")]
    pub surface: u128,
    #[serde(with = "crate::core::decimal")]
    pub perimeter: u128,
    pub x: i64,
    pub y: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Rectangle {
    longueur: u64,
    largeur: u64,
    x: i64,
    y: i64,
}

impl Rectangle {
    pub fn longueur(&self) -> u64 {
        self.longueur
    }

    pub fn largeur(&self) -> u64 {
        self.largeur
    }

    fn check_dimensions(longueur: u64, largeur: u64) -> Result<(), ContractError> {
        if longueur == 0 || largeur == 0 {
            return Err(ContractError::InvalidArgument(format!(
                "rectangle dimensions must be strictly positive, got {}x{}",
                longueur, largeur
            )));
        }
        Ok(())
    }
}

impl Shape for Rectangle {
    fn surface(&self) -> u128 {
        self.longueur as u128 * self.largeur as u128
    }

    fn perimeter(&self) -> u128 {
        2 * (self.longueur as u128 + self.largeur as u128)
    }

    fn position(&self) -> (i64, i64) {
        (self.x, self.y)
    }

    fn translate(&mut self, dx: i64, dy: i64) -> Result<(), ContractError> {
        let x = self.x.checked_add(dx);
        let y = self.y.checked_add(dy);

        match (x, y) {
            (Some(x), Some(y)) => {
                self.x = x;
                self.y = y;
                Ok(())
            }
            _ => Err(ContractError::InvalidArgument(format!(
                "moving by ({}, {}) overflows the plane",
                dx, dy
            ))),
        }
    }
}

impl ManagedEntity for Rectangle {
    type Init = RectangleInit;
    type Change = RectangleChange;
    type Snapshot = RectangleSnapshot;

    fn create(init: RectangleInit) -> Result<Self, ContractError> {
        Self::check_dimensions(init.longueur, init.largeur)?;

        Ok(Self {
            longueur: init.longueur,
            largeur: init.largeur,
            x: init.x,
            y: init.y,
        })
    }

    fn apply(&mut self, change: RectangleChange) -> Result<(), ContractError> {
        match change {
            RectangleChange::Resize { longueur, largeur } => {
                Self::check_dimensions(longueur, largeur)?;
                self.longueur = longueur;
                self.largeur = largeur;
                Ok(())
            }
            RectangleChange::Move { dx, dy } => self.translate(dx, dy),
        }
    }

    fn validate(&self) -> Result<(), ContractError> {
        Self::check_dimensions(self.longueur, self.largeur)
    }

    fn snapshot(&self) -> RectangleSnapshot {
        let (x, y) = self.position();
        RectangleSnapshot {
            longueur: self.longueur,
            largeur: self.largeur,
            surface: self.surface(),
            perimeter: self.perimeter(),
            x,
            y,
        }
    }

    fn measure(&self) -> u128 {
        self.surface()
    }
}
