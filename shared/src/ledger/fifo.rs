//! Oldest-first consumption of physical lots
//!
//! A [`FifoPool`] is an explicitly ordered sequence of lots of one bean
//! type. Transfers pick whole lots off the front; roasting withdraws weight
//! from the front, emptying the oldest lots first.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::models::Bag;

/// A lot's identity, weight and age
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lot {
    pub id: Uuid,
    pub weight_kg: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<&Bag> for Lot {
    fn from(bag: &Bag) -> Self {
        Self {
            id: bag.id,
            weight_kg: bag.weight_kg,
            created_at: bag.created_at,
        }
    }
}

/// Weight taken from one lot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Deduction {
    pub lot_id: Uuid,
    pub before_kg: Decimal,
    pub taken_kg: Decimal,
    pub after_kg: Decimal,
}

impl Deduction {
    pub fn exhausts_lot(&self) -> bool {
        self.after_kg.is_zero()
    }
}

/// The pool cannot cover a withdrawal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortfall {
    pub requested_kg: Decimal,
    pub available_kg: Decimal,
}

/// Lots ordered oldest first
#[derive(Debug, Clone, Default)]
pub struct FifoPool {
    lots: Vec<Lot>,
    opening_kg: Vec<Decimal>,
}

impl FifoPool {
    /// Order `lots` by creation time; equal timestamps keep their given order
    pub fn new(mut lots: Vec<Lot>) -> Self {
        lots.sort_by_key(|l| l.created_at);
        let opening_kg = lots.iter().map(|l| l.weight_kg).collect();
        Self { lots, opening_kg }
    }

    pub fn from_bags<'a>(bags: impl IntoIterator<Item = &'a Bag>) -> Self {
        Self::new(bags.into_iter().map(Lot::from).collect())
    }

    pub fn lots(&self) -> &[Lot] {
        &self.lots
    }

    pub fn len(&self) -> usize {
        self.lots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }

    pub fn available_kg(&self) -> Decimal {
        self.lots.iter().map(|l| l.weight_kg).sum()
    }

    /// Ids of the `count` oldest lots, or the number available when short
    pub fn oldest(&self, count: usize) -> Result<Vec<Uuid>, usize> {
        if count > self.lots.len() {
            return Err(self.lots.len());
        }
        Ok(self.lots.iter().take(count).map(|l| l.id).collect())
    }

    /// Take `amount_kg` from the oldest lots.
    ///
    /// Either the whole amount is taken or the pool is left untouched. At
    /// most one lot is left partially consumed.
    pub fn withdraw(&mut self, amount_kg: Decimal) -> Result<Vec<Deduction>, Shortfall> {
        if amount_kg <= Decimal::ZERO {
            return Ok(Vec::new());
        }
        let available_kg = self.available_kg();
        if amount_kg > available_kg {
            return Err(Shortfall {
                requested_kg: amount_kg,
                available_kg,
            });
        }

        let mut remaining = amount_kg;
        let mut deductions = Vec::new();
        for lot in self.lots.iter_mut() {
            if remaining.is_zero() {
                break;
            }
            if lot.weight_kg <= Decimal::ZERO {
                continue;
            }
            let taken = lot.weight_kg.min(remaining);
            let before = lot.weight_kg;
            lot.weight_kg -= taken;
            remaining -= taken;
            deductions.push(Deduction {
                lot_id: lot.id,
                before_kg: before,
                taken_kg: taken,
                after_kg: lot.weight_kg,
            });
        }
        Ok(deductions)
    }

    /// Net change of every lot touched since the pool was built
    pub fn net_deductions(&self) -> Vec<Deduction> {
        self.lots
            .iter()
            .zip(&self.opening_kg)
            .filter(|(lot, opening)| lot.weight_kg != **opening)
            .map(|(lot, opening)| Deduction {
                lot_id: lot.id,
                before_kg: *opening,
                taken_kg: *opening - lot.weight_kg,
                after_kg: lot.weight_kg,
            })
            .collect()
    }
}

/// Plan a single withdrawal over lots without keeping the pool
pub fn plan_deduction(lots: &[Lot], amount_kg: Decimal) -> Result<Vec<Deduction>, Shortfall> {
    FifoPool::new(lots.to_vec()).withdraw(amount_kg)
}
