//! Attribute set - the five character attributes equipment can modify

use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// One of the five named attributes
#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Health,
    Armor,
    Damage,
    Strength,
    Luck,
}

/// Effective attribute totals.
///
/// Values are signed and unclamped: an item may carry a penalty, and the sum
/// of several penalties may go negative. Combination is plain field-wise
/// addition, so totals never depend on the order items were equipped in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSet {
    pub health: i32,
    pub armor: i32,
    pub damage: i32,
    pub strength: i32,
    pub luck: i32,
}

impl AttributeSet {
    pub fn zero() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn get(&self, attribute: Attribute) -> i32 {
        match attribute {
            Attribute::Health => self.health,
            Attribute::Armor => self.armor,
            Attribute::Damage => self.damage,
            Attribute::Strength => self.strength,
            Attribute::Luck => self.luck,
        }
    }

    #[cfg(test)]
    pub fn with(mut self, attribute: Attribute, value: i32) -> Self {
        match attribute {
            Attribute::Health => self.health = value,
            Attribute::Armor => self.armor = value,
            Attribute::Damage => self.damage = value,
            Attribute::Strength => self.strength = value,
            Attribute::Luck => self.luck = value,
        }
        self
    }

    #[cfg(test)]
    pub fn is_zero(&self) -> bool {
        *self == Self::zero()
    }
}

impl Add for AttributeSet {
    type Output = AttributeSet;

    fn add(self, rhs: AttributeSet) -> AttributeSet {
        AttributeSet {
            health: self.health + rhs.health,
            armor: self.armor + rhs.armor,
            damage: self.damage + rhs.damage,
            strength: self.strength + rhs.strength,
            luck: self.luck + rhs.luck,
        }
    }
}

impl AddAssign for AttributeSet {
    fn add_assign(&mut self, rhs: AttributeSet) {
        *self = *self + rhs;
    }
}

impl Sum for AttributeSet {
    fn sum<I: Iterator<Item = AttributeSet>>(iter: I) -> Self {
        iter.fold(AttributeSet::zero(), Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addition_is_field_wise() {
        let a = AttributeSet::zero()
            .with(Attribute::Health, 3)
            .with(Attribute::Luck, -1);
        let b = AttributeSet::zero()
            .with(Attribute::Health, 2)
            .with(Attribute::Damage, 4);

        let total = a + b;
        assert_eq!(total.health, 5);
        assert_eq!(total.damage, 4);
        assert_eq!(total.luck, -1);
        assert_eq!(total.armor, 0);
    }

    #[test]
    fn test_sum_of_nothing_is_zero() {
        let total: AttributeSet = Vec::<AttributeSet>::new().into_iter().sum();
        assert!(total.is_zero());
    }
}
