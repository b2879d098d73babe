use std::num::NonZeroI32;

use super::PropositionalVariable;
use crate::containers::StorageKey;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal {
    code: u32,
}

impl Literal {
    pub fn new(propositional_variable: PropositionalVariable, is_positive: bool) -> Literal {
        Literal {
            code: propositional_variable.get_index() * 2 + (is_positive as u32),
        }
    }

    /// Converts a signed DIMACS literal into a [`Literal`]; the variable index is kept as is.
    pub fn from_dimacs(dimacs_literal: NonZeroI32) -> Literal {
        Literal::new(
            PropositionalVariable::new(dimacs_literal.unsigned_abs().get()),
            dimacs_literal.is_positive(),
        )
    }

    /// The signed DIMACS representation of this literal.
    pub fn to_dimacs(self) -> i64 {
        let index = self.get_propositional_variable().get_index() as i64;
        if self.is_positive() {
            index
        } else {
            -index
        }
    }

    pub fn is_positive(&self) -> bool {
        (self.code & 1) == 1
    }

    pub fn is_negative(&self) -> bool {
        !self.is_positive()
    }

    pub fn get_propositional_variable(&self) -> PropositionalVariable {
        PropositionalVariable::new(self.code / 2)
    }

    pub fn to_u32(self) -> u32 {
        self.code
    }
}

impl std::ops::Not for Literal {
    type Output = Literal;

    fn not(self) -> Literal {
        Literal {
            code: self.code ^ 1,
        }
    }
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_negative() {
            write!(f, "~{}", self.get_propositional_variable())
        } else {
            write!(f, "{}", self.get_propositional_variable())
        }
    }
}

impl StorageKey for Literal {
    fn index(&self) -> usize {
        self.code as usize
    }

    fn create_from_index(index: usize) -> Self {
        Literal { code: index as u32 }
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroI32;

    use super::Literal;

    #[test]
    fn dimacs_literals_keep_their_index_and_sign() {
        for dimacs in [1, -1, 7, -12] {
            let literal = Literal::from_dimacs(NonZeroI32::new(dimacs).unwrap());
            assert_eq!(literal.to_dimacs(), dimacs as i64);
            assert_eq!(
                literal.get_propositional_variable().get_index(),
                dimacs.unsigned_abs()
            );
        }
    }

    #[test]
    fn negation_flips_only_the_polarity() {
        let literal = Literal::from_dimacs(NonZeroI32::new(-4).unwrap());
        assert_eq!((!literal).to_dimacs(), 4);
        assert_eq!(!!literal, literal);
    }
}
