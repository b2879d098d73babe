use std::fmt::Display;
use std::fmt::Formatter;

use itertools::Itertools;

use crate::basic_types::Literal;
use crate::basic_types::PropositionalVariable;
use crate::engine::Model;
use crate::pumpkin_assert_simple;

/// An optimal assignment of the variables of the input formula together with its cost.
///
/// Auxiliary variables of the search are not part of the solution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaxSatSolution {
    cost: u64,
    values: Vec<bool>,
}

impl MaxSatSolution {
    /// Restricts `model` to the variables `1..=num_original_variables`.
    pub fn new(cost: u64, model: &Model, num_original_variables: u32) -> MaxSatSolution {
        pumpkin_assert_simple!(
            num_original_variables == 0
                || model.contains(PropositionalVariable::new(num_original_variables)),
            "The model has to cover every original variable."
        );

        let values = (1..=num_original_variables)
            .map(|index| {
                model
                    .get_variable_value(PropositionalVariable::new(index))
                    .unwrap_or(false)
            })
            .collect();
        MaxSatSolution { cost, values }
    }

    pub fn cost(&self) -> u64 {
        self.cost
    }

    pub fn num_variables(&self) -> u32 {
        self.values.len() as u32
    }

    /// The value of a variable of the input formula.
    pub fn value(&self, variable: PropositionalVariable) -> bool {
        let index = variable.get_index() as usize;
        pumpkin_assert_simple!((1..=self.values.len()).contains(&index));
        self.values[index - 1]
    }

    /// The true literal of every variable, in increasing order of the variables.
    pub fn literals(&self) -> impl Iterator<Item = Literal> + '_ {
        self.values.iter().enumerate().map(|(index, &value)| {
            Literal::new(PropositionalVariable::new(index as u32 + 1), value)
        })
    }

    /// The `o` and `v` lines which report this solution.
    pub fn lines(&self, terminate_with_zero: bool) -> SolutionLines<'_> {
        SolutionLines {
            solution: self,
            terminate_with_zero,
        }
    }
}

/// Formats a [`MaxSatSolution`] as
/// ```text
/// o <cost>
/// v <signed literal per variable>
/// ```
/// where the `v` line optionally ends with `0`.
#[derive(Debug, Clone, Copy)]
pub struct SolutionLines<'a> {
    solution: &'a MaxSatSolution,
    terminate_with_zero: bool,
}

impl Display for SolutionLines<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "o {}", self.solution.cost)?;

        let mut literals = self.solution.literals().map(Literal::to_dimacs);
        if self.terminate_with_zero {
            write!(f, "v {}", literals.chain(std::iter::once(0)).join(" "))
        } else {
            write!(f, "v {}", literals.join(" "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::MaxSatSolution;
    use crate::basic_types::PropositionalVariable;
    use crate::engine::Model;

    fn solution() -> MaxSatSolution {
        // Variable 0 and the auxiliary variable 4 are not reported.
        let model = Model::new([true, true, false, true, false]);
        MaxSatSolution::new(7, &model, 3)
    }

    #[test]
    fn only_the_original_variables_are_reported() {
        let solution = solution();

        assert_eq!(solution.num_variables(), 3);
        assert!(solution.value(PropositionalVariable::new(1)));
        assert!(!solution.value(PropositionalVariable::new(2)));
        assert!(solution.value(PropositionalVariable::new(3)));
    }

    #[test]
    fn lines_without_trailing_zero() {
        assert_eq!(solution().lines(false).to_string(), "o 7\nv 1 -2 3");
    }

    #[test]
    fn lines_with_trailing_zero() {
        assert_eq!(solution().lines(true).to_string(), "o 7\nv 1 -2 3 0");
    }

    #[test]
    fn formula_without_variables_has_an_empty_value_line() {
        let solution = MaxSatSolution::new(0, &Model::new([true]), 0);

        assert_eq!(solution.lines(false).to_string(), "o 0\nv ");
    }
}
