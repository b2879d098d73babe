use super::SequenceGenerator;

/// The Luby sequence `1, 1, 2, 1, 1, 2, 4, 1, 1, 2, ...` scaled by a base value.
///
/// Each element is computed in constant time with Knuth's "reluctant doubling".
#[derive(Debug, Copy, Clone)]
pub(crate) struct LubySequence {
    u: i64,
    v: i64,
    base_value: u64,
}

impl LubySequence {
    pub(crate) fn new(base_value: u64) -> LubySequence {
        LubySequence {
            u: 1,
            v: 1,
            base_value,
        }
    }
}

impl SequenceGenerator for LubySequence {
    fn next(&mut self) -> u64 {
        let next_value = self.v as u64;
        if (self.u & (-self.u)) == self.v {
            self.u += 1;
            self.v = 1;
        } else {
            self.v *= 2;
        }
        next_value * self.base_value
    }
}

#[cfg(test)]
mod tests {
    use super::LubySequence;
    use crate::basic_types::sequence_generators::SequenceGenerator;

    fn luby(i: u64) -> u64 {
        let k = (i + 1).ilog2();
        if (i + 1).is_power_of_two() {
            1 << (k - 1)
        } else {
            luby(i + 1 - (1 << k))
        }
    }

    #[test]
    fn first_elements_match_the_definition() {
        let mut luby_sequence = LubySequence::new(1);
        let prefix = (0..15).map(|_| luby_sequence.next()).collect::<Vec<_>>();
        assert_eq!(prefix, vec![1, 1, 2, 1, 1, 2, 4, 1, 1, 2, 1, 1, 2, 4, 8]);
    }

    #[test]
    fn scaled_sequence_matches_recursive_definition() {
        let mut luby_sequence = LubySequence::new(50);
        for i in 1..10_000 {
            assert_eq!(luby_sequence.next(), luby(i) * 50);
        }
    }
}
