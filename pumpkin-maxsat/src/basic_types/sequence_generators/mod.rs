mod luby_sequence;

pub(crate) use luby_sequence::LubySequence;

/// A generator of an infinite integer sequence; used to space out restarts.
pub(crate) trait SequenceGenerator {
    fn next(&mut self) -> u64;
}
