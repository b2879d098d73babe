//! Index-keyed containers shared by the clausal engine and the encoders.
mod key_value_heap;
mod keyed_vec;

pub use key_value_heap::KeyValueHeap;
pub use keyed_vec::KeyedVec;
pub use keyed_vec::StorageKey;
