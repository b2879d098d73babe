//! A max-heap over the keys `0..n` which supports changing the value of a key and temporarily
//! removing keys. It backs the activity-based variable selection of the clausal engine: assigned
//! variables are removed from the heap and restored on backtracking, keeping their activity.
use std::ops::AddAssign;
use std::ops::DivAssign;

use super::KeyedVec;
use super::StorageKey;
use crate::pumpkin_assert_moderate;

#[derive(Debug, Clone)]
pub struct KeyValueHeap<Key, Value> {
    /// The values laid out as a binary heap; only `values[..end_position]` form the heap, the
    /// remainder holds the values of removed keys.
    values: Vec<Value>,
    /// The position in `values` of every key.
    position_of_key: KeyedVec<Key, usize>,
    /// The key stored at every position of `values`.
    key_at_position: Vec<Key>,
    end_position: usize,
}

impl<Key: StorageKey, Value> Default for KeyValueHeap<Key, Value> {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            position_of_key: KeyedVec::default(),
            key_at_position: Vec::new(),
            end_position: 0,
        }
    }
}

impl<Key, Value> KeyValueHeap<Key, Value>
where
    Key: StorageKey + Copy,
    Value: AddAssign<Value> + DivAssign<Value> + PartialOrd + Default + Copy,
{
    /// The key with the largest value, without removing it.
    pub fn peek_max(&self) -> Option<Key> {
        (self.end_position > 0).then(|| self.key_at_position[0])
    }

    /// Removes and returns the key with the largest value.
    pub fn pop_max(&mut self) -> Option<Key> {
        let best_key = self.peek_max()?;
        self.delete_key(best_key);
        Some(best_key)
    }

    pub fn get_value(&self, key: Key) -> Value {
        self.values[self.position_of_key[key]]
    }

    /// Adds `increment` to the value of `key`; this is allowed for removed keys as well.
    pub fn increment(&mut self, key: Key, increment: Value) {
        let position = self.position_of_key[key];
        self.values[position] += increment;
        if self.is_key_present(key) {
            self.sift_up(position);
        }
    }

    /// Puts a removed key back in the heap with the value it had when it was removed.
    pub fn restore_key(&mut self, key: Key) {
        if self.is_key_present(key) {
            return;
        }
        let position = self.position_of_key[key];
        pumpkin_assert_moderate!(position >= self.end_position);
        self.swap_positions(position, self.end_position);
        self.end_position += 1;
        self.sift_up(self.end_position - 1);
    }

    /// Temporarily removes `key` from the heap, its value is retained.
    pub fn delete_key(&mut self, key: Key) {
        if !self.is_key_present(key) {
            return;
        }
        let position = self.position_of_key[key];
        self.end_position -= 1;
        self.swap_positions(position, self.end_position);
        if position < self.end_position {
            self.sift_down(position);
        }
    }

    pub fn is_key_present(&self, key: Key) -> bool {
        key.index() < self.position_of_key.len() && self.position_of_key[key] < self.end_position
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.end_position == 0
    }

    /// Adds a new key to the heap; keys have to be added in the order `0, 1, 2, ...`.
    pub fn grow(&mut self, key: Key, value: Value) {
        pumpkin_assert_moderate!(key.index() == self.values.len());
        let last_position = self.values.len();
        self.values.push(value);
        self.key_at_position.push(key);
        let _ = self.position_of_key.push(last_position);

        self.swap_positions(self.end_position, last_position);
        self.end_position += 1;
        self.sift_up(self.end_position - 1);
    }

    /// Divides every value, including the ones of removed keys, by `divisor`.
    pub fn divide_values(&mut self, divisor: Value) {
        self.values.iter_mut().for_each(|value| *value /= divisor);
    }

    fn swap_positions(&mut self, a: usize, b: usize) {
        let key_a = self.key_at_position[a];
        let key_b = self.key_at_position[b];
        self.values.swap(a, b);
        self.key_at_position.swap(a, b);
        self.position_of_key.swap(key_a, key_b);
    }

    fn sift_up(&mut self, mut position: usize) {
        while position > 0 {
            let parent = (position - 1) / 2;
            if self.values[parent] >= self.values[position] {
                break;
            }
            self.swap_positions(parent, position);
            position = parent;
        }
    }

    fn sift_down(&mut self, mut position: usize) {
        loop {
            let left = 2 * position + 1;
            if left >= self.end_position {
                break;
            }
            let right = left + 1;
            let largest_child = if right < self.end_position && self.values[right] > self.values[left]
            {
                right
            } else {
                left
            };
            if self.values[position] >= self.values[largest_child] {
                break;
            }
            self.swap_positions(position, largest_child);
            position = largest_child;
        }
    }
}
