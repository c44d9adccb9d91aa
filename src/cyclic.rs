//! Ordered container with a wraparound cursor.
//!
//! The cursor is defined whenever the list is non-empty. Removing the element
//! under the cursor moves it to the former successor (wrapping to the front),
//! or leaves it undefined when the list becomes empty.
use crate::error::{RoiError, RoiResult};

#[derive(Clone, Debug)]
pub struct CyclicList<T> {
    items: Vec<T>,
    cursor: Option<usize>,
}

impl<T> Default for CyclicList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            cursor: None,
        }
    }
}

impl<T: PartialEq> CyclicList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push to the back. The first element appended becomes current.
    pub fn append(&mut self, item: T) {
        self.items.push(item);
        if self.cursor.is_none() {
            self.cursor = Some(0);
        }
    }

    pub fn remove(&mut self, item: &T) -> RoiResult<T> {
        let idx = self.position(item).ok_or(RoiError::NotFound)?;
        let removed = self.items.remove(idx);
        self.cursor = match self.cursor {
            _ if self.items.is_empty() => None,
            Some(c) if idx < c => Some(c - 1),
            Some(c) if idx == c => Some(c % self.items.len()),
            other => other,
        };
        Ok(removed)
    }

    pub fn next(&mut self) -> RoiResult<&T> {
        self.step(1)
    }

    pub fn prev(&mut self) -> RoiResult<&T> {
        let n = self.items.len();
        self.step(n.saturating_sub(1))
    }

    fn step(&mut self, offset: usize) -> RoiResult<&T> {
        let n = self.items.len();
        let c = self.cursor.ok_or(RoiError::Empty)?;
        let next = (c + offset) % n;
        self.cursor = Some(next);
        Ok(&self.items[next])
    }

    /// Current element, `None` when empty.
    pub fn cur(&self) -> Option<&T> {
        self.cursor.map(|c| &self.items[c])
    }

    /// Move the cursor onto `item`.
    pub fn seek(&mut self, item: &T) -> RoiResult<()> {
        let idx = self.position(item).ok_or(RoiError::NotFound)?;
        self.cursor = Some(idx);
        Ok(())
    }

    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }

    pub fn position(&self, item: &T) -> Option<usize> {
        self.items.iter().position(|x| x == item)
    }

    pub fn get(&self, idx: usize) -> Option<&T> {
        self.items.get(idx)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<'a, T> IntoIterator for &'a CyclicList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
