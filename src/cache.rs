//! Compute-once-per-sentence memo table.

use once_cell::unsync::OnceCell;

use crate::error::{Error, Result};

/// One lazily filled slot per sentence index. A slot is written at most
/// once and read-only afterwards.
#[derive(Debug)]
pub struct SentenceCache<T> {
    slots: Vec<OnceCell<T>>,
}

impl<T> SentenceCache<T> {
    pub fn new(sentences: usize) -> SentenceCache<T> {
        SentenceCache {
            slots: (0..sentences).map(|_| OnceCell::new()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_populated(&self, sentence: usize) -> bool {
        self.slots.get(sentence).map_or(false, |s| s.get().is_some())
    }

    pub fn get_or_try_init<F>(&self, sentence: usize, init: F) -> Result<&T>
    where
        F: FnOnce() -> Result<T>,
    {
        let slot = self.slots.get(sentence).ok_or(Error::SentenceIndex {
            index: sentence,
            sentences: self.slots.len(),
        })?;
        slot.get_or_try_init(init)
    }
}
