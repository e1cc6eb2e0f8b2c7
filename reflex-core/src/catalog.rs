use crate::error::Error;
use crate::stimulus::{StimulusId, StimulusItem};
use serde::{Deserialize, Serialize};

/// Ordered collection of stimulus items. Insertion order is preserved
/// and used as the tie-breaker when items are ranked.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StimulusCatalog {
    items: Vec<StimulusItem>,
}

impl StimulusCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new item with an empty measurement history.
    pub fn add(&mut self, item: StimulusItem) -> Result<(), Error> {
        if item.source.is_empty() {
            return Err(Error::Validation(
                "stimulus source must not be empty".into(),
            ));
        }
        if self.items.iter().any(|existing| existing.id == item.id) {
            return Err(Error::Validation(format!(
                "duplicate stimulus id {}",
                item.id
            )));
        }
        self.items.push(item);
        Ok(())
    }

    /// Removes an item. Trial records already logged against it stay
    /// in the session log untouched.
    pub fn remove(&mut self, id: &StimulusId) -> Result<StimulusItem, Error> {
        match self.items.iter().position(|item| &item.id == id) {
            Some(index) => Ok(self.items.remove(index)),
            None => Err(Error::NotFound(id.clone())),
        }
    }

    /// Appends a reaction time to the item's own history. Fails with
    /// NotFound when the id was removed mid-session; the caller then
    /// discards the trial.
    pub fn record_reaction(&mut self, id: &StimulusId, ms: u64) -> Result<(), Error> {
        self.items
            .iter_mut()
            .find(|item| &item.id == id)
            .ok_or_else(|| Error::NotFound(id.clone()))?
            .push_reaction(ms);
        Ok(())
    }

    /// Rounded mean of the item's history, 0 when the history is empty.
    pub fn average_reaction_ms(&self, id: &StimulusId) -> Result<u64, Error> {
        self.get(id)
            .map(StimulusItem::average_reaction_ms)
            .ok_or_else(|| Error::NotFound(id.clone()))
    }

    pub fn get(&self, id: &StimulusId) -> Option<&StimulusItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    pub fn items(&self) -> &[StimulusItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
