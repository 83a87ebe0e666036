//! Ordered, never-empty collection of text items.

use crate::error::ItemsError;
use crate::models::{ItemId, TextItem};

/// The user's text inputs, in submission order.
///
/// There is always at least one item; removing the last one is rejected.
/// Ids are unique within the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextItems {
    items: Vec<TextItem>,
}

impl Default for TextItems {
    fn default() -> Self {
        Self::new()
    }
}

impl TextItems {
    /// Starts with a single empty item.
    pub fn new() -> Self {
        Self {
            items: vec![TextItem::new("")],
        }
    }

    /// Builds a collection from existing items; an empty list yields one
    /// empty item.
    pub fn from_items(items: Vec<TextItem>) -> Result<Self, ItemsError> {
        if items.is_empty() {
            return Ok(Self::new());
        }

        let mut collection = Self {
            items: Vec::with_capacity(items.len()),
        };
        for item in items {
            collection.push(item)?;
        }
        Ok(collection)
    }

    /// Appends an item with a fresh id and returns that id.
    #[allow(dead_code)] // Item editing API for interactive front ends
    pub fn add(&mut self, content: impl Into<String>) -> ItemId {
        let item = TextItem::new(content);
        let id = item.id.clone();
        self.items.push(item);
        id
    }

    /// Appends a prepared item, rejecting an id that is already present.
    pub fn push(&mut self, item: TextItem) -> Result<(), ItemsError> {
        if self.position(&item.id).is_some() {
            return Err(ItemsError::DuplicateId(item.id));
        }
        self.items.push(item);
        Ok(())
    }

    /// Replaces the content of the item with `id`.
    #[allow(dead_code)] // Item editing API for interactive front ends
    pub fn set_content(
        &mut self,
        id: &ItemId,
        content: impl Into<String>,
    ) -> Result<(), ItemsError> {
        let item = self
            .items
            .iter_mut()
            .find(|i| &i.id == id)
            .ok_or_else(|| ItemsError::NotFound(id.clone()))?;
        item.content = content.into();
        Ok(())
    }

    /// Removes the item with `id`, unless it is the only one left.
    #[allow(dead_code)] // Item editing API for interactive front ends
    pub fn remove(&mut self, id: &ItemId) -> Result<TextItem, ItemsError> {
        let pos = self
            .position(id)
            .ok_or_else(|| ItemsError::NotFound(id.clone()))?;
        if self.items.len() == 1 {
            return Err(ItemsError::LastItem);
        }
        Ok(self.items.remove(pos))
    }

    pub fn position(&self, id: &ItemId) -> Option<usize> {
        self.items.iter().position(|i| &i.id == id)
    }

    #[allow(dead_code)] // Item editing API for interactive front ends
    pub fn iter(&self) -> impl Iterator<Item = &TextItem> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[TextItem] {
        &self.items
    }

    #[allow(dead_code)] // Item editing API for interactive front ends
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always false; kept for parity with `len`.
    #[allow(dead_code)] // Item editing API for interactive front ends
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether removal is currently allowed.
    #[allow(dead_code)] // Item editing API for interactive front ends
    pub fn can_remove(&self) -> bool {
        self.items.len() > 1
    }
}
