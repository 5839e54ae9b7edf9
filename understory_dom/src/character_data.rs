// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text and comment data editing.
//!
//! Offsets and counts are in Unicode scalar values. An offset past the end fails with
//! [`DomException::IndexSize`]; a count reaching past the end is clamped.

use alloc::string::String;

use understory_dispatch::kind::MutationEventKind;

use crate::document::Document;
use crate::error::DomException;
use crate::events::MutationEvent;
use crate::types::NodeId;

/// Byte index of the `offset`-th character, allowing one past the end.
fn byte_index(s: &str, offset: usize) -> Option<usize> {
    s.char_indices()
        .map(|(i, _)| i)
        .chain(core::iter::once(s.len()))
        .nth(offset)
}

/// Byte range covering `count` characters from `offset`.
fn byte_range(s: &str, offset: usize, count: usize) -> Result<(usize, usize), DomException> {
    let start = byte_index(s, offset).ok_or(DomException::IndexSize)?;
    let end = byte_index(s, offset.saturating_add(count)).unwrap_or(s.len());
    Ok((start, end))
}

impl Document {
    fn character_data(&self, id: NodeId) -> Result<&str, DomException> {
        self.kind(id)
            .ok_or(DomException::NotFound)?
            .character_data()
            .ok_or(DomException::InvalidNodeType)
    }

    /// Data of a text or comment node.
    pub fn data(&self, id: NodeId) -> Option<&str> {
        self.kind(id).and_then(|k| k.character_data())
    }

    /// Length of a text or comment node's data, in characters.
    pub fn length(&self, id: NodeId) -> Result<usize, DomException> {
        Ok(self.character_data(id)?.chars().count())
    }

    /// Up to `count` characters starting at `offset`.
    pub fn substring_data(
        &self,
        id: NodeId,
        offset: usize,
        count: usize,
    ) -> Result<String, DomException> {
        let data = self.character_data(id)?;
        let (start, end) = byte_range(data, offset, count)?;
        Ok(String::from(&data[start..end]))
    }

    /// Replace the whole data.
    pub fn set_data(&mut self, id: NodeId, data: impl Into<String>) -> Result<(), DomException> {
        let data = data.into();
        self.edit_data(id, move |s| {
            *s = data;
            Ok(())
        })
    }

    /// Append to the data.
    pub fn append_data(&mut self, id: NodeId, data: &str) -> Result<(), DomException> {
        self.edit_data(id, |s| {
            s.push_str(data);
            Ok(())
        })
    }

    /// Insert `data` before the character at `offset`.
    pub fn insert_data(&mut self, id: NodeId, offset: usize, data: &str) -> Result<(), DomException> {
        self.edit_data(id, |s| {
            let at = byte_index(s, offset).ok_or(DomException::IndexSize)?;
            s.insert_str(at, data);
            Ok(())
        })
    }

    /// Delete up to `count` characters starting at `offset`.
    pub fn delete_data(
        &mut self,
        id: NodeId,
        offset: usize,
        count: usize,
    ) -> Result<(), DomException> {
        self.edit_data(id, |s| {
            let (start, end) = byte_range(s, offset, count)?;
            s.replace_range(start..end, "");
            Ok(())
        })
    }

    /// Replace up to `count` characters starting at `offset` with `data`.
    pub fn replace_data(
        &mut self,
        id: NodeId,
        offset: usize,
        count: usize,
        data: &str,
    ) -> Result<(), DomException> {
        self.edit_data(id, |s| {
            let (start, end) = byte_range(s, offset, count)?;
            s.replace_range(start..end, data);
            Ok(())
        })
    }

    /// Apply `edit` to the node's data, then reconcile the renderer and notify.
    fn edit_data(
        &mut self,
        id: NodeId,
        edit: impl FnOnce(&mut String) -> Result<(), DomException>,
    ) -> Result<(), DomException> {
        self.character_data(id)?;
        if self.is_read_only(id) {
            return Err(DomException::NoModificationAllowed);
        }
        let n = self.node_mut(id).ok_or(DomException::NotFound)?;
        let data = n
            .kind
            .character_data_mut()
            .ok_or(DomException::InvalidNodeType)?;
        let prev = data.clone();
        edit(data)?;
        let new = data.clone();

        self.mutation(|doc| {
            let _node = doc.protect(id);
            doc.update_renderer(id);
            if doc.has_listener_type(MutationEventKind::CharacterDataModified) {
                let mut event =
                    MutationEvent::new(MutationEventKind::CharacterDataModified, id, None);
                event.prev_value = Some(prev);
                event.new_value = Some(new);
                if let Err(e) = doc.dispatch_event(event) {
                    log::debug!("character-data listener on {id:?} failed: {e}");
                }
            }
            doc.subtree_modified(id);
        });
        Ok(())
    }
}
