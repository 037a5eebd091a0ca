use crate::error::{RenderError, RenderResult};

/// Number of simultaneously bindable textures per draw call.
pub const MAX_TEXTURE_SLOTS: usize = 8;

/// Fixed-size table mapping slot indices to texture handles for the
/// current batch sequence.
///
/// The table is generic over the stored handle so the slot semantics
/// (bounds validation, idempotent rebinding, default reset) are testable
/// without a GPU device; the renderer instantiates it with texture views.
pub struct SlotTable<V> {
    default_id: u64,
    default: V,
    entries: Vec<(u64, V)>,
    dirty: bool,
}

impl<V: Clone> SlotTable<V> {
    /// Creates a table with every slot bound to the default texture.
    pub fn new(default_id: u64, default: V) -> Self {
        Self {
            entries: vec![(default_id, default.clone()); MAX_TEXTURE_SLOTS],
            default_id,
            default,
            dirty: true,
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Binds `handle` into `slot`.
    ///
    /// Rebinding the same texture to the same slot is a no-op. Slot
    /// bounds are validated here, at assignment time, rather than
    /// relying on shader-side clamping.
    pub fn bind(&mut self, slot: usize, id: u64, handle: V) -> RenderResult<()> {
        if slot >= self.entries.len() {
            return Err(RenderError::InvalidArguments(format!(
                "texture slot {slot} out of range (0..{})",
                self.entries.len()
            )));
        }
        if self.entries[slot].0 == id {
            return Ok(());
        }
        self.entries[slot] = (id, handle);
        self.dirty = true;
        Ok(())
    }

    /// Resets every slot to the default texture.
    pub fn reset(&mut self) {
        for entry in &mut self.entries {
            if entry.0 != self.default_id {
                *entry = (self.default_id, self.default.clone());
                self.dirty = true;
            }
        }
    }

    /// Bound handles in slot order.
    pub fn handles(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// True when bindings changed since the last [`mark_clean`](Self::mark_clean).
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Acknowledges the current bindings (GPU state rebuilt).
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// True when every slot holds the default texture.
    pub fn is_default(&self) -> bool {
        self.entries.iter().all(|(id, _)| *id == self.default_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> SlotTable<&'static str> {
        SlotTable::new(0, "white")
    }

    #[test]
    fn starts_with_default_in_every_slot() {
        let t = table();
        assert!(t.is_default());
        assert_eq!(t.handles().count(), MAX_TEXTURE_SLOTS);
        assert!(t.handles().all(|&h| h == "white"));
    }

    #[test]
    fn bind_places_handle_and_marks_dirty() {
        let mut t = table();
        t.mark_clean();
        t.bind(2, 7, "cute").unwrap();
        assert!(t.is_dirty());
        assert_eq!(t.handles().nth(2), Some(&"cute"));
        assert!(!t.is_default());
    }

    #[test]
    fn rebinding_same_texture_is_idempotent() {
        let mut t = table();
        t.bind(1, 7, "cute").unwrap();
        t.mark_clean();
        t.bind(1, 7, "cute").unwrap();
        assert!(!t.is_dirty());
    }

    #[test]
    fn out_of_range_slot_is_rejected_at_assignment() {
        let mut t = table();
        let err = t.bind(MAX_TEXTURE_SLOTS, 7, "cute").unwrap_err();
        assert!(matches!(err, RenderError::InvalidArguments(_)));
    }

    #[test]
    fn reset_restores_default_everywhere() {
        let mut t = table();
        t.bind(0, 3, "a").unwrap();
        t.bind(5, 4, "b").unwrap();
        t.reset();
        assert!(t.is_default());
    }

    #[test]
    fn reset_on_default_table_stays_clean() {
        let mut t = table();
        t.mark_clean();
        t.reset();
        assert!(!t.is_dirty());
    }
}
