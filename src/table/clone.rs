//! # Clone/Pick Engine
//!
//! Rebuilds a table from an existing decoded [`TableView`] field by field,
//! depth-first, rather than by raw byte copy: the new table lives at a
//! different buffer position, so every child displacement must be
//! recomputed. Children are re-encoded before the parent that references
//! them, the same post-order discipline normal construction follows.
//!
//! [`TableBuilder::clone_table`] is memoized per session: before a clone
//! writes anything, its canonical content (vtable image, packed scalars,
//! child offsets) is looked up in the builder's cache, and an identical
//! table already in the buffer is returned as-is. Distinct sources that
//! encode identically collapse to one physical copy; the dedup is never
//! observable through a view.
//!
//! [`TableBuilder::pick_fields`] is the override path: it copies each
//! source-present field into the innermost open frame, skipping ordinals the
//! caller already set, so a record can be rebuilt with a handful of fields
//! changed.
//!
//! Source buffers are not trusted to be well-formed: traversal carries a
//! visited set and a depth bound, and a source graph that references itself
//! fails with [`Error::CyclicReference`] instead of recursing unboundedly.

use hashbrown::HashSet;

use crate::config::MAX_NESTING_DEPTH;
use crate::error::{Error, Result};
use crate::schema::FieldKind;
use crate::table::builder::{Slot, TableBuilder, TableOffset};
use crate::table::view::TableView;
use crate::table::vtable::{assign_layout, ResolvedField, ResolvedValue};

impl<'s> TableBuilder<'s> {
    /// Re-encode `source` (and, recursively, every child it references)
    /// into this buffer, reusing an existing identical encoding when one
    /// is already present.
    pub fn clone_table(&mut self, source: &TableView<'_>) -> Result<TableOffset> {
        let mut visiting = HashSet::new();
        self.clone_inner(source, 0, &mut visiting)
    }

    fn clone_inner(
        &mut self,
        source: &TableView<'_>,
        depth: usize,
        visiting: &mut HashSet<usize>,
    ) -> Result<TableOffset> {
        if depth >= MAX_NESTING_DEPTH || !visiting.insert(source.position()) {
            return Err(Error::CyclicReference {
                position: source.position(),
            });
        }

        let schema = source.schema();
        let mut resolved: Vec<ResolvedField> = Vec::new();
        for ordinal in 0..schema.field_count() as u16 {
            if !source.is_present(ordinal) {
                continue;
            }
            let desc = &schema.fields()[ordinal as usize];
            let value = match desc.kind() {
                FieldKind::Scalar(_) => match source.scalar_field_bits(ordinal)? {
                    // A non-canonical source may store the default
                    // explicitly; the re-encoding elides it.
                    Some(bits) if bits != desc.default_bits() => ResolvedValue::Bits(bits),
                    _ => continue,
                },
                FieldKind::Table(_) => {
                    let Some(child) = source.get_table(ordinal)? else {
                        continue;
                    };
                    ResolvedValue::Child(self.clone_inner(&child, depth + 1, visiting)?)
                }
            };
            resolved.push(ResolvedField {
                ordinal,
                size: desc.size(),
                align: desc.align(),
                offset: 0,
                value,
            });
        }
        visiting.remove(&source.position());

        let layout = assign_layout(schema.field_count(), &mut resolved)?;

        // Canonical content key: a child's offset is usable as a content
        // address because the child was itself memoized.
        let mut key = Vec::with_capacity(layout.vtable_bytes.len() + resolved.len() * 8);
        key.extend_from_slice(&layout.vtable_bytes);
        for field in &resolved {
            match field.value {
                ResolvedValue::Bits(bits) => {
                    key.extend_from_slice(&bits.to_le_bytes()[..field.size]);
                }
                ResolvedValue::Child(child) => {
                    key.extend_from_slice(&child.value().to_le_bytes());
                }
            }
        }
        if let Some(&existing) = self.memo.get(&key) {
            return Ok(existing);
        }

        let table = self.emit_table(layout, &resolved)?;
        self.memo.insert(key, table);
        Ok(table)
    }

    /// Copy every source-present field into the innermost open frame,
    /// skipping ordinals already set there. Child tables are re-encoded
    /// (and deduplicated) the same way `clone_table` re-encodes them.
    pub fn pick_fields(&mut self, source: &TableView<'_>) -> Result<()> {
        if self.frames.is_empty() {
            return Err(Error::nesting("no table is open"));
        }
        let schema = source.schema();
        for ordinal in 0..schema.field_count() as u16 {
            if !source.is_present(ordinal) {
                continue;
            }
            let already_set = self
                .frames
                .last()
                .and_then(|frame| frame.slots.get(ordinal as usize))
                .is_some_and(|slot| !matches!(slot, Slot::Unset));
            if already_set {
                continue;
            }
            let desc = &schema.fields()[ordinal as usize];
            match desc.kind() {
                FieldKind::Scalar(ty) => {
                    if let Some(bits) = source.scalar_field_bits(ordinal)? {
                        self.add_scalar_bits(ordinal, bits, *ty)?;
                    }
                }
                FieldKind::Table(_) => {
                    if let Some(child) = source.get_table(ordinal)? {
                        let mut visiting = HashSet::new();
                        let offset = self.clone_inner(&child, 0, &mut visiting)?;
                        self.add_table(ordinal, offset)?;
                    }
                }
            }
        }
        Ok(())
    }
}
