//! Typed, bounds-checked projection over one raw PM-table buffer.

use crate::error::PmTableError;
use crate::fields::{Field, IndexedField};
use crate::layout::{layout_for, TableLayout};
use ryzenmon_rs_core::ZenGeneration;

/// Read-only view binding a raw PM-table buffer to a registered layout.
///
/// The view borrows the buffer; it performs no copies and holds no state
/// beyond the two references. Every accessor either yields a value read at
/// the layout's declared offset or the absent sentinel — never undefined
/// memory.
///
/// Absent semantics follow the accessor: [`scalar`](Self::scalar) and
/// [`indexed`](Self::indexed) return NaN so that absence propagates through
/// arithmetic, while [`indexed_or_zero`](Self::indexed_or_zero) substitutes
/// zero for accumulation sites that must stay finite on partially-populated
/// tables.
#[derive(Debug, Clone, Copy)]
pub struct PmTableView<'a> {
    layout: &'static TableLayout,
    data: &'a [u8],
}

impl<'a> PmTableView<'a> {
    /// Bind `data` to the layout registered for `version`.
    ///
    /// Fails fast, before any field access, when the version is unknown or
    /// the buffer is smaller than the revision's declared table size. No
    /// partial view is ever produced.
    pub fn decode(version: u32, data: &'a [u8]) -> Result<Self, PmTableError> {
        let layout =
            layout_for(version).ok_or(PmTableError::UnsupportedVersion { version })?;
        if data.len() < layout.table_size {
            return Err(PmTableError::BufferTooSmall {
                version,
                expected: layout.table_size,
                actual: data.len(),
            });
        }
        Ok(Self { layout, data })
    }

    /// The layout this view was bound against.
    #[must_use]
    pub fn layout(&self) -> &'static TableLayout {
        self.layout
    }

    /// Core slots the bound revision reports.
    #[must_use]
    pub fn max_cores(&self) -> usize {
        self.layout.max_cores
    }

    /// L3 instances the bound revision reports.
    #[must_use]
    pub fn max_l3(&self) -> usize {
        self.layout.max_l3
    }

    /// Microarchitecture generation of the bound revision.
    #[must_use]
    pub fn zen(&self) -> ZenGeneration {
        self.layout.zen
    }

    /// Whether the bound revision carries an integrated-graphics block.
    #[must_use]
    pub fn has_graphics(&self) -> bool {
        self.layout.has_graphics
    }

    // Layout offsets are validated against the declared table size and the
    // buffer is at least that large, so the slice index cannot fail.
    fn word(&self, word: u32) -> f32 {
        let offset = word as usize * 4;
        f32::from_le_bytes([
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ])
    }

    /// Read a scalar field, or `None` when this revision does not report it.
    #[must_use]
    pub fn try_scalar(&self, field: Field) -> Option<f32> {
        self.layout.scalar_word(field).map(|word| self.word(word))
    }

    /// Read a scalar field with NaN as the absent sentinel.
    #[must_use]
    pub fn scalar(&self, field: Field) -> f32 {
        self.try_scalar(field).unwrap_or(f32::NAN)
    }

    /// Whether this revision reports `field` at all.
    #[must_use]
    pub fn has_scalar(&self, field: Field) -> bool {
        self.layout.scalar_word(field).is_some()
    }

    /// Read unit `unit` of an indexed field, or `None` when the field is
    /// absent or the unit index is beyond the revision's declared count.
    #[must_use]
    pub fn try_indexed(&self, field: IndexedField, unit: usize) -> Option<f32> {
        let range = self.layout.indexed_range(field)?;
        if unit >= range.count as usize {
            return None;
        }
        Some(self.word(range.base + range.stride * unit as u32))
    }

    /// Read unit `unit` of an indexed field with NaN as the absent sentinel.
    #[must_use]
    pub fn indexed(&self, field: IndexedField, unit: usize) -> f32 {
        self.try_indexed(field, unit).unwrap_or(f32::NAN)
    }

    /// Read unit `unit` of an indexed field, substituting zero when absent.
    ///
    /// Only meant for accumulation across unit instances (L3 power sums),
    /// where a partially-populated table must still yield a finite sum.
    #[must_use]
    pub fn indexed_or_zero(&self, field: IndexedField, unit: usize) -> f32 {
        self.try_indexed(field, unit).unwrap_or(0.0)
    }
}
