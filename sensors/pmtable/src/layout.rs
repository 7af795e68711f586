//! Per-revision PM-table layouts.
//!
//! One immutable [`TableLayout`] per supported firmware revision, as plain
//! static data. The decoder and the metrics engine never branch on the
//! version themselves; supporting a new firmware revision means adding one
//! entry to [`LAYOUTS`] and nothing else.
//!
//! Word offsets are 4-byte indices from the start of the raw table. The
//! constraint block at words 0-11 (PPT/TDC/THM/FIT/EDC/VID limit+value
//! pairs) is stable across every known Zen 2/Zen 3 revision; everything
//! after it shifts between families, and APU tables interleave their
//! SoC/GFX constraint pairs right behind it.

use crate::fields::{Field, IndexedField};
use ryzenmon_rs_core::ZenGeneration;

/// Addressing for a per-unit field: unit `n` lives at word `base + n * stride`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexedRange {
    /// Word offset of unit 0.
    pub base: u32,
    /// Word distance between consecutive units.
    pub stride: u32,
    /// Number of units this revision reports for the field. May be smaller
    /// than the layout's unit count when the revision only populates the
    /// leading instances.
    pub count: u32,
}

impl IndexedRange {
    const fn packed(base: u32, count: u32) -> Self {
        Self {
            base,
            stride: 1,
            count,
        }
    }
}

/// Immutable layout definition for one PM-table firmware revision.
#[derive(Debug)]
pub struct TableLayout {
    /// Firmware table version this layout decodes.
    pub version: u32,
    /// Declared table size in bytes.
    pub table_size: usize,
    /// Core slots this revision reports.
    pub max_cores: usize,
    /// L3 cache instances this revision reports.
    pub max_l3: usize,
    /// Microarchitecture generation, consumed by the topology collaborator.
    pub zen: ZenGeneration,
    /// Whether the table carries an integrated-graphics block.
    pub has_graphics: bool,
    scalars: &'static [(Field, u32)],
    indexed: &'static [(IndexedField, IndexedRange)],
}

impl TableLayout {
    /// Word offset of a scalar field, or `None` when this revision does not
    /// report it.
    #[must_use]
    pub fn scalar_word(&self, field: Field) -> Option<u32> {
        self.scalars
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, word)| *word)
    }

    /// Addressing of an indexed field, or `None` when this revision does not
    /// report it at all.
    #[must_use]
    pub fn indexed_range(&self, field: IndexedField) -> Option<IndexedRange> {
        self.indexed
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, range)| *range)
    }
}

// --- Matisse (Zen 2) ------------------------------------------------------

const MATISSE_SCALARS: &[(Field, u32)] = &[
    (Field::PptLimit, 0),
    (Field::PptValue, 1),
    (Field::TdcLimit, 2),
    (Field::TdcValue, 3),
    (Field::ThmLimit, 4),
    (Field::ThmValue, 5),
    (Field::FitLimit, 6),
    (Field::FitValue, 7),
    (Field::EdcLimit, 8),
    (Field::EdcValue, 9),
    (Field::VidLimit, 10),
    (Field::VidValue, 11),
    (Field::TdcActual, 15),
    (Field::VddcrCpuPower, 24),
    (Field::VddcrSocPower, 25),
    (Field::VddioMemPower, 26),
    (Field::Vdd18Power, 27),
    (Field::RocPower, 28),
    (Field::SocketPower, 29),
    (Field::CpuTelemetryVoltage, 31),
    (Field::CpuTelemetryCurrent, 32),
    (Field::CpuTelemetryPower, 33),
    (Field::SocTelemetryVoltage, 34),
    (Field::SocTelemetryCurrent, 35),
    (Field::SocTelemetryPower, 36),
    (Field::FclkFreq, 37),
    (Field::FclkFreqEff, 38),
    (Field::UclkFreq, 39),
    (Field::MemclkFreq, 40),
    (Field::VVddm, 41),
    (Field::VVddp, 42),
    (Field::VVddg, 43),
    (Field::PeakTemp, 44),
    (Field::SocTemp, 45),
    (Field::Pc6, 46),
    (Field::DdrVddpPower, 47),
    (Field::IoDisplayPower, 48),
    (Field::IoUsbPower, 49),
];

// 0x240903: single-CCD Matisse, two L3 slices.
const MATISSE_1CCD_INDEXED: &[(IndexedField, IndexedRange)] = &[
    (IndexedField::CorePower, IndexedRange::packed(150, 8)),
    (IndexedField::CoreTemp, IndexedRange::packed(158, 8)),
    (IndexedField::CoreFreqEff, IndexedRange::packed(166, 8)),
    (IndexedField::CoreC0, IndexedRange::packed(174, 8)),
    (IndexedField::CoreCc1, IndexedRange::packed(182, 8)),
    (IndexedField::CoreCc6, IndexedRange::packed(190, 8)),
    (IndexedField::L3LogicPower, IndexedRange::packed(198, 2)),
    (IndexedField::L3VddmPower, IndexedRange::packed(200, 2)),
];

// 0x240803: dual-CCD Matisse, four L3 slices.
const MATISSE_2CCD_INDEXED: &[(IndexedField, IndexedRange)] = &[
    (IndexedField::CorePower, IndexedRange::packed(150, 16)),
    (IndexedField::CoreTemp, IndexedRange::packed(166, 16)),
    (IndexedField::CoreFreqEff, IndexedRange::packed(182, 16)),
    (IndexedField::CoreC0, IndexedRange::packed(198, 16)),
    (IndexedField::CoreCc1, IndexedRange::packed(214, 16)),
    (IndexedField::CoreCc6, IndexedRange::packed(230, 16)),
    (IndexedField::L3LogicPower, IndexedRange::packed(246, 4)),
    (IndexedField::L3VddmPower, IndexedRange::packed(250, 4)),
];

// --- Vermeer (Zen 3) ------------------------------------------------------

const VERMEER_SCALARS: &[(Field, u32)] = &[
    (Field::PptLimit, 0),
    (Field::PptValue, 1),
    (Field::TdcLimit, 2),
    (Field::TdcValue, 3),
    (Field::ThmLimit, 4),
    (Field::ThmValue, 5),
    (Field::FitLimit, 6),
    (Field::FitValue, 7),
    (Field::EdcLimit, 8),
    (Field::EdcValue, 9),
    (Field::VidLimit, 10),
    (Field::VidValue, 11),
    (Field::TdcActual, 15),
    (Field::VddcrCpuPower, 24),
    (Field::VddcrSocPower, 25),
    (Field::VddioMemPower, 26),
    (Field::Vdd18Power, 27),
    (Field::RocPower, 28),
    (Field::SocketPower, 29),
    (Field::CpuTelemetryVoltage, 31),
    (Field::CpuTelemetryCurrent, 32),
    (Field::CpuTelemetryPower, 33),
    (Field::SocTelemetryVoltage, 34),
    (Field::SocTelemetryCurrent, 35),
    (Field::SocTelemetryPower, 36),
    (Field::FclkFreq, 37),
    (Field::FclkFreqEff, 38),
    (Field::UclkFreq, 39),
    (Field::MemclkFreq, 40),
    (Field::VVddm, 41),
    (Field::VVddp, 42),
    (Field::VVddgIod, 43),
    (Field::VVddgCcd, 44),
    (Field::PeakTemp, 45),
    (Field::SocTemp, 46),
    (Field::Pc6, 47),
    (Field::IoVddcrSocPower, 48),
    (Field::Gmi2VddgPower, 49),
    (Field::IodVddioMemPower, 50),
    (Field::DdrVddpPower, 51),
    (Field::DdrPhyPower, 52),
    (Field::IoDisplayPower, 53),
    (Field::IoUsbPower, 54),
];

// 0x380904/0x380905: single-CCD Vermeer, unified L3.
const VERMEER_1CCD_INDEXED: &[(IndexedField, IndexedRange)] = &[
    (IndexedField::CorePower, IndexedRange::packed(200, 8)),
    (IndexedField::CoreTemp, IndexedRange::packed(208, 8)),
    (IndexedField::CoreFreqEff, IndexedRange::packed(216, 8)),
    (IndexedField::CoreC0, IndexedRange::packed(224, 8)),
    (IndexedField::CoreCc1, IndexedRange::packed(232, 8)),
    (IndexedField::CoreCc6, IndexedRange::packed(240, 8)),
    (IndexedField::L3LogicPower, IndexedRange::packed(248, 1)),
    (IndexedField::L3VddmPower, IndexedRange::packed(249, 1)),
];

// 0x380804: dual-CCD Vermeer on older AGESA. Reports VDDM power only for
// the first L3 instance; the 0x380805 refresh fills in the second.
const VERMEER_2CCD_OLD_INDEXED: &[(IndexedField, IndexedRange)] = &[
    (IndexedField::CorePower, IndexedRange::packed(200, 16)),
    (IndexedField::CoreTemp, IndexedRange::packed(216, 16)),
    (IndexedField::CoreFreqEff, IndexedRange::packed(232, 16)),
    (IndexedField::CoreC0, IndexedRange::packed(248, 16)),
    (IndexedField::CoreCc1, IndexedRange::packed(264, 16)),
    (IndexedField::CoreCc6, IndexedRange::packed(280, 16)),
    (IndexedField::L3LogicPower, IndexedRange::packed(296, 2)),
    (IndexedField::L3VddmPower, IndexedRange::packed(298, 1)),
];

// 0x380805: dual-CCD Vermeer, both L3 instances fully populated.
const VERMEER_2CCD_INDEXED: &[(IndexedField, IndexedRange)] = &[
    (IndexedField::CorePower, IndexedRange::packed(200, 16)),
    (IndexedField::CoreTemp, IndexedRange::packed(216, 16)),
    (IndexedField::CoreFreqEff, IndexedRange::packed(232, 16)),
    (IndexedField::CoreC0, IndexedRange::packed(248, 16)),
    (IndexedField::CoreCc1, IndexedRange::packed(264, 16)),
    (IndexedField::CoreCc6, IndexedRange::packed(280, 16)),
    (IndexedField::L3LogicPower, IndexedRange::packed(296, 2)),
    (IndexedField::L3VddmPower, IndexedRange::packed(298, 2)),
];

// --- Cezanne (Zen 3 APU) --------------------------------------------------

const CEZANNE_SCALARS: &[(Field, u32)] = &[
    (Field::PptLimit, 0),
    (Field::PptValue, 1),
    (Field::TdcLimit, 2),
    (Field::TdcValue, 3),
    (Field::ThmLimit, 4),
    (Field::ThmValue, 5),
    (Field::FitLimit, 6),
    (Field::FitValue, 7),
    (Field::EdcLimit, 8),
    (Field::EdcValue, 9),
    (Field::VidLimit, 10),
    (Field::VidValue, 11),
    (Field::PptLimitApu, 12),
    (Field::PptValueApu, 13),
    (Field::TdcLimitSoc, 14),
    (Field::TdcValueSoc, 15),
    (Field::EdcLimitSoc, 16),
    (Field::EdcValueSoc, 17),
    (Field::ThmLimitSoc, 18),
    (Field::ThmValueSoc, 19),
    (Field::ThmLimitGfx, 20),
    (Field::ThmValueGfx, 21),
    (Field::TdcActual, 22),
    (Field::VddcrCpuPower, 24),
    (Field::VddcrSocPower, 25),
    (Field::VddioMemPower, 26),
    (Field::Vdd18Power, 27),
    (Field::RocPower, 28),
    (Field::SocketPower, 29),
    (Field::PackagePower, 30),
    (Field::CpuTelemetryVoltage, 31),
    (Field::CpuTelemetryCurrent, 32),
    (Field::CpuTelemetryPower, 33),
    (Field::SocTelemetryVoltage, 34),
    (Field::SocTelemetryCurrent, 35),
    (Field::SocTelemetryPower, 36),
    (Field::FclkFreq, 37),
    (Field::UclkFreq, 39),
    (Field::MemclkFreq, 40),
    (Field::VVddm, 41),
    (Field::VVddp, 42),
    (Field::PeakTemp, 45),
    (Field::SocTemp, 46),
    (Field::Pc6, 47),
    (Field::IoDisplayPower, 53),
    (Field::IoUsbPower, 54),
    (Field::GfxVoltage, 60),
    (Field::GfxTemp, 61),
    (Field::GfxFreq, 62),
    (Field::GfxFreqEff, 63),
    (Field::GfxBusy, 64),
    (Field::GfxEdcLimit, 65),
    (Field::GfxEdcResidency, 66),
    (Field::DisplayCount, 67),
    (Field::Fps, 68),
    (Field::DgpuPower, 69),
    (Field::DgpuFreqTarget, 70),
    (Field::DgpuGfxBusy, 71),
];

const CEZANNE_INDEXED: &[(IndexedField, IndexedRange)] = &[
    (IndexedField::CorePower, IndexedRange::packed(300, 8)),
    (IndexedField::CoreTemp, IndexedRange::packed(308, 8)),
    (IndexedField::CoreFreqEff, IndexedRange::packed(316, 8)),
    (IndexedField::CoreC0, IndexedRange::packed(324, 8)),
    (IndexedField::CoreCc1, IndexedRange::packed(332, 8)),
    (IndexedField::CoreCc6, IndexedRange::packed(340, 8)),
    (IndexedField::L3LogicPower, IndexedRange::packed(348, 1)),
    (IndexedField::L3VddmPower, IndexedRange::packed(349, 1)),
];

/// Every supported firmware revision, one immutable layout each.
pub static LAYOUTS: &[TableLayout] = &[
    TableLayout {
        version: 0x240903,
        table_size: 0x518,
        max_cores: 8,
        max_l3: 2,
        zen: ZenGeneration::Zen2,
        has_graphics: false,
        scalars: MATISSE_SCALARS,
        indexed: MATISSE_1CCD_INDEXED,
    },
    TableLayout {
        version: 0x240803,
        table_size: 0x7E4,
        max_cores: 16,
        max_l3: 4,
        zen: ZenGeneration::Zen2,
        has_graphics: false,
        scalars: MATISSE_SCALARS,
        indexed: MATISSE_2CCD_INDEXED,
    },
    TableLayout {
        version: 0x380904,
        table_size: 0x5A4,
        max_cores: 8,
        max_l3: 1,
        zen: ZenGeneration::Zen3,
        has_graphics: false,
        scalars: VERMEER_SCALARS,
        indexed: VERMEER_1CCD_INDEXED,
    },
    TableLayout {
        version: 0x380905,
        table_size: 0x5A8,
        max_cores: 8,
        max_l3: 1,
        zen: ZenGeneration::Zen3,
        has_graphics: false,
        scalars: VERMEER_SCALARS,
        indexed: VERMEER_1CCD_INDEXED,
    },
    TableLayout {
        version: 0x380804,
        table_size: 0x8AC,
        max_cores: 16,
        max_l3: 2,
        zen: ZenGeneration::Zen3,
        has_graphics: false,
        scalars: VERMEER_SCALARS,
        indexed: VERMEER_2CCD_OLD_INDEXED,
    },
    TableLayout {
        version: 0x380805,
        table_size: 0x8B0,
        max_cores: 16,
        max_l3: 2,
        zen: ZenGeneration::Zen3,
        has_graphics: false,
        scalars: VERMEER_SCALARS,
        indexed: VERMEER_2CCD_INDEXED,
    },
    TableLayout {
        version: 0x400005,
        table_size: 0x944,
        max_cores: 8,
        max_l3: 1,
        zen: ZenGeneration::Zen3,
        has_graphics: true,
        scalars: CEZANNE_SCALARS,
        indexed: CEZANNE_INDEXED,
    },
];

/// Look up the layout registered for `version`.
#[must_use]
pub fn layout_for(version: u32) -> Option<&'static TableLayout> {
    LAYOUTS.iter().find(|layout| layout.version == version)
}

/// The closed set of firmware revisions this crate decodes.
#[must_use]
pub fn supported_versions() -> impl Iterator<Item = u32> {
    LAYOUTS.iter().map(|layout| layout.version)
}
