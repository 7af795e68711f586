//! Named PM-table fields.
//!
//! The SMU firmware reports every telemetry quantity as a little-endian
//! `f32` at a fixed word offset inside the table, but the set of reported
//! quantities and their offsets change between firmware revisions. This
//! module only names the fields; the per-revision addressing lives in
//! [`crate::layout`].

/// Scalar telemetry fields.
///
/// A revision's layout maps a subset of these to word offsets; anything the
/// revision does not report reads as absent through the view accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    // Package power/current/thermal constraint pairs.
    PptLimit,
    PptValue,
    PptLimitApu,
    PptValueApu,
    TdcLimit,
    TdcValue,
    TdcActual,
    TdcLimitSoc,
    TdcValueSoc,
    EdcLimit,
    EdcValue,
    EdcLimitSoc,
    EdcValueSoc,
    ThmLimit,
    ThmValue,
    ThmLimitSoc,
    ThmValueSoc,
    ThmLimitGfx,
    ThmValueGfx,
    FitLimit,
    FitValue,
    VidLimit,
    VidValue,

    // Temperatures.
    PeakTemp,
    SocTemp,
    GfxTemp,

    // Memory subsystem clocks and rails.
    FclkFreq,
    FclkFreqEff,
    UclkFreq,
    MemclkFreq,
    VVddm,
    VVddp,
    VVddg,
    VVddgIod,
    VVddgCcd,

    // Power rails.
    VddcrCpuPower,
    VddcrSocPower,
    IoVddcrSocPower,
    Gmi2VddgPower,
    RocPower,
    VddioMemPower,
    IodVddioMemPower,
    DdrVddpPower,
    DdrPhyPower,
    Vdd18Power,
    IoDisplayPower,
    IoUsbPower,
    SocketPower,
    PackagePower,

    // SVI2 telemetry.
    SocTelemetryVoltage,
    SocTelemetryCurrent,
    SocTelemetryPower,
    CpuTelemetryVoltage,
    CpuTelemetryCurrent,
    CpuTelemetryPower,

    /// Package C6 residency in percent.
    Pc6,

    // Integrated graphics block (APU tables only).
    GfxVoltage,
    GfxFreq,
    GfxFreqEff,
    GfxBusy,
    GfxEdcLimit,
    GfxEdcResidency,
    DisplayCount,
    Fps,
    DgpuPower,
    DgpuFreqTarget,
    DgpuGfxBusy,
}

/// Per-unit telemetry fields, indexed by core slot or L3 instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexedField {
    /// Per-core power in watts.
    CorePower,
    /// Per-core temperature in °C.
    CoreTemp,
    /// Per-core effective frequency in MHz.
    CoreFreqEff,
    /// Per-core C0 residency in percent.
    CoreC0,
    /// Per-core CC1 residency in percent.
    CoreCc1,
    /// Per-core CC6 residency in percent.
    CoreCc6,
    /// Per-L3-instance logic power in watts.
    L3LogicPower,
    /// Per-L3-instance VDDM power in watts.
    L3VddmPower,
}

impl IndexedField {
    /// Whether this field is indexed by core slot (as opposed to L3 instance).
    #[must_use]
    pub const fn per_core(self) -> bool {
        !matches!(self, IndexedField::L3LogicPower | IndexedField::L3VddmPower)
    }
}
