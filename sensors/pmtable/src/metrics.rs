//! Derived-metrics engine: turns a typed PM-table view plus topology into
//! the normalized sensor report.
//!
//! All formulas follow the SMU telemetry semantics exactly; in particular
//! the sleep-state voltage correction and the usage-scaled EDC value are
//! reproduced as the firmware intends them, not simplified.

use crate::fields::{Field, IndexedField};
use crate::view::PmTableView;
use ryzenmon_rs_core::{
    ConstraintsRecord, CoreRecord, GraphicsRecord, MemoryRecord, PowerRecord, SensorReport,
    StatsRecord, Topology,
};

/// Assumed voltage of the sleep rail while a core (or the package) sits in
/// deep sleep. Used to back-solve the active-state voltage out of the
/// sleep-blended telemetry reading.
const SLEEP_RAIL_VOLTAGE: f32 = 0.2;

/// A core with C0 residency below this threshold counts as sleeping.
const SLEEPING_C0_THRESHOLD: f32 = 6.0;

/// Compute the full sensor report from one decoded table.
///
/// `core_limit` bounds how many core slots get filled; the effective count
/// processed is `min(table's core slots, topology core slots, core_limit)`.
///
/// # Preconditions
///
/// `topology.enabled_cores` must be non-zero — averaging over zero enabled
/// cores is undefined. Callers validate topology once after discovery (see
/// [`Topology::validate`]); this is a caller error, not a recovered case.
#[must_use]
pub fn compute_report(
    view: &PmTableView<'_>,
    topology: &Topology,
    core_limit: usize,
) -> SensorReport {
    debug_assert!(
        topology.enabled_cores > 0,
        "metrics require a topology with at least one enabled core"
    );

    // The telemetry voltage is blended across active and sleep states;
    // back-solve the active-state average when package C6 residency is
    // reported, otherwise take the reading as-is.
    let average_voltage = match view.try_scalar(Field::Pc6) {
        Some(pc6) => {
            let package_sleep = pc6 / 100.0;
            (view.scalar(Field::CpuTelemetryVoltage) - SLEEP_RAIL_VOLTAGE * package_sleep)
                / (1.0 - package_sleep)
        }
        None => view.scalar(Field::CpuTelemetryVoltage),
    };

    let core_count = view.max_cores().min(topology.cores).min(core_limit);

    let mut peak_core_frequency = 0.0f32;
    let mut peak_core_temp = 0.0f32;
    let mut peak_core_voltage = 0.0f32;
    let mut total_core_voltage = 0.0f32;
    let mut total_core_power = 0.0f32;
    let mut total_usage = 0.0f32;
    let mut total_core_cc6 = 0.0f32;

    let mut cores = Vec::with_capacity(core_count);
    for i in 0..core_count {
        let disabled = topology.core_disabled(i);
        let frequency = view.indexed(IndexedField::CoreFreqEff, i) * 1000.0;
        let power = view.indexed(IndexedField::CorePower, i);
        let temp = view.indexed(IndexedField::CoreTemp, i);
        let c0 = view.indexed(IndexedField::CoreC0, i);
        let cc1 = view.indexed(IndexedField::CoreCc1, i);
        let cc6 = view.indexed(IndexedField::CoreCc6, i);

        // Re-blend the package-average voltage with this core's own deep
        // sleep residency.
        let core_sleep = cc6 / 100.0;
        let voltage = (1.0 - core_sleep) * average_voltage + SLEEP_RAIL_VOLTAGE * core_sleep;

        cores.push(CoreRecord {
            core_num: i,
            frequency,
            power,
            voltage,
            temp,
            c0,
            cc1,
            cc6,
            disabled,
            sleeping: c0 < SLEEPING_C0_THRESHOLD,
        });

        // Disabled cores are skipped entirely, not zero-filled: whatever
        // their table slots contain must not leak into the aggregates.
        if !disabled {
            if peak_core_frequency < frequency {
                peak_core_frequency = frequency;
            }
            if peak_core_temp < temp {
                peak_core_temp = temp;
            }
            if peak_core_voltage < voltage {
                peak_core_voltage = voltage;
            }
            total_core_voltage += voltage;
            total_core_power += power;
            total_usage += c0;
            total_core_cc6 += cc6;
        }
    }

    let enabled = topology.enabled_cores as f32;
    let stats = StatsRecord {
        peak_core_frequency,
        peak_core_temp,
        peak_core_voltage,
        avg_core_voltage: total_core_voltage / enabled,
        avg_core_cc6: total_core_cc6 / enabled,
        total_core_power,
        peak_core_voltage_smu: view.scalar(Field::CpuTelemetryVoltage),
        package_cc6: view.scalar(Field::Pc6),
    };

    // The firmware reports EDC as a ceiling; scale it by actual core usage
    // and clamp it up to TDC so an idle package never reads below its
    // sustained limit. NaN TDC leaves the scaled value untouched.
    let mut edc_value =
        view.scalar(Field::EdcValue) * (total_usage / topology.cores as f32 / 100.0);
    let tdc_value = view.scalar(Field::TdcValue);
    if edc_value < tdc_value {
        edc_value = tdc_value;
    }

    let constraints = ConstraintsRecord {
        peak_temp: view.scalar(Field::PeakTemp),
        soc_temp: view.scalar(Field::SocTemp),
        gfx_temp: view.scalar(Field::GfxTemp),
        vid_value: view.scalar(Field::VidValue),
        vid_limit: view.scalar(Field::VidLimit),
        ppt_value: view.scalar(Field::PptValue),
        ppt_limit: view.scalar(Field::PptLimit),
        ppt_apu_value: view.scalar(Field::PptValueApu),
        ppt_apu_limit: view.scalar(Field::PptLimitApu),
        tdc_value,
        tdc_limit: view.scalar(Field::TdcLimit),
        tdc_actual: view.scalar(Field::TdcActual),
        tdc_soc_value: view.scalar(Field::TdcValueSoc),
        tdc_soc_limit: view.scalar(Field::TdcLimitSoc),
        edc_value,
        edc_limit: view.scalar(Field::EdcLimit),
        edc_soc_value: view.scalar(Field::EdcValueSoc),
        edc_soc_limit: view.scalar(Field::EdcLimitSoc),
        thm_value: view.scalar(Field::ThmValue),
        thm_limit: view.scalar(Field::ThmLimit),
        thm_soc_value: view.scalar(Field::ThmValueSoc),
        thm_soc_limit: view.scalar(Field::ThmLimitSoc),
        thm_gfx_value: view.scalar(Field::ThmValueGfx),
        thm_gfx_limit: view.scalar(Field::ThmLimitGfx),
        fit_value: view.scalar(Field::FitValue),
        fit_limit: view.scalar(Field::FitLimit),
    };

    let uclk_freq = view.scalar(Field::UclkFreq);
    let memclk_freq = view.scalar(Field::MemclkFreq);
    let memory = MemoryRecord {
        fclk_freq: view.scalar(Field::FclkFreq),
        fclk_freq_eff: view.scalar(Field::FclkFreqEff),
        uclk_freq,
        memclk_freq,
        v_vddm: view.scalar(Field::VVddm),
        v_vddp: view.scalar(Field::VVddp),
        v_vddg: view.scalar(Field::VVddg),
        v_vddg_iod: view.scalar(Field::VVddgIod),
        v_vddg_ccd: view.scalar(Field::VVddgCcd),
        // Bit-exact on purpose: coupled mode means the two clock domains run
        // off the same divider, so the firmware reports identical values.
        coupled_mode: uclk_freq == memclk_freq,
    };

    // L3 sums run over the table's declared instance count, substituting
    // zero for units the revision leaves unpopulated so a partial table
    // still yields a finite sum.
    let mut l3_logic_power = 0.0f32;
    let mut l3_vddm_power = 0.0f32;
    for unit in 0..view.max_l3() {
        l3_logic_power += view.indexed_or_zero(IndexedField::L3LogicPower, unit);
        l3_vddm_power += view.indexed_or_zero(IndexedField::L3VddmPower, unit);
    }

    let power = PowerRecord {
        total_core_power,
        vddcr_soc_power: view.scalar(Field::VddcrSocPower),
        io_vddcr_soc_power: view.scalar(Field::IoVddcrSocPower),
        gmi2_vddg_power: view.scalar(Field::Gmi2VddgPower),
        roc_power: view.scalar(Field::RocPower),
        l3_logic_power,
        l3_vddm_power,
        vddio_mem_power: view.scalar(Field::VddioMemPower),
        iod_vddio_mem_power: view.scalar(Field::IodVddioMemPower),
        ddr_vddp_power: view.scalar(Field::DdrVddpPower),
        ddr_phy_power: view.scalar(Field::DdrPhyPower),
        vdd18_power: view.scalar(Field::Vdd18Power),
        io_display_power: view.scalar(Field::IoDisplayPower),
        io_usb_power: view.scalar(Field::IoUsbPower),
        socket_power: view.scalar(Field::SocketPower),
        package_power: view.scalar(Field::PackagePower),
        vddcr_cpu_power: view.scalar(Field::VddcrCpuPower),
        soc_telemetry_voltage: view.scalar(Field::SocTelemetryVoltage),
        soc_telemetry_current: view.scalar(Field::SocTelemetryCurrent),
        soc_telemetry_power: view.scalar(Field::SocTelemetryPower),
        cpu_telemetry_voltage: view.scalar(Field::CpuTelemetryVoltage),
        cpu_telemetry_current: view.scalar(Field::CpuTelemetryCurrent),
        cpu_telemetry_power: view.scalar(Field::CpuTelemetryPower),
    };

    // The whole block is absent on tables without graphics, never
    // zero-filled, regardless of what the byte range contains.
    let graphics = view.has_graphics().then(|| GraphicsRecord {
        gfx_voltage: view.scalar(Field::GfxVoltage),
        roc_power: view.scalar(Field::RocPower),
        gfx_temp: view.scalar(Field::GfxTemp),
        gfx_freq: view.scalar(Field::GfxFreq),
        gfx_freq_eff: view.scalar(Field::GfxFreqEff),
        gfx_busy: view.scalar(Field::GfxBusy),
        gfx_edc_lim: view.scalar(Field::GfxEdcLimit),
        gfx_edc_residency: view.scalar(Field::GfxEdcResidency),
        display_count: view.scalar(Field::DisplayCount),
        fps: view.scalar(Field::Fps),
        dgpu_power: view.scalar(Field::DgpuPower),
        dgpu_freq_target: view.scalar(Field::DgpuFreqTarget),
        dgpu_gfx_busy: view.scalar(Field::DgpuGfxBusy),
    });

    SensorReport {
        cores,
        constraints,
        memory,
        power,
        graphics,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::layout_for;

    fn zeroed_buffer(version: u32) -> Vec<u8> {
        vec![0u8; layout_for(version).unwrap().table_size]
    }

    fn put(buf: &mut [u8], word: usize, value: f32) {
        buf[word * 4..word * 4 + 4].copy_from_slice(&value.to_le_bytes());
    }

    fn topology(cores: usize, enabled: usize, disable_map: u64) -> Topology {
        Topology {
            cores,
            ccds: 1,
            ccxs: 1,
            cores_per_ccx: cores,
            enabled_cores: enabled,
            core_disable_map: disable_map,
            l3_caches: 1,
            memory_channels: 2,
        }
    }

    const CPU_TELEMETRY_VOLTAGE_WORD: usize = 31;
    const PC6_WORD: usize = 47;
    const TDC_VALUE_WORD: usize = 3;
    const EDC_VALUE_WORD: usize = 9;
    const UCLK_WORD: usize = 39;
    const MEMCLK_WORD: usize = 40;
    // 0x380904 per-core array bases.
    const CORE_POWER_BASE: usize = 200;
    const CORE_TEMP_BASE: usize = 208;
    const CORE_FREQEFF_BASE: usize = 216;
    const CORE_C0_BASE: usize = 224;
    const CORE_CC6_BASE: usize = 240;

    #[test]
    fn voltage_passes_through_when_package_never_sleeps() {
        let mut buf = zeroed_buffer(0x380904);
        put(&mut buf, CPU_TELEMETRY_VOLTAGE_WORD, 1.25);
        put(&mut buf, PC6_WORD, 0.0);
        // All cores fully awake, zero CC6 residency.

        let view = PmTableView::decode(0x380904, &buf).unwrap();
        let report = compute_report(&view, &topology(8, 8, 0), 8);

        for core in &report.cores {
            assert_eq!(core.voltage, 1.25, "core {} blended", core.core_num);
        }
        assert_eq!(report.stats.peak_core_voltage, 1.25);
        assert_eq!(report.stats.peak_core_voltage_smu, 1.25);
    }

    #[test]
    fn voltage_backsolves_package_sleep_blending() {
        let mut buf = zeroed_buffer(0x380904);
        put(&mut buf, CPU_TELEMETRY_VOLTAGE_WORD, 1.0);
        put(&mut buf, PC6_WORD, 50.0);

        let view = PmTableView::decode(0x380904, &buf).unwrap();
        let report = compute_report(&view, &topology(8, 8, 0), 8);

        // (1.0 - 0.2 * 0.5) / (1 - 0.5) = 1.8, and with CC6 = 0 each core
        // reads the uncorrected average back.
        for core in &report.cores {
            assert!((core.voltage - 1.8).abs() < 1e-6);
        }
    }

    #[test]
    fn core_voltage_reblends_with_own_cc6_residency() {
        let mut buf = zeroed_buffer(0x380904);
        put(&mut buf, CPU_TELEMETRY_VOLTAGE_WORD, 1.0);
        put(&mut buf, PC6_WORD, 0.0);
        // Core 0 spends all its time in CC6, core 1 none of it.
        put(&mut buf, CORE_CC6_BASE, 100.0);

        let view = PmTableView::decode(0x380904, &buf).unwrap();
        let report = compute_report(&view, &topology(8, 8, 0), 8);

        assert!((report.cores[0].voltage - 0.2).abs() < 1e-6);
        assert!((report.cores[1].voltage - 1.0).abs() < 1e-6);
    }

    #[test]
    fn edc_clamps_up_to_tdc() {
        let mut buf = zeroed_buffer(0x380904);
        put(&mut buf, EDC_VALUE_WORD, 10.0);
        put(&mut buf, TDC_VALUE_WORD, 15.0);
        // Full usage on all 8 cores: ratio = 800 / 8 / 100 = 1.0.
        for i in 0..8 {
            put(&mut buf, CORE_C0_BASE + i, 100.0);
        }

        let view = PmTableView::decode(0x380904, &buf).unwrap();
        let report = compute_report(&view, &topology(8, 8, 0), 8);
        assert_eq!(report.constraints.edc_value, 15.0);
    }

    #[test]
    fn edc_stays_unclamped_above_tdc() {
        let mut buf = zeroed_buffer(0x380904);
        put(&mut buf, EDC_VALUE_WORD, 10.0);
        put(&mut buf, TDC_VALUE_WORD, 5.0);
        for i in 0..8 {
            put(&mut buf, CORE_C0_BASE + i, 100.0);
        }

        let view = PmTableView::decode(0x380904, &buf).unwrap();
        let report = compute_report(&view, &topology(8, 8, 0), 8);
        assert_eq!(report.constraints.edc_value, 10.0);
    }

    #[test]
    fn aggregates_skip_disabled_cores_entirely() {
        let mut buf = zeroed_buffer(0x380904);
        put(&mut buf, CPU_TELEMETRY_VOLTAGE_WORD, 1.0);
        for i in 0..4 {
            put(&mut buf, CORE_POWER_BASE + i, 5.0);
            put(&mut buf, CORE_TEMP_BASE + i, 60.0);
            put(&mut buf, CORE_FREQEFF_BASE + i, 4.0);
            put(&mut buf, CORE_C0_BASE + i, 50.0);
        }
        // Core 2 is fused off but its table slots carry extreme garbage;
        // none of it may leak into the aggregates.
        put(&mut buf, CORE_POWER_BASE + 2, 500.0);
        put(&mut buf, CORE_TEMP_BASE + 2, 999.0);
        put(&mut buf, CORE_FREQEFF_BASE + 2, 99.0);
        put(&mut buf, CORE_C0_BASE + 2, 100.0);

        let view = PmTableView::decode(0x380904, &buf).unwrap();
        let topo = topology(4, 3, 0b0100);
        let report = compute_report(&view, &topo, 4);

        assert_eq!(report.cores.len(), 4);
        assert!(report.cores[2].disabled);
        assert_eq!(report.stats.peak_core_temp, 60.0);
        assert_eq!(report.stats.peak_core_frequency, 4000.0);
        assert_eq!(report.stats.total_core_power, 15.0);
        assert!((report.stats.avg_core_voltage - 1.0).abs() < 1e-6);
        // EDC usage sum counts 3 cores at 50%, not core 2's 100%.
        assert_eq!(report.power.total_core_power, 15.0);
    }

    #[test]
    fn sleeping_flag_follows_c0_threshold() {
        let mut buf = zeroed_buffer(0x380904);
        put(&mut buf, CORE_C0_BASE, 5.9);
        put(&mut buf, CORE_C0_BASE + 1, 6.0);

        let view = PmTableView::decode(0x380904, &buf).unwrap();
        let report = compute_report(&view, &topology(8, 8, 0), 8);
        assert!(report.cores[0].sleeping);
        assert!(!report.cores[1].sleeping);
    }

    #[test]
    fn core_limit_caps_processed_slots() {
        let buf = zeroed_buffer(0x380805);
        let view = PmTableView::decode(0x380805, &buf).unwrap();
        assert_eq!(view.max_cores(), 16);

        let report = compute_report(&view, &topology(16, 16, 0), 2);
        assert_eq!(report.cores.len(), 2);

        // Topology with fewer slots than the table also caps it.
        let report = compute_report(&view, &topology(12, 12, 0), 16);
        assert_eq!(report.cores.len(), 12);
    }

    #[test]
    fn coupled_mode_uses_bit_exact_equality() {
        let mut buf = zeroed_buffer(0x380904);
        put(&mut buf, UCLK_WORD, 1600.0);
        put(&mut buf, MEMCLK_WORD, 1600.0);
        let view = PmTableView::decode(0x380904, &buf).unwrap();
        assert!(compute_report(&view, &topology(8, 8, 0), 8).memory.coupled_mode);

        put(&mut buf, MEMCLK_WORD, 1600.0001);
        let view = PmTableView::decode(0x380904, &buf).unwrap();
        assert!(!compute_report(&view, &topology(8, 8, 0), 8).memory.coupled_mode);
    }

    #[test]
    fn l3_sum_substitutes_zero_for_unpopulated_units() {
        // 0x380804 declares two L3 instances but populates VDDM power only
        // for the first.
        let mut buf = zeroed_buffer(0x380804);
        put(&mut buf, 296, 1.0); // L3_LOGIC_POWER[0]
        put(&mut buf, 297, 2.0); // L3_LOGIC_POWER[1]
        put(&mut buf, 298, 3.0); // L3_VDDM_POWER[0]

        let view = PmTableView::decode(0x380804, &buf).unwrap();
        let report = compute_report(&view, &topology(16, 16, 0), 16);

        assert_eq!(report.power.l3_logic_power, 3.0);
        assert_eq!(report.power.l3_vddm_power, 3.0);
        assert!(!report.power.l3_vddm_power.is_nan());
    }

    #[test]
    fn graphics_record_omitted_without_presence_flag() {
        let mut buf = zeroed_buffer(0x380904);
        // Junk in the words an APU table would use for its graphics block
        // must not conjure a record on a desktop table.
        for word in 60..72 {
            put(&mut buf, word, 1234.5);
        }

        let view = PmTableView::decode(0x380904, &buf).unwrap();
        let report = compute_report(&view, &topology(8, 8, 0), 8);
        assert!(report.graphics.is_none());
    }

    #[test]
    fn graphics_record_populated_on_apu_table() {
        let mut buf = zeroed_buffer(0x400005);
        put(&mut buf, 64, 37.5); // GFX_BUSY
        put(&mut buf, 62, 1900.0); // GFX_FREQ
        put(&mut buf, 68, 144.0); // FPS

        let view = PmTableView::decode(0x400005, &buf).unwrap();
        let report = compute_report(&view, &topology(8, 8, 0), 8);

        let graphics = report.graphics.expect("APU table carries graphics");
        assert_eq!(graphics.gfx_busy, 37.5);
        assert_eq!(graphics.gfx_freq, 1900.0);
        assert_eq!(graphics.fps, 144.0);
    }

    #[test]
    fn absent_fields_read_nan_in_records() {
        let buf = zeroed_buffer(0x240903);
        let view = PmTableView::decode(0x240903, &buf).unwrap();
        let report = compute_report(&view, &topology(8, 8, 0), 8);

        // Zen 2 reports the unified VDDG rail, not the IOD/CCD split.
        assert_eq!(report.memory.v_vddg, 0.0);
        assert!(report.memory.v_vddg_iod.is_nan());
        assert!(report.memory.v_vddg_ccd.is_nan());
        // No APU constraints and no graphics temperature on desktop Zen 2.
        assert!(report.constraints.ppt_apu_value.is_nan());
        assert!(report.constraints.gfx_temp.is_nan());
        assert!(report.power.package_power.is_nan());
    }

    #[test]
    fn frequency_scale_preserved_exactly() {
        let mut buf = zeroed_buffer(0x380904);
        put(&mut buf, CORE_FREQEFF_BASE, 4.65);

        let view = PmTableView::decode(0x380904, &buf).unwrap();
        let report = compute_report(&view, &topology(8, 8, 0), 8);
        assert_eq!(report.cores[0].frequency, 4.65f32 * 1000.0);
    }
}
