//! # ryzenmon-rs-core
//!
//! Core library for the ryzenmon-rs sensor suite providing the shared types
//! exchanged between the PM-table decoding crates and their consumers.
//!
//! ## Features
//!
//! - **Sensor record types** - Plain serializable per-core and platform readings
//! - **Topology input** - Core/CCD/CCX counts and the disabled-core bitmap
//! - **Error handling** - Comprehensive error types with context
//!
//! ## Quick Start
//!
//! ```rust
//! use ryzenmon_rs_core::Topology;
//!
//! // Topology is supplied by the discovery collaborator; a Ryzen 5600X
//! // (6 of 8 core slots enabled on one CCD) looks like this:
//! let topology = Topology {
//!     cores: 8,
//!     ccds: 1,
//!     ccxs: 1,
//!     cores_per_ccx: 8,
//!     enabled_cores: 6,
//!     core_disable_map: 0b0011_0000,
//!     l3_caches: 1,
//!     memory_channels: 2,
//! };
//! assert!(topology.validate().is_ok());
//! assert!(topology.core_disabled(4));
//! ```

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Maximum number of physical core slots any supported PM table reports.
pub const MAX_CORES: usize = 16;

/// Zen microarchitecture generation, exposed by the decoded table's
/// structural fields so the topology collaborator can key off it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ZenGeneration {
    /// Zen 2 (Matisse)
    Zen2,
    /// Zen 3 (Vermeer, Cezanne)
    Zen3,
}

impl fmt::Display for ZenGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZenGeneration::Zen2 => write!(f, "Zen 2"),
            ZenGeneration::Zen3 => write!(f, "Zen 3"),
        }
    }
}

/// Processor topology supplied by the discovery collaborator.
///
/// Nothing in this struct is derived from the PM table itself; the caller
/// obtains it from CPUID/fuse readout and hands it in alongside the decoded
/// view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Topology {
    /// Total physical core slots (including disabled ones).
    pub cores: usize,
    /// Core-complex-die count.
    pub ccds: usize,
    /// Core-complex count.
    pub ccxs: usize,
    /// Cores per CCX.
    pub cores_per_ccx: usize,
    /// Number of enabled cores. Must be non-zero before metrics are computed.
    pub enabled_cores: usize,
    /// Disabled-core bitmap: bit `i` set means core slot `i` is fused off.
    pub core_disable_map: u64,
    /// L3 cache instance count. Informational: table-indexed power sums use
    /// the decoded table's own declared count.
    pub l3_caches: usize,
    /// Populated memory channel count.
    pub memory_channels: usize,
}

impl Topology {
    /// Whether core slot `core` is disabled according to the fuse bitmap.
    #[must_use]
    pub const fn core_disabled(&self, core: usize) -> bool {
        (self.core_disable_map >> core) & 0x1 == 1
    }

    /// Validate the topology before metrics computation.
    ///
    /// Computing averages over a topology with zero enabled cores is
    /// undefined, so callers are expected to run this once after discovery.
    pub fn validate(&self) -> Result<(), SensorError> {
        if self.cores == 0 {
            return Err(SensorError::config("topology reports zero core slots"));
        }
        if self.enabled_cores == 0 {
            return Err(SensorError::config("topology reports zero enabled cores"));
        }
        if self.enabled_cores > self.cores {
            return Err(SensorError::config(format!(
                "enabled core count {} exceeds core slot count {}",
                self.enabled_cores, self.cores
            )));
        }
        Ok(())
    }
}

/// Readings for a single physical core slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoreRecord {
    /// Core slot index.
    pub core_num: usize,
    /// Effective core frequency in kHz.
    pub frequency: f32,
    /// Core power draw in watts.
    pub power: f32,
    /// Sleep-corrected core voltage in volts.
    pub voltage: f32,
    /// Core temperature in °C.
    pub temp: f32,
    /// C0 (active) residency in percent.
    pub c0: f32,
    /// CC1 (shallow sleep) residency in percent.
    pub cc1: f32,
    /// CC6 (deep sleep) residency in percent.
    pub cc6: f32,
    /// Whether this core slot is fused off.
    pub disabled: bool,
    /// Whether the core is effectively asleep (C0 residency below 6%).
    pub sleeping: bool,
}

/// Platform power-delivery and thermal constraint readings.
///
/// Fields that a firmware revision does not report read as NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConstraintsRecord {
    pub peak_temp: f32,
    pub soc_temp: f32,
    pub gfx_temp: f32,
    pub vid_value: f32,
    pub vid_limit: f32,
    pub ppt_value: f32,
    pub ppt_limit: f32,
    pub ppt_apu_value: f32,
    pub ppt_apu_limit: f32,
    pub tdc_value: f32,
    pub tdc_limit: f32,
    pub tdc_actual: f32,
    pub tdc_soc_value: f32,
    pub tdc_soc_limit: f32,
    /// Effective EDC, derived from the reported value and core usage.
    pub edc_value: f32,
    pub edc_limit: f32,
    pub edc_soc_value: f32,
    pub edc_soc_limit: f32,
    pub thm_value: f32,
    pub thm_limit: f32,
    pub thm_soc_value: f32,
    pub thm_soc_limit: f32,
    pub thm_gfx_value: f32,
    pub thm_gfx_limit: f32,
    pub fit_value: f32,
    pub fit_limit: f32,
}

/// Memory-subsystem clock and rail readings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MemoryRecord {
    /// Infinity Fabric clock in MHz.
    pub fclk_freq: f32,
    /// Effective Infinity Fabric clock in MHz.
    pub fclk_freq_eff: f32,
    /// Unified memory controller clock in MHz.
    pub uclk_freq: f32,
    /// Memory clock in MHz.
    pub memclk_freq: f32,
    pub v_vddm: f32,
    pub v_vddp: f32,
    pub v_vddg: f32,
    pub v_vddg_iod: f32,
    pub v_vddg_ccd: f32,
    /// True when UCLK and MEMCLK run in lockstep (bit-exact equality).
    pub coupled_mode: bool,
}

/// Power-rail readings across the package.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PowerRecord {
    /// Sum of per-core power over enabled cores, in watts.
    pub total_core_power: f32,
    pub vddcr_soc_power: f32,
    pub io_vddcr_soc_power: f32,
    pub gmi2_vddg_power: f32,
    pub roc_power: f32,
    /// L3 logic power summed across all L3 instances.
    pub l3_logic_power: f32,
    /// L3 VDDM power summed across all L3 instances.
    pub l3_vddm_power: f32,
    pub vddio_mem_power: f32,
    pub iod_vddio_mem_power: f32,
    pub ddr_vddp_power: f32,
    pub ddr_phy_power: f32,
    pub vdd18_power: f32,
    pub io_display_power: f32,
    pub io_usb_power: f32,
    pub socket_power: f32,
    pub package_power: f32,
    pub vddcr_cpu_power: f32,
    pub soc_telemetry_voltage: f32,
    pub soc_telemetry_current: f32,
    pub soc_telemetry_power: f32,
    pub cpu_telemetry_voltage: f32,
    pub cpu_telemetry_current: f32,
    pub cpu_telemetry_power: f32,
}

/// Integrated-graphics readings, present only on APU tables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GraphicsRecord {
    pub gfx_voltage: f32,
    pub roc_power: f32,
    pub gfx_temp: f32,
    pub gfx_freq: f32,
    pub gfx_freq_eff: f32,
    pub gfx_busy: f32,
    pub gfx_edc_lim: f32,
    pub gfx_edc_residency: f32,
    pub display_count: f32,
    pub fps: f32,
    pub dgpu_power: f32,
    pub dgpu_freq_target: f32,
    pub dgpu_gfx_busy: f32,
}

/// Aggregate statistics computed over enabled cores only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatsRecord {
    /// Highest enabled-core frequency in kHz.
    pub peak_core_frequency: f32,
    /// Highest enabled-core temperature in °C.
    pub peak_core_temp: f32,
    /// Highest sleep-corrected enabled-core voltage in volts.
    pub peak_core_voltage: f32,
    /// Average sleep-corrected voltage over enabled cores.
    pub avg_core_voltage: f32,
    /// Average CC6 residency over enabled cores.
    pub avg_core_cc6: f32,
    /// Sum of enabled-core power in watts.
    pub total_core_power: f32,
    /// Raw SMU telemetry voltage (uncorrected), in volts.
    pub peak_core_voltage_smu: f32,
    /// Package C6 residency in percent, NaN when the table omits it.
    pub package_cc6: f32,
}

/// Complete output of one decode-and-compute call.
///
/// All records are pure derived data, recomputed fresh each call; nothing
/// carries state between sampling ticks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReport {
    /// One record per processed core slot, disabled slots included.
    pub cores: Vec<CoreRecord>,
    pub constraints: ConstraintsRecord,
    pub memory: MemoryRecord,
    pub power: PowerRecord,
    /// Omitted entirely on tables without a graphics block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graphics: Option<GraphicsRecord>,
    pub stats: StatsRecord,
}

/// Comprehensive error type shared across the ryzenmon-rs crates.
#[derive(Error, Debug)]
pub enum SensorError {
    /// I/O error occurred while reading sensor data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing sensor data.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of what failed to parse
        message: String,
        /// Optional source error for chaining
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration error (invalid topology, bad caller input, etc.).
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration issue
        message: String,
    },

    /// Sensor is not available on this system.
    #[error("Sensor unavailable: {reason}")]
    Unavailable {
        /// Reason why the sensor is unavailable
        reason: String,
        /// Whether this is a temporary or permanent condition
        is_temporary: bool,
    },

    /// Invalid data format or unexpected values.
    #[error("Invalid data: {message}")]
    InvalidData {
        /// Description of what makes the data invalid
        message: String,
    },
}

impl SensorError {
    /// Create a new parse error with a simple message.
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new parse error with a source error.
    pub fn parse_with_source<S: Into<String>, E>(message: S, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Parse {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new invalid-data error.
    pub fn invalid_data<S: Into<String>>(message: S) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Create a new unavailable error.
    pub fn unavailable<S: Into<String>>(reason: S, is_temporary: bool) -> Self {
        Self::Unavailable {
            reason: reason.into(),
            is_temporary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn four_core_topology() -> Topology {
        Topology {
            cores: 4,
            ccds: 1,
            ccxs: 1,
            cores_per_ccx: 4,
            enabled_cores: 3,
            core_disable_map: 0b0100,
            l3_caches: 1,
            memory_channels: 2,
        }
    }

    #[test]
    fn disabled_bitmap_maps_bit_to_core() {
        let topo = four_core_topology();
        assert!(!topo.core_disabled(0));
        assert!(!topo.core_disabled(1));
        assert!(topo.core_disabled(2));
        assert!(!topo.core_disabled(3));
    }

    #[test]
    fn topology_validation_rejects_zero_enabled_cores() {
        let mut topo = four_core_topology();
        assert!(topo.validate().is_ok());

        topo.enabled_cores = 0;
        assert!(matches!(topo.validate(), Err(SensorError::Config { .. })));

        topo.enabled_cores = 5;
        assert!(matches!(topo.validate(), Err(SensorError::Config { .. })));
    }

    #[test]
    fn graphics_record_skipped_in_json_when_absent() {
        let report = SensorReport {
            cores: Vec::new(),
            constraints: ConstraintsRecord {
                peak_temp: 0.0,
                soc_temp: 0.0,
                gfx_temp: 0.0,
                vid_value: 0.0,
                vid_limit: 0.0,
                ppt_value: 0.0,
                ppt_limit: 0.0,
                ppt_apu_value: 0.0,
                ppt_apu_limit: 0.0,
                tdc_value: 0.0,
                tdc_limit: 0.0,
                tdc_actual: 0.0,
                tdc_soc_value: 0.0,
                tdc_soc_limit: 0.0,
                edc_value: 0.0,
                edc_limit: 0.0,
                edc_soc_value: 0.0,
                edc_soc_limit: 0.0,
                thm_value: 0.0,
                thm_limit: 0.0,
                thm_soc_value: 0.0,
                thm_soc_limit: 0.0,
                thm_gfx_value: 0.0,
                thm_gfx_limit: 0.0,
                fit_value: 0.0,
                fit_limit: 0.0,
            },
            memory: MemoryRecord {
                fclk_freq: 0.0,
                fclk_freq_eff: 0.0,
                uclk_freq: 0.0,
                memclk_freq: 0.0,
                v_vddm: 0.0,
                v_vddp: 0.0,
                v_vddg: 0.0,
                v_vddg_iod: 0.0,
                v_vddg_ccd: 0.0,
                coupled_mode: true,
            },
            power: PowerRecord {
                total_core_power: 0.0,
                vddcr_soc_power: 0.0,
                io_vddcr_soc_power: 0.0,
                gmi2_vddg_power: 0.0,
                roc_power: 0.0,
                l3_logic_power: 0.0,
                l3_vddm_power: 0.0,
                vddio_mem_power: 0.0,
                iod_vddio_mem_power: 0.0,
                ddr_vddp_power: 0.0,
                ddr_phy_power: 0.0,
                vdd18_power: 0.0,
                io_display_power: 0.0,
                io_usb_power: 0.0,
                socket_power: 0.0,
                package_power: 0.0,
                vddcr_cpu_power: 0.0,
                soc_telemetry_voltage: 0.0,
                soc_telemetry_current: 0.0,
                soc_telemetry_power: 0.0,
                cpu_telemetry_voltage: 0.0,
                cpu_telemetry_current: 0.0,
                cpu_telemetry_power: 0.0,
            },
            graphics: None,
            stats: StatsRecord {
                peak_core_frequency: 0.0,
                peak_core_temp: 0.0,
                peak_core_voltage: 0.0,
                avg_core_voltage: 0.0,
                avg_core_cc6: 0.0,
                total_core_power: 0.0,
                peak_core_voltage_smu: 0.0,
                package_cc6: 0.0,
            },
        };

        let json = serde_json::to_string(&report).expect("report serializes");
        assert!(!json.contains("\"graphics\""));
        assert!(json.contains("\"coupled_mode\":true"));
    }

    #[test]
    fn zen_generation_display() {
        assert_eq!(ZenGeneration::Zen2.to_string(), "Zen 2");
        assert_eq!(ZenGeneration::Zen3.to_string(), "Zen 3");
    }
}
