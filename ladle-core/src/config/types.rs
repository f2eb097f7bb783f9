//! Configuration type definitions
//!
//! These types describe one station node: its axes, the mechanical modules
//! built from them, the pump calibration and the loop timing.

use heapless::{String, Vec};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Current configuration format version
pub const CONFIG_VERSION: u8 = 1;

/// Maximum label length
pub const MAX_LABEL_LEN: usize = 16;

/// Maximum axes per node
pub const MAX_AXES: usize = 4;

/// Maximum modules per node
pub const MAX_MODULES: usize = 4;

/// Maximum entries in the pump duty table
pub const MAX_ITEMS: usize = 8;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Unsupported configuration version
    VersionMismatch(u8),
    /// Two axes share a name
    DuplicateAxisName(u8),
    /// Two recovery cells overlap (axis indices)
    SlotCollision(u8, u8),
    /// A module references an axis index that does not exist
    UnknownAxis { module: u8, axis: u8 },
    /// A fork pair uses the same axis twice
    SameAxisTwice { module: u8 },
    /// An axis is already driven by an earlier module
    AxisShared { axis: u8, module: u8 },
    /// More than one pump module is configured
    DuplicatePump { module: u8 },
    /// Axis speed or acceleration is zero
    ZeroSpeed(u8),
    /// Axis home and target positions are equal
    ZeroStroke(u8),
    /// Pass period is zero
    ZeroPassPeriod,
    /// A pump module is configured but the node has no pump calibration
    MissingPump { module: u8 },
    /// Fewer motors were supplied than the node has axes
    MissingMotor(u8),
    /// Binary config could not be decoded
    Deserialize,
    /// TOML config could not be parsed
    TomlParse,
}

/// Pair of recovery store cells holding an axis's last leg
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RecoverySlot {
    /// Byte address of the elapsed-time word
    pub elapsed_addr: u16,
    /// Byte address of the direction word
    pub direction_addr: u16,
}

impl RecoverySlot {
    /// Create a new slot
    pub const fn new(elapsed_addr: u16, direction_addr: u16) -> Self {
        Self {
            elapsed_addr,
            direction_addr,
        }
    }

    /// Byte addresses of both words
    pub const fn words(&self) -> [u16; 2] {
        [self.elapsed_addr, self.direction_addr]
    }

    /// Check if either word of this slot overlaps a word of `other`
    ///
    /// Words are two bytes wide, so addresses closer than 2 collide.
    pub fn overlaps(&self, other: &RecoverySlot) -> bool {
        self.words()
            .iter()
            .any(|a| other.words().iter().any(|b| a.abs_diff(*b) < 2))
    }

    /// Check if the two words of this slot overlap each other
    pub fn is_self_overlapping(&self) -> bool {
        self.elapsed_addr.abs_diff(self.direction_addr) < 2
    }
}

/// Stepper axis configuration
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AxisConfig {
    /// Axis name (e.g., "u_fork", "c_fork", "stamp")
    pub name: String<MAX_LABEL_LEN>,
    /// Rest position in steps (where the axis is at boot)
    pub home_position: i32,
    /// Outbound target position in steps
    pub target_position: i32,
    /// Maximum speed in steps/s
    pub max_speed: u32,
    /// Acceleration in steps/s²
    pub acceleration: u32,
    /// Calibrated duration of a full stroke in ms
    pub full_stroke_ms: u16,
    /// A leg taking longer than this is reported as a stall
    pub stall_timeout_ms: u32,
    /// Open-loop speed used when replaying a recovery record (steps/s)
    pub replay_speed: u32,
    /// Recovery store cells for this axis
    pub slot: RecoverySlot,
}

impl AxisConfig {
    /// Stroke length in steps
    pub fn stroke(&self) -> u32 {
        self.target_position.abs_diff(self.home_position)
    }
}

/// Mechanical module kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ModuleKind {
    /// Two forks that separate one item from a stack
    ///
    /// The lead fork opens first, then the follower; both return in
    /// reverse order.
    ForkPair {
        /// Axis index of the fork that moves first
        lead: u8,
        /// Axis index of the paired fork
        follower: u8,
        /// Pause at each fork's target (ms)
        hold_ms: u32,
    },
    /// Single axis that presses and returns
    Stamp {
        /// Axis index
        axis: u8,
        /// Dwell at the bottom of the stroke (ms)
        hold_ms: u32,
    },
    /// Sauce pump (uses the node's pump calibration)
    Pump,
}

/// Module configuration
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModuleConfig {
    /// Module name
    pub name: String<MAX_LABEL_LEN>,
    /// What the module does
    pub kind: ModuleKind,
    /// Pipeline offset: passes between order start and this module's
    /// first unit (conveyor lag from the head of the line)
    pub offset: u16,
}

/// Pump duty for one item code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ItemDuty {
    /// Item code as sent by the head unit
    pub item: i16,
    /// PWM duty (0-255)
    pub duty: u8,
}

/// Pump calibration
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PumpConfig {
    /// Duty lookup table by item code
    pub duties: Vec<ItemDuty, MAX_ITEMS>,
    /// Dispense stroke duration (ms)
    pub dispense_ms: u32,
    /// Reverse purge stroke duration after the last unit (ms)
    pub purge_ms: u32,
    /// Clean-in-place run duration (ms)
    pub clean_ms: u32,
    /// Clean-in-place duty (0-255)
    pub clean_duty: u8,
    /// Reverse run at power-up to clear the line (ms, 0 = disabled)
    pub boot_purge_ms: u32,
    /// Duty of the power-up reverse run
    pub boot_purge_duty: u8,
}

impl PumpConfig {
    /// Look up the duty for an item code
    pub fn duty_for(&self, item: i16) -> Option<u8> {
        self.duties.iter().find(|d| d.item == item).map(|d| d.duty)
    }
}

/// Control loop timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimingConfig {
    /// Conveyor pitch: shortest time from one pass start to the next (ms)
    ///
    /// Every node on the line must use the same value so that their pass
    /// counters advance together.
    pub pass_period_ms: u32,
    /// Wait after each pass's last move before the next pass (ms)
    pub settle_ms: u32,
    /// Minimum interval between recovery writes during a leg (ms)
    pub persist_interval_ms: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            pass_period_ms: 7_000,
            settle_ms: 500,
            persist_interval_ms: 50,
        }
    }
}

/// Complete node configuration
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeConfig {
    /// Config format version
    pub version: u8,
    /// 7-bit bus address of this node
    pub address: u8,
    /// Stepper axes, referenced by index from modules
    pub axes: Vec<AxisConfig, MAX_AXES>,
    /// Mechanical modules in this node
    pub modules: Vec<ModuleConfig, MAX_MODULES>,
    /// Pump calibration (nodes without a pump leave this empty)
    pub pump: Option<PumpConfig>,
    /// Loop timing
    pub timing: TimingConfig,
}

impl NodeConfig {
    /// Find an axis by name
    pub fn find_axis(&self, name: &str) -> Option<(usize, &AxisConfig)> {
        self.axes.iter().enumerate().find(|(_, a)| a.name == name)
    }

    /// Check the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::VersionMismatch(self.version));
        }
        if self.timing.pass_period_ms == 0 {
            return Err(ConfigError::ZeroPassPeriod);
        }

        for (i, axis) in self.axes.iter().enumerate() {
            let idx = i as u8;
            if axis.max_speed == 0 || axis.acceleration == 0 || axis.replay_speed == 0 {
                return Err(ConfigError::ZeroSpeed(idx));
            }
            if axis.stroke() == 0 {
                return Err(ConfigError::ZeroStroke(idx));
            }
            if axis.slot.is_self_overlapping() {
                return Err(ConfigError::SlotCollision(idx, idx));
            }
            for (j, other) in self.axes.iter().enumerate().skip(i + 1) {
                if other.name == axis.name {
                    return Err(ConfigError::DuplicateAxisName(j as u8));
                }
                if axis.slot.overlaps(&other.slot) {
                    return Err(ConfigError::SlotCollision(idx, j as u8));
                }
            }
        }

        let axis_count = self.axes.len() as u8;
        // Module that drives each axis
        let mut owner: [Option<u8>; MAX_AXES] = [None; MAX_AXES];
        let mut pump_module = None;
        for (i, module) in self.modules.iter().enumerate() {
            let m = i as u8;
            let (first, second) = match module.kind {
                ModuleKind::ForkPair { lead, follower, .. } => {
                    if lead == follower && lead < axis_count {
                        return Err(ConfigError::SameAxisTwice { module: m });
                    }
                    (lead, Some(follower))
                }
                ModuleKind::Stamp { axis, .. } => (axis, None),
                ModuleKind::Pump => {
                    if self.pump.is_none() {
                        return Err(ConfigError::MissingPump { module: m });
                    }
                    if pump_module.replace(m).is_some() {
                        return Err(ConfigError::DuplicatePump { module: m });
                    }
                    continue;
                }
            };
            for axis in core::iter::once(first).chain(second) {
                if axis >= axis_count {
                    return Err(ConfigError::UnknownAxis { module: m, axis });
                }
                let slot = &mut owner[axis as usize];
                if slot.is_some() {
                    return Err(ConfigError::AxisShared { axis, module: m });
                }
                *slot = Some(m);
            }
        }

        Ok(())
    }

    /// Decode a postcard-serialized configuration and validate it
    #[cfg(feature = "serde")]
    pub fn from_postcard(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: NodeConfig =
            postcard::from_bytes(bytes).map_err(|_| ConfigError::Deserialize)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML configuration and validate it
    #[cfg(feature = "toml")]
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: NodeConfig = toml::from_str(text).map_err(|_| ConfigError::TomlParse)?;
        config.validate()?;
        Ok(config)
    }
}
