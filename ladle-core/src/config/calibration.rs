//! Calibrated node presets
//!
//! Geometry and timing measured on the production line. The firmware uses
//! these when no TOML configuration was embedded at build time.

use heapless::{String, Vec};

use super::types::*;

/// Bus address of the containers node
pub const CONTAINERS_ADDRESS: u8 = 1;

/// Bus address of the lids node
pub const LIDS_ADDRESS: u8 = 2;

/// Fork stroke in steps
const FORK_STROKE: i32 = 200;

/// Stamp stroke in steps
const STAMP_STROKE: i32 = 400;

fn label(s: &str) -> String<MAX_LABEL_LEN> {
    let mut out = String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

fn axis(
    name: &str,
    home_position: i32,
    target_position: i32,
    full_stroke_ms: u16,
    slot: RecoverySlot,
) -> AxisConfig {
    AxisConfig {
        name: label(name),
        home_position,
        target_position,
        max_speed: 200,
        acceleration: 600,
        full_stroke_ms,
        stall_timeout_ms: 5_000,
        replay_speed: 200,
        slot,
    }
}

fn module(name: &str, kind: ModuleKind, offset: u16) -> ModuleConfig {
    ModuleConfig {
        name: label(name),
        kind,
        offset,
    }
}

impl NodeConfig {
    /// Containers node: container fork pair and sauce pump
    ///
    /// The U-fork rests at 200 and opens toward 0; the C-fork rests at 0 and
    /// opens toward 200. The C-fork leads.
    pub fn containers_node() -> Self {
        let mut axes = Vec::new();
        let _ = axes.push(axis("u_fork", FORK_STROKE, 0, 400, RecoverySlot::new(14, 16)));
        let _ = axes.push(axis("c_fork", 0, FORK_STROKE, 400, RecoverySlot::new(18, 20)));

        let mut modules = Vec::new();
        let _ = modules.push(module(
            "containers",
            ModuleKind::ForkPair {
                lead: 1,
                follower: 0,
                hold_ms: 250,
            },
            0,
        ));
        let _ = modules.push(module("pump", ModuleKind::Pump, 1));

        let mut duties = Vec::new();
        for (item, duty) in [(1, 150), (2, 180), (3, 200), (4, 220)] {
            let _ = duties.push(ItemDuty { item, duty });
        }

        NodeConfig {
            version: CONFIG_VERSION,
            address: CONTAINERS_ADDRESS,
            axes,
            modules,
            pump: Some(PumpConfig {
                duties,
                dispense_ms: 1_000,
                purge_ms: 1_000,
                clean_ms: 30_000,
                clean_duty: 255,
                boot_purge_ms: 500,
                boot_purge_duty: 150,
            }),
            timing: TimingConfig::default(),
        }
    }

    /// Lids node: lid fork pair and lid stamp
    pub fn lids_node() -> Self {
        let mut axes = Vec::new();
        let _ = axes.push(axis("u_fork", FORK_STROKE, 0, 200, RecoverySlot::new(2, 4)));
        let _ = axes.push(axis("c_fork", 0, FORK_STROKE, 200, RecoverySlot::new(6, 8)));
        let _ = axes.push(axis("stamp", 0, STAMP_STROKE, 200, RecoverySlot::new(10, 12)));

        let mut modules = Vec::new();
        let _ = modules.push(module(
            "lids",
            ModuleKind::ForkPair {
                lead: 1,
                follower: 0,
                hold_ms: 250,
            },
            2,
        ));
        let _ = modules.push(module(
            "stamp",
            ModuleKind::Stamp {
                axis: 2,
                hold_ms: 100,
            },
            3,
        ));

        NodeConfig {
            version: CONFIG_VERSION,
            address: LIDS_ADDRESS,
            axes,
            modules,
            pump: None,
            timing: TimingConfig::default(),
        }
    }
}
