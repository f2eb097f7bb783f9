//! Node configuration loading
//!
//! The node TOML is validated and encoded at build time; here the bytes are
//! decoded again. A failure falls back to the calibrated preset for the
//! node selected by cargo feature.

use defmt::*;
use ladle_core::config::NodeConfig;

/// Configuration embedded by build.rs (postcard)
const EMBEDDED_CONFIG: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/node_config.bin"));

/// Load the embedded configuration, or the preset if it does not decode
pub fn load_config() -> NodeConfig {
    match NodeConfig::from_postcard(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!(
                "Loaded embedded configuration: address {}, {} axes, {} modules",
                config.address,
                config.axes.len(),
                config.modules.len()
            );
            config
        }
        Err(e) => {
            error!("Embedded configuration rejected: {}", e);
            error!("Using built-in preset");
            preset()
        }
    }
}

#[cfg(feature = "node-b")]
fn preset() -> NodeConfig {
    NodeConfig::lids_node()
}

#[cfg(not(feature = "node-b"))]
fn preset() -> NodeConfig {
    NodeConfig::containers_node()
}
