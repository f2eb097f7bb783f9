//! Build script for ladle-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Parses and validates the node TOML, embeds it as postcard bytes

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use ladle_core::config::{ConfigError, NodeConfig};

fn main() {
    setup_linker();
    embed_config();
}

/// Set up linker search paths and scripts
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Node TOML selected by cargo feature
fn config_file() -> &'static str {
    if env::var_os("CARGO_FEATURE_NODE_B").is_some() {
        "node-b.toml"
    } else {
        "node-a.toml"
    }
}

/// Parse, validate and embed the node configuration
fn embed_config() {
    let file = config_file();
    println!("cargo:rerun-if-changed={}", file);

    let content = match fs::read_to_string(Path::new(file)) {
        Ok(content) => content,
        Err(e) => fail(file, &format!("cannot read file: {}", e)),
    };

    let config = match NodeConfig::from_toml(&content) {
        Ok(config) => config,
        Err(ConfigError::TomlParse) => {
            // Parse again for the error location
            let detail = match toml::from_str::<NodeConfig>(&content) {
                Err(e) => e.to_string(),
                Ok(_) => "TOML parse failed".to_string(),
            };
            fail(file, &detail)
        }
        Err(e) => fail(file, &format!("invalid configuration: {:?}", e)),
    };

    let bytes = match postcard::to_allocvec(&config) {
        Ok(bytes) => bytes,
        Err(e) => fail(file, &format!("cannot encode configuration: {}", e)),
    };

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    fs::write(out_dir.join("node_config.bin"), &bytes).unwrap();

    println!(
        "cargo:warning={} validated ({} axes, {} modules, {} bytes)",
        file,
        config.axes.len(),
        config.modules.len(),
        bytes.len()
    );
}

/// Abort the build with a boxed error
fn fail(file: &str, msg: &str) -> ! {
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        file,
        format_error_lines(msg)
    );
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
