//! Fuzz target for `sqlvis.toml` parsing.
//!
//! Malformed TOML, unknown keys and odd exclusion lists must come back as
//! errors, never panics.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use std::path::Path;

use sqlvis::config::ViewerConfig;

#[derive(Arbitrary, Debug)]
struct ConfigInput {
    /// Raw file content
    toml_content: String,
    /// Extra `--exclude` values folded in after parsing
    excludes: Vec<String>,
}

fuzz_target!(|input: ConfigInput| {
    let Ok(mut config) = ViewerConfig::from_toml(&input.toml_content, Path::new("fuzz.toml")) else {
        return;
    };
    config.add_excludes(input.excludes.as_slice());
    let _ = config.validate();
    assert!(config.exclude.iter().all(|name| !name.is_empty()));
});
