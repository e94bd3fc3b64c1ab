// src/generators/presets.rs

//! CMakePresets.json written alongside the toolchain
//!
//! Lets a developer reproduce the orchestrated configure with
//! `cmake --preset <name>` from the source folder.

use super::GeneratorContext;
use crate::error::Result;
use serde_json::{Map, Value, json};

/// Preset name for a build type, e.g. `release`
fn preset_name(build_type: &str) -> String {
    build_type.to_ascii_lowercase()
}

pub fn render_presets(ctx: &GeneratorContext<'_>) -> Result<String> {
    let layout = ctx.layout;
    let name = preset_name(&layout.build_type);

    let mut cache_variables = Map::new();
    for (key, value) in ctx.recipe.cmake_variables(ctx.settings) {
        cache_variables.insert(key, Value::String(value));
    }
    if !layout.multi_config {
        cache_variables.insert(
            "CMAKE_BUILD_TYPE".to_string(),
            Value::String(layout.build_type.clone()),
        );
    }

    let mut configure = json!({
        "name": name,
        "displayName": format!("{} {}", ctx.recipe.reference(), layout.build_type),
        "binaryDir": layout.build_folder.to_string_lossy().replace('\\', "/"),
        "toolchainFile": layout.toolchain_file().to_string_lossy().replace('\\', "/"),
        "cacheVariables": Value::Object(cache_variables),
    });
    if let Some(platform) = super::generator_platform(ctx.settings)
        && let Some(obj) = configure.as_object_mut()
    {
        obj.insert(
            "architecture".to_string(),
            json!({ "value": platform, "strategy": "set" }),
        );
    }

    let mut build = json!({ "name": name, "configurePreset": name });
    let mut test = json!({
        "name": name,
        "configurePreset": name,
        "output": { "outputOnFailure": true },
    });
    if layout.multi_config {
        for preset in [&mut build, &mut test] {
            if let Some(obj) = preset.as_object_mut() {
                obj.insert("configuration".to_string(), Value::String(layout.build_type.clone()));
            }
        }
    }

    let presets = json!({
        "version": 3,
        "cmakeMinimumRequired": { "major": 3, "minor": 21, "patch": 0 },
        "configurePresets": [configure],
        "buildPresets": [build],
        "testPresets": [test],
    });

    let mut text = serde_json::to_string_pretty(&presets)?;
    text.push('\n');
    Ok(text)
}
