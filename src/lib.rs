//! SWC plugin that removes `@ungap/*` polyfill imports in favour of the native
//! globals they stand in for.
//!
//! ```js
//! import WeakMap from "@ungap/weakmap";   // removed
//! import assign from "@ungap/assign";     // var assign = Object.assign;
//! var M = require("@ungap/essential-map"); // removed, `M` becomes `Map`
//! ```
//!
//! Plugin config (JSON):
//! * `exclude`: module specifiers to leave alone. `@ungap/create-content`
//!   disables the `HAS_CONTENT` fold inside that package.
//! * `future`: opt-in entries of [`FUTURE_REPLACEMENTS`].

use swc_core::{
    common::Mark,
    ecma::{
        ast::{Pass, Program},
        visit::{visit_mut_pass, VisitMutWith},
    },
    plugin::{
        metadata::TransformPluginMetadataContextKind, plugin_transform,
        proxies::TransformPluginProgramMetadata,
    },
};

mod config;
mod error;
mod feature_flag;
mod replacements;
mod template;
mod transform;


pub use config::{EffectiveReplacements, PluginOptions};
pub use error::{Result, UngapError};
pub use feature_flag::is_create_content_entry;
pub use replacements::{
    future_replacement, CREATE_CONTENT, DEFAULT_REPLACEMENTS, FUTURE_REPLACEMENTS,
};
pub use template::{ReplacementExpr, ReplacementKind};
pub use transform::UngapTransform;

/// Build the transform as a [`Pass`] for hosts that run SWC in-process.
pub fn remove_ungap(
    options: &PluginOptions,
    filename: Option<&str>,
    unresolved_mark: Mark,
) -> Result<impl Pass> {
    UngapTransform::new(options, filename, unresolved_mark).map(visit_mut_pass)
}

// -----------------------------------------------------------------------------
// Entrypoint
// -----------------------------------------------------------------------------

#[plugin_transform]
pub fn process_transform(mut program: Program, metadata: TransformPluginProgramMetadata) -> Program {
    let options = metadata
        .get_transform_plugin_config()
        .map(|raw| PluginOptions::from_json(&raw))
        .unwrap_or_default();
    let filename = metadata.get_context(&TransformPluginMetadataContextKind::Filename);

    // A table entry that fails to parse is a bug in this crate; the host has no
    // error channel, so fail the whole transform.
    let mut transform =
        match UngapTransform::new(&options, filename.as_deref(), metadata.unresolved_mark) {
            Ok(transform) => transform,
            Err(err) => panic!("ungap: {err}"),
        };

    program.visit_mut_with(&mut transform);
    program
}
