use std::collections::HashMap;

use serde::Deserialize;

use crate::replacements::{future_replacement, CREATE_CONTENT, DEFAULT_REPLACEMENTS};

/// Options passed by the host as the plugin's JSON config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PluginOptions {
    /// Module specifiers to leave alone. `@ungap/create-content` disables the
    /// `HAS_CONTENT` fold.
    pub exclude: Vec<String>,
    /// Entries of the future table to enable for this run.
    pub future: Vec<String>,
}

impl PluginOptions {
    /// Parse the raw config string. Malformed JSON falls back to the defaults.
    pub fn from_json(raw: &str) -> Self {
        match serde_json::from_str(raw) {
            Ok(opts) => opts,
            Err(err) => {
                tracing::warn!(%err, "ungap: ignoring malformed plugin config");
                Self::default()
            }
        }
    }
}

/// The table consulted for one traversal: defaults, plus requested future
/// entries, minus exclusions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveReplacements {
    table: HashMap<String, &'static str>,
    create_content_enabled: bool,
}

impl EffectiveReplacements {
    pub fn resolve(opts: &PluginOptions) -> Self {
        let mut table: HashMap<String, &'static str> = DEFAULT_REPLACEMENTS
            .iter()
            .map(|(module, expr)| (module.to_string(), *expr))
            .collect();
        let mut create_content_enabled = true;

        for module in &opts.future {
            match future_replacement(module) {
                Some(expr) => {
                    table.insert(module.clone(), expr);
                }
                None => tracing::debug!(module = %module, "ungap: unknown future module"),
            }
        }

        // Exclusion runs last so it always wins over `future`.
        for module in &opts.exclude {
            if module == CREATE_CONTENT {
                create_content_enabled = false;
                continue;
            }
            if table.remove(module.as_str()).is_none() {
                tracing::debug!(module = %module, "ungap: excluded module was not active");
            }
        }

        Self {
            table,
            create_content_enabled,
        }
    }

    pub fn get(&self, specifier: &str) -> Option<&'static str> {
        self.table.get(specifier).copied()
    }

    pub fn create_content_enabled(&self) -> bool {
        self.create_content_enabled
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &'static str)> + '_ {
        self.table.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl Default for EffectiveReplacements {
    fn default() -> Self {
        Self::resolve(&PluginOptions::default())
    }
}
