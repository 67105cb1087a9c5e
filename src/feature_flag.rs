//! `HAS_CONTENT` folding for `@ungap/create-content`.
//!
//! The module probes `'content' in document` at load time. When the caller has
//! opted into native `<template>` support the probe is folded to `true`.

use swc_core::{
    common::DUMMY_SP,
    ecma::ast::{Bool, Expr, Lit, VarDeclarator},
};

pub const HAS_CONTENT: &str = "HAS_CONTENT";

const DEPENDENCY_DIR: &str = "node_modules";

/// Entry points of the module, relative to the dependency directory.
const CREATE_CONTENT_ENTRIES: &[&str] = &[
    "@ungap/create-content/index.js",
    "@ungap/create-content/cjs/index.js",
    "@ungap/create-content/esm/index.js",
];

/// Whether `filename` is one of the module's entry files inside `node_modules`.
pub fn is_create_content_entry(filename: &str) -> bool {
    let normalized = filename.replace('\\', "/");
    let segments: Vec<&str> = normalized.split('/').collect();
    let Some(anchor) = segments.iter().rposition(|seg| *seg == DEPENDENCY_DIR) else {
        return false;
    };
    let relative = segments[anchor + 1..].join("/");
    CREATE_CONTENT_ENTRIES.contains(&relative.as_str())
}

/// Replace the initializer of `var HAS_CONTENT = …` with `true`. Returns whether
/// the declarator was rewritten.
pub fn fold_has_content(decl: &mut VarDeclarator) -> bool {
    let Some(name) = decl.name.as_ident() else {
        return false;
    };
    if name.id.sym.as_ref() != HAS_CONTENT {
        return false;
    }
    let Some(init) = decl.init.as_mut() else {
        return false;
    };
    **init = Expr::Lit(Lit::Bool(Bool {
        span: DUMMY_SP,
        value: true,
    }));
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_known_entry_points() {
        assert!(is_create_content_entry("node_modules/@ungap/create-content/index.js"));
        assert!(is_create_content_entry("node_modules/@ungap/create-content/cjs/index.js"));
        assert!(is_create_content_entry("node_modules/@ungap/create-content/esm/index.js"));
        assert!(is_create_content_entry(
            "/home/me/app/node_modules/@ungap/create-content/esm/index.js"
        ));
    }

    #[test]
    fn normalizes_windows_separators() {
        assert!(is_create_content_entry(
            r"C:\app\node_modules\@ungap\create-content\cjs\index.js"
        ));
    }

    #[test]
    fn rejects_other_paths() {
        assert!(!is_create_content_entry("node_modules/@ungap/something-else/esm/index.js"));
        assert!(!is_create_content_entry("@ungap/create-content/esm/index.js"));
        assert!(!is_create_content_entry("node_modules/@ungap/create-content/esm/other.js"));
        assert!(!is_create_content_entry("my_node_modules/@ungap/create-content/index.js"));
        assert!(!is_create_content_entry(""));
    }

    #[test]
    fn nested_dependency_uses_innermost_node_modules() {
        assert!(is_create_content_entry(
            "node_modules/pkg/node_modules/@ungap/create-content/index.js"
        ));
        assert!(!is_create_content_entry(
            "node_modules/@ungap/create-content/node_modules/x/index.js"
        ));
    }
}
