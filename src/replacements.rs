// -----------------------------------------------------------------------------
// Replacement tables
// -----------------------------------------------------------------------------

/// Specifier that toggles the `HAS_CONTENT` fold instead of mapping to an expression.
pub const CREATE_CONTENT: &str = "@ungap/create-content";

/// Polyfill modules replaced on every run: (module specifier, native expression).
pub const DEFAULT_REPLACEMENTS: &[(&str, &str)] = &[
    ("@ungap/assign", "Object.assign"),
    ("@ungap/array-iterator", "Array.prototype[Symbol.iterator]"),
    ("@ungap/custom-event", "CustomEvent"),
    ("@ungap/essential-map", "Map"),
    ("@ungap/essential-set", "Set"),
    ("@ungap/essential-symbol", "Symbol"),
    ("@ungap/essential-weakset", "WeakSet"),
    ("@ungap/event", "Event"),
    ("@ungap/event-target", "EventTarget"),
    ("@ungap/import-node", "document.importNode"),
    ("@ungap/is-array", "Array.isArray"),
    ("@ungap/map", "Map"),
    ("@ungap/set", "Set"),
    ("@ungap/template-literal", "val => val"),
    ("@ungap/trim", "String.prototype.trim"),
    ("@ungap/weakmap", "WeakMap"),
    ("@ungap/weakset", "WeakSet"),
];

/// Opt-in replacements, activated per run through the `future` option.
pub const FUTURE_REPLACEMENTS: &[(&str, &str)] = &[
    ("@ungap/global-this", "globalThis"),
    ("@ungap/promise-all-settled", "Promise.allSettled.bind(Promise)"),
    ("@ungap/url-search-params", "URLSearchParams"),
];

fn lookup(table: &'static [(&'static str, &'static str)], specifier: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(module, _)| *module == specifier)
        .map(|(_, expr)| *expr)
}

pub fn future_replacement(specifier: &str) -> Option<&'static str> {
    lookup(FUTURE_REPLACEMENTS, specifier)
}
