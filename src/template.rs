use lazy_static::lazy_static;
use regex::Regex;
use swc_core::{
    common::{sync::Lrc, FileName, SourceMap, Span, SyntaxContext, DUMMY_SP},
    ecma::{
        ast::{EsVersion, Expr, Ident},
        parser::{parse_file_as_expr, Syntax},
        visit::{VisitMut, VisitMutWith},
    },
};

use crate::error::{Result, UngapError};

lazy_static! {
    static ref LETTERS_ONLY: Regex = Regex::new(r"^[a-zA-Z]*$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacementKind {
    /// A bare global name; every use of the local binding can be swapped for it.
    Identifier,
    /// Anything else; only the declaration's initializer is replaced.
    Complex,
}

impl ReplacementKind {
    pub fn classify(text: &str) -> Self {
        if LETTERS_ONLY.is_match(text) {
            ReplacementKind::Identifier
        } else {
            ReplacementKind::Complex
        }
    }
}

/// A replacement expression parsed once per run and cloned per use site.
#[derive(Debug, Clone)]
pub struct ReplacementExpr {
    text: &'static str,
    kind: ReplacementKind,
    expr: Box<Expr>,
}

impl ReplacementExpr {
    /// Parse `text` into an expression whose identifiers all carry `global_ctxt`,
    /// so they resolve to the environment's globals rather than a local binding.
    pub fn parse(module: &str, text: &'static str, global_ctxt: SyntaxContext) -> Result<Self> {
        let malformed = || UngapError::MalformedReplacement {
            module: module.to_string(),
            text: text.to_string(),
        };

        let cm: Lrc<SourceMap> = Default::default();
        let fm = cm.new_source_file(Lrc::new(FileName::Anon), text.to_string());
        let mut recovered = vec![];
        let mut expr = parse_file_as_expr(
            &fm,
            Syntax::Es(Default::default()),
            EsVersion::latest(),
            None,
            &mut recovered,
        )
        .map_err(|_| malformed())?;
        if !recovered.is_empty() {
            return Err(malformed());
        }

        expr.visit_mut_with(&mut Detach { global_ctxt });

        Ok(Self {
            text,
            kind: ReplacementKind::classify(text),
            expr,
        })
    }

    pub fn text(&self) -> &'static str {
        self.text
    }

    pub fn kind(&self) -> ReplacementKind {
        self.kind
    }

    /// A fresh copy for one call site; no node is shared between sites.
    pub fn instantiate(&self) -> Box<Expr> {
        self.expr.clone()
    }
}

/// Strips positions from the scratch source map and pins identifiers to the
/// unresolved context.
struct Detach {
    global_ctxt: SyntaxContext,
}

impl VisitMut for Detach {
    fn visit_mut_span(&mut self, span: &mut Span) {
        *span = DUMMY_SP;
    }

    fn visit_mut_ident(&mut self, ident: &mut Ident) {
        ident.span = DUMMY_SP;
        ident.ctxt = self.global_ctxt;
    }
}
