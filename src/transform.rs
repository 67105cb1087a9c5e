use std::collections::{HashMap, HashSet};

use swc_core::{
    common::{Mark, Span, SyntaxContext, DUMMY_SP},
    ecma::{
        ast::*,
        utils::find_pat_ids,
        visit::{Visit, VisitMut, VisitMutWith, VisitWith},
    },
};

use crate::{
    config::{EffectiveReplacements, PluginOptions},
    error::Result,
    feature_flag::{fold_has_content, is_create_content_entry},
    template::{ReplacementExpr, ReplacementKind},
};

// -----------------------------------------------------------------------------
// Transform state
// -----------------------------------------------------------------------------

/// Replaces default imports and `require` calls of `@ungap/*` polyfills with the
/// native globals they stand in for.
///
/// The program must already carry resolver marks: bindings are told apart by
/// their `SyntaxContext`, and `require` only counts when it is the free global.
pub struct UngapTransform {
    templates: HashMap<String, ReplacementExpr>,
    fold_has_content: bool,
    global_ctxt: SyntaxContext,
}

impl UngapTransform {
    pub fn new(
        options: &PluginOptions,
        filename: Option<&str>,
        unresolved_mark: Mark,
    ) -> Result<Self> {
        let replacements = EffectiveReplacements::resolve(options);
        let global_ctxt = SyntaxContext::empty().apply_mark(unresolved_mark);

        let templates = replacements
            .iter()
            .map(|(module, text)| {
                Ok((module.to_string(), ReplacementExpr::parse(module, text, global_ctxt)?))
            })
            .collect::<Result<HashMap<_, _>>>()?;

        let fold_has_content = replacements.create_content_enabled()
            && filename.is_some_and(is_create_content_entry);

        Ok(Self {
            templates,
            fold_has_content,
            global_ctxt,
        })
    }
}

impl VisitMut for UngapTransform {
    fn visit_mut_program(&mut self, program: &mut Program) {
        // Pass 1: decide what happens to every import/require site.
        let mut collector = SiteCollector {
            templates: &self.templates,
            global_ctxt: self.global_ctxt,
            sites: vec![],
            declarations: HashMap::new(),
            pinned: HashSet::new(),
        };
        program.visit_with(&mut collector);
        let plan = collector.finish();

        // Pass 2: rewrite every use site, swap initializers, drop redundant sites.
        let mut rewriter = Rewriter {
            plan: &plan,
            fold_has_content: self.fold_has_content,
        };
        program.visit_mut_with(&mut rewriter);

        // Pass 3: only now that no reference is left, remove the deferred sites.
        if !plan.deferred.is_empty() {
            program.visit_mut_with(&mut Prune {
                sites: &plan.deferred,
            });
        }
    }
}

/// Decisions for one traversal. Sites are keyed by the span of the import or
/// declarator that was recorded, references by the binding of the local name.
#[derive(Default)]
struct RewritePlan {
    /// The local name already spells the replacement; the site just goes away.
    redundant: HashSet<Span>,
    /// Identifier replacements: every reference to the binding is rewritten.
    pending: HashMap<Id, ReplacementExpr>,
    /// Sites of `pending` bindings, removed once every reference is gone.
    deferred: HashSet<Span>,
    /// Expression replacements: the initializer is swapped, the name kept.
    initializers: HashMap<Span, ReplacementExpr>,
}

impl RewritePlan {
    fn is_site(&self, span: &Span) -> bool {
        self.redundant.contains(span)
            || self.deferred.contains(span)
            || self.initializers.contains_key(span)
    }
}

// -----------------------------------------------------------------------------
// Shape helpers
// -----------------------------------------------------------------------------

/// The local name of `import X from "…"`; `None` for any other import shape.
fn default_import_local(import: &ImportDecl) -> Option<&Ident> {
    if import.type_only || import.specifiers.len() != 1 {
        return None;
    }
    match &import.specifiers[0] {
        ImportSpecifier::Default(default) => Some(&default.local),
        _ => None,
    }
}

/// The module of `require("…")` when `require` is the free global.
fn required_module(expr: &Expr, global_ctxt: SyntaxContext) -> Option<&str> {
    let Expr::Call(call) = expr else {
        return None;
    };
    let Callee::Expr(callee) = &call.callee else {
        return None;
    };
    let Expr::Ident(callee) = &**callee else {
        return None;
    };
    if callee.sym.as_ref() != "require" || callee.ctxt != global_ctxt || call.args.len() != 1 {
        return None;
    }
    let arg = &call.args[0];
    match (&arg.spread, &*arg.expr) {
        (None, Expr::Lit(Lit::Str(module))) => Some(module.value.as_ref()),
        _ => None,
    }
}

/// The binding declared by `var X = require("…")`.
fn require_site(decl: &VarDeclarator, global_ctxt: SyntaxContext) -> Option<(&Ident, &str)> {
    let name = decl.name.as_ident()?;
    let module = required_module(decl.init.as_deref()?, global_ctxt)?;
    Some((&name.id, module))
}

fn is_empty_var(decl: &Decl) -> bool {
    matches!(decl, Decl::Var(var) if var.decls.is_empty())
}

// -----------------------------------------------------------------------------
// Pass 1: site collection
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SiteAction {
    Remove,
    Rename,
    ReplaceInit,
}

struct Site {
    id: Id,
    span: Span,
    action: SiteAction,
    template: ReplacementExpr,
}

struct SiteCollector<'a> {
    templates: &'a HashMap<String, ReplacementExpr>,
    global_ctxt: SyntaxContext,
    sites: Vec<Site>,
    /// Declarations per binding. A binding declared more than once cannot
    /// have its site dropped without changing what the other declarations mean.
    declarations: HashMap<Id, usize>,
    /// Bindings referenced where an identifier cannot become another
    /// identifier: export lists, exported declarations, JSX tags, pattern
    /// shorthands.
    pinned: HashSet<Id>,
}

impl SiteCollector<'_> {
    fn record(&mut self, local: &Ident, span: Span, module: &str) {
        let Some(template) = self.templates.get(module) else {
            return;
        };
        if span.is_dummy() {
            tracing::debug!(module, local = %local.sym, "ungap: skipping site without a span");
            return;
        }

        let action = if local.sym.as_ref() == template.text() {
            SiteAction::Remove
        } else if template.kind() == ReplacementKind::Identifier {
            SiteAction::Rename
        } else {
            SiteAction::ReplaceInit
        };
        self.sites.push(Site {
            id: local.to_id(),
            span,
            action,
            template: template.clone(),
        });
    }

    fn declare(&mut self, ids: impl IntoIterator<Item = Id>) {
        for id in ids {
            *self.declarations.entry(id).or_default() += 1;
        }
    }

    fn finish(self) -> RewritePlan {
        let mut plan = RewritePlan::default();
        for Site {
            id,
            span,
            action,
            template,
        } in self.sites
        {
            let shared = self.declarations.get(&id).copied().unwrap_or_default() > 1;
            let fixed = shared || self.pinned.contains(&id);

            match action {
                SiteAction::Remove if fixed => {
                    tracing::debug!(local = %id.0, "ungap: keeping redundant binding in use elsewhere");
                }
                SiteAction::Remove => {
                    tracing::debug!(local = %id.0, "ungap: removing redundant binding");
                    plan.redundant.insert(span);
                }
                SiteAction::Rename if !fixed => {
                    tracing::debug!(local = %id.0, global = template.text(), "ungap: renaming binding");
                    plan.deferred.insert(span);
                    plan.pending.insert(id, template);
                }
                SiteAction::Rename | SiteAction::ReplaceInit => {
                    tracing::debug!(local = %id.0, "ungap: replacing initializer");
                    plan.initializers.insert(span, template);
                }
            }
        }
        plan
    }
}

impl Visit for SiteCollector<'_> {
    fn visit_import_decl(&mut self, import: &ImportDecl) {
        self.declare(import.specifiers.iter().map(|spec| match spec {
            ImportSpecifier::Named(named) => named.local.to_id(),
            ImportSpecifier::Default(default) => default.local.to_id(),
            ImportSpecifier::Namespace(ns) => ns.local.to_id(),
        }));
        if let Some(local) = default_import_local(import) {
            self.record(local, import.span, import.src.value.as_ref());
        }
    }

    fn visit_var_declarator(&mut self, decl: &VarDeclarator) {
        self.declare(find_pat_ids::<_, Id>(&decl.name));
        if let Some((local, module)) = require_site(decl, self.global_ctxt) {
            self.record(local, decl.span, module);
        }
        decl.visit_children_with(self);
    }

    fn visit_param(&mut self, param: &Param) {
        self.declare(find_pat_ids::<_, Id>(&param.pat));
        param.visit_children_with(self);
    }

    fn visit_arrow_expr(&mut self, arrow: &ArrowExpr) {
        self.declare(arrow.params.iter().flat_map(|pat| find_pat_ids::<_, Id>(pat)));
        arrow.visit_children_with(self);
    }

    fn visit_catch_clause(&mut self, clause: &CatchClause) {
        self.declare(clause.param.iter().flat_map(|pat| find_pat_ids::<_, Id>(pat)));
        clause.visit_children_with(self);
    }

    fn visit_fn_decl(&mut self, decl: &FnDecl) {
        self.declare([decl.ident.to_id()]);
        decl.visit_children_with(self);
    }

    fn visit_class_decl(&mut self, decl: &ClassDecl) {
        self.declare([decl.ident.to_id()]);
        decl.visit_children_with(self);
    }

    fn visit_named_export(&mut self, export: &NamedExport) {
        if export.src.is_some() {
            return;
        }
        for spec in &export.specifiers {
            if let ExportSpecifier::Named(ExportNamedSpecifier {
                orig: ModuleExportName::Ident(orig),
                ..
            }) = spec
            {
                self.pinned.insert(orig.to_id());
            }
        }
    }

    fn visit_export_decl(&mut self, export: &ExportDecl) {
        if let Decl::Var(var) = &export.decl {
            self.pinned
                .extend(var.decls.iter().flat_map(|decl| find_pat_ids::<_, Id>(&decl.name)));
        }
        export.visit_children_with(self);
    }

    fn visit_jsx_element_name(&mut self, name: &JSXElementName) {
        if let JSXElementName::Ident(ident) = name {
            self.pinned.insert(ident.to_id());
        }
        name.visit_children_with(self);
    }

    fn visit_jsx_object(&mut self, obj: &JSXObject) {
        if let JSXObject::Ident(ident) = obj {
            self.pinned.insert(ident.to_id());
        }
        obj.visit_children_with(self);
    }

    fn visit_assign_pat_prop(&mut self, prop: &AssignPatProp) {
        self.pinned.insert(prop.key.id.to_id());
        prop.visit_children_with(self);
    }
}

// -----------------------------------------------------------------------------
// Pass 2: rewrite
// -----------------------------------------------------------------------------

struct Rewriter<'a> {
    plan: &'a RewritePlan,
    fold_has_content: bool,
}

impl Rewriter<'_> {
    /// `import X from "m"` becomes `var X = <replacement>;`.
    fn import_as_var(&self, import: &ImportDecl) -> Option<ModuleItem> {
        let template = self.plan.initializers.get(&import.span)?;
        let local = default_import_local(import)?;
        Some(ModuleItem::Stmt(Stmt::Decl(Decl::Var(Box::new(VarDecl {
            span: import.span,
            ctxt: SyntaxContext::empty(),
            kind: VarDeclKind::Var,
            declare: false,
            decls: vec![VarDeclarator {
                span: DUMMY_SP,
                name: Pat::Ident(BindingIdent {
                    id: local.clone(),
                    type_ann: None,
                }),
                init: Some(template.instantiate()),
                definite: false,
            }],
        })))))
    }

    fn renamed(&self, ident: &Ident) -> Option<Box<Expr>> {
        self.plan
            .pending
            .get(&ident.to_id())
            .map(ReplacementExpr::instantiate)
    }
}

impl VisitMut for Rewriter<'_> {
    fn visit_mut_module_items(&mut self, items: &mut Vec<ModuleItem>) {
        for item in items.iter_mut() {
            let replacement = match item {
                ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => self.import_as_var(import),
                _ => None,
            };
            if let Some(replacement) = replacement {
                *item = replacement;
            }
        }

        items.visit_mut_children_with(self);
        retain_module_items(items, &self.plan.redundant);
    }

    fn visit_mut_stmts(&mut self, stmts: &mut Vec<Stmt>) {
        stmts.visit_mut_children_with(self);
        retain_stmts(stmts);
    }

    fn visit_mut_var_decl(&mut self, var: &mut VarDecl) {
        var.visit_mut_children_with(self);
        retain_declarators(var, &self.plan.redundant);
    }

    fn visit_mut_for_stmt(&mut self, stmt: &mut ForStmt) {
        stmt.visit_mut_children_with(self);
        clear_empty_for_init(stmt);
    }

    fn visit_mut_var_declarator(&mut self, decl: &mut VarDeclarator) {
        if self.fold_has_content && fold_has_content(decl) {
            tracing::debug!("ungap: folded HAS_CONTENT to true");
        }

        // The site's own name slot is never a reference.
        if !self.plan.is_site(&decl.span) {
            decl.visit_mut_children_with(self);
            return;
        }
        match self.plan.initializers.get(&decl.span) {
            Some(template) => decl.init = Some(template.instantiate()),
            None => decl.init.visit_mut_with(self),
        }
    }

    fn visit_mut_expr(&mut self, expr: &mut Expr) {
        if let Expr::Ident(ident) = expr {
            if let Some(replacement) = self.renamed(ident) {
                *expr = *replacement;
            }
            return;
        }
        expr.visit_mut_children_with(self);
    }

    fn visit_mut_prop(&mut self, prop: &mut Prop) {
        if let Prop::Shorthand(ident) = prop {
            if let Some(replacement) = self.renamed(ident) {
                *prop = Prop::KeyValue(KeyValueProp {
                    key: PropName::Ident(IdentName::new(ident.sym.clone(), ident.span)),
                    value: replacement,
                });
            }
            return;
        }
        prop.visit_mut_children_with(self);
    }

    fn visit_mut_binding_ident(&mut self, binding: &mut BindingIdent) {
        if let Some(replacement) = self.renamed(&binding.id) {
            if let Expr::Ident(global) = *replacement {
                binding.id = global;
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Pass 3: deferred removal
// -----------------------------------------------------------------------------

struct Prune<'a> {
    sites: &'a HashSet<Span>,
}

impl VisitMut for Prune<'_> {
    fn visit_mut_module_items(&mut self, items: &mut Vec<ModuleItem>) {
        items.visit_mut_children_with(self);
        retain_module_items(items, self.sites);
    }

    fn visit_mut_stmts(&mut self, stmts: &mut Vec<Stmt>) {
        stmts.visit_mut_children_with(self);
        retain_stmts(stmts);
    }

    fn visit_mut_var_decl(&mut self, var: &mut VarDecl) {
        var.visit_mut_children_with(self);
        retain_declarators(var, self.sites);
    }

    fn visit_mut_for_stmt(&mut self, stmt: &mut ForStmt) {
        stmt.visit_mut_children_with(self);
        clear_empty_for_init(stmt);
    }
}

fn retain_declarators(var: &mut VarDecl, sites: &HashSet<Span>) {
    if sites.is_empty() {
        return;
    }
    var.decls.retain(|decl| !sites.contains(&decl.span));
}

/// Drop removed imports and `var` statements left without declarators.
fn retain_module_items(items: &mut Vec<ModuleItem>, sites: &HashSet<Span>) {
    items.retain(|item| match item {
        ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => !sites.contains(&import.span),
        ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => !is_empty_var(&export.decl),
        ModuleItem::Stmt(Stmt::Decl(decl)) => !is_empty_var(decl),
        _ => true,
    });
}

fn retain_stmts(stmts: &mut Vec<Stmt>) {
    stmts.retain(|stmt| !matches!(stmt, Stmt::Decl(decl) if is_empty_var(decl)));
}

fn clear_empty_for_init(stmt: &mut ForStmt) {
    if matches!(&stmt.init, Some(VarDeclOrExpr::VarDecl(var)) if var.decls.is_empty()) {
        stmt.init = None;
    }
}
