//! Scope-safe identifier renaming.
//!
//! Renames every occurrence of a name that is a genuine variable
//! reference: non-computed member-access property names and non-computed
//! object keys are labels, not references, and are left alone. A
//! shorthand property whose value is the renamed identifier is expanded
//! to explicit `key: value` form first, otherwise the rename would
//! silently change the emitted data's key.

use crate::script::ast::{ArrowBody, Expr, Stmt, StmtKind};

/// Renames all variable references (and declarations) of `old` to `new`
/// under `stmts`, in place.
pub fn rename_identifiers(stmts: &mut [Stmt], old: &str, new: &str) {
    for stmt in stmts {
        rename_in_stmt(stmt, old, new);
    }
}

fn rename_in_stmt(stmt: &mut Stmt, old: &str, new: &str) {
    match &mut stmt.kind {
        StmtKind::VarDecl { name, init, .. } => {
            if name == old {
                *name = new.to_string();
            }
            if let Some(init) = init {
                rename_in_expr(init, old, new);
            }
        }
        StmtKind::Expr { expr } => rename_in_expr(expr, old, new),
        StmtKind::Return { arg } => {
            if let Some(arg) = arg {
                rename_in_expr(arg, old, new);
            }
        }
        StmtKind::If {
            test,
            consequent,
            alternate,
        } => {
            rename_in_expr(test, old, new);
            for stmt in consequent.iter_mut() {
                rename_in_stmt(stmt, old, new);
            }
            for stmt in alternate.iter_mut().flatten() {
                rename_in_stmt(stmt, old, new);
            }
        }
        StmtKind::Block { body } => {
            for stmt in body.iter_mut() {
                rename_in_stmt(stmt, old, new);
            }
        }
    }
}

fn rename_in_expr(expr: &mut Expr, old: &str, new: &str) {
    match expr {
        Expr::Ident { name } => {
            if name == old {
                *name = new.to_string();
            }
        }
        Expr::Str { .. } | Expr::Num { .. } | Expr::Bool { .. } | Expr::Null => {}
        Expr::Template { exprs, .. } => {
            for expr in exprs {
                rename_in_expr(expr, old, new);
            }
        }
        Expr::Array { elements } => {
            for element in elements {
                rename_in_expr(element, old, new);
            }
        }
        Expr::Object { properties } => {
            for property in properties {
                // `{ oldName: v }` keeps its key; `{ [oldName]: v }` is a
                // reference
                if property.computed {
                    rename_in_expr(&mut property.key, old, new);
                }
                if property.shorthand {
                    if matches!(&property.value, Expr::Ident { name } if name == old) {
                        property.shorthand = false;
                    }
                }
                rename_in_expr(&mut property.value, old, new);
            }
        }
        Expr::Arrow { params, body, .. } => {
            for param in params.iter_mut() {
                if param == old {
                    *param = new.to_string();
                }
            }
            match body {
                ArrowBody::Block(body) => {
                    for stmt in body.iter_mut() {
                        rename_in_stmt(stmt, old, new);
                    }
                }
                ArrowBody::Expr(expr) => rename_in_expr(expr, old, new),
            }
        }
        Expr::Call { callee, args } | Expr::New { callee, args } => {
            rename_in_expr(callee, old, new);
            for arg in args {
                rename_in_expr(arg, old, new);
            }
        }
        Expr::Member {
            object,
            property,
            computed,
        } => {
            rename_in_expr(object, old, new);
            // `obj.oldName` is a label; `obj[oldName]` is a reference
            if *computed {
                rename_in_expr(property, old, new);
            }
        }
        Expr::Unary { expr, .. } | Expr::Await { expr } | Expr::Paren { expr } => {
            rename_in_expr(expr, old, new)
        }
        Expr::Binary { left, right, .. } => {
            rename_in_expr(left, old, new);
            rename_in_expr(right, old, new);
        }
        Expr::Assign { target, value, .. } => {
            rename_in_expr(target, old, new);
            rename_in_expr(value, old, new);
        }
        Expr::Conditional {
            test,
            consequent,
            alternate,
        } => {
            rename_in_expr(test, old, new);
            rename_in_expr(consequent, old, new);
            rename_in_expr(alternate, old, new);
        }
    }
}
