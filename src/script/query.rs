//! Tree-query primitives.
//!
//! The conversion core only ever needs a few shapes of question about a
//! syntax tree: "every expression under these statements", "does this
//! statement contain a call to X", "which declarators exist", and "what
//! call heads this statement". They are answered here with plain
//! recursive walks so callers never pattern-match node internals
//! themselves.

use crate::script::ast::{ArrowBody, Expr, Stmt, StmtKind};

/// Visits every expression under `stmts` in pre-order, descending into
/// nested arrow-function bodies.
pub fn for_each_expr<'a>(stmts: &'a [Stmt], f: &mut dyn FnMut(&'a Expr)) {
    for stmt in stmts {
        visit_stmt(stmt, f);
    }
}

fn visit_stmt<'a>(stmt: &'a Stmt, f: &mut dyn FnMut(&'a Expr)) {
    match &stmt.kind {
        StmtKind::VarDecl { init, .. } => {
            if let Some(init) = init {
                visit_expr(init, f);
            }
        }
        StmtKind::Expr { expr } => visit_expr(expr, f),
        StmtKind::Return { arg } => {
            if let Some(arg) = arg {
                visit_expr(arg, f);
            }
        }
        StmtKind::If {
            test,
            consequent,
            alternate,
        } => {
            visit_expr(test, f);
            for stmt in consequent {
                visit_stmt(stmt, f);
            }
            if let Some(alternate) = alternate {
                for stmt in alternate {
                    visit_stmt(stmt, f);
                }
            }
        }
        StmtKind::Block { body } => {
            for stmt in body {
                visit_stmt(stmt, f);
            }
        }
    }
}

fn visit_expr<'a>(expr: &'a Expr, f: &mut dyn FnMut(&'a Expr)) {
    f(expr);
    match expr {
        Expr::Ident { .. } | Expr::Str { .. } | Expr::Num { .. } | Expr::Bool { .. } | Expr::Null => {}
        Expr::Template { exprs, .. } => {
            for expr in exprs {
                visit_expr(expr, f);
            }
        }
        Expr::Array { elements } => {
            for element in elements {
                visit_expr(element, f);
            }
        }
        Expr::Object { properties } => {
            for property in properties {
                if property.computed {
                    visit_expr(&property.key, f);
                }
                visit_expr(&property.value, f);
            }
        }
        Expr::Arrow { body, .. } => match body {
            ArrowBody::Block(body) => {
                for stmt in body {
                    visit_stmt(stmt, f);
                }
            }
            ArrowBody::Expr(expr) => visit_expr(expr, f),
        },
        Expr::Call { callee, args } | Expr::New { callee, args } => {
            visit_expr(callee, f);
            for arg in args {
                visit_expr(arg, f);
            }
        }
        Expr::Member {
            object, property, ..
        } => {
            visit_expr(object, f);
            visit_expr(property, f);
        }
        Expr::Unary { expr, .. } | Expr::Await { expr } | Expr::Paren { expr } => {
            visit_expr(expr, f)
        }
        Expr::Binary { left, right, .. } => {
            visit_expr(left, f);
            visit_expr(right, f);
        }
        Expr::Assign { target, value, .. } => {
            visit_expr(target, f);
            visit_expr(value, f);
        }
        Expr::Conditional {
            test,
            consequent,
            alternate,
        } => {
            visit_expr(test, f);
            visit_expr(consequent, f);
            visit_expr(alternate, f);
        }
    }
}

/// Visits every expression under `stmts` bottom-up (children before
/// parents), allowing `f` to replace nodes wholesale.
pub fn for_each_expr_mut(stmts: &mut [Stmt], f: &mut dyn FnMut(&mut Expr)) {
    for stmt in stmts {
        visit_stmt_mut(stmt, f);
    }
}

fn visit_stmt_mut(stmt: &mut Stmt, f: &mut dyn FnMut(&mut Expr)) {
    match &mut stmt.kind {
        StmtKind::VarDecl { init, .. } => {
            if let Some(init) = init {
                visit_expr_mut(init, f);
            }
        }
        StmtKind::Expr { expr } => visit_expr_mut(expr, f),
        StmtKind::Return { arg } => {
            if let Some(arg) = arg {
                visit_expr_mut(arg, f);
            }
        }
        StmtKind::If {
            test,
            consequent,
            alternate,
        } => {
            visit_expr_mut(test, f);
            for stmt in consequent.iter_mut() {
                visit_stmt_mut(stmt, f);
            }
            for stmt in alternate.iter_mut().flatten() {
                visit_stmt_mut(stmt, f);
            }
        }
        StmtKind::Block { body } => {
            for stmt in body.iter_mut() {
                visit_stmt_mut(stmt, f);
            }
        }
    }
}

fn visit_expr_mut(expr: &mut Expr, f: &mut dyn FnMut(&mut Expr)) {
    match expr {
        Expr::Ident { .. } | Expr::Str { .. } | Expr::Num { .. } | Expr::Bool { .. } | Expr::Null => {}
        Expr::Template { exprs, .. } => {
            for expr in exprs {
                visit_expr_mut(expr, f);
            }
        }
        Expr::Array { elements } => {
            for element in elements {
                visit_expr_mut(element, f);
            }
        }
        Expr::Object { properties } => {
            for property in properties {
                if property.computed {
                    visit_expr_mut(&mut property.key, f);
                }
                visit_expr_mut(&mut property.value, f);
            }
        }
        Expr::Arrow { body, .. } => match body {
            ArrowBody::Block(body) => {
                for stmt in body.iter_mut() {
                    visit_stmt_mut(stmt, f);
                }
            }
            ArrowBody::Expr(expr) => visit_expr_mut(expr, f),
        },
        Expr::Call { callee, args } | Expr::New { callee, args } => {
            visit_expr_mut(callee, f);
            for arg in args {
                visit_expr_mut(arg, f);
            }
        }
        Expr::Member {
            object, property, ..
        } => {
            visit_expr_mut(object, f);
            visit_expr_mut(property, f);
        }
        Expr::Unary { expr, .. } | Expr::Await { expr } | Expr::Paren { expr } => {
            visit_expr_mut(expr, f)
        }
        Expr::Binary { left, right, .. } => {
            visit_expr_mut(left, f);
            visit_expr_mut(right, f);
        }
        Expr::Assign { target, value, .. } => {
            visit_expr_mut(target, f);
            visit_expr_mut(value, f);
        }
        Expr::Conditional {
            test,
            consequent,
            alternate,
        } => {
            visit_expr_mut(test, f);
            visit_expr_mut(consequent, f);
            visit_expr_mut(alternate, f);
        }
    }
    f(expr);
}

/// All call expressions under `stmts` whose callee is the bare identifier
/// `name`, in pre-order.
pub fn calls_to<'a>(stmts: &'a [Stmt], name: &str) -> Vec<&'a Expr> {
    let mut calls = Vec::new();
    for_each_expr(stmts, &mut |expr| {
        if let Expr::Call { callee, .. } = expr {
            if matches!(&**callee, Expr::Ident { name: n } if n == name) {
                calls.push(expr);
            }
        }
    });
    calls
}

/// Whether any call to the bare identifier `name` appears under `stmt`.
pub fn stmt_contains_call_to(stmt: &Stmt, name: &str) -> bool {
    !calls_to(std::slice::from_ref(stmt), name).is_empty()
}

/// Every variable declarator under `stmts` (any nesting level) as
/// `(name, init)` pairs, in source order.
pub fn declarators<'a>(stmts: &'a [Stmt]) -> Vec<(&'a str, Option<&'a Expr>)> {
    let mut found = Vec::new();
    for stmt in stmts {
        collect_declarators(stmt, &mut found);
    }
    found
}

fn collect_declarators<'a>(stmt: &'a Stmt, found: &mut Vec<(&'a str, Option<&'a Expr>)>) {
    match &stmt.kind {
        StmtKind::VarDecl { name, init, .. } => {
            found.push((name.as_str(), init.as_ref()));
            if let Some(init) = init {
                collect_declarators_in_expr(init, found);
            }
        }
        StmtKind::Expr { expr } => collect_declarators_in_expr(expr, found),
        StmtKind::Return { arg } => {
            if let Some(arg) = arg {
                collect_declarators_in_expr(arg, found);
            }
        }
        StmtKind::If {
            test,
            consequent,
            alternate,
        } => {
            collect_declarators_in_expr(test, found);
            for stmt in consequent {
                collect_declarators(stmt, found);
            }
            for stmt in alternate.iter().flatten() {
                collect_declarators(stmt, found);
            }
        }
        StmtKind::Block { body } => {
            for stmt in body {
                collect_declarators(stmt, found);
            }
        }
    }
}

fn collect_declarators_in_expr<'a>(
    expr: &'a Expr,
    found: &mut Vec<(&'a str, Option<&'a Expr>)>,
) {
    // hand-rolled descent: an arrow body switches back to statement
    // collection exactly once, so nested arrows are not double-counted
    match expr {
        Expr::Ident { .. } | Expr::Str { .. } | Expr::Num { .. } | Expr::Bool { .. } | Expr::Null => {}
        Expr::Template { exprs, .. } => {
            for expr in exprs {
                collect_declarators_in_expr(expr, found);
            }
        }
        Expr::Array { elements } => {
            for element in elements {
                collect_declarators_in_expr(element, found);
            }
        }
        Expr::Object { properties } => {
            for property in properties {
                if property.computed {
                    collect_declarators_in_expr(&property.key, found);
                }
                collect_declarators_in_expr(&property.value, found);
            }
        }
        Expr::Arrow { body, .. } => match body {
            ArrowBody::Block(body) => {
                for stmt in body {
                    collect_declarators(stmt, found);
                }
            }
            ArrowBody::Expr(expr) => collect_declarators_in_expr(expr, found),
        },
        Expr::Call { callee, args } | Expr::New { callee, args } => {
            collect_declarators_in_expr(callee, found);
            for arg in args {
                collect_declarators_in_expr(arg, found);
            }
        }
        Expr::Member {
            object, property, ..
        } => {
            collect_declarators_in_expr(object, found);
            collect_declarators_in_expr(property, found);
        }
        Expr::Unary { expr, .. } | Expr::Await { expr } | Expr::Paren { expr } => {
            collect_declarators_in_expr(expr, found)
        }
        Expr::Binary { left, right, .. } => {
            collect_declarators_in_expr(left, found);
            collect_declarators_in_expr(right, found);
        }
        Expr::Assign { target, value, .. } => {
            collect_declarators_in_expr(target, found);
            collect_declarators_in_expr(value, found);
        }
        Expr::Conditional {
            test,
            consequent,
            alternate,
        } => {
            collect_declarators_in_expr(test, found);
            collect_declarators_in_expr(consequent, found);
            collect_declarators_in_expr(alternate, found);
        }
    }
}

/// The identifier heading a statement's leftmost call chain, if any.
///
/// `expect(x).to.equal(y)`, `await expect(x).resolves.toBe(y)` and
/// `(expect(x))` all head at `expect`; a declaration or a statement whose
/// leftmost base is not a call heads at nothing.
pub fn call_head_name(stmt: &Stmt) -> Option<&str> {
    match &stmt.kind {
        StmtKind::Expr { expr } => expr_head_name(expr),
        _ => None,
    }
}

fn expr_head_name(expr: &Expr) -> Option<&str> {
    match expr {
        Expr::Call { callee, .. } => match &**callee {
            Expr::Ident { name } => Some(name),
            other => expr_head_name(other),
        },
        Expr::Member { object, .. } => expr_head_name(object),
        Expr::Await { expr } | Expr::Paren { expr } => expr_head_name(expr),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::parser::parse_program;

    #[test]
    fn test_calls_to_finds_nested_calls() {
        let body = parse_program("it('t', () => { const r = cli(req)\nlog(cli(req2)) })")
            .unwrap();
        assert_eq!(calls_to(&body, "cli").len(), 2);
        assert_eq!(calls_to(&body, "it").len(), 1);
        assert_eq!(calls_to(&body, "missing").len(), 0);
    }

    #[test]
    fn test_calls_to_ignores_member_callees() {
        let body = parse_program("obj.cli(x)").unwrap();
        assert!(calls_to(&body, "cli").is_empty());
    }

    #[test]
    fn test_declarators_cover_nested_scopes() {
        let body = parse_program("const a = 1\n{ const a = 2 }\nf(() => { const a = 3 })")
            .unwrap();
        let names: Vec<&str> = declarators(&body).iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["a", "a", "a"]);
    }

    #[test]
    fn test_declarators_not_double_counted_in_nested_arrows() {
        let body = parse_program("f(() => { g(() => { const a = 1 }) })").unwrap();
        let names: Vec<&str> = declarators(&body).iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["a"]);
    }

    #[test]
    fn test_call_head_name_unwraps_chains() {
        let body = parse_program(
            "expect(a).to.equal(b)\nawait expect(c).resolves.toBe(d)\nconst x = expect(y)",
        )
        .unwrap();
        assert_eq!(call_head_name(&body[0]), Some("expect"));
        assert_eq!(call_head_name(&body[1]), Some("expect"));
        assert_eq!(call_head_name(&body[2]), None);
    }

    #[test]
    fn test_stmt_contains_call_to() {
        let body = parse_program("const r = f(g(x))").unwrap();
        assert!(stmt_contains_call_to(&body[0], "g"));
        assert!(!stmt_contains_call_to(&body[0], "x"));
    }
}
