//! Deterministic code emission.
//!
//! The printer is the single place source text is produced, so identical
//! trees always yield byte-identical output: 2-space indentation,
//! double-quoted strings, multiline object literals, and statement
//! semicolons. Grouping parentheses survive as [`Expr::Paren`] nodes, so
//! reprinting never changes evaluation order.

use crate::script::ast::{ArrowBody, Expr, Property, Stmt, StmtKind};

const INDENT: &str = "  ";

/// Prints a statement sequence as a complete source file, with a trailing
/// newline.
pub fn print_program(stmts: &[Stmt]) -> String {
    let mut out = String::new();
    for stmt in stmts {
        write_stmt(&mut out, stmt, 0);
        out.push('\n');
    }
    out
}

/// Prints a single statement on one logical line (no trailing newline).
pub fn print_statement(stmt: &Stmt) -> String {
    let mut out = String::new();
    write_stmt(&mut out, stmt, 0);
    out
}

/// Prints a lone expression, mainly for error messages that need to name
/// an offending node.
pub fn print_expression(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(&mut out, expr, 0);
    out
}

fn push_indent(out: &mut String, indent: usize) {
    for _ in 0..indent {
        out.push_str(INDENT);
    }
}

fn write_stmt(out: &mut String, stmt: &Stmt, indent: usize) {
    if let Some(comment) = &stmt.comment {
        push_indent(out, indent);
        out.push_str("// ");
        out.push_str(comment);
        out.push('\n');
    }
    push_indent(out, indent);
    match &stmt.kind {
        StmtKind::VarDecl { kind, name, init } => {
            out.push_str(kind.as_str());
            out.push(' ');
            out.push_str(name);
            if let Some(init) = init {
                out.push_str(" = ");
                write_expr(out, init, indent);
            }
            out.push(';');
        }
        StmtKind::Expr { expr } => {
            write_expr(out, expr, indent);
            out.push(';');
        }
        StmtKind::Return { arg } => {
            out.push_str("return");
            if let Some(arg) = arg {
                out.push(' ');
                write_expr(out, arg, indent);
            }
            out.push(';');
        }
        StmtKind::If {
            test,
            consequent,
            alternate,
        } => write_if(out, test, consequent, alternate.as_deref(), indent),
        StmtKind::Block { body } => {
            out.push_str("{\n");
            for inner in body {
                write_stmt(out, inner, indent + 1);
                out.push('\n');
            }
            push_indent(out, indent);
            out.push('}');
        }
    }
}

fn write_if(
    out: &mut String,
    test: &Expr,
    consequent: &[Stmt],
    alternate: Option<&[Stmt]>,
    indent: usize,
) {
    out.push_str("if (");
    write_expr(out, test, indent);
    out.push_str(") ");
    write_block(out, consequent, indent);
    if let Some(alternate) = alternate {
        out.push_str(" else ");
        // flatten `else if` chains instead of nesting a block
        if let [Stmt {
            kind:
                StmtKind::If {
                    test,
                    consequent,
                    alternate,
                },
            comment: None,
            ..
        }] = alternate
        {
            write_if(out, test, consequent, alternate.as_deref(), indent);
        } else {
            write_block(out, alternate, indent);
        }
    }
}

fn write_block(out: &mut String, body: &[Stmt], indent: usize) {
    out.push_str("{\n");
    for stmt in body {
        write_stmt(out, stmt, indent + 1);
        out.push('\n');
    }
    push_indent(out, indent);
    out.push('}');
}

fn write_expr(out: &mut String, expr: &Expr, indent: usize) {
    match expr {
        Expr::Ident { name } => out.push_str(name),
        Expr::Str { value } => {
            out.push('"');
            out.push_str(&escape_string(value));
            out.push('"');
        }
        Expr::Num { raw } => out.push_str(raw),
        Expr::Bool { value } => out.push_str(if *value { "true" } else { "false" }),
        Expr::Null => out.push_str("null"),
        Expr::Template { quasis, exprs } => {
            out.push('`');
            for (i, quasi) in quasis.iter().enumerate() {
                out.push_str(&escape_template(quasi));
                if let Some(expr) = exprs.get(i) {
                    out.push_str("${");
                    write_expr(out, expr, indent);
                    out.push('}');
                }
            }
            out.push('`');
        }
        Expr::Array { elements } => {
            out.push('[');
            for (i, element) in elements.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, element, indent);
            }
            out.push(']');
        }
        Expr::Object { properties } => write_object(out, properties, indent),
        Expr::Arrow {
            is_async,
            params,
            body,
        } => {
            if *is_async {
                out.push_str("async ");
            }
            out.push('(');
            out.push_str(&params.join(", "));
            out.push_str(") => ");
            match body {
                ArrowBody::Block(body) => write_block(out, body, indent),
                ArrowBody::Expr(expr) => {
                    // an object-literal body needs grouping to not read
                    // as a block
                    if matches!(**expr, Expr::Object { .. }) {
                        out.push('(');
                        write_expr(out, expr, indent);
                        out.push(')');
                    } else {
                        write_expr(out, expr, indent);
                    }
                }
            }
        }
        Expr::Call { callee, args } => {
            write_expr(out, callee, indent);
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, arg, indent);
            }
            out.push(')');
        }
        Expr::New { callee, args } => {
            out.push_str("new ");
            write_expr(out, callee, indent);
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, arg, indent);
            }
            out.push(')');
        }
        Expr::Member {
            object,
            property,
            computed,
        } => {
            write_expr(out, object, indent);
            if *computed {
                out.push('[');
                write_expr(out, property, indent);
                out.push(']');
            } else {
                out.push('.');
                write_expr(out, property, indent);
            }
        }
        Expr::Unary { op, expr } => {
            out.push_str(op);
            if op.chars().all(char::is_alphabetic) {
                out.push(' ');
            }
            write_expr(out, expr, indent);
        }
        Expr::Binary { op, left, right } => {
            write_expr(out, left, indent);
            out.push(' ');
            out.push_str(op);
            out.push(' ');
            write_expr(out, right, indent);
        }
        Expr::Assign { op, target, value } => {
            write_expr(out, target, indent);
            out.push(' ');
            out.push_str(op);
            out.push(' ');
            write_expr(out, value, indent);
        }
        Expr::Conditional {
            test,
            consequent,
            alternate,
        } => {
            write_expr(out, test, indent);
            out.push_str(" ? ");
            write_expr(out, consequent, indent);
            out.push_str(" : ");
            write_expr(out, alternate, indent);
        }
        Expr::Await { expr } => {
            out.push_str("await ");
            write_expr(out, expr, indent);
        }
        Expr::Paren { expr } => {
            out.push('(');
            write_expr(out, expr, indent);
            out.push(')');
        }
    }
}

fn write_object(out: &mut String, properties: &[Property], indent: usize) {
    if properties.is_empty() {
        out.push_str("{}");
        return;
    }
    out.push_str("{\n");
    for (i, property) in properties.iter().enumerate() {
        push_indent(out, indent + 1);
        if property.shorthand {
            write_expr(out, &property.key, indent + 1);
        } else if property.computed {
            out.push('[');
            write_expr(out, &property.key, indent + 1);
            out.push_str("]: ");
            write_expr(out, &property.value, indent + 1);
        } else {
            match &property.key {
                Expr::Ident { name } => out.push_str(name),
                other => write_expr(out, other, indent + 1),
            }
            out.push_str(": ");
            write_expr(out, &property.value, indent + 1);
        }
        if i + 1 < properties.len() {
            out.push(',');
        }
        out.push('\n');
    }
    push_indent(out, indent);
    out.push('}');
}

fn escape_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn escape_template(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '`' => escaped.push_str("\\`"),
            '$' if chars.peek() == Some(&'{') => escaped.push_str("\\$"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::parser::{parse_expression_source, parse_program};

    fn reprint(source: &str) -> String {
        print_program(&parse_program(source).unwrap())
    }

    #[test]
    fn test_print_declaration() {
        assert_eq!(reprint("const a=1"), "const a = 1;\n");
    }

    #[test]
    fn test_print_object_multiline() {
        let source = "const r = { method: 'get', headers: {} }";
        assert_eq!(
            reprint(source),
            "const r = {\n  method: \"get\",\n  headers: {}\n};\n"
        );
    }

    #[test]
    fn test_print_string_keys_quoted() {
        let expr = parse_expression_source("({ 'x-y': 1 })").unwrap();
        let stmt = Stmt::synthetic(StmtKind::Expr { expr });
        assert_eq!(print_statement(&stmt), "({\n  \"x-y\": 1\n});");
    }

    #[test]
    fn test_print_preserves_grouping() {
        assert_eq!(reprint("(a + b) * c"), "(a + b) * c;\n");
    }

    #[test]
    fn test_print_template_escapes() {
        let expr = Expr::Template {
            quasis: vec!["pay ${amount} to `x` ".to_string(), String::new()],
            exprs: vec![Expr::ident("who")],
        };
        let stmt = Stmt::synthetic(StmtKind::Expr { expr });
        assert_eq!(
            print_statement(&stmt),
            "`pay \\${amount} to \\`x\\` ${who}`;"
        );
    }

    #[test]
    fn test_print_comment_precedes_statement() {
        let mut stmt = Stmt::synthetic(StmtKind::Expr {
            expr: Expr::ident("x"),
        });
        stmt.comment = Some("checks the status".to_string());
        assert_eq!(print_statement(&stmt), "// checks the status\nx;");
    }

    #[test]
    fn test_print_arrow_block_indents() {
        let source = "it('starts', () => { const a = 1\nexpect(a) })";
        assert_eq!(
            reprint(source),
            "it(\"starts\", () => {\n  const a = 1;\n  expect(a);\n});\n"
        );
    }

    #[test]
    fn test_print_else_if_flattens() {
        let source = "if (a) { b() } else if (c) { d() }";
        assert_eq!(reprint(source), "if (a) {\n  b();\n} else if (c) {\n  d();\n}\n");
    }

    #[test]
    fn test_print_is_deterministic() {
        let source = "prev[2] = { callback: resp2 }";
        assert_eq!(reprint(source), reprint(source));
        assert_eq!(reprint(source), "prev[2] = {\n  callback: resp2\n};\n");
    }

    #[test]
    fn test_printed_output_reparses() {
        let source = "const r = { a: [1, 2], b: `x${y}z` }\nif (r) { f(r) }";
        let printed = reprint(source);
        let reparsed = print_program(&parse_program(&printed).unwrap());
        assert_eq!(printed, reparsed);
    }
}
