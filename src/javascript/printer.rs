use super::ast::*;
use super::visitor::{self, Visitor};
use std::convert::Infallible;
use std::rc::Rc;

/// Renders a syntax tree as an indented outline, two spaces per level.
///
/// ```text
/// program:
///   binary:
///     type: binary
///     left:
///       literal:
///         type: number
///         value: 1
///     operator: +
///     ...
/// ```
pub fn print(ast: &Node) -> String {
    let mut printer = Printer::default();
    let Ok(()) = printer.visit(ast);
    printer.out
}

#[derive(Default)]
struct Printer {
    out: String,
    indent: usize,
}

type PrintResult = Result<(), Infallible>;

impl Printer {
    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn indented(&mut self, f: impl FnOnce(&mut Self) -> PrintResult) -> PrintResult {
        self.indent += 1;
        let result = f(self);
        self.indent -= 1;
        result
    }

    fn labelled(&mut self, label: &str, node: &Node) -> PrintResult {
        self.line(label);
        self.indented(|p| p.visit(node))
    }

    fn function(&mut self, label: &str, decl: &FunctionDeclaration) -> PrintResult {
        self.line(label);
        self.indented(|p| {
            if let Some(name) = &decl.name {
                p.visit_identifier(name)?;
            }
            p.line("parameters:");
            p.indented(|p| {
                for param in &decl.params {
                    p.visit_identifier(param)?;
                }
                Ok(())
            })?;
            p.labelled("body:", &decl.body)
        })
    }
}

impl Visitor for Printer {
    type Output = ();
    type Error = Infallible;

    fn should_visit(&self, node: &Node) -> bool {
        !node.is_dead()
    }

    fn visit_program(&mut self, body: &[Node]) -> PrintResult {
        self.line("program:");
        self.indented(|p| visitor::walk_sequence(p, body))
    }

    fn visit_block(&mut self, body: &[Node]) -> PrintResult {
        self.line("block:");
        self.indented(|p| visitor::walk_sequence(p, body))
    }

    fn visit_variable_declaration(&mut self, decl: &VariableDeclaration) -> PrintResult {
        self.line("variable_decl:");
        self.indented(|p| {
            p.line(&format!("type: {}", decl.kind.as_str()));
            p.visit_identifier(&decl.name)?;
            if !decl.init.is_dead() {
                p.labelled("init:", &decl.init)?;
            }
            Ok(())
        })
    }

    fn visit_identifier(&mut self, name: &str) -> PrintResult {
        self.line("identifier:");
        self.indented(|p| {
            p.line(&format!("name: {}", name));
            Ok(())
        })
    }

    fn visit_literal(&mut self, literal: &Literal) -> PrintResult {
        self.line("literal:");
        self.indented(|p| {
            p.line(&format!("type: {}", literal.type_name()));
            p.line(&format!("value: {}", literal));
            Ok(())
        })
    }

    fn visit_binary_expression(&mut self, expr: &BinaryExpression) -> PrintResult {
        self.line("binary:");
        self.indented(|p| {
            let kind = match expr.kind {
                BinaryKind::Binary => "binary",
                BinaryKind::Assignment => "assignment",
            };
            p.line(&format!("type: {}", kind));
            p.labelled("left:", &expr.left)?;
            p.line(&format!("operator: {}", expr.operator_symbol()));
            p.labelled("right:", &expr.right)
        })
    }

    fn visit_unary_expression(&mut self, expr: &UnaryExpression) -> PrintResult {
        self.line("unary:");
        self.indented(|p| {
            p.line(&format!("operator: {}", expr.operator.symbol()));
            p.line(&format!("is_suffix: {}", expr.is_suffix));
            p.visit(&expr.operand)
        })
    }

    fn visit_if_statement(&mut self, stmt: &IfStatement) -> PrintResult {
        self.line("if:");
        self.indented(|p| {
            p.labelled("test:", &stmt.test)?;
            p.labelled("then:", &stmt.consequent)?;
            if !stmt.alternate.is_dead() {
                p.labelled("else:", &stmt.alternate)?;
            }
            Ok(())
        })
    }

    fn visit_for_statement(&mut self, stmt: &ForStatement) -> PrintResult {
        self.line("for:");
        self.indented(|p| {
            p.labelled("init:", &stmt.init)?;
            p.labelled("test:", &stmt.test)?;
            p.labelled("update:", &stmt.update)?;
            p.labelled("body:", &stmt.body)
        })
    }

    fn visit_for_of_statement(&mut self, stmt: &ForOfStatement) -> PrintResult {
        self.line("for_of:");
        self.indented(|p| {
            p.line(&format!("type: {}", stmt.kind.as_str()));
            p.visit_identifier(&stmt.binding)?;
            p.labelled("iterable:", &stmt.iterable)?;
            p.labelled("body:", &stmt.body)
        })
    }

    fn visit_array_literal(&mut self, items: &[Node]) -> PrintResult {
        self.line("array:");
        self.line("[");
        self.indented(|p| visitor::walk_sequence(p, items))?;
        self.line("]");
        Ok(())
    }

    fn visit_member_expression(&mut self, expr: &MemberExpression) -> PrintResult {
        self.line("member:");
        self.indented(|p| visitor::walk_member_expression(p, expr))
    }

    fn visit_indexer_call(&mut self, expr: &IndexerCall) -> PrintResult {
        self.line("indexer_call:");
        self.indented(|p| visitor::walk_indexer_call(p, expr))
    }

    fn visit_function_call(&mut self, call: &FunctionCall) -> PrintResult {
        self.line("fn_call:");
        self.indented(|p| {
            p.visit(&call.callee)?;
            p.line("arguments:");
            p.indented(|p| visitor::walk_sequence(p, &call.arguments))
        })
    }

    fn visit_named_function_declaration(&mut self, decl: &Rc<FunctionDeclaration>) -> PrintResult {
        self.function("fn_declaration:", decl)
    }

    fn visit_anonymous_function_declaration(&mut self, decl: &Rc<FunctionDeclaration>) -> PrintResult {
        self.function("anonymous_fn_declaration:", decl)
    }

    fn visit_function_return(&mut self, expr: &Node) -> PrintResult {
        self.line("return_statement:");
        self.indented(|p| p.visit(expr))
    }

    fn visit_break_statement(&mut self) -> PrintResult {
        self.line("break_statement");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::javascript::parse;

    #[test]
    fn test_binary_outline() {
        let ast = parse("1 + x;").expect("valid");
        let expected = "\
program:
  binary:
    type: binary
    left:
      literal:
        type: number
        value: 1
    operator: +
    right:
      identifier:
        name: x
";
        assert_eq!(print(&ast), expected);
    }

    #[test]
    fn test_dead_clauses_are_omitted() {
        let ast = parse("if (a) { b; }").expect("valid");
        let outline = print(&ast);
        assert!(outline.contains("then:"));
        assert!(!outline.contains("else:"));
    }

    #[test]
    fn test_compound_assignment_shows_written_operator() {
        let ast = parse("total += 2;").expect("valid");
        let outline = print(&ast);
        assert!(outline.contains("type: assignment"));
        assert!(outline.contains("operator: +="));
    }

    #[test]
    fn test_printing_is_stable_and_leaves_tree_untouched() {
        let source = "function add(a, b) { return a + b; } let xs = [1, 2].map(n => add(n, 1)); xs[0];";
        let ast = parse(source).expect("valid");
        let before = ast.clone();

        let first = print(&ast);
        let second = print(&ast);
        assert_eq!(first, second);
        assert_eq!(ast, before);
        assert_eq!(parse(source).expect("valid"), ast);

        assert!(first.contains("fn_declaration:"));
        assert!(first.contains("anonymous_fn_declaration:"));
        assert!(first.contains("return_statement:"));
        assert!(first.contains("indexer_call:"));
    }
}
