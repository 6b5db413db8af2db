//! Depth-first traversal over the syntax tree.
//!
//! [`Visitor::visit`] dispatches on the node variant to one `visit_*` method
//! per variant. Every `visit_*` method defaults to the matching `walk_*`
//! function, which visits the children in source order, so an implementor
//! overrides only the variants it cares about and can still call `walk_*` to
//! recurse into the rest. [`Visitor::should_visit`] is checked before every
//! node and can suppress descent globally.

use super::ast::*;
use std::rc::Rc;

pub trait Visitor {
    type Output: Default;
    type Error;

    fn should_visit(&self, _node: &Node) -> bool {
        true
    }

    fn visit(&mut self, node: &Node) -> Result<Self::Output, Self::Error> {
        if !self.should_visit(node) {
            return Ok(Self::Output::default());
        }
        match node {
            Node::Program(body) => self.visit_program(body),
            Node::Block(body) => self.visit_block(body),
            Node::VariableDeclaration(decl) => self.visit_variable_declaration(decl),
            Node::Identifier(name) => self.visit_identifier(name),
            Node::Literal(literal) => self.visit_literal(literal),
            Node::BinaryExpression(expr) => self.visit_binary_expression(expr),
            Node::UnaryExpression(expr) => self.visit_unary_expression(expr),
            Node::IfStatement(stmt) => self.visit_if_statement(stmt),
            Node::ForStatement(stmt) => self.visit_for_statement(stmt),
            Node::ForOfStatement(stmt) => self.visit_for_of_statement(stmt),
            Node::ArrayLiteral(items) => self.visit_array_literal(items),
            Node::MemberExpression(expr) => self.visit_member_expression(expr),
            Node::IndexerCall(expr) => self.visit_indexer_call(expr),
            Node::FunctionCall(call) => self.visit_function_call(call),
            Node::NamedFunctionDeclaration(decl) => self.visit_named_function_declaration(decl),
            Node::AnonymousFunctionDeclaration(decl) => {
                self.visit_anonymous_function_declaration(decl)
            }
            Node::FunctionReturn(expr) => self.visit_function_return(expr),
            Node::BreakStatement => self.visit_break_statement(),
            Node::Dead => self.visit_dead(),
        }
    }

    fn visit_program(&mut self, body: &[Node]) -> Result<Self::Output, Self::Error> {
        walk_sequence(self, body)
    }

    fn visit_block(&mut self, body: &[Node]) -> Result<Self::Output, Self::Error> {
        walk_sequence(self, body)
    }

    fn visit_variable_declaration(
        &mut self,
        decl: &VariableDeclaration,
    ) -> Result<Self::Output, Self::Error> {
        walk_variable_declaration(self, decl)
    }

    fn visit_identifier(&mut self, _name: &str) -> Result<Self::Output, Self::Error> {
        Ok(Self::Output::default())
    }

    fn visit_literal(&mut self, _literal: &Literal) -> Result<Self::Output, Self::Error> {
        Ok(Self::Output::default())
    }

    fn visit_binary_expression(
        &mut self,
        expr: &BinaryExpression,
    ) -> Result<Self::Output, Self::Error> {
        walk_binary_expression(self, expr)
    }

    fn visit_unary_expression(
        &mut self,
        expr: &UnaryExpression,
    ) -> Result<Self::Output, Self::Error> {
        walk_unary_expression(self, expr)
    }

    fn visit_if_statement(&mut self, stmt: &IfStatement) -> Result<Self::Output, Self::Error> {
        walk_if_statement(self, stmt)
    }

    fn visit_for_statement(&mut self, stmt: &ForStatement) -> Result<Self::Output, Self::Error> {
        walk_for_statement(self, stmt)
    }

    fn visit_for_of_statement(
        &mut self,
        stmt: &ForOfStatement,
    ) -> Result<Self::Output, Self::Error> {
        walk_for_of_statement(self, stmt)
    }

    fn visit_array_literal(&mut self, items: &[Node]) -> Result<Self::Output, Self::Error> {
        walk_sequence(self, items)
    }

    fn visit_member_expression(
        &mut self,
        expr: &MemberExpression,
    ) -> Result<Self::Output, Self::Error> {
        walk_member_expression(self, expr)
    }

    fn visit_indexer_call(&mut self, expr: &IndexerCall) -> Result<Self::Output, Self::Error> {
        walk_indexer_call(self, expr)
    }

    fn visit_function_call(&mut self, call: &FunctionCall) -> Result<Self::Output, Self::Error> {
        walk_function_call(self, call)
    }

    fn visit_named_function_declaration(
        &mut self,
        decl: &Rc<FunctionDeclaration>,
    ) -> Result<Self::Output, Self::Error> {
        walk_function_declaration(self, decl)
    }

    fn visit_anonymous_function_declaration(
        &mut self,
        decl: &Rc<FunctionDeclaration>,
    ) -> Result<Self::Output, Self::Error> {
        walk_function_declaration(self, decl)
    }

    fn visit_function_return(&mut self, expr: &Node) -> Result<Self::Output, Self::Error> {
        self.visit(expr)?;
        Ok(Self::Output::default())
    }

    fn visit_break_statement(&mut self) -> Result<Self::Output, Self::Error> {
        Ok(Self::Output::default())
    }

    fn visit_dead(&mut self) -> Result<Self::Output, Self::Error> {
        Ok(Self::Output::default())
    }
}

pub fn walk_sequence<V: Visitor + ?Sized>(visitor: &mut V, nodes: &[Node]) -> Result<V::Output, V::Error> {
    for node in nodes {
        visitor.visit(node)?;
    }
    Ok(V::Output::default())
}

pub fn walk_variable_declaration<V: Visitor + ?Sized>(
    visitor: &mut V,
    decl: &VariableDeclaration,
) -> Result<V::Output, V::Error> {
    visitor.visit_identifier(&decl.name)?;
    visitor.visit(&decl.init)?;
    Ok(V::Output::default())
}

pub fn walk_binary_expression<V: Visitor + ?Sized>(
    visitor: &mut V,
    expr: &BinaryExpression,
) -> Result<V::Output, V::Error> {
    visitor.visit(&expr.left)?;
    visitor.visit(&expr.right)?;
    Ok(V::Output::default())
}

pub fn walk_unary_expression<V: Visitor + ?Sized>(
    visitor: &mut V,
    expr: &UnaryExpression,
) -> Result<V::Output, V::Error> {
    visitor.visit(&expr.operand)?;
    Ok(V::Output::default())
}

pub fn walk_if_statement<V: Visitor + ?Sized>(
    visitor: &mut V,
    stmt: &IfStatement,
) -> Result<V::Output, V::Error> {
    visitor.visit(&stmt.test)?;
    visitor.visit(&stmt.consequent)?;
    visitor.visit(&stmt.alternate)?;
    Ok(V::Output::default())
}

pub fn walk_for_statement<V: Visitor + ?Sized>(
    visitor: &mut V,
    stmt: &ForStatement,
) -> Result<V::Output, V::Error> {
    visitor.visit(&stmt.init)?;
    visitor.visit(&stmt.test)?;
    visitor.visit(&stmt.update)?;
    visitor.visit(&stmt.body)?;
    Ok(V::Output::default())
}

pub fn walk_for_of_statement<V: Visitor + ?Sized>(
    visitor: &mut V,
    stmt: &ForOfStatement,
) -> Result<V::Output, V::Error> {
    visitor.visit_identifier(&stmt.binding)?;
    visitor.visit(&stmt.iterable)?;
    visitor.visit(&stmt.body)?;
    Ok(V::Output::default())
}

pub fn walk_member_expression<V: Visitor + ?Sized>(
    visitor: &mut V,
    expr: &MemberExpression,
) -> Result<V::Output, V::Error> {
    visitor.visit(&expr.object)?;
    visitor.visit(&expr.property)?;
    Ok(V::Output::default())
}

pub fn walk_indexer_call<V: Visitor + ?Sized>(
    visitor: &mut V,
    expr: &IndexerCall,
) -> Result<V::Output, V::Error> {
    visitor.visit(&expr.target)?;
    visitor.visit(&expr.index)?;
    Ok(V::Output::default())
}

pub fn walk_function_call<V: Visitor + ?Sized>(
    visitor: &mut V,
    call: &FunctionCall,
) -> Result<V::Output, V::Error> {
    visitor.visit(&call.callee)?;
    walk_sequence(visitor, &call.arguments)
}

pub fn walk_function_declaration<V: Visitor + ?Sized>(
    visitor: &mut V,
    decl: &FunctionDeclaration,
) -> Result<V::Output, V::Error> {
    for param in &decl.params {
        visitor.visit_identifier(param)?;
    }
    visitor.visit(&decl.body)?;
    Ok(V::Output::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::javascript::parse;
    use std::convert::Infallible;

    #[derive(Default)]
    struct IdentifierCollector {
        names: Vec<String>,
    }

    impl Visitor for IdentifierCollector {
        type Output = ();
        type Error = Infallible;

        fn visit_identifier(&mut self, name: &str) -> Result<(), Infallible> {
            self.names.push(name.to_string());
            Ok(())
        }
    }

    /// Stops descending into function bodies.
    #[derive(Default)]
    struct TopLevelCounter {
        visited: usize,
    }

    impl Visitor for TopLevelCounter {
        type Output = ();
        type Error = Infallible;

        fn should_visit(&self, node: &Node) -> bool {
            !matches!(node, Node::Block(_))
        }

        fn visit_literal(&mut self, _literal: &Literal) -> Result<(), Infallible> {
            self.visited += 1;
            Ok(())
        }
    }

    #[test]
    fn test_default_walk_reaches_every_identifier_in_order() {
        let ast = parse("let total = a + b; for (const n of items) { total += n; }").expect("valid");
        let mut collector = IdentifierCollector::default();
        let Ok(()) = collector.visit(&ast);
        assert_eq!(collector.names, vec!["total", "a", "b", "n", "items", "total", "n"]);
    }

    #[test]
    fn test_should_visit_suppresses_descent() {
        let ast = parse("1; 2; function f() { 3; 4; 5; } 6;").expect("valid");
        let mut counter = TopLevelCounter::default();
        let Ok(()) = counter.visit(&ast);
        assert_eq!(counter.visited, 3);
    }
}
