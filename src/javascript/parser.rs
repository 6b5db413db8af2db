use super::ast::*;
use super::error::{SyntaxError, SyntaxErrorKind, SyntaxResult};
use super::tokenizer::{Token, TokenKind, TokenStream};
use log::{debug, trace};
use std::rc::Rc;

/// Binding power of a binary operator; higher binds tighter.
fn precedence(operator: &str) -> Option<u8> {
    let precedence = match operator {
        "," => 1,
        "=" | "+=" | "-=" | "*=" | "/=" | "%=" | "**=" | "&=" | "|=" | "^=" | "<<=" | ">>="
        | ">>>=" | "&&=" | "||=" | "??=" | "=>" => 2,
        "||" | "??" => 3,
        "&&" => 4,
        "|" => 5,
        "^" => 6,
        "&" => 7,
        "==" | "!=" | "===" | "!==" => 8,
        "<" | "<=" | ">" | ">=" => 9,
        "<<" | ">>" | ">>>" => 10,
        "+" | "-" => 11,
        "*" | "/" | "%" => 12,
        "**" => 13,
        _ => return None,
    };
    Some(precedence)
}

fn is_assignment(operator: &str) -> bool {
    precedence(operator) == Some(2) && operator != "=>"
}

/// Deepest recursion the parser allows before giving up on the input.
const MAX_NESTING: usize = 100;

pub struct Parser {
    tokens: TokenStream,
    // Enclosing loops in the current function body, for `break` placement.
    loop_depth: usize,
    function_depth: usize,
    nesting: usize,
}

impl Parser {
    pub fn new(source: &str) -> Self {
        Self {
            tokens: TokenStream::new(source),
            loop_depth: 0,
            function_depth: 0,
            nesting: 0,
        }
    }

    pub fn parse_program(&mut self) -> SyntaxResult<Node> {
        debug!(target: "javascript", "Parsing program");
        let mut body = Vec::new();
        while !self.tokens.is_end_of_stream()? {
            let node = self.parse_expression()?;
            if !node.is_dead() {
                body.push(node);
            }
        }
        debug!(target: "javascript", "Parsed {} top-level statements", body.len());
        Ok(Node::Program(body))
    }

    fn peek(&mut self) -> SyntaxResult<Option<Token>> {
        Ok(self.tokens.peek()?.cloned())
    }

    fn peek_is(&mut self, kind: TokenKind, value: &str) -> SyntaxResult<bool> {
        Ok(self.tokens.peek()?.is_some_and(|token| token.is(kind, value)))
    }

    fn next(&mut self) -> SyntaxResult<Token> {
        match self.tokens.next_token()? {
            Some(token) => Ok(token),
            None => Err(self.tokens.error(SyntaxErrorKind::UnexpectedEnd)),
        }
    }

    fn skip_semicolon(&mut self) -> SyntaxResult<()> {
        if self.peek_is(TokenKind::Punctuation, ";")? {
            self.next()?;
        }
        Ok(())
    }

    /// Statement-level entry point. A bare `;` yields `Dead`.
    fn parse_expression(&mut self) -> SyntaxResult<Node> {
        self.nested(Self::parse_statement)
    }

    fn parse_statement(&mut self) -> SyntaxResult<Node> {
        let Some(token) = self.peek()? else {
            return Err(self.tokens.error(SyntaxErrorKind::UnexpectedEnd));
        };
        trace!(target: "javascript", "Parsing statement at {}: {}", token.position, token);

        match (token.kind, token.value.as_str()) {
            (TokenKind::Keyword, "let" | "const" | "var") => self.parse_variable_declaration(),
            (TokenKind::Keyword, "if") => self.parse_if(),
            (TokenKind::Keyword, "for") => self.parse_for(),
            (TokenKind::Keyword, "return") => self.parse_return(),
            (TokenKind::Keyword, "break") => self.parse_break(),
            (TokenKind::Keyword, "function") => {
                self.next()?;
                let decl = self.parse_function()?;
                if decl.name.is_some() {
                    return Ok(Node::NamedFunctionDeclaration(Rc::new(decl)));
                }
                let atom = self.maybe_postfix(Node::AnonymousFunctionDeclaration(Rc::new(decl)))?;
                self.maybe_binary(atom, 0)
            }
            (TokenKind::Punctuation, "{") => self.parse_block(),
            (TokenKind::Punctuation, ";") => {
                self.next()?;
                Ok(Node::Dead)
            }
            _ => self.parse_value_expression(),
        }
    }

    fn parse_value_expression(&mut self) -> SyntaxResult<Node> {
        let atom = self.parse_atom()?;
        self.maybe_binary(atom, 0)
    }

    fn parse_atom(&mut self) -> SyntaxResult<Node> {
        self.nested(Self::parse_primary)
    }

    fn parse_primary(&mut self) -> SyntaxResult<Node> {
        let token = self.next()?;
        let atom = match token.kind {
            TokenKind::Number => parse_number(&token)?,
            TokenKind::String => Node::Literal(Literal::String(token.value)),
            TokenKind::Keyword => match token.value.as_str() {
                "true" => Node::Literal(Literal::Boolean(true)),
                "false" => Node::Literal(Literal::Boolean(false)),
                "function" => Node::AnonymousFunctionDeclaration(Rc::new(self.parse_function()?)),
                _ => return Err(SyntaxError::unexpected(&token, Some("expression"))),
            },
            TokenKind::Identifier => {
                if self.peek_is(TokenKind::Operator, "=>")? {
                    let param = plain_name(&token)?;
                    return self.parse_arrow(vec![param]);
                }
                member_chain(&token)?
            }
            TokenKind::Punctuation if token.value == "(" => {
                let (mut items, close) = self.delimited(")")?;
                if self.peek_is(TokenKind::Operator, "=>")? {
                    let params = parameters(items, &token)?;
                    return self.parse_arrow(params);
                }
                match (items.pop(), items.is_empty()) {
                    (Some(inner), true) => inner,
                    _ => return Err(SyntaxError::unexpected(&close, Some("=>"))),
                }
            }
            TokenKind::Punctuation if token.value == "[" => Node::ArrayLiteral(self.delimited("]")?.0),
            TokenKind::Operator => match UnaryOperator::from_symbol(&token.value) {
                Some(operator) => {
                    let operand = self.parse_atom()?;
                    return Ok(Node::UnaryExpression(UnaryExpression {
                        operator,
                        operand: Box::new(operand),
                        is_suffix: false,
                    }));
                }
                None => return Err(SyntaxError::unexpected(&token, Some("expression"))),
            },
            TokenKind::Punctuation => return Err(SyntaxError::unexpected(&token, Some("expression"))),
        };
        self.maybe_postfix(atom)
    }

    /// Applies any trailing calls, indexers and member accesses.
    fn maybe_postfix(&mut self, mut node: Node) -> SyntaxResult<Node> {
        loop {
            let Some(token) = self.peek()? else {
                return Ok(node);
            };
            if token.kind != TokenKind::Punctuation {
                return Ok(node);
            }
            node = match token.value.as_str() {
                "(" => self.maybe_call(node)?,
                "[" => self.maybe_indexer(node)?,
                "." => self.maybe_member(node)?,
                _ => return Ok(node),
            };
        }
    }

    fn maybe_call(&mut self, callee: Node) -> SyntaxResult<Node> {
        self.tokens.consume(TokenKind::Punctuation, "(")?;
        let (arguments, _) = self.delimited(")")?;
        // `obj.method(args)` keeps the object as the receiver of the call.
        match callee {
            Node::MemberExpression(MemberExpression { object, property }) => match *property {
                Node::Identifier(name) => Ok(Node::MemberExpression(MemberExpression {
                    object,
                    property: Box::new(Node::FunctionCall(FunctionCall {
                        callee: Box::new(Node::Identifier(name)),
                        arguments,
                    })),
                })),
                property => Ok(Node::FunctionCall(FunctionCall {
                    callee: Box::new(Node::MemberExpression(MemberExpression {
                        object,
                        property: Box::new(property),
                    })),
                    arguments,
                })),
            },
            callee => Ok(Node::FunctionCall(FunctionCall {
                callee: Box::new(callee),
                arguments,
            })),
        }
    }

    fn maybe_indexer(&mut self, target: Node) -> SyntaxResult<Node> {
        self.tokens.consume(TokenKind::Punctuation, "[")?;
        let index = self.parse_value_expression()?;
        self.tokens.consume(TokenKind::Punctuation, "]")?;
        Ok(Node::IndexerCall(IndexerCall {
            target: Box::new(target),
            index: Box::new(index),
        }))
    }

    fn maybe_member(&mut self, object: Node) -> SyntaxResult<Node> {
        self.tokens.consume(TokenKind::Punctuation, ".")?;
        let token = self.next()?;
        if token.kind != TokenKind::Identifier {
            return Err(SyntaxError::unexpected(&token, Some("property name")));
        }
        let mut node = object;
        for segment in segments(&token)? {
            node = Node::MemberExpression(MemberExpression {
                object: Box::new(node),
                property: Box::new(Node::Identifier(segment.to_string())),
            });
        }
        Ok(node)
    }

    /// Precedence climbing: folds operators binding tighter than `min_precedence`.
    fn maybe_binary(&mut self, left: Node, min_precedence: u8) -> SyntaxResult<Node> {
        let mut left = left;
        loop {
            let Some(token) = self.peek()? else {
                return Ok(left);
            };
            if token.kind != TokenKind::Operator {
                return Ok(left);
            }

            if token.value == "++" || token.value == "--" {
                self.next()?;
                let operator = match token.value.as_str() {
                    "++" => UnaryOperator::Increment,
                    _ => UnaryOperator::Decrement,
                };
                left = Node::UnaryExpression(UnaryExpression {
                    operator,
                    operand: Box::new(left),
                    is_suffix: true,
                });
                continue;
            }

            let Some(precedence) = precedence(&token.value) else {
                return Err(SyntaxError::new(
                    SyntaxErrorKind::UnknownOperator(token.value),
                    token.position,
                ));
            };
            if precedence <= min_precedence {
                return Ok(left);
            }
            if token.value == "=>" {
                return Err(SyntaxError::unexpected(&token, None));
            }
            if is_assignment(&token.value) {
                left = self.maybe_assignment(left)?;
                continue;
            }

            self.next()?;
            let operator = binary_operator(&token, &token.value)?;
            // `**` is right-associative.
            let floor = if operator == BinaryOperator::Exponent {
                precedence - 1
            } else {
                precedence
            };
            let atom = self.parse_atom()?;
            let right = self.maybe_binary(atom, floor)?;
            left = Node::BinaryExpression(BinaryExpression {
                kind: BinaryKind::Binary,
                operator,
                left: Box::new(left),
                right: Box::new(right),
            });
        }
    }

    fn maybe_assignment(&mut self, target: Node) -> SyntaxResult<Node> {
        let token = self.next()?;
        if !matches!(target, Node::Identifier(_) | Node::IndexerCall(_)) {
            return Err(SyntaxError::new(
                SyntaxErrorKind::InvalidAssignmentTarget,
                token.position,
            ));
        }
        let operator = match token.value.strip_suffix('=') {
            Some("") => BinaryOperator::Assign,
            Some(base) => binary_operator(&token, base)?,
            None => return Err(SyntaxError::unexpected(&token, Some("="))),
        };
        // Floor below assignment so `a = b = c` nests to the right.
        let atom = self.parse_atom()?;
        let value = self.maybe_binary(atom, 1)?;
        Ok(Node::BinaryExpression(BinaryExpression {
            kind: BinaryKind::Assignment,
            operator,
            left: Box::new(target),
            right: Box::new(value),
        }))
    }

    /// Parses comma separated expressions up to `close`; the opening token is
    /// already consumed. Returns the items and the closing token.
    fn delimited(&mut self, close: &str) -> SyntaxResult<(Vec<Node>, Token)> {
        let mut items = Vec::new();
        loop {
            if self.peek_is(TokenKind::Punctuation, close)? {
                let close = self.next()?;
                return Ok((items, close));
            }
            let item = self.parse_value_expression()?;
            if !item.is_dead() {
                items.push(item);
            }
            match self.peek()? {
                Some(token) if token.is(TokenKind::Punctuation, ",") => {
                    self.next()?;
                }
                Some(token) if token.is(TokenKind::Punctuation, close) => {}
                Some(token) => return Err(SyntaxError::unexpected(&token, Some(close))),
                None => return Err(self.tokens.error(SyntaxErrorKind::UnexpectedEnd)),
            }
        }
    }

    fn parse_block(&mut self) -> SyntaxResult<Node> {
        self.tokens.consume(TokenKind::Punctuation, "{")?;
        let mut body = Vec::new();
        while !self.peek_is(TokenKind::Punctuation, "}")? {
            let node = self.parse_expression()?;
            if !node.is_dead() {
                body.push(node);
            }
        }
        self.next()?;
        Ok(Node::Block(body))
    }

    fn parse_variable_declaration(&mut self) -> SyntaxResult<Node> {
        let keyword = self.next()?;
        let Some(kind) = DeclarationKind::from_keyword(&keyword.value) else {
            return Err(SyntaxError::unexpected(&keyword, Some("let, const or var")));
        };
        let name_token = self.next()?;
        if name_token.kind != TokenKind::Identifier {
            return Err(SyntaxError::unexpected(&name_token, Some("identifier")));
        }
        let name = plain_name(&name_token)?;

        let init = if self.peek_is(TokenKind::Operator, "=")? {
            self.next()?;
            self.parse_value_expression()?
        } else {
            // `for (const x of xs)` binds without an initializer.
            if kind == DeclarationKind::Const && !self.peek_is(TokenKind::Keyword, "of")? {
                return Err(SyntaxError::new(
                    SyntaxErrorKind::MissingInitializer(name),
                    name_token.position,
                ));
            }
            Node::Dead
        };
        Ok(Node::VariableDeclaration(VariableDeclaration {
            kind,
            name,
            init: Box::new(init),
        }))
    }

    fn parse_if(&mut self) -> SyntaxResult<Node> {
        self.tokens.consume(TokenKind::Keyword, "if")?;
        self.tokens.consume(TokenKind::Punctuation, "(")?;
        let test = self.parse_value_expression()?;
        self.tokens.consume(TokenKind::Punctuation, ")")?;

        let consequent = self.parse_expression()?;
        if !matches!(consequent, Node::Block(_)) {
            self.skip_semicolon()?;
        }
        let alternate = if self.peek_is(TokenKind::Keyword, "else")? {
            self.next()?;
            self.parse_expression()?
        } else {
            Node::Dead
        };

        Ok(Node::IfStatement(IfStatement {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        }))
    }

    fn parse_for(&mut self) -> SyntaxResult<Node> {
        self.tokens.consume(TokenKind::Keyword, "for")?;
        self.tokens.consume(TokenKind::Punctuation, "(")?;

        let init = match self.peek()? {
            Some(token) if token.is(TokenKind::Punctuation, ";") => Node::Dead,
            Some(token) if token.kind == TokenKind::Keyword && DeclarationKind::from_keyword(&token.value).is_some() => {
                self.parse_variable_declaration()?
            }
            _ => self.parse_value_expression()?,
        };

        if let Node::VariableDeclaration(decl) = &init {
            if decl.init.is_dead() && self.peek_is(TokenKind::Keyword, "of")? {
                self.next()?;
                let iterable = self.parse_value_expression()?;
                self.tokens.consume(TokenKind::Punctuation, ")")?;
                let body = self.in_loop(Self::parse_expression)?;
                return Ok(Node::ForOfStatement(ForOfStatement {
                    kind: decl.kind,
                    binding: decl.name.clone(),
                    iterable: Box::new(iterable),
                    body: Box::new(body),
                }));
            }
        }

        self.tokens.consume(TokenKind::Punctuation, ";")?;
        let test = if self.peek_is(TokenKind::Punctuation, ";")? {
            Node::Dead
        } else {
            self.parse_value_expression()?
        };
        self.tokens.consume(TokenKind::Punctuation, ";")?;
        let update = if self.peek_is(TokenKind::Punctuation, ")")? {
            Node::Dead
        } else {
            self.parse_value_expression()?
        };
        self.tokens.consume(TokenKind::Punctuation, ")")?;
        let body = self.in_loop(Self::parse_expression)?;

        Ok(Node::ForStatement(ForStatement {
            init: Box::new(init),
            test: Box::new(test),
            update: Box::new(update),
            body: Box::new(body),
        }))
    }

    fn parse_return(&mut self) -> SyntaxResult<Node> {
        let keyword = self.tokens.consume(TokenKind::Keyword, "return")?;
        if self.function_depth == 0 {
            return Err(SyntaxError::new(SyntaxErrorKind::IllegalReturn, keyword.position));
        }
        let value = match self.peek()? {
            None => Node::Dead,
            Some(token) if token.is(TokenKind::Punctuation, ";") || token.is(TokenKind::Punctuation, "}") => {
                Node::Dead
            }
            Some(_) => self.parse_value_expression()?,
        };
        Ok(Node::FunctionReturn(Box::new(value)))
    }

    fn parse_break(&mut self) -> SyntaxResult<Node> {
        let keyword = self.tokens.consume(TokenKind::Keyword, "break")?;
        if self.loop_depth == 0 {
            return Err(SyntaxError::new(SyntaxErrorKind::IllegalBreak, keyword.position));
        }
        Ok(Node::BreakStatement)
    }

    /// Parses the rest of a `function` form; the keyword is already consumed.
    fn parse_function(&mut self) -> SyntaxResult<FunctionDeclaration> {
        let name = match self.peek()? {
            Some(token) if token.kind == TokenKind::Identifier => {
                self.next()?;
                Some(plain_name(&token)?)
            }
            _ => None,
        };
        let open = self.tokens.consume(TokenKind::Punctuation, "(")?;
        let (items, _) = self.delimited(")")?;
        let params = parameters(items, &open)?;
        let body = self.in_function(Self::parse_block)?;
        Ok(FunctionDeclaration { name, params, body })
    }

    fn parse_arrow(&mut self, params: Vec<String>) -> SyntaxResult<Node> {
        self.tokens.consume(TokenKind::Operator, "=>")?;
        let body = self.in_function(|parser| {
            if parser.peek_is(TokenKind::Punctuation, "{")? {
                parser.parse_block()
            } else {
                parser.parse_value_expression()
            }
        })?;
        Ok(Node::AnonymousFunctionDeclaration(Rc::new(FunctionDeclaration {
            name: None,
            params,
            body,
        })))
    }

    fn in_loop(&mut self, parse: impl FnOnce(&mut Self) -> SyntaxResult<Node>) -> SyntaxResult<Node> {
        self.loop_depth += 1;
        let result = parse(self);
        self.loop_depth -= 1;
        result
    }

    fn nested(&mut self, parse: impl FnOnce(&mut Self) -> SyntaxResult<Node>) -> SyntaxResult<Node> {
        if self.nesting >= MAX_NESTING {
            return Err(self.tokens.error(SyntaxErrorKind::TooDeeplyNested));
        }
        self.nesting += 1;
        let result = parse(self);
        self.nesting -= 1;
        result
    }

    // A function body starts outside of any loop.
    fn in_function(&mut self, parse: impl FnOnce(&mut Self) -> SyntaxResult<Node>) -> SyntaxResult<Node> {
        let loop_depth = std::mem::replace(&mut self.loop_depth, 0);
        self.function_depth += 1;
        let result = parse(self);
        self.function_depth -= 1;
        self.loop_depth = loop_depth;
        result
    }
}

fn parse_number(token: &Token) -> SyntaxResult<Node> {
    let invalid = || SyntaxError::new(SyntaxErrorKind::InvalidNumber(token.value.clone()), token.position);
    if token.value.contains('.') {
        let value = token.value.parse::<f64>().map_err(|_| invalid())?;
        return Ok(Node::Literal(Literal::Float(value)));
    }
    match token.value.parse::<i64>() {
        Ok(value) => Ok(Node::Literal(Literal::Integer(value))),
        Err(_) => {
            let value = token.value.parse::<f64>().map_err(|_| invalid())?;
            Ok(Node::Literal(Literal::Float(value)))
        }
    }
}

fn binary_operator(token: &Token, symbol: &str) -> SyntaxResult<BinaryOperator> {
    BinaryOperator::from_symbol(symbol).ok_or_else(|| {
        SyntaxError::new(SyntaxErrorKind::UnknownOperator(token.value.clone()), token.position)
    })
}

/// Splits a member-like identifier such as `arr.length`.
fn segments(token: &Token) -> SyntaxResult<Vec<&str>> {
    let segments: Vec<&str> = token.value.split('.').collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(SyntaxError::new(
            SyntaxErrorKind::InvalidIdentifier(token.value.clone()),
            token.position,
        ));
    }
    Ok(segments)
}

fn member_chain(token: &Token) -> SyntaxResult<Node> {
    let mut segments = segments(token)?.into_iter();
    let mut node = match segments.next() {
        Some(first) => Node::Identifier(first.to_string()),
        None => {
            return Err(SyntaxError::new(
                SyntaxErrorKind::InvalidIdentifier(token.value.clone()),
                token.position,
            ));
        }
    };
    for segment in segments {
        node = Node::MemberExpression(MemberExpression {
            object: Box::new(node),
            property: Box::new(Node::Identifier(segment.to_string())),
        });
    }
    Ok(node)
}

fn plain_name(token: &Token) -> SyntaxResult<String> {
    if token.value.contains('.') {
        return Err(SyntaxError::new(
            SyntaxErrorKind::InvalidIdentifier(token.value.clone()),
            token.position,
        ));
    }
    Ok(token.value.clone())
}

fn parameters(items: Vec<Node>, open: &Token) -> SyntaxResult<Vec<String>> {
    items
        .into_iter()
        .map(|item| match item {
            Node::Identifier(name) => Ok(name),
            _ => Err(SyntaxError::new(SyntaxErrorKind::InvalidParameter, open.position)),
        })
        .collect()
}

pub fn parse(source: &str) -> SyntaxResult<Node> {
    Parser::new(source).parse_program()
}
