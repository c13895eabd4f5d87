//! Go parsing through tree-sitter
//!
//! Architecture: Anti-Corruption Layer - tree-sitter nodes are lowered into the `ast` vocabulary
//! - A tree holding any ERROR or MISSING node is rejected with the line of the first one
//! - Comments are tree extras and never reach the `ast`
//! - Only declarations may appear at the top level

use super::ast::*;
use super::ParseError;
use tree_sitter::{Node, Parser};

/// Parse one Go source file
pub fn parse_file(source: &str) -> Result<File, ParseError> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);

    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_go::LANGUAGE.into())
        .map_err(|e| ParseError::new(0, format!("Go grammar unavailable: {e}")))?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| ParseError::new(0, "parser returned no tree"))?;

    let lowering = Lowering {
        source: source.as_bytes(),
    };
    let root = tree.root_node();
    if root.has_error() {
        return Err(lowering.syntax_error(root));
    }
    lowering.file(root)
}

fn line_of(node: Node<'_>) -> Line {
    node.start_position().row as Line + 1
}

fn end_line_of(node: Node<'_>) -> Line {
    node.end_position().row as Line + 1
}

/// Named children without comments
fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    let children = node
        .named_children(&mut cursor)
        .filter(|child| !child.is_extra())
        .collect();
    children
}

fn field_children<'t>(node: Node<'t>, field: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    let children = node.children_by_field_name(field, &mut cursor).collect();
    children
}

/// Whether `node` has the anonymous token `token` as a direct child
fn has_token(node: Node<'_>, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|child| !child.is_named() && child.kind() == token);
    found
}

/// Innermost ERROR or MISSING node on the leftmost erroneous path
fn first_error(node: Node<'_>) -> Node<'_> {
    let mut cursor = node.walk();
    let child = node.children(&mut cursor).find(|child| child.has_error());
    match child {
        Some(child) if child.is_error() || child.is_missing() => child,
        Some(child) => first_error(child),
        None => node,
    }
}

/// Specs of a declaration, with parenthesized groups flattened
fn specs<'t>(decl: Node<'t>, kinds: &[&str]) -> Vec<Node<'t>> {
    named_children(decl)
        .into_iter()
        .flat_map(|child| {
            if kinds.contains(&child.kind()) {
                vec![child]
            } else {
                specs(child, kinds)
            }
        })
        .collect()
}

fn unquote(literal: &str) -> &str {
    literal
        .get(1..literal.len().saturating_sub(1))
        .unwrap_or_default()
}

struct Lowering<'s> {
    source: &'s [u8],
}

impl Lowering<'_> {
    fn text(&self, node: Node<'_>) -> String {
        node.utf8_text(self.source).unwrap_or_default().to_string()
    }

    fn syntax_error(&self, root: Node<'_>) -> ParseError {
        let node = first_error(root);
        if node.is_missing() {
            return ParseError::new(line_of(node), format!("missing '{}'", node.kind()));
        }
        let text = self.text(node);
        let snippet: String = text
            .lines()
            .next()
            .unwrap_or_default()
            .chars()
            .take(24)
            .collect();
        ParseError::new(line_of(node), format!("unexpected '{}'", snippet.trim()))
    }

    fn ident(&self, node: Node<'_>) -> Ident {
        Ident::new(self.text(node), line_of(node))
    }

    fn ident_at(&self, node: Node<'_>, field: &str) -> Ident {
        match node.child_by_field_name(field) {
            Some(child) => self.ident(child),
            None => Ident::new("", line_of(node)),
        }
    }

    fn idents_at(&self, node: Node<'_>, field: &str) -> Vec<Ident> {
        field_children(node, field)
            .into_iter()
            .map(|child| self.ident(child))
            .collect()
    }

    fn file(&self, root: Node<'_>) -> Result<File, ParseError> {
        let mut package = None;
        let mut imports = Vec::new();
        let mut decls = Vec::new();

        for node in named_children(root) {
            match node.kind() {
                "package_clause" => {
                    package = named_children(node).first().map(|name| self.ident(*name));
                }
                "import_declaration" => self.imports(node, &mut imports),
                "function_declaration" | "method_declaration" => {
                    decls.push(Decl::Func(self.func_decl(node)))
                }
                "const_declaration" | "var_declaration" | "type_declaration" => {
                    decls.push(Decl::Gen(self.gen_decl(node)))
                }
                other => {
                    return Err(ParseError::new(
                        line_of(node),
                        format!("{} outside function body", other.replace('_', " ")),
                    ))
                }
            }
        }

        let package = package.ok_or_else(|| ParseError::new(1, "missing package clause"))?;
        Ok(File {
            package,
            imports,
            decls,
        })
    }

    fn imports(&self, node: Node<'_>, out: &mut Vec<ImportSpec>) {
        for child in named_children(node) {
            match child.kind() {
                "import_spec" => {
                    if let Some(path) = child.child_by_field_name("path") {
                        out.push(ImportSpec {
                            name: child.child_by_field_name("name").map(|n| self.ident(n)),
                            path: unquote(&self.text(path)).to_string(),
                            line: line_of(child),
                        });
                    }
                }
                "import_spec_list" => self.imports(child, out),
                _ => {}
            }
        }
    }

    fn gen_decl(&self, node: Node<'_>) -> GenDecl {
        match node.kind() {
            "type_declaration" => GenDecl::Type(
                specs(node, &["type_spec", "type_alias"])
                    .into_iter()
                    .map(|spec| TypeSpec {
                        name: self.ident_at(spec, "name"),
                        alias: spec.kind() == "type_alias",
                        ty: self.expr_at(spec, "type"),
                    })
                    .collect(),
            ),
            "const_declaration" => GenDecl::Const(self.value_specs(node, "const_spec")),
            _ => GenDecl::Var(self.value_specs(node, "var_spec")),
        }
    }

    fn value_specs(&self, node: Node<'_>, kind: &str) -> Vec<ValueSpec> {
        specs(node, &[kind])
            .into_iter()
            .map(|spec| ValueSpec {
                names: self.idents_at(spec, "name"),
                ty: spec.child_by_field_name("type").map(|ty| self.expr(ty)),
                values: self.list_at(spec, "value"),
            })
            .collect()
    }

    fn func_decl(&self, node: Node<'_>) -> FuncDecl {
        FuncDecl {
            recv: node
                .child_by_field_name("receiver")
                .map(|recv| self.params(recv)),
            name: self.ident_at(node, "name"),
            ty: self.func_type(node),
            body: node.child_by_field_name("body").map(|body| self.block(body)),
            start_line: line_of(node),
            end_line: end_line_of(node),
        }
    }

    fn func_type(&self, node: Node<'_>) -> FuncType {
        let results = match node.child_by_field_name("result") {
            Some(list) if list.kind() == "parameter_list" => self.params(list),
            Some(ty) => vec![Field {
                names: Vec::new(),
                ty: self.expr(ty),
            }],
            None => Vec::new(),
        };
        FuncType {
            params: node
                .child_by_field_name("parameters")
                .map(|list| self.params(list))
                .unwrap_or_default(),
            results,
        }
    }

    fn params(&self, list: Node<'_>) -> Vec<Field> {
        named_children(list)
            .into_iter()
            .map(|param| {
                let ty = self.expr_at(param, "type");
                Field {
                    names: self.idents_at(param, "name"),
                    ty: if param.kind() == "variadic_parameter_declaration" {
                        Expr::Ellipsis(Some(Box::new(ty)))
                    } else {
                        ty
                    },
                }
            })
            .collect()
    }

    fn struct_fields(&self, node: Node<'_>) -> Vec<Field> {
        let Some(list) = named_children(node)
            .into_iter()
            .find(|child| child.kind() == "field_declaration_list")
        else {
            return Vec::new();
        };

        named_children(list)
            .into_iter()
            .filter(|decl| decl.kind() == "field_declaration")
            .map(|decl| {
                let names = self.idents_at(decl, "name");
                let ty = self.expr_at(decl, "type");
                // `*Base` embeds through an anonymous star token
                let ty = if names.is_empty() && has_token(decl, "*") {
                    Expr::Star(Box::new(ty))
                } else {
                    ty
                };
                Field { names, ty }
            })
            .collect()
    }

    fn block(&self, node: Node<'_>) -> Block {
        Block {
            stmts: self.stmts(node, None),
            line: line_of(node),
            end_line: end_line_of(node),
        }
    }

    fn block_at(&self, node: Node<'_>, field: &str) -> Block {
        match node.child_by_field_name(field) {
            Some(block) => self.block(block),
            None => Block {
                stmts: Vec::new(),
                line: line_of(node),
                end_line: end_line_of(node),
            },
        }
    }

    /// Statements among the children of `node`, leaving out the `except` field
    fn stmts(&self, node: Node<'_>, except: Option<&str>) -> Vec<Stmt> {
        let skipped: Vec<usize> = except
            .map(|field| field_children(node, field).iter().map(|n| n.id()).collect())
            .unwrap_or_default();

        let mut stmts = Vec::new();
        for child in named_children(node) {
            if skipped.contains(&child.id()) {
                continue;
            }
            if child.kind() == "statement_list" {
                stmts.extend(self.stmts(child, None));
            } else {
                stmts.push(self.stmt(child));
            }
        }
        stmts
    }

    fn stmt_at(&self, node: Node<'_>, field: &str) -> Option<Box<Stmt>> {
        node.child_by_field_name(field)
            .map(|child| Box::new(self.stmt(child)))
    }

    fn stmt(&self, node: Node<'_>) -> Stmt {
        let line = line_of(node);
        match node.kind() {
            "const_declaration" | "var_declaration" | "type_declaration" => {
                Stmt::Decl(self.gen_decl(node))
            }
            "expression_statement" => Stmt::Expr(self.first_expr(node)),
            "send_statement" => Stmt::Send {
                chan: self.expr_at(node, "channel"),
                value: self.expr_at(node, "value"),
            },
            "inc_statement" => Stmt::IncDec {
                target: self.first_expr(node),
                op: "++".to_string(),
            },
            "dec_statement" => Stmt::IncDec {
                target: self.first_expr(node),
                op: "--".to_string(),
            },
            "assignment_statement" => Stmt::Assign {
                lhs: self.list_at(node, "left"),
                op: node
                    .child_by_field_name("operator")
                    .map(|op| self.text(op))
                    .unwrap_or_else(|| "=".to_string()),
                rhs: self.list_at(node, "right"),
                line,
            },
            "short_var_declaration" => Stmt::Assign {
                lhs: self.list_at(node, "left"),
                op: ":=".to_string(),
                rhs: self.list_at(node, "right"),
                line,
            },
            "receive_statement" => match node.child_by_field_name("left") {
                Some(left) => Stmt::Assign {
                    lhs: self.expr_list(left),
                    op: (if has_token(node, ":=") { ":=" } else { "=" }).to_string(),
                    rhs: vec![self.expr_at(node, "right")],
                    line,
                },
                None => Stmt::Expr(self.expr_at(node, "right")),
            },
            "return_statement" => Stmt::Return {
                results: named_children(node)
                    .first()
                    .map(|list| self.expr_list(*list))
                    .unwrap_or_default(),
                line,
            },
            "go_statement" => Stmt::Go(self.first_expr(node)),
            "defer_statement" => Stmt::Defer(self.first_expr(node)),
            "labeled_statement" | "empty_labeled_statement" => Stmt::Labeled {
                label: self.ident_at(node, "label"),
                stmt: Box::new(
                    self.stmts(node, Some("label"))
                        .into_iter()
                        .next()
                        .unwrap_or(Stmt::Empty),
                ),
            },
            "break_statement" | "continue_statement" | "goto_statement"
            | "fallthrough_statement" => Stmt::Branch {
                keyword: node.kind().trim_end_matches("_statement").to_string(),
                label: named_children(node).first().map(|label| self.ident(*label)),
            },
            "block" => Stmt::Block(self.block(node)),
            "if_statement" => Stmt::If {
                init: self.stmt_at(node, "initializer"),
                cond: self.expr_at(node, "condition"),
                then: self.block_at(node, "consequence"),
                els: self.stmt_at(node, "alternative"),
            },
            "expression_switch_statement" => Stmt::Switch {
                init: self.stmt_at(node, "initializer"),
                tag: node
                    .child_by_field_name("value")
                    .map(|tag| Box::new(Stmt::Expr(self.expr(tag)))),
                clauses: self.case_clauses(node),
            },
            "type_switch_statement" => self.type_switch(node),
            "select_statement" => Stmt::Select {
                clauses: named_children(node)
                    .into_iter()
                    .filter_map(|clause| match clause.kind() {
                        "communication_case" => Some(CommClause {
                            comm: self.stmt_at(clause, "communication"),
                            body: self.stmts(clause, Some("communication")),
                        }),
                        "default_case" => Some(CommClause {
                            comm: None,
                            body: self.stmts(clause, None),
                        }),
                        _ => None,
                    })
                    .collect(),
            },
            "for_statement" => self.for_stmt(node),
            _ => Stmt::Empty,
        }
    }

    fn case_clauses(&self, switch: Node<'_>) -> Vec<CaseClause> {
        named_children(switch)
            .into_iter()
            .filter_map(|clause| {
                let list_field = match clause.kind() {
                    "expression_case" => Some("value"),
                    "type_case" => Some("type"),
                    "default_case" => None,
                    _ => return None,
                };
                let list = list_field
                    .map(|field| {
                        field_children(clause, field)
                            .into_iter()
                            .flat_map(|node| self.expr_list(node))
                            .collect()
                    })
                    .unwrap_or_default();
                Some(CaseClause {
                    list,
                    body: self.stmts(clause, list_field),
                })
            })
            .collect()
    }

    fn type_switch(&self, node: Node<'_>) -> Stmt {
        let guard = Expr::TypeAssert {
            base: Box::new(self.expr_at(node, "value")),
            ty: None,
        };
        let tag = match node.child_by_field_name("alias") {
            Some(alias) => Stmt::Assign {
                lhs: self.expr_list(alias),
                op: ":=".to_string(),
                rhs: vec![guard],
                line: line_of(node),
            },
            None => Stmt::Expr(guard),
        };
        Stmt::Switch {
            init: self.stmt_at(node, "initializer"),
            tag: Some(Box::new(tag)),
            clauses: self.case_clauses(node),
        }
    }

    fn for_stmt(&self, node: Node<'_>) -> Stmt {
        let body_id = node.child_by_field_name("body").map(|body| body.id());
        let body = self.block_at(node, "body");
        let header = named_children(node)
            .into_iter()
            .find(|child| Some(child.id()) != body_id);

        match header {
            Some(clause) if clause.kind() == "range_clause" => {
                let mut targets = self.list_at(clause, "left").into_iter();
                Stmt::Range {
                    key: targets.next(),
                    value: targets.next(),
                    expr: self.expr_at(clause, "right"),
                    body,
                }
            }
            Some(clause) if clause.kind() == "for_clause" => Stmt::For {
                init: self.stmt_at(clause, "initializer"),
                cond: clause.child_by_field_name("condition").map(|c| self.expr(c)),
                post: self.stmt_at(clause, "update"),
                body,
            },
            Some(cond) => Stmt::For {
                init: None,
                cond: Some(self.expr(cond)),
                post: None,
                body,
            },
            None => Stmt::For {
                init: None,
                cond: None,
                post: None,
                body,
            },
        }
    }

    /// Members of an `expression_list`, or the node itself
    fn expr_list(&self, node: Node<'_>) -> Vec<Expr> {
        if node.kind() == "expression_list" {
            named_children(node)
                .into_iter()
                .map(|expr| self.expr(expr))
                .collect()
        } else {
            vec![self.expr(node)]
        }
    }

    fn list_at(&self, node: Node<'_>, field: &str) -> Vec<Expr> {
        node.child_by_field_name(field)
            .map(|list| self.expr_list(list))
            .unwrap_or_default()
    }

    fn expr_at(&self, node: Node<'_>, field: &str) -> Expr {
        match node.child_by_field_name(field) {
            Some(child) => self.expr(child),
            None => Expr::Bad(line_of(node)),
        }
    }

    fn boxed_at(&self, node: Node<'_>, field: &str) -> Box<Expr> {
        Box::new(self.expr_at(node, field))
    }

    fn opt_at(&self, node: Node<'_>, field: &str) -> Option<Box<Expr>> {
        node.child_by_field_name(field)
            .map(|child| Box::new(self.expr(child)))
    }

    fn first_expr(&self, node: Node<'_>) -> Expr {
        match named_children(node).first() {
            Some(child) => self.expr(*child),
            None => Expr::Bad(line_of(node)),
        }
    }

    fn exprs(&self, nodes: Vec<Node<'_>>) -> Vec<Expr> {
        nodes.into_iter().map(|node| self.expr(node)).collect()
    }

    fn expr(&self, node: Node<'_>) -> Expr {
        let line = line_of(node);
        match node.kind() {
            "identifier" | "type_identifier" | "field_identifier" | "package_identifier"
            | "blank_identifier" | "label_name" | "nil" | "true" | "false" | "iota" => {
                Expr::Ident(self.ident(node))
            }
            "int_literal" | "float_literal" | "imaginary_literal" | "rune_literal"
            | "interpreted_string_literal" | "raw_string_literal" => Expr::BasicLit {
                value: self.text(node),
                line,
            },
            "composite_literal" => Expr::CompositeLit(CompositeLit {
                ty: self.opt_at(node, "type"),
                elts: node
                    .child_by_field_name("body")
                    .map(|body| self.exprs(named_children(body)))
                    .unwrap_or_default(),
                line,
            }),
            // `{...}` with its type elided inside an enclosing literal
            "literal_value" => Expr::CompositeLit(CompositeLit {
                ty: None,
                elts: self.exprs(named_children(node)),
                line,
            }),
            "keyed_element" => match named_children(node).as_slice() {
                [key, value] => Expr::KeyValue {
                    key: Box::new(self.expr(*key)),
                    value: Box::new(self.expr(*value)),
                },
                _ => Expr::Bad(line),
            },
            "literal_element" | "variadic_argument" | "type_elem" => self.first_expr(node),
            "func_literal" => Expr::FuncLit {
                ty: self.func_type(node),
                body: self.block_at(node, "body"),
            },
            "parenthesized_expression" | "parenthesized_type" => {
                Expr::Paren(Box::new(self.first_expr(node)))
            }
            "selector_expression" => Expr::Selector {
                base: self.boxed_at(node, "operand"),
                sel: self.ident_at(node, "field"),
            },
            "qualified_type" => Expr::Selector {
                base: Box::new(Expr::Ident(self.ident_at(node, "package"))),
                sel: self.ident_at(node, "name"),
            },
            "index_expression" => Expr::Index {
                base: self.boxed_at(node, "operand"),
                indices: self.exprs(field_children(node, "index")),
            },
            "generic_type" => Expr::Index {
                base: self.boxed_at(node, "type"),
                indices: node
                    .child_by_field_name("type_arguments")
                    .map(|args| self.exprs(named_children(args)))
                    .unwrap_or_default(),
            },
            "type_instantiation_expression" => {
                let base_id = node.child_by_field_name("type").map(|ty| ty.id());
                let indices = named_children(node)
                    .into_iter()
                    .filter(|child| Some(child.id()) != base_id)
                    .collect();
                Expr::Index {
                    base: self.boxed_at(node, "type"),
                    indices: self.exprs(indices),
                }
            }
            "slice_expression" => Expr::Slice {
                base: self.boxed_at(node, "operand"),
                low: self.opt_at(node, "start"),
                high: self.opt_at(node, "end"),
                max: self.opt_at(node, "capacity"),
            },
            "type_assertion_expression" => Expr::TypeAssert {
                base: self.boxed_at(node, "operand"),
                ty: self.opt_at(node, "type"),
            },
            "type_conversion_expression" => Expr::Call {
                func: self.boxed_at(node, "type"),
                args: vec![self.expr_at(node, "operand")],
            },
            "call_expression" => {
                let mut func = self.expr_at(node, "function");
                if let Some(args) = node.child_by_field_name("type_arguments") {
                    func = Expr::Index {
                        base: Box::new(func),
                        indices: self.exprs(named_children(args)),
                    };
                }
                Expr::Call {
                    func: Box::new(func),
                    args: node
                        .child_by_field_name("arguments")
                        .map(|args| self.exprs(named_children(args)))
                        .unwrap_or_default(),
                }
            }
            "unary_expression" => Expr::Unary {
                op: node
                    .child_by_field_name("operator")
                    .map(|op| self.text(op))
                    .unwrap_or_default(),
                operand: self.boxed_at(node, "operand"),
            },
            "binary_expression" => Expr::Binary {
                op: node
                    .child_by_field_name("operator")
                    .map(|op| self.text(op))
                    .unwrap_or_default(),
                lhs: self.boxed_at(node, "left"),
                rhs: self.boxed_at(node, "right"),
            },
            "negated_type" => Expr::Unary {
                op: "~".to_string(),
                operand: Box::new(self.first_expr(node)),
            },
            "pointer_type" => Expr::Star(Box::new(self.first_expr(node))),
            "array_type" => Expr::ArrayType {
                len: self.opt_at(node, "length"),
                elem: self.boxed_at(node, "element"),
            },
            "implicit_length_array_type" => Expr::ArrayType {
                len: Some(Box::new(Expr::Ellipsis(None))),
                elem: self.boxed_at(node, "element"),
            },
            "slice_type" => Expr::ArrayType {
                len: None,
                elem: self.boxed_at(node, "element"),
            },
            "map_type" => Expr::MapType {
                key: self.boxed_at(node, "key"),
                value: self.boxed_at(node, "value"),
            },
            "channel_type" => Expr::ChanType(self.boxed_at(node, "value")),
            "function_type" => Expr::FuncType(self.func_type(node)),
            "struct_type" => Expr::StructType(self.struct_fields(node)),
            "interface_type" => Expr::InterfaceType,
            _ => Expr::Bad(line),
        }
    }
}
