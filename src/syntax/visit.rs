//! Syntax tree traversal
//!
//! Each `visit_*` trait method defaults to the free function of the same name,
//! which walks the node's children. Override a method and call the free function
//! to keep descending.

use super::ast::*;

pub trait Visit<'ast> {
    fn visit_file(&mut self, node: &'ast File) {
        visit_file(self, node);
    }

    fn visit_decl(&mut self, node: &'ast Decl) {
        visit_decl(self, node);
    }

    fn visit_gen_decl(&mut self, node: &'ast GenDecl) {
        visit_gen_decl(self, node);
    }

    fn visit_value_spec(&mut self, node: &'ast ValueSpec) {
        visit_value_spec(self, node);
    }

    fn visit_type_spec(&mut self, node: &'ast TypeSpec) {
        visit_type_spec(self, node);
    }

    fn visit_func_decl(&mut self, node: &'ast FuncDecl) {
        visit_func_decl(self, node);
    }

    fn visit_func_type(&mut self, node: &'ast FuncType) {
        visit_func_type(self, node);
    }

    fn visit_field(&mut self, node: &'ast Field) {
        visit_field(self, node);
    }

    fn visit_block(&mut self, node: &'ast Block) {
        visit_block(self, node);
    }

    fn visit_stmt(&mut self, node: &'ast Stmt) {
        visit_stmt(self, node);
    }

    fn visit_expr(&mut self, node: &'ast Expr) {
        visit_expr(self, node);
    }

    fn visit_composite_lit(&mut self, node: &'ast CompositeLit) {
        visit_composite_lit(self, node);
    }
}

pub fn visit_file<'ast, V>(v: &mut V, node: &'ast File)
where
    V: Visit<'ast> + ?Sized,
{
    for decl in &node.decls {
        v.visit_decl(decl);
    }
}

pub fn visit_decl<'ast, V>(v: &mut V, node: &'ast Decl)
where
    V: Visit<'ast> + ?Sized,
{
    match node {
        Decl::Gen(gen) => v.visit_gen_decl(gen),
        Decl::Func(func) => v.visit_func_decl(func),
    }
}

pub fn visit_gen_decl<'ast, V>(v: &mut V, node: &'ast GenDecl)
where
    V: Visit<'ast> + ?Sized,
{
    match node {
        GenDecl::Const(specs) | GenDecl::Var(specs) => {
            for spec in specs {
                v.visit_value_spec(spec);
            }
        }
        GenDecl::Type(specs) => {
            for spec in specs {
                v.visit_type_spec(spec);
            }
        }
    }
}

pub fn visit_value_spec<'ast, V>(v: &mut V, node: &'ast ValueSpec)
where
    V: Visit<'ast> + ?Sized,
{
    if let Some(ty) = &node.ty {
        v.visit_expr(ty);
    }
    for value in &node.values {
        v.visit_expr(value);
    }
}

pub fn visit_type_spec<'ast, V>(v: &mut V, node: &'ast TypeSpec)
where
    V: Visit<'ast> + ?Sized,
{
    v.visit_expr(&node.ty);
}

pub fn visit_func_decl<'ast, V>(v: &mut V, node: &'ast FuncDecl)
where
    V: Visit<'ast> + ?Sized,
{
    if let Some(recv) = &node.recv {
        for field in recv {
            v.visit_field(field);
        }
    }
    v.visit_func_type(&node.ty);
    if let Some(body) = &node.body {
        v.visit_block(body);
    }
}

pub fn visit_func_type<'ast, V>(v: &mut V, node: &'ast FuncType)
where
    V: Visit<'ast> + ?Sized,
{
    for field in node.params.iter().chain(&node.results) {
        v.visit_field(field);
    }
}

pub fn visit_field<'ast, V>(v: &mut V, node: &'ast Field)
where
    V: Visit<'ast> + ?Sized,
{
    v.visit_expr(&node.ty);
}

pub fn visit_block<'ast, V>(v: &mut V, node: &'ast Block)
where
    V: Visit<'ast> + ?Sized,
{
    for stmt in &node.stmts {
        v.visit_stmt(stmt);
    }
}

pub fn visit_stmt<'ast, V>(v: &mut V, node: &'ast Stmt)
where
    V: Visit<'ast> + ?Sized,
{
    match node {
        Stmt::Decl(gen) => v.visit_gen_decl(gen),
        Stmt::Labeled { stmt, .. } => v.visit_stmt(stmt),
        Stmt::Expr(expr) | Stmt::Go(expr) | Stmt::Defer(expr) => v.visit_expr(expr),
        Stmt::Send { chan, value } => {
            v.visit_expr(chan);
            v.visit_expr(value);
        }
        Stmt::IncDec { target, .. } => v.visit_expr(target),
        Stmt::Assign { lhs, rhs, .. } => {
            for expr in lhs.iter().chain(rhs) {
                v.visit_expr(expr);
            }
        }
        Stmt::Return { results, .. } => {
            for expr in results {
                v.visit_expr(expr);
            }
        }
        Stmt::Branch { .. } | Stmt::Empty => {}
        Stmt::Block(block) => v.visit_block(block),
        Stmt::If {
            init,
            cond,
            then,
            els,
        } => {
            if let Some(init) = init {
                v.visit_stmt(init);
            }
            v.visit_expr(cond);
            v.visit_block(then);
            if let Some(els) = els {
                v.visit_stmt(els);
            }
        }
        Stmt::Switch { init, tag, clauses } => {
            if let Some(init) = init {
                v.visit_stmt(init);
            }
            if let Some(tag) = tag {
                v.visit_stmt(tag);
            }
            for clause in clauses {
                for expr in &clause.list {
                    v.visit_expr(expr);
                }
                for stmt in &clause.body {
                    v.visit_stmt(stmt);
                }
            }
        }
        Stmt::Select { clauses } => {
            for clause in clauses {
                if let Some(comm) = &clause.comm {
                    v.visit_stmt(comm);
                }
                for stmt in &clause.body {
                    v.visit_stmt(stmt);
                }
            }
        }
        Stmt::For {
            init,
            cond,
            post,
            body,
        } => {
            if let Some(init) = init {
                v.visit_stmt(init);
            }
            if let Some(cond) = cond {
                v.visit_expr(cond);
            }
            if let Some(post) = post {
                v.visit_stmt(post);
            }
            v.visit_block(body);
        }
        Stmt::Range {
            key,
            value,
            expr,
            body,
            ..
        } => {
            for target in key.iter().chain(value) {
                v.visit_expr(target);
            }
            v.visit_expr(expr);
            v.visit_block(body);
        }
    }
}

pub fn visit_expr<'ast, V>(v: &mut V, node: &'ast Expr)
where
    V: Visit<'ast> + ?Sized,
{
    match node {
        Expr::Ident(_) | Expr::BasicLit { .. } | Expr::InterfaceType | Expr::Bad(_) => {}
        Expr::CompositeLit(lit) => v.visit_composite_lit(lit),
        Expr::FuncLit { ty, body } => {
            v.visit_func_type(ty);
            v.visit_block(body);
        }
        Expr::Paren(inner) | Expr::Star(inner) => v.visit_expr(inner),
        Expr::Unary { operand, .. } => v.visit_expr(operand),
        Expr::Selector { base, .. } => v.visit_expr(base),
        Expr::Index { base, indices } => {
            v.visit_expr(base);
            for index in indices {
                v.visit_expr(index);
            }
        }
        Expr::Slice {
            base,
            low,
            high,
            max,
        } => {
            v.visit_expr(base);
            for bound in [low, high, max].into_iter().flatten() {
                v.visit_expr(bound);
            }
        }
        Expr::TypeAssert { base, ty } => {
            v.visit_expr(base);
            if let Some(ty) = ty {
                v.visit_expr(ty);
            }
        }
        Expr::Call { func, args, .. } => {
            v.visit_expr(func);
            for arg in args {
                v.visit_expr(arg);
            }
        }
        Expr::Binary { lhs, rhs, .. } => {
            v.visit_expr(lhs);
            v.visit_expr(rhs);
        }
        Expr::KeyValue { key, value } => {
            v.visit_expr(key);
            v.visit_expr(value);
        }
        Expr::Ellipsis(elem) => {
            if let Some(elem) = elem {
                v.visit_expr(elem);
            }
        }
        Expr::ArrayType { len, elem } => {
            if let Some(len) = len {
                v.visit_expr(len);
            }
            v.visit_expr(elem);
        }
        Expr::MapType { key, value } => {
            v.visit_expr(key);
            v.visit_expr(value);
        }
        Expr::ChanType(elem) => v.visit_expr(elem),
        Expr::FuncType(ty) => v.visit_func_type(ty),
        Expr::StructType(fields) => {
            for field in fields {
                v.visit_field(field);
            }
        }
    }
}

pub fn visit_composite_lit<'ast, V>(v: &mut V, node: &'ast CompositeLit)
where
    V: Visit<'ast> + ?Sized,
{
    if let Some(ty) = &node.ty {
        v.visit_expr(ty);
    }
    for elt in &node.elts {
        v.visit_expr(elt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_file;

    #[derive(Default)]
    struct LiteralCounter {
        literals: usize,
        zero_values: usize,
    }

    impl<'ast> Visit<'ast> for LiteralCounter {
        fn visit_composite_lit(&mut self, node: &'ast CompositeLit) {
            self.literals += 1;
            if node.is_zero_value() {
                self.zero_values += 1;
            }
            visit_composite_lit(self, node);
        }
    }

    #[test]
    fn test_reaches_nested_literals() {
        let file = parse_file(
            r#"package p

var a = Order{Total: Money{}}

func f() {
    go func() {
        items := []Item{{}, {Name: "x"}}
        _ = items
    }()
    if ok := check(Money{}); ok {
    }
    for _, m := range []Money{} {
        _ = m
    }
}
"#,
        )
        .unwrap();

        let mut counter = LiteralCounter::default();
        counter.visit_file(&file);
        assert_eq!(counter.literals, 7);
        assert_eq!(counter.zero_values, 4);
    }
}
