//! Abstract syntax tree for Go source files
//!
//! Architecture: Published Language - The tree is the shared vocabulary between parser and analyzer
//! - Nodes keep only what structural analysis needs: names, shapes and source lines
//! - Operators and literal values are kept as source text
//! - Type expressions and value expressions share one `Expr` type, as in Go's own grammar
//! - Positions are 1-indexed source lines

/// 1-indexed source line
pub type Line = u32;

/// An identifier with the line it appears on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub line: Line,
}

impl Ident {
    pub fn new(name: impl Into<String>, line: Line) -> Self {
        Self {
            name: name.into(),
            line,
        }
    }
}

/// A parsed `.go` file
#[derive(Debug, Clone, PartialEq)]
pub struct File {
    /// Name from the `package` clause
    pub package: Ident,
    /// All import specs, in source order
    pub imports: Vec<ImportSpec>,
    /// Top-level declarations other than imports
    pub decls: Vec<Decl>,
}

/// A single import: `import alias "path"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    /// Explicit name, including `_` and `.`
    pub name: Option<Ident>,
    /// Unquoted import path
    pub path: String,
    pub line: Line,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Gen(GenDecl),
    Func(FuncDecl),
}

/// `const`, `var` and `type` declarations, grouped or not
#[derive(Debug, Clone, PartialEq)]
pub enum GenDecl {
    Const(Vec<ValueSpec>),
    Var(Vec<ValueSpec>),
    Type(Vec<TypeSpec>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueSpec {
    pub names: Vec<Ident>,
    pub ty: Option<Expr>,
    pub values: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeSpec {
    pub name: Ident,
    /// `type A = B`
    pub alias: bool,
    pub ty: Expr,
}

/// A function or method declaration
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    pub recv: Option<Vec<Field>>,
    pub name: Ident,
    pub ty: FuncType,
    pub body: Option<Block>,
    /// Line of the `func` keyword
    pub start_line: Line,
    /// Line of the closing brace, or of the signature end for body-less declarations
    pub end_line: Line,
}

impl FuncDecl {
    /// Receiver base type name for methods (`(s *Stack[T])` gives `Stack`)
    pub fn receiver_type_name(&self) -> Option<&str> {
        let field = self.recv.as_ref()?.first()?;
        let mut ty = &field.ty;
        loop {
            match ty {
                Expr::Star(inner) | Expr::Paren(inner) => ty = inner,
                Expr::Index { base, .. } => ty = base,
                Expr::Ident(ident) => return Some(&ident.name),
                _ => return None,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncType {
    pub params: Vec<Field>,
    pub results: Vec<Field>,
}

/// A field in a struct, parameter list or result list
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Empty for embedded fields and unnamed parameters
    pub names: Vec<Ident>,
    pub ty: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub line: Line,
    pub end_line: Line,
}

/// `T{...}`, or `{...}` with the type elided inside another literal
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeLit {
    pub ty: Option<Box<Expr>>,
    pub elts: Vec<Expr>,
    pub line: Line,
}

impl CompositeLit {
    /// No field initializers at all
    pub fn is_zero_value(&self) -> bool {
        self.elts.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident(Ident),
    /// Number, rune or string literal
    BasicLit {
        value: String,
        line: Line,
    },
    CompositeLit(CompositeLit),
    FuncLit {
        ty: FuncType,
        body: Block,
    },
    Paren(Box<Expr>),
    Selector {
        base: Box<Expr>,
        sel: Ident,
    },
    /// Index expression or generic instantiation (`m[k]`, `List[int]`, `Map[K, V]`)
    Index {
        base: Box<Expr>,
        indices: Vec<Expr>,
    },
    Slice {
        base: Box<Expr>,
        low: Option<Box<Expr>>,
        high: Option<Box<Expr>>,
        max: Option<Box<Expr>>,
    },
    /// `x.(T)`; `ty` is `None` for `x.(type)`
    TypeAssert {
        base: Box<Expr>,
        ty: Option<Box<Expr>>,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
    },
    /// Pointer type or dereference
    Star(Box<Expr>),
    Unary {
        op: String,
        operand: Box<Expr>,
    },
    Binary {
        op: String,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    KeyValue {
        key: Box<Expr>,
        value: Box<Expr>,
    },
    /// `...T` in parameter lists, `...` as an array length
    Ellipsis(Option<Box<Expr>>),
    ArrayType {
        len: Option<Box<Expr>>,
        elem: Box<Expr>,
    },
    MapType {
        key: Box<Expr>,
        value: Box<Expr>,
    },
    ChanType(Box<Expr>),
    FuncType(FuncType),
    StructType(Vec<Field>),
    /// Interface bodies are not needed for analysis and are not retained
    InterfaceType,
    /// A construct the analysis has no use for
    Bad(Line),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Decl(GenDecl),
    Labeled {
        label: Ident,
        stmt: Box<Stmt>,
    },
    Expr(Expr),
    Send {
        chan: Expr,
        value: Expr,
    },
    IncDec {
        target: Expr,
        op: String,
    },
    Assign {
        lhs: Vec<Expr>,
        op: String,
        rhs: Vec<Expr>,
        line: Line,
    },
    Go(Expr),
    Defer(Expr),
    Return {
        results: Vec<Expr>,
        line: Line,
    },
    Branch {
        keyword: String,
        label: Option<Ident>,
    },
    Block(Block),
    If {
        init: Option<Box<Stmt>>,
        cond: Expr,
        then: Block,
        els: Option<Box<Stmt>>,
    },
    Switch {
        init: Option<Box<Stmt>>,
        tag: Option<Box<Stmt>>,
        clauses: Vec<CaseClause>,
    },
    Select {
        clauses: Vec<CommClause>,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        post: Option<Box<Stmt>>,
        body: Block,
    },
    Range {
        key: Option<Expr>,
        value: Option<Expr>,
        expr: Expr,
        body: Block,
    },
    Empty,
}

/// `case a, b:` or `default:` in an expression or type switch
#[derive(Debug, Clone, PartialEq)]
pub struct CaseClause {
    /// Empty for `default`
    pub list: Vec<Expr>,
    pub body: Vec<Stmt>,
}

/// `case <comm>:` or `default:` in a select
#[derive(Debug, Clone, PartialEq)]
pub struct CommClause {
    /// `None` for `default`
    pub comm: Option<Box<Stmt>>,
    pub body: Vec<Stmt>,
}
