//! Syntax tree handed to the checker by the host front-end
//!
//! The tree is a closed set of node kinds. Declarations carry the ids the
//! host's symbol tables use ([`TypeId`], [`MethodId`], [`FieldId`]); every
//! expression carries a [`NodeId`] so extensions and diagnostics can refer to
//! the exact construct instance.
//!
//! [`Visitor`] provides default structural recursion for every node kind via
//! the `walk_*` functions; analyses override only the hooks they care about.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Byte range of a construct in its source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }
}

/// One top-level syntax unit; the checker runs one pass per unit
#[derive(Debug, Clone, PartialEq)]
pub struct CompilationUnit {
    pub name: String,
    pub types: Vec<TypeDecl>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub id: TypeId,
    pub name: String,
    pub members: Vec<Member>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Field(FieldDecl),
    Method(MethodDecl),
    /// Instance or static initializer block
    Initializer { is_static: bool, body: Vec<Stmt> },
    Type(TypeDecl),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub id: FieldId,
    pub name: String,
    pub is_static: bool,
    pub init: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    Method,
    Constructor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub id: MethodId,
    pub name: String,
    pub kind: MethodKind,
    pub params: Vec<String>,
    /// `None` for abstract and native methods
    pub body: Option<Vec<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expr(Expr),
    Local { name: String, init: Option<Expr> },
    Return(Option<Expr>),
    If { cond: Expr, then_branch: Vec<Stmt>, else_branch: Option<Vec<Stmt>> },
    While { cond: Expr, body: Vec<Stmt> },
    Block(Vec<Stmt>),
    /// Local class declaration
    LocalType(TypeDecl),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    BitNot,
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
}

impl UnaryOp {
    /// Increment and decrement write to their operand
    pub fn is_update(self) -> bool {
        matches!(
            self,
            UnaryOp::PreIncrement
                | UnaryOp::PreDecrement
                | UnaryOp::PostIncrement
                | UnaryOp::PostDecrement
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Bool(bool),
    Char(char),
    String(String),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub id: NodeId,
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(id: NodeId, kind: ExprKind) -> Self {
        Self { id, kind, span: Span::default() }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// The field this expression names, for identifiers and member selects
    pub fn referenced_field(&self) -> Option<FieldId> {
        match &self.kind {
            ExprKind::Ident { field, .. } | ExprKind::MemberSelect { field, .. } => *field,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Call { callee: MethodId, receiver: Option<Box<Expr>>, args: Vec<Expr> },
    /// Object construction, optionally with an anonymous class body
    New { constructor: MethodId, args: Vec<Expr>, body: Option<Box<TypeDecl>> },
    ArrayAccess { array: Box<Expr>, index: Box<Expr> },
    Assign { target: Box<Expr>, value: Box<Expr> },
    Binary { op: BinaryOp, left: Box<Expr>, right: Box<Expr> },
    CompoundAssign { op: BinaryOp, target: Box<Expr>, value: Box<Expr> },
    Conditional { cond: Box<Expr>, then_expr: Box<Expr>, else_expr: Box<Expr> },
    InstanceOf { expr: Box<Expr>, ty: String },
    Literal(Literal),
    NewArray { element: String, dims: Vec<Expr>, init: Vec<Expr> },
    TypeCast { ty: String, expr: Box<Expr> },
    Unary { op: UnaryOp, operand: Box<Expr> },
    Lambda { params: Vec<String>, body: Vec<Stmt> },
    MemberReference { target: Box<Expr>, method: MethodId },
    MemberSelect { target: Box<Expr>, name: String, field: Option<FieldId> },
    Ident { name: String, field: Option<FieldId> },
}

/// Structural traversal over a [`CompilationUnit`]
pub trait Visitor: Sized {
    type Error;

    fn visit_unit(&mut self, unit: &CompilationUnit) -> Result<(), Self::Error> {
        walk_unit(self, unit)
    }

    fn visit_type(&mut self, ty: &TypeDecl) -> Result<(), Self::Error> {
        walk_type(self, ty)
    }

    fn visit_field(&mut self, field: &FieldDecl) -> Result<(), Self::Error> {
        walk_field(self, field)
    }

    fn visit_method(&mut self, method: &MethodDecl) -> Result<(), Self::Error> {
        walk_method(self, method)
    }

    fn visit_stmt(&mut self, stmt: &Stmt) -> Result<(), Self::Error> {
        walk_stmt(self, stmt)
    }

    fn visit_expr(&mut self, expr: &Expr) -> Result<(), Self::Error> {
        walk_expr(self, expr)
    }
}

pub fn walk_unit<V: Visitor>(visitor: &mut V, unit: &CompilationUnit) -> Result<(), V::Error> {
    for ty in &unit.types {
        visitor.visit_type(ty)?;
    }
    Ok(())
}

pub fn walk_type<V: Visitor>(visitor: &mut V, ty: &TypeDecl) -> Result<(), V::Error> {
    for member in &ty.members {
        match member {
            Member::Field(field) => visitor.visit_field(field)?,
            Member::Method(method) => visitor.visit_method(method)?,
            Member::Initializer { body, .. } => walk_stmts(visitor, body)?,
            Member::Type(nested) => visitor.visit_type(nested)?,
        }
    }
    Ok(())
}

pub fn walk_field<V: Visitor>(visitor: &mut V, field: &FieldDecl) -> Result<(), V::Error> {
    if let Some(init) = &field.init {
        visitor.visit_expr(init)?;
    }
    Ok(())
}

pub fn walk_method<V: Visitor>(visitor: &mut V, method: &MethodDecl) -> Result<(), V::Error> {
    if let Some(body) = &method.body {
        walk_stmts(visitor, body)?;
    }
    Ok(())
}

pub fn walk_stmts<V: Visitor>(visitor: &mut V, stmts: &[Stmt]) -> Result<(), V::Error> {
    for stmt in stmts {
        visitor.visit_stmt(stmt)?;
    }
    Ok(())
}

pub fn walk_stmt<V: Visitor>(visitor: &mut V, stmt: &Stmt) -> Result<(), V::Error> {
    match stmt {
        Stmt::Expr(expr) => visitor.visit_expr(expr),
        Stmt::Local { init, .. } => match init {
            Some(init) => visitor.visit_expr(init),
            None => Ok(()),
        },
        Stmt::Return(value) => match value {
            Some(value) => visitor.visit_expr(value),
            None => Ok(()),
        },
        Stmt::If { cond, then_branch, else_branch } => {
            visitor.visit_expr(cond)?;
            walk_stmts(visitor, then_branch)?;
            if let Some(else_branch) = else_branch {
                walk_stmts(visitor, else_branch)?;
            }
            Ok(())
        }
        Stmt::While { cond, body } => {
            visitor.visit_expr(cond)?;
            walk_stmts(visitor, body)
        }
        Stmt::Block(body) => walk_stmts(visitor, body),
        Stmt::LocalType(ty) => visitor.visit_type(ty),
    }
}

pub fn walk_expr<V: Visitor>(visitor: &mut V, expr: &Expr) -> Result<(), V::Error> {
    match &expr.kind {
        ExprKind::Call { receiver, args, .. } => {
            if let Some(receiver) = receiver {
                visitor.visit_expr(receiver)?;
            }
            walk_exprs(visitor, args)
        }
        ExprKind::New { args, body, .. } => {
            walk_exprs(visitor, args)?;
            if let Some(body) = body {
                visitor.visit_type(body)?;
            }
            Ok(())
        }
        ExprKind::ArrayAccess { array, index } => {
            visitor.visit_expr(array)?;
            visitor.visit_expr(index)
        }
        ExprKind::Assign { target, value } | ExprKind::CompoundAssign { target, value, .. } => {
            visitor.visit_expr(target)?;
            visitor.visit_expr(value)
        }
        ExprKind::Binary { left, right, .. } => {
            visitor.visit_expr(left)?;
            visitor.visit_expr(right)
        }
        ExprKind::Conditional { cond, then_expr, else_expr } => {
            visitor.visit_expr(cond)?;
            visitor.visit_expr(then_expr)?;
            visitor.visit_expr(else_expr)
        }
        ExprKind::InstanceOf { expr, .. } | ExprKind::TypeCast { expr, .. } => {
            visitor.visit_expr(expr)
        }
        ExprKind::NewArray { dims, init, .. } => {
            walk_exprs(visitor, dims)?;
            walk_exprs(visitor, init)
        }
        ExprKind::Unary { operand, .. } => visitor.visit_expr(operand),
        ExprKind::Lambda { body, .. } => walk_stmts(visitor, body),
        ExprKind::MemberReference { target, .. } | ExprKind::MemberSelect { target, .. } => {
            visitor.visit_expr(target)
        }
        ExprKind::Literal(_) | ExprKind::Ident { .. } => Ok(()),
    }
}

fn walk_exprs<V: Visitor>(visitor: &mut V, exprs: &[Expr]) -> Result<(), V::Error> {
    for expr in exprs {
        visitor.visit_expr(expr)?;
    }
    Ok(())
}

/// Allocates fresh [`NodeId`]s while a host lowers its own AST
#[derive(Debug, Default)]
pub struct TreeBuilder {
    next_node: u32,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expr(&mut self, kind: ExprKind) -> Expr {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        Expr::new(id, kind)
    }

    pub fn literal(&mut self, literal: Literal) -> Expr {
        self.expr(ExprKind::Literal(literal))
    }

    pub fn int(&mut self, value: i64) -> Expr {
        self.literal(Literal::Int(value))
    }

    pub fn local(&mut self, name: &str) -> Expr {
        self.expr(ExprKind::Ident { name: name.to_string(), field: None })
    }

    pub fn field(&mut self, name: &str, field: FieldId) -> Expr {
        self.expr(ExprKind::Ident { name: name.to_string(), field: Some(field) })
    }

    pub fn select(&mut self, target: Expr, name: &str, field: Option<FieldId>) -> Expr {
        self.expr(ExprKind::MemberSelect {
            target: Box::new(target),
            name: name.to_string(),
            field,
        })
    }

    pub fn call(&mut self, callee: MethodId, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Call { callee, receiver: None, args })
    }

    pub fn new_object(&mut self, constructor: MethodId, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::New { constructor, args, body: None })
    }

    pub fn assign(&mut self, target: Expr, value: Expr) -> Expr {
        self.expr(ExprKind::Assign { target: Box::new(target), value: Box::new(value) })
    }

    pub fn compound_assign(&mut self, op: BinaryOp, target: Expr, value: Expr) -> Expr {
        self.expr(ExprKind::CompoundAssign { op, target: Box::new(target), value: Box::new(value) })
    }

    pub fn binary(&mut self, op: BinaryOp, left: Expr, right: Expr) -> Expr {
        self.expr(ExprKind::Binary { op, left: Box::new(left), right: Box::new(right) })
    }

    pub fn unary(&mut self, op: UnaryOp, operand: Expr) -> Expr {
        self.expr(ExprKind::Unary { op, operand: Box::new(operand) })
    }

    pub fn array_access(&mut self, array: Expr, index: Expr) -> Expr {
        self.expr(ExprKind::ArrayAccess { array: Box::new(array), index: Box::new(index) })
    }

    pub fn cast(&mut self, ty: &str, expr: Expr) -> Expr {
        self.expr(ExprKind::TypeCast { ty: ty.to_string(), expr: Box::new(expr) })
    }

    pub fn lambda(&mut self, params: Vec<String>, body: Vec<Stmt>) -> Expr {
        self.expr(ExprKind::Lambda { params, body })
    }
}

impl MethodDecl {
    pub fn new(id: MethodId, name: &str, body: Vec<Stmt>) -> Self {
        Self {
            id,
            name: name.to_string(),
            kind: MethodKind::Method,
            params: Vec::new(),
            body: Some(body),
            span: Span::default(),
        }
    }

    pub fn constructor(id: MethodId, name: &str, body: Vec<Stmt>) -> Self {
        Self { kind: MethodKind::Constructor, ..Self::new(id, name, body) }
    }
}

impl TypeDecl {
    pub fn new(id: TypeId, name: &str, members: Vec<Member>) -> Self {
        Self { id, name: name.to_string(), members, span: Span::default() }
    }
}

impl FieldDecl {
    pub fn new(id: FieldId, name: &str, init: Option<Expr>) -> Self {
        Self { id, name: name.to_string(), is_static: false, init, span: Span::default() }
    }
}
