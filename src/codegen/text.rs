use std::{collections::HashMap, fmt::Write, format as f, marker::PhantomData};

use crate::{
    ast::{
        BinaryOp, Block, Callee, Declaration, Expr, ExprKind, FunctionDef, Item, Program, Stmt,
        StmtKind, Typed, UnaryOp,
    },
    builtins,
    codegen::{
        dialect::{Dialect, Operand},
        fold, Error,
    },
    symbols::{FunctionId, Qualifier, SymbolId, SymbolTable},
    token::{Span, Spanned},
    types::Type,
    util::intern::Name,
};

const INDENT: &str = "    ";

/// Emits a decorated program as source text of a C-like shading language.
pub struct Generator<'sym, D> {
    symbols: &'sym SymbolTable,
    out: String,
    indent: usize,
    errors: Vec<Spanned<Error>>,
    /// Spellings of the user identifiers the target can't take as they are.
    renamed: HashMap<Name, String>,
    entry: Option<FunctionId>,
    _dialect: PhantomData<D>,
}

impl<'sym, D> Generator<'sym, D>
where
    D: Dialect,
{
    pub fn new(symbols: &'sym SymbolTable) -> Generator<'sym, D> {
        Generator {
            symbols,
            out: String::with_capacity(4096),
            indent: 0,
            errors: Vec::new(),
            renamed: HashMap::new(),
            entry: None,
            _dialect: PhantomData,
        }
    }

    pub fn generate(mut self, program: &Program<Typed>) -> Result<String, Vec<Spanned<Error>>> {
        self.out.push_str(D::PROLOGUE);
        self.entry = program
            .functions()
            .find(|f| {
                self.symbols.name(f.name.name) == "main"
                    && f.params.is_empty()
                    && f.ret == Type::Void
            })
            .map(|f| f.id);

        let mut after_global = false;
        for item in &program.items {
            match item {
                Item::Global(decl) => {
                    if !after_global {
                        self.out_line();
                    }
                    self.g_global(decl);
                    after_global = true;
                }
                Item::Function(function) => {
                    self.out_line();
                    self.g_function(function);
                    after_global = false;
                }
            }
        }
        self.out_line();
        D::epilogue(&mut self.out);

        if self.errors.is_empty() {
            Ok(self.out)
        } else {
            Err(self.errors)
        }
    }

    fn g_global(&mut self, decl: &Declaration<Typed>) {
        let symbol = self.symbols.get(decl.symbol);
        let qualifier = D::global_qualifier(symbol.qualifier, symbol.ty);
        let decl = self.declaration(decl);
        self.out(f!("{qualifier}{decl};"));
    }

    fn g_function(&mut self, function: &FunctionDef<Typed>) {
        let ret = self.ty(function.ret, function.span);
        let name = self.function_name(function.id, function.name.name);
        let mut params = Vec::with_capacity(function.params.len());
        for &param in &function.params {
            let symbol = self.symbols.get(param);
            let ty = self.ty(symbol.ty, symbol.span);
            params.push(f!("{ty} {}", self.ident(symbol.name)));
        }
        self.out(f!("{ret} {name}({}) {{", params.join(", ")));
        self.indented(|this| this.g_stmts(&function.body));
        self.out("}");
    }

    fn g_stmts(&mut self, block: &Block<Typed>) {
        for stmt in &block.stmts {
            self.g_stmt(stmt);
        }
    }

    /// Emits the body of a compound statement, which is always braced.
    fn g_body(&mut self, stmt: &Stmt<Typed>) {
        self.indented(|this| match &stmt.kind {
            StmtKind::Block(block) => this.g_stmts(block),
            _ => this.g_stmt(stmt),
        });
    }

    fn g_stmt(&mut self, stmt: &Stmt<Typed>) {
        match &stmt.kind {
            StmtKind::Declaration(_) | StmtKind::Assignment { .. } | StmtKind::Expr(_) => {
                let simple = self.simple(stmt);
                self.out(f!("{simple};"));
            }
            StmtKind::If { .. } => self.g_if(stmt, ""),
            StmtKind::While { condition, body } => {
                if !D::SUPPORTS_WHILE {
                    self.unsupported(stmt.span, "while loops");
                }
                let condition = self.expr(condition);
                self.out(f!("while ({condition}) {{"));
                self.g_body(body);
                self.out("}");
            }
            StmtKind::DoWhile { body, condition } => {
                if !D::SUPPORTS_WHILE {
                    self.unsupported(stmt.span, "do-while loops");
                }
                self.out("do {");
                self.g_body(body);
                let condition = self.expr(condition);
                self.out(f!("}} while ({condition});"));
            }
            StmtKind::For {
                init,
                condition,
                step,
                body,
            } => {
                let init = init.as_ref().map(|s| self.simple(s)).unwrap_or_default();
                let condition = condition.as_ref().map(|e| self.expr(e));
                let condition = condition.map(|c| f!(" {c}")).unwrap_or_default();
                let step = step.as_ref().map(|s| f!(" {}", self.simple(s)));
                let step = step.unwrap_or_default();
                self.out(f!("for ({init};{condition};{step}) {{"));
                self.g_body(body);
                self.out("}");
            }
            StmtKind::Break => self.out("break;"),
            StmtKind::Continue => self.out("continue;"),
            StmtKind::Discard => self.out("discard;"),
            StmtKind::Return(None) => self.out("return;"),
            StmtKind::Return(Some(value)) => {
                let value = self.expr(value);
                self.out(f!("return {value};"));
            }
            StmtKind::Block(block) => {
                self.out("{");
                self.indented(|this| this.g_stmts(block));
                self.out("}");
            }
        }
    }

    /// Emits an `if` statement, folding `else if` chains. `prefix` precedes
    /// the keyword on the first line.
    fn g_if(&mut self, stmt: &Stmt<Typed>, prefix: &str) {
        let StmtKind::If {
            condition,
            then_branch,
            else_branch,
        } = &stmt.kind
        else {
            return self.g_stmt(stmt);
        };
        let condition = self.expr(condition);
        self.out(f!("{prefix}if ({condition}) {{"));
        self.g_body(then_branch);
        match else_branch.as_deref() {
            None => self.out("}"),
            Some(nested) if matches!(nested.kind, StmtKind::If { .. }) => {
                self.g_if(nested, "} else ");
            }
            Some(else_branch) => {
                self.out("} else {");
                self.g_body(else_branch);
                self.out("}");
            }
        }
    }

    /// A statement which may also appear in a `for` header, without its
    /// semicolon.
    fn simple(&mut self, stmt: &Stmt<Typed>) -> String {
        match &stmt.kind {
            StmtKind::Declaration(decl) => {
                let symbol = self.symbols.get(decl.symbol);
                let qualifier = if symbol.qualifier == Qualifier::Const {
                    "const "
                } else {
                    ""
                };
                f!("{qualifier}{}", self.declaration(decl))
            }
            StmtKind::Assignment { target, op, value } => {
                let target_text = self.expr(target);
                let value_text = self.expr(value);
                D::assignment(
                    *op,
                    Operand {
                        ty: target.info,
                        text: &target_text,
                    },
                    Operand {
                        ty: value.info,
                        text: &value_text,
                    },
                )
            }
            StmtKind::Expr(expr) => self.expr(expr),
            _ => unreachable!("not a simple statement: {stmt:?}"),
        }
    }

    /// `type name[len] = initializer`, without qualifiers.
    fn declaration(&mut self, decl: &Declaration<Typed>) -> String {
        let symbol = self.symbols.get(decl.symbol);
        let ty = self.ty(symbol.ty, decl.span);
        let name = self.ident(symbol.name);
        let mut text = f!("{ty} {name}");
        if let Some(len) = symbol.array_len {
            write!(text, "[{len}]").expect("writing to a String can't fail");
        }
        if let Some(initializer) = &decl.initializer {
            let initializer = self.expr(initializer);
            write!(text, " = {initializer}").expect("writing to a String can't fail");
        }
        text
    }

    fn expr(&mut self, expr: &Expr<Typed>) -> String {
        if fold::is_foldable(expr) {
            if let Some(literal) = fold::fold(expr) {
                return literal.to_string();
            }
        }

        match &expr.kind {
            ExprKind::Literal(literal) => literal.to_string(),
            ExprKind::Var(id) => self.var(*id),
            ExprKind::Unary { op, operand } => {
                let operand = self.expr(operand);
                let symbol = op.symbol();
                match op {
                    UnaryOp::PostInc | UnaryOp::PostDec => f!("{operand}{symbol}"),
                    // Keep `- -x` from lexing as a decrement.
                    _ if operand.starts_with(['-', '+']) => f!("{symbol} {operand}"),
                    _ => f!("{symbol}{operand}"),
                }
            }
            ExprKind::Binary { op, lhs, rhs } => {
                if matches!(op, BinaryOp::EqEq | BinaryOp::NotEq) && lhs.info.is_sampler() {
                    self.unsupported(expr.span, "sampler comparison");
                }
                let lhs_text = self.expr(lhs);
                let rhs_text = self.expr(rhs);
                D::binary(
                    *op,
                    Operand {
                        ty: lhs.info,
                        text: &lhs_text,
                    },
                    Operand {
                        ty: rhs.info,
                        text: &rhs_text,
                    },
                )
            }
            ExprKind::Call { name, args, callee } => {
                let name = match callee {
                    Callee::Builtin(builtin) => D::builtin_function(builtin.name).to_owned(),
                    Callee::User(id) => self.function_name(*id, name.name),
                };
                let args = self.exprs(args);
                f!("{name}({args})")
            }
            ExprKind::Constructor { ty, args } => {
                let name = self.ty(*ty, expr.span);
                if let [arg] = args.as_slice() {
                    if arg.info.is_scalar() && ty.is_vector() {
                        let arg = self.expr(arg);
                        return D::splat(name, &arg);
                    }
                }
                let args = self.exprs(args);
                f!("{name}({args})")
            }
            ExprKind::Index { base, index } => {
                let base = self.expr(base);
                let index = self.expr(index);
                f!("{base}[{index}]")
            }
            ExprKind::Swizzle { base, swizzle } => {
                let base = self.expr(base);
                f!("{base}.{swizzle}")
            }
            ExprKind::Conditional {
                condition,
                then_arm,
                else_arm,
            } => {
                let condition = self.expr(condition);
                let then_arm = self.expr(then_arm);
                let else_arm = self.expr(else_arm);
                f!("{condition} ? {then_arm} : {else_arm}")
            }
            ExprKind::Paren(inner) => f!("({})", self.expr(inner)),
            ExprKind::Widen(inner) => {
                let name = self.ty(expr.info, expr.span);
                f!("{name}({})", self.expr(inner))
            }
        }
    }

    fn exprs(&mut self, exprs: &[Expr<Typed>]) -> String {
        let texts: Vec<String> = exprs.iter().map(|e| self.expr(e)).collect();
        texts.join(", ")
    }

    fn var(&mut self, id: SymbolId) -> String {
        let symbol = self.symbols.get(id);
        match builtins::variable(self.symbols.name(symbol.name)) {
            Some(builtin) if symbol.is_builtin() => D::builtin_var(builtin.name).to_owned(),
            _ => self.ident(symbol.name),
        }
    }

    fn function_name(&mut self, id: FunctionId, name: Name) -> String {
        if self.entry == Some(id) {
            D::MAIN.to_owned()
        } else {
            self.ident(name)
        }
    }

    /// Spelling of a user identifier. Names the target can't take become
    /// `jsl<n>_<name>`; user names starting with `jsl` are renamed as well,
    /// so the two never meet.
    fn ident(&mut self, name: Name) -> String {
        let text = self.symbols.name(name);
        let clashes = text.contains('$')
            || text.starts_with("jsl")
            || builtins::function(text).is_some()
            || D::is_reserved(text);
        if !clashes {
            return text.to_owned();
        }

        let next = self.renamed.len();
        self.renamed
            .entry(name)
            .or_insert_with(|| {
                let parts: Vec<&str> = text.split(['$', '_']).filter(|p| !p.is_empty()).collect();
                if parts.is_empty() {
                    f!("jsl{next}")
                } else {
                    f!("jsl{next}_{}", parts.join("_"))
                }
            })
            .clone()
    }
}

/// Utility functions.
impl<D> Generator<'_, D>
where
    D: Dialect,
{
    /// Spelling of `ty`, reporting it if the target lacks it.
    fn ty(&mut self, ty: Type, span: Span) -> &'static str {
        D::type_name(ty).unwrap_or_else(|| {
            self.unsupported(span, ty.name());
            ty.name()
        })
    }

    fn unsupported(&mut self, span: Span, construct: &'static str) {
        let target = D::TARGET;
        tracing::trace!(backend = %target, %span, construct, "unsupported");
        self.errors
            .push(span.wrap(Error::Unsupported { target, construct }));
    }

    /// Prints a line.
    fn out(&mut self, line: impl std::fmt::Display) {
        for _ in 0..self.indent {
            self.out.push_str(INDENT);
        }
        writeln!(self.out, "{line}").expect("writing to a String can't fail");
    }

    /// Prints an empty line.
    fn out_line(&mut self) {
        self.out.push('\n');
    }

    fn indented<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.indent += 1;
        let res = f(self);
        self.indent -= 1;
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        codegen::{dialect::Glsl, dialect::Hlsl},
        parser,
        type_checker::Checker,
    };
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn emit<D: Dialect>(src: &str) -> Result<String, Vec<String>> {
        let mut symbols = SymbolTable::new();
        let program =
            parser::parse_program(src, &mut Vec::new(), &mut symbols, parser::DEFAULT_MAX_DEPTH)
                .unwrap();
        let program = Checker::new(&symbols).check(program).unwrap();
        Generator::<D>::new(&symbols)
            .generate(&program)
            .map_err(|errors| errors.iter().map(|e| format!("{}: {:?}", e.span, e.inner)).collect())
    }

    /// Strips the fixed prologue, keeping what the program contributed.
    fn body<D: Dialect>(src: &str) -> String {
        let out = emit::<D>(src).unwrap();
        out.strip_prefix(D::PROLOGUE).unwrap().to_owned()
    }

    const TINT: &str = "
param sampler img;
param float4 tint;
const float k = 2.0 * 0.5;
float4 scale(float4 c, float f) { return c * f; }
void main() {
    float4 src = sample(img, pos0);
    if (src.a == 0) discard;
    else if (tint.a > 0.5) src.rgb = mix(src.rgb, tint.rgb, k);
    else { src = -src; }
    for (int i = 0; i < 2; i++) src.r += fract(pixcoord.x);
    color = scale(src, 2);
}
";

    #[test]
    fn glsl_output() {
        let expected = indoc! {"

            uniform sampler2D img;
            uniform vec4 tint;
            const float k = 1.0;

            vec4 scale(vec4 c, float f) {
                return c * f;
            }

            void main() {
                vec4 src = texture2D(img, pos0);
                if (src.a == 0.0) {
                    discard;
                } else if (tint.a > 0.5) {
                    src.rgb = mix(src.rgb, tint.rgb, k);
                } else {
                    src = -src;
                }
                for (int i = 0; i < 2; i++) {
                    src.r += fract(gl_FragCoord.xy.x);
                }
                gl_FragColor = scale(src, 2.0);
            }

        "};
        assert_eq!(body::<Glsl>(TINT), expected);
    }

    #[test]
    fn hlsl_output() {
        let out = body::<Hlsl>(TINT);
        let (program, entry) = out.split_once("float4 main(").unwrap();
        let expected = indoc! {"

            sampler2D img;
            float4 tint;
            static const float k = 1.0;

            float4 scale(float4 c, float f) {
                return c * f;
            }

            void jsl_main() {
                float4 src = tex2D(img, pos0);
                if (src.a == 0.0) {
                    discard;
                } else if (tint.a > 0.5) {
                    src.rgb = lerp(src.rgb, tint.rgb, k);
                } else {
                    src = -src;
                }
                for (int i = 0; i < 2; i++) {
                    src.r += frac(pixcoord.x);
                }
                color = scale(src, 2.0);
            }

        "};
        assert_eq!(program, expected);
        assert!(entry.contains("jsl_main();"));
    }

    #[test]
    fn hlsl_operator_mapping() {
        let src = "
param float3x3 m;
void main() {
    float3 v = float3(1.0);
    bool same = v == pos0.xyx;
    bool flip = same ^^ true;
    v = m * v;
    float3x3 n = m;
    n *= m;
    n *= 2.0;
}
";
        let out = body::<Hlsl>(src);
        let main: Vec<&str> = out
            .lines()
            .skip_while(|l| !l.starts_with("void jsl_main"))
            .skip(1)
            .take(7)
            .map(str::trim)
            .collect();
        assert_eq!(
            main,
            [
                "float3 v = ((float3) 1.0);",
                "bool same = all(v == pos0.xyx);",
                "bool flip = (same != true);",
                "v = mul(v, m);",
                "float3x3 n = m;",
                "n = mul(m, n);",
                "n *= 2.0;",
            ]
        );
    }

    #[test]
    fn loops_are_unsupported_in_glsl() {
        let src = "
void main() {
    int i = 0;
    while (i < 4) i++;
    do i--; while (i > 0);
}
";
        assert_eq!(
            emit::<Glsl>(src),
            Err(vec![
                "34..52: Unsupported { target: Glsl, construct: \"while loops\" }".to_owned(),
                "57..79: Unsupported { target: Glsl, construct: \"do-while loops\" }".to_owned(),
            ])
        );
        assert!(emit::<Hlsl>(src).unwrap().contains("} while (i > 0);"));
    }

    #[test]
    fn fsampler_is_unsupported_in_hlsl() {
        let src = "param fsampler data; void main() { color = sample(data, pos0); }";
        assert_eq!(
            emit::<Hlsl>(src),
            Err(vec![
                "0..19: Unsupported { target: Hlsl, construct: \"fsampler\" }".to_owned()
            ])
        );
        assert!(emit::<Glsl>(src).is_ok());
    }

    #[test]
    fn folds_constants_and_spaces_negations() {
        let src = "void main() { bool b = 2 == 2; float x = - -pos0.x; color = float4(x * -3); }";
        let out = body::<Glsl>(src);
        assert!(out.contains("bool b = true;"), "{out}");
        assert!(out.contains("float x = - -pos0.x;"), "{out}");
        assert!(out.contains("gl_FragColor = vec4(x * -3.0);"), "{out}");
    }

    #[test]
    fn identifiers_the_target_reserves_are_renamed() {
        let src = "void main() { float $a = 1.0; float vec4 = $a; color = float4(vec4); }";
        let out = body::<Glsl>(src);
        assert!(out.contains("float jsl0_a = 1.0;"), "{out}");
        assert!(out.contains("float jsl1_vec4 = jsl0_a;"), "{out}");
        assert!(out.contains("gl_FragColor = vec4(jsl1_vec4);"), "{out}");

        let out = body::<Hlsl>(src);
        assert!(out.contains("float vec4 = jsl0_a;"), "{out}");
    }

    #[test]
    fn hlsl_entry_point_keeps_its_name() {
        let src = "float jsl_main() { return 1.0; } void main() { color = float4(jsl_main()); }";
        let out = body::<Hlsl>(src);
        assert!(out.contains("float jsl0_jsl_main() {"), "{out}");
        assert!(out.contains("void jsl_main() {"), "{out}");
        assert!(out.contains("color = ((float4) jsl0_jsl_main());"), "{out}");
    }

    #[test]
    fn hlsl_mod_floors() {
        let src = "void main() { color = float4(mod(-1.0, 3.0)); }";
        let out = emit::<Hlsl>(src).unwrap();
        assert!(out.contains("color = ((float4) jsl_mod(-1.0, 3.0));"), "{out}");
        assert!(out.contains("float jsl_mod(float x, float y) { return x - y * floor(x / y); }"));
        assert!(body::<Glsl>(src).contains("gl_FragColor = vec4(mod(-1.0, 3.0));"));
    }

    #[test]
    fn hlsl_matrices_are_transposed() {
        let src = "
param float2x2 m;
void main() {
    float2x2 n = float2x2(1.0, 2.0, 3.0, 4.0);
    float2 c = n[1];
    color = float4(m * c, c * m);
}
";
        let out = body::<Hlsl>(src);
        assert!(out.contains("row_major float2x2 m;"), "{out}");
        assert!(out.contains("float2x2 n = float2x2(1.0, 2.0, 3.0, 4.0);"), "{out}");
        assert!(out.contains("float2 c = n[1];"), "{out}");
        assert!(out.contains("color = float4(mul(c, m), mul(m, c));"), "{out}");
    }
}
