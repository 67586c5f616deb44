/// a module turns a String expression into a symbolic expression
///
///# Example
/// ```
/// use RustedNewton::symbolic::parse_expr::{ExprParser, LogNames};
/// let parser = ExprParser::new(LogNames::sympy_like()).unwrap();
/// let parsed_expression = parser.parse("2x^2 + log(x)", "x").unwrap();
/// println!(" parsed_expression {}", parsed_expression);
/// ```
/// ________________________________________________________________________________________________________________________________
pub mod parse_expr;
///____________________________________________________________________________________________________________________________
/// # Symbolic engine
/// a module
/// 1) holds the expression tree
/// 2) differentiates it with respect to the variable
/// 3) turns it into a string expression for printing and control results
///# Example#
/// ```
/// use RustedNewton::symbolic::symbolic_engine::Expr;
/// use RustedNewton::symbolic::symbolic_functions::FunctionRegistry;
/// let registry = FunctionRegistry::default();
/// let parsed_expression = Expr::parse_expression("exp(x) + ln(x)", "x").unwrap();
/// let df_dx = parsed_expression.diff_simplified("x", &registry).unwrap();
/// println!("f = {}, df_dx = {}", parsed_expression, df_dx);
/// // convert the symbolic expression to a Rust function and evaluate it
/// let f = parsed_expression.lambdify("x", &registry).unwrap();
/// println!("f(1) = {}", f.eval(1.0));
/// ```
pub mod symbolic_engine;
pub mod symbolic_engine_derivatives;
/// registry of named functions: numeric rules and derivative rules
pub mod symbolic_functions;
/// symbolic expression to complex valued closure
pub mod symbolic_lambdify;
pub mod symbolic_simplify;
