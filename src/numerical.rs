///  Example#1
/// ```
/// //use the shortest way to find a root: a formula, a variable and an initial guess
/// use RustedNewton::numerical::NR_api::RootFindingTask;
/// use RustedNewton::numerical::NR::NoReplacement;
/// let mut task = RootFindingTask::new("x^2 - 2", "x");
/// let outcome = task.solve(1.0, &mut NoReplacement).unwrap();
/// println!("result = {:?} \n", outcome);
/// ```
/// Example#2
/// ```
/// // or more verbose way: parse, differentiate and compile yourself, then iterate
/// use RustedNewton::numerical::NR::{NewtonSolver, FixedGuesses};
/// use RustedNewton::numerical::NR_config::SolverConfig;
/// use RustedNewton::symbolic::symbolic_engine::Expr;
/// use RustedNewton::symbolic::symbolic_functions::FunctionRegistry;
/// let registry = FunctionRegistry::default();
/// let f = Expr::parse_expression("x^3 - 2x", "x").unwrap();
/// let df = f.diff_simplified("x", &registry).unwrap();
/// let f_fn = f.lambdify("x", &registry).unwrap();
/// let df_fn = df.lambdify("x", &registry).unwrap();
/// let config = SolverConfig::new(1e-10, 50, 1e-12).unwrap();
/// let mut solver = NewtonSolver::new(config);
/// // a replacement guess is used if the derivative vanishes
/// let outcome = solver.main_loop(&f_fn, &df_fn, 3.0, &mut FixedGuesses::new(vec![2.0]));
/// println!("result = {:?}, statistics = {:?} \n", outcome, solver.statistics());
/// ```
pub mod NR;
/// text formula to outcome: parsing, differentiation, compilation and iteration in one task
pub mod NR_api;
/// solver configuration, validated, optionally read from TOML
pub mod NR_config;
