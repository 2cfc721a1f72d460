//! Numeric [`SymbolicEvaluator`] backed by the expression parser.
//!
//! Linear equations are solved exactly from four probes. Anything else is
//! scanned over a fixed grid and refined by bisection, so only real roots
//! with a sign change (or landing on a grid point) are found.

use std::collections::HashMap;
use tracing::debug;

use super::evaluator::{parse, Expr};
use super::{format_number, EvalError, EvaluationOutcome, SolveOutcome, SymbolicEvaluator};
use crate::config::MathConfig;

/// Half-width of the root scan interval
const SCAN_LIMIT: f64 = 100.0;

/// Grid step of the root scan
const SCAN_STEP: f64 = 0.25;

/// Points used to detect a linear residual
const LINEAR_PROBES: [f64; 4] = [0.0, 1.0, 2.5, -3.7];

/// Evaluator configured with precision and convergence settings
#[derive(Debug, Clone)]
pub struct MathProcessor {
    precision: usize,
    max_iterations: u32,
    tolerance: f64,
}

impl MathProcessor {
    pub fn new(config: &MathConfig) -> Self {
        Self {
            precision: config.decimal_precision,
            max_iterations: config.max_iterations,
            tolerance: config.tolerance,
        }
    }

    /// Exact root when `f` is affine on the probes, `Some(vec![])` when constant.
    fn linear_roots(&self, f: &dyn Fn(f64) -> f64) -> Option<Vec<f64>> {
        let samples: Vec<f64> = LINEAR_PROBES.iter().map(|&x| f(x)).collect();
        if samples.iter().any(|y| !y.is_finite()) {
            return None;
        }

        let intercept = samples[0];
        let slope = samples[1] - samples[0];
        let scale = samples.iter().fold(1.0_f64, |acc, y| acc.max(y.abs()));

        let affine = LINEAR_PROBES
            .iter()
            .zip(&samples)
            .all(|(&x, &y)| (intercept + slope * x - y).abs() <= self.tolerance * scale);
        if !affine {
            return None;
        }

        if slope.abs() <= self.tolerance * scale {
            return Some(vec![]);
        }
        Some(vec![-intercept / slope])
    }

    fn scan_roots(&self, f: &dyn Fn(f64) -> f64) -> Result<Vec<f64>, EvalError> {
        let steps = (2.0 * SCAN_LIMIT / SCAN_STEP) as usize;
        let mut roots = Vec::new();

        let mut a = -SCAN_LIMIT;
        let mut fa = f(a);
        for step in 1..=steps {
            let b = -SCAN_LIMIT + step as f64 * SCAN_STEP;
            let fb = f(b);

            if fa.is_finite() {
                if fa.abs() <= self.tolerance {
                    roots.push(a);
                } else if fb.is_finite()
                    && fb.abs() > self.tolerance
                    && fa.signum() != fb.signum()
                {
                    if let Some(root) = self.bisect(f, a, b, fa)? {
                        roots.push(root);
                    }
                }
            }

            a = b;
            fa = fb;
        }
        if fa.is_finite() && fa.abs() <= self.tolerance {
            roots.push(a);
        }

        Ok(roots)
    }

    /// Refine a bracketed sign change. Poles also change sign, so a root is
    /// only accepted when the residual is small.
    fn bisect(
        &self,
        f: &dyn Fn(f64) -> f64,
        mut a: f64,
        mut b: f64,
        mut fa: f64,
    ) -> Result<Option<f64>, EvalError> {
        for _ in 0..self.max_iterations {
            let mid = 0.5 * (a + b);
            let fm = f(mid);
            if !fm.is_finite() {
                return Ok(None);
            }

            if fm.abs() <= self.tolerance || 0.5 * (b - a) <= self.tolerance {
                return Ok((fm.abs() <= self.tolerance.sqrt()).then_some(mid));
            }

            if fa.signum() == fm.signum() {
                a = mid;
                fa = fm;
            } else {
                b = mid;
            }
        }

        Err(EvalError::NoConvergence(self.max_iterations))
    }

    fn format_roots(&self, roots: Vec<f64>) -> Vec<String> {
        let mut formatted: Vec<String> = Vec::with_capacity(roots.len());
        for root in roots {
            let text = format_number(root, self.precision);
            if !formatted.contains(&text) {
                formatted.push(text);
            }
        }
        formatted
    }
}

fn residual(lhs: &Expr, rhs: &Expr, unknown: &str, x: f64) -> f64 {
    let bindings = HashMap::from([(unknown.to_string(), x)]);
    match (lhs.eval(&bindings), rhs.eval(&bindings)) {
        (Ok(left), Ok(right)) => left - right,
        _ => f64::NAN,
    }
}

impl SymbolicEvaluator for MathProcessor {
    fn evaluate(&self, expression: &str) -> Result<EvaluationOutcome, EvalError> {
        let expr = parse(expression)?;
        if !expr.variables().is_empty() {
            return Ok(EvaluationOutcome::Symbolic(expr.to_string()));
        }

        let value = expr.eval(&HashMap::new())?;
        if value.is_nan() {
            return Err(EvalError::NonFinite);
        }
        Ok(EvaluationOutcome::Value(format_number(value, self.precision)))
    }

    fn solve(&self, equation: &str) -> Result<SolveOutcome, EvalError> {
        let (left, right) = equation.split_once('=').ok_or(EvalError::MissingEquals)?;
        // Accept "==" as well
        let right = right.trim_start_matches('=');

        let lhs = parse(left)?;
        let rhs = parse(right)?;

        let mut unknowns = lhs.variables();
        unknowns.extend(rhs.variables());
        let mut names = unknowns.into_iter();
        let unknown = match (names.next(), names.next()) {
            (None, _) => {
                return Ok(SolveOutcome {
                    unknown: None,
                    solutions: vec![],
                })
            }
            (Some(name), None) => name,
            (Some(first), Some(second)) => {
                let all: Vec<String> = [first, second].into_iter().chain(names).collect();
                return Err(EvalError::TooManyUnknowns(all.join(", ")));
            }
        };

        let f = |x: f64| residual(&lhs, &rhs, &unknown, x);
        let roots = match self.linear_roots(&f) {
            Some(roots) => roots,
            None => self.scan_roots(&f)?,
        };

        let solutions = self.format_roots(roots);
        debug!("Solved {} for {}: {:?}", equation, unknown, solutions);

        Ok(SolveOutcome {
            unknown: Some(unknown),
            solutions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processor() -> MathProcessor {
        MathProcessor::new(&MathConfig::default())
    }

    fn solutions(equation: &str) -> Vec<String> {
        processor().solve(equation).unwrap().solutions
    }

    #[test]
    fn test_solve_linear() {
        let outcome = processor().solve("2*x + 5 = 13").unwrap();
        assert_eq!(outcome.unknown.as_deref(), Some("x"));
        assert_eq!(outcome.solutions, vec!["4".to_string()]);

        assert_eq!(solutions("3*y = 1"), vec!["0.3333".to_string()]);
        assert_eq!(solutions("x == 7"), vec!["7".to_string()]);
    }

    #[test]
    fn test_solve_nonlinear() {
        assert_eq!(solutions("x**2 = 4"), vec!["-2".to_string(), "2".to_string()]);
        assert_eq!(
            solutions("x**2 = 2"),
            vec!["-1.4142".to_string(), "1.4142".to_string()]
        );
        assert!(solutions("x**2 = -1").is_empty());
    }

    #[test]
    fn test_poles_are_not_roots() {
        assert!(solutions("1/x = 0").is_empty());
        assert_eq!(solutions("1/x = 2"), vec!["0.5".to_string()]);
    }

    #[test]
    fn test_solve_errors() {
        assert_eq!(processor().solve("2 + 2"), Err(EvalError::MissingEquals));
        assert_eq!(
            processor().solve("x + y = 1"),
            Err(EvalError::TooManyUnknowns("x, y".to_string()))
        );

        let constant = processor().solve("4 = 4").unwrap();
        assert_eq!(constant.unknown, None);
        assert!(constant.solutions.is_empty());
    }

    #[test]
    fn test_iteration_limit() {
        let config = MathConfig {
            max_iterations: 1,
            ..MathConfig::default()
        };
        let result = MathProcessor::new(&config).solve("x**2 = 2");
        assert_eq!(result, Err(EvalError::NoConvergence(1)));
    }

    #[test]
    fn test_evaluate() {
        let processor = processor();
        assert_eq!(
            processor.evaluate("2 + 3*4"),
            Ok(EvaluationOutcome::Value("14".to_string()))
        );
        assert_eq!(
            processor.evaluate("sqrt(2)"),
            Ok(EvaluationOutcome::Value("1.4142".to_string()))
        );
        assert_eq!(
            processor.evaluate("x**2 + 1"),
            Ok(EvaluationOutcome::Symbolic("x**2 + 1".to_string()))
        );
        assert_eq!(processor.evaluate("sqrt(-1)"), Err(EvalError::NonFinite));
    }

    #[test]
    fn test_precision_setting() {
        let config = MathConfig {
            decimal_precision: 2,
            ..MathConfig::default()
        };
        assert_eq!(
            MathProcessor::new(&config).evaluate("sqrt(2)"),
            Ok(EvaluationOutcome::Value("1.41".to_string()))
        );
    }
}
