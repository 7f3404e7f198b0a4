//! Formula evaluation over a worksheet grid.
//!
//! A formula is any text value starting with `=`. Evaluation is recursive and
//! uncached: every read walks the references from scratch, keeping a set of
//! cells on the current chain so that cycles resolve to `#CYCLE` instead of
//! recursing forever. Chains longer than [`MAX_DEPTH`] resolve to `#ERR`.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::errors::FormulaError;
use super::models::{CellGrid, CellValue};
use super::parser::evaluate_arithmetic;
use super::reference::{parse_ref, EMBEDDED_REF_PATTERN};

/// Longest reference chain a single read follows.
pub const MAX_DEPTH: usize = 256;

static CALL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([A-Za-z]+)\s*\((.*)\)\s*$").expect("valid call pattern"));

/// The closed set of aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Sum,
    Average,
    Min,
    Max,
}

impl Aggregate {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "SUM" => Some(Aggregate::Sum),
            "AVERAGE" => Some(Aggregate::Average),
            "MIN" => Some(Aggregate::Min),
            "MAX" => Some(Aggregate::Max),
            _ => None,
        }
    }

    /// Reduces the admitted numbers plus `zeros` further zero entries.
    /// An empty list yields 0 for every function.
    pub fn apply(self, values: &[f64], zeros: u64) -> f64 {
        let count = values.len() as f64 + zeros as f64;
        if count == 0.0 {
            return 0.0;
        }
        let seed = |empty: f64| if zeros > 0 { 0.0 } else { empty };
        match self {
            Aggregate::Sum => values.iter().sum(),
            Aggregate::Average => values.iter().sum::<f64>() / count,
            Aggregate::Min => values.iter().copied().fold(seed(f64::INFINITY), f64::min),
            Aggregate::Max => values.iter().copied().fold(seed(f64::NEG_INFINITY), f64::max),
        }
    }
}

/// Arguments gathered for one aggregate call. Range positions outside the
/// grid are counted in `zeros` rather than visited.
#[derive(Debug, Default)]
struct Admitted {
    values: Vec<f64>,
    zeros: u64,
}

/// Evaluates cells of a grid to their display values.
///
/// # Examples
///
/// ```
/// use wsgrid::domain::{CellValue, FormulaEvaluator, Worksheet};
///
/// let mut sheet = Worksheet::with_grid("budget", "me", 3, 2);
/// let (a, b) = (sheet.columns[0].id, sheet.columns[1].id);
/// for (row, n) in [1.0, 2.0, 3.0].into_iter().enumerate() {
///     sheet.rows[row].set_value(a, CellValue::Number(n));
/// }
/// sheet.rows[0].set_value(b, CellValue::from("=SUM(A1:A3)"));
///
/// let evaluator = FormulaEvaluator::new(&sheet);
/// assert_eq!(evaluator.evaluate(0, 1), CellValue::Number(6.0));
/// ```
pub struct FormulaEvaluator<'a, G: CellGrid + ?Sized> {
    grid: &'a G,
}

impl<'a, G: CellGrid + ?Sized> FormulaEvaluator<'a, G> {
    pub fn new(grid: &'a G) -> Self {
        Self { grid }
    }

    /// Returns the display value of `(row, col)`.
    ///
    /// Literals come back unchanged, formulas come back as a number or as one
    /// of the sentinel strings `#ERR` / `#CYCLE`. Out-of-bounds positions read
    /// as empty.
    pub fn evaluate(&self, row: usize, col: usize) -> CellValue {
        let mut visited = HashSet::new();
        self.eval_cell(row, col, &mut visited).unwrap_or_else(CellValue::from)
    }

    /// Numeric reading of a cell's display value, `None` if not a finite number.
    pub fn evaluate_number(&self, row: usize, col: usize) -> Option<f64> {
        self.evaluate(row, col).as_number()
    }

    fn eval_cell(
        &self,
        row: usize,
        col: usize,
        visited: &mut HashSet<(usize, usize)>,
    ) -> Result<CellValue, FormulaError> {
        if visited.contains(&(row, col)) {
            return Err(FormulaError::Cycle);
        }
        if visited.len() >= MAX_DEPTH {
            return Err(FormulaError::TooDeep);
        }
        visited.insert((row, col));
        let result = self.eval_raw(row, col, visited);
        visited.remove(&(row, col));
        result
    }

    fn eval_raw(
        &self,
        row: usize,
        col: usize,
        visited: &mut HashSet<(usize, usize)>,
    ) -> Result<CellValue, FormulaError> {
        let raw = match self.grid.raw_value(row, col) {
            Some(value) => value,
            None => return Ok(CellValue::Empty),
        };
        let Some(formula) = raw.formula() else {
            return Ok(raw.clone());
        };

        if let Some((aggregate, args)) = match_call(formula) {
            let admitted = self.collect_args(args, visited)?;
            return Ok(CellValue::Number(aggregate.apply(&admitted.values, admitted.zeros)));
        }

        self.eval_arithmetic(formula, visited)
    }

    /// Numeric value of a referenced cell. Empty, text and `#ERR` read as 0.
    /// Cycles and overlong chains propagate.
    fn reference_number(
        &self,
        row: usize,
        col: usize,
        visited: &mut HashSet<(usize, usize)>,
    ) -> Result<f64, FormulaError> {
        match self.eval_cell(row, col, visited) {
            Ok(value) => Ok(value.as_number().unwrap_or(0.0)),
            Err(FormulaError::Invalid) => Ok(0.0),
            Err(err) => Err(err),
        }
    }

    fn collect_args(
        &self,
        args: &str,
        visited: &mut HashSet<(usize, usize)>,
    ) -> Result<Admitted, FormulaError> {
        let mut admitted = Admitted::default();

        for arg in split_top_level(args) {
            let arg = arg.trim();
            if let Some((start, end)) = arg.split_once(':') {
                let (Some(start), Some(end)) = (parse_ref(start.trim()), parse_ref(end.trim())) else {
                    continue;
                };
                let (top, bottom) = (start.0.min(end.0), start.0.max(end.0));
                let (left, right) = (start.1.min(end.1), start.1.max(end.1));
                let span = |low: usize, high: usize| (high - low) as u64 + 1;
                let total = span(top, bottom).saturating_mul(span(left, right));

                let rows = top..bottom.saturating_add(1).min(self.grid.row_count());
                let cols = left..right.saturating_add(1).min(self.grid.col_count());
                let mut visited_cells = 0u64;
                for row in rows {
                    for col in cols.clone() {
                        admitted.values.push(self.reference_number(row, col, visited)?);
                        visited_cells += 1;
                    }
                }
                admitted.zeros = admitted.zeros.saturating_add(total - visited_cells);
            } else if let Some((row, col)) = parse_ref(arg) {
                admitted.values.push(self.reference_number(row, col, visited)?);
            } else if let Some(n) = super::models::parse_finite(arg) {
                admitted.values.push(n);
            }
        }

        Ok(admitted)
    }

    fn eval_arithmetic(
        &self,
        formula: &str,
        visited: &mut HashSet<(usize, usize)>,
    ) -> Result<CellValue, FormulaError> {
        let mut substituted = String::with_capacity(formula.len());
        let mut last = 0;
        for found in EMBEDDED_REF_PATTERN.find_iter(formula) {
            substituted.push_str(&formula[last..found.start()]);
            let number = match parse_ref(found.as_str()) {
                Some((row, col)) => self.reference_number(row, col, visited)?,
                None => 0.0,
            };
            // Parenthesized so a negative value cannot fuse with a preceding operator.
            substituted.push_str(&format!("({number})"));
            last = found.end();
        }
        substituted.push_str(&formula[last..]);

        match evaluate_arithmetic(&substituted) {
            Ok(n) if n.is_finite() => Ok(CellValue::Number(n)),
            _ => Err(FormulaError::Invalid),
        }
    }
}

/// Matches `NAME(args)` where NAME is one of the aggregates and the opening
/// parenthesis closes at the very end of the formula.
fn match_call(formula: &str) -> Option<(Aggregate, &str)> {
    let caps = CALL_PATTERN.captures(formula)?;
    let aggregate = Aggregate::from_name(caps.get(1)?.as_str())?;
    let args = caps.get(2)?.as_str();

    let mut depth = 0i32;
    for ch in args.chars() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return None;
                }
            }
            _ => {}
        }
    }
    (depth == 0).then_some((aggregate, args))
}

/// Splits on commas that are not nested inside parentheses.
fn split_top_level(args: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, ch) in args.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&args[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&args[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Dense test grid addressed by position.
    struct TestGrid {
        cells: Vec<Vec<CellValue>>,
    }

    impl TestGrid {
        fn new(rows: usize, cols: usize) -> Self {
            Self {
                cells: vec![vec![CellValue::Empty; cols]; rows],
            }
        }

        fn set(&mut self, address: &str, value: impl Into<CellValue>) -> &mut Self {
            let (row, col) = parse_ref(address).unwrap();
            self.cells[row][col] = value.into();
            self
        }

        fn eval(&self, address: &str) -> CellValue {
            let (row, col) = parse_ref(address).unwrap();
            FormulaEvaluator::new(self).evaluate(row, col)
        }
    }

    impl CellGrid for TestGrid {
        fn row_count(&self) -> usize {
            self.cells.len()
        }

        fn col_count(&self) -> usize {
            self.cells.first().map_or(0, Vec::len)
        }

        fn raw_value(&self, row: usize, col: usize) -> Option<&CellValue> {
            self.cells.get(row)?.get(col)
        }
    }

    fn num(n: f64) -> CellValue {
        CellValue::Number(n)
    }

    fn text(s: &str) -> CellValue {
        CellValue::from(s)
    }

    #[test]
    fn test_literals_pass_through() {
        let mut grid = TestGrid::new(2, 2);
        grid.set("A1", "hello").set("A2", 42.0);
        assert_eq!(grid.eval("A1"), text("hello"));
        assert_eq!(grid.eval("A2"), num(42.0));
        assert_eq!(grid.eval("B1"), CellValue::Empty);
    }

    #[test]
    fn test_sum_over_range() {
        let mut grid = TestGrid::new(3, 2);
        grid.set("A1", 1.0).set("A2", 2.0).set("A3", 3.0).set("B1", "=SUM(A1:A3)");
        assert_eq!(grid.eval("B1"), num(6.0));
    }

    #[test]
    fn test_average_over_range() {
        let mut grid = TestGrid::new(2, 2);
        grid.set("A1", 2.0).set("A2", 4.0).set("B1", "=AVERAGE(A1:A2)");
        assert_eq!(grid.eval("B1"), num(3.0));
    }

    #[test]
    fn test_min_max_and_mixed_arguments() {
        let mut grid = TestGrid::new(3, 3);
        grid.set("A1", 5.0).set("B1", -2.0).set("C1", "7");
        grid.set("A2", "=MIN(A1:C1)").set("B2", "=max(a1:c1, 10)").set("C2", "=SUM(A1, 2.5, C1)");
        assert_eq!(grid.eval("A2"), num(-2.0));
        assert_eq!(grid.eval("B2"), num(10.0));
        assert_eq!(grid.eval("C2"), num(14.5));
    }

    #[test]
    fn test_reversed_range_is_normalized() {
        let mut grid = TestGrid::new(2, 3);
        grid.set("A1", 1.0).set("B2", 2.0).set("C1", "=SUM(B2:A1)");
        assert_eq!(grid.eval("C1"), num(3.0));
    }

    #[test]
    fn test_aggregates_count_non_numeric_cells_as_zero() {
        let mut grid = TestGrid::new(4, 2);
        grid.set("A1", 4.0).set("A2", "n/a").set("A4", 8.0).set("B1", "=AVERAGE(A1:A4)");
        grid.set("B2", "=MIN(A1:A2)").set("B3", "=SUM(A1, A2, 1e999)");
        assert_eq!(grid.eval("B1"), num(3.0));
        assert_eq!(grid.eval("B2"), num(0.0));
        // Non-finite literals are skipped.
        assert_eq!(grid.eval("B3"), num(4.0));
    }

    #[test]
    fn test_out_of_bounds_range_cells_count_as_zero() {
        let mut grid = TestGrid::new(2, 2);
        grid.set("A1", 2.0).set("A2", 4.0).set("B1", "=AVERAGE(A1:A4)").set("B2", "=MIN(A1:A3)");
        assert_eq!(grid.eval("B1"), num(1.5));
        assert_eq!(grid.eval("B2"), num(0.0));
    }

    #[test]
    fn test_huge_range_is_not_walked_cell_by_cell() {
        let mut grid = TestGrid::new(1, 1);
        grid.set("A1", "=SUM(B2:ZZZ1000000)");
        assert_eq!(grid.eval("A1"), num(0.0));

        let mut grid = TestGrid::new(2, 2);
        grid.set("A1", 6.0).set("A2", "=AVERAGE(A1:C1)").set("B2", "=MAX(A1:ZZZ1)");
        assert_eq!(grid.eval("A2"), num(2.0));
        assert_eq!(grid.eval("B2"), num(6.0));
    }

    #[test]
    fn test_long_reference_chain_is_err_not_overflow() {
        let rows = MAX_DEPTH + 50;
        let mut grid = TestGrid::new(rows, 1);
        for row in 0..rows - 1 {
            grid.cells[row][0] = CellValue::from(format!("=A{}+1", row + 2).as_str());
        }
        grid.cells[rows - 1][0] = num(1.0);

        assert_eq!(grid.eval("A1"), text("#ERR"));
        // 100 links from the bottom stays within reach.
        let start = rows - 101;
        assert_eq!(FormulaEvaluator::new(&grid).evaluate(start, 0), num(101.0));
    }

    #[test]
    fn test_empty_aggregate_yields_zero() {
        let mut grid = TestGrid::new(2, 2);
        grid.set("B1", "=AVERAGE(A1:A2)").set("B2", "=MAX()");
        assert_eq!(grid.eval("B1"), num(0.0));
        assert_eq!(grid.eval("B2"), num(0.0));
    }

    #[test]
    fn test_nested_formulas_resolve_recursively() {
        let mut grid = TestGrid::new(3, 2);
        grid.set("A1", 2.0).set("A2", "=A1*3").set("A3", "=SUM(A1:A2)").set("B1", "=A3/2");
        assert_eq!(grid.eval("A3"), num(8.0));
        assert_eq!(grid.eval("B1"), num(4.0));
    }

    #[test]
    fn test_self_reference_is_cycle() {
        let mut grid = TestGrid::new(1, 1);
        grid.set("A1", "=A1");
        assert_eq!(grid.eval("A1"), text("#CYCLE"));
    }

    #[test]
    fn test_mutual_reference_is_cycle() {
        let mut grid = TestGrid::new(1, 2);
        grid.set("A1", "=B1").set("B1", "=A1");
        assert_eq!(grid.eval("A1"), text("#CYCLE"));
        assert_eq!(grid.eval("B1"), text("#CYCLE"));
    }

    #[test]
    fn test_cycle_inside_arithmetic_and_ranges() {
        let mut grid = TestGrid::new(3, 1);
        grid.set("A1", "=A2+1").set("A2", "=SUM(A1:A3)");
        assert_eq!(grid.eval("A1"), text("#CYCLE"));
        assert_eq!(grid.eval("A2"), text("#CYCLE"));
    }

    #[test]
    fn test_diamond_reference_is_not_a_cycle() {
        let mut grid = TestGrid::new(2, 2);
        grid.set("A1", 5.0).set("B1", "=A1*2").set("A2", "=A1+B1").set("B2", "=A2+A1+B1");
        assert_eq!(grid.eval("A2"), num(15.0));
        assert_eq!(grid.eval("B2"), num(30.0));
    }

    #[test]
    fn test_malformed_arithmetic_is_err() {
        let mut grid = TestGrid::new(1, 3);
        grid.set("A1", "=2+*").set("B1", "=").set("C1", "=1/0");
        assert_eq!(grid.eval("A1"), text("#ERR"));
        assert_eq!(grid.eval("B1"), text("#ERR"));
        assert_eq!(grid.eval("C1"), text("#ERR"));
    }

    #[test]
    fn test_arithmetic_substitutes_references() {
        let mut grid = TestGrid::new(2, 2);
        grid.set("A1", -3.0).set("B1", "text").set("A2", "=10-A1").set("B2", "=A1*B1+4");
        assert_eq!(grid.eval("A2"), num(13.0));
        assert_eq!(grid.eval("B2"), num(4.0));
    }

    #[test]
    fn test_out_of_bounds_reference_reads_as_zero() {
        let mut grid = TestGrid::new(1, 1);
        grid.set("A1", "=ZZ999+1");
        assert_eq!(grid.eval("A1"), num(1.0));
    }

    #[test]
    fn test_bare_reference_is_numeric() {
        let mut grid = TestGrid::new(2, 3);
        grid.set("A1", "label").set("B1", "=A1").set("C1", "=B1");
        grid.set("A2", 2.5).set("B2", "=A2").set("C2", "=C1");
        assert_eq!(grid.eval("B1"), num(0.0));
        assert_eq!(grid.eval("C1"), num(0.0));
        assert_eq!(grid.eval("B2"), num(2.5));
        assert_eq!(grid.eval("C2"), num(0.0));
    }

    #[test]
    fn test_err_in_referenced_cell_reads_as_zero_in_arithmetic() {
        let mut grid = TestGrid::new(1, 2);
        grid.set("A1", "=2+*").set("B1", "=A1+1");
        assert_eq!(grid.eval("B1"), num(1.0));
    }

    #[test]
    fn test_unsupported_function_falls_through_to_arithmetic() {
        let mut grid = TestGrid::new(1, 4);
        grid.set("A1", "=NOW()").set("B1", "=SUM(1)+SUM(2)").set("C1", "=ABS(4)").set("D1", "=FOO(1,2)");
        assert_eq!(grid.eval("A1"), text("#ERR"));
        assert_eq!(grid.eval("B1"), num(3.0));
        assert_eq!(grid.eval("C1"), num(4.0));
        // Letters and commas are stripped, leaving "(12)".
        assert_eq!(grid.eval("D1"), num(12.0));
    }

    #[test]
    fn test_sanitizer_blocks_injected_syntax() {
        let mut grid = TestGrid::new(1, 1);
        grid.set("A1", "=process.exit(1)");
        assert_eq!(grid.eval("A1"), text("#ERR"));
    }

    #[test]
    fn test_split_top_level() {
        assert_eq!(split_top_level("A1, (1,2), B2"), vec!["A1", " (1,2)", " B2"]);
        assert_eq!(split_top_level(""), vec![""]);
    }

    #[test]
    fn test_match_call_requires_balanced_tail() {
        assert_eq!(match_call(" sum( A1:A3 ) "), Some((Aggregate::Sum, " A1:A3 ")));
        assert_eq!(match_call("SUM(1)+SUM(2)"), None);
        assert_eq!(match_call("MEDIAN(1)"), None);
    }
}
