//! Arithmetic and statistics tools.
//!
//! The decimal tools (`Add`, `Subtract`, `Multiply`, `Divide`, `Sqrt`) take and
//! return numbers as strings so that callers can pass values wider than an
//! `f64` without losing precision. The rest work on JSON integers and floats.

use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use tool_core::{FunctionTool, Param, ToolArgs, ToolError, Toolkit};

pub const TOOLKIT_NAME: &str = "Math";

fn decimal_arg(args: &ToolArgs, key: &str) -> Result<BigDecimal, ToolError> {
    let raw = args.get_string(key)?;
    BigDecimal::from_str(raw.trim())
        .map_err(|_| ToolError::invalid_parameter(key, format!("'{}' is not a valid number", raw)))
}

fn overflow(op: &str) -> ToolError {
    ToolError::execution(format!("Result of {} is too large to represent", op))
}

/// Render without exponent notation.
pub fn plain(value: &BigDecimal) -> String {
    let (_, scale) = value.as_bigint_and_exponent();
    if scale < 0 {
        value.with_scale(0).to_string()
    } else {
        value.to_string()
    }
}

/// Drop trailing fractional zeros left by division and roots.
fn trimmed(value: BigDecimal) -> BigDecimal {
    let normalized = value.normalized();
    let (_, scale) = normalized.as_bigint_and_exponent();
    if scale < 0 {
        normalized.with_scale(0)
    } else {
        normalized
    }
}

pub fn add(a: BigDecimal, b: BigDecimal) -> Result<BigDecimal, ToolError> {
    Ok(a + b)
}

pub fn subtract(a: BigDecimal, b: BigDecimal) -> Result<BigDecimal, ToolError> {
    Ok(a - b)
}

pub fn multiply(a: BigDecimal, b: BigDecimal) -> Result<BigDecimal, ToolError> {
    Ok(a * b)
}

pub fn divide(a: BigDecimal, b: BigDecimal) -> Result<BigDecimal, ToolError> {
    if b.is_zero() {
        return Err(ToolError::execution("Cannot divide by zero"));
    }
    Ok(trimmed(a / b))
}

pub fn sqrt(a: BigDecimal) -> Result<BigDecimal, ToolError> {
    if a < BigDecimal::zero() {
        return Err(ToolError::execution(
            "Cannot take the square root of a negative number",
        ));
    }
    a.sqrt().map(trimmed).ok_or_else(|| overflow("square root"))
}

fn finite(value: f64, op: &str) -> Result<f64, ToolError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(overflow(op))
    }
}

/// Sum of every integer from `start` through `end`, inclusive.
pub fn sum_range(start: i64, end: i64) -> Result<i64, ToolError> {
    if end < start {
        return Ok(0);
    }
    let (start, end) = (start as i128, end as i128);
    let total = (start + end) * (end - start + 1) / 2;
    i64::try_from(total).map_err(|_| overflow("sum_range"))
}

/// Remainder with the sign of the divisor.
pub fn modulo(a: i64, b: i64) -> Result<i64, ToolError> {
    if b == 0 {
        return Err(ToolError::execution("Cannot take the modulus with a divisor of zero"));
    }
    let r = a.checked_rem(b).ok_or_else(|| overflow("modulus"))?;
    if r != 0 && (r < 0) != (b < 0) {
        Ok(r + b)
    } else {
        Ok(r)
    }
}

pub fn power(base: i64, exponent: i64) -> Result<i64, ToolError> {
    if exponent < 0 {
        return Err(ToolError::execution(
            "Exponent must be non-negative for integer powers",
        ));
    }
    let exponent = u32::try_from(exponent).map_err(|_| overflow("power"))?;
    base.checked_pow(exponent).ok_or_else(|| overflow("power"))
}

pub fn log(a: f64, base: f64) -> Result<f64, ToolError> {
    if a <= 0.0 || base <= 0.0 || base == 1.0 {
        return Err(ToolError::execution(
            "Logarithm is only defined for a positive number and a positive base other than 1",
        ));
    }
    Ok(a.ln() / base.ln())
}

pub fn avg(numbers: &[f64]) -> f64 {
    if numbers.is_empty() {
        return 0.0;
    }
    numbers.iter().sum::<f64>() / numbers.len() as f64
}

pub fn median(numbers: &[f64]) -> f64 {
    if numbers.is_empty() {
        return 0.0;
    }
    let mut sorted = numbers.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

pub fn factorial(n: i64) -> Result<i64, ToolError> {
    if n < 0 {
        return Err(ToolError::execution(
            "Factorial is only defined for non-negative integers",
        ));
    }
    (1..=n).try_fold(1i64, |acc, k| acc.checked_mul(k).ok_or_else(|| overflow("factorial")))
}

fn to_integer(value: f64, op: &str) -> Result<i64, ToolError> {
    if !value.is_finite() || value < i64::MIN as f64 || value > i64::MAX as f64 {
        return Err(overflow(op));
    }
    Ok(value as i64)
}

/// Round half to even at `ndigits` decimal places; negative `ndigits` rounds to tens, hundreds…
pub fn round_num(value: f64, ndigits: i64) -> Result<f64, ToolError> {
    let ndigits = i32::try_from(ndigits.clamp(-308, 308)).unwrap_or_default();
    let factor = 10f64.powi(ndigits);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return Ok(value);
    }
    Ok(scaled.round_ties_even() / factor)
}

pub fn gcd(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.unsigned_abs(), b.unsigned_abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    i64::try_from(a).unwrap_or(i64::MAX)
}

pub fn lcm(a: i64, b: i64) -> Result<i64, ToolError> {
    if a == 0 || b == 0 {
        return Ok(0);
    }
    let divisor = gcd(a, b);
    (a / divisor)
        .checked_mul(b)
        .and_then(i64::checked_abs)
        .ok_or_else(|| overflow("lcm"))
}

fn decimal_pair(
    name: &str,
    description: &str,
    returns: &str,
    op: fn(BigDecimal, BigDecimal) -> Result<BigDecimal, ToolError>,
) -> FunctionTool {
    FunctionTool::builder(name)
        .description(description)
        .param(Param::of::<String>("a", "The first number as a string"))
        .param(Param::of::<String>("b", "The second number as a string"))
        .returns::<String>(returns)
        .blocking_handler(move |_ctx, args| {
            let a = decimal_arg(&args, "a")?;
            let b = decimal_arg(&args, "b")?;
            Ok(plain(&op(a, b)?))
        })
}

fn int_pair(
    name: &str,
    description: &str,
    params: (&str, &str),
    returns: &str,
    op: fn(i64, i64) -> Result<i64, ToolError>,
) -> FunctionTool {
    FunctionTool::builder(name)
        .description(description)
        .param(Param::of::<i64>("a", params.0))
        .param(Param::of::<i64>("b", params.1))
        .returns::<i64>(returns)
        .blocking_handler(move |_ctx, args| op(args.get_i64("a")?, args.get_i64("b")?))
}

fn float_unary(
    name: &str,
    description: &str,
    param: (&str, &str),
    returns: &str,
    op: fn(f64) -> f64,
) -> FunctionTool {
    let key = param.0.to_string();
    let op_name = name.to_string();
    FunctionTool::builder(name)
        .description(description)
        .param(Param::of::<f64>(param.0, param.1))
        .returns::<f64>(returns)
        .blocking_handler(move |_ctx, args| finite(op(args.get_f64(&key)?), &op_name))
}

fn float_list(name: &str, description: &str, returns: &str, op: fn(&[f64]) -> f64) -> FunctionTool {
    let op_name = name.to_string();
    FunctionTool::builder(name)
        .description(description)
        .param(Param::of::<Vec<f64>>("numbers", "The list of numbers"))
        .returns::<f64>(returns)
        .blocking_handler(move |_ctx, args| {
            let numbers: Vec<f64> = args.get("numbers")?;
            finite(op(&numbers), &op_name)
        })
}

fn rounding(name: &str, description: &str, returns: &str, op: fn(f64) -> f64) -> FunctionTool {
    let op_name = name.to_string();
    FunctionTool::builder(name)
        .description(description)
        .param(Param::of::<f64>("a", "The number to round"))
        .returns::<i64>(returns)
        .blocking_handler(move |_ctx, args| to_integer(op(args.get_f64("a")?), &op_name))
}

/// The `Math` toolkit.
pub fn toolkit() -> Toolkit {
    Toolkit::new(TOOLKIT_NAME, env!("CARGO_PKG_VERSION"))
        .description("Arbitrary precision arithmetic and basic statistics.")
        .tool(decimal_pair(
            "Add",
            "Add two numbers together",
            "The sum of the two numbers as a string",
            add,
        ))
        .tool(decimal_pair(
            "Subtract",
            "Subtract two numbers",
            "The difference of the two numbers as a string",
            subtract,
        ))
        .tool(decimal_pair(
            "Multiply",
            "Multiply two numbers together",
            "The product of the two numbers as a string",
            multiply,
        ))
        .tool(decimal_pair(
            "Divide",
            "Divide two numbers",
            "The quotient of the two numbers as a string",
            divide,
        ))
        .tool(
            FunctionTool::builder("Sqrt")
                .description("Get the square root of a number")
                .param(Param::of::<String>("a", "The number to square root as a string"))
                .returns::<String>("The square root of the number as a string")
                .blocking_handler(|_ctx, args| Ok(plain(&sqrt(decimal_arg(&args, "a")?)?))),
        )
        .tool(float_list(
            "SumList",
            "Sum all numbers in a list",
            "The sum of the numbers in the list",
            |numbers| numbers.iter().sum(),
        ))
        .tool(
            FunctionTool::builder("SumRange")
                .description("Sum all numbers from start through end")
                .param(Param::of::<i64>("start", "The start of the range to sum"))
                .param(Param::of::<i64>("end", "The end of the range to sum"))
                .returns::<i64>("The sum of the numbers in the range")
                .blocking_handler(|_ctx, args| sum_range(args.get_i64("start")?, args.get_i64("end")?)),
        )
        .tool(int_pair(
            "Mod",
            "Calculate the remainder (modulus) of one number divided by another.",
            ("The dividend", "The divisor"),
            "The remainder after dividing a by b",
            modulo,
        ))
        .tool(int_pair(
            "Power",
            "Calculate one number raised to the power of another.",
            ("The base number", "The exponent"),
            "The result of raising a to the power of b",
            power,
        ))
        .tool(
            FunctionTool::builder("AbsVal")
                .description("Calculate the absolute value of a number.")
                .param(Param::of::<i64>("a", "The number"))
                .returns::<i64>("The absolute value of the number")
                .blocking_handler(|_ctx, args| {
                    args.get_i64("a")?
                        .checked_abs()
                        .ok_or_else(|| overflow("absolute value"))
                }),
        )
        .tool(
            FunctionTool::builder("Log")
                .description("Calculate the logarithm of a number with a given base.")
                .param(Param::of::<f64>("a", "The number to take the logarithm of"))
                .param(Param::of::<f64>("base", "The logarithmic base"))
                .returns::<f64>("The logarithm of the number with the specified base")
                .blocking_handler(|_ctx, args| log(args.get_f64("a")?, args.get_f64("base")?)),
        )
        .tool(float_list(
            "Avg",
            "Calculate the average (mean) of a list of numbers. Returns 0.0 if the list is empty.",
            "The average (mean) of the numbers in the list",
            avg,
        ))
        .tool(float_list(
            "Median",
            "Calculate the median of a list of numbers. If the list is empty, returns 0.0.",
            "The median value of the numbers in the list",
            median,
        ))
        .tool(
            FunctionTool::builder("Factorial")
                .description("Compute the factorial of a non-negative integer. Returns 1 for 0.")
                .param(Param::of::<i64>(
                    "a",
                    "The non-negative integer to compute the factorial for",
                ))
                .returns::<i64>("The factorial of the number")
                .blocking_handler(|_ctx, args| factorial(args.get_i64("a")?)),
        )
        .tool(float_unary(
            "DegToRad",
            "Convert an angle from degrees to radians.",
            ("degrees", "Angle in degrees"),
            "Angle in radians",
            f64::to_radians,
        ))
        .tool(float_unary(
            "RadToDeg",
            "Convert an angle from radians to degrees.",
            ("radians", "Angle in radians"),
            "Angle in degrees",
            f64::to_degrees,
        ))
        .tool(rounding(
            "Ceil",
            "Return the ceiling of a number.",
            "The smallest integer greater than or equal to the number",
            f64::ceil,
        ))
        .tool(rounding(
            "Floor",
            "Return the floor of a number.",
            "The largest integer less than or equal to the number",
            f64::floor,
        ))
        .tool(
            FunctionTool::builder("RoundNum")
                .description("Round a number to a specified number of digits.")
                .param(Param::of::<f64>("value", "The number to round"))
                .param(Param::of::<i64>(
                    "ndigits",
                    "The number of digits after the decimal point",
                ))
                .returns::<f64>("The number rounded to the specified number of digits")
                .blocking_handler(|_ctx, args| {
                    round_num(args.get_f64("value")?, args.get_i64("ndigits")?)
                }),
        )
        .tool(int_pair(
            "Gcd",
            "Calculate the greatest common divisor (GCD) of two integers.",
            ("First integer", "Second integer"),
            "The greatest common divisor of a and b",
            |a, b| Ok(gcd(a, b)),
        ))
        .tool(int_pair(
            "Lcm",
            "Calculate the least common multiple (LCM) of two integers. Returns 0 if either integer is 0.",
            ("First integer", "Second integer"),
            "The least common multiple of a and b",
            lcm,
        ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn test_decimal_ops_keep_precision() {
        assert_eq!(plain(&add(dec("0.1"), dec("0.2")).unwrap()), "0.3");
        assert_eq!(
            plain(&multiply(dec("12345678901234567.5"), dec("2")).unwrap()),
            "24691357802469135.0"
        );
        assert_eq!(plain(&subtract(dec("1.5"), dec("2")).unwrap()), "-0.5");
        assert_eq!(plain(&divide(dec("10"), dec("4")).unwrap()), "2.5");
        assert_eq!(plain(&divide(dec("10"), dec("2")).unwrap()), "5");
    }

    #[test]
    fn test_decimal_ops_beyond_28_digits() {
        assert_eq!(
            plain(&add(dec("1e30"), dec("1")).unwrap()),
            "1000000000000000000000000000001"
        );
        assert_eq!(
            plain(&multiply(dec("12345678901234567.5"), dec("12345678901234567.5")).unwrap()),
            "152415787532388357872275656912056.25"
        );
        assert_eq!(plain(&dec("1e3")), "1000");
    }

    #[test]
    fn test_non_finite_float_results_are_errors() {
        assert_eq!(finite(2.5, "Avg").unwrap(), 2.5);
        let err = finite(f64::INFINITY, "SumList").unwrap_err();
        assert_eq!(err.to_string(), "Result of SumList is too large to represent");
        assert!(finite(f64::NAN, "RadToDeg").is_err());
    }

    #[test]
    fn test_divide_by_zero() {
        let err = divide(dec("1"), dec("0")).unwrap_err();
        assert_eq!(err.to_string(), "Cannot divide by zero");
    }

    #[test]
    fn test_sqrt() {
        assert_eq!(plain(&sqrt(dec("16")).unwrap()), "4");
        assert_eq!(plain(&sqrt(dec("0")).unwrap()), "0");
        assert!(plain(&sqrt(dec("2")).unwrap()).starts_with("1.41421356237309504880168872420969807"));
        assert!(sqrt(dec("-4")).is_err());
    }

    #[test]
    fn test_modulo_follows_divisor_sign() {
        assert_eq!(modulo(7, 3).unwrap(), 1);
        assert_eq!(modulo(-7, 3).unwrap(), 2);
        assert_eq!(modulo(7, -3).unwrap(), -2);
        assert!(modulo(7, 0).is_err());
    }

    #[test]
    fn test_integer_ops() {
        assert_eq!(sum_range(1, 100).unwrap(), 5050);
        assert_eq!(sum_range(5, 1).unwrap(), 0);
        assert_eq!(power(2, 10).unwrap(), 1024);
        assert!(power(2, -1).is_err());
        assert!(power(10, 40).is_err());
        assert_eq!(factorial(0).unwrap(), 1);
        assert_eq!(factorial(5).unwrap(), 120);
        assert!(factorial(-1).is_err());
        assert!(factorial(21).is_err());
    }

    #[test]
    fn test_gcd_lcm() {
        assert_eq!(gcd(12, 18), 6);
        assert_eq!(gcd(-12, 18), 6);
        assert_eq!(gcd(0, 0), 0);
        assert_eq!(lcm(4, 6).unwrap(), 12);
        assert_eq!(lcm(-4, 6).unwrap(), 12);
        assert_eq!(lcm(0, 6).unwrap(), 0);
    }

    #[test]
    fn test_statistics() {
        assert_eq!(avg(&[]), 0.0);
        assert_eq!(avg(&[1.0, 2.0, 3.0, 4.0]), 2.5);
        assert_eq!(median(&[]), 0.0);
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn test_log_and_rounding() {
        assert!((log(8.0, 2.0).unwrap() - 3.0).abs() < 1e-12);
        assert!(log(0.0, 10.0).is_err());
        assert!(log(10.0, 1.0).is_err());
        assert_eq!(round_num(2.5, 0).unwrap(), 2.0);
        assert_eq!(round_num(3.14159, 2).unwrap(), 3.14);
        assert_eq!(round_num(1234.0, -2).unwrap(), 1200.0);
        assert_eq!(to_integer(f64::ceil(1.2), "ceil").unwrap(), 2);
        assert!(to_integer(f64::INFINITY, "ceil").is_err());
    }

    #[test]
    fn test_toolkit_contents() {
        let kit = toolkit();
        assert_eq!(kit.tools.len(), 21);
        assert!(kit.tool_names().contains(&"SumRange"));
    }
}
