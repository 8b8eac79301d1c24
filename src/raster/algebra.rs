//! Pixel-wise raster algebra.
//!
//! Operations come in three families plus logical negation:
//!
//! * [`ArithmeticOp`]: the result keeps the pixel type of the left raster.
//! * [`LogicalOp`]: comparisons, boolean combinations and maximum/minimum;
//!   the result is always a [`PixelType::Byte`] raster.
//! * [`UnaryOp`]: rounding and transcendental functions; pixel type preserved.
//!
//! Real cells are evaluated in `f64` and converted back with
//! [`Pixel::from_f64`], so integer results are truncated toward zero,
//! saturated at the type bounds, and non-finite results become 0. Boolean
//! operators treat zero as false and anything else as true.

use std::fmt::{Display, Formatter};
use std::ops::{Add, BitAnd, BitOr, Div, Mul, Not, Sub};

use ndarray::{Array2, Zip};
use num_complex::Complex32;

use crate::errors::{RasterError, Result};
use crate::raster::{for_each_band, BandArray, Pixel, PixelType, RasterDataset};

/// Arithmetic operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl ArithmeticOp {
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            ArithmeticOp::Add => a + b,
            ArithmeticOp::Subtract => a - b,
            ArithmeticOp::Multiply => a * b,
            ArithmeticOp::Divide => a / b,
        }
    }

    fn apply_complex(self, a: Complex32, b: Complex32) -> Complex32 {
        match self {
            ArithmeticOp::Add => a + b,
            ArithmeticOp::Subtract => a - b,
            ArithmeticOp::Multiply => a * b,
            ArithmeticOp::Divide => a / b,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ArithmeticOp::Add => "Add",
            ArithmeticOp::Subtract => "Subtract",
            ArithmeticOp::Multiply => "Multiply",
            ArithmeticOp::Divide => "Divide",
        }
    }
}

/// Comparison and logical operators producing 0/1 cells, plus maximum and
/// minimum whose values are saturated into a byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    And,
    Or,
    Maximum,
    Minimum,
}

impl LogicalOp {
    pub fn apply(self, a: f64, b: f64) -> u8 {
        let truth = |v: bool| u8::from(v);
        match self {
            LogicalOp::Equal => truth(a == b),
            LogicalOp::NotEqual => truth(a != b),
            LogicalOp::Less => truth(a < b),
            LogicalOp::LessOrEqual => truth(a <= b),
            LogicalOp::Greater => truth(a > b),
            LogicalOp::GreaterOrEqual => truth(a >= b),
            LogicalOp::And => truth(a != 0.0 && b != 0.0),
            LogicalOp::Or => truth(a != 0.0 || b != 0.0),
            // NaN propagates and then maps to 0.
            LogicalOp::Maximum | LogicalOp::Minimum if a.is_nan() || b.is_nan() => 0,
            LogicalOp::Maximum => u8::from_f64(a.max(b)),
            LogicalOp::Minimum => u8::from_f64(a.min(b)),
        }
    }

    /// Complex cells only support (in)equality and the boolean operators.
    fn apply_complex(self, a: Complex32, b: Complex32) -> Option<u8> {
        let zero = Complex32::new(0.0, 0.0);
        let truth = match self {
            LogicalOp::Equal => a == b,
            LogicalOp::NotEqual => a != b,
            LogicalOp::And => a != zero && b != zero,
            LogicalOp::Or => a != zero || b != zero,
            _ => return None,
        };
        Some(u8::from(truth))
    }

    pub fn name(&self) -> &'static str {
        match self {
            LogicalOp::Equal => "Equal",
            LogicalOp::NotEqual => "NotEqual",
            LogicalOp::Less => "Less",
            LogicalOp::LessOrEqual => "LessOrEqual",
            LogicalOp::Greater => "Greater",
            LogicalOp::GreaterOrEqual => "GreaterOrEqual",
            LogicalOp::And => "And",
            LogicalOp::Or => "Or",
            LogicalOp::Maximum => "Maximum",
            LogicalOp::Minimum => "Minimum",
        }
    }
}

/// Single-operand functions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UnaryOp {
    /// Round half to even to `decimals` decimal places; negative values round
    /// to tens, hundreds, ...
    Round { decimals: i32 },
    /// Round half to even to the nearest integer.
    RoundInteger,
    /// Round toward zero.
    Fix,
    Floor,
    Ceil,
    Truncate,
    NaturalLog,
    Log10,
    Exp,
    Square,
    SquareRoot,
    Absolute,
    Power { exponent: f64 },
}

impl UnaryOp {
    pub fn apply(self, v: f64) -> f64 {
        match self {
            UnaryOp::Round { decimals } => round_to_decimals(v, decimals),
            UnaryOp::RoundInteger => v.round_ties_even(),
            UnaryOp::Fix | UnaryOp::Truncate => v.trunc(),
            UnaryOp::Floor => v.floor(),
            UnaryOp::Ceil => v.ceil(),
            UnaryOp::NaturalLog => v.ln(),
            UnaryOp::Log10 => v.log10(),
            UnaryOp::Exp => v.exp(),
            UnaryOp::Square => v * v,
            UnaryOp::SquareRoot => v.sqrt(),
            UnaryOp::Absolute => v.abs(),
            UnaryOp::Power { exponent } => v.powf(exponent),
        }
    }

    /// Rounding has no meaning for complex cells; the absolute value is
    /// stored as a complex number with zero imaginary part.
    fn apply_complex(self, z: Complex32) -> Option<Complex32> {
        let result = match self {
            UnaryOp::NaturalLog => z.ln(),
            UnaryOp::Log10 => z.log(10.0),
            UnaryOp::Exp => z.exp(),
            UnaryOp::Square => z * z,
            UnaryOp::SquareRoot => z.sqrt(),
            UnaryOp::Absolute => Complex32::new(z.norm(), 0.0),
            UnaryOp::Power { exponent } => z.powf(exponent as f32),
            _ => return None,
        };
        Some(result)
    }

    pub fn name(&self) -> &'static str {
        match self {
            UnaryOp::Round { .. } => "Round",
            UnaryOp::RoundInteger => "RoundInteger",
            UnaryOp::Fix => "Fix",
            UnaryOp::Floor => "Floor",
            UnaryOp::Ceil => "Ceil",
            UnaryOp::Truncate => "Truncate",
            UnaryOp::NaturalLog => "NaturalLog",
            UnaryOp::Log10 => "Log10",
            UnaryOp::Exp => "Exp",
            UnaryOp::Square => "Square",
            UnaryOp::SquareRoot => "SquareRoot",
            UnaryOp::Absolute => "Absolute",
            UnaryOp::Power { .. } => "Power",
        }
    }
}

fn round_to_decimals(v: f64, decimals: i32) -> f64 {
    if decimals >= 0 {
        // Beyond 22 decimals the scale factor is no longer exact and every
        // f64 is already rounded.
        if decimals > 22 {
            return v;
        }
        let factor = 10f64.powi(decimals);
        (v * factor).round_ties_even() / factor
    } else {
        let factor = 10f64.powi(decimals.saturating_neg());
        if factor.is_infinite() {
            return 0.0 * v.signum();
        }
        (v / factor).round_ties_even() * factor
    }
}

/// Any raster algebra operation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Operation {
    Arithmetic(ArithmeticOp),
    Logical(LogicalOp),
    /// Logical negation, 1 where the cell is zero.
    Not,
    Unary(UnaryOp),
}

impl Operation {
    /// Map a legacy numeric operator code.
    ///
    /// | codes     | operations                                              |
    /// |-----------|---------------------------------------------------------|
    /// | 1-4       | add, subtract, multiply, divide                         |
    /// | 100-105   | round, round integer, fix, floor, ceil, truncate        |
    /// | 201-209   | and, or, not, <, <=, ==, !=, >, >=                      |
    /// | 300-307   | ln, log10, exp, square, sqrt, abs, maximum, minimum     |
    /// | 309       | power                                                   |
    ///
    /// `argument` carries the decimals of round (100) and the exponent of
    /// power (309) and is ignored by every other code.
    pub fn from_code(code: u16, argument: Option<f64>) -> Result<Operation> {
        let required = |name: &str| {
            argument.filter(|a| a.is_finite()).ok_or_else(|| {
                RasterError::InvalidOperand(format!("operator code {code} ({name}) needs a finite argument"))
            })
        };
        let operation = match code {
            1 => Operation::Arithmetic(ArithmeticOp::Add),
            2 => Operation::Arithmetic(ArithmeticOp::Subtract),
            3 => Operation::Arithmetic(ArithmeticOp::Multiply),
            4 => Operation::Arithmetic(ArithmeticOp::Divide),
            100 => {
                let decimals = required("round")?;
                if decimals.fract() != 0.0 || decimals.abs() > i32::MAX as f64 {
                    return Err(RasterError::InvalidOperand(format!(
                        "round needs an integral number of decimals, got {decimals}"
                    )));
                }
                Operation::Unary(UnaryOp::Round {
                    decimals: decimals as i32,
                })
            }
            101 => Operation::Unary(UnaryOp::RoundInteger),
            102 => Operation::Unary(UnaryOp::Fix),
            103 => Operation::Unary(UnaryOp::Floor),
            104 => Operation::Unary(UnaryOp::Ceil),
            105 => Operation::Unary(UnaryOp::Truncate),
            201 => Operation::Logical(LogicalOp::And),
            202 => Operation::Logical(LogicalOp::Or),
            203 => Operation::Not,
            204 => Operation::Logical(LogicalOp::Less),
            205 => Operation::Logical(LogicalOp::LessOrEqual),
            206 => Operation::Logical(LogicalOp::Equal),
            207 => Operation::Logical(LogicalOp::NotEqual),
            208 => Operation::Logical(LogicalOp::Greater),
            209 => Operation::Logical(LogicalOp::GreaterOrEqual),
            300 => Operation::Unary(UnaryOp::NaturalLog),
            301 => Operation::Unary(UnaryOp::Log10),
            302 => Operation::Unary(UnaryOp::Exp),
            303 => Operation::Unary(UnaryOp::Square),
            304 => Operation::Unary(UnaryOp::SquareRoot),
            305 => Operation::Unary(UnaryOp::Absolute),
            306 => Operation::Logical(LogicalOp::Maximum),
            307 => Operation::Logical(LogicalOp::Minimum),
            309 => Operation::Unary(UnaryOp::Power {
                exponent: required("power")?,
            }),
            _ => {
                return Err(RasterError::unsupported(
                    format!("code {code}"),
                    "no operation is registered for this code",
                ))
            }
        };
        Ok(operation)
    }

    /// `true` for operations that take no second operand.
    pub fn is_unary(&self) -> bool {
        matches!(self, Operation::Not | Operation::Unary(_))
    }

    /// `true` when swapping two raster operands leaves the result unchanged.
    pub fn is_commutative(&self) -> bool {
        match self {
            Operation::Arithmetic(op) => matches!(op, ArithmeticOp::Add | ArithmeticOp::Multiply),
            Operation::Logical(op) => matches!(
                op,
                LogicalOp::Equal
                    | LogicalOp::NotEqual
                    | LogicalOp::And
                    | LogicalOp::Or
                    | LogicalOp::Maximum
                    | LogicalOp::Minimum
            ),
            Operation::Not | Operation::Unary(_) => false,
        }
    }

    /// Pixel type of the result for an input of `input`.
    pub fn output_pixel_type(&self, input: PixelType) -> PixelType {
        match self {
            Operation::Logical(_) | Operation::Not => PixelType::Byte,
            Operation::Arithmetic(_) | Operation::Unary(_) => input,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Arithmetic(op) => op.name(),
            Operation::Logical(op) => op.name(),
            Operation::Not => "Not",
            Operation::Unary(op) => op.name(),
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Unary(UnaryOp::Round { decimals }) => write!(f, "Round({decimals})"),
            Operation::Unary(UnaryOp::Power { exponent }) => write!(f, "Power({exponent})"),
            other => f.write_str(other.name()),
        }
    }
}

impl From<ArithmeticOp> for Operation {
    fn from(op: ArithmeticOp) -> Self {
        Operation::Arithmetic(op)
    }
}

impl From<LogicalOp> for Operation {
    fn from(op: LogicalOp) -> Self {
        Operation::Logical(op)
    }
}

impl From<UnaryOp> for Operation {
    fn from(op: UnaryOp) -> Self {
        Operation::Unary(op)
    }
}

/// Second operand of a binary operation.
#[derive(Clone, Copy, Debug)]
pub enum Operand<'a> {
    Raster(&'a RasterDataset),
    Scalar(f64),
}

impl From<f64> for Operand<'_> {
    fn from(value: f64) -> Self {
        Operand::Scalar(value)
    }
}

impl<'a> From<&'a RasterDataset> for Operand<'a> {
    fn from(raster: &'a RasterDataset) -> Self {
        Operand::Raster(raster)
    }
}

/// Position of the raster in the caller's expression.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OperandOrder {
    /// `raster op operand`
    #[default]
    Forward,
    /// `operand op raster`, e.g. `5 - raster`.
    Reversed,
}

/// Right-hand side of a real-valued binary evaluation.
enum RealRhs {
    Array(Array2<f64>),
    Scalar(f64),
}

enum ComplexRhs {
    Array(Array2<Complex32>),
    Scalar(Complex32),
}

fn zip_real<T: Pixel, O>(a: &Array2<T>, rhs: &RealRhs, f: impl Fn(f64, f64) -> O) -> Array2<O> {
    match rhs {
        RealRhs::Scalar(s) => a.mapv(|v| f(v.to_f64(), *s)),
        RealRhs::Array(b) => Zip::from(a)
            .and(b)
            .map_collect(|v, w| f(v.to_f64(), *w)),
    }
}

fn zip_complex<O>(
    a: &Array2<Complex32>,
    rhs: &ComplexRhs,
    f: impl Fn(Complex32, Complex32) -> O,
) -> Array2<O> {
    match rhs {
        ComplexRhs::Scalar(s) => a.mapv(|v| f(v, *s)),
        ComplexRhs::Array(b) => Zip::from(a).and(b).map_collect(|v, w| f(*v, *w)),
    }
}

fn arithmetic_real<T: Pixel>(
    a: &Array2<T>,
    rhs: &RealRhs,
    f: impl Fn(f64, f64) -> f64,
) -> BandArray {
    zip_real(a, rhs, |x, y| T::from_f64(f(x, y))).into()
}

fn unary_real<T: Pixel>(a: &Array2<T>, op: UnaryOp) -> BandArray {
    a.mapv(|v| T::from_f64(op.apply(v.to_f64()))).into()
}

/// Evaluate `operation` on one band. `rhs` is `None` for unary operations.
fn evaluate_band(
    operation: Operation,
    left: &BandArray,
    rhs: Option<Rhs<'_>>,
    order: OperandOrder,
) -> Result<BandArray> {
    let swap = order == OperandOrder::Reversed;
    match (operation, rhs) {
        (Operation::Unary(op), None) => {
            if left.pixel_type().is_complex() && op.apply_complex(Complex32::new(1.0, 0.0)).is_none() {
                return Err(RasterError::unsupported(
                    operation,
                    "not defined for complex cells",
                ));
            }
            Ok(for_each_band!(
                left,
                a => unary_real(a, op),
                c => BandArray::Complex64(c.mapv(|z| op.apply_complex(z).unwrap_or_default()))
            ))
        }
        (Operation::Not, None) => Ok(BandArray::Byte(for_each_band!(
            left,
            a => a.mapv(|v| u8::from(v.to_f64() == 0.0)),
            c => c.mapv(|z| u8::from(z.re == 0.0 && z.im == 0.0))
        ))),
        (Operation::Arithmetic(op), Some(rhs)) => {
            let f = |x, y| if swap { op.apply(y, x) } else { op.apply(x, y) };
            let fc = |x, y| {
                if swap {
                    op.apply_complex(y, x)
                } else {
                    op.apply_complex(x, y)
                }
            };
            Ok(for_each_band!(
                left,
                a => arithmetic_real(a, &rhs.to_real()?, f),
                c => BandArray::Complex64(zip_complex(c, &rhs.to_complex(), fc))
            ))
        }
        (Operation::Logical(op), Some(rhs)) => {
            if left.pixel_type().is_complex()
                && op.apply_complex(Complex32::default(), Complex32::default()).is_none()
            {
                return Err(RasterError::unsupported(
                    operation,
                    "complex cells have no ordering",
                ));
            }
            let f = |x, y| if swap { op.apply(y, x) } else { op.apply(x, y) };
            let fc = |x, y| {
                let (x, y) = if swap { (y, x) } else { (x, y) };
                op.apply_complex(x, y).unwrap_or_default()
            };
            Ok(BandArray::Byte(for_each_band!(
                left,
                a => zip_real(a, &rhs.to_real()?, f),
                c => zip_complex(c, &rhs.to_complex(), fc)
            )))
        }
        (op, Some(_)) => Err(RasterError::InvalidOperand(format!(
            "{op} takes no second operand"
        ))),
        (op, None) => Err(RasterError::InvalidOperand(format!(
            "{op} needs a raster or scalar operand"
        ))),
    }
}

/// One band or scalar of the second operand.
#[derive(Clone, Copy)]
enum Rhs<'a> {
    Band(&'a BandArray),
    Scalar(f64),
}

impl Rhs<'_> {
    fn to_real(self) -> Result<RealRhs> {
        match self {
            Rhs::Band(band) => Ok(RealRhs::Array(band.to_f64_array()?)),
            Rhs::Scalar(s) => Ok(RealRhs::Scalar(s)),
        }
    }

    fn to_complex(self) -> ComplexRhs {
        match self {
            Rhs::Band(band) => ComplexRhs::Array(band.to_complex_array()),
            Rhs::Scalar(s) => ComplexRhs::Scalar(Complex32::new(s as f32, 0.0)),
        }
    }
}

impl RasterDataset {
    /// Apply `operation` pixel-wise and return a new raster.
    ///
    /// Unary operations take `None`; binary operations take a raster with
    /// the same band count and band shape as `self`, or a scalar. The result
    /// carries `self`'s metadata; see [`Operation::output_pixel_type`] for its
    /// pixel type. The mask is carried over unchanged when a no-data value is
    /// set, and is not recomputed.
    ///
    /// ```rust
    /// use ndarray::array;
    /// use spa_raster::raster::{ArithmeticOp, Operand, Operation};
    /// use spa_raster::{GeoTransform, RasterDataset};
    ///
    /// let raster = RasterDataset::from_bands(
    ///     vec![array![[1.0f32, 2.0], [3.0, 4.0]].into()],
    ///     GeoTransform::default(),
    /// )
    /// .unwrap();
    /// let sum = raster
    ///     .math(Operation::Arithmetic(ArithmeticOp::Add), Some(Operand::Scalar(10.0)))
    ///     .unwrap();
    /// assert_eq!(sum.band(0).unwrap().get_f64(1, 1), Some(14.0));
    /// ```
    pub fn math(&self, operation: Operation, operand: Option<Operand<'_>>) -> Result<RasterDataset> {
        self.math_ordered(operation, operand, OperandOrder::Forward)
    }

    /// Like [`RasterDataset::math`], with `self` in the position given by
    /// `order`. `Reversed` with a scalar computes `scalar op self`, so
    /// subtracting a raster from 5 yields `5 - cell`; with a raster it
    /// evaluates `operand op self` and the result follows `operand`.
    pub fn math_ordered(
        &self,
        operation: Operation,
        operand: Option<Operand<'_>>,
        order: OperandOrder,
    ) -> Result<RasterDataset> {
        if let (OperandOrder::Reversed, Some(Operand::Raster(other))) = (order, operand) {
            return other.math_ordered(operation, Some(Operand::Raster(self)), OperandOrder::Forward);
        }
        if operation.is_unary() != operand.is_none() {
            return Err(RasterError::InvalidOperand(format!(
                "{operation} {} an operand",
                if operation.is_unary() { "does not take" } else { "needs" }
            )));
        }
        let bands = self.bands().map_err(|_| RasterError::UninitializedData {
            method_name: "math",
        })?;

        let new_bands = match operand {
            None => bands
                .iter()
                .map(|band| evaluate_band(operation, band, None, order))
                .collect::<Result<Vec<_>>>()?,
            Some(Operand::Scalar(s)) => {
                if s.is_nan() {
                    return Err(RasterError::InvalidOperand(format!(
                        "{operation} with a NaN scalar"
                    )));
                }
                bands
                    .iter()
                    .map(|band| evaluate_band(operation, band, Some(Rhs::Scalar(s)), order))
                    .collect::<Result<Vec<_>>>()?
            }
            Some(Operand::Raster(other)) => {
                let other_bands = other.bands().map_err(|_| RasterError::UninitializedData {
                    method_name: "math",
                })?;
                let shapes_match = bands.len() == other_bands.len()
                    && bands
                        .iter()
                        .zip(other_bands)
                        .all(|(a, b)| a.shape() == b.shape());
                if !shapes_match {
                    return Err(RasterError::ShapeMismatch {
                        left: self.shape(),
                        right: other.shape(),
                    });
                }
                bands
                    .iter()
                    .zip(other_bands)
                    .map(|(band, rhs)| evaluate_band(operation, band, Some(Rhs::Band(rhs)), order))
                    .collect::<Result<Vec<_>>>()?
            }
        };

        let mut output = self.properties_only();
        if self.no_data_value().is_some() {
            output.set_mask(self.mask().cloned())?;
        }
        output.set_bands(new_bands)?;
        log::debug!(
            "{operation}: {} band(s) of {}x{} {:?} -> {:?}",
            self.num_bands(),
            self.width_in_pixels(),
            self.height_in_pixels(),
            self.pixel_type(),
            output.pixel_type()
        );
        Ok(output)
    }
}

macro_rules! impl_binary_operator {
    ($trait:ident, $method:ident, $operation:expr) => {
        impl $trait<&RasterDataset> for &RasterDataset {
            type Output = Result<RasterDataset>;

            fn $method(self, rhs: &RasterDataset) -> Self::Output {
                self.math($operation, Some(Operand::Raster(rhs)))
            }
        }

        impl $trait<f64> for &RasterDataset {
            type Output = Result<RasterDataset>;

            fn $method(self, rhs: f64) -> Self::Output {
                self.math($operation, Some(Operand::Scalar(rhs)))
            }
        }

        impl $trait<&RasterDataset> for f64 {
            type Output = Result<RasterDataset>;

            fn $method(self, rhs: &RasterDataset) -> Self::Output {
                rhs.math_ordered($operation, Some(Operand::Scalar(self)), OperandOrder::Reversed)
            }
        }
    };
}

impl_binary_operator!(Add, add, Operation::Arithmetic(ArithmeticOp::Add));
impl_binary_operator!(Sub, sub, Operation::Arithmetic(ArithmeticOp::Subtract));
impl_binary_operator!(Mul, mul, Operation::Arithmetic(ArithmeticOp::Multiply));
impl_binary_operator!(Div, div, Operation::Arithmetic(ArithmeticOp::Divide));
impl_binary_operator!(BitAnd, bitand, Operation::Logical(LogicalOp::And));
impl_binary_operator!(BitOr, bitor, Operation::Logical(LogicalOp::Or));

impl Not for &RasterDataset {
    type Output = Result<RasterDataset>;

    fn not(self) -> Self::Output {
        self.math(Operation::Not, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_near;
    use crate::GeoTransform;
    use ndarray::array;

    fn raster(band: BandArray) -> RasterDataset {
        RasterDataset::from_bands(vec![band], GeoTransform::default()).unwrap()
    }

    #[test]
    fn operator_codes() {
        assert_eq!(
            Operation::from_code(2, None).unwrap(),
            Operation::Arithmetic(ArithmeticOp::Subtract)
        );
        assert_eq!(Operation::from_code(203, None).unwrap(), Operation::Not);
        assert_eq!(
            Operation::from_code(301, None).unwrap(),
            Operation::Unary(UnaryOp::Log10)
        );
        assert_eq!(
            Operation::from_code(306, Some(3.0)).unwrap(),
            Operation::Logical(LogicalOp::Maximum)
        );
        assert_eq!(
            Operation::from_code(100, Some(2.0)).unwrap(),
            Operation::Unary(UnaryOp::Round { decimals: 2 })
        );
        assert_eq!(
            Operation::from_code(309, Some(0.5)).unwrap(),
            Operation::Unary(UnaryOp::Power { exponent: 0.5 })
        );
        assert!(matches!(
            Operation::from_code(100, Some(1.5)),
            Err(RasterError::InvalidOperand(_))
        ));
        assert!(matches!(
            Operation::from_code(309, None),
            Err(RasterError::InvalidOperand(_))
        ));
        for code in [0, 5, 99, 106, 200, 210, 308, 310] {
            assert!(
                matches!(
                    Operation::from_code(code, Some(1.0)),
                    Err(RasterError::UnsupportedOperation { .. })
                ),
                "code {code}"
            );
        }
    }

    #[test]
    fn rounding_is_half_to_even() {
        let op = UnaryOp::Round { decimals: 0 };
        assert_eq!(op.apply(2.5), 2.0);
        assert_eq!(op.apply(3.5), 4.0);
        assert_eq!(op.apply(-0.5), -0.0);
        assert_near!(UnaryOp::Round { decimals: 2 }.apply(1.23456), 1.23, epsilon = 1e-12);
        assert_eq!(UnaryOp::Round { decimals: -1 }.apply(1234.0), 1230.0);
        assert_eq!(UnaryOp::Round { decimals: -2 }.apply(1250.0), 1200.0);
        assert_eq!(UnaryOp::Round { decimals: 40 }.apply(0.1), 0.1);
        assert_eq!(UnaryOp::RoundInteger.apply(-2.5), -2.0);
        assert_eq!(UnaryOp::Fix.apply(-2.7), -2.0);
        assert_eq!(UnaryOp::Floor.apply(-2.2), -3.0);
        assert_eq!(UnaryOp::Ceil.apply(-2.7), -2.0);
    }

    #[test]
    fn integer_results_keep_type() {
        let a = raster(array![[200u8, 10], [0, 255]].into());
        let sum = (&a + 100.0).unwrap();
        assert_eq!(sum.pixel_type(), Some(PixelType::Byte));
        assert_eq!(sum.band(0).unwrap().as_array::<u8>().unwrap(), &array![[255u8, 110], [100, 255]]);

        let half = (&a / 3.0).unwrap();
        assert_eq!(half.band(0).unwrap().as_array::<u8>().unwrap(), &array![[66u8, 3], [0, 85]]);

        // 0 / 0 is NaN and stored as 0.
        let ratio = (&a / &a).unwrap();
        assert_eq!(ratio.band(0).unwrap().as_array::<u8>().unwrap(), &array![[1u8, 1], [0, 1]]);

        let root = a.math(UnaryOp::SquareRoot.into(), None).unwrap();
        assert_eq!(root.band(0).unwrap().as_array::<u8>().unwrap(), &array![[14u8, 3], [0, 15]]);
    }

    #[test]
    fn reversed_scalar_operations() {
        let a = raster(array![[1.0f64, 4.0]].into());
        let diff = (10.0 - &a).unwrap();
        assert_eq!(diff.band(0).unwrap().as_array::<f64>().unwrap(), &array![[9.0, 6.0]]);
        let quotient = (8.0 / &a).unwrap();
        assert_eq!(quotient.band(0).unwrap().as_array::<f64>().unwrap(), &array![[8.0, 2.0]]);

        // 2 < A
        let less = a
            .math_ordered(LogicalOp::Less.into(), Some(2.0.into()), OperandOrder::Reversed)
            .unwrap();
        assert_eq!(less.band(0).unwrap().as_array::<u8>().unwrap(), &array![[0u8, 1]]);
    }

    #[test]
    fn maximum_and_minimum_are_bytes() {
        let a = raster(array![[-5.0f32, 300.0, 7.9]].into());
        let b = raster(array![[-7.0f32, 2.0, 1.0]].into());
        let max = a.math(LogicalOp::Maximum.into(), Some((&b).into())).unwrap();
        assert_eq!(max.pixel_type(), Some(PixelType::Byte));
        assert_eq!(max.band(0).unwrap().as_array::<u8>().unwrap(), &array![[0u8, 255, 7]]);
        let min = a.math(LogicalOp::Minimum.into(), Some(3.0.into())).unwrap();
        assert_eq!(min.band(0).unwrap().as_array::<u8>().unwrap(), &array![[0u8, 3, 3]]);
    }

    #[test]
    fn boolean_operators_use_non_zero() {
        let a = raster(array![[0i16, 2, -3, 0]].into());
        let b = raster(array![[0i16, 0, 5, 7]].into());
        let and = (&a & &b).unwrap();
        let or = (&a | &b).unwrap();
        let not = (!&a).unwrap();
        assert_eq!(and.band(0).unwrap().as_array::<u8>().unwrap(), &array![[0u8, 0, 1, 0]]);
        assert_eq!(or.band(0).unwrap().as_array::<u8>().unwrap(), &array![[0u8, 1, 1, 1]]);
        assert_eq!(not.band(0).unwrap().as_array::<u8>().unwrap(), &array![[1u8, 0, 0, 1]]);
    }

    #[test]
    fn arity_is_checked() {
        let a = raster(array![[1.0f32]].into());
        assert!(matches!(
            a.math(Operation::Not, Some(1.0.into())),
            Err(RasterError::InvalidOperand(_))
        ));
        assert!(matches!(
            a.math(ArithmeticOp::Add.into(), None),
            Err(RasterError::InvalidOperand(_))
        ));
        assert!(matches!(
            a.math(ArithmeticOp::Add.into(), Some(f64::NAN.into())),
            Err(RasterError::InvalidOperand(_))
        ));
    }

    #[test]
    fn complex_cells() {
        let z = raster(array![[Complex32::new(3.0, 4.0), Complex32::new(0.0, 0.0)]].into());
        let doubled = (&z * 2.0).unwrap();
        assert_eq!(
            doubled.band(0).unwrap().as_complex().unwrap()[(0, 0)],
            Complex32::new(6.0, 8.0)
        );
        let abs = z.math(UnaryOp::Absolute.into(), None).unwrap();
        assert_eq!(abs.band(0).unwrap().as_complex().unwrap()[(0, 0)], Complex32::new(5.0, 0.0));
        let eq = z.math(LogicalOp::NotEqual.into(), Some(0.0.into())).unwrap();
        assert_eq!(eq.band(0).unwrap().as_array::<u8>().unwrap(), &array![[1u8, 0]]);

        assert!(matches!(
            z.math(LogicalOp::Greater.into(), Some(0.0.into())),
            Err(RasterError::UnsupportedOperation { .. })
        ));
        assert!(matches!(
            z.math(UnaryOp::Floor.into(), None),
            Err(RasterError::UnsupportedOperation { .. })
        ));

        // A complex right operand has no real value to combine with a real raster.
        let real = raster(array![[1.0f32, 2.0]].into());
        assert!(matches!(
            &real + &z,
            Err(RasterError::InvalidOperand(_))
        ));
    }

    #[test]
    fn mask_is_carried_not_recomputed() {
        let mut a = raster(array![[-1.0f32, 1.0]].into());
        a.set_no_data_value(Some(-1.0));
        a.recompute_mask().unwrap();
        let shifted = (&a + 1.0).unwrap();
        assert_eq!(shifted.mask(), Some(&array![[true, false]]));
        assert_eq!(shifted.no_data_value(), Some(-1.0));
        assert_eq!(shifted.band(0).unwrap().get_f64(0, 0), Some(0.0));
    }
}
