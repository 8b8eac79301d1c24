//! One-line raster functions.
//!
//! Binary functions take rasters or scalars in either position:
//!
//! ```rust
//! use ndarray::array;
//! use spa_raster::raster::BandArray;
//! use spa_raster::{math, GeoTransform, RasterDataset};
//!
//! let band: BandArray = array![[1.0f32, 2.0], [3.0, 4.0]].into();
//! let raster = RasterDataset::from_bands(vec![band], GeoTransform::default()).unwrap();
//!
//! let shifted = math::subtract(10.0, &raster).unwrap();
//! assert_eq!(shifted.band(0).unwrap().get_f64(1, 1), Some(6.0));
//!
//! let high = math::greater_than(&shifted, 7.5).unwrap();
//! assert_eq!(high.band(0).unwrap().as_array::<u8>().unwrap(), &array![[1u8, 1], [0, 0]]);
//! ```
//!
//! At least one operand of a binary function must be a raster.

use crate::errors::{RasterError, Result};
use crate::geo_transform::Bounds;
use crate::raster::{
    self, ArithmeticOp, LogicalOp, Operand, OperandOrder, Operation, RasterDataset, ScaleOptions,
    UnaryOp,
};

fn binary<'a>(
    operation: Operation,
    left: impl Into<Operand<'a>>,
    right: impl Into<Operand<'a>>,
) -> Result<RasterDataset> {
    match (left.into(), right.into()) {
        (Operand::Raster(raster), right) => raster.math(operation, Some(right)),
        (left @ Operand::Scalar(_), Operand::Raster(raster)) => {
            raster.math_ordered(operation, Some(left), OperandOrder::Reversed)
        }
        (Operand::Scalar(left), Operand::Scalar(right)) => Err(RasterError::InvalidOperand(
            format!("{operation} of scalars {left} and {right} has no raster operand"),
        )),
    }
}

fn unary(input: &RasterDataset, op: UnaryOp) -> Result<RasterDataset> {
    input.math(Operation::Unary(op), None)
}

macro_rules! binary_functions {
    ($($(#[$doc:meta])* $name:ident => $operation:expr;)+) => {
        $(
            $(#[$doc])*
            pub fn $name<'a>(
                left: impl Into<Operand<'a>>,
                right: impl Into<Operand<'a>>,
            ) -> Result<RasterDataset> {
                binary($operation, left, right)
            }
        )+
    };
}

binary_functions! {
    add => ArithmeticOp::Add.into();
    subtract => ArithmeticOp::Subtract.into();
    multiply => ArithmeticOp::Multiply.into();
    /// Integer division by zero saturates like every other conversion back to
    /// an integer cell type.
    divide => ArithmeticOp::Divide.into();
    equal => LogicalOp::Equal.into();
    not_equal => LogicalOp::NotEqual.into();
    less_than => LogicalOp::Less.into();
    less_than_or_equal => LogicalOp::LessOrEqual.into();
    greater_than => LogicalOp::Greater.into();
    greater_than_or_equal => LogicalOp::GreaterOrEqual.into();
    /// Byte raster of the larger operand, saturated to 0..=255.
    maximum => LogicalOp::Maximum.into();
    /// Byte raster of the smaller operand, saturated to 0..=255.
    minimum => LogicalOp::Minimum.into();
    and => LogicalOp::And.into();
    or => LogicalOp::Or.into();
}

/// 1 where a cell is zero, 0 elsewhere.
pub fn not(input: &RasterDataset) -> Result<RasterDataset> {
    input.math(Operation::Not, None)
}

/// Round half to even to `decimals` decimal places.
pub fn round(input: &RasterDataset, decimals: i32) -> Result<RasterDataset> {
    unary(input, UnaryOp::Round { decimals })
}

pub fn round_integer(input: &RasterDataset) -> Result<RasterDataset> {
    unary(input, UnaryOp::RoundInteger)
}

/// Round toward zero.
pub fn round_fix(input: &RasterDataset) -> Result<RasterDataset> {
    unary(input, UnaryOp::Fix)
}

pub fn round_floor(input: &RasterDataset) -> Result<RasterDataset> {
    unary(input, UnaryOp::Floor)
}

pub fn round_ceiling(input: &RasterDataset) -> Result<RasterDataset> {
    unary(input, UnaryOp::Ceil)
}

pub fn truncate(input: &RasterDataset) -> Result<RasterDataset> {
    unary(input, UnaryOp::Truncate)
}

pub fn natural_log(input: &RasterDataset) -> Result<RasterDataset> {
    unary(input, UnaryOp::NaturalLog)
}

pub fn log10(input: &RasterDataset) -> Result<RasterDataset> {
    unary(input, UnaryOp::Log10)
}

pub fn exponential(input: &RasterDataset) -> Result<RasterDataset> {
    unary(input, UnaryOp::Exp)
}

pub fn power(input: &RasterDataset, exponent: f64) -> Result<RasterDataset> {
    unary(input, UnaryOp::Power { exponent })
}

pub fn square(input: &RasterDataset) -> Result<RasterDataset> {
    unary(input, UnaryOp::Square)
}

pub fn square_root(input: &RasterDataset) -> Result<RasterDataset> {
    unary(input, UnaryOp::SquareRoot)
}

pub fn absolute_value(input: &RasterDataset) -> Result<RasterDataset> {
    unary(input, UnaryOp::Absolute)
}

/// See [`raster::reclassify_discrete`].
pub fn reclassify_discrete(
    input: &RasterDataset,
    inputs: &[f64],
    outputs: &[f64],
) -> Result<RasterDataset> {
    raster::reclassify_discrete(input, inputs, outputs)
}

/// See [`raster::reclassify_range`].
pub fn reclassify_range(
    input: &RasterDataset,
    ranges: &[(f64, f64)],
    outputs: &[f64],
) -> Result<RasterDataset> {
    raster::reclassify_range(input, ranges, outputs)
}

/// Zoom by `zoom` with cubic interpolation.
pub fn resample(input: &RasterDataset, zoom: f64) -> Result<RasterDataset> {
    raster::scale(input, zoom, &ScaleOptions::new())
}

/// Crop to the cells covering `bounds`.
pub fn crop(input: &RasterDataset, bounds: Bounds) -> Result<RasterDataset> {
    raster::crop_by_reference(input, bounds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::BandArray;
    use crate::GeoTransform;
    use ndarray::array;

    fn raster(band: BandArray) -> RasterDataset {
        RasterDataset::from_bands(vec![band], GeoTransform::default()).unwrap()
    }

    #[test]
    fn scalar_position_is_kept() {
        let input = raster(array![[1i32, 4], [-2, 8]].into());
        let forward = divide(&input, 2.0).unwrap();
        let reversed = divide(8.0, &input).unwrap();
        assert_eq!(
            forward.band(0).unwrap().as_array::<i32>().unwrap(),
            &array![[0i32, 2], [-1, 4]]
        );
        assert_eq!(
            reversed.band(0).unwrap().as_array::<i32>().unwrap(),
            &array![[8i32, 2], [-4, 1]]
        );
        assert_eq!(
            less_than(3.0, &input).unwrap().band(0).unwrap().as_array::<u8>().unwrap(),
            &array![[0u8, 1], [0, 1]]
        );
    }

    #[test]
    fn two_scalars_are_rejected() {
        assert!(matches!(add(1.0, 2.0), Err(RasterError::InvalidOperand(_))));
    }

    #[test]
    fn unary_functions() {
        let input = raster(array![[-1.5f64, 2.25], [0.5, 9.0]].into());
        let cell = |r: Result<RasterDataset>, row: usize, col: usize| r.unwrap().band(0).unwrap().get_f64(row, col);
        assert_eq!(cell(round_fix(&input), 0, 0), Some(-1.0));
        assert_eq!(cell(round_floor(&input), 0, 0), Some(-2.0));
        assert_eq!(cell(round_ceiling(&input), 0, 0), Some(-1.0));
        assert_eq!(cell(round_integer(&input), 1, 0), Some(0.0));
        assert_eq!(cell(round(&input, 1), 0, 1), Some(2.2));
        assert_eq!(cell(absolute_value(&input), 0, 0), Some(1.5));
        assert_eq!(cell(square_root(&input), 1, 1), Some(3.0));
        assert_eq!(cell(square(&input), 0, 0), Some(2.25));
        assert_eq!(cell(power(&input, 0.5), 0, 1), Some(2.25f64.powf(0.5)));
        assert_eq!(cell(log10(&input), 1, 1), Some(9.0f64.log10()));
        assert_eq!(cell(exponential(&input), 1, 0), Some(0.5f64.exp()));
        assert_eq!(cell(natural_log(&input), 1, 1), Some(9.0f64.ln()));
        assert_eq!(cell(truncate(&input), 0, 0), Some(-1.0));
        assert_eq!(cell(not(&input), 0, 0), Some(0.0));
    }

    #[test]
    fn logical_functions_of_rasters() {
        let a = raster(array![[0u8, 1], [2, 0]].into());
        let b = raster(array![[0u8, 0], [5, 3]].into());
        let bytes = |r: Result<RasterDataset>| r.unwrap().band(0).unwrap().as_array::<u8>().unwrap().clone();
        assert_eq!(bytes(and(&a, &b)), array![[0u8, 0], [1, 0]]);
        assert_eq!(bytes(or(&a, &b)), array![[0u8, 1], [1, 1]]);
        assert_eq!(bytes(maximum(&a, &b)), array![[0u8, 1], [5, 3]]);
        assert_eq!(bytes(minimum(&a, 1.0)), array![[0u8, 1], [1, 0]]);
        assert_eq!(bytes(equal(&a, &b)), array![[1u8, 0], [0, 0]]);
        assert_eq!(bytes(not_equal(&a, &b)), array![[0u8, 1], [1, 1]]);
        assert_eq!(bytes(greater_than_or_equal(&a, 1.0)), array![[0u8, 1], [1, 0]]);
        assert_eq!(bytes(less_than_or_equal(&a, &b)), array![[1u8, 0], [1, 1]]);
    }
}
