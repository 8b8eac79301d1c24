use ndarray::Array2;

use crate::errors::{RasterError, Result};
use crate::raster::{for_each_band, BandArray, Pixel, RasterDataset};

fn check_classes(inputs: usize, outputs: usize) -> Result<()> {
    if inputs != outputs {
        return Err(RasterError::InvalidOperand(format!(
            "{inputs} input class(es) but {outputs} output class(es)"
        )));
    }
    Ok(())
}

/// Map every cell through `classify`, keeping the pixel type. Cells without
/// a class become 0.
fn reclassify(
    input: &RasterDataset,
    operation: &'static str,
    classify: impl Fn(f64) -> Option<f64>,
) -> Result<RasterDataset> {
    fn map<T: Pixel>(a: &Array2<T>, classify: &impl Fn(f64) -> Option<f64>) -> Array2<T> {
        a.mapv(|v| T::from_f64(classify(v.to_f64()).unwrap_or(0.0)))
    }

    let bands = input
        .bands()?
        .iter()
        .map(|band| {
            for_each_band!(
                band,
                a => Ok(BandArray::from(map(a, &classify))),
                _c => Err(RasterError::unsupported(operation, "complex cells have no ordering"))
            )
        })
        .collect::<Result<Vec<_>>>()?;

    let mut output = input.properties_only();
    output.set_bands(bands)?;
    if input.no_data_value().is_some() {
        output.set_mask(input.mask().cloned())?;
    }
    Ok(output)
}

/// Replace cells equal to `inputs[i]` with `outputs[i]`.
///
/// The first matching class wins and unmatched cells become 0. Output values
/// are converted to the input's pixel type.
///
/// ```rust
/// use ndarray::array;
/// use spa_raster::raster::{reclassify_discrete, BandArray};
/// use spa_raster::{GeoTransform, RasterDataset};
///
/// let band: BandArray = array![[10u8, 20], [30, 40]].into();
/// let raster = RasterDataset::from_bands(vec![band], GeoTransform::default()).unwrap();
/// let classes = reclassify_discrete(&raster, &[10.0, 20.0, 30.0], &[1.0, 2.0, 3.0]).unwrap();
/// assert_eq!(classes.band(0).unwrap().as_array::<u8>().unwrap(), &array![[1u8, 2], [3, 0]]);
/// ```
pub fn reclassify_discrete(
    input: &RasterDataset,
    inputs: &[f64],
    outputs: &[f64],
) -> Result<RasterDataset> {
    check_classes(inputs.len(), outputs.len())?;
    reclassify(input, "reclassify_discrete", |v| {
        inputs
            .iter()
            .zip(outputs)
            .find(|&(&class, _)| v == class)
            .map(|(_, &out)| out)
    })
}

/// Replace cells in the half-open range `(low, high]` of `ranges[i]` with `outputs[i]`.
///
/// The first matching range wins and unmatched cells become 0.
pub fn reclassify_range(
    input: &RasterDataset,
    ranges: &[(f64, f64)],
    outputs: &[f64],
) -> Result<RasterDataset> {
    check_classes(ranges.len(), outputs.len())?;
    if let Some((low, high)) = ranges
        .iter()
        .find(|(low, high)| low.is_nan() || high.is_nan() || low > high)
    {
        return Err(RasterError::InvalidOperand(format!(
            "class range ({low}, {high}] is reversed or undefined"
        )));
    }
    reclassify(input, "reclassify_range", |v| {
        ranges
            .iter()
            .zip(outputs)
            .find(|&(&(low, high), _)| low < v && v <= high)
            .map(|(_, &out)| out)
    })
}
