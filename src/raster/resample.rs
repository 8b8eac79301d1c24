//! Cropping, zooming and decimation of whole datasets.
//!
//! Every operation returns a new [`RasterDataset`]; inputs are never modified.

use ndarray::Array2;
use num_complex::Complex32;

use crate::errors::{PixelWindow, RasterError, Result};
use crate::geo_transform::Bounds;
use crate::raster::{for_each_band, BandArray, Pixel, RasterDataset};

/// Interpolation kernel used when zooming a raster.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Interpolation {
    /// Value of the closest source cell.
    Nearest,
    /// Linear in each axis over a 2x2 neighbourhood.
    Bilinear,
    /// Keys cubic convolution (a = -0.5) over a 4x4 neighbourhood.
    #[default]
    Cubic,
}

impl Interpolation {
    /// Map a spline order to a kernel: 0 is nearest, 1 bilinear and 2 to 5 cubic.
    pub fn from_order(order: u8) -> Result<Self> {
        match order {
            0 => Ok(Interpolation::Nearest),
            1 => Ok(Interpolation::Bilinear),
            2..=5 => Ok(Interpolation::Cubic),
            _ => Err(RasterError::InvalidOperand(format!(
                "interpolation order {order} is not in 0..=5"
            ))),
        }
    }

    /// Source taps `(index, weight)` for the fractional source coordinate `x`
    /// along an axis of `len` cells. Out of range taps are clamped to the edge.
    fn taps(&self, x: f64, len: usize) -> Vec<(usize, f64)> {
        let last = len as i64 - 1;
        let clamp = |i: i64| i.clamp(0, last) as usize;
        let mut taps = match self {
            Interpolation::Nearest => vec![(clamp((x + 0.5).floor() as i64), 1.0)],
            Interpolation::Bilinear => {
                let i = x.floor();
                let t = x - i;
                let i = i as i64;
                vec![(clamp(i), 1.0 - t), (clamp(i + 1), t)]
            }
            Interpolation::Cubic => {
                let i = x.floor();
                let t = x - i;
                let i = i as i64;
                (-1..=2)
                    .map(|k| (clamp(i + k), keys_kernel(t - k as f64)))
                    .collect()
            }
        };
        // Zero weights are dropped so NaN neighbours stay out of exact samples.
        taps.retain(|&(_, w)| w != 0.0);
        taps
    }
}

fn keys_kernel(x: f64) -> f64 {
    const A: f64 = -0.5;
    let x = x.abs();
    if x <= 1.0 {
        ((A + 2.0) * x - (A + 3.0)) * x * x + 1.0
    } else if x < 2.0 {
        ((A * x - 5.0 * A) * x + 8.0 * A) * x - 4.0 * A
    } else {
        0.0
    }
}

/// Options for [`scale`].
#[derive(Clone, Debug, PartialEq)]
pub struct ScaleOptions {
    interpolation: Interpolation,
    sentinel_tolerance: f64,
}

impl Default for ScaleOptions {
    fn default() -> Self {
        ScaleOptions::new()
    }
}

impl ScaleOptions {
    /// Cubic interpolation, no-data tolerance of `1e-8`.
    pub fn new() -> Self {
        ScaleOptions {
            interpolation: Interpolation::Cubic,
            sentinel_tolerance: 1e-8,
        }
    }

    pub fn with_interpolation(&mut self, interpolation: Interpolation) -> &mut Self {
        self.interpolation = interpolation;
        self
    }

    /// Cells within this distance of the no-data value are zeroed before interpolation.
    pub fn with_sentinel_tolerance(&mut self, tolerance: f64) -> &mut Self {
        self.sentinel_tolerance = tolerance;
        self
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    pub fn sentinel_tolerance(&self) -> f64 {
        self.sentinel_tolerance
    }
}

/// Options for [`nearest_neighbor_resample`].
#[derive(Clone, Debug, PartialEq)]
pub struct NearestNeighborOptions {
    row_rate: f64,
    column_rate: f64,
}

impl Default for NearestNeighborOptions {
    fn default() -> Self {
        NearestNeighborOptions::new()
    }
}

impl NearestNeighborOptions {
    /// Keep every tenth row and column.
    pub fn new() -> Self {
        NearestNeighborOptions {
            row_rate: 10.0,
            column_rate: 10.0,
        }
    }

    /// Source rows advanced per output row.
    pub fn with_row_rate(&mut self, rate: f64) -> &mut Self {
        self.row_rate = rate;
        self
    }

    /// Source columns advanced per output column.
    pub fn with_column_rate(&mut self, rate: f64) -> &mut Self {
        self.column_rate = rate;
        self
    }

    pub fn row_rate(&self) -> f64 {
        self.row_rate
    }

    pub fn column_rate(&self) -> f64 {
        self.column_rate
    }
}

/// Copy the inclusive pixel window `start..=end` into a new dataset.
///
/// The north-west corner moves to the window's first cell; the mask, when
/// present, is sliced with the bands.
pub fn extract_by_pixels(
    input: &RasterDataset,
    start_col: i64,
    start_row: i64,
    end_col: i64,
    end_row: i64,
) -> Result<RasterDataset> {
    let bands = input.bands()?;
    let (width, height) = (input.width_in_pixels(), input.height_in_pixels());
    let inside = |start: i64, end: i64, len: usize| 0 <= start && start <= end && end < len as i64;
    if !inside(start_col, end_col, width) || !inside(start_row, end_row, height) {
        return Err(RasterError::OutOfBounds {
            window: PixelWindow {
                start_col,
                start_row,
                end_col,
                end_row,
            },
            width,
            height,
        });
    }
    let rows = (start_row as usize, end_row as usize);
    let cols = (start_col as usize, end_col as usize);

    let mut output = input.properties_only();
    let (pixel_width, pixel_height) = input.resolution();
    let geo_transform = input.geo_transform();
    output.set_north_west_corner(
        geo_transform.x_min + start_col as f64 * pixel_width,
        geo_transform.y_max + start_row as f64 * pixel_height,
    );
    output.set_bands(bands.iter().map(|band| band.window(rows, cols)).collect())?;
    if let Some(mask) = input.mask() {
        let window = mask
            .slice(ndarray::s![rows.0..=rows.1, cols.0..=cols.1])
            .to_owned();
        output.set_mask(Some(window))?;
    }
    log::debug!(
        "extracted columns {}..={} and rows {}..={} of a {width}x{height} raster",
        cols.0,
        cols.1,
        rows.0,
        rows.1
    );
    Ok(output)
}

/// Crop to the pixels covering `bounds`, in reference units.
///
/// Columns run from the cell containing `x_min` to the cell containing `x_max`.
/// Rows come from [`RasterDataset::pixel_y_from_ref_y`], which floors the
/// negated row offset: a `y_max` or `y_min` strictly inside a row selects the
/// row below it. Both ends are inclusive.
pub fn crop_by_reference(input: &RasterDataset, bounds: Bounds) -> Result<RasterDataset> {
    let start_col = input.pixel_x_from_ref_x(bounds.x_min);
    let start_row = input.pixel_y_from_ref_y(bounds.y_max);
    let end_col = input.pixel_x_from_ref_x(bounds.x_max);
    let end_row = input.pixel_y_from_ref_y(bounds.y_min);
    extract_by_pixels(input, start_col, start_row, end_col, end_row)
}

/// Largest number of cells a zoom or decimation may produce.
pub const MAX_OUTPUT_CELLS: usize = 1 << 31;

/// Row and column counts of a resampled grid, `None` when they do not fit in
/// [`MAX_OUTPUT_CELLS`].
fn output_shape(rows: f64, cols: f64) -> Option<(usize, usize)> {
    let fits = |n: f64| n.is_finite() && (0.0..=MAX_OUTPUT_CELLS as f64).contains(&n);
    if !(fits(rows) && fits(cols)) {
        return None;
    }
    let (rows, cols) = (rows as usize, cols as usize);
    rows.checked_mul(cols)
        .filter(|&cells| cells <= MAX_OUTPUT_CELLS)
        .map(|_| (rows, cols))
}

/// Source coordinate of each output cell along one axis: the first and last
/// cells of both grids line up.
fn source_coordinates(len_in: usize, len_out: usize) -> Vec<f64> {
    if len_out <= 1 {
        return vec![0.0; len_out];
    }
    let step = (len_in - 1) as f64 / (len_out - 1) as f64;
    (0..len_out).map(|o| o as f64 * step).collect()
}

/// Separable interpolation: columns of every row first, then rows.
fn interpolate(
    values: &Array2<f64>,
    row_taps: &[Vec<(usize, f64)>],
    col_taps: &[Vec<(usize, f64)>],
) -> Array2<f64> {
    let across = Array2::from_shape_fn((values.nrows(), col_taps.len()), |(r, c)| {
        col_taps[c].iter().map(|&(j, w)| w * values[(r, j)]).sum::<f64>()
    });
    Array2::from_shape_fn((row_taps.len(), col_taps.len()), |(r, c)| {
        row_taps[r].iter().map(|&(i, w)| w * across[(i, c)]).sum::<f64>()
    })
}

/// Zoom every band by `zoom` with the interpolation of `options`.
///
/// The output has `round(n * zoom)` rows and columns and pixels `zoom` times
/// smaller; the north-west corner is unchanged. When the input has a no-data
/// value, cells close to it and masked cells are zeroed before interpolating,
/// so the sentinel does not bleed into its neighbours. The mask is zoomed with
/// the bands and cells at least half covered stay masked.
pub fn scale(input: &RasterDataset, zoom: f64, options: &ScaleOptions) -> Result<RasterDataset> {
    let bands = input.bands()?;
    if !zoom.is_finite() || zoom <= 0.0 {
        return Err(RasterError::InvalidOperand(format!(
            "zoom {zoom} must be finite and positive"
        )));
    }
    let (height, width) = (input.height_in_pixels(), input.width_in_pixels());
    let (out_height, out_width) =
        output_shape((height as f64 * zoom).round(), (width as f64 * zoom).round()).ok_or_else(
            || {
                RasterError::InvalidOperand(format!(
                    "zooming a {width}x{height} raster by {zoom} exceeds {MAX_OUTPUT_CELLS} cells"
                ))
            },
        )?;
    if out_height == 0 || out_width == 0 {
        return Err(RasterError::InvalidOperand(format!(
            "zooming a {width}x{height} raster by {zoom} leaves no cells"
        )));
    }

    let interpolation = options.interpolation;
    let row_taps: Vec<_> = source_coordinates(height, out_height)
        .into_iter()
        .map(|y| interpolation.taps(y, height))
        .collect();
    let col_taps: Vec<_> = source_coordinates(width, out_width)
        .into_iter()
        .map(|x| interpolation.taps(x, width))
        .collect();

    let sentinel = input.no_data_value().map(|no_data| Sentinel {
        no_data,
        tolerance: options.sentinel_tolerance,
        mask: input.mask(),
    });
    let zoom_real = |values: Array2<f64>| -> Array2<f64> {
        let values = match &sentinel {
            Some(sentinel) => sentinel.zero(values),
            None => values,
        };
        interpolate(&values, &row_taps, &col_taps)
    };

    let zoomed = bands
        .iter()
        .map(|band| {
            for_each_band!(
                band,
                a => zoom_typed(a, &zoom_real),
                c => {
                    let re = zoom_real(c.mapv(|v| v.re as f64));
                    let im = zoom_real(c.mapv(|v| v.im as f64));
                    let mut out = Array2::<Complex32>::zeros(re.dim());
                    ndarray::Zip::from(&mut out)
                        .and(&re)
                        .and(&im)
                        .for_each(|z, &re, &im| *z = Complex32::new(re as f32, im as f32));
                    BandArray::Complex64(out)
                }
            )
        })
        .collect::<Vec<BandArray>>();

    let mut output = input.properties_only();
    let (pixel_width, pixel_height) = input.resolution();
    output.set_resolution(pixel_width / zoom, Some(pixel_height / zoom));
    output.set_bands(zoomed)?;
    if let Some(mask) = input.mask() {
        let coverage = interpolate(
            &mask.mapv(|m| if m { 1.0 } else { 0.0 }),
            &row_taps,
            &col_taps,
        );
        output.set_mask(Some(coverage.mapv(|v| v >= 0.5)))?;
    }
    log::debug!(
        "scaled {width}x{height} raster by {zoom} ({interpolation:?}) to {out_width}x{out_height}"
    );
    Ok(output)
}

fn zoom_typed<T: Pixel>(a: &Array2<T>, zoom: impl Fn(Array2<f64>) -> Array2<f64>) -> BandArray {
    zoom(a.mapv(|v| v.to_f64()))
        .mapv(T::from_f64_rounded)
        .into()
}

struct Sentinel<'a> {
    no_data: f64,
    tolerance: f64,
    mask: Option<&'a Array2<bool>>,
}

impl Sentinel<'_> {
    fn zero(&self, mut values: Array2<f64>) -> Array2<f64> {
        values.indexed_iter_mut().for_each(|(index, v)| {
            let sentinel = (*v - self.no_data).abs() <= self.tolerance
                || (v.is_nan() && self.no_data.is_nan());
            if sentinel || self.mask.is_some_and(|m| m[index]) {
                *v = 0.0;
            }
        });
        values
    }
}

/// Decimate by sampling source cell `floor(o * rate)` for every output cell `o`.
///
/// The output is `floor(height / row_rate)` by `floor(width / column_rate)`
/// with pixels `rate` times larger. Masked source cells are not copied; they
/// stay zero and masked in the output.
pub fn nearest_neighbor_resample(
    input: &RasterDataset,
    options: &NearestNeighborOptions,
) -> Result<RasterDataset> {
    let bands = input.bands()?;
    let (row_rate, column_rate) = (options.row_rate, options.column_rate);
    if !(row_rate.is_finite() && row_rate > 0.0 && column_rate.is_finite() && column_rate > 0.0) {
        return Err(RasterError::InvalidOperand(format!(
            "sampling rates ({row_rate}, {column_rate}) must be finite and positive"
        )));
    }
    let (height, width) = (input.height_in_pixels(), input.width_in_pixels());
    let (out_height, out_width) = output_shape(
        (height as f64 / row_rate).floor(),
        (width as f64 / column_rate).floor(),
    )
    .ok_or_else(|| {
        RasterError::InvalidOperand(format!(
            "sampling a {width}x{height} raster every ({row_rate}, {column_rate}) cells exceeds {MAX_OUTPUT_CELLS} cells"
        ))
    })?;
    if out_height == 0 || out_width == 0 {
        return Err(RasterError::InvalidOperand(format!(
            "sampling a {width}x{height} raster every ({row_rate}, {column_rate}) cells leaves no cells"
        )));
    }

    let source = |o: usize, rate: f64, len: usize| -> Option<usize> {
        let i = (o as f64 * rate).floor() as usize;
        (i < len).then_some(i)
    };
    let mask = input.mask();
    let mut out_mask = mask.map(|_| Array2::from_elem((out_height, out_width), false));
    let mut cells = Vec::with_capacity(out_height * out_width);
    for out_row in 0..out_height {
        log::trace!("sampling output row {out_row}");
        for out_col in 0..out_width {
            let cell = source(out_row, row_rate, height)
                .zip(source(out_col, column_rate, width))
                .filter(|&index| !mask.is_some_and(|m| m[index]));
            if cell.is_none() {
                if let Some(out_mask) = out_mask.as_mut() {
                    out_mask[(out_row, out_col)] = true;
                }
            }
            cells.push(cell);
        }
    }

    fn sample<T: Copy + Default>(
        a: &Array2<T>,
        cells: &[Option<(usize, usize)>],
        shape: (usize, usize),
    ) -> Array2<T> {
        Array2::from_shape_fn(shape, |(r, c)| {
            cells[r * shape.1 + c].map_or_else(T::default, |index| a[index])
        })
    }
    let shape = (out_height, out_width);
    let sampled = bands
        .iter()
        .map(|band| {
            for_each_band!(
                band,
                a => sample(a, &cells, shape).into(),
                c => BandArray::Complex64(sample(c, &cells, shape))
            )
        })
        .collect::<Vec<BandArray>>();

    let mut output = input.properties_only();
    let (pixel_width, pixel_height) = input.resolution();
    output.set_resolution(pixel_width * column_rate, Some(pixel_height * row_rate));
    output.set_bands(sampled)?;
    output.set_mask(out_mask)?;
    log::debug!(
        "sampled {width}x{height} raster every ({row_rate}, {column_rate}) cells to {out_width}x{out_height}"
    );
    Ok(output)
}
