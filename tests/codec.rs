#![cfg(feature = "gdal")]

use ndarray::{array, Array2};
use spa_raster::raster::BandArray;
use spa_raster::spatial_ref::ProjectionRef;
use spa_raster::vector::VectorGeometry;
use spa_raster::{
    math, FileCodec, GdalCodec, GdalProjectionEngine, GdalVectorGeometry, GeoTransform,
    ProjectionEngine, RasterDataset, RasterError,
};

fn utm_raster(band: BandArray) -> RasterDataset {
    let mut raster =
        RasterDataset::from_bands(vec![band], GeoTransform::new(500_000.0, 4_100_000.0, 30.0, -30.0))
            .unwrap();
    raster.set_utm(11, false);
    raster
}

#[test]
fn test_round_trip_through_formats() {
    let dir = tempfile::tempdir().unwrap();
    let raster = utm_raster(array![[1u8, 2, 3], [4, 5, 6]].into());
    let codec = GdalCodec::new();

    for name in ["cells.tif", "cells.asc", "cells.png", "cells.img"] {
        let path = dir.path().join(name);
        codec.save(&path, &raster).unwrap();
        let loaded = codec.load(&path).unwrap();
        assert_eq!(loaded.width_in_pixels(), 3, "{name}");
        assert_eq!(loaded.height_in_pixels(), 2, "{name}");
        assert_eq!(
            loaded.band(0).unwrap().to_f64_array().unwrap(),
            array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]],
            "{name}"
        );
    }
}

#[test]
fn test_load_compute_save() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.tif");
    let output = dir.path().join("output.tif");
    let codec = GdalCodec::new();

    let ramp = Array2::from_shape_fn((20, 30), |(_, col)| col as f32);
    codec.save(&input, &utm_raster(ramp.into())).unwrap();

    let loaded = codec.load(&input).unwrap();
    let high = math::greater_than(&loaded, 14.5).unwrap();
    codec.save(&output, &high).unwrap();

    let result = codec.load(&output).unwrap();
    assert_eq!(result.pixel_type(), Some(spa_raster::PixelType::Byte));
    assert_eq!(result.band(0).unwrap().get_f64(10, 14), Some(0.0));
    assert_eq!(result.band(0).unwrap().get_f64(10, 15), Some(1.0));
    assert_eq!(result.geo_transform(), loaded.geo_transform());
}

#[test]
fn test_no_data_is_written_for_masked_cells() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("masked.tif");
    let mut raster = utm_raster(array![[1i32, 2], [3, 4]].into());
    raster.set_no_data_value(Some(-1.0));
    raster.set_mask(Some(array![[false, true], [true, false]])).unwrap();

    GdalCodec::new().save(&path, &raster).unwrap();
    let loaded = GdalCodec::new().load(&path).unwrap();
    assert_eq!(
        loaded.band(0).unwrap().as_array::<i32>().unwrap(),
        &array![[1i32, -1], [-1, 4]]
    );
    assert_eq!(loaded.mask(), raster.mask());
}

#[test]
fn test_polygonize_classes() {
    let band: BandArray = array![[1u8, 1, 0, 0], [1, 1, 0, 0], [2, 2, 2, 2]].into();
    let layer = GdalVectorGeometry::new().polygonize(&utm_raster(band)).unwrap();
    assert_eq!(layer.len(), 3);
    assert_eq!(layer.with_value(0.0).count(), 1);
    assert_eq!(layer.with_value(2.0).count(), 1);
    assert!(layer.projection.is_some());
}

#[test]
fn test_reproject_to_geographic() {
    let band = Array2::from_shape_fn((10, 10), |(row, col)| (row * 10 + col) as u16);
    let raster = utm_raster(band.into());
    let engine = GdalProjectionEngine::new();
    let target = ProjectionRef::Epsg(4326);

    let reprojected = engine.reproject(&raster, &target).unwrap();
    assert_eq!(reprojected.projection(), Some(&target));
    assert_eq!(reprojected.pixel_type(), raster.pixel_type());
    let bounds = reprojected.bounds();
    // UTM 11N easting 500 km lies on the central meridian, -117 degrees.
    assert!((bounds.x_min + 117.0).abs() < 0.01, "{bounds:?}");
    assert!(bounds.y_max > 37.0 && bounds.y_max < 37.1, "{bounds:?}");

    let mut xs = [500_000.0];
    let mut ys = [4_100_000.0];
    engine
        .transform_coords(&ProjectionRef::utm(11, false), &target, &mut xs, &mut ys)
        .unwrap();
    assert!((xs[0] + 117.0).abs() < 1e-6);
}

#[test]
fn test_reproject_needs_source_projection() {
    let raster = RasterDataset::from_bands(vec![array![[1u8]].into()], GeoTransform::default())
        .unwrap();
    assert!(matches!(
        GdalProjectionEngine::new().reproject(&raster, &ProjectionRef::Epsg(4326)),
        Err(RasterError::InvalidOperand(_))
    ));
}
