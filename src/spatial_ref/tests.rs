use super::*;
use crate::raster::BandArray;
use crate::GeoTransform;
use ndarray::Array2;

#[test]
fn utm_defaults_to_wgs84() {
    let utm = ProjectionRef::utm(10, false);
    assert_eq!(
        utm,
        ProjectionRef::Utm {
            zone: 10,
            south: false,
            geographic_cs: "WGS84".to_string()
        }
    );
    assert_eq!(
        utm.definition(),
        "+proj=utm +zone=10 +datum=WGS84 +units=m +no_defs"
    );
    assert_eq!(utm.to_string(), "UTM zone 10N (WGS84)");
    assert_eq!(
        ProjectionRef::utm(33, true).definition(),
        "+proj=utm +zone=33 +south +datum=WGS84 +units=m +no_defs"
    );
}

#[test]
fn validation() {
    assert!(ProjectionRef::utm(0, false).validate().is_err());
    assert!(ProjectionRef::utm(61, false).validate().is_err());
    assert!(ProjectionRef::Wkt("  ".to_string()).validate().is_err());
    assert!(ProjectionRef::Proj(ProjParameters::new()).validate().is_err());
    assert!(ProjectionRef::Epsg(4326).validate().is_ok());
    assert_eq!(ProjectionRef::Epsg(4326).definition(), "EPSG:4326");
}

#[test]
fn proj_parameters() {
    let mut params = ProjParameters::new();
    params
        .with_param("proj", "ortho")
        .with_param("lat_0", 40)
        .with_param("lon_0", -100);
    assert_eq!(params.param("lat_0"), Some("40"));
    assert_eq!(
        params.to_proj_string(),
        "+proj=ortho +lat_0=40 +lon_0=-100 +no_defs"
    );

    // A pole at 90 is the regular, non-oblique aspect.
    params.with_lat_new_pole(90.0);
    assert_eq!(
        params.to_proj_string(),
        "+proj=ortho +lat_0=40 +lon_0=-100 +no_defs"
    );

    params.with_lat_new_pole(45.0);
    assert_eq!(
        params.to_proj_string(),
        "+proj=ob_tran +lat_0=40 +lon_0=-100 +no_defs +o_lat_p=45 +o_proj=ortho"
    );
}

#[test]
fn proj_flags() {
    let mut params = ProjParameters::new();
    params.with_param("proj", "utm").with_param("zone", 18).with_flag("south");
    let projection: ProjectionRef = params.into();
    assert_eq!(
        projection.definition(),
        "+proj=utm +no_defs +south +zone=18"
    );
}

#[test]
fn reprojection_inputs_are_checked() {
    let band: BandArray = Array2::<f32>::zeros((2, 2)).into();
    let mut raster = RasterDataset::from_bands(vec![band], GeoTransform::default()).unwrap();
    let target = ProjectionRef::Epsg(4326);
    assert!(matches!(
        validate_reprojection(&raster, &target),
        Err(RasterError::InvalidOperand(_))
    ));
    raster.set_utm(11, false);
    assert_eq!(
        validate_reprojection(&raster, &target).unwrap(),
        &ProjectionRef::utm(11, false)
    );
    assert!(validate_reprojection(&RasterDataset::new(), &target).is_err());

    assert!(validate_coords(&[1.0, 2.0], &[1.0]).is_err());
    assert!(validate_coords(&[1.0], &[1.0]).is_ok());
}

#[cfg(feature = "gdal")]
mod gdal {
    use super::*;
    use crate::assert_near;

    #[test]
    fn spatial_ref_from_every_variant() {
        for projection in [
            ProjectionRef::Epsg(4326),
            ProjectionRef::utm(10, false),
            ProjectionRef::Proj({
                let mut params = ProjParameters::new();
                params.with_param("proj", "laea").with_param("lat_0", 52);
                params
            }),
        ] {
            let srs = SpatialRef::from_projection_ref(&projection).unwrap();
            assert!(!srs.to_wkt().unwrap().is_empty());
        }
        assert!(SpatialRef::from_projection_ref(&ProjectionRef::Wkt("nonsense".to_string())).is_err());
    }

    #[test]
    fn transform_coordinates() {
        let engine = GdalProjectionEngine::new();
        let mut xs = [-123.0];
        let mut ys = [45.0];
        engine
            .transform_coords(
                &ProjectionRef::Epsg(4326),
                &ProjectionRef::utm(10, false),
                &mut xs,
                &mut ys,
            )
            .unwrap();
        // Central meridian of zone 10 is -123, so x sits on the false easting.
        assert_near!(xs[0], 500_000.0, epsilon = 1e-3);
        assert_near!(ys[0], 4_982_950.4, epsilon = 1.0);
    }
}
