#[cfg(all(test, feature = "gdal"))]
use std::path::{Path, PathBuf};

/// A temporary directory and a path to a file in that directory.
#[cfg(all(test, feature = "gdal"))]
pub(crate) struct TempFixture {
    _temp_dir: tempfile::TempDir,
    temp_path: PathBuf,
}

#[cfg(all(test, feature = "gdal"))]
impl TempFixture {
    /// Creates a temporary directory and path to a non-existent file with given `name`.
    ///
    /// The directory is removed when the fixture is dropped.
    pub fn empty(name: &str) -> Self {
        let _temp_dir = tempfile::tempdir().unwrap();
        let temp_path = _temp_dir.path().join(name);
        Self {
            _temp_dir,
            temp_path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.temp_path
    }
}

#[cfg(all(test, feature = "gdal"))]
impl AsRef<Path> for TempFixture {
    fn as_ref(&self) -> &Path {
        self.path()
    }
}

/// Assert numerical difference between two expressions is less than
/// 64-bit machine epsilon or a specified epsilon.
///
/// # Examples:
/// ```rust
/// use spa_raster::assert_near;
/// use std::f64::consts::{PI, E};
/// assert_near!(PI / E, 1.1557273497909217);
/// // with specified epsilon
/// assert_near!(PI / E, 1.15572734, epsilon = 1e-8);
/// ```
#[macro_export]
macro_rules! assert_near {
    ($left:expr, $right:expr) => {
        $crate::assert_near!($left, $right, epsilon = f64::EPSILON)
    };
    ($left:expr, $right:expr, epsilon = $ep:expr) => {
        assert!(
            ($left - $right).abs() < $ep,
            "|{} - {}| = {} is greater than epsilon {:.4e}",
            $left,
            $right,
            ($left - $right).abs(),
            $ep
        )
    };
    ($left:expr, $right:expr, epsilon = $ep:expr, field = $field:expr) => {
        assert!(
            ($left - $right).abs() < $ep,
            "field {}: |{} - {}| = {} is greater than epsilon {:.4e}",
            $field,
            $left,
            $right,
            ($left - $right).abs(),
            $ep
        )
    };
    // Pseudo-specialization
    (Bounds, $left:expr, $right:expr, epsilon = $ep:expr) => {
        $crate::assert_near!($left.x_min, $right.x_min, epsilon = $ep, field = "x_min");
        $crate::assert_near!($left.y_min, $right.y_min, epsilon = $ep, field = "y_min");
        $crate::assert_near!($left.x_max, $right.x_max, epsilon = $ep, field = "x_max");
        $crate::assert_near!($left.y_max, $right.y_max, epsilon = $ep, field = "y_max");
    };
}
