use std::ffi::{c_char, CStr, CString};
use std::path::Path;
use std::sync::Once;

use gdal_sys::CPLErr;

use crate::errors::{RasterError, Result};

static START: Once = Once::new();

/// Register every GDAL driver, once per process.
pub(crate) fn _register_drivers() {
    START.call_once(|| unsafe {
        gdal_sys::GDALAllRegister();
    });
}

pub(crate) fn _string(raw_ptr: *const c_char) -> String {
    if raw_ptr.is_null() {
        return String::new();
    }
    let c_str = unsafe { CStr::from_ptr(raw_ptr) };
    c_str.to_string_lossy().into_owned()
}

pub(crate) fn _last_cpl_err(cpl_err_class: CPLErr::Type) -> RasterError {
    let last_err_no = unsafe { gdal_sys::CPLGetLastErrorNo() };
    let last_err_msg = _string(unsafe { gdal_sys::CPLGetLastErrorMsg() });
    unsafe { gdal_sys::CPLErrorReset() };
    RasterError::CplError {
        class: cpl_err_class,
        number: last_err_no,
        msg: last_err_msg,
    }
}

pub(crate) fn _last_null_pointer_err(method_name: &'static str) -> RasterError {
    let last_err_msg = _string(unsafe { gdal_sys::CPLGetLastErrorMsg() });
    unsafe { gdal_sys::CPLErrorReset() };
    RasterError::NullPointer {
        method_name,
        msg: last_err_msg,
    }
}

pub(crate) fn _path_to_c_string(path: &Path) -> Result<CString> {
    let path_str = path.to_string_lossy();
    CString::new(path_str.as_ref()).map_err(Into::into)
}
