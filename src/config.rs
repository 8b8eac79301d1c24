//! GDAL runtime configuration
//!
//! The GDAL library reads configuration options from environment variables or
//! from the functions in this module; options set here take precedence.
//!
//! ```
//! use spa_raster::config::*;
//!
//! // Let the warper use four threads
//! set_config_option("GDAL_NUM_THREADS", "4").unwrap();
//! assert_eq!(get_config_option("GDAL_NUM_THREADS", "").unwrap(), "4");
//!
//! clear_config_option("GDAL_NUM_THREADS").unwrap();
//! assert_eq!(get_config_option("GDAL_NUM_THREADS", "1").unwrap(), "1");
//! ```
//!
//! GDAL reports errors and warnings through a process-wide handler which by
//! default prints to stderr. [`set_log_error_handler`] forwards them to the
//! [`log`] facade instead.
//!
//! Refer to [GDAL `ConfigOptions`](https://gdal.org/user/configoptions.html) for
//! a full list of options.

use std::ffi::{c_char, CString};

use gdal_sys::{CPLErr, CPLErrorNum};

use crate::errors::Result;
use crate::utils::_string;

/// Set a GDAL library configuration option
pub fn set_config_option(key: &str, value: &str) -> Result<()> {
    let c_key = CString::new(key.as_bytes())?;
    let c_val = CString::new(value.as_bytes())?;
    unsafe {
        gdal_sys::CPLSetConfigOption(c_key.as_ptr(), c_val.as_ptr());
    };
    Ok(())
}

/// Get the value of a GDAL library configuration option, or `default` when unset.
pub fn get_config_option(key: &str, default: &str) -> Result<String> {
    let c_key = CString::new(key.as_bytes())?;
    let c_default = CString::new(default.as_bytes())?;
    let rv = unsafe { gdal_sys::CPLGetConfigOption(c_key.as_ptr(), c_default.as_ptr()) };
    Ok(_string(rv))
}

/// Clear the value of a GDAL library configuration option
pub fn clear_config_option(key: &str) -> Result<()> {
    let c_key = CString::new(key.as_bytes())?;
    unsafe {
        gdal_sys::CPLSetConfigOption(c_key.as_ptr(), ::std::ptr::null());
    };
    Ok(())
}

/// Set a configuration option for the calling thread only.
pub fn set_thread_local_config_option(key: &str, value: &str) -> Result<()> {
    let c_key = CString::new(key.as_bytes())?;
    let c_val = CString::new(value.as_bytes())?;
    unsafe {
        gdal_sys::CPLSetThreadLocalConfigOption(c_key.as_ptr(), c_val.as_ptr());
    };
    Ok(())
}

/// Clear a configuration option set with [`set_thread_local_config_option`].
pub fn clear_thread_local_config_option(key: &str) -> Result<()> {
    let c_key = CString::new(key.as_bytes())?;
    unsafe {
        gdal_sys::CPLSetThreadLocalConfigOption(c_key.as_ptr(), ::std::ptr::null());
    };
    Ok(())
}

unsafe extern "C" fn log_error_handler(
    error_type: CPLErr::Type,
    error_num: CPLErrorNum,
    error_msg_ptr: *const c_char,
) {
    let error_msg = _string(error_msg_ptr);
    let level = match error_type {
        CPLErr::CE_None => log::Level::Trace,
        CPLErr::CE_Debug => log::Level::Debug,
        CPLErr::CE_Warning => log::Level::Warn,
        _ => log::Level::Error,
    };
    log::log!(target: "gdal", level, "GDAL error {error_num}: {error_msg}");
}

/// Forward GDAL errors, warnings and debug messages to the `log` facade under
/// the `gdal` target.
pub fn set_log_error_handler() {
    unsafe {
        gdal_sys::CPLSetErrorHandler(Some(log_error_handler));
    };
}

/// Restore GDAL's default stderr error handler.
pub fn remove_log_error_handler() {
    unsafe {
        gdal_sys::CPLSetErrorHandler(None);
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::GdalCodec;
    use crate::FileCodec;
    use std::path::Path;

    #[test]
    fn test_config_options() {
        // GDAL's configuration is process-wide; run the scenarios in sequence.
        test_set_get_option();
        test_set_option_with_embedded_nul();
        test_clear_option();
        test_thread_local_override();
    }

    fn test_set_get_option() {
        assert!(set_config_option("GDAL_CACHEMAX", "128").is_ok());
        assert_eq!(get_config_option("GDAL_CACHEMAX", "").unwrap(), "128");
        assert_eq!(
            get_config_option("NON_EXISTANT_OPTION", "DEFAULT_VALUE").unwrap(),
            "DEFAULT_VALUE"
        );
    }

    fn test_set_option_with_embedded_nul() {
        assert!(set_config_option("f\0oo", "valid").is_err());
        assert!(set_config_option("foo", "in\0valid").is_err());
    }

    fn test_clear_option() {
        assert!(set_config_option("TEST_OPTION", "256").is_ok());
        assert_eq!(get_config_option("TEST_OPTION", "DEFAULT").unwrap(), "256");
        assert!(clear_config_option("TEST_OPTION").is_ok());
        assert_eq!(get_config_option("TEST_OPTION", "DEFAULT").unwrap(), "DEFAULT");
    }

    fn test_thread_local_override() {
        assert!(set_thread_local_config_option("TEST_LOCAL_OPTION", "64").is_ok());
        assert_eq!(get_config_option("TEST_LOCAL_OPTION", "").unwrap(), "64");
        assert!(clear_thread_local_config_option("TEST_LOCAL_OPTION").is_ok());
        assert_eq!(get_config_option("TEST_LOCAL_OPTION", "unset").unwrap(), "unset");
    }

    #[test]
    fn errors_still_surface_with_log_handler() {
        set_log_error_handler();
        let result = GdalCodec::new().load(Path::new("/no/such/dir/raster.tif"));
        remove_log_error_handler();
        assert!(result.is_err());
    }
}
