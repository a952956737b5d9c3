//! Error macros for gradeflow

/// Macro for returning a configuration error
#[macro_export]
macro_rules! bail_config {
    ($($arg:tt)*) => {
        return Err($crate::error::GradeError::config(format!($($arg)*)))
    };
}

/// Macro for returning an index load error
#[macro_export]
macro_rules! bail_index_load {
    ($path:expr, $($arg:tt)*) => {
        return Err($crate::error::GradeError::index_load($path, format!($($arg)*)))
    };
}
