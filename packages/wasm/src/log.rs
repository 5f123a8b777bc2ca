//! Console logging.
//!
//! On `wasm32` the macros forward to the browser console through `web-sys`.
//! Native builds (tests, benches) format nothing and print nothing.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Level {
    Debug,
    Info,
    Warn,
}

#[cfg(target_arch = "wasm32")]
pub(crate) fn write(level: Level, args: std::fmt::Arguments<'_>) {
    use wasm_bindgen::JsValue;
    use web_sys::console;

    let message = JsValue::from_str(&format!("[orthotree] {args}"));
    match level {
        Level::Debug => console::debug_1(&message),
        Level::Info => console::log_1(&message),
        Level::Warn => console::warn_1(&message),
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[inline]
pub(crate) fn write(_level: Level, _args: std::fmt::Arguments<'_>) {}

macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::log::write($crate::log::Level::Debug, format_args!($($arg)*))
    };
}

macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::log::write($crate::log::Level::Info, format_args!($($arg)*))
    };
}

macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::log::write($crate::log::Level::Warn, format_args!($($arg)*))
    };
}

pub(crate) use {log_debug, log_info, log_warn};
