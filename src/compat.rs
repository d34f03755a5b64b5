/// Compatibility layer for `std`/`no_std`
#[cfg(feature = "std")]
pub use std::{
    borrow::Cow,
    format,
    rc::Rc,
    string::{String, ToString},
    vec,
    vec::Vec,
};

#[cfg(not(feature = "std"))]
pub use alloc::{
    borrow::Cow,
    format,
    rc::Rc,
    string::{String, ToString},
    vec,
    vec::Vec,
};
