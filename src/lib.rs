//! Single-file amalgamation of C and C++ sources.
//!
//! Every locally resolvable `#include` of a root file is replaced by the
//! recursive expansion of the included file, `#pragma once` guards are
//! commented out, and an optional templated preamble is put on top.
pub mod builders;
pub mod core;
pub mod utils;
