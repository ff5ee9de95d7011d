// This file is the module declaration file for the `builders` module.
// It declares and makes public all the sub-modules within the `src/builders`
// directory. These modules hold the building blocks the engine is put
// together from.

// `directives` module:
// Classifies a single line as a `#pragma once` guard, an `#include`
// directive (quoted or angle-bracketed) or a plain line. Matching is purely
// textual and line-anchored.
pub mod directives;

// `preamble` module:
// Loads the optional preamble template once per run and substitutes the
// `@PROJECT@`, `@VERSION@` and `@URL@` placeholders.
pub mod preamble;

// `reporter` module:
// Collects per-root results into a `RunReport` and prints it through the
// `StatusReporter` trait.
pub mod reporter;

// `resolver` module:
// Maps an include path onto the first matching file of the ordered
// search directories.
pub mod resolver;

// `validator` module:
// Rejects malformed invocations (no inputs, missing files, outputs that
// would overwrite inputs) before any file is read.
pub mod validator;

// `writer` module:
// Computes output destinations (fan-out directories or a sibling file) and
// writes the rendered amalgamation through an `OutputSink`.
pub mod writer;
