// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! revgraph library
//!
//! This module exports the command-line front end of revgraph for use in
//! integration tests and as a library.

pub mod browse;
pub mod config;
pub mod render;
