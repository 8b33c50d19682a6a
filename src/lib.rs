//! # padview Library
//!
//! Visualize live game-controller input received over a serial link.
//!
//! This library provides the core pipeline: per-family mapping tables, the
//! wire frame decoder, the skin descriptor parser and catalog scanner, and
//! the serial device session. Host shells (a desktop window, a
//! video-compositor plugin) implement the traits in [`scene`] and drive
//! [`viewer::InputViewer::tick`] from their own event loop.

pub mod config;
pub mod error;
pub mod mapping;
pub mod skin;
pub mod scene;
pub mod decoder;
pub mod serial;
pub mod viewer;
pub mod ports;
