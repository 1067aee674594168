//! Audio encoding parameter resolution.
//!
//! A read-only [`catalog::Catalog`] describes codecs, their encoders, and each
//! encoder's rate-control modes and detail parameters. The [`resolver`]
//! derives the option lists a selection makes available and reports the
//! corrections an out-of-date selection needs; [`form::AudioForm`] applies
//! them, runs the reset cascade, and signals an [`form::ApplySink`] such as
//! [`command::ArgsPreview`].

pub mod catalog;
pub mod command;
pub mod config;
pub mod form;
pub mod logging;
pub mod resolver;
pub mod selection;
