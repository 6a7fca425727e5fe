//! Core policy logic for Sentra.
//!
//! This crate contains pure policy logic with ZERO web or database dependencies.
//! All domain types, condition evaluation, and state-machine transitions live here.
//!
//! # Modules
//!
//! - `condition` - Declarative condition evaluation over transaction contexts
//! - `workflow` - Approval workflows, trigger matching, and the request state machine
//! - `monitoring` - Rule-based transaction monitoring and alert classification

pub mod condition;
pub mod monitoring;
pub mod workflow;
