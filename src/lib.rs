//! Shop Checkout - E-commerce checkout backend
//!
//! Turns a storefront purchase into a persisted order with reserved stock
//! and a Stripe payment intent, and reconciles the order with the
//! processor's webhooks.

pub mod adapters;
pub mod application;
pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod ports;
