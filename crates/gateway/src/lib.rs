//! Outbound integrations: the Stripe billing API, Stripe webhook
//! verification, and the natural-language query parser.
//!
//! - [`stripe`] -- [`stripe::StripeClient`], the billing gateway port over Stripe's REST API.
//! - [`webhook`] -- `Stripe-Signature` verification and event decoding.
//! - [`nlp`] -- [`nlp::NlpClient`], the NLP service port over HTTP.

pub mod nlp;
pub mod stripe;
pub mod webhook;
