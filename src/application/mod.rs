//! Application layer orchestrating the domain through its ports.
//!
//! `ClinicDiscovery` ranks facilities from two tiers of sources,
//! `CheckoutService` and `PaymentReconciler` drive the payment intent
//! lifecycle, and `LocationProvider` wraps the platform positioning service.

pub mod checkout;
pub mod discovery;
pub mod location;
pub mod reconciler;
