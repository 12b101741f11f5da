//! Remote data gateway: the hosted relational store (Supabase REST), the
//! consultant/improvement webhooks, and the lead change feed.

pub mod changes;
pub mod supabase;
pub mod webhooks;
