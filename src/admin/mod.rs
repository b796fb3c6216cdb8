//! Remote admin data service proxy.
//!
//! Tenant records and their credentials live behind a remote CRUD service;
//! this module is the client side of that boundary. All operations go through
//! a single action envelope (`listClients`, `createClient`, `updateClient`,
//! `deleteClient`) so the service stays a plain pass-through.

mod client;

pub use client::{AdminClient, AdminError, ClientRecord, ClientUpdate, NewClient};
