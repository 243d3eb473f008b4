// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - backend access and session handling.

pub mod auth;
pub mod backend;
pub mod memory;
pub mod session;
pub mod supabase;

pub use auth::AuthGateway;
pub use backend::Backend;
pub use memory::MemoryBackend;
pub use session::SessionContext;
pub use supabase::SupabaseClient;
