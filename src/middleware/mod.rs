// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (client cookie, route guard, security headers).

pub mod client;
pub mod guard;
pub mod security;

pub use client::attach_client;
pub use guard::route_guard;
