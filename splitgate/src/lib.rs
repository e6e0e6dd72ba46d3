// Copyright 2026 The Splitgate Project
// SPDX-License-Identifier: Apache-2.0

pub mod client;
pub mod config;
pub mod message;
pub mod mock_upstream;
pub mod proxy;
pub mod session;
pub mod stream;
pub mod upstream;
