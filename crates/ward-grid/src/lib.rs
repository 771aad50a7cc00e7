// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod delegate;
pub mod formats;
pub mod source;
pub mod transpose;

pub use delegate::*;
pub use formats::*;
pub use source::*;
pub use transpose::*;
