// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Heliora.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Heliora Invoice Text Extractor
//!
//! Turns the raw text of one utility invoice (already converted from its
//! original document by an external collaborator) into a structured
//! [`heliora_types::Invoice`].
//!
//! The extractor is a cascade of independent, order-sensitive pattern
//! rules with explicit fallbacks. A single missing or malformed field
//! degrades to zero/empty instead of failing; only a missing account
//! code, billing year, or month name makes the whole document unusable.
//! Same input text always yields the same output.

pub mod extractor;
pub mod numeric;
pub mod rules;

pub use extractor::{ExtractError, MandatoryField, extract_invoice};
pub use numeric::normalize_number;
