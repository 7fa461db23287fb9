// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Heliora.

// Integration test crate; see tests/.
