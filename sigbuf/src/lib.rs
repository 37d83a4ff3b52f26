// Copyright 2023 Strixpyrr
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Buffers for signal processing pipelines.
//!
//! ## How it works
//!
//! All data lives in *raw storage*: a window of bytes into a heap allocation
//! shared between every view cloned or derived from it. Storage is reference
//! counted; the allocation is freed when the last view over it is dropped.
//! Storage can also wrap memory owned by the caller, in which case it's never
//! counted or freed. Subviews narrow the window without copying, so a block of
//! samples can be handed down a pipeline in pieces for free.
//!
//! A [`TypedView`] reads its storage as a sequence of plain-old-data elements,
//! like integers, floats, or complex samples, and adds norms and scalar
//! arithmetic over them.
//!
//! A [`RingBuffer`] is a fixed-capacity byte queue over one allocation. Data is
//! pushed at the write position and pulled from the read cursor, both wrapping
//! around the end of the allocation. Pushes never grow the buffer; they fail
//! when the data doesn't fit. Cloning a ring buffer shares its memory, which is
//! copied on the first write to either clone. [`TypedRingBuffer`] does the same
//! in whole elements.
//!
//! Storage isn't thread-safe. Views and ring buffers are neither `Send` nor
//! `Sync`, so each pipeline stage owning them stays on one thread.
//!
//! ## Diagnostics
//!
//! Allocation events are logged at trace and debug levels through the [`log`]
//! facade. The [`logging`] module has an explicit [`Logger`](logging::Logger)
//! for leveled, human-facing messages.

mod element;
mod error;
pub mod logging;
mod options;
mod raw;
mod ring;
mod typed;
mod typed_ring;

pub use element::*;
pub use error::*;
pub use options::*;
pub use raw::RawStorage;
pub use ring::RingBuffer;
pub use typed::{Iter, TypedView};
pub use typed_ring::TypedRingBuffer;
