//! Load planning for lowered definitions.
//!
//! A control message can carry a definition inline only up to a fixed size.
//! Larger definitions go through an out-of-band load path, which exists only
//! when the engine shares a filesystem with the sender.

use serde::{Deserialize, Serialize};

use crate::lower::SynthDef;

/// Largest definition, in bytes, sent inline in a control message.
pub const INLINE_LIMIT: usize = 65535 / 4;

/// Where the engine receiving the definition runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    /// Same host; out-of-band loading is available.
    #[default]
    Local,
    /// Another host; only the inline path exists.
    Remote,
}

/// How a definition should be sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoadPlan {
    /// Fits in one control message.
    Inline,
    /// Too large to inline; write it out and load it from disk.
    OutOfBand,
    /// Too large to inline, but no other path exists. Send it anyway.
    InlineWithWarning,
}

impl LoadPlan {
    /// True when the buffer travels inside the control message.
    pub fn is_inline(self) -> bool {
        !matches!(self, LoadPlan::OutOfBand)
    }

    /// True for definitions over [`INLINE_LIMIT`].
    pub fn is_large(self) -> bool {
        !matches!(self, LoadPlan::Inline)
    }
}

/// Chooses how to send a definition of `byte_len` bytes to `destination`.
pub fn plan_load(byte_len: usize, destination: Destination) -> LoadPlan {
    match (byte_len <= INLINE_LIMIT, destination) {
        (true, _) => LoadPlan::Inline,
        (false, Destination::Local) => LoadPlan::OutOfBand,
        (false, Destination::Remote) => LoadPlan::InlineWithWarning,
    }
}

impl SynthDef {
    /// Plans the load of this definition, warning when an oversized
    /// definition has to be sent inline.
    pub fn load_plan(&self, destination: Destination) -> LoadPlan {
        let plan = plan_load(self.byte_len(), destination);
        if plan == LoadPlan::InlineWithWarning {
            tracing::warn!(
                name = self.name(),
                bytes = self.byte_len(),
                limit = INLINE_LIMIT,
                "definition exceeds the inline limit and the destination is remote; sending inline"
            );
        }
        plan
    }
}
