//! Lowering of expanded ugenic graphs to the SCgf synth-definition format.
//!
//! [`lower`] turns a finished [`UGenGraph`](ugenic_core::UGenGraph) into an
//! `SCgf` version 2 buffer. [`plan_load`] decides, from the buffer length and
//! where the engine runs, whether the buffer can travel inline in a control
//! message.
//!
//! # Example
//!
//! ```rust
//! use ugenic_core::{GE, Rate, SynthGraph};
//! use ugenic_registry::ProductRegistry;
//! use ugenic_synthdef::{Destination, LoadPlan, lower};
//!
//! let registry = ProductRegistry::standard();
//! let osc = registry.create("SinOsc", Some(Rate::Audio), vec![GE::from(440.0)]).unwrap();
//! let out = registry.create("Out", Some(Rate::Audio), vec![GE::from(0.0), osc]).unwrap();
//! let graph = SynthGraph::new(vec![out]).expand().unwrap();
//!
//! let def = lower("sine", &graph).unwrap();
//! assert_eq!(&def.bytes()[..4], b"SCgf");
//! assert_eq!(def.load_plan(Destination::Local), LoadPlan::Inline);
//! ```

pub mod error;
pub mod lower;
pub mod plan;

pub use error::SynthDefError;
pub use lower::{HEADER_LEN, MAGIC, SynthDef, VERSION, encode_defs, lower, write_def, write_defs};
pub use plan::{Destination, INLINE_LIMIT, LoadPlan, plan_load};

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use ugenic_core::UGenGraph;

/// Writes a `.scsyndef` file holding every definition in `defs`.
pub fn save_defs(path: &Path, defs: &[(&str, &UGenGraph)]) -> Result<(), SynthDefError> {
    let file = File::create(path).map_err(|e| SynthDefError::write_file(path, e))?;
    let mut writer = BufWriter::new(file);
    write_defs(&mut writer, defs)?;
    writer
        .flush()
        .map_err(|e| SynthDefError::write_file(path, e))?;
    tracing::info!(path = %path.display(), defs = defs.len(), "wrote synth definitions");
    Ok(())
}
