//! Error types for graph construction and the graph codec.

use thiserror::Error;

use crate::graph::UGenId;
use crate::rate::Rate;

/// Errors raised while constructing graph elements or expanding them into nodes.
///
/// Every variant aborts the construction in progress; no partial graph is
/// returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// An input arrives at a rate the consuming node cannot take and no
    /// upsampling adapter applies.
    #[error("incompatible rates: {ugen} at {node_rate} rate cannot take {input_rate}-rate input '{arg}'")]
    IncompatibleRates {
        /// Name of the consuming operator.
        ugen: String,
        /// Name of the offending argument.
        arg: String,
        /// Rate the consuming node runs at.
        node_rate: Rate,
        /// Rate of the offending input.
        input_rate: Rate,
    },

    /// The operator cannot run at the requested rate.
    #[error("{ugen} does not support {rate} rate")]
    UnsupportedRate {
        /// Operator name.
        ugen: String,
        /// Requested rate.
        rate: Rate,
    },

    /// The operator takes a caller-chosen rate but none was given.
    #[error("{ugen} needs an explicit rate")]
    MissingRate {
        /// Operator name.
        ugen: String,
    },

    /// More arguments were supplied than the operator declares.
    #[error("{ugen} takes at most {expected} arguments, got {actual}")]
    ArgumentCount {
        /// Operator name.
        ugen: String,
        /// Declared argument count.
        expected: usize,
        /// Supplied argument count.
        actual: usize,
    },

    /// A trailing argument was omitted and has no default.
    #[error("{ugen}: argument '{arg}' has no value and no default")]
    MissingArgument {
        /// Operator name.
        ugen: String,
        /// Argument name.
        arg: String,
    },

    /// A fixed (non-expanding) argument was given something other than a constant.
    #[error("{ugen}: argument '{arg}' must be a constant")]
    NonConstantArgument {
        /// Operator name.
        ugen: String,
        /// Argument name.
        arg: String,
    },

    /// A channel-count argument is not a whole number of outputs in range.
    #[error("{ugen}: argument '{arg}' is not a valid channel count: {value}")]
    InvalidChannelCount {
        /// Operator name.
        ugen: String,
        /// Argument name.
        arg: String,
        /// The value given.
        value: f32,
    },

    /// An operator selector id is not known.
    #[error("unknown {kind} operator selector {selector}")]
    UnknownSelector {
        /// `"unary"` or `"binary"`.
        kind: &'static str,
        /// The selector id.
        selector: i32,
    },

    /// A channel selection index is negative or too large.
    #[error("channel index {0} is out of range")]
    InvalidChannelIndex(i32),

    /// A control was declared without default values.
    #[error("control '{0}' has no values")]
    EmptyControl(String),

    /// Two controls of one graph share a name.
    #[error("duplicate control name '{0}'")]
    DuplicateControl(String),

    /// A control would start past the largest offset a node can carry.
    #[error("control '{control}' starts at parameter offset {offset}, past the 32767 limit")]
    ParameterTableFull {
        /// Control name.
        control: String,
        /// Offset of its first value.
        offset: usize,
    },

    /// A node input does not refer to an output of an earlier node.
    #[error("node {node} input {input} is dangling: {reason}")]
    DanglingInput {
        /// The node holding the input.
        node: UGenId,
        /// Position of the input.
        input: usize,
        /// What is wrong with the reference.
        reason: String,
    },
}

impl GraphError {
    /// Create an incompatible rates error.
    pub fn incompatible_rates(
        ugen: impl Into<String>,
        arg: impl Into<String>,
        node_rate: Rate,
        input_rate: Rate,
    ) -> Self {
        GraphError::IncompatibleRates {
            ugen: ugen.into(),
            arg: arg.into(),
            node_rate,
            input_rate,
        }
    }

    /// Create an unsupported rate error.
    pub fn unsupported_rate(ugen: impl Into<String>, rate: Rate) -> Self {
        GraphError::UnsupportedRate {
            ugen: ugen.into(),
            rate,
        }
    }
}

/// Errors raised by the graph codec.
///
/// Decoding is all-or-nothing: any error discards everything read so far.
#[derive(Debug, Error)]
pub enum SerialError {
    /// A type key is not registered with the resolver.
    #[error("unknown product type: {0}")]
    UnknownType(String),

    /// A reader was handed a field count its type does not have, or did not
    /// consume exactly the declared count.
    #[error("arity mismatch for {key}: expected {expected}, found {actual}")]
    ArityMismatch {
        /// Type key of the product being read.
        key: String,
        /// Field count the type expects.
        expected: usize,
        /// Field count found.
        actual: usize,
    },

    /// The stream holds a tag that is not valid at this position.
    #[error("unexpected tag {found:#04x} at offset {offset}, expected {expected}")]
    UnexpectedTag {
        /// The tag byte read.
        found: u8,
        /// Byte offset of the tag.
        offset: u64,
        /// What the reader was looking for.
        expected: &'static str,
    },

    /// A back-reference points past the products decoded so far.
    #[error("back-reference {index} out of range ({available} products decoded)")]
    InvalidBackReference {
        /// The referenced index.
        index: u32,
        /// Number of products available.
        available: usize,
    },

    /// A rate field holds an unknown id.
    #[error("invalid rate id {0}")]
    InvalidRate(u8),

    /// A string is longer than its 16-bit length prefix allows.
    #[error("string of {0} bytes exceeds the 65535-byte limit")]
    StringTooLong(usize),

    /// A product has more fields than its 16-bit arity allows.
    #[error("{key} has {arity} fields, more than the 65535 allowed")]
    ArityOverflow {
        /// Type key of the product.
        key: String,
        /// Field count.
        arity: usize,
    },

    /// Sequences and products nest deeper than the decoder allows.
    #[error("nesting deeper than {limit} levels at offset {offset}")]
    TooDeep {
        /// The nesting limit.
        limit: usize,
        /// Byte offset of the value that passed the limit.
        offset: u64,
    },

    /// Bytes remain after the encoded value.
    #[error("{0} trailing bytes after the encoded value")]
    TrailingBytes(usize),

    /// A string field is not valid UTF-8.
    #[error("invalid UTF-8 in string field: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// A reader rebuilt fields that its type rejects.
    #[error("invalid {key} product: {source}")]
    InvalidProduct {
        /// Type key of the product.
        key: String,
        /// Why construction failed.
        #[source]
        source: GraphError,
    },

    /// The underlying stream failed or ended early.
    #[error("stream error: {0}")]
    Io(#[from] std::io::Error),
}

impl SerialError {
    /// Create an arity mismatch error.
    pub fn arity_mismatch(key: impl Into<String>, expected: usize, actual: usize) -> Self {
        SerialError::ArityMismatch {
            key: key.into(),
            expected,
            actual,
        }
    }

    /// Create an invalid product error.
    pub fn invalid_product(key: impl Into<String>, source: GraphError) -> Self {
        SerialError::InvalidProduct {
            key: key.into(),
            source,
        }
    }
}
