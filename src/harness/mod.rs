//! Harness template library.
//!
//! A harness is the wrapper program around the user's entry point (`wain`):
//! it fixes the entry-point signature, acquires the inputs, calls `wain` and
//! reports the result with a `wain returned <value>` trailer. Each
//! [`HarnessKind`] is described by a typed [`HarnessDescriptor`]; the C++
//! driver text is only produced at the end, by [`template`].
//!
//! # Kinds
//!
//! - `TwoInts` - `int wain(int, int)`, two prompted integers
//! - `Array` - `int wain(int*, int)`, prompted length then each element
//! - `Stepper` - `int wain(int, int)`, one prompted value per step
//! - `Stdin` - `int wain(int, int)`, no prompts, stdin left to the program

pub mod inject;
pub mod template;

use crate::core::error::HarnessError;
use std::fmt;
use std::str::FromStr;

pub use inject::{inject, TranslationUnit};
pub use template::{HarnessTemplate, Target, MARKER, TRAILER_PREFIX};

/// Calling-convention shape of the program under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HarnessKind {
    TwoInts,
    Array,
    Stepper,
    Stdin,
}

impl HarnessKind {
    pub const ALL: [HarnessKind; 4] = [
        HarnessKind::TwoInts,
        HarnessKind::Array,
        HarnessKind::Stepper,
        HarnessKind::Stdin,
    ];

    /// Command-line selector for this kind.
    pub fn selector(self) -> &'static str {
        match self {
            HarnessKind::TwoInts => "--twoints",
            HarnessKind::Array => "--array",
            HarnessKind::Stepper => "--stepper",
            HarnessKind::Stdin => "--stdin",
        }
    }

    pub fn descriptor(self) -> &'static HarnessDescriptor {
        match self {
            HarnessKind::TwoInts => &TWO_INTS,
            HarnessKind::Array => &ARRAY,
            HarnessKind::Stepper => &STEPPER,
            HarnessKind::Stdin => &STDIN,
        }
    }

    /// Native driver template for this kind.
    pub fn template(self) -> HarnessTemplate {
        HarnessTemplate::native(self.descriptor())
    }
}

impl fmt::Display for HarnessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.selector()[2..])
    }
}

impl FromStr for HarnessKind {
    type Err = HarnessError;

    /// Accepts the selector with or without its leading dashes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.strip_prefix("--").unwrap_or(s);
        HarnessKind::ALL
            .into_iter()
            .find(|kind| kind.selector()[2..] == *name)
            .ok_or_else(|| HarnessError::UnknownHarnessKind(s.to_string()))
    }
}

/// Parameter and return types an entry point may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Int,
    IntPtr,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Int => f.write_str("int"),
            ValueType::IntPtr => f.write_str("int*"),
        }
    }
}

/// Signature of a routine the harness declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub name: &'static str,
    pub params: &'static [ValueType],
    /// `None` for `void`.
    pub returns: Option<ValueType>,
}

impl fmt::Display for Signature {
    /// Renders the C prototype without the trailing semicolon.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.returns {
            Some(ty) => write!(f, "{ty} {}(", self.name)?,
            None => write!(f, "void {}(", self.name)?,
        }
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}")?;
        }
        f.write_str(")")
    }
}

/// Output primitive available to every injected program.
pub const PRINTLN: Signature = Signature {
    name: "println",
    params: &[ValueType::Int],
    returns: None,
};

/// How the driver acquires the entry point's inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputProtocol {
    /// One prompted integer per parameter, read all at once.
    Scalars { prompts: &'static [&'static str] },
    /// One prompted integer per parameter, flushing output between steps.
    Steps { prompts: &'static [&'static str] },
    /// Prompted length, then one prompted value per element.
    Array {
        length_prompt: &'static str,
        element_prompt: &'static str,
    },
    /// No prompts; standard input belongs to the program.
    PassThrough,
}

impl InputProtocol {
    /// Number of prompts issued before the entry point is called, given the
    /// array length for `Array` (ignored otherwise).
    pub fn prompt_count(&self, array_len: usize) -> usize {
        match self {
            InputProtocol::Scalars { prompts } | InputProtocol::Steps { prompts } => prompts.len(),
            InputProtocol::Array { .. } => 1 + array_len,
            InputProtocol::PassThrough => 0,
        }
    }
}

/// Typed description of one harness shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarnessDescriptor {
    pub kind: HarnessKind,
    pub entry: Signature,
    pub protocol: InputProtocol,
}

const TWO_INT_PROMPTS: &[&str] = &["Enter first integer: ", "Enter second integer: "];

const WAIN_TWO_INTS: Signature = Signature {
    name: "wain",
    params: &[ValueType::Int, ValueType::Int],
    returns: Some(ValueType::Int),
};

static TWO_INTS: HarnessDescriptor = HarnessDescriptor {
    kind: HarnessKind::TwoInts,
    entry: WAIN_TWO_INTS,
    protocol: InputProtocol::Scalars {
        prompts: TWO_INT_PROMPTS,
    },
};

static ARRAY: HarnessDescriptor = HarnessDescriptor {
    kind: HarnessKind::Array,
    entry: Signature {
        name: "wain",
        params: &[ValueType::IntPtr, ValueType::Int],
        returns: Some(ValueType::Int),
    },
    protocol: InputProtocol::Array {
        length_prompt: "Enter length of array: ",
        element_prompt: "Enter value of array element ",
    },
};

static STEPPER: HarnessDescriptor = HarnessDescriptor {
    kind: HarnessKind::Stepper,
    entry: WAIN_TWO_INTS,
    protocol: InputProtocol::Steps {
        prompts: TWO_INT_PROMPTS,
    },
};

static STDIN: HarnessDescriptor = HarnessDescriptor {
    kind: HarnessKind::Stdin,
    entry: WAIN_TWO_INTS,
    protocol: InputProtocol::PassThrough,
};
