//! Text rendering of harness descriptors.
//!
//! This is the only place C++ text is produced. A rendered template holds
//! exactly one [`MARKER`] where the user's source is spliced in.

use super::{HarnessDescriptor, HarnessKind, InputProtocol, PRINTLN};
use std::fmt;

/// Substitution point for the user's source.
pub const MARKER: &str = "[REPLACEME]";

/// Every driver ends by printing this prefix followed by `wain`'s result.
pub const TRAILER_PREFIX: &str = "wain returned ";

/// Which pipeline consumes the rendered unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Compiled by the native C++ compiler; the template carries the driver.
    Native,
    /// Compiled by the course compiler; the simulator front-end is the
    /// driver, so the template is the marker alone.
    Simulator,
}

/// Rendered harness text with a single substitution marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessTemplate {
    kind: HarnessKind,
    target: Target,
    text: String,
}

impl HarnessTemplate {
    /// Render the native C++ driver for a descriptor.
    pub fn native(descriptor: &HarnessDescriptor) -> Self {
        Self {
            kind: descriptor.kind,
            target: Target::Native,
            text: NativeDriver(descriptor).to_string(),
        }
    }

    /// Pass-through template for the simulated pipeline.
    pub fn simulator(kind: HarnessKind) -> Self {
        Self {
            kind,
            target: Target::Simulator,
            text: MARKER.to_string(),
        }
    }

    /// Build a template from raw text. The marker is not checked here;
    /// injection reports a missing one.
    pub fn from_text(kind: HarnessKind, target: Target, text: impl Into<String>) -> Self {
        Self {
            kind,
            target,
            text: text.into(),
        }
    }

    pub fn kind(&self) -> HarnessKind {
        self.kind
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Byte offset of the substitution marker.
    pub fn marker_offset(&self) -> Option<usize> {
        self.text.find(MARKER)
    }
}

struct NativeDriver<'a>(&'a HarnessDescriptor);

impl fmt::Display for NativeDriver<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let desc = self.0;
        writeln!(f)?;
        writeln!(f, "{};", desc.entry)?;
        writeln!(f, "{PRINTLN};")?;
        writeln!(f, "#define NULL 0")?;
        writeln!(f)?;
        writeln!(f, "{MARKER}")?;
        writeln!(f)?;
        writeln!(f, "#include <stdlib.h>")?;
        writeln!(f, "#include <stdio.h>")?;
        writeln!(f, "int main(int argc, char** argv) {{")?;

        // Prompts go to stderr so stdout only carries program output.
        match desc.protocol {
            InputProtocol::Scalars { prompts } => {
                write_scalar_reads(f, desc.entry.name, prompts, false)?;
            }
            InputProtocol::Steps { prompts } => {
                write_scalar_reads(f, desc.entry.name, prompts, true)?;
            }
            InputProtocol::Array {
                length_prompt,
                element_prompt,
            } => {
                writeln!(f, "  int l, c;")?;
                writeln!(f, "  int* a;")?;
                writeln!(f, "  fprintf(stderr, \"{length_prompt}\");")?;
                writeln!(f, "  scanf(\"%d\", &l);")?;
                writeln!(f, "  a = (int*) malloc(l*sizeof(int));")?;
                writeln!(f, "  for(int i = 0; i < l; i++) {{")?;
                writeln!(f, "    fprintf(stderr, \"{element_prompt}%d: \", i);")?;
                writeln!(f, "    scanf(\"%d\", a+i);")?;
                writeln!(f, "  }}")?;
                writeln!(f, "  c = {}(a, l);", desc.entry.name)?;
            }
            InputProtocol::PassThrough => {
                writeln!(f, "  int c;")?;
                writeln!(f, "  c = {}(0, 0);", desc.entry.name)?;
            }
        }

        writeln!(f, "  printf(\"{TRAILER_PREFIX}%d\\n\", c);")?;
        writeln!(f, "  return 0;")?;
        writeln!(f, "}}")?;
        writeln!(f, "void {}(int x) {{", PRINTLN.name)?;
        writeln!(f, "  printf(\"%d\\n\", x);")?;
        write!(f, "}}")
    }
}

const SCALAR_NAMES: [&str; 2] = ["a", "b"];

fn write_scalar_reads(
    f: &mut fmt::Formatter<'_>,
    entry: &str,
    prompts: &[&str],
    stepwise: bool,
) -> fmt::Result {
    let names = &SCALAR_NAMES[..prompts.len()];
    writeln!(f, "  int {}, c;", names.join(", "))?;
    for (prompt, name) in prompts.iter().zip(names) {
        writeln!(f, "  fprintf(stderr, \"{prompt}\");")?;
        if stepwise {
            writeln!(f, "  fflush(stderr);")?;
        }
        writeln!(f, "  scanf(\"%d\", &{name});")?;
        if stepwise {
            writeln!(f, "  fflush(stdout);")?;
        }
    }
    writeln!(f, "  c = {entry}({});", names.join(", "))
}
