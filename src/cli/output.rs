//! User-facing CLI output.
//!
//! Everything the CLI prints goes through here, so colour handling and
//! layout stay consistent between commands. Writers are generic over
//! `WriteColor` so tests can render into a `termcolor::Buffer`.

use std::io;

use termcolor::{Color, ColorSpec, WriteColor};

use crate::bindings::{BindingMatch, ExpressionType, StepInstance, StepMatchError};
use crate::pickles::{Pickle, PickleStepArgument};
use crate::syntax::{Diagnostic, SyntaxElement, SyntaxNode};

// ============================================================================
// SYNTAX TREES
// ============================================================================

/// Prints `node` and everything below it, one element per line.
pub fn write_tree<W: WriteColor>(out: &mut W, node: &SyntaxNode) -> io::Result<()> {
    write_node(out, node, 0)
}

fn write_node<W: WriteColor>(out: &mut W, node: &SyntaxNode, depth: usize) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
    writeln!(out, "{:indent$}{node:?}", "", indent = depth * 2)?;
    out.reset()?;
    for child in node.children() {
        match child {
            SyntaxElement::Node(inner) => write_node(out, &inner, depth + 1)?,
            SyntaxElement::Token(token) => {
                if token.is_missing() {
                    out.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
                }
                writeln!(out, "{:indent$}{token:?}", "", indent = (depth + 1) * 2)?;
                out.reset()?;
            }
        }
    }
    Ok(())
}

// ============================================================================
// DIAGNOSTICS
// ============================================================================

pub fn write_diagnostic<W: WriteColor>(out: &mut W, diagnostic: &Diagnostic) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
    writeln!(out, "{diagnostic}")?;
    out.reset()
}

pub fn write_check_summary<W: WriteColor>(out: &mut W, files: usize, errors: usize) -> io::Result<()> {
    let color = if errors == 0 { Color::Green } else { Color::Red };
    out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
    writeln!(out, "Checked {files} file(s): {errors} diagnostic(s)")?;
    out.reset()
}

// ============================================================================
// PICKLES
// ============================================================================

pub fn write_pickles<W: WriteColor>(out: &mut W, pickles: &[Pickle]) -> io::Result<()> {
    for pickle in pickles {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true))?;
        write!(out, "{} ", pickle.id)?;
        out.reset()?;
        write!(out, "{}", pickle.name)?;
        if !pickle.tags.is_empty() {
            write!(out, " [{}]", pickle.tags.join(" "))?;
        }
        writeln!(out)?;
        for step in &pickle.steps {
            writeln!(out, "  {}{} ({:?})", step.keyword, step.text, step.keyword_type)?;
            match &step.argument {
                Some(PickleStepArgument::DataTable { rows }) => {
                    for row in rows {
                        writeln!(out, "    | {} |", row.join(" | "))?;
                    }
                }
                Some(PickleStepArgument::DocString { content, .. }) => {
                    for line in content.lines() {
                        writeln!(out, "    {line}")?;
                    }
                }
                None => {}
            }
        }
    }
    Ok(())
}

// ============================================================================
// BINDINGS
// ============================================================================

pub fn write_classification<W: WriteColor>(
    out: &mut W,
    pattern: &str,
    expression_type: ExpressionType,
) -> io::Result<()> {
    writeln!(out, "{expression_type}\t{pattern}")
}

pub fn write_bound<W: WriteColor>(out: &mut W, step: &StepInstance, found: &BindingMatch) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
    write!(out, "bound      ")?;
    out.reset()?;
    let arguments: Vec<String> = found.arguments().iter().map(|a| a.value.to_string()).collect();
    writeln!(
        out,
        "{} -> {} [{}]",
        step.description(),
        found.binding().method(),
        arguments.join(", ")
    )
}

pub fn write_unbound<W: WriteColor>(out: &mut W, error: &StepMatchError) -> io::Result<()> {
    let (label, color) = match error {
        StepMatchError::Undefined { .. } => ("undefined  ", Color::Yellow),
        StepMatchError::Ambiguous { .. } => ("ambiguous  ", Color::Red),
    };
    out.set_color(ColorSpec::new().set_fg(Some(color)))?;
    write!(out, "{label}")?;
    out.reset()?;
    writeln!(out, "{error}")
}

pub fn write_snippet<W: WriteColor>(out: &mut W, snippet: &str) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_dimmed(true))?;
    for line in snippet.lines() {
        writeln!(out, "    {line}")?;
    }
    out.reset()
}

pub fn write_match_summary<W: WriteColor>(
    out: &mut W,
    bound: usize,
    undefined: usize,
    ambiguous: usize,
) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_bold(true))?;
    writeln!(out, "{bound} bound, {undefined} undefined, {ambiguous} ambiguous")?;
    out.reset()
}
