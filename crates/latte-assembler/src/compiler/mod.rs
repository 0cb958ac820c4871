//! Lowering of the syntax tree to instruction words.
//!
//! Statements are compiled in source order. Each category has its own module; this one
//! owns the shared state (program counters, pending clauses) and property parsing.

mod alu;
mod cf;
mod exp;
mod link;
mod tex;

use latte_isa::ControlFlowInst;

use crate::ast::{Comment, Property, Statement};
use crate::error::{AssemblyError, SemanticError, SourceLocation};
use crate::program::{CompiledProgram, ExportUsage};

pub(crate) type Result<T> = std::result::Result<T, AssemblyError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ClauseKind {
    Alu,
    Fetch,
}

/// A clause value written in the source, kept for verification once linking computes it.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Annotation {
    pub value: u32,
    pub location: SourceLocation,
}

/// A clause whose address is not known until every clause has been laid out.
#[derive(Debug, Clone)]
pub(crate) struct PendingClause {
    pub kind: ClauseKind,
    pub cf_index: usize,
    /// Offset and length in words within the clause data of this kind.
    pub offset: usize,
    pub size: usize,
    pub addr: Option<Annotation>,
    pub count: Option<Annotation>,
    pub location: SourceLocation,
}

#[derive(Default)]
pub(crate) struct Compiler {
    cf_pc: u32,
    clause_pc: u32,
    cf_insts: Vec<ControlFlowInst>,
    clauses: Vec<PendingClause>,
    alu_data: Vec<u32>,
    tex_data: Vec<u32>,
    comments: Vec<Comment>,
    exports: ExportUsage,
    ended: bool,
}

impl Compiler {
    pub fn compile(mut self, statements: Vec<Statement>) -> Result<CompiledProgram> {
        for statement in statements {
            self.statement(statement)?;
        }

        link::mark_end_of_program(&mut self.cf_insts);
        let layout = link::link(&mut self.cf_insts, &self.clauses, &self.alu_data)?;

        tracing::debug!(
            cf_insts = self.cf_insts.len(),
            alu_words = self.alu_data.len(),
            tex_words = self.tex_data.len(),
            alu_base = layout.alu_base,
            tex_base = layout.tex_base,
            "assembled program"
        );

        Ok(CompiledProgram {
            cf_insts: self.cf_insts,
            alu_clause_base_address: layout.alu_base,
            alu_clause_data: self.alu_data,
            tex_clause_base_address: layout.tex_base,
            tex_clause_data: self.tex_data,
            comments: self.comments,
            exports: self.exports,
        })
    }

    fn statement(&mut self, statement: Statement) -> Result<()> {
        if let Statement::Comment(comment) = statement {
            self.comments.push(comment);
            return Ok(());
        }

        if self.ended {
            let location = match &statement {
                Statement::Cf(s) => s.location,
                Statement::Export(s) => s.location,
                Statement::AluClause(s) => s.location,
                Statement::TexClause(s) => s.location,
                Statement::EndOfProgram(location) => *location,
                Statement::Comment(c) => c.location,
            };
            return Err(AssemblyError::semantic(location, SemanticError::InstructionAfterEnd));
        }

        match statement {
            Statement::Cf(s) => self.cf_inst(&s),
            Statement::Export(s) => self.exp_inst(&s),
            Statement::AluClause(s) => self.alu_clause(s),
            Statement::TexClause(s) => self.tex_clause(s),
            Statement::EndOfProgram(_) => {
                self.ended = true;
                Ok(())
            }
            Statement::Comment(_) => Ok(()),
        }
    }

    /// Checks the `NN` prefix of a control flow line and appends the instruction.
    fn push_cf(&mut self, index: u32, location: SourceLocation, inst: ControlFlowInst) -> Result<usize> {
        self.check_cf_pc(index, location)?;
        self.cf_insts.push(inst);
        self.cf_pc += 1;
        Ok(self.cf_insts.len() - 1)
    }

    fn check_cf_pc(&self, index: u32, location: SourceLocation) -> Result<()> {
        if index != self.cf_pc {
            return Err(AssemblyError::semantic(
                location,
                SemanticError::CfPcMismatch {
                    expected: self.cf_pc,
                    found: index,
                },
            ));
        }
        Ok(())
    }

    fn next_clause_pc(&mut self, index: u32, location: SourceLocation) -> Result<()> {
        if index != self.clause_pc {
            return Err(AssemblyError::semantic(
                location,
                SemanticError::ClausePcMismatch {
                    expected: self.clause_pc,
                    found: index,
                },
            ));
        }
        self.clause_pc += 1;
        Ok(())
    }
}

fn semantic(location: SourceLocation, kind: SemanticError) -> AssemblyError {
    AssemblyError::semantic(location, kind)
}

pub(crate) fn unknown_property(prop: &Property, opcode: &str) -> AssemblyError {
    semantic(
        prop.location,
        SemanticError::UnknownProperty {
            property: prop.name.clone(),
            opcode: opcode.to_owned(),
        },
    )
}

pub(crate) fn invalid_value(prop: &Property) -> AssemblyError {
    semantic(
        prop.location,
        SemanticError::InvalidPropertyValue {
            property: prop.name.clone(),
            value: prop.value.clone().unwrap_or_default(),
        },
    )
}

pub(crate) fn out_of_range(location: SourceLocation, what: &'static str, value: i64, max: i64) -> AssemblyError {
    semantic(location, SemanticError::OutOfRange { what, value, max })
}

/// The text inside `NAME(...)`.
pub(crate) fn prop_text(prop: &Property) -> Result<&str> {
    match prop.value.as_deref() {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(semantic(
            prop.location,
            SemanticError::MissingPropertyValue(prop.name.clone()),
        )),
    }
}

/// Parses a decimal or `0x` hexadecimal integer.
pub(crate) fn parse_integer(text: &str) -> Option<i64> {
    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let value = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<i64>().ok()?,
    };
    Some(if negative { -value } else { value })
}

/// An unsigned property value no larger than `max`.
pub(crate) fn prop_number(prop: &Property, max: u32) -> Result<u32> {
    let value = parse_integer(prop_text(prop)?).ok_or_else(|| invalid_value(prop))?;
    if value < 0 || value > i64::from(max) {
        return Err(out_of_range(prop.location, property_what(prop), value, i64::from(max)));
    }
    Ok(value as u32)
}

pub(crate) fn prop_float(prop: &Property) -> Result<f32> {
    let text = prop_text(prop)?;
    text.trim_end_matches('f')
        .parse::<f32>()
        .map_err(|_| invalid_value(prop))
}

/// Resolves a property value through an enum's `from_name`.
pub(crate) fn prop_enum<T>(prop: &Property, from_name: impl Fn(&str) -> Option<T>) -> Result<T> {
    from_name(prop_text(prop)?).ok_or_else(|| invalid_value(prop))
}

fn property_what(prop: &Property) -> &'static str {
    match prop.name.as_str() {
        "ADDR" => "address",
        "CNT" => "count",
        "CF_CONST" => "CF constant",
        "POP_CNT" => "pop count",
        "CALL_CNT" => "call count",
        "BURSTCNT" => "burst count",
        "ELEM_SIZE" => "element size",
        "ARRAY_SIZE" => "array size",
        "OFFSET" => "fetch offset",
        "MEGA" => "mega fetch count",
        _ => "property value",
    }
}

/// Rejects a register index above `max`.
pub(crate) fn check_index(location: SourceLocation, what: &'static str, value: u32, max: u32) -> Result<u32> {
    if value > max {
        return Err(out_of_range(location, what, i64::from(value), i64::from(max)));
    }
    Ok(value)
}
