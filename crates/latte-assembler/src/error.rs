use std::fmt;

use thiserror::Error;

/// 1-based position of a token in the assembly source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Failure to assemble a program. Displays as `line:column: message`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssemblyError {
    #[error("{location}: {message}")]
    Parse {
        location: SourceLocation,
        message: String,
    },
    #[error("{location}: {kind}")]
    Semantic {
        location: SourceLocation,
        kind: SemanticError,
    },
}

impl AssemblyError {
    pub fn location(&self) -> SourceLocation {
        match self {
            Self::Parse { location, .. } | Self::Semantic { location, .. } => *location,
        }
    }

    /// The error text without its location prefix.
    pub fn message(&self) -> String {
        match self {
            Self::Parse { message, .. } => message.clone(),
            Self::Semantic { kind, .. } => kind.to_string(),
        }
    }

    pub(crate) fn semantic(location: SourceLocation, kind: SemanticError) -> Self {
        Self::Semantic { location, kind }
    }
}

/// A well-formed statement that cannot be encoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemanticError {
    #[error("unknown control flow instruction {0}")]
    UnknownCfInstruction(String),
    #[error("unknown export instruction {0}")]
    UnknownExportInstruction(String),
    #[error("unknown ALU clause instruction {0}")]
    UnknownAluClauseInstruction(String),
    #[error("unknown fetch clause instruction {0}")]
    UnknownTexClauseInstruction(String),
    #[error("unknown ALU instruction {0}")]
    UnknownAluInstruction(String),
    #[error("unknown texture fetch instruction {0}")]
    UnknownTexInstruction(String),
    #[error("unknown vertex fetch instruction {0}")]
    UnknownVtxInstruction(String),
    #[error("unknown property {property} on {opcode}")]
    UnknownProperty { property: String, opcode: String },
    #[error("invalid value {value:?} for property {property}")]
    InvalidPropertyValue { property: String, value: String },
    #[error("property {0} requires a value")]
    MissingPropertyValue(String),
    #[error("control flow index {found} does not match expected {expected}")]
    CfPcMismatch { expected: u32, found: u32 },
    #[error("clause index {found} does not match expected {expected}")]
    ClausePcMismatch { expected: u32, found: u32 },
    #[error("ADDR({specified}) does not match computed address {computed}")]
    AddrMismatch { computed: u32, specified: u32 },
    #[error("CNT({specified}) does not match computed count {computed}")]
    CountMismatch { computed: u32, specified: u32 },
    #[error("ALU unit {unit} is already used in this group")]
    UnitConflict { unit: char },
    #[error("instruction declared on unit {declared} executes on unit {decoded}")]
    UnitMismatch { declared: char, decoded: char },
    #[error("PV{found}/PS{found} does not refer to the previous group {expected}")]
    PreviousGroupMismatch { expected: u32, found: u32 },
    #[error("ALU group uses more than 4 literals")]
    TooManyLiterals,
    #[error("ALU group has more than 5 instructions")]
    TooManyInstructions,
    #[error("{opcode} takes {expected} source operands, found {found}")]
    OperandCount {
        opcode: String,
        expected: usize,
        found: usize,
    },
    #[error("{what} {value} is out of range (max {max})")]
    OutOfRange { what: &'static str, value: i64, max: i64 },
    #[error("write mask ____ is only valid on an OP2 instruction")]
    WriteMaskOnOp3,
    #[error("output modifier is only valid on an OP2 instruction")]
    OmodOnOp3,
    #[error("source {0} cannot take an absolute value modifier")]
    AbsNotEncodable(usize),
    #[error("instruction mixes relative addressing modes {first} and {second}")]
    RelIndexConflict { first: String, second: String },
    #[error("invalid kcache range {0:?}, expected CBbank:start-end")]
    InvalidKcache(String),
    #[error("clause has no instructions")]
    EmptyClause,
    #[error("clause has {count} instructions, at most {max} fit")]
    ClauseTooLarge { count: usize, max: usize },
    #[error("{0}")]
    InvalidOperand(String),
    #[error("invalid export target for {0}")]
    InvalidExportTarget(String),
    #[error("instruction after END_OF_PROGRAM")]
    InstructionAfterEnd,
}
