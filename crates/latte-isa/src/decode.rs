use crate::enums::{AluSource, AluUnit, CfInstType};
use crate::inst::{preferred_unit, AluInst, ControlFlowInst, FetchInst};
use crate::opcodes::AluFlags;

/// Maximum number of instructions in one ALU group.
pub const MAX_GROUP_INSTS: usize = 5;

/// Maximum number of literal constants in one ALU group.
pub const MAX_GROUP_LITERALS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    pub word_index: usize,
    pub message: String,
}

impl DecodeError {
    pub fn new(word_index: usize, message: impl Into<String>) -> Self {
        Self {
            word_index,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Latte decode error at word {}: {}",
            self.word_index, self.message
        )
    }
}

impl std::error::Error for DecodeError {}

/// Splits a little-endian byte buffer into instruction words.
pub fn read_words(binary: &[u8]) -> Result<Vec<u32>, DecodeError> {
    if binary.len() % 4 != 0 {
        return Err(DecodeError::new(
            binary.len() / 4,
            format!("binary length {} is not a multiple of 4", binary.len()),
        ));
    }

    Ok(binary
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Reads control flow instructions from the start of `words` up to and including the
/// first NORMAL/EXPORT instruction flagged end-of-program, or until the buffer runs out.
pub fn decode_cf_program(words: &[u32]) -> Vec<ControlFlowInst> {
    let mut insts = Vec::new();
    for pair in words.chunks_exact(2) {
        let inst = ControlFlowInst::new(pair[0], pair[1]);
        insts.push(inst);
        if inst.end_of_program() {
            break;
        }
    }
    insts
}

/// Tracks which units of an ALU group are occupied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AluGroupUnits {
    used: [bool; 5],
}

impl AluGroupUnits {
    /// Assigns a unit to the next instruction of the group, or returns `None` when the
    /// unit it needs is already taken.
    ///
    /// Transcendental-only opcodes always take T. Vector-only opcodes always take their
    /// destination channel. Everything else takes the destination channel unless it is
    /// occupied, in which case it spills into T.
    pub fn add(&mut self, inst: &AluInst) -> Option<AluUnit> {
        let flags = inst.flags();
        let mut unit = preferred_unit(inst);

        let vector_only =
            flags.contains(AluFlags::VECTOR) && !flags.contains(AluFlags::TRANSCENDENTAL);
        if unit != AluUnit::T && !vector_only && self.used[unit.index()] {
            unit = AluUnit::T;
        }

        if self.used[unit.index()] {
            return None;
        }

        self.used[unit.index()] = true;
        Some(unit)
    }

    pub fn is_used(&self, unit: AluUnit) -> bool {
        self.used[unit.index()]
    }
}

/// One VLIW bundle of an ALU clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AluGroup {
    /// 64-bit slot index of the first instruction.
    pub slot: usize,
    pub insts: Vec<AluInst>,
    pub units: Vec<AluUnit>,
    pub literals: Vec<u32>,
    /// 64-bit slot index following the group's literal pool.
    pub next_slot: usize,
}

impl AluGroup {
    /// Decodes the group starting at 64-bit slot `slot` of `words`.
    pub fn decode(words: &[u32], slot: usize) -> Result<Self, DecodeError> {
        let mut insts = Vec::new();
        let mut units = Vec::new();
        let mut group_units = AluGroupUnits::default();
        let mut literal_count = 0usize;

        loop {
            let index = (slot + insts.len()) * 2;
            let (Some(&word0), Some(&word1)) = (words.get(index), words.get(index + 1)) else {
                return Err(DecodeError::new(index, "ALU group runs past end of binary"));
            };
            let inst = AluInst::new(word0, word1);

            for src in 0..inst.num_srcs() {
                let operand = inst.src(src);
                if operand.source() == AluSource::Literal {
                    literal_count = literal_count.max(operand.chan.index() + 1);
                }
            }

            let unit = group_units.add(&inst).ok_or_else(|| {
                DecodeError::new(
                    index,
                    format!(
                        "ALU group has no free unit for {} writing channel {}",
                        inst.opcode_name(),
                        inst.dst_chan().as_char()
                    ),
                )
            })?;

            insts.push(inst);
            units.push(unit);

            if inst.last() {
                break;
            }
            if insts.len() == MAX_GROUP_INSTS {
                return Err(DecodeError::new(
                    index,
                    "ALU group has more than 5 instructions without LAST",
                ));
            }
        }

        let literal_slot = slot + insts.len();
        let literal_index = literal_slot * 2;
        let literals = words
            .get(literal_index..literal_index + literal_count)
            .ok_or_else(|| DecodeError::new(literal_index, "ALU literals run past end of binary"))?
            .to_vec();

        Ok(Self {
            slot,
            insts,
            units,
            literals,
            next_slot: literal_slot + (literal_count + 1) / 2,
        })
    }

    pub fn literal(&self, index: usize) -> Option<u32> {
        self.literals.get(index).copied()
    }
}

/// Decodes the ALU clause of `count` 64-bit slots starting at slot `addr`.
pub fn decode_alu_clause(words: &[u32], addr: u32, count: u32) -> Result<Vec<AluGroup>, DecodeError> {
    let end = (addr + count) as usize;
    let mut slot = addr as usize;
    let mut groups = Vec::new();

    while slot < end {
        let group = AluGroup::decode(words, slot)?;
        slot = group.next_slot;
        groups.push(group);
    }

    tracing::trace!(addr, count, groups = groups.len(), "decoded ALU clause");
    Ok(groups)
}

/// Decodes `count` fetch instructions starting at 64-bit slot `addr`.
pub fn decode_fetch_clause(
    words: &[u32],
    addr: u32,
    count: u32,
    vertex_clause: bool,
) -> Result<Vec<FetchInst>, DecodeError> {
    (0..count as usize)
        .map(|i| {
            let index = addr as usize * 2 + i * FetchInst::WORDS;
            match words.get(index..index + 3) {
                Some(w) => Ok(FetchInst::from_words([w[0], w[1], w[2]], vertex_clause)),
                None => Err(DecodeError::new(index, "fetch clause runs past end of binary")),
            }
        })
        .collect()
}

/// Clause referenced by a control flow instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    None,
    Alu(Vec<AluGroup>),
    Fetch(Vec<FetchInst>),
}

/// Decodes the clause a control flow instruction points at, if any.
pub fn decode_clause(words: &[u32], cf: &ControlFlowInst) -> Result<Clause, DecodeError> {
    use crate::inst::CfOpcode;
    use crate::opcodes::CfInst;

    match (cf.inst_type(), cf.opcode()) {
        (CfInstType::Alu | CfInstType::AluExtended, _) => Ok(Clause::Alu(decode_alu_clause(
            words,
            cf.alu_word0().addr(),
            cf.alu_clause_slots(),
        )?)),
        (CfInstType::Normal, Some(CfOpcode::Normal(op @ (CfInst::Tex | CfInst::Vtx | CfInst::VtxTc)))) => {
            Ok(Clause::Fetch(decode_fetch_clause(
                words,
                cf.word0().addr(),
                cf.fetch_clause_len(),
                op != CfInst::Tex,
            )?))
        }
        _ => Ok(Clause::None),
    }
}
