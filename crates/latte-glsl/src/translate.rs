//! Translation driver: walks the control flow program and dispatches every instruction to
//! its emitter.

use latte_isa::disasm::{alu_inst_text, cf_line, fetch_inst_text};
use latte_isa::{
    decode_alu_clause, decode_fetch_clause, disassemble, read_words, AluFlags, AluGroup, AluInst,
    AluOpcode, AluUnit, CfAluInst, CfCond, CfInst, CfInstType, CfOpcode, ControlFlowInst,
    FetchInst, TexFetchInst, TexInst,
};

use crate::descriptor::{
    Export, Feedback, SamplerUsage, ShaderDescriptor, TranslatedShader, MAX_SAMPLERS,
    MAX_STREAMS, MAX_UNIFORM_BLOCKS,
};
use crate::error::{Result, TranslateError, TranslateErrorKind};
use crate::writer::GlslWriter;
use crate::{cf, exp, header, op2, op3, reduction, tex};

pub(crate) type CfFn = fn(&mut State<'_>, &ControlFlowInst) -> Result<()>;
pub(crate) type AluFn = fn(&mut State<'_>, &ControlFlowInst, &AluInst) -> Result<()>;
pub(crate) type ReductionFn = fn(&mut State<'_>, &ControlFlowInst, &[AluInst; 4]) -> Result<()>;
pub(crate) type TexFn = fn(&mut State<'_>, &ControlFlowInst, &TexFetchInst) -> Result<()>;

/// An open `LOOP_START*` awaiting its `LOOP_END`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LoopState {
    pub start_pc: usize,
    /// Address the loop start jumps to when no invocation enters the loop.
    pub end_pc: u32,
}

pub(crate) struct State<'a> {
    pub desc: &'a ShaderDescriptor,
    pub words: &'a [u32],
    pub out: GlslWriter,

    pub cf_pc: usize,
    /// Running index of ALU groups and fetch instructions, shared by every clause.
    pub group_pc: usize,
    pub unit: AluUnit,
    pub literals: Vec<u32>,
    /// Register writes deferred until the current ALU group has read all its operands.
    pub post_group_writes: Vec<String>,
    pub loop_stack: Vec<LoopState>,

    pub sampler_usage: [SamplerUsage; MAX_SAMPLERS],
    pub used_uniform_blocks: [bool; MAX_UNIFORM_BLOCKS],
    pub exports: Vec<Export>,
    pub feedbacks: [Vec<Feedback>; MAX_STREAMS],
    pub uses_discard: bool,
    pub calls_fetch_shader: bool,
}

impl<'a> State<'a> {
    fn new(desc: &'a ShaderDescriptor, words: &'a [u32]) -> Self {
        Self {
            desc,
            words,
            out: GlslWriter::new(),
            cf_pc: 0,
            group_pc: 0,
            unit: AluUnit::X,
            literals: Vec::new(),
            post_group_writes: Vec::new(),
            loop_stack: Vec::new(),
            sampler_usage: [SamplerUsage::Unused; MAX_SAMPLERS],
            used_uniform_blocks: [false; MAX_UNIFORM_BLOCKS],
            exports: Vec::new(),
            feedbacks: Default::default(),
            uses_discard: false,
            calls_fetch_shader: false,
        }
    }

    fn run(&mut self) -> Result<()> {
        let words = self.words;
        for pair in words.chunks_exact(2) {
            let inst = ControlFlowInst::new(pair[0], pair[1]);
            match inst.inst_type() {
                CfInstType::Normal => self.translate_normal(&inst)?,
                CfInstType::Export => self.translate_export(&inst)?,
                CfInstType::Alu | CfInstType::AluExtended => self.translate_alu_clause(&inst)?,
            }

            if inst.end_of_program() {
                break;
            }
            self.cf_pc += 1;
        }

        if let Some(open) = self.loop_stack.last() {
            return Err(TranslateErrorKind::UnclosedLoop(open.start_pc));
        }
        Ok(())
    }

    pub fn comment(&mut self, text: &str) {
        self.out.line(&format!("// {text}"));
    }

    fn unsupported_cf(inst: &ControlFlowInst) -> TranslateErrorKind {
        let name = inst
            .opcode()
            .map_or_else(|| format!("CF_INST_{}", inst.raw_opcode()), |op| op.name().to_owned());
        TranslateErrorKind::UnsupportedControlFlow(name)
    }

    fn translate_normal(&mut self, inst: &ControlFlowInst) -> Result<()> {
        let op = match inst.opcode() {
            Some(CfOpcode::Normal(op)) => op,
            _ => return Err(Self::unsupported_cf(inst)),
        };
        if op == CfInst::Tex {
            return self.translate_tex_clause(inst);
        }

        let func = cf::lookup(op).ok_or_else(|| Self::unsupported_cf(inst))?;
        self.comment(&cf_line(self.cf_pc, inst));
        func(self, inst)?;
        self.out.blank();
        Ok(())
    }

    fn translate_export(&mut self, inst: &ControlFlowInst) -> Result<()> {
        let func = match inst.opcode() {
            Some(CfOpcode::Export(op)) => exp::lookup(op),
            _ => None,
        }
        .ok_or_else(|| {
            let name = inst
                .opcode()
                .map_or_else(|| format!("CF_INST_{}", inst.raw_opcode()), |op| op.name().to_owned());
            TranslateErrorKind::UnsupportedExport(name)
        })?;

        self.comment(&cf_line(self.cf_pc, inst));
        func(self, inst)?;
        self.out.blank();
        Ok(())
    }

    fn translate_alu_clause(&mut self, inst: &ControlFlowInst) -> Result<()> {
        let op = match inst.opcode() {
            Some(CfOpcode::Alu(op)) => op,
            _ => return Err(Self::unsupported_cf(inst)),
        };

        self.comment(&cf_line(self.cf_pc, inst));
        if op == CfAluInst::AluPushBefore {
            cf::push(self);
        }

        let groups = decode_alu_clause(self.words, inst.alu_word0().addr(), inst.alu_clause_slots())?;
        tracing::debug!(
            cf_pc = self.cf_pc,
            clause = %op,
            groups = groups.len(),
            "translating ALU clause"
        );

        cf::cond_start(self, CfCond::Active);
        for group in &groups {
            self.translate_alu_group(inst, group)?;
        }
        cf::cond_end(self);

        match op {
            CfAluInst::AluPopAfter => cf::pop(self, 1),
            CfAluInst::AluPop2After => cf::pop(self, 2),
            CfAluInst::AluElseAfter => cf::insert_else(self),
            CfAluInst::AluBreak => cf::deactivate_unless_predicate(self, "InactiveBreak"),
            CfAluInst::AluContinue => cf::deactivate_unless_predicate(self, "InactiveContinue"),
            CfAluInst::Alu | CfAluInst::AluExt | CfAluInst::AluPushBefore => {}
        }
        self.out.blank();
        Ok(())
    }

    fn translate_alu_group(&mut self, cf: &ControlFlowInst, group: &AluGroup) -> Result<()> {
        self.literals.clone_from(&group.literals);

        let mut reduction_done = false;
        let mut update_pv = false;
        let mut update_ps = false;

        for (inst, &unit) in group.insts.iter().zip(&group.units) {
            self.unit = unit;

            if inst.flags().contains(AluFlags::REDUCTION) {
                if !reduction_done {
                    reduction::translate_group(self, cf, group)?;
                    reduction_done = true;
                }
                update_pv = true;
                continue;
            }

            let func = match inst.opcode() {
                Some(AluOpcode::Op2(op)) => op2::lookup(op),
                Some(AluOpcode::Op3(op)) => op3::lookup(op),
                None => None,
            }
            .ok_or_else(|| TranslateErrorKind::UnsupportedAlu(inst.opcode_name()))?;

            if unit.is_vector() {
                update_pv = true;
            } else {
                update_ps = true;
            }

            let text = alu_inst_text(self.group_pc, unit, inst, &self.literals);
            self.comment(&format!("{:02} {text}", self.group_pc));
            func(self, cf, inst)?;
        }

        self.comment(&format!("{:02} --", self.group_pc));
        for write in std::mem::take(&mut self.post_group_writes) {
            self.out.line(&write);
        }
        if update_pv {
            self.out.line("PV = PVo;");
        }
        if update_ps {
            self.out.line("PS = PSo;");
        }
        self.out.blank();

        self.group_pc += 1;
        Ok(())
    }

    fn translate_tex_clause(&mut self, inst: &ControlFlowInst) -> Result<()> {
        self.comment(&cf_line(self.cf_pc, inst));

        let fetches = decode_fetch_clause(
            self.words,
            inst.word0().addr(),
            inst.fetch_clause_len(),
            false,
        )?;
        tracing::debug!(cf_pc = self.cf_pc, fetches = fetches.len(), "translating TEX clause");

        cf::cond_start(self, inst.cond());
        for fetch in &fetches {
            let tex = match fetch {
                FetchInst::Tex(tex) => tex,
                FetchInst::Vtx(_) => return Err(TranslateErrorKind::UnsupportedVertexFetch),
            };

            let func = TexInst::from_raw(tex.word0.tex_inst())
                .and_then(tex::lookup)
                .ok_or_else(|| {
                    let name = TexInst::from_raw(tex.word0.tex_inst()).map_or_else(
                        || format!("TEX_INST_{}", tex.word0.tex_inst()),
                        |op| op.name().to_owned(),
                    );
                    TranslateErrorKind::UnsupportedTexture(name)
                })?;

            self.comment(&format!("{:02} {}", self.group_pc, fetch_inst_text(fetch)));
            func(self, inst, tex)?;
            self.group_pc += 1;
        }
        cf::cond_end(self);
        self.out.blank();
        Ok(())
    }
}

/// Translates a shader binary into GLSL 4.50.
///
/// `binary` holds the control flow program followed by the clauses it references, as laid
/// out by the assembler or handed over by the command processor. The result is either a
/// complete translation or an error carrying the program's disassembly.
pub fn translate(desc: &ShaderDescriptor, binary: &[u8]) -> std::result::Result<TranslatedShader, TranslateError> {
    let words = read_words(binary).map_err(|err| failure(binary, 0, err.into()))?;

    let mut state = State::new(desc, &words);
    if let Err(kind) = state.run() {
        return Err(failure(binary, state.cf_pc, kind));
    }

    let State {
        out,
        sampler_usage,
        used_uniform_blocks,
        exports,
        feedbacks,
        uses_discard,
        calls_fetch_shader,
        ..
    } = state;

    let mut shader = TranslatedShader {
        stage: desc.stage,
        sampler_dims: desc.sampler_dims,
        sampler_usage,
        used_uniform_blocks,
        exports,
        feedbacks,
        uses_discard,
        calls_fetch_shader,
        file_header: String::new(),
        code_header: String::new(),
        code_body: out.finish(),
    };
    shader.file_header = header::file_header(desc, &shader);
    shader.code_header = header::code_header(&shader);

    tracing::debug!(
        stage = ?desc.stage,
        exports = shader.exports.len(),
        uses_discard = shader.uses_discard,
        "translated shader"
    );
    Ok(shader)
}

fn failure(binary: &[u8], cf_pc: usize, kind: TranslateErrorKind) -> TranslateError {
    let disassembly = match disassemble(binary) {
        Ok(text) => text,
        Err(err) => err.to_string(),
    };
    TranslateError {
        kind,
        cf_pc,
        disassembly,
    }
}
