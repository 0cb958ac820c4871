//! Text rendering of Latte binaries.
//!
//! The output uses the same syntax the assembler accepts, so a disassembly can be fed back
//! into the assembler and produce the original words.

use std::fmt::Write as _;

use crate::decode::{decode_cf_program, decode_clause, read_words, AluGroup, Clause, DecodeError};
use crate::enums::{
    AluSource, AluUnit, CfCond, CfInstType, DataFormat, EndianSwap, ExportType, IndexMode,
    KcacheMode, MemExportType, NumFormat, PredSel, ScalarBankSwizzle, Sel,
    SrfMode, VecBankSwizzle, VtxFetchType, EXPORT_POSITION_BASE,
};
use crate::inst::{AluInst, AluOperand, CfOpcode, ControlFlowInst, FetchInst, TexFetchInst, VtxFetchInst};
use crate::opcodes::{CfInst, TexInst, VtxInst};

pub fn disassemble(binary: &[u8]) -> Result<String, DecodeError> {
    let words = read_words(binary)?;
    disassemble_words(&words)
}

pub fn disassemble_words(words: &[u32]) -> Result<String, DecodeError> {
    let mut out = String::new();
    let mut clause_pc = 0usize;

    for (cf_pc, cf) in decode_cf_program(words).iter().enumerate() {
        let _ = writeln!(out, "{}", cf_line(cf_pc, cf));

        match decode_clause(words, cf)? {
            Clause::Alu(groups) => {
                for group in &groups {
                    out.push_str(&alu_group_text(clause_pc, group));
                    clause_pc += 1;
                }
            }
            Clause::Fetch(insts) => {
                for inst in &insts {
                    let _ = writeln!(out, "      {clause_pc:<4}{}", fetch_inst_text(inst));
                    clause_pc += 1;
                }
            }
            Clause::None => {}
        }

        if cf.end_of_program() {
            out.push_str("END_OF_PROGRAM\n");
        }
    }

    Ok(out)
}

fn cf_props_common(cf: &ControlFlowInst, props: &mut Vec<String>) {
    let word1 = cf.word1();
    if cf.cond() != CfCond::Active {
        props.push(format!("CND({})", cf.cond()));
    }
    if word1.cf_const() != 0 {
        props.push(format!("CF_CONST({})", word1.cf_const()));
    }
    if word1.pop_count() != 0 {
        props.push(format!("POP_CNT({})", word1.pop_count()));
    }
    if word1.call_count() != 0 {
        props.push(format!("CALL_CNT({})", word1.call_count()));
    }
}

fn cf_flags(barrier: bool, whole_quad_mode: bool, valid_pixel_mode: Option<bool>, props: &mut Vec<String>) {
    if !barrier {
        props.push("NO_BARRIER".to_owned());
    }
    if whole_quad_mode {
        props.push("WHOLE_QUAD_MODE".to_owned());
    }
    if valid_pixel_mode == Some(true) {
        props.push("VALID_PIX".to_owned());
    }
}

fn join_line(head: String, props: &[String]) -> String {
    let mut line = head;
    for prop in props {
        line.push(' ');
        line.push_str(prop);
    }
    line
}

/// Renders one control flow instruction, without its clause.
pub fn cf_line(cf_pc: usize, cf: &ControlFlowInst) -> String {
    let name = match cf.opcode() {
        Some(op) => op.name().to_owned(),
        None => format!("CF_INST_{}", cf.raw_opcode()),
    };

    match cf.inst_type() {
        CfInstType::Normal => {
            let word1 = cf.word1();
            let mut props = Vec::new();
            let is_fetch = matches!(
                cf.opcode(),
                Some(CfOpcode::Normal(CfInst::Tex | CfInst::Vtx | CfInst::VtxTc))
            );
            if is_fetch {
                props.push(format!("ADDR({})", cf.word0().addr()));
                props.push(format!("CNT({})", cf.fetch_clause_len()));
            } else if cf.word0().addr() != 0 {
                props.push(format!("ADDR({})", cf.word0().addr()));
            }
            cf_props_common(cf, &mut props);
            cf_flags(
                word1.barrier(),
                word1.whole_quad_mode(),
                Some(word1.valid_pixel_mode()),
                &mut props,
            );
            join_line(format!("{cf_pc:02} {name}:"), &props)
        }
        CfInstType::Export => exp_line(cf_pc, &name, cf),
        CfInstType::Alu | CfInstType::AluExtended => {
            let word0 = cf.alu_word0();
            let word1 = cf.alu_word1();
            let mut props = vec![
                format!("ADDR({})", word0.addr()),
                format!("CNT({})", cf.alu_clause_slots()),
            ];
            for (index, bank, mode, addr) in [
                (0, word0.kcache_bank0(), word0.kcache_mode0(), word1.kcache_addr0()),
                (1, word0.kcache_bank1(), word1.kcache_mode1(), word1.kcache_addr1()),
            ] {
                let mode = KcacheMode::from_raw(mode).unwrap_or(KcacheMode::Nop);
                if mode == KcacheMode::Nop {
                    continue;
                }
                let start = addr * 16;
                let size = mode.window_size().unwrap_or(16);
                props.push(format!("KCACHE{index}(CB{bank}:{start}-{})", start + size - 1));
            }
            cf_flags(word1.barrier(), word1.whole_quad_mode(), None, &mut props);
            if word1.alt_const() {
                props.push("USES_WATERFALL".to_owned());
            }
            join_line(format!("{cf_pc:02} {name}:"), &props)
        }
    }
}

fn exp_line(cf_pc: usize, name: &str, cf: &ControlFlowInst) -> String {
    let word0 = cf.exp_word0();
    let rel = if word0.rw_rel() { "[AL]" } else { "" };
    let is_memory = match cf.opcode() {
        Some(CfOpcode::Export(op)) => op.is_memory(),
        _ => false,
    };

    let mut props = Vec::new();
    let head = if is_memory {
        let word1 = cf.exp_buf_word1();
        let mask: String = (0..4)
            .map(|i| if word1.comp_mask() & (1 << i) != 0 { ['x', 'y', 'z', 'w'][i] } else { '_' })
            .collect();
        let target = MemExportType::from_raw(word0.export_type()).map_or("WRITE", MemExportType::name);
        props.push(format!("ARRAY_SIZE({})", word1.array_size()));
        props.push(format!("ELEM_SIZE({})", word0.elem_size()));
        if word1.burst_count() != 0 {
            props.push(format!("BURSTCNT({})", word1.burst_count()));
        }
        cf_flags(word1.barrier(), word1.whole_quad_mode(), Some(word1.valid_pixel_mode()), &mut props);
        format!(
            "{cf_pc:02} {name}: {target}({}), R{}{rel}.{mask}",
            word0.array_base(),
            word0.rw_gpr()
        )
    } else {
        let word1 = cf.exp_swiz_word1();
        let base = word0.array_base();
        let target = match ExportType::from_raw(word0.export_type()) {
            Some(ExportType::Position) => format!("POS{}", base.wrapping_sub(EXPORT_POSITION_BASE)),
            Some(ExportType::Parameter) => format!("PARAM{base}"),
            _ => format!("PIX{base}"),
        };
        let swizzle: String = (0..4).map(|i| Sel::char_for_raw(word1.sel(i))).collect();
        if word1.burst_count() != 0 {
            props.push(format!("BURSTCNT({})", word1.burst_count()));
        }
        if word0.elem_size() != 0 {
            props.push(format!("ELEM_SIZE({})", word0.elem_size()));
        }
        cf_flags(word1.barrier(), word1.whole_quad_mode(), Some(word1.valid_pixel_mode()), &mut props);
        format!("{cf_pc:02} {name}: {target}, R{}{rel}.{swizzle}", word0.rw_gpr())
    };

    join_line(head, &props)
}

/// Renders every instruction of an ALU group, one per line.
pub fn alu_group_text(group_pc: usize, group: &AluGroup) -> String {
    let mut out = String::new();
    for (i, (inst, unit)) in group.insts.iter().zip(&group.units).enumerate() {
        let text = alu_inst_text(group_pc, *unit, inst, &group.literals);
        if i == 0 {
            let _ = writeln!(out, "      {group_pc:<4}{text}");
        } else {
            let _ = writeln!(out, "          {text}");
        }
    }
    out
}

fn rel_suffix(rel: bool, index_mode: Option<IndexMode>) -> String {
    match (rel, index_mode) {
        (true, Some(mode @ (IndexMode::ArX | IndexMode::ArY | IndexMode::ArZ | IndexMode::ArW | IndexMode::Loop))) => {
            format!("[{}]", mode.name())
        }
        _ => String::new(),
    }
}

/// Renders one ALU source operand.
pub fn alu_src_text(group_pc: usize, inst: &AluInst, operand: &AluOperand, literals: &[u32]) -> String {
    let chan = operand.chan.as_char();
    let rel = rel_suffix(operand.rel, inst.index_mode());
    let previous = group_pc.saturating_sub(1);

    let mut text = match operand.source() {
        AluSource::Gpr(index) => format!("R{index}{rel}.{chan}"),
        AluSource::Kcache0(index) => format!("KC0[{index}]{rel}.{chan}"),
        AluSource::Kcache1(index) => format!("KC1[{index}]{rel}.{chan}"),
        AluSource::ConstFile(index) => format!("C{index}{rel}.{chan}"),
        AluSource::PrevVector => format!("PV{previous}.{chan}"),
        AluSource::PrevScalar => format!("PS{previous}"),
        AluSource::Literal => {
            let value = literals.get(operand.chan.index()).copied().unwrap_or(0);
            format!("(0x{value:08X}, {})", format_f32(f32::from_bits(value)))
        }
        AluSource::Imm0 => "0.0f".to_owned(),
        AluSource::Imm1 => "1.0f".to_owned(),
        AluSource::Imm05 => "0.5f".to_owned(),
        AluSource::Imm1Int => "1".to_owned(),
        AluSource::ImmM1Int => "-1".to_owned(),
        AluSource::OneDoubleLow
        | AluSource::OneDoubleHigh
        | AluSource::HalfDoubleLow
        | AluSource::HalfDoubleHigh
        | AluSource::Reserved(_) => format!("SRC{}", operand.sel),
    };

    if operand.abs {
        text = format!("|{text}|");
    }
    if operand.neg {
        text = format!("-{text}");
    }
    text
}

/// Renders one ALU instruction as `unit: OPCODE dst, srcs PROPS`.
pub fn alu_inst_text(group_pc: usize, unit: AluUnit, inst: &AluInst, literals: &[u32]) -> String {
    let mut name = inst.opcode_name();
    name.push_str(inst.omod().name());

    let mut line = format!("{}: {name:<15}", unit.as_char());

    let num_srcs = inst.num_srcs();
    if inst.write_mask() || num_srcs > 0 {
        if inst.write_mask() {
            let rel = rel_suffix(inst.dst_rel(), inst.index_mode());
            let _ = write!(line, "R{}{rel}.{}", inst.dst_gpr(), inst.dst_chan().as_char());
        } else {
            line.push_str("____");
        }
        for src in 0..num_srcs {
            let _ = write!(line, ", {}", alu_src_text(group_pc, inst, &inst.src(src), literals));
        }
    }
    let mut line = line.trim_end().to_owned();

    let mut props = Vec::new();
    if inst.bank_swizzle() != 0 {
        let swizzle = if unit == AluUnit::T {
            ScalarBankSwizzle::from_raw(inst.bank_swizzle()).map(ScalarBankSwizzle::name)
        } else {
            VecBankSwizzle::from_raw(inst.bank_swizzle()).map(VecBankSwizzle::name)
        };
        if let Some(swizzle) = swizzle {
            props.push(swizzle.to_owned());
        }
    }
    if inst.update_execute_mask() {
        props.push("UPDATE_EXEC_MASK".to_owned());
    }
    if inst.update_pred() {
        props.push("UPDATE_PRED".to_owned());
    }
    match inst.pred_sel() {
        Some(sel @ (PredSel::Zero | PredSel::One)) => props.push(sel.name().to_owned()),
        _ => {}
    }
    if inst.clamp() {
        props.push("CLAMP".to_owned());
    }

    for prop in props {
        line.push(' ');
        line.push_str(&prop);
    }
    line
}

fn sign_extend(value: u32, bits: u32) -> i32 {
    let shift = 32 - bits;
    ((value << shift) as i32) >> shift
}

/// Texture LOD bias, a signed 1.3.3 fixed point value.
pub fn lod_bias_value(raw: u32) -> f32 {
    sign_extend(raw, 7) as f32 / 8.0
}

/// Texel offset, a signed 1.3.1 fixed point value.
pub fn texel_offset_value(raw: u32) -> f32 {
    sign_extend(raw, 5) as f32 / 2.0
}

fn tex_inst_text(inst: &TexFetchInst) -> String {
    let (w0, w1, w2) = (inst.word0, inst.word1, inst.word2);
    let name = TexInst::from_raw(w0.tex_inst())
        .map_or_else(|| format!("TEX_INST_{}", w0.tex_inst()), |op| op.name().to_owned());
    let dst_rel = if w1.dst_rel() { "[AL]" } else { "" };
    let src_rel = if w0.src_rel() { "[AL]" } else { "" };
    let dst_swizzle: String = (0..4).map(|i| Sel::char_for_raw(w1.dst_sel(i))).collect();
    let src_swizzle: String = (0..4).map(|i| Sel::char_for_raw(w2.src_sel(i))).collect();

    let mut props = Vec::new();
    if w0.alt_const() {
        props.push("ALT_CONST".to_owned());
    }
    if w0.bc_frac_mode() {
        props.push("BC_FRAC_MODE".to_owned());
    }
    let denorm: String = (0..4)
        .filter(|&i| !w1.coord_normalized(i))
        .map(|i| ['x', 'y', 'z', 'w'][i])
        .collect();
    if !denorm.is_empty() {
        props.push(format!("DENORM({denorm})"));
    }
    if w1.lod_bias() != 0 {
        props.push(format!("LOD({})", lod_bias_value(w1.lod_bias())));
    }
    if w0.fetch_whole_quad() {
        props.push("WHOLE_QUAD_MODE".to_owned());
    }
    for (axis, raw) in [('X', w2.offset_x()), ('Y', w2.offset_y()), ('Z', w2.offset_z())] {
        if raw != 0 {
            props.push(format!("{axis}OFFSET({})", texel_offset_value(raw)));
        }
    }

    join_line(
        format!(
            "{name:<15} R{}{dst_rel}.{dst_swizzle}, R{}{src_rel}.{src_swizzle}, t{}, s{}",
            w1.dst_gpr(),
            w0.src_gpr(),
            w0.resource_id(),
            w2.sampler_id()
        ),
        &props,
    )
}

fn vtx_inst_text(inst: &VtxFetchInst) -> String {
    let (w0, w1, w2) = (inst.word0, inst.word1, inst.word2);
    let op = VtxInst::from_raw(w0.vtx_inst());
    let name = op.map_or_else(|| format!("VTX_INST_{}", w0.vtx_inst()), |op| op.name().to_owned());
    let dst_swizzle: String = (0..4).map(|i| Sel::char_for_raw(w1.dst_sel(i))).collect();
    let dst = if op == Some(VtxInst::Semantic) {
        format!("SEM{}.{dst_swizzle}", w1.semantic_id())
    } else {
        let rel = if w1.dst_rel() { "[AL]" } else { "" };
        format!("R{}{rel}.{dst_swizzle}", w1.dst_gpr())
    };
    let src_rel = if w0.src_rel() { "[AL]" } else { "" };
    let src_chan = ['x', 'y', 'z', 'w'][w0.src_sel_x() as usize & 3];

    let mut props = Vec::new();
    match VtxFetchType::from_raw(w0.fetch_type()) {
        Some(VtxFetchType::Vertex) => {}
        Some(kind) => props.push(format!("FETCH_TYPE({kind})")),
        None => props.push(format!("FETCH_TYPE({})", w0.fetch_type())),
    }
    if let Some(format) = DataFormat::from_raw(w1.data_format()) {
        if format != DataFormat::Invalid {
            props.push(format!("FORMAT({format})"));
        }
    }
    match NumFormat::from_raw(w1.num_format_all()) {
        Some(NumFormat::Norm) | None => {}
        Some(num) => props.push(format!("NUM_FORMAT({num})")),
    }
    if w1.format_comp_all() {
        props.push("FORMAT_COMP(SIGNED)".to_owned());
    }
    if w1.srf_mode_all() {
        props.push(format!("SRF_MODE({})", SrfMode::NoZero));
    }
    if w2.offset() != 0 {
        props.push(format!("OFFSET({})", w2.offset()));
    }
    if w2.mega_fetch() {
        props.push(format!("MEGA({})", w0.mega_fetch_count() + 1));
    }
    match EndianSwap::from_raw(w2.endian_swap()) {
        Some(EndianSwap::NoSwap) | None => {}
        Some(swap) => props.push(format!("ENDIAN({swap})")),
    }
    if w2.const_buf_no_stride() {
        props.push("CONST_BUF_NO_STRIDE".to_owned());
    }
    if w2.alt_const() {
        props.push("ALT_CONST".to_owned());
    }
    if w1.use_const_fields() {
        props.push("USE_CONST_FIELDS".to_owned());
    }
    if w0.fetch_whole_quad() {
        props.push("WHOLE_QUAD_MODE".to_owned());
    }

    join_line(
        format!(
            "{name:<15} {dst}, R{}{src_rel}.{src_chan}, b{}",
            w0.src_gpr(),
            w0.buffer_id()
        ),
        &props,
    )
}

/// Renders one TEX or VTX clause instruction.
pub fn fetch_inst_text(inst: &FetchInst) -> String {
    match inst {
        FetchInst::Tex(tex) => tex_inst_text(tex),
        FetchInst::Vtx(vtx) => vtx_inst_text(vtx),
    }
}

/// Formats a float so it always carries a decimal point.
pub fn format_f32(v: f32) -> String {
    if !v.is_finite() {
        return format!("{v}");
    }
    let mut s = format!("{v:.8}");
    if let Some(dot) = s.find('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.len() == dot + 1 {
            s.push('0');
        }
    }
    s
}
